//! Plain-text rendering of store contents.

use fincoach_core::{
    DataPresence, DerivedViews, FeedbackReport, Forecast, NearbyPlaces, Severity, Summary,
    Transaction, TrendsReport, UnusualTransaction, UploadReceipt,
};
use fincoach_ingest::UploadPreview;

/// `-12.5` → `-$12.50`
pub fn money(v: f64) -> String {
    if v < 0.0 {
        format!("-${:.2}", v.abs())
    } else {
        format!("${v:.2}")
    }
}

fn opt_money(v: Option<f64>) -> String {
    v.map(money).unwrap_or_else(|| "n/a".to_string())
}

pub fn presence(p: &DataPresence) {
    match (p.has_data, p.count) {
        (true, Some(n)) => println!("Server holds {n} transactions."),
        (true, None) => println!("Server holds transactions."),
        (false, _) => println!("No transactions yet. Upload a CSV with: fincoach upload --csv <file>"),
    }
}

pub fn transactions(txns: &[Transaction], limit: usize) {
    for t in txns.iter().take(limit) {
        println!(
            "{}  {:<28} {:>12}  {}",
            t.date,
            t.merchant,
            money(t.amount),
            t.category_label()
        );
    }
    if txns.len() > limit {
        println!("… {} more", txns.len() - limit);
    }
}

pub fn views(v: &DerivedViews) {
    let t = &v.totals;
    println!("Period: {}", v.filter);
    println!(
        "Transactions: {}  Income: {}  Expenses: {}  Net: {}  Avg expense: {}",
        t.count,
        money(t.income),
        money(t.expenses),
        money(t.net),
        money(t.average_expense)
    );

    println!("\nTop spending:");
    if v.top_spending.is_empty() {
        println!("  (no expenses)");
    }
    for (i, c) in v.top_spending.iter().enumerate() {
        println!("  {}. {:<24} {:>12}", i + 1, c.name, money(c.value));
    }

    println!("\nBy category:");
    for c in &v.categories {
        println!("  {:<26} {:>12}", c.name, money(c.value));
    }

    println!("\nBy month:");
    for m in &v.months {
        println!("  {:<10} {:>12}", m.display_name, money(m.value));
    }

    if !v.available_months.is_empty() {
        let keys: Vec<String> = v.available_months.iter().map(|k| k.to_string()).collect();
        println!("\nMonths available: {}", keys.join(", "));
    }
}

pub fn summary(s: &Summary) {
    println!("Total transactions: {}", s.total_transactions);
    println!("Total amount:       {}", money(s.total_amount));
    println!("Total income:       {}", opt_money(s.total_income));
    println!("Total expenses:     {}", opt_money(s.total_expenses));
    println!("Average expense:    {}", opt_money(s.average_expense));
    println!("Average txn:        {}", opt_money(s.average_transaction));
    if let Some(r) = &s.date_range {
        let fmt = |d: Option<chrono::NaiveDate>| d.map(|d| d.to_string()).unwrap_or_else(|| "?".into());
        println!("Date range:         {} → {}", fmt(r.start), fmt(r.end));
    }
}

pub fn forecast(f: &Forecast) {
    let Some(month) = &f.month else {
        println!("Not enough history for a forecast yet.");
        return;
    };
    println!("Forecast for {month}");
    println!(
        "  Expenses: {} ({} – {})",
        opt_money(f.predicted_expenses),
        opt_money(f.expenses_lower_bound),
        opt_money(f.expenses_upper_bound)
    );
    println!(
        "  Income:   {} ({} – {})",
        opt_money(f.predicted_income),
        opt_money(f.income_lower_bound),
        opt_money(f.income_upper_bound)
    );
    if !f.history.is_empty() {
        println!("  History:");
        for p in &f.history {
            println!(
                "    {}  expenses {:>12}  income {:>12}",
                p.month,
                money(p.total_expenses),
                money(p.total_income)
            );
        }
    }
}

pub fn feedback(r: &FeedbackReport) {
    if r.items.is_empty() {
        println!("No feedback available.");
    }
    for item in &r.items {
        println!("{} {}", item.kind.icon(), item.title);
        println!("   {}", item.message);
    }
    if let Some(s) = &r.summary {
        println!(
            "\nIncome {}  Expenses {}  Net {}",
            money(s.total_income),
            money(s.total_expenses),
            money(s.net_income)
        );
    }
}

pub fn trends(r: &TrendsReport) {
    println!("Trends:");
    for t in r.sorted_trends() {
        println!(
            "  {:<22} {:<10} first {:>10}  last {:>10}  avg {:>10}",
            t.category,
            t.trend.label(),
            money(t.first_value),
            money(t.last_value),
            money(t.average)
        );
    }
    println!("\nBudget plan:");
    for b in &r.budget_plan {
        println!("  {:<22} {:>10}/mo  [{}]", b.category, money(b.budget_amount), b.trend.label());
        println!("     {}", b.recommendation);
    }
}

pub fn unusual(items: &[UnusualTransaction]) {
    if items.is_empty() {
        println!("Nothing unusual found.");
        return;
    }
    for u in items {
        let tag = match u.severity() {
            Severity::Severe => "SEVERE",
            Severity::Mild => "mild",
        };
        let date = u.date.map(|d| d.to_string()).unwrap_or_else(|| "----------".into());
        println!(
            "[{tag:>6}] {date}  {:<26} {:>12}  score {:.3}",
            u.merchant,
            money(u.amount),
            u.anomaly_score
        );
    }
}

pub fn upload(preview: &UploadPreview, receipt: &UploadReceipt) {
    println!(
        "{} ({} added, total {})",
        receipt.message,
        receipt.transactions_added,
        money(receipt.total_amount)
    );
    if !preview.skipped.is_empty() {
        println!("Skipped {} rows locally:", preview.skipped.len());
        for s in &preview.skipped {
            println!("  line {}: {}", s.line, s.reason);
        }
    }
}

pub fn places(found: &NearbyPlaces) {
    println!(
        "{} {} near {:.4}, {:.4}",
        found.selection.icon(),
        found.selection.label(),
        found.center.latitude,
        found.center.longitude
    );
    if found.places.is_empty() {
        println!("  No places found.");
    }
    for p in &found.places {
        let d = p.display();
        println!("  {} {:<32} {}", d.icon, p.name, d.label);
        if let Some(w) = &p.website {
            println!("      {w}");
        }
        if let Some(url) = p.maps_url() {
            println!("      {url}");
        }
    }
}
