//! Pure rollups over a transaction sequence.
//!
//! Everything here is deterministic and side-effect free: the same input
//! always yields the same views, so the dashboard can recompute on every
//! render. [`ViewMemo`] avoids repeated work by remembering the last input
//! sequence by identity.

use std::borrow::Cow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::month::{MonthFilter, MonthKey};
use crate::transaction::Transaction;

/// Label used by the top-spending ranking for uncategorized expenses.
pub const OTHER_CATEGORY: &str = "Other";

/// Number of categories shown in the "top spending" strip.
pub const DEFAULT_TOP_N: usize = 3;

/// Spend per category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRollup {
    pub name: String,
    /// Sum of absolute amounts
    pub value: f64,
}

/// Spend per calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthRollup {
    pub key: MonthKey,
    /// e.g. `Mar 2025`
    pub display_name: String,
    /// Sum of absolute amounts
    pub value: f64,
}

/// Headline numbers for a transaction set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub count: usize,
    /// Signed sum of all amounts
    pub net: f64,
    /// Sum of positive amounts
    pub income: f64,
    /// Sum of absolute values of negative amounts
    pub expenses: f64,
    /// `expenses / number of expenses`, 0 when there are none
    pub average_expense: f64,
}

/// Group `items` by `key`, summing absolute amounts.
///
/// Output keeps the order in which each key was first seen.
fn sum_abs_by<'a, K, I, F>(items: I, key: F) -> Vec<(K, f64)>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = &'a Transaction>,
    F: Fn(&'a Transaction) -> K,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, f64)> = Vec::new();

    for txn in items {
        let k = key(txn);
        match index.get(&k) {
            Some(&i) => groups[i].1 += txn.abs_amount(),
            None => {
                index.insert(k.clone(), groups.len());
                groups.push((k, txn.abs_amount()));
            }
        }
    }

    groups
}

fn descending(mut rollups: Vec<CategoryRollup>) -> Vec<CategoryRollup> {
    // sort_by is stable: equal values keep first-seen order
    rollups.sort_by(|a, b| b.value.total_cmp(&a.value));
    rollups
}

/// Spend per category, largest first.
pub fn category_rollup(txns: &[Transaction]) -> Vec<CategoryRollup> {
    let groups = sum_abs_by(txns, |t| t.category_label().to_string());
    descending(
        groups
            .into_iter()
            .map(|(name, value)| CategoryRollup { name, value })
            .collect(),
    )
}

/// Spend per calendar month, oldest first.
pub fn month_rollup(txns: &[Transaction]) -> Vec<MonthRollup> {
    let mut months: Vec<MonthRollup> = sum_abs_by(txns, Transaction::month_key)
        .into_iter()
        .map(|(key, value)| MonthRollup {
            key,
            display_name: key.display_name(),
            value,
        })
        .collect();
    months.sort_by_key(|m| m.key);
    months
}

/// The `n` expense categories with the largest spend.
///
/// Income is ignored entirely, so a category that only ever received money
/// never appears.
pub fn top_spending_categories(txns: &[Transaction], n: usize) -> Vec<CategoryRollup> {
    let groups = sum_abs_by(txns.iter().filter(|t| t.is_expense()), |t| {
        t.category_or(OTHER_CATEGORY).to_string()
    });
    let mut ranked = descending(
        groups
            .into_iter()
            .map(|(name, value)| CategoryRollup { name, value })
            .collect(),
    );
    ranked.truncate(n);
    ranked
}

/// Restrict to one month; `All` borrows the input unchanged.
pub fn filter_by_month<'a>(txns: &'a [Transaction], filter: &MonthFilter) -> Cow<'a, [Transaction]> {
    match filter {
        MonthFilter::All => Cow::Borrowed(txns),
        MonthFilter::Month(_) => Cow::Owned(
            txns.iter()
                .filter(|t| filter.matches(t.date))
                .cloned()
                .collect(),
        ),
    }
}

/// Distinct months present, oldest first. Feeds the month selector.
pub fn available_months(txns: &[Transaction]) -> Vec<MonthKey> {
    let mut keys: Vec<MonthKey> = txns.iter().map(Transaction::month_key).collect();
    keys.sort();
    keys.dedup();
    keys
}

pub fn totals(txns: &[Transaction]) -> Totals {
    let mut out = Totals::default();
    let mut expense_count = 0usize;

    for t in txns {
        out.count += 1;
        out.net += t.amount;
        if t.is_income() {
            out.income += t.amount;
        } else if t.is_expense() {
            out.expenses += t.abs_amount();
            expense_count += 1;
        }
    }

    if expense_count > 0 {
        out.average_expense = out.expenses / expense_count as f64;
    }
    out
}

/// Every view the dashboard renders from the transaction list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedViews {
    pub filter: String,
    pub categories: Vec<CategoryRollup>,
    pub months: Vec<MonthRollup>,
    pub top_spending: Vec<CategoryRollup>,
    pub totals: Totals,
    pub available_months: Vec<MonthKey>,
}

impl DerivedViews {
    pub fn compute(txns: &[Transaction], filter: &MonthFilter, top_n: usize) -> Self {
        let selected = filter_by_month(txns, filter);
        Self {
            filter: filter.to_string(),
            categories: category_rollup(&selected),
            months: month_rollup(&selected),
            top_spending: top_spending_categories(&selected, top_n),
            totals: totals(&selected),
            // selector always offers every month, not just the filtered one
            available_months: available_months(txns),
        }
    }
}

/// Remembers the views for the last (sequence, filter) pair.
///
/// The memo keeps its own `Arc` to the source sequence, so pointer equality
/// is a sound identity check: the allocation cannot be reused while held.
#[derive(Debug)]
pub struct ViewMemo {
    top_n: usize,
    last: Option<(Arc<Vec<Transaction>>, MonthFilter, Arc<DerivedViews>)>,
    computations: usize,
}

impl ViewMemo {
    pub fn new(top_n: usize) -> Self {
        Self {
            top_n,
            last: None,
            computations: 0,
        }
    }

    pub fn views(&mut self, source: &Arc<Vec<Transaction>>, filter: &MonthFilter) -> Arc<DerivedViews> {
        if let Some((cached_src, cached_filter, views)) = &self.last {
            if Arc::ptr_eq(cached_src, source) && cached_filter == filter {
                return Arc::clone(views);
            }
        }

        let views = Arc::new(DerivedViews::compute(source, filter, self.top_n));
        self.computations += 1;
        self.last = Some((Arc::clone(source), *filter, Arc::clone(&views)));
        views
    }

    /// How many times views were actually computed.
    pub fn computations(&self) -> usize {
        self.computations
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

impl Default for ViewMemo {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_N)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn txn(id: i64, date: (i32, u32, u32), amount: f64, category: Option<&str>) -> Transaction {
        let d = NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap();
        let t = Transaction::new(id, d, format!("merchant-{id}"), amount);
        match category {
            Some(c) => t.with_category(c),
            None => t,
        }
    }

    fn sample() -> Vec<Transaction> {
        vec![
            txn(1, (2025, 1, 3), -42.0, Some("Groceries")),
            txn(2, (2025, 1, 15), 2500.0, Some("Salary")),
            txn(3, (2025, 2, 1), -1200.0, Some("Rent")),
            txn(4, (2025, 2, 9), -18.5, None),
            txn(5, (2024, 12, 24), -60.0, Some("Groceries")),
            txn(6, (2025, 2, 20), -9.99, Some("Subscriptions")),
        ]
    }

    fn abs_total(txns: &[Transaction]) -> f64 {
        txns.iter().map(|t| t.amount.abs()).sum()
    }

    #[test]
    fn test_category_rollup_scenario() {
        let txns = vec![
            txn(1, (2025, 1, 1), -10.0, Some("Food")),
            txn(2, (2025, 1, 2), -5.0, Some("Food")),
            txn(3, (2025, 1, 3), -20.0, Some("Travel")),
        ];
        let rollup = category_rollup(&txns);
        assert_eq!(
            rollup,
            vec![
                CategoryRollup { name: "Travel".into(), value: 20.0 },
                CategoryRollup { name: "Food".into(), value: 15.0 },
            ]
        );
    }

    #[test]
    fn test_category_rollup_sums_to_total() {
        let txns = sample();
        let sum: f64 = category_rollup(&txns).iter().map(|c| c.value).sum();
        assert!((sum - abs_total(&txns)).abs() < 1e-9);
    }

    #[test]
    fn test_category_rollup_non_increasing_with_stable_ties() {
        let txns = vec![
            txn(1, (2025, 1, 1), -5.0, Some("B")),
            txn(2, (2025, 1, 1), -5.0, Some("A")),
            txn(3, (2025, 1, 1), -9.0, Some("C")),
            txn(4, (2025, 1, 1), 5.0, Some("D")),
        ];
        let names: Vec<String> = category_rollup(&txns).into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["C", "B", "A", "D"]);

        let values: Vec<f64> = category_rollup(&sample()).iter().map(|c| c.value).collect();
        assert!(values.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_missing_category_grouped_as_uncategorized() {
        let rollup = category_rollup(&sample());
        assert!(rollup.iter().any(|c| c.name == "Uncategorized" && c.value == 18.5));
    }

    #[test]
    fn test_month_rollup_sorted_unique_and_summed() {
        let txns = sample();
        let months = month_rollup(&txns);
        let keys: Vec<String> = months.iter().map(|m| m.key.to_string()).collect();
        assert_eq!(keys, vec!["2024-12", "2025-01", "2025-02"]);
        assert_eq!(months[0].display_name, "Dec 2024");
        assert_eq!(months[1].value, 2542.0);

        let sum: f64 = months.iter().map(|m| m.value).sum();
        assert!((sum - abs_total(&txns)).abs() < 1e-9);
    }

    #[test]
    fn test_top_spending_excludes_income_only_categories() {
        let top = top_spending_categories(&sample(), 3);
        assert_eq!(top.len(), 3);
        assert_eq!(top[0].name, "Rent");
        assert_eq!(top[1].name, "Groceries");
        assert_eq!(top[1].value, 102.0);
        assert_eq!(top[2].name, OTHER_CATEGORY);
        assert!(top.iter().all(|c| c.name != "Salary"));
    }

    #[test]
    fn test_top_spending_respects_n() {
        assert_eq!(top_spending_categories(&sample(), 1).len(), 1);
        assert_eq!(top_spending_categories(&sample(), 10).len(), 4);
        assert!(top_spending_categories(&[], 3).is_empty());
    }

    #[test]
    fn test_filter_by_month() {
        let txns = sample();
        assert!(matches!(filter_by_month(&txns, &MonthFilter::All), Cow::Borrowed(_)));
        assert_eq!(filter_by_month(&txns, &MonthFilter::All).len(), txns.len());

        let feb: MonthFilter = "2025-02".parse().unwrap();
        let ids: Vec<i64> = filter_by_month(&txns, &feb).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3, 4, 6]);

        let empty: MonthFilter = "2023-05".parse().unwrap();
        assert!(filter_by_month(&txns, &empty).is_empty());
    }

    #[test]
    fn test_totals() {
        let t = totals(&sample());
        assert_eq!(t.count, 6);
        assert_eq!(t.income, 2500.0);
        assert!((t.expenses - 1330.49).abs() < 1e-9);
        assert!((t.average_expense - 1330.49 / 5.0).abs() < 1e-9);
        assert!((t.net - (2500.0 - 1330.49)).abs() < 1e-9);
    }

    #[test]
    fn test_totals_empty_is_zero() {
        assert_eq!(totals(&[]), Totals::default());
    }

    #[test]
    fn test_recomputation_is_idempotent() {
        let txns = sample();
        let a = DerivedViews::compute(&txns, &MonthFilter::All, 3);
        let b = DerivedViews::compute(&txns, &MonthFilter::All, 3);
        assert_eq!(a, b);
    }

    #[test]
    fn test_memo_reuses_views_for_same_sequence() {
        let source = Arc::new(sample());
        let mut memo = ViewMemo::new(3);

        let first = memo.views(&source, &MonthFilter::All);
        let second = memo.views(&source, &MonthFilter::All);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(memo.computations(), 1);

        let feb: MonthFilter = "2025-02".parse().unwrap();
        let filtered = memo.views(&source, &feb);
        assert_eq!(memo.computations(), 2);
        assert_eq!(filtered.totals.count, 3);
        assert_eq!(filtered.available_months.len(), 3);

        // same contents, new allocation: recomputed
        let replaced = Arc::new(sample());
        memo.views(&replaced, &feb);
        assert_eq!(memo.computations(), 3);
    }
}
