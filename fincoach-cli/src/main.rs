use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use fincoach_core::{CategorySelection, GeoPoint, MonthFilter, Store};
use fincoach_finance::{Explorer, FixedLocation, HttpApi, Orchestrator, OverpassClient};

mod config;
mod logging;
mod render;
mod state;

use config::Config;

#[derive(Parser, Debug)]
#[command(name = "fincoach", version, about = "Personal finance coach dashboard")]
struct Cli {
    /// Override `[api] base_url` from config.toml
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Skip cached data and fetch again
    #[arg(long, global = true)]
    refresh: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Does the server hold any transactions?
    Status,

    /// List transactions
    Transactions {
        /// Include income as well as expenses
        #[arg(long)]
        all: bool,

        /// Only this month (YYYY-MM)
        #[arg(long)]
        month: Option<String>,

        #[arg(long, default_value_t = 25)]
        limit: usize,
    },

    /// Totals, top spending, category and month breakdowns
    Dashboard {
        /// `all` or YYYY-MM
        #[arg(long, default_value = "all")]
        month: String,

        /// Include income as well as expenses
        #[arg(long)]
        all: bool,
    },

    /// Server-side summary statistics
    Summary,

    /// Next month's predicted income and expenses
    Forecast,

    /// Coaching feedback on spending habits
    Feedback,

    /// Category trends and a budget plan
    Trends,

    /// Transactions flagged as unusual
    Unusual,

    /// Validate and upload a CSV (columns: date, merchant, amount[, description])
    Upload {
        #[arg(long)]
        csv: PathBuf,
    },

    /// Delete every transaction on the server
    DeleteAll {
        /// Required; there is no undo
        #[arg(long)]
        yes: bool,
    },

    /// Affordable places nearby
    Explore {
        /// all, fast_food, restaurants, grocery, convenience, health, general, gym
        #[arg(long, default_value = "all")]
        category: String,

        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,
    },

    /// Manage ~/.fincoach/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config if none exists
    Init,
    /// Print the effective config
    Show,
    /// Print the config file location
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut cfg = config::load_config()?;
    logging::init(&cfg.logging.filter);
    if let Some(url) = cli.base_url.clone() {
        cfg.api.base_url = url;
    }
    tracing::debug!(base_url = %cfg.api.base_url, build = env!("FINCOACH_BUILD_SHA"), "starting");

    let api = HttpApi::new(cfg.api.base_url.clone(), cfg.api.timeout())?;
    let orch = Orchestrator::with_policy(api, cfg.cache.empty_results);
    let store = Store::new();
    let refresh = cli.refresh;

    match cli.command {
        Command::Status => {
            let p = if refresh {
                orch.refresh_data_presence(&store).await?
            } else {
                orch.check_data_presence(&store).await?
            };
            render::presence(&p.data);
        }

        Command::Transactions { all, month, limit } => {
            let expenses_only = !all;
            let outcome = if refresh {
                orch.refresh_transactions(&store, expenses_only).await?
            } else {
                orch.get_transactions(&store, expenses_only).await?
            };
            let filter = parse_month(month.as_deref().unwrap_or("all"))?;
            let selected = fincoach_core::filter_by_month(&outcome.data, &filter);
            render::transactions(&selected, limit);
        }

        Command::Dashboard { month, all } => {
            let filter = parse_month(&month)?;
            let expenses_only = !all;
            if refresh {
                orch.refresh_transactions(&store, expenses_only).await?;
            } else {
                orch.get_transactions(&store, expenses_only).await?;
            }
            let views = store.transactions.views(&filter);
            render::views(&views);
        }

        Command::Summary => {
            let s = if refresh {
                orch.refresh_summary(&store).await?
            } else {
                orch.get_summary(&store).await?
            };
            render::summary(&s.data);
        }

        Command::Forecast => {
            let f = if refresh {
                orch.refresh_forecast(&store).await?
            } else {
                orch.get_forecast(&store).await?
            };
            render::forecast(&f.data);
        }

        Command::Feedback => {
            let r = if refresh {
                orch.refresh_feedback(&store).await?
            } else {
                orch.get_feedback(&store).await?
            };
            render::feedback(&r.data);
        }

        Command::Trends => {
            let r = if refresh {
                orch.refresh_trends(&store).await?
            } else {
                orch.get_trends(&store).await?
            };
            render::trends(&r.data);
        }

        Command::Unusual => {
            let u = if refresh {
                orch.refresh_unusual(&store).await?
            } else {
                orch.get_unusual(&store).await?
            };
            render::unusual(&u.data);
        }

        Command::Upload { csv } => {
            if !csv.exists() {
                bail!("CSV not found: {}", csv.display());
            }
            let (preview, receipt) = orch
                .upload_statement(&store, &csv)
                .await
                .with_context(|| format!("uploading {}", csv.display()))?;
            render::upload(&preview, &receipt);
        }

        Command::DeleteAll { yes } => {
            if !yes {
                bail!("refusing to delete every transaction without --yes");
            }
            let message = orch.delete_all(&store).await?;
            println!("{}", message.unwrap_or_else(|| "All transactions deleted.".to_string()));
        }

        Command::Explore { category, lat, lon } => {
            explore(&cfg, &store, &category, lat, lon).await?;
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
            ConfigCommand::Path => println!("{}", config::config_path()?.display()),
        },
    }

    Ok(())
}

fn parse_month(s: &str) -> Result<MonthFilter> {
    s.parse::<MonthFilter>()
        .with_context(|| format!("--month expects `all` or YYYY-MM, got {s}"))
}

async fn explore(
    cfg: &Config,
    store: &Store,
    category: &str,
    lat: Option<f64>,
    lon: Option<f64>,
) -> Result<()> {
    let selection: CategorySelection = category.parse()?;
    let location = match (lat, lon) {
        (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
        _ => cfg.explore.location(),
    };
    let search = OverpassClient::new(cfg.explore.overpass_url.clone(), cfg.api.timeout())?;
    let explorer =
        Explorer::new(FixedLocation(location), search).with_radius(cfg.explore.radius_m);
    let found = explorer.nearby(store, selection).await?;
    render::places(&found);
    Ok(())
}
