//! Compensation projection CLI
//!
//! Projects salary, bonus and RSU vesting year by year from a JSON
//! compensation file plus optional price history and FX rate CSVs.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use comp_projection::config::{load_compensation, load_projection_config, YearMonth};
use comp_projection::market::{CurrencyConverter, HistoricalPriceLookup, NoPriceHistory};
use comp_projection::projection::{check_range, ProjectionConfig, ProjectionSeries, ProjectionSeriesBuilder};
use comp_projection::{CompensationConfig, HistoricalPriceTable, RateTable, ScenarioRunner};

#[derive(Debug, Parser)]
#[command(name = "comp_projection", version, about = "Multi-year total compensation projection")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Year-by-year projection table
    Series {
        #[command(flatten)]
        inputs: Inputs,

        /// Write the full series as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Vested and remaining value per grant
    Grants {
        #[command(flatten)]
        inputs: Inputs,
    },
    /// Total compensation under several current stock prices
    Scenarios {
        #[command(flatten)]
        inputs: Inputs,

        /// Current stock prices to try
        #[arg(long, value_delimiter = ',', required = true)]
        stock_prices: Vec<f64>,
    },
}

#[derive(Debug, Args)]
struct Inputs {
    /// Compensation config JSON
    #[arg(short, long)]
    config: PathBuf,

    /// Historical prices CSV (symbol,year,month,price)
    #[arg(long)]
    prices: Option<PathBuf>,

    /// Exchange rates CSV (from,to,rate)
    #[arg(long)]
    rates: Option<PathBuf>,

    /// Projection settings JSON
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Current month, YYYY-MM (default: today)
    #[arg(long)]
    as_of: Option<YearMonth>,

    /// First year (default: as-of year - 4)
    #[arg(long)]
    start: Option<i32>,

    /// Last year (default: as-of year + 3)
    #[arg(long)]
    end: Option<i32>,
}

/// Everything a command needs, loaded once
struct Loaded {
    comp: CompensationConfig,
    builder: ProjectionSeriesBuilder,
    start: i32,
    end: i32,
}

impl Inputs {
    fn load(&self) -> Result<Loaded> {
        let comp = load_compensation(&self.config)
            .with_context(|| format!("loading compensation config {}", self.config.display()))?;

        let mut settings = match &self.settings {
            Some(path) => load_projection_config(path)
                .with_context(|| format!("loading projection settings {}", path.display()))?,
            None => ProjectionConfig::default(),
        };
        if self.as_of.is_some() {
            settings.as_of = self.as_of;
        }

        let prices: Arc<dyn HistoricalPriceLookup> = match &self.prices {
            Some(path) => Arc::new(
                HistoricalPriceTable::from_csv_path(path)
                    .with_context(|| format!("loading price history {}", path.display()))?,
            ),
            None => Arc::new(NoPriceHistory),
        };
        let rates: Arc<dyn CurrencyConverter> = match &self.rates {
            Some(path) => Arc::new(
                RateTable::from_csv_path(path)
                    .with_context(|| format!("loading exchange rates {}", path.display()))?,
            ),
            None => Arc::new(RateTable::new()),
        };

        let (default_start, default_end) = settings.default_range();
        let start = self.start.unwrap_or(default_start);
        let end = self.end.unwrap_or(default_end);
        check_range(start, end)?;

        Ok(Loaded {
            comp,
            builder: ProjectionSeriesBuilder::new(prices, rates, settings),
            start,
            end,
        })
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Series { inputs, output } => run_series(&inputs, output.as_deref()),
        Command::Grants { inputs } => run_grants(&inputs),
        Command::Scenarios { inputs, stock_prices } => run_scenarios(&inputs, &stock_prices),
    }
}

fn run_series(inputs: &Inputs, output: Option<&Path>) -> Result<()> {
    let loaded = inputs.load()?;
    let start = Instant::now();
    let series = loaded.builder.build_series(&loaded.comp, loaded.start, loaded.end);
    let elapsed = start.elapsed();

    print_series(&loaded.comp, &series);
    println!("\nProjected {} years in {:?}", series.len(), elapsed);

    if let Some(path) = output {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        series
            .write_csv(file)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("Full results written to: {}", path.display());
    }
    Ok(())
}

fn print_series(comp: &CompensationConfig, series: &ProjectionSeries) {
    println!(
        "Projection as of {} ({} in {}, reported in {})",
        series.as_of, comp.stock_symbol, comp.rsu_currency, comp.base_currency
    );
    if !comp.currencies_match() {
        let note = if series.rate_fallback { " (unavailable, 1:1 used)" } else { "" };
        println!("Exchange rate: {:.4}{}", series.exchange_rate, note);
    }
    println!();
    println!(
        "{:>6} {:>14} {:>12} {:>14} {:>16} {:>16} {:>5}",
        "Year", "Salary", "Bonus", "RSU Vest", "RSU (base)", "Total (base)", ""
    );
    println!("{}", "-".repeat(90));

    for row in &series.projections {
        println!(
            "{:>6} {:>14.2} {:>12.2} {:>14.2} {:>16.2} {:>16.2} {:>5}",
            row.year,
            row.base_salary,
            row.bonus,
            row.rsu_vest,
            row.rsu_vest_in_base_currency,
            row.total_comp_in_base_currency,
            if row.is_projected { "proj" } else { "" },
        );
    }

    let summary = series.summary();
    println!("\nSummary:");
    println!("  Years: {}", summary.years);
    println!("  Historical Total: {:.2}", summary.historical_comp_in_base_currency);
    println!("  Projected Total: {:.2}", summary.projected_comp_in_base_currency);
    println!("  Average Annual: {:.2}", summary.average_annual_comp);
    if let Some(year) = summary.peak_year {
        println!("  Peak Year: {}", year);
    }
}

fn run_grants(inputs: &Inputs) -> Result<()> {
    let loaded = inputs.load()?;
    let summaries = loaded.builder.grant_summaries(&loaded.comp);

    println!(
        "Grants as of {} at {} {:.2}\n",
        loaded.builder.config().as_of(),
        loaded.comp.stock_symbol,
        loaded.comp.stock_price
    );
    println!(
        "{:<24} {:>10} {:>10} {:>14} {:>10} {:>14} {:>9}",
        "Grant", "Shares", "Vested", "Vested Value", "Remaining", "Remain Value", "Next"
    );
    println!("{}", "-".repeat(97));

    for s in &summaries {
        let next = s
            .next_vest
            .map(|t| t.date().to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<24} {:>10.2} {:>10.2} {:>14.2} {:>10.2} {:>14.2} {:>9}",
            s.grant_id, s.total_shares, s.vested_shares, s.vested_value, s.remaining_shares, s.remaining_value, next
        );
    }
    Ok(())
}

fn run_scenarios(inputs: &Inputs, stock_prices: &[f64]) -> Result<()> {
    let loaded = inputs.load()?;
    let runner = ScenarioRunner::new(loaded.builder);
    let scenarios = runner.run_price_scenarios(&loaded.comp, stock_prices, loaded.start, loaded.end);

    println!("{:>12} {:>18} {:>18} {:>16}", "Price", "Historical", "Projected", "Avg Annual");
    println!("{}", "-".repeat(67));
    for scenario in &scenarios {
        let summary = scenario.series.summary();
        println!(
            "{:>12.2} {:>18.2} {:>18.2} {:>16.2}",
            scenario.stock_price,
            summary.historical_comp_in_base_currency,
            summary.projected_comp_in_base_currency,
            summary.average_annual_comp
        );
    }
    Ok(())
}
