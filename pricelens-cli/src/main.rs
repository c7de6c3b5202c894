//! PriceLens CLI — view, performance, generate and cache commands.
//!
//! Commands:
//! - `view` — filter, normalize and smooth a price table, write it as CSV
//!   along with the trailing performance summary
//! - `performance` — trailing returns per instrument over lookback windows
//! - `generate` — write synthetic daily and intraday tables
//! - `cache import` — store a CSV table in the Parquet cache
//! - `cache status` — report cached tables and their index ranges

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Args, Parser, Subcommand};
use pricelens_core::data::{
    fetch_tables, read_price_csv, write_price_csv, write_price_csv_to, SyntheticProvider,
    TableCache,
};
use pricelens_core::format::format_record;
use pricelens_core::window::{CANONICAL_WINDOWS, VIEW_WINDOWS};
use pricelens_core::{
    build_dashboard, compute_performance, BaselinePolicy, CellStatus, Dashboard,
    PerformanceRecord, PriceTable, TimeIndex, ViewConfig,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Table names used by `generate` and the default cache lookups.
const DAILY_TABLE: &str = "daily";
const INTRADAY_TABLE: &str = "intraday";

#[derive(Parser)]
#[command(
    name = "pricelens",
    about = "PriceLens CLI — relative price views and trailing performance"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter, normalize and smooth a price table; write the result as CSV
    /// followed by the trailing performance summary.
    View {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        view: ViewArgs,

        /// Output CSV path. Defaults to stdout, with the summary on stderr.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Trailing performance per instrument over lookback windows.
    Performance {
        #[command(flatten)]
        source: SourceArgs,

        /// Comma-separated window labels. Defaults to the eight canonical windows.
        #[arg(long, value_delimiter = ',')]
        windows: Vec<String>,

        /// Comma-separated instruments to report. Defaults to all.
        #[arg(long, value_delimiter = ',')]
        instruments: Option<Vec<String>>,

        /// Print JSON instead of a text table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Generate synthetic daily (10 years) and intraday (1 month) tables.
    Generate {
        /// Symbols to generate (e.g., SPY QQQ AAPL).
        #[arg(required = true)]
        symbols: Vec<String>,

        /// Last day of the series (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Directory for daily.csv and intraday.csv.
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        /// Also store both tables in this Parquet cache directory.
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
    /// Cache management commands.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Store a CSV price table in the cache under a name.
    Import {
        /// CSV file to import.
        input: PathBuf,

        /// Table name in the cache.
        #[arg(long)]
        name: String,

        /// The CSV index holds timestamps, not dates.
        #[arg(long, default_value_t = false)]
        intraday: bool,

        /// Cache directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,
    },
    /// Report cached tables and their index ranges.
    Status {
        /// Table names to report. Defaults to daily and intraday.
        names: Vec<String>,

        /// Cache directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,
    },
}

/// Where the source table comes from: a CSV file or a cached table.
#[derive(Args)]
struct SourceArgs {
    /// CSV price table.
    #[arg(long, conflicts_with = "table")]
    input: Option<PathBuf>,

    /// Cached table name.
    #[arg(long)]
    table: Option<String>,

    /// Cache directory. Defaults to ./data.
    #[arg(long, default_value = "data")]
    cache_dir: PathBuf,

    /// The table index holds timestamps, not dates.
    #[arg(long, default_value_t = false)]
    intraday: bool,
}

/// View settings; flags override values from `--config`.
#[derive(Args)]
struct ViewArgs {
    /// TOML view config.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Lookback window, e.g. "3 Months".
    #[arg(long)]
    window: Option<String>,

    /// Show raw prices instead of percentage change.
    #[arg(long, default_value_t = false)]
    raw: bool,

    /// Baseline: "First Date" or "First Week".
    #[arg(long)]
    baseline: Option<BaselinePolicy>,

    /// Subtract this instrument from every other column.
    #[arg(long)]
    reference: Option<String>,

    /// Moving-average window in rows (5 when given without a value).
    #[arg(long, num_args = 0..=1, default_missing_value = "5")]
    smooth: Option<usize>,

    /// Comma-separated instruments to display.
    #[arg(long, value_delimiter = ',')]
    instruments: Option<Vec<String>>,
}

impl ViewArgs {
    fn resolve(self) -> Result<ViewConfig> {
        let mut config = match &self.config {
            Some(path) => ViewConfig::from_file(path)?,
            None => ViewConfig::default(),
        };
        if let Some(window) = self.window {
            config.window = window;
        }
        if self.raw {
            config.relative = false;
        }
        if let Some(baseline) = self.baseline {
            config.baseline = baseline;
        }
        if self.reference.is_some() {
            config.reference_instrument = self.reference;
        }
        if self.smooth.is_some() {
            config.smoothing_window = self.smooth;
        }
        if self.instruments.is_some() {
            config.instruments = self.instruments;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::View {
            source,
            view,
            output,
        } => {
            let config = view.resolve()?;
            tracing::debug!(?config, "resolved view config");
            if source.intraday {
                run_view::<NaiveDateTime>(&source, &config, output.as_deref())
            } else {
                run_view::<NaiveDate>(&source, &config, output.as_deref())
            }
        }
        Commands::Performance {
            source,
            windows,
            instruments,
            json,
        } => {
            let windows = if windows.is_empty() {
                CANONICAL_WINDOWS.iter().map(|w| w.to_string()).collect()
            } else {
                windows
            };
            if source.intraday {
                run_performance::<NaiveDateTime>(&source, &windows, instruments.as_deref(), json)
            } else {
                run_performance::<NaiveDate>(&source, &windows, instruments.as_deref(), json)
            }
        }
        Commands::Generate {
            symbols,
            end,
            out_dir,
            cache_dir,
        } => run_generate(&symbols, end.as_deref(), &out_dir, cache_dir.as_deref()),
        Commands::Cache { action } => match action {
            CacheAction::Import {
                input,
                name,
                intraday,
                cache_dir,
            } => {
                if intraday {
                    run_cache_import::<NaiveDateTime>(&input, &name, &cache_dir)
                } else {
                    run_cache_import::<NaiveDate>(&input, &name, &cache_dir)
                }
            }
            CacheAction::Status { names, cache_dir } => run_cache_status(&names, &cache_dir),
        },
    }
}

fn load_table<T: TimeIndex>(source: &SourceArgs) -> Result<PriceTable<T>> {
    match (&source.input, &source.table) {
        (Some(path), _) => read_price_csv(path)
            .with_context(|| format!("failed to load price table from {}", path.display())),
        (None, Some(name)) => TableCache::new(&source.cache_dir)
            .load(name)
            .with_context(|| format!("failed to load cached table '{name}'")),
        (None, None) => bail!("one of --input or --table is required"),
    }
}

fn run_view<T: TimeIndex>(
    source: &SourceArgs,
    config: &ViewConfig,
    output: Option<&Path>,
) -> Result<()> {
    let table = load_table::<T>(source)?;
    config.validate(&table)?;
    if !VIEW_WINDOWS.contains(&config.window.as_str()) {
        tracing::info!(window = %config.window, "using a non-standard view window");
    }

    let dashboard = build_dashboard(&table, config, &CANONICAL_WINDOWS)?;
    if dashboard.is_empty_selection() {
        println!("No instruments selected.");
        return Ok(());
    }

    emit_view(&dashboard, output, &mut io::stdout().lock(), &mut io::stderr().lock())
}

/// Write the view CSV and the performance summary. The summary follows the
/// report on `out` when the CSV goes to a file, and goes to `err` when the CSV
/// itself is written to `out`.
fn emit_view<T: TimeIndex, O: Write, E: Write>(
    dashboard: &Dashboard<T>,
    output: Option<&Path>,
    out: &mut O,
    err: &mut E,
) -> Result<()> {
    match output {
        Some(path) => {
            write_price_csv(&dashboard.view, path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            writeln!(
                out,
                "Wrote {} rows x {} instruments to {}",
                dashboard.view.len(),
                dashboard.view.width(),
                path.display()
            )?;
            write_performance(&dashboard.performance, out)?;
        }
        None => {
            write_price_csv_to(&dashboard.view, &mut *out)?;
            write_performance(&dashboard.performance, err)?;
        }
    }
    Ok(())
}

fn run_performance<T: TimeIndex + serde::Serialize>(
    source: &SourceArgs,
    windows: &[String],
    instruments: Option<&[String]>,
    json: bool,
) -> Result<()> {
    let table = load_table::<T>(source)?;
    let table = match instruments {
        Some(selected) => table.select(selected),
        None => table,
    };
    if table.width() == 0 {
        println!("No instruments selected.");
        return Ok(());
    }

    let record = compute_performance(&table, windows);
    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        write_performance(&record, &mut io::stdout().lock())?;
    }
    Ok(())
}

fn write_performance<T: TimeIndex, W: Write>(
    record: &PerformanceRecord<T>,
    out: &mut W,
) -> io::Result<()> {
    let as_of = record
        .as_of
        .map(|t| t.to_string())
        .unwrap_or_else(|| "(no data)".into());
    writeln!(out)?;
    writeln!(out, "=== Trailing Performance as of {as_of} ===")?;
    write!(out, "{:<10}", "")?;
    for window in &record.windows {
        write!(out, " {window:>10}")?;
    }
    writeln!(out)?;
    writeln!(out, "{}", "-".repeat(10 + 11 * record.windows.len()))?;

    let mut flagged = 0;
    for (row, (instrument, formatted)) in record.rows.iter().zip(format_record(record)) {
        write!(out, "{instrument:<10}")?;
        for (cell, display) in row.cells.iter().zip(formatted) {
            let mark = if cell.status == CellStatus::Computed {
                " "
            } else {
                flagged += 1;
                "*"
            };
            write!(out, " {:>9}{mark}", display.text)?;
        }
        writeln!(out)?;
    }
    if flagged > 0 {
        writeln!(out)?;
        writeln!(
            out,
            "* no usable start price for this window (stale, missing or zero)"
        )?;
    }
    writeln!(out)
}

fn run_generate(
    symbols: &[String],
    end: Option<&str>,
    out_dir: &Path,
    cache_dir: Option<&Path>,
) -> Result<()> {
    let provider = match end {
        Some(s) => SyntheticProvider::new(
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .with_context(|| format!("invalid --end date '{s}'"))?,
        ),
        None => SyntheticProvider::today(),
    };

    let tables = fetch_tables(&provider, symbols)?;
    tracing::info!(end = %provider.end(), "generated synthetic tables");

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    let daily_path = out_dir.join(format!("{DAILY_TABLE}.csv"));
    let intraday_path = out_dir.join(format!("{INTRADAY_TABLE}.csv"));
    write_price_csv(&tables.daily, &daily_path)?;
    write_price_csv(&tables.intraday, &intraday_path)?;
    println!(
        "Wrote {} ({} rows) and {} ({} rows)",
        daily_path.display(),
        tables.daily.len(),
        intraday_path.display(),
        tables.intraday.len()
    );

    if let Some(dir) = cache_dir {
        let cache = TableCache::new(dir);
        cache.write(DAILY_TABLE, &tables.daily)?;
        cache.write(INTRADAY_TABLE, &tables.intraday)?;
        println!("Cached {DAILY_TABLE} and {INTRADAY_TABLE} in {}", dir.display());
    }
    Ok(())
}

fn run_cache_import<T: TimeIndex>(input: &Path, name: &str, cache_dir: &Path) -> Result<()> {
    let table: PriceTable<T> = read_price_csv(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    if table.is_empty() {
        bail!("{} has no rows", input.display());
    }
    TableCache::new(cache_dir).write(name, &table)?;
    println!(
        "Imported {} rows x {} instruments as '{name}'",
        table.len(),
        table.width()
    );
    Ok(())
}

fn run_cache_status(names: &[String], cache_dir: &Path) -> Result<()> {
    if !cache_dir.exists() {
        println!("Cache directory does not exist: {}", cache_dir.display());
        return Ok(());
    }

    let names: Vec<String> = if names.is_empty() {
        vec![DAILY_TABLE.into(), INTRADAY_TABLE.into()]
    } else {
        names.to_vec()
    };
    let cache = TableCache::new(cache_dir);

    println!("Cache: {}", cache_dir.display());
    println!();
    println!("{:<12} {:<45} {:>8}", "Table", "Range", "Rows");
    println!("{}", "-".repeat(67));
    for status in cache.status(&names) {
        let (range, rows) = match (status.cached, status.first, status.last, status.rows) {
            (true, Some(first), Some(last), Some(rows)) => {
                (format!("{first} to {last}"), rows.to_string())
            }
            _ => ("(not cached)".into(), "-".into()),
        };
        println!("{:<12} {:<45} {:>8}", status.name, range, rows);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn dashboard() -> Dashboard<NaiveDate> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let index: Vec<NaiveDate> = (0..60).map(|i| start + Duration::days(i)).collect();
        let prices = (0..60).map(|i| Some(100.0 + i as f64)).collect();
        let table = PriceTable::new(index, vec!["VOO".into()], vec![prices]).unwrap();
        build_dashboard(&table, &ViewConfig::default(), &CANONICAL_WINDOWS).unwrap()
    }

    #[test]
    fn view_to_stdout_puts_summary_on_stderr() {
        let dash = dashboard();
        let (mut out, mut err) = (Vec::new(), Vec::new());
        emit_view(&dash, None, &mut out, &mut err).unwrap();

        let out = String::from_utf8(out).unwrap();
        let err = String::from_utf8(err).unwrap();
        assert!(out.starts_with("date,VOO\n"));
        assert_eq!(out.lines().count(), dash.view.len() + 1);
        assert!(!out.contains("Trailing Performance"));
        assert!(err.contains("=== Trailing Performance as of 2024-02-29 ==="));
        assert!(err.contains("1 Months"));
        assert!(err.lines().any(|l| l.starts_with("VOO")));
    }

    #[test]
    fn view_to_file_prints_summary_after_report() {
        let dash = dashboard();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("view.csv");
        let (mut out, mut err) = (Vec::new(), Vec::new());
        emit_view(&dash, Some(path.as_path()), &mut out, &mut err).unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with(&format!("Wrote {} rows x 1 instruments", dash.view.len())));
        assert!(out.contains("Trailing Performance"));
        assert!(err.is_empty());
        assert!(path.exists());
    }

    #[test]
    fn summary_marks_unmeasured_cells() {
        let dash = dashboard();
        let mut out = Vec::new();
        write_performance(&dash.performance, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        // 1 Months over a rising series: 159 from 129.
        let expected = format!("{:.2}%", (159.0 - 129.0) / 129.0 * 100.0);
        assert!(text.contains(&expected));
        // 1 Years reaches before the first row.
        assert!(text.contains("0.00%*"));
        assert!(text.contains("* no usable start price"));
    }
}
