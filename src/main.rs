// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::BufRead;
use std::path::PathBuf;

use inventory_count::{
    difference, expected_quantity, export_to_dir, load_import, logging, Config, Session, SnapshotStore,
};

#[derive(Parser)]
#[command(name = "inventory-count")]
#[command(about = "Count scanned equipment against an imported equipment list", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Database file (overrides config and INVENTORY_COUNT_DB)
    #[arg(long, global = true)]
    database: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Import an equipment list (CSV); counts of known items are kept
    Import {
        file: PathBuf,

        /// Column holding the equipment number (default: auto-detect)
        #[arg(short, long)]
        equipment_column: Option<String>,

        /// Column holding the expected quantity (default: auto-detect)
        #[arg(short, long)]
        quantity_column: Option<String>,
    },

    /// Record scans; without values, read one scan per line from stdin
    Scan { values: Vec<String> },

    /// Show totals
    Stats,

    /// List items with count and difference
    List,

    /// List unknown scans
    Unknown,

    /// Show roster ids that collapse to the same scan key
    Duplicates,

    /// Write inventory and unknown-scan CSV files
    Export {
        /// Output directory (default: configured export_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Zero all counts and clear unknown scans, keep the equipment list
    Reset,

    /// Remove all data
    Clear,

    /// Interactive scan screen
    #[cfg(feature = "tui")]
    Ui,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load()?;
    if let Some(database) = cli.database {
        config.database_path = database;
    }

    logging::init(&config.log_filter);

    let store = SnapshotStore::open(&config.database_path)?;
    let mut session = Session::open(store)?;

    match cli.command {
        Commands::Import { file, equipment_column, quantity_column } => {
            println!("📂 Loading {}...", file.display());
            let (table, columns) =
                load_import(&file, equipment_column.as_deref(), quantity_column.as_deref())?;
            let summary = session.import(&table, &columns)?;

            println!("✓ {}", summary.summary());
            for group in session.duplicates() {
                println!("⚠ Duplicate scan key {}: {}", group.scan_key, group.equipment_ids.join(", "));
            }
        }

        Commands::Scan { values } => {
            if session.snapshot().items.is_empty() {
                println!("⚠ No equipment list loaded; every scan will be logged as unknown");
            }

            if values.is_empty() {
                run_scan_loop(&mut session)?;
            } else {
                for value in values {
                    if let Some(outcome) = session.scan(&value)? {
                        println!("{}", outcome.message());
                    }
                }
            }
        }

        Commands::Stats => {
            let stats = session.stats();
            println!("📊 Inventory");
            println!("  Total items:    {}", stats.total_items);
            println!("  Total scanned:  {}", stats.total_scanned);
            println!("  Unique scanned: {}", stats.unique_scanned);
            println!("  Unknown scans:  {}", stats.unknown_count);
        }

        Commands::List => print_items(&session),

        Commands::Unknown => {
            let scans = &session.snapshot().unknown_scans;
            if scans.is_empty() {
                println!("No unknown scans");
            }
            for scan in scans {
                println!(
                    "{}  {:<20} {}",
                    scan.observed_at.format("%Y-%m-%d %H:%M:%S"),
                    scan.normalized_token,
                    scan.raw_input
                );
            }
        }

        Commands::Duplicates => {
            let groups = session.duplicates();
            if groups.is_empty() {
                println!("✓ No duplicate equipment numbers");
            }
            for group in groups {
                println!("{} → {}", group.scan_key, group.equipment_ids.join(", "));
            }
        }

        Commands::Export { output } => {
            let dir = output.unwrap_or_else(|| config.export_dir.clone());
            let today = chrono::Local::now().date_naive();
            let written = export_to_dir(session.snapshot(), &dir, today)?;

            if written.is_empty() {
                println!("Nothing to export");
            }
            for path in written {
                println!("✓ Exported {}", path.display());
            }
        }

        Commands::Reset => {
            session.reset_counts()?;
            println!("✓ Counts and unknown scans reset");
        }

        Commands::Clear => {
            session.clear()?;
            println!("✓ All data removed");
        }

        #[cfg(feature = "tui")]
        Commands::Ui => {
            let mut app = ui::App::new(session);
            ui::run_ui(&mut app)?;
            println!("\n✅ Scan screen closed");
        }
    }

    Ok(())
}

fn run_scan_loop(session: &mut Session) -> Result<()> {
    println!("Scan or type equipment numbers, one per line (Ctrl+D to stop)");

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        if let Some(outcome) = session.scan(&line)? {
            println!("{}", outcome.message());
        }
    }

    println!("📊 {}", session.stats().summary());
    Ok(())
}

fn print_items(session: &Session) {
    let snapshot = session.snapshot();
    let quantity_column = snapshot.quantity_column_name.as_deref();

    if snapshot.items.is_empty() {
        println!("No equipment list loaded");
        return;
    }

    match quantity_column {
        Some(_) => println!("{:<24} {:>8} {:>8} {:>8}", "Equipment", "Counted", "Expected", "Diff"),
        None => println!("{:<24} {:>8}", "Equipment", "Counted"),
    }

    for item in &snapshot.items {
        match quantity_column {
            Some(column) => println!(
                "{:<24} {:>8} {:>8} {:>+8}",
                item.equipment_id,
                item.count,
                expected_quantity(item, column),
                difference(item, quantity_column).unwrap_or_default()
            ),
            None => println!("{:<24} {:>8}", item.equipment_id, item.count),
        }
    }
}
