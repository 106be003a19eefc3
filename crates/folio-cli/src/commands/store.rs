//! Store commands
//!
//! Usage:
//!   folio create --schema <YAML> --config <YAML>
//!   folio purge  --schema <YAML> --config <YAML>
//!   folio count  --schema <YAML> --config <YAML> [--table <NAME>]

use clap::Args;
use folio_core::status::{Cancelled, StatusSink};
use folio_store::config::load_config;
use folio_store::manifest::load_schema;
use folio_store::{DataStore, Outcome};
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct StoreArgs {
    /// Schema manifest (YAML)
    #[arg(long)]
    pub schema: PathBuf,

    /// Store configuration (YAML)
    #[arg(long)]
    pub config: PathBuf,
}

#[derive(Debug, Args)]
pub struct CountArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Count only this table
    #[arg(long)]
    pub table: Option<String>,
}

/// Prints each stage as it starts; never cancels
struct ConsoleStatus;

impl StatusSink for ConsoleStatus {
    fn init_task(&mut self, _name: &str) {}

    fn set_num_stages(&mut self, _stages: usize) {}

    fn start_task(&mut self, name: &str) {
        println!("  {}", name);
    }

    fn check_for_cancellation(&mut self) -> Result<(), Cancelled> {
        Ok(())
    }
}

fn open_store(schema: &Path, config: &Path) -> Result<DataStore, Box<dyn std::error::Error>> {
    let config = load_config(config)?;
    let schema = load_schema(schema, config.driver)?;
    Ok(DataStore::open(schema, config)?)
}

fn report(verb: &str, outcome: Outcome, tables: usize) {
    match outcome {
        Outcome::Completed => println!("✓ {} {} tables", verb, tables),
        Outcome::Cancelled => println!("{} cancelled", verb),
    }
}

/// Execute create command
pub fn execute_create(args: StoreArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_store(&args.schema, &args.config)?;
    let outcome = store.create(&mut ConsoleStatus)?;
    report("Created", outcome, store.schema().len());
    store.close()?;
    Ok(())
}

/// Execute purge command
pub fn execute_purge(args: StoreArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_store(&args.schema, &args.config)?;
    let outcome = store.purge(&mut ConsoleStatus)?;
    report("Purged", outcome, store.schema().len());
    store.close()?;
    Ok(())
}

/// Execute count command
pub fn execute_count(args: CountArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_store(&args.store.schema, &args.store.config)?;
    let names: Vec<String> = match args.table {
        Some(table) => vec![table],
        None => store
            .schema()
            .tables()
            .iter()
            .map(|t| t.name().to_string())
            .collect(),
    };
    for name in names {
        let rows = store.count(&name)?;
        println!("{}\t{}", name, rows);
    }
    store.close()?;
    Ok(())
}
