//! Folio CLI
//!
//! Administrative front end for folio schemas and stores

use clap::{Parser, Subcommand};
use folio_core::logging_facility::{init, Profile};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "folio")]
#[command(about = "Folio - relational persistence for portfolio records", long_about = None)]
struct Cli {
    /// Emit operation logs on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the DDL of a schema manifest for one dialect
    Ddl(commands::ddl::DdlArgs),
    /// Drop and recreate every table of the schema
    Create(commands::store::StoreArgs),
    /// Delete every row, keeping the tables
    Purge(commands::store::StoreArgs),
    /// Row counts per table
    Count(commands::store::CountArgs),
}

fn main() {
    let cli = Cli::parse();
    if cli.verbose {
        init(Profile::Development);
    }

    let result = match cli.command {
        Commands::Ddl(args) => commands::ddl::execute(args),
        Commands::Create(args) => commands::store::execute_create(args),
        Commands::Purge(args) => commands::store::execute_purge(args),
        Commands::Count(args) => commands::store::execute_count(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
