//! DDL command
//!
//! Usage: folio ddl --schema <YAML> [--dialect <DRIVER>] [--drop]

use clap::Args;
use folio_core::dialect::DriverKind;
use folio_store::manifest::load_schema;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct DdlArgs {
    /// Schema manifest (YAML)
    #[arg(long)]
    pub schema: PathBuf,

    /// Target dialect: sqlite, postgres or mysql
    #[arg(long, default_value = "sqlite")]
    pub dialect: DriverKind,

    /// Emit drop statements ahead of the creates
    #[arg(long)]
    pub drop: bool,
}

/// Execute ddl command
pub fn execute(args: DdlArgs) -> Result<(), Box<dyn std::error::Error>> {
    let schema = load_schema(&args.schema, args.dialect)?;

    if args.drop {
        for table in schema.tables().iter().rev() {
            for sql in table.drop_strings() {
                println!("{};", sql);
            }
        }
    }
    for table in schema.tables() {
        println!("{};", table.create_string());
        if let Some(index) = table.index_string() {
            println!("{};", index);
        }
    }
    Ok(())
}
