//! pagedb CLI
//!
//! Command-line interface for inspecting and editing a pagedb data directory.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pagedb::schema::Schema;
use pagedb::{Config, Criterion, Database, DbError, Field, Record, Result, Value};
use tracing_subscriber::{fmt, EnvFilter};

/// pagedb CLI
#[derive(Parser, Debug)]
#[command(name = "pagedb-cli")]
#[command(about = "CLI for the pagedb file-backed record store")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./pagedb_data")]
    data_dir: PathBuf,

    /// Page byte budget used to size newly created tables
    #[arg(short = 'b', long, default_value = "4000")]
    page_budget: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List table names
    Tables,

    /// Show a table's schema and page layout
    Describe {
        /// Table name
        table: String,
    },

    /// Create a table
    Create {
        /// Table name
        table: String,

        /// Field declaration as name:type (integer, text, timestamp)
        #[arg(short, long = "field", required = true)]
        fields: Vec<String>,

        /// Key field name
        #[arg(short, long)]
        key: String,
    },

    /// Insert a record given as name=value pairs
    Insert {
        /// Table name
        table: String,

        /// Field assignments, one per declared field
        values: Vec<String>,
    },

    /// Get a record by key
    Get {
        /// Table name
        table: String,

        /// Key value
        key: String,
    },

    /// Update fields of a record given as name=value pairs
    Update {
        /// Table name
        table: String,

        /// Key value
        key: String,

        /// Field assignments to apply
        values: Vec<String>,
    },

    /// Delete a record by key
    Delete {
        /// Table name
        table: String,

        /// Key value
        key: String,
    },

    /// Delete every record matching the criteria
    DelWhere {
        /// Table name
        table: String,

        /// Criterion such as age>=30 (repeatable, AND-combined)
        #[arg(short, long = "where")]
        criteria: Vec<String>,
    },

    /// Print records matching the criteria
    Scan {
        /// Table name
        table: String,

        /// Criterion such as age>=30 (repeatable, AND-combined)
        #[arg(short, long = "where")]
        criteria: Vec<String>,
    },

    /// Equi-join tables on shared fields (first table is the base)
    Join {
        /// Tables to join
        #[arg(required = true)]
        tables: Vec<String>,

        /// Join field (repeatable)
        #[arg(short, long = "on", required = true)]
        on: Vec<String>,
    },

    /// Print a table's record count
    Count {
        /// Table name
        table: String,
    },

    /// Rebuild a table's key index from its pages
    RebuildIndex {
        /// Table name
        table: String,
    },

    /// Drop a table and its files
    Drop {
        /// Table name
        table: String,
    },
}

fn main() {
    // Initialize tracing/logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,pagedb=info"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .page_budget_bytes(args.page_budget)
        .build();

    if let Err(e) = run(config, args.command) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(config: Config, command: Commands) -> Result<()> {
    let mut db = Database::open(config)?;

    match command {
        Commands::Tables => {
            for name in db.table_names() {
                println!("{}", name);
            }
        }
        Commands::Describe { table } => {
            let table = db.table(&table)?;
            println!("table:     {}", table.name());
            for field in table.schema().fields() {
                let marker = if field.name == table.key_field() { " (key)" } else { "" };
                println!("  {:<16} {}{}", field.name, field.field_type, marker);
            }
            println!("records:   {}", table.count());
            println!("pages:     {}", table.page_count());
            println!("capacity:  {}", table.capacity());
        }
        Commands::Create { table, fields, key } => {
            let fields = fields
                .iter()
                .map(|decl| parse_field(decl))
                .collect::<Result<Vec<_>>>()?;
            let table = db.create_table(&table, fields, &key)?;
            println!("created {} ({} records per page)", table.name(), table.capacity());
        }
        Commands::Insert { table, values } => {
            let mut table = db.table(&table)?;
            let record = parse_assignments(table.schema(), &values)?;
            table.insert(record)?;
            println!("OK");
        }
        Commands::Get { table, key } => {
            let table = db.table(&table)?;
            let key = parse_key(table.schema(), &key)?;
            print_record(table.schema(), &table.get(&key)?);
        }
        Commands::Update { table, key, values } => {
            let mut table = db.table(&table)?;
            let key = parse_key(table.schema(), &key)?;
            let changes = parse_assignments(table.schema(), &values)?;
            table.update(&key, changes)?;
            println!("OK");
        }
        Commands::Delete { table, key } => {
            let mut table = db.table(&table)?;
            let key = parse_key(table.schema(), &key)?;
            table.delete(&key)?;
            println!("OK");
        }
        Commands::DelWhere { table, criteria } => {
            let mut table = db.table(&table)?;
            let criteria = parse_criteria(table.schema(), &criteria)?;
            let deleted = table.delete_matching(&criteria)?;
            println!("deleted {}", deleted);
        }
        Commands::Scan { table, criteria } => {
            let table = db.table(&table)?;
            let criteria = parse_criteria(table.schema(), &criteria)?;
            for record in table.scan(&criteria)? {
                print_record(table.schema(), &record);
            }
        }
        Commands::Join { tables, on } => {
            let names: Vec<&str> = tables.iter().map(String::as_str).collect();
            let on: Vec<&str> = on.iter().map(String::as_str).collect();
            let criteria = vec![Vec::new(); names.len()];
            for record in db.query_multiple_tables(&names, &criteria, &on)? {
                let line: Vec<String> =
                    record.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                println!("{}", line.join(" "));
            }
        }
        Commands::Count { table } => {
            println!("{}", db.table(&table)?.count());
        }
        Commands::RebuildIndex { table } => {
            let mut table = db.table(&table)?;
            table.rebuild_index()?;
            println!("indexed {} records", table.index_entries().len());
        }
        Commands::Drop { table } => {
            db.drop_table(&table)?;
            println!("OK");
        }
    }

    Ok(())
}

// =============================================================================
// Argument Parsing
// =============================================================================

/// "name:type" → Field
fn parse_field(decl: &str) -> Result<Field> {
    let (name, ty) = decl.split_once(':').ok_or_else(|| {
        DbError::InvalidArgument(format!("field '{}' must be written name:type", decl))
    })?;
    Ok(Field::new(name, ty.parse()?))
}

fn parse_key(schema: &Schema, text: &str) -> Result<Value> {
    schema.key_type().parse_value(text).ok_or_else(|| {
        DbError::InvalidArgument(format!("'{}' is not a valid {}", text, schema.key_type()))
    })
}

/// "name=value" pairs → Record, typed by the schema
fn parse_assignments(schema: &Schema, pairs: &[String]) -> Result<Record> {
    let mut record = Record::new();
    for pair in pairs {
        let (name, raw) = pair.split_once('=').ok_or_else(|| {
            DbError::InvalidArgument(format!("'{}' must be written name=value", pair))
        })?;
        let declared = schema.field(name)?.field_type;
        let value = declared.parse_value(raw).ok_or_else(|| {
            DbError::InvalidArgument(format!("'{}' is not a valid {}", raw, declared))
        })?;
        record.insert(name.to_string(), value);
    }
    Ok(record)
}

fn parse_criteria(schema: &Schema, exprs: &[String]) -> Result<Vec<Criterion>> {
    exprs.iter().map(|e| Criterion::parse(e, schema)).collect()
}

/// Print a record in declared field order
fn print_record(schema: &Schema, record: &Record) {
    let line: Vec<String> = schema
        .fields()
        .iter()
        .filter_map(|f| record.get(&f.name).map(|v| format!("{}={}", f.name, v)))
        .collect();
    println!("{}", line.join(" "));
}
