//! Record Mapping CLI
//!
//! Inspects the mapping of a sample customer record and runs it against the
//! in-memory store.
//!
//! Usage:
//!   recordmap schema
//!   recordmap plan --id 7
//!   recordmap run --filter name="Ada Lovelace" --limit 10
//!   recordmap --config ./recordmap.toml run

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use recordmap::value::record_from_json;
use recordmap::{
    encoding, generator, Declaration, Declare, FieldMap, FieldType, FieldValue, Filters, Hydrated,
    MemoryStore, OrderBy, RawRecord, Record, RecordMapConfig, Value,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "recordmap")]
#[command(about = "Inspect record mappings and the queries they generate")]
struct Cli {
    /// Config file (defaults to recordmap.toml lookup)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Compact JSON output
    #[arg(long)]
    compact: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the resolved customer schema and its fingerprint
    Schema,

    /// Print the queries generated for a customer
    Plan {
        /// Primary key of the sample customer
        #[arg(long, default_value_t = 1)]
        id: i64,
    },

    /// Seed the memory store and fetch customers
    Run {
        /// Equality filter as key=value, repeatable
        #[arg(short, long)]
        filter: Vec<String>,

        /// Maximum number of rows
        #[arg(short, long)]
        limit: Option<u64>,

        /// Sort column, prefix with '-' for descending
        #[arg(long)]
        order: Option<String>,
    },
}

/// Sample record used by every subcommand
#[derive(Debug, Clone, PartialEq)]
struct Customer {
    id: i64,
    name: String,
    email: Option<String>,
    tags: Vec<String>,
    created_at: Option<DateTime<Utc>>,
}

impl Declare for Customer {
    fn declaration() -> Declaration {
        Declaration::of::<Customer>()
            .entity("customer")
            .field::<i64>("id", FieldMap::new().primary_key().hidden())
            .field::<String>("name", FieldMap::new().storage_key("fullName"))
            .field::<Option<String>>("email", FieldMap::new().encode_key("customerEmail"))
            .field::<Vec<String>>("tags", FieldMap::new())
            .field::<Option<DateTime<Utc>>>(
                "created_at",
                FieldMap::new().storage_key("createdAt").read_only(),
            )
    }
}

impl Record for Customer {
    fn field(&self, ident: &str) -> recordmap::Result<FieldValue> {
        match ident {
            "id" => self.id.to_field(),
            "name" => self.name.to_field(),
            "email" => self.email.to_field(),
            "tags" => self.tags.to_field(),
            "created_at" => self.created_at.to_field(),
            _ => Err(Self::unknown_field(ident)),
        }
    }

    fn construct(fields: &mut Hydrated) -> recordmap::Result<Self> {
        Ok(Self {
            id: fields.take_or_default("id")?,
            name: fields.take("name")?,
            email: fields.take("email")?,
            tags: fields.take_or_default("tags")?,
            created_at: fields.take("created_at")?,
        })
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config =
        RecordMapConfig::load_from(cli.config.as_deref()).context("loading configuration")?;
    if cli.compact {
        config.output.format = recordmap::config::OutputFormat::Compact;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Schema => {
            let schema = Customer::schema()?;
            let output = serde_json::json!({
                "fingerprint": schema.fingerprint()?.to_string(),
                "schema": serde_json::to_value(&*schema)?,
                "definition": serde_json::to_value(encoding::definition::<Customer>()?)?,
            });
            println!("{}", config.output.format.render(&output)?);
        }

        Commands::Plan { id } => {
            let sample = Customer {
                id,
                name: "Ada Lovelace".to_string(),
                email: Some("ada@example.com".to_string()),
                tags: vec!["vip".to_string()],
                created_at: None,
            };
            let mut filters = Filters::new();
            filters.insert("fullName".to_string(), Value::from(sample.name.clone()));

            let queries = [
                generator::select::<Customer>(
                    filters.clone(),
                    vec![OrderBy::asc("fullName")],
                    Some(10),
                    None,
                )?,
                generator::select_count::<Customer>(filters)?,
                generator::insert(&Customer { id: 0, ..sample.clone() })?,
                generator::update(&sample)?,
                generator::delete(&sample)?,
            ];
            for query in &queries {
                println!("{}", query);
            }
        }

        Commands::Run { filter, limit, order } => {
            let store = seeded_store(&config)?;
            let filters = parse_filters(&filter)?;
            let order_by = order
                .map(|column| match column.strip_prefix('-') {
                    Some(column) => OrderBy::desc(column),
                    None => OrderBy::asc(column),
                })
                .into_iter()
                .collect();

            let total = Customer::count(&store, filters.clone())?;
            let customers = Customer::fetch(&store, filters, order_by, limit, None)?;
            info!(total, fetched = customers.len(), "fetched customers");

            let encoded = customers
                .iter()
                .map(encoding::encode)
                .collect::<recordmap::Result<Vec<_>>>()?;
            println!("{}", config.output.format.render(&serde_json::Value::Array(encoded))?);
        }
    }

    Ok(())
}

fn seeded_store(config: &RecordMapConfig) -> anyhow::Result<MemoryStore> {
    let store = MemoryStore::new();
    store.define_table(&config.store.entity, &config.store.primary_key);

    let rows = match config.dataset_path() {
        Some(path) => {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("reading dataset {}", path.display()))?;
            let json: serde_json::Value = serde_json::from_str(&content)
                .with_context(|| format!("parsing dataset {}", path.display()))?;
            let serde_json::Value::Array(items) = json else {
                bail!("dataset {} must be a JSON array", path.display());
            };
            items
                .into_iter()
                .map(|item| record_from_json(item).context("dataset rows must be JSON objects"))
                .collect::<anyhow::Result<Vec<RawRecord>>>()?
        }
        None => sample_rows(),
    };

    store.seed(&config.store.entity, rows)?;
    Ok(store)
}

fn sample_rows() -> Vec<RawRecord> {
    [
        ("Ada Lovelace", "ada@example.com", "2021-01-01 00:10:00"),
        ("Alan Turing", "alan@example.com", "2021-02-01 00:20:00"),
        ("Grace Hopper", "grace@example.com", "2021-03-01 00:30:00"),
    ]
    .into_iter()
    .map(|(name, email, created_at)| {
        let mut row = RawRecord::new();
        row.insert("fullName".to_string(), Value::from(name));
        row.insert("email".to_string(), Value::from(email));
        row.insert("tags".to_string(), Value::Json(serde_json::json!([])));
        row.insert("createdAt".to_string(), Value::from(created_at));
        row
    })
    .collect()
}

fn parse_filters(pairs: &[String]) -> anyhow::Result<Filters> {
    let mut filters = Filters::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("filter '{}' must be key=value", pair);
        };
        let value = match value.parse::<i64>() {
            Ok(number) => Value::Int(number),
            Err(_) => Value::from(value.trim_matches('"')),
        };
        filters.insert(key.to_string(), value);
    }
    Ok(filters)
}
