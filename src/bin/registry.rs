//! Schema Registry CLI
//!
//! Inspect record types, export the schema document and validate records.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;
use viewer_schemas::config::OutputFormat;
use viewer_schemas::{SchemaConfig, SchemaError, SchemaRegistry};

#[derive(Parser)]
#[command(name = "schema-registry")]
#[command(about = "Inspect and validate viewer record schemas")]
struct Cli {
    /// Config file (defaults to schemas.toml lookup)
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all record types
    List,

    /// Show one record type
    Show {
        /// Record type or collection name
        name: String,
    },

    /// Export the schema document served at GET /schema
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Compact JSON regardless of config
        #[arg(long)]
        compact: bool,
    },

    /// Print the JSON Schema for a record type
    JsonSchema {
        /// Record type or collection name
        name: String,
    },

    /// Validate a record against a record type
    Validate {
        /// Record type or collection name
        name: String,
        /// Record as inline JSON
        #[arg(short, long, conflicts_with = "file")]
        data: Option<String>,
        /// Read the record from a JSON file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = SchemaConfig::load_from(cli.config.as_deref())
        .context("loading configuration")?;
    let registry = SchemaRegistry::from_config(&config.registry)?;

    match cli.command {
        Commands::List => {
            println!("📚 Record types ({}):", registry.len());
            for record in registry.record_types() {
                println!(
                    "  {} -> {} ({} fields, {} required)",
                    record.name,
                    record.collection_name(),
                    record.fields.len(),
                    record.required_fields().count()
                );
            }
            Ok(())
        }

        Commands::Show { name } => {
            let record = registry.get_schema(&name)?;
            println!("{}", config.export.output_format.render(record)?);
            Ok(())
        }

        Commands::Export { output, compact } => {
            let format = if compact {
                OutputFormat::Compact
            } else {
                config.export.output_format
            };

            let mut document = serde_json::to_value(registry.describe())?;
            document["generated_at"] = Value::from(chrono::Utc::now().to_rfc3339());
            let rendered = format.render(&document)?;

            if let Some(path) = output {
                std::fs::write(&path, &rendered)
                    .with_context(|| format!("writing {}", path.display()))?;
                println!("✅ Schema document written to {:?}", path);
            } else {
                println!("{}", rendered);
            }
            Ok(())
        }

        Commands::JsonSchema { name } => {
            let schema = registry.json_schema(&name)?;
            println!("{}", config.export.output_format.render(&schema)?);
            Ok(())
        }

        Commands::Validate { name, data, file } => {
            let raw = match (data, file) {
                (Some(data), _) => data,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?,
                (None, None) => bail!("either --data or --file must be given"),
            };
            let candidate: Value =
                serde_json::from_str(&raw).context("record is not valid JSON")?;

            match registry.validate(&name, &candidate) {
                Ok(record) => {
                    println!("✅ Valid {}", registry.get_schema(&name)?.name);
                    println!("{}", config.export.output_format.render(&record)?);
                    Ok(())
                }
                Err(SchemaError::Validation(errors)) => {
                    println!("❌ {} violation(s) in {}:", errors.len(), errors.record_type);
                    for violation in &errors {
                        println!(
                            "   └─ {} [{}]: {}",
                            violation.field, violation.rule, violation.message
                        );
                    }
                    std::process::exit(1);
                }
                Err(e) => Err(e.into()),
            }
        }
    }
}
