use clap::{Parser, ValueEnum};
use ddlerd::batch::{collect_batch, FetchedDdl};
use ddlerd::report::{links_table, rows_table};
use ddlerd::sql::{match_create_table, split_statements};
use ddlerd::{build_graph, to_editable_rows, CharsetCollationMap, InputError};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Build entity-relationship graphs from SHOW CREATE TABLE output
#[derive(Parser, Debug)]
#[command(name = "ddlerd", version)]
struct Args {
    /// SQL files, each a script of CREATE TABLE statements separated by `;`
    #[arg(value_name = "FILES", required = true)]
    files: Vec<PathBuf>,

    /// Schema for unqualified tables (defaults to each file's stem)
    #[arg(short, long)]
    schema: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "json", value_enum)]
    format: OutputFormat,

    /// JSON file mapping charset names to {"defaultCollation": ...}
    #[arg(short, long, value_name = "FILE")]
    charsets: Option<PathBuf>,

    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Log debug details to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Nodes and links as JSON
    Json,
    /// One line per relationship
    Links,
    /// Editable column rows per table
    Rows,
}

fn setup_tracing(verbose: bool) {
    let default = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    let filter = EnvFilter::builder()
        .with_default_directive(default.into())
        .with_env_var("DDLERD_LOG")
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn read_file(path: &Path) -> Result<String, InputError> {
    fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn load_statements(args: &Args) -> Result<Vec<FetchedDdl>, InputError> {
    let mut fetched = Vec::new();
    for path in &args.files {
        let script = read_file(path)?;
        let file_schema = args.schema.clone().unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

        for (i, stmt) in split_statements(&script).into_iter().enumerate() {
            let skeleton = match_create_table(stmt);
            let schema = skeleton
                .as_ref()
                .and_then(|s| s.schema.clone())
                .unwrap_or_else(|| file_schema.clone());
            let table = skeleton
                .map(|s| s.name)
                .unwrap_or_else(|| format!("statement #{}", i + 1));
            fetched.push(FetchedDdl {
                schema,
                table,
                result: Ok(stmt.to_string()),
            });
        }
    }
    Ok(fetched)
}

fn run(args: &Args) -> Result<(), InputError> {
    let charsets: CharsetCollationMap = match &args.charsets {
        Some(path) => serde_json::from_str(&read_file(path)?)?,
        None => CharsetCollationMap::new(),
    };

    let outcome = collect_batch(load_statements(args)?);
    for err in &outcome.errors {
        warn!("{}", err);
    }
    info!(tables = outcome.parsed.table_count(), "parsed input");

    let rendered = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&build_graph(outcome.parsed))? + "\n",
        OutputFormat::Links => links_table(&build_graph(outcome.parsed)).render(),
        OutputFormat::Rows => {
            let mut out = String::new();
            for (schema, tables) in outcome.parsed.iter() {
                for table in tables {
                    if !out.is_empty() {
                        out.push('\n');
                    }
                    out.push_str(&format!("`{}`.`{}`\n", schema, table.name));
                    out.push_str(&rows_table(&to_editable_rows(schema, table, &charsets)).render());
                }
            }
            out
        }
    };

    match &args.output {
        Some(path) => fs::write(path, rendered).map_err(|source| InputError::Io {
            path: path.display().to_string(),
            source,
        }),
        None => {
            print!("{}", rendered);
            Ok(())
        }
    }
}

fn main() {
    let args = Args::parse();
    setup_tracing(args.verbose);

    if let Err(e) = run(&args) {
        eprintln!("{}", e);
        process::exit(1);
    }
}
