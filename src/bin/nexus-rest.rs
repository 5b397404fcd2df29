use clap::{Parser, Subcommand};
use nexus_rest::cli::{self as prog_cli, Command, parse_filter_arg, parse_param_arg};
use nexus_rest::config::{AppConfig, find_config_paths};
use nexus_rest::utils::json::parse_json_to_bson_document;
use nexus_rest::{CrudFacade, DbError, FilterClause, MemoryStore, SchemaMetadata};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "nexus-rest", version, about = "Run one CRUD operation through the schema-aware translation layer", long_about = None)]
struct Cli {
    #[arg(long, help = "Path to a config file (TOML). Falls back to NEXUS_REST_CONFIG, ~/.config/nexus-rest.toml, ./nexus-rest.toml")]
    config: Option<PathBuf>,
    #[arg(long, help = "Schema file (TOML or JSON). Takes precedence over config/env.")]
    schema: Option<PathBuf>,
    #[arg(long, help = "JSON data file holding {collection: [documents]}. Written back after a successful mutation.")]
    data: Option<PathBuf>,
    #[arg(long, help = "Directory for rolling log files; logging is off when unset")]
    log_dir: Option<PathBuf>,
    #[arg(long, help = "log4rs YAML file; overrides --log-dir")]
    log_config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Fetch one record by id, or a filtered, sorted, paged list")]
    Get {
        #[arg(long, help = "Collection name; falls back to default_collection")]
        collection: Option<String>,
        #[arg(long, help = "Record id; when omitted a list is returned")]
        id: Option<String>,
        #[arg(long = "filter", short = 'f', help = "field[:op]=v1[,v2] (op: eq, eqs, lt, lte, gt, gte, like)")]
        filters: Vec<String>,
        #[arg(long = "param", short = 'p', help = "orderBy=, orderWay=, pageSize=, pageNum=")]
        params: Vec<String>,
    },
    #[command(about = "Create a record from a JSON object of fields")]
    Insert {
        #[arg(long)]
        collection: Option<String>,
        #[arg(help = "Fields as a JSON object")]
        fields: String,
    },
    #[command(about = "Update fields of an existing record")]
    Update {
        #[arg(long)]
        collection: Option<String>,
        id: String,
        #[arg(help = "Fields as a JSON object")]
        fields: String,
    },
    #[command(about = "Delete by id, or every record matching the filters")]
    Delete {
        #[arg(long)]
        collection: Option<String>,
        #[arg(long)]
        id: Option<String>,
        #[arg(long = "filter", short = 'f')]
        filters: Vec<String>,
    },
    #[command(about = "Add a foreign id to a many-reference field")]
    Link {
        #[arg(long)]
        collection: Option<String>,
        id: String,
        field: String,
        foreign_id: String,
    },
    #[command(about = "Remove a foreign id from a many-reference field")]
    Unlink {
        #[arg(long)]
        collection: Option<String>,
        id: String,
        field: String,
        foreign_id: String,
    },
    #[command(name = "set-links", about = "Replace the members of a many-reference field")]
    SetLinks {
        #[arg(long)]
        collection: Option<String>,
        id: String,
        field: String,
        ids: Vec<String>,
    },
    #[command(name = "clear-links", about = "Remove every member of a many-reference field")]
    ClearLinks {
        #[arg(long)]
        collection: Option<String>,
        id: String,
        field: String,
    },
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn load_config(cli: &Cli) -> Result<AppConfig, DbError> {
    // Precedence: CLI > config files > env > defaults
    let mut cfg = AppConfig {
        schema_path: cli.schema.clone(),
        data_path: cli.data.clone(),
        log_dir: cli.log_dir.clone(),
        log_config: cli.log_config.clone(),
        ..AppConfig::default()
    };
    let paths = find_config_paths(cli.config.as_deref(), env_lookup);
    cfg.merge_missing(AppConfig::load(&paths, env_lookup)?);
    Ok(cfg)
}

fn filters(raw: &[String]) -> Result<Vec<FilterClause>, DbError> {
    raw.iter().map(|f| parse_filter_arg(f)).collect()
}

fn to_command(cmd: Commands, default_collection: Option<&str>) -> Result<Command, DbError> {
    let pick = |c: Option<String>| {
        c.or_else(|| default_collection.map(str::to_string))
            .ok_or_else(|| DbError::NoSuchCollection("no collection given and no default_collection set".into()))
    };
    Ok(match cmd {
        Commands::Get { collection, id, filters: f, params } => Command::Get {
            collection: pick(collection)?,
            id,
            filters: filters(&f)?,
            params: params.iter().map(|p| parse_param_arg(p)).collect::<Result<_, _>>()?,
        },
        Commands::Insert { collection, fields } => {
            Command::Insert { collection: pick(collection)?, fields: parse_json_to_bson_document(&fields)? }
        }
        Commands::Update { collection, id, fields } => Command::Update {
            collection: pick(collection)?,
            id,
            fields: parse_json_to_bson_document(&fields)?,
        },
        Commands::Delete { collection, id, filters: f } => {
            Command::Delete { collection: pick(collection)?, id, filters: filters(&f)? }
        }
        Commands::Link { collection, id, field, foreign_id } => {
            Command::Link { collection: pick(collection)?, id, field, foreign_id }
        }
        Commands::Unlink { collection, id, field, foreign_id } => {
            Command::Unlink { collection: pick(collection)?, id, field, foreign_id }
        }
        Commands::SetLinks { collection, id, field, ids } => {
            Command::SetLinks { collection: pick(collection)?, id, field, ids }
        }
        Commands::ClearLinks { collection, id, field } => {
            Command::ClearLinks { collection: pick(collection)?, id, field }
        }
    })
}

fn real_main() -> Result<bool, DbError> {
    let cli = Cli::parse();
    let cfg = load_config(&cli)?;
    if let Some(file) = cfg.log_config.as_deref() {
        nexus_rest::logger::init_file(file)?;
    } else if let Some(dir) = cfg.log_dir.as_deref() {
        nexus_rest::logger::configure_logging(Some(dir), cfg.log_level.as_deref(), cfg.log_retention)?;
    }
    let schema_path = cfg
        .schema_path
        .clone()
        .ok_or_else(|| DbError::Schema("no schema file: pass --schema or set schema_path".into()))?;
    let schema = SchemaMetadata::load(&schema_path)?;
    let store = match cfg.data_path.as_deref() {
        Some(p) if p.exists() => MemoryStore::load_json(p)?,
        _ => MemoryStore::new(),
    };

    let command = to_command(cli.command, cfg.default_collection.as_deref())?;
    let mutation = command.is_mutation();
    let api = CrudFacade::new(&schema, &store);
    let envelope = prog_cli::run(&api, command);
    println!("{}", serde_json::to_string_pretty(&envelope.to_json()?)?);

    let ok = envelope.status.is_success();
    if ok && mutation
        && let Some(path) = cfg.data_path.as_deref()
    {
        store.dump_json(path)?;
        log::info!("data written to {}", path.display());
    }
    log::debug!(target: nexus_rest::telemetry::METRICS_TARGET, "{}", nexus_rest::telemetry::metrics_text());
    Ok(ok)
}

fn main() {
    match real_main() {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}
