use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::utils::error::{DwvError, Result};
use crate::utils::validation::{validate_file, validate_file_type, Validate};

#[derive(Debug, Parser)]
#[command(name = "datawave", version)]
#[command(about = "Command-line interface for interacting with a DataWave deployment")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn log_level(&self) -> LogLevel {
        match &self.command {
            Command::Accumulo(args) => args.conn.log_level,
            Command::Authorization(args) => args.conn.log_level,
            Command::Dictionary(args) => args.conn.log_level,
            Command::Ingest(args) => args.log_level,
            Command::Query(args) => args.conn.log_level,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interface with the Accumulo table cache; refreshes it by default.
    Accumulo(AccumuloArgs),
    /// Print the results of the whoami endpoint for the provided cert.
    Authorization(AuthorizationArgs),
    /// Display the dictionary of fields in DataWave.
    Dictionary(DictionaryArgs),
    /// Display ingest job states, or ingest a data file.
    Ingest(IngestArgs),
    /// Execute a query against DataWave and output the results.
    Query(QueryArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error | LogLevel::Critical => "error",
        }
    }
}

/// Options shared by every subcommand that talks to a DataWave web service.
#[derive(Debug, Clone, Args)]
pub struct ConnectionOpts {
    /// The DNS suffix the DataWave services are exposed under.
    #[arg(short = 'u', long, env = "DWV_URL")]
    pub url: Option<String>,

    /// Resolve the service pod's IP through Kubernetes instead of using DNS.
    /// Requires a kubectl config pointing at the target cluster.
    #[arg(short = 'i', long)]
    pub ip: bool,

    /// Talk to https://localhost:8443 directly (port-forwarded deployments).
    #[arg(long)]
    pub localhost: bool,

    /// The Kubernetes namespace to interact with.
    #[arg(short = 'n', long, env = "DWV_NAMESPACE", default_value = "default")]
    pub namespace: String,

    /// The level of logging details you want displayed.
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// The certificate PEM file to use in the HTTP request.
    #[arg(short = 'c', long)]
    pub cert: PathBuf,

    /// The certificate key PEM file, when not inlined in the cert file.
    #[arg(short = 'k', long)]
    pub key: Option<PathBuf>,

    /// Extra request header as NAME=VALUE. May be repeated.
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,
}

impl Validate for ConnectionOpts {
    fn validate(&self) -> Result<()> {
        validate_file("cert", &self.cert, "pem")?;
        if let Some(key) = &self.key {
            validate_file("key", key, "pem")?;
        }
        Ok(())
    }
}

fn parse_header(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got `{}`", raw)),
    }
}

#[derive(Debug, Args)]
pub struct AccumuloArgs {
    #[command(flatten)]
    pub conn: ConnectionOpts,

    /// View the accumulo cache instead of refreshing it.
    #[arg(short = 'v', long)]
    pub view: bool,
}

impl Validate for AccumuloArgs {
    fn validate(&self) -> Result<()> {
        self.conn.validate()
    }
}

#[derive(Debug, Args)]
pub struct AuthorizationArgs {
    #[command(flatten)]
    pub conn: ConnectionOpts,
}

impl Validate for AuthorizationArgs {
    fn validate(&self) -> Result<()> {
        self.conn.validate()
    }
}

#[derive(Debug, Args)]
pub struct DictionaryArgs {
    #[command(flatten)]
    pub conn: ConnectionOpts,

    /// The auths used when retrieving results, comma-delineated without
    /// spaces.
    #[arg(long, required = true)]
    pub auths: String,

    /// The data types to filter for; may be a comma-delineated list.
    #[arg(short = 'd', long)]
    pub data_types: Option<String>,

    /// Where to save the dictionary output; console only when unset.
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,
}

impl Validate for DictionaryArgs {
    fn validate(&self) -> Result<()> {
        self.conn.validate()?;
        if let Some(output) = &self.output {
            validate_file_type("output", output, "txt")?;
        }
        Ok(())
    }
}

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// The data file to ingest into DataWave. Must be a json file.
    #[arg(short = 'f', long)]
    pub file: Option<PathBuf>,

    /// The type of data within the data file.
    #[arg(short = 'd', long, requires = "file")]
    pub data_type: Option<String>,

    /// The Kubernetes namespace to interact with.
    #[arg(short = 'n', long, env = "DWV_NAMESPACE", default_value = "dev-datawave")]
    pub namespace: String,

    /// The level of logging details you want displayed.
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,
}

impl Validate for IngestArgs {
    fn validate(&self) -> Result<()> {
        if let Some(file) = &self.file {
            validate_file("file", file, "json")?;
            if self.data_type.is_none() {
                return Err(DwvError::ConfigError {
                    message: "a data type is required when ingesting a file".to_string(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Args)]
pub struct QueryArgs {
    #[command(flatten)]
    pub conn: ConnectionOpts,

    /// The query to perform; must conform to JEXL formatting.
    #[arg(short = 'q', long, required = true)]
    pub query: String,

    /// The name given to the query in the query request.
    #[arg(long, default_value = "test-query")]
    pub query_name: String,

    /// A comma-separated list of authorizations to use within the query.
    #[arg(long, required = true)]
    pub auths: String,

    /// A key, or comma-delineated list of keys without spaces, to filter the
    /// returned fields on.
    #[arg(short = 'f', long)]
    pub filter: Option<String>,

    /// The .json file to output the results to; console only when unset.
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Also write raw parquet blobs out next to the output file.
    #[arg(short = 'd', long, requires = "output")]
    pub decode_raw: bool,
}

impl Validate for QueryArgs {
    fn validate(&self) -> Result<()> {
        self.conn.validate()?;
        if let Some(output) = &self.output {
            validate_file_type("output", output, "json")?;
        }
        Ok(())
    }
}
