//! Command-line interface argument parsing and definitions
//!
//! The CLI structure is declared with clap's derive API. Every subcommand
//! maps onto one or two client methods in `las-core`.

use clap::{Args, Parser, Subcommand, ValueEnum};
use is_terminal::IsTerminal;
use las_core::{Method, SigningScheme};
use serde_json::Value;
use std::path::PathBuf;

/// LAS CLI - Call the Lucidtech AI Services API from the terminal
#[derive(Parser, Debug)]
#[command(
    name = "las",
    version,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Credentials profile to use
    #[arg(short, long, global = true, env = "LAS_PROFILE")]
    pub profile: Option<String>,

    /// Path to the credentials file
    #[arg(long, global = true, env = "LAS_CREDENTIALS_FILE")]
    pub credentials: Option<PathBuf>,

    /// How requests are authenticated
    #[arg(long, value_enum, global = true, default_value = "bearer")]
    pub signing: Signing,

    /// Output format for results
    #[arg(short, long, value_enum, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload, inspect and delete documents
    Documents {
        #[command(subcommand)]
        command: DocumentsCommand,
    },

    /// Inspect assets
    Assets {
        #[command(subcommand)]
        command: AssetsCommand,
    },

    /// Run and list predictions
    Predictions {
        #[command(subcommand)]
        command: PredictionsCommand,
    },

    /// Report that a transition execution is still alive
    Heartbeat(HeartbeatArgs),

    /// Send an arbitrary request to the API
    Request(RequestArgs),
}

#[derive(Subcommand, Debug)]
pub enum DocumentsCommand {
    /// Upload a document
    Create(CreateDocumentArgs),
    /// List documents
    List(ListDocumentsArgs),
    /// Show a single document
    Get {
        /// Document id
        document_id: String,
    },
    /// Delete documents matching a batch or consent id
    Delete(DeleteDocumentsArgs),
}

#[derive(Args, Debug)]
pub struct CreateDocumentArgs {
    /// File to upload
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// MIME type of the file, guessed from the extension when omitted
    #[arg(long)]
    pub content_type: Option<String>,

    #[arg(long)]
    pub consent_id: Option<String>,

    #[arg(long)]
    pub batch_id: Option<String>,

    /// Ground truth as a JSON array of label/value objects
    #[arg(long, value_parser = parse_json)]
    pub ground_truth: Option<Value>,
}

#[derive(Args, Debug)]
pub struct ListDocumentsArgs {
    #[arg(long)]
    pub batch_id: Option<String>,

    #[arg(long)]
    pub consent_id: Option<String>,

    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Args, Debug)]
pub struct DeleteDocumentsArgs {
    #[arg(long, required_unless_present = "consent_id")]
    pub batch_id: Option<String>,

    #[arg(long)]
    pub consent_id: Option<String>,

    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Subcommand, Debug)]
pub enum AssetsCommand {
    /// List assets
    List(PageArgs),
    /// Show a single asset
    Get {
        /// Asset id
        asset_id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum PredictionsCommand {
    /// Run a model on a document
    Create(CreatePredictionArgs),
    /// List predictions
    List(PageArgs),
}

#[derive(Args, Debug)]
pub struct CreatePredictionArgs {
    pub document_id: String,

    pub model_id: String,

    /// Maximum number of pages to run the model on
    #[arg(long)]
    pub max_pages: Option<u32>,

    #[arg(long)]
    pub auto_rotate: Option<bool>,

    /// Image quality, LOW or HIGH
    #[arg(long)]
    pub image_quality: Option<String>,
}

#[derive(Args, Debug)]
pub struct HeartbeatArgs {
    pub transition_id: String,

    pub execution_id: String,
}

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// HTTP method, e.g. GET or POST
    #[arg(value_parser = parse_method)]
    pub method: Method,

    /// Path relative to the API endpoint, e.g. /documents
    pub path: String,

    /// JSON request body
    #[arg(long, value_parser = parse_json)]
    pub body: Option<Value>,

    /// Query parameter as key=value, may be repeated
    #[arg(long = "query", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub query: Vec<(String, String)>,
}

/// Pagination flags shared by list commands
#[derive(Args, Debug, Clone, Default)]
pub struct PageArgs {
    #[arg(long)]
    pub max_results: Option<u32>,

    #[arg(long)]
    pub next_token: Option<String>,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

/// Request authentication schemes
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Signing {
    /// Bearer access token plus API key
    Bearer,
    /// HMAC signature over each request
    MessageSignature,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

impl From<Signing> for SigningScheme {
    fn from(signing: Signing) -> Self {
        match signing {
            Signing::Bearer => SigningScheme::Bearer,
            Signing::MessageSignature => SigningScheme::MessageSignature,
        }
    }
}

fn parse_method(s: &str) -> Result<Method, String> {
    Method::from_bytes(s.to_ascii_uppercase().as_bytes())
        .map_err(|_| format!("invalid HTTP method '{}'", s))
}

fn parse_json(s: &str) -> Result<Value, String> {
    serde_json::from_str(s).map_err(|e| format!("invalid JSON: {}", e))
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    if key.is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}
