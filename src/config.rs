use crate::db::BookStatus;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Personal reading tracker.
#[derive(Parser, Debug, Clone)]
#[command(name = "reading-tracker")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file.
    #[arg(short, long, env = "READING_TRACKER_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create a default config file and the database.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },

    /// Add a book.
    Add {
        /// Book title.
        title: String,
        /// Cover image URI or path.
        #[arg(long, default_value = "")]
        cover: String,
        /// Attached PDF; its page count is used when --pages is omitted.
        #[arg(long)]
        pdf: Option<PathBuf>,
        /// Total number of pages.
        #[arg(short, long)]
        pages: Option<i64>,
        /// Pages already read.
        #[arg(short, long, default_value_t = 0)]
        read: i64,
    },

    /// List books, most recently updated first.
    List {
        /// Only books with this status (to-read, reading, completed).
        #[arg(short, long)]
        status: Option<BookStatus>,
    },

    /// Show one book.
    Show {
        /// Book ID.
        id: i64,
    },

    /// Record how many pages have been read.
    Progress {
        /// Book ID.
        id: i64,
        /// Pages read so far.
        #[arg(allow_hyphen_values = true)]
        pages: String,
    },

    /// Edit a book's details.
    Edit {
        /// Book ID.
        id: i64,
        /// New title.
        #[arg(long)]
        title: Option<String>,
        /// New total page count.
        #[arg(short, long)]
        pages: Option<i64>,
        /// New cover image URI or path.
        #[arg(long)]
        cover: Option<String>,
        /// New attached PDF path.
        #[arg(long)]
        pdf: Option<String>,
        /// Reset progress without asking if the new page count is below the pages read.
        #[arg(short, long)]
        yes: bool,
    },

    /// Delete a book.
    Delete {
        /// Book ID.
        id: i64,
    },

    /// Show reading statistics.
    Stats,

    /// Delete all books.
    Reset {
        /// Do not ask for confirmation.
        #[arg(short, long)]
        yes: bool,
        /// Also drop and recreate the books table.
        #[arg(long)]
        schema: bool,
    },

    /// Export the library to a JSON file.
    Export {
        /// Output directory (defaults to the configured export directory).
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Replace the library with the contents of an export file.
    Import {
        /// Export file to read.
        file: PathBuf,
    },

    /// Add the built-in sample books.
    Sample,

    /// Serve the JSON API.
    Serve {
        /// Address to bind the server to.
        #[arg(short, long)]
        bind: Option<SocketAddr>,
    },
}

/// Main configuration from TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Export configuration.
    #[serde(default)]
    pub export: ExportConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to.
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> SocketAddr {
    SocketAddr::new(
        std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
        8080,
    )
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/reading-tracker.db")
}

/// Export configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory export files are written to.
    #[serde(default = "default_export_dir")]
    pub dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: default_export_dir(),
        }
    }
}

fn default_export_dir() -> PathBuf {
    PathBuf::from("data/exports")
}

impl Config {
    /// Load configuration from file.
    pub fn load(path: &PathBuf) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::error::AppError::Config(format!("Failed to read config file: {}", e))
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> crate::error::Result<Self> {
        toml::from_str(content).map_err(|e| {
            crate::error::AppError::Config(format!("Failed to parse config file: {}", e))
        })
    }

    /// Find config file in default locations.
    pub fn find_config_file() -> Option<PathBuf> {
        let candidates = [
            PathBuf::from("config.toml"),
            PathBuf::from("reading-tracker.toml"),
            dirs::config_dir()
                .map(|p| p.join("reading-tracker").join("config.toml"))
                .unwrap_or_default(),
        ];

        candidates
            .into_iter()
            .find(|p| !p.as_os_str().is_empty() && p.exists())
    }

    /// Generate default config file content.
    pub fn generate_default() -> String {
        r#"# reading-tracker configuration

[server]
bind = "127.0.0.1:8080"

[database]
path = "data/reading-tracker.db"

[export]
# Directory where export files are written
dir = "data/exports"
"#
        .to_string()
    }
}
