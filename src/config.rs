use crate::parser::{RawDocument, SourceKind};
use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

pub const DEFAULT_DATA_DIR: &str = "Data";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;

/// Where raw responses live, where tables go, and where the API listens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Output CSVs
    pub data_dir: PathBuf,
    /// Raw upstream JSON documents
    pub raw_dir: PathBuf,
    pub host: String,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Config::with_dirs(PathBuf::from(DEFAULT_DATA_DIR), None)
    }
}

impl Config {
    /// Raw documents default to the data directory
    pub fn with_dirs(data_dir: PathBuf, raw_dir: Option<PathBuf>) -> Self {
        Config {
            raw_dir: raw_dir.unwrap_or_else(|| data_dir.clone()),
            data_dir,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }

    /// Read `KARMA_DATA_DIR`, `KARMA_RAW_DIR`, `HOST` and `PORT`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let data_dir = lookup("KARMA_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let mut config = Config::with_dirs(data_dir, lookup("KARMA_RAW_DIR").map(PathBuf::from));

        if let Some(host) = lookup("HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("PORT") {
            config.port = port
                .parse()
                .with_context(|| format!("PORT must be a number between 0 and 65535, got '{}'", port))?;
        }

        Ok(config)
    }

    pub fn raw_path(&self, document: RawDocument) -> PathBuf {
        self.raw_dir.join(document.file_name())
    }

    pub fn csv_path(&self, kind: SourceKind) -> PathBuf {
        self.data_dir.join(kind.csv_file())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
