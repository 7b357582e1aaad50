// 🔁 Pipeline - fetch raw documents, run every extractor, write every table
// I/O brackets each extractor call; the extractors themselves stay pure

use crate::config::Config;
use crate::events::EventSink;
use crate::parser::{get_extractor, RawDocument, SourceKind, Table};
use crate::store;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use uuid::Uuid;

// ============================================================================
// RAW SOURCES
// ============================================================================

/// RawSource - Where upstream responses come from
///
/// The GraphQL fetcher lives behind this trait. Fetch failures are I/O
/// failures and abort the run.
pub trait RawSource: Send + Sync {
    fn fetch(&self, document: RawDocument) -> Result<Value>;
}

/// Reads `<dir>/<document>.json`, as persisted by the fetcher
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirectorySource { dir: dir.into() }
    }
}

impl RawSource for DirectorySource {
    fn fetch(&self, document: RawDocument) -> Result<Value> {
        store::load_json(&self.dir.join(document.file_name()))
    }
}

// ============================================================================
// REPORTS
// ============================================================================

/// Outcome of one table
#[derive(Debug, Clone, Serialize)]
pub struct TableReport {
    pub table: SourceKind,
    pub path: PathBuf,
    pub records: usize,
    pub warnings: Vec<String>,
    /// Set when the extractor rejected the document's root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of a full refresh
#[derive(Debug, Clone, Serialize)]
pub struct RefreshReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub tables: Vec<TableReport>,
}

impl RefreshReport {
    pub fn total_records(&self) -> usize {
        self.tables.iter().map(|t| t.records).sum()
    }

    pub fn table(&self, kind: SourceKind) -> Option<&TableReport> {
        self.tables.iter().find(|t| t.table == kind)
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

pub struct Pipeline {
    config: Config,
    source: Box<dyn RawSource>,
}

impl Pipeline {
    pub fn new(config: Config, source: Box<dyn RawSource>) -> Self {
        Pipeline { config, source }
    }

    /// Pipeline reading raw documents from `config.raw_dir`
    pub fn from_config(config: Config) -> Self {
        let source = DirectorySource::new(config.raw_dir.clone());
        Pipeline::new(config, Box::new(source))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run every table, fetching each raw document once
    pub fn run(&self, sink: &dyn EventSink) -> Result<RefreshReport> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        tracing::info!(%run_id, "refresh started");

        let mut documents: HashMap<RawDocument, Value> = HashMap::new();
        let mut tables = Vec::with_capacity(SourceKind::ALL.len());

        for kind in SourceKind::ALL {
            let document = kind.document();
            if !documents.contains_key(&document) {
                let raw = self.source.fetch(document)?;
                documents.insert(document, raw);
            }
            if let Some(root) = documents.get(&document) {
                tables.push(self.extract_and_write(kind, root, sink)?);
            }
        }

        let report = RefreshReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            tables,
        };
        tracing::info!(
            %run_id,
            records = report.total_records(),
            "refresh finished"
        );
        Ok(report)
    }

    /// Run a single table
    pub fn run_one(&self, kind: SourceKind, sink: &dyn EventSink) -> Result<TableReport> {
        let root = self.source.fetch(kind.document())?;
        self.extract_and_write(kind, &root, sink)
    }

    fn extract_and_write(
        &self,
        kind: SourceKind,
        root: &Value,
        sink: &dyn EventSink,
    ) -> Result<TableReport> {
        let path = self.config.csv_path(kind);
        let extractor = get_extractor(kind);

        let (table, error) = match extractor.extract_table(root, sink) {
            Ok(table) => (table, None),
            Err(e) => {
                tracing::error!(table = %kind, "Failed to extract {}: {}", kind.name(), e);
                let empty = Table {
                    kind,
                    fieldnames: extractor.header(),
                    rows: Vec::new(),
                    warnings: Vec::new(),
                };
                (empty, Some(e.to_string()))
            }
        };

        let records = store::write_table(&table, &path)?;
        tracing::debug!(table = %kind, path = %path.display(), records, "table written");

        Ok(TableReport {
            table: kind,
            path,
            records,
            warnings: table.warnings,
            error,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
