// Karma Extract - Core Library
// Recovers flat tables from server-driven UI responses; used by the CLI, API server, and tests

pub mod config;
pub mod error;
pub mod events;
pub mod extractors;
pub mod parser;
pub mod pipeline;
pub mod store;
pub mod walker;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use config::Config;
pub use error::{ExtractError, ExtractResult};
pub use events::{EventSink, ExtractEvent, MemorySink, TracingSink};
pub use extractors::{
    AccountBalanceRecord, BalanceExtractor, BalanceKind,
    CardBalanceExtractor, CardBalanceRecord,
    HistoryExtractor, HistoryPointRecord,
    TransactionExtractor, TransactionRecord, TransactionSummary,
};
pub use parser::{
    Extraction, Extractor, TableExtractor, TableRow, Table,
    RawDocument, SourceKind,
    get_extractor,
};
pub use pipeline::{DirectorySource, Pipeline, RawSource, RefreshReport, TableReport};
pub use store::{load_json, read_rows, write_csv, write_table, Row};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
