// 🏗️ Extractor Framework
// One trait, five tables: every extractor turns a raw JSON document into flat rows

use crate::error::ExtractError;
use crate::events::EventSink;
use crate::extractors::{
    BalanceExtractor, CardBalanceExtractor, HistoryExtractor, TransactionExtractor,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// CORE TYPES
// ============================================================================

/// SourceKind - Which output table an extractor produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    CardBalances,
    CashBalances,
    InvestmentBalances,
    InvestmentHistory,
    Transactions,
}

impl SourceKind {
    /// Run order used by the pipeline
    pub const ALL: [SourceKind; 5] = [
        SourceKind::CardBalances,
        SourceKind::CashBalances,
        SourceKind::InvestmentBalances,
        SourceKind::InvestmentHistory,
        SourceKind::Transactions,
    ];

    /// Human-readable name for display
    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::CardBalances => "card balances",
            SourceKind::CashBalances => "cash balances",
            SourceKind::InvestmentBalances => "investment balances",
            SourceKind::InvestmentHistory => "investment history",
            SourceKind::Transactions => "transactions",
        }
    }

    /// Table name, used for the CSV file and the API route
    pub fn table(&self) -> &'static str {
        match self {
            SourceKind::CardBalances => "card_balances",
            SourceKind::CashBalances => "cash_balances",
            SourceKind::InvestmentBalances => "investment_balances",
            SourceKind::InvestmentHistory => "investment_history",
            SourceKind::Transactions => "transactions",
        }
    }

    pub fn csv_file(&self) -> String {
        format!("{}.csv", self.table())
    }

    /// Raw document this table is extracted from.
    /// History and investment balances share one upstream response.
    pub fn document(&self) -> RawDocument {
        match self {
            SourceKind::CardBalances => RawDocument::CardBalances,
            SourceKind::CashBalances => RawDocument::CashBalances,
            SourceKind::InvestmentBalances | SourceKind::InvestmentHistory => {
                RawDocument::InvestmentBalances
            }
            SourceKind::Transactions => RawDocument::Transactions,
        }
    }

    pub fn from_table(table: &str) -> Option<SourceKind> {
        SourceKind::ALL.into_iter().find(|kind| kind.table() == table)
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table())
    }
}

/// RawDocument - The four upstream response shapes persisted on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawDocument {
    CardBalances,
    CashBalances,
    InvestmentBalances,
    Transactions,
}

impl RawDocument {
    pub const ALL: [RawDocument; 4] = [
        RawDocument::CardBalances,
        RawDocument::CashBalances,
        RawDocument::InvestmentBalances,
        RawDocument::Transactions,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            RawDocument::CardBalances => "card_balances.json",
            RawDocument::CashBalances => "cash_balances.json",
            RawDocument::InvestmentBalances => "investment_balances.json",
            RawDocument::Transactions => "transactions.json",
        }
    }
}

/// TableRow - A flat record that can be written as one CSV line
///
/// `values()` must follow the order of the extractor's `fieldnames()`.
pub trait TableRow {
    fn values(&self) -> Vec<String>;
}

/// Extraction - Output of extractor.extract()
///
/// Zero records is a legitimate outcome; `warnings` says why.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction<R> {
    pub records: Vec<R>,
    pub warnings: Vec<String>,
}

impl<R> Extraction<R> {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

// ============================================================================
// CORE TRAIT
// ============================================================================

/// Extractor - Core trait (minimal, required)
///
/// Implementations never fail on missing keys. They only return
/// `Err` when the root itself is the wrong JSON type.
pub trait Extractor: Send + Sync {
    type Record: TableRow;

    /// Which table this extractor produces
    fn kind(&self) -> SourceKind;

    /// CSV header, in the order `TableRow::values` emits cells
    fn fieldnames(&self) -> Vec<&'static str>;

    /// Walk a raw document and recover records
    fn extract(
        &self,
        root: &Value,
        sink: &dyn EventSink,
    ) -> Result<Extraction<Self::Record>, ExtractError>;
}

/// Table - Type-erased extraction, ready for the CSV writer
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub kind: SourceKind,
    pub fieldnames: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
    pub warnings: Vec<String>,
}

/// TableExtractor - Object-safe view of any `Extractor`
///
/// Lets the pipeline hold `Box<dyn TableExtractor>` regardless of record type.
pub trait TableExtractor: Send + Sync {
    fn kind(&self) -> SourceKind;
    /// CSV header of the table this extractor fills
    fn header(&self) -> Vec<&'static str>;
    fn extract_table(&self, root: &Value, sink: &dyn EventSink) -> Result<Table, ExtractError>;
}

impl<E: Extractor> TableExtractor for E {
    fn kind(&self) -> SourceKind {
        Extractor::kind(self)
    }

    fn header(&self) -> Vec<&'static str> {
        Extractor::fieldnames(self)
    }

    fn extract_table(&self, root: &Value, sink: &dyn EventSink) -> Result<Table, ExtractError> {
        let extraction = Extractor::extract(self, root, sink)?;
        Ok(Table {
            kind: Extractor::kind(self),
            fieldnames: Extractor::fieldnames(self),
            rows: extraction.records.iter().map(TableRow::values).collect(),
            warnings: extraction.warnings,
        })
    }
}

// ============================================================================
// FACTORY FUNCTIONS
// ============================================================================

/// Get the extractor for a table
///
/// # Example:
/// ```
/// use karma_extract::{get_extractor, MemorySink, SourceKind, TableExtractor};
///
/// let extractor = get_extractor(SourceKind::Transactions);
/// let table = extractor
///     .extract_table(&serde_json::json!([]), &MemorySink::new())
///     .unwrap();
/// assert!(table.rows.is_empty());
/// ```
pub fn get_extractor(kind: SourceKind) -> Box<dyn TableExtractor> {
    match kind {
        SourceKind::CardBalances => Box::new(CardBalanceExtractor::new()),
        SourceKind::CashBalances => Box::new(BalanceExtractor::cash()),
        SourceKind::InvestmentBalances => Box::new(BalanceExtractor::investment()),
        SourceKind::InvestmentHistory => Box::new(HistoryExtractor::new()),
        SourceKind::Transactions => Box::new(TransactionExtractor::new()),
    }
}

/// Short name of a JSON value's type, for diagnostics
pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// TESTS
// ============================================================================
