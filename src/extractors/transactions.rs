// 🧾 Transactions
// Stable schema: plain field projection, one record per input object

use crate::error::{ExtractError, ExtractResult};
use crate::events::{EventSink, Reporter};
use crate::parser::{json_type, Extraction, Extractor, SourceKind, TableRow};
use crate::walker::{field, text_field};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const FIELDNAMES: [&str; 14] = [
    "transaction_id",
    "date",
    "description",
    "status",
    "amount_value",
    "amount_currency",
    "account_name",
    "account_type",
    "account_provider",
    "account_display",
    "category_name",
    "category_type",
    "category_id",
    "merchant_name",
];

/// How many transactions are previewed in the event log
const PREVIEW: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub transaction_id: String,
    pub date: String,
    pub description: String,
    pub status: String,
    pub amount_value: String,
    pub amount_currency: String,
    pub account_name: String,
    pub account_type: String,
    pub account_provider: String,
    pub account_display: String,
    pub category_name: String,
    pub category_type: String,
    pub category_id: String,
    pub merchant_name: String,

    /// `amount.value` when it was a JSON number; not written to CSV
    #[serde(skip)]
    pub amount_numeric: Option<f64>,
}

impl TableRow for TransactionRecord {
    fn values(&self) -> Vec<String> {
        vec![
            self.transaction_id.clone(),
            self.date.clone(),
            self.description.clone(),
            self.status.clone(),
            self.amount_value.clone(),
            self.amount_currency.clone(),
            self.account_name.clone(),
            self.account_type.clone(),
            self.account_provider.clone(),
            self.account_display.clone(),
            self.category_name.clone(),
            self.category_type.clone(),
            self.category_id.clone(),
            self.merchant_name.clone(),
        ]
    }
}

impl TransactionRecord {
    /// Project one transaction object. Non-objects give an all-empty record.
    pub fn from_json(transaction: &Value) -> Self {
        let empty = Value::Null;
        let amount = field(transaction, "amount").unwrap_or(&empty);
        let account = field(transaction, "account").unwrap_or(&empty);
        let category = field(transaction, "category").unwrap_or(&empty);
        let merchant = field(transaction, "merchant").unwrap_or(&empty);

        TransactionRecord {
            transaction_id: text_field(transaction, "id"),
            date: text_field(transaction, "date"),
            description: text_field(transaction, "description"),
            status: text_field(transaction, "status"),
            amount_value: text_field(amount, "value"),
            amount_currency: text_field(amount, "asCurrencyString"),
            account_name: text_field(account, "name"),
            account_type: text_field(account, "type"),
            account_provider: text_field(account, "providerName"),
            account_display: text_field(account, "accountTypeAndNumberDisplay"),
            category_name: text_field(category, "name"),
            category_type: text_field(category, "type"),
            category_id: text_field(category, "id"),
            merchant_name: text_field(merchant, "name"),
            amount_numeric: amount.get("value").and_then(Value::as_f64),
        }
    }
}

// ============================================================================
// SUMMARY
// ============================================================================

/// Aggregates over numeric amounts. Non-numeric amounts are left out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionSummary {
    pub total: f64,
    /// Sum of negative amounts, reported as a positive number
    pub expenses: f64,
    pub income: f64,
    pub counted: usize,
}

impl TransactionSummary {
    pub fn tally(amounts: impl IntoIterator<Item = Option<f64>>) -> Self {
        let mut summary = TransactionSummary::default();
        let mut expenses = 0.0;

        for amount in amounts.into_iter().flatten() {
            summary.total += amount;
            summary.counted += 1;
            if amount < 0.0 {
                expenses += amount;
            } else if amount > 0.0 {
                summary.income += amount;
            }
        }

        summary.expenses = f64::abs(expenses);
        summary
    }

    pub fn from_records(records: &[TransactionRecord]) -> Self {
        Self::tally(records.iter().map(|record| record.amount_numeric))
    }
}

// ============================================================================
// EXTRACTOR
// ============================================================================

pub struct TransactionExtractor;

impl TransactionExtractor {
    pub fn new() -> Self {
        TransactionExtractor
    }
}

impl Default for TransactionExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for TransactionExtractor {
    type Record = TransactionRecord;

    fn kind(&self) -> SourceKind {
        SourceKind::Transactions
    }

    fn fieldnames(&self) -> Vec<&'static str> {
        FIELDNAMES.to_vec()
    }

    fn extract(
        &self,
        root: &Value,
        sink: &dyn EventSink,
    ) -> ExtractResult<Extraction<TransactionRecord>> {
        let Value::Array(transactions) = root else {
            return Err(ExtractError::UnexpectedRoot {
                kind: SourceKind::Transactions,
                expected: "array",
                found: json_type(root),
            });
        };

        let mut reporter = Reporter::start(SourceKind::Transactions, sink);

        let records: Vec<TransactionRecord> = transactions
            .iter()
            .enumerate()
            .map(|(index, transaction)| {
                if !transaction.is_object() {
                    reporter.warn(format!(
                        "transaction {} is {}, expected an object",
                        index,
                        json_type(transaction)
                    ));
                }
                TransactionRecord::from_json(transaction)
            })
            .collect();

        if !records.is_empty() {
            let summary = TransactionSummary::from_records(&records);
            reporter.totals(summary.total, summary.expenses, summary.income);

            for record in records.iter().take(PREVIEW) {
                let description: String = record.description.chars().take(30).collect();
                reporter.record(format!(
                    "{}: {}... | {} | {}",
                    record.date, description, record.amount_currency, record.account_name
                ));
            }
        }

        Ok(reporter.finish(records))
    }
}

// ============================================================================
// TESTS
// ============================================================================
