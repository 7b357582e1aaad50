// 💳 Card Balances
// Card rows are found by tracking identifier, not by field names

use crate::error::{ExtractError, ExtractResult};
use crate::events::{EventSink, Reporter};
use crate::parser::{json_type, Extraction, Extractor, SourceKind, TableRow};
use crate::walker::{collect, find_account_id, path};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::OnceLock;

const CONTENT_PATH: [&str; 4] = ["data", "myWalletInsights", "getMyWalletInsight", "content"];

/// Substring of `fabricTrackingIdentifier` that marks a card row
pub const CARD_ROW_MARKER: &str = "snipes/bookmark/presets/row/spindle/view";

pub const CARD_TYPE: &str = "Credit Card";

const FIELDNAMES: [&str; 7] = [
    "account_id",
    "card_name",
    "balance",
    "credit_usage",
    "last_updated",
    "card_type",
    "image_url",
];

fn amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-?\$[\d,]+(?:\.\d+)?").expect("invalid amount regex"))
}

fn percent_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+%").expect("invalid percent regex"))
}

fn usage_phrase_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+%\s*credit usage").expect("invalid usage regex"))
}

// ============================================================================
// RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardBalanceRecord {
    pub account_id: String,
    pub card_name: String,
    pub balance: String,
    pub credit_usage: String,
    pub last_updated: String,
    pub card_type: String,
    pub image_url: String,
}

impl TableRow for CardBalanceRecord {
    fn values(&self) -> Vec<String> {
        vec![
            self.account_id.clone(),
            self.card_name.clone(),
            self.balance.clone(),
            self.credit_usage.clone(),
            self.last_updated.clone(),
            self.card_type.clone(),
            self.image_url.clone(),
        ]
    }
}

// ============================================================================
// TEXT CLASSIFICATION
// ============================================================================

/// What a single text fragment of a card row turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardText {
    /// Matched currency amount, e.g. `-$1,234.56`
    Balance(String),
    /// Usage sentence; `None` when it carries no `N%`
    CreditUsage(Option<String>),
    /// `Today` / `Yesterday`, as written
    LastUpdated(String),
    CardName(String),
}

fn is_relative_day(lower: &str) -> bool {
    lower == "today" || lower == "yesterday"
}

/// Classify one text; rules are tried in order and the first match wins.
pub fn classify(text: &str) -> Option<CardText> {
    let lower = text.to_lowercase();

    if text.starts_with('$') || text.starts_with("-$") {
        if let Some(found) = amount_re().find(text) {
            return Some(CardText::Balance(found.as_str().to_string()));
        }
    }

    if lower.contains("credit usage") {
        let percent = percent_re().find(text).map(|m| m.as_str().to_string());
        return Some(CardText::CreditUsage(percent));
    }

    if is_relative_day(&lower) {
        return Some(CardText::LastUpdated(text.to_string()));
    }

    if text.chars().count() > 5
        && !text.starts_with('$')
        && !usage_phrase_re().is_match(&lower)
        && !lower.contains("see details")
    {
        return Some(CardText::CardName(text.to_string()));
    }

    None
}

/// Fill empty buckets only: the first text of each kind wins
fn assign(slot: &mut String, value: String) {
    if slot.is_empty() {
        *slot = value;
    }
}

// ============================================================================
// EXTRACTOR
// ============================================================================

pub struct CardBalanceExtractor;

impl CardBalanceExtractor {
    pub fn new() -> Self {
        CardBalanceExtractor
    }

    fn build_record(account_id: String, composable_root: &Value) -> CardBalanceRecord {
        let collected = collect(composable_root);

        let mut card = CardBalanceRecord {
            account_id,
            card_name: String::new(),
            balance: String::new(),
            credit_usage: String::new(),
            last_updated: String::new(),
            card_type: CARD_TYPE.to_string(),
            image_url: collected.images.into_iter().next().unwrap_or_default(),
        };

        for text in &collected.texts {
            match classify(text) {
                Some(CardText::Balance(amount)) => assign(&mut card.balance, amount),
                Some(CardText::CreditUsage(Some(percent))) => {
                    assign(&mut card.credit_usage, percent)
                }
                Some(CardText::LastUpdated(day)) => assign(&mut card.last_updated, day),
                Some(CardText::CardName(name)) => assign(&mut card.card_name, name),
                Some(CardText::CreditUsage(None)) | None => {}
            }
        }

        card
    }
}

impl Default for CardBalanceExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// True when any `fabricMetadata` entry carries the card-row tracking id
fn is_card_row(composable_root: &Value) -> bool {
    composable_root
        .get("fabricMetadata")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|metadata| metadata.get("fabricTrackingIdentifier"))
        .filter_map(Value::as_str)
        .any(|tracking_id| tracking_id.contains(CARD_ROW_MARKER))
}

impl Extractor for CardBalanceExtractor {
    type Record = CardBalanceRecord;

    fn kind(&self) -> SourceKind {
        SourceKind::CardBalances
    }

    fn fieldnames(&self) -> Vec<&'static str> {
        FIELDNAMES.to_vec()
    }

    fn extract(
        &self,
        root: &Value,
        sink: &dyn EventSink,
    ) -> ExtractResult<Extraction<CardBalanceRecord>> {
        if !root.is_object() {
            return Err(ExtractError::UnexpectedRoot {
                kind: SourceKind::CardBalances,
                expected: "object",
                found: json_type(root),
            });
        }

        let mut reporter = Reporter::start(SourceKind::CardBalances, sink);
        let mut cards = Vec::new();
        let mut seen_accounts: HashSet<String> = HashSet::new();

        let content: &[Value] = match path(root, &CONTENT_PATH) {
            Some(Value::Array(items)) => items.as_slice(),
            Some(Value::Null) | None => &[],
            Some(other) => {
                reporter.warn(format!("content is {}, expected a list", json_type(other)));
                &[]
            }
        };

        for (index, item) in content.iter().enumerate() {
            let composable_root = match path(item, &["item", "composableRoot"]) {
                Some(node) => match node {
                    Value::Object(fields) if !fields.is_empty() => node,
                    Value::Object(_) | Value::Null => continue,
                    other => {
                        reporter.warn(format!(
                            "item {}: composableRoot is {}, expected an object",
                            index,
                            json_type(other)
                        ));
                        continue;
                    }
                },
                None => continue,
            };

            if !is_card_row(composable_root) {
                reporter.skip(format!("item {}: not a card row", index));
                continue;
            }

            let Some(account_id) = find_account_id(composable_root) else {
                reporter.skip(format!("item {}: card row without account id", index));
                continue;
            };

            if seen_accounts.contains(&account_id) {
                reporter.skip(format!("item {}: duplicate account {}", index, account_id));
                continue;
            }

            let card = Self::build_record(account_id, composable_root);
            reporter.record(format!(
                "{}: {} | {} ({}) - {}",
                card.account_id, card.card_name, card.balance, card.credit_usage, card.image_url
            ));
            seen_accounts.insert(card.account_id.clone());
            cards.push(card);
        }

        Ok(reporter.finish(cards))
    }
}

// ============================================================================
// TESTS
// ============================================================================
