// 🏦 Cash & Investment Balances
// Same row layout for both responses; only the institution label differs

use crate::error::{ExtractError, ExtractResult};
use crate::events::{EventSink, Reporter};
use crate::parser::{json_type, Extraction, Extractor, SourceKind, TableRow};
use crate::walker::{field, first_span, first_span_where, marker, path, ROW_VIEW};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub(crate) const CARDS_PATH: [&str; 4] = ["data", "prime", "networthByAccountType", "cards"];

/// Which balances response is being read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceKind {
    Cash,
    Investment,
}

impl BalanceKind {
    pub fn source(&self) -> SourceKind {
        match self {
            BalanceKind::Cash => SourceKind::CashBalances,
            BalanceKind::Investment => SourceKind::InvestmentBalances,
        }
    }

    /// CSV column holding the institution name
    pub fn institution_field(&self) -> &'static str {
        match self {
            BalanceKind::Cash => "bank",
            BalanceKind::Investment => "broker",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            BalanceKind::Cash => "Bank",
            BalanceKind::Investment => "Broker",
        }
    }
}

// ============================================================================
// RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalanceRecord {
    pub account_name: String,
    pub balance: String,
    /// Bank for cash accounts, broker for investment accounts
    pub institution: String,
    pub account_number: String,
    pub last_updated: String,
    pub image_url: String,
}

impl TableRow for AccountBalanceRecord {
    fn values(&self) -> Vec<String> {
        vec![
            self.account_name.clone(),
            self.balance.clone(),
            self.institution.clone(),
            self.account_number.clone(),
            self.last_updated.clone(),
            self.image_url.clone(),
        ]
    }
}

/// Parsed status-dot text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountStatus {
    pub institution: String,
    pub account_number: String,
    pub last_updated: String,
}

/// Split `"Chase (...0172)\n4 hr ago"` into its parts.
///
/// The first line must contain both parentheses to yield a name and
/// number; the second line, when present, is the update time.
pub fn parse_status(text: &str) -> AccountStatus {
    let mut status = AccountStatus::default();
    let mut lines = text.split('\n');

    if let Some(first) = lines.next() {
        let first = first.trim();
        if first.contains('(') && first.contains(')') {
            if let Some((name, rest)) = first.split_once('(') {
                status.institution = name.trim().to_string();
                status.account_number = rest.split(')').next().unwrap_or("").to_string();
            }
        }
    }

    if let Some(second) = lines.next() {
        status.last_updated = second.trim().to_string();
    }

    status
}

fn is_currency(text: &str) -> bool {
    text.starts_with('$') || text.starts_with("-$")
}

// ============================================================================
// EXTRACTOR
// ============================================================================

pub struct BalanceExtractor {
    kind: BalanceKind,
}

impl BalanceExtractor {
    pub fn new(kind: BalanceKind) -> Self {
        BalanceExtractor { kind }
    }

    pub fn cash() -> Self {
        Self::new(BalanceKind::Cash)
    }

    pub fn investment() -> Self {
        Self::new(BalanceKind::Investment)
    }

    pub fn balance_kind(&self) -> BalanceKind {
        self.kind
    }

    /// `None` when the row lacks a title or a currency value
    fn read_row(view: &Value) -> Option<AccountBalanceRecord> {
        let account_name = view.get("rowTitle").and_then(first_span)?;
        let balance = view
            .get("rowValue")
            .and_then(|value| first_span_where(value, is_currency))?;

        let status = path(view, &["rowStatusDot", "statusDotText"])
            .and_then(first_span)
            .map(parse_status)
            .unwrap_or_default();

        let image_url = path(view, &["rowPrimaryImage", "imageUrl"])
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();

        Some(AccountBalanceRecord {
            account_name: account_name.to_string(),
            balance: balance.to_string(),
            institution: status.institution,
            account_number: status.account_number,
            last_updated: status.last_updated,
            image_url,
        })
    }
}

/// Every view of every card under `root`, warning about misshapen lists.
/// Shared with the history extractor, which reads the same response.
pub(crate) fn card_views<'a>(root: &'a Value, reporter: &mut Reporter<'_>) -> Vec<&'a Value> {
    let cards: &[Value] = match path(root, &CARDS_PATH) {
        Some(Value::Array(cards)) => cards,
        Some(Value::Null) | None => &[],
        Some(other) => {
            reporter.warn(format!("cards is {}, expected a list", json_type(other)));
            &[]
        }
    };

    let mut views = Vec::new();
    for (index, card) in cards.iter().enumerate() {
        match path(card, &["item", "views"]) {
            Some(Value::Array(items)) => views.extend(items.iter()),
            Some(Value::Null) | None => {}
            Some(other) => reporter.warn(format!(
                "card {}: views is {}, expected a list",
                index,
                json_type(other)
            )),
        }
    }
    views
}

impl Extractor for BalanceExtractor {
    type Record = AccountBalanceRecord;

    fn kind(&self) -> SourceKind {
        self.kind.source()
    }

    fn fieldnames(&self) -> Vec<&'static str> {
        vec![
            "account_name",
            "balance",
            self.kind.institution_field(),
            "account_number",
            "last_updated",
            "image_url",
        ]
    }

    fn extract(
        &self,
        root: &Value,
        sink: &dyn EventSink,
    ) -> ExtractResult<Extraction<AccountBalanceRecord>> {
        let kind = self.kind.source();
        if !root.is_object() {
            return Err(ExtractError::UnexpectedRoot {
                kind,
                expected: "object",
                found: json_type(root),
            });
        }

        let mut reporter = Reporter::start(kind, sink);
        let mut accounts = Vec::new();

        for view in card_views(root, &mut reporter) {
            if marker(view) != Some(ROW_VIEW) {
                continue;
            }

            match Self::read_row(view) {
                Some(account) => {
                    reporter.record(format!(
                        "{}: {} | {}: {} | Account: {} | Updated: {}",
                        account.account_name,
                        account.balance,
                        self.kind.label(),
                        account.institution,
                        account.account_number,
                        account.last_updated
                    ));
                    accounts.push(account);
                }
                None => {
                    let title = field(view, "rowTitle").and_then(first_span).unwrap_or("?");
                    reporter.skip(format!("row '{}' without title or balance", title));
                }
            }
        }

        Ok(reporter.finish(accounts))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MemorySink;
    use rstest::rstest;
    use serde_json::json;

    fn spans(texts: &[&str]) -> Value {
        json!({ "spans": texts.iter().map(|t| json!({ "text": t })).collect::<Vec<_>>() })
    }

    fn create_row(title: &str, value: &str, status: Option<&str>) -> Value {
        let mut row = json!({
            "__typename": "KPLRowView",
            "rowTitle": spans(&[title]),
            "rowValue": spans(&["", value]),
            "rowPrimaryImage": { "imageUrl": "https://ck-content.imgix.net/bank.png" }
        });
        if let Some(text) = status {
            row["rowStatusDot"] = json!({ "statusDotText": spans(&[text]) });
        }
        row
    }

    fn create_root(views: Vec<Value>) -> Value {
        json!({
            "data": { "prime": { "networthByAccountType": { "cards": [
                { "item": { "views": [{ "__typename": "KPLHeaderView" }] } },
                { "item": { "views": views } }
            ] } } }
        })
    }

    #[rstest]
    #[case("Chase (...0172)\n4 hr ago", "Chase", "...0172", "4 hr ago")]
    #[case("Robinhood (...3105)", "Robinhood", "...3105", "")]
    #[case("Ally Bank\nYesterday", "", "", "Yesterday")]
    #[case("  Wells Fargo (...9) extra \n  1 day ago  ", "Wells Fargo", "...9", "1 day ago")]
    #[case("", "", "", "")]
    fn test_parse_status(
        #[case] text: &str,
        #[case] institution: &str,
        #[case] account_number: &str,
        #[case] last_updated: &str,
    ) {
        let status = parse_status(text);
        assert_eq!(status.institution, institution);
        assert_eq!(status.account_number, account_number);
        assert_eq!(status.last_updated, last_updated);
    }

    #[test]
    fn test_cash_row_extracted() {
        let sink = MemorySink::new();
        let root = create_root(vec![create_row(
            "Total Checking",
            "$2,500.10",
            Some("Chase (...0172)\n4 hr ago"),
        )]);

        let extraction = BalanceExtractor::cash().extract(&root, &sink).unwrap();

        assert_eq!(
            extraction.records,
            vec![AccountBalanceRecord {
                account_name: "Total Checking".to_string(),
                balance: "$2,500.10".to_string(),
                institution: "Chase".to_string(),
                account_number: "...0172".to_string(),
                last_updated: "4 hr ago".to_string(),
                image_url: "https://ck-content.imgix.net/bank.png".to_string(),
            }]
        );
    }

    #[test]
    fn test_row_without_currency_value_dropped() {
        let sink = MemorySink::new();
        let root = create_root(vec![
            create_row("Savings", "Pending", None),
            create_row("Brokerage", "-$12.00", None),
        ]);

        let extraction = BalanceExtractor::investment().extract(&root, &sink).unwrap();

        assert_eq!(extraction.records.len(), 1);
        assert_eq!(extraction.records[0].account_name, "Brokerage");
        assert_eq!(extraction.records[0].institution, "");
    }

    #[test]
    fn test_row_without_title_dropped() {
        let sink = MemorySink::new();
        let root = create_root(vec![create_row("   ", "$1.00", None)]);

        assert!(BalanceExtractor::cash().extract(&root, &sink).unwrap().is_empty());
    }

    #[test]
    fn test_institution_column_name() {
        assert_eq!(BalanceExtractor::cash().fieldnames()[2], "bank");
        assert_eq!(BalanceExtractor::investment().fieldnames()[2], "broker");
        assert_eq!(
            Extractor::kind(&BalanceExtractor::investment()),
            SourceKind::InvestmentBalances
        );
    }

    #[test]
    fn test_misshapen_views_warn_and_continue() {
        let sink = MemorySink::new();
        let root = json!({
            "data": { "prime": { "networthByAccountType": { "cards": [
                { "item": { "views": "broken" } },
                { "item": { "views": [create_row("Checking", "$5", None)] } }
            ] } } }
        });

        let extraction = BalanceExtractor::cash().extract(&root, &sink).unwrap();

        assert_eq!(extraction.records.len(), 1);
        assert_eq!(extraction.warnings.len(), 1);
    }

    #[test]
    fn test_scalar_root_is_contract_violation() {
        let sink = MemorySink::new();
        assert!(BalanceExtractor::cash().extract(&json!(7), &sink).is_err());
    }
}
