// Extractors - one per output table
pub mod balances;
pub mod cards;
pub mod history;
pub mod transactions;

pub use balances::{parse_status, AccountBalanceRecord, AccountStatus, BalanceExtractor, BalanceKind};
pub use cards::{classify, CardBalanceExtractor, CardBalanceRecord, CardText};
pub use history::{HistoryExtractor, HistoryPointRecord};
pub use transactions::{TransactionExtractor, TransactionRecord, TransactionSummary};
