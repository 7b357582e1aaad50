// 📣 Extraction Events
// Extractors report progress through an injected sink instead of printing

use crate::parser::{Extraction, SourceKind};
use std::sync::Mutex;

/// What an extractor has to say while it runs
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractEvent {
    Started {
        kind: SourceKind,
    },
    /// A candidate node was recognised but produced no record
    Skipped {
        kind: SourceKind,
        reason: String,
    },
    /// Something unexpected in the document; extraction carried on
    Warning {
        kind: SourceKind,
        message: String,
    },
    /// One-line description of an emitted record
    Record {
        kind: SourceKind,
        summary: String,
    },
    /// Aggregate amounts over a transaction list
    Totals {
        kind: SourceKind,
        total: f64,
        expenses: f64,
        income: f64,
    },
    Finished {
        kind: SourceKind,
        records: usize,
        warnings: usize,
    },
}

/// EventSink - Where extraction events go
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &ExtractEvent);
}

/// Forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &ExtractEvent) {
        match event {
            ExtractEvent::Started { kind } => {
                tracing::debug!(table = %kind, "extracting {}", kind.name());
            }
            ExtractEvent::Skipped { kind, reason } => {
                tracing::debug!(table = %kind, "skipped: {}", reason);
            }
            ExtractEvent::Warning { kind, message } => {
                tracing::warn!(table = %kind, "{}", message);
            }
            ExtractEvent::Record { kind, summary } => {
                tracing::info!(table = %kind, "  - {}", summary);
            }
            ExtractEvent::Totals {
                kind,
                total,
                expenses,
                income,
            } => {
                tracing::info!(
                    table = %kind,
                    total = %format!("{:.2}", total),
                    expenses = %format!("{:.2}", expenses),
                    income = %format!("{:.2}", income),
                    "transaction summary"
                );
            }
            ExtractEvent::Finished {
                kind,
                records,
                warnings,
            } => {
                if *records == 0 {
                    tracing::warn!(table = %kind, warnings, "no {} data found", kind.name());
                } else {
                    tracing::info!(
                        table = %kind,
                        records,
                        warnings,
                        "extracted {} {} records",
                        records,
                        kind.name()
                    );
                }
            }
        }
    }
}

/// Keeps every event in memory (tests, CLI dry runs)
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<ExtractEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ExtractEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: &ExtractEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Per-call bookkeeping shared by the extractors
pub(crate) struct Reporter<'a> {
    kind: SourceKind,
    sink: &'a dyn EventSink,
    warnings: Vec<String>,
}

impl<'a> Reporter<'a> {
    pub(crate) fn start(kind: SourceKind, sink: &'a dyn EventSink) -> Self {
        sink.emit(&ExtractEvent::Started { kind });
        Reporter {
            kind,
            sink,
            warnings: Vec::new(),
        }
    }

    pub(crate) fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.sink.emit(&ExtractEvent::Warning {
            kind: self.kind,
            message: message.clone(),
        });
        self.warnings.push(message);
    }

    pub(crate) fn skip(&self, reason: impl Into<String>) {
        self.sink.emit(&ExtractEvent::Skipped {
            kind: self.kind,
            reason: reason.into(),
        });
    }

    pub(crate) fn record(&self, summary: impl Into<String>) {
        self.sink.emit(&ExtractEvent::Record {
            kind: self.kind,
            summary: summary.into(),
        });
    }

    pub(crate) fn totals(&self, total: f64, expenses: f64, income: f64) {
        self.sink.emit(&ExtractEvent::Totals {
            kind: self.kind,
            total,
            expenses,
            income,
        });
    }

    pub(crate) fn finish<R>(self, records: Vec<R>) -> Extraction<R> {
        self.sink.emit(&ExtractEvent::Finished {
            kind: self.kind,
            records: records.len(),
            warnings: self.warnings.len(),
        });
        Extraction {
            records,
            warnings: self.warnings,
        }
    }
}
