// 📈 Investment History
// Chart points recovered from data-visualization groups: sets → lines → points

use super::balances::card_views;
use crate::error::{ExtractError, ExtractResult};
use crate::events::{EventSink, Reporter};
use crate::parser::{json_type, Extraction, Extractor, SourceKind, TableRow};
use crate::walker::{
    field, first_span, first_span_where, marker, text_field, DATA_VISUALIZATION_GROUP,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const FIELDNAMES: [&str; 5] = ["date", "value", "raw_value", "period", "data_point_index"];

/// How many records to preview from each end of the series
const PREVIEW: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPointRecord {
    /// X-axis label, e.g. `Jan 2024`
    pub date: String,
    /// Formatted Y-axis label, e.g. `$1,234`
    pub value: String,
    /// `yValue` as received
    pub raw_value: String,
    /// `dataSetKey` of the series this point belongs to
    pub period: String,
    /// `xValue` as received
    pub data_point_index: String,
}

impl TableRow for HistoryPointRecord {
    fn values(&self) -> Vec<String> {
        vec![
            self.date.clone(),
            self.value.clone(),
            self.raw_value.clone(),
            self.period.clone(),
            self.data_point_index.clone(),
        ]
    }
}

/// Iterate the array at `node.key`; anything else is an empty list
fn list<'a>(node: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    node.get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

pub struct HistoryExtractor;

impl HistoryExtractor {
    pub fn new() -> Self {
        HistoryExtractor
    }

    /// `None` unless both the date label and a `$` value label are present
    pub fn read_point(point: &Value, period: &str) -> Option<HistoryPointRecord> {
        let date = field(point, "xValueLabel").and_then(first_span)?;
        let value = field(point, "yValueLabel")
            .and_then(|label| first_span_where(label, |text| text.starts_with('$')))?;

        Some(HistoryPointRecord {
            date: date.to_string(),
            value: value.to_string(),
            raw_value: text_field(point, "yValue"),
            period: period.to_string(),
            data_point_index: text_field(point, "xValue"),
        })
    }

    fn preview(reporter: &Reporter<'_>, points: &[HistoryPointRecord]) {
        let describe = |p: &HistoryPointRecord| format!("{}: {} (raw: {})", p.date, p.value, p.raw_value);

        for point in points.iter().take(PREVIEW) {
            reporter.record(describe(point));
        }
        if points.len() > PREVIEW * 2 {
            for point in &points[points.len() - PREVIEW..] {
                reporter.record(describe(point));
            }
        }
    }
}

impl Default for HistoryExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for HistoryExtractor {
    type Record = HistoryPointRecord;

    fn kind(&self) -> SourceKind {
        SourceKind::InvestmentHistory
    }

    fn fieldnames(&self) -> Vec<&'static str> {
        FIELDNAMES.to_vec()
    }

    fn extract(
        &self,
        root: &Value,
        sink: &dyn EventSink,
    ) -> ExtractResult<Extraction<HistoryPointRecord>> {
        if !root.is_object() {
            return Err(ExtractError::UnexpectedRoot {
                kind: SourceKind::InvestmentHistory,
                expected: "object",
                found: json_type(root),
            });
        }

        let mut reporter = Reporter::start(SourceKind::InvestmentHistory, sink);
        let mut points = Vec::new();
        let mut dropped = 0usize;

        for view in card_views(root, &mut reporter) {
            if marker(view) != Some(DATA_VISUALIZATION_GROUP) {
                continue;
            }

            for data_set in list(view, "dataVisualizationGroupDataSets") {
                let period = text_field(data_set, "dataSetKey");
                let Some(series) = field(data_set, "dataVisualizationDataSet") else {
                    continue;
                };

                for line in list(series, "lines") {
                    for point in list(line, "points") {
                        match Self::read_point(point, &period) {
                            Some(record) => points.push(record),
                            None => dropped += 1,
                        }
                    }
                }
            }
        }

        if dropped > 0 {
            reporter.skip(format!("{} points without a date or value label", dropped));
        }
        Self::preview(&reporter, &points);

        Ok(reporter.finish(points))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ExtractEvent, MemorySink};
    use serde_json::json;

    fn label(text: &str) -> Value {
        json!({ "spans": [{ "text": text }] })
    }

    fn create_point(x: Option<&str>, y: Option<&str>, index: i64, raw: f64) -> Value {
        let mut point = json!({ "xValue": index, "yValue": raw });
        if let Some(x) = x {
            point["xValueLabel"] = label(x);
        }
        if let Some(y) = y {
            point["yValueLabel"] = label(y);
        }
        point
    }

    fn create_root(data_sets: Value) -> Value {
        json!({
            "data": { "prime": { "networthByAccountType": { "cards": [{ "item": { "views": [
                { "__typename": "KPLRowView" },
                {
                    "__typename": "FabricDataVisualizationGroup",
                    "dataVisualizationGroupDataSets": data_sets
                }
            ] } }] } } }
        })
    }

    #[test]
    fn test_point_with_both_labels() {
        let point = create_point(Some("Jan 2024"), Some("$1,234"), 0, 1234.0);

        let record = HistoryExtractor::read_point(&point, "ONE_YEAR").unwrap();

        assert_eq!(record.date, "Jan 2024");
        assert_eq!(record.value, "$1,234");
        assert_eq!(record.raw_value, "1234.0");
        assert_eq!(record.period, "ONE_YEAR");
        assert_eq!(record.data_point_index, "0");
    }

    #[test]
    fn test_point_missing_label_dropped() {
        assert!(HistoryExtractor::read_point(&create_point(None, Some("$5"), 1, 5.0), "P").is_none());
        assert!(HistoryExtractor::read_point(&create_point(Some("Feb"), None, 1, 5.0), "P").is_none());
        assert!(
            HistoryExtractor::read_point(&create_point(Some("Feb"), Some("5 USD"), 1, 5.0), "P")
                .is_none()
        );
    }

    #[test]
    fn test_series_order_is_preserved() {
        let sink = MemorySink::new();
        let root = create_root(json!([
            { "dataSetKey": "ONE_MONTH", "dataVisualizationDataSet": { "lines": [
                { "points": [
                    create_point(Some("Jan 1"), Some("$10"), 0, 10.0),
                    create_point(Some("Jan 2"), None, 1, 11.0),
                    create_point(Some("Jan 3"), Some("$12"), 2, 12.0)
                ] }
            ] } },
            { "dataSetKey": "ONE_YEAR", "dataVisualizationDataSet": { "lines": [
                { "points": [create_point(Some("2023"), Some("$9"), 0, 9.0)] }
            ] } }
        ]));

        let extraction = HistoryExtractor::new().extract(&root, &sink).unwrap();

        let dates: Vec<&str> = extraction.records.iter().map(|r| r.date.as_str()).collect();
        assert_eq!(dates, vec!["Jan 1", "Jan 3", "2023"]);
        assert_eq!(extraction.records[2].period, "ONE_YEAR");
        assert!(sink.events().iter().any(|e| matches!(
            e,
            ExtractEvent::Skipped { reason, .. } if reason.starts_with("1 points")
        )));
    }

    #[test]
    fn test_preview_first_and_last_three() {
        let sink = MemorySink::new();
        let points: Vec<Value> = (0..8)
            .map(|i| create_point(Some(&format!("Day {}", i)), Some("$1"), i, 1.0))
            .collect();
        let root = create_root(json!([
            { "dataSetKey": "ONE_WEEK", "dataVisualizationDataSet": { "lines": [{ "points": points }] } }
        ]));

        HistoryExtractor::new().extract(&root, &sink).unwrap();

        let previews: Vec<String> = sink
            .events()
            .into_iter()
            .filter_map(|e| match e {
                ExtractEvent::Record { summary, .. } => Some(summary),
                _ => None,
            })
            .collect();
        assert_eq!(previews.len(), 6);
        assert!(previews[0].starts_with("Day 0:"));
        assert!(previews[5].starts_with("Day 7:"));
    }

    #[test]
    fn test_no_visualization_group_is_empty() {
        let sink = MemorySink::new();
        let root = json!({ "data": { "prime": { "networthByAccountType": { "cards": [] } } } });

        assert!(HistoryExtractor::new().extract(&root, &sink).unwrap().is_empty());
    }
}
