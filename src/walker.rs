// 🌳 Tree Walker - Text/Image Collector and Identifier Locator
// Pure recursive functions over serde_json::Value; no state survives a call

use serde_json::Value;

// ============================================================================
// STRUCTURAL MARKERS
// ============================================================================

/// Field carrying the GraphQL type tag of a node
pub const TYPENAME: &str = "__typename";

pub const FORMATTED_TEXT: &str = "FabricComposableFormattedText";
pub const IMAGE: &str = "FabricComposableImage";
pub const ROW_VIEW: &str = "KPLRowView";
pub const DATA_VISUALIZATION_GROUP: &str = "FabricDataVisualizationGroup";

/// Card artwork is served from this CDN; icons and warnings are not
pub const CONTENT_CDN: &str = "ck-content.imgix.net";

pub const ACCOUNT_ID: &str = "accountId";
pub const DESTINATION_BODY: &str = "destinationBody";

// ============================================================================
// SMALL ACCESSORS
// ============================================================================

/// The node's `__typename`, if it is an object carrying one
pub fn marker(node: &Value) -> Option<&str> {
    node.get(TYPENAME).and_then(Value::as_str)
}

/// Follow a fixed chain of object keys. Any miss yields `None`.
pub fn path<'a>(root: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().try_fold(root, |node, key| node.get(*key))
}

/// Object field that treats JSON `null` like an absent key
pub fn field<'a>(node: &'a Value, key: &str) -> Option<&'a Value> {
    node.get(key).filter(|value| !value.is_null())
}

/// Trimmed text of every span under `node.spans`, in order
pub fn span_texts(node: &Value) -> impl Iterator<Item = &str> {
    node.get("spans")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|span| span.get("text").and_then(Value::as_str))
        .map(str::trim)
}

/// First non-empty span text under `node.spans`
pub fn first_span(node: &Value) -> Option<&str> {
    span_texts(node).find(|text| !text.is_empty())
}

/// First span text under `node.spans` accepted by `accept`
pub fn first_span_where<'a>(node: &'a Value, accept: impl Fn(&str) -> bool) -> Option<&'a str> {
    span_texts(node).find(|text| !text.is_empty() && accept(text))
}

/// A scalar as CSV cell text: strings verbatim, numbers/bools as JSON, null as empty
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `node.key` as cell text, empty when missing or null
pub fn text_field(node: &Value, key: &str) -> String {
    node.get(key).map(scalar_text).unwrap_or_default()
}

// ============================================================================
// TEXT/IMAGE COLLECTOR
// ============================================================================

/// Texts and card images found under one subtree, in pre-order
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Collected {
    pub texts: Vec<String>,
    pub images: Vec<String>,
}

/// Walk `node` depth-first and gather every formatted-text span and
/// every content-CDN image.
///
/// A node matching a marker is still descended into, so nested matches
/// are collected after their parent's.
pub fn collect(node: &Value) -> Collected {
    let mut collected = Collected::default();
    collect_into(node, &mut collected);
    collected
}

fn collect_into(node: &Value, out: &mut Collected) {
    match node {
        Value::Object(map) => {
            match marker(node) {
                Some(FORMATTED_TEXT) => {
                    if let Some(model) = node.get("composableFormattedTextModel") {
                        out.texts.extend(
                            span_texts(model)
                                .filter(|text| !text.is_empty())
                                .map(str::to_string),
                        );
                    }
                }
                Some(IMAGE) => {
                    let url = path(node, &["composableImageModel", "imageUrl"])
                        .and_then(Value::as_str)
                        .unwrap_or("");
                    if url.contains(CONTENT_CDN) {
                        out.images.push(url.to_string());
                    }
                }
                _ => {}
            }

            for value in map.values() {
                collect_into(value, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_into(item, out);
            }
        }
        _ => {}
    }
}

// ============================================================================
// IDENTIFIER LOCATOR
// ============================================================================

/// First account id under `node`, by depth-first traversal.
///
/// Field order matters: with `preserve_order` the walk follows the
/// document as received, so the first id in the response wins.
pub fn find_account_id(node: &Value) -> Option<String> {
    match node {
        Value::Object(map) => {
            if let Some(id) = map.get(ACCOUNT_ID) {
                // A present-but-empty id ends the search in this subtree
                return id_text(id);
            }
            if let Some(id) = map
                .get(DESTINATION_BODY)
                .and_then(|body| body.get(ACCOUNT_ID))
            {
                return id_text(id);
            }
            map.values().find_map(find_account_id)
        }
        Value::Array(items) => items.iter().find_map(find_account_id),
        _ => None,
    }
}

fn id_text(id: &Value) -> Option<String> {
    match id {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_text(spans: &[&str]) -> Value {
        json!({
            "__typename": FORMATTED_TEXT,
            "composableFormattedTextModel": {
                "spans": spans.iter().map(|t| json!({ "text": t })).collect::<Vec<_>>()
            }
        })
    }

    fn create_image(url: &str) -> Value {
        json!({
            "__typename": IMAGE,
            "composableImageModel": { "imageUrl": url }
        })
    }

    #[test]
    fn test_collect_texts_in_preorder() {
        let tree = json!({
            "header": create_text(&["  Chase Freedom  ", ""]),
            "body": [
                create_text(&["$1,234.56"]),
                { "nested": { "deeper": create_text(&["Today"]) } }
            ]
        });

        let collected = collect(&tree);

        assert_eq!(collected.texts, vec!["Chase Freedom", "$1,234.56", "Today"]);
        assert!(collected.images.is_empty());
    }

    #[test]
    fn test_collect_filters_decorative_images() {
        let tree = json!([
            create_image("https://icons.example.com/warning.png"),
            create_image("https://ck-content.imgix.net/cards/freedom.png"),
            { "__typename": IMAGE }
        ]);

        let collected = collect(&tree);

        assert_eq!(
            collected.images,
            vec!["https://ck-content.imgix.net/cards/freedom.png"]
        );
    }

    #[test]
    fn test_collect_descends_into_matched_nodes() {
        let mut outer = create_text(&["outer"]);
        outer["child"] = create_text(&["inner"]);

        assert_eq!(collect(&outer).texts, vec!["outer", "inner"]);
    }

    #[test]
    fn test_collect_ignores_non_string_spans() {
        let tree = json!({
            "__typename": FORMATTED_TEXT,
            "composableFormattedTextModel": { "spans": [{ "text": 42 }, { "text": "ok" }, "bare"] }
        });

        assert_eq!(collect(&tree).texts, vec!["ok"]);
    }

    #[test]
    fn test_collect_scalars_yield_nothing() {
        assert_eq!(collect(&json!("text")), Collected::default());
        assert_eq!(collect(&json!(null)), Collected::default());
    }

    #[test]
    fn test_find_account_id_direct() {
        assert_eq!(
            find_account_id(&json!({ "accountId": "abc" })),
            Some("abc".to_string())
        );
    }

    #[test]
    fn test_find_account_id_checks_destination_body_before_recursing() {
        let tree = json!({
            "first": { "accountId": "from-sibling" },
            "destinationBody": { "accountId": "from-destination" }
        });

        assert_eq!(find_account_id(&tree), Some("from-destination".to_string()));
    }

    #[test]
    fn test_find_account_id_first_in_document_order_wins() {
        let tree = json!({
            "a": [{ "x": 1 }, { "action": { "accountId": "first" } }],
            "b": { "accountId": "second" }
        });

        assert_eq!(find_account_id(&tree), Some("first".to_string()));
    }

    #[test]
    fn test_find_account_id_empty_value_moves_to_next_sibling() {
        let tree = json!({
            "a": { "accountId": "", "child": { "accountId": "hidden" } },
            "b": { "accountId": 991 }
        });

        assert_eq!(find_account_id(&tree), Some("991".to_string()));
    }

    #[test]
    fn test_find_account_id_missing() {
        assert_eq!(find_account_id(&json!({ "a": [1, 2, { "b": null }] })), None);
    }

    #[test]
    fn test_path_and_spans() {
        let view = json!({ "rowTitle": { "spans": [{ "text": " " }, { "text": " Checking " }] } });

        assert_eq!(path(&view, &["rowTitle", "missing"]), None);
        assert_eq!(first_span(&view["rowTitle"]), Some("Checking"));
        assert_eq!(first_span_where(&view["rowTitle"], |t| t.starts_with('$')), None);
    }

    #[test]
    fn test_scalar_text() {
        assert_eq!(scalar_text(&json!(-50.0)), "-50.0");
        assert_eq!(scalar_text(&json!(100)), "100");
        assert_eq!(scalar_text(&json!("n/a")), "n/a");
        assert_eq!(scalar_text(&json!(null)), "");
    }
}
