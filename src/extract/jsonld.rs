use crate::core::PayloadKind;
use crate::extract::Strategy;
use crate::fetch::Payload;
use crate::normalize::{normalize, FieldAliases};
use crate::record::FieldSet;
use scraper::{Html, Selector};
use serde_json::Value;

/// Extracts the JSON-LD `Product` block from page markup. Blocks may hold a
/// single object, an array of objects, or an `@graph` wrapper.
pub struct JsonLdStrategy;

impl Strategy for JsonLdStrategy {
    fn name(&self) -> &'static str {
        "json-ld"
    }

    fn wants(&self) -> PayloadKind {
        PayloadKind::Markup
    }

    fn attempt(&self, payload: &Payload, aliases: &FieldAliases) -> Option<FieldSet> {
        let document = Html::parse_document(&payload.body);
        let selector = Selector::parse(r#"script[type="application/ld+json"]"#).unwrap();

        for script in document.select(&selector) {
            let raw = script.text().collect::<String>();
            let Ok(tree) = serde_json::from_str::<Value>(raw.trim()) else {
                continue;
            };
            if let Some(product) = product_node(&tree) {
                let fields = normalize(product, aliases);
                if fields.is_acceptable() {
                    return Some(fields);
                }
            }
        }
        None
    }
}

fn product_node(value: &Value) -> Option<&Value> {
    match value {
        Value::Object(map) => {
            if is_product_type(map.get("@type")) {
                return Some(value);
            }
            map.get("@graph").and_then(product_node)
        }
        Value::Array(items) => items.iter().find_map(product_node),
        _ => None,
    }
}

fn is_product_type(type_field: Option<&Value>) -> bool {
    match type_field {
        Some(Value::String(s)) => s == "Product",
        Some(Value::Array(items)) => items.iter().any(|v| v.as_str() == Some("Product")),
        _ => false,
    }
}
