use crate::record::{FieldSet, MAX_IMAGES, SENTINEL};
use serde_json::Value;

/// Bounded depth for the generic key search; source trees are deeply nested
/// but never usefully beyond this.
const MAX_DEPTH: usize = 8;

/// Ordered key-name aliases per canonical field. The source schema is
/// unstable, so this is a versioned, caller-replaceable table rather than a
/// constant: the first alias present with a non-empty value wins. Entries
/// may be dotted paths (`product_description.title`); the first segment is
/// located anywhere in the tree, the rest is followed strictly.
#[derive(Debug, Clone)]
pub struct FieldAliases {
    pub title: Vec<String>,
    pub brand: Vec<String>,
    pub regular_price: Vec<String>,
    pub sale_price: Vec<String>,
    pub rating_count: Vec<String>,
    pub rating_value: Vec<String>,
    /// Image aliases accumulate across entries until the cap is reached.
    pub images: Vec<String>,
}

fn aliases(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

impl Default for FieldAliases {
    fn default() -> Self {
        Self {
            title: aliases(&["title", "display_name", "product_description.title", "name"]),
            brand: aliases(&["brand.name", "primary_brand.name", "brand", "manufacturer"]),
            regular_price: aliases(&[
                "price.regular_retail",
                "regular_retail",
                "price.reg_retail",
                "regular_price",
                "offers.price",
                "price.formatted_comparison_price",
                "price",
            ]),
            sale_price: aliases(&[
                "price.current_retail",
                "current_retail",
                "sale_price",
                "offers.price",
                "price.formatted_current_price",
                "price",
            ]),
            rating_count: aliases(&[
                "statistics.rating.count",
                "aggregateRating.reviewCount",
                "reviewCount",
                "review_count",
                "total_reviews",
            ]),
            rating_value: aliases(&[
                "statistics.rating.average",
                "aggregateRating.ratingValue",
                "ratingValue",
                "average_rating",
                "rating.average",
            ]),
            images: aliases(&[
                "enrichment.images.primary_image_url",
                "enrichment.images.alternate_image_urls",
                "image",
                "images",
                "image_urls",
            ]),
        }
    }
}

/// Map one strategy's raw matched tree into the canonical field set.
/// Unresolved fields stay `None`; nothing is fabricated beyond the price
/// mirroring the source itself implies (a single listed price is both the
/// regular and the sale price).
pub fn normalize(tree: &Value, aliases: &FieldAliases) -> FieldSet {
    let mut fields = FieldSet {
        title: resolve_string(tree, &aliases.title),
        brand: resolve_string(tree, &aliases.brand),
        regular_price: resolve_string(tree, &aliases.regular_price).map(|p| format_price(&p)),
        sale_price: resolve_string(tree, &aliases.sale_price).map(|p| format_price(&p)),
        rating_count: resolve_string(tree, &aliases.rating_count),
        rating_value: resolve_string(tree, &aliases.rating_value),
        image_urls: collect_images(tree, &aliases.images),
    };

    if fields.sale_price.is_none() {
        fields.sale_price = fields.regular_price.clone();
    }
    if fields.regular_price.is_none() {
        fields.regular_price = fields.sale_price.clone();
    }

    fields
}

/// Prefix with the currency symbol when the source value lacks one.
pub fn format_price(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('$') {
        trimmed.to_string()
    } else {
        format!("${trimmed}")
    }
}

fn resolve_string(tree: &Value, aliases: &[String]) -> Option<String> {
    aliases
        .iter()
        .find_map(|alias| find_alias(tree, alias).and_then(value_to_string))
}

/// Locate the first alias segment anywhere within the depth bound, then
/// follow the remaining dotted segments strictly, unwrapping arrays to
/// their first element along the way.
fn find_alias<'a>(root: &'a Value, alias: &str) -> Option<&'a Value> {
    let mut segments = alias.split('.');
    let mut node = find_key(root, segments.next()?, MAX_DEPTH)?;
    for segment in segments {
        while let Value::Array(items) = node {
            node = items.first()?;
        }
        node = node.as_object()?.get(segment)?;
    }
    Some(node)
}

/// Depth-first search for a key in a tree of unknown shape.
fn find_key<'a>(node: &'a Value, key: &str, depth: usize) -> Option<&'a Value> {
    if depth == 0 {
        return None;
    }
    match node {
        Value::Object(map) => {
            if let Some(value) = map.get(key) {
                return Some(value);
            }
            map.values().find_map(|child| find_key(child, key, depth - 1))
        }
        Value::Array(items) => items
            .iter()
            .find_map(|child| find_key(child, key, depth - 1)),
        _ => None,
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty() && trimmed != SENTINEL).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map.get("name").and_then(value_to_string),
        _ => None,
    }
}

/// Gather image URLs in depth-first encounter order across the alias list,
/// capped at `MAX_IMAGES`, duplicates dropped.
fn collect_images(tree: &Value, aliases: &[String]) -> Vec<String> {
    let mut urls = Vec::new();
    for alias in aliases {
        if let Some(node) = find_alias(tree, alias) {
            collect_urls(node, &mut urls, MAX_DEPTH);
        }
        if urls.len() >= MAX_IMAGES {
            break;
        }
    }
    urls.truncate(MAX_IMAGES);
    urls
}

fn collect_urls(node: &Value, out: &mut Vec<String>, depth: usize) {
    if depth == 0 || out.len() >= MAX_IMAGES {
        return;
    }
    match node {
        Value::String(s) => {
            let trimmed = s.trim();
            if !trimmed.is_empty() && trimmed != SENTINEL && !out.iter().any(|u| u == trimmed) {
                out.push(trimmed.to_string());
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_urls(item, out, depth - 1);
            }
        }
        Value::Object(map) => {
            for value in map.values() {
                collect_urls(value, out, depth - 1);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn jsonld_product_normalizes_per_contract() {
        let tree = json!({
            "@type": "Product",
            "name": "Widget",
            "offers": { "price": "19.99" },
            "image": ["u1", "u2"],
        });
        let fields = normalize(&tree, &FieldAliases::default());

        assert_eq!(fields.title.as_deref(), Some("Widget"));
        assert_eq!(fields.regular_price.as_deref(), Some("$19.99"));
        assert_eq!(fields.sale_price.as_deref(), Some("$19.99"));
        assert_eq!(fields.image_urls, vec!["u1", "u2"]);
    }

    #[test]
    fn current_and_regular_retail_never_swap() {
        let tree = json!({
            "product": {
                "title": "Widget",
                "price": { "current_retail": 15, "regular_retail": 20 },
            }
        });
        let fields = normalize(&tree, &FieldAliases::default());

        assert_eq!(fields.sale_price.as_deref(), Some("$15"));
        assert_eq!(fields.regular_price.as_deref(), Some("$20"));
    }

    #[test]
    fn single_price_populates_both_fields() {
        let tree = json!({ "title": "Widget", "price": { "current_retail": 9.49 } });
        let fields = normalize(&tree, &FieldAliases::default());

        assert_eq!(fields.sale_price.as_deref(), Some("$9.49"));
        assert_eq!(fields.regular_price.as_deref(), Some("$9.49"));
    }

    #[test]
    fn alias_order_decides_ties() {
        // A redsky-style nested title must lose to a top-level one.
        let tree = json!({
            "title": "Top",
            "item": { "product_description": { "title": "Nested" } },
        });
        let fields = normalize(&tree, &FieldAliases::default());
        assert_eq!(fields.title.as_deref(), Some("Top"));

        let tree = json!({
            "item": { "product_description": { "title": "Nested" } },
        });
        let fields = normalize(&tree, &FieldAliases::default());
        assert_eq!(fields.title.as_deref(), Some("Nested"));
    }

    #[test]
    fn nested_rating_statistics_win_over_flat_fields() {
        let tree = json!({
            "title": "Widget",
            "ratings_and_reviews": {
                "statistics": { "rating": { "average": 4.5, "count": 120 } },
            },
            "average_rating": 1.0,
        });
        let fields = normalize(&tree, &FieldAliases::default());

        assert_eq!(fields.rating_value.as_deref(), Some("4.5"));
        assert_eq!(fields.rating_count.as_deref(), Some("120"));
    }

    #[test]
    fn offers_array_unwraps_to_first_entry() {
        let tree = json!({
            "name": "Widget",
            "offers": [ { "price": "12.50" }, { "price": "99.99" } ],
        });
        let fields = normalize(&tree, &FieldAliases::default());
        assert_eq!(fields.sale_price.as_deref(), Some("$12.50"));
    }

    #[test]
    fn brand_resolves_from_object_or_string() {
        let tree = json!({ "name": "Widget", "brand": { "name": "Acme" } });
        let fields = normalize(&tree, &FieldAliases::default());
        assert_eq!(fields.brand.as_deref(), Some("Acme"));

        let tree = json!({ "name": "Widget", "brand": "Acme" });
        let fields = normalize(&tree, &FieldAliases::default());
        assert_eq!(fields.brand.as_deref(), Some("Acme"));
    }

    #[test]
    fn primary_image_precedes_alternates() {
        let tree = json!({
            "title": "Widget",
            "enrichment": {
                "images": {
                    "primary_image_url": "https://img.test/primary",
                    "alternate_image_urls": [
                        "https://img.test/alt1",
                        "https://img.test/alt2",
                        "https://img.test/alt3",
                    ],
                }
            }
        });
        let fields = normalize(&tree, &FieldAliases::default());

        assert_eq!(
            fields.image_urls,
            vec![
                "https://img.test/primary",
                "https://img.test/alt1",
                "https://img.test/alt2",
            ]
        );
    }

    #[test]
    fn sentinel_and_empty_values_do_not_resolve() {
        let tree = json!({ "title": "N/A", "display_name": "", "name": "Widget" });
        let fields = normalize(&tree, &FieldAliases::default());
        assert_eq!(fields.title.as_deref(), Some("Widget"));
    }

    #[test]
    fn unresolved_fields_stay_unresolved() {
        let tree = json!({ "name": "Widget" });
        let fields = normalize(&tree, &FieldAliases::default());

        assert!(fields.is_acceptable());
        assert_eq!(fields.brand, None);
        assert_eq!(fields.rating_value, None);
        assert!(fields.image_urls.is_empty());
    }

    #[test]
    fn price_formatting_is_idempotent() {
        assert_eq!(format_price("19.99"), "$19.99");
        assert_eq!(format_price("$19.99"), "$19.99");
    }
}
