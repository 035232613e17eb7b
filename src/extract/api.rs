use crate::core::PayloadKind;
use crate::extract::Strategy;
use crate::fetch::Payload;
use crate::normalize::{normalize, FieldAliases};
use crate::record::FieldSet;
use serde_json::Value;

/// Highest-priority strategy: the structured product API response. The
/// whole document is handed to the normalizer; the alias table knows the
/// nested `data.product.item...` shape.
pub struct ApiStrategy;

impl Strategy for ApiStrategy {
    fn name(&self) -> &'static str {
        "structured-api"
    }

    fn wants(&self) -> PayloadKind {
        PayloadKind::Api
    }

    fn attempt(&self, payload: &Payload, aliases: &FieldAliases) -> Option<FieldSet> {
        let tree: Value = serde_json::from_str(&payload.body).ok()?;
        let fields = normalize(&tree, aliases);
        fields.is_acceptable().then_some(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn payload(body: &str) -> Payload {
        Payload {
            kind: PayloadKind::Api,
            url: Url::parse("https://api.test/123").unwrap(),
            status: 200,
            body: body.to_string(),
        }
    }

    #[test]
    fn extracts_from_a_redsky_style_document() {
        let body = r#"{
            "data": {
                "product": {
                    "tcin": "94635949",
                    "item": {
                        "product_description": { "title": "Widget Deluxe" },
                        "primary_brand": { "name": "Acme" },
                        "enrichment": {
                            "images": {
                                "primary_image_url": "https://img.test/1",
                                "alternate_image_urls": ["https://img.test/2"]
                            }
                        }
                    },
                    "price": { "current_retail": 15, "regular_retail": 20 },
                    "ratings_and_reviews": {
                        "statistics": { "rating": { "average": 4.2, "count": 87 } }
                    }
                }
            }
        }"#;

        let fields = ApiStrategy
            .attempt(&payload(body), &FieldAliases::default())
            .unwrap();

        assert_eq!(fields.title.as_deref(), Some("Widget Deluxe"));
        assert_eq!(fields.brand.as_deref(), Some("Acme"));
        assert_eq!(fields.sale_price.as_deref(), Some("$15"));
        assert_eq!(fields.regular_price.as_deref(), Some("$20"));
        assert_eq!(fields.rating_value.as_deref(), Some("4.2"));
        assert_eq!(fields.rating_count.as_deref(), Some("87"));
        assert_eq!(
            fields.image_urls,
            vec!["https://img.test/1", "https://img.test/2"]
        );
    }

    #[test]
    fn rejects_documents_without_a_title() {
        let fields = ApiStrategy.attempt(
            &payload(r#"{"errors": [{"message": "not found"}]}"#),
            &FieldAliases::default(),
        );
        assert!(fields.is_none());
    }

    #[test]
    fn rejects_unparseable_bodies() {
        let fields = ApiStrategy.attempt(&payload("<html>not json</html>"), &FieldAliases::default());
        assert!(fields.is_none());
    }
}
