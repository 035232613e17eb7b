use crate::core::PayloadKind;
use crate::extract::Strategy;
use crate::fetch::Payload;
use crate::normalize::{format_price, FieldAliases};
use crate::record::{FieldSet, MAX_IMAGES};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

const TITLE_SELECTORS: [&str; 3] = [
    r#"h1[data-test="product-title"]"#,
    r#"[data-test="product-title"]"#,
    "h1",
];

const BRAND_SELECTORS: [&str; 3] = [
    r#"[data-test="product-brand"] a"#,
    r#"[data-test="product-brand"]"#,
    r#"a[href*="/b/"]"#,
];

const PRICE_SELECTORS: [&str; 2] = [
    r#"[data-test="product-price"] span"#,
    r#"[data-test="product-price"]"#,
];

const IMAGE_SELECTORS: [&str; 3] = [
    r#"[data-test="hero-image-carousel"] img"#,
    r#"[data-test="product-image"] img"#,
    "img",
];

/// Last-resort extraction straight from the markup, using the known
/// data-test attributes with progressively looser fallbacks.
pub struct MarkupStrategy;

impl Strategy for MarkupStrategy {
    fn name(&self) -> &'static str {
        "raw-markup"
    }

    fn wants(&self) -> PayloadKind {
        PayloadKind::Markup
    }

    fn attempt(&self, payload: &Payload, _aliases: &FieldAliases) -> Option<FieldSet> {
        let document = Html::parse_document(&payload.body);

        let mut fields = FieldSet {
            title: first_text(&document, &TITLE_SELECTORS).or_else(|| page_title(&document)),
            brand: first_text(&document, &BRAND_SELECTORS),
            ..FieldSet::default()
        };

        let prices = price_texts(&document);
        match prices.as_slice() {
            [] => {}
            [only] => {
                fields.sale_price = Some(format_price(only));
                fields.regular_price = Some(format_price(only));
            }
            [sale, regular, ..] => {
                fields.sale_price = Some(format_price(sale));
                fields.regular_price = Some(format_price(regular));
            }
        }

        (fields.rating_value, fields.rating_count) = ratings(&document);
        fields.image_urls = image_urls(&document);

        fields.is_acceptable().then_some(fields)
    }
}

fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn first_text(document: &Html, selectors: &[&str]) -> Option<String> {
    selectors.iter().find_map(|raw| {
        let selector = Selector::parse(raw).unwrap();
        document
            .select(&selector)
            .map(element_text)
            .find(|text| !text.is_empty())
    })
}

/// The `<title>` tag, with the site suffix stripped.
fn page_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").unwrap();
    let text = document.select(&selector).map(element_text).next()?;
    let cleaned = text.split(" : ").next().unwrap_or(&text).trim().to_string();
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Dollar-bearing price texts in document order. The current (sale) price
/// renders before the struck-through regular price.
fn price_texts(document: &Html) -> Vec<String> {
    for raw in PRICE_SELECTORS {
        let selector = Selector::parse(raw).unwrap();
        let prices: Vec<String> = document
            .select(&selector)
            .map(element_text)
            .filter(|text| text.contains('$'))
            .collect();
        if !prices.is_empty() {
            return prices;
        }
    }
    Vec::new()
}

fn ratings(document: &Html) -> (Option<String>, Option<String>) {
    let container = Selector::parse(r#"[data-test="ratings-and-reviews"]"#).unwrap();
    let Some(element) = document.select(&container).next() else {
        return (None, None);
    };
    let text = element_text(element);

    let value = Regex::new(r"(\d+\.?\d*)\s*out of")
        .ok()
        .and_then(|re| re.captures(&text))
        .map(|caps| caps[1].to_string());
    let count = Regex::new(r"(\d[\d,]*)\s*(?:reviews|ratings)")
        .ok()
        .and_then(|re| re.captures(&text))
        .map(|caps| caps[1].replace(',', ""));

    (value, count)
}

fn image_urls(document: &Html) -> Vec<String> {
    for raw in IMAGE_SELECTORS {
        let selector = Selector::parse(raw).unwrap();
        let urls: Vec<String> = document
            .select(&selector)
            .filter_map(|img| img.value().attr("src"))
            .filter(|src| src.starts_with("http"))
            .map(str::to_string)
            .take(MAX_IMAGES)
            .collect();
        if !urls.is_empty() {
            return urls;
        }
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn payload(body: &str) -> Payload {
        Payload {
            kind: PayloadKind::Markup,
            url: Url::parse("https://page.test/p/-/A-123").unwrap(),
            status: 200,
            body: body.to_string(),
        }
    }

    #[test]
    fn extracts_fields_from_data_test_markup() {
        let body = r#"<html><body>
            <h1 data-test="product-title">Widget Deluxe</h1>
            <div data-test="product-brand"><a href="/b/acme">Acme</a></div>
            <div data-test="product-price"><span>$15.00</span><span>$20.00</span></div>
            <div data-test="ratings-and-reviews">4.5 out of 5 stars with 120 reviews</div>
            <div data-test="hero-image-carousel">
                <img src="https://img.test/1"/><img src="https://img.test/2"/>
                <img src="https://img.test/3"/><img src="https://img.test/4"/>
            </div>
        </body></html>"#;

        let fields = MarkupStrategy
            .attempt(&payload(body), &FieldAliases::default())
            .unwrap();

        assert_eq!(fields.title.as_deref(), Some("Widget Deluxe"));
        assert_eq!(fields.brand.as_deref(), Some("Acme"));
        assert_eq!(fields.sale_price.as_deref(), Some("$15.00"));
        assert_eq!(fields.regular_price.as_deref(), Some("$20.00"));
        assert_eq!(fields.rating_value.as_deref(), Some("4.5"));
        assert_eq!(fields.rating_count.as_deref(), Some("120"));
        assert_eq!(fields.image_urls.len(), 3);
    }

    #[test]
    fn single_price_fills_both_fields() {
        let body = r#"<h1>Widget</h1><div data-test="product-price">$9.99</div>"#;
        let fields = MarkupStrategy
            .attempt(&payload(body), &FieldAliases::default())
            .unwrap();

        assert_eq!(fields.sale_price.as_deref(), Some("$9.99"));
        assert_eq!(fields.regular_price.as_deref(), Some("$9.99"));
    }

    #[test]
    fn falls_back_to_the_page_title_tag() {
        let body = "<html><head><title>Widget : Target</title></head><body></body></html>";
        let fields = MarkupStrategy
            .attempt(&payload(body), &FieldAliases::default())
            .unwrap();

        assert_eq!(fields.title.as_deref(), Some("Widget"));
    }

    #[test]
    fn relative_image_sources_are_ignored() {
        let body = r#"<h1>Widget</h1><img src="/assets/sprite.png"/><img src="https://img.test/1"/>"#;
        let fields = MarkupStrategy
            .attempt(&payload(body), &FieldAliases::default())
            .unwrap();

        assert_eq!(fields.image_urls, vec!["https://img.test/1"]);
    }

    #[test]
    fn a_page_without_a_title_is_not_acceptable() {
        let body = r#"<div data-test="product-price">$9.99</div>"#;
        let fields = MarkupStrategy.attempt(&payload(body), &FieldAliases::default());
        assert!(fields.is_none());
    }
}
