use serde::Serialize;

/// Marks a field that did not resolve. Distinct from an empty string and
/// part of the export compatibility contract.
pub const SENTINEL: &str = "N/A";

pub const MAX_IMAGES: usize = 3;

/// Terminal outcome of a resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordStatus {
    Success,
    Invalid(String),
}

impl RecordStatus {
    pub fn label(&self) -> String {
        match self {
            RecordStatus::Success => "Success".to_string(),
            RecordStatus::Invalid(reason) => format!("Invalid: {reason}"),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RecordStatus::Success)
    }
}

/// The partially-populated field set one strategy extracted from one
/// payload. Discarded wholesale when unacceptable; never merged across
/// strategies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet {
    pub title: Option<String>,
    pub brand: Option<String>,
    pub regular_price: Option<String>,
    pub sale_price: Option<String>,
    pub rating_count: Option<String>,
    pub rating_value: Option<String>,
    pub image_urls: Vec<String>,
}

impl FieldSet {
    /// A strategy result is acceptable only when it resolved a title.
    pub fn is_acceptable(&self) -> bool {
        self.title
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty() && t != SENTINEL)
    }
}

/// The unit of output: immutable once returned. `status` is `Success` if
/// and only if `title` resolved to a non-sentinel value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRecord {
    pub tcin: String,
    pub title: String,
    pub brand: String,
    pub regular_price: String,
    pub sale_price: String,
    pub rating_count: String,
    pub rating_value: String,
    pub image_urls: Vec<String>,
    pub status: RecordStatus,
}

impl CanonicalRecord {
    pub fn from_fields(tcin: &str, mut fields: FieldSet) -> Self {
        let status = if fields.is_acceptable() {
            RecordStatus::Success
        } else {
            RecordStatus::Invalid("Could not extract product data".to_string())
        };
        let title = match status {
            RecordStatus::Success => fields.title.take().unwrap_or_else(|| SENTINEL.to_string()),
            RecordStatus::Invalid(_) => SENTINEL.to_string(),
        };
        fields.image_urls.truncate(MAX_IMAGES);

        Self {
            tcin: tcin.to_string(),
            title,
            brand: fields.brand.unwrap_or_else(|| SENTINEL.to_string()),
            regular_price: fields.regular_price.unwrap_or_else(|| SENTINEL.to_string()),
            sale_price: fields.sale_price.unwrap_or_else(|| SENTINEL.to_string()),
            rating_count: fields.rating_count.unwrap_or_else(|| SENTINEL.to_string()),
            rating_value: fields.rating_value.unwrap_or_else(|| SENTINEL.to_string()),
            image_urls: fields.image_urls,
            status,
        }
    }

    /// An all-sentinel record carrying a failure cause.
    pub fn invalid(tcin: &str, reason: impl Into<String>) -> Self {
        Self {
            tcin: tcin.to_string(),
            title: SENTINEL.to_string(),
            brand: SENTINEL.to_string(),
            regular_price: SENTINEL.to_string(),
            sale_price: SENTINEL.to_string(),
            rating_count: SENTINEL.to_string(),
            rating_value: SENTINEL.to_string(),
            image_urls: Vec::new(),
            status: RecordStatus::Invalid(reason.into()),
        }
    }

    fn image_url(&self, index: usize) -> &str {
        self.image_urls.get(index).map_or(SENTINEL, String::as_str)
    }
}

/// Flat serialization for export consumers. Key names and order are the
/// compatibility contract; do not reorder.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ExportRow {
    #[serde(rename = "TCIN")]
    pub tcin: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Brand")]
    pub brand: String,
    #[serde(rename = "Regular_Price")]
    pub regular_price: String,
    #[serde(rename = "Sale_Price")]
    pub sale_price: String,
    #[serde(rename = "Number_of_Reviews")]
    pub number_of_reviews: String,
    #[serde(rename = "Star_Rating")]
    pub star_rating: String,
    #[serde(rename = "Image_1_URL")]
    pub image_1_url: String,
    #[serde(rename = "Image_2_URL")]
    pub image_2_url: String,
    #[serde(rename = "Image_3_URL")]
    pub image_3_url: String,
    #[serde(rename = "Status")]
    pub status: String,
}

impl ExportRow {
    pub const HEADER: [&'static str; 11] = [
        "TCIN",
        "Title",
        "Brand",
        "Regular_Price",
        "Sale_Price",
        "Number_of_Reviews",
        "Star_Rating",
        "Image_1_URL",
        "Image_2_URL",
        "Image_3_URL",
        "Status",
    ];

    pub fn values(&self) -> [&str; 11] {
        [
            &self.tcin,
            &self.title,
            &self.brand,
            &self.regular_price,
            &self.sale_price,
            &self.number_of_reviews,
            &self.star_rating,
            &self.image_1_url,
            &self.image_2_url,
            &self.image_3_url,
            &self.status,
        ]
    }
}

impl From<&CanonicalRecord> for ExportRow {
    fn from(record: &CanonicalRecord) -> Self {
        Self {
            tcin: record.tcin.clone(),
            title: record.title.clone(),
            brand: record.brand.clone(),
            regular_price: record.regular_price.clone(),
            sale_price: record.sale_price.clone(),
            number_of_reviews: record.rating_count.clone(),
            star_rating: record.rating_value.clone(),
            image_1_url: record.image_url(0).to_string(),
            image_2_url: record.image_url(1).to_string(),
            image_3_url: record.image_url(2).to_string(),
            status: record.status.label(),
        }
    }
}
