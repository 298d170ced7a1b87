//! Pre-normalization record shapes shared by the extraction stages.

use shopscout_llm::ExtractedProduct;

/// Raw field values for one search-result item, as produced by any cascade
/// stage before normalization. `None` means the field could not be
/// extracted; [`crate::normalize`] turns that into the `"N/A"` sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawProduct {
    pub product_name: Option<String>,
    pub price: Option<String>,
    pub rating: Option<String>,
    pub reviews: Option<String>,
    /// Possibly relative href; made absolute during normalization.
    pub url: Option<String>,
    pub seller: Option<String>,
}

impl RawProduct {
    /// A record is kept unless BOTH product name and URL failed to resolve.
    #[must_use]
    pub fn is_discardable(&self) -> bool {
        self.product_name.is_none() && self.url.is_none()
    }
}

/// Trim a raw field value, collapsing empties and literal `"N/A"` to absent.
pub(crate) fn clean_field(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty() && v != "N/A")
}

impl From<ExtractedProduct> for RawProduct {
    fn from(p: ExtractedProduct) -> Self {
        Self {
            product_name: clean_field(p.product_name),
            price: clean_field(p.price),
            rating: clean_field(p.rating),
            reviews: clean_field(p.reviews),
            url: clean_field(p.url),
            seller: clean_field(p.seller),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discardable_only_when_name_and_url_both_missing() {
        let mut raw = RawProduct::default();
        assert!(raw.is_discardable());

        raw.product_name = Some("Mouse".to_string());
        assert!(!raw.is_discardable());

        raw.product_name = None;
        raw.url = Some("/dp/B0TEST".to_string());
        assert!(!raw.is_discardable());
    }

    #[test]
    fn clean_field_drops_sentinel_and_blank() {
        assert_eq!(clean_field(Some("  ".to_string())), None);
        assert_eq!(clean_field(Some("N/A".to_string())), None);
        assert_eq!(
            clean_field(Some(" $9.99 ".to_string())),
            Some("$9.99".to_string())
        );
        assert_eq!(clean_field(None), None);
    }

    #[test]
    fn from_extracted_product_cleans_fields() {
        let extracted = ExtractedProduct {
            product_name: Some("Mouse".to_string()),
            price: Some("N/A".to_string()),
            rating: None,
            reviews: Some("".to_string()),
            url: Some("https://x.com/p/1".to_string()),
            seller: Some("  ".to_string()),
        };
        let raw = RawProduct::from(extracted);
        assert_eq!(raw.product_name.as_deref(), Some("Mouse"));
        assert!(raw.price.is_none());
        assert!(raw.reviews.is_none());
        assert!(raw.seller.is_none());
        assert_eq!(raw.url.as_deref(), Some("https://x.com/p/1"));
    }
}
