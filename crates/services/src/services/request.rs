//! Argument shapes shared by every entity operation.

use db::models::pagination::Pagination;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Filter plus paging, the argument of `all*` operations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListRequest<F> {
    #[serde(flatten)]
    pub filter: F,
    #[serde(flatten)]
    pub page: Pagination,
}

/// Record id plus the fields to change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRequest<T> {
    pub id: Uuid,
    #[serde(flatten)]
    pub changes: T,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct DeleteRequest {
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct DeleteResult {
    pub deleted: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CountResult {
    #[ts(type = "number")]
    pub count: i64,
}

/// Trimmed value of a mandatory text field
pub fn required_text(label: &str, value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(format!("{label} is required"))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Trimmed optional text, blank becomes `None`
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trimmed clearable field. Absent stays absent, blank or `null` clears.
pub fn clearable_text(value: &Option<Option<String>>) -> Option<Option<String>> {
    value.clone().map(optional_text)
}

#[cfg(test)]
mod tests {
    use db::models::farmer_profile::FarmerProfileFilter;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_list_request_reads_filter_and_page_from_one_object() {
        let request: ListRequest<FarmerProfileFilter> =
            serde_json::from_value(json!({ "district": "Baucau", "limit": 10, "offset": 20 }))
                .unwrap();
        assert_eq!(request.filter.district.as_deref(), Some("Baucau"));
        assert_eq!(request.page.limit(), 10);
        assert_eq!(request.page.offset(), 20);
    }

    #[test]
    fn test_required_text() {
        assert_eq!(required_text("Name", "  Maria ").unwrap(), "Maria");
        assert_eq!(required_text("Name", "   ").unwrap_err(), "Name is required");
        assert_eq!(optional_text(Some("  ".to_string())), None);
    }

    #[test]
    fn test_clearable_text() {
        assert_eq!(clearable_text(&None), None);
        assert_eq!(clearable_text(&Some(None)), Some(None));
        assert_eq!(clearable_text(&Some(Some("  ".to_string()))), Some(None));
        assert_eq!(
            clearable_text(&Some(Some(" 7700 ".to_string()))),
            Some(Some("7700".to_string()))
        );
    }
}
