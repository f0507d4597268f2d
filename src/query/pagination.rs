//! Page metadata and navigation links

use serde::Serialize;
use url::form_urlencoded;
use utoipa::ToSchema;

use super::QuerySpec;

/// Pagination block attached to every list response
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
    pub total_records: i64,
    /// Link to the current page
    pub current_page: String,
    /// Absent on the last page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page: Option<String>,
    /// Absent on the first page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_page: Option<String>,
}

impl Pagination {
    /// Build metadata for `spec` given the filtered total; links are rooted at `base_path`
    pub fn new(spec: &QuerySpec, total_records: i64, base_path: &str) -> Self {
        let per_page = i64::from(spec.per_page.max(1));
        let total_pages = ((total_records.max(0) + per_page - 1) / per_page) as u32;

        let next_page = (spec.page < total_pages).then(|| page_link(spec, base_path, spec.page + 1));
        let previous_page = (spec.page > 1).then(|| page_link(spec, base_path, spec.page - 1));

        Self {
            page: spec.page,
            per_page: spec.per_page,
            total_pages,
            total_records,
            current_page: page_link(spec, base_path, spec.page),
            next_page,
            previous_page,
        }
    }
}

/// Link to `page` of the same query: every filter, order and fieldset is kept
fn page_link(spec: &QuerySpec, base_path: &str, page: u32) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());

    for filter in &spec.filters {
        query.append_pair(&filter.key(), &filter.raw);
    }

    if !spec.order.is_empty() {
        let order: Vec<String> = spec
            .order
            .iter()
            .map(|key| match key.direction {
                super::SortDirection::Asc => key.field.name.to_string(),
                super::SortDirection::Desc => format!("-{}", key.field.name),
            })
            .collect();
        query.append_pair("order_by", &order.join(","));
    }

    if let Some(ref fields) = spec.fields {
        query.append_pair("fields", &fields.join(","));
    }

    query.append_pair("page", &page.to_string());
    query.append_pair("per_page", &spec.per_page.to_string());

    format!("{}?{}", base_path, query.finish())
}

/// One page of records with its metadata
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub records: Vec<T>,
    pub pagination: Pagination,
}
