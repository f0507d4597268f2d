//! Evaluate a [`QuerySpec`] over records held in memory.
//!
//! Mirrors the SQL compiled by [`super::sql`]: NULL never satisfies a
//! predicate, sorts after any value ascending and before any value descending.

use std::cmp::Ordering;

use super::{FieldValue, Filter, FilterOp, QuerySpec, SortDirection};

/// A record whose fields can be read by catalog name
pub trait Queryable {
    fn field_value(&self, field: &str) -> FieldValue;
}

/// Filter, order and slice `records`; returns the page and the filtered total
pub fn apply<T>(records: impl IntoIterator<Item = T>, spec: &QuerySpec) -> (Vec<T>, i64)
where
    T: Queryable,
{
    let mut matched: Vec<T> = records
        .into_iter()
        .filter(|r| spec.filters.iter().all(|f| matches(r, f)))
        .collect();

    let order = spec.effective_order();
    matched.sort_by(|a, b| {
        order
            .iter()
            .map(|key| {
                let ord = compare_nulls_last(&a.field_value(key.field.name), &b.field_value(key.field.name));
                match key.direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            })
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });

    let total = matched.len() as i64;
    let page = matched
        .into_iter()
        .skip(spec.offset().max(0) as usize)
        .take(spec.limit().max(0) as usize)
        .collect();

    (page, total)
}

fn matches<T: Queryable>(record: &T, filter: &Filter) -> bool {
    let value = record.field_value(filter.field.name);
    if value == FieldValue::Null {
        return false;
    }

    match filter.op {
        FilterOp::Eq => value == filter.value,
        FilterOp::Like => match (&value, &filter.value) {
            (FieldValue::Text(haystack), FieldValue::Text(needle)) => haystack.contains(needle.as_str()),
            _ => false,
        },
        FilterOp::Gt => compare(&value, &filter.value) == Some(Ordering::Greater),
        FilterOp::Gte => matches!(compare(&value, &filter.value), Some(Ordering::Greater | Ordering::Equal)),
        FilterOp::Lt => compare(&value, &filter.value) == Some(Ordering::Less),
        FilterOp::Lte => matches!(compare(&value, &filter.value), Some(Ordering::Less | Ordering::Equal)),
    }
}

fn compare(a: &FieldValue, b: &FieldValue) -> Option<Ordering> {
    match (a, b) {
        (FieldValue::Integer(x), FieldValue::Integer(y)) => Some(x.cmp(y)),
        (FieldValue::Text(x), FieldValue::Text(y)) => Some(x.cmp(y)),
        (FieldValue::Date(x), FieldValue::Date(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn compare_nulls_last(a: &FieldValue, b: &FieldValue) -> Ordering {
    match (a, b) {
        (FieldValue::Null, FieldValue::Null) => Ordering::Equal,
        (FieldValue::Null, _) => Ordering::Greater,
        (_, FieldValue::Null) => Ordering::Less,
        _ => compare(a, b).unwrap_or(Ordering::Equal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::PaginationConfig, models::book::BOOK_FIELDS, query::FieldCatalog};

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: i64,
        title: &'static str,
        pages: i64,
        description: Option<&'static str>,
    }

    impl Queryable for Row {
        fn field_value(&self, field: &str) -> FieldValue {
            match field {
                "id" => FieldValue::Integer(self.id),
                "title" => FieldValue::Text(self.title.to_string()),
                "number_of_pages" => FieldValue::Integer(self.pages),
                "description" => self
                    .description
                    .map(|d| FieldValue::Text(d.to_string()))
                    .unwrap_or(FieldValue::Null),
                _ => FieldValue::Null,
            }
        }
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { id: 1, title: "Pan Tadeusz", pages: 340, description: Some("epic") },
            Row { id: 2, title: "Dziady", pages: 120, description: None },
            Row { id: 3, title: "Lalka", pages: 680, description: Some("novel") },
            Row { id: 4, title: "Pan Wolodyjowski", pages: 340, description: None },
        ]
    }

    fn spec(catalog: &'static FieldCatalog, pairs: &[(&str, &str)]) -> QuerySpec {
        let params: Vec<(String, String)> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        QuerySpec::parse(catalog, &params, &PaginationConfig::default()).unwrap()
    }

    fn ids(rows: &[Row]) -> Vec<i64> {
        rows.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_like_and_comparison_combine_with_and() {
        let (page, total) = apply(rows(), &spec(&BOOK_FIELDS, &[("title__like", "Pan"), ("number_of_pages__gte", "300")]));
        assert_eq!(total, 2);
        assert_eq!(ids(&page), vec![1, 4]);
    }

    #[test]
    fn test_order_with_id_tiebreak() {
        let (page, _) = apply(rows(), &spec(&BOOK_FIELDS, &[("order_by", "-number_of_pages")]));
        assert_eq!(ids(&page), vec![3, 1, 4, 2]);
    }

    #[test]
    fn test_nulls_never_match_and_sort_last() {
        let (page, total) = apply(rows(), &spec(&BOOK_FIELDS, &[("description__like", "")]));
        assert_eq!(total, 2);
        assert_eq!(ids(&page), vec![1, 3]);

        let (page, _) = apply(rows(), &spec(&BOOK_FIELDS, &[("order_by", "description")]));
        assert_eq!(ids(&page), vec![1, 3, 2, 4]);
    }

    #[test]
    fn test_pagination_slices_after_ordering() {
        let (page, total) = apply(rows(), &spec(&BOOK_FIELDS, &[("per_page", "3"), ("page", "2")]));
        assert_eq!(total, 4);
        assert_eq!(ids(&page), vec![4]);

        let (page, total) = apply(rows(), &spec(&BOOK_FIELDS, &[("per_page", "3"), ("page", "9")]));
        assert_eq!(total, 4);
        assert!(page.is_empty());
    }
}
