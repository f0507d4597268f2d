//! Parse query-string pairs into a [`QuerySpec`]

use chrono::NaiveDate;

use super::{FieldCatalog, FieldDef, FieldKind, FieldValue, Filter, FilterOp, QuerySpec, SortDirection, SortKey};
use crate::{
    config::PaginationConfig,
    error::{AppError, AppResult},
    models::validation::parse_wire_date,
};

impl QuerySpec {
    /// Build a spec from raw `(key, value)` pairs, validated against `catalog`.
    ///
    /// Recognized keys: `order_by`, `page`, `per_page`, `fields`, `<field>` and
    /// `<field>__<op>`. Anything else is rejected.
    pub fn parse(
        catalog: &'static FieldCatalog,
        params: &[(String, String)],
        pagination: &PaginationConfig,
    ) -> AppResult<Self> {
        let mut spec = QuerySpec::new(catalog, 1, pagination.per_page.max(1));

        for (key, value) in params {
            match key.as_str() {
                "order_by" => spec.order = parse_order(catalog, value)?,
                "page" => spec.page = parse_positive("page", value)?,
                "per_page" => {
                    spec.per_page = parse_positive("per_page", value)?.min(pagination.max_per_page.max(1))
                }
                "fields" => spec.fields = Some(parse_fields(catalog, value)?),
                _ => spec.filters.push(parse_filter(catalog, key, value)?),
            }
        }

        Ok(spec)
    }
}

fn unknown_field(catalog: &FieldCatalog, name: &str) -> AppError {
    AppError::BadRequest(format!("Unknown field '{}' for {}", name, catalog.resource))
}

fn parse_positive(key: &str, value: &str) -> AppResult<u32> {
    match value.trim().parse::<u32>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(AppError::BadRequest(format!("'{}' must be a positive integer", key))),
    }
}

fn parse_order(catalog: &'static FieldCatalog, value: &str) -> AppResult<Vec<SortKey>> {
    let mut order = Vec::new();
    for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (name, direction) = match part.strip_prefix('-') {
            Some(name) => (name, SortDirection::Desc),
            None => (part, SortDirection::Asc),
        };
        let field = catalog.get(name).ok_or_else(|| unknown_field(catalog, name))?;
        order.push(SortKey { field, direction });
    }
    Ok(order)
}

fn parse_fields(catalog: &'static FieldCatalog, value: &str) -> AppResult<Vec<&'static str>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|name| {
            catalog
                .get(name)
                .map(|f| f.name)
                .ok_or_else(|| unknown_field(catalog, name))
        })
        .collect()
}

fn parse_filter(catalog: &'static FieldCatalog, key: &str, value: &str) -> AppResult<Filter> {
    let (name, op) = match key.split_once("__") {
        Some((name, suffix)) => {
            let op = FilterOp::from_suffix(suffix)
                .ok_or_else(|| AppError::BadRequest(format!("Unknown filter operator '{}'", suffix)))?;
            (name, op)
        }
        None => (key, FilterOp::Eq),
    };

    let field = catalog.get(name).ok_or_else(|| unknown_field(catalog, name))?;
    if !op.allowed_on(field.kind) {
        return Err(AppError::BadRequest(format!(
            "Operator '{}' is not supported on field '{}'",
            op.suffix().unwrap_or("eq"),
            field.name
        )));
    }

    Ok(Filter {
        field,
        op,
        value: parse_value(field, value)?,
        raw: value.to_string(),
    })
}

fn parse_value(field: &FieldDef, raw: &str) -> AppResult<FieldValue> {
    let invalid = |expected: &str| {
        AppError::BadRequest(format!("Invalid value '{}' for field '{}': expected {}", raw, field.name, expected))
    };

    match field.kind {
        FieldKind::String => Ok(FieldValue::Text(raw.to_string())),
        FieldKind::Integer => raw
            .trim()
            .parse::<i64>()
            .map(FieldValue::Integer)
            .map_err(|_| invalid("an integer")),
        FieldKind::Date => parse_wire_date(raw.trim())
            .or_else(|| NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok())
            .map(FieldValue::Date)
            .ok_or_else(|| invalid("a date (DD-MM-YYYY)")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{author::AUTHOR_FIELDS, book::BOOK_FIELDS};

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn parse(catalog: &'static FieldCatalog, pairs: &[(&str, &str)]) -> AppResult<QuerySpec> {
        QuerySpec::parse(catalog, &params(pairs), &PaginationConfig::default())
    }

    #[test]
    fn test_defaults() {
        let spec = parse(&AUTHOR_FIELDS, &[]).unwrap();
        assert_eq!(spec.page, 1);
        assert_eq!(spec.per_page, 5);
        assert!(spec.filters.is_empty());
        assert!(spec.order.is_empty());

        let order = spec.effective_order();
        assert_eq!(order.len(), 1);
        assert_eq!(order[0].field.name, "id");
        assert_eq!(order[0].direction, SortDirection::Asc);
    }

    #[test]
    fn test_order_by_multiple_keys() {
        let spec = parse(&AUTHOR_FIELDS, &[("order_by", "-birth_date,last_name")]).unwrap();
        let order = spec.effective_order();
        let keys: Vec<_> = order.iter().map(|k| (k.field.name, k.direction)).collect();
        assert_eq!(
            keys,
            vec![
                ("birth_date", SortDirection::Desc),
                ("last_name", SortDirection::Asc),
                ("id", SortDirection::Asc),
            ]
        );
    }

    #[test]
    fn test_order_by_id_not_duplicated() {
        let spec = parse(&BOOK_FIELDS, &[("order_by", "-id")]).unwrap();
        let order = spec.effective_order();
        assert_eq!(order.len(), 1);
        assert_eq!(order[0].direction, SortDirection::Desc);
    }

    #[test]
    fn test_order_by_unknown_field() {
        let err = parse(&AUTHOR_FIELDS, &[("order_by", "-password")]).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_filters() {
        let spec = parse(
            &BOOK_FIELDS,
            &[("title__like", "Pan"), ("number_of_pages__gte", "100"), ("isbn", "9788374800440")],
        )
        .unwrap();

        assert_eq!(spec.filters.len(), 3);
        assert_eq!(spec.filters[0].op, FilterOp::Like);
        assert_eq!(spec.filters[0].value, FieldValue::Text("Pan".into()));
        assert_eq!(spec.filters[1].op, FilterOp::Gte);
        assert_eq!(spec.filters[1].value, FieldValue::Integer(100));
        assert_eq!(spec.filters[2].key(), "isbn");
        assert_eq!(spec.filters[2].value, FieldValue::Integer(9788374800440));
    }

    #[test]
    fn test_date_filter_formats() {
        let expected = FieldValue::Date(NaiveDate::from_ymd_opt(1798, 12, 24).unwrap());

        let spec = parse(&AUTHOR_FIELDS, &[("birth_date__gt", "24-12-1798")]).unwrap();
        assert_eq!(spec.filters[0].value, expected);

        let spec = parse(&AUTHOR_FIELDS, &[("birth_date__gt", "1798-12-24")]).unwrap();
        assert_eq!(spec.filters[0].value, expected);

        assert!(parse(&AUTHOR_FIELDS, &[("birth_date", "yesterday")]).is_err());
    }

    #[test]
    fn test_operator_type_restrictions() {
        assert!(parse(&BOOK_FIELDS, &[("isbn__like", "978")]).is_err());
        assert!(parse(&AUTHOR_FIELDS, &[("first_name__gt", "A")]).is_err());
        assert!(parse(&AUTHOR_FIELDS, &[("first_name__between", "A")]).is_err());
        assert!(parse(&BOOK_FIELDS, &[("number_of_pages", "many")]).is_err());
    }

    #[test]
    fn test_unknown_filter_field() {
        let err = parse(&AUTHOR_FIELDS, &[("nationality", "PL")]).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("nationality")));
    }

    #[test]
    fn test_pagination_bounds() {
        assert!(parse(&AUTHOR_FIELDS, &[("page", "0")]).is_err());
        assert!(parse(&AUTHOR_FIELDS, &[("page", "-1")]).is_err());
        assert!(parse(&AUTHOR_FIELDS, &[("per_page", "0")]).is_err());

        let spec = parse(&AUTHOR_FIELDS, &[("page", "3"), ("per_page", "1000")]).unwrap();
        assert_eq!(spec.page, 3);
        assert_eq!(spec.per_page, 100);
        assert_eq!(spec.offset(), 200);
    }

    #[test]
    fn test_sparse_fields() {
        let spec = parse(&AUTHOR_FIELDS, &[("fields", "id,last_name")]).unwrap();
        assert_eq!(spec.fields, Some(vec!["id", "last_name"]));

        assert!(parse(&AUTHOR_FIELDS, &[("fields", "id,secret")]).is_err());
    }
}
