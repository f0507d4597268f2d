//! Compile a [`QuerySpec`] onto a sqlx [`QueryBuilder`]

use sqlx::{Postgres, QueryBuilder};

use super::{FieldValue, FilterOp, QuerySpec};

/// Append ` WHERE ...` for every filter of the spec (nothing when unfiltered)
pub fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, spec: &QuerySpec) {
    for (i, filter) in spec.filters.iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        builder.push(filter.field.column);

        let operator = match filter.op {
            FilterOp::Eq => " = ",
            FilterOp::Like => " LIKE ",
            FilterOp::Gt => " > ",
            FilterOp::Gte => " >= ",
            FilterOp::Lt => " < ",
            FilterOp::Lte => " <= ",
        };
        builder.push(operator);

        match (&filter.op, &filter.value) {
            (FilterOp::Like, FieldValue::Text(s)) => {
                builder.push_bind(format!("%{}%", escape_like(s)));
            }
            (_, FieldValue::Integer(n)) => {
                builder.push_bind(*n);
            }
            (_, FieldValue::Text(s)) => {
                builder.push_bind(s.clone());
            }
            (_, FieldValue::Date(d)) => {
                builder.push_bind(*d);
            }
            (_, FieldValue::Null) => {
                builder.push_bind(None::<String>);
            }
        }
    }
}

/// Append ` ORDER BY ...` using the effective (tiebroken) order
pub fn push_order(builder: &mut QueryBuilder<'_, Postgres>, spec: &QuerySpec) {
    builder.push(" ORDER BY ");
    let mut separated = builder.separated(", ");
    for key in spec.effective_order() {
        separated.push(format!("{} {}", key.field.column, key.direction.to_sql()));
    }
}

/// Append ` LIMIT ... OFFSET ...` for the spec's page
pub fn push_page(builder: &mut QueryBuilder<'_, Postgres>, spec: &QuerySpec) {
    builder.push(" LIMIT ");
    builder.push_bind(spec.limit());
    builder.push(" OFFSET ");
    builder.push_bind(spec.offset());
}

fn escape_like(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
