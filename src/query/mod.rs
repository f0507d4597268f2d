//! Generic list queries: filtering, ordering and pagination over a resource's
//! declared fields.
//!
//! A [`QuerySpec`] is parsed from untrusted query-string pairs against a
//! [`FieldCatalog`] (see [`builder`]), then either compiled to SQL ([`sql`]) or
//! evaluated over in-memory records ([`eval`]). Both paths share the same
//! semantics so the two repositories return identical pages.

pub mod builder;
pub mod eval;
pub mod pagination;
pub mod sql;

use chrono::NaiveDate;

pub use pagination::{Page, Pagination};

/// Semantic type of a queryable field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer,
    Date,
}

/// One queryable field of a resource
#[derive(Debug, PartialEq)]
pub struct FieldDef {
    /// Name exposed on the wire and in query strings
    pub name: &'static str,
    /// SQL expression the field maps to
    pub column: &'static str,
    pub kind: FieldKind,
}

/// The set of fields a resource allows in filters, ordering and sparse fieldsets
#[derive(Debug, PartialEq)]
pub struct FieldCatalog {
    pub resource: &'static str,
    pub fields: &'static [FieldDef],
}

impl FieldCatalog {
    pub fn get(&self, name: &str) -> Option<&'static FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The identifier field used as the final ordering tiebreaker
    pub fn id(&self) -> &'static FieldDef {
        let fields: &'static [FieldDef] = self.fields;
        self.get("id").unwrap_or(&fields[0])
    }
}

/// A typed field value, either parsed from a filter or read from a record
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Text(String),
    Date(NaiveDate),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub field: &'static FieldDef,
    pub direction: SortDirection,
}

/// Filter operators, written `field__<suffix>` in query strings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Like,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl FilterOp {
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "like" => Some(FilterOp::Like),
            "gt" => Some(FilterOp::Gt),
            "gte" => Some(FilterOp::Gte),
            "lt" => Some(FilterOp::Lt),
            "lte" => Some(FilterOp::Lte),
            _ => None,
        }
    }

    pub fn suffix(self) -> Option<&'static str> {
        match self {
            FilterOp::Eq => None,
            FilterOp::Like => Some("like"),
            FilterOp::Gt => Some("gt"),
            FilterOp::Gte => Some("gte"),
            FilterOp::Lt => Some("lt"),
            FilterOp::Lte => Some("lte"),
        }
    }

    /// Whether the operator may be applied to a field of the given kind
    pub fn allowed_on(self, kind: FieldKind) -> bool {
        match self {
            FilterOp::Eq => true,
            FilterOp::Like => kind == FieldKind::String,
            FilterOp::Gt | FilterOp::Gte | FilterOp::Lt | FilterOp::Lte => {
                matches!(kind, FieldKind::Integer | FieldKind::Date)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: &'static FieldDef,
    pub op: FilterOp,
    pub value: FieldValue,
    /// Value as received, echoed back into pagination links
    pub raw: String,
}

impl Filter {
    /// Query-string key for this filter (`title`, `isbn__gte`, ...)
    pub fn key(&self) -> String {
        match self.op.suffix() {
            Some(suffix) => format!("{}__{}", self.field.name, suffix),
            None => self.field.name.to_string(),
        }
    }
}

/// Per-request filter/order/pagination specification
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    /// Sort keys requested by the caller, in priority order
    pub order: Vec<SortKey>,
    /// Predicates combined with AND
    pub filters: Vec<Filter>,
    pub page: u32,
    pub per_page: u32,
    /// Sparse fieldset; `None` renders every field
    pub fields: Option<Vec<&'static str>>,
    catalog: &'static FieldCatalog,
}

impl QuerySpec {
    /// An unfiltered spec over `catalog` in identifier order
    pub fn new(catalog: &'static FieldCatalog, page: u32, per_page: u32) -> Self {
        Self {
            order: Vec::new(),
            filters: Vec::new(),
            page,
            per_page,
            fields: None,
            catalog,
        }
    }

    /// Requested sort keys followed by the identifier ascending, unless the
    /// caller already ordered by it
    pub fn effective_order(&self) -> Vec<SortKey> {
        let id = self.catalog.id();
        let mut order = self.order.clone();
        if !order.iter().any(|k| k.field.name == id.name) {
            order.push(SortKey {
                field: id,
                direction: SortDirection::Asc,
            });
        }
        order
    }

    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.per_page)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }
}
