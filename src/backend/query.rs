//! Query and mutation descriptions understood by the data API.

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
}

impl FilterOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Neq => "neq",
            FilterOp::Gt => "gt",
            FilterOp::Gte => "gte",
            FilterOp::Lt => "lt",
            FilterOp::Lte => "lte",
            FilterOp::Like => "like",
        }
    }
}

/// A single column predicate, rendered as `column=op.value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: String,
}

impl Filter {
    pub fn new(column: impl Into<String>, op: FilterOp, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(column, FilterOp::Eq, value)
    }

    pub fn to_param(&self) -> (String, String) {
        (
            self.column.clone(),
            format!("{}.{}", self.op.as_str(), self.value),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub column: String,
    pub ascending: bool,
}

impl OrderBy {
    fn to_param(&self) -> String {
        let direction = if self.ascending { "asc" } else { "desc" };
        format!("{}.{}", self.column, direction)
    }
}

/// Read request: table, filters, ordering and limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub table: String,
    pub filters: Vec<Filter>,
    pub ordering: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filters: Vec::new(),
            ordering: None,
            limit: None,
        }
    }

    pub fn filter(mut self, column: impl Into<String>, op: FilterOp, value: impl Into<String>) -> Self {
        self.filters.push(Filter::new(column, op, value));
        self
    }

    pub fn eq(self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter(column, FilterOp::Eq, value)
    }

    pub fn order_by(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.ordering = Some(OrderBy {
            column: column.into(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Query-string parameters in REST form, `select=*` first.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(self.filters.iter().map(Filter::to_param));
        if let Some(ordering) = &self.ordering {
            params.push(("order".to_string(), ordering.to_param()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }

    /// Stable cache key: the table name, then the parameters.
    ///
    /// Keys always start with the table, so `^table(\?|$)` matches every
    /// cached read of that table. Values are form-encoded, so distinct
    /// queries never share a key.
    pub fn cache_key(&self) -> String {
        let mut params = self.to_params().into_iter().skip(1).peekable();
        if params.peek().is_none() {
            return self.table.clone();
        }
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params)
            .finish();
        format!("{}?{}", self.table, query)
    }
}

/// Write operation applied to a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Insert,
    Update(Vec<Filter>),
    Delete(Vec<Filter>),
}

impl Mutation {
    pub fn filters(&self) -> &[Filter] {
        match self {
            Mutation::Insert => &[],
            Mutation::Update(filters) | Mutation::Delete(filters) => filters,
        }
    }
}
