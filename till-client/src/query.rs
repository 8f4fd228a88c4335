//! Typed filtered queries
//!
//! A [`Query`] is a conjunction of clauses plus optional ordering and limit.
//! Each clause is either a single column filter or an OR-group of filters.
//! [`Query::to_params`] renders the PostgREST query-string dialect.

use serde_json::Value;

/// Comparison applied to one column
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(Value),
    Neq(Value),
    Gte(Value),
    Lte(Value),
    IsNull,
    NotNull,
}

/// One column filter
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub condition: Condition,
}

impl Filter {
    pub fn new(column: impl Into<String>, condition: Condition) -> Self {
        Self {
            column: column.into(),
            condition,
        }
    }

    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column, Condition::Eq(value.into()))
    }

    pub fn neq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column, Condition::Neq(value.into()))
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Self::new(column, Condition::IsNull)
    }

    pub fn not_null(column: impl Into<String>) -> Self {
        Self::new(column, Condition::NotNull)
    }

    /// `op.value` part of a PostgREST filter
    fn operator(&self) -> String {
        match &self.condition {
            Condition::Eq(v) => format!("eq.{}", value_text(v)),
            Condition::Neq(v) => format!("neq.{}", value_text(v)),
            Condition::Gte(v) => format!("gte.{}", value_text(v)),
            Condition::Lte(v) => format!("lte.{}", value_text(v)),
            Condition::IsNull => "is.null".to_string(),
            Condition::NotNull => "not.is.null".to_string(),
        }
    }
}

/// A conjunct of a [`Query`]
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Where(Filter),
    AnyOf(Vec<Filter>),
}

/// Result ordering
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub descending: bool,
}

/// Filtered query over one collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub clauses: Vec<Clause>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Query {
    /// Every row
    pub fn all() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.clauses.push(Clause::Where(filter));
        self
    }

    pub fn eq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Filter::eq(column, value))
    }

    pub fn neq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Filter::neq(column, value))
    }

    pub fn gte(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Filter::new(column, Condition::Gte(value.into())))
    }

    pub fn lte(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Filter::new(column, Condition::Lte(value.into())))
    }

    pub fn is_null(self, column: impl Into<String>) -> Self {
        self.filter(Filter::is_null(column))
    }

    pub fn not_null(self, column: impl Into<String>) -> Self {
        self.filter(Filter::not_null(column))
    }

    /// Rows matching at least one of `filters`
    pub fn any_of(mut self, filters: Vec<Filter>) -> Self {
        self.clauses.push(Clause::AnyOf(filters));
        self
    }

    pub fn order_asc(mut self, column: impl Into<String>) -> Self {
        self.order = Some(Order {
            column: column.into(),
            descending: false,
        });
        self
    }

    pub fn order_desc(mut self, column: impl Into<String>) -> Self {
        self.order = Some(Order {
            column: column.into(),
            descending: true,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Render as PostgREST query parameters
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::with_capacity(self.clauses.len() + 2);
        for clause in &self.clauses {
            match clause {
                Clause::Where(filter) => params.push((filter.column.clone(), filter.operator())),
                Clause::AnyOf(filters) => {
                    let inner: Vec<String> = filters
                        .iter()
                        .map(|f| format!("{}.{}", f.column, f.operator()))
                        .collect();
                    params.push(("or".to_string(), format!("({})", inner.join(","))));
                }
            }
        }
        if let Some(order) = &self.order {
            let direction = if order.descending { "desc" } else { "asc" };
            params.push(("order".to_string(), format!("{}.{}", order.column, direction)));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }
}

/// Plain text of a filter value (strings unquoted)
pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpaid_orders_query() {
        let query = Query::all().any_of(vec![
            Filter::is_null("payment_status"),
            Filter::neq("payment_status", "paid"),
        ]);
        assert_eq!(
            query.to_params(),
            vec![(
                "or".to_string(),
                "(payment_status.is.null,payment_status.neq.paid)".to_string()
            )]
        );
    }

    #[test]
    fn test_open_session_query() {
        let query = Query::all().is_null("end_time").order_desc("start_time").limit(1);
        assert_eq!(
            query.to_params(),
            vec![
                ("end_time".to_string(), "is.null".to_string()),
                ("order".to_string(), "start_time.desc".to_string()),
                ("limit".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_range_and_eq_filters() {
        let query = Query::all()
            .gte("created_at", "2026-10-19T08:00:00Z")
            .lte("created_at", "2026-10-19T20:00:00Z")
            .eq("id", 3);
        let params = query.to_params();
        assert_eq!(params[0].1, "gte.2026-10-19T08:00:00Z");
        assert_eq!(params[1].1, "lte.2026-10-19T20:00:00Z");
        assert_eq!(params[2], ("id".to_string(), "eq.3".to_string()));
    }
}
