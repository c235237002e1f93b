//! SELECT list and implicit GROUP BY derived from columns and aggregates.

use crate::dialect::Dialect;
use crate::error::BuildError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Aggregate function applied to a source column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateFn {
    Count,
    Sum,
    Avg,
    Max,
    Min,
}

impl AggregateFn {
    pub fn as_sql(self) -> &'static str {
        match self {
            AggregateFn::Count => "COUNT",
            AggregateFn::Sum => "SUM",
            AggregateFn::Avg => "AVG",
            AggregateFn::Max => "MAX",
            AggregateFn::Min => "MIN",
        }
    }
}

impl fmt::Display for AggregateFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for AggregateFn {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "count" => Ok(AggregateFn::Count),
            "sum" => Ok(AggregateFn::Sum),
            "avg" => Ok(AggregateFn::Avg),
            "max" => Ok(AggregateFn::Max),
            "min" => Ok(AggregateFn::Min),
            _ => Err(BuildError::config(format!("unknown aggregate function '{s}'"))),
        }
    }
}

/// `FUNCTION(relation.column)`, projected under an alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSpec {
    pub function: AggregateFn,
    pub column: String,
}

impl AggregateSpec {
    pub fn new(function: AggregateFn, column: impl Into<String>) -> Self {
        Self {
            function,
            column: column.into(),
        }
    }

    pub fn count(column: impl Into<String>) -> Self {
        Self::new(AggregateFn::Count, column)
    }

    pub fn sum(column: impl Into<String>) -> Self {
        Self::new(AggregateFn::Sum, column)
    }

    pub fn avg(column: impl Into<String>) -> Self {
        Self::new(AggregateFn::Avg, column)
    }

    pub fn max(column: impl Into<String>) -> Self {
        Self::new(AggregateFn::Max, column)
    }

    pub fn min(column: impl Into<String>) -> Self {
        Self::new(AggregateFn::Min, column)
    }
}

/// Rendered projection: SELECT list entries and GROUP BY keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Projection {
    pub select: Vec<String>,
    pub group_by: Vec<String>,
}

impl Projection {
    /// Derive the projection.
    ///
    /// Without aggregates the columns are written exactly as configured, so expressions
    /// and aliases pass through (`relation.*` when there are none), and nothing is grouped. With aggregates, every column except the wildcard is
    /// qualified, projected and grouped on, followed by the aggregates in alias order.
    pub fn compose(
        dialect: &dyn Dialect,
        relation: &str,
        columns: &[String],
        aggregates: &BTreeMap<String, AggregateSpec>,
    ) -> Self {
        let mut projection = Projection::default();

        if aggregates.is_empty() {
            if columns.is_empty() {
                projection.select.push(ident(dialect, &format!("{relation}.*")));
            } else {
                projection
                    .select
                    .extend(columns.iter().map(|c| c.trim().to_string()));
            }
            return projection;
        }

        for column in columns.iter().map(|c| c.trim()).filter(|c| *c != "*") {
            let qualified = ident(dialect, &format!("{relation}.{column}"));
            projection.select.push(qualified.clone());
            projection.group_by.push(qualified);
        }

        for (alias, spec) in aggregates {
            let mut expr = String::from(spec.function.as_sql());
            expr.push('(');
            dialect.write_ident(&mut expr, &format!("{relation}.{}", spec.column));
            expr.push_str(") AS ");
            dialect.write_ident(&mut expr, alias);
            projection.select.push(expr);
        }

        projection
    }
}

fn ident(dialect: &dyn Dialect, name: &str) -> String {
    let mut out = String::new();
    dialect.write_ident(&mut out, name);
    out
}
