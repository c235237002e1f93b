//! JOIN clauses with their own criterion chains.

use super::render::write_chain;
use crate::criterion::{Combinator, Criterion, CriterionValue, Operator};
use crate::dialect::Dialect;
use crate::statement::ParamList;
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// Join flavour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
}

impl JoinKind {
    pub fn as_sql(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
        }
    }
}

/// A join to a secondary relation.
///
/// # Example
/// ```
/// use dynsql::{FieldRef, JoinSpec, Operator};
///
/// let join = JoinSpec::left("JEDA_ORG")
///     .and("ORG_ID", Operator::Eq, FieldRef::new("JEDA_ORG", "ORG_ID"))
///     .output_column("ORG_NAME");
/// assert_eq!(join.criteria().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct JoinSpec {
    kind: JoinKind,
    target: String,
    criteria: Vec<Criterion>,
    output_columns: Vec<String>,
}

impl JoinSpec {
    pub fn new(kind: JoinKind, target: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
            criteria: Vec::new(),
            output_columns: Vec::new(),
        }
    }

    pub fn inner(target: impl Into<String>) -> Self {
        Self::new(JoinKind::Inner, target)
    }

    pub fn left(target: impl Into<String>) -> Self {
        Self::new(JoinKind::Left, target)
    }

    /// Append a criterion to the ON clause.
    ///
    /// # Panics
    ///
    /// Panics on a malformed criterion, see [`Criterion::new`].
    #[track_caller]
    pub fn criterion(
        mut self,
        property: impl Into<String>,
        operator: Operator,
        combinator: Combinator,
        value: impl Into<CriterionValue>,
    ) -> Self {
        self.criteria
            .push(Criterion::new(property, operator, combinator, value.into()));
        self
    }

    /// Append an AND-ed criterion to the ON clause.
    #[track_caller]
    pub fn and(self, property: impl Into<String>, operator: Operator, value: impl Into<CriterionValue>) -> Self {
        self.criterion(property, operator, Combinator::And, value)
    }

    /// Append an OR-ed criterion to the ON clause.
    #[track_caller]
    pub fn or(self, property: impl Into<String>, operator: Operator, value: impl Into<CriterionValue>) -> Self {
        self.criterion(property, operator, Combinator::Or, value)
    }

    /// Append an already built criterion.
    pub fn push_criterion(mut self, criterion: Criterion) -> Self {
        self.criteria.push(criterion);
        self
    }

    /// Project `target.column` alongside the primary relation's columns.
    pub fn output_column(mut self, column: impl Into<String>) -> Self {
        self.output_columns.push(column.into());
        self
    }

    pub fn output_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_columns.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn kind(&self) -> JoinKind {
        self.kind
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    pub fn columns(&self) -> &[String] {
        &self.output_columns
    }

    /// A join without criteria would have no ON clause; such joins are not emitted.
    pub fn is_renderable(&self) -> bool {
        !self.criteria.is_empty()
    }
}

/// Append `, target.column` for the output columns of every emitted join.
pub(crate) fn write_output_columns(out: &mut String, dialect: &dyn Dialect, joins: &[JoinSpec]) {
    for join in joins.iter().filter(|j| j.is_renderable()) {
        for column in &join.output_columns {
            out.push_str(", ");
            dialect.write_ident(out, &format!("{}.{}", join.target, column));
        }
    }
}

/// Append the JOIN clauses, pushing their bound values onto `params` join by join.
///
/// ON criteria are qualified with the *primary* relation, not the joined one: a bare
/// property names a column of `primary`, and the joined side is reached through
/// [`FieldRef`](crate::FieldRef) values or explicitly qualified properties. Data
/// sources key joins on the primary relation's foreign key column, which relies on this.
pub(crate) fn write_joins(
    out: &mut String,
    dialect: &dyn Dialect,
    primary: &str,
    joins: &[JoinSpec],
    params: &mut ParamList,
) {
    for join in joins {
        if !join.is_renderable() {
            tracing::warn!(
                target: "dynsql.sql",
                relation = primary,
                join = %join.target,
                "skipping join without criteria"
            );
            continue;
        }
        out.push(' ');
        out.push_str(join.kind.as_sql());
        out.push(' ');
        dialect.write_ident(out, &join.target);
        out.push_str(" ON ");
        write_chain(out, dialect, primary, &join.criteria, params);
    }
}

/// Render the JOIN clauses on their own, with the values bound by each join kept apart.
///
/// Placeholders are numbered as if the fragment started the statement.
pub fn render_joins(dialect: &dyn Dialect, primary: &str, joins: &[JoinSpec]) -> (String, Vec<Vec<Value>>) {
    let mut out = String::new();
    let mut params = ParamList::new();
    let mut counts = Vec::new();
    for join in joins.iter().filter(|j| j.is_renderable()) {
        let before = params.len();
        write_joins(&mut out, dialect, primary, std::slice::from_ref(join), &mut params);
        counts.push(params.len() - before);
    }
    let mut values = params.into_vec().into_iter();
    let groups = counts
        .into_iter()
        .map(|n| values.by_ref().take(n).collect())
        .collect();
    (out, groups)
}
