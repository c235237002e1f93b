//! Dynamic statement builder.
//!
//! A [`SqlBuilder`] is created once per data source from an immutable
//! [`BuilderConfig`] (dialect, relation, columns, ordering, paging). Criteria, joins and
//! aggregates are working state added through `&self` methods; each builder guards
//! that state with its own lock, so one builder can be shared between threads without
//! serializing unrelated builders.
//!
//! ## Example
//!
//! ```
//! use dynsql::{AggregateSpec, BuilderConfig, Operator, Value};
//!
//! let qb = BuilderConfig::new("ST_RIVER_R")
//!     .columns(["STCD"])
//!     .limit(1000)
//!     .build("mysql")?;
//! qb.and_criterion("Z", Operator::Lt, 5.0)
//!     .add_aggregate("CNT", AggregateSpec::count("Z"));
//!
//! let stmt = qb.create_select();
//! assert_eq!(
//!     stmt.sql,
//!     "SELECT ST_RIVER_R.STCD, COUNT(ST_RIVER_R.Z) AS CNT FROM ST_RIVER_R \
//!      WHERE ST_RIVER_R.Z<? GROUP BY ST_RIVER_R.STCD LIMIT 0,1000"
//! );
//! assert_eq!(stmt.params, vec![Value::Float(5.0)]);
//! # Ok::<(), dynsql::BuildError>(())
//! ```

mod delete;
mod insert;
mod join;
mod projection;
mod render;
mod select;
mod update;

pub use join::{JoinKind, JoinSpec, render_joins};
pub use projection::{AggregateFn, AggregateSpec};
pub use render::render_chain;

use crate::criterion::{Combinator, Criterion, CriterionValue, Operator};
use crate::dialect::{Dialect, DialectKind};
use crate::error::{BuildError, BuildResult};
use crate::ident;
use crate::statement::{Statement, StatementKind};
use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Base configuration of a builder, fixed for its lifetime.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuilderConfig {
    relation: String,
    virtual_source: Option<String>,
    virtual_params: Vec<Value>,
    columns: Vec<String>,
    order_by: Vec<String>,
    row_limit: u64,
    row_offset: u64,
}

impl BuilderConfig {
    /// Configure a builder over a table (or the alias of a SQL source).
    pub fn new(relation: impl Into<String>) -> Self {
        Self {
            relation: relation.into(),
            ..Self::default()
        }
    }

    /// Use the result of `sql` as the relation, aliased to the relation name.
    ///
    /// `params` are the values bound by `sql` itself; they come first in every
    /// statement that embeds the source.
    pub fn virtual_source(mut self, sql: impl Into<String>, params: Vec<Value>) -> Self {
        self.virtual_source = Some(sql.into());
        self.virtual_params = params;
        self
    }

    /// Columns to project. `*` selects everything.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// ORDER BY entries, written as given (`"created_at DESC"`).
    pub fn order_by<I, S>(mut self, clauses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.order_by = clauses.into_iter().map(Into::into).collect();
        self
    }

    /// Maximum rows; `0` disables pagination entirely.
    pub fn limit(mut self, n: u64) -> Self {
        self.row_limit = n;
        self
    }

    /// Rows to skip; only used when a limit is set.
    pub fn offset(mut self, n: u64) -> Self {
        self.row_offset = n;
        self
    }

    /// Pagination helper.
    ///
    /// `page` is 1-based (clamped to >= 1).
    /// `per_page` is clamped to >= 1.
    pub fn paginate(mut self, page: u64, per_page: u64) -> Self {
        let size = per_page.max(1);
        self.row_limit = size;
        self.row_offset = (page.max(1) - 1) * size;
        self
    }

    pub fn relation(&self) -> &str {
        &self.relation
    }

    pub fn is_virtual(&self) -> bool {
        self.virtual_source.is_some()
    }

    /// Build with a built-in dialect selected by name (`mysql`, `postgres`).
    pub fn build(self, dialect: &str) -> BuildResult<SqlBuilder> {
        let kind: DialectKind = dialect.parse()?;
        self.build_with(kind.dialect())
    }

    /// Build with any [`Dialect`] implementation.
    pub fn build_with(self, dialect: Arc<dyn Dialect>) -> BuildResult<SqlBuilder> {
        self.validate()?;
        Ok(SqlBuilder {
            dialect,
            config: self,
            state: Mutex::new(WorkingSet::default()),
        })
    }

    fn validate(&self) -> BuildResult<()> {
        if self.relation.trim().is_empty() {
            return Err(BuildError::MissingRelation);
        }
        ident::validate(&self.relation)?;
        for column in self.columns.iter().map(|c| c.trim()).filter(|c| *c != "*") {
            ident::validate(column)?;
        }
        if let Some(sql) = &self.virtual_source {
            if sql.trim().is_empty() {
                return Err(BuildError::config(format!(
                    "SQL source of '{}' is empty",
                    self.relation
                )));
            }
        } else if !self.virtual_params.is_empty() {
            return Err(BuildError::config("source parameters given without a SQL source"));
        }
        Ok(())
    }
}

/// Mutable working state: criteria, joins and aggregates.
#[derive(Debug, Clone, Default)]
pub(crate) struct WorkingSet {
    pub criteria: Vec<Criterion>,
    pub joins: Vec<JoinSpec>,
    pub aggregates: BTreeMap<String, AggregateSpec>,
}

/// Statement builder for one data source.
pub struct SqlBuilder {
    dialect: Arc<dyn Dialect>,
    config: BuilderConfig,
    state: Mutex<WorkingSet>,
}

impl fmt::Debug for SqlBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlBuilder")
            .field("dialect", &self.dialect.name())
            .field("config", &self.config)
            .field("state", &*self.state())
            .finish()
    }
}

impl SqlBuilder {
    /// Builder over a plain table with no columns, ordering or paging.
    pub fn new(dialect: &str, relation: impl Into<String>) -> BuildResult<Self> {
        BuilderConfig::new(relation).build(dialect)
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    pub fn relation(&self) -> &str {
        &self.config.relation
    }

    pub fn is_virtual(&self) -> bool {
        self.config.is_virtual()
    }

    // Working state is plain data and every mutation is a single push or clear, so a
    // poisoned lock still guards a consistent value.
    fn state(&self) -> MutexGuard<'_, WorkingSet> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ==================== Criteria ====================

    /// Add a criterion to the WHERE chain.
    ///
    /// # Panics
    ///
    /// Panics when `value` does not fit `operator`, see [`Criterion::new`].
    #[track_caller]
    pub fn add_criterion(
        &self,
        property: impl Into<String>,
        operator: Operator,
        combinator: Combinator,
        value: impl Into<CriterionValue>,
    ) -> &Self {
        let criterion = Criterion::new(property, operator, combinator, value.into());
        self.push_criterion(criterion)
    }

    /// Add an AND-ed criterion.
    #[track_caller]
    pub fn and_criterion(
        &self,
        property: impl Into<String>,
        operator: Operator,
        value: impl Into<CriterionValue>,
    ) -> &Self {
        self.add_criterion(property, operator, Combinator::And, value)
    }

    /// Add an OR-ed criterion.
    #[track_caller]
    pub fn or_criterion(
        &self,
        property: impl Into<String>,
        operator: Operator,
        value: impl Into<CriterionValue>,
    ) -> &Self {
        self.add_criterion(property, operator, Combinator::Or, value)
    }

    /// Add an already validated criterion.
    pub fn push_criterion(&self, criterion: Criterion) -> &Self {
        self.state().criteria.push(criterion);
        self
    }

    /// Remove all WHERE criteria; joins and aggregates are kept.
    pub fn clear_criteria(&self) -> &Self {
        self.state().criteria.clear();
        self
    }

    /// Replace the criteria with one equality per `(column, value)` pair, AND-ed in
    /// column order.
    pub fn filter_by_values<I, K, V>(&self, values: I) -> &Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let sorted: BTreeMap<String, Value> = values
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let mut state = self.state();
        state.criteria.clear();
        for (column, value) in sorted {
            state.criteria.push(Criterion::new(
                column,
                Operator::Eq,
                Combinator::And,
                CriterionValue::single(value),
            ));
        }
        drop(state);
        self
    }

    /// Replace the criteria with an equality on each key column.
    pub fn filter_by_key<S: AsRef<str>>(&self, key_columns: &[S], values: &[Value]) -> BuildResult<&Self> {
        if values.is_empty() {
            return Err(BuildError::EmptyValues("key lookup"));
        }
        if key_columns.len() != values.len() {
            let names: Vec<&str> = key_columns.iter().map(AsRef::as_ref).collect();
            return Err(BuildError::invalid_criterion(
                names.join(","),
                format!("expected {} key values, got {}", key_columns.len(), values.len()),
            ));
        }
        let mut criteria = Vec::with_capacity(values.len());
        for (column, value) in key_columns.iter().zip(values) {
            criteria.push(Criterion::try_new(
                column.as_ref(),
                Operator::Eq,
                Combinator::And,
                CriterionValue::single(value.clone()),
            )?);
        }
        self.state().criteria = criteria;
        Ok(self)
    }

    /// Snapshot of the current WHERE criteria.
    pub fn criteria(&self) -> Vec<Criterion> {
        self.state().criteria.clone()
    }

    // ==================== Joins & aggregates ====================

    pub fn add_join(&self, join: JoinSpec) -> &Self {
        self.state().joins.push(join);
        self
    }

    /// Project `spec` under `alias`; an existing alias is replaced.
    ///
    /// # Panics
    ///
    /// Panics when `alias` is not a valid identifier.
    #[track_caller]
    pub fn add_aggregate(&self, alias: impl Into<String>, spec: AggregateSpec) -> &Self {
        let alias = alias.into();
        if let Err(e) = ident::validate(&alias).and_then(|_| ident::validate(&spec.column)) {
            panic!("malformed aggregate: {e}");
        }
        self.state().aggregates.insert(alias, spec);
        self
    }

    // ==================== Statements ====================

    /// Build the SELECT statement for the current state.
    pub fn create_select(&self) -> Statement {
        let stmt = select::build(self.dialect(), &self.config, &self.state());
        log_statement(StatementKind::Select, &self.config.relation, &stmt);
        stmt
    }

    /// Build an INSERT of `values` (column → value), columns in name order.
    pub fn create_insert<I, K, V>(&self, values: I) -> BuildResult<Statement>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.ensure_writable()?;
        let stmt = insert::build(self.dialect(), &self.config.relation, sorted(values))?;
        log_statement(StatementKind::Insert, &self.config.relation, &stmt);
        Ok(stmt)
    }

    /// Build an UPDATE setting `values` (column → value) on rows matching the criteria.
    pub fn create_update<I, K, V>(&self, values: I) -> BuildResult<Statement>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.ensure_writable()?;
        let stmt = update::build(
            self.dialect(),
            &self.config.relation,
            sorted(values),
            &self.state().criteria,
        )?;
        log_statement(StatementKind::Update, &self.config.relation, &stmt);
        Ok(stmt)
    }

    /// Build a DELETE of rows matching the criteria.
    pub fn create_delete(&self) -> BuildResult<Statement> {
        self.ensure_writable()?;
        let stmt = delete::build(self.dialect(), &self.config.relation, &self.state().criteria);
        log_statement(StatementKind::Delete, &self.config.relation, &stmt);
        Ok(stmt)
    }

    /// Statement listing the primary key columns; empty for a SQL source.
    pub fn key_fields_query(&self) -> String {
        if self.is_virtual() {
            return String::new();
        }
        self.dialect.key_fields_query(&self.config.relation)
    }

    /// Statement listing all columns; empty for a SQL source.
    pub fn columns_query(&self) -> String {
        if self.is_virtual() {
            return String::new();
        }
        self.dialect.columns_query(&self.config.relation)
    }

    fn ensure_writable(&self) -> BuildResult<()> {
        if self.is_virtual() {
            return Err(BuildError::NotWritable(self.config.relation.clone()));
        }
        Ok(())
    }
}

fn sorted<I, K, V>(values: I) -> BTreeMap<String, Value>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    values
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

fn log_statement(kind: StatementKind, relation: &str, stmt: &Statement) {
    tracing::debug!(
        target: "dynsql.sql",
        kind = ?kind,
        relation,
        param_count = stmt.params.len(),
        sql = %stmt.sql,
        "statement built"
    );
}

#[cfg(test)]
mod tests;
