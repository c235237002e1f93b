//! Data source definitions.
//!
//! A data source is described once (TOML or JSON) and turned into a ready
//! [`SqlBuilder`] with its base criteria, joins and aggregates already applied.
//!
//! ```toml
//! name = "active_users"
//! dialect = "mysql"
//! table = "JEDA_USER"
//! columns = ["USER_ID", "ORG_ID"]
//! rows_limit = 50
//!
//! [[criteria]]
//! field = "STATUS"
//! op = "="
//! value = "A"
//!
//! [[joins]]
//! kind = "left"
//! table = "JEDA_ORG"
//! output_columns = ["ORG_NAME"]
//! criteria = [{ field = "ORG_ID", op = "=", field_ref = { relation = "JEDA_ORG", field = "ORG_ID" } }]
//! ```

use crate::builder::{AggregateSpec, BuilderConfig, JoinKind, JoinSpec, SqlBuilder};
use crate::criterion::{Combinator, Criterion, CriterionValue, Operator};
use crate::dialect::DialectKind;
use crate::error::{BuildError, BuildResult};
use crate::ident;
use crate::value::{FieldRef, Operand, Value};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// One data source: a table or a SQL source, plus its base query shape.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataSourceConfig {
    pub name: String,
    #[serde(default = "default_dialect")]
    pub dialect: String,

    /// Backing table; mutually exclusive with `sql`.
    pub table: Option<String>,
    /// SQL source, aliased to `name`.
    pub sql: Option<String>,
    /// Values bound by `sql` itself.
    #[serde(default)]
    pub sql_params: Vec<Value>,

    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub order_by: Vec<String>,
    #[serde(default)]
    pub rows_limit: u64,
    #[serde(default)]
    pub rows_offset: u64,

    #[serde(default)]
    pub criteria: Vec<CriterionConfig>,
    #[serde(default)]
    pub aggregates: BTreeMap<String, AggregateSpec>,
    #[serde(default)]
    pub joins: Vec<JoinConfig>,
}

/// A criterion as written in a definition file.
///
/// `value` is bound as a parameter (an array supplies `IN` / `BETWEEN` operands);
/// `field_ref` compares against another relation's column instead.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CriterionConfig {
    pub field: String,
    #[serde(default = "default_op")]
    pub op: String,
    #[serde(default = "default_combinator")]
    pub combinator: String,
    pub value: Option<serde_json::Value>,
    pub field_ref: Option<FieldRef>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JoinConfig {
    #[serde(default)]
    pub kind: JoinKind,
    pub table: String,
    #[serde(default)]
    pub criteria: Vec<CriterionConfig>,
    #[serde(default)]
    pub output_columns: Vec<String>,
}

fn default_dialect() -> String {
    "mysql".to_string()
}

fn default_op() -> String {
    "=".to_string()
}

fn default_combinator() -> String {
    "and".to_string()
}

impl CriterionConfig {
    /// Parse operator, combinator and value into a checked [`Criterion`].
    pub fn to_criterion(&self) -> BuildResult<Criterion> {
        let operator: Operator = self.op.parse()?;
        let combinator: Combinator = self.combinator.parse()?;
        let value = match (&self.value, &self.field_ref) {
            (Some(_), Some(_)) => {
                return Err(BuildError::invalid_criterion(
                    &self.field,
                    "`value` and `field_ref` are mutually exclusive",
                ));
            }
            (None, Some(f)) => CriterionValue::Single(Operand::Field(f.clone())),
            (None, None) => CriterionValue::Absent,
            (Some(serde_json::Value::Array(items)), None) => CriterionValue::Sequence(
                items
                    .iter()
                    .cloned()
                    .map(|v| Operand::Value(Value::from(v)))
                    .collect(),
            ),
            (Some(v), None) => CriterionValue::Single(Operand::Value(Value::from(v.clone()))),
        };
        Criterion::try_new(&self.field, operator, combinator, value)
    }
}

impl JoinConfig {
    pub fn to_join(&self) -> BuildResult<JoinSpec> {
        ident::validate(&self.table)?;
        let mut join = JoinSpec::new(self.kind, &self.table);
        for c in &self.criteria {
            join = join.push_criterion(c.to_criterion()?);
        }
        for column in &self.output_columns {
            ident::validate(column)?;
        }
        Ok(join.output_columns(self.output_columns.iter().cloned()))
    }
}

impl DataSourceConfig {
    pub fn from_toml_str(raw: &str) -> BuildResult<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(raw: &str) -> BuildResult<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a definition file; the format follows the extension (`.toml` or `.json`).
    pub fn load(path: impl AsRef<Path>) -> BuildResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let parsed = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&raw),
            Some("json") => Self::from_json_str(&raw),
            _ => {
                return Err(BuildError::config(format!(
                    "unrecognized definition format: {} (expected .toml or .json)",
                    path.display()
                )));
            }
        };
        parsed.map_err(|e| match e {
            BuildError::Config(msg) => BuildError::config(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    /// Name of the relation statements are built over.
    pub fn relation(&self) -> &str {
        self.table.as_deref().unwrap_or(&self.name)
    }

    fn validate(&self) -> BuildResult<()> {
        if self.name.trim().is_empty() {
            return Err(BuildError::config("data source name cannot be empty"));
        }
        match (&self.table, &self.sql) {
            (Some(_), Some(_)) => {
                return Err(BuildError::config(format!(
                    "data source '{}': `table` and `sql` are mutually exclusive",
                    self.name
                )));
            }
            (None, None) => {
                return Err(BuildError::config(format!(
                    "data source '{}': one of `table` or `sql` is required",
                    self.name
                )));
            }
            _ => {}
        }
        self.dialect.parse::<DialectKind>()?;
        for (alias, spec) in &self.aggregates {
            ident::validate(alias)?;
            ident::validate(&spec.column)?;
        }
        Ok(())
    }

    /// The fixed part of the data source.
    pub fn builder_config(&self) -> BuilderConfig {
        let mut config = BuilderConfig::new(self.relation())
            .columns(self.columns.iter().cloned())
            .order_by(self.order_by.iter().cloned())
            .limit(self.rows_limit)
            .offset(self.rows_offset);
        if let Some(sql) = &self.sql {
            config = config.virtual_source(sql.clone(), self.sql_params.clone());
        }
        config
    }

    /// Create the builder with the definition's criteria, joins and aggregates applied.
    pub fn into_builder(self) -> BuildResult<SqlBuilder> {
        let criteria = self
            .criteria
            .iter()
            .map(CriterionConfig::to_criterion)
            .collect::<BuildResult<Vec<_>>>()?;
        let joins = self
            .joins
            .iter()
            .map(JoinConfig::to_join)
            .collect::<BuildResult<Vec<_>>>()?;

        let qb = self.builder_config().build(&self.dialect)?;
        for criterion in criteria {
            qb.push_criterion(criterion);
        }
        for join in joins {
            qb.add_join(join);
        }
        // Aliases and columns were validated when the definition was loaded.
        for (alias, spec) in self.aggregates {
            qb.add_aggregate(alias, spec);
        }

        tracing::debug!(
            target: "dynsql.sql",
            data_source = %self.name,
            relation = qb.relation(),
            dialect = qb.dialect().name(),
            "data source loaded"
        );
        Ok(qb)
    }
}
