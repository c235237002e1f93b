//! # dynsql
//!
//! Dynamic, dialect-aware SQL statement construction.
//!
//! ## Features
//!
//! - **Data sources**: a builder works over a table or over an arbitrary SQL source
//!   aliased as a relation
//! - **Criteria chains**: comparison, `BETWEEN`, `IN`, NULL checks and constant
//!   predicates, linked by `AND` / `OR`
//! - **Joins & aggregates**: joined relations with their own ON chains, aggregate
//!   projections with an implicit GROUP BY
//! - **Positional parameters**: every literal becomes a placeholder; values are returned
//!   in placeholder order
//! - **Dialects**: MySQL (`?`, `LIMIT offset,limit`) and PostgreSQL (`$n`,
//!   `LIMIT n OFFSET m`)
//! - **Definitions**: data sources described in TOML or JSON
//!
//! ## Example
//!
//! ```
//! use dynsql::{BuilderConfig, CriterionValue, Operator, Value};
//!
//! let qb = BuilderConfig::new("users")
//!     .columns(["id", "name"])
//!     .order_by(["id"])
//!     .limit(10)
//!     .build("postgres")?;
//!
//! qb.and_criterion("status", Operator::Eq, "active")
//!     .and_criterion("role", Operator::In, CriterionValue::list(["admin", "owner"]));
//!
//! let stmt = qb.create_select();
//! assert_eq!(
//!     stmt.sql,
//!     "SELECT id, name FROM users WHERE users.status=$1 AND users.role IN ($2,$3) \
//!      ORDER BY id LIMIT 10 OFFSET 0"
//! );
//! assert_eq!(stmt.params[0], Value::from("active"));
//! # Ok::<(), dynsql::BuildError>(())
//! ```

pub mod builder;
pub mod config;
pub mod criterion;
pub mod dialect;
pub mod error;
pub mod ident;
pub mod statement;
pub mod value;

pub use builder::{AggregateFn, AggregateSpec, BuilderConfig, JoinKind, JoinSpec, SqlBuilder};
pub use config::{CriterionConfig, DataSourceConfig, JoinConfig};
pub use criterion::{Combinator, Criterion, CriterionValue, Operator};
pub use dialect::{Dialect, DialectKind};
pub use error::{BuildError, BuildResult};
pub use statement::{Statement, StatementKind};
pub use value::{FieldRef, Operand, Value};
