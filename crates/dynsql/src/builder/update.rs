//! UPDATE assembly.

use super::render::write_chain;
use crate::criterion::Criterion;
use crate::dialect::Dialect;
use crate::error::{BuildError, BuildResult};
use crate::ident;
use crate::statement::{ParamList, Statement};
use crate::value::Value;
use std::collections::BTreeMap;

/// `UPDATE relation SET c1=?, c2=? [WHERE ...]`.
///
/// SET values are bound first, in column name order, then the WHERE values.
pub(super) fn build(
    dialect: &dyn Dialect,
    relation: &str,
    values: BTreeMap<String, Value>,
    criteria: &[Criterion],
) -> BuildResult<Statement> {
    if values.is_empty() {
        return Err(BuildError::EmptyValues("UPDATE"));
    }

    let mut sql = String::from("UPDATE ");
    dialect.write_ident(&mut sql, relation);
    sql.push_str(" SET ");

    let mut params = ParamList::new();
    for (i, (column, value)) in values.into_iter().enumerate() {
        ident::validate(&column)?;
        if i > 0 {
            sql.push_str(", ");
        }
        dialect.write_ident(&mut sql, &column);
        sql.push('=');
        let index = params.push(value);
        dialect.write_placeholder(&mut sql, index);
    }

    if criteria.is_empty() {
        tracing::warn!(target: "dynsql.sql", relation, "UPDATE without criteria affects every row");
    } else {
        sql.push_str(" WHERE ");
        write_chain(&mut sql, dialect, relation, criteria, &mut params);
    }

    Ok(Statement::new(sql, params.into_vec()))
}
