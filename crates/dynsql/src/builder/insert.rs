//! INSERT assembly.

use crate::dialect::Dialect;
use crate::error::{BuildError, BuildResult};
use crate::ident;
use crate::statement::{ParamList, Statement};
use crate::value::Value;
use std::collections::BTreeMap;

/// `INSERT INTO relation (c1, c2) VALUES (?, ?)`, columns in name order.
pub(super) fn build(
    dialect: &dyn Dialect,
    relation: &str,
    values: BTreeMap<String, Value>,
) -> BuildResult<Statement> {
    if values.is_empty() {
        return Err(BuildError::EmptyValues("INSERT"));
    }

    let mut sql = String::from("INSERT INTO ");
    dialect.write_ident(&mut sql, relation);
    sql.push_str(" (");

    let mut placeholders = String::new();
    let mut params = ParamList::new();
    for (i, (column, value)) in values.into_iter().enumerate() {
        ident::validate(&column)?;
        if i > 0 {
            sql.push_str(", ");
            placeholders.push_str(", ");
        }
        dialect.write_ident(&mut sql, &column);
        let index = params.push(value);
        dialect.write_placeholder(&mut placeholders, index);
    }

    sql.push_str(") VALUES (");
    sql.push_str(&placeholders);
    sql.push(')');

    Ok(Statement::new(sql, params.into_vec()))
}
