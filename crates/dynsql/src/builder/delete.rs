//! DELETE assembly.

use super::render::write_chain;
use crate::criterion::Criterion;
use crate::dialect::Dialect;
use crate::statement::{ParamList, Statement};

/// `DELETE FROM relation [WHERE ...]`.
pub(super) fn build(dialect: &dyn Dialect, relation: &str, criteria: &[Criterion]) -> Statement {
    let mut sql = String::from("DELETE FROM ");
    dialect.write_ident(&mut sql, relation);

    let mut params = ParamList::new();
    if criteria.is_empty() {
        tracing::warn!(target: "dynsql.sql", relation, "DELETE without criteria affects every row");
    } else {
        sql.push_str(" WHERE ");
        write_chain(&mut sql, dialect, relation, criteria, &mut params);
    }

    Statement::new(sql, params.into_vec())
}
