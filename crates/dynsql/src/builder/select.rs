//! SELECT assembly.

use super::join::{write_joins, write_output_columns};
use super::projection::Projection;
use super::render::write_chain;
use super::{BuilderConfig, WorkingSet};
use crate::dialect::Dialect;
use crate::statement::{ParamList, Statement};

/// A SQL source with nothing to add is returned as written, without wrapping it in a
/// derived table.
fn is_pass_through(config: &BuilderConfig, work: &WorkingSet) -> bool {
    config.virtual_source.is_some()
        && work.criteria.is_empty()
        && work.joins.is_empty()
        && work.aggregates.is_empty()
        && config.order_by.is_empty()
        && config.row_limit == 0
        && config.row_offset == 0
        && (config.columns.is_empty()
            || (config.columns.len() == 1 && config.columns[0].trim() == "*"))
}

pub(super) fn build(dialect: &dyn Dialect, config: &BuilderConfig, work: &WorkingSet) -> Statement {
    if let (true, Some(source)) = (is_pass_through(config, work), &config.virtual_source) {
        tracing::trace!(
            target: "dynsql.sql",
            relation = %config.relation,
            "SQL source passed through unchanged"
        );
        return Statement::new(source.clone(), config.virtual_params.clone());
    }

    let projection = Projection::compose(dialect, &config.relation, &config.columns, &work.aggregates);

    let mut sql = String::from("SELECT ");
    sql.push_str(&projection.select.join(", "));
    write_output_columns(&mut sql, dialect, &work.joins);

    // The source's own placeholders precede everything generated below.
    let mut params = ParamList::seeded(&config.virtual_params);
    sql.push_str(" FROM ");
    if let Some(source) = &config.virtual_source {
        sql.push('(');
        sql.push_str(source);
        sql.push_str(") AS ");
    }
    dialect.write_ident(&mut sql, &config.relation);

    write_joins(&mut sql, dialect, &config.relation, &work.joins, &mut params);

    if !work.criteria.is_empty() {
        sql.push_str(" WHERE ");
        write_chain(&mut sql, dialect, &config.relation, &work.criteria, &mut params);
    }

    if !projection.group_by.is_empty() {
        sql.push_str(" GROUP BY ");
        sql.push_str(&projection.group_by.join(", "));
    }

    if !config.order_by.is_empty() {
        sql.push_str(" ORDER BY ");
        sql.push_str(&config.order_by.join(", "));
    }

    if config.row_limit != 0 {
        dialect.write_pagination(&mut sql, config.row_limit, config.row_offset);
    }

    Statement::new(sql, params.into_vec())
}
