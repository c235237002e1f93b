use crate::cli::{RenderArgs, StatementArg};
use anyhow::Context;
use dynsql::{DataSourceConfig, Statement, Value};

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    println!("{}", render(&args)?);
    Ok(())
}

/// Build the requested statement and format it for printing.
pub fn render(args: &RenderArgs) -> anyhow::Result<String> {
    let config = DataSourceConfig::load(&args.definition)
        .with_context(|| format!("failed to load definition {}", args.definition.display()))?;
    let name = config.name.clone();
    let qb = config
        .into_builder()
        .with_context(|| format!("invalid data source '{name}'"))?;

    let values = args
        .set
        .iter()
        .map(|(column, raw)| (column.clone(), parse_value(raw)));

    let stmt = match args.statement {
        StatementArg::Select => qb.create_select(),
        StatementArg::Insert => qb.create_insert(values)?,
        StatementArg::Update => qb.create_update(values)?,
        StatementArg::Delete => qb.create_delete()?,
        StatementArg::Keys => introspection(qb.key_fields_query(), &name)?,
        StatementArg::Columns => introspection(qb.columns_query(), &name)?,
    };

    format_statement(&stmt, args.json)
}

fn introspection(sql: String, name: &str) -> anyhow::Result<Statement> {
    if sql.is_empty() {
        anyhow::bail!("data source '{name}' is backed by SQL and has no table metadata");
    }
    Ok(Statement::new(sql, Vec::new()))
}

/// JSON literals keep their type (`31`, `true`, `null`); anything else is text.
fn parse_value(raw: &str) -> Value {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(v @ (serde_json::Value::Null
        | serde_json::Value::Bool(_)
        | serde_json::Value::Number(_)
        | serde_json::Value::String(_))) => Value::from(v),
        _ => Value::Text(raw.to_string()),
    }
}

fn format_statement(stmt: &Statement, json: bool) -> anyhow::Result<String> {
    if json {
        return serde_json::to_string_pretty(stmt).context("failed to serialize statement");
    }
    let params = serde_json::to_string(&stmt.params).context("failed to serialize parameters")?;
    Ok(format!("{}\n-- params: {params}", stmt.sql))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_keep_json_types() {
        assert_eq!(parse_value("31"), Value::Int(31));
        assert_eq!(parse_value("2.5"), Value::Float(2.5));
        assert_eq!(parse_value("true"), Value::Bool(true));
        assert_eq!(parse_value("null"), Value::Null);
        assert_eq!(parse_value("\"31\""), Value::Text("31".to_string()));
        assert_eq!(parse_value("inactive"), Value::Text("inactive".to_string()));
        assert_eq!(parse_value("[1,2]"), Value::Text("[1,2]".to_string()));
    }

    #[test]
    fn text_output_lists_params() {
        let stmt = Statement::new("SELECT t.* FROM t WHERE t.a=?", vec![Value::Int(1)]);
        assert_eq!(
            format_statement(&stmt, false).unwrap(),
            "SELECT t.* FROM t WHERE t.a=?\n-- params: [1]"
        );
    }
}
