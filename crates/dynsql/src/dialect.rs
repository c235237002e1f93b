//! Backend-specific SQL syntax.
//!
//! Everything the composers need to know about a backend goes through [`Dialect`]:
//! placeholder syntax, pagination, identifier quoting, and the metadata statements used
//! to discover primary keys and columns. Adding a backend means adding an
//! implementation here; the composers stay untouched.

use crate::error::BuildError;
use crate::ident;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// SQL syntax strategy for one backend.
pub trait Dialect: fmt::Debug + Send + Sync {
    /// Short name used in definitions and logs.
    fn name(&self) -> &'static str;

    /// Character used to quote identifiers that are not plain.
    fn quote_char(&self) -> char;

    /// Write a placeholder for the parameter at 1-based position `index`.
    fn write_placeholder(&self, out: &mut String, index: usize);

    /// Write the pagination suffix, including its leading space.
    fn write_pagination(&self, out: &mut String, limit: u64, offset: u64);

    /// Statement listing primary key columns (`column_name`, `data_type`) of `table`.
    fn key_fields_query(&self, table: &str) -> String;

    /// Statement listing all columns (`column_name`, `data_type`) of `table`.
    fn columns_query(&self, table: &str) -> String;

    /// Write a possibly dotted identifier.
    fn write_ident(&self, out: &mut String, name: &str) {
        ident::write_quoted(out, name, self.quote_char());
    }
}

/// MySQL: `?` placeholders and `LIMIT offset,limit`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySql;

impl Dialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_char(&self) -> char {
        '`'
    }

    fn write_placeholder(&self, out: &mut String, _index: usize) {
        out.push('?');
    }

    fn write_pagination(&self, out: &mut String, limit: u64, offset: u64) {
        out.push_str(&format!(" LIMIT {offset},{limit}"));
    }

    fn key_fields_query(&self, table: &str) -> String {
        let (schema, table) = split_schema(table);
        let mut sql = String::from(
            "SELECT a.column_name, b.data_type FROM INFORMATION_SCHEMA.KEY_COLUMN_USAGE a \
             INNER JOIN INFORMATION_SCHEMA.COLUMNS b ON a.table_schema = b.table_schema \
             AND a.table_name = b.table_name AND a.column_name = b.column_name \
             WHERE a.table_name = ",
        );
        push_literal(&mut sql, table);
        push_schema_filter(&mut sql, "a.table_schema", schema, "DATABASE()");
        sql.push_str(" AND a.constraint_name = 'PRIMARY' ORDER BY a.ordinal_position");
        sql
    }

    fn columns_query(&self, table: &str) -> String {
        let (schema, table) = split_schema(table);
        let mut sql = String::from(
            "SELECT column_name, data_type FROM INFORMATION_SCHEMA.COLUMNS WHERE table_name = ",
        );
        push_literal(&mut sql, table);
        push_schema_filter(&mut sql, "table_schema", schema, "DATABASE()");
        sql.push_str(" ORDER BY ordinal_position");
        sql
    }
}

/// PostgreSQL: `$n` placeholders and `LIMIT limit OFFSET offset`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_char(&self) -> char {
        '"'
    }

    fn write_placeholder(&self, out: &mut String, index: usize) {
        out.push('$');
        out.push_str(&index.to_string());
    }

    fn write_pagination(&self, out: &mut String, limit: u64, offset: u64) {
        out.push_str(&format!(" LIMIT {limit} OFFSET {offset}"));
    }

    fn key_fields_query(&self, table: &str) -> String {
        let (schema, table) = split_schema(table);
        let mut sql = String::from(
            "SELECT kcu.column_name, c.data_type FROM information_schema.table_constraints tc \
             INNER JOIN information_schema.key_column_usage kcu \
             ON tc.constraint_schema = kcu.constraint_schema AND tc.constraint_name = kcu.constraint_name \
             INNER JOIN information_schema.columns c ON c.table_schema = kcu.table_schema \
             AND c.table_name = kcu.table_name AND c.column_name = kcu.column_name \
             WHERE tc.constraint_type = 'PRIMARY KEY' AND tc.table_name = ",
        );
        push_literal(&mut sql, table);
        push_schema_filter(&mut sql, "tc.table_schema", schema, "current_schema()");
        sql.push_str(" ORDER BY kcu.ordinal_position");
        sql
    }

    fn columns_query(&self, table: &str) -> String {
        let (schema, table) = split_schema(table);
        let mut sql = String::from(
            "SELECT column_name, data_type FROM information_schema.columns WHERE table_name = ",
        );
        push_literal(&mut sql, table);
        push_schema_filter(&mut sql, "table_schema", schema, "current_schema()");
        sql.push_str(" ORDER BY ordinal_position");
        sql
    }
}

/// Built-in dialects, selectable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialectKind {
    MySql,
    Postgres,
}

impl DialectKind {
    pub fn dialect(self) -> Arc<dyn Dialect> {
        match self {
            DialectKind::MySql => Arc::new(MySql),
            DialectKind::Postgres => Arc::new(Postgres),
        }
    }
}

impl FromStr for DialectKind {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" => Ok(DialectKind::MySql),
            "postgres" | "postgresql" | "pg" => Ok(DialectKind::Postgres),
            _ => Err(BuildError::UnsupportedDialect(s.to_string())),
        }
    }
}

fn split_schema(table: &str) -> (Option<&str>, &str) {
    match table.rsplit_once('.') {
        Some((schema, name)) => (Some(schema), name),
        None => (None, table),
    }
}

fn push_literal(out: &mut String, s: &str) {
    out.push('\'');
    out.push_str(&s.replace('\'', "''"));
    out.push('\'');
}

fn push_schema_filter(out: &mut String, column: &str, schema: Option<&str>, current: &str) {
    out.push_str(" AND ");
    out.push_str(column);
    out.push_str(" = ");
    match schema {
        Some(schema) => push_literal(out, schema),
        None => out.push_str(current),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_dialect_names() {
        assert_eq!("MySQL".parse::<DialectKind>().unwrap(), DialectKind::MySql);
        assert_eq!("postgresql".parse::<DialectKind>().unwrap(), DialectKind::Postgres);
        assert!(matches!(
            "oracle".parse::<DialectKind>(),
            Err(BuildError::UnsupportedDialect(_))
        ));
    }

    #[test]
    fn mysql_pagination_is_offset_first() {
        let mut out = String::new();
        MySql.write_pagination(&mut out, 10, 20);
        assert_eq!(out, " LIMIT 20,10");
    }

    #[test]
    fn postgres_pagination() {
        let mut out = String::new();
        Postgres.write_pagination(&mut out, 10, 20);
        assert_eq!(out, " LIMIT 10 OFFSET 20");
    }

    #[test]
    fn placeholders() {
        let mut out = String::new();
        MySql.write_placeholder(&mut out, 3);
        Postgres.write_placeholder(&mut out, 3);
        assert_eq!(out, "?$3");
    }

    #[test]
    fn introspection_escapes_table_literal() {
        let sql = MySql.columns_query("o'brien");
        assert!(sql.contains("table_name = 'o''brien'"));
        assert!(sql.contains("table_schema = DATABASE()"));
    }

    #[test]
    fn introspection_splits_schema() {
        let sql = Postgres.key_fields_query("audit.events");
        assert!(sql.contains("tc.table_name = 'events'"));
        assert!(sql.contains("tc.table_schema = 'audit'"));
        assert!(sql.contains("'PRIMARY KEY'"));
    }

    #[test]
    fn mysql_key_fields_use_primary_constraint() {
        let sql = MySql.key_fields_query("JEDA_USER");
        assert!(sql.starts_with("SELECT a.column_name, b.data_type FROM INFORMATION_SCHEMA.KEY_COLUMN_USAGE a"));
        assert!(sql.contains("a.table_name = 'JEDA_USER'"));
        assert!(sql.contains("a.constraint_name = 'PRIMARY'"));
    }
}
