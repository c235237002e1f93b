use super::*;
use crate::value::FieldRef;
use std::collections::HashMap;

fn users() -> BuilderConfig {
    BuilderConfig::new("users")
}

#[test]
fn test_simple_select() {
    let qb = users().build("mysql").unwrap();
    assert_eq!(qb.create_select().sql, "SELECT users.* FROM users");
}

#[test]
fn test_select_columns() {
    let qb = users().columns(["id", "name"]).build("mysql").unwrap();
    assert_eq!(qb.create_select().sql, "SELECT id, name FROM users");
}

#[test]
fn test_parameter_ordering() {
    let qb = users().build("mysql").unwrap();
    qb.add_criterion("a", Operator::Eq, Combinator::And, 1)
        .add_criterion("b", Operator::Eq, Combinator::And, 2)
        .add_criterion("c", Operator::Eq, Combinator::Or, 3);
    let stmt = qb.create_select();
    assert_eq!(
        stmt.sql,
        "SELECT users.* FROM users WHERE users.a=? AND users.b=? OR users.c=?"
    );
    assert_eq!(stmt.params, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
}

#[test]
fn test_in_expansion() {
    let qb = users().build("mysql").unwrap();
    qb.and_criterion("id", Operator::In, CriterionValue::list([1, 2, 3]));
    let stmt = qb.create_select();
    assert_eq!(stmt.sql, "SELECT users.* FROM users WHERE users.id IN (?,?,?)");
    assert_eq!(stmt.params, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
}

#[test]
fn test_between() {
    let qb = users().build("mysql").unwrap();
    qb.and_criterion("age", Operator::Between, CriterionValue::pair(10, 20));
    let stmt = qb.create_select();
    assert_eq!(stmt.sql, "SELECT users.* FROM users WHERE users.age BETWEEN ? AND ?");
    assert_eq!(stmt.params, vec![Value::Int(10), Value::Int(20)]);
}

#[test]
#[should_panic(expected = "malformed criterion")]
fn test_between_wrong_arity_panics() {
    let qb = users().build("mysql").unwrap();
    qb.and_criterion("age", Operator::Between, CriterionValue::list([10, 20, 30]));
}

#[test]
fn test_aggregate_grouping() {
    let qb = BuilderConfig::new("r")
        .columns(["x", "y", "*"])
        .build("mysql")
        .unwrap();
    qb.add_aggregate("cnt", AggregateSpec::count("z"));
    assert_eq!(
        qb.create_select().sql,
        "SELECT r.x, r.y, COUNT(r.z) AS cnt FROM r GROUP BY r.x, r.y"
    );
}

#[test]
fn test_aggregate_alias_last_write_wins() {
    let qb = BuilderConfig::new("r").build("mysql").unwrap();
    qb.add_aggregate("v", AggregateSpec::min("a"))
        .add_aggregate("v", AggregateSpec::max("a"));
    assert_eq!(qb.create_select().sql, "SELECT MAX(r.a) AS v FROM r");
}

#[test]
fn test_pagination_mysql() {
    let qb = users().limit(10).offset(20).build("mysql").unwrap();
    assert_eq!(qb.create_select().sql, "SELECT users.* FROM users LIMIT 20,10");
}

#[test]
fn test_pagination_postgres() {
    let qb = users().limit(10).offset(20).build("postgres").unwrap();
    assert_eq!(qb.create_select().sql, "SELECT users.* FROM users LIMIT 10 OFFSET 20");
}

#[test]
fn test_zero_limit_omits_pagination() {
    let qb = users().limit(0).offset(20).build("mysql").unwrap();
    assert_eq!(qb.create_select().sql, "SELECT users.* FROM users");
}

#[test]
fn test_paginate_helper() {
    let qb = users().paginate(3, 25).build("postgres").unwrap();
    assert_eq!(qb.create_select().sql, "SELECT users.* FROM users LIMIT 25 OFFSET 50");
}

#[test]
fn test_order_by() {
    let qb = users()
        .order_by(["created_at DESC", "id"])
        .build("mysql")
        .unwrap();
    assert_eq!(
        qb.create_select().sql,
        "SELECT users.* FROM users ORDER BY created_at DESC, id"
    );
}

#[test]
fn test_clear_criteria_matches_fresh_builder() {
    let config = users().columns(["id"]).order_by(["id"]).limit(5);
    let qb = config.clone().build("mysql").unwrap();
    qb.and_criterion("id", Operator::Gt, 3);
    qb.clear_criteria();
    let fresh = config.build("mysql").unwrap();
    assert_eq!(qb.create_select(), fresh.create_select());
    assert!(qb.criteria().is_empty());
}

#[test]
fn test_clear_criteria_keeps_joins() {
    let qb = users().build("mysql").unwrap();
    qb.add_join(JoinSpec::inner("roles").and("role_id", Operator::Eq, FieldRef::new("roles", "id")));
    qb.and_criterion("id", Operator::Eq, 1);
    qb.clear_criteria();
    assert_eq!(
        qb.create_select().sql,
        "SELECT users.* FROM users INNER JOIN roles ON users.role_id=roles.id"
    );
}

#[test]
fn test_pass_through() {
    let qb = BuilderConfig::new("v")
        .virtual_source("select * from JEDA_USER where org_id=?", vec![Value::from("001031")])
        .columns(["*"])
        .build("mysql")
        .unwrap();
    let stmt = qb.create_select();
    assert_eq!(stmt.sql, "select * from JEDA_USER where org_id=?");
    assert_eq!(stmt.params, vec![Value::from("001031")]);
}

#[test]
fn test_pass_through_without_source_params() {
    let qb = BuilderConfig::new("v")
        .virtual_source("SELECT 1 AS one", Vec::new())
        .build("mysql")
        .unwrap();
    let stmt = qb.create_select();
    assert_eq!(stmt.sql, "SELECT 1 AS one");
    assert!(stmt.params.is_empty());
}

#[test]
fn test_virtual_source_is_wrapped_when_constrained() {
    let qb = BuilderConfig::new("v")
        .virtual_source("SELECT * FROM t WHERE org_id=?", vec![Value::from("A")])
        .build("mysql")
        .unwrap();
    qb.and_criterion("USER_ID", Operator::Eq, "u1");
    let stmt = qb.create_select();
    assert_eq!(
        stmt.sql,
        "SELECT v.* FROM (SELECT * FROM t WHERE org_id=?) AS v WHERE v.USER_ID=?"
    );
    assert_eq!(stmt.params, vec![Value::from("A"), Value::from("u1")]);
}

#[test]
fn test_virtual_source_paging_disables_pass_through() {
    let qb = BuilderConfig::new("v")
        .virtual_source("SELECT * FROM t", Vec::new())
        .limit(10)
        .build("mysql")
        .unwrap();
    assert_eq!(
        qb.create_select().sql,
        "SELECT v.* FROM (SELECT * FROM t) AS v LIMIT 0,10"
    );
}

#[test]
fn test_postgres_numbering_across_source_joins_and_where() {
    let qb = BuilderConfig::new("v")
        .virtual_source("SELECT * FROM t WHERE a = $1", vec![Value::Int(7)])
        .build("postgres")
        .unwrap();
    qb.add_join(
        JoinSpec::left("o")
            .and("oid", Operator::Eq, FieldRef::new("o", "id"))
            .and("kind", Operator::Eq, "x"),
    );
    qb.and_criterion("n", Operator::Between, CriterionValue::pair(1, 2));
    let stmt = qb.create_select();
    assert_eq!(
        stmt.sql,
        "SELECT v.* FROM (SELECT * FROM t WHERE a = $1) AS v \
         LEFT JOIN o ON v.oid=o.id AND v.kind=$2 WHERE v.n BETWEEN $3 AND $4"
    );
    assert_eq!(
        stmt.params,
        vec![Value::Int(7), Value::from("x"), Value::Int(1), Value::Int(2)]
    );
}

#[test]
fn test_join_output_columns_and_skipped_join() {
    let qb = BuilderConfig::new("JEDA_USER")
        .columns(["ORG_ID", "USER_ID"])
        .build("mysql")
        .unwrap();
    qb.add_join(
        JoinSpec::left("JEDA_ORG")
            .and("ORG_ID", Operator::Eq, FieldRef::new("JEDA_ORG", "ORG_ID"))
            .output_column("ORG_NAME"),
    )
    .add_join(JoinSpec::inner("NOWHERE").output_column("IGNORED"));
    assert_eq!(
        qb.create_select().sql,
        "SELECT ORG_ID, USER_ID, JEDA_ORG.ORG_NAME FROM JEDA_USER \
         LEFT JOIN JEDA_ORG ON JEDA_USER.ORG_ID=JEDA_ORG.ORG_ID"
    );
}

#[test]
fn test_insert_sorted_columns() {
    let qb = users().build("mysql").unwrap();
    let mut values = HashMap::new();
    values.insert("name", Value::from("alice"));
    values.insert("email", Value::from("a@example.com"));
    values.insert("age", Value::from(30));
    let stmt = qb.create_insert(values).unwrap();
    assert_eq!(stmt.sql, "INSERT INTO users (age, email, name) VALUES (?, ?, ?)");
    assert_eq!(
        stmt.params,
        vec![Value::Int(30), Value::from("a@example.com"), Value::from("alice")]
    );
}

#[test]
fn test_insert_postgres_placeholders() {
    let qb = users().build("postgres").unwrap();
    let stmt = qb.create_insert([("b", 2), ("a", 1)]).unwrap();
    assert_eq!(stmt.sql, "INSERT INTO users (a, b) VALUES ($1, $2)");
}

#[test]
fn test_insert_empty_values() {
    let qb = users().build("mysql").unwrap();
    let err = qb.create_insert(Vec::<(String, Value)>::new()).unwrap_err();
    assert!(matches!(err, BuildError::EmptyValues("INSERT")));
}

#[test]
fn test_update_set_then_where() {
    let qb = users().build("postgres").unwrap();
    qb.and_criterion("id", Operator::Eq, 9);
    let stmt = qb
        .create_update([("status", Value::from("inactive")), ("age", Value::from(31))])
        .unwrap();
    assert_eq!(
        stmt.sql,
        "UPDATE users SET age=$1, status=$2 WHERE users.id=$3"
    );
    assert_eq!(
        stmt.params,
        vec![Value::Int(31), Value::from("inactive"), Value::Int(9)]
    );
}

#[test]
fn test_update_without_criteria() {
    let qb = users().build("mysql").unwrap();
    let stmt = qb.create_update([("a", 1)]).unwrap();
    assert_eq!(stmt.sql, "UPDATE users SET a=?");
}

#[test]
fn test_delete() {
    let qb = users().build("mysql").unwrap();
    assert_eq!(qb.create_delete().unwrap().sql, "DELETE FROM users");
    qb.and_criterion("id", Operator::In, CriterionValue::list([1, 2]));
    let stmt = qb.create_delete().unwrap();
    assert_eq!(stmt.sql, "DELETE FROM users WHERE users.id IN (?,?)");
    assert_eq!(stmt.params, vec![Value::Int(1), Value::Int(2)]);
}

#[test]
fn test_virtual_relation_is_not_writable() {
    let qb = BuilderConfig::new("v")
        .virtual_source("SELECT 1", Vec::new())
        .build("mysql")
        .unwrap();
    assert!(matches!(qb.create_delete(), Err(BuildError::NotWritable(_))));
    assert!(matches!(qb.create_insert([("a", 1)]), Err(BuildError::NotWritable(_))));
    assert!(matches!(qb.create_update([("a", 1)]), Err(BuildError::NotWritable(_))));
}

#[test]
fn test_introspection_queries() {
    let qb = users().build("mysql").unwrap();
    assert!(qb.key_fields_query().contains("'PRIMARY'"));
    assert!(qb.columns_query().contains("table_name = 'users'"));

    let v = BuilderConfig::new("v")
        .virtual_source("SELECT 1", Vec::new())
        .build("mysql")
        .unwrap();
    assert_eq!(v.key_fields_query(), "");
    assert_eq!(v.columns_query(), "");
}

#[test]
fn test_unsupported_dialect() {
    let err = users().build("oracle").unwrap_err();
    assert!(matches!(err, BuildError::UnsupportedDialect(_)));
    assert!(err.is_config());
}

#[test]
fn test_missing_relation() {
    assert!(matches!(
        SqlBuilder::new("mysql", " "),
        Err(BuildError::MissingRelation)
    ));
}

#[test]
fn test_source_params_without_source() {
    let mut config = users();
    config.virtual_params = vec![Value::Int(1)];
    assert!(matches!(config.build("mysql"), Err(BuildError::Config(_))));
}

#[test]
fn test_filter_by_values_replaces_criteria() {
    let qb = users().build("mysql").unwrap();
    qb.and_criterion("old", Operator::Eq, 0);
    qb.filter_by_values([("NAMESPACE", "ns"), ("CONTEXT", "ctx")]);
    let stmt = qb.create_select();
    assert_eq!(
        stmt.sql,
        "SELECT users.* FROM users WHERE users.CONTEXT=? AND users.NAMESPACE=?"
    );
    assert_eq!(stmt.params, vec![Value::from("ctx"), Value::from("ns")]);
}

#[test]
fn test_filter_by_key() {
    let qb = users().build("mysql").unwrap();
    qb.filter_by_key(&["org_id", "user_id"], &[Value::from("o"), Value::from("u")])
        .unwrap();
    assert_eq!(
        qb.create_select().sql,
        "SELECT users.* FROM users WHERE users.org_id=? AND users.user_id=?"
    );
    assert!(qb.filter_by_key(&["id"], &[]).is_err());
    assert!(qb.filter_by_key(&["id"], &[Value::Int(1), Value::Int(2)]).is_err());
}

#[test]
fn test_shared_between_threads() {
    let qb = Arc::new(users().build("mysql").unwrap());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let qb = Arc::clone(&qb);
            std::thread::spawn(move || {
                qb.and_criterion("id", Operator::Ne, i);
                qb.create_select()
            })
        })
        .collect();
    for h in handles {
        let stmt = h.join().unwrap();
        // Every snapshot is consistent: one placeholder per bound value.
        assert_eq!(stmt.sql.matches('?').count(), stmt.params.len());
    }
    assert_eq!(qb.criteria().len(), 8);
}
