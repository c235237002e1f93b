//! Criterion chain rendering and per-operator dispatch.

use crate::criterion::{Criterion, CriterionValue, Operator};
use crate::dialect::Dialect;
use crate::ident;
use crate::statement::ParamList;
use crate::value::{Operand, Value};

/// Render `criteria` as a boolean expression, qualifying bare properties with
/// `qualifier`.
///
/// Returns the fragment and the values bound by it, in placeholder order. An empty
/// chain renders as an empty fragment.
///
/// # Example
/// ```
/// use dynsql::builder::render_chain;
/// use dynsql::dialect::MySql;
/// use dynsql::{Combinator, Criterion, CriterionValue, Operator, Value};
///
/// let criteria = vec![
///     Criterion::new("a", Operator::Eq, Combinator::And, CriterionValue::single(1)),
///     Criterion::new("b", Operator::Eq, Combinator::Or, CriterionValue::single(2)),
/// ];
/// let (sql, params) = render_chain(&MySql, "t", &criteria);
/// assert_eq!(sql, "t.a=? OR t.b=?");
/// assert_eq!(params, vec![Value::Int(1), Value::Int(2)]);
/// ```
pub fn render_chain(dialect: &dyn Dialect, qualifier: &str, criteria: &[Criterion]) -> (String, Vec<Value>) {
    let mut out = String::new();
    let mut params = ParamList::new();
    write_chain(&mut out, dialect, qualifier, criteria, &mut params);
    (out, params.into_vec())
}

/// Append a criterion chain to `out`, pushing bound values onto `params`.
pub(crate) fn write_chain(
    out: &mut String,
    dialect: &dyn Dialect,
    qualifier: &str,
    criteria: &[Criterion],
    params: &mut ParamList,
) {
    for (i, criterion) in criteria.iter().enumerate() {
        // The first predicate opens the chain; its connective has nothing to join.
        if i > 0 {
            out.push(' ');
            out.push_str(criterion.combinator().as_sql());
            out.push(' ');
        }
        write_criterion(out, dialect, qualifier, criterion, params);
    }
}

fn write_criterion(
    out: &mut String,
    dialect: &dyn Dialect,
    qualifier: &str,
    criterion: &Criterion,
    params: &mut ParamList,
) {
    let field = qualify(qualifier, criterion.property());
    let value = criterion.value();

    match criterion.operator() {
        Operator::AlwaysFalse => out.push_str("1=0"),
        Operator::AlwaysTrue => out.push_str("1=1"),
        Operator::IsNull => {
            dialect.write_ident(out, &field);
            out.push_str(" IS NULL");
        }
        Operator::IsNotNull => {
            dialect.write_ident(out, &field);
            out.push_str(" IS NOT NULL");
        }
        Operator::Between => {
            let (lo, hi) = match value {
                CriterionValue::Sequence(bounds) if bounds.len() == 2 => (&bounds[0], &bounds[1]),
                other => shape_violation(criterion, other),
            };
            dialect.write_ident(out, &field);
            out.push_str(" BETWEEN ");
            write_operand(out, dialect, lo, params);
            out.push_str(" AND ");
            write_operand(out, dialect, hi, params);
        }
        Operator::In => {
            let items = match value {
                CriterionValue::Sequence(items) => items.as_slice(),
                CriterionValue::Single(item) => std::slice::from_ref(item),
                other => shape_violation(criterion, other),
            };
            // `IN ()` is not valid SQL; an empty set matches nothing.
            if items.is_empty() {
                out.push_str("1=0");
                return;
            }
            dialect.write_ident(out, &field);
            out.push_str(" IN (");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_operand(out, dialect, item, params);
            }
            out.push(')');
        }
        op => {
            let operand = match value {
                CriterionValue::Single(operand) => operand,
                other => shape_violation(criterion, other),
            };
            dialect.write_ident(out, &field);
            out.push_str(op.comparison_token().unwrap_or("="));
            write_operand(out, dialect, operand, params);
        }
    }
}

/// Literal values become placeholders; field references are written as columns.
fn write_operand(out: &mut String, dialect: &dyn Dialect, operand: &Operand, params: &mut ParamList) {
    match operand {
        Operand::Value(v) => {
            let index = params.push(v.clone());
            dialect.write_placeholder(out, index);
        }
        Operand::Field(f) => dialect.write_ident(out, &f.qualified()),
    }
}

/// `qualifier.property`, unless the property already names its relation.
pub(crate) fn qualify(qualifier: &str, property: &str) -> String {
    if ident::is_qualified(property) {
        property.to_string()
    } else {
        format!("{qualifier}.{property}")
    }
}

#[cold]
#[track_caller]
fn shape_violation(criterion: &Criterion, value: &CriterionValue) -> ! {
    panic!(
        "criterion on '{}' with operator {} has an unsupported value shape: {:?}",
        criterion.property(),
        criterion.operator(),
        value
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criterion::Combinator;
    use crate::dialect::{MySql, Postgres};
    use crate::value::FieldRef;

    fn c(property: &str, op: Operator, comb: Combinator, value: CriterionValue) -> Criterion {
        Criterion::new(property, op, comb, value)
    }

    #[test]
    fn empty_chain() {
        let (sql, params) = render_chain(&MySql, "t", &[]);
        assert_eq!(sql, "");
        assert!(params.is_empty());
    }

    #[test]
    fn chain_keeps_parameter_order() {
        let criteria = vec![
            c("a", Operator::Eq, Combinator::Or, CriterionValue::single(1)),
            c("b", Operator::Eq, Combinator::And, CriterionValue::single(2)),
            c("c", Operator::Eq, Combinator::Or, CriterionValue::single(3)),
        ];
        let (sql, params) = render_chain(&MySql, "t", &criteria);
        assert_eq!(sql, "t.a=? AND t.b=? OR t.c=?");
        assert_eq!(params, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    }

    #[test]
    fn qualified_property_is_not_requalified() {
        let criteria = vec![c("o.ORG_ID", Operator::Ne, Combinator::And, CriterionValue::single("x"))];
        let (sql, _) = render_chain(&MySql, "u", &criteria);
        assert_eq!(sql, "o.ORG_ID<>?");
    }

    #[test]
    fn field_reference_is_not_bound() {
        let criteria = vec![c(
            "ORG_ID",
            Operator::Eq,
            Combinator::And,
            FieldRef::new("JEDA_ORG", "ORG_ID").into(),
        )];
        let (sql, params) = render_chain(&MySql, "JEDA_USER", &criteria);
        assert_eq!(sql, "JEDA_USER.ORG_ID=JEDA_ORG.ORG_ID");
        assert!(params.is_empty());
    }

    #[test]
    fn between_binds_low_then_high() {
        let criteria = vec![c("z", Operator::Between, Combinator::And, CriterionValue::pair(10, 20))];
        let (sql, params) = render_chain(&MySql, "t", &criteria);
        assert_eq!(sql, "t.z BETWEEN ? AND ?");
        assert_eq!(params, vec![Value::Int(10), Value::Int(20)]);
    }

    #[test]
    fn between_mixes_field_and_literal_bounds() {
        let criteria = vec![c(
            "d",
            Operator::Between,
            Combinator::And,
            CriterionValue::pair(FieldRef::new("p", "start_at"), 99),
        )];
        let (sql, params) = render_chain(&Postgres, "t", &criteria);
        assert_eq!(sql, "t.d BETWEEN p.start_at AND $1");
        assert_eq!(params, vec![Value::Int(99)]);
    }

    #[test]
    fn in_expands_one_placeholder_per_element() {
        let criteria = vec![c("id", Operator::In, Combinator::And, CriterionValue::list([1, 2, 3]))];
        let (sql, params) = render_chain(&MySql, "t", &criteria);
        assert_eq!(sql, "t.id IN (?,?,?)");
        assert_eq!(params, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    }

    #[test]
    fn in_single_value_falls_back() {
        let criteria = vec![c("id", Operator::In, Combinator::And, CriterionValue::single(4))];
        let (sql, params) = render_chain(&MySql, "t", &criteria);
        assert_eq!(sql, "t.id IN (?)");
        assert_eq!(params, vec![Value::Int(4)]);
    }

    #[test]
    fn empty_in_matches_nothing() {
        let criteria = vec![c(
            "id",
            Operator::In,
            Combinator::And,
            CriterionValue::list(Vec::<i64>::new()),
        )];
        let (sql, params) = render_chain(&MySql, "t", &criteria);
        assert_eq!(sql, "1=0");
        assert!(params.is_empty());
    }

    #[test]
    fn null_checks_and_constants() {
        let criteria = vec![
            c("a", Operator::IsNull, Combinator::And, CriterionValue::Absent),
            c("b", Operator::IsNotNull, Combinator::Or, CriterionValue::Absent),
            c("", Operator::AlwaysTrue, Combinator::And, CriterionValue::Absent),
            c("", Operator::AlwaysFalse, Combinator::Or, CriterionValue::Absent),
        ];
        let (sql, params) = render_chain(&MySql, "t", &criteria);
        assert_eq!(sql, "t.a IS NULL OR t.b IS NOT NULL AND 1=1 OR 1=0");
        assert!(params.is_empty());
    }

    #[test]
    fn comparison_family_tokens() {
        let ops = [
            (Operator::Gt, ">"),
            (Operator::Lt, "<"),
            (Operator::Ge, ">="),
            (Operator::Le, "<="),
        ];
        for (op, token) in ops {
            let (sql, _) = render_chain(&MySql, "t", &[c("n", op, Combinator::And, CriterionValue::single(5))]);
            assert_eq!(sql, format!("t.n{token}?"));
        }
    }

    #[test]
    fn postgres_numbers_placeholders() {
        let criteria = vec![
            c("a", Operator::Eq, Combinator::And, CriterionValue::single(1)),
            c("b", Operator::In, Combinator::And, CriterionValue::list(["x", "y"])),
        ];
        let (sql, _) = render_chain(&Postgres, "t", &criteria);
        assert_eq!(sql, "t.a=$1 AND t.b IN ($2,$3)");
    }

    #[test]
    fn non_plain_names_are_quoted() {
        let criteria = vec![c("order date", Operator::Eq, Combinator::And, CriterionValue::single(1))];
        let (sql, _) = render_chain(&MySql, "sales", &criteria);
        assert_eq!(sql, "sales.`order date`=?");
    }
}
