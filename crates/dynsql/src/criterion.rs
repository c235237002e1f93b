//! Filter criteria for dynamic WHERE and JOIN ... ON clauses.
//!
//! A [`Criterion`] is one predicate plus the [`Combinator`] that links it to the
//! predicates before it. The value shape is checked against the [`Operator`] when the
//! criterion is built, so rendering never inspects values at runtime.
//!
//! # Example
//! ```
//! use dynsql::{Combinator, Criterion, CriterionValue, Operator};
//!
//! let c = Criterion::new("Z", Operator::Between, Combinator::And, CriterionValue::pair(10, 20));
//! assert_eq!(c.operator(), Operator::Between);
//! ```

use crate::error::{BuildError, BuildResult};
use crate::ident;
use crate::value::{FieldRef, Operand, Value};
use std::fmt;
use std::str::FromStr;

/// Comparison operator of a criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `=`
    Eq,
    /// `<>`
    Ne,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `>=`
    Ge,
    /// `<=`
    Le,
    /// `BETWEEN lo AND hi`
    Between,
    /// `IN (...)`
    In,
    /// `IS NULL`
    IsNull,
    /// `IS NOT NULL`
    IsNotNull,
    /// Contradiction, renders `1=0`
    AlwaysFalse,
    /// Tautology, renders `1=1`
    AlwaysTrue,
}

impl Operator {
    /// SQL token for the comparison family, `None` for the other operators.
    pub fn comparison_token(self) -> Option<&'static str> {
        match self {
            Operator::Eq => Some("="),
            Operator::Ne => Some("<>"),
            Operator::Gt => Some(">"),
            Operator::Lt => Some("<"),
            Operator::Ge => Some(">="),
            Operator::Le => Some("<="),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Between => "between",
            Operator::In => "in",
            Operator::IsNull => "is null",
            Operator::IsNotNull => "is not null",
            Operator::AlwaysFalse => "alwaysfalse",
            Operator::AlwaysTrue => "alwaystrue",
            cmp => cmp.comparison_token().unwrap_or_default(),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ").to_ascii_lowercase();
        let op = match normalized.as_str() {
            "=" | "eq" => Operator::Eq,
            "<>" | "!=" | "ne" => Operator::Ne,
            ">" | "gt" => Operator::Gt,
            "<" | "lt" => Operator::Lt,
            ">=" | "ge" | "gte" => Operator::Ge,
            "<=" | "le" | "lte" => Operator::Le,
            "between" => Operator::Between,
            "in" => Operator::In,
            "is null" | "is_null" => Operator::IsNull,
            "is not null" | "is_not_null" => Operator::IsNotNull,
            "alwaysfalse" | "always_false" => Operator::AlwaysFalse,
            "alwaystrue" | "always_true" => Operator::AlwaysTrue,
            _ => return Err(BuildError::InvalidOperator(s.to_string())),
        };
        Ok(op)
    }
}

/// Boolean connective linking a criterion to the chain before it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Combinator {
    #[default]
    And,
    Or,
}

impl Combinator {
    pub fn as_sql(self) -> &'static str {
        match self {
            Combinator::And => "AND",
            Combinator::Or => "OR",
        }
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for Combinator {
    type Err = BuildError;

    /// Only `and` / `or` are connectives. Anything else used to drop the criterion
    /// from the chain without notice, so it is rejected here instead.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "and" => Ok(Combinator::And),
            "or" => Ok(Combinator::Or),
            _ => Err(BuildError::InvalidCombinator(s.to_string())),
        }
    }
}

/// Value side of a criterion, tagged by shape.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CriterionValue {
    /// No value (NULL checks, always-true/false)
    #[default]
    Absent,
    /// One operand (comparison family; `IN` falls back to a single placeholder)
    Single(Operand),
    /// Ordered operands (`BETWEEN` takes exactly two, `IN` any number)
    Sequence(Vec<Operand>),
}

impl CriterionValue {
    pub fn single(v: impl Into<Operand>) -> Self {
        CriterionValue::Single(v.into())
    }

    pub fn field(relation: impl Into<String>, field: impl Into<String>) -> Self {
        CriterionValue::Single(Operand::Field(FieldRef::new(relation, field)))
    }

    pub fn pair(lo: impl Into<Operand>, hi: impl Into<Operand>) -> Self {
        CriterionValue::Sequence(vec![lo.into(), hi.into()])
    }

    pub fn list<T: Into<Operand>>(items: impl IntoIterator<Item = T>) -> Self {
        CriterionValue::Sequence(items.into_iter().map(Into::into).collect())
    }

    fn shape(&self) -> &'static str {
        match self {
            CriterionValue::Absent => "no value",
            CriterionValue::Single(_) => "a single value",
            CriterionValue::Sequence(_) => "a sequence",
        }
    }
}

impl From<Operand> for CriterionValue {
    fn from(v: Operand) -> Self {
        CriterionValue::Single(v)
    }
}

impl From<FieldRef> for CriterionValue {
    fn from(v: FieldRef) -> Self {
        CriterionValue::Single(Operand::Field(v))
    }
}

macro_rules! impl_single_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for CriterionValue {
                fn from(v: $t) -> Self {
                    CriterionValue::Single(Operand::from(v))
                }
            }
        )*
    };
}

impl_single_from!(Value, i8, i16, i32, i64, u8, u16, u32, bool, f32, f64, &str, String);

/// One filter predicate of a criterion chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Criterion {
    property: String,
    operator: Operator,
    combinator: Combinator,
    value: CriterionValue,
}

impl Criterion {
    /// Build a criterion, reporting a property/value problem as an error.
    ///
    /// Use this when the criterion comes from outside the program (a definition file).
    pub fn try_new(
        property: impl Into<String>,
        operator: Operator,
        combinator: Combinator,
        value: CriterionValue,
    ) -> BuildResult<Self> {
        let property = property.into();
        if !matches!(operator, Operator::AlwaysFalse | Operator::AlwaysTrue) {
            ident::validate(&property)?;
        }
        check_shape(&property, operator, &value)?;
        Ok(Self {
            property,
            operator,
            combinator,
            value,
        })
    }

    /// Build a criterion from values assembled in code.
    ///
    /// # Panics
    ///
    /// Panics when the value shape does not fit the operator (for example a `BETWEEN`
    /// without exactly two bounds) or the property is not a valid identifier. Such a
    /// criterion can only come from a bug in the calling code.
    #[track_caller]
    pub fn new(
        property: impl Into<String>,
        operator: Operator,
        combinator: Combinator,
        value: CriterionValue,
    ) -> Self {
        match Self::try_new(property, operator, combinator, value) {
            Ok(c) => c,
            Err(e) => panic!("malformed criterion: {e}"),
        }
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn combinator(&self) -> Combinator {
        self.combinator
    }

    pub fn value(&self) -> &CriterionValue {
        &self.value
    }
}

fn check_shape(property: &str, operator: Operator, value: &CriterionValue) -> BuildResult<()> {
    let ok = match operator {
        Operator::Between => matches!(value, CriterionValue::Sequence(v) if v.len() == 2),
        Operator::In => !matches!(value, CriterionValue::Absent),
        Operator::IsNull | Operator::IsNotNull | Operator::AlwaysFalse | Operator::AlwaysTrue => {
            matches!(value, CriterionValue::Absent)
        }
        _ => matches!(value, CriterionValue::Single(_)),
    };
    if ok {
        return Ok(());
    }
    let expected = match operator {
        Operator::Between => "a sequence of exactly 2 values",
        Operator::In => "a sequence or a single value",
        Operator::IsNull | Operator::IsNotNull | Operator::AlwaysFalse | Operator::AlwaysTrue => {
            "no value"
        }
        _ => "a single value",
    };
    Err(BuildError::invalid_criterion(
        property,
        format!("{operator} expects {expected}, got {}", value.shape()),
    ))
}
