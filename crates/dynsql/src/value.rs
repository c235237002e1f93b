//! Bindable values and field references.
//!
//! A criterion compares a column either against a literal [`Value`] (bound as a
//! parameter) or against a [`FieldRef`] (written into the SQL text as a qualified
//! column). [`Operand`] is the single place where that choice is made.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// A literal value bound positionally into a statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Uuid(Uuid),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    Json(serde_json::Value),
}

// Definitions carry plain JSON/TOML scalars; arrays and tables become `Json`.
impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Text(s),
            other => Value::Json(other),
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// A column of another relation used as a comparison operand.
///
/// Never bound as a parameter: it is written into the SQL text as `relation.field`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRef {
    pub relation: String,
    pub field: String,
}

impl FieldRef {
    pub fn new(relation: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            relation: relation.into(),
            field: field.into(),
        }
    }

    /// The `relation.field` form, before dialect quoting.
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.relation, self.field)
    }
}

/// One side of a comparison: a bound literal or a raw column reference.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Value(Value),
    Field(FieldRef),
}

macro_rules! impl_operand_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Operand {
                fn from(v: $t) -> Self {
                    Operand::Value(v.into())
                }
            }
        )*
    };
}

impl_operand_from!(
    Value, i8, i16, i32, i64, u8, u16, u32, bool, f32, f64, &str, String, Vec<u8>, Uuid,
    NaiveDate, DateTime<Utc>
);

impl From<FieldRef> for Operand {
    fn from(f: FieldRef) -> Self {
        Operand::Field(f)
    }
}

#[cfg(feature = "postgres")]
mod pg {
    use super::Value;
    use bytes::BytesMut;
    use std::error::Error;
    use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};

    // Every arm goes through the inner type's `to_sql_checked`, so a value bound to a
    // column of the wrong type is rejected instead of written as foreign bytes.
    impl ToSql for Value {
        fn to_sql(
            &self,
            ty: &Type,
            out: &mut BytesMut,
        ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
            match self {
                Value::Null => Ok(IsNull::Yes),
                Value::Bool(v) => v.to_sql_checked(ty, out),
                // Narrow to the column's width; the wire format is fixed-size per type.
                Value::Int(v) => match *ty {
                    Type::INT2 => i16::try_from(*v)?.to_sql_checked(ty, out),
                    Type::INT4 => i32::try_from(*v)?.to_sql_checked(ty, out),
                    Type::FLOAT4 => (*v as f32).to_sql_checked(ty, out),
                    Type::FLOAT8 => (*v as f64).to_sql_checked(ty, out),
                    _ => v.to_sql_checked(ty, out),
                },
                Value::Float(v) => match *ty {
                    Type::FLOAT4 => (*v as f32).to_sql_checked(ty, out),
                    _ => v.to_sql_checked(ty, out),
                },
                Value::Text(v) => v.to_sql_checked(ty, out),
                Value::Bytes(v) => v.to_sql_checked(ty, out),
                Value::Uuid(v) => v.to_sql_checked(ty, out),
                Value::Date(v) => v.to_sql_checked(ty, out),
                Value::Timestamp(v) => match *ty {
                    Type::TIMESTAMP => v.naive_utc().to_sql_checked(ty, out),
                    _ => v.to_sql_checked(ty, out),
                },
                Value::Json(v) => v.to_sql_checked(ty, out),
            }
        }

        fn accepts(_ty: &Type) -> bool {
            true
        }

        to_sql_checked!();
    }

}
