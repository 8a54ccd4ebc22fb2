//! Typed values produced by field parsing, and the parsed record.

use chrono::{DateTime, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use rust_decimal::Decimal;

/// A single parsed field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Date(NaiveDate),
    Time(NaiveTime),
    Datetime(DateTime<Tz>),
    Str(String),
    /// Symbol of the matched enumeration variant.
    Enum(String),
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<NaiveTime> {
        match self {
            Value::Time(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&DateTime<Tz>> {
        match self {
            Value::Datetime(dt) => Some(dt),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Value::Enum(s) => Some(s),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Decimal(_) => "decimal",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::Datetime(_) => "datetime",
            Value::Str(_) => "str",
            Value::Enum(_) => "enum",
        }
    }
}

/// A parsed line: the matched tag followed by one slot per declared field.
///
/// `None` marks an absent optional field; it is never produced for a required one.
/// Records own their data and hold no reference back into the schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub tag: String,
    pub values: Vec<Option<Value>>,
}

impl Record {
    pub fn new(tag: impl Into<String>, values: Vec<Option<Value>>) -> Self {
        Record {
            tag: tag.into(),
            values,
        }
    }

    /// Value at field index `i` (0-based, tag excluded); `None` if absent or out of range.
    pub fn get(&self, i: usize) -> Option<&Value> {
        self.values.get(i).and_then(Option::as_ref)
    }

    pub fn is_absent(&self, i: usize) -> bool {
        matches!(self.values.get(i), Some(None))
    }

    /// Number of field slots (tag excluded).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
