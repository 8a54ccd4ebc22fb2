//! Field type system: compiled field kinds that convert one token into a typed value.
//!
//! A [`Field`] is built from a [`FieldDef`] once, with its configuration checked
//! (bounds ordered, spellings distinct, format patterns usable, zone known). After that,
//! parsing a token is a pure function of the token and the field.
//!
//! Order of checks for every kind: empty-token handling, syntactic conversion, then
//! constraints. Constraints never run on an absent value.

use crate::ast::{EnumVariant, FieldDef, FieldKind};
use crate::error::{ConstraintViolation, FieldError};
use crate::value::Value;
use chrono::format::{Item, StrftimeItems};
use chrono::{LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashMap;
use std::fmt::{self, Write};

/// Largest scale a `Decimal` can carry.
const MAX_DECIMAL_SCALE: u32 = 28;

/// A validated, immutable field.
#[derive(Debug, Clone)]
pub struct Field {
    name: Option<String>,
    required: bool,
    kind: Kind,
}

#[derive(Debug, Clone)]
enum Kind {
    Bool {
        true_value: String,
        false_value: String,
    },
    Int {
        min: Option<i64>,
        max: Option<i64>,
    },
    Float {
        min: Option<f64>,
        max: Option<f64>,
    },
    Decimal {
        round_to: Option<u32>,
        max_places: Option<u32>,
        min: Option<Decimal>,
        max: Option<Decimal>,
    },
    Date {
        format: String,
    },
    Time {
        format: String,
    },
    Datetime {
        format: String,
        tz: Tz,
    },
    Str {
        min_len: Option<usize>,
        max_len: Option<usize>,
        forbidden: Vec<char>,
    },
    Enum {
        variants: Vec<EnumVariant>,
        by_token: HashMap<String, usize>,
    },
}

impl Field {
    /// Check a descriptor and build the field. The error is a human-readable reason;
    /// the schema attaches the line and position.
    pub fn compile(def: &FieldDef) -> Result<Field, String> {
        let kind = match &def.kind {
            FieldKind::Bool(b) => {
                if b.true_value.is_empty() || b.false_value.is_empty() {
                    return Err("boolean spellings must not be empty".to_string());
                }
                if b.true_value == b.false_value {
                    return Err(format!(
                        "true and false spellings are both `{}`",
                        b.true_value
                    ));
                }
                Kind::Bool {
                    true_value: b.true_value.clone(),
                    false_value: b.false_value.clone(),
                }
            }
            FieldKind::Int(i) => {
                check_bounds(i.min_value, i.max_value)?;
                Kind::Int {
                    min: i.min_value,
                    max: i.max_value,
                }
            }
            FieldKind::Float(f) => {
                if f.min_value.map_or(false, f64::is_nan) || f.max_value.map_or(false, f64::is_nan) {
                    return Err("float bounds must not be NaN".to_string());
                }
                check_bounds(f.min_value, f.max_value)?;
                Kind::Float {
                    min: f.min_value,
                    max: f.max_value,
                }
            }
            FieldKind::Decimal(d) => {
                for (what, n) in [("round_to", d.round_to), ("max_decimal_places", d.max_decimal_places)] {
                    if let Some(n) = n {
                        if n > MAX_DECIMAL_SCALE {
                            return Err(format!(
                                "{} is {}, at most {} is supported",
                                what, n, MAX_DECIMAL_SCALE
                            ));
                        }
                    }
                }
                check_bounds(d.min_value, d.max_value)?;
                Kind::Decimal {
                    round_to: d.round_to,
                    max_places: d.max_decimal_places,
                    min: d.min_value,
                    max: d.max_value,
                }
            }
            FieldKind::Date(d) => {
                check_pattern(&d.format)?;
                let sample = NaiveDate::from_ymd_opt(2001, 2, 3).ok_or("sample date")?;
                probe(&d.format, "date", sample.format(&d.format), |s| {
                    NaiveDate::parse_from_str(s, &d.format).ok() == Some(sample)
                })?;
                Kind::Date {
                    format: d.format.clone(),
                }
            }
            FieldKind::Time(t) => {
                check_pattern(&t.format)?;
                let sample = NaiveTime::from_hms_opt(13, 4, 0).ok_or("sample time")?;
                probe(&t.format, "time", sample.format(&t.format), |s| {
                    NaiveTime::parse_from_str(s, &t.format).ok() == Some(sample)
                })?;
                Kind::Time {
                    format: t.format.clone(),
                }
            }
            FieldKind::Datetime(dt) => {
                check_pattern(&dt.format)?;
                let tz: Tz = dt
                    .time_zone
                    .parse()
                    .map_err(|_| format!("unknown time zone `{}`", dt.time_zone))?;
                let sample = NaiveDate::from_ymd_opt(2001, 2, 3)
                    .and_then(|d| d.and_hms_opt(13, 4, 0))
                    .ok_or("sample datetime")?;
                probe(&dt.format, "datetime", sample.format(&dt.format), |s| {
                    NaiveDateTime::parse_from_str(s, &dt.format).ok() == Some(sample)
                })?;
                Kind::Datetime {
                    format: dt.format.clone(),
                    tz,
                }
            }
            FieldKind::Str(s) => {
                check_bounds(s.min_length, s.max_length)?;
                Kind::Str {
                    min_len: s.min_length,
                    max_len: s.max_length,
                    forbidden: s
                        .invalid_characters
                        .as_deref()
                        .map(|c| c.chars().collect())
                        .unwrap_or_default(),
                }
            }
            FieldKind::Enum(e) => {
                if e.values.is_empty() {
                    return Err("enumeration has no values".to_string());
                }
                let mut by_token = HashMap::new();
                for (i, v) in e.values.iter().enumerate() {
                    if v.token.is_empty() {
                        return Err("enumeration spellings must not be empty".to_string());
                    }
                    if by_token.insert(v.token.clone(), i).is_some() {
                        return Err(format!("duplicate enumeration spelling `{}`", v.token));
                    }
                }
                Kind::Enum {
                    variants: e.values.clone(),
                    by_token,
                }
            }
        };
        Ok(Field {
            name: def.name.clone(),
            required: def.required,
            kind,
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn required(&self) -> bool {
        self.required
    }

    pub fn kind_name(&self) -> &'static str {
        self.kind.name()
    }

    /// Convert one token. An empty token is absent (`Ok(None)`) for optional fields and
    /// an error for required ones, without consulting the kind.
    pub fn parse(&self, token: &str) -> Result<Option<Value>, FieldError> {
        if token.is_empty() {
            return if self.required {
                Err(FieldError::Empty)
            } else {
                Ok(None)
            };
        }
        self.kind.parse(token).map(Some)
    }

    /// Render a value with this field's spellings and format pattern. Constraints are not
    /// checked; `None` renders as the empty token for optional fields.
    pub fn format(&self, value: Option<&Value>) -> Result<String, FieldError> {
        match value {
            Some(v) => self.kind.format(v),
            None if self.required => Err(FieldError::Empty),
            None => Ok(String::new()),
        }
    }
}

impl Kind {
    fn name(&self) -> &'static str {
        match self {
            Kind::Bool { .. } => "bool",
            Kind::Int { .. } => "int",
            Kind::Float { .. } => "float",
            Kind::Decimal { .. } => "decimal",
            Kind::Date { .. } => "date",
            Kind::Time { .. } => "time",
            Kind::Datetime { .. } => "datetime",
            Kind::Str { .. } => "str",
            Kind::Enum { .. } => "enum",
        }
    }

    fn parse(&self, token: &str) -> Result<Value, FieldError> {
        match self {
            Kind::Bool {
                true_value,
                false_value,
            } => {
                if token == true_value {
                    Ok(Value::Bool(true))
                } else if token == false_value {
                    Ok(Value::Bool(false))
                } else {
                    Err(FieldError::Malformed(format!(
                        "expected `{}` or `{}`",
                        true_value, false_value
                    )))
                }
            }
            Kind::Int { min, max } => {
                let v: i64 = token
                    .parse()
                    .map_err(|e| FieldError::Malformed(format!("not an integer: {}", e)))?;
                check_range(v, *min, *max)?;
                Ok(Value::Int(v))
            }
            Kind::Float { min, max } => {
                let v: f64 = token
                    .parse()
                    .map_err(|e| FieldError::Malformed(format!("not a float: {}", e)))?;
                check_range(v, *min, *max)?;
                Ok(Value::Float(v))
            }
            Kind::Decimal {
                round_to,
                max_places,
                min,
                max,
            } => {
                let mut v = Decimal::from_str_exact(token)
                    .map_err(|e| FieldError::Malformed(format!("not a decimal: {}", e)))?;
                if let Some(max_places) = max_places {
                    if v.scale() > *max_places {
                        return Err(ConstraintViolation::TooManyDecimalPlaces {
                            places: v.scale(),
                            max: *max_places,
                        }
                        .into());
                    }
                }
                if let Some(dp) = round_to {
                    v = v.round_dp_with_strategy(*dp, RoundingStrategy::MidpointNearestEven);
                }
                check_range(v, *min, *max)?;
                Ok(Value::Decimal(v))
            }
            Kind::Date { format } => NaiveDate::parse_from_str(token, format)
                .map(Value::Date)
                .map_err(|e| mismatch(format, e)),
            Kind::Time { format } => NaiveTime::parse_from_str(token, format)
                .map(Value::Time)
                .map_err(|e| mismatch(format, e)),
            Kind::Datetime { format, tz } => {
                let naive = NaiveDateTime::parse_from_str(token, format).map_err(|e| mismatch(format, e))?;
                match tz.from_local_datetime(&naive) {
                    LocalResult::Single(dt) => Ok(Value::Datetime(dt)),
                    LocalResult::Ambiguous(..) => Err(FieldError::Malformed(format!(
                        "local time {} is ambiguous in {}",
                        naive, tz
                    ))),
                    LocalResult::None => Err(FieldError::Malformed(format!(
                        "local time {} does not exist in {}",
                        naive, tz
                    ))),
                }
            }
            Kind::Str {
                min_len,
                max_len,
                forbidden,
            } => {
                let len = token.chars().count();
                if let Some(min) = min_len {
                    if len < *min {
                        return Err(ConstraintViolation::TooShort { len, min: *min }.into());
                    }
                }
                if let Some(max) = max_len {
                    if len > *max {
                        return Err(ConstraintViolation::TooLong { len, max: *max }.into());
                    }
                }
                if let Some(c) = token.chars().find(|c| forbidden.contains(c)) {
                    return Err(ConstraintViolation::DisallowedChar(c).into());
                }
                Ok(Value::Str(token.to_string()))
            }
            Kind::Enum { variants, by_token } => match by_token.get(token) {
                Some(&i) => Ok(Value::Enum(variants[i].symbol.clone())),
                None => {
                    let spellings: Vec<&str> = variants.iter().map(|v| v.token.as_str()).collect();
                    Err(FieldError::Malformed(format!(
                        "not one of {}",
                        spellings.join(", ")
                    )))
                }
            },
        }
    }

    fn format(&self, value: &Value) -> Result<String, FieldError> {
        match (self, value) {
            (
                Kind::Bool {
                    true_value,
                    false_value,
                },
                Value::Bool(b),
            ) => Ok((if *b { true_value } else { false_value }).clone()),
            (Kind::Int { .. }, Value::Int(i)) => Ok(i.to_string()),
            (Kind::Float { .. }, Value::Float(x)) => Ok(x.to_string()),
            (Kind::Decimal { .. }, Value::Decimal(d)) => Ok(d.to_string()),
            (Kind::Date { format }, Value::Date(d)) => render(d.format(format)),
            (Kind::Time { format }, Value::Time(t)) => render(t.format(format)),
            (Kind::Datetime { format, tz }, Value::Datetime(dt)) => {
                render(dt.with_timezone(tz).format(format))
            }
            (Kind::Str { .. }, Value::Str(s)) => Ok(s.clone()),
            (Kind::Enum { variants, .. }, Value::Enum(symbol)) => variants
                .iter()
                .find(|v| &v.symbol == symbol)
                .map(|v| v.token.clone())
                .ok_or_else(|| FieldError::Malformed(format!("unknown enumeration symbol `{}`", symbol))),
            (kind, value) => Err(FieldError::Malformed(format!(
                "cannot format a {} value as {}",
                value.kind_name(),
                kind.name()
            ))),
        }
    }
}

fn mismatch(format: &str, err: chrono::ParseError) -> FieldError {
    FieldError::Malformed(format!("does not match `{}`: {}", format, err))
}

fn render(item: impl fmt::Display) -> Result<String, FieldError> {
    let mut out = String::new();
    write!(out, "{}", item)
        .map_err(|_| FieldError::Malformed("value cannot be rendered with the format".to_string()))?;
    Ok(out)
}

fn check_bounds<T: PartialOrd + fmt::Display>(min: Option<T>, max: Option<T>) -> Result<(), String> {
    match (min, max) {
        (Some(min), Some(max)) if min > max => Err(format!("minimum {} is above maximum {}", min, max)),
        _ => Ok(()),
    }
}

fn check_range<T: PartialOrd + fmt::Display>(
    v: T,
    min: Option<T>,
    max: Option<T>,
) -> Result<(), ConstraintViolation> {
    // Negated comparisons so NaN fails any configured bound.
    if let Some(min) = min {
        if !(v >= min) {
            return Err(ConstraintViolation::BelowMin {
                value: v.to_string(),
                min: min.to_string(),
            });
        }
    }
    if let Some(max) = max {
        if !(v <= max) {
            return Err(ConstraintViolation::AboveMax {
                value: v.to_string(),
                max: max.to_string(),
            });
        }
    }
    Ok(())
}

fn check_pattern(format: &str) -> Result<(), String> {
    if format.is_empty() {
        return Err("format pattern is empty".to_string());
    }
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(format!("invalid format pattern `{}`", format));
    }
    Ok(())
}

/// Format a sample with the pattern and parse it back; a pattern that cannot carry
/// the kind's fields is rejected at compile time instead of failing every line.
fn probe(
    format: &str,
    what: &str,
    rendered: impl fmt::Display,
    parses_back: impl Fn(&str) -> bool,
) -> Result<(), String> {
    let mut sample = String::new();
    if write!(sample, "{}", rendered).is_err() || !parses_back(&sample) {
        return Err(format!("format pattern `{}` cannot represent a {}", format, what));
    }
    Ok(())
}
