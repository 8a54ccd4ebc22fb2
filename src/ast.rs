//! Schema descriptors: the plain-data form of a schema.
//!
//! Descriptors are what the DSL parser produces, what `serde_json` loads, and what code
//! builds by hand. They carry no behaviour and are not validated; [`crate::Schema::new`]
//! compiles them into an immutable, checked schema.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Root schema descriptor: tokenizer settings plus the line shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDef {
    /// Single-character field separator (kept as a string so length errors surface at compile time).
    pub delimiter: String,
    #[serde(default, alias = "quote_str")]
    pub quote: Option<String>,
    #[serde(default)]
    pub trailing_delimiter: bool,
    pub lines: Vec<LineDef>,
}

impl SchemaDef {
    pub fn new(delimiter: char) -> Self {
        SchemaDef {
            delimiter: delimiter.to_string(),
            quote: None,
            trailing_delimiter: false,
            lines: Vec::new(),
        }
    }

    pub fn with_quote(mut self, quote: char) -> Self {
        self.quote = Some(quote.to_string());
        self
    }

    pub fn with_trailing_delimiter(mut self, trailing: bool) -> Self {
        self.trailing_delimiter = trailing;
        self
    }

    pub fn with_line(mut self, line: LineDef) -> Self {
        self.lines.push(line);
        self
    }

    /// Deserialize a descriptor from the JSON wire format (`kind`-tagged fields).
    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// One line shape: the tag token and the fields that follow it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineDef {
    #[serde(alias = "name")]
    pub tag: String,
    pub fields: Vec<FieldDef>,
}

impl LineDef {
    pub fn new(tag: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        LineDef {
            tag: tag.into(),
            fields,
        }
    }
}

fn default_required() -> bool {
    true
}

/// A positional field: optional diagnostic name, required flag, and kind-specific config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldDef {
    pub fn new(kind: FieldKind) -> Self {
        FieldDef {
            name: None,
            required: true,
            kind,
        }
    }

    pub fn boolean(true_value: impl Into<String>, false_value: impl Into<String>) -> Self {
        Self::new(FieldKind::Bool(BoolField {
            true_value: true_value.into(),
            false_value: false_value.into(),
        }))
    }

    pub fn int() -> Self {
        Self::new(FieldKind::Int(IntField::default()))
    }

    pub fn float() -> Self {
        Self::new(FieldKind::Float(FloatField::default()))
    }

    pub fn decimal() -> Self {
        Self::new(FieldKind::Decimal(DecimalField::default()))
    }

    pub fn date(format: impl Into<String>) -> Self {
        Self::new(FieldKind::Date(DateField {
            format: format.into(),
        }))
    }

    pub fn time(format: impl Into<String>) -> Self {
        Self::new(FieldKind::Time(TimeField {
            format: format.into(),
        }))
    }

    pub fn datetime(format: impl Into<String>, time_zone: impl Into<String>) -> Self {
        Self::new(FieldKind::Datetime(DatetimeField {
            format: format.into(),
            time_zone: time_zone.into(),
        }))
    }

    pub fn string() -> Self {
        Self::new(FieldKind::Str(StrField::default()))
    }

    /// Enumeration whose symbols equal their token spellings.
    pub fn enumeration<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = tokens
            .into_iter()
            .map(|t| {
                let token = t.into();
                EnumVariant {
                    symbol: token.clone(),
                    token,
                }
            })
            .collect();
        Self::new(FieldKind::Enum(EnumField { values }))
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Field kind with its format and constraint configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum FieldKind {
    #[serde(rename = "BOOL")]
    Bool(BoolField),
    #[serde(rename = "INT")]
    Int(IntField),
    #[serde(rename = "FLOAT")]
    Float(FloatField),
    #[serde(rename = "DECIMAL")]
    Decimal(DecimalField),
    #[serde(rename = "DATE")]
    Date(DateField),
    #[serde(rename = "TIME")]
    Time(TimeField),
    #[serde(rename = "DATETIME")]
    Datetime(DatetimeField),
    #[serde(rename = "STR")]
    Str(StrField),
    #[serde(rename = "ENUM", alias = "STR_ENUM")]
    Enum(EnumField),
}

impl FieldKind {
    /// Short lowercase kind name used in diagnostics and the DSL.
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldKind::Bool(_) => "bool",
            FieldKind::Int(_) => "int",
            FieldKind::Float(_) => "float",
            FieldKind::Decimal(_) => "decimal",
            FieldKind::Date(_) => "date",
            FieldKind::Time(_) => "time",
            FieldKind::Datetime(_) => "datetime",
            FieldKind::Str(_) => "str",
            FieldKind::Enum(_) => "enum",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoolField {
    pub true_value: String,
    pub false_value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntField {
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FloatField {
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecimalField {
    /// Round the parsed value to this many fractional digits (half-even).
    pub round_to: Option<u32>,
    /// Reject tokens written with more fractional digits than this.
    pub max_decimal_places: Option<u32>,
    pub min_value: Option<Decimal>,
    pub max_value: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateField {
    pub format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeField {
    pub format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatetimeField {
    pub format: String,
    /// IANA zone name, e.g. `UTC` or `Europe/London`.
    pub time_zone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrField {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub invalid_characters: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumField {
    pub values: Vec<EnumVariant>,
}

/// Permitted token spelling and the symbol it maps to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "EnumVariantRepr")]
pub struct EnumVariant {
    pub token: String,
    pub symbol: String,
}

impl EnumVariant {
    pub fn new(token: impl Into<String>, symbol: impl Into<String>) -> Self {
        EnumVariant {
            token: token.into(),
            symbol: symbol.into(),
        }
    }
}

/// JSON accepts either a bare spelling (`"A"`) or `{"token": .., "symbol": ..}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum EnumVariantRepr {
    Plain(String),
    Mapped { token: String, symbol: String },
}

impl From<EnumVariantRepr> for EnumVariant {
    fn from(repr: EnumVariantRepr) -> Self {
        match repr {
            EnumVariantRepr::Plain(token) => EnumVariant {
                symbol: token.clone(),
                token,
            },
            EnumVariantRepr::Mapped { token, symbol } => EnumVariant { token, symbol },
        }
    }
}
