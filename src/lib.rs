//! # lineschema: schema-driven parsing of tagged, delimited text lines
//!
//! Declare the shapes a line can take, then turn raw lines into typed, validated records.
//! Each line starts with a tag token that selects its shape; the remaining tokens are
//! converted field by field.
//!
//! ## Pieces
//!
//! - **Tokenizer**: splits on a single-character delimiter, with optional quoting and an
//!   optional trailing delimiter
//! - **Fields**: `bool`, `int`, `float`, `decimal`, `date`, `time`, `datetime`, `str`,
//!   `enum`, each with its own grammar and constraints; optional fields turn an empty
//!   token into an absent value
//! - **Schema**: line shapes keyed by tag, compiled and checked once, then shared
//!
//! ## Schema DSL
//!
//! ```text
//! delimiter "|";
//! trailing_delimiter false;
//!
//! line asd {
//!     id: int;
//!     price: decimal [0..];
//!     fee: optional decimal;
//!     flag: bool("Y", "F");
//!     day: date("%Y-%m-%d");
//!     at: time("%H%M%S");
//! }
//! ```
//!
//! ## Usage
//!
//! ```no_run
//! use lineschema::Schema;
//!
//! let schema = Schema::from_path("feed.schema")?;
//! let record = schema.parse_line("asd|1|3.14||Y|2012-01-02|123200")?;
//! println!("{}", record);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Schemas can also be built in code ([`SchemaDef`]) or loaded from JSON
//! ([`Schema::from_json`]).

pub mod ast;
pub mod dump;
pub mod error;
pub mod field;
pub mod parser;
pub mod schema;
pub mod tokenizer;
pub mod value;

pub use ast::{FieldDef, FieldKind, LineDef, SchemaDef};
pub use error::{ConstraintViolation, FieldError, FieldRef, ParseError, SchemaError, TokenizeError};
pub use field::Field;
pub use parser::parse;
pub use schema::{LineSchema, Schema};
pub use tokenizer::Tokenizer;
pub use value::{Record, Value};
