//! Compiled schema: line shapes, tag dispatch, and the `parse_line` entry point.

use crate::ast::SchemaDef;
use crate::error::{FieldRef, ParseError, SchemaError};
use crate::field::Field;
use crate::tokenizer::Tokenizer;
use crate::value::{Record, Value};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, trace};

/// One record shape: a tag and a fixed sequence of fields.
#[derive(Debug, Clone)]
pub struct LineSchema {
    tag: String,
    fields: Vec<Field>,
}

impl LineSchema {
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Index of the first field with the given name.
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name() == Some(name))
    }

    /// Parse the tokens following the tag, left to right, stopping at the first failing field.
    pub fn parse(&self, tokens: &[&str]) -> Result<Vec<Option<Value>>, ParseError> {
        if tokens.len() != self.fields.len() {
            return Err(ParseError::FieldCount {
                tag: self.tag.clone(),
                expected: self.fields.len(),
                found: tokens.len(),
            });
        }
        self.fields
            .iter()
            .zip(tokens)
            .enumerate()
            .map(|(index, (field, token))| {
                field.parse(token).map_err(|e| {
                    let at = FieldRef {
                        index,
                        name: field.name().map(str::to_string),
                    };
                    ParseError::from_field(&self.tag, at, token, e)
                })
            })
            .collect()
    }
}

/// An immutable, validated schema. Share it freely; `parse_line` keeps no state.
#[derive(Debug, Clone)]
pub struct Schema {
    tokenizer: Tokenizer,
    lines: Vec<LineSchema>,
    lines_by_tag: HashMap<String, usize>,
}

impl Schema {
    /// Validate a descriptor and compile it. Every configuration error is reported here.
    pub fn new(def: SchemaDef) -> Result<Self, SchemaError> {
        let delimiter = single_char(&def.delimiter)
            .ok_or_else(|| SchemaError::InvalidDelimiter(def.delimiter.clone()))?;
        let quote = match &def.quote {
            Some(q) => Some(single_char(q).ok_or_else(|| SchemaError::InvalidQuote(q.clone()))?),
            None => None,
        };
        if quote == Some(delimiter) {
            return Err(SchemaError::QuoteIsDelimiter(delimiter));
        }
        if def.lines.is_empty() {
            return Err(SchemaError::NoLines);
        }

        let mut lines = Vec::with_capacity(def.lines.len());
        let mut lines_by_tag = HashMap::new();
        for (i, line) in def.lines.into_iter().enumerate() {
            if line.tag.is_empty() {
                return Err(SchemaError::EmptyTag { index: i });
            }
            if lines_by_tag.insert(line.tag.clone(), i).is_some() {
                return Err(SchemaError::DuplicateTag(line.tag));
            }
            let fields = line
                .fields
                .iter()
                .enumerate()
                .map(|(index, f)| {
                    Field::compile(f).map_err(|reason| SchemaError::InvalidField {
                        tag: line.tag.clone(),
                        field: FieldRef {
                            index,
                            name: f.name.clone(),
                        },
                        reason,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            lines.push(LineSchema {
                tag: line.tag,
                fields,
            });
        }

        debug!(
            delimiter = %delimiter,
            quote = ?quote,
            trailing_delimiter = def.trailing_delimiter,
            lines = lines.len(),
            "compiled line schema"
        );
        Ok(Schema {
            tokenizer: Tokenizer::new(delimiter, quote, def.trailing_delimiter),
            lines,
            lines_by_tag,
        })
    }

    pub fn from_json(source: &str) -> Result<Self, SchemaError> {
        Self::new(SchemaDef::from_json(source)?)
    }

    /// Compile a schema written in the schema DSL.
    pub fn from_dsl(source: &str) -> Result<Self, SchemaError> {
        Self::new(crate::parser::parse(source).map_err(SchemaError::Syntax)?)
    }

    /// Load a schema file: JSON for a `.json` extension, the DSL otherwise.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), "loading schema");
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json(&source),
            _ => Self::from_dsl(&source),
        }
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn lines(&self) -> &[LineSchema] {
        &self.lines
    }

    pub fn line(&self, tag: &str) -> Option<&LineSchema> {
        self.lines_by_tag.get(tag).map(|&i| &self.lines[i])
    }

    /// Parse one line into a tagged record.
    pub fn parse_line(&self, line: &str) -> Result<Record, ParseError> {
        let result = self.parse_tokens(line);
        if let Err(ref e) = result {
            debug!(error = %e, "line rejected");
        }
        result
    }

    fn parse_tokens(&self, line: &str) -> Result<Record, ParseError> {
        let tokens = self.tokenizer.tokenize(line)?;
        let (&tag, rest) = tokens.split_first().ok_or(ParseError::EmptyLine)?;
        let schema = self
            .line(tag)
            .ok_or_else(|| ParseError::UnknownTag(tag.to_string()))?;
        trace!(tag, tokens = rest.len(), "dispatched line");
        let values = schema.parse(rest)?;
        Ok(Record::new(schema.tag.clone(), values))
    }
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{FieldDef, LineDef};
    use crate::error::TokenizeError;

    fn two_lines() -> Schema {
        Schema::new(
            SchemaDef::new('|')
                .with_line(LineDef::new("foo", vec![FieldDef::int().named("n")]))
                .with_line(LineDef::new("bar", vec![FieldDef::string(), FieldDef::int().optional()])),
        )
        .expect("schema")
    }

    #[test]
    fn dispatches_on_tag() {
        let s = two_lines();
        assert_eq!(
            s.parse_line("foo|7").unwrap(),
            Record::new("foo", vec![Some(Value::Int(7))])
        );
        assert_eq!(
            s.parse_line("bar|x|").unwrap(),
            Record::new("bar", vec![Some(Value::Str("x".to_string())), None])
        );
    }

    #[test]
    fn unknown_tag_does_not_parse_fields() {
        let s = two_lines();
        let err = s.parse_line("baz|not-a-number").unwrap_err();
        assert_eq!(err, ParseError::UnknownTag("baz".to_string()));
        assert!(err.is_dispatch());
        assert_eq!(s.parse_line("FOO|1").unwrap_err(), ParseError::UnknownTag("FOO".to_string()));
    }

    #[test]
    fn empty_line_is_dispatch_error() {
        let s = two_lines();
        assert_eq!(s.parse_line("").unwrap_err(), ParseError::EmptyLine);
        assert_eq!(s.parse_line("\n").unwrap_err(), ParseError::EmptyLine);
    }

    #[test]
    fn field_errors_carry_location() {
        let s = two_lines();
        match s.parse_line("foo|x").unwrap_err() {
            ParseError::FieldParse { tag, field, token, .. } => {
                assert_eq!(tag, "foo");
                assert_eq!(field, FieldRef { index: 0, name: Some("n".to_string()) });
                assert_eq!(token, "x");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn stops_at_first_failing_field() {
        let s = Schema::new(SchemaDef::new('|').with_line(LineDef::new(
            "a",
            vec![FieldDef::int(), FieldDef::int(), FieldDef::int()],
        )))
        .unwrap();
        let err = s.parse_line("a|1|x|y").unwrap_err();
        assert_eq!(err.field().map(|f| f.index), Some(1));
    }

    #[test]
    fn tokenizer_errors_surface() {
        let s = Schema::new(
            SchemaDef::new('|')
                .with_quote('"')
                .with_line(LineDef::new("a", vec![FieldDef::string()])),
        )
        .unwrap();
        assert_eq!(
            s.parse_line("a|\"open").unwrap_err(),
            ParseError::Tokenize(TokenizeError::UnterminatedQuote { offset: 2 })
        );
    }

    #[test]
    fn construction_failures() {
        let line = || LineDef::new("a", vec![FieldDef::int()]);
        let mut def = SchemaDef::new('|').with_line(line());
        def.delimiter = "||".to_string();
        assert!(matches!(Schema::new(def), Err(SchemaError::InvalidDelimiter(_))));

        let mut def = SchemaDef::new('|').with_line(line());
        def.quote = Some("\"\"".to_string());
        assert!(matches!(Schema::new(def), Err(SchemaError::InvalidQuote(_))));

        let def = SchemaDef::new('|').with_quote('|').with_line(line());
        assert!(matches!(Schema::new(def), Err(SchemaError::QuoteIsDelimiter('|'))));

        let def = SchemaDef::new('|').with_line(line()).with_line(line());
        assert!(matches!(Schema::new(def), Err(SchemaError::DuplicateTag(t)) if t == "a"));

        assert!(matches!(Schema::new(SchemaDef::new('|')), Err(SchemaError::NoLines)));

        let def = SchemaDef::new('|').with_line(LineDef::new("", vec![]));
        assert!(matches!(Schema::new(def), Err(SchemaError::EmptyTag { index: 0 })));

        let def = SchemaDef::new('|').with_line(LineDef::new(
            "b",
            vec![FieldDef::int(), FieldDef::boolean("T", "T").named("flag")],
        ));
        match Schema::new(def) {
            Err(SchemaError::InvalidField { tag, field, .. }) => {
                assert_eq!(tag, "b");
                assert_eq!(field.index, 1);
                assert_eq!(field.name.as_deref(), Some("flag"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn schema_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Schema>();
    }

    #[test]
    fn position_of_named_field() {
        let s = two_lines();
        assert_eq!(s.line("foo").and_then(|l| l.position_of("n")), Some(0));
        assert_eq!(s.line("bar").and_then(|l| l.position_of("n")), None);
    }
}
