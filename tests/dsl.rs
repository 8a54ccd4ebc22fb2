//! Schema DSL tests: syntax (parse success/failure) and semantics (compiled schema behaviour).

use lineschema::ast::{EnumVariant, FieldKind};
use lineschema::{parse, ParseError, Schema, SchemaError, Value};
use rust_decimal::Decimal;
use std::str::FromStr;

// ==================== Syntax: valid schemas ====================

#[test]
fn parse_minimal_schema() {
    let def = parse("delimiter \"|\"; line a { x: int; }").expect("parse");
    assert_eq!(def.delimiter, "|");
    assert_eq!(def.quote, None);
    assert!(!def.trailing_delimiter);
    assert_eq!(def.lines.len(), 1);
    assert_eq!(def.lines[0].tag, "a");
    assert_eq!(def.lines[0].fields[0].name.as_deref(), Some("x"));
    assert!(def.lines[0].fields[0].required);
}

#[test]
fn parse_settings() {
    let src = r#"
delimiter ",";
quote "\"";
trailing_delimiter true;
line a { x: str; }
"#;
    let def = parse(src).expect("parse");
    assert_eq!(def.delimiter, ",");
    assert_eq!(def.quote.as_deref(), Some("\""));
    assert!(def.trailing_delimiter);

    let def = parse("delimiter \"\\t\"; quote none; line a { x: int; }").expect("parse");
    assert_eq!(def.delimiter, "\t");
    assert_eq!(def.quote, None);
}

#[test]
fn parse_all_field_types() {
    let src = r#"
delimiter "|";

line all {
    a: bool("Y", "N");
    b: int;
    c: float;
    d: decimal;
    e: date("%Y-%m-%d");
    f: time("%H:%M:%S");
    g: datetime("%Y-%m-%d %H:%M:%S", "Europe/London");
    h: str;
    i: enum { "A", "B" };
}
"#;
    let def = parse(src).expect("parse");
    let kinds: Vec<&str> = def.lines[0].fields.iter().map(|f| f.kind.kind_name()).collect();
    assert_eq!(
        kinds,
        vec!["bool", "int", "float", "decimal", "date", "time", "datetime", "str", "enum"]
    );
}

#[test]
fn parse_with_comments() {
    let src = r#"
// feed schema
delimiter "|";
line a {
    x: int; /* block */
    // line comment
    y: optional str;
}
"#;
    let def = parse(src).expect("parse");
    assert_eq!(def.lines[0].fields.len(), 2);
    assert!(!def.lines[0].fields[1].required);
}

#[test]
fn parse_options_and_ranges() {
    let src = r#"
delimiter "|";
line a {
    n: int [-5..10];
    p: decimal(places = 3, round = 2) [2.0..];
    s: str(len = 1..20, forbid = "|;");
    t: str(len = ..4);
    r: float [..1.5];
}
"#;
    let def = parse(src).expect("parse");
    let f = &def.lines[0].fields;
    match &f[0].kind {
        FieldKind::Int(i) => assert_eq!((i.min_value, i.max_value), (Some(-5), Some(10))),
        other => panic!("{:?}", other),
    }
    match &f[1].kind {
        FieldKind::Decimal(d) => {
            assert_eq!(d.max_decimal_places, Some(3));
            assert_eq!(d.round_to, Some(2));
            assert_eq!(d.min_value, Some(Decimal::from_str("2.0").unwrap()));
            assert_eq!(d.max_value, None);
        }
        other => panic!("{:?}", other),
    }
    match &f[2].kind {
        FieldKind::Str(s) => {
            assert_eq!((s.min_length, s.max_length), (Some(1), Some(20)));
            assert_eq!(s.invalid_characters.as_deref(), Some("|;"));
        }
        other => panic!("{:?}", other),
    }
    match &f[3].kind {
        FieldKind::Str(s) => assert_eq!((s.min_length, s.max_length), (None, Some(4))),
        other => panic!("{:?}", other),
    }
    match &f[4].kind {
        FieldKind::Float(x) => assert_eq!((x.min_value, x.max_value), (None, Some(1.5))),
        other => panic!("{:?}", other),
    }
}

#[test]
fn parse_enum_symbols() {
    let def = parse(r#"delimiter "|"; line a { side: enum { "B" => Buy, "S" => Sell, "X", }; }"#)
        .expect("parse");
    match &def.lines[0].fields[0].kind {
        FieldKind::Enum(e) => assert_eq!(
            e.values,
            vec![
                EnumVariant::new("B", "Buy"),
                EnumVariant::new("S", "Sell"),
                EnumVariant::new("X", "X"),
            ]
        ),
        other => panic!("{:?}", other),
    }
}

#[test]
fn parse_quoted_tag() {
    let def = parse(r#"delimiter ","; line "01-hdr" { x: int; }"#).expect("parse");
    assert_eq!(def.lines[0].tag, "01-hdr");
}

// ==================== Syntax: invalid schemas ====================

#[test]
fn reject_missing_delimiter() {
    assert!(parse("line a { x: int; }").is_err());
}

#[test]
fn reject_repeated_setting() {
    let err = parse("delimiter \"|\"; delimiter \",\"; line a { x: int; }").unwrap_err();
    assert!(err.contains("more than once"), "{}", err);
}

#[test]
fn reject_unknown_type() {
    assert!(parse("delimiter \"|\"; line a { x: blob; }").is_err());
}

#[test]
fn reject_missing_semicolon() {
    assert!(parse("delimiter \"|\"; line a { x: int }").is_err());
}

#[test]
fn reject_range_on_string() {
    let err = parse("delimiter \"|\"; line a { x: str [1..2]; }").unwrap_err();
    assert!(err.contains("not supported"), "{}", err);
}

#[test]
fn reject_fractional_int_bound() {
    assert!(parse("delimiter \"|\"; line a { x: int [1.5..]; }").is_err());
}

#[test]
fn reject_duplicate_field_name() {
    let err = parse("delimiter \"|\"; line a { x: int; x: str; }").unwrap_err();
    assert!(err.contains("duplicate field name"), "{}", err);
}

// ==================== Semantics: compiled schemas ====================

const FEED: &str = r#"
delimiter "|";

line asd {
    id: int;
    price: decimal;
    fee: optional decimal;
    flag: bool("Y", "F");
    day: date("%Y-%m-%d");
    at: time("%H%M%S");
}

line qwe {
    n: int [0..9];
}
"#;

#[test]
fn compiled_dsl_parses_lines() {
    let schema = Schema::from_dsl(FEED).expect("schema");
    let record = schema.parse_line("asd|1|3.14||Y|2012-01-02|123200").unwrap();
    assert_eq!(record.tag, "asd");
    assert_eq!(record.get(1).and_then(Value::as_decimal), Decimal::from_str("3.14").ok());
    assert!(record.is_absent(2));
    assert_eq!(schema.parse_line("qwe|7").unwrap().get(0), Some(&Value::Int(7)));
}

#[test]
fn compiled_dsl_reports_field_names() {
    let schema = Schema::from_dsl(FEED).expect("schema");
    let err = schema.parse_line("qwe|12").unwrap_err();
    assert!(err.is_constraint());
    assert_eq!(err.field().and_then(|f| f.name.as_deref()), Some("n"));
    assert!(err.to_string().contains("`n`"), "{}", err);

    match schema.parse_line("asd|1|x||Y|2012-01-02|123200").unwrap_err() {
        ParseError::FieldParse { field, token, .. } => {
            assert_eq!(field.name.as_deref(), Some("price"));
            assert_eq!(token, "x");
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn syntax_errors_surface_as_schema_errors() {
    assert!(matches!(Schema::from_dsl("delimiter"), Err(SchemaError::Syntax(_))));
}

#[test]
fn semantic_errors_found_at_compile() {
    let dup = "delimiter \"|\"; line a { x: int; } line a { y: int; }";
    assert!(matches!(Schema::from_dsl(dup), Err(SchemaError::DuplicateTag(_))));

    let quote = "delimiter \"|\"; quote \"|\"; line a { x: int; }";
    assert!(matches!(Schema::from_dsl(quote), Err(SchemaError::QuoteIsDelimiter('|'))));

    let long = "delimiter \"||\"; line a { x: int; }";
    assert!(matches!(Schema::from_dsl(long), Err(SchemaError::InvalidDelimiter(_))));

    let bounds = "delimiter \"|\"; line a { x: int [5..1]; }";
    assert!(matches!(Schema::from_dsl(bounds), Err(SchemaError::InvalidField { .. })));

    let spellings = "delimiter \"|\"; line a { x: bool(\"T\", \"T\"); }";
    assert!(matches!(Schema::from_dsl(spellings), Err(SchemaError::InvalidField { .. })));

    let zone = "delimiter \"|\"; line a { x: datetime(\"%Y%m%d%H%M%S\", \"Nowhere/City\"); }";
    assert!(matches!(Schema::from_dsl(zone), Err(SchemaError::InvalidField { .. })));
}
