//! Parse schema DSL source into a [`SchemaDef`] using PEST.

use crate::ast::*;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser as PestParser;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::str::FromStr;

#[derive(PestParser)]
#[grammar = "grammar.pest"]
struct SchemaParser;

/// Parse schema source into a descriptor. The result is not yet validated; pass it to
/// [`crate::Schema::new`].
pub fn parse(source: &str) -> Result<SchemaDef, String> {
    let pairs = SchemaParser::parse(Rule::schema, source)
        .map_err(|e| format!("Parse error: {}", e))?;
    let pair = pairs.into_iter().next().ok_or("Empty parse")?;
    build_schema(pair)
}

#[derive(Default)]
struct Settings {
    delimiter: Option<String>,
    quote: Option<Option<String>>,
    trailing_delimiter: Option<bool>,
}

fn build_schema(pair: Pair<Rule>) -> Result<SchemaDef, String> {
    let mut settings = Settings::default();
    let mut lines = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::setting => apply_setting(inner, &mut settings)?,
            Rule::line_section => lines.push(build_line(inner)?),
            _ => {}
        }
    }
    Ok(SchemaDef {
        delimiter: settings.delimiter.ok_or("missing `delimiter` setting")?,
        quote: settings.quote.flatten(),
        trailing_delimiter: settings.trailing_delimiter.unwrap_or(false),
        lines,
    })
}

fn apply_setting(pair: Pair<Rule>, settings: &mut Settings) -> Result<(), String> {
    let inner = pair.into_inner().next().ok_or("Empty setting")?;
    match inner.as_rule() {
        Rule::delimiter_setting => {
            let lit = inner.into_inner().next().ok_or("delimiter: value")?;
            set_once(&mut settings.delimiter, "delimiter", unquote(lit.as_str())?)
        }
        Rule::quote_setting => {
            let v = inner.into_inner().next().ok_or("quote: value")?;
            let quote = match v.as_rule() {
                Rule::none_literal => None,
                _ => Some(unquote(v.as_str())?),
            };
            set_once(&mut settings.quote, "quote", quote)
        }
        Rule::trailing_setting => {
            let v = inner.into_inner().next().ok_or("trailing_delimiter: value")?;
            set_once(&mut settings.trailing_delimiter, "trailing_delimiter", v.as_str() == "true")
        }
        _ => Err(format!("Unhandled setting rule: {:?}", inner.as_rule())),
    }
}

fn set_once<T>(slot: &mut Option<T>, name: &str, value: T) -> Result<(), String> {
    if slot.is_some() {
        return Err(format!("`{}` is set more than once", name));
    }
    *slot = Some(value);
    Ok(())
}

fn build_line(pair: Pair<Rule>) -> Result<LineDef, String> {
    let mut inner = pair.into_inner();
    let tag_pair = inner.next().ok_or("line: missing tag")?;
    let tag_value = tag_pair.into_inner().next().ok_or("line: empty tag")?;
    let tag = match tag_value.as_rule() {
        Rule::string_literal => unquote(tag_value.as_str())?,
        _ => tag_value.as_str().to_string(),
    };

    let mut fields = Vec::new();
    let mut seen = HashSet::new();
    for p in inner {
        if p.as_rule() != Rule::field {
            continue;
        }
        let field = build_field(p).map_err(|e| format!("line `{}`: {}", tag, e))?;
        if let Some(name) = &field.name {
            if !seen.insert(name.clone()) {
                return Err(format!("line `{}`: duplicate field name `{}`", tag, name));
            }
        }
        fields.push(field);
    }
    Ok(LineDef { tag, fields })
}

fn build_field(pair: Pair<Rule>) -> Result<FieldDef, String> {
    let mut name = String::new();
    let mut required = true;
    let mut kind = None;
    let mut range = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::ident => name = inner.as_str().to_string(),
            Rule::optional_kw => required = false,
            Rule::type_spec => kind = Some(build_type_spec(inner)?),
            Rule::range => range = Some(build_range(inner)),
            _ => {}
        }
    }
    let mut kind = kind.ok_or_else(|| format!("field `{}`: missing type", name))?;
    if let Some((min, max)) = range {
        apply_range(&mut kind, min.as_deref(), max.as_deref())
            .map_err(|e| format!("field `{}`: {}", name, e))?;
    }
    Ok(FieldDef {
        name: Some(name),
        required,
        kind,
    })
}

fn build_type_spec(pair: Pair<Rule>) -> Result<FieldKind, String> {
    let inner = pair.into_inner().next().ok_or("Empty type_spec")?;
    match inner.as_rule() {
        Rule::bool_type => {
            let mut it = inner.into_inner();
            let t = it.next().ok_or("bool(true, false): true spelling")?;
            let f = it.next().ok_or("bool(true, false): false spelling")?;
            Ok(FieldKind::Bool(BoolField {
                true_value: unquote(t.as_str())?,
                false_value: unquote(f.as_str())?,
            }))
        }
        Rule::int_type => Ok(FieldKind::Int(IntField::default())),
        Rule::float_type => Ok(FieldKind::Float(FloatField::default())),
        Rule::decimal_type => {
            let mut d = DecimalField::default();
            for opt in inner.into_inner() {
                let o = opt.into_inner().next().ok_or("decimal option")?;
                let rule = o.as_rule();
                let n = parse_num(o.into_inner().next().ok_or("decimal option: value")?)?;
                match rule {
                    Rule::places_option => d.max_decimal_places = Some(n),
                    Rule::round_option => d.round_to = Some(n),
                    _ => return Err(format!("Unhandled decimal option: {:?}", rule)),
                }
            }
            Ok(FieldKind::Decimal(d))
        }
        Rule::date_type => {
            let fmt = inner.into_inner().next().ok_or("date(format)")?;
            Ok(FieldKind::Date(DateField {
                format: unquote(fmt.as_str())?,
            }))
        }
        Rule::time_type => {
            let fmt = inner.into_inner().next().ok_or("time(format)")?;
            Ok(FieldKind::Time(TimeField {
                format: unquote(fmt.as_str())?,
            }))
        }
        Rule::datetime_type => {
            let mut it = inner.into_inner();
            let fmt = it.next().ok_or("datetime(format, zone): format")?;
            let tz = it.next().ok_or("datetime(format, zone): zone")?;
            Ok(FieldKind::Datetime(DatetimeField {
                format: unquote(fmt.as_str())?,
                time_zone: unquote(tz.as_str())?,
            }))
        }
        Rule::str_type => {
            let mut s = StrField::default();
            for opt in inner.into_inner() {
                let o = opt.into_inner().next().ok_or("str option")?;
                match o.as_rule() {
                    Rule::len_option => {
                        for bound in o.into_inner() {
                            let rule = bound.as_rule();
                            let n = parse_num(bound.into_inner().next().ok_or("len bound")?)?;
                            match rule {
                                Rule::len_min => s.min_length = Some(n),
                                Rule::len_max => s.max_length = Some(n),
                                _ => {}
                            }
                        }
                    }
                    Rule::forbid_option => {
                        let lit = o.into_inner().next().ok_or("forbid = \"...\"")?;
                        s.invalid_characters = Some(unquote(lit.as_str())?);
                    }
                    _ => return Err(format!("Unhandled str option: {:?}", o.as_rule())),
                }
            }
            Ok(FieldKind::Str(s))
        }
        Rule::enum_type => {
            let mut values = Vec::new();
            for variant in inner.into_inner() {
                let mut it = variant.into_inner();
                let token = unquote(it.next().ok_or("enum variant: spelling")?.as_str())?;
                let symbol = it
                    .next()
                    .map(|p| p.as_str().to_string())
                    .unwrap_or_else(|| token.clone());
                values.push(EnumVariant { token, symbol });
            }
            Ok(FieldKind::Enum(EnumField { values }))
        }
        _ => Err(format!("Unhandled type rule: {:?}", inner.as_rule())),
    }
}

fn build_range(pair: Pair<Rule>) -> (Option<String>, Option<String>) {
    let mut min = None;
    let mut max = None;
    for bound in pair.into_inner() {
        match bound.as_rule() {
            Rule::lower_bound => min = Some(bound.as_str().trim().to_string()),
            Rule::upper_bound => max = Some(bound.as_str().trim().to_string()),
            _ => {}
        }
    }
    (min, max)
}

/// Bounds are written untyped; interpret them in the field kind's numeric domain.
fn apply_range(kind: &mut FieldKind, min: Option<&str>, max: Option<&str>) -> Result<(), String> {
    match kind {
        FieldKind::Int(i) => {
            i.min_value = min.map(parse_bound::<i64>).transpose()?;
            i.max_value = max.map(parse_bound::<i64>).transpose()?;
        }
        FieldKind::Float(f) => {
            f.min_value = min.map(parse_bound::<f64>).transpose()?;
            f.max_value = max.map(parse_bound::<f64>).transpose()?;
        }
        FieldKind::Decimal(d) => {
            d.min_value = min.map(parse_bound::<Decimal>).transpose()?;
            d.max_value = max.map(parse_bound::<Decimal>).transpose()?;
        }
        other => {
            return Err(format!(
                "range bounds are not supported on {} fields",
                other.kind_name()
            ))
        }
    }
    Ok(())
}

fn parse_bound<T: FromStr>(s: &str) -> Result<T, String> {
    s.parse()
        .map_err(|_| format!("bound `{}` is not valid for this field type", s))
}

fn parse_num<T: FromStr>(pair: Pair<Rule>) -> Result<T, String> {
    pair.as_str()
        .parse()
        .map_err(|_| format!("`{}` is out of range", pair.as_str()))
}

/// Strip the surrounding quotes and resolve backslash escapes (`\n`, `\t`, `\r`, anything else literal).
fn unquote(s: &str) -> Result<String, String> {
    let s = s.trim();
    let inner = s
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .ok_or_else(|| format!("expected string literal, got {}", s))?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => return Err("dangling escape at end of string literal".to_string()),
        }
    }
    Ok(out)
}
