//! Format parsed values for display (compact record view, per-field dump).

use crate::schema::LineSchema;
use crate::value::{Record, Value};
use std::fmt;

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Time(t) => write!(f, "{}", t),
            Value::Datetime(dt) => write!(f, "{}", dt.to_rfc3339()),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Enum(symbol) => write!(f, "{}", symbol),
        }
    }
}

/// `("tag", v1, -, v3)`; `-` marks an absent value.
impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:?}", self.tag)?;
        for v in &self.values {
            match v {
                Some(v) => write!(f, ", {}", v)?,
                None => write!(f, ", -")?,
            }
        }
        write!(f, ")")
    }
}

/// Multi-line dump: one `name: value` row per field, using the line schema for names.
/// Unnamed fields are shown by index.
pub fn record_to_dump(line: &LineSchema, record: &Record) -> String {
    let mut out = vec![format!("{}:", record.tag)];
    for (i, v) in record.values.iter().enumerate() {
        let label = line
            .fields()
            .get(i)
            .and_then(|f| f.name())
            .map(str::to_string)
            .unwrap_or_else(|| format!("#{}", i));
        let kind = line.fields().get(i).map(|f| f.kind_name()).unwrap_or("?");
        let shown = match v {
            Some(v) => v.to_string(),
            None => "<absent>".to_string(),
        };
        out.push(format!("  {} ({}) = {}", label, kind, shown));
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{FieldDef, LineDef, SchemaDef};
    use crate::Schema;

    #[test]
    fn record_display_marks_absent() {
        let r = Record::new(
            "asd",
            vec![Some(Value::Int(1)), None, Some(Value::Str("x y".to_string()))],
        );
        assert_eq!(r.to_string(), "(\"asd\", 1, -, \"x y\")");
    }

    #[test]
    fn dump_uses_field_names() {
        let schema = Schema::new(SchemaDef::new('|').with_line(LineDef::new(
            "a",
            vec![FieldDef::int().named("id"), FieldDef::boolean("Y", "N").optional()],
        )))
        .unwrap();
        let record = schema.parse_line("a|5|").unwrap();
        let dump = record_to_dump(schema.line("a").unwrap(), &record);
        assert_eq!(dump, "a:\n  id (int) = 5\n  #1 (bool) = <absent>");
    }
}
