//! Benchmark: `parse_line` throughput for a two-shape schema, on accepted lines,
//! lines rejected at dispatch, and lines rejected at a constraint.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lineschema::Schema;

const SCHEMA: &str = r#"
delimiter "|";
quote "\"";

line asd {
    id: int;
    price: decimal(places = 4) [0..];
    fee: optional decimal;
    flag: bool("Y", "F");
    day: date("%Y-%m-%d");
    at: time("%H%M%S");
    note: str(len = ..64);
}

line qwe {
    n: int [0..100];
    side: enum { "B" => Buy, "S" => Sell };
}
"#;

fn bench_parse_line(c: &mut Criterion) {
    let schema = Schema::from_dsl(SCHEMA).expect("schema");
    let lines: Vec<String> = (0..1000)
        .map(|i| {
            if i % 2 == 0 {
                format!("asd|{}|{}.25||Y|2012-01-02|123200|\"note {}|quoted\"", i, i, i)
            } else {
                format!("qwe|{}|{}", i % 100, if i % 3 == 0 { "B" } else { "S" })
            }
        })
        .collect();

    c.bench_function("parse_line accepted", |b| {
        b.iter(|| {
            for line in &lines {
                let _ = black_box(schema.parse_line(black_box(line)));
            }
        })
    });

    c.bench_function("parse_line unknown tag", |b| {
        b.iter(|| black_box(schema.parse_line(black_box("zzz|1|2|3"))))
    });

    c.bench_function("parse_line constraint violation", |b| {
        b.iter(|| black_box(schema.parse_line(black_box("qwe|101|B"))))
    });
}

criterion_group!(benches, bench_parse_line);
criterion_main!(benches);
