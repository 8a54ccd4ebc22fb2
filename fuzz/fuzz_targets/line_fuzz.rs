//! Line fuzz target: parse arbitrary input against a fixed schema with quoting and a
//! trailing delimiter. `parse_line` must not panic and must be deterministic.
//! Build with: cargo fuzz run line_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
const SCHEMA: &str = r#"
delimiter "|";
quote "'";
trailing_delimiter true;
line a { n: optional int [0..]; d: decimal(places = 2, round = 1); s: str(len = ..8, forbid = "x"); }
line b { t: optional time("%H:%M"); w: datetime("%Y%m%d %H%M", "Europe/London"); e: enum { "Y", "N" }; }
"#;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let s = match std::str::from_utf8(data) {
        Ok(x) => x,
        Err(_) => return,
    };
    let schema = lineschema::Schema::from_dsl(SCHEMA).expect("fuzz schema");
    assert_eq!(schema.parse_line(s), schema.parse_line(s));
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run line_fuzz");
}
