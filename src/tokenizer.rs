//! Split one raw line into tokens.
//!
//! Tokens borrow from the input: quoted spans are returned without their quotes and
//! no escape sequences are recognized, so every token is a contiguous slice.

use crate::error::TokenizeError;

/// Delimiter/quote/trailing-delimiter configuration of a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tokenizer {
    delimiter: char,
    quote: Option<char>,
    trailing_delimiter: bool,
}

impl Tokenizer {
    /// Callers guarantee `quote != Some(delimiter)`; [`crate::Schema::new`] checks it.
    pub fn new(delimiter: char, quote: Option<char>, trailing_delimiter: bool) -> Self {
        Tokenizer {
            delimiter,
            quote,
            trailing_delimiter,
        }
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    pub fn quote(&self) -> Option<char> {
        self.quote
    }

    pub fn trailing_delimiter(&self) -> bool {
        self.trailing_delimiter
    }

    /// Tokenize `line`. A single trailing `\n` or `\r\n` is ignored; an empty line yields no tokens.
    pub fn tokenize<'a>(&self, line: &'a str) -> Result<Vec<&'a str>, TokenizeError> {
        let line = strip_terminator(line);
        if line.is_empty() {
            return Ok(Vec::new());
        }

        let mut tokens = Vec::new();
        let mut last_quoted = false;
        let mut rest = line;
        loop {
            let offset = line.len() - rest.len();
            if let Some(q) = self.quote.filter(|&q| rest.starts_with(q)) {
                let body = &rest[q.len_utf8()..];
                let close = body
                    .find(q)
                    .ok_or(TokenizeError::UnterminatedQuote { offset })?;
                tokens.push(&body[..close]);
                last_quoted = true;
                let after = &body[close + q.len_utf8()..];
                match after.chars().next() {
                    None => break,
                    Some(c) if c == self.delimiter => rest = &after[c.len_utf8()..],
                    Some(found) => {
                        return Err(TokenizeError::TextAfterQuote {
                            offset: line.len() - after.len(),
                            found,
                        })
                    }
                }
                continue;
            }
            last_quoted = false;
            match rest.find(self.delimiter) {
                Some(i) => {
                    tokens.push(&rest[..i]);
                    rest = &rest[i + self.delimiter.len_utf8()..];
                }
                None => {
                    tokens.push(rest);
                    break;
                }
            }
        }

        if self.trailing_delimiter {
            // The final segment must be the empty, unquoted remainder after a delimiter.
            if tokens.len() < 2 || last_quoted || tokens.last() != Some(&"") {
                return Err(TokenizeError::MissingTrailingDelimiter {
                    delimiter: self.delimiter,
                });
            }
            tokens.pop();
        }
        Ok(tokens)
    }
}

fn strip_terminator(line: &str) -> &str {
    line.strip_suffix('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .unwrap_or(line)
}
