// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Parser of the text representation of PostgreSQL
//! [hstore](https://www.postgresql.org/docs/current/hstore.html) values,
//! e.g. `"highway"=>"primary", "ref"=>"7"`.

use std::iter::Peekable;
use std::str::CharIndices;

use crate::Tags;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("unexpected {0:?} at offset {1}")]
    UnexpectedChar(char, usize),
}

/// Parses an hstore into [Tags]. Pairs with `NULL` values are dropped.
pub fn parse(text: &str) -> Result<Tags, ParseError> {
    let mut p = Parser {
        chars: text.char_indices().peekable(),
    };
    let mut tags = Tags::default();

    p.skip_whitespace();
    if p.chars.peek().is_none() {
        return Ok(tags);
    }

    loop {
        let (key, _) = p.string()?;
        p.skip_whitespace();
        p.expect('=')?;
        p.expect('>')?;
        p.skip_whitespace();

        let (value, quoted) = p.string()?;
        if quoted || !value.eq_ignore_ascii_case("NULL") {
            tags.insert(key, value);
        }

        p.skip_whitespace();
        match p.chars.next() {
            None => return Ok(tags),
            Some((_, ',')) => p.skip_whitespace(),
            Some((offset, c)) => return Err(ParseError::UnexpectedChar(c, offset)),
        }
    }
}

struct Parser<'a> {
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Parser<'a> {
    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
    }

    fn expect(&mut self, expected: char) -> Result<(), ParseError> {
        match self.chars.next() {
            Some((_, c)) if c == expected => Ok(()),
            Some((offset, c)) => Err(ParseError::UnexpectedChar(c, offset)),
            None => Err(ParseError::UnexpectedEnd),
        }
    }

    /// Reads a quoted or a bare string. Returns the string and whether it was quoted.
    fn string(&mut self) -> Result<(String, bool), ParseError> {
        match self.chars.peek() {
            None => Err(ParseError::UnexpectedEnd),
            Some(&(_, '"')) => {
                self.chars.next();
                self.quoted().map(|s| (s, true))
            }
            Some(&(offset, c)) => {
                let s = self.bare();
                if s.is_empty() {
                    Err(ParseError::UnexpectedChar(c, offset))
                } else {
                    Ok((s, false))
                }
            }
        }
    }

    fn quoted(&mut self) -> Result<String, ParseError> {
        let mut s = String::default();
        loop {
            match self.chars.next() {
                None => return Err(ParseError::UnexpectedEnd),
                Some((_, '"')) => return Ok(s),
                Some((_, '\\')) => match self.chars.next() {
                    Some((_, c)) => s.push(c),
                    None => return Err(ParseError::UnexpectedEnd),
                },
                Some((_, c)) => s.push(c),
            }
        }
    }

    fn bare(&mut self) -> String {
        let mut s = String::default();
        while let Some((_, c)) = self
            .chars
            .next_if(|&(_, c)| !c.is_whitespace() && c != '=' && c != ',' && c != '"')
        {
            s.push(c);
        }
        s
    }
}
