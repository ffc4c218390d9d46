//! # Record Format Module
//!
//! ## Purpose
//! Reads and writes the human-editable library files of the metal database. A library
//! file is a small declarative document: a few header assignments followed by one
//! `entry(...)` call per metal surface.
//!
//! ```text
//! name = "Metal Binding Energies"
//! shortDesc = u"binding energies of C, H, N and O"
//! longDesc = u"""
//! free text
//! """
//! entry(
//!     index = 1,
//!     label = "Pt111",
//!     bindingEnergies = {
//!         'H': (-2.75367887E+00, 'eV/molecule'),
//!         'C': (-7.02515507E+00, 'eV/molecule'),
//!     },
//!     surfaceSiteDensity = (2.483E-09, 'mol/cm^2'),
//!     facet = "111",
//!     metal = "Pt",
//!     shortDesc = u"fcc",
//!     longDesc = u"""
//! Calculated by ...
//! """,
//! )
//! ```
//!
//! ## Logic
//! - `Lexer` turns text into positioned tokens (numbers, strings with any of the usual
//!   quote styles and `u`/`r` prefixes, identifiers, punctuation), skipping `#` comments
//! - `Parser` builds a `RecordDocument` of header assignments and entry keyword lists
//! - `write_library()` is the inverse and emits numbers in a form that parses back to the
//!   identical `f64`
use super::DatabaseError;
use super::metal_library::{Entry, MetalLibrary};
use super::quantity::RawQuantity;

/// literal value appearing on the right-hand side of an assignment
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),
    Tuple(Vec<Literal>),
    Dict(Vec<(Literal, Literal)>),
}

impl Literal {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Literal::Int(i) => Some(*i as f64),
            Literal::Float(x) => Some(*x),
            _ => None,
        }
    }
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }
    fn kind(&self) -> &'static str {
        match self {
            Literal::Int(_) => "integer",
            Literal::Float(_) => "float",
            Literal::Str(_) => "string",
            Literal::Ident(_) => "name",
            Literal::Tuple(_) => "tuple",
            Literal::Dict(_) => "dict",
        }
    }
}

/// 1-based position in the source text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    Punct(char),
    Eof,
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    fn new(src: &str) -> Self {
        Self {
            chars: src.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }
    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }
    fn bump(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }
    fn here(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
        }
    }
    fn error(&self, at: Position, message: String) -> DatabaseError {
        DatabaseError::Parse {
            line: at.line,
            column: at.column,
            message,
        }
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else if c == '#' {
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.bump();
                }
            } else {
                break;
            }
        }
    }

    fn tokenize(mut self) -> Result<Vec<(Token, Position)>, DatabaseError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let at = self.here();
            let Some(c) = self.peek() else {
                tokens.push((Token::Eof, at));
                return Ok(tokens);
            };
            let token = if c == '"' || c == '\'' {
                Token::Str(self.string(false)?)
            } else if c.is_ascii_digit()
                || ((c == '-' || c == '+' || c == '.')
                    && self.peek_at(1).is_some_and(|n| n.is_ascii_digit() || n == '.'))
            {
                self.number()?
            } else if c.is_alphabetic() || c == '_' {
                let mut ident = String::new();
                while let Some(c) = self.peek() {
                    if c.is_alphanumeric() || c == '_' {
                        ident.push(c);
                        self.bump();
                    } else {
                        break;
                    }
                }
                let is_prefix = matches!(
                    ident.to_lowercase().as_str(),
                    "u" | "r" | "ur" | "ru"
                );
                if is_prefix && matches!(self.peek(), Some('"') | Some('\'')) {
                    let raw = ident.to_lowercase().contains('r');
                    Token::Str(self.string(raw)?)
                } else {
                    Token::Ident(ident)
                }
            } else if "(){}[],=:".contains(c) {
                self.bump();
                Token::Punct(c)
            } else {
                return Err(self.error(at, format!("unexpected character '{}'", c)));
            };
            tokens.push((token, at));
        }
    }

    fn string(&mut self, raw: bool) -> Result<String, DatabaseError> {
        let start = self.here();
        let Some(quote) = self.bump() else {
            return Err(self.error(start, "expected string".to_string()));
        };
        let triple = self.peek() == Some(quote) && self.peek_at(1) == Some(quote);
        if triple {
            self.bump();
            self.bump();
        }
        let mut out = String::new();
        loop {
            let Some(c) = self.bump() else {
                return Err(self.error(start, "unterminated string".to_string()));
            };
            if c == '\\' && !raw {
                let Some(escaped) = self.bump() else {
                    return Err(self.error(start, "unterminated string".to_string()));
                };
                match escaped {
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    '\\' | '"' | '\'' => out.push(escaped),
                    '\n' => {}
                    other => {
                        out.push('\\');
                        out.push(other);
                    }
                }
                continue;
            }
            if c == quote {
                if !triple {
                    return Ok(out);
                }
                if self.peek() == Some(quote) && self.peek_at(1) == Some(quote) {
                    self.bump();
                    self.bump();
                    return Ok(out);
                }
            } else if c == '\n' && !triple {
                return Err(self.error(start, "newline inside single-quoted string".to_string()));
            }
            out.push(c);
        }
    }

    fn number(&mut self) -> Result<Token, DatabaseError> {
        let start = self.here();
        let mut text = String::new();
        let mut is_float = false;
        if let Some(sign @ ('-' | '+')) = self.peek() {
            text.push(sign);
            self.bump();
        }
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
            } else if c == '.' {
                is_float = true;
                text.push(c);
            } else if c == 'e' || c == 'E' {
                is_float = true;
                text.push(c);
                if let Some(sign @ ('-' | '+')) = self.peek_at(1) {
                    self.bump();
                    text.push(sign);
                }
            } else if c == '_' {
                // digit separator
            } else {
                break;
            }
            self.bump();
        }
        if is_float {
            let value = text
                .parse::<f64>()
                .map_err(|e| self.error(start, format!("invalid number '{}': {}", text, e)))?;
            if !value.is_finite() {
                return Err(self.error(start, format!("number '{}' is out of range", text)));
            }
            Ok(Token::Float(value))
        } else {
            text.parse::<i64>()
                .map(Token::Int)
                .map_err(|e| self.error(start, format!("invalid integer '{}': {}", text, e)))
        }
    }
}

/// one `entry(...)` call with its keyword arguments in source order
#[derive(Debug, Clone)]
pub struct EntryRecord {
    pub position: Position,
    pub fields: Vec<(String, Literal)>,
}

/// parsed library file
#[derive(Debug, Clone, Default)]
pub struct RecordDocument {
    pub header: Vec<(String, Literal)>,
    pub entries: Vec<EntryRecord>,
}

struct Parser {
    tokens: Vec<(Token, Position)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].0
    }
    fn position(&self) -> Position {
        self.tokens[self.pos.min(self.tokens.len() - 1)].1
    }
    fn next(&mut self) -> (Token, Position) {
        let item = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        item
    }
    fn error(&self, message: String) -> DatabaseError {
        let at = self.position();
        DatabaseError::Parse {
            line: at.line,
            column: at.column,
            message,
        }
    }
    fn expect(&mut self, c: char) -> Result<(), DatabaseError> {
        if *self.peek() == Token::Punct(c) {
            self.next();
            Ok(())
        } else {
            Err(self.error(format!("expected '{}', found {:?}", c, self.peek())))
        }
    }
    fn eat(&mut self, c: char) -> bool {
        if *self.peek() == Token::Punct(c) {
            self.next();
            true
        } else {
            false
        }
    }

    fn document(&mut self) -> Result<RecordDocument, DatabaseError> {
        let mut doc = RecordDocument::default();
        loop {
            let (token, at) = self.next();
            match token {
                Token::Eof => return Ok(doc),
                Token::Ident(name) => {
                    if self.eat('=') {
                        let value = self.value()?;
                        doc.header.push((name, value));
                    } else if name == "entry" {
                        self.expect('(')?;
                        let fields = self.keyword_arguments()?;
                        doc.entries.push(EntryRecord {
                            position: at,
                            fields,
                        });
                    } else {
                        return Err(DatabaseError::Parse {
                            line: at.line,
                            column: at.column,
                            message: format!("unknown statement '{}'", name),
                        });
                    }
                }
                other => {
                    return Err(DatabaseError::Parse {
                        line: at.line,
                        column: at.column,
                        message: format!("expected an assignment or entry(...), found {:?}", other),
                    });
                }
            }
        }
    }

    fn keyword_arguments(&mut self) -> Result<Vec<(String, Literal)>, DatabaseError> {
        let mut fields = Vec::new();
        loop {
            if self.eat(')') {
                return Ok(fields);
            }
            let key = match self.next().0 {
                Token::Ident(key) => key,
                other => return Err(self.error(format!("expected keyword, found {:?}", other))),
            };
            self.expect('=')?;
            let value = self.value()?;
            fields.push((key, value));
            if !self.eat(',') {
                self.expect(')')?;
                return Ok(fields);
            }
        }
    }

    fn value(&mut self) -> Result<Literal, DatabaseError> {
        let (token, _) = self.next();
        match token {
            Token::Int(i) => Ok(Literal::Int(i)),
            Token::Float(x) => Ok(Literal::Float(x)),
            Token::Str(s) => {
                // adjacent literals concatenate
                let mut s = s;
                while let Token::Str(next) = self.peek().clone() {
                    self.next();
                    s.push_str(&next);
                }
                Ok(Literal::Str(s))
            }
            Token::Ident(name) => Ok(Literal::Ident(name)),
            Token::Punct('(') => self.sequence(')', true),
            Token::Punct('[') => self.sequence(']', false),
            Token::Punct('{') => {
                let mut items = Vec::new();
                loop {
                    if self.eat('}') {
                        return Ok(Literal::Dict(items));
                    }
                    let key = self.value()?;
                    self.expect(':')?;
                    let value = self.value()?;
                    items.push((key, value));
                    if !self.eat(',') {
                        self.expect('}')?;
                        return Ok(Literal::Dict(items));
                    }
                }
            }
            other => Err(self.error(format!("expected a value, found {:?}", other))),
        }
    }

    fn sequence(&mut self, close: char, parenthesized: bool) -> Result<Literal, DatabaseError> {
        let mut items = Vec::new();
        let mut trailing_comma = false;
        loop {
            if self.eat(close) {
                break;
            }
            items.push(self.value()?);
            trailing_comma = self.eat(',');
            if !trailing_comma {
                self.expect(close)?;
                break;
            }
        }
        // `(x)` is just x, `(x,)` is a one-element tuple
        if parenthesized && items.len() == 1 && !trailing_comma {
            return Ok(items.remove(0));
        }
        Ok(Literal::Tuple(items))
    }
}

/// parses the full text of a library file
pub fn parse_document(src: &str) -> Result<RecordDocument, DatabaseError> {
    let tokens = Lexer::new(src).tokenize()?;
    let mut parser = Parser { tokens, pos: 0 };
    parser.document()
}

fn field_error(record: &EntryRecord, message: String) -> DatabaseError {
    DatabaseError::Parse {
        line: record.position.line,
        column: record.position.column,
        message,
    }
}

fn quantity_from_literal(
    record: &EntryRecord,
    what: &str,
    value: &Literal,
    default_units: &str,
) -> Result<RawQuantity, DatabaseError> {
    match value {
        Literal::Int(_) | Literal::Float(_) => Ok(RawQuantity::new(
            value.as_f64().unwrap_or_default(),
            default_units,
        )),
        Literal::Tuple(items) if items.len() == 2 => {
            match (items[0].as_f64(), items[1].as_str()) {
                (Some(v), Some(units)) => Ok(RawQuantity::new(v, units)),
                _ => Err(field_error(
                    record,
                    format!("{} must be (value, 'units')", what),
                )),
            }
        }
        other => Err(field_error(
            record,
            format!("{} must be (value, 'units'), found {}", what, other.kind()),
        )),
    }
}

/// builds an `Entry` from the keyword arguments of one `entry(...)` call
pub fn entry_from_record(record: &EntryRecord) -> Result<Entry, DatabaseError> {
    let mut index = None;
    let mut label = None;
    let mut entry = Entry::default();
    for (key, value) in &record.fields {
        let expect_str = |v: &Literal| -> Result<String, DatabaseError> {
            v.as_str().map(|s| s.to_string()).ok_or_else(|| {
                field_error(record, format!("'{}' must be a string, found {}", key, v.kind()))
            })
        };
        match key.as_str() {
            "index" => match value {
                Literal::Int(i) => index = Some(*i),
                other => {
                    return Err(field_error(
                        record,
                        format!("'index' must be an integer, found {}", other.kind()),
                    ));
                }
            },
            "label" => label = Some(expect_str(value)?),
            "metal" => entry.metal = expect_str(value)?,
            "facet" => entry.facet = expect_str(value)?,
            "shortDesc" | "short_desc" => entry.short_desc = expect_str(value)?,
            "longDesc" | "long_desc" => entry.long_desc = expect_str(value)?.trim().to_string(),
            "surfaceSiteDensity" | "surface_site_density" => {
                entry.surface_site_density = match value {
                    Literal::Tuple(items) if items.is_empty() => None,
                    Literal::Ident(name) if name == "None" => None,
                    other => Some(quantity_from_literal(
                        record,
                        "surfaceSiteDensity",
                        other,
                        "mol/m^2",
                    )?),
                };
            }
            "bindingEnergies" | "binding_energies" => match value {
                Literal::Dict(items) => {
                    for (element, energy) in items {
                        let element = expect_str(element)?;
                        let energy =
                            quantity_from_literal(record, &element, energy, "J/mol")?;
                        entry.binding_energies.insert(element, energy);
                    }
                }
                Literal::Ident(name) if name == "None" => {}
                other => {
                    return Err(field_error(
                        record,
                        format!("'bindingEnergies' must be a dict, found {}", other.kind()),
                    ));
                }
            },
            other => {
                return Err(field_error(record, format!("unknown entry field '{}'", other)));
            }
        }
    }
    entry.index = index.ok_or_else(|| field_error(record, "entry without 'index'".to_string()))?;
    entry.label = label.ok_or_else(|| field_error(record, "entry without 'label'".to_string()))?;
    Ok(entry)
}

/// shortest representation that parses back to the same f64
pub fn format_float(x: f64) -> String {
    format!("{:E}", x)
}

fn quote(s: &str, q: char) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push(q);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c if c == q => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(q);
    out
}

fn triple_quote(s: &str) -> String {
    let body = s.replace('\\', "\\\\").replace('"', "\\\"");
    format!("u\"\"\"\n{}\n\"\"\"", body)
}

fn write_quantity(q: &RawQuantity) -> String {
    format!("({}, {})", format_float(q.value), quote(&q.units, '\''))
}

/// writes one entry the way it is stored in library files
pub fn write_entry(out: &mut String, entry: &Entry) {
    out.push_str("entry(\n");
    out.push_str(&format!("    index = {},\n", entry.index));
    out.push_str(&format!("    label = {},\n", quote(&entry.label, '"')));
    out.push_str("    bindingEnergies = {\n");
    for (element, energy) in &entry.binding_energies {
        out.push_str(&format!(
            "        {}: {},\n",
            quote(element, '\''),
            write_quantity(energy)
        ));
    }
    out.push_str("    },\n");
    match &entry.surface_site_density {
        Some(q) => out.push_str(&format!("    surfaceSiteDensity = {},\n", write_quantity(q))),
        None => out.push_str("    surfaceSiteDensity = (),\n"),
    }
    out.push_str(&format!("    facet = {},\n", quote(&entry.facet, '"')));
    out.push_str(&format!("    metal = {},\n", quote(&entry.metal, '"')));
    out.push_str(&format!("    shortDesc = u{},\n", quote(&entry.short_desc, '"')));
    out.push_str(&format!("    longDesc = \n{},\n", triple_quote(&entry.long_desc)));
    out.push_str(")\n\n");
}

/// serializes a whole library: header first, then entries sorted by index
pub fn write_library(library: &MetalLibrary) -> String {
    let mut out = String::new();
    out.push_str("#!/usr/bin/env python\n# encoding: utf-8\n\n");
    out.push_str(&format!("name = {}\n", quote(&library.name, '"')));
    out.push_str(&format!("shortDesc = u{}\n", quote(&library.short_desc, '"')));
    out.push_str(&format!("longDesc = {}\n\n", triple_quote(&library.long_desc)));
    let mut entries: Vec<&Entry> = library.entries.values().collect();
    entries.sort_by(|a, b| a.index.cmp(&b.index).then_with(|| a.label.cmp(&b.label)));
    for entry in entries {
        write_entry(&mut out, entry);
    }
    out
}
