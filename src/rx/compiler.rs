// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Compiles regex pattern text into the byte-coded NFA format that
//! [`crate::rx::program::Program`] decodes and [`crate::rx::vm`] runs.
//!
//! Compilation is two passes over an intermediate [`Node`] tree: parsing
//! builds the tree and checks every reject condition up front, then
//! [`emit`] walks it twice — first to size every offset slot, then to
//! write the final bytes and patch forward jumps once their targets are
//! known.

use std::rc::Rc;

use crate::error::{Error, Result};
use crate::rx::{varint_width, write_varint, write_varint_padded, zigzag_encode, RX_MAX_NESTING};

/// Which regex syntax and interpretation options are in play. Bits with
/// no matching bit in `features_enabled` are rejected only if they are
/// also present in `features_rejected`; otherwise unrecognized syntax
/// controlled by a disabled-but-not-rejected feature is treated as a
/// plain literal (e.g. a literal `{` when `COUNT_REPETITION` is absent).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Features(u32);

macro_rules! feature_bits {
    ($($name:ident = $bit:expr),* $(,)?) => {
        impl Features {
            $(pub const $name: Features = Features(1 << $bit);)*
        }
    };
}

feature_bits! {
    C_ESCAPES = 0,
    SHORTHAND = 1,
    OCTAL_CHAR = 2,
    HEX_CHAR = 3,
    UNICODE_CHAR = 4,
    CHAR_CLASSES = 6,
    ZERO_OR_ONE = 8,
    ZERO_OR_MORE = 9,
    ONE_OR_MORE = 10,
    COUNT_REPETITION = 11,
    ALTERNATES = 12,
    GROUP = 13,
    CAPTURE = 14,
    NON_CAPTURE = 15,
    NEG_LOOKAHEAD = 16,
    SUBROUTINE = 17,
    BOL = 18,
    EOL = 19,
    CASE_INSENSITIVE = 27,
    ANY_INCLUDES_NL = 26,
    EXTENDED_RE = 29,
}

impl Features {
    pub const NONE: Features = Features(0);
    pub const ALL: Features = Features(0x3FFF_FFFF);

    pub fn contains(self, other: Features) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn union(self, other: Features) -> Features {
        Features(self.0 | other.0)
    }
}

impl std::ops::BitOr for Features {
    type Output = Features;
    fn bitor(self, rhs: Features) -> Features {
        self.union(rhs)
    }
}

/// An intermediate representation of a parsed regex, built by
/// [`Parser::parse`] and walked twice by [`emit`].
#[derive(Clone, Debug)]
enum Node {
    Literal(char),
    Any,
    Bol,
    Eol,
    Class {
        negated: bool,
        ranges: Vec<(char, char)>,
    },
    Property(char),
    Concat(Vec<Node>),
    Alternate(Vec<Node>),
    Capture {
        group: u8,
        body: Box<Node>,
    },
    Group(Box<Node>),
    NegLookahead(Box<Node>),
    Repeat {
        min: u32,
        max: u32, // 0 means unbounded
        body: Box<Node>,
    },
}

struct Parser<'p> {
    re: &'p str,
    bytes: &'p [u8],
    pos: usize,
    enabled: Features,
    rejected: Features,
    group_names: Vec<Rc<str>>,
    nesting: usize,
}

impl<'p> Parser<'p> {
    fn new(re: &'p str, enabled: Features, rejected: Features) -> Self {
        Parser {
            re,
            bytes: re.as_bytes(),
            pos: 0,
            enabled,
            rejected,
            group_names: vec![Rc::from("0")],
            nesting: 0,
        }
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn supported(&self, feature: Features, name: &'static str) -> Result<bool> {
        if self.rejected.contains(feature) {
            return Err(Error::RejectedFeature {
                feature: name,
                offset: self.pos,
            });
        }
        Ok(self.enabled.contains(feature))
    }

    /// Skip whitespace and `#`-comments when `EXTENDED_RE` is enabled.
    fn skip_extended_whitespace(&mut self) {
        if !self.enabled.contains(Features::EXTENDED_RE) {
            return;
        }
        loop {
            match self.peek() {
                Some(b' ') | Some(b'\t') | Some(b'\n') | Some(b'\r') => {
                    self.pos += 1;
                }
                Some(b'#') => {
                    while !self.at_eof() && self.peek() != Some(b'\n') {
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
    }

    fn parse(&mut self) -> Result<Node> {
        let node = self.parse_alternates()?;
        if !self.at_eof() {
            return Err(Error::GrammarSyntax {
                message: "unexpected trailing input".into(),
                offset: self.pos,
            });
        }
        Ok(node)
    }

    fn parse_alternates(&mut self) -> Result<Node> {
        let mut branches = vec![self.parse_sequence()?];
        while self.peek() == Some(b'|') {
            if !self.supported(Features::ALTERNATES, "alternates")? {
                break;
            }
            self.pos += 1;
            branches.push(self.parse_sequence()?);
        }
        if branches.len() == 1 {
            Ok(branches.pop().unwrap())
        } else {
            Ok(Node::Alternate(branches))
        }
    }

    fn parse_sequence(&mut self) -> Result<Node> {
        let mut items = Vec::new();
        loop {
            self.skip_extended_whitespace();
            match self.peek() {
                None | Some(b'|') | Some(b')') => break,
                _ => items.push(self.parse_repeat()?),
            }
        }
        Ok(Node::Concat(items))
    }

    fn parse_repeat(&mut self) -> Result<Node> {
        let start = self.pos;
        let atom = self.parse_atom()?;
        self.skip_extended_whitespace();
        match self.peek() {
            Some(b'?') => {
                self.pos += 1;
                self.reject_double_repetition(start)?;
                if self.supported(Features::ZERO_OR_ONE, "zero-or-one")? {
                    return Ok(Node::Repeat { min: 0, max: 1, body: Box::new(atom) });
                }
                self.pos -= 1;
            }
            Some(b'*') => {
                self.pos += 1;
                self.reject_double_repetition(start)?;
                if self.supported(Features::ZERO_OR_MORE, "zero-or-more")? {
                    return Ok(Node::Repeat { min: 0, max: 0, body: Box::new(atom) });
                }
                self.pos -= 1;
            }
            Some(b'+') => {
                self.pos += 1;
                self.reject_double_repetition(start)?;
                if self.supported(Features::ONE_OR_MORE, "one-or-more")? {
                    return Ok(Node::Repeat { min: 1, max: 0, body: Box::new(atom) });
                }
                self.pos -= 1;
            }
            Some(b'{') => {
                if self.supported(Features::COUNT_REPETITION, "counted repetition")? {
                    if let Some((min, max)) = self.try_parse_counted_range()? {
                        self.reject_double_repetition(start)?;
                        return Ok(Node::Repeat { min, max, body: Box::new(atom) });
                    }
                }
            }
            _ => {}
        }
        Ok(atom)
    }

    fn reject_double_repetition(&self, atom_start: usize) -> Result<()> {
        // A repetition directly following another repetition's
        // quantifier (not its atom) is nonsensical: `a**`, `a+?`.
        if matches!(self.bytes.get(atom_start), Some(b'?') | Some(b'*') | Some(b'+')) {
            return Err(Error::RepeatingARepetition { offset: atom_start });
        }
        Ok(())
    }

    fn try_parse_counted_range(&mut self) -> Result<Option<(u32, u32)>> {
        let save = self.pos;
        self.pos += 1; // '{'
        let min = self.parse_number();
        let (min, max) = if self.peek() == Some(b',') {
            self.pos += 1;
            let max = self.parse_number();
            (min.unwrap_or(0), max)
        } else {
            (min.unwrap_or(0), min)
        };
        if self.peek() != Some(b'}') {
            self.pos = save;
            return Ok(None);
        }
        self.pos += 1;
        let min = min;
        let max = max.unwrap_or(0);
        if min > 254 || max > 254 {
            return Err(Error::BadRepetitionRange { offset: save });
        }
        if max != 0 && max < min {
            return Err(Error::BadRepetitionRange { offset: save });
        }
        Ok(Some((min, max)))
    }

    fn parse_number(&mut self) -> Option<u32> {
        let start = self.pos;
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        if self.pos == start {
            None
        } else {
            std::str::from_utf8(&self.bytes[start..self.pos]).ok()?.parse().ok()
        }
    }

    fn parse_atom(&mut self) -> Result<Node> {
        self.skip_extended_whitespace();
        let offset = self.pos;
        match self.bump() {
            None => Err(Error::GrammarSyntax {
                message: "expected an atom".into(),
                offset,
            }),
            Some(b'.') => Ok(Node::Any),
            Some(b'^') => {
                if self.supported(Features::BOL, "beginning of line")? {
                    Ok(Node::Bol)
                } else {
                    Ok(Node::Literal('^'))
                }
            }
            Some(b'$') => {
                if self.supported(Features::EOL, "end of line")? {
                    Ok(Node::Eol)
                } else {
                    Ok(Node::Literal('$'))
                }
            }
            Some(b'\\') => self.parse_escape(offset),
            Some(b'[') => self.parse_class(offset),
            Some(b'(') => self.parse_group(offset),
            Some(other) => {
                self.pos = offset;
                Ok(Node::Literal(self.next_char()))
            }
        }
    }

    fn next_char(&mut self) -> char {
        let rest = &self.re[self.pos..];
        let c = rest.chars().next().unwrap();
        self.pos += c.len_utf8();
        c
    }

    fn parse_escape(&mut self, offset: usize) -> Result<Node> {
        let esc = self.bump().ok_or(Error::IllegalEscape { offset })?;
        match esc {
            b'a' | b'd' | b'h' | b's' | b'w' | b'L' | b'U' => {
                if self.supported(Features::SHORTHAND, "shorthand class")? {
                    Ok(Node::Property(esc as char))
                } else {
                    Ok(Node::Literal(esc as char))
                }
            }
            b'n' if self.supported(Features::C_ESCAPES, "C escape")? => Ok(Node::Literal('\n')),
            b't' if self.supported(Features::C_ESCAPES, "C escape")? => Ok(Node::Literal('\t')),
            b'r' if self.supported(Features::C_ESCAPES, "C escape")? => Ok(Node::Literal('\r')),
            b'b' if self.supported(Features::C_ESCAPES, "C escape")? => Ok(Node::Literal('\u{8}')),
            b'e' if self.supported(Features::C_ESCAPES, "C escape")? => Ok(Node::Literal('\u{1B}')),
            b'f' if self.supported(Features::C_ESCAPES, "C escape")? => Ok(Node::Literal('\u{C}')),
            b'0'..=b'7' if self.supported(Features::OCTAL_CHAR, "octal escape")? => {
                self.pos -= 1;
                Ok(Node::Literal(self.parse_octal()))
            }
            b'x' if self.supported(Features::HEX_CHAR, "hex escape")? => {
                Ok(Node::Literal(self.parse_hex_escape(offset)?))
            }
            b'u' if self.supported(Features::UNICODE_CHAR, "unicode escape")? => {
                Ok(Node::Literal(self.parse_hex_escape(offset)?))
            }
            other => Ok(Node::Literal(other as char)),
        }
    }

    fn parse_octal(&mut self) -> char {
        let mut value = 0u32;
        for _ in 0..3 {
            if let Some(b @ b'0'..=b'7') = self.peek() {
                value = (value << 3) + (b - b'0') as u32;
                self.pos += 1;
            } else {
                break;
            }
        }
        char::from_u32(value).unwrap_or('\0')
    }

    fn parse_hex_escape(&mut self, offset: usize) -> Result<char> {
        let braces = self.peek() == Some(b'{');
        if braces {
            self.pos += 1;
        }
        let start = self.pos;
        while matches!(self.peek(), Some(b'0'..=b'9') | Some(b'a'..=b'f') | Some(b'A'..=b'F')) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(Error::IllegalEscape { offset });
        }
        let value = u32::from_str_radix(
            std::str::from_utf8(&self.bytes[start..self.pos]).unwrap(),
            16,
        )
        .map_err(|_| Error::IllegalEscape { offset })?;
        if braces {
            if self.peek() != Some(b'}') {
                return Err(Error::IllegalEscape { offset });
            }
            self.pos += 1;
        }
        char::from_u32(value).ok_or(Error::IllegalEscape { offset })
    }

    fn parse_class(&mut self, offset: usize) -> Result<Node> {
        if !self.supported(Features::CHAR_CLASSES, "character class")? {
            return Ok(Node::Literal('['));
        }
        let negated = self.peek() == Some(b'^');
        if negated {
            self.pos += 1;
        }
        let mut ranges = Vec::new();
        let mut first = true;
        loop {
            match self.peek() {
                None => return Err(Error::BadCharacterClass { offset }),
                Some(b']') if !first => {
                    self.pos += 1;
                    break;
                }
                _ => {}
            }
            first = false;
            let lo = self.parse_class_char()?;
            if self.peek() == Some(b'-') && self.bytes.get(self.pos + 1) != Some(&b']') {
                self.pos += 1;
                let hi = self.parse_class_char()?;
                if hi < lo {
                    return Err(Error::BadCharacterClass { offset });
                }
                ranges.push((lo, hi));
            } else {
                ranges.push((lo, lo));
            }
        }
        Ok(Node::Class { negated, ranges })
    }

    fn parse_class_char(&mut self) -> Result<char> {
        let offset = self.pos;
        if self.peek() == Some(b'\\') {
            self.pos += 1;
            match self.parse_escape(offset)? {
                Node::Literal(c) => Ok(c),
                Node::Property(_) => Err(Error::BadCharacterClass { offset }),
                _ => unreachable!(),
            }
        } else {
            Ok(self.next_char())
        }
    }

    fn parse_group(&mut self, offset: usize) -> Result<Node> {
        if !self.supported(Features::GROUP, "group")? {
            return Ok(Node::Literal('('));
        }
        self.nesting += 1;
        if self.nesting > RX_MAX_NESTING {
            return Err(Error::NestingTooDeep { offset });
        }
        let result = self.parse_group_body(offset);
        self.nesting -= 1;
        result
    }

    fn parse_group_body(&mut self, offset: usize) -> Result<Node> {
        let node = if self.peek() == Some(b'?') {
            self.pos += 1;
            match self.peek() {
                Some(b':') => {
                    self.pos += 1;
                    if !self.supported(Features::NON_CAPTURE, "non-capturing group")? {
                        return Err(Error::RejectedFeature { feature: "non-capturing group", offset });
                    }
                    Node::Group(Box::new(self.parse_alternates()?))
                }
                Some(b'!') => {
                    self.pos += 1;
                    if !self.supported(Features::NEG_LOOKAHEAD, "negative lookahead")? {
                        return Err(Error::RejectedFeature { feature: "negative lookahead", offset });
                    }
                    Node::NegLookahead(Box::new(self.parse_alternates()?))
                }
                Some(b'&') => {
                    return Err(Error::UnimplementedSubroutine { offset });
                }
                Some(b'<') => {
                    self.pos += 1;
                    if !self.supported(Features::CAPTURE, "named capture")? {
                        return Err(Error::RejectedFeature { feature: "named capture", offset });
                    }
                    let name_start = self.pos;
                    while matches!(self.peek(), Some(b) if b != b'>') {
                        self.pos += 1;
                    }
                    if self.peek() != Some(b'>') {
                        return Err(Error::UnclosedGroup { offset });
                    }
                    let name: Rc<str> = Rc::from(&self.re[name_start..self.pos]);
                    self.pos += 1;
                    if self.group_names.iter().any(|n| **n == *name) {
                        return Err(Error::DuplicateGroupName {
                            name: name.to_string(),
                            offset,
                        });
                    }
                    if self.group_names.len() >= 255 {
                        return Err(Error::TooManyNamedGroups { offset });
                    }
                    let group = self.group_names.len() as u8;
                    self.group_names.push(name);
                    Node::Capture {
                        group,
                        body: Box::new(self.parse_alternates()?),
                    }
                }
                _ => {
                    return Err(Error::GrammarSyntax {
                        message: "unknown (? group syntax".into(),
                        offset,
                    })
                }
            }
        } else {
            // A plain parenthesised group is an auto-numbered capture.
            if self.group_names.len() >= 255 {
                return Err(Error::TooManyNamedGroups { offset });
            }
            let group = self.group_names.len() as u8;
            self.group_names.push(Rc::from(group.to_string().as_str()));
            Node::Capture {
                group,
                body: Box::new(self.parse_alternates()?),
            }
        };
        self.skip_extended_whitespace();
        if self.peek() != Some(b')') {
            return Err(Error::UnclosedGroup { offset });
        }
        self.pos += 1;
        Ok(node)
    }
}

// --- Emission ----------------------------------------------------------

const OP_START: u8 = b'S';
const OP_CHAR_PROPERTY: u8 = b'P';
const OP_BOL: u8 = b'^';
const OP_EOL: u8 = b'$';
const OP_CHAR_CLASS: u8 = b'L';
const OP_NEG_CHAR_CLASS: u8 = b'N';
const OP_ANY: u8 = b'.';
const OP_NEG_LOOKAHEAD: u8 = b'!';
const OP_ACCEPT: u8 = b'#';
const OP_CHAR: u8 = b'C';
const OP_JUMP: u8 = b'J';
const OP_SPLIT: u8 = b'A';
const OP_ZERO: u8 = b'Z';
const OP_COUNT: u8 = b'R';
const OP_CAPTURE_START: u8 = b'(';
const OP_CAPTURE_END: u8 = b')';

/// Compile `pattern` into a self-contained NFA byte buffer (header plus
/// body). `enabled` controls which syntax is recognized; `rejected`
/// additionally makes recognized-but-unwanted syntax a compile error
/// rather than a silent literal fallback.
pub fn compile(pattern: &str, enabled: Features, rejected: Features) -> Result<Vec<u8>> {
    let mut parser = Parser::new(pattern, enabled, rejected);
    let ast = parser.parse()?;
    let group_names = parser.group_names;
    let max_capture = group_names.len() as u8;

    // Two iterations: measure with a 1-byte offset budget, bump the
    // width if the resulting program is too big to address with it, and
    // remeasure. Every offset in the program ends up the same width, so
    // forward references can be patched after the fact.
    let mut width = 1usize;
    let mut body_size = measure(&ast, width);
    for _ in 0..2 {
        let needed = varint_width(zigzag_encode(body_size as i64));
        if needed <= width {
            break;
        }
        width = needed;
        body_size = measure(&ast, width);
    }

    let mut emitter = Emitter {
        width,
        buf: Vec::with_capacity(body_size + 32),
    };

    // Search prologue: `.*` implemented as the same Split/Jump shape as
    // a general zero-or-more, so `matchAfter` can start here and fall
    // into `start_station` once it gives up extending the skip.
    let search_station = emitter.buf.len();
    emitter.emit(&Node::Repeat {
        min: 0,
        max: 0,
        body: Box::new(Node::Any),
    });

    let start_station = emitter.buf.len();
    emitter.emit_capture_start(0);
    emitter.emit(&ast);
    emitter.emit_capture_end(0);
    emitter.buf.push(OP_ACCEPT);

    let station_count = emitter.buf.len();

    let mut out = Vec::with_capacity(emitter.buf.len() + 16);
    out.push(OP_START);
    write_varint(&mut out, zigzag_encode(search_station as i64));
    write_varint(&mut out, zigzag_encode(start_station as i64));
    write_varint(&mut out, station_count as u64);
    out.push(max_counter(&ast) as u8);
    out.push(max_capture);
    out.push(group_names.len() as u8);
    for name in group_names.iter().skip(1) {
        write_varint(&mut out, name.len() as u64);
        out.extend_from_slice(name.as_bytes());
    }
    out.extend_from_slice(&emitter.buf);
    Ok(out)
}

fn max_counter(node: &Node) -> usize {
    match node {
        Node::Repeat { min, max, body } => {
            let inner = max_counter(body);
            let needs_counter = !(*min == 0 && *max == 0) && !(*min == 0 && *max == 1) && !(*min == 1 && *max == 0);
            inner + if needs_counter { 1 } else { 0 }
        }
        Node::Concat(items) | Node::Alternate(items) => items.iter().map(max_counter).max().unwrap_or(0).max(
            items.iter().map(max_counter).sum(),
        ),
        Node::Capture { body, .. } | Node::Group(body) | Node::NegLookahead(body) => max_counter(body),
        _ => 0,
    }
}

/// Conservative byte size of `node` assuming every offset slot costs
/// `width` bytes. Used both to choose `width` and, implicitly, to
/// pre-size the output buffer.
fn measure(node: &Node, width: usize) -> usize {
    match node {
        Node::Literal(c) => 1 + c.len_utf8(),
        Node::Any | Node::Bol | Node::Eol => 1,
        Node::Property(_) => 2,
        Node::Class { ranges, .. } => 1 + varint_width(ranges.len() as u64) + ranges.iter().map(|(a, b)| a.len_utf8() + b.len_utf8()).sum::<usize>(),
        Node::Concat(items) => items.iter().map(|n| measure(n, width)).sum(),
        Node::Alternate(branches) => {
            let n = branches.len();
            let splits = (n.saturating_sub(1)) * (1 + 2 * width);
            let jumps = (n.saturating_sub(1)) * (1 + width);
            splits + jumps + branches.iter().map(|n| measure(n, width)).sum::<usize>()
        }
        Node::Capture { body, .. } => 2 + measure(body, width),
        Node::Group(body) => measure(body, width),
        Node::NegLookahead(body) => 1 + width + measure(body, width),
        Node::Repeat { min, max, body } => {
            let body_size = measure(body, width);
            match (*min, *max) {
                (0, 0) => (1 + 2 * width) + body_size + (1 + width),
                (0, 1) => (1 + 2 * width) + body_size,
                (1, 0) => body_size + (1 + 2 * width),
                _ => (1 + width) + body_size + (1 + 2 * width + 2),
            }
        }
    }
}

struct Emitter {
    width: usize,
    buf: Vec<u8>,
}

impl Emitter {
    fn emit_capture_start(&mut self, group: u8) {
        self.buf.push(OP_CAPTURE_START);
        self.buf.push(group);
    }

    fn emit_capture_end(&mut self, group: u8) {
        self.buf.push(OP_CAPTURE_END);
        self.buf.push(group);
    }

    /// Reserve a `width`-byte offset slot at the current position and
    /// return its byte position, to be patched later with [`Self::patch`].
    fn reserve_offset(&mut self) -> usize {
        let at = self.buf.len();
        write_varint_padded(&mut self.buf, 0, self.width);
        at
    }

    /// Patch the offset slot at `slot` so it encodes `target - slot`
    /// (self-relative, per the NFA byte format).
    fn patch(&mut self, slot: usize, target: usize) {
        let value = zigzag_encode(target as i64 - slot as i64);
        let mut encoded = Vec::with_capacity(self.width);
        write_varint_padded(&mut encoded, value, self.width);
        self.buf[slot..slot + self.width].copy_from_slice(&encoded);
    }

    fn emit(&mut self, node: &Node) {
        match node {
            Node::Literal(c) => {
                self.buf.push(OP_CHAR);
                let mut tmp = [0u8; 4];
                self.buf.extend_from_slice(c.encode_utf8(&mut tmp).as_bytes());
            }
            Node::Any => self.buf.push(OP_ANY),
            Node::Bol => self.buf.push(OP_BOL),
            Node::Eol => self.buf.push(OP_EOL),
            Node::Property(p) => {
                self.buf.push(OP_CHAR_PROPERTY);
                self.buf.push(*p as u8);
            }
            Node::Class { negated, ranges } => {
                self.buf.push(if *negated { OP_NEG_CHAR_CLASS } else { OP_CHAR_CLASS });
                write_varint(&mut self.buf, ranges.len() as u64);
                let mut tmp = [0u8; 4];
                for (lo, hi) in ranges {
                    self.buf.extend_from_slice(lo.encode_utf8(&mut tmp).as_bytes());
                    self.buf.extend_from_slice(hi.encode_utf8(&mut tmp).as_bytes());
                }
            }
            Node::Concat(items) => {
                for item in items {
                    self.emit(item);
                }
            }
            Node::Alternate(branches) => self.emit_alternate(branches),
            Node::Capture { group, body } => {
                self.emit_capture_start(*group);
                self.emit(body);
                self.emit_capture_end(*group);
            }
            Node::Group(body) => self.emit(body),
            Node::NegLookahead(body) => {
                self.buf.push(OP_NEG_LOOKAHEAD);
                let after_slot = self.reserve_offset();
                self.emit(body);
                let after = self.buf.len();
                self.patch(after_slot, after);
            }
            Node::Repeat { min, max, body } => self.emit_repeat(*min, *max, body),
        }
    }

    fn emit_alternate(&mut self, branches: &[Node]) {
        let mut end_jumps = Vec::new();
        for (i, branch) in branches.iter().enumerate() {
            let is_last = i + 1 == branches.len();
            if !is_last {
                self.buf.push(OP_SPLIT);
                let goto1_slot = self.reserve_offset();
                let goto2_slot = self.reserve_offset();
                let branch_start = self.buf.len();
                self.patch(goto1_slot, branch_start);
                self.emit(branch);
                self.buf.push(OP_JUMP);
                end_jumps.push(self.reserve_offset());
                let next_branch = self.buf.len();
                self.patch(goto2_slot, next_branch);
            } else {
                self.emit(branch);
            }
        }
        let end = self.buf.len();
        for slot in end_jumps {
            self.patch(slot, end);
        }
    }

    fn emit_repeat(&mut self, min: u32, max: u32, body: &Node) {
        match (min, max) {
            (0, 0) => {
                // `*`: Split(enter, after); enter: body; Jump(split).
                self.buf.push(OP_SPLIT);
                let enter_slot = self.reserve_offset();
                let after_slot = self.reserve_offset();
                let split_station = enter_slot - 1;
                let enter = self.buf.len();
                self.patch(enter_slot, enter);
                self.emit(body);
                self.buf.push(OP_JUMP);
                let jump_slot = self.reserve_offset();
                self.patch(jump_slot, split_station);
                let after = self.buf.len();
                self.patch(after_slot, after);
            }
            (0, 1) => {
                // `?`: Split(enter, after); enter: body;
                self.buf.push(OP_SPLIT);
                let enter_slot = self.reserve_offset();
                let after_slot = self.reserve_offset();
                let enter = self.buf.len();
                self.patch(enter_slot, enter);
                self.emit(body);
                let after = self.buf.len();
                self.patch(after_slot, after);
            }
            (1, 0) => {
                // `+`: body; Split(back-to-body, after).
                let body_start = self.buf.len();
                self.emit(body);
                self.buf.push(OP_SPLIT);
                let loop_slot = self.reserve_offset();
                let after_slot = self.reserve_offset();
                self.patch(loop_slot, body_start);
                let after = self.buf.len();
                self.patch(after_slot, after);
            }
            (min, max) => {
                // General `{m,n}`: Zero(entry); body; Count(min+1,max+1,back).
                self.buf.push(OP_ZERO);
                let entry_slot = self.reserve_offset();
                let body_start = self.buf.len();
                self.patch(entry_slot, body_start);
                self.emit(body);
                self.buf.push(OP_COUNT);
                self.buf.push((min + 1).min(255) as u8);
                self.buf.push((max + 1).min(255) as u8);
                let back_slot = self.reserve_offset();
                self.patch(back_slot, body_start);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rx::program::Program;

    #[test]
    fn compiles_literal() {
        let nfa = compile("abc", Features::ALL, Features::NONE).unwrap();
        let program = Program::new(nfa);
        let result = program.match_at(b"abc", 0);
        assert!(result.succeeded());
        assert_eq!(result.length(), 3);
    }

    #[test]
    fn rejects_feature_when_asked() {
        let err = compile("a|b", Features::ALL, Features::ALTERNATES).unwrap_err();
        assert!(matches!(err, Error::RejectedFeature { feature: "alternates", .. }));
    }

    #[test]
    fn rejects_double_repetition() {
        let err = compile("a**", Features::ALL, Features::NONE).unwrap_err();
        assert!(matches!(err, Error::RepeatingARepetition { .. }));
    }

    #[test]
    fn rejects_subroutine_calls() {
        let err = compile("(?&name)", Features::ALL, Features::NONE).unwrap_err();
        assert!(matches!(err, Error::UnimplementedSubroutine { .. }));
    }

    #[test]
    fn rejects_too_deep_nesting() {
        let deep = "(".repeat(RX_MAX_NESTING + 1) + "a" + &")".repeat(RX_MAX_NESTING + 1);
        let err = compile(&deep, Features::ALL, Features::NONE).unwrap_err();
        assert!(matches!(err, Error::NestingTooDeep { .. }));
    }

    #[test]
    fn rejects_duplicate_group_names() {
        let err = compile("(?<x>a)(?<x>b)", Features::ALL, Features::NONE).unwrap_err();
        assert!(matches!(err, Error::DuplicateGroupName { .. }));
    }
}
