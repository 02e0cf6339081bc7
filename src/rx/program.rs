// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Owns a compiled NFA byte buffer (as produced by
//! [`crate::rx::compiler::compile`]) and decodes it one station at a
//! time for [`crate::rx::vm`].

use std::rc::Rc;

use crate::rx::result::RxResult;
use crate::rx::{read_varint, zigzag_decode};

/// One decoded instruction, together with the byte offset of the
/// station immediately following it (where sequential control flow
/// falls through to).
#[derive(Clone, Debug, PartialEq)]
pub enum Op {
    /// Matches and consumes nothing; only present at station 0 before
    /// the header is parsed. Never seen by the VM in practice.
    Start,
    Char(char),
    Any,
    Bol,
    Eol,
    /// `\d`, `\s`, `\w`, etc; the tag is the escape letter.
    Property(char),
    Class { negated: bool, ranges: Vec<(char, char)> },
    Jump(usize),
    Split(usize, usize),
    /// Negative lookahead: station to resume at if the sub-match at
    /// `body` offset (immediately following this op) does *not* match.
    NegLookahead(usize),
    CaptureStart(u8),
    CaptureEnd(u8),
    Zero(usize),
    Count { min: u8, max: u8, back: usize },
    Accept,
}

pub struct Program {
    bytes: Vec<u8>,
    pub search_station: usize,
    pub start_station: usize,
    pub station_count: usize,
    pub max_counter: u8,
    pub max_capture: u8,
    pub names: Vec<Rc<str>>,
}

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

impl Program {
    /// Decode the header of a buffer produced by
    /// [`crate::rx::compiler::compile`]. Panics on a malformed header,
    /// since the only producer of this format is the compiler itself.
    pub fn new(bytes: Vec<u8>) -> Self {
        let mut pos = 0;
        assert_eq!(bytes[pos], OP_START, "not an rx program");
        pos += 1;
        let search_station = zigzag_decode(read_varint(&bytes, &mut pos)) as usize;
        let start_station = zigzag_decode(read_varint(&bytes, &mut pos)) as usize;
        let station_count = read_varint(&bytes, &mut pos) as usize;
        let max_counter = bytes[pos];
        pos += 1;
        let max_capture = bytes[pos];
        pos += 1;
        let name_count = bytes[pos];
        pos += 1;
        let mut names = Vec::with_capacity(name_count as usize);
        for _ in 0..name_count {
            let len = read_varint(&bytes, &mut pos) as usize;
            let name = std::str::from_utf8(&bytes[pos..pos + len]).unwrap_or("");
            names.push(Rc::from(name));
            pos += len;
        }
        let body = bytes[pos..].to_vec();
        Program {
            bytes: body,
            search_station,
            start_station,
            station_count,
            max_counter,
            max_capture,
            names,
        }
    }

    pub fn body_len(&self) -> usize {
        self.bytes.len()
    }

    /// Decode the station at byte offset `at`, returning the operation
    /// and the offset of the next sequential station.
    pub fn decode(&self, at: usize) -> (Op, usize) {
        let mut pos = at;
        let tag = self.bytes[pos];
        pos += 1;
        let op = match tag {
            OP_CHAR => {
                let rest = std::str::from_utf8(&self.bytes[pos..]).unwrap_or("");
                let c = rest.chars().next().unwrap_or('\0');
                pos += c.len_utf8();
                Op::Char(c)
            }
            OP_ANY => Op::Any,
            OP_BOL => Op::Bol,
            OP_EOL => Op::Eol,
            OP_CHAR_PROPERTY => {
                let tag = self.bytes[pos] as char;
                pos += 1;
                Op::Property(tag)
            }
            OP_CHAR_CLASS | OP_NEG_CHAR_CLASS => {
                let count = read_varint(&self.bytes, &mut pos) as usize;
                let mut ranges = Vec::with_capacity(count);
                for _ in 0..count {
                    let rest = std::str::from_utf8(&self.bytes[pos..]).unwrap_or("");
                    let lo = rest.chars().next().unwrap_or('\0');
                    pos += lo.len_utf8();
                    let rest = std::str::from_utf8(&self.bytes[pos..]).unwrap_or("");
                    let hi = rest.chars().next().unwrap_or('\0');
                    pos += hi.len_utf8();
                    ranges.push((lo, hi));
                }
                Op::Class { negated: tag == OP_NEG_CHAR_CLASS, ranges }
            }
            OP_JUMP => {
                let offset = self.read_offset(&mut pos);
                Op::Jump(offset)
            }
            OP_SPLIT => {
                let goto1 = self.read_offset(&mut pos);
                let goto2 = self.read_offset(&mut pos);
                Op::Split(goto1, goto2)
            }
            OP_NEG_LOOKAHEAD => {
                let after = self.read_offset(&mut pos);
                Op::NegLookahead(after)
            }
            OP_CAPTURE_START => {
                let group = self.bytes[pos];
                pos += 1;
                Op::CaptureStart(group)
            }
            OP_CAPTURE_END => {
                let group = self.bytes[pos];
                pos += 1;
                Op::CaptureEnd(group)
            }
            OP_ZERO => {
                let entry = self.read_offset(&mut pos);
                Op::Zero(entry)
            }
            OP_COUNT => {
                let min = self.bytes[pos];
                let max = self.bytes[pos + 1];
                pos += 2;
                let back = self.read_offset(&mut pos);
                Op::Count { min, max, back }
            }
            OP_ACCEPT => Op::Accept,
            OP_START => Op::Start,
            other => panic!("unknown rx opcode byte {:#x} at station {}", other, at),
        };
        (op, pos)
    }

    /// Offsets are varints encoding a zigzag-signed value self-relative
    /// to the byte position of the offset slot itself.
    fn read_offset(&self, pos: &mut usize) -> usize {
        let slot_start = *pos;
        let raw = read_varint(&self.bytes, pos);
        let delta = zigzag_decode(raw);
        (slot_start as i64 + delta) as usize
    }

    /// Try to match starting exactly at byte offset `start` in `text`.
    pub fn match_at(&self, text: &[u8], start: usize) -> RxResult {
        crate::rx::vm::run(self, text, start, self.start_station)
    }

    /// Search for a match starting at or after byte offset `start`,
    /// using the compiled `.*`-style search prologue.
    pub fn match_after(&self, text: &[u8], start: usize) -> RxResult {
        crate::rx::vm::run(self, text, start, self.search_station)
    }
}
