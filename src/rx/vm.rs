// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Thompson-style thread-set simulation over a compiled [`Program`].
//!
//! Every cycle steps one input character: non-consuming stations (jumps,
//! splits, capture markers, counters, anchors, lookahead) are resolved
//! immediately by [`Sim::add_thread`], which only ever enqueues a
//! *consuming* station into the thread list for the current or next
//! character. This mirrors the `clist`/`nlist` swap-per-character shape
//! of `examples/defuz-regex/src/nfa.rs`'s `Nfa::exec_`, generalized with
//! the counter-stack bookkeeping `{m,n}` repetition needs.

use crate::rx::program::{Op, Program};
use crate::rx::result::RxResult;
use crate::rx::RX_MAX_NESTING;

/// How many threads with distinct counter state are allowed to coexist at
/// the same station in one list. Counted repetition is the only reason
/// two threads ever share a station, so this only needs to be as large as
/// a single program's live unrolled-counter depth ever gets in practice.
const MAX_DUPLICATES_ALLOWED: usize = 8;

#[derive(Clone)]
struct Thread {
    station: usize,
    result: RxResult,
}

#[derive(Default)]
struct ThreadList {
    threads: Vec<Thread>,
}

impl ThreadList {
    fn clear(&mut self) {
        self.threads.clear();
    }

    fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }

    /// Add `result` at `station` unless a thread already there has the
    /// same counter stack (a true duplicate — the earlier one has
    /// priority) or the station has already accumulated
    /// `MAX_DUPLICATES_ALLOWED` distinct counter states.
    fn push_dedup(&mut self, station: usize, result: RxResult) {
        let mut seen = 0;
        for t in &self.threads {
            if t.station == station {
                if t.result.counters_same(&result) {
                    return;
                }
                seen += 1;
            }
        }
        if seen >= MAX_DUPLICATES_ALLOWED {
            return;
        }
        self.threads.push(Thread { station, result });
    }
}

/// What ends a simulation successfully.
enum Goal {
    /// Stop at the program's `Accept` opcode; among every thread that
    /// reaches it, keep the leftmost start, then the longest length.
    Accept,
    /// Stop as soon as any thread's non-consuming expansion reaches this
    /// station — used to test a negative-lookahead body, which has no
    /// `Accept` opcode of its own.
    Station(usize),
}

struct Sim<'p, 't> {
    program: &'p Program,
    text: &'t [u8],
    goal: Goal,
    best: Option<RxResult>,
    lookahead_hit: bool,
}

impl<'p, 't> Sim<'p, 't> {
    fn new(program: &'p Program, text: &'t [u8], goal: Goal) -> Self {
        Sim {
            program,
            text,
            goal,
            best: None,
            lookahead_hit: false,
        }
    }

    fn record_accept(&mut self, result: RxResult, pos: usize) {
        let _ = pos; // capture 0 was already closed by the CaptureEnd(0) just before Accept.
        let candidate = result.accept();
        self.best = Some(match self.best.take() {
            None => candidate,
            Some(existing) => prefer(existing, candidate),
        });
    }

    /// Follow non-consuming stations from `station` until a consuming
    /// station is reached (pushed into `list`) or the simulation's goal is
    /// satisfied. `shunts` records every station visited in this single
    /// transitive expansion so a non-consuming cycle (e.g. a `*` whose
    /// body can match empty) terminates instead of recursing forever.
    fn add_thread(
        &mut self,
        list: &mut ThreadList,
        station: usize,
        mut result: RxResult,
        pos: usize,
        shunts: &mut Vec<usize>,
    ) {
        if let Goal::Station(target) = self.goal {
            if station == target {
                self.lookahead_hit = true;
                return;
            }
        }
        if shunts.len() > RX_MAX_NESTING || shunts.contains(&station) {
            return;
        }
        shunts.push(station);
        let (op, next) = self.program.decode(station);
        match op {
            Op::Jump(target) => self.add_thread(list, target, result, pos, shunts),
            Op::Split(a, b) => {
                self.add_thread(list, a, result.clone(), pos, shunts);
                self.add_thread(list, b, result, pos, shunts);
            }
            Op::CaptureStart(group) => {
                result.open_capture(group, pos);
                self.add_thread(list, next, result, pos, shunts);
            }
            Op::CaptureEnd(group) => {
                result.close_capture(group, pos);
                self.add_thread(list, next, result, pos, shunts);
            }
            Op::Zero(entry) => {
                result.counter_push_zero(pos);
                self.add_thread(list, entry, result, pos, shunts);
            }
            Op::Count { min, max, back } => {
                self.add_count(list, min, max, back, next, result, pos, shunts);
            }
            Op::Bol => {
                if at_bol(self.text, pos) {
                    self.add_thread(list, next, result, pos, shunts);
                }
            }
            Op::Eol => {
                if at_eol(self.text, pos) {
                    self.add_thread(list, next, result, pos, shunts);
                }
            }
            Op::NegLookahead(after) => {
                // `next` is the body's entry station (the only operand
                // `NegLookahead` carries is `after`); the body has no
                // `Accept` of its own, so success is defined as reaching
                // `after` directly rather than falling off the end.
                let matched_inside = run_lookahead(self.program, self.text, pos, next, after);
                if !matched_inside {
                    self.add_thread(list, after, result, pos, shunts);
                }
            }
            Op::Accept => {
                if matches!(self.goal, Goal::Accept) {
                    self.record_accept(result, pos);
                }
            }
            Op::Char(_) | Op::Any | Op::Property(_) | Op::Class { .. } => {
                list.push_dedup(station, result);
            }
            Op::Start => unreachable!("Start opcode only appears before header parsing"),
        }
        shunts.pop();
    }

    /// `Count(min, max, back)`: `min`/`max` are stored as `real + 1` (so a
    /// stored `0` is never emitted); a stored `max` of `1` means the real
    /// max is `0`, i.e. unbounded.
    #[allow(clippy::too_many_arguments)]
    fn add_count(
        &mut self,
        list: &mut ThreadList,
        min: u8,
        max: u8,
        back: usize,
        after: usize,
        mut result: RxResult,
        pos: usize,
        shunts: &mut Vec<usize>,
    ) {
        let prev_offset = result.counter_top().map(|c| c.offset);
        let progressed = prev_offset != Some(pos);
        result.counter_incr(pos);
        let count = result.counter_top().map(|c| c.count).unwrap_or(0);
        let real_min = min.saturating_sub(1) as u32;
        let real_max_unbounded = max <= 1;
        let real_max = if real_max_unbounded { 0 } else { (max - 1) as u32 };

        if progressed && (real_max_unbounded || count <= real_max) {
            self.add_thread(list, back, result.clone(), pos, shunts);
        }
        if count >= real_min {
            let mut past = result;
            past.counter_pop();
            self.add_thread(list, after, past, pos, shunts);
        }
    }

    /// Step every thread in `list` across `ch`, enqueueing survivors
    /// (via their follow-through station) into `out`.
    fn step(&mut self, list: &ThreadList, ch: char, next_pos: usize, out: &mut ThreadList) {
        for thread in &list.threads {
            let (op, next) = self.program.decode(thread.station);
            let advances = match op {
                Op::Char(expected) => ch == expected,
                Op::Any => true,
                Op::Property(tag) => match_property(tag, ch),
                Op::Class { negated, ranges } => {
                    let in_range = ranges.iter().any(|(lo, hi)| ch >= *lo && ch <= *hi);
                    in_range != negated
                }
                _ => false,
            };
            if advances {
                let mut shunts = Vec::new();
                self.add_thread(out, next, thread.result.clone(), next_pos, &mut shunts);
            }
        }
    }
}

/// Leftmost start wins; ties prefer the longer match.
fn prefer(a: RxResult, b: RxResult) -> RxResult {
    if b.offset() < a.offset() {
        b
    } else if b.offset() > a.offset() {
        a
    } else if b.length() > a.length() {
        b
    } else {
        a
    }
}

fn at_bol(text: &[u8], pos: usize) -> bool {
    pos == 0 || text.get(pos.wrapping_sub(1)) == Some(&b'\n')
}

fn at_eol(text: &[u8], pos: usize) -> bool {
    pos >= text.len() || text.get(pos) == Some(&b'\n')
}

/// Test a regex character-property escape (`\d \s \w \a \h \L \U`).
fn match_property(tag: char, ch: char) -> bool {
    match tag {
        'a' => ch.is_alphabetic(),
        'd' => ch.is_ascii_digit(),
        'h' => ch.is_ascii_hexdigit(),
        'L' => ch.is_lowercase(),
        'U' => ch.is_uppercase(),
        's' => ch.is_whitespace(),
        'w' => ch.is_alphanumeric(),
        _ => false,
    }
}

/// Decode one Unicode scalar at byte offset `pos`, tolerating malformed
/// UTF-8 by treating a bad lead byte as a single-byte replacement
/// character rather than panicking (the VM sees arbitrary caller bytes,
/// unlike `Source`, which only ever sees validated `&str` input).
fn char_at(text: &[u8], pos: usize) -> Option<(char, usize)> {
    if pos >= text.len() {
        return None;
    }
    match std::str::from_utf8(&text[pos..]) {
        Ok(s) => s.chars().next().map(|c| (c, pos + c.len_utf8())),
        Err(e) => {
            let valid = e.valid_up_to();
            if valid > 0 {
                let s = std::str::from_utf8(&text[pos..pos + valid]).ok()?;
                s.chars().next().map(|c| (c, pos + c.len_utf8()))
            } else {
                Some(('\u{FFFD}', pos + 1))
            }
        }
    }
}

/// Run the main simulation: seed at `start_station`, then step one
/// character at a time until the thread list goes empty or input runs
/// out. The `.*` search prologue that `matchAfter` starts from is just
/// more bytecode — a `Split` that tries consuming a character and
/// retrying before falling into `start_station` — so no special casing
/// is needed here for "search" versus "anchored" matching.
pub fn run(program: &Program, text: &[u8], start: usize, start_station: usize) -> RxResult {
    let mut sim = Sim::new(program, text, Goal::Accept);
    let mut clist = ThreadList::default();
    let mut nlist = ThreadList::default();

    let init = RxResult::empty(program.max_capture);
    let mut shunts = Vec::new();
    sim.add_thread(&mut clist, start_station, init, start, &mut shunts);

    let mut pos = start;
    loop {
        if clist.is_empty() {
            break;
        }
        let (ch, next_pos) = match char_at(text, pos) {
            Some(pair) => pair,
            None => break,
        };
        nlist.clear();
        sim.step(&clist, ch, next_pos, &mut nlist);
        std::mem::swap(&mut clist, &mut nlist);
        pos = next_pos;
    }
    sim.best.unwrap_or_else(RxResult::failure)
}

/// Run a sub-simulation for a negative lookahead's body: success is
/// reaching `after_station` (the body has no `Accept` of its own), not
/// matching to end of input.
fn run_lookahead(program: &Program, text: &[u8], pos: usize, body_station: usize, after_station: usize) -> bool {
    let mut sim = Sim::new(program, text, Goal::Station(after_station));
    let mut clist = ThreadList::default();
    let mut nlist = ThreadList::default();

    let init = RxResult::empty(program.max_capture);
    let mut shunts = Vec::new();
    sim.add_thread(&mut clist, body_station, init, pos, &mut shunts);
    if sim.lookahead_hit {
        return true;
    }

    let mut at = pos;
    loop {
        if clist.is_empty() {
            break;
        }
        let (ch, next_pos) = match char_at(text, at) {
            Some(pair) => pair,
            None => break,
        };
        nlist.clear();
        sim.step(&clist, ch, next_pos, &mut nlist);
        if sim.lookahead_hit {
            return true;
        }
        std::mem::swap(&mut clist, &mut nlist);
        at = next_pos;
    }
    sim.lookahead_hit
}

#[cfg(test)]
mod tests {
    use crate::rx::compiler::{compile, Features};
    use crate::rx::program::Program;

    fn compiled(pattern: &str) -> Program {
        Program::new(compile(pattern, Features::ALL, Features::NONE).unwrap())
    }

    #[test]
    fn s7_alternation_and_repeated_group_capture() {
        let program = compiled("a(b|c)+d");
        let result = program.match_after(b"xxxabcbd", 0);
        assert!(result.succeeded());
        assert_eq!(result.offset(), 3);
        assert_eq!(result.length(), 5);
        assert_eq!(result.capture(1), Some((6, 7)));
    }

    #[test]
    fn s8_counted_repetition_possessive() {
        let program = compiled("a{2,3}");
        let result = program.match_at(b"aaaa", 0);
        assert!(result.succeeded());
        assert_eq!(result.offset(), 0);
        assert_eq!(result.length(), 3);
    }

    #[test]
    fn s9_negative_lookahead_in_repetition() {
        let program = compiled("((?!ac)[a-z])+");
        let result = program.match_at(b"abcdbacd", 0);
        assert!(result.succeeded());
        assert_eq!(result.offset(), 0);
        assert_eq!(result.length(), 5);
    }

    #[test]
    fn unbounded_counted_repetition() {
        let program = compiled("a{2,}");
        let result = program.match_at(b"aaaaa", 0);
        assert!(result.succeeded());
        assert_eq!(result.length(), 5);
    }

    #[test]
    fn search_finds_leftmost_match() {
        let program = compiled("bc");
        let result = program.match_after(b"abcbc", 0);
        assert!(result.succeeded());
        assert_eq!(result.offset(), 1);
        assert_eq!(result.length(), 2);
    }

    #[test]
    fn no_match_reports_failure() {
        let program = compiled("xyz");
        let result = program.match_at(b"abc", 0);
        assert!(!result.succeeded());
    }

    #[test]
    fn bol_eol_anchors() {
        let program = compiled("^abc$");
        assert!(program.match_at(b"abc", 0).succeeded());
        let program2 = compiled("^abc$");
        let result = program2.match_after(b"xx\nabc", 0);
        assert!(result.succeeded());
        assert_eq!(result.offset(), 3);
    }

    // Possessive `{m,n}` never backtracks, so against a run of `k` `a`s it
    // should consume exactly `min(k, n)` of them when `k >= m`, and fail
    // outright when `k < m`. Fuzz `m`, `n`, and `k` against that reference
    // count directly, rather than trusting a handful of hand-picked cases.
    #[test]
    fn counted_repetition_matches_reference_count() {
        use rand::Rng;

        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let min = rng.gen_range(0..5u32);
            let extra = rng.gen_range(0..5u32);
            let max = min + extra;
            let run_len = rng.gen_range(0..10usize);

            let pattern = format!("a{{{},{}}}", min, max);
            let program = compiled(&pattern);
            let text = "a".repeat(run_len);
            let result = program.match_at(text.as_bytes(), 0);

            if run_len >= min as usize {
                let expected = run_len.min(max as usize);
                assert!(
                    result.succeeded(),
                    "pattern {:?} against {} a's should succeed",
                    pattern,
                    run_len
                );
                assert_eq!(result.length(), expected, "pattern {:?} against {} a's", pattern, run_len);
            } else {
                assert!(
                    !result.succeeded(),
                    "pattern {:?} against {} a's should fail",
                    pattern,
                    run_len
                );
            }
        }
    }
}
