// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Possessive prefix-operator PEG-regular-expressions ("Pegexp").
//!
//! Pegexp patterns use regex-style operators in *prefix* position:
//! `^ $ . ? * + ( ) | & !`, escapes, character classes, and a labeling
//! suffix `:name:` that hands the matched text to a [`Context`]. See the
//! module-level atom table in the crate docs for the full alphabet.
//!
//! Repetition and alternation are possessive: once committed, a match is
//! never unwound. The VM is plain recursion over the pattern text plus
//! cheap `Source` copies for backtracking across alternates and
//! lookahead — there is no explicit machine stack.

use crate::source::Source;
use crate::variant::Variant;

/// Bytes that route to [`Context::match_extended`] instead of being
/// matched literally. Peg uses this to implement `<rule>` calls.
const EXTENDED_BYTES: &[u8] = b"~@#%_;<`";

/// The result of matching one atom, a sequence, or a whole pattern.
#[derive(Clone, Debug)]
pub struct Match<'s> {
    pub variant: Variant,
    pub from: Source<'s>,
    pub to: Source<'s>,
}

impl<'s> Match<'s> {
    fn success(variant: Variant, from: Source<'s>, to: Source<'s>) -> Self {
        Match { variant, from, to }
    }
}

/// The callbacks a Pegexp match needs from its caller: capture storage,
/// failure-location bookkeeping, and (for Peg) dispatch of `<rule>`
/// atoms. A plain [`NullContext`] is provided for patterns that need
/// neither captures nor rule calls.
pub trait Context<'s> {
    /// Monotonically increasing count of captures made so far, so a
    /// failed sub-attempt can roll back to exactly where it started.
    fn capture_count(&self) -> usize;

    /// Record a successful labeled atom/rule match under `name`.
    /// `in_repetition` is true when the label occurs inside a `*`/`+`
    /// group, in which case repeated captures accumulate into an array.
    fn capture(&mut self, name: &str, m: Match<'s>, in_repetition: bool);

    /// Undo every capture made since `count`. Per spec, a full clear is
    /// the only supported rollback target below the current count other
    /// than 0; rolling back to a positive count is advisory only.
    fn rollback_capture(&mut self, count: usize);

    /// An atom failed to match at `location`. Only terminal atoms
    /// (literals, `.`, `^`, `$`, classes, `\property`) call this —
    /// composite operators do not report their own failure.
    fn record_failure(&mut self, atom_start: usize, atom_end: usize, location: Source<'s>);

    /// Build the `Match` returned for a successful parse or sub-rule.
    fn match_result(&mut self, from: Source<'s>, to: Source<'s>) -> Match<'s>;

    /// If the atom just matched was dispatched through
    /// [`Context::match_extended`] (a `<rule>` call) and produced its own
    /// structured result, hand it back here so a `:name:` label captures
    /// the rule's value rather than a re-sliced literal. The default (no
    /// rule dispatch) returns `None`.
    fn extended_match(&mut self) -> Option<Match<'s>> {
        None
    }

    fn capture_disabled(&self) -> bool;
    fn enter_lookahead(&mut self);
    fn leave_lookahead(&mut self);

    fn repetition_nesting(&self) -> usize;
    fn enter_repetition(&mut self);
    fn leave_repetition(&mut self);

    /// Handle an atom byte from [`EXTENDED_BYTES`] or a control
    /// character. The default treats it as a literal byte match.
    fn match_extended(&mut self, pattern: &[u8], pc: &mut usize, source: &mut Source<'s>) -> bool {
        match_literal(pattern, pc, source)
    }

    /// Skip over an extended atom without matching it (used when
    /// skipping a losing alternate or an already-matched repetition).
    /// The default skips exactly one byte, matching a literal.
    fn skip_extended(&self, _pattern: &[u8], pc: &mut usize) {
        *pc += 1;
    }
}

/// A [`Context`] with no captures and no rule dispatch; useful for
/// plain Pegexp matching where only success/failure and the matched
/// span matter.
#[derive(Default)]
pub struct NullContext {
    capture_disabled: usize,
    repetition_nesting: usize,
}

impl<'s> Context<'s> for NullContext {
    fn capture_count(&self) -> usize {
        0
    }
    fn capture(&mut self, _name: &str, _m: Match<'s>, _in_repetition: bool) {}
    fn rollback_capture(&mut self, _count: usize) {}
    fn record_failure(&mut self, _atom_start: usize, _atom_end: usize, _location: Source<'s>) {}
    fn match_result(&mut self, from: Source<'s>, to: Source<'s>) -> Match<'s> {
        Match::success(Variant::string(from.slice_to(&to)), from, to)
    }
    fn capture_disabled(&self) -> bool {
        self.capture_disabled > 0
    }
    fn enter_lookahead(&mut self) {
        self.capture_disabled += 1;
    }
    fn leave_lookahead(&mut self) {
        self.capture_disabled -= 1;
    }
    fn repetition_nesting(&self) -> usize {
        self.repetition_nesting
    }
    fn enter_repetition(&mut self) {
        self.repetition_nesting += 1;
    }
    fn leave_repetition(&mut self) {
        self.repetition_nesting -= 1;
    }
}

/// A compiled-nowhere, interpreted-at-match-time Pegexp pattern.
#[derive(Clone, Copy, Debug)]
pub struct Pegexp<'p> {
    pattern: &'p str,
}

impl<'p> Pegexp<'p> {
    pub fn new(pattern: &'p str) -> Self {
        Pegexp { pattern }
    }

    pub fn pattern(&self) -> &'p str {
        self.pattern
    }

    /// Search forward from `source` for the first position at which the
    /// pattern matches, advancing `source` past the match on success.
    /// On failure, `source` is left at EOF and a `None`-variant `Match`
    /// is returned.
    pub fn parse<'s>(
        &self,
        source: &mut Source<'s>,
        ctx: &mut dyn Context<'s>,
    ) -> Match<'s> {
        let initial_captures = ctx.capture_count();
        loop {
            let mut attempt = *source;
            ctx.rollback_capture(initial_captures);

            let m = self.parse_here_at(&mut attempt, ctx);
            if !m.variant.is_none() {
                *source = attempt;
                return m;
            }
            if source.at_eof() {
                break;
            }
            source.get_char();
        }
        Match::success(Variant::None, *source, *source)
    }

    /// Match the pattern anchored at the current position of `source`.
    pub fn parse_here<'s>(
        &self,
        source: &mut Source<'s>,
        ctx: &mut dyn Context<'s>,
    ) -> Match<'s> {
        self.parse_here_at(source, ctx)
    }

    fn parse_here_at<'s>(&self, source: &mut Source<'s>, ctx: &mut dyn Context<'s>) -> Match<'s> {
        let start = *source;
        let pattern = self.pattern.as_bytes();
        let mut pc = 0usize;
        let mut working = *source;

        if match_sequence(pattern, &mut pc, &mut working, ctx) && at_expr_end(pattern, pc) {
            let m = ctx.match_result(start, working);
            *source = working;
            m
        } else {
            Match::success(Variant::None, start, start)
        }
    }
}

fn at_expr_end(pattern: &[u8], pc: usize) -> bool {
    pc >= pattern.len() || pattern[pc] == b')'
}

/// Match a sequence of atoms up to the end of the pattern or a `)`.
fn match_sequence<'s>(
    pattern: &[u8],
    pc: &mut usize,
    source: &mut Source<'s>,
    ctx: &mut dyn Context<'s>,
) -> bool {
    if at_expr_end(pattern, *pc) {
        return true;
    }
    let sequence_capture_start = ctx.capture_count();
    let mut ok = match_atom(pattern, pc, source, ctx);
    while ok && !at_expr_end(pattern, *pc) {
        ok = match_atom(pattern, pc, source, ctx);
    }
    if !ok {
        ctx.rollback_capture(sequence_capture_start);
    }
    ok
}

/// Decode a literal character or escape at `pc`, advancing past it.
/// Mirrors `literal_char` in the original Pegexp implementation.
fn literal_char(pattern: &[u8], pc: &mut usize) -> char {
    let rc = pattern[*pc];
    *pc += 1;
    if rc != b'\\' {
        return rc as char;
    }
    if *pc >= pattern.len() {
        return '\0';
    }
    let rc = pattern[*pc];
    *pc += 1;
    match rc {
        b'0'..=b'7' => {
            let mut value = (rc - b'0') as u32;
            for _ in 0..2 {
                if *pc < pattern.len() && (b'0'..=b'7').contains(&pattern[*pc]) {
                    value = (value << 3) + (pattern[*pc] - b'0') as u32;
                    *pc += 1;
                } else {
                    break;
                }
            }
            char::from_u32(value).unwrap_or('\0')
        }
        b'x' => {
            let braces = *pc < pattern.len() && pattern[*pc] == b'{';
            if braces {
                *pc += 1;
            }
            let value = read_hex(pattern, pc, if braces { usize::MAX } else { 2 });
            if braces && *pc < pattern.len() && pattern[*pc] == b'}' {
                *pc += 1;
            }
            char::from_u32(value).unwrap_or('\0')
        }
        b'u' => {
            let braces = *pc < pattern.len() && pattern[*pc] == b'{';
            if braces {
                *pc += 1;
            }
            let value = read_hex(pattern, pc, if braces { 8 } else { 4 });
            if braces && *pc < pattern.len() && pattern[*pc] == b'}' {
                *pc += 1;
            }
            char::from_u32(value).unwrap_or('\0')
        }
        b'n' => '\n',
        b't' => '\t',
        b'r' => '\r',
        b'b' => '\u{8}',
        b'e' => '\u{1B}',
        b'f' => '\u{C}',
        other => other as char,
    }
}

fn read_hex(pattern: &[u8], pc: &mut usize, max_digits: usize) -> u32 {
    let mut value = 0u32;
    let mut count = 0;
    while count < max_digits && *pc < pattern.len() {
        let digit = match pattern[*pc] {
            b'0'..=b'9' => pattern[*pc] - b'0',
            b'a'..=b'f' => pattern[*pc] - b'a' + 10,
            b'A'..=b'F' => pattern[*pc] - b'A' + 10,
            _ => break,
        };
        value = (value << 4) | digit as u32;
        *pc += 1;
        count += 1;
    }
    value
}

/// Test a character property escape (`\a \d \h \s \w \L \U`), or fall
/// back to an exact-character comparison for any other escaped byte.
fn char_property(pattern: &[u8], pc: &mut usize, ch: char) -> bool {
    let esc = pattern[*pc];
    *pc += 1;
    match esc {
        b'a' => ch.is_alphabetic(),
        b'd' => ch.is_ascii_digit(),
        b'h' => ch.is_ascii_hexdigit(),
        b'L' => ch.is_lowercase(),
        b'U' => ch.is_uppercase(),
        b's' => ch.is_whitespace(),
        b'w' => ch.is_alphanumeric(),
        _ => {
            *pc -= 2;
            let expected = literal_char(pattern, pc);
            expected == ch
        }
    }
}

fn char_class<'s>(pattern: &[u8], pc: &mut usize, source: &mut Source<'s>) -> bool {
    if source.at_eof() {
        return false;
    }
    let negated = *pc < pattern.len() && pattern[*pc] == b'^';
    if negated {
        *pc += 1;
    }
    let ch = source.get_char().unwrap();
    let mut in_class = false;
    while *pc < pattern.len() && pattern[*pc] != b']' {
        if pattern[*pc] == b'\\' && *pc + 1 < pattern.len() && (pattern[*pc + 1] as char).is_alphabetic()
        {
            *pc += 1;
            if char_property(pattern, pc, ch) {
                in_class = true;
            }
            continue;
        }
        let c1 = literal_char(pattern, pc);
        if *pc < pattern.len() && pattern[*pc] == b'-' {
            *pc += 1;
            let c2 = literal_char(pattern, pc);
            if ch >= c1 && ch <= c2 {
                in_class = true;
            }
        } else if ch == c1 {
            in_class = true;
        }
    }
    if *pc < pattern.len() && pattern[*pc] == b']' {
        *pc += 1;
    }
    if negated {
        !in_class
    } else {
        in_class
    }
}

/// Match the single pattern byte at `pc` as a literal character against
/// the next scalar in `source`, consuming both on success. Exposed for
/// [`Context`] implementations (e.g. Peg's rule dispatch) that need the
/// default "not actually extended" behavior for bytes in
/// [`EXTENDED_BYTES`] other than the one they special-case.
pub(crate) fn match_literal_byte<'s>(pattern: &[u8], pc: &mut usize, source: &mut Source<'s>) -> bool {
    match_literal(pattern, pc, source)
}

fn match_literal<'s>(pattern: &[u8], pc: &mut usize, source: &mut Source<'s>) -> bool {
    if source.at_eof() {
        return false;
    }
    let want = pattern[*pc] as char;
    let mut probe = *source;
    if probe.get_char() == Some(want) {
        *source = probe;
        *pc += 1;
        true
    } else {
        false
    }
}

/// Advance `pc` past one atom without matching it, used to skip a
/// losing alternate or a not-taken repetition tail.
fn skip_atom(pattern: &[u8], pc: &mut usize, ctx: &dyn Context<'_>) {
    if *pc >= pattern.len() {
        return;
    }
    let rc = pattern[*pc];
    *pc += 1;
    match rc {
        b'\\' => {
            *pc -= 1;
            literal_char(pattern, pc);
        }
        b'[' => {
            if *pc < pattern.len() && pattern[*pc] == b'^' {
                *pc += 1;
            }
            while *pc < pattern.len() && pattern[*pc] != b']' {
                literal_char(pattern, pc);
                if *pc < pattern.len() && pattern[*pc] == b'-' {
                    *pc += 1;
                    literal_char(pattern, pc);
                }
            }
            if *pc < pattern.len() && pattern[*pc] == b']' {
                *pc += 1;
            }
        }
        b'(' => {
            while *pc < pattern.len() && pattern[*pc] != b')' {
                skip_atom(pattern, pc, ctx);
            }
            if *pc < pattern.len() {
                *pc += 1;
            }
        }
        b'|' => {
            while *pc < pattern.len() && pattern[*pc] != b'|' && pattern[*pc] != b')' {
                skip_atom(pattern, pc, ctx);
            }
        }
        b'&' | b'!' | b'?' | b'*' | b'+' => {
            skip_atom(pattern, pc, ctx);
        }
        other if EXTENDED_BYTES.contains(&other) || other < b' ' => {
            *pc -= 1;
            ctx.skip_extended(pattern, pc);
        }
        _ => {}
    }
    if *pc < pattern.len() && pattern[*pc] == b':' {
        *pc += 1;
        while *pc < pattern.len() && (pattern[*pc].is_ascii_alphanumeric() || pattern[*pc] == b'_') {
            *pc += 1;
        }
        if *pc < pattern.len() && pattern[*pc] == b':' {
            *pc += 1;
        }
    }
}

const COMPOSITE_OPS: &[u8] = b"?*+(|&!";

/// The heart of the algorithm: match one atom against the current
/// input. On success `pc` has advanced to the next atom and `source`
/// has consumed whatever matched. On failure both are left unmoved and
/// `ctx.record_failure` has been called for terminal atoms.
fn match_atom<'s>(
    pattern: &[u8],
    pc: &mut usize,
    source: &mut Source<'s>,
    ctx: &mut dyn Context<'s>,
) -> bool {
    let initial_captures = ctx.capture_count();
    let start_pc = *pc;
    let start_source = *source;

    let matched = match_atom_inner(pattern, pc, source, ctx, start_pc, start_source);

    if !matched {
        ctx.rollback_capture(initial_captures);
        if *pc < pattern.len() || start_pc < pattern.len() {
            let rc = pattern[start_pc];
            if !COMPOSITE_OPS.contains(&rc) {
                ctx.record_failure(start_pc, *pc, start_source);
            }
        }
        *pc = start_pc;
        *source = start_source;
        return false;
    }

    // Detect and consume a `:name:` label.
    if *pc < pattern.len() && pattern[*pc] == b':' {
        let name_start = *pc + 1;
        let mut name_end = name_start;
        while name_end < pattern.len()
            && (pattern[name_end].is_ascii_alphanumeric() || pattern[name_end] == b'_')
        {
            name_end += 1;
        }
        *pc = name_end;
        if *pc < pattern.len() && pattern[*pc] == b':' {
            *pc += 1;
        }
        if !ctx.capture_disabled() {
            let name = std::str::from_utf8(&pattern[name_start..name_end]).unwrap_or("");
            let in_repetition = ctx.repetition_nesting() > 0;
            let end_source = *source;
            // A labeled atom captures its own value: the sub-rule's result
            // for a `<rule>` call, or the matched slice for anything else.
            // The rule-level aggregate is only built at rule exit (see
            // `parse_here_at`), never here.
            let was_extended =
                EXTENDED_BYTES.contains(&pattern[start_pc]) || pattern[start_pc] < b' ';
            let m = was_extended
                .then(|| ctx.extended_match())
                .flatten()
                .unwrap_or_else(|| {
                    Match::success(
                        Variant::string(start_source.slice_to(&end_source)),
                        start_source,
                        end_source,
                    )
                });
            ctx.capture(name, m, in_repetition);
        }
    }
    true
}

fn match_atom_inner<'s>(
    pattern: &[u8],
    pc: &mut usize,
    source: &mut Source<'s>,
    ctx: &mut dyn Context<'s>,
    start_pc: usize,
    start_source: Source<'s>,
) -> bool {
    if *pc >= pattern.len() {
        return true; // end of expression: match nothing
    }
    let rc = pattern[*pc];
    *pc += 1;
    match rc {
        b')' => true,
        b'^' => source.at_bol(),
        b'$' => {
            let mut probe = *source;
            probe.at_eof() || probe.get_char() == Some('\n')
        }
        b'.' => {
            if source.at_eof() {
                false
            } else {
                source.get_char();
                true
            }
        }
        b'\\' => {
            if source.at_eof() {
                false
            } else {
                let mut probe = *source;
                let ch = probe.get_char().unwrap();
                if char_property(pattern, pc, ch) {
                    *source = probe;
                    true
                } else {
                    false
                }
            }
        }
        b'[' => char_class(pattern, pc, source),
        b'?' | b'*' | b'+' => match_repetition(rc, pattern, pc, source, ctx),
        b'(' => {
            if match_sequence(pattern, pc, source, ctx) {
                if *pc < pattern.len() {
                    *pc += 1; // skip ')'
                }
                true
            } else {
                false
            }
        }
        b'|' => match_alternates(pattern, pc, source, ctx, start_pc),
        b'&' | b'!' => {
            ctx.enter_lookahead();
            let mut probe = *source;
            let mut sub_pc = *pc;
            let inner_matched = match_atom(pattern, &mut sub_pc, &mut probe, ctx);
            ctx.leave_lookahead();
            let assertion_matched = if rc == b'!' { !inner_matched } else { inner_matched };
            // The atom's end position in the pattern is needed whether or
            // not it matched (a failed match_atom resets its own `pc`).
            let mut end_pc = *pc;
            skip_atom(pattern, &mut end_pc, ctx);
            if assertion_matched {
                *pc = end_pc;
            }
            assertion_matched
        }
        other if EXTENDED_BYTES.contains(&other) || other < b' ' => {
            *pc -= 1;
            ctx.match_extended(pattern, pc, source)
        }
        _ => {
            if source.at_eof() {
                false
            } else {
                let mut probe = *source;
                if probe.get_char() == Some(rc as char) {
                    *source = probe;
                    true
                } else {
                    false
                }
            }
        }
    }
}

/// `?A` `*A` `+A`: possessive repetition of the single atom starting at
/// `pc` (after the quantifier byte has been consumed).
fn match_repetition<'s>(
    rc: u8,
    pattern: &[u8],
    pc: &mut usize,
    source: &mut Source<'s>,
    ctx: &mut dyn Context<'s>,
) -> bool {
    let min = if rc == b'+' { 1 } else { 0 };
    let max = if rc == b'?' { 1 } else { 0 }; // 0 means unbounded
    let repeat_pc = *pc;
    let mut repetitions = 0;

    if max != 1 {
        ctx.enter_repetition();
    }

    let mut ok = true;
    while repetitions < min {
        *pc = repeat_pc;
        if !match_atom(pattern, pc, source, ctx) {
            ok = false;
            break;
        }
        repetitions += 1;
    }

    if ok {
        loop {
            if max != 0 && repetitions >= max {
                break;
            }
            let iteration_captures = ctx.capture_count();
            let iteration_start = *source;
            *pc = repeat_pc;
            if !match_atom(pattern, pc, source, ctx) {
                ctx.rollback_capture(iteration_captures);
                skip_atom(pattern, pc, ctx);
                break;
            }
            if source.same(&iteration_start) {
                break; // no progress: avoid looping on e.g. *()
            }
            repetitions += 1;
        }
    }

    if max != 1 {
        ctx.leave_repetition();
    }

    if !ok {
        // Minimum repetitions weren't met: restore pc past the atom we
        // were trying to repeat so the caller can continue parsing.
        *pc = repeat_pc;
        skip_atom(pattern, pc, ctx);
        return false;
    }
    true
}

/// `|A|B|...`: ordered choice. `start_pc` is the position of the `|`
/// byte that triggered this call (already consumed from `pc`).
fn match_alternates<'s>(
    pattern: &[u8],
    pc: &mut usize,
    source: &mut Source<'s>,
    ctx: &mut dyn Context<'s>,
    start_pc: usize,
) -> bool {
    let initial_captures = ctx.capture_count();
    let mut next_alternate = start_pc; // points at the '|' byte
    loop {
        if next_alternate >= pattern.len() || pattern[next_alternate] != b'|' {
            break;
        }
        let mut cursor = next_alternate + 1;
        let alternate_start_source = *source;
        let mut matched;
        loop {
            matched = match_atom(pattern, &mut cursor, source, ctx);
            if !matched {
                break;
            }
            if at_expr_end(pattern, cursor) || pattern[cursor] == b'|' {
                break;
            }
        }
        if matched {
            *pc = cursor;
            while *pc < pattern.len() && pattern[*pc] == b'|' {
                skip_atom(pattern, pc, ctx);
            }
            return true;
        }
        *source = alternate_start_source;
        ctx.rollback_capture(initial_captures);
        let mut skip_pc = next_alternate;
        skip_atom(pattern, &mut skip_pc, ctx);
        next_alternate = skip_pc;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(pattern: &str, input: &str) -> (bool, usize, usize) {
        let mut source = Source::new(input.as_bytes());
        let mut ctx = NullContext::default();
        let m = Pegexp::new(pattern).parse(&mut source, &mut ctx);
        if m.variant.is_none() {
            (false, 0, 0)
        } else {
            (true, m.from.position(), m.to.position())
        }
    }

    #[test]
    fn s1_literal_search() {
        let (ok, from, to) = run("abc", "xabcy");
        assert!(ok);
        assert_eq!((from, to), (1, 4));
    }

    #[test]
    fn s3_possessive_star() {
        let mut source = Source::new(b"aaab");
        let mut ctx = NullContext::default();
        let m = Pegexp::new("*a").parse_here(&mut source, &mut ctx);
        assert!(!m.variant.is_none());
        assert_eq!(source.position(), 3);
    }

    #[test]
    fn s4_negative_lookahead_fails() {
        let mut source = Source::new(b"ab");
        let mut ctx = NullContext::default();
        let m = Pegexp::new("!(ab).*").parse_here(&mut source, &mut ctx);
        assert!(m.variant.is_none());
    }

    #[test]
    fn anchor_caret_dollar() {
        assert!(run("^abc$", "abc").0);
        assert!(!run("^abc$", "xabc").0);
    }

    #[test]
    fn character_class_range_and_negation() {
        assert!(run("[a-c]", "b").0);
        assert!(!run("[^a-c]", "b").0);
        assert!(run("[^a-c]", "z").0);
    }

    #[test]
    fn alternation_picks_first_match() {
        let (ok, from, to) = run("|ab|a", "ab");
        assert!(ok);
        assert_eq!((from, to), (0, 2));
    }

    #[test]
    fn possessive_repetition_does_not_backtrack() {
        // `*a` followed by a literal `a` can never succeed: the star is
        // possessive and will not give back the last `a` it consumed.
        let (ok, _, _) = run("*aa", "aaa");
        assert!(!ok);
    }

    #[test]
    fn group_and_quantifier() {
        assert!(run("+(ab)", "ababab").0);
    }

    #[test]
    fn escape_properties() {
        assert!(run("\\d", "5").0);
        assert!(!run("\\d", "x").0);
        assert!(run("\\w", "x").0);
    }
}
