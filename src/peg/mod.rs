// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A rule-indexed grammar runner built on top of [`crate::pegexp`]: each
//! rule's body is a Pegexp pattern, rules call each other by name through
//! `<rule>` atoms, and a successful parse aggregates labeled captures into
//! a [`Variant`] tree — one level of map per rule, arrays where a label
//! recurs under a repetition.

use std::rc::Rc;

use crate::pegexp::{Context as PegexpContext, Match as PegexpMatch, Pegexp};
use crate::source::Source;
use crate::variant::{OrderedMap, Variant};

/// One named grammar production: a rule name and the Pegexp pattern text
/// that defines it. Rules call each other with `<name>` atoms; the rule
/// whose body is invoked to start a parse must be named `TOP`.
///
/// `captures` is the set of distinct `:name:` labels declared anywhere in
/// `pattern`, in first-occurrence order; [`Rule::new`] derives it by
/// scanning the pattern text, mirroring the label scan `pegexp` itself
/// does while skipping an atom. Reserved for callers that want to inspect
/// a rule's declared capture names; the runner itself doesn't filter or
/// elide by it.
#[derive(Clone, Debug)]
pub struct Rule {
    pub name: Rc<str>,
    pub pattern: Rc<str>,
    pub captures: Vec<Rc<str>>,
}

impl Rule {
    pub fn new(name: impl Into<Rc<str>>, pattern: impl Into<Rc<str>>) -> Self {
        let pattern = pattern.into();
        let captures = declared_captures(&pattern);
        Rule {
            name: name.into(),
            pattern,
            captures,
        }
    }
}

/// Scan `pattern` for `:name:` labels, returning the distinct names in
/// first-occurrence order.
fn declared_captures(pattern: &str) -> Vec<Rc<str>> {
    let bytes = pattern.as_bytes();
    let mut names = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b':' {
            let start = i + 1;
            let mut end = start;
            while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_') {
                end += 1;
            }
            if end > start {
                let name: Rc<str> = Rc::from(&pattern[start..end]);
                if !names.contains(&name) {
                    names.push(name);
                }
                i = end;
                continue;
            }
        }
        i += 1;
    }
    names
}

/// A set of rules, sorted and binary-searchable by name, ready to drive
/// a parse. Construct with [`RuleTable::new`]; `TOP` is looked up lazily
/// at parse time, so an empty or TOP-less table only fails when asked to
/// parse, not at construction.
#[derive(Clone, Debug)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    /// Build a table from `rules`, sorting them by name for lookup.
    /// Fails if two rules share a name.
    pub fn new(mut rules: Vec<Rule>) -> crate::error::Result<Self> {
        rules.sort_by(|a, b| a.name.cmp(&b.name));
        for pair in rules.windows(2) {
            if pair[0].name == pair[1].name {
                return Err(crate::error::Error::DuplicateRuleName {
                    name: pair[0].name.to_string(),
                });
            }
        }
        Ok(RuleTable { rules })
    }

    pub fn lookup(&self, name: &str) -> Option<usize> {
        self.rules
            .binary_search_by(|rule| rule.name.as_ref().cmp(name))
            .ok()
    }

    pub fn rule(&self, index: usize) -> &Rule {
        &self.rules[index]
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Per-rule-invocation capture state: one of these exists for every
/// `<rule>` call on the stack, plus one for the top-level parse.
struct Frame {
    ast: OrderedMap,
    num_captures: usize,
    capture_disabled: usize,
    repetition_nesting: usize,
}

impl Frame {
    fn new(capture_disabled: usize) -> Self {
        Frame {
            ast: OrderedMap::new(),
            num_captures: 0,
            capture_disabled,
            repetition_nesting: 0,
        }
    }
}

/// One attempted-and-failed terminal atom, recorded at the furthermost
/// point reached in the source, for diagnostics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Failure {
    pub rule: Rc<str>,
    pub atom: String,
}

/// The outcome of [`Peg::parse`].
#[derive(Clone, Debug)]
pub struct ParseResult<'s> {
    /// The captured AST, or `Variant::None` if the top rule failed to
    /// match at all.
    pub value: Variant,
    /// How far into the source the parse got before it could go no
    /// further — equal to the end of the match on success.
    pub furthermost: Source<'s>,
    /// Every distinct terminal atom that was tried and failed at
    /// `furthermost`, across the whole parse.
    pub failures: Vec<Failure>,
}

impl<'s> ParseResult<'s> {
    pub fn succeeded(&self) -> bool {
        !self.value.is_none()
    }
}

/// Drives a parse against a [`RuleTable`]: rule dispatch, left-recursion
/// detection, and furthermost-failure tracking all live here rather than
/// on any one [`Frame`], since they apply across the whole call stack.
pub struct Peg<'g> {
    rules: &'g RuleTable,
}

impl<'g> Peg<'g> {
    pub fn new(rules: &'g RuleTable) -> Self {
        Peg { rules }
    }

    /// Parse `text` starting from the `TOP` rule.
    pub fn parse<'s>(&self, text: &'s [u8]) -> crate::error::Result<ParseResult<'s>> {
        let top = self
            .rules
            .lookup("TOP")
            .ok_or(crate::error::Error::NoTopRule)?;
        let mut source = Source::new(text);
        let mut run = Run {
            rules: self.rules,
            call_stack: Vec::new(),
            frames: vec![Frame::new(0)],
            furthermost: source,
            failures: Vec::new(),
            pending_call_match: None,
        };
        run.call_stack.push((top, source));
        let pattern = self.rules.rule(top).pattern.clone();
        let m = Pegexp::new(&pattern).parse_here(&mut source, &mut run);
        run.call_stack.pop();

        Ok(ParseResult {
            value: m.variant,
            furthermost: run.furthermost,
            failures: run.failures,
        })
    }
}

/// Implementation detail of [`Peg::parse`]: owns the call stack, the
/// capture-frame stack, and the root furthermost-failure state, and
/// implements [`PegexpContext`] so a [`Pegexp`] can drive it directly.
struct Run<'g, 's> {
    rules: &'g RuleTable,
    call_stack: Vec<(usize, Source<'s>)>,
    frames: Vec<Frame>,
    furthermost: Source<'s>,
    failures: Vec<Failure>,
    /// The result of the most recent successful `<rule>` call, held here
    /// just long enough for the label that follows it (if any) to collect
    /// it in place of re-slicing the matched text.
    pending_call_match: Option<PegexpMatch<'s>>,
}

impl<'g, 's> Run<'g, 's> {
    fn frame(&mut self) -> &mut Frame {
        self.frames.last_mut().expect("at least one frame")
    }

    fn current_rule_name(&self) -> Rc<str> {
        self.call_stack
            .last()
            .map(|(idx, _)| self.rules.rule(*idx).name.clone())
            .unwrap_or_else(|| Rc::from(""))
    }
}

impl<'g, 's> PegexpContext<'s> for Run<'g, 's> {
    fn capture_count(&self) -> usize {
        self.frames.last().map(|f| f.num_captures).unwrap_or(0)
    }

    fn capture(&mut self, name: &str, m: PegexpMatch<'s>, in_repetition: bool) {
        // An empty string capture carries no information; dropping it
        // here (rather than on the caller's side) matches every label
        // site, including rule-call results.
        if let Variant::String(ref s) = m.variant {
            if s.is_empty() {
                return;
            }
        }
        let key: Rc<str> = Rc::from(name);
        let frame = self.frame();
        if let Some(existing) = frame.ast.get(&key).cloned() {
            frame.ast.insert(key, existing.push_or_wrap(m.variant));
        } else {
            let value = if in_repetition {
                Variant::array(vec![m.variant])
            } else {
                m.variant
            };
            frame.ast.insert(key, value);
        }
        frame.num_captures += 1;
    }

    fn rollback_capture(&mut self, count: usize) {
        let frame = self.frame();
        if count >= frame.num_captures {
            return;
        }
        if count == 0 {
            frame.ast.clear();
            frame.num_captures = 0;
        }
        // Partial rollback to a nonzero count is not supported: the
        // grammar forms that would need it (labels nested inside a
        // failing alternate) don't arise from a well-formed rule body.
    }

    fn record_failure(&mut self, atom_start: usize, atom_end: usize, location: Source<'s>) {
        if location < self.furthermost {
            return;
        }
        if self.frame().capture_disabled > 0 {
            return;
        }
        if self.furthermost < location {
            self.failures.clear();
        }
        let rule = self.current_rule_name();
        let atom = rule_pattern_slice(self, atom_start, atom_end);
        if self.failures.iter().any(|f| f.rule == rule && f.atom == atom) {
            return;
        }
        self.furthermost = location;
        self.failures.push(Failure { rule, atom });
    }

    fn match_result(&mut self, from: Source<'s>, to: Source<'s>) -> PegexpMatch<'s> {
        let frame = self.frame();
        if frame.num_captures > 0 {
            let ast = std::mem::take(&mut frame.ast);
            PegexpMatch {
                variant: Variant::map(ast),
                from,
                to,
            }
        } else {
            PegexpMatch {
                variant: Variant::string(from.slice_to(&to)),
                from,
                to,
            }
        }
    }

    fn extended_match(&mut self) -> Option<PegexpMatch<'s>> {
        self.pending_call_match.take()
    }

    fn capture_disabled(&self) -> bool {
        self.frames.last().map(|f| f.capture_disabled > 0).unwrap_or(false)
    }

    fn enter_lookahead(&mut self) {
        self.frame().capture_disabled += 1;
    }

    fn leave_lookahead(&mut self) {
        self.frame().capture_disabled -= 1;
    }

    fn repetition_nesting(&self) -> usize {
        self.frames.last().map(|f| f.repetition_nesting).unwrap_or(0)
    }

    fn enter_repetition(&mut self) {
        self.frame().repetition_nesting += 1;
    }

    fn leave_repetition(&mut self) {
        self.frame().repetition_nesting -= 1;
    }

    fn match_extended(&mut self, pattern: &[u8], pc: &mut usize, source: &mut Source<'s>) -> bool {
        if pattern[*pc] != b'<' {
            return crate::pegexp::match_literal_byte(pattern, pc, source);
        }

        let name_start = *pc + 1;
        let mut name_end = name_start;
        while name_end < pattern.len() && pattern[name_end] != b'>' {
            name_end += 1;
        }
        let name = std::str::from_utf8(&pattern[name_start..name_end]).unwrap_or("");

        let sub_idx = match self.rules.lookup(name) {
            Some(idx) => idx,
            None => {
                log::warn!("rule `{}` is called but not defined", name);
                return false;
            }
        };

        let origin = *source;
        if self
            .call_stack
            .iter()
            .any(|(idx, at)| *idx == sub_idx && at.same(&origin))
        {
            log::warn!(
                "left recursion detected on rule `{}` at byte {}",
                self.rules.rule(sub_idx).name,
                origin.position()
            );
            return false;
        }

        self.call_stack.push((sub_idx, origin));
        self.frames.push(Frame::new(self.frame_capture_disabled()));

        let sub_pattern = self.rules.rule(sub_idx).pattern.clone();
        let sub_match = Pegexp::new(&sub_pattern).parse_here(source, self);

        self.frames.pop();
        self.call_stack.pop();

        if sub_match.variant.is_none() {
            return false;
        }

        self.pending_call_match = Some(sub_match);
        *pc = if name_end < pattern.len() { name_end + 1 } else { name_end };
        true
    }

    fn skip_extended(&self, pattern: &[u8], pc: &mut usize) {
        if pattern[*pc] == b'<' {
            let mut cursor = *pc + 1;
            while cursor < pattern.len() && pattern[cursor] != b'>' {
                cursor += 1;
            }
            *pc = if cursor < pattern.len() { cursor + 1 } else { cursor };
        } else {
            *pc += 1;
        }
    }
}

impl<'g, 's> Run<'g, 's> {
    fn frame_capture_disabled(&self) -> usize {
        self.frames.last().map(|f| f.capture_disabled).unwrap_or(0)
    }
}

/// Re-slice the pattern text of the rule currently on top of the call
/// stack, for failure reporting. Falls back to an empty string for the
/// (unreachable in practice) case of no active rule.
fn rule_pattern_slice(run: &Run<'_, '_>, start: usize, end: usize) -> String {
    run.call_stack
        .last()
        .map(|(idx, _)| {
            let pattern = &run.rules.rule(*idx).pattern;
            pattern
                .get(start..end.min(pattern.len()))
                .unwrap_or("")
                .to_string()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rules: &[(&str, &str)]) -> RuleTable {
        RuleTable::new(
            rules
                .iter()
                .map(|(n, p)| Rule::new(*n, *p))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn simple_rule_call_captures() {
        let rules = table(&[("TOP", "<word>:w:"), ("word", "+\\w")]);
        let peg = Peg::new(&rules);
        let result = peg.parse(b"hello").unwrap();
        assert!(result.succeeded());
        let map = result.value.as_map().unwrap();
        assert_eq!(map.get("w").unwrap().as_str(), Some("hello"));
    }

    #[test]
    fn repeated_label_becomes_array() {
        let rules = table(&[("TOP", "+(<word>:w: \\s*)"), ("word", "+\\w")]);
        let peg = Peg::new(&rules);
        let result = peg.parse(b"foo bar baz").unwrap();
        assert!(result.succeeded());
        let map = result.value.as_map().unwrap();
        let words = map.get("w").unwrap().as_array().unwrap();
        assert_eq!(words.len(), 3);
    }

    #[test]
    fn missing_top_rule_errors() {
        let rules = table(&[("word", "+\\w")]);
        let peg = Peg::new(&rules);
        assert!(matches!(
            peg.parse(b"x"),
            Err(crate::error::Error::NoTopRule)
        ));
    }

    #[test]
    fn undefined_rule_call_fails_match() {
        let rules = table(&[("TOP", "<missing>")]);
        let peg = Peg::new(&rules);
        let result = peg.parse(b"x").unwrap();
        assert!(!result.succeeded());
    }

    #[test]
    fn left_recursion_is_rejected() {
        let rules = table(&[("TOP", "<TOP>"), ]);
        let peg = Peg::new(&rules);
        let result = peg.parse(b"x").unwrap();
        assert!(!result.succeeded());
    }

    #[test]
    fn multiple_labels_in_one_rule_capture_independently() {
        let rules = table(&[("TOP", "<word>:first:\\s<word>:second:"), ("word", "+\\w")]);
        let peg = Peg::new(&rules);
        let result = peg.parse(b"foo bar").unwrap();
        assert!(result.succeeded());
        let map = result.value.as_map().unwrap();
        assert_eq!(map.get("first").unwrap().as_str(), Some("foo"));
        assert_eq!(map.get("second").unwrap().as_str(), Some("bar"));
    }

    #[test]
    fn furthermost_failure_is_recorded() {
        let rules = table(&[("TOP", "abc")]);
        let peg = Peg::new(&rules);
        let result = peg.parse(b"abx").unwrap();
        assert!(!result.succeeded());
        assert_eq!(result.furthermost.position(), 2);
        assert!(!result.failures.is_empty());
    }
}
