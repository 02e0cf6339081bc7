// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! End-to-end scenarios spanning the public API surface of every
//! module: Pegexp matching directly, Peg grammar rules, and the Rx
//! byte-coded regex engine. Each test is independent of the others and
//! of the unit tests living beside the code they exercise.

use pegex::peg::{Peg, Rule, RuleTable};
use pegex::pegexp::{NullContext, Pegexp};
use pegex::rx::{compile, Features, Program};
use pegex::source::Source;

fn table(rules: &[(&str, &str)]) -> RuleTable {
    RuleTable::new(
        rules
            .iter()
            .map(|(name, pattern)| Rule::new(*name, *pattern))
            .collect(),
    )
    .unwrap()
}

fn compiled(pattern: &str) -> Program {
    Program::new(compile(pattern, Features::ALL, Features::NONE).unwrap())
}

#[test]
fn s1_pegexp_literal_search() {
    let mut source = Source::new(b"xabcy");
    let mut ctx = NullContext::default();
    let m = Pegexp::new("abc").parse(&mut source, &mut ctx);
    assert!(!m.variant.is_none());
    assert_eq!((m.from.position(), m.to.position()), (1, 4));
}

#[test]
fn s2_pegexp_alternation_and_label() {
    let rules = table(&[("TOP", "|a:lo:|b:hi:")]);
    let peg = Peg::new(&rules);
    let result = peg.parse(b"b").unwrap();
    assert!(result.succeeded());
    let map = result.value.as_map().unwrap();
    assert!(map.get("lo").is_none());
    assert_eq!(map.get("hi").unwrap().as_str(), Some("b"));
}

#[test]
fn s3_pegexp_possessive_star() {
    let mut source = Source::new(b"aaab");
    let mut ctx = NullContext::default();
    let m = Pegexp::new("*a").parse_here(&mut source, &mut ctx);
    assert!(!m.variant.is_none());
    assert_eq!(source.position(), 3);
}

#[test]
fn s4_pegexp_negative_lookahead_reports_no_failure() {
    // `!` is a composite operator (`COMPOSITE_OPS`): it never calls
    // `record_failure` itself, even when its assertion is what dooms the
    // overall match, and the `(ab)` it asserts against actually matches
    // here — nothing inside the lookahead fails either. So this failure
    // is invisible to furthermost-failure tracking, by design.
    let rules = table(&[("TOP", "!(ab).*")]);
    let peg = Peg::new(&rules);
    let result = peg.parse(b"ab").unwrap();
    assert!(!result.succeeded());
    assert_eq!(result.furthermost.position(), 0);
    assert!(result.failures.is_empty());
}

#[test]
fn s5_peg_rule_call() {
    let rules = table(&[("TOP", "<digits>"), ("digits", "+[0-9]")]);
    let peg = Peg::new(&rules);
    let result = peg.parse(b"42x").unwrap();
    assert!(result.succeeded());
    assert_eq!(result.value.as_str(), Some("42"));
    assert_eq!(result.furthermost.position(), 2);
    assert!(result.failures.iter().any(|f| f.atom.contains("0-9")));
}

#[test]
fn s6_peg_labeled_capture_inside_repetition() {
    let rules = table(&[("TOP", "+<item>:item:"), ("item", "[a-z]")]);
    let peg = Peg::new(&rules);
    let result = peg.parse(b"abc").unwrap();
    assert!(result.succeeded());
    let map = result.value.as_map().unwrap();
    let items = map.get("item").unwrap().as_array().unwrap();
    let strs: Vec<&str> = items.iter().map(|v| v.as_str().unwrap()).collect();
    assert_eq!(strs, vec!["a", "b", "c"]);
}

#[test]
fn s7_regex_compile_and_run() {
    let program = compiled("a(b|c)+d");
    let result = program.match_after(b"xxxabcbd", 0);
    assert!(result.succeeded());
    assert_eq!(result.offset(), 3);
    assert_eq!(result.length(), 5);
    assert_eq!(result.capture(1), Some((6, 7)));
}

#[test]
fn s8_regex_counted_repetition() {
    let program = compiled("a{2,3}");
    let result = program.match_at(b"aaaa", 0);
    assert!(result.succeeded());
    assert_eq!(result.offset(), 0);
    assert_eq!(result.length(), 3);
}

#[test]
fn s9_regex_negative_lookahead() {
    let program = compiled("((?!ac)[a-z])+");
    let result = program.match_at(b"abcdbacd", 0);
    assert!(result.succeeded());
    assert_eq!(result.offset(), 0);
    assert_eq!(result.length(), 5);
}

#[test]
fn s10_regex_duplicate_group_name_rejected() {
    let err = compile("(?<x>a)(?<x>b)", Features::ALL, Features::NONE).unwrap_err();
    assert!(matches!(
        err,
        pegex::Error::DuplicateGroupName { ref name, .. } if name == "x"
    ));
}

#[test]
fn s11_nfa_offsets_survive_a_varint_width_boundary() {
    // The first alternate is long enough that the jump past it needs a
    // two-byte varint offset rather than one; the regex must still
    // compile and match the second alternate correctly.
    let long_branch = "z".repeat(100);
    let pattern = format!("|{}|abc", long_branch);
    let program = compiled(&pattern);
    let result = program.match_at(b"abc", 0);
    assert!(result.succeeded());
    assert_eq!(result.length(), 3);

    let miss = program.match_at(b"zzz", 0);
    assert!(!miss.succeeded());
}

#[test]
fn s12_left_recursion_is_rejected_and_logged() {
    let rules = table(&[("TOP", "|<TOP>a|a")]);
    let peg = Peg::new(&rules);
    let result = peg.parse(b"aaa").unwrap();
    assert!(result.succeeded());
    assert_eq!(result.value.as_str(), Some("a"));
}
