// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Px: a parser for the grammar-description language of spec.md §6.4,
//! bootstrapped over [`crate::peg`] against the hand-written rule table
//! in [`bootstrap`] — "the Px parser is itself bootstrapped using the
//! Peg runner against a hand-written rule table" (spec.md §1), ported
//! from `original_source/px/px_pegexp.cpp` and `px/px.cpp`.
//!
//! This is a parser, not a code generator: [`compile`] lowers grammar
//! source text straight into a [`crate::peg::RuleTable`], the same
//! data shape the runtime `Peg` consumes, rather than emitting source
//! text for some other target language (that tree-walk is explicitly
//! out of scope, per spec.md §1).

pub mod bootstrap;

use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::peg::{Peg, Rule, RuleTable};
use crate::variant::Variant;

/// One rule definition as parsed but not yet lowered: its name and the
/// unlowered `alternates` parse-tree node. Mirrors spec.md §3.10's
/// `px::RawRule`; `params` is kept only for informational purposes (the
/// `-> function: params` action clause), since code generation that
/// would consume it is out of scope.
#[derive(Clone, Debug)]
pub struct RawRule {
    pub name: String,
    pub alternates: Variant,
    pub params: Vec<String>,
}

/// The parsed-but-not-lowered form of a whole grammar source file.
#[derive(Clone, Debug, Default)]
pub struct GrammarSource {
    pub rules: Vec<RawRule>,
}

/// Parse `text` as Px grammar source (spec.md §6.4), producing the raw
/// parse tree for each rule definition without yet assembling pegexp
/// pattern strings.
pub fn parse_grammar(text: &str) -> Result<GrammarSource> {
    let bootstrap_rules = bootstrap::rules();
    let peg = Peg::new(&bootstrap_rules);
    let result = peg.parse(text.as_bytes())?;

    if !result.succeeded() {
        let mut message = String::from("unexpected input");
        if !result.failures.is_empty() {
            message.push_str("; expected one of: ");
            let atoms: Vec<&str> = result.failures.iter().map(|f| f.atom.as_str()).collect();
            message.push_str(&atoms.join(", "));
        }
        return Err(Error::GrammarSyntax {
            message,
            offset: result.furthermost.position(),
        });
    }

    let top = result.value.as_map().ok_or_else(|| Error::GrammarSyntax {
        message: "grammar produced no rules".to_string(),
        offset: 0,
    })?;

    let raw_rules = match top.get("rule") {
        Some(Variant::Array(items)) => items.to_vec(),
        Some(single) => vec![single.clone()],
        None => Vec::new(),
    };

    let mut rules = Vec::with_capacity(raw_rules.len());
    for raw in raw_rules {
        let map = raw.as_map().ok_or_else(|| Error::GrammarSyntax {
            message: "malformed rule node in parse tree".to_string(),
            offset: 0,
        })?;
        let name = map
            .get("name")
            .and_then(Variant::as_str)
            .ok_or_else(|| Error::GrammarSyntax {
                message: "rule with no name".to_string(),
                offset: 0,
            })?
            .to_string();
        let alternates = map.get("alternates").cloned().unwrap_or(Variant::None);
        let params = action_params(map.get("action"));
        rules.push(RawRule {
            name,
            alternates,
            params,
        });
    }

    Ok(GrammarSource { rules })
}

/// Extract the bare parameter names from an optional `action` node, for
/// informational purposes only (see [`RawRule::params`]).
fn action_params(action: Option<&Variant>) -> Vec<String> {
    let action = match action {
        Some(a) if !a.is_none() => a,
        _ => return Vec::new(),
    };
    let map = match action.as_map() {
        Some(m) => m,
        None => return Vec::new(),
    };
    let mut out = Vec::new();
    let params = match map.get("parameter") {
        Some(Variant::Array(items)) => items.to_vec(),
        Some(single) => vec![single.clone()],
        None => Vec::new(),
    };
    for p in params {
        if let Some(s) = p.as_str() {
            out.push(s.to_string());
        } else if let Some(m) = p.as_map() {
            if let Some(Variant::Array(names)) = m.get("name") {
                let joined: Vec<String> = names
                    .iter()
                    .filter_map(|n| n.as_str().map(str::to_string))
                    .collect();
                out.push(joined.join("."));
            } else if let Some(s) = m.get("name").and_then(Variant::as_str) {
                out.push(s.to_string());
            }
        }
    }
    out
}

/// Assemble a [`RuleTable`] from a parsed [`GrammarSource`], checking
/// every called rule is defined (fatal) and logging a warning for any
/// defined rule that nothing calls (advisory) — spec.md §7's two Px
/// diagnostics, ported from `px.cpp`'s `check_rules`.
pub fn lower(source: &GrammarSource) -> Result<RuleTable> {
    let mut rules = Vec::with_capacity(source.rules.len());
    let mut defined = BTreeSet::new();
    let mut called = BTreeSet::new();

    for raw in &source.rules {
        defined.insert(raw.name.clone());
        collect_calls(&raw.alternates, &mut called);
        let pattern = lower::generate_alternates(&raw.alternates)?;
        rules.push(Rule::new(raw.name.clone(), pattern));
    }

    for name in &called {
        if !defined.contains(name) {
            return Err(Error::RuleNotDefined { name: name.clone() });
        }
    }
    for name in &defined {
        if name != "TOP" && !called.contains(name) {
            log::warn!("rule `{}` is defined but not called", name);
        }
    }

    RuleTable::new(rules)
}

/// Parse and lower in one step: Px grammar source text straight to a
/// runtime [`RuleTable`].
pub fn compile(text: &str) -> Result<RuleTable> {
    lower(&parse_grammar(text)?)
}

/// Walk a parse-tree node collecting every `call` leaf (a grammar rule
/// reference), regardless of where it's nested. Grounded in
/// `px.cpp`'s `accumulate_called_rules`, generalized: rather than
/// hand-matching each node type that can contain an atom, this walks
/// every map value and array element, which is equivalent since `call`
/// is the only node type this tree ever produces under that key.
fn collect_calls(node: &Variant, out: &mut BTreeSet<String>) {
    match node {
        Variant::Map(m) => {
            for (key, value) in m.iter() {
                if &**key == "call" {
                    if let Some(name) = value.as_str() {
                        out.insert(name.to_string());
                    }
                } else {
                    collect_calls(value, out);
                }
            }
        }
        Variant::Array(items) => {
            for item in items.iter() {
                collect_calls(item, out);
            }
        }
        _ => {}
    }
}

mod lower {
    //! Translate a parsed `alternates`/`sequence`/`repetition`/`atom`
    //! node back into pegexp pattern text. A direct port of
    //! `px_pegexp.cpp`'s `generate_pegexp`/`is_single_atom`/
    //! `generate_literal`, minus the C++ version's final step of
    //! escaping the result into a target language's string-literal
    //! syntax (out of scope — see module docs).

    use crate::error::{Error, Result};
    use crate::variant::Variant;

    /// Every byte `pegexp` treats specially outside a character class.
    /// A literal occurrence of one of these in source text needs a
    /// backslash in front of it to be matched literally.
    const PEGEXP_SPECIAL: &str = "^$.\\[]?*+{()}|&!~@#%_;<`:";

    /// A rule's `alternates` field: either a single `sequence`-shaped
    /// map (no bar was present) or an array of them (one per `|`).
    /// Returns the pegexp text for the whole thing, unparenthesized.
    pub(super) fn generate_alternates(field: &Variant) -> Result<String> {
        let seqs = sequence_list(field);
        let mut parts = Vec::with_capacity(seqs.len());
        for seq in &seqs {
            parts.push(generate_node(seq)?);
        }
        Ok(if parts.len() <= 1 {
            parts.into_iter().next().unwrap_or_default()
        } else {
            parts
                .into_iter()
                .map(|p| format!("|{}", p))
                .collect::<String>()
        })
    }

    /// Extract the list of `sequence` values from an `alternates` map
    /// (`{"sequence": X}`, where `X` is a single sequence map or an
    /// array of them).
    fn sequence_list(field: &Variant) -> Vec<Variant> {
        match field.as_map().and_then(|m| m.get("sequence")) {
            Some(Variant::Array(items)) => items.to_vec(),
            Some(single) => vec![single.clone()],
            None => Vec::new(),
        }
    }

    /// True when `atom`'s generated text never needs parenthesizing
    /// before a repetition prefix is glued onto it — a bare rule call,
    /// a single literal character, a character class, an existing
    /// group, `.`, or a property, but not a multi-character literal or
    /// a bare (unparenthesized) sequence.
    fn is_single_atom(atom: &Variant) -> bool {
        match atom {
            Variant::Map(m) if m.len() == 1 => {
                let (key, value) = m.iter().next().expect("len() == 1");
                match &**key {
                    "literal" => value.as_str().map(|s| s.chars().count() <= 1).unwrap_or(true),
                    "sequence" => false,
                    _ => true,
                }
            }
            Variant::Array(_) => false,
            _ => true,
        }
    }

    fn generate_node(node: &Variant) -> Result<String> {
        match node {
            Variant::Map(m) => {
                let (node_type, element) = match m.iter().next() {
                    Some(pair) => pair,
                    None => return Ok(String::new()),
                };
                match &**node_type {
                    "sequence" => generate_node(element),
                    "repetition" => generate_repetition(element),
                    "group" => {
                        let alternates = element
                            .as_map()
                            .and_then(|m| m.get("alternates"))
                            .cloned()
                            .unwrap_or(Variant::None);
                        Ok(format!("({})", generate_alternates(&alternates)?))
                    }
                    "any" => Ok(".".to_string()),
                    "call" => Ok(format!("<{}>", element.as_str().unwrap_or(""))),
                    "property" => Ok(format!("\\{}", element.as_str().unwrap_or(""))),
                    "literal" => Ok(escape(element.as_str().unwrap_or(""), false)),
                    "class" => Ok(format!(
                        "[{}]",
                        // A class body never needs its specials
                        // backslashed (`]`/`-`/`\` are already escaped
                        // by the caller if meant literally, since the
                        // grammar that captured this text disallows a
                        // bare one) — only non-ASCII still needs it.
                        escape(element.as_str().unwrap_or(""), true)
                    )),
                    other => Err(Error::GrammarSyntax {
                        message: format!("unrecognised atom node `{}`", other),
                        offset: 0,
                    }),
                }
            }
            Variant::Array(items) => {
                let mut parts = Vec::with_capacity(items.len());
                for item in items.iter() {
                    parts.push(generate_node(item)?);
                }
                Ok(parts.into_iter().map(|p| format!("|{}", p)).collect())
            }
            Variant::None => Ok(String::new()),
            _ => Ok(String::new()),
        }
    }

    /// `element` is the array of per-atom records captured by
    /// `sequence`'s `repetition` label: each has `atom`, an optional
    /// `repeat_count`, and an optional `label`.
    fn generate_repetition(element: &Variant) -> Result<String> {
        let items: Vec<Variant> = match element {
            Variant::Array(a) => a.to_vec(),
            other => vec![other.clone()],
        };
        let mut out = String::new();
        for item in items {
            let rep = item.as_map().ok_or_else(|| Error::GrammarSyntax {
                message: "malformed repetition node".to_string(),
                offset: 0,
            })?;
            let atom = rep.get("atom").cloned().unwrap_or(Variant::None);
            let repeat_count = rep.get("repeat_count").filter(|v| !v.is_none());
            let single = is_single_atom(&atom);

            if let Some(rc) = repeat_count {
                let prefix = repeat_prefix(rc)?;
                let atom_text = generate_node(&atom)?;
                match prefix {
                    Prefix::Op(op) => {
                        if !single {
                            out.push(op);
                            out.push('(');
                            out.push_str(&atom_text);
                            out.push(')');
                        } else {
                            out.push(op);
                            out.push_str(&atom_text);
                        }
                    }
                    Prefix::Count(n) => {
                        // Pegexp has no counted-repetition operator;
                        // unroll `{n}` into n possessive copies of the
                        // atom, parenthesized if it isn't a bare atom.
                        let wrapped = if single {
                            atom_text.clone()
                        } else {
                            format!("({})", atom_text)
                        };
                        for _ in 0..n {
                            out.push_str(&wrapped);
                        }
                    }
                }
            } else {
                out.push_str(&generate_node(&atom)?);
            }

            if let Some(label) = rep.get("label").filter(|v| !v.is_none()) {
                let name = label
                    .as_map()
                    .and_then(|m| m.get("name"))
                    .and_then(Variant::as_str)
                    .unwrap_or("");
                out.push(':');
                out.push_str(name);
                out.push(':');
            }
        }
        Ok(out)
    }

    enum Prefix {
        Op(char),
        Count(u32),
    }

    /// A `repeat_count` node's `limit` field: either one of `? * + ! &`
    /// (a single character) or a `count` node (`{min,max}` syntax, only
    /// the `{N}` literal-count form is supported — see module docs).
    fn repeat_prefix(node: &Variant) -> Result<Prefix> {
        let limit = node
            .as_map()
            .and_then(|m| m.get("limit"))
            .ok_or_else(|| Error::GrammarSyntax {
                message: "repeat_count with no limit".to_string(),
                offset: 0,
            })?;
        match limit {
            Variant::String(s) if s.chars().count() == 1 => {
                Ok(Prefix::Op(s.chars().next().unwrap()))
            }
            Variant::Map(_) => {
                let val = limit
                    .as_map()
                    .and_then(|m| m.get("val"))
                    .ok_or_else(|| Error::GrammarSyntax {
                        message: "count with no value".to_string(),
                        offset: 0,
                    })?;
                let text = val.as_str().unwrap_or("");
                if text.chars().all(|c| c.is_ascii_digit()) && !text.is_empty() {
                    let n: u32 = text.parse().map_err(|_| Error::GrammarSyntax {
                        message: format!("repeat count `{}` out of range", text),
                        offset: 0,
                    })?;
                    Ok(Prefix::Count(n))
                } else {
                    Err(Error::GrammarSyntax {
                        message: format!("named repeat count `{{{}}}` is not supported", text),
                        offset: 0,
                    })
                }
            }
            _ => Err(Error::GrammarSyntax {
                message: "malformed repeat limit".to_string(),
                offset: 0,
            }),
        }
    }

    /// Escape a literal/class body captured straight from grammar
    /// source text into valid pegexp pattern text. Pegexp (like Px)
    /// only accepts printable ASCII, so anything outside that range
    /// becomes a `\n`/`\t`/.../`\xHH`/`\uHHHH`/`\u{H+}` escape; an
    /// already-backslashed printable character is passed through
    /// unchanged (both languages agree on that syntax); a bare
    /// character that's special to pegexp but wasn't to Px gets a
    /// backslash added, unless `leave_specials` is set (a class body
    /// never needs pegexp's outside-a-class specials escaped).
    fn escape(text: &str, leave_specials: bool) -> String {
        let mut out = String::new();
        let mut chars = text.chars().peekable();
        while let Some(mut c) = chars.next() {
            if c == '\\' {
                if let Some(next) = chars.next() {
                    if is_printable_ascii(next) {
                        out.push('\\');
                        out.push(next);
                        continue;
                    }
                    // An escaped non-printable character: the
                    // backslash carries no information pegexp needs,
                    // so drop it and fall through to re-encode `next`.
                    c = next;
                } else {
                    out.push('\\');
                    continue;
                }
            }
            if !is_printable_ascii(c) {
                push_escaped(&mut out, c);
            } else if !leave_specials && PEGEXP_SPECIAL.contains(c) {
                out.push('\\');
                out.push(c);
            } else {
                out.push(c);
            }
        }
        out
    }

    fn is_printable_ascii(c: char) -> bool {
        (' '..='~').contains(&c)
    }

    fn push_escaped(out: &mut String, c: char) {
        let code = c as u32;
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            _ if code <= 0xFF => out.push_str(&format!("\\x{:02X}", code)),
            _ if code <= 0xFFFF => out.push_str(&format!("\\u{:04X}", code)),
            _ => out.push_str(&format!("\\u{{{:X}}}", code)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_single_rule_grammar() {
        let table = compile("TOP = 'a'\n\n").unwrap();
        let peg = Peg::new(&table);
        let result = peg.parse(b"a").unwrap();
        assert!(result.succeeded());
    }

    #[test]
    fn compiles_rule_call_and_label() {
        let table = compile("TOP = digit:d:\n\ndigit = [0-9]\n\n").unwrap();
        let peg = Peg::new(&table);
        let result = peg.parse(b"7").unwrap();
        assert!(result.succeeded());
        let map = result.value.as_map().unwrap();
        assert_eq!(map.get("d").unwrap().as_str(), Some("7"));
    }

    #[test]
    fn compiles_repetition_and_alternation() {
        let table = compile("TOP = +(digit:d:)\n\ndigit = [0-9]|[a-f]\n\n").unwrap();
        let peg = Peg::new(&table);
        let result = peg.parse(b"1a2").unwrap();
        assert!(result.succeeded());
        let map = result.value.as_map().unwrap();
        assert_eq!(map.get("d").unwrap().as_array().unwrap().len(), 3);
    }

    #[test]
    fn rejects_call_to_undefined_rule() {
        let err = compile("TOP = missing\n\n").unwrap_err();
        assert!(matches!(err, Error::RuleNotDefined { name } if name == "missing"));
    }

    #[test]
    fn rejects_malformed_grammar_text() {
        // A rule name may not start with a digit, so `TOP` is never
        // defined and the whole grammar fails to consume any input.
        let err = compile("123 = 'x'\n\n").unwrap_err();
        assert!(matches!(err, Error::GrammarSyntax { .. }));
    }
}
