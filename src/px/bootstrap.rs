// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The hand-written rule table for the grammar-description language of
//! spec.md §6.4, i.e. the language Px itself is written in. This is the
//! literal bootstrap: Px's own grammar is parsed by running [`Peg`]
//! over this table, exactly the way [`crate::px`] parses everyone
//! else's grammars by running `Peg` over a table *this* table produced.
//!
//! Every rule here is a close port of the hand-written table in
//! `px_parser.cpp`'s `PxParser::rules[]`. That table declares each
//! rule's retained captures via a separate `const char* foo_captures[]`
//! array rather than inline `:name:` labels, relying on the calling
//! convention that a bare `<rule>` call is captured under the callee's
//! own name whenever the caller's table says so. This crate's `Peg`
//! only does capture-by-explicit-label (see `DESIGN.md`'s "Open
//! Question decisions" on capture elision/filtering), so every rule
//! call that the original's `*_captures` array names is given an
//! explicit `:name:` label here under that same name — same shape,
//! spelled out instead of implied.
//!
//! One deliberate deviation: the original's `TOP` matches exactly one
//! rule definition per call (`"*<space><rule>"`), and its driver
//! (`px.cpp`'s `parse_and_emit`) calls `peg.parse` in a loop, advancing
//! through the source and collecting one `rule` value per call. Here
//! `TOP` wraps `<space><rule>:rule:` in a group and repeats the whole
//! group (`"*(<space><rule>:rule:)"`), so one [`Peg::parse`] call
//! collects every rule definition into a single `rule` array via this
//! crate's repetition-labeling rule, instead of requiring an external
//! resume loop keyed off `furthermost_success` (fragile here, since
//! that cursor is only ever advanced by a recorded failure, not by
//! success).

use crate::peg::{Rule, RuleTable};

pub fn rules() -> RuleTable {
    RuleTable::new(vec![
        Rule::new("EOF", "!."),
        Rule::new("space", "|[ \\t\\r\\n]|//*[^\\n]"),
        Rule::new("blankline", "\\n*[ \\t\\r](|\\n|<EOF>)"),
        Rule::new("s", "*(!<blankline><space>)"),
        Rule::new("TOP", "*(<space><rule>:rule:)*<space><EOF>"),
        Rule::new(
            "rule",
            "<name>:name:<s>=<s><alternates>:alternates:?<action>:action:<blankline>*<space>",
        ),
        Rule::new(
            "action",
            "-><s>?(<name>:function:\\:<s>)<parameter>:parameter:*(,<s><parameter>:parameter:)<s>",
        ),
        Rule::new(
            "parameter",
            "(|<reference>:parameter:|\\'<literal>:parameter:\\')<s>",
        ),
        Rule::new("reference", "<name>:name:<s>*([.*]:joiner:<s><name>:name:)"),
        Rule::new(
            "alternates",
            "|+(\\|<s><sequence>:sequence:)|<sequence>:sequence:",
        ),
        Rule::new("sequence", "*<repetition>:repetition:"),
        Rule::new("repeat_count", "|[?*+!&]:limit:<s>|<count>:limit:"),
        Rule::new("count", "\\{(|(+\\d):val:|<name>:val:)<s>\\}<s>"),
        Rule::new(
            "repetition",
            "?<repeat_count>:repeat_count:<atom>:atom:?<label>:label:<s>",
        ),
        Rule::new("label", "\\:<name>:name:"),
        Rule::new(
            "atom",
            "|\\.:any:|<name>:call:|\\\\<property>:property:|\\'<literal>:literal:\\'|\\[<class>:class:\\]|\\(<group>:group:\\)",
        ),
        Rule::new("group", "<s>+<alternates>:alternates:"),
        Rule::new("name", "[\\a_]*[\\w_]"),
        Rule::new("literal", "*(![\\']<literal_char>)"),
        Rule::new(
            "literal_char",
            "|\\\\(|?[0-3][0-7]?[0-7]|x\\h?\\h|x\\{+\\h\\}|u\\h?\\h?\\h?\\h|u\\{+\\h\\}|[^\\n])|[^\\\\\\n]",
        ),
        Rule::new("property", "[adhswLU]"),
        Rule::new("class", "?\\^?-+<class_part>"),
        Rule::new("class_part", "!\\]<class_char>?(-!\\]<class_char>)"),
        Rule::new("class_char", "![-\\]]<literal_char>"),
    ])
    .expect("bootstrap px grammar rule table has unique rule names")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peg::Peg;

    #[test]
    fn bootstrap_parses_one_trivial_rule() {
        let rules = rules();
        let peg = Peg::new(&rules);
        let result = peg.parse(b"TOP = 'x'\n\n").unwrap();
        assert!(result.succeeded());
        let map = result.value.as_map().unwrap();
        assert!(map.get("rule").is_some());
    }

    #[test]
    fn bootstrap_parses_rule_call_and_label() {
        let rules = rules();
        let peg = Peg::new(&rules);
        let result = peg.parse(b"TOP = digit:d:\n\n").unwrap();
        assert!(result.succeeded());
    }
}
