// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A possessive PEG-regular-expression engine ([`pegexp`]), a
//! rule-indexed grammar runner built on top of it ([`peg`]), a
//! byte-coded Thompson-NFA regular expression engine ([`rx`]), and a
//! grammar-description parser bootstrapped over the Peg runner
//! ([`px`]).
//!
//! These are two independent matching stacks that happen to share a
//! crate: `rx` compiles regexes to a compact bytecode and runs them
//! concurrently thread-per-cycle; `pegexp`/`peg` interpret a PEG pattern
//! directly, recursively, against a named rule table. They share no
//! data structures (see `DESIGN.md`'s Open Question notes).
//!
//! ```
//! use pegex::peg::{Peg, Rule, RuleTable};
//!
//! let rules = RuleTable::new(vec![
//!     Rule::new("TOP", "<digits>"),
//!     Rule::new("digits", "+[0-9]"),
//! ]).unwrap();
//! let peg = Peg::new(&rules);
//! let result = peg.parse(b"42x").unwrap();
//! assert!(result.succeeded());
//! ```

pub mod error;
pub mod peg;
pub mod pegexp;
pub mod px;
pub mod rx;
pub mod source;
pub mod variant;

pub use error::{Error, Result};
