// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Parser for LTL formulas.

use crate::syntax::*;
use codespan_reporting::diagnostic::{Diagnostic, Label};
use peg::{error::ParseError, str::LineCol};

peg::parser! {

grammar parser<'s>(sigma: &'s Sigma) for str {
    rule ident_start() = ['a'..='z' | 'A'..='Z' | '_']
    rule ident_char() = ident_start() / ['0'..='9']

    rule nl() = quiet!{ ['\n' | '\r'] } / expected!("newline")
    rule comment() = "#" [^'\n' | '\r']*
    rule whitespace() = quiet!{ [' ' | '\t'] / nl() / comment() }
    rule word_boundary() = !ident_char()
    rule _ = whitespace()*
    rule __ = word_boundary() _

    rule keyword() = ("wX" / "X" / "Y" / "Z" / "G" / "F" / "O" / "H" /
                      "U" / "R" / "S" / "T" / "true" / "false") word_boundary()

    pub(super) rule ident() -> String
    = !keyword() s:$(quiet!{ident_start() ident_char()*} / expected!("identifier"))
    { s.to_string() }

    pub(super) rule formula() -> Formula = precedence!{
        x:@ _ "->" _ y:(@) { sigma.implies(&x, &y) }
        x:(@) _ "<->" _ y:@ { sigma.iff(&x, &y) }
        --
        x:(@) _ "|" _ y:@ { sigma.or(&x, &y) }
        --
        x:(@) _ "&" _ y:@ { sigma.and(&x, &y) }
        --
        x:@ _ "U" __ y:(@) { sigma.until(&x, &y) }
        x:@ _ "R" __ y:(@) { sigma.release(&x, &y) }
        x:@ _ "S" __ y:(@) { sigma.since(&x, &y) }
        x:@ _ "T" __ y:(@) { sigma.triggered(&x, &y) }
        --
        "!" _ x:@ { sigma.not(&x) }
        "wX" __ x:@ { sigma.weak_next(&x) }
        "X" __ x:@ { sigma.next(&x) }
        "Y" __ x:@ { sigma.yesterday(&x) }
        "Z" __ x:@ { sigma.weak_yesterday(&x) }
        "G" __ x:@ { sigma.always(&x) }
        "F" __ x:@ { sigma.eventually(&x) }
        "O" __ x:@ { sigma.once(&x) }
        "H" __ x:@ { sigma.historically(&x) }
        --
        "true" word_boundary() { sigma.top() }
        "false" word_boundary() { sigma.bottom() }
        s:ident() { sigma.proposition(s) }
        "(" _ f:formula() _ ")" { f }
    }

    pub(super) rule file() -> Formula
    = _ f:formula() _ { f }
}
}

/// Parse a formula, building its nodes in `sigma`.
pub fn parse(sigma: &Sigma, s: &str) -> Result<Formula, ParseError<LineCol>> {
    parser::file(s, sigma)
}

/// Parse a formula that is known to be well-formed (e.g., in tests).
pub fn formula(sigma: &Sigma, s: &str) -> Formula {
    parser::file(s, sigma).expect("formula should parse")
}

/// Convert an opaque FileId and error to a readable `Diagnostic`
pub fn parse_error_diagnostic<FileId>(
    file_id: FileId,
    e: &ParseError<LineCol>,
) -> Diagnostic<FileId> {
    Diagnostic::error()
        .with_message("could not parse formula")
        .with_labels(vec![Label::primary(
            file_id,
            e.location.offset..e.location.offset + 1,
        )
        .with_message(format!("expected {}", e.expected))])
}

#[cfg(test)]
mod tests {
    use super::parser;
    use crate::syntax::*;

    fn ident(s: &str) -> String {
        parser::ident(s, &Sigma::new()).expect("test ident should parse")
    }

    #[test]
    fn test_ident() {
        assert_eq!(&ident("hello"), "hello");
        assert_eq!(&ident("a"), "a");
        assert_eq!(&ident("Xa"), "Xa");
        assert_eq!(&ident("_allowed"), "_allowed");
        assert!(parser::ident("1up", &Sigma::new()).is_err());
        assert!(parser::ident("X", &Sigma::new()).is_err());
        assert!(parser::ident("true", &Sigma::new()).is_err());
    }

    #[test]
    fn test_formula() {
        let sigma = Sigma::new();
        let f = |s: &str| super::formula(&sigma, s);

        let a = sigma.proposition("a");
        let b = sigma.proposition("b");
        assert_eq!(f("a & !b"), sigma.and(&a, &sigma.not(&b)));
        assert_eq!(f("  a U b  "), sigma.until(&a, &b));
        assert_eq!(f("wX a"), sigma.weak_next(&a));
        assert_eq!(f("true | false"), sigma.or(&sigma.top(), &sigma.bottom()));

        // hash-consing makes repeated parses the same node
        assert_eq!(f("G (a -> F b)"), f("G(a->F b)"));

        // & and | associate to the left, -> to the right
        assert_eq!(f("a & b & c"), f("(a & b) & c"));
        assert_ne!(f("a & b & c"), f("a & (b & c)"));
        assert_eq!(f("a -> b -> c"), f("a -> (b -> c)"));
        assert_eq!(f("p U q U r"), f("p U (q U r)"));

        // operators are keywords only at a word boundary
        assert_ne!(f("Xp"), f("X p"));
        assert_eq!(f("X(p)"), f("X p"));

        assert!(super::parse(&sigma, "a &").is_err());
        assert!(super::parse(&sigma, "U a").is_err());
    }

    #[test]
    fn test_precedence() {
        let sigma = Sigma::new();
        let f = |s: &str| super::formula(&sigma, s);

        assert_eq!(f("a | b & c"), f("a | (b & c)"));
        assert_eq!(f("a | b -> c U d"), f("(a | b) -> (c U d)"));
        assert_eq!(f("G p & q"), f("(G p) & q"));
        assert_eq!(f("!p U q"), f("(!p) U q"));
        assert_eq!(f("p U q & r"), f("(p U q) & r"));
        assert_eq!(f("!X p"), f("!(X p)"));
    }

    #[test]
    fn test_comments() {
        let sigma = Sigma::new();
        assert_eq!(
            super::formula(&sigma, "# a contradiction\na & !a # trailing\n"),
            super::formula(&sigma, "a & !a"),
        );
    }
}
