// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Print formulas in the concrete syntax accepted by [`crate::parser`].

use std::fmt::{self, Write};

use crate::syntax::*;

fn precedence(f: &Formula) -> usize {
    use crate::syntax::{BinaryOp::*, FormulaKind::*};

    match f.kind() {
        Binary(Implies | Iff, _, _) => 10,
        Binary(Or, _, _) => 40,
        Binary(And, _, _) => 50,
        Binary(Until | Release | Since | Triggered, _, _) => 52,
        Unary(_, _) => 70,
        Boolean(_) | Proposition(_) => 1000,
    }
}

fn write_child(out: &mut String, child: &Formula, add_parens: bool) {
    if add_parens {
        out.push('(');
    }
    write_formula(out, child);
    if add_parens {
        out.push(')');
    }
}

fn right_associative(op: BinaryOp) -> bool {
    matches!(
        op,
        BinaryOp::Implies
            | BinaryOp::Until
            | BinaryOp::Release
            | BinaryOp::Since
            | BinaryOp::Triggered
    )
}

/// Parentheses are needed around a child that binds more loosely than its
/// parent, or equally loosely unless it is the same operator sitting on the
/// side the operator associates to. Formulas are binary trees, so `a & (b & c)`
/// keeps its parentheses.
fn needs_parens(op: BinaryOp, parent: &Formula, child: &Formula, right: bool) -> bool {
    let (p, c) = (precedence(parent), precedence(child));
    if p != c {
        return p > c;
    }
    match child.kind() {
        FormulaKind::Binary(child_op, _, _) if *child_op == op => right != right_associative(op),
        _ => true,
    }
}

impl UnaryOp {
    /// The concrete syntax of the operator.
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Next => "X",
            UnaryOp::WeakNext => "wX",
            UnaryOp::Yesterday => "Y",
            UnaryOp::WeakYesterday => "Z",
            UnaryOp::Always => "G",
            UnaryOp::Eventually => "F",
            UnaryOp::Once => "O",
            UnaryOp::Historically => "H",
        }
    }
}

impl BinaryOp {
    /// The concrete syntax of the operator.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
            BinaryOp::Implies => "->",
            BinaryOp::Iff => "<->",
            BinaryOp::Until => "U",
            BinaryOp::Release => "R",
            BinaryOp::Since => "S",
            BinaryOp::Triggered => "T",
        }
    }
}

fn write_formula(out: &mut String, f: &Formula) {
    match f.kind() {
        FormulaKind::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
        FormulaKind::Proposition(id) => {
            _ = write!(out, "{id}");
        }
        FormulaKind::Unary(op, arg) => {
            match op {
                UnaryOp::Not => out.push('!'),
                _ => {
                    out.push_str(op.symbol());
                    out.push(' ');
                }
            }
            write_child(out, arg, precedence(f) > precedence(arg));
        }
        FormulaKind::Binary(op, l, r) => {
            write_child(out, l, needs_parens(*op, f, l, false));
            out.push(' ');
            out.push_str(op.symbol());
            out.push(' ');
            write_child(out, r, needs_parens(*op, f, r, true));
        }
    }
}

/// Print a formula with as few parentheses as reparsing allows.
///
/// The text spells out every occurrence of a shared subformula, so its length
/// (and the time to produce it) follows the size of the formula as a tree,
/// which can be exponential in the number of distinct nodes. Printing is
/// linear in the length of the text.
pub fn formula(f: &Formula) -> String {
    let mut out = String::new();
    write_formula(&mut out, f);
    out
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&formula(self))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Name(name) => write!(f, "{name}"),
            Identifier::Placeholder(p) => write!(f, "{{{}}}", p.index),
        }
    }
}
