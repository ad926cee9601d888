// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! The formula DAG: operators, identifiers, and the hash-consing universe.

use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use serde::Serialize;

use crate::hashmap::{HashMap, HashSet};

/// Unary operators
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash, PartialOrd, Ord, Serialize)]
pub enum UnaryOp {
    /// Boolean negation
    Not,
    /// Strong next: the next position exists and satisfies the argument
    Next,
    /// Weak next: if a next position exists, it satisfies the argument
    WeakNext,
    /// Strong yesterday: the previous position exists and satisfies the argument
    Yesterday,
    /// Weak yesterday: if a previous position exists, it satisfies the argument
    WeakYesterday,
    /// Always temporal modality
    Always,
    /// Eventually temporal modality
    Eventually,
    /// The argument held at some position up to now
    Once,
    /// The argument held at every position up to now
    Historically,
}

/// Binary operators
#[allow(missing_docs)]
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash, PartialOrd, Ord, Serialize)]
pub enum BinaryOp {
    And,
    Or,
    Implies,
    Iff,
    Until,
    Release,
    /// Past dual of [`BinaryOp::Until`]
    Since,
    /// Past dual of [`BinaryOp::Release`]
    Triggered,
}

impl UnaryOp {
    /// Whether the operator refers to earlier positions of the trace.
    pub fn is_past(self) -> bool {
        matches!(
            self,
            UnaryOp::Yesterday | UnaryOp::WeakYesterday | UnaryOp::Once | UnaryOp::Historically
        )
    }

    /// Whether the operator is a temporal modality (anything but negation).
    pub fn is_temporal(self) -> bool {
        self != UnaryOp::Not
    }
}

impl BinaryOp {
    /// Whether the operator refers to earlier positions of the trace.
    pub fn is_past(self) -> bool {
        matches!(self, BinaryOp::Since | BinaryOp::Triggered)
    }

    /// Whether the operator is a temporal modality.
    pub fn is_temporal(self) -> bool {
        matches!(
            self,
            BinaryOp::Until | BinaryOp::Release | BinaryOp::Since | BinaryOp::Triggered
        )
    }
}

/// A synthetic proposition standing in for a subformula that was abstracted
/// away. The index identifies the placeholder inside one formula; `original`
/// is the subformula it replaced.
#[derive(PartialEq, Eq, Clone, Hash, Debug)]
pub struct Placeholder {
    /// Index of the placeholder, unique among the placeholders of a formula
    pub index: usize,
    /// The subformula this placeholder replaced
    pub original: Formula,
}

/// The name of an atomic proposition.
#[derive(PartialEq, Eq, Clone, Hash, Debug)]
pub enum Identifier {
    /// An ordinary, user-visible name
    Name(Arc<str>),
    /// A placeholder minted during core extraction
    Placeholder(Placeholder),
}

impl Identifier {
    /// The ordinary name, if this is not a placeholder.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Identifier::Name(n) => Some(n),
            Identifier::Placeholder(_) => None,
        }
    }

    /// The placeholder payload, if this is a placeholder.
    pub fn as_placeholder(&self) -> Option<&Placeholder> {
        match self {
            Identifier::Placeholder(p) => Some(p),
            Identifier::Name(_) => None,
        }
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Identifier::Name(value.into())
    }
}

impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Identifier::Name(value.into())
    }
}

impl From<Placeholder> for Identifier {
    fn from(value: Placeholder) -> Self {
        Identifier::Placeholder(value)
    }
}

/// The shape of a formula node. Children are [`Formula`] handles, so two
/// kinds are equal exactly when they have the same operator and the very same
/// children; this is what makes hash-consing a single table lookup.
#[derive(PartialEq, Eq, Clone, Hash, Debug)]
pub enum FormulaKind {
    /// A constant true or false
    Boolean(bool),
    /// An atomic proposition
    Proposition(Identifier),
    /// An applied unary operation
    Unary(UnaryOp, Formula),
    /// An applied binary operation
    Binary(BinaryOp, Formula, Formula),
}

struct Node {
    kind: FormulaKind,
    universe: usize,
}

/// A handle to an interned formula node.
///
/// Formulas are only created through a [`Sigma`], which guarantees that
/// structurally equal formulas are the same node. Equality and hashing are
/// therefore by identity and take constant time.
#[derive(Clone)]
pub struct Formula(Arc<Node>);

impl PartialEq for Formula {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Formula {}

impl Hash for Formula {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.0).hash(state)
    }
}

impl fmt::Debug for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl Formula {
    /// The operator and children of this node.
    pub fn kind(&self) -> &FormulaKind {
        &self.0.kind
    }

    /// The immediate children, left to right.
    pub fn children(&self) -> impl Iterator<Item = &Formula> {
        let (left, right) = match self.kind() {
            FormulaKind::Boolean(_) | FormulaKind::Proposition(_) => (None, None),
            FormulaKind::Unary(_, arg) => (Some(arg), None),
            FormulaKind::Binary(_, l, r) => (Some(l), Some(r)),
        };
        left.into_iter().chain(right)
    }

    /// Whether this is a boolean constant or a proposition.
    pub fn is_leaf(&self) -> bool {
        matches!(
            self.kind(),
            FormulaKind::Boolean(_) | FormulaKind::Proposition(_)
        )
    }

    /// The identifier of an atomic proposition.
    pub fn as_proposition(&self) -> Option<&Identifier> {
        match self.kind() {
            FormulaKind::Proposition(id) => Some(id),
            _ => None,
        }
    }

    /// The placeholder payload of a placeholder proposition.
    pub fn as_placeholder(&self) -> Option<&Placeholder> {
        self.as_proposition().and_then(Identifier::as_placeholder)
    }

    /// All distinct subformulas (including `self`), each exactly once, with
    /// every node listed after all of its children.
    ///
    /// Shared subformulas are visited once, so this is linear in the size of
    /// the DAG rather than of the tree it unfolds to.
    pub fn postorder(&self) -> Vec<Formula> {
        let mut order = vec![];
        let mut seen: HashSet<Formula> = HashSet::default();
        let mut stack = vec![(self.clone(), false)];
        while let Some((f, expanded)) = stack.pop() {
            if expanded {
                order.push(f);
                continue;
            }
            if !seen.insert(f.clone()) {
                continue;
            }
            stack.push((f.clone(), true));
            // pushed in reverse so the left child is finished first
            let children: Vec<Formula> = f.children().cloned().collect();
            for child in children.into_iter().rev() {
                if !seen.contains(&child) {
                    stack.push((child, false));
                }
            }
        }
        order
    }

    /// The atomic propositions occurring in the formula, in order of first
    /// appearance.
    pub fn propositions(&self) -> Vec<Identifier> {
        self.postorder()
            .iter()
            .filter_map(|f| f.as_proposition().cloned())
            .collect()
    }

    /// Whether any temporal operator (future or past) occurs in the formula.
    pub fn is_temporal(&self) -> bool {
        self.postorder().iter().any(|f| match f.kind() {
            FormulaKind::Unary(op, _) => op.is_temporal(),
            FormulaKind::Binary(op, _, _) => op.is_temporal(),
            _ => false,
        })
    }

    fn universe(&self) -> usize {
        self.0.universe
    }
}

static NEXT_UNIVERSE: AtomicUsize = AtomicUsize::new(0);

struct Universe {
    id: usize,
    table: Mutex<HashMap<FormulaKind, Formula>>,
}

/// A formula universe: the hash-consing table that owns every node built
/// through it.
///
/// Cloning a `Sigma` gives another handle to the same universe. Formulas from
/// different universes must never be combined; doing so panics.
#[derive(Clone)]
pub struct Sigma(Arc<Universe>);

impl Default for Sigma {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Sigma {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sigma#{}({} nodes)", self.0.id, self.len())
    }
}

/// Smart constructors. Every constructor interns the node, so calling it twice
/// with the same arguments returns the same [`Formula`].
impl Sigma {
    /// Create a fresh, empty universe.
    pub fn new() -> Self {
        Sigma(Arc::new(Universe {
            id: NEXT_UNIVERSE.fetch_add(1, Ordering::Relaxed),
            table: Mutex::new(HashMap::default()),
        }))
    }

    /// Number of distinct nodes interned so far.
    pub fn len(&self) -> usize {
        self.0.table.lock().unwrap().len()
    }

    /// Whether no node has been interned yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `f` was built by this universe.
    pub fn owns(&self, f: &Formula) -> bool {
        f.universe() == self.0.id
    }

    fn intern(&self, kind: FormulaKind) -> Formula {
        let foreign = match &kind {
            FormulaKind::Boolean(_) => None,
            FormulaKind::Proposition(id) => id
                .as_placeholder()
                .map(|p| &p.original)
                .filter(|f| !self.owns(f)),
            FormulaKind::Unary(_, arg) => Some(arg).filter(|f| !self.owns(f)),
            FormulaKind::Binary(_, l, r) => [l, r].into_iter().find(|f| !self.owns(f)),
        };
        if let Some(f) = foreign {
            panic!(
                "formula {f} belongs to universe {}, not {}",
                f.universe(),
                self.0.id
            );
        }

        let mut table = self.0.table.lock().unwrap();
        if let Some(f) = table.get(&kind) {
            return f.clone();
        }
        let f = Formula(Arc::new(Node {
            kind: kind.clone(),
            universe: self.0.id,
        }));
        table.insert(kind, f.clone());
        f
    }

    /// Smart constructor for a boolean constant
    pub fn boolean(&self, value: bool) -> Formula {
        self.intern(FormulaKind::Boolean(value))
    }

    /// Smart constructor for `true`
    pub fn top(&self) -> Formula {
        self.boolean(true)
    }

    /// Smart constructor for `false`
    pub fn bottom(&self) -> Formula {
        self.boolean(false)
    }

    /// Smart constructor for an atomic proposition
    pub fn proposition<I: Into<Identifier>>(&self, id: I) -> Formula {
        self.intern(FormulaKind::Proposition(id.into()))
    }

    /// Build a unary node from its operator tag.
    pub fn unary(&self, op: UnaryOp, arg: &Formula) -> Formula {
        self.intern(FormulaKind::Unary(op, arg.clone()))
    }

    /// Build a binary node from its operator tag.
    pub fn binary(&self, op: BinaryOp, left: &Formula, right: &Formula) -> Formula {
        self.intern(FormulaKind::Binary(op, left.clone(), right.clone()))
    }

    /// Smart constructor for `!f`
    pub fn not(&self, f: &Formula) -> Formula {
        self.unary(UnaryOp::Not, f)
    }

    /// Smart constructor for `X f`
    pub fn next(&self, f: &Formula) -> Formula {
        self.unary(UnaryOp::Next, f)
    }

    /// Smart constructor for `wX f`
    pub fn weak_next(&self, f: &Formula) -> Formula {
        self.unary(UnaryOp::WeakNext, f)
    }

    /// Smart constructor for `Y f`
    pub fn yesterday(&self, f: &Formula) -> Formula {
        self.unary(UnaryOp::Yesterday, f)
    }

    /// Smart constructor for `Z f`
    pub fn weak_yesterday(&self, f: &Formula) -> Formula {
        self.unary(UnaryOp::WeakYesterday, f)
    }

    /// Smart constructor for `G f`
    pub fn always(&self, f: &Formula) -> Formula {
        self.unary(UnaryOp::Always, f)
    }

    /// Smart constructor for `F f`
    pub fn eventually(&self, f: &Formula) -> Formula {
        self.unary(UnaryOp::Eventually, f)
    }

    /// Smart constructor for `O f`
    pub fn once(&self, f: &Formula) -> Formula {
        self.unary(UnaryOp::Once, f)
    }

    /// Smart constructor for `H f`
    pub fn historically(&self, f: &Formula) -> Formula {
        self.unary(UnaryOp::Historically, f)
    }

    /// Smart constructor for `l & r`
    pub fn and(&self, l: &Formula, r: &Formula) -> Formula {
        self.binary(BinaryOp::And, l, r)
    }

    /// Smart constructor for `l | r`
    pub fn or(&self, l: &Formula, r: &Formula) -> Formula {
        self.binary(BinaryOp::Or, l, r)
    }

    /// Smart constructor for `l -> r`
    pub fn implies(&self, l: &Formula, r: &Formula) -> Formula {
        self.binary(BinaryOp::Implies, l, r)
    }

    /// Smart constructor for `l <-> r`
    pub fn iff(&self, l: &Formula, r: &Formula) -> Formula {
        self.binary(BinaryOp::Iff, l, r)
    }

    /// Smart constructor for `l U r`
    pub fn until(&self, l: &Formula, r: &Formula) -> Formula {
        self.binary(BinaryOp::Until, l, r)
    }

    /// Smart constructor for `l R r`
    pub fn release(&self, l: &Formula, r: &Formula) -> Formula {
        self.binary(BinaryOp::Release, l, r)
    }

    /// Smart constructor for `l S r`
    pub fn since(&self, l: &Formula, r: &Formula) -> Formula {
        self.binary(BinaryOp::Since, l, r)
    }

    /// Smart constructor for `l T r`
    pub fn triggered(&self, l: &Formula, r: &Formula) -> Formula {
        self.binary(BinaryOp::Triggered, l, r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_consing() {
        let sigma = Sigma::new();
        let a = sigma.proposition("a");
        let b = sigma.proposition("b");
        let f1 = sigma.and(&a, &sigma.not(&b));
        let f2 = sigma.and(&sigma.proposition("a"), &sigma.not(&b));
        assert_eq!(f1, f2);
        assert_ne!(f1, sigma.and(&sigma.not(&b), &a));
        // a, b, !b, a & !b
        assert_eq!(sigma.len(), 4);
    }

    #[test]
    fn test_children_order() {
        let sigma = Sigma::new();
        let a = sigma.proposition("a");
        let b = sigma.proposition("b");
        let f = sigma.until(&a, &b);
        assert_eq!(f.children().cloned().collect::<Vec<_>>(), vec![a.clone(), b]);
        assert_eq!(sigma.not(&a).children().count(), 1);
        assert_eq!(a.children().count(), 0);
        assert!(a.is_leaf());
        assert!(!f.is_leaf());
    }

    #[test]
    fn test_postorder_visits_shared_nodes_once() {
        let sigma = Sigma::new();
        let a = sigma.proposition("a");
        let na = sigma.not(&a);
        let f = sigma.and(&na, &sigma.or(&na, &a));
        let order = f.postorder();
        assert_eq!(order.len(), 4);
        assert_eq!(order.last(), Some(&f));
        for (i, g) in order.iter().enumerate() {
            for child in g.children() {
                let j = order.iter().position(|h| h == child).unwrap();
                assert!(j < i, "{child} listed after its parent {g}");
            }
        }
    }

    #[test]
    fn test_identifiers() {
        let sigma = Sigma::new();
        let a = sigma.proposition("a");
        let name: Identifier = "a".into();
        assert_eq!(name.as_name(), Some("a"));
        assert!(name.as_placeholder().is_none());
        assert_eq!(a.as_proposition(), Some(&name));

        let p = sigma.proposition(Placeholder {
            index: 3,
            original: a.clone(),
        });
        let payload = p.as_placeholder().expect("should be a placeholder");
        assert_eq!(payload.index, 3);
        assert_eq!(payload.original, a);
        assert!(p.as_proposition().unwrap().as_name().is_none());

        let q = sigma.proposition(Placeholder {
            index: 3,
            original: a.clone(),
        });
        assert_eq!(p, q);
        assert_ne!(
            p,
            sigma.proposition(Placeholder {
                index: 4,
                original: a,
            })
        );
    }

    #[test]
    fn test_temporal_detection() {
        let sigma = Sigma::new();
        let a = sigma.proposition("a");
        assert!(!sigma.and(&a, &sigma.not(&a)).is_temporal());
        assert!(sigma.and(&a, &sigma.once(&a)).is_temporal());
        assert!(sigma.since(&a, &a).is_temporal());
    }

    #[test]
    #[should_panic(expected = "belongs to universe")]
    fn test_mixing_universes() {
        let s1 = Sigma::new();
        let s2 = Sigma::new();
        let a = s1.proposition("a");
        s2.not(&a);
    }
}
