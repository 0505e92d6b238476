//! Query syntax tree

/// Axis a path step walks along
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Attribute,
    SelfNode,
    Parent,
    DescendantOrSelf,
}

/// Filter applied to the nodes an axis yields
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTest {
    /// Element (or attribute) with this name
    Name(String),
    /// Any element (or any attribute)
    Wildcard,
    /// `text()`
    Text,
    /// `node()`
    AnyNode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub axis: Axis,
    pub test: NodeTest,
    pub predicates: Vec<Expr>,
}

impl Step {
    pub fn new(axis: Axis, test: NodeTest) -> Self {
        Self {
            axis,
            test,
            predicates: Vec::new(),
        }
    }

    /// The step `//` abbreviates
    pub fn descendant_or_self() -> Self {
        Self::new(Axis::DescendantOrSelf, NodeTest::AnyNode)
    }
}

/// Where a path starts
#[derive(Debug, Clone, PartialEq)]
pub enum PathStart {
    /// Document root of the context node
    Root,
    /// The context item
    Context,
    /// Result of a primary expression
    Expr(Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Operands of a chain of `or`, at least two
    Or(Vec<Expr>),
    /// Operands of a chain of `and`, at least two
    And(Vec<Expr>),
    Compare(Box<Expr>, CompareOp, Box<Expr>),
    Union(Vec<Expr>),
    Path { start: PathStart, steps: Vec<Step> },
    /// Primary expression followed by predicates
    Filter { primary: Box<Expr>, predicates: Vec<Expr> },
    Call { name: String, args: Vec<Expr> },
    StringLiteral(String),
    IntegerLiteral(i64),
}
