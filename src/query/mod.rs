//! # Query Engine
//!
//! Path-expression language evaluated over revision trees:
//!
//! - paths: `/a/b`, `//b`, `a/b`, `.`, `..`, `*`, `@name`, `@*`, `text()`, `node()`
//! - predicates: `[expr]`, numeric predicates select by position
//! - operators: `= != < <= > >=`, `and`, `or`, `|`
//! - functions: `doc`, `collection`, `count`, `string`, `name`, `not`, `revision`
//!
//! A query is compiled once and evaluated against a [`QueryContext`] bound
//! to a per-session store.

mod ast;
mod context;
mod errors;
mod eval;
mod functions;
mod lexer;
mod parser;
mod serialize;

pub use ast::Expr;
pub use context::{Item, NodeRef, QueryContext, Sequence};
pub use errors::{QueryError, QueryResult};
pub use serialize::serialize_sequence;

/// Compiled query
#[derive(Debug, Clone)]
pub struct Query {
    expr: Expr,
}

impl Query {
    /// Parse and statically check `text`
    pub fn compile(text: &str) -> QueryResult<Self> {
        Ok(Self {
            expr: parser::parse(text)?,
        })
    }

    /// Evaluate against `ctx`
    pub fn evaluate(&self, ctx: &mut QueryContext) -> QueryResult<Sequence> {
        eval::evaluate(&self.expr, ctx)
    }
}
