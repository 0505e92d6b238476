//! Recursive-descent query parser
//!
//! ```text
//! expr        := or
//! or          := and ("or" and)*
//! and         := comparison ("and" comparison)*
//! comparison  := union (("=" | "!=" | "<" | "<=" | ">" | ">=") union)?
//! union       := path ("|" path)*
//! path        := "/" relative? | "//" relative | filter (("/" | "//") relative)? | relative
//! relative    := step (("/" | "//") step)*
//! step        := ("." | ".." | "@" (name | "*") | "*" | name | "text()" | "node()") predicate*
//! filter      := primary predicate*
//! primary     := string | integer | "(" expr? ")" | name "(" (expr ("," expr)*)? ")"
//! ```

use super::ast::{Axis, CompareOp, Expr, NodeTest, PathStart, Step};
use super::errors::{QueryError, QueryResult};
use super::functions;
use super::lexer::{tokenize, Spanned, Token};

/// Parse query text into an expression tree
pub fn parse(input: &str) -> QueryResult<Expr> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(QueryError::syntax(0, "empty query"));
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        end: input.len(),
        depth: 0,
    };
    let expr = parser.parse_expr()?;
    if parser.peek().is_some() {
        return Err(QueryError::syntax(parser.offset(), "unexpected trailing input"));
    }
    Ok(expr)
}

/// Deepest nesting of parentheses, predicates and call arguments
pub const MAX_NESTING_DEPTH: usize = 64;

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    end: usize,
    depth: usize,
}

impl Parser {
    // ==================
    // Token Access
    // ==================

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n).map(|s| &s.token)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map(|s| s.offset).unwrap_or(self.end)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|s| s.token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token, what: &str) -> QueryResult<()> {
        if self.eat(&expected) {
            Ok(())
        } else {
            Err(QueryError::syntax(self.offset(), format!("expected {}", what)))
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        match self.peek() {
            Some(Token::Name(name)) if name == keyword => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn starts_step(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::Name(_) | Token::Star | Token::At | Token::Dot | Token::DotDot)
        )
    }

    fn starts_primary(&self) -> bool {
        match self.peek() {
            Some(Token::Str(_) | Token::Int(_) | Token::LParen) => true,
            Some(Token::Name(name)) => {
                !is_kind_test(name) && self.peek_nth(1) == Some(&Token::LParen)
            }
            _ => false,
        }
    }

    // ==================
    // Operators
    // ==================

    /// Every nested sub-expression enters here, so the depth check bounds
    /// recursion for parsing and for evaluation of the resulting tree
    fn parse_expr(&mut self) -> QueryResult<Expr> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(QueryError::syntax(
                self.offset(),
                format!("expression nested deeper than {} levels", MAX_NESTING_DEPTH),
            ));
        }
        self.depth += 1;
        let expr = self.parse_or();
        self.depth -= 1;
        expr
    }

    fn parse_or(&mut self) -> QueryResult<Expr> {
        let first = self.parse_and()?;
        if !self.eat_keyword("or") {
            return Ok(first);
        }
        let mut operands = vec![first, self.parse_and()?];
        while self.eat_keyword("or") {
            operands.push(self.parse_and()?);
        }
        Ok(Expr::Or(operands))
    }

    fn parse_and(&mut self) -> QueryResult<Expr> {
        let first = self.parse_comparison()?;
        if !self.eat_keyword("and") {
            return Ok(first);
        }
        let mut operands = vec![first, self.parse_comparison()?];
        while self.eat_keyword("and") {
            operands.push(self.parse_comparison()?);
        }
        Ok(Expr::And(operands))
    }

    fn parse_comparison(&mut self) -> QueryResult<Expr> {
        let left = self.parse_union()?;
        let op = match self.peek() {
            Some(Token::Eq) => CompareOp::Eq,
            Some(Token::NotEq) => CompareOp::NotEq,
            Some(Token::Lt) => CompareOp::Lt,
            Some(Token::Le) => CompareOp::Le,
            Some(Token::Gt) => CompareOp::Gt,
            Some(Token::Ge) => CompareOp::Ge,
            _ => return Ok(left),
        };
        self.pos += 1;
        let right = self.parse_union()?;
        Ok(Expr::Compare(Box::new(left), op, Box::new(right)))
    }

    fn parse_union(&mut self) -> QueryResult<Expr> {
        let first = self.parse_path()?;
        if self.peek() != Some(&Token::Pipe) {
            return Ok(first);
        }

        let mut parts = vec![first];
        while self.eat(&Token::Pipe) {
            parts.push(self.parse_path()?);
        }
        Ok(Expr::Union(parts))
    }

    // ==================
    // Paths
    // ==================

    fn parse_path(&mut self) -> QueryResult<Expr> {
        if self.eat(&Token::Slash) {
            let steps = if self.starts_step() {
                self.parse_relative()?
            } else {
                Vec::new()
            };
            return Ok(Expr::Path {
                start: PathStart::Root,
                steps,
            });
        }

        if self.eat(&Token::DoubleSlash) {
            let mut steps = vec![Step::descendant_or_self()];
            steps.extend(self.parse_relative()?);
            return Ok(Expr::Path {
                start: PathStart::Root,
                steps,
            });
        }

        if self.starts_primary() {
            let primary = self.parse_primary()?;
            let predicates = self.parse_predicates()?;
            let base = if predicates.is_empty() {
                primary
            } else {
                Expr::Filter {
                    primary: Box::new(primary),
                    predicates,
                }
            };

            let mut steps = Vec::new();
            self.parse_continuation(&mut steps)?;
            if steps.is_empty() {
                return Ok(base);
            }
            return Ok(Expr::Path {
                start: PathStart::Expr(Box::new(base)),
                steps,
            });
        }

        if self.starts_step() {
            return Ok(Expr::Path {
                start: PathStart::Context,
                steps: self.parse_relative()?,
            });
        }

        Err(QueryError::syntax(self.offset(), "expected expression"))
    }

    fn parse_relative(&mut self) -> QueryResult<Vec<Step>> {
        let mut steps = vec![self.parse_step()?];
        self.parse_continuation(&mut steps)?;
        Ok(steps)
    }

    fn parse_continuation(&mut self, steps: &mut Vec<Step>) -> QueryResult<()> {
        loop {
            if self.eat(&Token::Slash) {
                steps.push(self.parse_step()?);
            } else if self.eat(&Token::DoubleSlash) {
                steps.push(Step::descendant_or_self());
                steps.push(self.parse_step()?);
            } else {
                return Ok(());
            }
        }
    }

    fn parse_step(&mut self) -> QueryResult<Step> {
        let offset = self.offset();
        let mut step = match self.advance() {
            Some(Token::Dot) => Step::new(Axis::SelfNode, NodeTest::AnyNode),
            Some(Token::DotDot) => Step::new(Axis::Parent, NodeTest::AnyNode),
            Some(Token::Star) => Step::new(Axis::Child, NodeTest::Wildcard),
            Some(Token::At) => match self.advance() {
                Some(Token::Name(name)) => Step::new(Axis::Attribute, NodeTest::Name(name)),
                Some(Token::Star) => Step::new(Axis::Attribute, NodeTest::Wildcard),
                _ => return Err(QueryError::syntax(offset, "expected attribute name after '@'")),
            },
            Some(Token::Name(name)) => {
                if is_kind_test(&name) && self.eat(&Token::LParen) {
                    self.expect(Token::RParen, "')'")?;
                    let test = if name == "text" {
                        NodeTest::Text
                    } else {
                        NodeTest::AnyNode
                    };
                    Step::new(Axis::Child, test)
                } else {
                    Step::new(Axis::Child, NodeTest::Name(name))
                }
            }
            _ => return Err(QueryError::syntax(offset, "expected path step")),
        };
        step.predicates = self.parse_predicates()?;
        Ok(step)
    }

    fn parse_predicates(&mut self) -> QueryResult<Vec<Expr>> {
        let mut predicates = Vec::new();
        while self.eat(&Token::LBracket) {
            predicates.push(self.parse_expr()?);
            self.expect(Token::RBracket, "']'")?;
        }
        Ok(predicates)
    }

    // ==================
    // Primaries
    // ==================

    fn parse_primary(&mut self) -> QueryResult<Expr> {
        let offset = self.offset();
        match self.advance() {
            Some(Token::Str(value)) => Ok(Expr::StringLiteral(value)),
            Some(Token::Int(value)) => Ok(Expr::IntegerLiteral(value)),
            Some(Token::LParen) => {
                if self.eat(&Token::RParen) {
                    return Ok(Expr::Union(Vec::new()));
                }
                let inner = self.parse_expr()?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            Some(Token::Name(name)) => {
                self.expect(Token::LParen, "'('")?;
                let mut args = Vec::new();
                if !self.eat(&Token::RParen) {
                    loop {
                        args.push(self.parse_expr()?);
                        if self.eat(&Token::Comma) {
                            continue;
                        }
                        self.expect(Token::RParen, "',' or ')'")?;
                        break;
                    }
                }
                functions::check_call(&name, args.len())?;
                Ok(Expr::Call { name, args })
            }
            _ => Err(QueryError::syntax(offset, "expected expression")),
        }
    }
}

fn is_kind_test(name: &str) -> bool {
    name == "text" || name == "node"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn child(name: &str) -> Step {
        Step::new(Axis::Child, NodeTest::Name(name.to_string()))
    }

    #[test]
    fn test_absolute_path() {
        let expr = parse("/shelf/book").unwrap();
        assert_eq!(
            expr,
            Expr::Path {
                start: PathStart::Root,
                steps: vec![child("shelf"), child("book")],
            }
        );
    }

    #[test]
    fn test_descendant_shorthand() {
        let expr = parse("//title").unwrap();
        assert_eq!(
            expr,
            Expr::Path {
                start: PathStart::Root,
                steps: vec![Step::descendant_or_self(), child("title")],
            }
        );
    }

    #[test]
    fn test_predicate_and_comparison() {
        let expr = parse("book[@lang = 'en' and 2]").unwrap();
        let Expr::Path { start, steps } = expr else {
            panic!("expected path");
        };
        assert_eq!(start, PathStart::Context);
        assert_eq!(steps.len(), 1);
        assert!(matches!(&steps[0].predicates[0], Expr::And(operands) if operands.len() == 2));
    }

    #[test]
    fn test_function_call_with_path() {
        let expr = parse("doc('lib', 'shelf')/shelf/text()").unwrap();
        let Expr::Path { start, steps } = expr else {
            panic!("expected path");
        };
        assert!(matches!(start, PathStart::Expr(_)));
        assert_eq!(steps[1].test, NodeTest::Text);
    }

    #[test]
    fn test_union() {
        assert!(matches!(parse("a | b | c").unwrap(), Expr::Union(parts) if parts.len() == 3));
    }

    #[test]
    fn test_lone_slash_is_root() {
        assert_eq!(
            parse("/").unwrap(),
            Expr::Path {
                start: PathStart::Root,
                steps: vec![],
            }
        );
    }

    #[test]
    fn test_syntax_errors() {
        assert!(matches!(parse(""), Err(QueryError::Syntax { .. })));
        assert!(matches!(parse("a["), Err(QueryError::Syntax { .. })));
        assert!(matches!(parse("a b"), Err(QueryError::Syntax { .. })));
        assert!(matches!(parse("count(a"), Err(QueryError::Syntax { .. })));
    }

    #[test]
    fn test_long_or_chain_is_flat() {
        let query = vec!["1"; 500].join(" or ");
        assert!(matches!(parse(&query).unwrap(), Expr::Or(operands) if operands.len() == 500));
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |depth: usize| format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
        assert!(parse(&nested(MAX_NESTING_DEPTH - 1)).is_ok());
        assert!(matches!(parse(&nested(MAX_NESTING_DEPTH)), Err(QueryError::Syntax { .. })));
        assert!(matches!(parse(&nested(10_000)), Err(QueryError::Syntax { .. })));

        let predicates = format!("a{}", "[b".repeat(10_000));
        assert!(matches!(parse(&predicates), Err(QueryError::Syntax { .. })));

        let calls = format!("{}1{}", "count(".repeat(10_000), ")".repeat(10_000));
        assert!(matches!(parse(&calls), Err(QueryError::Syntax { .. })));
    }

    #[test]
    fn test_static_function_errors() {
        assert!(matches!(parse("frobnicate(1)"), Err(QueryError::UnknownFunction(_))));
        assert!(matches!(parse("count()"), Err(QueryError::Arity { .. })));
    }
}
