//! Expression evaluator

use std::cmp::Ordering;

use crate::store::{NodeKind, DOCUMENT_ROOT_KEY};

use super::ast::{Axis, CompareOp, Expr, NodeTest, PathStart, Step};
use super::context::{Item, NodeRef, QueryContext, Sequence};
use super::errors::{QueryError, QueryResult};
use super::functions::{self, effective_boolean};

/// Dynamic focus: context item plus its position in the current sequence
struct Focus<'a> {
    item: Option<&'a Item>,
    position: usize,
}

/// Evaluate `expr` with the context's context item as focus
pub(crate) fn evaluate(expr: &Expr, ctx: &mut QueryContext) -> QueryResult<Sequence> {
    let item = ctx.context_item().cloned();
    let focus = Focus {
        item: item.as_ref(),
        position: 1,
    };
    Evaluator { ctx }.eval(expr, &focus)
}

struct Evaluator<'c> {
    ctx: &'c mut QueryContext,
}

impl Evaluator<'_> {
    fn eval(&mut self, expr: &Expr, focus: &Focus<'_>) -> QueryResult<Sequence> {
        match expr {
            Expr::StringLiteral(value) => Ok(vec![Item::String(value.clone())]),
            Expr::IntegerLiteral(value) => Ok(vec![Item::Integer(*value)]),
            Expr::Or(operands) => {
                for operand in operands {
                    if effective_boolean(&self.eval(operand, focus)?)? {
                        return Ok(vec![Item::Boolean(true)]);
                    }
                }
                Ok(vec![Item::Boolean(false)])
            }
            Expr::And(operands) => {
                for operand in operands {
                    if !effective_boolean(&self.eval(operand, focus)?)? {
                        return Ok(vec![Item::Boolean(false)]);
                    }
                }
                Ok(vec![Item::Boolean(true)])
            }
            Expr::Compare(left, op, right) => {
                let left = self.eval(left, focus)?;
                let right = self.eval(right, focus)?;
                Ok(vec![Item::Boolean(general_compare(&left, *op, &right))])
            }
            Expr::Union(parts) => {
                let mut out = Vec::new();
                for part in parts {
                    let seq = self.eval(part, focus)?;
                    if seq.iter().any(|item| !item.is_node()) {
                        return Err(QueryError::Type(
                            "union operands must be node sequences".to_string(),
                        ));
                    }
                    out.extend(seq);
                }
                Ok(document_order(out))
            }
            Expr::Path { start, steps } => {
                let mut current = match start {
                    PathStart::Root => vec![Item::Node(root_of(focus)?)],
                    PathStart::Context => {
                        vec![focus.item.cloned().ok_or(QueryError::ContextUndefined)?]
                    }
                    PathStart::Expr(primary) => self.eval(primary, focus)?,
                };
                for step in steps {
                    current = self.apply_step(&current, step)?;
                }
                Ok(current)
            }
            Expr::Filter {
                primary,
                predicates,
            } => {
                let mut seq = self.eval(primary, focus)?;
                for predicate in predicates {
                    seq = self.filter(seq, predicate)?;
                }
                Ok(seq)
            }
            Expr::Call { name, args } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval(arg, focus)?);
                }
                functions::call(self.ctx, name, values, focus.item)
            }
        }
    }

    fn apply_step(&mut self, input: &[Item], step: &Step) -> QueryResult<Sequence> {
        let mut out = Vec::new();
        for item in input {
            let candidates = match item {
                Item::Node(node) => axis_items(node, step.axis, &step.test),
                Item::Attribute { owner, name, .. } => match step.axis {
                    Axis::Parent => vec![Item::Node(owner.clone())],
                    Axis::SelfNode | Axis::DescendantOrSelf => match &step.test {
                        NodeTest::AnyNode => vec![item.clone()],
                        NodeTest::Name(test) if test == name => vec![item.clone()],
                        _ => Vec::new(),
                    },
                    _ => Vec::new(),
                },
                _ => {
                    return Err(QueryError::Type(format!(
                        "path step applied to atomic value '{}'",
                        item.string_value()
                    )))
                }
            };

            let mut selected = candidates;
            for predicate in &step.predicates {
                selected = self.filter(selected, predicate)?;
            }
            out.extend(selected);
        }
        Ok(document_order(out))
    }

    fn filter(&mut self, items: Sequence, predicate: &Expr) -> QueryResult<Sequence> {
        let mut kept = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let focus = Focus {
                item: Some(&item),
                position: index + 1,
            };
            let result = self.eval(predicate, &focus)?;
            let keep = match result.as_slice() {
                [Item::Integer(n)] => usize::try_from(*n).map_or(false, |n| n == focus.position),
                _ => effective_boolean(&result)?,
            };
            if keep {
                kept.push(item);
            }
        }
        Ok(kept)
    }
}

fn root_of(focus: &Focus<'_>) -> QueryResult<NodeRef> {
    match focus.item {
        Some(Item::Node(node)) | Some(Item::Attribute { owner: node, .. }) => {
            Ok(node.with_key(DOCUMENT_ROOT_KEY))
        }
        Some(_) => Err(QueryError::Type(
            "'/' requires a node as context item".to_string(),
        )),
        None => Err(QueryError::ContextUndefined),
    }
}

// ==================
// Axes
// ==================

fn matches_test(node: &NodeRef, test: &NodeTest) -> bool {
    match (node.node().map(|n| &n.kind), test) {
        (None, _) => false,
        (Some(_), NodeTest::AnyNode) => true,
        (Some(NodeKind::Text(_)), NodeTest::Text) => true,
        (Some(NodeKind::Element { .. }), NodeTest::Wildcard) => true,
        (Some(NodeKind::Element { name, .. }), NodeTest::Name(wanted)) => name == wanted,
        _ => false,
    }
}

fn axis_items(node: &NodeRef, axis: Axis, test: &NodeTest) -> Sequence {
    let keys: Vec<_> = match axis {
        Axis::Child => node
            .node()
            .map(|n| n.children.clone())
            .unwrap_or_default(),
        Axis::SelfNode => vec![node.key()],
        Axis::Parent => node.node().and_then(|n| n.parent).into_iter().collect(),
        Axis::DescendantOrSelf => {
            let mut keys = vec![node.key()];
            keys.extend(node.revision().descendants(node.key()));
            keys
        }
        Axis::Attribute => return attribute_items(node, test),
    };

    keys.into_iter()
        .map(|key| node.with_key(key))
        .filter(|candidate| matches_test(candidate, test))
        .map(Item::Node)
        .collect()
}

fn attribute_items(node: &NodeRef, test: &NodeTest) -> Sequence {
    let attributes = match node.node().and_then(|n| n.attributes()) {
        Some(attributes) => attributes,
        None => return Vec::new(),
    };

    attributes
        .iter()
        .filter(|(name, _)| match test {
            NodeTest::Name(wanted) => *name == wanted,
            NodeTest::Wildcard | NodeTest::AnyNode => true,
            NodeTest::Text => false,
        })
        .map(|(name, value)| Item::Attribute {
            owner: node.clone(),
            name: name.clone(),
            value: value.clone(),
        })
        .collect()
}

// ==================
// Ordering
// ==================

/// Sort node sequences into document order without duplicates
///
/// Attributes follow their owner element. Sequences holding atomic values
/// are returned untouched.
fn document_order(items: Sequence) -> Sequence {
    if items.iter().any(|item| !item.is_node()) {
        return items;
    }

    let mut keyed: Vec<((usize, usize, String), Item)> = items
        .into_iter()
        .map(|item| {
            let key = match &item {
                Item::Node(node) => {
                    let (doc, pos) = node.order();
                    (doc, pos, String::new())
                }
                Item::Attribute { owner, name, .. } => {
                    let (doc, pos) = owner.order();
                    (doc, pos, format!("@{}", name))
                }
                _ => (0, 0, String::new()),
            };
            (key, item)
        })
        .collect();

    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed.dedup_by(|a, b| a.0 == b.0);
    keyed.into_iter().map(|(_, item)| item).collect()
}

// ==================
// Comparisons
// ==================

/// Existential comparison over the atomized operands
fn general_compare(left: &[Item], op: CompareOp, right: &[Item]) -> bool {
    left.iter()
        .any(|l| right.iter().any(|r| compare_atomic(l, op, r)))
}

fn as_number(item: &Item) -> Option<f64> {
    match item {
        Item::Integer(value) => Some(*value as f64),
        Item::Boolean(_) => None,
        other => other.string_value().trim().parse::<f64>().ok(),
    }
}

fn compare_atomic(left: &Item, op: CompareOp, right: &Item) -> bool {
    let ordering = match (left, right) {
        (Item::Boolean(l), Item::Boolean(r)) => Some(l.cmp(r)),
        _ => match (as_number(left), as_number(right)) {
            (Some(l), Some(r)) => l.partial_cmp(&r),
            _ => Some(left.string_value().cmp(&right.string_value())),
        },
    };

    match ordering {
        Some(ordering) => match op {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::NotEq => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
        },
        None => op == CompareOp::NotEq,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_numeric_and_string() {
        let ten = Item::String("10".into());
        let nine = Item::Integer(9);
        assert!(compare_atomic(&ten, CompareOp::Gt, &nine));
        assert!(compare_atomic(
            &Item::String("apple".into()),
            CompareOp::Lt,
            &Item::String("banana".into())
        ));
        assert!(!compare_atomic(&Item::Boolean(true), CompareOp::Eq, &Item::Boolean(false)));
    }

    #[test]
    fn test_general_compare_is_existential() {
        let left = vec![Item::Integer(1), Item::Integer(5)];
        let right = vec![Item::Integer(5)];
        assert!(general_compare(&left, CompareOp::Eq, &right));
        assert!(general_compare(&left, CompareOp::NotEq, &right));
        assert!(!general_compare(&[], CompareOp::Eq, &right));
    }
}
