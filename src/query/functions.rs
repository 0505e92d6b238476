//! Built-in functions

use super::context::{Item, QueryContext, Sequence};
use super::errors::{QueryError, QueryResult};

/// Name, minimum and maximum arity, arity as displayed in errors
const FUNCTIONS: &[(&str, usize, usize, &str)] = &[
    ("doc", 2, 3, "2 or 3"),
    ("collection", 1, 1, "1"),
    ("count", 1, 1, "1"),
    ("string", 0, 1, "0 or 1"),
    ("name", 0, 1, "0 or 1"),
    ("not", 1, 1, "1"),
    ("revision", 0, 1, "0 or 1"),
];

/// Static check of a function call
pub(crate) fn check_call(name: &str, arity: usize) -> QueryResult<()> {
    let (_, min, max, expected) = FUNCTIONS
        .iter()
        .find(|(known, ..)| *known == name)
        .ok_or_else(|| QueryError::UnknownFunction(name.to_string()))?;

    if arity < *min || arity > *max {
        return Err(QueryError::Arity {
            name: name.to_string(),
            expected: *expected,
            actual: arity,
        });
    }
    Ok(())
}

/// Invoke a built-in with evaluated arguments
pub(crate) fn call(
    ctx: &mut QueryContext,
    name: &str,
    args: Vec<Sequence>,
    context_item: Option<&Item>,
) -> QueryResult<Sequence> {
    check_call(name, args.len())?;

    match name {
        "doc" => {
            let database = string_arg(&args[0], name)?;
            let resource = string_arg(&args[1], name)?;
            let revision = match args.get(2) {
                Some(arg) => Some(revision_arg(arg)?),
                None => None,
            };
            let root = ctx.open_document(&database, &resource, revision)?;
            Ok(vec![Item::Node(root)])
        }
        "collection" => {
            let database = string_arg(&args[0], name)?;
            let roots = ctx.open_collection(&database)?;
            Ok(roots.into_iter().map(Item::Node).collect())
        }
        "count" => Ok(vec![Item::Integer(args[0].len() as i64)]),
        "string" => {
            let item = optional_item(args.first(), context_item, name)?;
            Ok(vec![Item::String(
                item.map(|item| item.string_value()).unwrap_or_default(),
            )])
        }
        "name" => {
            let item = optional_item(args.first(), context_item, name)?;
            let value = match item {
                Some(Item::Node(node)) => node
                    .node()
                    .and_then(|n| n.name())
                    .unwrap_or_default()
                    .to_string(),
                Some(Item::Attribute { name, .. }) => name,
                _ => String::new(),
            };
            Ok(vec![Item::String(value)])
        }
        "not" => Ok(vec![Item::Boolean(!effective_boolean(&args[0])?)]),
        "revision" => {
            let item = optional_item(args.first(), context_item, name)?;
            match item {
                Some(Item::Node(node)) | Some(Item::Attribute { owner: node, .. }) => {
                    Ok(vec![Item::Integer(i64::from(node.revision().number()))])
                }
                Some(_) => Err(QueryError::Type(
                    "revision() expects a node".to_string(),
                )),
                None => Ok(Vec::new()),
            }
        }
        other => Err(QueryError::UnknownFunction(other.to_string())),
    }
}

/// Effective boolean value of a sequence
pub(crate) fn effective_boolean(seq: &[Item]) -> QueryResult<bool> {
    match seq {
        [] => Ok(false),
        [first, ..] if first.is_node() => Ok(true),
        [Item::Boolean(value)] => Ok(*value),
        [Item::String(value)] => Ok(!value.is_empty()),
        [Item::Integer(value)] => Ok(*value != 0),
        _ => Err(QueryError::Type(
            "no boolean value for a sequence of several atomic values".to_string(),
        )),
    }
}

fn single<'a>(arg: &'a [Item], function: &str) -> QueryResult<&'a Item> {
    match arg {
        [item] => Ok(item),
        _ => Err(QueryError::Type(format!(
            "{}() expects a single item, got {}",
            function,
            arg.len()
        ))),
    }
}

fn string_arg(arg: &[Item], function: &str) -> QueryResult<String> {
    Ok(single(arg, function)?.string_value())
}

fn revision_arg(arg: &[Item]) -> QueryResult<u32> {
    match single(arg, "doc")? {
        Item::Integer(value) => u32::try_from(*value)
            .map_err(|_| QueryError::Type(format!("invalid revision number {}", value))),
        _ => Err(QueryError::Type(
            "doc() expects an integer revision".to_string(),
        )),
    }
}

/// Explicit argument, or the context item when the argument is omitted
fn optional_item(
    arg: Option<&Sequence>,
    context_item: Option<&Item>,
    function: &str,
) -> QueryResult<Option<Item>> {
    match arg {
        None => context_item
            .cloned()
            .map(Some)
            .ok_or(QueryError::ContextUndefined),
        Some(seq) if seq.is_empty() => Ok(None),
        Some(seq) => single(seq, function).map(|item| Some(item.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_call() {
        assert!(check_call("doc", 2).is_ok());
        assert!(check_call("doc", 3).is_ok());
        assert!(matches!(
            check_call("doc", 1),
            Err(QueryError::Arity { expected: "2 or 3", actual: 1, .. })
        ));
        assert!(matches!(check_call("sum", 1), Err(QueryError::UnknownFunction(_))));
    }

    #[test]
    fn test_effective_boolean() {
        assert!(!effective_boolean(&[]).unwrap());
        assert!(effective_boolean(&[Item::String("x".into())]).unwrap());
        assert!(!effective_boolean(&[Item::Integer(0)]).unwrap());
        assert!(effective_boolean(&[Item::Integer(1), Item::Integer(2)]).is_err());
    }
}
