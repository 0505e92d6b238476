//! Query tokenizer

use super::errors::{QueryError, QueryResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Slash,
    DoubleSlash,
    LBracket,
    RBracket,
    LParen,
    RParen,
    At,
    Comma,
    Pipe,
    Dot,
    DotDot,
    Star,
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Name(String),
    Str(String),
    Int(i64),
}

/// Token with its byte offset in the query text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    pub token: Token,
    pub offset: usize,
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')
}

pub fn tokenize(input: &str) -> QueryResult<Vec<Spanned>> {
    let chars: Vec<(usize, char)> = input.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (offset, c) = chars[i];
        let next = chars.get(i + 1).map(|(_, c)| *c);

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let (token, width) = match c {
            '/' if next == Some('/') => (Token::DoubleSlash, 2),
            '/' => (Token::Slash, 1),
            '.' if next == Some('.') => (Token::DotDot, 2),
            '.' => (Token::Dot, 1),
            '[' => (Token::LBracket, 1),
            ']' => (Token::RBracket, 1),
            '(' => (Token::LParen, 1),
            ')' => (Token::RParen, 1),
            '@' => (Token::At, 1),
            ',' => (Token::Comma, 1),
            '|' => (Token::Pipe, 1),
            '*' => (Token::Star, 1),
            '=' => (Token::Eq, 1),
            '!' if next == Some('=') => (Token::NotEq, 2),
            '<' if next == Some('=') => (Token::Le, 2),
            '<' => (Token::Lt, 1),
            '>' if next == Some('=') => (Token::Ge, 2),
            '>' => (Token::Gt, 1),
            '"' | '\'' => {
                let quote = c;
                let mut j = i + 1;
                let mut value = String::new();
                loop {
                    match chars.get(j) {
                        None => return Err(QueryError::syntax(offset, "unterminated string literal")),
                        // A doubled quote stands for one literal quote.
                        Some((_, ch)) if *ch == quote => {
                            if chars.get(j + 1).map(|(_, c)| *c) == Some(quote) {
                                value.push(quote);
                                j += 2;
                            } else {
                                break;
                            }
                        }
                        Some((_, ch)) => {
                            value.push(*ch);
                            j += 1;
                        }
                    }
                }
                (Token::Str(value), j + 1 - i)
            }
            c if c.is_ascii_digit() => {
                let mut j = i;
                while chars.get(j).map(|(_, c)| c.is_ascii_digit()).unwrap_or(false) {
                    j += 1;
                }
                let end = chars.get(j).map(|(o, _)| *o).unwrap_or(input.len());
                let value = input[offset..end]
                    .parse::<i64>()
                    .map_err(|_| QueryError::syntax(offset, "integer literal out of range"))?;
                (Token::Int(value), j - i)
            }
            c if is_name_start(c) => {
                let mut j = i;
                while chars.get(j).map(|(_, c)| is_name_char(*c)).unwrap_or(false) {
                    j += 1;
                }
                let end = chars.get(j).map(|(o, _)| *o).unwrap_or(input.len());
                (Token::Name(input[offset..end].to_string()), j - i)
            }
            other => {
                return Err(QueryError::syntax(
                    offset,
                    format!("unexpected character '{}'", other),
                ))
            }
        };

        tokens.push(Spanned { token, offset });
        i += width;
    }

    Ok(tokens)
}
