//! `${...}` interpolation splitting for text templates.

use crate::error::{CompileError, CompileResult};

/// A piece of a text template
#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Literal(String),
    Expression(String),
}

/// True when `text` contains at least one `${` opener.
pub fn has_interpolation(text: &str) -> bool {
    text.contains("${")
}

/// Split `text` into literal runs and expression sources.
///
/// Braces inside an interpolation nest, so `${ {a: 1}.a }` is one
/// expression. An unterminated interpolation is a compile error.
pub fn split_template(text: &str) -> CompileResult<Vec<TemplatePart>> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = text.char_indices().peekable();

    while let Some((pos, ch)) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some((_, '{'))) {
            chars.next();

            if !current.is_empty() {
                parts.push(TemplatePart::Literal(std::mem::take(&mut current)));
            }

            let mut source = String::new();
            let mut depth = 1;
            while depth > 0 {
                match chars.next() {
                    Some((_, '{')) => {
                        depth += 1;
                        source.push('{');
                    }
                    Some((_, '}')) => {
                        depth -= 1;
                        if depth > 0 {
                            source.push('}');
                        }
                    }
                    Some((_, c)) => source.push(c),
                    None => return Err(CompileError::unexpected_end(pos)),
                }
            }
            parts.push(TemplatePart::Expression(source));
        } else {
            current.push(ch);
        }
    }

    if !current.is_empty() {
        parts.push(TemplatePart::Literal(current));
    }

    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_literals_and_expressions() {
        let parts = split_template("Count: ${count} of ${ {a: total}.a }!").unwrap();
        assert_eq!(
            parts,
            vec![
                TemplatePart::Literal("Count: ".to_string()),
                TemplatePart::Expression("count".to_string()),
                TemplatePart::Literal(" of ".to_string()),
                TemplatePart::Expression(" {a: total}.a ".to_string()),
                TemplatePart::Literal("!".to_string()),
            ]
        );
    }

    #[test]
    fn test_plain_dollar_is_literal() {
        assert_eq!(
            split_template("$5").unwrap(),
            vec![TemplatePart::Literal("$5".to_string())]
        );
        assert!(!has_interpolation("$5"));
    }

    #[test]
    fn test_unterminated_interpolation() {
        assert_eq!(
            split_template("a ${b").unwrap_err(),
            CompileError::UnexpectedEnd { pos: 2 }
        );
    }
}
