use crate::ast::*;
use crate::error::{CompileError, CompileResult};
use crate::lexer::{tokenize, SpannedToken, Token};

/// Recursive-descent parser for binding expressions
pub struct Parser<'src> {
    source: &'src str,
    tokens: Vec<SpannedToken<'src>>,
    pos: usize,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> CompileResult<Self> {
        let tokens = tokenize(source)?;
        Ok(Self {
            source,
            tokens,
            pos: 0,
        })
    }

    /// Parse the complete input; trailing tokens are an error.
    pub fn parse_program(&mut self) -> CompileResult<Expr> {
        if self.is_at_end() {
            return Err(CompileError::unexpected_end(self.source.len()));
        }

        let start = self.current_pos();
        let mut expressions = vec![self.parse_expression()?];

        while self.match_token(Token::Semi) {
            if self.is_at_end() {
                break;
            }
            expressions.push(self.parse_expression()?);
        }

        if !self.is_at_end() {
            return Err(CompileError::unexpected_token(
                self.current_pos(),
                "end of expression",
                Self::format_token(self.peek()),
            ));
        }

        if expressions.len() == 1 {
            Ok(expressions.remove(0))
        } else {
            Ok(Expr::Sequence {
                expressions,
                span: Span::new(start, self.source.len()),
            })
        }
    }

    fn parse_expression(&mut self) -> CompileResult<Expr> {
        self.parse_conditional_expression()
    }

    /// Parse `test ? consequent : alternate` (lowest precedence)
    fn parse_conditional_expression(&mut self) -> CompileResult<Expr> {
        let start = self.current_pos();
        let test = self.parse_coalesce_expression()?;

        if !self.match_token(Token::Question) {
            return Ok(test);
        }

        let consequent = self.parse_expression()?;
        self.expect(Token::Colon)?;
        let alternate = self.parse_expression()?;

        Ok(Expr::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
            span: Span::new(start, self.previous_end()),
        })
    }

    fn parse_coalesce_expression(&mut self) -> CompileResult<Expr> {
        let start = self.current_pos();
        let mut left = self.parse_or_expression()?;

        while self.match_token(Token::Coalesce) {
            let right = self.parse_or_expression()?;
            left = Expr::Logical {
                left: Box::new(left),
                operator: LogicalOp::Coalesce,
                right: Box::new(right),
                span: Span::new(start, self.previous_end()),
            };
        }

        Ok(left)
    }

    fn parse_or_expression(&mut self) -> CompileResult<Expr> {
        let start = self.current_pos();
        let mut left = self.parse_and_expression()?;

        while self.match_token(Token::Or) {
            let right = self.parse_and_expression()?;
            left = Expr::Logical {
                left: Box::new(left),
                operator: LogicalOp::Or,
                right: Box::new(right),
                span: Span::new(start, self.previous_end()),
            };
        }

        Ok(left)
    }

    fn parse_and_expression(&mut self) -> CompileResult<Expr> {
        let start = self.current_pos();
        let mut left = self.parse_equality_expression()?;

        while self.match_token(Token::And) {
            let right = self.parse_equality_expression()?;
            left = Expr::Logical {
                left: Box::new(left),
                operator: LogicalOp::And,
                right: Box::new(right),
                span: Span::new(start, self.previous_end()),
            };
        }

        Ok(left)
    }

    /// Parse equality expression (== != === !==)
    fn parse_equality_expression(&mut self) -> CompileResult<Expr> {
        let start = self.current_pos();
        let mut left = self.parse_comparison_expression()?;

        while let Some(operator) = self.match_equality_op() {
            let right = self.parse_comparison_expression()?;
            left = Expr::Binary {
                left: Box::new(left),
                operator,
                right: Box::new(right),
                span: Span::new(start, self.previous_end()),
            };
        }

        Ok(left)
    }

    /// Parse comparison expression (< > <= >=)
    fn parse_comparison_expression(&mut self) -> CompileResult<Expr> {
        let start = self.current_pos();
        let mut left = self.parse_additive_expression()?;

        while let Some(operator) = self.match_comparison_op() {
            let right = self.parse_additive_expression()?;
            left = Expr::Binary {
                left: Box::new(left),
                operator,
                right: Box::new(right),
                span: Span::new(start, self.previous_end()),
            };
        }

        Ok(left)
    }

    fn parse_additive_expression(&mut self) -> CompileResult<Expr> {
        let start = self.current_pos();
        let mut left = self.parse_multiplicative_expression()?;

        while let Some(operator) = self.match_additive_op() {
            let right = self.parse_multiplicative_expression()?;
            left = Expr::Binary {
                left: Box::new(left),
                operator,
                right: Box::new(right),
                span: Span::new(start, self.previous_end()),
            };
        }

        Ok(left)
    }

    fn parse_multiplicative_expression(&mut self) -> CompileResult<Expr> {
        let start = self.current_pos();
        let mut left = self.parse_unary_expression()?;

        while let Some(operator) = self.match_multiplicative_op() {
            let right = self.parse_unary_expression()?;
            left = Expr::Binary {
                left: Box::new(left),
                operator,
                right: Box::new(right),
                span: Span::new(start, self.previous_end()),
            };
        }

        Ok(left)
    }

    fn parse_unary_expression(&mut self) -> CompileResult<Expr> {
        let start = self.current_pos();
        let operator = if self.match_token(Token::Bang) {
            UnaryOp::Not
        } else if self.match_token(Token::Minus) {
            UnaryOp::Negate
        } else if self.match_token(Token::Plus) {
            UnaryOp::Plus
        } else if self.match_token(Token::Typeof) {
            UnaryOp::Typeof
        } else {
            return self.parse_postfix_expression();
        };

        let operand = self.parse_unary_expression()?;
        Ok(Expr::Unary {
            operator,
            operand: Box::new(operand),
            span: Span::new(start, self.previous_end()),
        })
    }

    /// Parse postfix operations: member access, indexing and calls
    fn parse_postfix_expression(&mut self) -> CompileResult<Expr> {
        let start = self.current_pos();
        let mut expr = self.parse_primary_expression()?;

        loop {
            if self.check(Token::Dot) || self.check(Token::OptionalDot) {
                let optional = self.match_token(Token::OptionalDot);
                if !optional {
                    self.advance();
                }
                let property = self.expect_property_name()?;
                expr = Expr::Member {
                    object: Box::new(expr),
                    property,
                    optional,
                    span: Span::new(start, self.previous_end()),
                };
            } else if self.match_token(Token::LBracket) {
                let index = self.parse_expression()?;
                self.expect(Token::RBracket)?;
                expr = Expr::Index {
                    object: Box::new(expr),
                    index: Box::new(index),
                    span: Span::new(start, self.previous_end()),
                };
            } else if self.match_token(Token::LParen) {
                let arguments = self.parse_list(Token::RParen)?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    arguments,
                    span: Span::new(start, self.previous_end()),
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// Parse primary expression (literals, identifiers, groups, array/object literals)
    fn parse_primary_expression(&mut self) -> CompileResult<Expr> {
        let start = self.current_pos();
        let Some((token, _)) = self.advance().cloned() else {
            return Err(CompileError::unexpected_end(self.source.len()));
        };
        let span = Span::new(start, self.previous_end());

        let literal = |value| Ok(Expr::Literal { value, span });

        match token {
            Token::Number(n) => {
                let value = n
                    .parse::<f64>()
                    .map_err(|_| CompileError::invalid_syntax(start, format!("invalid number '{}'", n)))?;
                literal(Literal::Number(value))
            }
            Token::String(s) => literal(Literal::String(unescape(s))),
            Token::True => literal(Literal::Boolean(true)),
            Token::False => literal(Literal::Boolean(false)),
            Token::Null => literal(Literal::Null),
            Token::Undefined => literal(Literal::Undefined),
            Token::Ident(name) => Ok(Expr::Identifier {
                name: name.to_string(),
                binding: Binding::Unresolved,
                span,
            }),
            Token::LParen => {
                let expr = self.parse_expression()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            Token::LBracket => {
                let elements = self.parse_list(Token::RBracket)?;
                Ok(Expr::Array {
                    elements,
                    span: Span::new(start, self.previous_end()),
                })
            }
            Token::LBrace => self.parse_object_literal(start),
            other => Err(CompileError::unexpected_token(
                start,
                "expression",
                Self::format_token(Some(&(other, start..start))),
            )),
        }
    }

    /// Parse `{ key: value, "quoted": value, shorthand }` after the opening brace
    fn parse_object_literal(&mut self, start: usize) -> CompileResult<Expr> {
        let mut properties = Vec::new();

        while !self.check(Token::RBrace) && !self.is_at_end() {
            let key_pos = self.current_pos();
            let key = match self.advance().cloned() {
                Some((Token::Ident(name), _)) => name.to_string(),
                Some((Token::String(s), _)) => unescape(s),
                Some((Token::Number(n), _)) => n.to_string(),
                other => {
                    return Err(CompileError::unexpected_token(
                        key_pos,
                        "property name",
                        Self::format_token(other.as_ref()),
                    ))
                }
            };

            let value = if self.match_token(Token::Colon) {
                self.parse_expression()?
            } else {
                Expr::Identifier {
                    name: key.clone(),
                    binding: Binding::Unresolved,
                    span: Span::new(key_pos, self.previous_end()),
                }
            };
            properties.push((key, value));

            if !self.match_token(Token::Comma) {
                break;
            }
        }

        self.expect(Token::RBrace)?;
        Ok(Expr::Object {
            properties,
            span: Span::new(start, self.previous_end()),
        })
    }

    /// Comma separated expressions up to (and including) `close`
    fn parse_list(&mut self, close: Token<'src>) -> CompileResult<Vec<Expr>> {
        let mut items = Vec::new();
        while !self.check(close.clone()) && !self.is_at_end() {
            items.push(self.parse_expression()?);

            if !self.match_token(Token::Comma) {
                break;
            }
        }
        self.expect(close)?;
        Ok(items)
    }

    // Helper methods for matching operators

    fn match_equality_op(&mut self) -> Option<BinaryOp> {
        if self.match_token(Token::EqEqEq) {
            Some(BinaryOp::StrictEquals)
        } else if self.match_token(Token::NotEqEq) {
            Some(BinaryOp::StrictNotEquals)
        } else if self.match_token(Token::EqEq) {
            Some(BinaryOp::Equals)
        } else if self.match_token(Token::NotEq) {
            Some(BinaryOp::NotEquals)
        } else {
            None
        }
    }

    fn match_comparison_op(&mut self) -> Option<BinaryOp> {
        if self.match_token(Token::Lte) {
            Some(BinaryOp::LessThanOrEqual)
        } else if self.match_token(Token::Gte) {
            Some(BinaryOp::GreaterThanOrEqual)
        } else if self.match_token(Token::Lt) {
            Some(BinaryOp::LessThan)
        } else if self.match_token(Token::Gt) {
            Some(BinaryOp::GreaterThan)
        } else {
            None
        }
    }

    fn match_additive_op(&mut self) -> Option<BinaryOp> {
        if self.match_token(Token::Plus) {
            Some(BinaryOp::Add)
        } else if self.match_token(Token::Minus) {
            Some(BinaryOp::Subtract)
        } else {
            None
        }
    }

    fn match_multiplicative_op(&mut self) -> Option<BinaryOp> {
        if self.match_token(Token::Star) {
            Some(BinaryOp::Multiply)
        } else if self.match_token(Token::Slash) {
            Some(BinaryOp::Divide)
        } else if self.match_token(Token::Percent) {
            Some(BinaryOp::Remainder)
        } else {
            None
        }
    }

    // Helper methods

    fn peek(&self) -> Option<&SpannedToken<'src>> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&SpannedToken<'src>> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn check(&self, token: Token) -> bool {
        if let Some((t, _)) = self.peek() {
            std::mem::discriminant(t) == std::mem::discriminant(&token)
        } else {
            false
        }
    }

    fn match_token(&mut self, token: Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token) -> CompileResult<()> {
        if self.check(token.clone()) {
            self.advance();
            Ok(())
        } else if self.is_at_end() {
            Err(CompileError::unexpected_end(self.source.len()))
        } else {
            Err(CompileError::unexpected_token(
                self.current_pos(),
                Self::format_expected_token(&token),
                Self::format_token(self.peek()),
            ))
        }
    }

    /// Accept identifiers and keywords after `.` (`a.null` is a valid member name)
    fn expect_property_name(&mut self) -> CompileResult<String> {
        let pos = self.current_pos();
        let name = match self.peek() {
            Some((Token::Ident(s), _)) => s.to_string(),
            Some((Token::True, _)) => "true".to_string(),
            Some((Token::False, _)) => "false".to_string(),
            Some((Token::Null, _)) => "null".to_string(),
            Some((Token::Undefined, _)) => "undefined".to_string(),
            Some((Token::Typeof, _)) => "typeof".to_string(),
            None => return Err(CompileError::unexpected_end(self.source.len())),
            other => {
                return Err(CompileError::unexpected_token(
                    pos,
                    "property name",
                    Self::format_token(other),
                ))
            }
        };
        self.advance();
        Ok(name)
    }

    fn current_pos(&self) -> usize {
        self.peek()
            .map(|(_, span)| span.start)
            .unwrap_or(self.source.len())
    }

    fn previous_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|(_, span)| span.end)
            .unwrap_or(0)
    }

    fn format_token(token: Option<&SpannedToken>) -> String {
        match token {
            Some((Token::Ident(s), _)) => format!("identifier '{}'", s),
            Some((Token::String(s), _)) => format!("string \"{}\"", s),
            Some((Token::Number(n), _)) => format!("number {}", n),
            Some((t, _)) => format!("{:?}", t),
            None => "end of input".to_string(),
        }
    }

    fn format_expected_token(token: &Token) -> String {
        match token {
            Token::RParen => "')'".to_string(),
            Token::RBracket => "']'".to_string(),
            Token::RBrace => "'}'".to_string(),
            Token::Colon => "':'".to_string(),
            other => format!("{:?}", other),
        }
    }
}

/// Resolve backslash escapes inside a string literal body
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(c) => out.push(c),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

pub fn parse(source: &str) -> CompileResult<Expr> {
    Parser::new(source)?.parse_program()
}
