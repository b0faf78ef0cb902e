/// Source span (byte offsets into the expression text)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// How an identifier was resolved when the expression was compiled.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// Not yet resolved (fresh from the parser)
    Unresolved,
    /// Positional parameter slot
    Parameter(usize),
    /// Configured global/utility value, looked up by name at call time
    Global,
    /// Neither a parameter nor a global; reading it throws
    Free,
}

/// Literal values that can appear in source text
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    String(String),
    Boolean(bool),
    Null,
    Undefined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Negate,
    Plus,
    Typeof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    Equals,
    NotEquals,
    StrictEquals,
    StrictNotEquals,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    Coalesce,
}

/// Expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal {
        value: Literal,
        span: Span,
    },

    Identifier {
        name: String,
        binding: Binding,
        span: Span,
    },

    Array {
        elements: Vec<Expr>,
        span: Span,
    },

    Object {
        properties: Vec<(String, Expr)>,
        span: Span,
    },

    /// `object.property` / `object?.property`
    Member {
        object: Box<Expr>,
        property: String,
        optional: bool,
        span: Span,
    },

    /// `object[index]`
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
        span: Span,
    },

    Call {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
        span: Span,
    },

    Unary {
        operator: UnaryOp,
        operand: Box<Expr>,
        span: Span,
    },

    Binary {
        left: Box<Expr>,
        operator: BinaryOp,
        right: Box<Expr>,
        span: Span,
    },

    Logical {
        left: Box<Expr>,
        operator: LogicalOp,
        right: Box<Expr>,
        span: Span,
    },

    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
        span: Span,
    },

    /// `a; b; c` evaluates to `c`
    Sequence {
        expressions: Vec<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal { span, .. }
            | Expr::Identifier { span, .. }
            | Expr::Array { span, .. }
            | Expr::Object { span, .. }
            | Expr::Member { span, .. }
            | Expr::Index { span, .. }
            | Expr::Call { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Logical { span, .. }
            | Expr::Conditional { span, .. }
            | Expr::Sequence { span, .. } => *span,
        }
    }

    /// Visit every identifier mutably (used for binding resolution).
    pub fn walk_identifiers_mut(&mut self, visit: &mut impl FnMut(&str, &mut Binding)) {
        match self {
            Expr::Literal { .. } => {}
            Expr::Identifier { name, binding, .. } => visit(name, binding),
            Expr::Array { elements, .. } => {
                for element in elements {
                    element.walk_identifiers_mut(visit);
                }
            }
            Expr::Object { properties, .. } => {
                for (_, value) in properties {
                    value.walk_identifiers_mut(visit);
                }
            }
            Expr::Member { object, .. } => object.walk_identifiers_mut(visit),
            Expr::Index { object, index, .. } => {
                object.walk_identifiers_mut(visit);
                index.walk_identifiers_mut(visit);
            }
            Expr::Call {
                callee, arguments, ..
            } => {
                callee.walk_identifiers_mut(visit);
                for argument in arguments {
                    argument.walk_identifiers_mut(visit);
                }
            }
            Expr::Unary { operand, .. } => operand.walk_identifiers_mut(visit),
            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                left.walk_identifiers_mut(visit);
                right.walk_identifiers_mut(visit);
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
                ..
            } => {
                test.walk_identifiers_mut(visit);
                consequent.walk_identifiers_mut(visit);
                alternate.walk_identifiers_mut(visit);
            }
            Expr::Sequence { expressions, .. } => {
                for expression in expressions {
                    expression.walk_identifiers_mut(visit);
                }
            }
        }
    }
}
