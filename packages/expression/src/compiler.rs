//! # Expression Compiler
//!
//! Turns expression source plus a list of known parameter names into a
//! [`CompiledExpression`] that accepts those names positionally.
//!
//! Identifier resolution happens once, at compile time:
//!
//! 1. Names in the parameter list become positional slots.
//! 2. Names present in the compiler's global scope (the utilities) are read
//!    from that scope.
//! 3. Anything else is a free reference; reading it fails at call time with
//!    [`EvalError::NotDefined`], except under `typeof`.
//!
//! ```rust,ignore
//! let compiler = ExpressionCompiler::new();
//! let add = compiler.compile("a + b", &["a", "b"])?;
//! assert_eq!(add.call(&[1.into(), 2.into()])?, Value::Number(3.0));
//! ```

use crate::ast::*;
use crate::error::{CompileResult, EvalError, EvalResult};
use crate::parser::parse;
use crate::template::{split_template, TemplatePart};
use crate::utilities::utilities;
use crate::value::{Object, Value};
use std::rc::Rc;

/// Compiles expressions against a fixed global scope.
#[derive(Clone)]
pub struct ExpressionCompiler {
    globals: Rc<Object>,
}

impl ExpressionCompiler {
    /// Compiler with the utility globals installed.
    pub fn new() -> Self {
        Self {
            globals: Rc::new(utilities()),
        }
    }

    /// Compiler without any globals.
    pub fn bare() -> Self {
        Self {
            globals: Rc::new(Object::new()),
        }
    }

    /// Add or replace a global.
    pub fn with_global(mut self, name: impl Into<String>, value: Value) -> Self {
        Rc::make_mut(&mut self.globals).insert(name.into(), value);
        self
    }

    pub fn globals(&self) -> &Object {
        &self.globals
    }

    /// Compile `source` so that `names[i]` binds to the i-th call argument.
    pub fn compile<S: AsRef<str>>(&self, source: &str, names: &[S]) -> CompileResult<CompiledExpression> {
        let mut expr = parse(source)?;
        let names: Vec<String> = names.iter().map(|n| n.as_ref().to_string()).collect();

        expr.walk_identifiers_mut(&mut |name: &str, binding: &mut Binding| {
            // Later duplicates shadow earlier ones, like repeated parameters
            *binding = match names.iter().rposition(|n| n == name) {
                Some(index) => Binding::Parameter(index),
                None if self.globals.contains_key(name) => Binding::Global,
                None => Binding::Free,
            };
        });

        Ok(CompiledExpression {
            source: Rc::from(source),
            names: Rc::new(names),
            expr: Rc::new(expr),
            globals: Rc::clone(&self.globals),
        })
    }

    /// Compile a text template containing `${...}` interpolations.
    pub fn compile_template<S: AsRef<str>>(&self, text: &str, names: &[S]) -> CompileResult<CompiledTemplate> {
        let mut parts = Vec::new();
        for part in split_template(text)? {
            parts.push(match part {
                TemplatePart::Literal(literal) => CompiledPart::Literal(literal),
                TemplatePart::Expression(source) => CompiledPart::Expression(self.compile(&source, names)?),
            });
        }
        Ok(CompiledTemplate {
            source: Rc::from(text),
            parts,
        })
    }

    /// Compile and immediately evaluate against named values.
    pub fn evaluate(&self, source: &str, scope: &[(&str, Value)]) -> Result<Value, crate::Error> {
        let names: Vec<&str> = scope.iter().map(|(name, _)| *name).collect();
        let compiled = self.compile(source, &names)?;
        let args: Vec<Value> = scope.iter().map(|(_, value)| value.clone()).collect();
        Ok(compiled.call(&args)?)
    }
}

impl Default for ExpressionCompiler {
    fn default() -> Self {
        Self::new()
    }
}

/// A compiled expression; cheap to clone.
#[derive(Clone)]
pub struct CompiledExpression {
    source: Rc<str>,
    names: Rc<Vec<String>>,
    expr: Rc<Expr>,
    globals: Rc<Object>,
}

impl std::fmt::Debug for CompiledExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledExpression")
            .field("source", &self.source)
            .field("names", &self.names)
            .finish()
    }
}

impl CompiledExpression {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Run with positional arguments; missing arguments are `undefined`.
    pub fn call(&self, args: &[Value]) -> EvalResult<Value> {
        let frame = Frame {
            args,
            globals: &self.globals,
        };
        frame.evaluate(&self.expr)
    }
}

#[derive(Debug, Clone)]
enum CompiledPart {
    Literal(String),
    Expression(CompiledExpression),
}

/// A compiled `${...}` text template.
#[derive(Debug, Clone)]
pub struct CompiledTemplate {
    source: Rc<str>,
    parts: Vec<CompiledPart>,
}

impl CompiledTemplate {
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render with positional arguments. `null`/`undefined` render empty.
    pub fn render(&self, args: &[Value]) -> EvalResult<String> {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                CompiledPart::Literal(text) => out.push_str(text),
                CompiledPart::Expression(expr) => {
                    let value = expr.call(args)?;
                    if !value.is_nullish() {
                        out.push_str(&value.to_display_string());
                    }
                }
            }
        }
        Ok(out)
    }
}

struct Frame<'a> {
    args: &'a [Value],
    globals: &'a Object,
}

impl Frame<'_> {
    fn evaluate(&self, expr: &Expr) -> EvalResult<Value> {
        match expr {
            Expr::Literal { value, .. } => Ok(match value {
                Literal::Number(n) => Value::Number(*n),
                Literal::String(s) => Value::String(s.clone()),
                Literal::Boolean(b) => Value::Boolean(*b),
                Literal::Null => Value::Null,
                Literal::Undefined => Value::Undefined,
            }),

            Expr::Identifier { name, binding, .. } => self.lookup(name, binding),

            Expr::Array { elements, .. } => Ok(Value::Array(
                elements
                    .iter()
                    .map(|element| self.evaluate(element))
                    .collect::<EvalResult<Vec<_>>>()?,
            )),

            Expr::Object { properties, .. } => {
                let mut map = Object::new();
                for (key, value) in properties {
                    map.insert(key.clone(), self.evaluate(value)?);
                }
                Ok(Value::Object(map))
            }

            Expr::Member {
                object,
                property,
                optional,
                ..
            } => {
                let target = self.evaluate(object)?;
                if *optional && target.is_nullish() {
                    return Ok(Value::Undefined);
                }
                target.get_member(property)
            }

            Expr::Index { object, index, .. } => {
                let target = self.evaluate(object)?;
                let key = self.evaluate(index)?;
                target.get_member(&key.to_display_string())
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                let function = self.evaluate(callee)?;
                let args = arguments
                    .iter()
                    .map(|argument| self.evaluate(argument))
                    .collect::<EvalResult<Vec<_>>>()?;
                match function {
                    Value::Function(f) => f.call(&args),
                    _ => Err(EvalError::NotCallable {
                        callee: describe_callee(callee),
                    }),
                }
            }

            Expr::Unary {
                operator, operand, ..
            } => {
                if *operator == UnaryOp::Typeof {
                    // typeof never throws on undeclared names
                    if let Expr::Identifier {
                        binding: Binding::Free,
                        ..
                    } = operand.as_ref()
                    {
                        return Ok(Value::String("undefined".to_string()));
                    }
                }
                let value = self.evaluate(operand)?;
                Ok(match operator {
                    UnaryOp::Not => Value::Boolean(!value.is_truthy()),
                    UnaryOp::Negate => Value::Number(-value.to_number()),
                    UnaryOp::Plus => Value::Number(value.to_number()),
                    UnaryOp::Typeof => Value::String(value.type_of().to_string()),
                })
            }

            Expr::Binary {
                left,
                operator,
                right,
                ..
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                Ok(binary(*operator, &left, &right))
            }

            Expr::Logical {
                left,
                operator,
                right,
                ..
            } => {
                let left = self.evaluate(left)?;
                let short_circuit = match operator {
                    LogicalOp::And => !left.is_truthy(),
                    LogicalOp::Or => left.is_truthy(),
                    LogicalOp::Coalesce => !left.is_nullish(),
                };
                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Conditional {
                test,
                consequent,
                alternate,
                ..
            } => {
                if self.evaluate(test)?.is_truthy() {
                    self.evaluate(consequent)
                } else {
                    self.evaluate(alternate)
                }
            }

            Expr::Sequence { expressions, .. } => {
                let mut last = Value::Undefined;
                for expression in expressions {
                    last = self.evaluate(expression)?;
                }
                Ok(last)
            }
        }
    }

    fn lookup(&self, name: &str, binding: &Binding) -> EvalResult<Value> {
        match binding {
            Binding::Parameter(index) => Ok(self.args.get(*index).cloned().unwrap_or_default()),
            Binding::Global => Ok(self.globals.get(name).cloned().unwrap_or_default()),
            Binding::Free | Binding::Unresolved => Err(EvalError::NotDefined {
                name: name.to_string(),
            }),
        }
    }
}

fn binary(operator: BinaryOp, left: &Value, right: &Value) -> Value {
    match operator {
        BinaryOp::Add => {
            let stringy = |v: &Value| {
                matches!(
                    v,
                    Value::String(_) | Value::Array(_) | Value::Object(_) | Value::Function(_)
                )
            };
            if stringy(left) || stringy(right) {
                Value::String(format!(
                    "{}{}",
                    left.to_display_string(),
                    right.to_display_string()
                ))
            } else {
                Value::Number(left.to_number() + right.to_number())
            }
        }
        BinaryOp::Subtract => Value::Number(left.to_number() - right.to_number()),
        BinaryOp::Multiply => Value::Number(left.to_number() * right.to_number()),
        BinaryOp::Divide => Value::Number(left.to_number() / right.to_number()),
        BinaryOp::Remainder => Value::Number(left.to_number() % right.to_number()),
        BinaryOp::Equals => Value::Boolean(left.loose_equals(right)),
        BinaryOp::NotEquals => Value::Boolean(!left.loose_equals(right)),
        BinaryOp::StrictEquals => Value::Boolean(left.strict_equals(right)),
        BinaryOp::StrictNotEquals => Value::Boolean(!left.strict_equals(right)),
        BinaryOp::LessThan
        | BinaryOp::LessThanOrEqual
        | BinaryOp::GreaterThan
        | BinaryOp::GreaterThanOrEqual => {
            let ordering = match (left, right) {
                (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                _ => left.to_number().partial_cmp(&right.to_number()),
            };
            let result = match ordering {
                None => false,
                Some(ord) => match operator {
                    BinaryOp::LessThan => ord.is_lt(),
                    BinaryOp::LessThanOrEqual => ord.is_le(),
                    BinaryOp::GreaterThan => ord.is_gt(),
                    _ => ord.is_ge(),
                },
            };
            Value::Boolean(result)
        }
    }
}

fn describe_callee(callee: &Expr) -> String {
    match callee {
        Expr::Identifier { name, .. } => name.clone(),
        Expr::Member {
            object, property, ..
        } => format!("{}.{}", describe_callee(object), property),
        _ => "expression".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompileError;

    fn eval(source: &str, scope: &[(&str, Value)]) -> Value {
        ExpressionCompiler::new()
            .evaluate(source, scope)
            .unwrap_or_else(|e| panic!("{} failed: {}", source, e))
    }

    #[test]
    fn test_positional_parameters() {
        let compiler = ExpressionCompiler::new();
        let compiled = compiler.compile("a * 10 + b", &["a", "b"]).unwrap();
        assert_eq!(
            compiled.call(&[Value::Number(2.0), Value::Number(3.0)]).unwrap(),
            Value::Number(23.0)
        );
        // Missing arguments are undefined
        assert!(compiled.call(&[Value::Number(2.0)]).unwrap().to_number().is_nan());
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(
            eval("'n=' + n", &[("n", Value::Number(4.0))]),
            Value::from("n=4")
        );
    }

    #[test]
    fn test_logical_operators_return_operands() {
        assert_eq!(eval("a || 'fallback'", &[("a", Value::from(""))]), Value::from("fallback"));
        assert_eq!(eval("a ?? 'x'", &[("a", Value::Number(0.0))]), Value::Number(0.0));
        assert_eq!(eval("a && a.b", &[("a", Value::Null)]), Value::Null);
    }

    #[test]
    fn test_free_reference_fails_at_call_time() {
        let compiler = ExpressionCompiler::new();
        let compiled = compiler.compile("missing + 1", &["a"]).unwrap();
        assert_eq!(
            compiled.call(&[]).unwrap_err(),
            EvalError::NotDefined {
                name: "missing".to_string()
            }
        );
        assert_eq!(eval("typeof missing", &[]), Value::from("undefined"));
    }

    #[test]
    fn test_utilities_resolve_as_globals() {
        assert_eq!(eval("Math.max(1, 5, 3)", &[]), Value::Number(5.0));
        assert_eq!(
            eval("JSON.parse('{\"a\": [1]}').a[0]", &[]),
            Value::Number(1.0)
        );
        assert_eq!(eval("JSON.stringify({b: 2, a: 'x'})", &[]), Value::from(r#"{"a":"x","b":2}"#));
    }

    #[test]
    fn test_parameters_shadow_globals() {
        assert_eq!(eval("Math", &[("Math", Value::Number(1.0))]), Value::Number(1.0));
    }

    #[test]
    fn test_method_calls_on_this() {
        let this = Value::object([(
            "double",
            Value::function("double", |args| {
                Ok(Value::Number(args.first().map(Value::to_number).unwrap_or(0.0) * 2.0))
            }),
        )]);
        assert_eq!(eval("this.double(21)", &[("this", this)]), Value::Number(42.0));
    }

    #[test]
    fn test_calling_non_function() {
        let err = ExpressionCompiler::new()
            .evaluate("a.b()", &[("a", Value::object([("b", Value::Number(1.0))]))])
            .unwrap_err();
        assert!(err.to_string().contains("a.b is not a function"));
    }

    #[test]
    fn test_optional_member() {
        assert_eq!(eval("a?.b", &[("a", Value::Undefined)]), Value::Undefined);
    }

    #[test]
    fn test_conditional_and_comparison() {
        assert_eq!(
            eval("n >= 10 ? 'big' : 'small'", &[("n", Value::Number(3.0))]),
            Value::from("small")
        );
        assert_eq!(eval("'b' > 'a'", &[]), Value::Boolean(true));
    }

    #[test]
    fn test_sequence_returns_last() {
        assert_eq!(eval("1; 2; 3", &[]), Value::Number(3.0));
    }

    #[test]
    fn test_compile_error_surfaces() {
        let err = ExpressionCompiler::new().compile("this.x(", &["this"]).unwrap_err();
        assert!(matches!(err, CompileError::UnexpectedEnd { .. }));
    }

    #[test]
    fn test_template_rendering() {
        let compiler = ExpressionCompiler::new();
        let template = compiler
            .compile_template("Hello ${name}, you have ${count + 1} items${missing}", &["name", "count", "missing"])
            .unwrap();
        let rendered = template
            .render(&[Value::from("Ada"), Value::Number(1.0), Value::Undefined])
            .unwrap();
        assert_eq!(rendered, "Hello Ada, you have 2 items");
    }
}
