//! The fixed utility scope available to every compiled expression.

use crate::error::EvalError;
use crate::value::{format_number, parse_float, Function, Object, Value};

/// Names of the utility globals, in the order they are appended to
/// positional parameter lists.
pub const UTILITY_NAMES: &[&str] = &[
    "Boolean",
    "JSON",
    "Math",
    "Number",
    "String",
    "isNaN",
    "parseFloat",
    "parseInt",
];

/// Build the utility scope.
pub fn utilities() -> Object {
    let mut scope = Object::new();
    scope.insert("Boolean".into(), function("Boolean", |args| {
        Ok(Value::Boolean(arg(args, 0).is_truthy()))
    }));
    scope.insert("Number".into(), function("Number", |args| {
        Ok(Value::Number(match args.first() {
            None => 0.0,
            Some(value) => value.to_number(),
        }))
    }));
    scope.insert("String".into(), function("String", |args| {
        Ok(Value::String(match args.first() {
            None => String::new(),
            Some(value) => value.to_display_string(),
        }))
    }));
    scope.insert("isNaN".into(), function("isNaN", |args| {
        Ok(Value::Boolean(arg(args, 0).to_number().is_nan()))
    }));
    scope.insert("parseFloat".into(), function("parseFloat", |args| {
        Ok(Value::Number(parse_float(&arg(args, 0).to_display_string())))
    }));
    scope.insert("parseInt".into(), function("parseInt", |args| {
        Ok(Value::Number(parse_float(&arg(args, 0).to_display_string()).trunc()))
    }));
    scope.insert("JSON".into(), json_object());
    scope.insert("Math".into(), math_object());
    scope
}

fn function(
    name: &str,
    body: impl Fn(&[Value]) -> Result<Value, EvalError> + 'static,
) -> Value {
    Value::Function(Function::new(name, body))
}

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or_default()
}

fn json_object() -> Value {
    Value::object([
        (
            "parse",
            function("parse", |args| {
                let text = arg(args, 0).to_display_string();
                serde_json::from_str::<serde_json::Value>(&text)
                    .map(|json| Value::from_json(&json))
                    .map_err(|e| EvalError::thrown(format!("SyntaxError: {}", e)))
            }),
        ),
        (
            "stringify",
            function("stringify", |args| {
                Ok(match arg(args, 0).to_json() {
                    Some(json) => Value::String(json.to_string()),
                    None => Value::Undefined,
                })
            }),
        ),
    ])
}

fn math_object() -> Value {
    fn numbers(args: &[Value]) -> Vec<f64> {
        args.iter().map(Value::to_number).collect()
    }

    Value::object([
        (
            "min",
            function("min", |args| {
                Ok(Value::Number(
                    numbers(args).into_iter().fold(f64::INFINITY, |acc, n| {
                        if acc.is_nan() || n.is_nan() {
                            f64::NAN
                        } else {
                            acc.min(n)
                        }
                    }),
                ))
            }),
        ),
        (
            "max",
            function("max", |args| {
                Ok(Value::Number(
                    numbers(args).into_iter().fold(f64::NEG_INFINITY, |acc, n| {
                        if acc.is_nan() || n.is_nan() {
                            f64::NAN
                        } else {
                            acc.max(n)
                        }
                    }),
                ))
            }),
        ),
        (
            "round",
            function("round", |args| {
                // JS rounds .5 towards +Infinity
                Ok(Value::Number((arg(args, 0).to_number() + 0.5).floor()))
            }),
        ),
        (
            "floor",
            function("floor", |args| Ok(Value::Number(arg(args, 0).to_number().floor()))),
        ),
        (
            "ceil",
            function("ceil", |args| Ok(Value::Number(arg(args, 0).to_number().ceil()))),
        ),
        (
            "abs",
            function("abs", |args| Ok(Value::Number(arg(args, 0).to_number().abs()))),
        ),
    ])
}

/// Debug helper used by diagnostics: short printable form of a value.
pub fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => format!("{:?}", s),
        Value::Number(n) => format_number(*n),
        other => other
            .to_json()
            .map(|json| json.to_string())
            .unwrap_or_else(|| other.to_display_string()),
    }
}
