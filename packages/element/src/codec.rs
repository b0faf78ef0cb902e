//! # Attribute Codec
//!
//! Converts between raw attribute strings and property values according to
//! the declared [`PropType`]. Decoding failures never propagate: they are
//! logged and turn into either `undefined` or a skipped update.
//!
//! | type       | absent      | present                                   |
//! |------------|-------------|-------------------------------------------|
//! | `boolean`  | `false`     | `true`, except the literal `"false"`      |
//! | `number`   | `null`      | `parseFloat`, `undefined` when not numeric |
//! | `string`   | `null`      | passthrough                               |
//! | `function` | `undefined` | compiled handler                          |
//! | `json`     | `null`      | `JSON.parse`, skipped on failure          |
//! | `generic`  | `null`      | `true` when empty, else evaluated         |

use crate::config::PropType;
use std::rc::{Rc, Weak};
use tracing::warn;
use webcell_expression::{
    format_number, parse_float, utilities, ExpressionCompiler, Value, UTILITY_NAMES,
};

/// Leading positional parameters of compiled function attributes.
pub const FUNCTION_PARAMETERS: &[&str] = &[
    "data",
    "event",
    "firstArgument",
    "firstParameter",
    "options",
    "scope",
    "parameters",
];

/// Outcome of decoding one attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Value(Value),
    /// Keep the previous value
    Skip,
}

/// Outcome of encoding one property for reflection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Encoded {
    Set(String),
    Remove,
    /// The attribute already holds this representation, or the type is never reflected
    Unchanged,
}

/// Callbacks wrapped around every compiled function attribute.
pub trait FunctionBridge {
    /// Before the body runs.
    fn before_call(&self, property: &str, args: &[Value]);

    /// After the body ran.
    fn after_call(&self, property: &str, args: &[Value]);
}

/// What the codec needs from its owner.
#[derive(Clone)]
pub struct CodecContext {
    pub compiler: ExpressionCompiler,
    pub bridge: Option<Weak<dyn FunctionBridge>>,
}

impl Default for CodecContext {
    fn default() -> Self {
        Self {
            compiler: ExpressionCompiler::new(),
            bridge: None,
        }
    }
}

/// Decode a raw attribute value (`None` = attribute absent).
pub fn decode(name: &str, raw: Option<&str>, ty: PropType, cx: &CodecContext) -> Decoded {
    match ty {
        PropType::Boolean => Decoded::Value(Value::Boolean(matches!(raw, Some(v) if v != "false"))),

        PropType::Number => Decoded::Value(match raw {
            None => Value::Null,
            Some(raw) => {
                let n = parse_float(raw);
                if n.is_nan() {
                    Value::Undefined
                } else {
                    Value::Number(n)
                }
            }
        }),

        PropType::String => Decoded::Value(raw.map(Value::from).unwrap_or(Value::Null)),

        PropType::Function => Decoded::Value(match raw {
            None => Value::Undefined,
            Some(source) => compile_function(name, source, cx),
        }),

        PropType::Json => match raw {
            None => Decoded::Value(Value::Null),
            Some(raw) => match serde_json::from_str::<serde_json::Value>(raw) {
                Ok(json) => Decoded::Value(Value::from_json(&json)),
                Err(e) => {
                    warn!(attribute = name, error = %e, "invalid JSON attribute, keeping previous value");
                    Decoded::Skip
                }
            },
        },

        PropType::Generic => match raw {
            None => Decoded::Value(Value::Null),
            Some("") => Decoded::Value(Value::Boolean(true)),
            Some(source) => match cx.compiler.evaluate(source, &[]) {
                Ok(value) => Decoded::Value(value),
                Err(e) => {
                    warn!(attribute = name, expression = source, error = %e, "attribute evaluation failed, update skipped");
                    Decoded::Skip
                }
            },
        },
    }
}

/// Evaluate a `-name` attribute against the utility scope, whatever the
/// declared type. Failures produce `undefined`.
pub fn pre_evaluate(name: &str, raw: Option<&str>, cx: &CodecContext) -> Value {
    let Some(source) = raw else {
        return Value::Undefined;
    };
    let scope = utilities();
    let args: Vec<Value> = UTILITY_NAMES
        .iter()
        .map(|n| scope.get(*n).cloned().unwrap_or_default())
        .collect();
    let result = cx
        .compiler
        .compile(source, UTILITY_NAMES)
        .map_err(webcell_expression::Error::from)
        .and_then(|compiled| compiled.call(&args).map_err(webcell_expression::Error::from));

    match result {
        Ok(value) => value,
        Err(e) => {
            warn!(attribute = name, expression = source, error = %e, "pre-evaluated attribute failed");
            Value::Undefined
        }
    }
}

/// Parameter list function attributes compile against.
pub fn function_parameter_names() -> Vec<&'static str> {
    FUNCTION_PARAMETERS
        .iter()
        .chain(UTILITY_NAMES.iter())
        .copied()
        .collect()
}

fn compile_function(property: &str, source: &str, cx: &CodecContext) -> Value {
    let compiled = match cx.compiler.compile(source, &function_parameter_names()) {
        Ok(compiled) => compiled,
        Err(e) => {
            warn!(property, expression = source, error = %e, "function attribute failed to compile");
            return Value::Undefined;
        }
    };

    let scope = utilities();
    let utility_values: Rc<Vec<Value>> = Rc::new(
        UTILITY_NAMES
            .iter()
            .map(|n| scope.get(*n).cloned().unwrap_or_default())
            .collect(),
    );
    let bridge = cx.bridge.clone();
    let name = property.to_string();

    Value::function(property, move |args| {
        let bridge = bridge.as_ref().and_then(Weak::upgrade);
        if let Some(bridge) = &bridge {
            bridge.before_call(&name, args);
        }

        let first = args.first().cloned().unwrap_or_default();
        let mut positional = vec![first; 6];
        positional.push(Value::Array(args.to_vec()));
        positional.extend(utility_values.iter().cloned());
        let result = compiled.call(&positional);

        if let Some(bridge) = &bridge {
            bridge.after_call(&name, args);
        }
        result
    })
}

/// Encode a property value for its reflected attribute. `current` is the
/// attribute's present value.
pub fn encode(name: &str, value: &Value, ty: PropType, current: Option<&str>) -> Encoded {
    let remove = || {
        if current.is_some() {
            Encoded::Remove
        } else {
            Encoded::Unchanged
        }
    };

    let encoded = match (ty, value) {
        (PropType::Function, _) => return Encoded::Unchanged,
        (_, Value::Undefined | Value::Null | Value::Boolean(false)) => return remove(),
        (_, Value::String(s)) if s.is_empty() => return remove(),
        (_, Value::Number(n)) if n.is_nan() => return remove(),
        (_, Value::Boolean(true)) => String::new(),
        (PropType::Number, v) => format_number(v.to_number()),
        (PropType::String | PropType::Boolean, v) => v.to_display_string(),
        (PropType::Json | PropType::Generic, Value::Number(n)) => format_number(*n),
        (PropType::Json | PropType::Generic, v) => match v.to_json() {
            Some(json) => json.to_string(),
            None => {
                warn!(property = name, "value has no attribute representation, removing attribute");
                return remove();
            }
        },
    };

    if current == Some(encoded.as_str()) {
        Encoded::Unchanged
    } else {
        Encoded::Set(encoded)
    }
}
