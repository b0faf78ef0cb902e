use crate::error::{EvalError, EvalResult};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Object map used for structured values. Ordered for deterministic output.
pub type Object = BTreeMap<String, Value>;

type NativeFn = dyn Fn(&[Value]) -> EvalResult<Value>;

/// Callable value. Cloning shares the underlying closure.
#[derive(Clone)]
pub struct Function {
    name: Rc<str>,
    body: Rc<NativeFn>,
}

impl Function {
    pub fn new(name: impl Into<Rc<str>>, body: impl Fn(&[Value]) -> EvalResult<Value> + 'static) -> Self {
        Self {
            name: name.into(),
            body: Rc::new(body),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: &[Value]) -> EvalResult<Value> {
        (self.body)(args)
    }

    pub fn ptr_eq(&self, other: &Function) -> bool {
        Rc::ptr_eq(&self.body, &other.body)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Function: {}]", self.name)
    }
}

/// Runtime value
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(Object),
    Function(Function),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(value as f64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Value::Object(value)
    }
}

impl From<Function> for Value {
    fn from(value: Function) -> Self {
        Value::Function(value)
    }
}

impl Value {
    /// Build an object value from `(key, value)` pairs.
    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn function(name: &str, body: impl Fn(&[Value]) -> EvalResult<Value> + 'static) -> Self {
        Value::Function(Function::new(name, body))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) | Value::Function(_) => true,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// `typeof value`
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null | Value::Array(_) | Value::Object(_) => "object",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Function(_) => "function",
        }
    }

    /// `String(value)`
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    if item.is_nullish() {
                        String::new()
                    } else {
                        item.to_display_string()
                    }
                })
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) => "[object Object]".to_string(),
            Value::Function(f) => format!("function {}() {{ [native code] }}", f.name()),
        }
    }

    /// `Number(value)`
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => *n,
            Value::String(s) => string_to_number(s),
            Value::Array(items) => match items.as_slice() {
                [] => 0.0,
                [single] => single.to_number(),
                _ => f64::NAN,
            },
            Value::Object(_) | Value::Function(_) => f64::NAN,
        }
    }

    /// `a === b`
    pub fn strict_equals(&self, other: &Value) -> bool {
        self == other
    }

    /// `a == b`
    pub fn loose_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() && b.is_nullish() => true,
            (a, b) if a.is_nullish() || b.is_nullish() => false,
            (Value::Number(_), Value::String(_))
            | (Value::String(_), Value::Number(_))
            | (Value::Boolean(_), _)
            | (_, Value::Boolean(_)) => {
                if matches!((self, other), (Value::Boolean(_), Value::Boolean(_))) {
                    return self == other;
                }
                self.to_number() == other.to_number()
            }
            _ => self == other,
        }
    }

    /// Property read with JS semantics: `undefined` for missing keys, a
    /// TypeError when reading from `null`/`undefined`.
    pub fn get_member(&self, key: &str) -> EvalResult<Value> {
        match self {
            Value::Undefined | Value::Null => Err(EvalError::type_error(format!(
                "Cannot read properties of {} (reading '{}')",
                self.to_display_string(),
                key
            ))),
            Value::Object(map) => Ok(map
                .get(key)
                .cloned()
                .or_else(|| builtin_method(self, key))
                .unwrap_or_default()),
            Value::Array(items) => {
                if key == "length" {
                    return Ok(Value::Number(items.len() as f64));
                }
                if let Ok(index) = key.parse::<usize>() {
                    return Ok(items.get(index).cloned().unwrap_or_default());
                }
                Ok(builtin_method(self, key).unwrap_or_default())
            }
            Value::String(s) => {
                if key == "length" {
                    return Ok(Value::Number(s.chars().count() as f64));
                }
                if let Ok(index) = key.parse::<usize>() {
                    return Ok(s
                        .chars()
                        .nth(index)
                        .map(|c| Value::String(c.to_string()))
                        .unwrap_or_default());
                }
                Ok(builtin_method(self, key).unwrap_or_default())
            }
            Value::Function(f) if key == "name" => Ok(Value::String(f.name().to_string())),
            _ => Ok(builtin_method(self, key).unwrap_or_default()),
        }
    }

    /// Convert from JSON. Numbers become `f64`.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => Value::Array(items.iter().map(Value::from_json).collect()),
            serde_json::Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert to JSON the way `JSON.stringify` would: functions and
    /// `undefined` are dropped from objects and become `null` inside arrays,
    /// non-finite numbers become `null`. Returns `None` for a top-level value
    /// that has no JSON representation.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        match self {
            Value::Undefined | Value::Function(_) => None,
            Value::Null => Some(serde_json::Value::Null),
            Value::Boolean(b) => Some(serde_json::Value::Bool(*b)),
            Value::Number(n) => Some(
                serde_json::Number::from_f64(*n)
                    .map(|num| {
                        if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
                            serde_json::Value::Number((*n as i64).into())
                        } else {
                            serde_json::Value::Number(num)
                        }
                    })
                    .unwrap_or(serde_json::Value::Null),
            ),
            Value::String(s) => Some(serde_json::Value::String(s.clone())),
            Value::Array(items) => Some(serde_json::Value::Array(
                items
                    .iter()
                    .map(|item| item.to_json().unwrap_or(serde_json::Value::Null))
                    .collect(),
            )),
            Value::Object(map) => Some(serde_json::Value::Object(
                map.iter()
                    .filter_map(|(k, v)| v.to_json().map(|json| (k.clone(), json)))
                    .collect(),
            )),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

/// Format a number the way JavaScript prints it
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}

/// `Number(string)`: whitespace-trimmed, empty is zero, otherwise strict.
pub fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    match trimmed {
        "" => 0.0,
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ if trimmed.contains(|c: char| c.is_ascii_alphabetic() && c != 'e' && c != 'E') => f64::NAN,
        _ => trimmed.parse::<f64>().unwrap_or(f64::NAN),
    }
}

/// `parseFloat(string)`: longest leading numeric prefix, NaN when there is none.
pub fn parse_float(s: &str) -> f64 {
    let trimmed = s.trim_start();
    if trimmed.starts_with("Infinity") || trimmed.starts_with("+Infinity") {
        return f64::INFINITY;
    }
    if trimmed.starts_with("-Infinity") {
        return f64::NEG_INFINITY;
    }

    let bytes = trimmed.as_bytes();
    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    if end == digits_start || &trimmed[digits_start..end] == "." {
        return f64::NAN;
    }
    // Optional exponent, only consumed when well-formed
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }
    trimmed[..end].parse::<f64>().unwrap_or(f64::NAN)
}

fn string_arg(args: &[Value], index: usize) -> String {
    args.get(index)
        .map(Value::to_display_string)
        .unwrap_or_else(|| "undefined".to_string())
}

/// Methods available on primitive and structured receivers
fn builtin_method(receiver: &Value, key: &str) -> Option<Value> {
    let this = receiver.clone();
    let method = match (receiver, key) {
        (_, "toString") => Function::new("toString", move |_| Ok(Value::String(this.to_display_string()))),
        (Value::String(_), "toUpperCase") => Function::new("toUpperCase", move |_| {
            Ok(Value::String(this.to_display_string().to_uppercase()))
        }),
        (Value::String(_), "toLowerCase") => Function::new("toLowerCase", move |_| {
            Ok(Value::String(this.to_display_string().to_lowercase()))
        }),
        (Value::String(_), "trim") => Function::new("trim", move |_| {
            Ok(Value::String(this.to_display_string().trim().to_string()))
        }),
        (Value::String(_), "includes") => Function::new("includes", move |args| {
            Ok(Value::Boolean(this.to_display_string().contains(&string_arg(args, 0))))
        }),
        (Value::String(_), "startsWith") => Function::new("startsWith", move |args| {
            Ok(Value::Boolean(this.to_display_string().starts_with(&string_arg(args, 0))))
        }),
        (Value::String(_), "endsWith") => Function::new("endsWith", move |args| {
            Ok(Value::Boolean(this.to_display_string().ends_with(&string_arg(args, 0))))
        }),
        (Value::String(_), "split") => Function::new("split", move |args| {
            let s = this.to_display_string();
            let parts = match args.first() {
                None | Some(Value::Undefined) => vec![Value::String(s)],
                Some(separator) => {
                    let separator = separator.to_display_string();
                    if separator.is_empty() {
                        s.chars().map(|c| Value::String(c.to_string())).collect()
                    } else {
                        s.split(separator.as_str())
                            .map(|part| Value::String(part.to_string()))
                            .collect()
                    }
                }
            };
            Ok(Value::Array(parts))
        }),
        (Value::Array(_), "includes") => Function::new("includes", move |args| {
            let needle = args.first().cloned().unwrap_or_default();
            let found = match &this {
                Value::Array(items) => items.iter().any(|item| item.strict_equals(&needle)),
                _ => false,
            };
            Ok(Value::Boolean(found))
        }),
        (Value::Array(_), "indexOf") => Function::new("indexOf", move |args| {
            let needle = args.first().cloned().unwrap_or_default();
            let index = match &this {
                Value::Array(items) => items
                    .iter()
                    .position(|item| item.strict_equals(&needle))
                    .map(|i| i as f64)
                    .unwrap_or(-1.0),
                _ => -1.0,
            };
            Ok(Value::Number(index))
        }),
        (Value::Array(_), "join") => Function::new("join", move |args| {
            let separator = match args.first() {
                None | Some(Value::Undefined) => ",".to_string(),
                Some(sep) => sep.to_display_string(),
            };
            let joined = match &this {
                Value::Array(items) => items
                    .iter()
                    .map(|item| {
                        if item.is_nullish() {
                            String::new()
                        } else {
                            item.to_display_string()
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(&separator),
                _ => String::new(),
            };
            Ok(Value::String(joined))
        }),
        _ => return None,
    };
    Some(Value::Function(method))
}
