use webcell_expression::{CompileError, Error, EvalError, ExpressionCompiler, Value, UTILITY_NAMES};

#[test]
fn test_handler_signature_with_utilities() {
    let mut names = vec!["data", "event", "firstArgument", "firstParameter", "options", "scope", "parameters"];
    names.extend_from_slice(UTILITY_NAMES);

    let compiler = ExpressionCompiler::new();
    let compiled = compiler
        .compile("parseFloat(data) + parameters.length + (typeof event)", &names)
        .unwrap();

    let result = compiled
        .call(&[
            Value::from("2.5kg"),
            Value::Undefined,
            Value::Undefined,
            Value::Undefined,
            Value::Undefined,
            Value::Undefined,
            Value::Array(vec![Value::Null, Value::Null]),
        ])
        .unwrap();
    assert_eq!(result, Value::from("4.5undefined"));
}

#[test]
fn test_bare_compiler_has_no_globals() {
    let err = ExpressionCompiler::bare()
        .evaluate("Math.max(1, 2)", &[])
        .unwrap_err();
    assert_eq!(
        err,
        Error::Eval(EvalError::NotDefined {
            name: "Math".to_string()
        })
    );
}

#[test]
fn test_custom_global() {
    let compiler = ExpressionCompiler::bare().with_global("answer", Value::Number(42.0));
    assert_eq!(compiler.evaluate("answer / 2", &[]).unwrap(), Value::Number(21.0));
}

#[test]
fn test_error_position_points_into_source() {
    let err = ExpressionCompiler::new().compile("a + * b", &["a", "b"]).unwrap_err();
    assert_eq!(err.position(), 4);
    assert!(matches!(err, CompileError::UnexpectedToken { .. }));
}

#[test]
fn test_object_literals_and_index_access() {
    let value = ExpressionCompiler::new()
        .evaluate("({ label: name, 'count': n * 2 })['count']", &[("name", Value::from("x")), ("n", Value::Number(4.0))])
        .unwrap();
    assert_eq!(value, Value::Number(8.0));
}
