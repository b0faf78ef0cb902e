use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use webcell_expression::{ExpressionCompiler, Value};

#[derive(Args, Debug)]
pub struct EvalArgs {
    /// Expression to evaluate
    pub expression: String,

    /// JSON object whose entries are in scope
    #[arg(short, long)]
    pub scope: Option<String>,
}

pub fn eval(args: EvalArgs) -> Result<()> {
    let scope = match &args.scope {
        Some(json) => match Value::from_json(&serde_json::from_str(json)?) {
            Value::Object(entries) => entries,
            _ => return Err(anyhow!("--scope must be a JSON object")),
        },
        None => Default::default(),
    };

    let names: Vec<&str> = scope.keys().map(String::as_str).collect();
    let compiled = match ExpressionCompiler::new().compile(&args.expression, &names) {
        Ok(compiled) => compiled,
        Err(err) => {
            eprint!("{}", err.to_report("<expression>", &args.expression));
            return Err(anyhow!("expression does not compile"));
        }
    };

    let values: Vec<Value> = scope.values().cloned().collect();
    let value = compiled.call(&values)?;
    let rendered = value
        .to_json()
        .map(|json| json.to_string())
        .unwrap_or_else(|| value.to_display_string());

    println!("{}", rendered.green());
    Ok(())
}
