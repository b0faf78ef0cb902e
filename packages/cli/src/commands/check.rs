use super::manifest_path;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;
use webcell_dom::{parse_fragment, Document};
use webcell_element::{ComponentClass, Manifest, Registry, TemplateBinder, DEFAULT_MANIFEST_NAME};
use webcell_expression::ExpressionCompiler;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Component manifest
    #[arg(default_value = DEFAULT_MANIFEST_NAME)]
    pub manifest: PathBuf,
}

/// Findings for one component.
#[derive(Debug, Default)]
pub struct ComponentReport {
    pub tag: String,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

pub fn check(args: CheckArgs, cwd: &Path) -> Result<()> {
    let path = manifest_path(cwd, &args.manifest);
    println!("🔍 {} {}", "Checking".green().bold(), path.display());

    let manifest = Manifest::load(&path)?;
    let registry = Registry::new();
    let mut errors = 0;
    let mut warnings = 0;

    for (tag, class) in manifest.classes()? {
        let report = check_component(&registry, tag.as_deref(), class);
        errors += report.errors.len();
        warnings += report.warnings.len();

        let mark = if report.errors.is_empty() { "✓".green() } else { "✗".red() };
        println!("  {} {}", mark, report.tag);
        for error in &report.errors {
            println!("      {} {}", "error:".red(), error);
        }
        for warning in &report.warnings {
            println!("      {} {}", "warning:".yellow(), warning);
        }
    }

    println!();
    println!("   {} errors, {} warnings", errors, warnings);
    if errors > 0 {
        return Err(anyhow!("{} component error(s)", errors));
    }
    Ok(())
}

pub fn check_component(registry: &Registry, tag: Option<&str>, class: ComponentClass) -> ComponentReport {
    let mut report = ComponentReport {
        tag: tag.map(str::to_string).unwrap_or_else(|| class.default_tag()),
        ..Default::default()
    };

    if let Err(err) = registry.define(tag, class.clone()) {
        report.errors.push(err.to_string());
    }

    for name in class.config().reflected() {
        if class.config().property_type(name).is_none() {
            report
                .warnings
                .push(format!("`{}` is reflected but has no declared type", name));
        }
    }

    let Some(markup) = class.template_markup() else {
        return report;
    };
    let doc = Document::new();
    let fragment = match parse_fragment(&doc, markup) {
        Ok(fragment) => fragment,
        Err(err) => {
            report.errors.push(err.to_string());
            return report;
        }
    };

    let mut names: BTreeSet<String> = class.config().known_names();
    names.insert("props".to_string());
    names.insert("this".to_string());
    let names: Vec<String> = names.into_iter().collect();

    let mut binder = TemplateBinder::new(ExpressionCompiler::new());
    binder.compile(&doc, &doc.children(fragment), &names);
    debug!(tag = %report.tag, bindings = binder.cached_nodes(), "compiled template");
    report
        .errors
        .extend(binder.diagnostics().iter().map(ToString::to_string));

    report
}
