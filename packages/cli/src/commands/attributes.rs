use super::manifest_path;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};
use webcell_element::{Manifest, DEFAULT_MANIFEST_NAME};

#[derive(Args, Debug)]
pub struct AttributesArgs {
    /// Component manifest
    #[arg(default_value = DEFAULT_MANIFEST_NAME)]
    pub manifest: PathBuf,
}

pub fn attributes(args: AttributesArgs, cwd: &Path) -> Result<()> {
    let manifest = Manifest::load(manifest_path(cwd, &args.manifest))?;

    for (tag, class) in manifest.classes()? {
        let tag = tag.unwrap_or_else(|| class.default_tag());
        println!("{} {}", tag.bright_blue().bold(), format!("({})", class.name()).dimmed());
        for attribute in class.config().observed_attributes() {
            let property = class
                .config()
                .attribute_property(attribute)
                .map(|(property, _)| property)
                .unwrap_or_default();
            let ty = class.config().property_type(&property).unwrap_or_default();
            println!("  {:<24} {} {}", attribute, property, format!("<{}>", ty).dimmed());
        }
    }

    Ok(())
}
