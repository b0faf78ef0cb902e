//! Name conversions between properties, attributes, events and tags.

/// `onValueChange` → `on-value-change`
pub fn camel_to_kebab(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('-');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// `on-value-change` → `onValueChange`
pub fn kebab_to_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for ch in name.chars() {
        if ch == '-' {
            upper = true;
        } else if upper {
            out.push(ch.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// DOM event name for an output-event property: `onValueChange` → `value-change`.
pub fn output_event_name(property: &str) -> String {
    match property.strip_prefix("on") {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_uppercase()) => camel_to_kebab(rest),
        _ => camel_to_kebab(property),
    }
}

/// Binding-target property name, mapping the two reserved words.
pub fn dom_property_name(name: &str) -> String {
    match name {
        "class" => "className".to_string(),
        "for" => "htmlFor".to_string(),
        other => kebab_to_camel(other),
    }
}

/// Tag derived from a component class name: `CounterView` → `counter-view`,
/// single words get a `wc-` prefix.
pub fn tag_from_class_name(name: &str) -> String {
    let kebab = camel_to_kebab(name);
    let kebab = kebab.trim_matches('-').to_string();
    if kebab.contains('-') {
        kebab
    } else {
        format!("wc-{}", kebab)
    }
}

/// Validate a custom element tag name.
pub fn validate_tag(tag: &str) -> Result<(), String> {
    if !tag.contains('-') {
        return Err("must contain a hyphen".to_string());
    }
    if !tag.starts_with(|c: char| c.is_ascii_lowercase()) {
        return Err("must start with a lowercase letter".to_string());
    }
    if let Some(bad) = tag
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '.' | '_')))
    {
        return Err(format!("contains invalid character '{}'", bad));
    }
    Ok(())
}
