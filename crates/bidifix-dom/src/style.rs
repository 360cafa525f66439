//! Inline style declarations.
//!
//! A deliberately small, permissive `style` attribute parser: split on `;`,
//! split each declaration on the first `:`, lowercase the property name,
//! keep the raw value. Malformed declarations are dropped rather than
//! reported; an inline style is presentation data, not input to validate.

use std::collections::BTreeMap;

/// Parse an inline style attribute into `(property, value)` pairs.
pub fn parse_inline_declarations(source: &str) -> Vec<(String, String)> {
    source
        .split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim().to_string();
            if name.is_empty() || value.is_empty() {
                return None;
            }
            Some((name, value))
        })
        .collect()
}

/// Render a style map back into attribute form.
pub fn render_inline_declarations(style: &BTreeMap<String, String>) -> String {
    style
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>()
        .join("; ")
}
