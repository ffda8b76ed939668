//! `IN` list construction and placeholder substitution.
//!
//! A template carries the literal placeholder `<column> IN ()`. Substitution is
//! a plain text replacement: the SQL around it is never parsed.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// What to do when a template lacks the placeholder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubstitutionMode {
    /// Run the template unchanged.
    #[default]
    Lenient,
    /// Refuse to run the template.
    Strict,
}

/// How single quotes inside values are written into the `IN` list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotePolicy {
    /// Double embedded quotes so every value stays one SQL literal.
    #[default]
    Escape,
    /// Copy values as-is. A value containing `'` can change the statement.
    Verbatim,
}

/// Returns the placeholder text for `column`: `<column> IN ()`.
pub fn placeholder(column: &str) -> String {
    format!("{column} IN ()")
}

/// Quotes one value as a SQL string literal.
pub fn quote_literal(value: &str, policy: QuotePolicy) -> String {
    match policy {
        QuotePolicy::Escape => format!("'{}'", value.replace('\'', "''")),
        QuotePolicy::Verbatim => {
            if value.contains('\'') {
                warn!("Value {value:?} contains a quote and is inserted without escaping");
            }
            format!("'{value}'")
        }
    }
}

/// Builds the comma-separated body of an `IN` list, e.g. `'101', '102'`.
pub fn build_in_list<S: AsRef<str>>(values: &[S], policy: QuotePolicy) -> String {
    values
        .iter()
        .map(|v| quote_literal(v.as_ref(), policy))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Replaces every `<column> IN ()` in `template` with the filled list.
///
/// Returns `None` when the placeholder does not appear verbatim.
pub fn fill_placeholder(template: &str, column: &str, in_list: &str) -> Option<String> {
    let pattern = placeholder(column);
    template
        .contains(&pattern)
        .then(|| template.replace(&pattern, &format!("{column} IN ({in_list})")))
}
