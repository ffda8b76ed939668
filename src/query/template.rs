//! Query template store.
//!
//! Templates are plain SQL files kept in one directory and looked up by file
//! name.

use std::path::PathBuf;

use tracing::{debug, warn};

use super::in_clause::{build_in_list, fill_placeholder, placeholder};
use super::{QuotePolicy, SubstitutionMode};
use crate::error::{Result, SheetQueryError};

/// A directory of query templates.
#[derive(Debug, Clone)]
pub struct QueryStore {
    dir: PathBuf,
}

impl QueryStore {
    /// Creates a store rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the path a template name resolves to.
    pub fn resolve(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Loads the named template.
    pub fn load(&self, name: &str) -> Result<QueryTemplate> {
        let path = self.resolve(name);
        if !path.is_file() {
            return Err(SheetQueryError::QueryFileNotFound {
                name: name.to_string(),
                dir: self.dir.display().to_string(),
            });
        }

        let text = std::fs::read_to_string(&path).map_err(|e| {
            SheetQueryError::io(format!("Failed to read {}: {e}", path.display()))
        })?;

        debug!("Loaded query template {} ({} bytes)", path.display(), text.len());
        Ok(QueryTemplate {
            name: name.to_string(),
            text,
        })
    }
}

/// SQL text with an `IN ()` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTemplate {
    /// File name the template was loaded from.
    pub name: String,
    /// Template text, unmodified.
    pub text: String,
}

/// The SQL produced from a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    /// The statement to execute.
    pub sql: String,
    /// Whether the placeholder was found and filled.
    pub substituted: bool,
}

impl QueryTemplate {
    /// Creates a template from text.
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// Fills the `<column> IN ()` placeholder with `values`.
    ///
    /// Without the placeholder, lenient mode returns the template text
    /// unchanged and strict mode fails.
    pub fn substitute<S: AsRef<str>>(
        &self,
        column: &str,
        values: &[S],
        mode: SubstitutionMode,
        quotes: QuotePolicy,
    ) -> Result<Substitution> {
        let in_list = build_in_list(values, quotes);

        if let Some(sql) = fill_placeholder(&self.text, column, &in_list) {
            return Ok(Substitution {
                sql,
                substituted: true,
            });
        }

        let pattern = placeholder(column);
        match mode {
            SubstitutionMode::Strict => Err(SheetQueryError::PatternNotFound {
                pattern,
                query: self.name.clone(),
            }),
            SubstitutionMode::Lenient => {
                warn!(
                    "Placeholder '{pattern}' not found in '{}'; running it unchanged",
                    self.name
                );
                Ok(Substitution {
                    sql: self.text.clone(),
                    substituted: false,
                })
            }
        }
    }
}
