//! Parsing of the weave attribute.
//!
//! The attribute holds whitespace-separated entries, each a widget name
//! optionally followed by a parenthesised, comma-separated list of JSON
//! arguments:
//!
//! ```text
//! app/menu app/list("items", {"limit": 10}) app/footer()
//! ```

use std::fmt;

use super::completion::LoomError;
use crate::event::handler::Value;

/// One entry of the weave attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct WeaveEntry {
    /// Registered widget name.
    pub name: String,
    /// Arguments passed to the widget factory ahead of any forwarded ones.
    pub args: Vec<Value>,
    /// The entry exactly as written.
    pub source: String,
}

impl WeaveEntry {
    /// Parse a whole attribute value. An empty or blank value yields no entries.
    pub fn parse_all(attr: &str) -> Result<Vec<Self>, LoomError> {
        split_entries(attr)?
            .into_iter()
            .map(|entry| Self::parse(&entry))
            .collect()
    }

    /// Parse a single entry.
    pub fn parse(entry: &str) -> Result<Self, LoomError> {
        let invalid = |message: &str| LoomError::InvalidEntry {
            entry: entry.to_owned(),
            message: message.to_owned(),
        };

        let (name, args) = match entry.split_once('(') {
            None => (entry, Vec::new()),
            Some((name, rest)) => {
                let inner = rest
                    .strip_suffix(')')
                    .ok_or_else(|| invalid("arguments must end with ')'"))?;
                let args: Vec<Value> = serde_json::from_str(&format!("[{inner}]"))
                    .map_err(|e| invalid(&e.to_string()))?;
                (name, args)
            }
        };

        if name.is_empty() {
            return Err(invalid("missing widget name"));
        }

        Ok(Self {
            name: name.to_owned(),
            args,
            source: entry.to_owned(),
        })
    }
}

impl fmt::Display for WeaveEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Split on whitespace outside parentheses and string literals.
fn split_entries(attr: &str) -> Result<Vec<String>, LoomError> {
    let unbalanced = |message: &str| LoomError::InvalidEntry {
        entry: attr.to_owned(),
        message: message.to_owned(),
    };

    let mut entries = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for c in attr.chars() {
        if in_string {
            current.push(c);
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' if depth > 0 => {
                in_string = true;
                current.push(c);
            }
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| unbalanced("unexpected ')'"))?;
                current.push(c);
            }
            c if c.is_whitespace() && depth == 0 => {
                if !current.is_empty() {
                    entries.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }

    if in_string {
        return Err(unbalanced("unterminated string"));
    }
    if depth != 0 {
        return Err(unbalanced("unclosed '('"));
    }
    if !current.is_empty() {
        entries.push(current);
    }
    Ok(entries)
}
