//! Attribute names used by weaving.

use crate::dom::query::Selector;

/// Configuration for the loom: which element attributes drive weaving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoomConfig {
    /// Attribute listing widgets pending activation.
    pub weave: String,
    /// Attribute restricting which woven widgets an unweave tears down.
    pub unweave: String,
    /// Attribute listing widgets currently active on the element.
    pub woven: String,
}

impl Default for LoomConfig {
    fn default() -> Self {
        Self {
            weave: "data-weave".to_owned(),
            unweave: "data-unweave".to_owned(),
            woven: "data-woven".to_owned(),
        }
    }
}

impl LoomConfig {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the weave attribute name (builder).
    pub fn with_weave(mut self, attr: impl Into<String>) -> Self {
        self.weave = attr.into();
        self
    }

    /// Set the unweave attribute name (builder).
    pub fn with_unweave(mut self, attr: impl Into<String>) -> Self {
        self.unweave = attr.into();
        self
    }

    /// Set the woven attribute name (builder).
    pub fn with_woven(mut self, attr: impl Into<String>) -> Self {
        self.woven = attr.into();
        self
    }

    /// Selector for elements pending activation.
    pub fn weave_selector(&self) -> Selector {
        Selector::attr(&self.weave)
    }

    /// Selector for active elements.
    pub fn woven_selector(&self) -> Selector {
        Selector::attr(&self.woven)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = LoomConfig::default();
        assert_eq!(config.weave, "data-weave");
        assert_eq!(config.unweave, "data-unweave");
        assert_eq!(config.woven, "data-woven");
    }

    #[test]
    fn builders() {
        let config = LoomConfig::new()
            .with_weave("data-my-weave")
            .with_unweave("data-my-unweave")
            .with_woven("data-my-woven");
        assert_eq!(config.weave_selector().to_string(), "[data-my-weave]");
        assert_eq!(config.woven_selector().to_string(), "[data-my-woven]");
        assert_eq!(config.unweave, "data-my-unweave");
    }
}
