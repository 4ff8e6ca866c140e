use serde::{Deserialize, Serialize};
use std::fmt;

/// How a selector string is interpreted by the remote session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Platform resource identifier (e.g. `org.wikipedia:id/search_container`).
    Id,
    /// Accessibility label / content description.
    AccessibilityId,
    /// Platform-specific query language (e.g. UiAutomator on Android).
    PlatformQuery,
    #[serde(rename = "xpath")]
    XPath,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Id => "id",
            Strategy::AccessibilityId => "accessibility id",
            Strategy::PlatformQuery => "platform query",
            Strategy::XPath => "xpath",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A symbolic reference to one UI element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementDescriptor {
    pub strategy: Strategy,
    pub selector: String,
    pub description: String,
}

impl ElementDescriptor {
    pub fn new(
        strategy: Strategy,
        selector: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            strategy,
            selector: selector.into(),
            description: description.into(),
        }
    }

    pub fn id(selector: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(Strategy::Id, selector, description)
    }

    pub fn accessibility_id(selector: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(Strategy::AccessibilityId, selector, description)
    }

    pub fn platform_query(selector: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(Strategy::PlatformQuery, selector, description)
    }

    pub fn xpath(selector: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(Strategy::XPath, selector, description)
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey {
            selector: self.selector.clone(),
            description: self.description.clone(),
        }
    }
}

impl fmt::Display for ElementDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} '{}')", self.description, self.strategy, self.selector)
    }
}

/// Cache identity of a descriptor: the exact (selector, description) pair.
/// The strategy does not participate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub selector: String,
    pub description: String,
}
