//! Declarative element locators.
//!
//! A [`Locator`] says how to find a control; it never holds a live
//! reference. Live references are [`ElementHandle`](crate::ElementHandle)s
//! leased from the driver for a single action.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Selector strategy
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selector {
    /// CSS selector (e.g., "table tbody tr")
    Css(String),
    /// XPath expression
    XPath(String),
    /// Element id attribute
    Id(String),
}

impl Selector {
    /// JavaScript expression evaluating to an array of every matching element
    #[must_use]
    pub fn to_all_query(&self) -> String {
        match self {
            Self::Css(s) => format!("Array.from(document.querySelectorAll({s:?}))"),
            Self::XPath(s) => format!(
                "(() => {{ const r = document.evaluate({s:?}, document, null, \
                 XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); \
                 const out = []; for (let i = 0; i < r.snapshotLength; i++) out.push(r.snapshotItem(i)); \
                 return out; }})()"
            ),
            Self::Id(id) => format!("[document.getElementById({id:?})].filter(e => e !== null)"),
        }
    }

    /// Strategy name used in rendered locators
    #[must_use]
    pub const fn strategy(&self) -> &'static str {
        match self {
            Self::Css(_) => "css",
            Self::XPath(_) => "xpath",
            Self::Id(_) => "id",
        }
    }

    /// Raw selector text
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Css(s) | Self::XPath(s) | Self::Id(s) => s,
        }
    }
}

/// Immutable description of how to find a UI control
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator {
    selector: Selector,
}

impl Locator {
    /// Create a locator from a selector
    #[must_use]
    pub const fn new(selector: Selector) -> Self {
        Self { selector }
    }

    /// CSS locator
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::new(Selector::Css(selector.into()))
    }

    /// XPath locator
    #[must_use]
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::new(Selector::XPath(expr.into()))
    }

    /// Id locator
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self::new(Selector::Id(id.into()))
    }

    /// Underlying selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.selector.strategy(), self.selector.value())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_strategy() {
        assert_eq!(Locator::id("currency").to_string(), "id=currency");
        assert_eq!(Locator::xpath("//table").to_string(), "xpath=//table");
        assert_eq!(Locator::css("tr td").to_string(), "css=tr td");
    }

    #[test]
    fn test_xpath_query_uses_snapshot() {
        let q = Locator::xpath("//table//tr[td]").selector().to_all_query();
        assert!(q.contains("ORDERED_NODE_SNAPSHOT_TYPE"));
        assert!(q.contains("\"//table//tr[td]\""));
    }

    #[test]
    fn test_quotes_are_escaped() {
        let q = Locator::xpath("//input[@placeholder='First Name']")
            .selector()
            .to_all_query();
        assert!(q.contains("@placeholder='First Name'"));
        let q = Locator::css("a[title=\"x\"]").selector().to_all_query();
        assert!(q.contains("\\\"x\\\""));
    }

    #[test]
    fn test_yaml_shape() {
        let loc: Locator = serde_yaml_ng::from_str("xpath: //strong[text()='XYZ Bank']").unwrap();
        assert_eq!(loc, Locator::xpath("//strong[text()='XYZ Bank']"));
        let loc: Locator = serde_yaml_ng::from_str("id: userSelect").unwrap();
        assert_eq!(loc, Locator::id("userSelect"));
    }
}
