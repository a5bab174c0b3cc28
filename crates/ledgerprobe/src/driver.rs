//! UiDriver - the browser binding port.
//!
//! The engine never talks to a browser directly. Everything it needs from
//! the remote UI goes through [`UiDriver`]: element lookup, the handful of
//! raw commands, the native dialog channel and history navigation.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Session (sync primitive, dialog protocol, actions)          │
//! ├──────────────────────────────────────────────────────────────┤
//! │  UiDriver (trait)                                            │
//! │  ┌─────────────────────────┐   ┌──────────────────────────┐  │
//! │  │ CdpDriver               │   │ MockDriver               │  │
//! │  │ chromiumoxide, feature  │   │ scripted page, used by   │  │
//! │  │ `browser`               │   │ FakeBank and unit tests  │  │
//! │  └─────────────────────────┘   └──────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use crate::locator::Locator;
use crate::result::ProbeResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Opaque reference to a located control.
///
/// Leased for a single action. A handle obtained before a navigation may
/// point at nothing afterwards; drivers report that as a driver error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Driver-specific element reference
    pub id: String,
    /// Locator that produced this handle
    pub locator: Locator,
    /// Position among the locator's matches
    pub index: usize,
}

impl ElementHandle {
    /// Create a handle
    #[must_use]
    pub fn new(id: impl Into<String>, locator: Locator, index: usize) -> Self {
        Self {
            id: id.into(),
            locator,
            index,
        }
    }
}

/// Raw UI commands the engine relies on
#[async_trait]
pub trait UiDriver: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Load a URL
    async fn navigate(&mut self, url: &str) -> ProbeResult<()>;

    /// History back (not a fresh navigation)
    async fn back(&mut self) -> ProbeResult<()>;

    /// Current page URL
    async fn current_url(&self) -> ProbeResult<String>;

    /// Every element currently matching `locator`, in document order
    async fn find_elements(&self, locator: &Locator) -> ProbeResult<Vec<ElementHandle>>;

    /// Whether the element is rendered and visible
    async fn is_displayed(&self, element: &ElementHandle) -> ProbeResult<bool>;

    /// Whether the element accepts input
    async fn is_enabled(&self, element: &ElementHandle) -> ProbeResult<bool>;

    /// Click the element
    async fn click(&self, element: &ElementHandle) -> ProbeResult<()>;

    /// Clear an input's value
    async fn clear(&self, element: &ElementHandle) -> ProbeResult<()>;

    /// Type text into an input
    async fn send_keys(&self, element: &ElementHandle, text: &str) -> ProbeResult<()>;

    /// Rendered text of the element
    async fn text(&self, element: &ElementHandle) -> ProbeResult<String>;

    /// Current value of an input
    async fn value(&self, element: &ElementHandle) -> ProbeResult<String>;

    /// Choose the `<option>` whose visible text equals `text`
    async fn select_by_text(&self, element: &ElementHandle, text: &str) -> ProbeResult<()>;

    /// Visible texts of a select's options
    async fn options(&self, element: &ElementHandle) -> ProbeResult<Vec<String>>;

    /// Text of the open native dialog, if any
    async fn dialog_text(&self) -> ProbeResult<Option<String>>;

    /// Accept the open dialog
    async fn accept_dialog(&self) -> ProbeResult<()>;

    /// Dismiss the open dialog
    async fn dismiss_dialog(&self) -> ProbeResult<()>;

    /// PNG screenshot of the viewport
    async fn screenshot(&self) -> ProbeResult<Vec<u8>>;

    /// Release the browser
    async fn close(&mut self) -> ProbeResult<()>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_keeps_locator() {
        let handle = ElementHandle::new("e7", Locator::id("currency"), 0);
        assert_eq!(handle.locator.to_string(), "id=currency");
        assert_eq!(handle.index, 0);
    }

    #[test]
    fn test_handle_json() {
        let handle = ElementHandle::new("e1", Locator::xpath("//table"), 2);
        let json = serde_json::to_string(&handle).unwrap();
        let back: ElementHandle = serde_json::from_str(&json).unwrap();
        assert_eq!(back, handle);
    }
}
