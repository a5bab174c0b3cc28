//! Scripted in-memory driver.
//!
//! [`MockDriver`] keeps a flat list of [`MockElement`]s keyed by the
//! rendered locator string, plus a dialog slot, a history stack and the
//! call log. Handlers attached to clicks, typing, navigation and history
//! back let a test (or [`FakeBank`]) script the page's reactions.
//!
//! Like a real browser, every page command fails while a dialog is open.

mod bank;

pub use bank::{BankAccount, BankBehavior, BankCustomer, FakeBank};

use crate::driver::{ElementHandle, UiDriver};
use crate::locator::Locator;
use crate::result::{ProbeError, ProbeResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// Minimal valid PNG signature, returned as the default screenshot
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// One scripted element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockElement {
    /// Assigned on insert
    pub id: String,
    /// Rendered locator this element answers to
    pub key: String,
    /// Rendered text
    pub text: String,
    /// Input value
    pub value: String,
    /// Displayed
    pub visible: bool,
    /// Enabled
    pub enabled: bool,
    /// Option texts, for selects
    pub options: Vec<String>,
    /// Hidden from the first `n` lookups of its locator
    pub appears_after: u32,
}

impl MockElement {
    /// Visible, enabled, empty element answering to `locator`
    #[must_use]
    pub fn new(locator: &Locator) -> Self {
        Self {
            id: String::new(),
            key: locator.to_string(),
            text: String::new(),
            value: String::new(),
            visible: true,
            enabled: true,
            options: Vec::new(),
            appears_after: 0,
        }
    }

    /// Set text
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set value
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Set select options
    #[must_use]
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    /// Not displayed
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Disabled
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Hidden from the first `lookups` lookups
    #[must_use]
    pub const fn appearing_after(mut self, lookups: u32) -> Self {
        self.appears_after = lookups;
        self
    }
}

type PageHandler = Box<dyn FnMut(&mut MockPage) + Send>;
type NavigateHandler = Box<dyn FnMut(&mut MockPage, &str) + Send>;

#[derive(Debug, Clone, Copy)]
enum Hook {
    Click,
    Input,
}

/// Page state behind a [`MockDriver`]
pub struct MockPage {
    url: String,
    history: Vec<String>,
    elements: Vec<MockElement>,
    next_id: u64,
    dialog: Option<String>,
    calls: Vec<String>,
    lookups: HashMap<String, u32>,
    screenshot: Option<Vec<u8>>,
    on_click: HashMap<String, PageHandler>,
    on_input: HashMap<String, PageHandler>,
    on_navigate: Option<NavigateHandler>,
    on_back: Option<PageHandler>,
}

impl fmt::Debug for MockPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockPage")
            .field("url", &self.url)
            .field("elements", &self.elements.len())
            .field("dialog", &self.dialog)
            .field("calls", &self.calls.len())
            .finish_non_exhaustive()
    }
}

impl Default for MockPage {
    fn default() -> Self {
        Self {
            url: "about:blank".to_string(),
            history: Vec::new(),
            elements: Vec::new(),
            next_id: 0,
            dialog: None,
            calls: Vec::new(),
            lookups: HashMap::new(),
            screenshot: Some(PNG_SIGNATURE.to_vec()),
            on_click: HashMap::new(),
            on_input: HashMap::new(),
            on_navigate: None,
            on_back: None,
        }
    }
}

impl MockPage {
    /// Add an element; returns its id
    pub fn insert(&mut self, mut element: MockElement) -> String {
        self.next_id += 1;
        element.id = format!("e{}", self.next_id);
        let id = element.id.clone();
        self.elements.push(element);
        id
    }

    /// Remove every element answering to `locator`
    pub fn remove(&mut self, locator: &Locator) {
        let key = locator.to_string();
        self.elements.retain(|e| e.key != key);
    }

    /// Remove every element
    pub fn clear_elements(&mut self) {
        self.elements.clear();
    }

    /// Open a native dialog
    pub fn raise_dialog(&mut self, text: impl Into<String>) {
        self.dialog = Some(text.into());
    }

    /// Value of the first element answering to `locator`
    #[must_use]
    pub fn value_of(&self, locator: &Locator) -> Option<String> {
        let key = locator.to_string();
        self.elements
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value.clone())
    }

    /// Mutable access to every element answering to `locator`
    pub fn elements_mut<'a>(
        &'a mut self,
        locator: &Locator,
    ) -> impl Iterator<Item = &'a mut MockElement> + 'a {
        let key = locator.to_string();
        self.elements.iter_mut().filter(move |e| e.key == key)
    }

    /// Current URL
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    fn element(&self, handle: &ElementHandle) -> ProbeResult<&MockElement> {
        self.elements
            .iter()
            .find(|e| e.id == handle.id)
            .ok_or_else(|| ProbeError::driver(format!("stale element {}", handle.locator)))
    }

    fn element_mut(&mut self, handle: &ElementHandle) -> ProbeResult<&mut MockElement> {
        self.elements
            .iter_mut()
            .find(|e| e.id == handle.id)
            .ok_or_else(|| ProbeError::driver(format!("stale element {}", handle.locator)))
    }

    fn unblocked(&mut self, call: String) -> ProbeResult<()> {
        if let Some(text) = &self.dialog {
            let message = format!("unexpected alert open: {text:?}");
            self.calls.push(format!("blocked:{call}"));
            return Err(ProbeError::driver(message));
        }
        self.calls.push(call);
        Ok(())
    }

    fn hooks(&mut self, hook: Hook) -> &mut HashMap<String, PageHandler> {
        match hook {
            Hook::Click => &mut self.on_click,
            Hook::Input => &mut self.on_input,
        }
    }

    fn fire(&mut self, hook: Hook, key: &str) {
        if let Some(mut handler) = self.hooks(hook).remove(key) {
            handler(self);
            self.hooks(hook).entry(key.to_string()).or_insert(handler);
        }
    }
}

/// Cloneable handle on a shared [`MockPage`]
#[derive(Debug, Clone, Default)]
pub struct MockDriver {
    page: Arc<Mutex<MockPage>>,
}

impl MockDriver {
    /// Empty page at `about:blank`
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn page(&self) -> ProbeResult<MutexGuard<'_, MockPage>> {
        self.page
            .lock()
            .map_err(|_| ProbeError::driver("mock page lock poisoned"))
    }

    /// Run `f` against the page
    pub fn with_page<R>(&self, f: impl FnOnce(&mut MockPage) -> R) -> Option<R> {
        self.page.lock().ok().map(|mut page| f(&mut *page))
    }

    /// Add an element
    pub fn add(&self, element: MockElement) {
        self.with_page(|p| p.insert(element));
    }

    /// Remove every element answering to `locator`
    pub fn remove(&self, locator: &Locator) {
        self.with_page(|p| p.remove(locator));
    }

    /// Open a native dialog
    pub fn open_dialog(&self, text: &str) {
        self.with_page(|p| p.raise_dialog(text));
    }

    /// Text of the open dialog
    #[must_use]
    pub fn dialog(&self) -> Option<String> {
        self.with_page(|p| p.dialog.clone()).flatten()
    }

    /// Value of the first element answering to `locator`
    #[must_use]
    pub fn value_of(&self, locator: &Locator) -> Option<String> {
        self.with_page(|p| p.value_of(locator)).flatten()
    }

    /// Call log
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.with_page(|p| p.calls.clone()).unwrap_or_default()
    }

    /// Check if a call starting with `prefix` was made
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.calls().iter().any(|c| c.starts_with(prefix))
    }

    /// How many times `locator` was looked up
    #[must_use]
    pub fn lookups(&self, locator: &Locator) -> u32 {
        self.with_page(|p| p.lookups.get(&locator.to_string()).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Screenshot bytes; `None` makes capture fail
    pub fn set_screenshot(&self, png: Option<Vec<u8>>) {
        self.with_page(|p| p.screenshot = png);
    }

    /// React to clicks on `locator`
    pub fn on_click(&self, locator: &Locator, handler: impl FnMut(&mut MockPage) + Send + 'static) {
        let key = locator.to_string();
        self.with_page(|p| p.on_click.insert(key, Box::new(handler)));
    }

    /// React to typing into `locator`
    pub fn on_input(&self, locator: &Locator, handler: impl FnMut(&mut MockPage) + Send + 'static) {
        let key = locator.to_string();
        self.with_page(|p| p.on_input.insert(key, Box::new(handler)));
    }

    /// React to navigations
    pub fn on_navigate(&self, handler: impl FnMut(&mut MockPage, &str) + Send + 'static) {
        self.with_page(|p| p.on_navigate = Some(Box::new(handler)));
    }

    /// React to history back
    pub fn on_back(&self, handler: impl FnMut(&mut MockPage) + Send + 'static) {
        self.with_page(|p| p.on_back = Some(Box::new(handler)));
    }
}

#[async_trait]
impl UiDriver for MockDriver {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn navigate(&mut self, url: &str) -> ProbeResult<()> {
        let mut page = self.page()?;
        page.unblocked(format!("navigate:{url}"))?;
        let previous = std::mem::replace(&mut page.url, url.to_string());
        page.history.push(previous);
        if let Some(mut handler) = page.on_navigate.take() {
            handler(&mut *page, url);
            page.on_navigate.get_or_insert(handler);
        }
        Ok(())
    }

    async fn back(&mut self) -> ProbeResult<()> {
        let mut page = self.page()?;
        page.unblocked("back".to_string())?;
        if let Some(previous) = page.history.pop() {
            page.url = previous;
        }
        if let Some(mut handler) = page.on_back.take() {
            handler(&mut *page);
            page.on_back.get_or_insert(handler);
        }
        Ok(())
    }

    async fn current_url(&self) -> ProbeResult<String> {
        Ok(self.page()?.url.clone())
    }

    async fn find_elements(&self, locator: &Locator) -> ProbeResult<Vec<ElementHandle>> {
        let mut page = self.page()?;
        let key = locator.to_string();
        page.unblocked(format!("find:{key}"))?;
        let seen = {
            let count = page.lookups.entry(key.clone()).or_insert(0);
            *count += 1;
            *count
        };
        Ok(page
            .elements
            .iter()
            .filter(|e| e.key == key && seen > e.appears_after)
            .enumerate()
            .map(|(index, e)| ElementHandle::new(e.id.clone(), locator.clone(), index))
            .collect())
    }

    async fn is_displayed(&self, element: &ElementHandle) -> ProbeResult<bool> {
        Ok(self.page()?.element(element)?.visible)
    }

    async fn is_enabled(&self, element: &ElementHandle) -> ProbeResult<bool> {
        Ok(self.page()?.element(element)?.enabled)
    }

    async fn click(&self, element: &ElementHandle) -> ProbeResult<()> {
        let mut page = self.page()?;
        let key = page.element(element)?.key.clone();
        page.unblocked(format!("click:{key}"))?;
        page.fire(Hook::Click, &key);
        Ok(())
    }

    async fn clear(&self, element: &ElementHandle) -> ProbeResult<()> {
        let mut page = self.page()?;
        let key = page.element(element)?.key.clone();
        page.unblocked(format!("clear:{key}"))?;
        page.element_mut(element)?.value.clear();
        page.fire(Hook::Input, &key);
        Ok(())
    }

    async fn send_keys(&self, element: &ElementHandle, text: &str) -> ProbeResult<()> {
        let mut page = self.page()?;
        let key = page.element(element)?.key.clone();
        page.unblocked(format!("send_keys:{key}:{text}"))?;
        page.element_mut(element)?.value.push_str(text);
        page.fire(Hook::Input, &key);
        Ok(())
    }

    async fn text(&self, element: &ElementHandle) -> ProbeResult<String> {
        let mut page = self.page()?;
        page.unblocked(format!("text:{}", element.locator))?;
        Ok(page.element(element)?.text.clone())
    }

    async fn value(&self, element: &ElementHandle) -> ProbeResult<String> {
        let mut page = self.page()?;
        page.unblocked(format!("value:{}", element.locator))?;
        Ok(page.element(element)?.value.clone())
    }

    async fn select_by_text(&self, element: &ElementHandle, text: &str) -> ProbeResult<()> {
        let mut page = self.page()?;
        page.unblocked(format!("select:{}:{text}", element.locator))?;
        let target = page.element_mut(element)?;
        if !target.options.iter().any(|o| o == text) {
            return Err(ProbeError::driver(format!(
                "no option {text:?} in {}",
                element.locator
            )));
        }
        target.value = text.to_string();
        Ok(())
    }

    async fn options(&self, element: &ElementHandle) -> ProbeResult<Vec<String>> {
        Ok(self.page()?.element(element)?.options.clone())
    }

    async fn dialog_text(&self) -> ProbeResult<Option<String>> {
        Ok(self.page()?.dialog.clone())
    }

    async fn accept_dialog(&self) -> ProbeResult<()> {
        let mut page = self.page()?;
        if page.dialog.take().is_none() {
            return Err(ProbeError::driver("no alert open"));
        }
        page.calls.push("accept_dialog".to_string());
        Ok(())
    }

    async fn dismiss_dialog(&self) -> ProbeResult<()> {
        let mut page = self.page()?;
        if page.dialog.take().is_none() {
            return Err(ProbeError::driver("no alert open"));
        }
        page.calls.push("dismiss_dialog".to_string());
        Ok(())
    }

    async fn screenshot(&self) -> ProbeResult<Vec<u8>> {
        let mut page = self.page()?;
        page.unblocked("screenshot".to_string())?;
        page.screenshot
            .clone()
            .ok_or_else(|| ProbeError::driver("screenshot unavailable"))
    }

    async fn close(&mut self) -> ProbeResult<()> {
        self.page()?.calls.push("close".to_string());
        Ok(())
    }
}
