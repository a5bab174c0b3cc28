//! Real browser control.
//!
//! With the `browser` feature, [`CdpDriver`] implements [`UiDriver`] over the
//! Chrome `DevTools` Protocol via chromiumoxide. Element commands run as
//! small scripts against the live DOM; native dialogs are tracked from
//! `Page.javascriptDialogOpening` / `Closed` events so the page is never
//! queried while a dialog blocks it.

use crate::driver::UiDriver;
use crate::result::{ProbeError, ProbeResult};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

/// How often a pending page command re-checks for a blocking dialog
const DIALOG_WATCH_INTERVAL: Duration = Duration::from_millis(50);

/// Browser launch options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run without a visible window
    pub headless: bool,
    /// Window width
    pub window_width: u32,
    /// Window height
    pub window_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<PathBuf>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
    /// Extra command-line switches
    pub args: Vec<String>,
    /// Longest any single page command may take
    pub command_timeout_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1366,
            window_height: 768,
            chromium_path: None,
            sandbox: false,
            args: vec!["--disable-dev-shm-usage".to_string()],
            command_timeout_ms: 15_000,
        }
    }
}

impl BrowserConfig {
    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set window size
    #[must_use]
    pub const fn with_window(mut self, width: u32, height: u32) -> Self {
        self.window_width = width;
        self.window_height = height;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Add a command-line switch
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

fn open_dialog(slot: &Mutex<Option<String>>) -> Option<String> {
    slot.lock().ok().and_then(|open| open.clone())
}

/// Run a page command that a native dialog would block.
///
/// Refuses to start while `slot` holds an open dialog, and abandons the
/// command as soon as one opens or `limit` passes. Either dialog case is
/// [`ProbeError::UnresolvedDialog`].
#[cfg_attr(not(feature = "browser"), allow(dead_code))]
pub(crate) async fn guarded<T>(
    slot: &Mutex<Option<String>>,
    limit: Duration,
    command: impl Future<Output = ProbeResult<T>>,
) -> ProbeResult<T> {
    if let Some(text) = open_dialog(slot) {
        return Err(ProbeError::UnresolvedDialog { text });
    }
    let watch = async {
        loop {
            tokio::time::sleep(DIALOG_WATCH_INTERVAL).await;
            if let Some(text) = open_dialog(slot) {
                return text;
            }
        }
    };
    tokio::select! {
        result = command => result,
        text = watch => Err(ProbeError::UnresolvedDialog { text }),
        () = tokio::time::sleep(limit) => Err(ProbeError::driver(format!(
            "page did not answer within {}ms",
            limit.as_millis()
        ))),
    }
}

/// Launch a browser-backed driver.
///
/// # Errors
///
/// [`ProbeError::BrowserLaunch`] if chromium cannot start or the crate was
/// built without the `browser` feature.
pub async fn launch(config: &BrowserConfig) -> ProbeResult<Box<dyn UiDriver>> {
    #[cfg(feature = "browser")]
    {
        Ok(Box::new(CdpDriver::launch(config).await?))
    }
    #[cfg(not(feature = "browser"))]
    {
        let _ = config;
        Err(ProbeError::BrowserLaunch {
            message: "built without the `browser` feature".to_string(),
        })
    }
}

// ============================================================================
// Real CDP Implementation (when `browser` feature is enabled)
// ============================================================================

#[cfg(feature = "browser")]
pub use cdp::CdpDriver;

#[cfg(feature = "browser")]
mod cdp {
    use super::*;
    use crate::driver::ElementHandle;
    use crate::locator::Locator;
    use async_trait::async_trait;
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::cdp::browser_protocol::input::InsertTextParams;
    use chromiumoxide::cdp::browser_protocol::page::{
        CaptureScreenshotFormat, CaptureScreenshotParams, EventJavascriptDialogClosed,
        EventJavascriptDialogOpening, HandleJavaScriptDialogParams,
    };
    use chromiumoxide::page::Page as CdpPage;
    use futures::StreamExt;
    use serde::de::DeserializeOwned;
    use std::sync::Arc;

    fn driver_err(e: impl std::fmt::Display) -> ProbeError {
        ProbeError::driver(e.to_string())
    }

    /// Wrap `body` so it runs with `el` bound to the handle's element.
    /// Evaluates to `null` when the element is gone.
    fn on_element(element: &ElementHandle, body: &str) -> String {
        format!(
            "(() => {{ const el = ({})[{}]; if (!el) return null; {body} }})()",
            element.locator.selector().to_all_query(),
            element.index
        )
    }

    /// Browser session over CDP
    #[derive(Debug)]
    pub struct CdpDriver {
        browser: CdpBrowser,
        page: CdpPage,
        dialog: Arc<Mutex<Option<String>>>,
        command_timeout: Duration,
        tasks: Vec<tokio::task::JoinHandle<()>>,
    }

    impl CdpDriver {
        /// Launch chromium and open a blank page
        ///
        /// # Errors
        ///
        /// Returns error if browser cannot be launched
        pub async fn launch(config: &BrowserConfig) -> ProbeResult<Self> {
            let mut builder = CdpConfig::builder()
                .window_size(config.window_width, config.window_height);

            if !config.headless {
                builder = builder.with_head();
            }
            if !config.sandbox {
                builder = builder.no_sandbox();
            }
            if let Some(ref path) = config.chromium_path {
                builder = builder.chrome_executable(path);
            }
            for arg in &config.args {
                builder = builder.arg(arg.clone());
            }

            let cdp_config = builder
                .build()
                .map_err(|message| ProbeError::BrowserLaunch { message })?;

            let (browser, mut handler) = CdpBrowser::launch(cdp_config).await.map_err(|e| {
                ProbeError::BrowserLaunch {
                    message: e.to_string(),
                }
            })?;

            let mut tasks = vec![tokio::spawn(async move {
                while let Some(h) = handler.next().await {
                    if h.is_err() {
                        break;
                    }
                }
            })];

            let page = browser
                .new_page("about:blank")
                .await
                .map_err(|e| ProbeError::BrowserLaunch {
                    message: e.to_string(),
                })?;

            let dialog = Arc::new(Mutex::new(None));

            let mut opening = page
                .event_listener::<EventJavascriptDialogOpening>()
                .await
                .map_err(driver_err)?;
            let slot = Arc::clone(&dialog);
            tasks.push(tokio::spawn(async move {
                while let Some(event) = opening.next().await {
                    if let Ok(mut open) = slot.lock() {
                        *open = Some(event.message.clone());
                    }
                }
            }));

            let mut closed = page
                .event_listener::<EventJavascriptDialogClosed>()
                .await
                .map_err(driver_err)?;
            let slot = Arc::clone(&dialog);
            tasks.push(tokio::spawn(async move {
                while closed.next().await.is_some() {
                    if let Ok(mut open) = slot.lock() {
                        *open = None;
                    }
                }
            }));

            tracing::info!(
                headless = config.headless,
                width = config.window_width,
                height = config.window_height,
                "browser launched"
            );

            Ok(Self {
                browser,
                page,
                dialog,
                command_timeout: Duration::from_millis(config.command_timeout_ms),
                tasks,
            })
        }

        async fn eval<T: DeserializeOwned>(&self, js: String) -> ProbeResult<T> {
            let result = guarded(&self.dialog, self.command_timeout, async {
                self.page.evaluate(js).await.map_err(driver_err)
            })
            .await?;
            result.into_value::<T>().map_err(driver_err)
        }

        async fn eval_on<T: DeserializeOwned>(
            &self,
            element: &ElementHandle,
            body: &str,
        ) -> ProbeResult<T> {
            let value: Option<T> = self.eval(on_element(element, body)).await?;
            value.ok_or_else(|| {
                ProbeError::driver(format!("stale element {}[{}]", element.locator, element.index))
            })
        }

        async fn resolve_dialog(&self, accept: bool) -> ProbeResult<()> {
            self.page
                .execute(HandleJavaScriptDialogParams::new(accept))
                .await
                .map_err(driver_err)?;
            if let Ok(mut open) = self.dialog.lock() {
                *open = None;
            }
            Ok(())
        }
    }

    #[async_trait]
    impl UiDriver for CdpDriver {
        fn name(&self) -> &'static str {
            "chromium"
        }

        async fn navigate(&mut self, url: &str) -> ProbeResult<()> {
            guarded(&self.dialog, self.command_timeout, async {
                self.page.goto(url).await.map_err(|e| ProbeError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                })
            })
            .await?;
            Ok(())
        }

        async fn back(&mut self) -> ProbeResult<()> {
            let _: Option<bool> = self
                .eval("(() => { window.history.back(); return true; })()".to_string())
                .await?;
            Ok(())
        }

        async fn current_url(&self) -> ProbeResult<String> {
            Ok(self.page.url().await.map_err(driver_err)?.unwrap_or_default())
        }

        async fn find_elements(&self, locator: &Locator) -> ProbeResult<Vec<ElementHandle>> {
            let count: usize = self
                .eval(format!("({}).length", locator.selector().to_all_query()))
                .await?;
            Ok((0..count)
                .map(|index| ElementHandle::new(format!("{locator}#{index}"), locator.clone(), index))
                .collect())
        }

        async fn is_displayed(&self, element: &ElementHandle) -> ProbeResult<bool> {
            self.eval_on(
                element,
                "const r = el.getBoundingClientRect(); const s = getComputedStyle(el); \
                 return r.width > 0 && r.height > 0 && s.visibility !== 'hidden' && s.display !== 'none';",
            )
            .await
        }

        async fn is_enabled(&self, element: &ElementHandle) -> ProbeResult<bool> {
            self.eval_on(element, "return !el.disabled;").await
        }

        async fn click(&self, element: &ElementHandle) -> ProbeResult<()> {
            // Deferred so an alert raised by the handler cannot block this
            // call. The next guarded command sees the dialog instead.
            let _: bool = self
                .eval_on(element, "setTimeout(() => el.click(), 0); return true;")
                .await?;
            Ok(())
        }

        async fn clear(&self, element: &ElementHandle) -> ProbeResult<()> {
            let _: bool = self
                .eval_on(
                    element,
                    "el.value = ''; el.dispatchEvent(new Event('input', { bubbles: true })); return true;",
                )
                .await?;
            Ok(())
        }

        async fn send_keys(&self, element: &ElementHandle, text: &str) -> ProbeResult<()> {
            let _: bool = self.eval_on(element, "el.focus(); return true;").await?;
            guarded(&self.dialog, self.command_timeout, async {
                self.page
                    .execute(InsertTextParams::new(text))
                    .await
                    .map_err(driver_err)
            })
            .await?;
            Ok(())
        }

        async fn text(&self, element: &ElementHandle) -> ProbeResult<String> {
            self.eval_on(element, "return (el.innerText || el.textContent || '').trim();")
                .await
        }

        async fn value(&self, element: &ElementHandle) -> ProbeResult<String> {
            self.eval_on(element, "return el.value == null ? '' : String(el.value);")
                .await
        }

        async fn select_by_text(&self, element: &ElementHandle, text: &str) -> ProbeResult<()> {
            let body = format!(
                "const o = Array.from(el.options).find(o => o.text.trim() === {text:?}); \
                 if (!o) return false; el.value = o.value; \
                 el.dispatchEvent(new Event('change', {{ bubbles: true }})); return true;"
            );
            let found: bool = self.eval_on(element, &body).await?;
            if found {
                Ok(())
            } else {
                Err(ProbeError::driver(format!(
                    "no option {text:?} in {}",
                    element.locator
                )))
            }
        }

        async fn options(&self, element: &ElementHandle) -> ProbeResult<Vec<String>> {
            self.eval_on(element, "return Array.from(el.options).map(o => o.text.trim());")
                .await
        }

        async fn dialog_text(&self) -> ProbeResult<Option<String>> {
            Ok(self.dialog.lock().ok().and_then(|open| open.clone()))
        }

        async fn accept_dialog(&self) -> ProbeResult<()> {
            self.resolve_dialog(true).await
        }

        async fn dismiss_dialog(&self) -> ProbeResult<()> {
            self.resolve_dialog(false).await
        }

        async fn screenshot(&self) -> ProbeResult<Vec<u8>> {
            use base64::Engine;

            let params = CaptureScreenshotParams::builder()
                .format(CaptureScreenshotFormat::Png)
                .build();
            let screenshot = guarded(&self.dialog, self.command_timeout, async {
                self.page.execute(params).await.map_err(driver_err)
            })
            .await?;
            base64::engine::general_purpose::STANDARD
                .decode(&screenshot.data)
                .map_err(driver_err)
        }

        async fn close(&mut self) -> ProbeResult<()> {
            let result = self.browser.close().await.map_err(driver_err);
            for task in self.tasks.drain(..) {
                task.abort();
            }
            result.map(|_| ())
        }
    }
}
