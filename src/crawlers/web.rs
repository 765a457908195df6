use super::controller::{PageController, Screenshot};
use crate::error::ControllerError;
use crate::inspector::dom::PageSnapshot;
use crate::inspector::{InspectRequest, InspectResponse, Inspector};
use async_trait::async_trait;
use fantoccini::error::CmdError;
use fantoccini::wd::WindowHandle;
use fantoccini::{Client, ClientBuilder};
use std::time::Duration;
use tokio::sync::Mutex;

/// Interval between `document.readyState` polls
const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Stamps resolved style and geometry onto every element, then returns a
/// snapshot of the document and removes the stamps again.
const SNAPSHOT_SCRIPT: &str = r#"
const PROPS = [
  'display', 'visibility', 'opacity', 'color', 'background-color',
  'background-image', 'background-size', 'background-repeat',
  'background-position', 'font-family', 'border-radius', 'box-shadow',
  'object-fit', 'filter', 'animation-name', 'animation-duration',
  'animation-iteration-count', 'animation-timing-function',
  'transition-property', 'transition-duration'
];
const elements = Array.from(document.querySelectorAll('*'));
for (const el of elements) {
  const cs = window.getComputedStyle(el);
  const style = {};
  for (const p of PROPS) style[p] = cs.getPropertyValue(p);
  el.setAttribute('data-wg-style', JSON.stringify(style));
  const r = el.getBoundingClientRect();
  el.setAttribute('data-wg-rect', r.left + ' ' + r.top + ' ' + r.width + ' ' + r.height);
  if (el.tagName === 'IMG') {
    el.setAttribute('data-wg-natural', el.naturalWidth + ' ' + el.naturalHeight);
  }
}
let selection = null;
const sel = window.getSelection();
if (sel && sel.rangeCount > 0 && !sel.isCollapsed) {
  const holder = document.createElement('div');
  holder.appendChild(sel.getRangeAt(0).cloneContents());
  selection = { text: sel.toString().trim(), html: holder.innerHTML };
}
const snapshot = {
  url: window.location.href,
  html: document.documentElement.outerHTML,
  viewport: {
    width: window.innerWidth || document.documentElement.clientWidth,
    height: window.innerHeight || document.documentElement.clientHeight,
    scrollX: window.scrollX,
    scrollY: window.scrollY,
    devicePixelRatio: window.devicePixelRatio || 1
  },
  selection: selection
};
for (const el of elements) {
  el.removeAttribute('data-wg-style');
  el.removeAttribute('data-wg-rect');
  el.removeAttribute('data-wg-natural');
}
return snapshot;
"#;

/// Page controller backed by a WebDriver session
///
/// Pages are browser tabs. WebDriver has a single current window per session,
/// so every operation switches to its tab while holding the client lock.
pub struct WebDriverController {
    client: Mutex<Client>,
    primary: WindowHandle,
    inspector: Inspector,
}

impl WebDriverController {
    /// Connects to the WebDriver server; the initial window becomes the active page
    pub async fn connect(webdriver_url: &str) -> Result<Self, ControllerError> {
        let client = match ClientBuilder::native().connect(webdriver_url).await {
            Ok(client) => {
                ::log::info!("Connected to WebDriver at {}", webdriver_url);
                client
            }
            Err(e) => {
                ::log::error!("Failed to connect to WebDriver at {}: {}", webdriver_url, e);
                return Err(e.into());
            }
        };
        let primary = client.window().await?;

        Ok(Self {
            client: Mutex::new(client),
            primary,
            inspector: Inspector::default(),
        })
    }

    pub fn with_inspector(mut self, inspector: Inspector) -> Self {
        self.inspector = inspector;
        self
    }

    /// Loads `url` in the active page and waits for navigation to finish
    pub async fn navigate(&self, url: &str) -> Result<(), ControllerError> {
        let client = self.client.lock().await;
        client.switch_to_window(self.primary.clone()).await?;
        client.goto(url).await.map_err(|e| log_command_error(e, "navigating to", url))?;
        Ok(())
    }

    /// Ends the WebDriver session
    pub async fn shutdown(self) {
        let client = self.client.into_inner();
        if let Err(e) = client.close().await {
            ::log::warn!("Failed to close WebDriver session: {}", e);
        }
    }

    async fn snapshot(&self, handle: &WindowHandle) -> Result<PageSnapshot, ControllerError> {
        let client = self.client.lock().await;
        client.switch_to_window(handle.clone()).await?;
        let value = client.execute(SNAPSHOT_SCRIPT, Vec::new()).await?;
        serde_json::from_value(value).map_err(|e| ControllerError::BadResponse(e.to_string()))
    }
}

#[async_trait]
impl PageController for WebDriverController {
    type Handle = WindowHandle;

    async fn active_page(&self) -> Result<WindowHandle, ControllerError> {
        Ok(self.primary.clone())
    }

    async fn page_url(&self, handle: &WindowHandle) -> Result<String, ControllerError> {
        let client = self.client.lock().await;
        client.switch_to_window(handle.clone()).await?;
        Ok(client.current_url().await?.to_string())
    }

    async fn open_page(&self, url: &str) -> Result<WindowHandle, ControllerError> {
        let client = self.client.lock().await;
        let window = client.new_window(true).await?;
        let handle = window.handle;

        // location.assign returns immediately; goto would block until load
        let load = async {
            client.switch_to_window(handle.clone()).await?;
            client
                .execute(
                    "window.location.assign(arguments[0]);",
                    vec![serde_json::Value::String(url.to_string())],
                )
                .await?;
            Ok::<_, CmdError>(())
        };
        let discard = async {
            let closed = async {
                client.switch_to_window(handle.clone()).await?;
                client.close_window().await?;
                client.switch_to_window(self.primary.clone()).await
            };
            if let Err(e) = closed.await {
                ::log::warn!("Failed to close the tab opened for {}: {}", url, e);
            }
        };
        load_or_discard(load, discard)
            .await
            .map_err(|e| log_command_error(e, "opening", url))?;

        ::log::debug!("Opened background tab for {}", url);
        Ok(handle)
    }

    async fn wait_for_load(&self, handle: &WindowHandle) -> Result<(), ControllerError> {
        loop {
            let state = {
                let client = self.client.lock().await;
                client.switch_to_window(handle.clone()).await?;
                client.execute("return document.readyState;", Vec::new()).await?
            };
            if state.as_str() == Some("complete") {
                return Ok(());
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
    }

    async fn send_to_page(
        &self,
        handle: &WindowHandle,
        request: &InspectRequest,
    ) -> Result<InspectResponse, ControllerError> {
        let snapshot = self.snapshot(handle).await?;
        ::log::debug!(
            "Snapshot of {} has {} bytes of markup",
            snapshot.url,
            snapshot.html.len()
        );
        Ok(self.inspector.handle(&snapshot, request))
    }

    async fn close_page(&self, handle: &WindowHandle) -> Result<(), ControllerError> {
        if *handle == self.primary {
            ::log::warn!("Refusing to close the active page");
            return Ok(());
        }
        let client = self.client.lock().await;
        client.switch_to_window(handle.clone()).await?;
        client.close_window().await?;
        client.switch_to_window(self.primary.clone()).await?;
        Ok(())
    }

    async fn capture_visible_region(
        &self,
        handle: &WindowHandle,
    ) -> Result<Screenshot, ControllerError> {
        let client = self.client.lock().await;
        client.switch_to_window(handle.clone()).await?;
        let ratio = client
            .execute("return window.devicePixelRatio || 1;", Vec::new())
            .await?
            .as_f64()
            .unwrap_or(1.0);
        let png = client.screenshot().await?;
        Ok(Screenshot {
            png,
            device_pixel_ratio: ratio,
        })
    }
}

/// Runs `load` on a freshly opened tab and awaits `discard` if it fails, so
/// a tab the caller never receives a handle for is not left behind
async fn load_or_discard<T, E, L, D>(load: L, discard: D) -> Result<T, E>
where
    L: Future<Output = Result<T, E>>,
    D: Future<Output = ()>,
{
    match load.await {
        Ok(value) => Ok(value),
        Err(e) => {
            discard.await;
            Err(e)
        }
    }
}

/// Logs a failed WebDriver command and converts it
fn log_command_error(
    error: CmdError,
    context: &str,
    url: &str,
) -> ControllerError {
    if error.to_string().contains("Unable to find session") {
        ::log::warn!("Lost WebDriver session while {} {}", context, url);
    } else {
        ::log::error!("Failed {} {}: {}", context, url, error);
    }
    ControllerError::Command(error)
}
