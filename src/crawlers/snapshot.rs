use super::controller::{PageController, Screenshot};
use crate::error::ControllerError;
use crate::inspector::dom::PageSnapshot;
use crate::inspector::{InspectRequest, InspectResponse, Inspector};
use async_trait::async_trait;

/// Page controller over one fixed document, without a browser
///
/// Used for local HTML files. It cannot open other pages or take
/// screenshots, so a crawl over it yields just the one page.
pub struct SnapshotController {
    snapshot: PageSnapshot,
    inspector: Inspector,
}

impl SnapshotController {
    pub fn new(snapshot: PageSnapshot) -> Self {
        Self {
            snapshot,
            inspector: Inspector::default(),
        }
    }

    /// A controller over an empty page, for commands that never inspect
    pub fn blank() -> Self {
        Self::new(PageSnapshot::new("about:blank", "<html><body></body></html>"))
    }

    pub fn with_inspector(mut self, inspector: Inspector) -> Self {
        self.inspector = inspector;
        self
    }
}

#[async_trait]
impl PageController for SnapshotController {
    type Handle = ();

    async fn active_page(&self) -> Result<(), ControllerError> {
        Ok(())
    }

    async fn page_url(&self, _: &()) -> Result<String, ControllerError> {
        Ok(self.snapshot.url.clone())
    }

    async fn open_page(&self, url: &str) -> Result<(), ControllerError> {
        Err(ControllerError::Other(format!(
            "cannot open {} without a browser",
            url
        )))
    }

    async fn wait_for_load(&self, _: &()) -> Result<(), ControllerError> {
        Ok(())
    }

    async fn send_to_page(
        &self,
        _: &(),
        request: &InspectRequest,
    ) -> Result<InspectResponse, ControllerError> {
        Ok(self.inspector.handle(&self.snapshot, request))
    }

    async fn close_page(&self, _: &()) -> Result<(), ControllerError> {
        Ok(())
    }

    async fn capture_visible_region(&self, _: &()) -> Result<Screenshot, ControllerError> {
        Err(ControllerError::Other(
            "screen capture needs a browser".to_string(),
        ))
    }
}
