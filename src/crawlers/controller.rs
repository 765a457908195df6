use crate::error::ControllerError;
use crate::inspector::{InspectRequest, InspectResponse};
use async_trait::async_trait;
use std::fmt::Debug;

/// A screenshot of the visible part of a page
#[derive(Debug, Clone)]
pub struct Screenshot {
    /// PNG bytes
    pub png: Vec<u8>,
    /// Device pixels per CSS pixel
    pub device_pixel_ratio: f64,
}

/// Opens, inspects and closes browser pages.
///
/// Implementations own the browser; callers own the handles they open and
/// must close them.
#[async_trait]
pub trait PageController: Send + Sync {
    type Handle: Clone + Debug + Send + Sync;

    /// The page the user is looking at
    async fn active_page(&self) -> Result<Self::Handle, ControllerError>;

    async fn page_url(&self, handle: &Self::Handle) -> Result<String, ControllerError>;

    /// Opens `url` in a background page without waiting for it to load
    async fn open_page(&self, url: &str) -> Result<Self::Handle, ControllerError>;

    /// Resolves once the page reports that loading is complete
    ///
    /// May never resolve; callers race it against their own timeout.
    async fn wait_for_load(&self, handle: &Self::Handle) -> Result<(), ControllerError>;

    /// Runs an inspector request against the page
    async fn send_to_page(
        &self,
        handle: &Self::Handle,
        request: &InspectRequest,
    ) -> Result<InspectResponse, ControllerError>;

    async fn close_page(&self, handle: &Self::Handle) -> Result<(), ControllerError>;

    async fn capture_visible_region(
        &self,
        handle: &Self::Handle,
    ) -> Result<Screenshot, ControllerError>;
}
