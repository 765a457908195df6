//! Error types, one enum per boundary.
//!
//! Every failure is converted into an [`AppError`] at the boundary of the
//! operation that produced it; [`AppError::user_message`] is what the user sees.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InspectError {
    #[error("no content selected")]
    NothingSelected,

    #[error("invalid selector `{0}`: {1}")]
    InvalidSelector(String, String),

    #[error("no element matches `{0}`")]
    NoMatch(String),

    #[error("inspection failed: {0}")]
    Internal(String),
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("WebDriver session error: {0}")]
    Session(#[from] fantoccini::error::NewSessionError),

    #[error("WebDriver command failed: {0}")]
    Command(#[from] fantoccini::error::CmdError),

    #[error("page handle `{0}` is not open")]
    UnknownHandle(String),

    #[error("page did not answer within {0} ms")]
    MessageTimeout(u64),

    #[error("page sent an unreadable response: {0}")]
    BadResponse(String),

    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("failed to extract the primary page: {0}")]
    PrimaryFailure(String),

    #[error("crawl cancelled")]
    Cancelled,
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("screen capture is not allowed on {0}")]
    Restricted(String),

    #[error("capture timed out after {0} ms")]
    Timeout(u64),

    #[error("selection of {width}x{height} px is below the {min} px minimum")]
    TooSmall { width: u32, height: u32, min: u32 },

    #[error("selection cancelled")]
    Cancelled,

    #[error("capture failed: {0}")]
    Failed(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store contents are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("no API key configured for image analysis")]
    CredentialMissing,

    #[error("analysis endpoint failed: {0}")]
    EndpointFailure(String),

    #[error("analysis timed out after {0} ms")]
    Timeout(u64),
}

impl From<reqwest::Error> for VisionError {
    fn from(e: reqwest::Error) -> Self {
        VisionError::EndpointFailure(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("extraction failed: {0}")]
    ExtractionFailure(String),

    #[error("primary page failed: {0}")]
    CrawlPrimaryFailure(String),

    #[error("capture restricted on {0}")]
    CaptureRestricted(String),

    #[error("capture timed out after {0} ms")]
    CaptureTimeout(u64),

    #[error("capture failed: {0}")]
    CaptureGenericFailure(String),

    #[error("vision credential missing")]
    CredentialMissing,

    #[error("analysis endpoint failure: {0}")]
    AnalysisEndpointFailure(String),

    #[error("no prompt to deliver")]
    NoPrompt,

    #[error("prompt is empty")]
    EmptyPrompt,

    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    /// Status line shown to the user
    pub fn user_message(&self) -> String {
        match self {
            AppError::ExtractionFailure(reason) => format!(
                "Could not extract content from this page ({}). Reload the page and try again.",
                reason
            ),
            AppError::CrawlPrimaryFailure(reason) => format!(
                "Could not extract the current page ({}). Reload the page and try again.",
                reason
            ),
            AppError::CaptureRestricted(_) => {
                "Cannot capture screenshots on browser internal pages. Please navigate to a regular website.".to_string()
            }
            AppError::CaptureTimeout(_) => {
                "Screenshot capture timed out. Please wait for the page to finish loading and try again.".to_string()
            }
            AppError::CaptureGenericFailure(reason) => {
                format!("Screenshot capture failed: {}", reason)
            }
            AppError::CredentialMissing => {
                "No API key configured for image analysis. You can still edit the prompt manually.".to_string()
            }
            AppError::AnalysisEndpointFailure(reason) => format!(
                "Image analysis failed: {}. You can still edit the prompt manually.",
                reason
            ),
            AppError::NoPrompt => "Please generate a prompt first.".to_string(),
            AppError::EmptyPrompt => "Prompt cannot be empty.".to_string(),
            AppError::InvalidImage(reason) => format!("Please select a valid image file ({}).", reason),
            AppError::Store(e) => format!("Could not access saved settings: {}", e),
        }
    }
}

impl From<InspectError> for AppError {
    fn from(e: InspectError) -> Self {
        AppError::ExtractionFailure(e.to_string())
    }
}

impl From<ControllerError> for AppError {
    fn from(e: ControllerError) -> Self {
        AppError::ExtractionFailure(e.to_string())
    }
}

impl From<CrawlError> for AppError {
    fn from(e: CrawlError) -> Self {
        match e {
            CrawlError::PrimaryFailure(reason) => AppError::CrawlPrimaryFailure(reason),
            CrawlError::Cancelled => AppError::CrawlPrimaryFailure(e.to_string()),
        }
    }
}

impl From<CaptureError> for AppError {
    fn from(e: CaptureError) -> Self {
        match e {
            CaptureError::Restricted(url) => AppError::CaptureRestricted(url),
            CaptureError::Timeout(ms) => AppError::CaptureTimeout(ms),
            other => AppError::CaptureGenericFailure(other.to_string()),
        }
    }
}

impl From<VisionError> for AppError {
    fn from(e: VisionError) -> Self {
        match e {
            VisionError::CredentialMissing => AppError::CredentialMissing,
            other => AppError::AnalysisEndpointFailure(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_errors_map_to_taxonomy() {
        assert!(matches!(
            AppError::from(CaptureError::Restricted("chrome://settings".into())),
            AppError::CaptureRestricted(_)
        ));
        assert!(matches!(
            AppError::from(CaptureError::Timeout(10_000)),
            AppError::CaptureTimeout(10_000)
        ));
        assert!(matches!(
            AppError::from(CaptureError::TooSmall { width: 4, height: 40, min: 10 }),
            AppError::CaptureGenericFailure(_)
        ));
    }

    #[test]
    fn test_user_messages_give_guidance() {
        let msg = AppError::CaptureTimeout(10_000).user_message();
        assert!(msg.contains("wait for the page to finish loading"));

        let msg = AppError::from(VisionError::CredentialMissing).user_message();
        assert!(msg.contains("edit the prompt manually"));
    }
}
