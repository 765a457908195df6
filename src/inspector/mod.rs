//! Page, selection and visible-content inspectors.
//!
//! Inspection is a pure function of a [`PageSnapshot`]. Requests and responses
//! have the same shape whether the snapshot came from a live browser or a
//! local file, so callers only deal with [`InspectRequest`] and
//! [`InspectResponse`].

pub mod dom;
pub mod media;
pub mod motion;
pub mod page;
pub mod selection;
pub mod text;
pub mod visible;

#[cfg(test)]
mod tests;

use crate::error::InspectError;
use crate::models::{PageModel, SelectionModel, VisibleModel};
use crate::ranker::{LinkRanker, RankedLink};
use dom::{Document, PageSnapshot};
use motion::{ElementClassifier, HeuristicClassifier};
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};

/// Inspector actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum InspectRequest {
    /// The current selection, or the first element matching `selector`
    ExtractSelected {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        selector: Option<String>,
    },
    ExtractPage,
    ExtractVisible,
    GetNavigationLinks,
}

/// Payload of a successful inspection
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum InspectData {
    Page(Box<PageModel>),
    Selection(SelectionModel),
    Visible(VisibleModel),
    Links(Vec<RankedLink>),
}

/// Result envelope; failures are carried in `error`, never raised
#[derive(Debug, Clone, Serialize)]
pub struct InspectResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<InspectData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InspectResponse {
    pub fn ok(data: InspectData) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    fn into_data(self) -> Result<InspectData, InspectError> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            _ => Err(InspectError::Internal(
                self.error.unwrap_or_else(|| "empty response".to_string()),
            )),
        }
    }

    pub fn into_page(self) -> Result<PageModel, InspectError> {
        match self.into_data()? {
            InspectData::Page(page) => Ok(*page),
            _ => Err(InspectError::Internal("expected a page model".to_string())),
        }
    }

    pub fn into_selection(self) -> Result<SelectionModel, InspectError> {
        match self.into_data()? {
            InspectData::Selection(selection) => Ok(selection),
            _ => Err(InspectError::Internal("expected a selection model".to_string())),
        }
    }

    pub fn into_visible(self) -> Result<VisibleModel, InspectError> {
        match self.into_data()? {
            InspectData::Visible(visible) => Ok(visible),
            _ => Err(InspectError::Internal("expected a visible model".to_string())),
        }
    }

    pub fn into_links(self) -> Result<Vec<RankedLink>, InspectError> {
        match self.into_data()? {
            InspectData::Links(links) => Ok(links),
            _ => Err(InspectError::Internal("expected navigation links".to_string())),
        }
    }
}

/// Runs inspector actions against snapshots
pub struct Inspector {
    classifier: Box<dyn ElementClassifier>,
    ranker: LinkRanker,
}

impl Default for Inspector {
    fn default() -> Self {
        Self {
            classifier: Box::new(HeuristicClassifier::default()),
            ranker: LinkRanker::default(),
        }
    }
}

impl Inspector {
    /// Replaces the component classifier used for interactive-element detection
    pub fn with_classifier(mut self, classifier: Box<dyn ElementClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_ranker(mut self, ranker: LinkRanker) -> Self {
        self.ranker = ranker;
        self
    }

    /// Answers one request; never panics on ordinary input
    pub fn handle(&self, snapshot: &PageSnapshot, request: &InspectRequest) -> InspectResponse {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run(snapshot, request)));

        match outcome {
            Ok(Ok(data)) => InspectResponse::ok(data),
            Ok(Err(e)) => {
                ::log::warn!("Inspection of {} failed: {}", snapshot.url, e);
                InspectResponse::failed(e.to_string())
            }
            Err(_) => {
                ::log::error!("Inspector panicked on {}", snapshot.url);
                InspectResponse::failed("internal inspector error")
            }
        }
    }

    fn run(
        &self,
        snapshot: &PageSnapshot,
        request: &InspectRequest,
    ) -> Result<InspectData, InspectError> {
        let doc = Document::parse(snapshot);
        ::log::debug!("Inspecting {} ({:?})", snapshot.url, request);

        let data = match request {
            InspectRequest::ExtractSelected { selector } => {
                let fragment = selection::selection_fragment(
                    &doc,
                    snapshot.selection.as_ref(),
                    selector.as_deref(),
                )?;
                InspectData::Selection(selection::extract_selection(&doc, &fragment))
            }
            InspectRequest::ExtractPage => {
                InspectData::Page(Box::new(page::extract_page(&doc, self.classifier.as_ref())))
            }
            InspectRequest::ExtractVisible => InspectData::Visible(visible::extract_visible(&doc)),
            InspectRequest::GetNavigationLinks => InspectData::Links(self.ranker.rank(&doc)),
        };

        Ok(data)
    }
}
