//! Multi-page crawl: the active page plus a few of its best navigation links.
//!
//! Pages are visited strictly one after another. Every background page the
//! crawl opens is closed before the next one is opened, whether extraction
//! succeeded, failed, timed out or was cancelled.

use super::controller::PageController;
use crate::config::CrawlConfig;
use crate::error::{ControllerError, CrawlError};
use crate::inspector::InspectRequest;
use crate::models::{PageModel, SiteModel};
use crate::ranker::RankedLink;
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, timeout_at};
use tokio_util::sync::CancellationToken;

/// Why a single crawl step did not produce a value
#[derive(Debug)]
enum StepError {
    Cancelled,
    TimedOut,
    Failed(String),
}

impl std::fmt::Display for StepError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepError::Cancelled => write!(f, "cancelled"),
            StepError::TimedOut => write!(f, "timed out"),
            StepError::Failed(reason) => write!(f, "{}", reason),
        }
    }
}

impl From<ControllerError> for StepError {
    fn from(e: ControllerError) -> Self {
        StepError::Failed(e.to_string())
    }
}

/// Drives the inspector across the active page and its linked pages
pub struct CrawlOrchestrator<'a, C: PageController> {
    controller: &'a C,
    config: CrawlConfig,
}

impl<'a, C: PageController> CrawlOrchestrator<'a, C> {
    pub fn new(controller: &'a C, config: CrawlConfig) -> Self {
        Self { controller, config }
    }

    /// Crawls the active page and up to `max_extra_pages` ranked links
    ///
    /// Only a failure on the active page fails the crawl. Linked pages that
    /// cannot be extracted are logged and left out. Cancelling `cancel`
    /// closes the open background page and returns [`CrawlError::Cancelled`].
    pub async fn crawl(&self, cancel: &CancellationToken) -> Result<SiteModel, CrawlError> {
        let deadline = Instant::now() + self.config.total_timeout();

        let primary = self
            .controller
            .active_page()
            .await
            .map_err(|e| CrawlError::PrimaryFailure(e.to_string()))?;

        ::log::info!("Extracting page 1...");
        let page = self
            .extract(&primary, cancel, deadline)
            .await
            .map_err(|e| match e {
                StepError::Cancelled => CrawlError::Cancelled,
                other => CrawlError::PrimaryFailure(other.to_string()),
            })?;
        let mut site = SiteModel::new(page);

        let links = self.navigation_links(&primary, cancel, deadline).await?;
        let total = links.len() + 1;

        for (index, link) in links.into_iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(CrawlError::Cancelled);
            }
            if Instant::now() >= deadline {
                ::log::warn!(
                    "Crawl deadline reached; skipping {} remaining page(s)",
                    total - index - 1
                );
                break;
            }

            ::log::info!("Extracting page {} of {}: {}", index + 2, total, link.url);
            match self.visit(&link, cancel, deadline).await {
                Ok(page) => {
                    site.push(page, link.text);
                }
                Err(StepError::Cancelled) => return Err(CrawlError::Cancelled),
                Err(e) => ::log::warn!("Skipping page {} ({}): {}", index + 2, link.url, e),
            }
        }

        ::log::info!("Crawl finished with {} page(s)", site.len());
        Ok(site)
    }

    /// Ranked links of the active page, capped at `max_extra_pages` and at
    /// what a [`SiteModel`] can hold
    ///
    /// Failing to get links is not fatal; the crawl then covers one page.
    async fn navigation_links(
        &self,
        primary: &C::Handle,
        cancel: &CancellationToken,
        deadline: Instant,
    ) -> Result<Vec<RankedLink>, CrawlError> {
        let request = InspectRequest::GetNavigationLinks;
        let response = self
            .bounded(cancel, deadline, self.config.message_timeout(), async {
                self.controller
                    .send_to_page(primary, &request)
                    .await
                    .map_err(StepError::from)
            })
            .await;

        let links = match response {
            Ok(response) => response.into_links().map_err(|e| e.to_string()),
            Err(StepError::Cancelled) => return Err(CrawlError::Cancelled),
            Err(e) => Err(e.to_string()),
        };

        match links {
            Ok(mut links) => {
                let limit = self.config.max_extra_pages.min(SiteModel::MAX_PAGES - 1);
                if limit < self.config.max_extra_pages {
                    ::log::debug!(
                        "Visiting at most {} linked pages (configured {})",
                        limit,
                        self.config.max_extra_pages
                    );
                }
                links.truncate(limit);
                Ok(links)
            }
            Err(reason) => {
                ::log::warn!("Could not find related pages: {}", reason);
                Ok(Vec::new())
            }
        }
    }

    /// Opens one linked page, extracts it and closes it again
    async fn visit(
        &self,
        link: &RankedLink,
        cancel: &CancellationToken,
        deadline: Instant,
    ) -> Result<PageModel, StepError> {
        let handle = self
            .bounded(cancel, deadline, self.config.message_timeout(), async {
                self.controller
                    .open_page(&link.url)
                    .await
                    .map_err(StepError::from)
            })
            .await?;

        let outcome = self.load_and_extract(&handle, cancel, deadline).await;

        if let Err(e) = self.controller.close_page(&handle).await {
            ::log::warn!("Failed to close page {}: {}", link.url, e);
        }

        outcome
    }

    async fn load_and_extract(
        &self,
        handle: &C::Handle,
        cancel: &CancellationToken,
        deadline: Instant,
    ) -> Result<PageModel, StepError> {
        let loaded = self
            .bounded(cancel, deadline, self.config.load_timeout(), async {
                self.controller
                    .wait_for_load(handle)
                    .await
                    .map_err(StepError::from)
            })
            .await;

        // A slow page is still worth a try
        match loaded {
            Ok(()) => {}
            Err(StepError::Cancelled) => return Err(StepError::Cancelled),
            Err(StepError::TimedOut) => ::log::debug!(
                "Page did not finish loading within {} ms; extracting anyway",
                self.config.load_timeout_ms
            ),
            Err(e) => ::log::debug!("Waiting for load failed ({}); extracting anyway", e),
        }

        self.extract(handle, cancel, deadline).await
    }

    async fn extract(
        &self,
        handle: &C::Handle,
        cancel: &CancellationToken,
        deadline: Instant,
    ) -> Result<PageModel, StepError> {
        let request = InspectRequest::ExtractPage;
        let response = self
            .bounded(cancel, deadline, self.config.message_timeout(), async {
                self.controller
                    .send_to_page(handle, &request)
                    .await
                    .map_err(StepError::from)
            })
            .await?;
        response
            .into_page()
            .map_err(|e| StepError::Failed(e.to_string()))
    }

    /// Runs `step` until it finishes, `limit` elapses, the crawl deadline
    /// passes or the crawl is cancelled, whichever comes first
    async fn bounded<T, F>(
        &self,
        cancel: &CancellationToken,
        deadline: Instant,
        limit: Duration,
        step: F,
    ) -> Result<T, StepError>
    where
        F: Future<Output = Result<T, StepError>>,
    {
        let step_deadline = deadline.min(Instant::now() + limit);
        tokio::select! {
            _ = cancel.cancelled() => Err(StepError::Cancelled),
            result = timeout_at(step_deadline, step) => match result {
                Ok(outcome) => outcome,
                Err(_) => Err(StepError::TimedOut),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawlers::controller::Screenshot;
    use crate::inspector::{InspectData, InspectResponse};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Clone, Copy, PartialEq)]
    enum Behavior {
        Loads,
        NeverLoads,
        FailsExtraction,
        CancelsOnLoad,
    }

    #[derive(Default)]
    struct Ledger {
        opened: Vec<usize>,
        closed: Vec<usize>,
        open_now: usize,
        max_open: usize,
    }

    /// In-memory browser: handle 0 is the active page
    struct FakeController {
        primary_fails: bool,
        links: Vec<RankedLink>,
        behaviors: HashMap<String, Behavior>,
        urls: Mutex<Vec<String>>,
        ledger: Mutex<Ledger>,
        cancel: CancellationToken,
    }

    impl FakeController {
        fn new(link_count: usize) -> Self {
            let links = (0..link_count)
                .map(|i| RankedLink {
                    text: format!("Link {}", i),
                    url: format!("https://site.test/p{}", i),
                    score: 20 - i as i32,
                })
                .collect();
            Self {
                primary_fails: false,
                links,
                behaviors: HashMap::new(),
                urls: Mutex::new(vec!["https://site.test/".to_string()]),
                ledger: Mutex::new(Ledger::default()),
                cancel: CancellationToken::new(),
            }
        }

        fn with_behavior(mut self, index: usize, behavior: Behavior) -> Self {
            self.behaviors
                .insert(format!("https://site.test/p{}", index), behavior);
            self
        }

        fn behavior(&self, handle: usize) -> Behavior {
            let url = self.urls.lock().unwrap()[handle].clone();
            self.behaviors.get(&url).copied().unwrap_or(Behavior::Loads)
        }

        fn url(&self, handle: usize) -> String {
            self.urls.lock().unwrap()[handle].clone()
        }
    }

    #[async_trait]
    impl PageController for FakeController {
        type Handle = usize;

        async fn active_page(&self) -> Result<usize, ControllerError> {
            Ok(0)
        }

        async fn page_url(&self, handle: &usize) -> Result<String, ControllerError> {
            Ok(self.url(*handle))
        }

        async fn open_page(&self, url: &str) -> Result<usize, ControllerError> {
            let mut urls = self.urls.lock().unwrap();
            urls.push(url.to_string());
            let handle = urls.len() - 1;

            let mut ledger = self.ledger.lock().unwrap();
            ledger.opened.push(handle);
            ledger.open_now += 1;
            ledger.max_open = ledger.max_open.max(ledger.open_now);
            Ok(handle)
        }

        async fn wait_for_load(&self, handle: &usize) -> Result<(), ControllerError> {
            match self.behavior(*handle) {
                Behavior::NeverLoads => std::future::pending().await,
                Behavior::CancelsOnLoad => {
                    self.cancel.cancel();
                    std::future::pending().await
                }
                _ => Ok(()),
            }
        }

        async fn send_to_page(
            &self,
            handle: &usize,
            request: &InspectRequest,
        ) -> Result<InspectResponse, ControllerError> {
            if *handle == 0 && *request == InspectRequest::GetNavigationLinks {
                return Ok(InspectResponse::ok(InspectData::Links(self.links.clone())));
            }
            if *handle == 0 && self.primary_fails {
                return Ok(InspectResponse::failed("content script unavailable"));
            }
            if self.behavior(*handle) == Behavior::FailsExtraction {
                return Err(ControllerError::Other("tab crashed".to_string()));
            }
            let page = PageModel {
                url: self.url(*handle),
                title: format!("Title {}", handle),
                ..PageModel::default()
            };
            Ok(InspectResponse::ok(InspectData::Page(Box::new(page))))
        }

        async fn close_page(&self, handle: &usize) -> Result<(), ControllerError> {
            let mut ledger = self.ledger.lock().unwrap();
            ledger.closed.push(*handle);
            ledger.open_now -= 1;
            Ok(())
        }

        async fn capture_visible_region(&self, _: &usize) -> Result<Screenshot, ControllerError> {
            Err(ControllerError::Other("not supported".to_string()))
        }
    }

    fn page_urls(site: &SiteModel) -> Vec<String> {
        site.pages().iter().map(|p| p.page.url.clone()).collect()
    }

    #[tokio::test]
    async fn test_crawl_visits_top_ranked_links_in_order() {
        let controller = FakeController::new(6);
        let orchestrator = CrawlOrchestrator::new(&controller, CrawlConfig::default());

        let site = orchestrator.crawl(&CancellationToken::new()).await.unwrap();

        assert_eq!(site.len(), 5);
        assert_eq!(
            page_urls(&site),
            vec![
                "https://site.test/",
                "https://site.test/p0",
                "https://site.test/p1",
                "https://site.test/p2",
                "https://site.test/p3",
            ]
        );
        assert_eq!(site.pages()[0].nav_link_text, None);
        assert_eq!(site.pages()[1].nav_link_text.as_deref(), Some("Link 0"));

        let ledger = controller.ledger.lock().unwrap();
        assert_eq!(ledger.opened, ledger.closed);
        assert_eq!(ledger.max_open, 1);
    }

    #[tokio::test]
    async fn test_extra_pages_are_capped_by_site_size() {
        let controller = FakeController::new(8);
        let config = CrawlConfig {
            max_extra_pages: 7,
            ..CrawlConfig::default()
        };
        let orchestrator = CrawlOrchestrator::new(&controller, config);

        let site = orchestrator.crawl(&CancellationToken::new()).await.unwrap();

        assert_eq!(site.len(), SiteModel::MAX_PAGES);
        let ledger = controller.ledger.lock().unwrap();
        assert_eq!(ledger.opened, vec![1, 2, 3, 4]);
        assert_eq!(ledger.opened, ledger.closed);
    }

    #[tokio::test]
    async fn test_failed_linked_page_is_omitted() {
        let controller = FakeController::new(3).with_behavior(1, Behavior::FailsExtraction);
        let orchestrator = CrawlOrchestrator::new(&controller, CrawlConfig::default());

        let site = orchestrator.crawl(&CancellationToken::new()).await.unwrap();

        assert_eq!(
            page_urls(&site),
            vec!["https://site.test/", "https://site.test/p0", "https://site.test/p2"]
        );
        let ledger = controller.ledger.lock().unwrap();
        assert_eq!(ledger.opened.len(), 3);
        assert_eq!(ledger.opened, ledger.closed);
    }

    #[tokio::test]
    async fn test_primary_failure_is_fatal() {
        let mut controller = FakeController::new(3);
        controller.primary_fails = true;
        let orchestrator = CrawlOrchestrator::new(&controller, CrawlConfig::default());

        let result = orchestrator.crawl(&CancellationToken::new()).await;

        match result {
            Err(CrawlError::PrimaryFailure(reason)) => {
                assert!(reason.contains("content script unavailable"))
            }
            other => panic!("expected primary failure, got {:?}", other.map(|s| s.len())),
        }
        assert!(controller.ledger.lock().unwrap().opened.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_page_is_extracted_after_load_timeout() {
        let controller = FakeController::new(1).with_behavior(0, Behavior::NeverLoads);
        let orchestrator = CrawlOrchestrator::new(&controller, CrawlConfig::default());

        let started = Instant::now();
        let site = orchestrator.crawl(&CancellationToken::new()).await.unwrap();

        assert_eq!(site.len(), 2);
        assert!(started.elapsed() >= Duration::from_millis(5_000));
        assert!(started.elapsed() < Duration::from_millis(6_000));
        let ledger = controller.ledger.lock().unwrap();
        assert_eq!(ledger.closed, vec![1]);
    }

    #[tokio::test]
    async fn test_cancellation_closes_open_page() {
        let controller = FakeController::new(4).with_behavior(1, Behavior::CancelsOnLoad);
        let orchestrator = CrawlOrchestrator::new(&controller, CrawlConfig::default());

        let result = orchestrator.crawl(&controller.cancel.clone()).await;

        assert!(matches!(result, Err(CrawlError::Cancelled)));
        let ledger = controller.ledger.lock().unwrap();
        assert_eq!(ledger.opened, vec![1, 2]);
        assert_eq!(ledger.closed, vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_total_deadline_stops_the_crawl() {
        let controller = FakeController::new(4)
            .with_behavior(0, Behavior::NeverLoads)
            .with_behavior(1, Behavior::NeverLoads)
            .with_behavior(2, Behavior::NeverLoads);
        let config = CrawlConfig {
            total_timeout_ms: 7_000,
            ..CrawlConfig::default()
        };
        let orchestrator = CrawlOrchestrator::new(&controller, config);

        let site = orchestrator.crawl(&CancellationToken::new()).await.unwrap();

        // p0 waits out its 5 s load timeout, p1 only until the 7 s deadline;
        // p2 is never opened.
        assert_eq!(
            page_urls(&site),
            vec!["https://site.test/", "https://site.test/p0", "https://site.test/p1"]
        );
        let ledger = controller.ledger.lock().unwrap();
        assert_eq!(ledger.opened, ledger.closed);
        assert_eq!(ledger.opened, vec![1, 2]);
    }
}
