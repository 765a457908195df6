//! Session state and the command dispatcher
//!
//! Every user action is a [`Command`]; [`App::dispatch`] runs it and returns an
//! [`Outcome`] or an [`AppError`] that carries a user-facing message.

use crate::capture::{
    self, CaptureSlot, OverlaySurface, PointerEvent, RegionSelector, SelectorStep,
};
use crate::config::{AppConfig, Options};
use crate::crawlers::{CrawlOrchestrator, PageController};
use crate::error::{AppError, CaptureError, ControllerError};
use crate::inspector::{InspectRequest, InspectResponse};
use crate::models::{
    CaptureRecord, CaptureRect, PageModel, SelectionModel, SiteModel, VisibleModel,
};
use crate::notify::{Notifier, Priority};
use crate::prompt::{self, AnalysisScope};
use crate::store::{self, KeyValueStore};
use crate::vision::VisionClient;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// What the current prompt was generated from
#[derive(Debug, Clone, PartialEq)]
pub enum PromptSource {
    Site(Box<SiteModel>),
    Selection {
        model: Box<SelectionModel>,
        url: String,
    },
    Screenshot(CaptureRecord),
    Mockup {
        analysis: Option<(String, AnalysisScope)>,
    },
}

/// The prompt being worked on and where it came from
///
/// Replaced on every extraction or edit; read when the prompt is delivered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    prompt: Option<String>,
    source: Option<PromptSource>,
}

impl SessionState {
    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref()
    }

    pub fn source(&self) -> Option<&PromptSource> {
        self.source.as_ref()
    }

    fn replace(&mut self, prompt: String, source: Option<PromptSource>) -> String {
        self.prompt = Some(prompt.clone());
        self.source = source;
        prompt
    }
}

/// A user action
#[derive(Debug, Clone)]
pub enum Command {
    /// Selection prompt; falls back to the element matched by `selector`
    ExtractSelection { selector: Option<String> },
    ExtractPage,
    Crawl,
    ExtractVisible,
    /// Short prompt without inclusion options
    QuickPage,
    QuickSelection,
    ImageUrl { src: String },
    /// Selects `rect` on the active page and stores the capture in the slot
    Capture { rect: CaptureRect },
    /// Turns a pending capture into a screenshot prompt
    PickupCapture,
    Mockup {
        image: Vec<u8>,
        analyze: Option<AnalysisScope>,
    },
    /// Re-renders the current prompt with the stored options
    Synthesize,
    Edit { prompt: String },
    SetOption { key: String, value: bool },
    ShowOptions,
    Deliver,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Prompt(String),
    Visible(Box<VisibleModel>),
    Captured(CaptureRect),
    NothingPending,
    Options(Options),
    Delivery(String),
}

/// Everything a command needs: the browser, storage, notifications and config
pub struct App<C: PageController> {
    controller: C,
    store: Arc<dyn KeyValueStore>,
    notifier: Box<dyn Notifier>,
    overlay: Box<dyn Fn() -> Box<dyn OverlaySurface> + Send + Sync>,
    vision: VisionClient,
    config: AppConfig,
    state: SessionState,
}

impl<C: PageController> App<C> {
    pub fn new(
        controller: C,
        store: Arc<dyn KeyValueStore>,
        notifier: Box<dyn Notifier>,
        config: AppConfig,
    ) -> Self {
        Self {
            controller,
            store,
            notifier,
            overlay: Box::new(|| Box::new(capture::LogOverlay)),
            vision: VisionClient::new(config.vision.clone()),
            config,
            state: SessionState::default(),
        }
    }

    /// Uses `factory` to build the overlay for each region selection
    pub fn with_overlay<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn OverlaySurface> + Send + Sync + 'static,
    {
        self.overlay = Box::new(factory);
        self
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    pub fn into_controller(self) -> C {
        self.controller
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn options(&self) -> Result<Options, AppError> {
        Ok(store::load_options(self.store.as_ref())?)
    }

    pub async fn dispatch(
        &mut self,
        command: Command,
        cancel: &CancellationToken,
    ) -> Result<Outcome, AppError> {
        match command {
            Command::ExtractSelection { selector } => {
                let handle = self.controller.active_page().await?;
                let url = self.controller.page_url(&handle).await?;
                let model = self
                    .inspect(&handle, &InspectRequest::ExtractSelected { selector })
                    .await?
                    .into_selection()?;
                let prompt = prompt::selection_prompt(&model, &url);
                let source = PromptSource::Selection {
                    model: Box::new(model),
                    url,
                };
                Ok(Outcome::Prompt(self.state.replace(prompt, Some(source))))
            }
            Command::ExtractPage => {
                let page = self.extract_page().await?;
                self.render_site(SiteModel::new(page))
            }
            Command::Crawl => {
                let orchestrator =
                    CrawlOrchestrator::new(&self.controller, self.config.crawl.clone());
                let site = orchestrator.crawl(cancel).await?;
                ::log::info!("Generating prompt from {} page(s)", site.len());
                self.render_site(site)
            }
            Command::ExtractVisible => {
                let handle = self.controller.active_page().await?;
                let visible = self
                    .inspect(&handle, &InspectRequest::ExtractVisible)
                    .await?
                    .into_visible()?;
                Ok(Outcome::Visible(Box::new(visible)))
            }
            Command::QuickPage => {
                let page = self.extract_page().await?;
                let prompt = prompt::quick_page_prompt(&page);
                Ok(Outcome::Prompt(self.state.replace(prompt, None)))
            }
            Command::QuickSelection => {
                let handle = self.controller.active_page().await?;
                let model = self
                    .inspect(&handle, &InspectRequest::ExtractSelected { selector: None })
                    .await?
                    .into_selection()?;
                let prompt = prompt::quick_selection_prompt(&model);
                Ok(Outcome::Prompt(self.state.replace(prompt, None)))
            }
            Command::ImageUrl { src } => {
                let prompt = prompt::image_url_prompt(&src);
                Ok(Outcome::Prompt(self.state.replace(prompt, None)))
            }
            Command::Capture { rect } => self.capture(rect).await,
            Command::PickupCapture => self.pickup(),
            Command::Mockup { image, analyze } => self.mockup(&image, analyze).await,
            Command::Synthesize => self.synthesize(),
            Command::Edit { prompt } => {
                let prompt = prompt.trim().to_string();
                if prompt.is_empty() {
                    return Err(AppError::EmptyPrompt);
                }
                self.state.prompt = Some(prompt.clone());
                Ok(Outcome::Prompt(prompt))
            }
            Command::SetOption { key, value } => {
                let mut options = self.options()?;
                if !options.set(&key, value) {
                    ::log::warn!("Ignoring unknown option {}", key);
                } else {
                    store::save_options(self.store.as_ref(), &options)?;
                }
                Ok(Outcome::Options(options))
            }
            Command::ShowOptions => Ok(Outcome::Options(self.options()?)),
            Command::Deliver => {
                let prompt = self.state.prompt().ok_or(AppError::NoPrompt)?;
                let url = prompt::delivery_url(&self.config.delivery_base_url, prompt);
                ::log::info!("Delivery URL is {} bytes long", url.len());
                Ok(Outcome::Delivery(url))
            }
        }
    }

    async fn inspect(
        &self,
        handle: &C::Handle,
        request: &InspectRequest,
    ) -> Result<InspectResponse, AppError> {
        let limit = self.config.crawl.message_timeout();
        match tokio::time::timeout(limit, self.controller.send_to_page(handle, request)).await {
            Ok(response) => Ok(response?),
            Err(_) => Err(ControllerError::MessageTimeout(self.config.crawl.message_timeout_ms).into()),
        }
    }

    async fn extract_page(&self) -> Result<PageModel, AppError> {
        let handle = self.controller.active_page().await?;
        Ok(self
            .inspect(&handle, &InspectRequest::ExtractPage)
            .await?
            .into_page()?)
    }

    fn render_site(&mut self, site: SiteModel) -> Result<Outcome, AppError> {
        let options = self.options()?;
        let prompt = prompt::site_prompt(&site, &options);
        Ok(Outcome::Prompt(
            self.state
                .replace(prompt, Some(PromptSource::Site(Box::new(site)))),
        ))
    }

    fn synthesize(&mut self) -> Result<Outcome, AppError> {
        let prompt = match self.state.source() {
            Some(PromptSource::Site(site)) => {
                prompt::site_prompt(site, &self.options()?)
            }
            Some(PromptSource::Selection { model, url }) => prompt::selection_prompt(model, url),
            Some(PromptSource::Screenshot(_)) => prompt::screenshot_prompt(),
            Some(PromptSource::Mockup { analysis: None }) => prompt::mockup_prompt(),
            Some(PromptSource::Mockup {
                analysis: Some((text, scope)),
            }) => prompt::mockup_analysis_prompt(text, *scope),
            None => return Err(AppError::NoPrompt),
        };
        self.state.prompt = Some(prompt.clone());
        Ok(Outcome::Prompt(prompt))
    }

    async fn capture(&mut self, rect: CaptureRect) -> Result<Outcome, AppError> {
        let handle = self.controller.active_page().await?;
        let url = self.controller.page_url(&handle).await?;
        if capture::is_restricted(&url) {
            return Err(CaptureError::Restricted(url).into());
        }

        let mut selector = RegionSelector::start((self.overlay)(), self.config.capture.min_selection_px);
        let (x0, y0) = (f64::from(rect.x), f64::from(rect.y));
        let (x1, y1) = (x0 + f64::from(rect.width), y0 + f64::from(rect.height));
        selector.handle(PointerEvent::Down { x: x0, y: y0 });
        selector.handle(PointerEvent::Move { x: x1, y: y1 });
        let selected = match selector.handle(PointerEvent::Up { x: x1, y: y1 }) {
            SelectorStep::Selected(rect) => rect,
            SelectorStep::Rejected(e) => return Err(e.into()),
            SelectorStep::Cancelled | SelectorStep::Pending => {
                return Err(CaptureError::Cancelled.into());
            }
        };

        let result = capture::capture_region(
            &self.controller,
            &handle,
            selected,
            self.config.capture.timeout(),
        )
        .await;
        selector.finish(&result);
        let record = result?;

        CaptureSlot::new(self.store.clone(), self.config.capture.ttl_ms).put(&record)?;
        self.notifier.set_badge("1");
        self.notifier.notify(
            "Screenshot captured",
            "Open the prompt view to turn it into a website prompt",
            Priority::Normal,
        );
        Ok(Outcome::Captured(record.rect))
    }

    fn pickup(&mut self) -> Result<Outcome, AppError> {
        let slot = CaptureSlot::new(self.store.clone(), self.config.capture.ttl_ms);
        let taken = slot.take(chrono::Utc::now().timestamp_millis())?;
        self.notifier.set_badge("");
        match taken {
            Some(record) => {
                let prompt = prompt::screenshot_prompt();
                Ok(Outcome::Prompt(
                    self.state
                        .replace(prompt, Some(PromptSource::Screenshot(record))),
                ))
            }
            None => Ok(Outcome::NothingPending),
        }
    }

    async fn mockup(
        &mut self,
        image: &[u8],
        analyze: Option<AnalysisScope>,
    ) -> Result<Outcome, AppError> {
        let format =
            image::guess_format(image).map_err(|e| AppError::InvalidImage(e.to_string()))?;

        let analysis = match analyze {
            Some(scope) => {
                let text = self
                    .vision
                    .analyze(image, format.to_mime_type(), scope)
                    .await?;
                Some((text, scope))
            }
            None => None,
        };
        let prompt = match &analysis {
            Some((text, scope)) => prompt::mockup_analysis_prompt(text, *scope),
            None => prompt::mockup_prompt(),
        };
        Ok(Outcome::Prompt(
            self.state
                .replace(prompt, Some(PromptSource::Mockup { analysis })),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawlers::Screenshot;
    use crate::inspector::Inspector;
    use crate::inspector::dom::{PageSnapshot, SelectionFragment};
    use crate::notify::LogNotifier;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::io::Cursor;

    const PAGE: &str = r#"<html><head><title>Crumb Bakery</title>
        <meta name="description" content="Neighbourhood bakery"></head>
        <body><main><h1>Fresh bread</h1>
        <p>We bake every morning.</p>
        <table><thead><tr><th>Loaf</th><th>Price</th></tr></thead>
        <tbody><tr><td>Rye</td><td>4</td></tr></tbody></table></main></body></html>"#;

    /// Single-tab browser serving a fixed document
    struct StaticPage {
        url: String,
        selection: Option<SelectionFragment>,
        inspector: Inspector,
    }

    impl StaticPage {
        fn new(url: &str) -> Self {
            Self {
                url: url.to_string(),
                selection: None,
                inspector: Inspector::default(),
            }
        }
    }

    #[async_trait]
    impl PageController for StaticPage {
        type Handle = usize;

        async fn active_page(&self) -> Result<usize, ControllerError> {
            Ok(0)
        }

        async fn page_url(&self, _: &usize) -> Result<String, ControllerError> {
            Ok(self.url.clone())
        }

        async fn open_page(&self, url: &str) -> Result<usize, ControllerError> {
            Err(ControllerError::Other(format!("cannot open {}", url)))
        }

        async fn wait_for_load(&self, _: &usize) -> Result<(), ControllerError> {
            Ok(())
        }

        async fn send_to_page(
            &self,
            _: &usize,
            request: &InspectRequest,
        ) -> Result<InspectResponse, ControllerError> {
            let mut snapshot = PageSnapshot::new(&self.url, PAGE);
            if let Some(selection) = &self.selection {
                snapshot = snapshot.with_selection(selection.clone());
            }
            Ok(self.inspector.handle(&snapshot, request))
        }

        async fn close_page(&self, _: &usize) -> Result<(), ControllerError> {
            Ok(())
        }

        async fn capture_visible_region(&self, _: &usize) -> Result<Screenshot, ControllerError> {
            let img = image::RgbaImage::from_pixel(200, 100, image::Rgba([0, 0, 255, 255]));
            let mut buffer = Cursor::new(Vec::new());
            img.write_to(&mut buffer, image::ImageFormat::Png)
                .map_err(|e| ControllerError::Other(e.to_string()))?;
            Ok(Screenshot {
                png: buffer.into_inner(),
                device_pixel_ratio: 1.0,
            })
        }
    }

    fn app(page: StaticPage) -> App<StaticPage> {
        App::new(
            page,
            Arc::new(MemoryStore::new()),
            Box::new(LogNotifier),
            AppConfig::default(),
        )
    }

    fn prompt_of(outcome: Outcome) -> String {
        match outcome {
            Outcome::Prompt(prompt) => prompt,
            other => panic!("expected a prompt, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_page_prompt_then_delivery() {
        let mut app = app(StaticPage::new("https://bakery.example/"));
        let cancel = CancellationToken::new();

        let prompt = prompt_of(app.dispatch(Command::ExtractPage, &cancel).await.unwrap());
        assert!(prompt.starts_with(
            "Create a comprehensive website based on: https://bakery.example/\n\n\
             Website Title: Crumb Bakery\n\nDescription: Neighbourhood bakery\n\n"
        ));
        assert!(prompt.contains("DATA TABLES:\nInclude 1 structured data table(s)"));

        match app.dispatch(Command::Deliver, &cancel).await.unwrap() {
            Outcome::Delivery(url) => assert!(url.starts_with(
                "https://b12.io/signup/?business_description=Create%20a%20comprehensive%20website"
            )),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_options_change_resynthesized_prompt() {
        let mut app = app(StaticPage::new("https://bakery.example/"));
        let cancel = CancellationToken::new();

        let before = prompt_of(app.dispatch(Command::ExtractPage, &cancel).await.unwrap());
        assert!(before.contains("ADDITIONAL REQUIREMENTS:"));

        app.dispatch(
            Command::SetOption {
                key: "enhancePrompt".to_string(),
                value: false,
            },
            &cancel,
        )
        .await
        .unwrap();
        let after = prompt_of(app.dispatch(Command::Synthesize, &cancel).await.unwrap());
        assert!(!after.contains("ADDITIONAL REQUIREMENTS:"));
        assert_eq!(app.state().prompt(), Some(after.as_str()));
    }

    #[tokio::test]
    async fn test_deliver_without_prompt_fails() {
        let mut app = app(StaticPage::new("https://bakery.example/"));
        let result = app.dispatch(Command::Deliver, &CancellationToken::new()).await;
        assert!(matches!(result, Err(AppError::NoPrompt)));

        let result = app
            .dispatch(
                Command::Edit {
                    prompt: "   ".to_string(),
                },
                &CancellationToken::new(),
            )
            .await;
        assert!(matches!(result, Err(AppError::EmptyPrompt)));
    }

    #[tokio::test]
    async fn test_selection_without_selection_is_extraction_failure() {
        let mut app = app(StaticPage::new("https://bakery.example/"));
        let result = app
            .dispatch(
                Command::ExtractSelection { selector: None },
                &CancellationToken::new(),
            )
            .await;
        match result {
            Err(e @ AppError::ExtractionFailure(_)) => {
                assert!(e.to_string().contains("no content selected"))
            }
            other => panic!("unexpected {:?}", other),
        }

        let prompt = prompt_of(
            app.dispatch(
                Command::ExtractSelection {
                    selector: Some("table".to_string()),
                },
                &CancellationToken::new(),
            )
            .await
            .unwrap(),
        );
        assert!(prompt.contains("Selection type: tabular data"));
        assert!(prompt.contains("Table 1: columns Loaf, Price (1 rows)"));
    }

    #[tokio::test]
    async fn test_capture_then_pickup_once() {
        let mut app = app(StaticPage::new("https://bakery.example/"));
        let cancel = CancellationToken::new();

        let rect = CaptureRect {
            x: 10,
            y: 10,
            width: 50,
            height: 40,
        };
        assert_eq!(
            app.dispatch(Command::Capture { rect }, &cancel).await.unwrap(),
            Outcome::Captured(rect)
        );

        let prompt = prompt_of(app.dispatch(Command::PickupCapture, &cancel).await.unwrap());
        assert!(prompt.starts_with("Create a website that EXACTLY matches the provided screenshot."));
        assert!(matches!(app.state().source(), Some(PromptSource::Screenshot(r)) if r.rect == rect));

        assert_eq!(
            app.dispatch(Command::PickupCapture, &cancel).await.unwrap(),
            Outcome::NothingPending
        );
    }

    #[tokio::test]
    async fn test_capture_refuses_internal_pages_and_small_regions() {
        let mut app = app(StaticPage::new("chrome://settings"));
        let rect = CaptureRect {
            x: 0,
            y: 0,
            width: 50,
            height: 50,
        };
        let result = app
            .dispatch(Command::Capture { rect }, &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(AppError::CaptureRestricted(_))));

        let mut app = self::app(StaticPage::new("https://bakery.example/"));
        let rect = CaptureRect {
            x: 0,
            y: 0,
            width: 5,
            height: 50,
        };
        let result = app
            .dispatch(Command::Capture { rect }, &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(AppError::CaptureGenericFailure(_))));
    }

    #[tokio::test]
    async fn test_mockup_without_analysis() {
        let mut app = app(StaticPage::new("https://bakery.example/"));
        let cancel = CancellationToken::new();

        let mut png = Cursor::new(Vec::new());
        image::RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 0, 255]))
            .write_to(&mut png, image::ImageFormat::Png)
            .unwrap();
        let prompt = prompt_of(
            app.dispatch(
                Command::Mockup {
                    image: png.into_inner(),
                    analyze: None,
                },
                &cancel,
            )
            .await
            .unwrap(),
        );
        assert!(prompt.contains("provided mockup/screenshot"));

        let result = app
            .dispatch(
                Command::Mockup {
                    image: b"plain text".to_vec(),
                    analyze: None,
                },
                &cancel,
            )
            .await;
        assert!(matches!(result, Err(AppError::InvalidImage(_))));

        // no API key configured
        let mut png = Cursor::new(Vec::new());
        image::RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 0, 255]))
            .write_to(&mut png, image::ImageFormat::Png)
            .unwrap();
        let result = app
            .dispatch(
                Command::Mockup {
                    image: png.into_inner(),
                    analyze: Some(AnalysisScope::Full),
                },
                &cancel,
            )
            .await;
        assert!(matches!(result, Err(AppError::CredentialMissing)));
    }

    #[tokio::test]
    async fn test_capture_overlay_is_removed_on_every_path() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct Counting(Arc<AtomicUsize>);

        impl OverlaySurface for Counting {
            fn show(&mut self, _: &str) {}
            fn draw_selection(&mut self, _: CaptureRect) {}
            fn show_dimensions(&mut self, _: &str) {}
            fn show_message(&mut self, _: &str, _: bool) {}
            fn teardown(&mut self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let teardowns = Arc::new(AtomicUsize::new(0));
        let counter = teardowns.clone();
        let mut app = app(StaticPage::new("https://bakery.example/"))
            .with_overlay(move || Box::new(Counting(counter.clone())));
        let cancel = CancellationToken::new();

        let small = CaptureRect { x: 0, y: 0, width: 3, height: 3 };
        let _ = app.dispatch(Command::Capture { rect: small }, &cancel).await;
        let outside = CaptureRect { x: 5000, y: 0, width: 30, height: 30 };
        let _ = app.dispatch(Command::Capture { rect: outside }, &cancel).await;
        let fine = CaptureRect { x: 0, y: 0, width: 30, height: 30 };
        app.dispatch(Command::Capture { rect: fine }, &cancel).await.unwrap();

        assert_eq!(teardowns.load(Ordering::SeqCst), 3);
    }
}
