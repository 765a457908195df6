use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Structured extraction result for one inspected document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageModel {
    /// URL of the page
    pub url: String,

    /// Document title (whitespace-normalized)
    pub title: String,

    /// `name`/`property` meta tags mapped to their content
    pub meta_tags: BTreeMap<String, String>,

    /// Visible headings in document order
    pub headings: Vec<Heading>,

    /// Heuristically isolated body text, at most 10,000 characters
    pub main_content: String,

    pub images: ImageCollection,

    /// Visible links, at most 50
    pub links: Vec<Link>,

    pub tables: Vec<Table>,

    pub forms: Vec<Form>,

    /// Representative palette, at most 10 entries
    pub colors: Vec<String>,

    /// Representative font families, at most 5 entries
    pub fonts: Vec<String>,

    pub layout: Layout,

    pub animations: Animations,

    pub interactive_elements: InteractiveElements,
}

impl PageModel {
    /// Value of the `description` meta tag, if any
    pub fn description(&self) -> Option<&str> {
        self.meta_tags
            .get("description")
            .map(String::as_str)
            .filter(|d| !d.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// Heading level, 1 through 6
    pub level: u8,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub text: String,
    pub href: String,
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form {
    pub fields: Vec<FormField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    #[serde(rename = "type")]
    pub field_type: String,
    pub name: String,
    pub placeholder: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    pub has_header: bool,
    pub has_navigation: bool,
    pub has_sidebar: bool,
    pub has_footer: bool,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub title: String,
    pub has_images: bool,
    pub has_form: bool,
}

/// Element rectangle in CSS pixels, relative to the viewport
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// Contextual role of an image inside the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Standalone,
    Linked,
    Figure,
    Carousel,
    Hero,
    Content,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInfo {
    pub src: String,
    pub alt: String,
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Reduced ratio such as `16:9`, or `unknown`
    pub aspect_ratio: String,
    /// Rendered position, when the snapshot recorded one
    pub rect: Option<Rect>,
    pub kind: ImageKind,
    /// Human-readable context, e.g. `figure with caption: Team photo`
    pub context: String,
    pub border_radius: String,
    pub has_shadow: bool,
    pub object_fit: String,
    pub filter: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundImage {
    pub url: String,
    pub element: String,
    pub size: String,
    pub repeat: String,
    pub position: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageCollection {
    /// Visible images, at most 50
    pub images: Vec<ImageInfo>,
    /// CSS background images, at most 20
    pub background_images: Vec<BackgroundImage>,
    pub hero_image: Option<ImageInfo>,
    /// Visible images plus background images before capping
    pub total_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CssAnimation {
    pub element: String,
    pub name: String,
    pub duration: String,
    pub iteration_count: String,
    pub timing_function: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CssTransition {
    pub element: String,
    pub properties: String,
    pub duration: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollAnimation {
    pub element: String,
    /// Class name or attribute that marked the element
    pub trigger: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoverEffect {
    pub element: String,
    pub properties: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Animations {
    pub css_animations: Vec<CssAnimation>,
    pub css_transitions: Vec<CssTransition>,
    pub scroll_triggered: Vec<ScrollAnimation>,
    pub hover_effects: Vec<HoverEffect>,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Carousel {
    pub element: String,
    pub slides: usize,
    pub autoplay: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractiveElements {
    pub carousels: Vec<Carousel>,
    pub modal_count: usize,
    pub dropdown_count: usize,
    pub accordion_count: usize,
    pub tab_group_count: usize,
    pub video_count: usize,
    pub summary: String,
}

/// One page of a crawl, tagged with the link text that led to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SitePage {
    #[serde(flatten)]
    pub page: PageModel,
    /// `None` for the primary page
    pub nav_link_text: Option<String>,
}

/// Ordered pages of a bounded crawl; never empty, at most five pages
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteModel {
    pages: Vec<SitePage>,
}

impl SiteModel {
    /// Maximum number of pages in one site model
    pub const MAX_PAGES: usize = 5;

    /// Starts a site model from its primary page
    pub fn new(primary: PageModel) -> Self {
        Self {
            pages: vec![SitePage {
                page: primary,
                nav_link_text: None,
            }],
        }
    }

    /// Appends an auxiliary page; returns false once the model is full
    pub fn push(&mut self, page: PageModel, nav_link_text: impl Into<String>) -> bool {
        if self.pages.len() >= Self::MAX_PAGES {
            return false;
        }
        self.pages.push(SitePage {
            page,
            nav_link_text: Some(nav_link_text.into()),
        });
        true
    }

    pub fn primary(&self) -> &PageModel {
        &self.pages[0].page
    }

    pub fn pages(&self) -> &[SitePage] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn is_multi_page(&self) -> bool {
        self.pages.len() > 1
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionType {
    #[default]
    Text,
    Table,
    Mixed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionImage {
    pub src: String,
    pub alt: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionLink {
    pub text: String,
    pub href: String,
}

/// Reduced model of a user selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionModel {
    pub text: String,
    pub html: String,
    pub images: Vec<SelectionImage>,
    pub tables: Vec<Table>,
    pub links: Vec<SelectionLink>,
    #[serde(rename = "type")]
    pub selection_type: SelectionType,
}

impl SelectionModel {
    /// Derives the selection type from its content
    pub fn classify(tables: &[Table], images: &[SelectionImage]) -> SelectionType {
        if !tables.is_empty() {
            SelectionType::Table
        } else if !images.is_empty() {
            SelectionType::Mixed
        } else {
            SelectionType::Text
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleElements {
    pub buttons: Vec<String>,
    pub headings: Vec<String>,
    pub paragraphs: usize,
}

/// Content of the current viewport only
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibleModel {
    pub url: String,
    pub title: String,
    pub visible_text: String,
    pub visible_images: Vec<SelectionImage>,
    pub visible_elements: VisibleElements,
}

/// Rectangle selected on screen, in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// A captured screen region waiting in the capture slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureRecord {
    pub rect: CaptureRect,
    /// Base64-encoded PNG
    pub image: String,
    /// Milliseconds since the Unix epoch
    pub captured_at: i64,
}
