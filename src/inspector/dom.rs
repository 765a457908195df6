//! Document access for the inspectors.
//!
//! A [`PageSnapshot`] is the serialized state of a live document. When it comes
//! from a browser, every element carries the resolved style and geometry the
//! annotation script stamped onto it (`data-wg-style`, `data-wg-rect`,
//! `data-wg-natural`). Plain HTML works too: inline `style` attributes and the
//! user-agent defaults below are then the only style information.

use crate::models::Rect;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;
use url::Url;

/// Attribute holding the JSON object of resolved CSS properties
pub const STYLE_ATTR: &str = "data-wg-style";

/// Attribute holding the client rectangle as `x y width height`
pub const RECT_ATTR: &str = "data-wg-rect";

/// Attribute holding an image's natural size as `width height`
pub const NATURAL_ATTR: &str = "data-wg-natural";

/// Tags the user-agent stylesheet never renders
const UA_HIDDEN_TAGS: [&str; 9] = [
    "head", "script", "style", "meta", "link", "title", "template", "noscript", "base",
];

static STATE_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(active|show|shown|open|opened|hidden|visible|selected|current|disabled|collapsed|in|is-.+|has-.+)$")
        .expect("Failed to compile state class regex - this is a bug")
});

static ANNOTATION_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\s+data-wg-(?:style|rect|natural)=(?:"[^"]*"|'[^']*')"#)
        .expect("Failed to compile annotation regex - this is a bug")
});

static BODY_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("body").expect("Failed to parse body selector - this is a bug")
});

static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("title").expect("Failed to parse title selector - this is a bug")
});

/// Size and scroll offset of the browser viewport
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub scroll_x: f64,
    #[serde(default)]
    pub scroll_y: f64,
    /// Device pixel ratio, used to map CSS pixels onto screenshots
    #[serde(default = "default_pixel_ratio")]
    pub device_pixel_ratio: f64,
}

fn default_pixel_ratio() -> f64 {
    1.0
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
            scroll_x: 0.0,
            scroll_y: 0.0,
            device_pixel_ratio: default_pixel_ratio(),
        }
    }
}

/// Text and markup of the current user selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionFragment {
    pub text: String,
    pub html: String,
}

impl SelectionFragment {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.html.trim().is_empty()
    }
}

/// Serialized state of a document at inspection time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub url: String,
    pub html: String,
    #[serde(default)]
    pub viewport: Viewport,
    #[serde(default)]
    pub selection: Option<SelectionFragment>,
}

impl PageSnapshot {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
            viewport: Viewport::default(),
            selection: None,
        }
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn with_selection(mut self, selection: SelectionFragment) -> Self {
        self.selection = Some(selection);
        self
    }
}

/// A parsed snapshot
pub struct Document {
    html: Html,
    base: Option<Url>,
    url: String,
    viewport: Viewport,
}

impl Document {
    pub fn parse(snapshot: &PageSnapshot) -> Self {
        let base = Url::parse(&snapshot.url).ok();
        if base.is_none() {
            ::log::debug!("Snapshot URL is not absolute: {}", snapshot.url);
        }
        Self {
            html: Html::parse_document(&snapshot.html),
            base,
            url: snapshot.url.clone(),
            viewport: snapshot.viewport,
        }
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn base(&self) -> Option<&Url> {
        self.base.as_ref()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn body(&self) -> Option<ElementRef<'_>> {
        self.html.select(&BODY_SELECTOR).next()
    }

    pub fn select<'a>(&'a self, selector: &'a Selector) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        self.html.select(selector)
    }

    /// Whitespace-normalized document title
    pub fn title(&self) -> String {
        self.html
            .select(&TITLE_SELECTOR)
            .next()
            .map(squashed_text)
            .unwrap_or_default()
    }

    /// Resolves a possibly relative reference the way `element.href` does
    pub fn resolve(&self, raw: &str) -> String {
        resolve_against(self.base.as_ref(), raw)
    }
}

/// Resolves `raw` against `base`, keeping the raw value when that fails
pub fn resolve_against(base: Option<&Url>, raw: &str) -> String {
    let raw = raw.trim();
    match base {
        Some(base) => base
            .join(raw)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| raw.to_string()),
        None => raw.to_string(),
    }
}

/// CSS properties resolved for one element
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedStyle {
    props: HashMap<String, String>,
}

impl ResolvedStyle {
    /// Resolves user-agent defaults, then the inline style, then recorded computed style
    pub fn of(element: ElementRef<'_>) -> Self {
        let el = element.value();
        let mut props = HashMap::new();

        if UA_HIDDEN_TAGS.contains(&el.name()) || el.attr("hidden").is_some() {
            props.insert("display".to_string(), "none".to_string());
        }

        if let Some(inline) = el.attr("style") {
            for (name, value) in parse_declarations(inline) {
                props.insert(name, value);
            }
        }

        if let Some(computed) = el.attr(STYLE_ATTR) {
            match serde_json::from_str::<HashMap<String, String>>(computed) {
                Ok(map) => {
                    for (name, value) in map {
                        props.insert(name.to_ascii_lowercase(), value.trim().to_string());
                    }
                }
                Err(e) => ::log::trace!("Ignoring malformed {}: {}", STYLE_ATTR, e),
            }
        }

        Self { props }
    }

    /// Builds a style from a declaration block such as `color: red; display: none`
    pub fn from_declarations(css: &str) -> Self {
        Self {
            props: parse_declarations(css).into_iter().collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.props
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Property value, or `default` when it was never resolved
    pub fn get_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.get(name).unwrap_or(default)
    }

    pub fn display(&self) -> Option<&str> {
        self.get("display")
    }

    /// The visibility predicate: display, visibility and opacity of this element alone
    pub fn is_hidden(&self) -> bool {
        if self.display().is_some_and(|d| d.eq_ignore_ascii_case("none")) {
            return true;
        }
        if self
            .get("visibility")
            .is_some_and(|v| v.eq_ignore_ascii_case("hidden"))
        {
            return true;
        }
        self.get("opacity")
            .and_then(|o| o.parse::<f64>().ok())
            .is_some_and(|o| o == 0.0)
    }
}

/// Splits a CSS declaration block, keeping `;` inside parentheses and quotes intact
pub fn parse_declarations(css: &str) -> Vec<(String, String)> {
    let mut declarations = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    let mut push = |chunk: &str| {
        if let Some((name, value)) = chunk.split_once(':') {
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim();
            let value = value
                .strip_suffix("!important")
                .map(str::trim_end)
                .unwrap_or(value);
            if !name.is_empty() && !value.is_empty() {
                declarations.push((name, value.to_string()));
            }
        }
    };

    for (i, c) in css.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => {
                push(&css[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    push(&css[start..]);

    declarations
}

/// True when the element itself passes the visibility predicate and no
/// ancestor is `display: none`
pub fn is_visible(element: ElementRef<'_>) -> bool {
    if ResolvedStyle::of(element).is_hidden() {
        return false;
    }
    !element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| {
            ResolvedStyle::of(ancestor)
                .display()
                .is_some_and(|d| d.eq_ignore_ascii_case("none"))
        })
}

/// Recorded client rectangle of the element, if any
pub fn rect_of(element: ElementRef<'_>) -> Option<Rect> {
    let raw = element.value().attr(RECT_ATTR)?;
    let values = parse_numbers(raw);
    match values.as_slice() {
        [x, y, width, height] => Some(Rect::new(*x, *y, *width, *height)),
        _ => None,
    }
}

/// Recorded natural size of an image, if any
pub fn natural_size_of(element: ElementRef<'_>) -> Option<(u32, u32)> {
    let raw = element.value().attr(NATURAL_ATTR)?;
    match parse_numbers(raw).as_slice() {
        [w, h] if *w > 0.0 && *h > 0.0 => Some((w.round() as u32, h.round() as u32)),
        _ => None,
    }
}

fn parse_numbers(raw: &str) -> Vec<f64> {
    raw.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<f64>().ok())
        .collect()
}

/// Visible and lying fully inside the current viewport
pub fn is_in_viewport(element: ElementRef<'_>, viewport: &Viewport) -> bool {
    if !is_visible(element) {
        return false;
    }
    match rect_of(element) {
        Some(rect) => {
            rect.y >= 0.0
                && rect.x >= 0.0
                && rect.y + rect.height <= viewport.height
                && rect.x + rect.width <= viewport.width
        }
        None => false,
    }
}

/// Concatenated text of all descendant text nodes (`textContent`)
pub fn text_content(element: ElementRef<'_>) -> String {
    element.text().collect()
}

/// Text content with whitespace runs collapsed and ends trimmed
pub fn squashed_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Markup without the annotation attributes stamped on by the snapshot script
pub fn strip_annotations(html: &str) -> String {
    ANNOTATION_ATTR.replace_all(html, "").into_owned()
}

/// Attribute value, or an empty string
pub fn attr<'a>(element: ElementRef<'a>, name: &str) -> &'a str {
    element.value().attr(name).unwrap_or("")
}

/// Nearest inclusive ancestor matching `selector` (`Element.closest`)
pub fn closest<'a>(element: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    std::iter::once(element)
        .chain(element.ancestors().filter_map(ElementRef::wrap))
        .find(|candidate| selector.matches(candidate))
}

/// Element ancestors, nearest first
pub fn element_ancestors<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    element.ancestors().filter_map(ElementRef::wrap)
}

/// Short, stable label for an element: `#id`, or tag plus up to two
/// non-state class names
pub fn simple_selector(element: ElementRef<'_>) -> String {
    let el = element.value();
    if let Some(id) = el.id().filter(|id| !id.is_empty()) {
        return format!("#{}", id);
    }

    // `classes()` comes back sorted, so read the attribute for document order
    let mut classes: Vec<&str> = Vec::new();
    for class in el.attr("class").unwrap_or("").split_whitespace() {
        if classes.len() == 2 {
            break;
        }
        if !STATE_CLASS.is_match(class) && !classes.contains(&class) {
            classes.push(class);
        }
    }

    let mut selector = el.name().to_string();
    for class in classes {
        selector.push('.');
        selector.push_str(class);
    }
    selector
}

/// Parses a CSS length such as `12px` into pixels
pub fn parse_px(value: &str) -> Option<f64> {
    value.trim().trim_end_matches("px").trim().parse::<f64>().ok()
}
