use super::dom::{Document, attr, is_in_viewport, natural_size_of, rect_of, squashed_text};
use super::text::clean_text;
use crate::models::{SelectionImage, VisibleElements, VisibleModel};
use scraper::{ElementRef, Selector};
use std::sync::LazyLock;

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("Failed to parse built-in selector - this is a bug")
}

static BODY_ELEMENTS: LazyLock<Selector> = LazyLock::new(|| selector("body *"));
static IMG: LazyLock<Selector> = LazyLock::new(|| selector("img"));
static BUTTONS: LazyLock<Selector> =
    LazyLock::new(|| selector("button, .btn, [role=\"button\"]"));
static HEADINGS: LazyLock<Selector> = LazyLock::new(|| selector("h1, h2, h3, h4, h5, h6"));
static PARAGRAPHS: LazyLock<Selector> = LazyLock::new(|| selector("p"));

/// What the user can currently see without scrolling
pub fn extract_visible(doc: &Document) -> VisibleModel {
    VisibleModel {
        url: doc.url().to_string(),
        title: doc.title(),
        visible_text: extract_visible_text(doc),
        visible_images: extract_visible_images(doc),
        visible_elements: analyze_visible_elements(doc),
    }
}

/// Text of every text node whose parent element is in the viewport
pub fn extract_visible_text(doc: &Document) -> String {
    let viewport = doc.viewport();
    let mut text = String::new();

    for element in doc.select(&BODY_ELEMENTS) {
        if !is_in_viewport(element, &viewport) {
            continue;
        }
        for child in element.children() {
            if let Some(node) = child.value().as_text() {
                let trimmed = node.trim();
                if !trimmed.is_empty() {
                    text.push_str(trimmed);
                    text.push(' ');
                }
            }
        }
    }

    clean_text(&text)
}

pub fn extract_visible_images(doc: &Document) -> Vec<SelectionImage> {
    let viewport = doc.viewport();
    doc.select(&IMG)
        .filter(|img| is_in_viewport(*img, &viewport))
        .filter_map(|img| {
            let src = attr(img, "src").trim();
            if src.is_empty() || src.starts_with("data:") {
                return None;
            }
            let (width, height) = image_size(img);
            Some(SelectionImage {
                src: doc.resolve(src),
                alt: attr(img, "alt").to_string(),
                width,
                height,
            })
        })
        .collect()
}

fn image_size(img: ElementRef<'_>) -> (u32, u32) {
    natural_size_of(img)
        .or_else(|| rect_of(img).map(|r| (r.width.round() as u32, r.height.round() as u32)))
        .unwrap_or((0, 0))
}

pub fn analyze_visible_elements(doc: &Document) -> VisibleElements {
    let viewport = doc.viewport();
    let in_view = |el: &ElementRef<'_>| is_in_viewport(*el, &viewport);

    VisibleElements {
        buttons: doc.select(&BUTTONS).filter(in_view).map(squashed_text).collect(),
        headings: doc.select(&HEADINGS).filter(in_view).map(squashed_text).collect(),
        paragraphs: doc.select(&PARAGRAPHS).filter(in_view).count(),
    }
}
