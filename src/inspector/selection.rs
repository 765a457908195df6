use super::dom::{
    Document, SelectionFragment, attr, rect_of, resolve_against, squashed_text, strip_annotations,
};
use super::page::extract_table_data;
use crate::error::InspectError;
use crate::models::{SelectionImage, SelectionLink, SelectionModel};
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static IMG: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("img").expect("Failed to parse img selector - this is a bug")
});

static TABLE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("table").expect("Failed to parse table selector - this is a bug")
});

static ANCHOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a").expect("Failed to parse anchor selector - this is a bug")
});

/// Picks what to inspect: the recorded selection, or the first element
/// matching `fallback_selector` when nothing is selected
pub fn selection_fragment(
    doc: &Document,
    recorded: Option<&SelectionFragment>,
    fallback_selector: Option<&str>,
) -> Result<SelectionFragment, InspectError> {
    if let Some(fragment) = recorded.filter(|f| !f.is_empty()) {
        return Ok(fragment.clone());
    }

    let Some(css) = fallback_selector else {
        return Err(InspectError::NothingSelected);
    };
    let selector =
        Selector::parse(css).map_err(|e| InspectError::InvalidSelector(css.to_string(), e.to_string()))?;
    let element = doc
        .select(&selector)
        .next()
        .ok_or_else(|| InspectError::NoMatch(css.to_string()))?;

    Ok(SelectionFragment {
        text: squashed_text(element),
        html: element.html(),
    })
}

/// Builds the selection model from a selected fragment
///
/// The fragment markup is parsed on its own; image and link targets are
/// resolved against the page the selection was made on. The returned markup
/// carries no snapshot annotations.
pub fn extract_selection(doc: &Document, fragment: &SelectionFragment) -> SelectionModel {
    let parsed = Html::parse_fragment(&fragment.html);
    let base = doc.base();

    let images: Vec<SelectionImage> = parsed
        .select(&IMG)
        .map(|img| {
            let (width, height) = rendered_size(img);
            SelectionImage {
                src: resolve_against(base, attr(img, "src")),
                alt: attr(img, "alt").to_string(),
                width,
                height,
            }
        })
        .collect();

    let tables: Vec<_> = parsed.select(&TABLE).map(extract_table_data).collect();

    let links = parsed
        .select(&ANCHOR)
        .map(|a| SelectionLink {
            text: a.text().collect::<String>().trim().to_string(),
            href: a
                .value()
                .attr("href")
                .map(|href| resolve_against(base, href))
                .unwrap_or_default(),
        })
        .collect();

    let selection_type = SelectionModel::classify(&tables, &images);

    SelectionModel {
        text: fragment.text.trim().to_string(),
        html: strip_annotations(&fragment.html),
        images,
        tables,
        links,
        selection_type,
    }
}

/// Rendered size: recorded rectangle first, then the size attributes
fn rendered_size(img: ElementRef<'_>) -> (u32, u32) {
    if let Some(rect) = rect_of(img) {
        return (rect.width.round() as u32, rect.height.round() as u32);
    }
    let dimension = |name| {
        attr(img, name)
            .trim()
            .trim_end_matches("px")
            .parse::<f64>()
            .map(|v| v.max(0.0).round() as u32)
            .unwrap_or(0)
    };
    (dimension("width"), dimension("height"))
}
