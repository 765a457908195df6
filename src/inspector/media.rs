use super::dom::{
    Document, ResolvedStyle, Viewport, attr, element_ancestors, is_visible, natural_size_of,
    rect_of, simple_selector, squashed_text,
};
use crate::models::{BackgroundImage, ImageCollection, ImageInfo, ImageKind};
use regex::Regex;
use scraper::{ElementRef, Selector};
use std::sync::LazyLock;

pub const MAX_IMAGES: usize = 50;

pub const MAX_BACKGROUND_IMAGES: usize = 20;

/// Caption text kept in a figure's context description
const MAX_CAPTION_CHARS: usize = 60;

static IMG: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("img").expect("Failed to parse img selector - this is a bug")
});

static BODY_ELEMENTS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("body *").expect("Failed to parse body selector - this is a bug")
});

static FIGCAPTION: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("figcaption").expect("Failed to parse figcaption selector - this is a bug")
});

static CAROUSEL_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)carousel|slider|slide|swiper|gallery")
        .expect("Failed to compile carousel regex - this is a bug")
});

static HERO_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)hero|banner|jumbotron|masthead")
        .expect("Failed to compile hero regex - this is a bug")
});

static CSS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\(\s*['"]?([^'")]+)['"]?\s*\)"#)
        .expect("Failed to compile url regex - this is a bug")
});

/// Visible images, CSS background images and the hero image of a document
pub fn extract_images(doc: &Document) -> ImageCollection {
    let mut found: Vec<ImageInfo> = doc
        .select(&IMG)
        .filter(|img| is_visible(*img))
        .filter_map(|img| describe_image(doc, img))
        .collect();

    let hero_image = find_hero_image(&found, &doc.viewport()).map(|index| {
        let mut hero = found[index].clone();
        hero.kind = ImageKind::Hero;
        hero
    });

    let backgrounds = extract_background_images(doc);
    let total_count = found.len() + backgrounds.len();

    found.truncate(MAX_IMAGES);
    let mut background_images = backgrounds;
    background_images.truncate(MAX_BACKGROUND_IMAGES);

    ImageCollection {
        images: found,
        background_images,
        hero_image,
        total_count,
    }
}

fn describe_image(doc: &Document, img: ElementRef<'_>) -> Option<ImageInfo> {
    let raw_src = attr(img, "src").trim();
    if raw_src.is_empty() || raw_src.starts_with("data:") {
        return None;
    }

    let rect = rect_of(img);
    let (width, height) = natural_size_of(img)
        .or_else(|| rect.map(|r| (r.width.round() as u32, r.height.round() as u32)))
        .unwrap_or_else(|| (dimension_attr(img, "width"), dimension_attr(img, "height")));

    let style = ResolvedStyle::of(img);
    let (kind, context) = describe_image_context(img);

    Some(ImageInfo {
        src: doc.resolve(raw_src),
        alt: attr(img, "alt").trim().to_string(),
        title: attr(img, "title").trim().to_string(),
        width,
        height,
        aspect_ratio: aspect_ratio(width, height),
        rect,
        kind,
        context,
        border_radius: style.get_or("border-radius", "0px").to_string(),
        has_shadow: style
            .get("box-shadow")
            .is_some_and(|shadow| !shadow.eq_ignore_ascii_case("none")),
        object_fit: style.get_or("object-fit", "fill").to_string(),
        filter: style.get_or("filter", "none").to_string(),
    })
}

fn dimension_attr(img: ElementRef<'_>, name: &str) -> u32 {
    attr(img, name)
        .trim()
        .trim_end_matches("px")
        .parse::<f64>()
        .map(|v| v.max(0.0).round() as u32)
        .unwrap_or(0)
}

/// Classifies an image by its surroundings
///
/// The nearest anchor, figure or picture ancestor decides; otherwise
/// carousel/gallery and hero/banner class names anywhere up the chain do.
pub fn describe_image_context(img: ElementRef<'_>) -> (ImageKind, String) {
    for ancestor in element_ancestors(img) {
        match ancestor.value().name() {
            "a" => return (ImageKind::Linked, "linked image".to_string()),
            "figure" => {
                let caption = ancestor
                    .select(&FIGCAPTION)
                    .next()
                    .map(squashed_text)
                    .filter(|c| !c.is_empty());
                return match caption {
                    Some(caption) => (
                        ImageKind::Figure,
                        format!(
                            "figure with caption: {}",
                            super::text::truncate_chars(&caption, MAX_CAPTION_CHARS)
                        ),
                    ),
                    None => (ImageKind::Figure, "figure".to_string()),
                };
            }
            "picture" => return (ImageKind::Content, "responsive picture".to_string()),
            _ => {}
        }
    }

    let classes: Vec<&str> = element_ancestors(img)
        .filter_map(|ancestor| ancestor.value().attr("class"))
        .collect();

    if classes.iter().any(|class| CAROUSEL_CLASS.is_match(class)) {
        return (ImageKind::Carousel, "carousel/gallery image".to_string());
    }
    if classes.iter().any(|class| HERO_CLASS.is_match(class)) {
        return (ImageKind::Hero, "hero/banner image".to_string());
    }

    let standalone = img
        .parent()
        .and_then(ElementRef::wrap)
        .is_some_and(|parent| parent.value().name() == "body");
    if standalone {
        return (ImageKind::Standalone, "standalone image".to_string());
    }

    (ImageKind::Content, "content image".to_string())
}

/// Index of the largest image above the first viewport height
///
/// Only images with a recorded position qualify. Size is `width × height`;
/// on equal size the earlier image wins.
pub fn find_hero_image(images: &[ImageInfo], viewport: &Viewport) -> Option<usize> {
    let mut best: Option<(usize, u64)> = None;

    for (index, image) in images.iter().enumerate() {
        let Some(rect) = image.rect else {
            continue;
        };
        if rect.y + viewport.scroll_y >= viewport.height {
            continue;
        }
        let area = u64::from(image.width) * u64::from(image.height);
        if area == 0 {
            continue;
        }
        match best {
            Some((_, best_area)) if area <= best_area => {}
            _ => best = Some((index, area)),
        }
    }

    best.map(|(index, _)| index)
}

/// Aspect ratio as reduced `w:h` when small, otherwise `x.xx:1`
pub fn aspect_ratio(width: u32, height: u32) -> String {
    if width == 0 || height == 0 {
        return "unknown".to_string();
    }
    let divisor = gcd(width, height);
    let (w, h) = (width / divisor, height / divisor);
    if w <= 32 && h <= 32 {
        format!("{}:{}", w, h)
    } else {
        format!("{:.2}:1", f64::from(width) / f64::from(height))
    }
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 { a } else { gcd(b, a % b) }
}

/// Elements painted with a CSS background image
pub fn extract_background_images(doc: &Document) -> Vec<BackgroundImage> {
    let mut backgrounds = Vec::new();

    for element in doc.select(&BODY_ELEMENTS) {
        let style = ResolvedStyle::of(element);
        let Some(image) = style.get("background-image").or_else(|| style.get("background"))
        else {
            continue;
        };
        let Some(url) = CSS_URL.captures(image).and_then(|c| c.get(1)) else {
            continue;
        };
        let url = url.as_str().trim();
        if url.starts_with("data:") || !is_visible(element) {
            continue;
        }

        backgrounds.push(BackgroundImage {
            url: doc.resolve(url),
            element: simple_selector(element),
            size: style.get_or("background-size", "auto").to_string(),
            repeat: style.get_or("background-repeat", "repeat").to_string(),
            position: style.get_or("background-position", "0% 0%").to_string(),
        });
    }

    backgrounds
}
