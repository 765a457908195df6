//! Animation and interactive-component detection.
//!
//! Both detectors share one pass over the visible body elements. Which
//! elements count as carousels, modals and so on is decided by an
//! [`ElementClassifier`], so the heuristic table can be replaced without
//! touching the traversal.

use super::dom::{Document, ResolvedStyle, attr, element_ancestors, is_visible, simple_selector};
use crate::models::{
    Animations, Carousel, CssAnimation, CssTransition, HoverEffect, InteractiveElements,
    ScrollAnimation,
};
use regex::Regex;
use scraper::{ElementRef, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;

/// Cap for every detected collection
pub const MAX_ENTRIES: usize = 10;

static BODY_ELEMENTS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("body *").expect("Failed to parse body selector - this is a bug")
});

static IMG: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("img").expect("Failed to parse img selector - this is a bug")
});

static SCROLL_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)aos|scroll-?anim|fade-?in|slide-?in|animate-?on-?scroll")
        .expect("Failed to compile scroll animation regex - this is a bug")
});

static INTERACTIVE_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(card|btn|button|tile)\b")
        .expect("Failed to compile interactive class regex - this is a bug")
});

/// Kinds of interactive component the detector counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Carousel,
    Modal,
    Dropdown,
    Accordion,
    TabGroup,
    Video,
}

/// Decides whether an element is the root of an interactive component
pub trait ElementClassifier: Send + Sync {
    fn classify(&self, element: ElementRef<'_>) -> Option<ComponentKind>;
}

/// Class-name and markup heuristics for common component libraries
#[derive(Debug)]
pub struct HeuristicClassifier {
    rules: Vec<(ComponentKind, Regex)>,
}

impl Default for HeuristicClassifier {
    fn default() -> Self {
        let rules = [
            (ComponentKind::Carousel, r"(?i)\b(carousel|slider|swiper|slick-slider|glide)\b"),
            (ComponentKind::Modal, r"(?i)\b(modal|lightbox|popup|dialog)\b"),
            (ComponentKind::Dropdown, r"(?i)\b(dropdown|dropdown-menu|submenu)\b"),
            (ComponentKind::Accordion, r"(?i)\b(accordion|faq|collapsible)\b"),
            (ComponentKind::TabGroup, r"(?i)\b(tabs|tab-list|tablist|nav-tabs)\b"),
        ];
        Self {
            rules: rules
                .into_iter()
                .map(|(kind, pattern)| {
                    (
                        kind,
                        Regex::new(pattern)
                            .expect("Failed to compile component regex - this is a bug"),
                    )
                })
                .collect(),
        }
    }
}

impl ElementClassifier for HeuristicClassifier {
    fn classify(&self, element: ElementRef<'_>) -> Option<ComponentKind> {
        let el = element.value();

        match el.name() {
            "video" => return Some(ComponentKind::Video),
            "iframe" => {
                let src = attr(element, "src");
                if ["youtube", "vimeo", "wistia"].iter().any(|host| src.contains(host)) {
                    return Some(ComponentKind::Video);
                }
            }
            "dialog" => return Some(ComponentKind::Modal),
            "details" => return Some(ComponentKind::Accordion),
            _ => {}
        }

        match el.attr("role") {
            Some("dialog") | Some("alertdialog") => return Some(ComponentKind::Modal),
            Some("tablist") => return Some(ComponentKind::TabGroup),
            _ => {}
        }

        if el.attr("aria-haspopup").is_some_and(|v| v != "false") {
            return Some(ComponentKind::Dropdown);
        }

        let class = el.attr("class")?;
        self.rules
            .iter()
            .find(|(_, pattern)| pattern.is_match(class))
            .map(|(kind, _)| *kind)
    }
}

/// Resolved transition of one element, when it actually animates something
struct Transition {
    properties: String,
    duration: String,
}

fn transition_of(style: &ResolvedStyle) -> Option<Transition> {
    if let Some(durations) = style.get("transition-duration") {
        if durations.split(',').all(is_zero_time) {
            return None;
        }
        let properties = style.get_or("transition-property", "all");
        if properties.eq_ignore_ascii_case("none") {
            return None;
        }
        return Some(Transition {
            properties: properties.to_string(),
            duration: durations.to_string(),
        });
    }

    let shorthand = style.get("transition")?;
    if shorthand.eq_ignore_ascii_case("none") {
        return None;
    }

    let mut properties = Vec::new();
    let mut durations = Vec::new();
    for part in shorthand.split(',') {
        let mut tokens = part.split_whitespace();
        let property = tokens.next().unwrap_or("all");
        let duration = tokens.find(|t| t.ends_with('s')).unwrap_or("0s");
        if !is_zero_time(duration) {
            properties.push(property);
            durations.push(duration);
        }
    }

    if properties.is_empty() {
        return None;
    }
    Some(Transition {
        properties: properties.join(", "),
        duration: durations.join(", "),
    })
}

fn is_zero_time(value: &str) -> bool {
    let value = value.trim();
    let number = value
        .strip_suffix("ms")
        .or_else(|| value.strip_suffix('s'))
        .unwrap_or(value);
    number.trim().parse::<f64>().map(|n| n == 0.0).unwrap_or(true)
}

fn is_interactive_looking(element: ElementRef<'_>) -> bool {
    let el = element.value();
    matches!(el.name(), "a" | "button")
        || el.attr("role") == Some("button")
        || el.attr("class").is_some_and(|c| INTERACTIVE_CLASS.is_match(c))
}

/// Scroll trigger marking an element: a matching class name or `data-aos`
fn scroll_trigger(element: ElementRef<'_>) -> Option<String> {
    if let Some(effect) = element.value().attr("data-aos") {
        return Some(format!("data-aos={}", effect));
    }
    element
        .value()
        .attr("class")
        .unwrap_or("")
        .split_whitespace()
        .find(|class| SCROLL_CLASS.is_match(class))
        .map(str::to_string)
}

/// Pushes `entry` unless the list is full or `key` was already recorded
fn push_unique<T>(list: &mut Vec<T>, seen: &mut HashSet<String>, key: &str, entry: T) {
    if list.len() < MAX_ENTRIES && seen.insert(key.to_string()) {
        list.push(entry);
    }
}

#[derive(Default)]
struct Seen {
    animations: HashSet<String>,
    transitions: HashSet<String>,
    scroll: HashSet<String>,
    hover: HashSet<String>,
    carousels: HashSet<String>,
}

/// Detects animations and interactive components in one pass
pub fn inspect(
    doc: &Document,
    classifier: &dyn ElementClassifier,
) -> (Animations, InteractiveElements) {
    let mut animations = Animations::default();
    let mut interactive = InteractiveElements::default();
    let mut seen = Seen::default();

    for element in doc.select(&BODY_ELEMENTS) {
        if !is_visible(element) {
            continue;
        }
        let style = ResolvedStyle::of(element);
        let key = simple_selector(element);

        if let Some(name) = style
            .get("animation-name")
            .filter(|n| !n.eq_ignore_ascii_case("none"))
        {
            push_unique(
                &mut animations.css_animations,
                &mut seen.animations,
                &key,
                CssAnimation {
                    element: key.clone(),
                    name: name.to_string(),
                    duration: style.get_or("animation-duration", "0s").to_string(),
                    iteration_count: style
                        .get_or("animation-iteration-count", "1")
                        .to_string(),
                    timing_function: style
                        .get_or("animation-timing-function", "ease")
                        .to_string(),
                },
            );
        }

        if let Some(transition) = transition_of(&style) {
            if is_interactive_looking(element) {
                push_unique(
                    &mut animations.hover_effects,
                    &mut seen.hover,
                    &key,
                    HoverEffect {
                        element: key.clone(),
                        properties: transition.properties.clone(),
                    },
                );
            }
            push_unique(
                &mut animations.css_transitions,
                &mut seen.transitions,
                &key,
                CssTransition {
                    element: key.clone(),
                    properties: transition.properties,
                    duration: transition.duration,
                },
            );
        }

        if let Some(trigger) = scroll_trigger(element) {
            push_unique(
                &mut animations.scroll_triggered,
                &mut seen.scroll,
                &key,
                ScrollAnimation {
                    element: key.clone(),
                    trigger,
                },
            );
        }

        let Some(kind) = classifier.classify(element) else {
            continue;
        };
        // Nested parts of the same component (e.g. modal-dialog inside modal)
        // are not separate components.
        let nested = element_ancestors(element).any(|a| classifier.classify(a) == Some(kind));
        if nested {
            continue;
        }

        match kind {
            ComponentKind::Carousel => push_unique(
                &mut interactive.carousels,
                &mut seen.carousels,
                &key,
                Carousel {
                    element: key.clone(),
                    slides: count_slides(element),
                    autoplay: is_autoplay(element),
                },
            ),
            ComponentKind::Modal => interactive.modal_count += 1,
            ComponentKind::Dropdown => interactive.dropdown_count += 1,
            ComponentKind::Accordion => interactive.accordion_count += 1,
            ComponentKind::TabGroup => interactive.tab_group_count += 1,
            ComponentKind::Video => interactive.video_count += 1,
        }
    }

    animations.summary = summarize_animations(&animations);
    interactive.summary = summarize_interactive(&interactive);
    (animations, interactive)
}

fn is_slide_class(class: &str) -> bool {
    let class = class.to_ascii_lowercase();
    class == "slide"
        || class == "carousel-item"
        || class.ends_with("-slide")
        || class.ends_with("__slide")
}

fn count_slides(carousel: ElementRef<'_>) -> usize {
    let slides = carousel
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().classes().any(is_slide_class))
        .count();
    if slides > 0 {
        slides
    } else {
        carousel.select(&IMG).count()
    }
}

fn is_autoplay(carousel: ElementRef<'_>) -> bool {
    let el = carousel.value();
    el.attr("data-autoplay").is_some_and(|v| v != "false")
        || el.attr("data-ride") == Some("carousel")
        || el.attr("data-bs-ride") == Some("carousel")
        || el.classes().any(|c| c.to_ascii_lowercase().contains("autoplay"))
}

fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("1 {}", singular)
    } else {
        format!("{} {}", count, plural)
    }
}

fn join_counts(parts: &[(usize, &str, &str)]) -> Vec<String> {
    parts
        .iter()
        .filter(|(count, _, _)| *count > 0)
        .map(|(count, singular, many)| plural(*count, singular, many))
        .collect()
}

pub fn summarize_animations(animations: &Animations) -> String {
    let parts = join_counts(&[
        (animations.css_animations.len(), "CSS animation", "CSS animations"),
        (animations.css_transitions.len(), "transition effect", "transition effects"),
        (
            animations.scroll_triggered.len(),
            "scroll-triggered animation",
            "scroll-triggered animations",
        ),
        (animations.hover_effects.len(), "hover effect", "hover effects"),
    ]);
    if parts.is_empty() {
        "No significant animations detected.".to_string()
    } else {
        format!("Detected {}.", parts.join(", "))
    }
}

pub fn summarize_interactive(interactive: &InteractiveElements) -> String {
    let parts = join_counts(&[
        (interactive.carousels.len(), "carousel", "carousels"),
        (interactive.modal_count, "modal", "modals"),
        (interactive.dropdown_count, "dropdown menu", "dropdown menus"),
        (interactive.accordion_count, "accordion", "accordions"),
        (interactive.tab_group_count, "tab group", "tab groups"),
        (interactive.video_count, "video", "videos"),
    ]);
    if parts.is_empty() {
        "No interactive components detected.".to_string()
    } else {
        format!("Interactive components: {}.", parts.join(", "))
    }
}
