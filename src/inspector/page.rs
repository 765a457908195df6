use super::dom::{
    Document, ResolvedStyle, attr, closest, is_visible, squashed_text, text_content,
};
use super::media;
use super::motion::{self, ElementClassifier};
use super::text::clean_text;
use crate::models::{Form, FormField, Heading, Layout, Link, PageModel, Section, Table};
use scraper::{ElementRef, Node, Selector};
use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

/// Link cap for one page
pub const MAX_LINKS: usize = 50;

/// Number of visible elements sampled for the palette
pub const COLOR_SAMPLE_SIZE: usize = 100;

pub const MAX_COLORS: usize = 10;

pub const MAX_FONTS: usize = 5;

/// Conventional content containers, tried in order after `main` and `article`
const CONTENT_SELECTORS: [&str; 5] = [
    "#content",
    "#main-content",
    ".content",
    ".main-content",
    "[role=\"main\"]",
];

/// Page chrome removed before falling back to the whole body
const CHROME_SELECTOR: &str = "header, nav, footer, aside, .sidebar, .navigation";

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("Failed to parse built-in selector - this is a bug")
}

static META: LazyLock<Selector> = LazyLock::new(|| selector("meta"));
static HEADINGS: LazyLock<Selector> = LazyLock::new(|| selector("h1, h2, h3, h4, h5, h6"));
static MAIN: LazyLock<Selector> = LazyLock::new(|| selector("main"));
static ARTICLE: LazyLock<Selector> = LazyLock::new(|| selector("article"));
static CONTENT: LazyLock<Vec<Selector>> =
    LazyLock::new(|| CONTENT_SELECTORS.iter().map(|css| selector(css)).collect());
static CHROME: LazyLock<Selector> = LazyLock::new(|| selector(CHROME_SELECTOR));
static ANCHORS: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));
static TABLES: LazyLock<Selector> = LazyLock::new(|| selector("table"));
static THEAD: LazyLock<Selector> = LazyLock::new(|| selector("thead"));
static TBODY: LazyLock<Selector> = LazyLock::new(|| selector("tbody"));
static ROWS: LazyLock<Selector> = LazyLock::new(|| selector("tr"));
static CELLS: LazyLock<Selector> = LazyLock::new(|| selector("th, td"));
static FORMS: LazyLock<Selector> = LazyLock::new(|| selector("form"));
static FIELDS: LazyLock<Selector> = LazyLock::new(|| selector("input, textarea, select"));
static LABEL: LazyLock<Selector> = LazyLock::new(|| selector("label"));
static ALL: LazyLock<Selector> = LazyLock::new(|| selector("*"));
static FONT_TAGS: LazyLock<Selector> =
    LazyLock::new(|| selector("h1, h2, h3, h4, h5, h6, p, a, button"));
static HEADER: LazyLock<Selector> = LazyLock::new(|| selector("header, [role=\"banner\"]"));
static FOOTER: LazyLock<Selector> = LazyLock::new(|| selector("footer, [role=\"contentinfo\"]"));
static NAVIGATION: LazyLock<Selector> =
    LazyLock::new(|| selector("nav, [role=\"navigation\"]"));
static SIDEBAR: LazyLock<Selector> = LazyLock::new(|| selector("aside, .sidebar"));
static SECTIONS: LazyLock<Selector> = LazyLock::new(|| selector("section, .section"));
static SECTION_HEADING: LazyLock<Selector> = LazyLock::new(|| selector("h1, h2, h3"));
static IMG: LazyLock<Selector> = LazyLock::new(|| selector("img"));

/// Builds the full page model for a document
pub fn extract_page(doc: &Document, classifier: &dyn ElementClassifier) -> PageModel {
    let (animations, interactive_elements) = motion::inspect(doc, classifier);

    PageModel {
        url: doc.url().to_string(),
        title: doc.title(),
        meta_tags: extract_meta_tags(doc),
        headings: extract_headings(doc),
        main_content: extract_main_content(doc),
        images: media::extract_images(doc),
        links: extract_links(doc),
        tables: extract_tables(doc),
        forms: extract_forms(doc),
        colors: extract_colors(doc),
        fonts: extract_fonts(doc),
        layout: analyze_layout(doc),
        animations,
        interactive_elements,
    }
}

/// `name`/`property` meta tags; later duplicates win
pub fn extract_meta_tags(doc: &Document) -> BTreeMap<String, String> {
    let mut meta = BTreeMap::new();
    for tag in doc.select(&META) {
        let el = tag.value();
        let name = el
            .attr("name")
            .filter(|n| !n.is_empty())
            .or_else(|| el.attr("property"));
        if let (Some(name), Some(content)) = (name, el.attr("content")) {
            if !name.is_empty() && !content.is_empty() {
                meta.insert(name.to_string(), content.to_string());
            }
        }
    }
    meta
}

pub fn extract_headings(doc: &Document) -> Vec<Heading> {
    doc.select(&HEADINGS)
        .filter(|h| is_visible(*h))
        .filter_map(|h| {
            let level = h.value().name()[1..].parse::<u8>().ok()?;
            Some(Heading {
                level,
                text: squashed_text(h),
            })
        })
        .collect()
}

/// Body text with navigation and other chrome left out
///
/// First match wins: `main`, `article`, the conventional content containers,
/// and finally the body with header, nav, footer, aside and sidebars removed.
pub fn extract_main_content(doc: &Document) -> String {
    if let Some(main) = doc.select(&MAIN).next() {
        return clean_text(&text_content(main));
    }

    if let Some(article) = doc.select(&ARTICLE).next() {
        return clean_text(&text_content(article));
    }

    for container in CONTENT.iter() {
        if let Some(element) = doc.select(container).next() {
            return clean_text(&text_content(element));
        }
    }

    match doc.body() {
        Some(body) => {
            let mut text = String::new();
            collect_text_excluding(body, &CHROME, &mut text);
            clean_text(&text)
        }
        None => String::new(),
    }
}

/// Appends the text below `element`, skipping subtrees that match `excluded`
fn collect_text_excluding(element: ElementRef<'_>, excluded: &Selector, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    if !excluded.matches(&child) {
                        collect_text_excluding(child, excluded, out);
                    }
                }
            }
            _ => {}
        }
    }
}

pub fn extract_links(doc: &Document) -> Vec<Link> {
    doc.select(&ANCHORS)
        .filter(|a| is_visible(*a))
        .take(MAX_LINKS)
        .map(|a| Link {
            text: squashed_text(a),
            href: doc.resolve(attr(a, "href")),
            title: attr(a, "title").to_string(),
        })
        .collect()
}

pub fn extract_tables(doc: &Document) -> Vec<Table> {
    doc.select(&TABLES)
        .filter(|t| is_visible(*t))
        .map(extract_table_data)
        .collect()
}

/// Headers and body rows of one table
///
/// Headers come from `thead`, or from the first row when it starts with a
/// `th` cell; that row is then not repeated among the body rows.
pub fn extract_table_data(table: ElementRef<'_>) -> Table {
    let mut headers = Vec::new();
    let thead = table.select(&THEAD).next();

    match thead {
        Some(thead) => {
            headers.extend(thead.select(&CELLS).map(squashed_text));
        }
        None => {
            if let Some(first_row) = table.select(&ROWS).next() {
                let cells: Vec<_> = first_row.select(&CELLS).collect();
                if cells.first().is_some_and(|c| c.value().name() == "th") {
                    headers.extend(cells.into_iter().map(squashed_text));
                }
            }
        }
    }

    let body = table.select(&TBODY).next().unwrap_or(table);
    let skip_first = thead.is_none() && !headers.is_empty();

    let rows = body
        .select(&ROWS)
        .enumerate()
        .filter(|(index, _)| !(skip_first && *index == 0))
        .map(|(_, row)| row.select(&CELLS).map(squashed_text).collect::<Vec<_>>())
        .filter(|cells| !cells.is_empty())
        .collect();

    Table { headers, rows }
}

pub fn extract_forms(doc: &Document) -> Vec<Form> {
    doc.select(&FORMS)
        .map(|form| Form {
            fields: form
                .select(&FIELDS)
                .map(|field| FormField {
                    field_type: field_type(field),
                    name: attr(field, "name").to_string(),
                    placeholder: attr(field, "placeholder").to_string(),
                    label: find_label_for_input(doc, field),
                })
                .collect(),
        })
        .filter(|form| !form.fields.is_empty())
        .collect()
}

fn field_type(field: ElementRef<'_>) -> String {
    let el = field.value();
    match el.name() {
        "textarea" => "textarea".to_string(),
        "select" if el.attr("multiple").is_some() => "select-multiple".to_string(),
        "select" => "select-one".to_string(),
        _ => el
            .attr("type")
            .map(|t| t.trim().to_ascii_lowercase())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "text".to_string()),
    }
}

/// Label text for a form field
///
/// Tries `label[for=id]`, then an enclosing label (minus the field's own
/// value), then a label immediately before the field.
pub fn find_label_for_input(doc: &Document, field: ElementRef<'_>) -> String {
    if let Some(id) = field.value().id().filter(|id| !id.is_empty()) {
        let label = doc
            .select(&LABEL)
            .find(|label| label.value().attr("for") == Some(id));
        if let Some(label) = label {
            return squashed_text(label);
        }
    }

    if let Some(parent) = closest(field, &LABEL) {
        let text = text_content(parent);
        let value = attr(field, "value");
        let text = if value.is_empty() {
            text
        } else {
            text.replacen(value, "", 1)
        };
        return text.split_whitespace().collect::<Vec<_>>().join(" ");
    }

    let previous = field.prev_siblings().find_map(ElementRef::wrap);
    if let Some(previous) = previous {
        if previous.value().name() == "label" {
            return squashed_text(previous);
        }
    }

    String::new()
}

/// Representative palette from the first visible elements
pub fn extract_colors(doc: &Document) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut colors = Vec::new();

    let sampled = doc
        .select(&ALL)
        .filter(|el| is_visible(*el))
        .take(COLOR_SAMPLE_SIZE);

    for element in sampled {
        let style = ResolvedStyle::of(element);
        let background = style
            .get("background-color")
            .filter(|bg| !is_transparent(bg));
        for color in [background, style.get("color")].into_iter().flatten() {
            if seen.insert(color.to_string()) {
                colors.push(color.to_string());
            }
        }
    }

    colors.truncate(MAX_COLORS);
    colors
}

fn is_transparent(color: &str) -> bool {
    let compact: String = color.chars().filter(|c| !c.is_whitespace()).collect();
    compact.eq_ignore_ascii_case("transparent") || compact == "rgba(0,0,0,0)"
}

/// First family of each sampled `font-family`, quotes removed
pub fn extract_fonts(doc: &Document) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut fonts = Vec::new();

    for element in doc.select(&FONT_TAGS).filter(|el| is_visible(*el)) {
        let style = ResolvedStyle::of(element);
        let Some(family) = style.get("font-family") else {
            continue;
        };
        let first = family
            .split(',')
            .next()
            .unwrap_or_default()
            .replace(['"', '\''], "")
            .trim()
            .to_string();
        if !first.is_empty() && seen.insert(first.clone()) {
            fonts.push(first);
        }
    }

    fonts.truncate(MAX_FONTS);
    fonts
}

pub fn analyze_layout(doc: &Document) -> Layout {
    let sections = doc
        .select(&SECTIONS)
        .filter(|section| is_visible(*section))
        .filter_map(|section| {
            let heading = section.select(&SECTION_HEADING).next()?;
            Some(Section {
                title: squashed_text(heading),
                has_images: section.select(&IMG).next().is_some(),
                has_form: section.select(&FORMS).next().is_some(),
            })
        })
        .collect();

    Layout {
        has_header: doc.select(&HEADER).next().is_some(),
        has_navigation: doc.select(&NAVIGATION).next().is_some(),
        has_sidebar: doc.select(&SIDEBAR).next().is_some(),
        has_footer: doc.select(&FOOTER).next().is_some(),
        sections,
    }
}
