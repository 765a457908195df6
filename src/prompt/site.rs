use crate::config::Options;
use crate::inspector::text::excerpt;
use crate::models::{Form, Heading, InteractiveElements, PageModel, SiteModel, SitePage, Table};

/// Content preview per page in summary mode
pub const SUMMARY_CONTENT_CHARS: usize = 400;

/// Content excerpt per page in detailed mode
pub const DETAILED_CONTENT_CHARS: usize = 2000;

/// Top-level headings listed per page in summary mode
const SUMMARY_HEADINGS: usize = 6;

/// Images described individually
const DETAILED_IMAGES: usize = 10;

const KEY_ANIMATIONS: usize = 5;
const HOVER_EFFECTS: usize = 5;
const PRIMARY_COLORS: usize = 5;
const FONT_FAMILIES: usize = 3;

/// Renders a site model into the website prompt
///
/// Output depends only on the model and the options. Blocks appear in a fixed
/// order; options only drop whole blocks.
pub fn site_prompt(site: &SiteModel, options: &Options) -> String {
    let main = site.primary();
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "Create a comprehensive website based on: {}\n\n",
        main.url
    ));
    if !main.title.is_empty() {
        prompt.push_str(&format!("Website Title: {}\n\n", main.title));
    }
    if let Some(description) = main.description() {
        prompt.push_str(&format!("Description: {}\n\n", description));
    }

    if site.is_multi_page() {
        prompt.push_str(&format!("MULTI-PAGE WEBSITE ({} pages):\n\n", site.len()));
        for (index, page) in site.pages().iter().enumerate() {
            if options.show_full_content {
                write_page_details(&mut prompt, index, page, options);
            } else {
                write_page_summary(&mut prompt, index, page);
            }
        }
    }

    if options.include_layout {
        write_structure(&mut prompt, site);
    }
    if options.include_images {
        write_images(&mut prompt, main);
    }
    write_animations(&mut prompt, main);
    write_interactive(&mut prompt, &main.interactive_elements);
    if options.include_styles {
        write_styles(&mut prompt, main);
    }
    if !main.tables.is_empty() {
        prompt.push_str("DATA TABLES:\n");
        prompt.push_str(&format!(
            "Include {} structured data table(s)\n\n",
            main.tables.len()
        ));
    }
    if options.enhance {
        write_enhancements(&mut prompt);
    }

    prompt.trim().to_string()
}

fn page_name(index: usize, page: &SitePage) -> String {
    match &page.nav_link_text {
        Some(text) if !text.is_empty() => text.clone(),
        _ if index == 0 => "Home".to_string(),
        _ => format!("Page {}", index + 1),
    }
}

fn indent(level: u8) -> String {
    "  ".repeat(usize::from(level.saturating_sub(1)))
}

fn write_page_header(prompt: &mut String, index: usize, page: &SitePage) {
    prompt.push_str(&format!(
        "=== PAGE {}: {} ===\n",
        index + 1,
        page_name(index, page)
    ));
    prompt.push_str(&format!("URL: {}\n\n", page.page.url));
}

fn write_page_summary(prompt: &mut String, index: usize, page: &SitePage) {
    write_page_header(prompt, index, page);
    let model = &page.page;

    if !model.headings.is_empty() {
        prompt.push_str("Main Sections:\n");
        for heading in model
            .headings
            .iter()
            .filter(|h| h.level <= 2)
            .take(SUMMARY_HEADINGS)
        {
            prompt.push_str(&format!("{}- {}\n", indent(heading.level), heading.text));
        }
        prompt.push('\n');
    }

    if !model.main_content.is_empty() {
        prompt.push_str(&format!(
            "Content Summary:\n{}\n\n",
            excerpt(&model.main_content, SUMMARY_CONTENT_CHARS)
        ));
    }

    prompt.push('\n');
}

/// Headings under one level-1 or level-2 heading
#[derive(Debug, PartialEq)]
struct HeadingGroup<'a> {
    /// `None` for headings that come before any level-1 or level-2 heading
    title: Option<&'a Heading>,
    subheadings: Vec<&'a Heading>,
}

fn group_headings(headings: &[Heading]) -> Vec<HeadingGroup<'_>> {
    let mut groups: Vec<HeadingGroup<'_>> = Vec::new();
    for heading in headings {
        if heading.level <= 2 {
            groups.push(HeadingGroup {
                title: Some(heading),
                subheadings: Vec::new(),
            });
            continue;
        }
        match groups.last_mut() {
            Some(group) => group.subheadings.push(heading),
            None => groups.push(HeadingGroup {
                title: None,
                subheadings: vec![heading],
            }),
        }
    }
    groups
}

fn write_page_details(prompt: &mut String, index: usize, page: &SitePage, options: &Options) {
    write_page_header(prompt, index, page);
    let model = &page.page;

    if !model.headings.is_empty() {
        prompt.push_str("Page Structure:\n");
        let mut number = 0;
        for group in group_headings(&model.headings) {
            if let Some(title) = group.title {
                number += 1;
                prompt.push_str(&format!("{}. {}\n", number, title.text));
            }
            // level 3 sits one step below its section
            for sub in group.subheadings {
                let depth = usize::from(sub.level - 2);
                prompt.push_str(&format!("{}- {}\n", "  ".repeat(depth), sub.text));
            }
        }
        prompt.push('\n');
    }

    if !model.main_content.is_empty() {
        prompt.push_str(&format!(
            "Full Content:\n{}\n\n",
            excerpt(&model.main_content, DETAILED_CONTENT_CHARS)
        ));
    }

    if options.include_layout {
        let layout = &model.layout;
        let regions: Vec<&str> = [
            (layout.has_header, "header"),
            (layout.has_navigation, "navigation"),
            (layout.has_sidebar, "sidebar"),
            (layout.has_footer, "footer"),
        ]
        .into_iter()
        .filter_map(|(present, name)| present.then_some(name))
        .collect();
        if regions.is_empty() {
            prompt.push_str("Layout: no standard page regions\n");
        } else {
            prompt.push_str(&format!("Layout: {}\n", regions.join(", ")));
        }
        for section in &layout.sections {
            let title = if section.title.is_empty() {
                "Untitled section"
            } else {
                section.title.as_str()
            };
            prompt.push_str(&format!("- Section \"{}\"", title));
            if section.has_images {
                prompt.push_str(" with images");
            }
            if section.has_form {
                prompt.push_str(" with a form");
            }
            prompt.push('\n');
        }
        prompt.push('\n');
    }

    if options.include_styles && (!model.colors.is_empty() || !model.fonts.is_empty()) {
        if !model.colors.is_empty() {
            prompt.push_str(&format!("Colors: {}\n", model.colors.join(", ")));
        }
        if !model.fonts.is_empty() {
            prompt.push_str(&format!("Fonts: {}\n", model.fonts.join(", ")));
        }
        prompt.push('\n');
    }

    if !model.forms.is_empty() {
        prompt.push_str("Forms:\n");
        for (i, form) in model.forms.iter().enumerate() {
            write_form(prompt, i, form);
        }
        prompt.push('\n');
    }

    if !model.tables.is_empty() {
        prompt.push_str("Tables:\n");
        for (i, table) in model.tables.iter().enumerate() {
            write_table_columns(prompt, i, table);
        }
        prompt.push('\n');
    }

    prompt.push('\n');
}

fn write_form(prompt: &mut String, index: usize, form: &Form) {
    prompt.push_str(&format!("Form {} ({} fields):\n", index + 1, form.fields.len()));
    for field in &form.fields {
        let name = [&field.label, &field.name, &field.placeholder]
            .into_iter()
            .find(|s| !s.is_empty())
            .map(String::as_str)
            .unwrap_or("Unlabeled field");
        prompt.push_str(&format!("- {} ({}", name, field.field_type));
        if !field.name.is_empty() {
            prompt.push_str(&format!(", name: {}", field.name));
        }
        if !field.placeholder.is_empty() {
            prompt.push_str(&format!(", placeholder: \"{}\"", field.placeholder));
        }
        prompt.push_str(")\n");
    }
}

fn write_table_columns(prompt: &mut String, index: usize, table: &Table) {
    prompt.push_str(&format!("Table {}: ", index + 1));
    if table.headers.is_empty() {
        prompt.push_str("no header row");
    } else {
        prompt.push_str(&format!("columns {}", table.headers.join(", ")));
    }
    prompt.push_str(&format!(" ({} rows)\n", table.rows.len()));
}

fn write_structure(prompt: &mut String, site: &SiteModel) {
    let layout = &site.primary().layout;
    prompt.push_str("WEBSITE STRUCTURE:\n\n");

    if layout.has_header {
        prompt.push_str("- Fixed/sticky header with logo and navigation\n");
    }
    if layout.has_navigation {
        prompt.push_str("- Main navigation menu");
        if site.is_multi_page() {
            let names: Vec<&str> = site
                .pages()
                .iter()
                .map(|p| p.nav_link_text.as_deref().unwrap_or(p.page.title.as_str()))
                .filter(|name| !name.is_empty())
                .collect();
            prompt.push_str(&format!(" with pages: {}", names.join(", ")));
        }
        prompt.push('\n');
    }
    if layout.has_sidebar {
        prompt.push_str("- Sidebar navigation or content\n");
    }
    if layout.has_footer {
        prompt.push_str("- Footer with additional links and information\n");
    }

    prompt.push('\n');
}

fn write_images(prompt: &mut String, page: &PageModel) {
    let images = &page.images;
    prompt.push_str("IMAGES & VISUAL ASSETS:\n\n");

    if let Some(hero) = &images.hero_image {
        prompt.push_str("Hero/Banner Image:\n");
        prompt.push_str(&format!(
            "- Large {}x{}px image (aspect ratio: {})\n",
            hero.width, hero.height, hero.aspect_ratio
        ));
        if !hero.alt.is_empty() {
            prompt.push_str(&format!("- Purpose: {}\n", hero.alt));
        }
        prompt.push_str(&format!("- Context: {}\n", hero.context));
        if hero.object_fit != "fill" {
            prompt.push_str(&format!("- Display style: {}\n", hero.object_fit));
        }
        if hero.filter != "none" {
            prompt.push_str(&format!("- Visual effects: {}\n", hero.filter));
        }
        prompt.push('\n');
    }

    prompt.push_str(&format!(
        "Total Images: {} images across the website\n",
        images.total_count
    ));

    if !images.images.is_empty() {
        prompt.push_str("\nImage Details:\n");
        for (i, image) in images.images.iter().take(DETAILED_IMAGES).enumerate() {
            prompt.push_str(&format!("{}. {}", i + 1, image.context));
            if !image.alt.is_empty() {
                prompt.push_str(&format!(" - \"{}\"", image.alt));
            }
            prompt.push_str(&format!(
                " ({}x{}px, ratio: {})",
                image.width, image.height, image.aspect_ratio
            ));
            if !image.border_radius.is_empty() && image.border_radius != "0px" {
                prompt.push_str(" - rounded corners");
            }
            if image.has_shadow {
                prompt.push_str(" - with shadow effect");
            }
            prompt.push('\n');
        }
        prompt.push('\n');
    }

    if let Some(first) = images.background_images.first() {
        prompt.push_str(&format!(
            "Background Images: {} section backgrounds\n",
            images.background_images.len()
        ));
        prompt.push_str(&format!(
            "Background styles: {}, {}\n\n",
            first.size, first.repeat
        ));
    }
}

fn write_animations(prompt: &mut String, page: &PageModel) {
    let animations = &page.animations;
    prompt.push_str("ANIMATIONS & INTERACTIONS:\n\n");
    prompt.push_str(&format!("{}\n\n", animations.summary));

    if !animations.css_animations.is_empty() {
        prompt.push_str("Key Animations:\n");
        for animation in animations.css_animations.iter().take(KEY_ANIMATIONS) {
            prompt.push_str(&format!(
                "- {}: {} animation ({}, {} iterations)\n",
                animation.element, animation.name, animation.duration, animation.iteration_count
            ));
        }
        prompt.push('\n');
    }

    if !animations.scroll_triggered.is_empty() {
        prompt.push_str("Scroll-Triggered Animations:\n");
        prompt.push_str(&format!(
            "- {} elements animate on scroll (fade-in, slide-in effects)\n\n",
            animations.scroll_triggered.len()
        ));
    }

    if !animations.hover_effects.is_empty() {
        prompt.push_str("Interactive Hover Effects:\n");
        for effect in animations.hover_effects.iter().take(HOVER_EFFECTS) {
            prompt.push_str(&format!(
                "- {}: transitions on {}\n",
                effect.element, effect.properties
            ));
        }
        prompt.push('\n');
    }
}

fn write_interactive(prompt: &mut String, interactive: &InteractiveElements) {
    prompt.push_str("INTERACTIVE COMPONENTS:\n\n");
    prompt.push_str(&format!("{}\n", interactive.summary));

    for carousel in &interactive.carousels {
        prompt.push_str(&format!(
            "- Image/content carousel with {} slides",
            carousel.slides
        ));
        if carousel.autoplay {
            prompt.push_str(" (auto-playing)");
        }
        prompt.push('\n');
    }

    let counts = [
        (
            interactive.accordion_count,
            "accordion sections for expandable content",
        ),
        (interactive.tab_group_count, "tabbed content sections"),
        (interactive.modal_count, "modal popups/lightboxes"),
        (interactive.video_count, "embedded video players"),
    ];
    for (count, label) in counts {
        if count > 0 {
            prompt.push_str(&format!("- {} {}\n", count, label));
        }
    }

    prompt.push('\n');
}

fn write_styles(prompt: &mut String, page: &PageModel) {
    if !page.colors.is_empty() {
        let colors: Vec<&str> = page
            .colors
            .iter()
            .take(PRIMARY_COLORS)
            .map(String::as_str)
            .collect();
        prompt.push_str("COLOR SCHEME:\n");
        prompt.push_str(&format!("Primary colors: {}\n", colors.join(", ")));
        prompt.push_str("Use a cohesive color palette that matches this scheme\n\n");
    }

    if !page.fonts.is_empty() {
        let fonts: Vec<&str> = page
            .fonts
            .iter()
            .take(FONT_FAMILIES)
            .map(String::as_str)
            .collect();
        prompt.push_str("TYPOGRAPHY:\n");
        prompt.push_str(&format!("Font families: {}\n", fonts.join(", ")));
        prompt.push_str("Use modern, readable fonts with clear hierarchy\n\n");
    }
}

fn write_enhancements(prompt: &mut String) {
    prompt.push_str("ADDITIONAL REQUIREMENTS:\n\n");

    prompt.push_str("Design & UX:\n");
    prompt.push_str("- Create a modern, professional design that matches the reference website\n");
    prompt.push_str("- Ensure full mobile responsiveness across all pages\n");
    prompt.push_str("- Implement smooth page transitions and micro-interactions\n");
    prompt.push_str("- Use consistent spacing, typography, and visual hierarchy\n");
    prompt.push_str("- Optimize images for web performance (lazy loading, proper sizing)\n\n");

    prompt.push_str("Functionality:\n");
    prompt.push_str("- Implement all interactive elements (carousels, accordions, modals, etc.)\n");
    prompt.push_str("- Add smooth scroll animations and transitions\n");
    prompt.push_str("- Ensure fast loading times with optimized assets\n");
    prompt.push_str("- Make all forms functional with proper validation\n");
    prompt.push_str("- Include SEO-friendly structure and meta tags\n\n");

    prompt.push_str("Animations:\n");
    prompt.push_str("- Replicate the animation style from the reference site\n");
    prompt.push_str("- Use scroll-triggered animations for engaging user experience\n");
    prompt.push_str("- Add subtle hover effects on interactive elements\n");
    prompt.push_str("- Ensure animations are smooth and performant\n\n");
}
