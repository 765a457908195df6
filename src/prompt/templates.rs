//! Fixed prompt templates
//!
//! These prompts do not depend on extracted page structure beyond a few
//! interpolated values.

use crate::inspector::text::{excerpt, truncate_chars};
use crate::models::{PageModel, SelectionModel, SelectionType};
use serde::{Deserialize, Serialize};

/// Characters of selected text in a quick prompt
pub const QUICK_SELECTION_CHARS: usize = 1000;

/// Characters of main content in a quick page prompt
pub const QUICK_PAGE_CHARS: usize = 800;

/// Characters of selected text in a selection prompt
pub const SELECTION_CONTENT_CHARS: usize = 2000;

/// Links listed in a selection prompt
const SELECTION_LINKS: usize = 10;

/// What an image-replication prompt is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicationSource {
    /// A region captured from the screen
    Screenshot,
    /// An image supplied by the user
    Mockup,
}

impl ReplicationSource {
    /// Name used in the headline
    fn noun(self) -> &'static str {
        match self {
            Self::Screenshot => "screenshot",
            Self::Mockup => "mockup/screenshot",
        }
    }

    /// Name used in the requirement lines
    fn body_noun(self) -> &'static str {
        match self {
            Self::Screenshot => "screenshot",
            Self::Mockup => "mockup",
        }
    }

    fn note(self) -> &'static str {
        match self {
            Self::Screenshot => "Note: This website is based on a screenshot captured by the user. ",
            Self::Mockup => {
                "Note: This website is based on a design mockup/screenshot provided by the user. "
            }
        }
    }
}

/// How much of a mockup the vision analysis describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisScope {
    /// A complete website design
    #[default]
    Full,
    /// A single section of a page
    Section,
}

impl AnalysisScope {
    /// Instruction sent to the vision endpoint alongside the image
    pub fn instruction(self) -> &'static str {
        match self {
            Self::Full => concat!(
                "Analyze this website design mockup in detail so a developer can rebuild it. Describe:\n",
                "- Overall layout and page structure, section by section from top to bottom\n",
                "- Header, navigation, hero area and footer\n",
                "- Color palette (with hex values where possible), typography and font sizes\n",
                "- Every UI component: buttons, cards, forms, icons, badges\n",
                "- Images and their placement, aspect ratios and treatments\n",
                "- Spacing, alignment, shadows, borders and rounded corners\n",
                "- Any visible text content\n",
                "Be specific and exhaustive; do not summarize."
            ),
            Self::Section => concat!(
                "Analyze this single section of a website design so a developer can rebuild it. Describe:\n",
                "- The purpose of the section and its layout (columns, grid, alignment)\n",
                "- Every element it contains, in reading order\n",
                "- Colors (with hex values where possible), typography and font sizes\n",
                "- Buttons, icons, images and their styling\n",
                "- Spacing, shadows, borders and rounded corners\n",
                "- Any visible text content\n",
                "Be specific and exhaustive; do not summarize."
            ),
        }
    }

    fn headline(self, source: ReplicationSource) -> String {
        match self {
            Self::Full => format!(
                "Create a website that EXACTLY matches the provided {}.",
                source.noun()
            ),
            Self::Section => format!(
                "Create a website section that EXACTLY matches the provided {}.",
                source.noun()
            ),
        }
    }
}

fn requirements(source: ReplicationSource) -> String {
    let noun = source.body_noun();
    let mut prompt = String::new();

    prompt.push_str("CRITICAL REQUIREMENTS:\n\n");
    prompt.push_str("Visual Design:\n");
    prompt.push_str(&format!(
        "- Replicate the EXACT layout shown in the {} down to pixel-perfect precision\n",
        noun
    ));
    prompt.push_str("- Match all colors, gradients, and color schemes precisely\n");
    prompt.push_str("- Use the same typography, font sizes, and text hierarchy\n");
    prompt.push_str("- Recreate all visual effects: shadows, borders, rounded corners, overlays\n");
    prompt.push_str("- Match spacing, padding, and margins exactly as shown\n");
    prompt.push_str(&format!(
        "- Implement any animations or transitions visible in the {}\n\n",
        noun
    ));

    prompt.push_str("Components & Elements:\n");
    prompt.push_str(&format!(
        "- Include every section, component, and UI element from the {}\n",
        noun
    ));
    prompt.push_str("- Recreate all buttons with exact styling (colors, shapes, hover states)\n");
    prompt.push_str("- Implement all navigation elements (menus, dropdowns, breadcrumbs)\n");
    prompt.push_str("- Add all form fields with proper styling and validation\n");
    prompt.push_str("- Include all cards, panels, and content containers\n");
    prompt.push_str("- Replicate any icons, badges, or decorative elements\n\n");

    prompt.push_str("Images & Media:\n");
    prompt.push_str("- Use placeholder images that match the dimensions shown\n");
    prompt.push_str("- Maintain the same aspect ratios and image treatments\n");
    prompt.push_str("- Include any background images or patterns\n");
    prompt.push_str(&format!(
        "- Add video placeholders if videos are shown in the {}\n\n",
        noun
    ));

    prompt.push_str("Responsiveness:\n");
    prompt.push_str("- Make the design fully responsive and mobile-friendly\n");
    prompt.push_str("- Ensure the layout adapts gracefully to different screen sizes\n");
    prompt.push_str("- Maintain the design integrity on tablets and mobile devices\n\n");

    prompt.push_str("Interactivity:\n");
    prompt.push_str("- Implement any interactive elements visible (sliders, accordions, tabs)\n");
    prompt.push_str("- Add appropriate hover effects on clickable elements\n");
    prompt.push_str("- Ensure smooth transitions and animations\n");
    prompt.push_str("- Make all buttons and links functional\n\n");

    prompt.push_str("Performance:\n");
    prompt.push_str("- Optimize all assets for fast loading\n");
    prompt.push_str("- Use modern web best practices\n");
    prompt.push_str("- Ensure cross-browser compatibility\n");
    prompt.push_str("- Follow accessibility guidelines\n\n");

    prompt.push_str("Content:\n");
    prompt.push_str("- Use readable placeholder text where text is not clearly visible\n");
    prompt.push_str(&format!(
        "- Maintain content hierarchy and organization from the {}\n",
        noun
    ));
    prompt.push_str("- Preserve the tone and messaging style\n\n");

    prompt
}

/// Prompt asking for a pixel-perfect recreation of an image
pub fn replication_prompt(source: ReplicationSource) -> String {
    let mut prompt = AnalysisScope::Full.headline(source);
    prompt.push_str("\n\n");
    prompt.push_str(&requirements(source));
    prompt.push_str(source.note());
    prompt.push_str(
        "The goal is to create a pixel-perfect recreation that matches the visual design exactly.\n",
    );
    prompt.trim().to_string()
}

/// Replication prompt for a captured screen region
pub fn screenshot_prompt() -> String {
    replication_prompt(ReplicationSource::Screenshot)
}

/// Replication prompt for an uploaded mockup
pub fn mockup_prompt() -> String {
    replication_prompt(ReplicationSource::Mockup)
}

/// Mockup prompt with the vision analysis spliced in ahead of the requirements
pub fn mockup_analysis_prompt(analysis: &str, scope: AnalysisScope) -> String {
    let source = ReplicationSource::Mockup;
    let mut prompt = scope.headline(source);
    prompt.push_str("\n\n");
    prompt.push_str("DESIGN ANALYSIS:\n\n");
    prompt.push_str(analysis.trim());
    prompt.push_str("\n\n");
    prompt.push_str(&requirements(source));
    prompt.push_str(source.note());
    prompt.push_str("The analysis above describes the design in detail; ");
    prompt.push_str(
        "the goal is to create a pixel-perfect recreation that matches the visual design exactly.\n",
    );
    prompt.trim().to_string()
}

/// Prompt for an image found on a page
pub fn image_url_prompt(src: &str) -> String {
    let prompt = format!(
        "Create a website featuring the image from: {}\n\n\
         Requirements:\n\
         - Use this image prominently in the design\n\
         - Create a modern, professional layout around it\n\
         - Ensure mobile responsiveness\n\
         - Add appropriate content sections\n",
        src
    );
    prompt.trim().to_string()
}

/// Short prompt from a selection, without the inclusion options
pub fn quick_selection_prompt(selection: &SelectionModel) -> String {
    let mut prompt = String::from("Create a website with the following content:\n\n");
    prompt.push_str(truncate_chars(&selection.text, QUICK_SELECTION_CHARS));
    prompt.push_str("\n\nMake it modern, responsive, and professional.");
    prompt.trim().to_string()
}

/// Short prompt from a whole page, without the inclusion options
pub fn quick_page_prompt(page: &PageModel) -> String {
    let mut prompt = format!("Create a website similar to: {}\n\n", page.url);
    if !page.title.is_empty() {
        prompt.push_str(&format!("Title: {}\n\n", page.title));
    }
    if !page.main_content.is_empty() {
        prompt.push_str(&format!(
            "Main content:\n{}\n\n",
            truncate_chars(&page.main_content, QUICK_PAGE_CHARS)
        ));
    }
    prompt.push_str("Make it modern, responsive, and professional with similar structure and style.");
    prompt.trim().to_string()
}

/// Prompt for a selected part of a page
pub fn selection_prompt(selection: &SelectionModel, source_url: &str) -> String {
    let mut prompt = format!(
        "Create a website section based on the following content selected from: {}\n\n",
        source_url
    );

    let kind = match selection.selection_type {
        SelectionType::Text => "text",
        SelectionType::Table => "tabular data",
        SelectionType::Mixed => "text and images",
    };
    prompt.push_str(&format!("Selection type: {}\n\n", kind));

    if !selection.text.is_empty() {
        prompt.push_str("SELECTED CONTENT:\n");
        prompt.push_str(&excerpt(&selection.text, SELECTION_CONTENT_CHARS));
        prompt.push_str("\n\n");
    }

    if !selection.tables.is_empty() {
        prompt.push_str("DATA TABLES:\n");
        for (i, table) in selection.tables.iter().enumerate() {
            prompt.push_str(&format!("Table {}: ", i + 1));
            if table.headers.is_empty() {
                prompt.push_str("no header row");
            } else {
                prompt.push_str(&format!("columns {}", table.headers.join(", ")));
            }
            prompt.push_str(&format!(" ({} rows)\n", table.rows.len()));
        }
        prompt.push('\n');
    }

    if !selection.images.is_empty() {
        prompt.push_str("IMAGES:\n");
        for (i, image) in selection.images.iter().enumerate() {
            prompt.push_str(&format!("{}. ", i + 1));
            if !image.alt.is_empty() {
                prompt.push_str(&format!("\"{}\" ", image.alt));
            }
            prompt.push_str(&format!("({}x{}px) {}\n", image.width, image.height, image.src));
        }
        prompt.push('\n');
    }

    if !selection.links.is_empty() {
        prompt.push_str("LINKS:\n");
        for link in selection.links.iter().take(SELECTION_LINKS) {
            prompt.push_str(&format!("- {}: {}\n", link.text, link.href));
        }
        prompt.push('\n');
    }

    prompt.push_str("REQUIREMENTS:\n\n");
    prompt.push_str("Visual Design:\n");
    prompt.push_str("- Present the selected content in a modern, professional design\n");
    prompt.push_str("- Use a clear typographic hierarchy and consistent spacing\n\n");
    prompt.push_str("Components & Elements:\n");
    prompt.push_str("- Keep every piece of the selected content, in its original order\n");
    prompt.push_str("- Render tables as styled, readable data tables\n\n");
    prompt.push_str("Images & Media:\n");
    prompt.push_str("- Include the listed images with their proportions preserved\n\n");
    prompt.push_str("Responsiveness:\n");
    prompt.push_str("- Make the section fully responsive and mobile-friendly\n\n");
    prompt.push_str("Interactivity:\n");
    prompt.push_str("- Make all links and buttons functional with hover states\n\n");
    prompt.push_str("Performance:\n");
    prompt.push_str("- Optimize assets for fast loading and follow accessibility guidelines\n\n");
    prompt.push_str("Content:\n");
    prompt.push_str("- Preserve the wording, tone and messaging of the selection\n");

    prompt.trim().to_string()
}
