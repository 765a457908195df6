//! Prompt synthesis
//!
//! Every prompt is a pure function of its model and the [`Options`]; the same
//! input always renders byte-identical text.
//!
//! [`Options`]: crate::config::Options

pub mod delivery;
pub mod site;
pub mod templates;

pub use delivery::delivery_url;
pub use site::site_prompt;
pub use templates::{
    AnalysisScope, image_url_prompt, mockup_analysis_prompt, mockup_prompt, quick_page_prompt,
    quick_selection_prompt, screenshot_prompt, selection_prompt,
};
