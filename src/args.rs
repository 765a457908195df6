use clap::{Parser, Subcommand, ValueEnum};
use site_prompt::models::CaptureRect;
use site_prompt::prompt::AnalysisScope;
use site_prompt::utils::{parse_assignment, parse_rect};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "site-prompt")]
#[command(about = "Turns web pages, selections and screenshots into website-builder prompts")]
#[command(version)]
pub struct Args {
    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// WebDriver server URL (overrides config and WEBDRIVER_URL)
    #[arg(long)]
    pub webdriver: Option<String>,

    #[command(subcommand)]
    pub command: CommandArg,
}

#[derive(Subcommand, Debug)]
pub enum CommandArg {
    /// Inspect one page and print its prompt
    Page {
        /// Page to open first; the current browser page otherwise
        url: Option<String>,

        /// Inspect a local HTML file instead of a browser page
        #[arg(long, requires = "base_url")]
        file: Option<PathBuf>,

        /// Address the local file is treated as coming from
        #[arg(long = "url", id = "base_url")]
        base_url: Option<String>,

        /// Print the extracted model as JSON instead of the prompt
        #[arg(long)]
        json: bool,

        /// Short prompt without the inclusion options
        #[arg(long, conflicts_with = "json")]
        quick: bool,
    },

    /// Crawl the page and its main navigation links, then print the prompt
    Crawl {
        url: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Print a prompt for the selected part of the page
    Selection {
        url: Option<String>,

        /// Element to use when nothing is selected
        #[arg(long)]
        selector: Option<String>,

        #[arg(long)]
        quick: bool,
    },

    /// Print the content of the current viewport as JSON
    Visible { url: Option<String> },

    /// Capture a region of the page into the capture slot
    Capture {
        url: Option<String>,

        /// Region in CSS pixels as X,Y,W,H
        #[arg(long, value_parser = parse_rect)]
        rect: CaptureRect,
    },

    /// Turn a pending capture into a screenshot prompt
    Pickup,

    /// Print a prompt that recreates a mockup image
    Image {
        path: PathBuf,

        /// Describe the image with the vision endpoint first
        #[arg(long, value_enum)]
        analyze: Option<ScopeArg>,
    },

    /// Print a prompt built around an image address
    ImageUrl { src: String },

    /// Show or change the prompt options
    Options {
        /// key=true|false, e.g. includeImages=false
        #[arg(long = "set", value_parser = parse_assignment)]
        set: Vec<(String, bool)>,
    },

    /// Print the page-builder address for a prompt
    Deliver {
        /// Read the prompt from this file instead of standard input
        #[arg(long)]
        prompt_file: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ScopeArg {
    Full,
    Section,
}

/// Convert from CLI argument scope to the analysis scope
pub fn convert_scope(arg: ScopeArg) -> AnalysisScope {
    match arg {
        ScopeArg::Full => AnalysisScope::Full,
        ScopeArg::Section => AnalysisScope::Section,
    }
}

impl CommandArg {
    /// Whether the command talks to a browser
    pub fn needs_browser(&self) -> bool {
        match self {
            CommandArg::Page { file, .. } => file.is_none(),
            CommandArg::Crawl { .. }
            | CommandArg::Selection { .. }
            | CommandArg::Visible { .. }
            | CommandArg::Capture { .. } => true,
            CommandArg::Pickup
            | CommandArg::Image { .. }
            | CommandArg::ImageUrl { .. }
            | CommandArg::Options { .. }
            | CommandArg::Deliver { .. } => false,
        }
    }

    /// Page to load before running the command
    pub fn url(&self) -> Option<&str> {
        match self {
            CommandArg::Page { url, .. }
            | CommandArg::Crawl { url, .. }
            | CommandArg::Selection { url, .. }
            | CommandArg::Visible { url }
            | CommandArg::Capture { url, .. } => url.as_deref(),
            _ => None,
        }
    }
}
