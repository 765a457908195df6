use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// JSON file backing the key-value store (options and the capture slot)
    #[serde(default = "default_store_path")]
    pub store_path: String,

    /// Address the finished prompt is delivered to
    #[serde(default = "default_delivery_base_url")]
    pub delivery_base_url: String,

    #[serde(default)]
    pub crawl: CrawlConfig,

    #[serde(default)]
    pub capture: CaptureConfig,

    #[serde(default)]
    pub vision: VisionConfig,
}

/// Limits of a multi-page crawl
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Linked pages visited after the primary page
    #[serde(default = "default_max_extra_pages")]
    pub max_extra_pages: usize,

    /// How long to wait for a background page to finish loading
    #[serde(default = "default_load_timeout_ms")]
    pub load_timeout_ms: u64,

    /// Deadline for one inspector round-trip
    #[serde(default = "default_message_timeout_ms")]
    pub message_timeout_ms: u64,

    /// Deadline for the whole crawl
    #[serde(default = "default_total_timeout_ms")]
    pub total_timeout_ms: u64,
}

/// Screen-region capture settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Smallest accepted selection width and height, in CSS pixels
    #[serde(default = "default_min_selection_px")]
    pub min_selection_px: u32,

    #[serde(default = "default_capture_timeout_ms")]
    pub timeout_ms: u64,

    /// Age after which a stored capture is discarded
    #[serde(default = "default_capture_ttl_ms")]
    pub ttl_ms: u64,
}

/// Vision-analysis endpoint used for uploaded mockups
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionConfig {
    /// Chat-completions URL
    #[serde(default = "default_vision_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_vision_model")]
    pub model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_vision_timeout_ms")]
    pub timeout_ms: u64,
}

impl AppConfig {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: Self = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Overrides settings from `WEBDRIVER_URL` and `VISION_API_KEY`
    pub fn apply_env(mut self) -> Self {
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                self.webdriver_url = webdriver_url;
            }
        }
        if let Ok(api_key) = std::env::var("VISION_API_KEY") {
            if !api_key.is_empty() {
                self.vision.api_key = Some(api_key);
            }
        }
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            store_path: default_store_path(),
            delivery_base_url: default_delivery_base_url(),
            crawl: CrawlConfig::default(),
            capture: CaptureConfig::default(),
            vision: VisionConfig::default(),
        }
    }
}

impl CrawlConfig {
    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    pub fn message_timeout(&self) -> Duration {
        Duration::from_millis(self.message_timeout_ms)
    }

    pub fn total_timeout(&self) -> Duration {
        Duration::from_millis(self.total_timeout_ms)
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_extra_pages: default_max_extra_pages(),
            load_timeout_ms: default_load_timeout_ms(),
            message_timeout_ms: default_message_timeout_ms(),
            total_timeout_ms: default_total_timeout_ms(),
        }
    }
}

impl CaptureConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            min_selection_px: default_min_selection_px(),
            timeout_ms: default_capture_timeout_ms(),
            ttl_ms: default_capture_ttl_ms(),
        }
    }
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_vision_endpoint(),
            model: default_vision_model(),
            api_key: None,
            timeout_ms: default_vision_timeout_ms(),
        }
    }
}

/// Prompt inclusion options, persisted between runs
///
/// Options only switch whole prompt blocks on or off; they never change what
/// the inspectors extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Options {
    #[serde(default = "default_true")]
    pub include_styles: bool,

    #[serde(default = "default_true")]
    pub include_images: bool,

    #[serde(default = "default_true")]
    pub include_layout: bool,

    #[serde(default)]
    pub show_full_content: bool,

    /// Append the enhancement requirements block
    #[serde(default = "default_true", rename = "enhancePrompt")]
    pub enhance: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            include_styles: true,
            include_images: true,
            include_layout: true,
            show_full_content: false,
            enhance: true,
        }
    }
}

impl Options {
    /// Storage keys, in display order
    pub const KEYS: [&'static str; 5] = [
        "includeStyles",
        "includeImages",
        "includeLayout",
        "showFullContent",
        "enhancePrompt",
    ];

    pub fn get(&self, key: &str) -> Option<bool> {
        match key {
            "includeStyles" => Some(self.include_styles),
            "includeImages" => Some(self.include_images),
            "includeLayout" => Some(self.include_layout),
            "showFullContent" => Some(self.show_full_content),
            "enhancePrompt" => Some(self.enhance),
            _ => None,
        }
    }

    /// Sets one option by its storage key; returns false for unknown keys
    pub fn set(&mut self, key: &str, value: bool) -> bool {
        let slot = match key {
            "includeStyles" => &mut self.include_styles,
            "includeImages" => &mut self.include_images,
            "includeLayout" => &mut self.include_layout,
            "showFullContent" => &mut self.show_full_content,
            "enhancePrompt" => &mut self.enhance,
            _ => return false,
        };
        *slot = value;
        true
    }
}

fn default_true() -> bool {
    true
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_store_path() -> String {
    "site-prompt-store.json".to_string()
}

fn default_delivery_base_url() -> String {
    "https://b12.io/signup/".to_string()
}

fn default_max_extra_pages() -> usize {
    4
}

fn default_load_timeout_ms() -> u64 {
    5_000
}

fn default_message_timeout_ms() -> u64 {
    15_000
}

fn default_total_timeout_ms() -> u64 {
    60_000
}

/// 10 px; a 50 px minimum was also used at one point
fn default_min_selection_px() -> u32 {
    10
}

fn default_capture_timeout_ms() -> u64 {
    10_000
}

/// Five minutes
fn default_capture_ttl_ms() -> u64 {
    300_000
}

fn default_vision_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_vision_model() -> String {
    "gpt-4o".to_string()
}

fn default_vision_timeout_ms() -> u64 {
    30_000
}
