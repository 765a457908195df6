pub mod capture;
pub mod config;
pub mod crawlers;
pub mod error;
pub mod inspector;
pub mod models;
pub mod notify;
pub mod prompt;
pub mod ranker;
pub mod session;
pub mod store;
pub mod utils;
pub mod vision;

// Re-export commonly used types for convenience
pub use config::{AppConfig, Options};
pub use error::AppError;
pub use models::{PageModel, SelectionModel, SiteModel, VisibleModel};
pub use session::{App, Command, Outcome, PromptSource};
