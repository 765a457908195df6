pub mod controller;
pub mod orchestrator;
pub mod snapshot;
pub mod web;

pub use controller::{PageController, Screenshot};
pub use orchestrator::CrawlOrchestrator;
pub use snapshot::SnapshotController;
pub use web::WebDriverController;
