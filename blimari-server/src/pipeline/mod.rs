//! Trail-generation pipeline

mod orchestrator;

pub use orchestrator::TrailOrchestrator;
