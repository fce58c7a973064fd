//! Domain models for the Blimari server

mod content;
mod path;
mod session;
mod trail;
mod user;

pub use content::{ContentItem, ContentSource, ContentType};
pub use path::{progress_percentage, LearningPath, PathStatus};
pub use session::{SessionState, StepProgress, StepStatus, TrailSession};
pub use trail::{OrganizedTrail, TrailItem, TrailSection};
pub use user::{CulturalProfile, User};
