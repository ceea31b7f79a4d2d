mod apply;
mod config;
mod exif_reader;
mod hash;
mod metadata;
mod planner;

pub use apply::{
    apply_plan, sort_photos, FileOutcome, PlacementError, PlacementOutcome, SortReport, SortSummary,
};
pub use config::{load_config, AppConfig};
pub use metadata::{resolve_photo_date, DateSource, PhotoDate};
pub use planner::{generate_plan, PlanOptions, PlannedAction, SortCandidate, SortPlan, SortStats};
