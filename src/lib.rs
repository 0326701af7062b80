//! Constraint-based time-slot scheduling.
//!
//! Candidate slots are generated across a search window, checked against
//! hard constraints, penalized by soft constraints and ranked by a weighted
//! blend of constraint satisfaction, chronotype energy, timing urgency and
//! daily balance.

pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use error::{AppError, AppResult, ConstraintFault};
pub use models::context::{CalendarEvent, Chronotype, SchedulingContext};
pub use models::request::{DayPartFilter, Priority, SearchWindow, SlotRequest};
pub use models::settings::EngineSettings;
pub use models::slot::{ScoreBreakdown, ScoredSlot, TimeSlot};
pub use models::weights::{ScoreWeights, ScoreWeightsUpdate};
pub use services::slot_finder::SlotFinder;
pub use services::slot_scorer::SlotScorer;
