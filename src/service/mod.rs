//! Service layer: business logic orchestration.
//!
//! [`MurderService`] coordinates the murder repository with the player,
//! location and game lookups, validates self-reported kills and computes
//! the statistics aggregates. Achievement recomputation goes out through
//! the injected [`crate::domain::AchievementNotifier`].

pub mod kill_submission;
pub mod murder_service;
pub mod stats;

pub use kill_submission::{
    InvalidKillWindow, KillForm, KillOutcome, KillRejection, KillSubmission, KillWindow,
};
pub use murder_service::{AdminMurderSubmission, MurderService};
pub use stats::{MostWanted, SimpleStats, StatsPage, most_wanted};
