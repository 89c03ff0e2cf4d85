//! Domain layer: the murder record, collaborator contracts and events.
//!
//! Nothing in here knows about HTTP or SQL. Storage backends live in
//! [`crate::persistence`], orchestration in [`crate::service`].

pub mod collaborators;
pub mod event_bus;
pub mod ids;
pub mod murder;
pub mod progress_event;

pub use collaborators::{
    AchievementNotifier, GameDirectory, GameRound, Location, LocationDirectory, NewLocation,
    Player, PlayerDirectory,
};
pub use event_bus::EventBus;
pub use ids::{GameId, LocationId, MurderId, PlayerId};
pub use murder::{Murder, MurderFilter, MurderListing, NewMurder, parse_kill_datetime};
pub use progress_event::ProgressEvent;
