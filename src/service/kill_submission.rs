//! Self-reported kill logging.
//!
//! A murderer logs a kill by entering the victim's kill code. The
//! submission runs through an ordered rule chain; the first failing rule
//! decides the outcome and nothing is stored. A rejection is not an error:
//! it comes back as [`KillOutcome::Rejected`] together with everything needed
//! to show the form again.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use utoipa::ToSchema;

use super::MurderService;
use crate::domain::{
    GameId, Location, LocationId, Murder, NewLocation, NewMurder, Player, PlayerId,
    parse_kill_datetime,
};
use crate::error::TrackerError;

/// Inclusive range of dates on which kills may be logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KillWindow {
    start: NaiveDate,
    end: NaiveDate,
}

/// The configured kill window ends before it starts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("kill window ends ({end}) before it starts ({start})")]
pub struct InvalidKillWindow {
    /// Configured first day.
    pub start: NaiveDate,
    /// Configured last day.
    pub end: NaiveDate,
}

impl KillWindow {
    /// Creates a window covering `start..=end`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidKillWindow`] if `end` is before `start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, InvalidKillWindow> {
        if end < start {
            return Err(InvalidKillWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// First day of the window.
    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day of the window.
    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Returns `true` if the kill happened on a day inside the window.
    #[must_use]
    pub fn contains(&self, datetime: &NaiveDateTime) -> bool {
        let day = datetime.date();
        self.start <= day && day <= self.end
    }
}

impl Default for KillWindow {
    /// January 2017, the round the game was first played in.
    fn default() -> Self {
        let start = NaiveDate::from_ymd_opt(2017, 1, 1).unwrap_or_default();
        let end = NaiveDate::from_ymd_opt(2017, 1, 31).unwrap_or_default();
        Self { start, end }
    }
}

/// A kill as entered by the murderer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KillSubmission {
    /// Player logging the kill.
    pub murderer: Option<PlayerId>,
    /// Kill code of the victim.
    pub kill_code: String,
    /// Time of the kill as typed.
    pub datetime: String,
    /// Known location picked from the list.
    pub location: Option<LocationId>,
    /// Free-text location, used when no known location was picked.
    pub new_location: Option<NewLocation>,
}

/// Why a kill submission was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum KillRejection {
    /// No player has the entered kill code.
    #[error("Invalid kill code!")]
    InvalidKillCode,
    /// The victim is disabled or was already killed.
    #[error("You can't kill an already dead person!")]
    AlreadyDead,
    /// The kill code belongs to the murderer.
    #[error("You can't kill yourself!")]
    SelfKill,
    /// The time is malformed or outside the kill window.
    #[error("Invalid date!")]
    InvalidDate,
    /// Neither a known nor a free-text location was given.
    #[error("You need to specify kill location!")]
    MissingLocation,
    /// The murderer is missing.
    #[error("Invalid killer!")]
    InvalidMurderer,
    /// The same murderer already logged this victim.
    #[error("This kill was already logged!")]
    AlreadyLogged,
    /// The murderer or the picked location does not exist.
    #[error("Unknown killer or location!")]
    UnknownReference,
}

impl KillRejection {
    /// Returns `true` if the kill code should be blanked on the retry form.
    /// A code that matched nobody, or a victim who cannot be killed again, is
    /// not worth keeping; every other mistake keeps the code for re-entry.
    #[must_use]
    pub const fn clears_kill_code(self) -> bool {
        matches!(
            self,
            Self::InvalidKillCode | Self::AlreadyDead | Self::AlreadyLogged
        )
    }
}

/// Everything needed to render the kill form.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct KillForm {
    /// Game the form belongs to.
    pub game: GameId,
    /// Message of the rejection that produced this form, if any.
    pub error_message: Option<String>,
    /// Kill code to pre-fill.
    pub kill_code: Option<String>,
    /// Living players of the game.
    pub players: Vec<Player>,
    /// Known locations.
    pub locations: Vec<Location>,
}

/// Result of [`MurderService::log_kill`].
#[derive(Debug, Clone, PartialEq)]
pub enum KillOutcome {
    /// The kill was stored.
    Logged(Murder),
    /// The kill was turned down.
    Rejected {
        /// Rule that failed.
        rejection: KillRejection,
        /// Form to show again.
        form: KillForm,
    },
}

impl MurderService {
    /// Validates and stores a self-reported kill.
    ///
    /// Rules, first failure wins: the kill code must match a player, who
    /// must be alive and not the murderer; the time must fall inside the
    /// kill window; a location must be given; the murderer must be known.
    /// A free-text location is stored together with the murder, and only
    /// if the murder is. On success both players' achievement progress is
    /// recomputed.
    ///
    /// # Errors
    ///
    /// Returns a [`TrackerError`] only for storage failures. A duplicate
    /// `(murderer, victim)` pair is reported as
    /// [`KillRejection::AlreadyLogged`] and a dangling murderer or location
    /// as [`KillRejection::UnknownReference`], not as errors.
    pub async fn log_kill(
        &self,
        game: GameId,
        submission: KillSubmission,
    ) -> Result<KillOutcome, TrackerError> {
        let (new_murder, new_location) = match self.check_kill(game, &submission).await? {
            Ok(checked) => checked,
            Err(rejection) => return self.reject(game, rejection, &submission).await,
        };

        let stored = match new_location {
            Some(location) => self
                .store
                .add_at_new_location(new_murder, location)
                .await
                .map(|(murder, created)| {
                    tracing::debug!(location = %created.id, name = %created.name, "location created");
                    murder
                }),
            None => self.store.add(new_murder).await,
        };
        let murder = match stored {
            Ok(murder) => murder,
            Err(TrackerError::DuplicateKill) => {
                return self
                    .reject(game, KillRejection::AlreadyLogged, &submission)
                    .await;
            }
            Err(TrackerError::ConstraintViolation(reason)) => {
                tracing::warn!(%game, %reason, "kill references a missing row");
                return self
                    .reject(game, KillRejection::UnknownReference, &submission)
                    .await;
            }
            Err(e) => return Err(e),
        };

        self.notifier.selected_progress(game, murder.murderer);
        self.notifier.selected_progress(game, murder.victim);

        tracing::info!(
            %game,
            murder = %murder.id,
            murderer = %murder.murderer,
            victim = %murder.victim,
            "kill logged"
        );
        Ok(KillOutcome::Logged(murder))
    }

    /// Builds the kill form for `game`, optionally pre-filled with a kill
    /// code.
    ///
    /// # Errors
    ///
    /// Returns a [`TrackerError`] if players or locations cannot be listed.
    pub async fn kill_form(
        &self,
        game: GameId,
        kill_code: Option<String>,
    ) -> Result<KillForm, TrackerError> {
        let players = self.players.list(Some(game), Some(false)).await?;
        let locations = self.locations.list().await?;
        Ok(KillForm {
            game,
            error_message: None,
            kill_code,
            players,
            locations,
        })
    }

    /// Runs the rule chain. The outer `Result` carries storage failures, the
    /// inner one the first failed rule.
    ///
    /// The victim is looked up by kill code across all games and is not
    /// required to belong to `game`; the record is filed under `game`.
    async fn check_kill(
        &self,
        game: GameId,
        submission: &KillSubmission,
    ) -> Result<Result<(NewMurder, Option<NewLocation>), KillRejection>, TrackerError> {
        let Some(victim) = self.players.find_by_code(&submission.kill_code).await? else {
            return Ok(Err(KillRejection::InvalidKillCode));
        };
        if self.players.is_dead(victim.id).await? {
            return Ok(Err(KillRejection::AlreadyDead));
        }
        if submission.murderer == Some(victim.id) {
            return Ok(Err(KillRejection::SelfKill));
        }
        let Some(datetime) = parse_kill_datetime(&submission.datetime)
            .filter(|dt| self.kill_window.contains(dt))
        else {
            return Ok(Err(KillRejection::InvalidDate));
        };
        let new_location = if submission.location.is_none() {
            let Some(named) = submission.new_location.clone().and_then(NewLocation::named) else {
                return Ok(Err(KillRejection::MissingLocation));
            };
            Some(named)
        } else {
            None
        };
        let Some(murderer) = submission.murderer else {
            return Ok(Err(KillRejection::InvalidMurderer));
        };

        Ok(Ok((
            NewMurder {
                game,
                murderer,
                victim: victim.id,
                datetime,
                location: submission.location,
            },
            new_location,
        )))
    }

    async fn reject(
        &self,
        game: GameId,
        rejection: KillRejection,
        submission: &KillSubmission,
    ) -> Result<KillOutcome, TrackerError> {
        tracing::info!(%game, reason = %rejection, "kill rejected");
        let kill_code = if rejection.clears_kill_code() {
            None
        } else {
            Some(submission.kill_code.clone())
        };
        let mut form = self.kill_form(game, kill_code).await?;
        form.error_message = Some(rejection.to_string());
        Ok(KillOutcome::Rejected { rejection, form })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::{
        EventBus, GameDirectory, GameRound, LocationDirectory, MurderFilter, PlayerDirectory,
        ProgressEvent,
    };
    use crate::persistence::{InMemoryStore, MurderStore};

    struct Fixture {
        store: Arc<InMemoryStore>,
        bus: EventBus,
        service: MurderService,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        store
            .insert_game(GameRound {
                id: GameId::new(1),
                year: 2017,
                number: 1,
            })
            .await;
        for (id, name, code) in [(1, "Alice", "AAA"), (2, "Bob", "ABC"), (3, "Carol", "CCC")] {
            let player = Player {
                id: PlayerId::new(id),
                game: GameId::new(1),
                name: name.to_string(),
                code: code.to_string(),
                disabled: false,
            };
            assert!(store.insert_player(player).await.is_ok());
        }
        let location = LocationDirectory::add(
            store.as_ref(),
            NewLocation {
                name: "Quad".to_string(),
                lat: None,
                lng: None,
            },
        )
        .await;
        assert!(location.is_ok());

        let bus = EventBus::new(64);
        let service = MurderService::from_backend(
            Arc::clone(&store),
            Arc::new(bus.clone()),
            KillWindow::default(),
        );
        Fixture {
            store,
            bus,
            service,
        }
    }

    fn submission(murderer: i64, code: &str) -> KillSubmission {
        KillSubmission {
            murderer: Some(PlayerId::new(murderer)),
            kill_code: code.to_string(),
            datetime: "2017-01-05".to_string(),
            location: Some(LocationId::new(1)),
            new_location: None,
        }
    }

    async fn stored(fx: &Fixture) -> usize {
        let Ok(rows) = MurderStore::list(fx.store.as_ref(), &MurderFilter::default()).await else {
            panic!("list failed");
        };
        rows.len()
    }

    fn rejection_of(outcome: Result<KillOutcome, TrackerError>) -> (KillRejection, KillForm) {
        match outcome {
            Ok(KillOutcome::Rejected { rejection, form }) => (rejection, form),
            other => panic!("expected a rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn valid_kill_is_logged_and_notifies_both_players() {
        let fx = fixture().await;
        let mut rx = fx.bus.subscribe();

        let outcome = fx.service.log_kill(GameId::new(1), submission(1, "ABC")).await;
        let Ok(KillOutcome::Logged(murder)) = outcome else {
            panic!("expected a logged kill");
        };
        assert_eq!(murder.murderer, PlayerId::new(1));
        assert_eq!(murder.victim, PlayerId::new(2));
        assert_eq!(murder.location, Some(LocationId::new(1)));
        assert_eq!(murder.datetime.to_string(), "2017-01-05 00:00:00");

        let mut notified = Vec::new();
        for _ in 0..2 {
            let Ok(ProgressEvent::SelectedProgress { player, .. }) = rx.recv().await else {
                panic!("expected selected progress");
            };
            notified.push(player);
        }
        assert_eq!(notified, vec![PlayerId::new(1), PlayerId::new(2)]);
    }

    #[tokio::test]
    async fn unknown_kill_code_is_rejected_and_cleared() {
        let fx = fixture().await;
        let (rejection, form) =
            rejection_of(fx.service.log_kill(GameId::new(1), submission(1, "NOPE")).await);
        assert_eq!(rejection, KillRejection::InvalidKillCode);
        assert_eq!(form.kill_code, None);
        assert_eq!(form.error_message.as_deref(), Some("Invalid kill code!"));
        assert_eq!(form.players.len(), 3);
        assert_eq!(form.locations.len(), 1);
        assert_eq!(stored(&fx).await, 0);
    }

    #[tokio::test]
    async fn dead_victim_is_rejected_and_cleared() {
        let fx = fixture().await;
        assert!(matches!(
            fx.service.log_kill(GameId::new(1), submission(1, "ABC")).await,
            Ok(KillOutcome::Logged(_))
        ));

        let (rejection, form) =
            rejection_of(fx.service.log_kill(GameId::new(1), submission(3, "ABC")).await);
        assert_eq!(rejection, KillRejection::AlreadyDead);
        assert_eq!(form.kill_code, None);
        assert_eq!(stored(&fx).await, 1);
        // Bob is dead, so he is no longer offered on the form.
        assert!(form.players.iter().all(|p| p.id != PlayerId::new(2)));
    }

    #[tokio::test]
    async fn self_kill_keeps_the_kill_code() {
        let fx = fixture().await;
        let (rejection, form) =
            rejection_of(fx.service.log_kill(GameId::new(1), submission(2, "ABC")).await);
        assert_eq!(rejection, KillRejection::SelfKill);
        assert_eq!(form.kill_code.as_deref(), Some("ABC"));
        assert_eq!(stored(&fx).await, 0);
    }

    #[tokio::test]
    async fn dates_outside_the_window_are_rejected() {
        let fx = fixture().await;
        for datetime in ["2017-02-01", "2016-12-31T23:59", "soon"] {
            let mut kill = submission(1, "ABC");
            kill.datetime = datetime.to_string();
            let (rejection, form) = rejection_of(fx.service.log_kill(GameId::new(1), kill).await);
            assert_eq!(rejection, KillRejection::InvalidDate);
            assert_eq!(form.kill_code.as_deref(), Some("ABC"));
        }
        assert_eq!(stored(&fx).await, 0);
    }

    #[tokio::test]
    async fn missing_location_is_rejected() {
        let fx = fixture().await;
        let mut kill = submission(1, "ABC");
        kill.location = None;
        kill.new_location = Some(NewLocation {
            name: "  ".to_string(),
            lat: None,
            lng: None,
        });
        let (rejection, form) = rejection_of(fx.service.log_kill(GameId::new(1), kill).await);
        assert_eq!(rejection, KillRejection::MissingLocation);
        assert_eq!(form.kill_code.as_deref(), Some("ABC"));
    }

    #[tokio::test]
    async fn missing_murderer_is_rejected_last() {
        let fx = fixture().await;
        let mut kill = submission(1, "ABC");
        kill.murderer = None;
        let (rejection, _) = rejection_of(fx.service.log_kill(GameId::new(1), kill).await);
        assert_eq!(rejection, KillRejection::InvalidMurderer);

        // An earlier rule still wins over the missing murderer.
        let mut both = submission(1, "ABC");
        both.murderer = None;
        both.datetime = "2018-01-01".to_string();
        let (rejection, _) = rejection_of(fx.service.log_kill(GameId::new(1), both).await);
        assert_eq!(rejection, KillRejection::InvalidDate);
    }

    #[tokio::test]
    async fn free_text_location_is_created_after_validation() {
        let fx = fixture().await;
        let mut kill = submission(1, "ABC");
        kill.location = None;
        kill.new_location = Some(NewLocation {
            name: "Boathouse".to_string(),
            lat: Some(51.75),
            lng: Some(-1.25),
        });

        // A rejected submission must not leave a location behind.
        let mut rejected = kill.clone();
        rejected.murderer = None;
        let _ = rejection_of(fx.service.log_kill(GameId::new(1), rejected).await);
        let Ok(locations) = LocationDirectory::list(fx.store.as_ref()).await else {
            panic!("list failed");
        };
        assert_eq!(locations.len(), 1);

        let Ok(KillOutcome::Logged(murder)) = fx.service.log_kill(GameId::new(1), kill).await
        else {
            panic!("expected a logged kill");
        };
        assert_eq!(murder.location, Some(LocationId::new(2)));
    }

    /// Player directory that never reports anyone dead, so the store's
    /// uniqueness constraint is the only guard left.
    #[derive(Debug)]
    struct Undead(Arc<InMemoryStore>);

    #[async_trait::async_trait]
    impl PlayerDirectory for Undead {
        async fn find(&self, id: PlayerId) -> Result<Option<Player>, TrackerError> {
            PlayerDirectory::find(self.0.as_ref(), id).await
        }

        async fn find_by_code(&self, code: &str) -> Result<Option<Player>, TrackerError> {
            PlayerDirectory::find_by_code(self.0.as_ref(), code).await
        }

        async fn is_dead(&self, _id: PlayerId) -> Result<bool, TrackerError> {
            Ok(false)
        }

        async fn list(
            &self,
            game: Option<GameId>,
            death: Option<bool>,
        ) -> Result<Vec<Player>, TrackerError> {
            PlayerDirectory::list(self.0.as_ref(), game, death).await
        }

        async fn count(&self, game: GameId) -> Result<i64, TrackerError> {
            PlayerDirectory::count(self.0.as_ref(), game).await
        }
    }

    #[tokio::test]
    async fn duplicate_pair_becomes_already_logged() {
        let fx = fixture().await;
        let service = undead_service(&fx);

        assert!(matches!(
            service.log_kill(GameId::new(1), submission(1, "ABC")).await,
            Ok(KillOutcome::Logged(_))
        ));
        let (rejection, form) =
            rejection_of(service.log_kill(GameId::new(1), submission(1, "ABC")).await);
        assert_eq!(rejection, KillRejection::AlreadyLogged);
        assert_eq!(form.kill_code, None);
        assert_eq!(
            form.error_message.as_deref(),
            Some("This kill was already logged!")
        );
        assert_eq!(stored(&fx).await, 1);
    }

    fn undead_service(fx: &Fixture) -> MurderService {
        MurderService::new(
            Arc::clone(&fx.store) as Arc<dyn MurderStore>,
            Arc::new(Undead(Arc::clone(&fx.store))),
            Arc::clone(&fx.store) as Arc<dyn LocationDirectory>,
            Arc::clone(&fx.store) as Arc<dyn GameDirectory>,
            Arc::new(fx.bus.clone()),
            KillWindow::default(),
        )
    }

    #[tokio::test]
    async fn already_logged_kill_keeps_no_new_location() {
        let fx = fixture().await;
        let service = undead_service(&fx);
        assert!(matches!(
            service.log_kill(GameId::new(1), submission(1, "ABC")).await,
            Ok(KillOutcome::Logged(_))
        ));

        let mut again = submission(1, "ABC");
        again.location = None;
        again.new_location = Some(NewLocation {
            name: "Boathouse".to_string(),
            lat: None,
            lng: None,
        });
        let (rejection, form) = rejection_of(service.log_kill(GameId::new(1), again).await);
        assert_eq!(rejection, KillRejection::AlreadyLogged);
        assert_eq!(stored(&fx).await, 1);
        assert_eq!(form.locations.len(), 1);
        assert!(form.locations.iter().all(|l| l.name != "Boathouse"));
        let Ok(locations) = LocationDirectory::list(fx.store.as_ref()).await else {
            panic!("list failed");
        };
        assert_eq!(locations.len(), 1);
    }

    #[tokio::test]
    async fn unknown_location_is_not_reported_as_already_logged() {
        let fx = fixture().await;
        let mut kill = submission(1, "ABC");
        kill.location = Some(LocationId::new(99));
        let (rejection, form) = rejection_of(fx.service.log_kill(GameId::new(1), kill).await);
        assert_eq!(rejection, KillRejection::UnknownReference);
        assert_eq!(
            form.error_message.as_deref(),
            Some("Unknown killer or location!")
        );
        assert_eq!(form.kill_code.as_deref(), Some("ABC"));
        assert_eq!(stored(&fx).await, 0);
    }

    #[tokio::test]
    async fn unknown_murderer_is_not_reported_as_already_logged() {
        let fx = fixture().await;
        let (rejection, form) =
            rejection_of(fx.service.log_kill(GameId::new(1), submission(42, "ABC")).await);
        assert_eq!(rejection, KillRejection::UnknownReference);
        assert_eq!(form.kill_code.as_deref(), Some("ABC"));
        assert_eq!(stored(&fx).await, 0);
    }

    #[tokio::test]
    async fn victim_from_another_game_is_filed_under_the_submitted_game() {
        let fx = fixture().await;
        fx.store
            .insert_game(GameRound {
                id: GameId::new(2),
                year: 2017,
                number: 2,
            })
            .await;
        let outsider = Player {
            id: PlayerId::new(4),
            game: GameId::new(2),
            name: "Dave".to_string(),
            code: "DDD".to_string(),
            disabled: false,
        };
        assert!(fx.store.insert_player(outsider).await.is_ok());

        let Ok(KillOutcome::Logged(murder)) =
            fx.service.log_kill(GameId::new(1), submission(1, "DDD")).await
        else {
            panic!("expected a logged kill");
        };
        assert_eq!(murder.game, GameId::new(1));
        assert_eq!(murder.victim, PlayerId::new(4));
    }

    #[test]
    fn kill_window_is_inclusive() {
        let window = KillWindow::default();
        let first = parse_kill_datetime("2017-01-01").unwrap_or_default();
        let last = parse_kill_datetime("2017-01-31 23:59:59").unwrap_or_default();
        let after = parse_kill_datetime("2017-02-01").unwrap_or_default();
        assert!(window.contains(&first));
        assert!(window.contains(&last));
        assert!(!window.contains(&after));
    }

    #[test]
    fn inverted_window_is_invalid() {
        let start = NaiveDate::from_ymd_opt(2017, 2, 1).unwrap_or_default();
        let end = NaiveDate::from_ymd_opt(2017, 1, 1).unwrap_or_default();
        assert!(KillWindow::new(start, end).is_err());
    }

    #[test]
    fn only_unusable_codes_are_cleared() {
        assert!(KillRejection::InvalidKillCode.clears_kill_code());
        assert!(KillRejection::AlreadyDead.clears_kill_code());
        assert!(!KillRejection::SelfKill.clears_kill_code());
        assert!(!KillRejection::InvalidDate.clears_kill_code());
        assert!(!KillRejection::MissingLocation.clears_kill_code());
        assert!(!KillRejection::InvalidMurderer.clears_kill_code());
        assert!(KillRejection::AlreadyLogged.clears_kill_code());
        assert!(!KillRejection::UnknownReference.clears_kill_code());
    }
}
