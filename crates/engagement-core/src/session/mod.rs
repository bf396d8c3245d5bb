//! Orchestration over the pure engines.
//!
//! [`EngagementSession`] owns the confirmed profile snapshot for one user.
//! Activation, every view and every command first reconcile drift against
//! the clock and persist the correction (regenerated lives, automatic
//! freezes). Every gameplay mutation is a [`Command`] processed in order
//! against the latest confirmed snapshot: the session records the pre-state,
//! computes the proposed update with the engines, issues one `save_profile`
//! and keeps the acknowledged snapshot. A refused write restores the pre-state and
//! surfaces [`CoreError::StoreWriteFailed`].
//!
//! This is the only module that reads a clock.

mod command;
mod queue;

pub use command::{Command, CommandKind};
pub use queue::MutationQueue;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::{CivilCalendar, Clock};
use crate::countdown::Countdown;
use crate::error::{ConfigError, CoreError, EngineError, Result, StoreError};
use crate::events::Event;
use crate::ledger::LedgerDelta;
use crate::resource::{PoolStatus, RefillPolicy, ResourceState};
use crate::storage::{Config, Profile, ProfileStore, ProfileUpdate};
use crate::streak::{
    self, month_calendar, FreezePolicy, Milestone, MilestoneStatus, MilestoneTable, MilestoneView,
    MonthCalendar, RepairPayment, RepairPolicy, RepairStatus, StreakOutcome, StreakStatus,
};

/// Rules the session applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub calendar: CivilCalendar,
    pub auto_freeze: bool,
    /// Pool given to a new profile.
    pub initial_resource: ResourceState,
    pub refill: RefillPolicy,
    pub freeze: FreezePolicy,
    pub repair: RepairPolicy,
    pub milestones: MilestoneTable,
    /// Paid for every recorded lesson.
    pub lesson_reward: LedgerDelta,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            calendar: config.calendar()?,
            auto_freeze: config.streak.auto_freeze,
            initial_resource: config.initial_resource(),
            refill: config.refill_policy(),
            freeze: config.freeze_policy(),
            repair: config.repair_policy(),
            milestones: config.milestone_table(),
            lesson_reward: config.lesson_reward(),
        })
    }
}

/// UTC calendar with the stock policies.
impl Default for SessionSettings {
    fn default() -> Self {
        let config = Config::default();
        Self {
            calendar: CivilCalendar::default(),
            auto_freeze: true,
            initial_resource: config.initial_resource(),
            refill: config.refill_policy(),
            freeze: config.freeze_policy(),
            repair: config.repair_policy(),
            milestones: config.milestone_table(),
            lesson_reward: config.lesson_reward(),
        }
    }
}

/// Result of an applied command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    LivesSpent {
        spent: u32,
        remaining: u32,
        depleted: bool,
    },
    LivesGranted {
        granted: u32,
        count: u32,
    },
    RefillPurchased {
        units: u32,
        cost: i64,
    },
    ActivityRecorded {
        date: NaiveDate,
        outcome: StreakOutcome,
        streak: u32,
        message: String,
    },
    StreakRepaired {
        gap_day: NaiveDate,
        payment: RepairPayment,
        cost: i64,
        previous_streak: u32,
        streak: u32,
        messages: Vec<String>,
    },
    MilestoneClaimed {
        milestone: Milestone,
    },
    FreezePurchased {
        inventory: u32,
        cost: i64,
    },
}

/// A command taken off the queue and its result.
#[derive(Debug)]
pub struct Processed {
    pub command: Command,
    pub result: Result<Outcome>,
}

/// Read-only view of the confirmed profile at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dashboard {
    pub user_id: String,
    pub today: NaiveDate,
    pub timezone: String,
    pub lives: u32,
    pub max_lives: u32,
    pub pool_status: PoolStatus,
    pub next_life_in_ms: Option<u64>,
    pub full_in_ms: Option<u64>,
    pub streak: u32,
    pub longest_streak: u32,
    pub streak_status: StreakStatus,
    pub freeze_inventory: u32,
    pub coins: i64,
    pub xp: i64,
    pub repair: RepairStatus,
    pub next_milestone: Option<Milestone>,
    pub claimable_milestones: Vec<u32>,
    pub revision: u64,
}

pub struct EngagementSession<S: ProfileStore, C: Clock> {
    store: S,
    clock: C,
    settings: SessionSettings,
    user_id: String,
    profile: Profile,
    queue: MutationQueue,
    events: Vec<Event>,
}

impl<S: ProfileStore, C: Clock> EngagementSession<S, C> {
    /// Load or create the profile for `user_id` and reconcile offline drift.
    ///
    /// # Errors
    ///
    /// [`CoreError::Store`] when the profile cannot be read or created,
    /// [`CoreError::StoreWriteFailed`] when the drift correction is refused.
    pub fn activate(store: S, clock: C, settings: SessionSettings, user_id: &str) -> Result<Self> {
        let now = clock.now();
        let profile = match store.load_profile(user_id)? {
            Some(profile) => profile,
            None => {
                let fresh = Profile::new(user_id, settings.initial_resource.clone(), now);
                let created = store.create_profile(&fresh)?;
                tracing::info!(user_id, "created profile");
                created
            }
        };

        let mut session = Self {
            store,
            clock,
            settings,
            user_id: user_id.to_string(),
            profile,
            queue: MutationQueue::new(),
            events: Vec::new(),
        };
        session.reconcile_drift(now)?;
        Ok(session)
    }

    /// Re-read the stored profile and reconcile it against the clock.
    pub fn refresh(&mut self) -> Result<&Profile> {
        let stored = self
            .store
            .load_profile(&self.user_id)?
            .ok_or_else(|| StoreError::NotFound(self.user_id.clone()))?;
        self.profile = stored;
        self.reconcile_drift(self.clock.now())?;
        Ok(&self.profile)
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn today(&self) -> NaiveDate {
        self.settings.calendar.civil_today(self.clock.now())
    }

    /// Take the events produced since the last drain.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Display countdown over the confirmed pool.
    pub fn countdown(&self) -> Countdown {
        Countdown::new(self.profile.resource.clone())
    }

    /// Current dashboard. Drift accrued since the last write is persisted
    /// first, so an automatic freeze is never shown as a broken streak.
    pub fn dashboard(&mut self) -> Result<Dashboard> {
        let now = self.observe()?;
        Ok(self.build_dashboard(now))
    }

    /// Full state snapshot event.
    pub fn snapshot(&mut self) -> Result<Event> {
        let now = self.observe()?;
        let dashboard = self.build_dashboard(now);
        Ok(Event::Snapshot {
            lives: dashboard.lives,
            max_lives: dashboard.max_lives,
            pool_status: dashboard.pool_status,
            streak: dashboard.streak,
            streak_status: dashboard.streak_status,
            coins: dashboard.coins,
            xp: dashboard.xp,
            at: now,
        })
    }

    pub fn milestones(&mut self) -> Result<Vec<MilestoneView>> {
        let now = self.observe()?;
        Ok(self.milestone_views(self.settings.calendar.civil_today(now)))
    }

    pub fn repair_status(&mut self) -> Result<RepairStatus> {
        let now = self.observe()?;
        let today = self.settings.calendar.civil_today(now);
        Ok(streak::repair_status(&self.profile.streak, today, &self.settings.repair))
    }

    pub fn calendar(&mut self, year: i32, month: u32) -> Result<Option<MonthCalendar>> {
        let now = self.observe()?;
        let today = self.settings.calendar.civil_today(now);
        Ok(month_calendar(&self.profile.streak, year, month, today))
    }

    // ── Queue ────────────────────────────────────────────────────────

    /// Queue a mutation; returns the command id.
    pub fn submit(&mut self, kind: CommandKind) -> String {
        let command = Command::new(kind, self.clock.now());
        tracing::debug!(command_id = %command.id, command = kind.name(), "queued command");
        self.queue.enqueue(command)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Apply the oldest queued command.
    pub fn process_next(&mut self) -> Option<Processed> {
        let command = self.queue.next()?;
        let result = self.apply(&command);
        if let Err(e) = &result {
            tracing::warn!(command_id = %command.id, command = command.kind.name(), error = %e, "queued command failed");
            // Rollbacks already carry their own event.
            if !e.is_rolled_back() {
                self.events.push(Event::CommandRejected {
                    command_id: command.id.clone(),
                    command: command.kind.name().to_string(),
                    reason: e.to_string(),
                    at: self.clock.now(),
                });
            }
        }
        Some(Processed { command, result })
    }

    /// Apply every queued command in order.
    pub fn process_pending(&mut self) -> Vec<Processed> {
        let mut processed = Vec::with_capacity(self.queue.len());
        while let Some(done) = self.process_next() {
            processed.push(done);
        }
        processed
    }

    /// Apply `kind` after anything already queued.
    ///
    /// Failures of the earlier commands are reported as events.
    pub fn execute(&mut self, kind: CommandKind) -> Result<Outcome> {
        self.process_pending();
        let command = Command::new(kind, self.clock.now());
        self.apply(&command)
    }

    pub fn spend_lives(&mut self, count: u32) -> Result<Outcome> {
        self.execute(CommandKind::SpendLives { count })
    }

    pub fn grant_lives(&mut self, count: u32) -> Result<Outcome> {
        self.execute(CommandKind::GrantLives { count })
    }

    pub fn purchase_refill(&mut self) -> Result<Outcome> {
        self.execute(CommandKind::PurchaseRefill)
    }

    pub fn record_activity(&mut self) -> Result<Outcome> {
        self.execute(CommandKind::RecordActivity)
    }

    pub fn repair_streak(&mut self, payment: RepairPayment) -> Result<Outcome> {
        self.execute(CommandKind::RepairStreak { payment })
    }

    pub fn claim_milestone(&mut self, days: u32) -> Result<Outcome> {
        self.execute(CommandKind::ClaimMilestone { days })
    }

    pub fn purchase_freeze(&mut self) -> Result<Outcome> {
        self.execute(CommandKind::PurchaseFreeze)
    }

    // ── Internals ────────────────────────────────────────────────────

    /// Bring the confirmed snapshot up to the clock before reading it.
    fn observe(&mut self) -> Result<DateTime<Utc>> {
        let now = self.clock.now();
        self.reconcile_drift(now)?;
        Ok(now)
    }

    fn build_dashboard(&self, now: DateTime<Utc>) -> Dashboard {
        let today = self.settings.calendar.civil_today(now);
        let lives = &self.profile.resource;
        let streak_state = &self.profile.streak;
        let streak = streak_state.effective_streak(today);
        let to_ms = |d: Duration| d.num_milliseconds().max(0) as u64;

        Dashboard {
            user_id: self.user_id.clone(),
            today,
            timezone: self.settings.calendar.label(),
            lives: lives.count,
            max_lives: lives.max_count,
            pool_status: lives.status(),
            next_life_in_ms: lives.time_to_next(now).map(to_ms),
            full_in_ms: lives.time_to_full(now).map(to_ms),
            streak,
            longest_streak: streak_state.longest_streak(),
            streak_status: streak_state.status(today),
            freeze_inventory: streak_state.freeze_inventory,
            coins: self.profile.coins,
            xp: self.profile.xp,
            repair: streak::repair_status(streak_state, today, &self.settings.repair),
            next_milestone: self.settings.milestones.next_locked(streak).copied(),
            claimable_milestones: self
                .milestone_views(today)
                .into_iter()
                .filter(|m| m.status == MilestoneStatus::Claimable)
                .map(|m| m.days)
                .collect(),
            revision: self.profile.revision,
        }
    }

    fn milestone_views(&self, today: NaiveDate) -> Vec<MilestoneView> {
        let streak = self.profile.streak.effective_streak(today);
        self.settings
            .milestones
            .statuses(streak, &self.profile.streak.claimed_milestones)
    }

    /// Persist regeneration and automatic freezes accrued while away.
    fn reconcile_drift(&mut self, now: DateTime<Utc>) -> Result<()> {
        let today = self.settings.calendar.civil_today(now);
        let (resource, gained) = self.profile.resource.reconcile(now);
        let evaluation = self.profile.streak.evaluate(today, self.settings.auto_freeze);

        let mut update = ProfileUpdate::default();
        if resource != self.profile.resource {
            update = update.resource(resource);
        }
        if !evaluation.consumed_freezes.is_empty() {
            update = update.streak(evaluation.state.clone());
        }
        if update.is_empty() {
            return Ok(());
        }

        tracing::debug!(
            user_id = %self.user_id,
            units_gained = gained,
            freezes_consumed = evaluation.freeze_decrement(),
            "reconciling offline drift"
        );
        let committed = self.commit(update, "reconcile", None)?;

        if gained > 0 {
            self.events.push(Event::ResourceReconciled {
                units_gained: gained,
                count: committed.resource.count,
                at: now,
            });
        }
        if !evaluation.consumed_freezes.is_empty() {
            self.events.push(Event::StreakFreezeApplied {
                dates: evaluation.consumed_freezes,
                remaining_inventory: committed.streak.freeze_inventory,
                at: now,
            });
        }
        Ok(())
    }

    fn apply(&mut self, command: &Command) -> Result<Outcome> {
        // Freezes owed for missed days are persisted even if the command
        // itself is then rejected.
        let now = self.observe()?;
        let today = self.settings.calendar.civil_today(now);
        let name = command.kind.name();
        let id = Some(command.id.as_str());

        match command.kind {
            CommandKind::SpendLives { count } => {
                let spent = self.profile.resource.spend(count, now)?;
                let committed = self.commit(
                    ProfileUpdate::default().resource(spent.state.clone()),
                    name,
                    id,
                )?;
                let remaining = committed.resource.count;
                self.events.push(Event::ResourceSpent {
                    spent: count,
                    count: remaining,
                    at: now,
                });
                if spent.depleted {
                    self.events.push(Event::ResourceDepleted {
                        next_unit_at: committed
                            .resource
                            .time_to_next(now)
                            .and_then(|d| now.checked_add_signed(d)),
                        at: now,
                    });
                }
                Ok(Outcome::LivesSpent {
                    spent: count,
                    remaining,
                    depleted: spent.depleted,
                })
            }

            CommandKind::GrantLives { count } => {
                let (current, _) = self.profile.resource.reconcile(now);
                let next = current.grant(count);
                let granted = next.count - current.count;
                let committed = self.commit(ProfileUpdate::default().resource(next), name, id)?;
                self.events.push(Event::ResourceGranted {
                    granted,
                    count: committed.resource.count,
                    at: now,
                });
                Ok(Outcome::LivesGranted {
                    granted,
                    count: committed.resource.count,
                })
            }

            CommandKind::PurchaseRefill => {
                let (current, _) = self.profile.resource.reconcile(now);
                let (units, cost) = self
                    .settings
                    .refill
                    .quote(&current)
                    .ok_or(EngineError::AlreadyFull)?;
                if self.profile.coins < cost {
                    return Err(EngineError::InsufficientFunds {
                        required: cost,
                        available: self.profile.coins,
                    }
                    .into());
                }
                let update = ProfileUpdate::default()
                    .resource(current.grant(units))
                    .ledger(LedgerDelta::coins(-cost));
                self.commit(update, name, id)?;
                self.events.push(Event::RefillPurchased { units, cost, at: now });
                Ok(Outcome::RefillPurchased { units, cost })
            }

            CommandKind::RecordActivity => {
                let (next, outcome) = self.profile.streak.record_activity(today);
                let streak = next.effective_streak(today);
                tracing::debug!(user_id = %self.user_id, ?outcome, streak, "activity evaluated");

                let update = ProfileUpdate::default()
                    .streak(next)
                    .ledger(self.settings.lesson_reward);
                self.commit(update, name, id)?;
                self.events.push(Event::ActivityRecorded {
                    date: today,
                    outcome,
                    streak,
                    at: now,
                });
                Ok(Outcome::ActivityRecorded {
                    date: today,
                    outcome,
                    streak,
                    message: outcome.message(streak),
                })
            }

            CommandKind::RepairStreak { payment } => {
                let repaired = streak::repair(
                    &self.profile.streak,
                    today,
                    self.profile.coins,
                    payment,
                    &self.settings.repair,
                )?;
                let cost = -repaired.ledger.coins_delta;
                let gap_day = today - Duration::days(1);

                let update = ProfileUpdate::default()
                    .streak(repaired.state)
                    .ledger(repaired.ledger);
                self.commit(update, name, id)?;
                self.events.push(Event::StreakRepaired {
                    gap_day,
                    payment,
                    cost,
                    streak: repaired.effective_streak,
                    at: now,
                });
                Ok(Outcome::StreakRepaired {
                    gap_day,
                    payment,
                    cost,
                    previous_streak: repaired.previous_streak,
                    streak: repaired.effective_streak,
                    messages: repaired.messages,
                })
            }

            CommandKind::ClaimMilestone { days } => {
                let claim = self.settings.milestones.claim(
                    &self.profile.streak,
                    self.profile.streak.effective_streak(today),
                    days,
                )?;
                let update = ProfileUpdate::default()
                    .streak(claim.state)
                    .ledger(claim.ledger);
                self.commit(update, name, id)?;
                let reward = claim.milestone.reward;
                self.events.push(Event::MilestoneClaimed {
                    days,
                    coins: reward.coins,
                    xp: reward.xp,
                    freezes: reward.freezes,
                    at: now,
                });
                Ok(Outcome::MilestoneClaimed {
                    milestone: claim.milestone,
                })
            }

            CommandKind::PurchaseFreeze => {
                let (next, ledger) = self
                    .settings
                    .freeze
                    .purchase(&self.profile.streak, self.profile.coins)?;
                let cost = -ledger.coins_delta;
                let update = ProfileUpdate::default().streak(next).ledger(ledger);
                let committed = self.commit(update, name, id)?;
                let inventory = committed.streak.freeze_inventory;
                self.events.push(Event::FreezePurchased {
                    inventory,
                    cost,
                    at: now,
                });
                Ok(Outcome::FreezePurchased { inventory, cost })
            }
        }
    }

    /// Write `update` against the confirmed snapshot.
    ///
    /// The proposed profile is shown immediately. It is replaced by the
    /// acknowledged snapshot on success and by the pre-state on failure.
    fn commit(&mut self, update: ProfileUpdate, command: &str, command_id: Option<&str>) -> Result<Profile> {
        let now = self.clock.now();
        let update = update.expect_revision(self.profile.revision).written_at(now);
        let pre_state = self.profile.clone();
        self.profile = update.apply_to(&pre_state, now)?;

        match self.store.save_profile(&self.user_id, &update) {
            Ok(acknowledged) => {
                tracing::info!(
                    user_id = %self.user_id,
                    command,
                    revision = acknowledged.revision,
                    coins = acknowledged.coins,
                    xp = acknowledged.xp,
                    "profile committed"
                );
                self.profile = acknowledged.clone();
                Ok(acknowledged)
            }
            Err(source) => {
                self.profile = pre_state;
                tracing::warn!(
                    user_id = %self.user_id,
                    command,
                    error = %source,
                    "profile write refused, local change reverted"
                );
                self.events.push(Event::MutationRolledBack {
                    command_id: command_id.unwrap_or_default().to_string(),
                    command: command.to_string(),
                    reason: source.to_string(),
                    at: now,
                });
                Err(CoreError::StoreWriteFailed {
                    user_id: self.user_id.clone(),
                    source,
                })
            }
        }
    }
}
