//! TOML-based engine configuration.
//!
//! Stores gameplay tuning including:
//! - Lives pool size, regeneration interval and refill price
//! - The fixed civil timezone used for streak day boundaries
//! - Freeze shop, repair pricing and activity rewards
//! - The milestone table
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::clock::CivilCalendar;
use crate::error::ConfigError;
use crate::ledger::LedgerDelta;
use crate::resource::{RefillPolicy, ResourceState};
use crate::streak::{FreezePolicy, Milestone, MilestoneTable, RepairPolicy};

/// Lives pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConfig {
    #[serde(default = "default_max_count")]
    pub max_count: u32,
    #[serde(default = "default_regen_interval_minutes")]
    pub regen_interval_minutes: u64,
    #[serde(default = "default_refill_cost_per_unit")]
    pub refill_cost_per_unit: i64,
}

/// Streak calendar configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreakConfig {
    /// Fixed UTC offset for day boundaries, e.g. `+05:30`.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_true")]
    pub auto_freeze: bool,
}

/// Freeze shop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreezeConfig {
    #[serde(default = "default_freeze_price")]
    pub price: i64,
    #[serde(default = "default_max_freeze_inventory")]
    pub max_inventory: u32,
}

/// Repair pricing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairConfig {
    #[serde(default = "default_repair_base_cost")]
    pub base_cost: i64,
    #[serde(default = "default_repair_escalation_step")]
    pub escalation_step: i64,
    #[serde(default = "default_repair_window_days")]
    pub escalation_window_days: i64,
    #[serde(default = "default_repair_max_cost")]
    pub max_cost: i64,
}

/// Rewards for completing a lesson.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardsConfig {
    #[serde(default = "default_lesson_coins")]
    pub lesson_coins: i64,
    #[serde(default = "default_lesson_xp")]
    pub lesson_xp: i64,
}

/// Engine configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub resource: ResourceConfig,
    #[serde(default)]
    pub streak: StreakConfig,
    #[serde(default)]
    pub freeze: FreezeConfig,
    #[serde(default)]
    pub repair: RepairConfig,
    #[serde(default)]
    pub rewards: RewardsConfig,
    #[serde(default = "default_milestones")]
    pub milestones: Vec<Milestone>,
}

/// Longest accepted regen interval (one week).
pub const MAX_REGEN_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

// Default functions
fn default_max_count() -> u32 {
    5
}
fn default_regen_interval_minutes() -> u64 {
    20
}
fn default_refill_cost_per_unit() -> i64 {
    70
}
fn default_timezone() -> String {
    "+05:30".into()
}
fn default_true() -> bool {
    true
}
fn default_freeze_price() -> i64 {
    FreezePolicy::default().price
}
fn default_max_freeze_inventory() -> u32 {
    FreezePolicy::default().max_inventory
}
fn default_repair_base_cost() -> i64 {
    RepairPolicy::default().base_cost
}
fn default_repair_escalation_step() -> i64 {
    RepairPolicy::default().escalation_step
}
fn default_repair_window_days() -> i64 {
    RepairPolicy::default().escalation_window_days
}
fn default_repair_max_cost() -> i64 {
    RepairPolicy::default().max_cost
}
fn default_lesson_coins() -> i64 {
    5
}
fn default_lesson_xp() -> i64 {
    10
}
fn default_milestones() -> Vec<Milestone> {
    MilestoneTable::default().milestones().to_vec()
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            max_count: default_max_count(),
            regen_interval_minutes: default_regen_interval_minutes(),
            refill_cost_per_unit: default_refill_cost_per_unit(),
        }
    }
}

impl Default for StreakConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            auto_freeze: true,
        }
    }
}

impl Default for FreezeConfig {
    fn default() -> Self {
        Self {
            price: default_freeze_price(),
            max_inventory: default_max_freeze_inventory(),
        }
    }
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            base_cost: default_repair_base_cost(),
            escalation_step: default_repair_escalation_step(),
            escalation_window_days: default_repair_window_days(),
            max_cost: default_repair_max_cost(),
        }
    }
}

impl Default for RewardsConfig {
    fn default() -> Self {
        Self {
            lesson_coins: default_lesson_coins(),
            lesson_xp: default_lesson_xp(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resource: ResourceConfig::default(),
            streak: StreakConfig::default(),
            freeze: FreezeConfig::default(),
            repair: RepairConfig::default(),
            rewards: RewardsConfig::default(),
            milestones: default_milestones(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::InvalidValue {
            key: key.to_string(),
            message: "unknown config key".to_string(),
        };
        let unparsable = |kind: &str| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("cannot parse '{value}' as {kind}"),
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|_| unparsable("bool"))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value.parse::<i64>().map_err(|_| unparsable("integer"))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|_| unparsable("JSON"))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Default location of the config file.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be created.
    pub fn path() -> Result<PathBuf, ConfigError> {
        data_dir()
            .map(|dir| dir.join("config.toml"))
            .map_err(|e| ConfigError::LoadFailed {
                path: PathBuf::from("config.toml"),
                message: e.to_string(),
            })
    }

    /// Load from the default location, writing defaults when missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults when the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(error = %e, "falling back to default config");
                Self::default()
            }
        }
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the result fails validation. `self` is unchanged on error.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let next: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        next.validate()?;
        *self = next;
        Ok(())
    }

    /// Set a value by key and persist to the default location.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.set_value(key, value)?;
        self.save()
    }

    /// Reject values the engines cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: &str| {
            Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: message.to_string(),
            })
        };

        CivilCalendar::parse(&self.streak.timezone)?;
        if self.resource.regen_interval_minutes == 0 {
            return invalid("resource.regen_interval_minutes", "must be at least 1");
        }
        if self.resource.regen_interval_minutes > MAX_REGEN_INTERVAL_MINUTES {
            return invalid("resource.regen_interval_minutes", "must be at most 10080 (one week)");
        }
        if self.resource.refill_cost_per_unit < 0 {
            return invalid("resource.refill_cost_per_unit", "must not be negative");
        }
        if self.freeze.price < 0 {
            return invalid("freeze.price", "must not be negative");
        }
        if self.repair.base_cost < 0 || self.repair.max_cost < self.repair.base_cost {
            return invalid("repair.max_cost", "must be at least repair.base_cost");
        }
        if self.milestones.iter().any(|m| m.days == 0) {
            return invalid("milestones", "thresholds must be at least 1 day");
        }
        Ok(())
    }

    pub fn calendar(&self) -> Result<CivilCalendar, ConfigError> {
        CivilCalendar::parse(&self.streak.timezone)
    }

    /// Pool given to a new profile.
    pub fn initial_resource(&self) -> ResourceState {
        ResourceState::full(
            self.resource.max_count,
            self.resource.regen_interval_minutes.saturating_mul(60_000),
        )
    }

    pub fn refill_policy(&self) -> RefillPolicy {
        RefillPolicy {
            cost_per_unit: self.resource.refill_cost_per_unit,
        }
    }

    pub fn freeze_policy(&self) -> FreezePolicy {
        FreezePolicy {
            price: self.freeze.price,
            max_inventory: self.freeze.max_inventory,
        }
    }

    pub fn repair_policy(&self) -> RepairPolicy {
        RepairPolicy {
            base_cost: self.repair.base_cost,
            escalation_step: self.repair.escalation_step,
            escalation_window_days: self.repair.escalation_window_days,
            max_cost: self.repair.max_cost,
        }
    }

    pub fn milestone_table(&self) -> MilestoneTable {
        MilestoneTable::new(self.milestones.clone())
    }

    pub fn lesson_reward(&self) -> LedgerDelta {
        LedgerDelta {
            coins_delta: self.rewards.lesson_coins,
            xp_delta: self.rewards.lesson_xp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.resource.max_count, 5);
        assert_eq!(parsed.streak.timezone, "+05:30");
        assert_eq!(parsed.milestones.len(), cfg.milestones.len());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let parsed: Config = toml::from_str(
            "[resource]\nmax_count = 3\n\n[[milestones]]\ndays = 3\ncoins = 50\n",
        )
        .unwrap();
        assert_eq!(parsed.resource.max_count, 3);
        assert_eq!(parsed.resource.regen_interval_minutes, 20);
        assert_eq!(parsed.milestones.len(), 1);
        assert_eq!(parsed.milestones[0].reward.coins, 50);
        assert_eq!(parsed.milestones[0].reward.freezes, 0);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("resource.max_count").as_deref(), Some("5"));
        assert_eq!(cfg.get("streak.auto_freeze").as_deref(), Some("true"));
        assert_eq!(cfg.get("streak.timezone").as_deref(), Some("+05:30"));
        assert!(cfg.get("streak.missing_key").is_none());
    }

    #[test]
    fn set_value_updates_nested_fields() {
        let mut cfg = Config::default();
        cfg.set_value("resource.max_count", "8").unwrap();
        cfg.set_value("streak.auto_freeze", "false").unwrap();
        cfg.set_value("streak.timezone", "-03:00").unwrap();
        assert_eq!(cfg.resource.max_count, 8);
        assert!(!cfg.streak.auto_freeze);
        assert_eq!(cfg.calendar().unwrap().label(), "-03:00");
    }

    #[test]
    fn set_value_rejects_unknown_or_invalid() {
        let mut cfg = Config::default();
        assert!(cfg.set_value("resource.nonexistent", "1").is_err());
        assert!(cfg.set_value("streak.auto_freeze", "maybe").is_err());
        assert!(cfg.set_value("streak.timezone", "Mars/Olympus").is_err());
        assert!(cfg.set_value("resource.regen_interval_minutes", "0").is_err());
        assert!(cfg
            .set_value("resource.regen_interval_minutes", "9223372036854775807")
            .is_err());
        // Failed sets leave the config untouched.
        assert_eq!(cfg.streak.timezone, "+05:30");
        assert_eq!(cfg.resource.regen_interval_minutes, 20);
        assert!(cfg.set_value("resource.regen_interval_minutes", "10080").is_ok());
    }

    #[test]
    fn load_from_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.resource.max_count, 5);

        let mut changed = cfg.clone();
        changed.set_value("rewards.lesson_xp", "25").unwrap();
        changed.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().rewards.lesson_xp, 25);
    }

    #[test]
    fn derived_policies_follow_config() {
        let cfg = Config::default();
        let pool = cfg.initial_resource();
        assert_eq!(pool.count, 5);
        assert_eq!(pool.regen_interval_ms, 20 * 60 * 1000);
        assert_eq!(cfg.repair_policy(), RepairPolicy::default());
        assert_eq!(cfg.freeze_policy(), FreezePolicy::default());
        assert_eq!(cfg.milestone_table(), MilestoneTable::default());
    }
}
