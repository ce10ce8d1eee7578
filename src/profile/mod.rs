use chrono::NaiveDate;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStats {
    pub solved: u32,
    /// Consecutive calendar days with at least one completed session.
    pub streak: u32,
    pub last_active: NaiveDate,
}

impl ProfileStats {
    pub fn fresh(today: NaiveDate) -> Self {
        Self {
            solved: 0,
            streak: 1,
            last_active: today,
        }
    }
}

/// One completed practice session. Immutable once created; appended to
/// `UserProfile::history` in chronological order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub record_id: String,
    pub case_id: String,
    pub name: String,
    pub company: String,
    #[serde(rename = "type")]
    pub case_type: String,
    pub difficulty: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub total_score: u32,
    #[serde(default)]
    pub duration_secs: u64,
    /// Formatted `XmYs` duration shown in the history table.
    pub duration: String,
    pub structuring: u32,
    pub quantitative: u32,
    pub insight: u32,
    pub communication: u32,
    pub ai_feedback: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileIdentity {
    pub name: String,
    pub username: String,
    pub email: String,
    pub college: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub username: String,
    pub email: String,
    pub college: String,
    pub mascot_id: u32,
    pub joined_date: NaiveDate,
    #[serde(default = "default_next_record_id")]
    pub next_record_id: u64,
    pub stats: ProfileStats,
    pub history: Vec<SessionRecord>,
}

fn default_next_record_id() -> u64 {
    1
}

/// Documents written by earlier releases may lack `stats`/`history`; the
/// store upgrades them on load instead of failing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredProfile {
    name: String,
    username: String,
    email: String,
    college: String,
    #[serde(default)]
    mascot_id: u32,
    #[serde(default)]
    joined_date: NaiveDate,
    #[serde(default = "default_next_record_id")]
    next_record_id: u64,
    stats: Option<ProfileStats>,
    history: Option<Vec<SessionRecord>>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("failed to read profile: {0}")]
    Read(std::io::Error),
    #[error("failed to write profile: {0}")]
    Write(std::io::Error),
    #[error("failed to parse profile JSON: {0}")]
    Parse(serde_json::Error),
    #[error("cannot resolve app data directory")]
    AppData,
}

/// Durable storage for the single per-device profile document. Every
/// mutation is written through immediately by the caller.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    pub fn new() -> Result<Self, ProfileError> {
        let proj_dirs =
            ProjectDirs::from("com", "casebuddy", "core").ok_or(ProfileError::AppData)?;
        Ok(Self {
            path: proj_dirs.data_dir().join("profile.json"),
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Returns `Ok(None)` on first run. Documents missing `stats` or
    /// `history` are upgraded in place and persisted in the new shape.
    pub fn load(&self, today: NaiveDate) -> Result<Option<UserProfile>, ProfileError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path).map_err(ProfileError::Read)?;
        let stored: StoredProfile = serde_json::from_str(&raw).map_err(ProfileError::Parse)?;
        let needs_upgrade = stored.stats.is_none() || stored.history.is_none();
        let profile = UserProfile {
            name: stored.name,
            username: stored.username,
            email: stored.email,
            college: stored.college,
            mascot_id: stored.mascot_id,
            joined_date: stored.joined_date,
            next_record_id: stored.next_record_id,
            stats: stored.stats.unwrap_or_else(|| ProfileStats::fresh(today)),
            history: stored.history.unwrap_or_default(),
        };
        if needs_upgrade {
            self.save(&profile)?;
        }
        Ok(Some(profile))
    }

    pub fn save(&self, profile: &UserProfile) -> Result<(), ProfileError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(ProfileError::Write)?;
        }
        let raw = serde_json::to_string_pretty(profile).map_err(ProfileError::Parse)?;
        fs::write(&self.path, raw).map_err(ProfileError::Write)?;
        Ok(())
    }

    /// Logout: removes the document. Safe to call when none exists.
    pub fn clear(&self) -> Result<(), ProfileError> {
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(ProfileError::Write)?;
        }
        Ok(())
    }

    /// Login: builds and persists a fresh profile.
    pub fn create_profile(
        &self,
        identity: ProfileIdentity,
        mascot_id: u32,
        today: NaiveDate,
    ) -> Result<UserProfile, ProfileError> {
        let profile = UserProfile {
            name: identity.name,
            username: identity.username,
            email: identity.email,
            college: identity.college,
            mascot_id,
            joined_date: today,
            next_record_id: 1,
            stats: ProfileStats::fresh(today),
            history: Vec::new(),
        };
        self.save(&profile)?;
        Ok(profile)
    }
}
