use crate::{
    catalog::CaseDefinition,
    profile::{ProfileError, ProfileStore, SessionRecord, UserProfile},
};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// The four rated aspects of interview performance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Dimension {
    Structure,
    Understanding,
    Delivery,
    Creativity,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Structure,
        Dimension::Understanding,
        Dimension::Delivery,
        Dimension::Creativity,
    ];

    /// Weight of this dimension in the 0-100 session score.
    pub fn weight(self) -> f64 {
        match self {
            Dimension::Structure => 0.35,
            Dimension::Understanding => 0.25,
            Dimension::Delivery => 0.25,
            Dimension::Creativity => 0.15,
        }
    }
}

/// Per-dimension star ratings for the session in progress; unset dimensions
/// score zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ratings {
    structure: Option<u8>,
    understanding: Option<u8>,
    delivery: Option<u8>,
    creativity: Option<u8>,
}

impl Ratings {
    pub fn set(&mut self, dimension: Dimension, stars: u8) {
        let stars = stars.min(5);
        let slot = match dimension {
            Dimension::Structure => &mut self.structure,
            Dimension::Understanding => &mut self.understanding,
            Dimension::Delivery => &mut self.delivery,
            Dimension::Creativity => &mut self.creativity,
        };
        *slot = Some(stars);
    }

    pub fn value(&self, dimension: Dimension) -> u8 {
        let slot = match dimension {
            Dimension::Structure => self.structure,
            Dimension::Understanding => self.understanding,
            Dimension::Delivery => self.delivery,
            Dimension::Creativity => self.creativity,
        };
        slot.unwrap_or(0)
    }
}

/// Weighted 0-100 session score: each 0-5 star rating contributes
/// `rating / 5 * 100 * weight`, rounded once at the end.
pub fn total_score(ratings: &Ratings) -> u32 {
    let sum: f64 = Dimension::ALL
        .iter()
        .map(|dimension| {
            (ratings.value(*dimension) as f64 / 5.0) * 100.0 * dimension.weight()
        })
        .sum();
    sum.round() as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyComponents {
    pub structuring: u32,
    pub quantitative: u32,
    pub insight: u32,
    pub communication: u32,
}

/// Per-dimension fields on the older dashboard scale (maxima 30/15/35/20).
/// This mapping does not agree with the session weights above; both scores
/// are persisted side by side.
pub fn legacy_components(ratings: &Ratings) -> LegacyComponents {
    LegacyComponents {
        structuring: ratings.value(Dimension::Structure) as u32 * 6,
        quantitative: ratings.value(Dimension::Understanding) as u32 * 3,
        insight: ratings.value(Dimension::Delivery) as u32 * 7,
        communication: ratings.value(Dimension::Creativity) as u32 * 4,
    }
}

/// `XmYs` display form used by the history table.
pub fn format_duration(elapsed_secs: u64) -> String {
    format!("{}m {}s", elapsed_secs / 60, elapsed_secs % 60)
}

#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    #[error("a profile is required before a session can be saved")]
    ProfileRequired,
    #[error("profile store error: {0}")]
    Store(#[from] ProfileError),
}

/// Turns a finished session into an immutable history record: builds the
/// record, appends it, bumps `solved`, updates the streak, and persists the
/// profile before returning. The mutation is staged on a working copy and
/// committed only after the write succeeds, so a failed write leaves the
/// caller's profile untouched.
pub fn complete_session(
    case: &CaseDefinition,
    elapsed_secs: u64,
    ratings: &Ratings,
    ai_feedback: Option<&str>,
    profile: &mut Option<UserProfile>,
    store: &ProfileStore,
    today: NaiveDate,
) -> Result<SessionRecord, ScoringError> {
    let current = profile.as_mut().ok_or(ScoringError::ProfileRequired)?;
    let mut staged = current.clone();

    let components = legacy_components(ratings);
    let record = SessionRecord {
        record_id: format!("case-{}", staged.next_record_id),
        case_id: case.id.clone(),
        name: case.title.clone(),
        company: case.company.clone(),
        case_type: case.case_type.clone(),
        difficulty: case.difficulty.clone(),
        date: today,
        total_score: total_score(ratings),
        duration_secs: elapsed_secs,
        duration: format_duration(elapsed_secs),
        structuring: components.structuring,
        quantitative: components.quantitative,
        insight: components.insight,
        communication: components.communication,
        ai_feedback: ai_feedback
            .unwrap_or("No verbal feedback recorded.")
            .to_string(),
    };

    staged.next_record_id += 1;
    staged.history.push(record.clone());
    staged.stats.solved += 1;
    if staged.stats.last_active != today {
        if staged.stats.last_active == today - Duration::days(1) {
            staged.stats.streak += 1;
        } else {
            staged.stats.streak = 1;
        }
        staged.stats.last_active = today;
    }

    store.save(&staged)?;
    *current = staged;
    Ok(record)
}
