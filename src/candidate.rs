use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::StoreError;

/// Role assigned when the caller does not pick one.
pub const DEFAULT_ROLE: &str = "Frontend Engineer";

/// Roles offered by the add form.
pub const ROLES: [&str; 6] = [
    "Frontend Engineer",
    "Backend Engineer",
    "Full Stack Engineer",
    "Product Manager",
    "UI/UX Designer",
    "QA Engineer",
];

/// Position of a candidate in the interview pipeline
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Waiting,
    InChinese,
    InEnglish,
    Completed,
}

impl Stage {
    /// Board column order.
    pub const ALL: [Stage; 4] = [
        Stage::Waiting,
        Stage::InChinese,
        Stage::InEnglish,
        Stage::Completed,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Stage::Waiting => "Waiting Lobby",
            Stage::InChinese => "Chinese Interview",
            Stage::InEnglish => "English Interview",
            Stage::Completed => "Completed",
        }
    }

    pub fn column_index(&self) -> usize {
        match self {
            Stage::Waiting => 0,
            Stage::InChinese => 1,
            Stage::InEnglish => 2,
            Stage::Completed => 3,
        }
    }
}

impl FromStr for Stage {
    type Err = StoreError;

    /// Accepts the stored spelling (`IN_CHINESE`) as well as lowercase and
    /// kebab-case variants. `BREAK` was never a live stage and is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "WAITING" => Ok(Stage::Waiting),
            "IN_CHINESE" => Ok(Stage::InChinese),
            "IN_ENGLISH" => Ok(Stage::InEnglish),
            "COMPLETED" => Ok(Stage::Completed),
            _ => Err(StoreError::InvalidStage(s.to_string())),
        }
    }
}

/// A single person moving through the interview stages.
///
/// Field names round-trip losslessly with the stored JSON (`checkInTime`,
/// `currentStage`, ...). Timestamps are milliseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: String,
    pub name: String,
    pub role: String,
    pub check_in_time: i64,
    pub current_stage: Stage,
    pub has_completed_chinese: bool,
    pub has_completed_english: bool,
    pub last_updated: i64,
}

impl Candidate {
    /// Fresh arrival: waiting, no interviews done.
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: impl Into<String>, now: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: role.into(),
            check_in_time: now,
            current_stage: Stage::Waiting,
            has_completed_chinese: false,
            has_completed_english: false,
            last_updated: now,
        }
    }

    /// Move to `to`, marking the interview being left as done.
    ///
    /// Any destination is accepted. Completion flags are only ever set here,
    /// never cleared.
    pub fn transition_to(&mut self, to: Stage, now: i64) {
        if self.current_stage == Stage::InChinese && to != Stage::InChinese {
            self.has_completed_chinese = true;
        }
        if self.current_stage == Stage::InEnglish && to != Stage::InEnglish {
            self.has_completed_english = true;
        }
        self.current_stage = to;
        self.last_updated = now;
    }

    pub fn is_done(&self) -> bool {
        self.current_stage == Stage::Completed
    }
}

/// The three literal candidates a fresh or reset board starts with.
///
/// `now` is captured once by the store and reused for every reset.
pub fn seed_candidates(now: i64) -> Vec<Candidate> {
    vec![
        Candidate {
            id: "1".to_string(),
            name: "王小明".to_string(),
            role: "Frontend Engineer".to_string(),
            check_in_time: now - 3_600_000,
            current_stage: Stage::Waiting,
            has_completed_chinese: false,
            has_completed_english: false,
            last_updated: now,
        },
        Candidate {
            id: "2".to_string(),
            name: "陳雅婷".to_string(),
            role: "Product Manager".to_string(),
            check_in_time: now - 7_200_000,
            current_stage: Stage::InChinese,
            has_completed_chinese: false,
            has_completed_english: true,
            last_updated: now,
        },
        Candidate {
            id: "3".to_string(),
            name: "張偉".to_string(),
            role: "Backend Engineer".to_string(),
            check_in_time: now - 1_800_000,
            current_stage: Stage::InEnglish,
            has_completed_chinese: false,
            has_completed_english: false,
            last_updated: now,
        },
    ]
}
