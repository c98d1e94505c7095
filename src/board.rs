use chrono::{Local, TimeZone};
use itertools::Itertools;
use std::cmp::Reverse;
use time_humanize::HumanTime;

use crate::candidate::{Candidate, Stage};

/// Candidates grouped into the four stage columns, newest activity first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Board {
    columns: [Vec<Candidate>; 4],
}

impl Board {
    pub fn from_candidates(candidates: Vec<Candidate>) -> Self {
        let mut columns: [Vec<Candidate>; 4] = Default::default();
        for candidate in candidates
            .into_iter()
            .sorted_by_key(|c| Reverse(c.last_updated))
        {
            columns[candidate.current_stage.column_index()].push(candidate);
        }
        Self { columns }
    }

    pub fn column(&self, stage: Stage) -> &[Candidate] {
        &self.columns[stage.column_index()]
    }

    pub fn columns(&self) -> impl Iterator<Item = (Stage, &[Candidate])> {
        Stage::ALL.into_iter().map(|s| (s, self.column(s)))
    }

    pub fn count(&self, stage: Stage) -> usize {
        self.column(stage).len()
    }

    pub fn len(&self) -> usize {
        self.columns.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn find(&self, id: &str) -> Option<&Candidate> {
        self.columns.iter().flatten().find(|c| c.id == id)
    }
}

/// Local wall-clock `HH:MM` of a millisecond timestamp
pub fn format_check_in(ms: i64) -> String {
    Local
        .timestamp_millis_opt(ms)
        .single()
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string())
}

/// Rough "time ago" text for how long a candidate has been on site
pub fn waiting_for(now_ms: i64, since_ms: i64) -> String {
    let secs = (now_ms - since_ms).max(0) / 1000;
    HumanTime::from_seconds(-secs).to_string()
}
