use async_graphql::Enum;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How far ahead of its start an event counts as starting soon
pub const STARTING_SOON_MINUTES: i64 = 30;

/// Where an event sits on its timeline relative to "now"
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Enum, Eq, PartialEq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Live,
    StartingSoon,
    Upcoming,
    Ended,
}

impl EventStatus {
    /// Classify an event. Both bounds of the live window are inclusive.
    /// An event whose end precedes its start is treated as ended.
    pub fn at(start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        if end < start {
            return EventStatus::Ended;
        }
        if now > end {
            return EventStatus::Ended;
        }
        if now >= start {
            return EventStatus::Live;
        }
        if start - now < Duration::minutes(STARTING_SOON_MINUTES) {
            EventStatus::StartingSoon
        } else {
            EventStatus::Upcoming
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Live => "live",
            EventStatus::StartingSoon => "starting_soon",
            EventStatus::Upcoming => "upcoming",
            EventStatus::Ended => "ended",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EventStatus::Live => "LIVE NOW",
            EventStatus::StartingSoon => "Starting Soon",
            EventStatus::Upcoming => "Upcoming",
            EventStatus::Ended => "Ended",
        }
    }

    /// CSS class for the status badge
    pub fn badge_class(&self) -> &'static str {
        match self {
            EventStatus::Live => "badge badge-live",
            EventStatus::StartingSoon => "badge badge-soon",
            EventStatus::Upcoming => "badge badge-upcoming",
            EventStatus::Ended => "badge badge-ended",
        }
    }

    /// Not over yet: live, starting soon or upcoming
    pub fn is_open(&self) -> bool {
        !matches!(self, EventStatus::Ended)
    }
}
