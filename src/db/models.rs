use std::fmt;
use std::str::FromStr;

use async_graphql::{ComplexObject, Enum, SimpleObject};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::status::EventStatus;

/// Direction of knowledge exchange a profile is looking for
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Enum, Eq, PartialEq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Mentor,
    Mentee,
    Both,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Mentor => "mentor",
            Role::Mentee => "mentee",
            Role::Both => "both",
        }
    }

    /// Roles that satisfy a search for `self`: asking for mentors also finds
    /// people who both mentor and learn.
    pub fn accepted_by_search(self) -> Vec<Role> {
        match self {
            Role::Mentor => vec![Role::Mentor, Role::Both],
            Role::Mentee => vec![Role::Mentee, Role::Both],
            Role::Both => vec![Role::Mentor, Role::Mentee, Role::Both],
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, Enum, Eq, PartialEq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Workshop,
    Meetup,
    MentoringSession,
    Discussion,
    Other,
}

impl EventType {
    pub const ALL: [EventType; 5] = [
        EventType::Workshop,
        EventType::Meetup,
        EventType::MentoringSession,
        EventType::Discussion,
        EventType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Workshop => "workshop",
            EventType::Meetup => "meetup",
            EventType::MentoringSession => "mentoring_session",
            EventType::Discussion => "discussion",
            EventType::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EventType::Workshop => "Workshop",
            EventType::Meetup => "Meetup",
            EventType::MentoringSession => "Mentoring Session",
            EventType::Discussion => "Discussion",
            EventType::Other => "Other",
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, Enum, Eq, PartialEq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RsvpStatus {
    Attending,
    Maybe,
    NotAttending,
}

impl RsvpStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RsvpStatus::Attending => "attending",
            RsvpStatus::Maybe => "maybe",
            RsvpStatus::NotAttending => "not_attending",
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, Enum, Eq, PartialEq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Pending,
    Accepted,
    Declined,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Pending => "pending",
            ConnectionStatus::Accepted => "accepted",
            ConnectionStatus::Declined => "declined",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! impl_str_enum {
    ($ty:ty, $kind:literal, [$($variant:path),+ $(,)?]) => {
        impl FromStr for $ty {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(
                    if s == $variant.as_str() {
                        return Ok($variant);
                    }
                )+
                Err(ParseEnumError {
                    kind: $kind,
                    value: s.to_string(),
                })
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

impl_str_enum!(Role, "role", [Role::Mentor, Role::Mentee, Role::Both]);
impl_str_enum!(
    EventType,
    "event type",
    [
        EventType::Workshop,
        EventType::Meetup,
        EventType::MentoringSession,
        EventType::Discussion,
        EventType::Other,
    ]
);
impl_str_enum!(
    RsvpStatus,
    "rsvp status",
    [
        RsvpStatus::Attending,
        RsvpStatus::Maybe,
        RsvpStatus::NotAttending,
    ]
);
impl_str_enum!(
    ConnectionStatus,
    "connection status",
    [
        ConnectionStatus::Pending,
        ConnectionStatus::Accepted,
        ConnectionStatus::Declined,
    ]
);

/// A member of the platform. `initials` is derived from `name` whenever the
/// profile is loaded.
#[derive(Debug, Clone, Serialize, Deserialize, SimpleObject)]
pub struct Profile {
    pub id: String,
    pub name: Option<String>,
    #[graphql(skip)]
    pub email: Option<String>,
    pub bio: Option<String>,
    pub age: Option<i32>,
    pub location: Option<String>,
    pub skills: Vec<String>,
    pub interests: Vec<String>,
    pub role: Role,
    pub experience: Option<String>,
    pub availability: Option<String>,
    pub rating: Option<f64>,
    pub review_count: i32,
    pub preferred_meeting_style: Vec<String>,
    pub initials: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Anonymous")
    }
}

/// The slice of a profile shown next to posts, comments and events
#[derive(Debug, Clone, Default, Serialize, Deserialize, SimpleObject)]
pub struct AuthorSummary {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub role: Option<Role>,
}

impl AuthorSummary {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Anonymous")
    }

    pub fn role_label(&self) -> &'static str {
        self.role.map(|r| r.as_str()).unwrap_or("member")
    }
}

/// A community together with its read-time member and post counts
#[derive(Debug, Clone, Serialize, Deserialize, SimpleObject)]
pub struct Community {
    pub id: String,
    pub name: String,
    pub description: String,
    pub categories: Vec<String>,
    pub featured: bool,
    pub member_count: i64,
    pub post_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, SimpleObject)]
pub struct Post {
    pub id: String,
    pub community_id: String,
    pub author_id: String,
    pub author: AuthorSummary,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub likes: i64,
    pub replies: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, SimpleObject)]
#[graphql(complex)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: String,
    pub organizer_id: String,
    pub organizer: AuthorSummary,
    pub event_type: EventType,
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub max_attendees: Option<i64>,
    pub attendee_count: i64,
    pub is_online: bool,
    pub meeting_link: Option<String>,
    pub tags: Vec<String>,
    pub community_id: Option<String>,
    /// The viewer's own RSVP, when the event was loaded on behalf of a user
    pub viewer_rsvp: Option<RsvpStatus>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[ComplexObject]
impl Event {
    /// Lifecycle status at the time of the request
    async fn status(&self) -> EventStatus {
        self.status_at(Utc::now())
    }

    /// Whether the attendee cap has been reached
    async fn is_full(&self) -> bool {
        self.full()
    }
}

impl Event {
    pub fn status_at(&self, now: DateTime<Utc>) -> EventStatus {
        EventStatus::at(self.start_time, self.end_time, now)
    }

    pub fn full(&self) -> bool {
        self.max_attendees
            .is_some_and(|max| self.attendee_count >= max)
    }
}

/// What a comment is attached to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommentTarget {
    Post(String),
    Event(String),
}

impl CommentTarget {
    pub fn id(&self) -> &str {
        match self {
            CommentTarget::Post(id) | CommentTarget::Event(id) => id,
        }
    }

    /// Page the comment is shown on
    pub fn path(&self) -> String {
        match self {
            CommentTarget::Post(id) => format!("/posts/{id}"),
            CommentTarget::Event(id) => format!("/events/{id}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, SimpleObject)]
pub struct Comment {
    pub id: String,
    pub post_id: Option<String>,
    pub event_id: Option<String>,
    pub author_id: String,
    pub author: AuthorSummary,
    pub content: String,
    pub likes: i64,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn target(&self) -> CommentTarget {
        match (&self.post_id, &self.event_id) {
            (Some(post_id), _) => CommentTarget::Post(post_id.clone()),
            (None, Some(event_id)) => CommentTarget::Event(event_id.clone()),
            // The schema forbids comments without a target
            (None, None) => CommentTarget::Post(String::new()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, SimpleObject)]
pub struct ConnectionRequest {
    pub id: String,
    pub from_id: String,
    pub from: AuthorSummary,
    pub to_id: String,
    pub message: String,
    pub status: ConnectionStatus,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn event(max_attendees: Option<i64>, attendee_count: i64) -> Event {
        let start = Utc.with_ymd_and_hms(2026, 5, 1, 18, 0, 0).unwrap();
        Event {
            id: "e-1".into(),
            title: "Python for Everyone".into(),
            description: "Intro workshop".into(),
            organizer_id: "p-1".into(),
            organizer: AuthorSummary::default(),
            event_type: EventType::Workshop,
            location: "Library".into(),
            latitude: 37.77,
            longitude: -122.41,
            start_time: start,
            end_time: start + Duration::hours(2),
            max_attendees,
            attendee_count,
            is_online: false,
            meeting_link: None,
            tags: vec![],
            community_id: None,
            viewer_rsvp: None,
            created_at: start,
            updated_at: start,
        }
    }

    #[test]
    fn enums_round_trip_through_strings() {
        for t in EventType::ALL {
            assert_eq!(t.as_str().parse::<EventType>().unwrap(), t);
        }
        assert_eq!("mentee".parse::<Role>().unwrap(), Role::Mentee);
        assert_eq!(
            "not_attending".parse::<RsvpStatus>().unwrap(),
            RsvpStatus::NotAttending
        );
    }

    #[test]
    fn unknown_enum_value_is_an_error() {
        let err = "grandmaster".parse::<Role>().unwrap_err();
        assert_eq!(err.to_string(), "unknown role 'grandmaster'");
    }

    #[test]
    fn mentor_search_accepts_both() {
        assert_eq!(Role::Mentor.accepted_by_search(), vec![Role::Mentor, Role::Both]);
        assert_eq!(Role::Both.accepted_by_search().len(), 3);
    }

    #[test]
    fn event_is_full_only_with_cap() {
        assert!(!event(None, 500).full());
        assert!(!event(Some(10), 9).full());
        assert!(event(Some(10), 10).full());
    }

    #[test]
    fn comment_target_paths() {
        assert_eq!(CommentTarget::Post("abc".into()).path(), "/posts/abc");
        assert_eq!(CommentTarget::Event("xyz".into()).path(), "/events/xyz");
    }
}
