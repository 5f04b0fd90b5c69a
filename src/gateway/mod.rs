// Data access gateway - the only door between views and storage

pub mod disabled;
pub mod sqlite;

use std::sync::Arc;

use async_graphql::SimpleObject;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::models::{
    Comment, CommentTarget, Community, ConnectionRequest, Event, Post, Profile, Role, RsvpStatus,
};
use crate::domain::NewPost;

pub use disabled::DisabledGateway;
pub use sqlite::SqliteGateway;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Storage is not configured: {0}")]
    Unconfigured(String),

    #[error("Database error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

pub type SharedGateway = Arc<dyn Gateway>;

/// Membership state as stored after a join or leave
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, SimpleObject)]
pub struct MembershipState {
    pub community_id: String,
    pub is_member: bool,
    pub member_count: i64,
}

/// RSVP state as stored after an RSVP
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, SimpleObject)]
pub struct RsvpState {
    pub event_id: String,
    pub status: RsvpStatus,
    pub attendee_count: i64,
}

/// Like state as stored after a toggle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, SimpleObject)]
pub struct LikeState {
    pub target_id: String,
    pub liked: bool,
    pub likes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, SimpleObject)]
pub struct SearchResults {
    pub communities: Vec<Community>,
    pub people: Vec<Profile>,
}

/// Fields a profile owner may change. `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub age: Option<i32>,
    pub location: Option<String>,
    pub skills: Option<Vec<String>>,
    pub interests: Option<Vec<String>>,
    pub role: Option<Role>,
    pub experience: Option<String>,
    pub availability: Option<String>,
}

/// Gateway trait - every storage operation the application performs.
///
/// Reads of a single entity return `Ok(None)` when it does not exist.
/// Mutations return the state the store ended up in, so callers never have to
/// patch counters themselves.
#[async_trait]
pub trait Gateway: Send + Sync {
    // Communities

    /// Featured first, then by name
    async fn list_communities(&self) -> GatewayResult<Vec<Community>>;

    async fn get_community(&self, id: &str) -> GatewayResult<Option<Community>>;

    /// Featured first, at most 20. An empty query lists everything.
    async fn search_communities(&self, query: &str) -> GatewayResult<Vec<Community>>;

    // Posts

    /// Newest first
    async fn list_posts(&self, community_id: &str) -> GatewayResult<Vec<Post>>;

    async fn get_post(&self, id: &str) -> GatewayResult<Option<Post>>;

    async fn create_post(&self, post: NewPost) -> GatewayResult<Post>;

    async fn toggle_post_like(&self, post_id: &str, user_id: &str) -> GatewayResult<LikeState>;

    // Membership

    /// In join order
    async fn list_members(&self, community_id: &str) -> GatewayResult<Vec<Profile>>;

    /// Joining twice is not an error
    async fn join_community(
        &self,
        community_id: &str,
        user_id: &str,
    ) -> GatewayResult<MembershipState>;

    /// Leaving a community one is not part of is not an error
    async fn leave_community(
        &self,
        community_id: &str,
        user_id: &str,
    ) -> GatewayResult<MembershipState>;

    async fn is_member(&self, community_id: &str, user_id: &str) -> GatewayResult<bool>;

    // People

    async fn get_profile(&self, id: &str) -> GatewayResult<Option<Profile>>;

    async fn update_profile(&self, id: &str, update: ProfileUpdate) -> GatewayResult<Profile>;

    /// Newest first, at most 50. Asking for mentors or mentees also returns
    /// people who are both.
    async fn search_people(&self, query: &str, role: Option<Role>) -> GatewayResult<Vec<Profile>>;

    /// Communities and people matched independently
    async fn search(&self, query: &str) -> GatewayResult<SearchResults> {
        let (communities, people) = tokio::try_join!(
            self.search_communities(query),
            self.search_people(query, None)
        )?;
        Ok(SearchResults {
            communities,
            people,
        })
    }

    // Events

    /// By start time. `viewer` fills in each event's `viewer_rsvp`.
    async fn list_events(&self, viewer: Option<&str>) -> GatewayResult<Vec<Event>>;

    async fn get_event(&self, id: &str, viewer: Option<&str>) -> GatewayResult<Option<Event>>;

    async fn rsvp(
        &self,
        event_id: &str,
        user_id: &str,
        status: RsvpStatus,
    ) -> GatewayResult<RsvpState>;

    // Comments

    /// Oldest first
    async fn list_comments(&self, target: &CommentTarget) -> GatewayResult<Vec<Comment>>;

    async fn add_comment(
        &self,
        target: &CommentTarget,
        author_id: &str,
        content: &str,
    ) -> GatewayResult<Comment>;

    async fn get_comment(&self, id: &str) -> GatewayResult<Option<Comment>>;

    async fn toggle_comment_like(
        &self,
        comment_id: &str,
        user_id: &str,
    ) -> GatewayResult<LikeState>;

    // Connections

    /// Repeating a request returns the one already stored
    async fn send_connection_request(
        &self,
        from_id: &str,
        to_id: &str,
        message: &str,
    ) -> GatewayResult<ConnectionRequest>;

    /// True when a request exists in either direction and was not declined
    async fn connection_exists(&self, a: &str, b: &str) -> GatewayResult<bool>;

    /// Pending requests addressed to `user_id`, newest first
    async fn incoming_requests(&self, user_id: &str) -> GatewayResult<Vec<ConnectionRequest>>;

    async fn respond_to_connection(
        &self,
        request_id: &str,
        responder_id: &str,
        accept: bool,
    ) -> GatewayResult<ConnectionRequest>;
}
