use async_trait::async_trait;

use crate::db::models::{
    Comment, CommentTarget, Community, ConnectionRequest, Event, Post, Profile, Role, RsvpStatus,
};
use crate::domain::NewPost;
use crate::gateway::{
    Gateway, GatewayError, GatewayResult, LikeState, MembershipState, ProfileUpdate, RsvpState,
};

/// Stand-in used when storage could not be opened at startup. Every call
/// fails with `Unconfigured` so pages answer 503 instead of the process
/// refusing to start.
#[derive(Debug, Clone)]
pub struct DisabledGateway {
    reason: String,
}

impl DisabledGateway {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn fail<T>(&self) -> GatewayResult<T> {
        Err(GatewayError::Unconfigured(self.reason.clone()))
    }
}

#[async_trait]
impl Gateway for DisabledGateway {
    async fn list_communities(&self) -> GatewayResult<Vec<Community>> {
        self.fail()
    }

    async fn get_community(&self, _id: &str) -> GatewayResult<Option<Community>> {
        self.fail()
    }

    async fn search_communities(&self, _query: &str) -> GatewayResult<Vec<Community>> {
        self.fail()
    }

    async fn list_posts(&self, _community_id: &str) -> GatewayResult<Vec<Post>> {
        self.fail()
    }

    async fn get_post(&self, _id: &str) -> GatewayResult<Option<Post>> {
        self.fail()
    }

    async fn create_post(&self, _post: NewPost) -> GatewayResult<Post> {
        self.fail()
    }

    async fn toggle_post_like(&self, _post_id: &str, _user_id: &str) -> GatewayResult<LikeState> {
        self.fail()
    }

    async fn list_members(&self, _community_id: &str) -> GatewayResult<Vec<Profile>> {
        self.fail()
    }

    async fn join_community(
        &self,
        _community_id: &str,
        _user_id: &str,
    ) -> GatewayResult<MembershipState> {
        self.fail()
    }

    async fn leave_community(
        &self,
        _community_id: &str,
        _user_id: &str,
    ) -> GatewayResult<MembershipState> {
        self.fail()
    }

    async fn is_member(&self, _community_id: &str, _user_id: &str) -> GatewayResult<bool> {
        self.fail()
    }

    async fn get_profile(&self, _id: &str) -> GatewayResult<Option<Profile>> {
        self.fail()
    }

    async fn update_profile(&self, _id: &str, _update: ProfileUpdate) -> GatewayResult<Profile> {
        self.fail()
    }

    async fn search_people(
        &self,
        _query: &str,
        _role: Option<Role>,
    ) -> GatewayResult<Vec<Profile>> {
        self.fail()
    }

    async fn list_events(&self, _viewer: Option<&str>) -> GatewayResult<Vec<Event>> {
        self.fail()
    }

    async fn get_event(&self, _id: &str, _viewer: Option<&str>) -> GatewayResult<Option<Event>> {
        self.fail()
    }

    async fn rsvp(
        &self,
        _event_id: &str,
        _user_id: &str,
        _status: RsvpStatus,
    ) -> GatewayResult<RsvpState> {
        self.fail()
    }

    async fn list_comments(&self, _target: &CommentTarget) -> GatewayResult<Vec<Comment>> {
        self.fail()
    }

    async fn add_comment(
        &self,
        _target: &CommentTarget,
        _author_id: &str,
        _content: &str,
    ) -> GatewayResult<Comment> {
        self.fail()
    }

    async fn get_comment(&self, _id: &str) -> GatewayResult<Option<Comment>> {
        self.fail()
    }

    async fn toggle_comment_like(
        &self,
        _comment_id: &str,
        _user_id: &str,
    ) -> GatewayResult<LikeState> {
        self.fail()
    }

    async fn send_connection_request(
        &self,
        _from_id: &str,
        _to_id: &str,
        _message: &str,
    ) -> GatewayResult<ConnectionRequest> {
        self.fail()
    }

    async fn connection_exists(&self, _a: &str, _b: &str) -> GatewayResult<bool> {
        self.fail()
    }

    async fn incoming_requests(&self, _user_id: &str) -> GatewayResult<Vec<ConnectionRequest>> {
        self.fail()
    }

    async fn respond_to_connection(
        &self,
        _request_id: &str,
        _responder_id: &str,
        _accept: bool,
    ) -> GatewayResult<ConnectionRequest> {
        self.fail()
    }
}
