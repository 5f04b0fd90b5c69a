use async_graphql::*;

use crate::db::models::{Comment, ConnectionRequest, Post, Profile, RsvpStatus};
use crate::domain::validation::{comment_body, connection_message};
use crate::domain::NewPost;
use crate::gateway::{LikeState, MembershipState, RsvpState};
use crate::graphql::types::{
    comment_target, gateway, require_viewer, CreatePostInput, UpdateProfileInput,
};

/// GraphQL Mutation root. Every mutation acts for the viewer.
pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn join_community(
        &self,
        ctx: &Context<'_>,
        community_id: String,
    ) -> Result<MembershipState> {
        let viewer = require_viewer(ctx)?;
        Ok(gateway(ctx)?.join_community(&community_id, viewer).await?)
    }

    async fn leave_community(
        &self,
        ctx: &Context<'_>,
        community_id: String,
    ) -> Result<MembershipState> {
        let viewer = require_viewer(ctx)?;
        Ok(gateway(ctx)?.leave_community(&community_id, viewer).await?)
    }

    /// Post to a community the viewer is a member of
    async fn create_post(&self, ctx: &Context<'_>, input: CreatePostInput) -> Result<Post> {
        let viewer = require_viewer(ctx)?;
        let gateway = gateway(ctx)?;

        let tags = input.tags.unwrap_or_default().join(",");
        let post = NewPost::validate(
            &input.community_id,
            viewer,
            &input.title,
            &input.content,
            &tags,
        )?;

        if gateway.get_community(&post.community_id).await?.is_none() {
            return Err(Error::new(format!(
                "Community {} not found",
                post.community_id
            )));
        }
        if !gateway.is_member(&post.community_id, viewer).await? {
            return Err(Error::new("Join the community before posting"));
        }
        Ok(gateway.create_post(post).await?)
    }

    async fn rsvp(
        &self,
        ctx: &Context<'_>,
        event_id: String,
        status: RsvpStatus,
    ) -> Result<RsvpState> {
        let viewer = require_viewer(ctx)?;
        Ok(gateway(ctx)?.rsvp(&event_id, viewer, status).await?)
    }

    async fn send_connection_request(
        &self,
        ctx: &Context<'_>,
        to_id: String,
        message: Option<String>,
    ) -> Result<ConnectionRequest> {
        let viewer = require_viewer(ctx)?;
        let message = connection_message(viewer, &to_id, message.as_deref().unwrap_or(""))?;
        Ok(gateway(ctx)?
            .send_connection_request(viewer, &to_id, &message)
            .await?)
    }

    /// Accept or decline a request addressed to the viewer
    async fn respond_to_connection(
        &self,
        ctx: &Context<'_>,
        request_id: String,
        accept: bool,
    ) -> Result<ConnectionRequest> {
        let viewer = require_viewer(ctx)?;
        Ok(gateway(ctx)?
            .respond_to_connection(&request_id, viewer, accept)
            .await?)
    }

    /// Update the viewer's own profile
    async fn update_profile(
        &self,
        ctx: &Context<'_>,
        input: UpdateProfileInput,
    ) -> Result<Profile> {
        let viewer = require_viewer(ctx)?;
        Ok(gateway(ctx)?.update_profile(viewer, input.into()).await?)
    }

    async fn add_comment(
        &self,
        ctx: &Context<'_>,
        post_id: Option<String>,
        event_id: Option<String>,
        content: String,
    ) -> Result<Comment> {
        let viewer = require_viewer(ctx)?;
        let target = comment_target(post_id, event_id)?;
        let content = comment_body(&content)?;
        Ok(gateway(ctx)?.add_comment(&target, viewer, &content).await?)
    }

    async fn toggle_post_like(&self, ctx: &Context<'_>, post_id: String) -> Result<LikeState> {
        let viewer = require_viewer(ctx)?;
        Ok(gateway(ctx)?.toggle_post_like(&post_id, viewer).await?)
    }
}
