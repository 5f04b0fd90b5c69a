use async_graphql::*;

use crate::db::models::{Comment, Community, Event, Post, Profile};
use crate::gateway::SearchResults;
use crate::graphql::types::{comment_target, gateway, require_viewer, viewer_id};

/// GraphQL Query root
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// All communities, featured first
    async fn communities(&self, ctx: &Context<'_>) -> Result<Vec<Community>> {
        Ok(gateway(ctx)?.list_communities().await?)
    }

    async fn community(&self, ctx: &Context<'_>, id: String) -> Result<Option<Community>> {
        Ok(gateway(ctx)?.get_community(&id).await?)
    }

    /// Posts in a community, newest first
    async fn posts(&self, ctx: &Context<'_>, community_id: String) -> Result<Vec<Post>> {
        Ok(gateway(ctx)?.list_posts(&community_id).await?)
    }

    async fn post(&self, ctx: &Context<'_>, id: String) -> Result<Option<Post>> {
        Ok(gateway(ctx)?.get_post(&id).await?)
    }

    /// Profiles of a community's members, in join order
    async fn members(&self, ctx: &Context<'_>, community_id: String) -> Result<Vec<Profile>> {
        Ok(gateway(ctx)?.list_members(&community_id).await?)
    }

    /// Whether the viewer belongs to the community
    async fn is_member(&self, ctx: &Context<'_>, community_id: String) -> Result<bool> {
        let viewer = require_viewer(ctx)?;
        Ok(gateway(ctx)?.is_member(&community_id, viewer).await?)
    }

    /// Events by start time, with the viewer's RSVP when known
    async fn events(&self, ctx: &Context<'_>) -> Result<Vec<Event>> {
        Ok(gateway(ctx)?.list_events(viewer_id(ctx)).await?)
    }

    async fn event(&self, ctx: &Context<'_>, id: String) -> Result<Option<Event>> {
        Ok(gateway(ctx)?.get_event(&id, viewer_id(ctx)).await?)
    }

    /// Communities and people matching a query. An empty query matches all.
    async fn search(&self, ctx: &Context<'_>, query: String) -> Result<SearchResults> {
        Ok(gateway(ctx)?.search(&query).await?)
    }

    async fn profile(&self, ctx: &Context<'_>, id: String) -> Result<Option<Profile>> {
        Ok(gateway(ctx)?.get_profile(&id).await?)
    }

    /// Comments on a post or an event, oldest first
    async fn comments(
        &self,
        ctx: &Context<'_>,
        post_id: Option<String>,
        event_id: Option<String>,
    ) -> Result<Vec<Comment>> {
        let target = comment_target(post_id, event_id)?;
        Ok(gateway(ctx)?.list_comments(&target).await?)
    }
}
