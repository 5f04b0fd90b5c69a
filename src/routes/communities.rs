use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use chrono::Utc;
use serde::Deserialize;

use crate::db::models::{Community, Profile, Role};
use crate::domain::{Filter, NewPost};
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::gateway::GatewayResult;
use crate::routes::home::{not_found, Html};
use crate::routes::posts::PostCard;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/communities.html")]
pub struct CommunitiesTemplate {
    pub viewer: Option<CurrentUser>,
    pub featured: Vec<Community>,
    pub others: Vec<Community>,
}

#[derive(Template)]
#[template(path = "pages/community.html")]
pub struct CommunityTemplate {
    pub viewer: Option<CurrentUser>,
    pub community: Community,
    pub is_member: bool,
    pub tab: String,
    pub posts: Vec<PostCard>,
    pub members: Vec<Profile>,
    pub q: String,
    pub skill: String,
    pub role: String,
    pub roles: &'static [Role],
}

#[derive(Debug, Default, Deserialize)]
pub struct CommunityParams {
    pub tab: Option<String>,
    pub q: Option<String>,
    pub skill: Option<String>,
    pub role: Option<String>,
}

impl CommunityParams {
    /// Members tab filter: free text over name, bio and skills, a skill
    /// substring and an exact role
    fn member_filter(&self) -> Filter {
        let role = self.role.as_deref().and_then(|r| r.parse::<Role>().ok());
        Filter::new()
            .text(self.q.as_deref().unwrap_or_default())
            .skill(self.skill.as_deref().unwrap_or_default())
            .roles(role)
    }

    fn tab(&self) -> &'static str {
        match self.tab.as_deref() {
            Some("members") => "members",
            _ => "posts",
        }
    }
}

pub async fn list(State(state): State<AppState>, maybe_user: MaybeUser) -> AppResult<Response> {
    let (featured, others): (Vec<Community>, Vec<Community>) = state
        .gateway
        .list_communities()
        .await?
        .into_iter()
        .partition(|c| c.featured);

    Ok(Html(CommunitiesTemplate {
        viewer: maybe_user.0,
        featured,
        others,
    })
    .into_response())
}

pub async fn show(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    Path(id): Path<String>,
    Query(params): Query<CommunityParams>,
) -> AppResult<Response> {
    let gateway = &state.gateway;
    let membership = async {
        match maybe_user.id() {
            Some(user_id) => gateway.is_member(&id, user_id).await,
            None => GatewayResult::Ok(false),
        }
    };
    let (community, posts, members, is_member) = tokio::try_join!(
        gateway.get_community(&id),
        gateway.list_posts(&id),
        gateway.list_members(&id),
        membership
    )?;

    let Some(community) = community else {
        return Ok(not_found("community", maybe_user.0));
    };

    let filter = params.member_filter();
    let members = members.into_iter().filter(|m| filter.matches(m)).collect();

    let now = Utc::now();
    Ok(Html(CommunityTemplate {
        viewer: maybe_user.0,
        community,
        is_member,
        tab: params.tab().to_string(),
        posts: posts.into_iter().map(|p| PostCard::new(p, now)).collect(),
        members,
        q: params.q.unwrap_or_default(),
        skill: params.skill.unwrap_or_default(),
        role: params.role.unwrap_or_default(),
        roles: &[Role::Mentor, Role::Mentee, Role::Both],
    })
    .into_response())
}

#[derive(Debug, Deserialize)]
pub struct MembershipForm {
    pub action: String,
}

pub async fn membership(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<MembershipForm>,
) -> AppResult<Response> {
    let result = match form.action.as_str() {
        "join" => state.gateway.join_community(&id, &user.id).await?,
        "leave" => state.gateway.leave_community(&id, &user.id).await?,
        other => return Err(AppError::BadRequest(format!("Unknown action '{other}'"))),
    };
    tracing::info!(
        "{} {}s {} ({} members)",
        user.id,
        form.action,
        id,
        result.member_count
    );
    Ok(Redirect::to(&format!("/communities/{id}")).into_response())
}

#[derive(Debug, Deserialize)]
pub struct PostForm {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: String,
}

pub async fn create_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<PostForm>,
) -> AppResult<Response> {
    let post = NewPost::validate(&id, &user.id, &form.title, &form.content, &form.tags)?;

    if state.gateway.get_community(&id).await?.is_none() {
        return Err(AppError::NotFound);
    }
    if !state.gateway.is_member(&id, &user.id).await? {
        return Err(AppError::BadRequest(
            "Join the community before posting".to_string(),
        ));
    }

    let created = state.gateway.create_post(post).await?;
    tracing::info!("{} posted {} in {}", user.id, created.id, id);
    Ok(Redirect::to(&format!("/communities/{id}")).into_response())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/communities", get(list))
        .route("/communities/{id}", get(show))
        .route("/communities/{id}/membership", post(membership))
        .route("/communities/{id}/posts", post(create_post))
}
