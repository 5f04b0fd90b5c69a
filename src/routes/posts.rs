use askama::Template;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::db::models::{Comment, CommentTarget, Community, Post};
use crate::domain::time_ago;
use crate::domain::validation::comment_body;
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::routes::home::{not_found, Html};
use crate::state::AppState;

pub struct PostCard {
    pub post: Post,
    pub ago: String,
}

impl PostCard {
    pub fn new(post: Post, now: DateTime<Utc>) -> Self {
        Self {
            ago: time_ago(post.created_at, now),
            post,
        }
    }
}

pub struct CommentView {
    pub comment: Comment,
    pub ago: String,
}

impl CommentView {
    pub fn new(comment: Comment, now: DateTime<Utc>) -> Self {
        Self {
            ago: time_ago(comment.created_at, now),
            comment,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    pub content: String,
}

#[derive(Template)]
#[template(path = "pages/post.html")]
pub struct PostTemplate {
    pub viewer: Option<CurrentUser>,
    pub card: PostCard,
    pub community: Option<Community>,
    pub comments: Vec<CommentView>,
    pub comment_action: String,
}

pub async fn show(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let target = CommentTarget::Post(id.clone());
    let (post, comments) = tokio::try_join!(
        state.gateway.get_post(&id),
        state.gateway.list_comments(&target)
    )?;

    let Some(post) = post else {
        return Ok(not_found("post", maybe_user.0));
    };
    let community = state.gateway.get_community(&post.community_id).await?;

    let now = Utc::now();
    Ok(Html(PostTemplate {
        viewer: maybe_user.0,
        card: PostCard::new(post, now),
        community,
        comments: comments
            .into_iter()
            .map(|c| CommentView::new(c, now))
            .collect(),
        comment_action: format!("/posts/{id}/comments"),
    })
    .into_response())
}

pub async fn like(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let like = state.gateway.toggle_post_like(&id, &user.id).await?;
    tracing::debug!("post {} now has {} likes", id, like.likes);
    Ok(Redirect::to(&format!("/posts/{id}")).into_response())
}

pub async fn comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<CommentForm>,
) -> AppResult<Response> {
    let content = comment_body(&form.content)?;
    let target = CommentTarget::Post(id);
    state
        .gateway
        .add_comment(&target, &user.id, &content)
        .await?;
    Ok(Redirect::to(&target.path()).into_response())
}

/// Like or unlike a comment, then go back to the page showing it
pub async fn like_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let comment = state
        .gateway
        .get_comment(&id)
        .await?
        .ok_or(AppError::NotFound)?;
    state.gateway.toggle_comment_like(&id, &user.id).await?;
    Ok(Redirect::to(&comment.target().path()).into_response())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts/{id}", get(show))
        .route("/posts/{id}/like", post(like))
        .route("/posts/{id}/comments", post(comment))
        .route("/comments/{id}/like", post(like_comment))
}
