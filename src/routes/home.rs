use askama::Template;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::Utc;

use crate::db::models::Community;
use crate::error::AppResult;
use crate::extractors::{CurrentUser, MaybeUser};
use crate::routes::events::EventCard;
use crate::state::AppState;

const FEATURED_ON_HOME: usize = 6;
const EVENTS_ON_HOME: usize = 4;

#[derive(Template)]
#[template(path = "pages/home.html")]
pub struct HomeTemplate {
    pub viewer: Option<CurrentUser>,
    pub featured: Vec<Community>,
    pub upcoming: Vec<EventCard>,
}

#[derive(Template)]
#[template(path = "pages/not_found.html")]
pub struct NotFoundTemplate {
    pub viewer: Option<CurrentUser>,
    pub what: &'static str,
}

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

/// The dedicated not-found page, answered with 404
pub fn not_found(what: &'static str, viewer: Option<CurrentUser>) -> Response {
    (
        StatusCode::NOT_FOUND,
        Html(NotFoundTemplate { viewer, what }),
    )
        .into_response()
}

pub async fn fallback(maybe_user: MaybeUser) -> Response {
    not_found("page", maybe_user.0)
}

pub async fn index(State(state): State<AppState>, maybe_user: MaybeUser) -> AppResult<Response> {
    let (communities, events) = tokio::try_join!(
        state.gateway.list_communities(),
        state.gateway.list_events(maybe_user.id())
    )?;

    let now = Utc::now();
    let featured = communities
        .into_iter()
        .filter(|c| c.featured)
        .take(FEATURED_ON_HOME)
        .collect();
    let upcoming = events
        .into_iter()
        .map(|e| EventCard::new(e, now))
        .filter(|card| card.status.is_open())
        .take(EVENTS_ON_HOME)
        .collect();

    Ok(Html(HomeTemplate {
        viewer: maybe_user.0,
        featured,
        upcoming,
    })
    .into_response())
}
