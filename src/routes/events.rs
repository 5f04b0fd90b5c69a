use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::MapConfig;
use crate::db::models::{CommentTarget, Event, EventType, RsvpStatus};
use crate::domain::text::event_time;
use crate::domain::validation::comment_body;
use crate::domain::{EventStatus, Filter};
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::routes::home::{not_found, Html};
use crate::routes::posts::{CommentForm, CommentView};
use crate::state::AppState;

/// An event with its status and start time worked out for display
pub struct EventCard {
    pub event: Event,
    pub status: EventStatus,
    pub starts: String,
    pub ends: String,
}

impl EventCard {
    pub fn new(event: Event, now: DateTime<Utc>) -> Self {
        Self {
            status: event.status_at(now),
            starts: event_time(event.start_time),
            ends: event_time(event.end_time),
            event,
        }
    }

    pub fn seats(&self) -> String {
        match self.event.max_attendees {
            Some(max) => format!("{} / {} going", self.event.attendee_count, max),
            None => format!("{} going", self.event.attendee_count),
        }
    }

    pub fn is_full(&self) -> bool {
        self.event.full()
    }

    pub fn viewer_is(&self, status: &RsvpStatus) -> bool {
        self.event.viewer_rsvp.as_ref() == Some(status)
    }
}

/// Data the map script needs for one marker
#[derive(Debug, Serialize)]
struct Marker<'a> {
    id: &'a str,
    title: &'a str,
    lat: f64,
    lng: f64,
    status: &'static str,
    label: &'static str,
    url: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct EventsParams {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub q: Option<String>,
}

/// The `type` parameter: everything, a status group or one event type.
/// Unknown values show everything.
fn type_filter(kind: &str, now: DateTime<Utc>) -> Filter {
    match kind {
        "" | "all" => Filter::new(),
        "live" => Filter::new().statuses([EventStatus::Live], now),
        "upcoming" => Filter::new().statuses([EventStatus::StartingSoon, EventStatus::Upcoming], now),
        other => match other.parse::<EventType>() {
            Ok(t) => Filter::new().event_types([t]),
            Err(_) => Filter::new(),
        },
    }
}

#[derive(Template)]
#[template(path = "pages/events.html")]
pub struct EventsTemplate {
    pub viewer: Option<CurrentUser>,
    pub events: Vec<EventCard>,
    pub total: usize,
    pub kind: String,
    pub q: String,
    pub event_types: &'static [EventType],
    pub map: MapConfig,
    pub markers_json: String,
}

#[derive(Template)]
#[template(path = "pages/event.html")]
pub struct EventTemplate {
    pub viewer: Option<CurrentUser>,
    pub card: EventCard,
    pub comments: Vec<CommentView>,
    pub comment_action: String,
    pub rsvp_options: &'static [(RsvpStatus, &'static str)],
}

const RSVP_OPTIONS: &[(RsvpStatus, &str)] = &[
    (RsvpStatus::Attending, "Going"),
    (RsvpStatus::Maybe, "Maybe"),
    (RsvpStatus::NotAttending, "Can't go"),
];

/// JSON safe to place inside a `<script>` element
fn markers_json(cards: &[EventCard]) -> AppResult<String> {
    let markers: Vec<Marker<'_>> = cards
        .iter()
        .map(|card| Marker {
            id: &card.event.id,
            title: &card.event.title,
            lat: card.event.latitude,
            lng: card.event.longitude,
            status: card.status.as_str(),
            label: card.status.label(),
            url: format!("/events/{}", card.event.id),
        })
        .collect();
    let json = serde_json::to_string(&markers)
        .map_err(|e| AppError::Internal(format!("marker encoding failed: {e}")))?;
    Ok(json.replace("</", "<\\/"))
}

pub async fn list(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    Query(params): Query<EventsParams>,
) -> AppResult<Response> {
    let events = state.gateway.list_events(maybe_user.id()).await?;
    let total = events.len();

    let now = Utc::now();
    let kind = params.kind.unwrap_or_default();
    let q = params.q.unwrap_or_default();
    let filter = type_filter(&kind, now).text(&q);

    let events: Vec<EventCard> = events
        .into_iter()
        .filter(|e| filter.matches(e))
        .map(|e| EventCard::new(e, now))
        .collect();
    let markers_json = markers_json(&events)?;

    Ok(Html(EventsTemplate {
        viewer: maybe_user.0,
        events,
        total,
        kind,
        q,
        event_types: &EventType::ALL,
        map: state.config.map.clone(),
        markers_json,
    })
    .into_response())
}

pub async fn show(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let target = CommentTarget::Event(id.clone());
    let (event, comments) = tokio::try_join!(
        state.gateway.get_event(&id, maybe_user.id()),
        state.gateway.list_comments(&target)
    )?;

    let Some(event) = event else {
        return Ok(not_found("event", maybe_user.0));
    };

    let now = Utc::now();
    Ok(Html(EventTemplate {
        viewer: maybe_user.0,
        card: EventCard::new(event, now),
        comments: comments
            .into_iter()
            .map(|c| CommentView::new(c, now))
            .collect(),
        comment_action: format!("/events/{id}/comments"),
        rsvp_options: RSVP_OPTIONS,
    })
    .into_response())
}

#[derive(Debug, Deserialize)]
pub struct RsvpForm {
    pub status: String,
}

pub async fn rsvp(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<RsvpForm>,
) -> AppResult<Response> {
    let status: RsvpStatus = form
        .status
        .parse()
        .map_err(|e: crate::db::models::ParseEnumError| AppError::BadRequest(e.to_string()))?;

    let state_after = state.gateway.rsvp(&id, &user.id, status).await?;
    tracing::info!(
        "{} is {} for event {} ({} attending)",
        user.id,
        state_after.status,
        id,
        state_after.attendee_count
    );
    Ok(Redirect::to(&format!("/events/{id}")).into_response())
}

pub async fn comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<CommentForm>,
) -> AppResult<Response> {
    let content = comment_body(&form.content)?;
    let target = CommentTarget::Event(id);
    state
        .gateway
        .add_comment(&target, &user.id, &content)
        .await?;
    Ok(Redirect::to(&target.path()).into_response())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/events", get(list))
        .route("/events/{id}", get(show))
        .route("/events/{id}/rsvp", post(rsvp))
        .route("/events/{id}/comments", post(comment))
}
