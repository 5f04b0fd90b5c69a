use askama::Template;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use chrono::Utc;
use serde::Deserialize;

use crate::db::models::{ConnectionRequest, Profile, Role};
use crate::domain::text::parse_list;
use crate::domain::time_ago;
use crate::domain::validation::{connection_message, DEFAULT_CONNECTION_MESSAGE};
use crate::domain::ValidationError;
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::gateway::ProfileUpdate;
use crate::routes::home::{not_found, Html};
use crate::state::AppState;

pub struct RequestView {
    pub request: ConnectionRequest,
    pub initials: String,
    pub ago: String,
}

#[derive(Template)]
#[template(path = "pages/profile.html")]
pub struct ProfileTemplate {
    pub viewer: Option<CurrentUser>,
    pub profile: Profile,
    pub is_own: bool,
    pub connected: bool,
    pub requests: Vec<RequestView>,
    pub member_since: String,
    pub default_message: &'static str,
    pub roles: &'static [Role],
}

impl ProfileTemplate {
    pub fn rating(&self) -> String {
        match self.profile.rating {
            Some(r) => format!("{r:.1} ({} reviews)", self.profile.review_count),
            None => "No reviews yet".to_string(),
        }
    }
}

pub async fn show(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let Some(profile) = state.gateway.get_profile(&id).await? else {
        return Ok(not_found("profile", maybe_user.0));
    };

    let viewer_id = maybe_user.id();
    let is_own = viewer_id == Some(profile.id.as_str());
    let now = Utc::now();

    let (connected, requests) = match viewer_id {
        Some(me) if is_own => {
            let requests = state
                .gateway
                .incoming_requests(me)
                .await?
                .into_iter()
                .map(|request| RequestView {
                    initials: crate::domain::initials(request.from.name.as_deref()),
                    ago: time_ago(request.created_at, now),
                    request,
                })
                .collect();
            (false, requests)
        }
        Some(me) => (state.gateway.connection_exists(me, &id).await?, Vec::new()),
        None => (false, Vec::new()),
    };

    Ok(Html(ProfileTemplate {
        member_since: profile.created_at.format("%B %Y").to_string(),
        viewer: maybe_user.0,
        profile,
        is_own,
        connected,
        requests,
        default_message: DEFAULT_CONNECTION_MESSAGE,
        roles: &[Role::Mentor, Role::Mentee, Role::Both],
    })
    .into_response())
}

#[derive(Debug, Deserialize)]
pub struct ConnectForm {
    #[serde(default)]
    pub message: String,
}

pub async fn connect(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<ConnectForm>,
) -> AppResult<Response> {
    let message = connection_message(&user.id, &id, &form.message)?;
    let request = state
        .gateway
        .send_connection_request(&user.id, &id, &message)
        .await?;
    tracing::info!("{} asked to connect with {} ({})", user.id, id, request.status);
    Ok(Redirect::to(&format!("/profiles/{id}")).into_response())
}

/// Edit form. Blank optional fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileForm {
    pub name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub age: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub skills: String,
    #[serde(default)]
    pub interests: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub availability: String,
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl ProfileForm {
    fn into_update(self) -> AppResult<ProfileUpdate> {
        let name = non_blank(&self.name).ok_or(ValidationError::EmptyField("name"))?;
        let age = match self.age.trim() {
            "" => None,
            raw => Some(
                raw.parse::<i32>()
                    .ok()
                    .filter(|age| (1..=130).contains(age))
                    .ok_or_else(|| AppError::BadRequest(format!("'{raw}' is not an age")))?,
            ),
        };
        let role = match self.role.trim() {
            "" => None,
            raw => Some(
                raw.parse::<Role>()
                    .map_err(|e| AppError::BadRequest(e.to_string()))?,
            ),
        };

        Ok(ProfileUpdate {
            name: Some(name),
            bio: non_blank(&self.bio),
            age,
            location: non_blank(&self.location),
            skills: Some(parse_list(&self.skills)),
            interests: Some(parse_list(&self.interests)),
            role,
            experience: non_blank(&self.experience),
            availability: non_blank(&self.availability),
        })
    }
}

pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<ProfileForm>,
) -> AppResult<Response> {
    if user.id != id {
        return Err(AppError::Unauthorized);
    }
    let update = form.into_update()?;
    state.gateway.update_profile(&id, update).await?;
    Ok(Redirect::to(&format!("/profiles/{id}")).into_response())
}

#[derive(Debug, Deserialize)]
pub struct RespondForm {
    pub decision: String,
}

pub async fn respond(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<RespondForm>,
) -> AppResult<Response> {
    let accept = match form.decision.as_str() {
        "accept" => true,
        "decline" => false,
        other => return Err(AppError::BadRequest(format!("Unknown decision '{other}'"))),
    };
    let request = state
        .gateway
        .respond_to_connection(&id, &user.id, accept)
        .await?;
    tracing::info!("{} {} request from {}", user.id, request.status, request.from_id);
    Ok(Redirect::to(&format!("/profiles/{}", user.id)).into_response())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profiles/{id}", get(show).post(update))
        .route("/profiles/{id}/connect", post(connect))
        .route("/connections/{id}/respond", post(respond))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> ProfileForm {
        ProfileForm {
            name: "Sam Chen".into(),
            ..Default::default()
        }
    }

    #[test]
    fn blank_name_is_rejected() {
        let err = ProfileForm::default().into_update().unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "Please fill in the name"));
    }

    #[test]
    fn blank_optional_fields_leave_values_alone() {
        let update = form().into_update().unwrap();
        assert_eq!(update.name.as_deref(), Some("Sam Chen"));
        assert!(update.bio.is_none());
        assert!(update.age.is_none());
        assert!(update.role.is_none());
        assert_eq!(update.skills, Some(vec![]));
    }

    #[test]
    fn age_and_role_are_parsed() {
        let update = ProfileForm {
            age: " 42 ".into(),
            role: "mentor".into(),
            skills: "Python, python, Teaching".into(),
            ..form()
        }
        .into_update()
        .unwrap();
        assert_eq!(update.age, Some(42));
        assert_eq!(update.role, Some(Role::Mentor));
        assert_eq!(update.skills, Some(vec!["Python".to_string(), "Teaching".to_string()]));

        assert!(ProfileForm {
            age: "old".into(),
            ..form()
        }
        .into_update()
        .is_err());
        assert!(ProfileForm {
            role: "guru".into(),
            ..form()
        }
        .into_update()
        .is_err());
    }
}
