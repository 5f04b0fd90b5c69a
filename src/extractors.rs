use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::db::models::Profile;
use crate::error::AppError;
use crate::state::AppState;

/// The viewer, resolved from the identity header set by the proxy in front
/// of Knit.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub name: String,
}

impl From<Profile> for CurrentUser {
    fn from(profile: Profile) -> Self {
        Self {
            name: profile.display_name().to_string(),
            id: profile.id,
        }
    }
}

/// Profile id claimed by the request, falling back to `auth.dev_user`
fn claimed_user_id(parts: &Parts, state: &AppState) -> Option<String> {
    parts
        .headers
        .get(state.config.auth.user_header.as_str())
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .or_else(|| state.config.auth.dev_user.clone())
}

/// Extractor that requires a known profile.
/// Returns 401 when no id is claimed or the id matches no profile.
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let id = claimed_user_id(parts, state).ok_or(AppError::Unauthorized)?;

        match state.gateway.get_profile(&id).await? {
            Some(profile) => Ok(profile.into()),
            None => {
                tracing::debug!("Identity header names unknown profile {}", id);
                Err(AppError::Unauthorized)
            }
        }
    }
}

/// Optional user extractor. Yields None instead of 401.
pub struct MaybeUser(pub Option<CurrentUser>);

impl MaybeUser {
    pub fn id(&self) -> Option<&str> {
        self.0.as_ref().map(|u| u.id.as_str())
    }
}

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match CurrentUser::from_request_parts(parts, state).await {
            Ok(user) => Ok(MaybeUser(Some(user))),
            Err(AppError::Unauthorized) => Ok(MaybeUser(None)),
            // Storage trouble is not the same as being signed out
            Err(e) => Err(e),
        }
    }
}
