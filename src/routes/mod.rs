pub mod assets;
pub mod communities;
pub mod events;
pub mod graphql;
pub mod home;
pub mod posts;
pub mod profiles;
pub mod search;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Every page, form target and API route
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home::index))
        .route("/assets/{*path}", get(assets::serve))
        .merge(communities::router())
        .merge(posts::router())
        .merge(events::router())
        .merge(search::router())
        .merge(profiles::router())
        .merge(graphql::router())
        .fallback(home::fallback)
}

/// The complete application, ready to serve
pub fn app(state: AppState) -> Router {
    router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
