use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use knit::config::Config;
use knit::db::{self, seed};
use knit::gateway::{DisabledGateway, SqliteGateway};
use knit::routes;
use knit::state::AppState;
use tempfile::TempDir;
use tower::ServiceExt;

const USER_HEADER: &str = "x-knit-user";

fn setup() -> (TempDir, Router) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let db_pool = db::create_pool(&db_path).expect("Failed to create test database");
    db::run_migrations(&db_pool).expect("Failed to run migrations");
    seed::seed_demo(&db_pool).expect("Failed to seed demo data");

    let state = AppState::new(Arc::new(SqliteGateway::new(db_pool)), Config::default());
    (temp_dir, routes::app(state))
}

fn disabled_app() -> Router {
    let gateway = Arc::new(DisabledGateway::new("no database configured"));
    routes::app(AppState::new(gateway, Config::default()))
}

async fn get(app: &Router, uri: &str, user: Option<&str>) -> Response {
    let mut request = Request::builder().uri(uri);
    if let Some(user) = user {
        request = request.header(USER_HEADER, user);
    }
    app.clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn post_form(app: &Router, uri: &str, user: Option<&str>, form: &str) -> Response {
    let mut request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(user) = user {
        request = request.header(USER_HEADER, user);
    }
    app.clone()
        .oneshot(request.body(Body::from(form.to_string())).unwrap())
        .await
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

#[tokio::test]
async fn home_page_shows_featured_communities() {
    let (_tmp, app) = setup();

    let response = get(&app, "/", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Python Learners"));
    assert!(html.contains("Bay Area Gardeners"));
}

#[tokio::test]
async fn empty_community_renders_zero_counts() {
    let (_tmp, app) = setup();

    let response = get(&app, &format!("/communities/{}", seed::QUIET_COMMUNITY), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains(r#"<span id="member-count">0</span>"#));
    assert!(html.contains(r#"<span id="post-count">0</span>"#));
    assert!(html.contains("No posts yet."));
}

#[tokio::test]
async fn unknown_pages_are_friendly_404s() {
    let (_tmp, app) = setup();

    let response = get(&app, "/communities/does-not-exist", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_text(response).await.contains("find that community"));

    let response = get(&app, "/events/does-not-exist", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get(&app, "/no/such/page", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn mutations_require_a_known_user() {
    let (_tmp, app) = setup();
    let uri = format!("/communities/{}/membership", seed::QUIET_COMMUNITY);

    let response = post_form(&app, &uri, None, "action=join").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = post_form(&app, &uri, Some("profile-nobody"), "action=join").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn joining_redirects_and_counts_once() {
    let (_tmp, app) = setup();
    let uri = format!("/communities/{}/membership", seed::QUIET_COMMUNITY);

    for _ in 0..2 {
        let response = post_form(&app, &uri, Some(seed::SAM), "action=join").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            location(&response),
            format!("/communities/{}", seed::QUIET_COMMUNITY)
        );
    }

    let page = get(
        &app,
        &format!("/communities/{}", seed::QUIET_COMMUNITY),
        Some(seed::SAM),
    )
    .await;
    let html = body_text(page).await;
    assert!(html.contains(r#"<span id="member-count">1</span>"#));
    assert!(html.contains("Leave community"));

    let response = post_form(&app, &uri, Some(seed::SAM), "action=dance").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn posting_is_validated_and_limited_to_members() {
    let (_tmp, app) = setup();
    let uri = format!("/communities/{}/posts", seed::PYTHON_COMMUNITY);

    let response = post_form(&app, &uri, Some(seed::ALEX), "title=+&content=Hello").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_form(&app, &uri, Some(seed::JORDAN), "title=Hi&content=Hello").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "Join the community before posting");

    let response = post_form(
        &app,
        &uri,
        Some(seed::ALEX),
        "title=Study+group&content=Thursdays+at+six&tags=meetup",
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let html = body_text(get(&app, &format!("/communities/{}", seed::PYTHON_COMMUNITY), None).await).await;
    assert!(html.contains("Study group"));
    assert!(html.contains(r#"<span id="post-count">3</span>"#));
}

#[tokio::test]
async fn full_event_rsvp_is_a_conflict() {
    let (_tmp, app) = setup();

    let response = post_form(
        &app,
        &format!("/events/{}/rsvp", seed::FULL_EVENT),
        Some(seed::SAM),
        "status=attending",
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = post_form(
        &app,
        &format!("/events/{}/rsvp", seed::SOON_EVENT),
        Some(seed::SAM),
        "status=attending",
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/events/{}", seed::SOON_EVENT));

    let response = post_form(
        &app,
        &format!("/events/{}/rsvp", seed::SOON_EVENT),
        Some(seed::SAM),
        "status=sometimes",
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn events_page_filters_by_type() {
    let (_tmp, app) = setup();

    let html = body_text(get(&app, "/events?type=live", None).await).await;
    assert!(html.contains("Python Office Hours"));
    assert!(!html.contains("Seed Swap"));

    let html = body_text(get(&app, "/events?type=workshop", None).await).await;
    assert!(html.contains("Mock Interview Night"));
    assert!(html.contains("Intro to Composting"));
    assert!(!html.contains("Python Office Hours"));

    let html = body_text(get(&app, "/events?q=seed", None).await).await;
    assert!(html.contains("Seed Swap"));
    assert!(!html.contains("Resume Roundtable"));
}

#[tokio::test]
async fn search_page_respects_tabs() {
    let (_tmp, app) = setup();

    let html = body_text(get(&app, "/search?q=garden&tab=communities", None).await).await;
    assert!(html.contains("Bay Area Gardeners"));
    assert!(!html.contains("Jordan Lee"));

    let html = body_text(get(&app, "/search?tab=mentors", None).await).await;
    assert!(html.contains("Morgan Patel"));
    assert!(html.contains("Jordan Lee"));
    assert!(!html.contains("Sam Chen"));
}

#[tokio::test]
async fn comments_redirect_back_to_their_page() {
    let (_tmp, app) = setup();

    let response = post_form(
        &app,
        &format!("/posts/{}/comments", seed::WELCOME_POST),
        Some(seed::RIVER),
        "content=Glad+to+be+here",
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/posts/{}", seed::WELCOME_POST));

    let html = body_text(get(&app, &format!("/posts/{}", seed::WELCOME_POST), None).await).await;
    assert!(html.contains("Glad to be here"));

    let response = post_form(
        &app,
        &format!("/posts/{}/comments", seed::WELCOME_POST),
        Some(seed::RIVER),
        "content=++",
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn only_the_owner_can_edit_a_profile() {
    let (_tmp, app) = setup();
    let uri = format!("/profiles/{}", seed::SAM);

    let response = post_form(&app, &uri, Some(seed::ALEX), "name=Hacker").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = post_form(&app, &uri, Some(seed::SAM), "name=Sam+C.&skills=Rust").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let html = body_text(get(&app, &uri, None).await).await;
    assert!(html.contains("Sam C."));
    assert!(html.contains("Oakland, CA"));
}

#[tokio::test]
async fn static_assets_are_served() {
    let (_tmp, app) = setup();

    let response = get(&app, "/assets/css/app.css", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/css"
    );
}

#[tokio::test]
async fn graphql_endpoint_answers_queries() {
    let (_tmp, app) = setup();

    let request = Request::builder()
        .method("POST")
        .uri("/graphql")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::json!({ "query": "{ communities { name memberCount } }" }).to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["data"]["communities"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn disabled_storage_returns_503() {
    let app = disabled_app();

    for uri in ["/", "/communities", "/communities/x", "/events", "/search?q=py"] {
        let response = get(&app, uri, None).await;
        assert_eq!(
            response.status(),
            StatusCode::SERVICE_UNAVAILABLE,
            "{uri} should be unavailable"
        );
        assert_eq!(body_text(response).await, "Something went wrong, please try again");
    }

    // A claimed user cannot be looked up either
    let response = get(&app, "/events", Some(seed::SAM)).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    // Assets do not touch storage
    let response = get(&app, "/assets/css/app.css", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}
