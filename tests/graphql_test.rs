use std::sync::Arc;

use knit::db::{self, seed};
use knit::gateway::{DisabledGateway, SharedGateway, SqliteGateway};
use knit::graphql::{build_schema, Viewer};
use serde_json::Value;
use tempfile::TempDir;

fn setup() -> (TempDir, SharedGateway) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let db_pool = db::create_pool(&db_path).expect("Failed to create test database");
    db::run_migrations(&db_pool).expect("Failed to run migrations");
    seed::seed_demo(&db_pool).expect("Failed to seed demo data");
    (temp_dir, Arc::new(SqliteGateway::new(db_pool)))
}

async fn execute(gateway: &SharedGateway, viewer: Option<&str>, query: &str) -> async_graphql::Response {
    let schema = build_schema();
    let request = async_graphql::Request::new(query)
        .data(gateway.clone())
        .data(Viewer(viewer.map(str::to_string)));
    schema.execute(request).await
}

async fn data(gateway: &SharedGateway, viewer: Option<&str>, query: &str) -> Value {
    let result = execute(gateway, viewer, query).await;
    assert!(result.errors.is_empty(), "GraphQL errors: {:?}", result.errors);
    result.data.into_json().unwrap()
}

async fn error(gateway: &SharedGateway, viewer: Option<&str>, query: &str) -> String {
    let result = execute(gateway, viewer, query).await;
    assert!(!result.errors.is_empty(), "expected an error for {query}");
    result.errors[0].message.clone()
}

#[tokio::test]
async fn test_communities_query() {
    let (_tmp, gateway) = setup();

    let json = data(
        &gateway,
        None,
        "{ communities { id name featured memberCount postCount } }",
    )
    .await;
    let communities = json["communities"].as_array().unwrap();
    assert_eq!(communities.len(), 4);
    assert_eq!(communities[0]["featured"], true);

    let quiet = communities
        .iter()
        .find(|c| c["id"] == seed::QUIET_COMMUNITY)
        .unwrap();
    assert_eq!(quiet["memberCount"], 0);
    assert_eq!(quiet["postCount"], 0);
}

#[tokio::test]
async fn test_profile_query_hides_email() {
    let (_tmp, gateway) = setup();

    let query = format!(r#"{{ profile(id: "{}") {{ name initials role skills }} }}"#, seed::ALEX);
    let json = data(&gateway, None, &query).await;
    assert_eq!(json["profile"]["initials"], "AR");
    assert_eq!(json["profile"]["role"], "MENTOR");

    let query = format!(r#"{{ profile(id: "{}") {{ email }} }}"#, seed::ALEX);
    assert!(!execute(&gateway, None, &query).await.errors.is_empty());

    let json = data(&gateway, None, r#"{ profile(id: "nobody") { name } }"#).await;
    assert!(json["profile"].is_null());
}

#[tokio::test]
async fn test_events_report_status() {
    let (_tmp, gateway) = setup();

    let json = data(&gateway, Some(seed::SAM), "{ events { id status isFull viewerRsvp } }").await;
    let events = json["events"].as_array().unwrap();
    let find = |id: &str| events.iter().find(|e| e["id"] == id).unwrap().clone();

    assert_eq!(find(seed::LIVE_EVENT)["status"], "LIVE");
    assert_eq!(find(seed::LIVE_EVENT)["viewerRsvp"], "ATTENDING");
    assert_eq!(find(seed::SOON_EVENT)["status"], "STARTING_SOON");
    assert_eq!(find(seed::ENDED_EVENT)["status"], "ENDED");
    assert_eq!(find(seed::FULL_EVENT)["isFull"], true);
    assert!(find(seed::FULL_EVENT)["viewerRsvp"].is_null());
}

#[tokio::test]
async fn test_mutations_need_a_viewer() {
    let (_tmp, gateway) = setup();

    let mutation = format!(
        r#"mutation {{ joinCommunity(communityId: "{}") {{ isMember }} }}"#,
        seed::QUIET_COMMUNITY
    );
    assert_eq!(error(&gateway, None, &mutation).await, "Unauthorized");

    let query = format!(r#"{{ isMember(communityId: "{}") }}"#, seed::QUIET_COMMUNITY);
    assert_eq!(error(&gateway, None, &query).await, "Unauthorized");
}

#[tokio::test]
async fn test_join_community_mutation() {
    let (_tmp, gateway) = setup();

    let mutation = format!(
        r#"mutation {{ joinCommunity(communityId: "{}") {{ isMember memberCount }} }}"#,
        seed::QUIET_COMMUNITY
    );
    for _ in 0..2 {
        let json = data(&gateway, Some(seed::MORGAN), &mutation).await;
        assert_eq!(json["joinCommunity"]["isMember"], true);
        assert_eq!(json["joinCommunity"]["memberCount"], 1);
    }

    let query = format!(r#"{{ isMember(communityId: "{}") }}"#, seed::QUIET_COMMUNITY);
    let json = data(&gateway, Some(seed::MORGAN), &query).await;
    assert_eq!(json["isMember"], true);
}

#[tokio::test]
async fn test_create_post_mutation() {
    let (_tmp, gateway) = setup();

    let mutation = format!(
        r#"mutation {{
            createPost(input: {{ communityId: "{}", title: "Sharing my notes", content: "Slides attached", tags: ["notes"] }}) {{
                title tags likes author {{ name }}
            }}
        }}"#,
        seed::PYTHON_COMMUNITY
    );

    let message = error(&gateway, Some(seed::MORGAN), &mutation).await;
    assert_eq!(message, "Join the community before posting");

    let missing = r#"mutation { createPost(input: { communityId: "nowhere", title: "Hi", content: "x" }) { id } }"#;
    let message = error(&gateway, Some(seed::SAM), missing).await;
    assert_eq!(message, "Community nowhere not found");

    let json = data(&gateway, Some(seed::SAM), &mutation).await;
    assert_eq!(json["createPost"]["title"], "Sharing my notes");
    assert_eq!(json["createPost"]["tags"][0], "notes");
    assert_eq!(json["createPost"]["likes"], 0);
    assert_eq!(json["createPost"]["author"]["name"], "Sam Chen");

    let blank = format!(
        r#"mutation {{ createPost(input: {{ communityId: "{}", title: " ", content: "x" }}) {{ id }} }}"#,
        seed::PYTHON_COMMUNITY
    );
    assert_eq!(error(&gateway, Some(seed::SAM), &blank).await, "Please fill in the title");
}

#[tokio::test]
async fn test_rsvp_mutation_respects_capacity() {
    let (_tmp, gateway) = setup();

    let full = format!(
        r#"mutation {{ rsvp(eventId: "{}", status: ATTENDING) {{ attendeeCount }} }}"#,
        seed::FULL_EVENT
    );
    assert!(error(&gateway, Some(seed::SAM), &full).await.contains("full"));

    let open = format!(
        r#"mutation {{ rsvp(eventId: "{}", status: ATTENDING) {{ status attendeeCount }} }}"#,
        seed::UPCOMING_EVENT
    );
    let json = data(&gateway, Some(seed::SAM), &open).await;
    assert_eq!(json["rsvp"]["status"], "ATTENDING");
    assert_eq!(json["rsvp"]["attendeeCount"], 1);
}

#[tokio::test]
async fn test_connection_mutations() {
    let (_tmp, gateway) = setup();

    let send = format!(
        r#"mutation {{ sendConnectionRequest(toId: "{}") {{ id status message }} }}"#,
        seed::MORGAN
    );
    let json = data(&gateway, Some(seed::RIVER), &send).await;
    assert_eq!(json["sendConnectionRequest"]["status"], "PENDING");
    assert!(!json["sendConnectionRequest"]["message"]
        .as_str()
        .unwrap()
        .is_empty());
    let request_id = json["sendConnectionRequest"]["id"].as_str().unwrap().to_string();

    let respond = format!(
        r#"mutation {{ respondToConnection(requestId: "{request_id}", accept: true) {{ status }} }}"#
    );
    let json = data(&gateway, Some(seed::MORGAN), &respond).await;
    assert_eq!(json["respondToConnection"]["status"], "ACCEPTED");

    let to_self = format!(
        r#"mutation {{ sendConnectionRequest(toId: "{}") {{ id }} }}"#,
        seed::RIVER
    );
    assert!(!execute(&gateway, Some(seed::RIVER), &to_self).await.errors.is_empty());
}

#[tokio::test]
async fn test_comments_and_likes() {
    let (_tmp, gateway) = setup();

    let add = format!(
        r#"mutation {{ addComment(eventId: "{}", content: "See you there") {{ eventId postId content }} }}"#,
        seed::LIVE_EVENT
    );
    let json = data(&gateway, Some(seed::RIVER), &add).await;
    assert_eq!(json["addComment"]["eventId"], seed::LIVE_EVENT);
    assert!(json["addComment"]["postId"].is_null());

    let both = format!(
        r#"mutation {{ addComment(eventId: "{}", postId: "{}", content: "hi") {{ id }} }}"#,
        seed::LIVE_EVENT,
        seed::WELCOME_POST
    );
    assert!(!execute(&gateway, Some(seed::RIVER), &both).await.errors.is_empty());

    let query = format!(r#"{{ comments(eventId: "{}") {{ content }} }}"#, seed::LIVE_EVENT);
    let json = data(&gateway, None, &query).await;
    assert_eq!(json["comments"][0]["content"], "See you there");

    let like = format!(
        r#"mutation {{ togglePostLike(postId: "{}") {{ liked likes }} }}"#,
        seed::WELCOME_POST
    );
    let json = data(&gateway, Some(seed::SAM), &like).await;
    assert_eq!(json["togglePostLike"]["liked"], false);
    assert_eq!(json["togglePostLike"]["likes"], 0);
}

#[tokio::test]
async fn test_update_profile_mutation() {
    let (_tmp, gateway) = setup();

    let mutation = r#"mutation { updateProfile(input: { bio: "Now mentoring too", role: BOTH }) { bio role location } }"#;
    let json = data(&gateway, Some(seed::SAM), mutation).await;
    assert_eq!(json["updateProfile"]["bio"], "Now mentoring too");
    assert_eq!(json["updateProfile"]["role"], "BOTH");
    assert_eq!(json["updateProfile"]["location"], "Oakland, CA");
}

#[tokio::test]
async fn test_search_query() {
    let (_tmp, gateway) = setup();

    let json = data(
        &gateway,
        None,
        r#"{ search(query: "garden") { communities { name } people { name } } }"#,
    )
    .await;
    assert_eq!(json["search"]["communities"][0]["name"], "Bay Area Gardeners");
    assert_eq!(json["search"]["people"][0]["name"], "Jordan Lee");
}

#[tokio::test]
async fn test_disabled_gateway_reports_unconfigured() {
    let gateway: SharedGateway = Arc::new(DisabledGateway::new("no database"));

    let message = error(&gateway, None, "{ communities { id } }").await;
    assert!(message.contains("not configured"));
}
