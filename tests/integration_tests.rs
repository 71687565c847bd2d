// Integration tests for Workmatch: full HTTP app over the in-memory store

use actix_web::{http::StatusCode, test, App};
use chrono::Duration;
use serde_json::{json, Value};
use std::sync::Arc;

use workmatch::auth::JwtVerifier;
use workmatch::models::{Gender, NewUser, UserId};
use workmatch::routes::{self, AppState};
use workmatch::services::{MemoryStore, Store};

const SECRET: &str = "integration-secret";

fn new_user(username: &str, gender: Gender, department: &str, interests: Vec<Gender>) -> NewUser {
    NewUser {
        username: username.to_string(),
        email: format!("{}@example.com", username),
        password_hash: format!("$argon2id$v=19$hash-of-{}", username),
        first_name: username.to_string(),
        last_name: "Tester".to_string(),
        birth_date: None,
        department: Some(department.to_string()),
        job_title: Some("Engineer".to_string()),
        gender,
        interested_in_genders: interests,
    }
}

struct Fixture {
    state: AppState,
    store: Arc<dyn Store>,
    verifier: JwtVerifier,
    users: Vec<UserId>,
}

impl Fixture {
    async fn new() -> Self {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let mut users = Vec::new();
        for (name, gender, dept) in [
            ("alice", Gender::Female, "Engineering"),
            ("bob", Gender::Male, "Engineering"),
            ("carol", Gender::Female, "Engineering"),
            ("dave", Gender::Male, "Marketing"),
        ] {
            let user = store
                .create_user(new_user(name, gender, dept, vec![Gender::Male, Gender::Female]))
                .await
                .unwrap();
            users.push(user.id);
        }

        let verifier = JwtVerifier::new(SECRET, None, 0);
        let state = AppState::new(store.clone(), JwtVerifier::new(SECRET, None, 0));

        Self { state, store, verifier, users }
    }

    fn token(&self, user_id: UserId) -> String {
        format!("Bearer {}", self.verifier.issue(user_id, Duration::minutes(10)).unwrap())
    }
}

fn assert_no_credentials(value: &Value) {
    let text = value.to_string();
    assert!(!text.contains("password"), "credential leaked: {}", text);
    assert!(!text.contains("argon2"), "credential leaked: {}", text);
}

macro_rules! app {
    ($fixture:expr) => {
        test::init_service(App::new().configure(routes::configure_app($fixture.state.clone()))).await
    };
}

#[actix_web::test]
async fn test_health_requires_no_auth() {
    let fixture = Fixture::new().await;
    let app = app!(fixture);

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "UP");
    assert_eq!(body["service"], "Workmatch API");
    assert!(body["version"].is_string());
}

#[actix_web::test]
async fn test_missing_or_bad_token_is_unauthorized() {
    let fixture = Fixture::new().await;
    let app = app!(fixture);

    let req = test::TestRequest::get().uri("/api/users/profile").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/users/profile")
        .insert_header(("Authorization", "Bearer not-a-token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_like_then_like_back_is_a_match() {
    let fixture = Fixture::new().await;
    let app = app!(fixture);
    let (alice, bob) = (fixture.users[0], fixture.users[1]);

    let req = test::TestRequest::post()
        .uri(&format!("/api/matches/like/{}", bob))
        .insert_header(("Authorization", fixture.token(alice)))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({ "message": "Like sent successfully", "isMatch": false }));

    // Bob sees the incoming like
    let req = test::TestRequest::get()
        .uri("/api/matches/pending")
        .insert_header(("Authorization", fixture.token(bob)))
        .to_request();
    let pending: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(pending.as_array().unwrap().len(), 1);
    assert_eq!(pending[0]["user1"]["id"], alice);
    assert_eq!(pending[0]["status"], "PENDING");
    assert_no_credentials(&pending);

    let req = test::TestRequest::post()
        .uri(&format!("/api/matches/like/{}", alice))
        .insert_header(("Authorization", fixture.token(bob)))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({ "message": "It's a match!", "isMatch": true }));

    for (viewer, other) in [(alice, bob), (bob, alice)] {
        let req = test::TestRequest::get()
            .uri("/api/matches/my-matches")
            .insert_header(("Authorization", fixture.token(viewer)))
            .to_request();
        let matches: Value = test::call_and_read_body_json(&app, req).await;
        let matches = matches.as_array().unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0]["status"], "MATCHED");
        assert!(matches[0]["matchedAt"].is_string());
        let ids = [matches[0]["user1"]["id"].as_i64(), matches[0]["user2"]["id"].as_i64()];
        assert!(ids.contains(&Some(other)));
        assert_no_credentials(&Value::Array(matches.clone()));
    }

    // Exactly one record for the pair
    let record = fixture.store.find_match_between(bob, alice).await.unwrap().unwrap();
    assert_eq!(record.initiator_id, alice);
    assert!(fixture.store.find_pending_for_recipient(bob).await.unwrap().is_empty());
}

#[actix_web::test]
async fn test_like_errors() {
    let fixture = Fixture::new().await;
    let app = app!(fixture);
    let (alice, bob) = (fixture.users[0], fixture.users[1]);

    // Self-like
    let req = test::TestRequest::post()
        .uri(&format!("/api/matches/like/{}", alice))
        .insert_header(("Authorization", fixture.token(alice)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_operation");

    // Unknown target
    let req = test::TestRequest::post()
        .uri("/api/matches/like/9999")
        .insert_header(("Authorization", fixture.token(alice)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // Duplicate like
    for expected in [StatusCode::OK, StatusCode::BAD_REQUEST] {
        let req = test::TestRequest::post()
            .uri(&format!("/api/matches/like/{}", bob))
            .insert_header(("Authorization", fixture.token(alice)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), expected);
        if expected == StatusCode::BAD_REQUEST {
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["error"], "conflict");
            assert_eq!(body["message"], "Already liked this user");
        }
    }

    // Non-numeric id
    let req = test::TestRequest::post()
        .uri("/api/matches/like/bob")
        .insert_header(("Authorization", fixture.token(alice)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_reject_is_always_ok() {
    let fixture = Fixture::new().await;
    let app = app!(fixture);
    let (alice, bob) = (fixture.users[0], fixture.users[1]);

    // Nothing to reject
    let req = test::TestRequest::post()
        .uri(&format!("/api/matches/reject/{}", bob))
        .insert_header(("Authorization", fixture.token(alice)))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({ "message": "User rejected", "isMatch": false }));
    assert!(fixture.store.find_match_between(alice, bob).await.unwrap().is_none());

    // Bob declines Alice's like
    fixture.state.engine.like(alice, bob).await.unwrap();
    let req = test::TestRequest::post()
        .uri(&format!("/api/matches/reject/{}", alice))
        .insert_header(("Authorization", fixture.token(bob)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let record = fixture.store.find_match_between(alice, bob).await.unwrap().unwrap();
    assert_eq!(record.status, workmatch::MatchStatus::Rejected);

    // A declined like cannot be revived
    let req = test::TestRequest::post()
        .uri(&format!("/api/matches/like/{}", alice))
        .insert_header(("Authorization", fixture.token(bob)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_unmatched_user_cannot_send() {
    let fixture = Fixture::new().await;
    let app = app!(fixture);
    let (alice, carol) = (fixture.users[0], fixture.users[2]);

    let req = test::TestRequest::post()
        .uri("/api/messages/send")
        .insert_header(("Authorization", fixture.token(carol)))
        .set_json(json!({ "recipientId": alice, "content": "hello" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "You can only message matched users");

    assert!(fixture.store.find_messages_between(alice, carol).await.unwrap().is_empty());

    // Unknown recipient
    let req = test::TestRequest::post()
        .uri("/api/messages/send")
        .insert_header(("Authorization", fixture.token(carol)))
        .set_json(json!({ "recipientId": 4242, "content": "hello" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // Conversation is refused too
    let req = test::TestRequest::get()
        .uri(&format!("/api/messages/conversation/{}", alice))
        .insert_header(("Authorization", fixture.token(carol)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_conversation_marks_inbound_messages_read() {
    let fixture = Fixture::new().await;
    let app = app!(fixture);
    let (alice, bob) = (fixture.users[0], fixture.users[1]);

    fixture.state.engine.like(alice, bob).await.unwrap();
    fixture.state.engine.like(bob, alice).await.unwrap();

    for (from, to, text) in [(bob, alice, "hi alice"), (alice, bob, "hi bob"), (bob, alice, "lunch?")] {
        let req = test::TestRequest::post()
            .uri("/api/messages/send")
            .insert_header(("Authorization", fixture.token(from)))
            .set_json(json!({ "recipientId": to, "content": text }))
            .to_request();
        let sent: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(sent["content"], text);
        assert!(sent["readAt"].is_null());
        assert_no_credentials(&sent);
    }

    let req = test::TestRequest::get()
        .uri("/api/messages/unread")
        .insert_header(("Authorization", fixture.token(alice)))
        .to_request();
    let unread: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(unread.as_array().unwrap().len(), 2);
    assert_no_credentials(&unread);

    let req = test::TestRequest::get()
        .uri(&format!("/api/messages/conversation/{}", bob))
        .insert_header(("Authorization", fixture.token(alice)))
        .to_request();
    let conversation: Value = test::call_and_read_body_json(&app, req).await;
    let conversation = conversation.as_array().unwrap();
    assert_eq!(conversation.len(), 3);

    let contents: Vec<&str> = conversation.iter().map(|m| m["content"].as_str().unwrap()).collect();
    assert_eq!(contents, ["hi alice", "hi bob", "lunch?"]);

    let sent_at: Vec<&str> = conversation.iter().map(|m| m["sentAt"].as_str().unwrap()).collect();
    let parsed: Vec<chrono::DateTime<chrono::Utc>> = sent_at.iter().map(|s| s.parse().unwrap()).collect();
    assert!(parsed.windows(2).all(|w| w[0] <= w[1]));

    // Alice's inbound messages come back stamped, her own stays unread
    assert!(conversation[0]["readAt"].is_string());
    assert!(conversation[1]["readAt"].is_null());
    assert!(conversation[2]["readAt"].is_string());

    assert!(fixture.store.find_unread_for(alice).await.unwrap().is_empty());
    assert_eq!(fixture.store.find_unread_for(bob).await.unwrap().len(), 1);
}

#[actix_web::test]
async fn test_profile_read_and_update() {
    let fixture = Fixture::new().await;
    let app = app!(fixture);
    let alice = fixture.users[0];

    let req = test::TestRequest::get()
        .uri("/api/users/profile")
        .insert_header(("Authorization", fixture.token(alice)))
        .to_request();
    let profile: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(profile["username"], "alice");
    assert_eq!(profile["department"], "Engineering");
    assert_no_credentials(&profile);

    let req = test::TestRequest::put()
        .uri("/api/users/profile")
        .insert_header(("Authorization", fixture.token(alice)))
        .set_json(json!({
            "firstName": "Alice",
            "lastName": "Liddell",
            "bio": "Tea enthusiast",
            "department": "Marketing",
            "interestedInGenders": ["MALE"]
        }))
        .to_request();
    let updated: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(updated["firstName"], "Alice");
    assert_eq!(updated["department"], "Marketing");
    assert_eq!(updated["interestedInGenders"], json!(["MALE"]));
    assert!(updated["jobTitle"].is_null());
    assert_no_credentials(&updated);

    let req = test::TestRequest::put()
        .uri("/api/users/profile")
        .insert_header(("Authorization", fixture.token(alice)))
        .set_json(json!({ "firstName": "", "lastName": "Liddell" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Principal that no longer resolves
    let req = test::TestRequest::get()
        .uri("/api/users/profile")
        .insert_header(("Authorization", fixture.token(777)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_potential_matches_filter_by_department_and_interest() {
    let fixture = Fixture::new().await;
    let app = app!(fixture);
    let (alice, bob, carol) = (fixture.users[0], fixture.users[1], fixture.users[2]);

    // Same department, but only interested in OTHER
    let erin = fixture
        .store
        .create_user(new_user("erin", Gender::Female, "Engineering", vec![Gender::Other]))
        .await
        .unwrap();
    // Same department, no interests at all
    let frank = fixture
        .store
        .create_user(new_user("frank", Gender::Male, "Engineering", vec![]))
        .await
        .unwrap();

    // Already-liked users are still listed
    fixture.state.engine.like(alice, bob).await.unwrap();

    let req = test::TestRequest::get()
        .uri("/api/users/matches")
        .insert_header(("Authorization", fixture.token(alice)))
        .to_request();
    let users: Value = test::call_and_read_body_json(&app, req).await;
    let ids: Vec<i64> = users
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["id"].as_i64().unwrap())
        .collect();

    // Dave is in Marketing, Erin and Frank share no interest, Alice herself is excluded
    assert_eq!(ids, vec![bob, carol]);
    assert_no_credentials(&users);

    // Erin only sees colleagues interested in OTHER
    let req = test::TestRequest::get()
        .uri("/api/users/matches")
        .insert_header(("Authorization", fixture.token(erin.id)))
        .to_request();
    let users: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(users, json!([]));

    // An empty interest set finds nobody
    let req = test::TestRequest::get()
        .uri("/api/users/matches")
        .insert_header(("Authorization", fixture.token(frank.id)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let users: Value = test::read_body_json(resp).await;
    assert_eq!(users, json!([]));

    let req = test::TestRequest::get()
        .uri("/api/users/matches")
        .insert_header(("Authorization", fixture.token(404)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_malformed_json_is_bad_request() {
    let fixture = Fixture::new().await;
    let app = app!(fixture);

    let req = test::TestRequest::post()
        .uri("/api/messages/send")
        .insert_header(("Authorization", fixture.token(fixture.users[0])))
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{ not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "validation_failed");
}
