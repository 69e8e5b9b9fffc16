use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use tower::ServiceExt;

use parley_api::auth::{AppState, AppStateInner};
use parley_db::Database;

fn app() -> Router {
    let db = Database::open_in_memory().unwrap();
    let state: AppState = Arc::new(AppStateInner { db });
    parley_api::router(state)
}

async fn get(app: &Router, path: &str, cookie: Option<&str>) -> axum::response::Response {
    let mut builder = Request::builder().uri(path);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn post_form(
    app: &Router,
    path: &str,
    form: &str,
    cookie: Option<&str>,
) -> axum::response::Response {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(builder.body(Body::from(form.to_string())).unwrap())
        .await
        .unwrap()
}

async fn body_text(resp: axum::response::Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(resp: &axum::response::Response) -> String {
    resp.headers()
        .get(header::LOCATION)
        .expect("redirect should carry a Location header")
        .to_str()
        .unwrap()
        .to_string()
}

async fn register(app: &Router, username: &str, password: &str) {
    let form = format!(
        "first_name=Test&last_name=User&email={u}%40example.com&username={u}&password={p}",
        u = username,
        p = password
    );
    let resp = post_form(app, "/account", &form, None).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");
}

/// Log in and return (session cookie, user id).
async fn login(app: &Router, username: &str, password: &str) -> (String, i64) {
    let form = format!("username={}&password={}", username, password);
    let resp = post_form(app, "/login", &form, None).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .expect("login should set the session cookie")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();
    let user_id = location(&resp)
        .strip_prefix("/user/")
        .expect("login should redirect to the profile")
        .parse()
        .unwrap();
    (cookie, user_id)
}

async fn create_party(app: &Router, cookie: &str, name: &str) -> i64 {
    let form = format!("name={}&description=", name);
    let resp = post_form(app, "/party", &form, Some(cookie)).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    location(&resp)
        .strip_prefix("/party/")
        .unwrap()
        .parse()
        .unwrap()
}

#[tokio::test]
async fn register_login_logout_round_trip() {
    let app = app();
    register(&app, "alice", "pw1").await;
    let (cookie, user_id) = login(&app, "alice", "pw1").await;
    assert!(user_id > 0);

    let home = body_text(get(&app, "/", Some(&cookie)).await).await;
    assert!(home.contains("alice"));
    assert!(home.contains("Log out"));

    let resp = get(&app, "/logout", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");

    // the session row is gone even if the client replays the old cookie
    let home = body_text(get(&app, "/", Some(&cookie)).await).await;
    assert!(home.contains("Log in"));
    assert!(!home.contains("Log out"));
}

#[tokio::test]
async fn bad_credentials_are_indistinguishable() {
    let app = app();
    register(&app, "alice", "pw1").await;

    let wrong_password = post_form(&app, "/login", "username=alice&password=nope", None).await;
    let unknown_user = post_form(&app, "/login", "username=mallory&password=nope", None).await;

    for resp in [&wrong_password, &unknown_user] {
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(resp), "/login?invalid");
        assert!(resp.headers().get(header::SET_COOKIE).is_none());
    }
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = app();
    register(&app, "alice", "pw1").await;

    let form = "first_name=Other&last_name=User&email=other%40example.com&username=alice&password=pw2";
    let resp = post_form(&app, "/account", form, None).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn blank_registration_fields_rejected() {
    let app = app();
    let form = "first_name=&last_name=User&email=a%40example.com&username=a&password=pw";
    let resp = post_form(&app, "/account", form, None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn anonymous_writes_redirect_to_login() {
    let app = app();

    let create = post_form(&app, "/party", "name=Book+Club&description=", None).await;
    let post = post_form(&app, "/party/1", "body=hello", None).await;
    let subscribe = post_form(&app, "/subscribe/1", "", None).await;

    for resp in [&create, &post, &subscribe] {
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(resp), "/login?invalid");
    }
}

#[tokio::test]
async fn book_club_scenario() {
    let app = app();
    register(&app, "alice", "pw1").await;
    let (cookie, _) = login(&app, "alice", "pw1").await;

    let party_id = create_party(&app, &cookie, "Book+Club").await;

    let resp = post_form(
        &app,
        &format!("/party/{}", party_id),
        "body=hello",
        Some(&cookie),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), format!("/party/{}", party_id));

    let page = body_text(get(&app, &format!("/party/{}", party_id), Some(&cookie)).await).await;
    assert!(page.contains("Book Club"));
    assert!(page.contains("hello"));
    assert!(page.contains("alice"));

    // polling API: everything newer than id 0 is exactly our one message
    let resp = get(&app, &format!("/api/party/{}/0", party_id), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(resp).await).unwrap();
    let list = json.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["body"], "hello");
    assert_eq!(list[0]["username"], "alice");

    // nothing newer than the message itself
    let last_id = list[0]["id"].as_i64().unwrap();
    let resp = get(&app, &format!("/api/party/{}/{}", party_id, last_id), None).await;
    let json: serde_json::Value = serde_json::from_str(&body_text(resp).await).unwrap();
    assert!(json.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn missing_party_renders_not_found_with_ok_status() {
    let app = app();
    let resp = get(&app, "/party/9999", None).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let page = body_text(resp).await;
    assert!(page.contains("Not found"));
    assert!(!page.contains("Messages"));
}

#[tokio::test]
async fn missing_user_renders_not_found() {
    let app = app();
    let resp = get(&app, "/user/9999", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("Not found"));
}

#[tokio::test]
async fn sub_party_creation_subscribes_creator_to_child() {
    let app = app();
    register(&app, "alice", "pw1").await;
    let (cookie, user_id) = login(&app, "alice", "pw1").await;

    let parent_id = create_party(&app, &cookie, "Parent+Party").await;

    let resp = post_form(
        &app,
        &format!("/party/{}/new", parent_id),
        "name=Reading+Nook&description=",
        Some(&cookie),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), format!("/party/{}", parent_id));

    // the child shows up under its parent
    let page = body_text(get(&app, &format!("/party/{}", parent_id), Some(&cookie)).await).await;
    assert!(page.contains("Reading Nook"));

    // and the creator is subscribed to the child, not the parent
    let profile = body_text(get(&app, &format!("/user/{}", user_id), Some(&cookie)).await).await;
    assert!(profile.contains("Reading Nook"));
    assert!(!profile.contains("Parent Party"));
}

#[tokio::test]
async fn search_covers_parties_and_messages() {
    let app = app();
    register(&app, "alice", "pw1").await;
    let (cookie, _) = login(&app, "alice", "pw1").await;

    let party_id = create_party(&app, &cookie, "Book+Club").await;
    post_form(
        &app,
        &format!("/party/{}", party_id),
        "body=hello+there",
        Some(&cookie),
    )
    .await;

    // case-insensitive party match
    let page = body_text(get(&app, "/search?query=book+club", None).await).await;
    assert!(page.contains("Book Club"));

    let page = body_text(get(&app, "/search?query=hello", None).await).await;
    assert!(page.contains("hello there"));

    // no matches leaves the message list empty
    let page = body_text(get(&app, "/search?query=xyzzy", None).await).await;
    assert!(!page.contains("hello there"));
}

#[tokio::test]
async fn stored_markup_is_escaped_at_render_time() {
    let app = app();
    register(&app, "alice", "pw1").await;
    let (cookie, _) = login(&app, "alice", "pw1").await;

    let party_id = create_party(&app, &cookie, "Plain").await;
    post_form(
        &app,
        &format!("/party/{}", party_id),
        "body=%3Cscript%3Ealert(1)%3C%2Fscript%3E",
        Some(&cookie),
    )
    .await;

    let page = body_text(get(&app, &format!("/party/{}", party_id), None).await).await;
    assert!(page.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    assert!(!page.contains("<script>alert(1)</script>"));
}

#[tokio::test]
async fn repeat_subscribe_is_a_noop() {
    let app = app();
    register(&app, "alice", "pw1").await;
    register(&app, "bob", "pw2").await;
    let (alice, _) = login(&app, "alice", "pw1").await;
    let (bob, _) = login(&app, "bob", "pw2").await;

    let party_id = create_party(&app, &alice, "Book+Club").await;

    for _ in 0..2 {
        let resp = post_form(&app, &format!("/subscribe/{}", party_id), "", Some(&bob)).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    }

    // the search view exposes the subscriber count
    let page = body_text(get(&app, "/search?query=Book", None).await).await;
    assert!(page.contains("(1 subscribers)"));
}
