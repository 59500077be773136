use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Group, ListResponse, User};
use tower::ServiceExt;

const TOKEN: &str = "Bearer test-token";

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, TOKEN)
        .body(String::new())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, TOKEN)
        .header(http::header::CONTENT_TYPE, "application/scim+json")
        .body(body.to_string())
        .unwrap()
}

// --- auth ---

#[tokio::test]
async fn missing_authorization_returns_401() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/scim2/Users")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- users ---

#[tokio::test]
async fn list_users_empty() {
    let resp = app().oneshot(request("GET", "/scim2/Users")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let list: ListResponse<User> = body_json(resp).await;
    assert_eq!(list.total_results, 0);
    assert!(list.resources.is_empty());
}

#[tokio::test]
async fn create_user_returns_201() {
    let resp = app()
        .oneshot(json_request("POST", "/scim2/Users", r#"{"userName":"alice"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let user: User = body_json(resp).await;
    assert_eq!(user.user_name, "alice");
    assert!(user.active);
}

#[tokio::test]
async fn create_user_malformed_json_returns_422() {
    let resp = app()
        .oneshot(json_request("POST", "/scim2/Users", r#"{"name":1}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn get_user_not_found() {
    let resp = app()
        .oneshot(request("GET", "/scim2/Users/missing"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn group_with_unknown_member_returns_400() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/scim2/Groups",
            r#"{"displayName":"admins","members":[{"value":"nobody"}]}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- full lifecycle ---

#[tokio::test]
async fn user_and_group_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    // create user
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("POST", "/scim2/Users", r#"{"userName":"carol"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let user: User = body_json(resp).await;
    let user_id = user.id.clone();

    // duplicate user name
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("POST", "/scim2/Users", r#"{"userName":"carol"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // deactivate
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "PUT",
            &format!("/scim2/Users/{user_id}"),
            r#"{"active":false}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: User = body_json(resp).await;
    assert_eq!(updated.user_name, "carol"); // unchanged
    assert!(!updated.active);

    // group with that member
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/scim2/Groups",
            &format!(r#"{{"displayName":"ops","members":[{{"value":"{user_id}"}}]}}"#),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let group: Group = body_json(resp).await;
    assert_eq!(group.members.len(), 1);

    // deleting the user drops the membership
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request("DELETE", &format!("/scim2/Users/{user_id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request("GET", &format!("/scim2/Groups/{}", group.id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let group: Group = body_json(resp).await;
    assert!(group.members.is_empty());

    // delete group, then it is gone
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request("DELETE", &format!("/scim2/Groups/{}", group.id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request("GET", "/scim2/Groups"))
        .await
        .unwrap();
    let list: ListResponse<Group> = body_json(resp).await;
    assert_eq!(list.total_results, 0);
}
