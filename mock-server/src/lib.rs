use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub user_name: String,
    #[serde(default)]
    pub emails: Vec<String>,
    pub active: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    pub user_name: String,
    #[serde(default)]
    pub emails: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceUser {
    pub user_name: Option<String>,
    pub emails: Option<Vec<String>>,
    pub active: Option<bool>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Member {
    pub value: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub members: Vec<Member>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroup {
    pub display_name: String,
    #[serde(default)]
    pub members: Vec<Member>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    pub total_results: usize,
    #[serde(rename = "Resources")]
    pub resources: Vec<T>,
}

impl<T> From<Vec<T>> for ListResponse<T> {
    fn from(resources: Vec<T>) -> Self {
        Self {
            total_results: resources.len(),
            resources,
        }
    }
}

#[derive(Default)]
pub struct Directory {
    users: HashMap<String, User>,
    groups: HashMap<String, Group>,
}

pub type Db = Arc<RwLock<Directory>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Directory::default()));
    Router::new()
        .route("/scim2/Users", get(list_users).post(create_user))
        .route(
            "/scim2/Users/{id}",
            get(get_user).put(replace_user).delete(delete_user),
        )
        .route("/scim2/Groups", get(list_groups).post(create_group))
        .route("/scim2/Groups/{id}", get(get_group).delete(delete_group))
        .layer(middleware::from_fn(require_authorization))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Any credential is accepted; a missing one is rejected like the real
/// server does for unauthenticated SCIM calls.
async fn require_authorization(request: Request, next: Next) -> Result<Response, StatusCode> {
    if request.headers().contains_key(header::AUTHORIZATION) {
        Ok(next.run(request).await)
    } else {
        log::debug!("rejecting unauthenticated {} {}", request.method(), request.uri());
        Err(StatusCode::UNAUTHORIZED)
    }
}

async fn list_users(State(db): State<Db>) -> Json<ListResponse<User>> {
    let dir = db.read().await;
    Json(dir.users.values().cloned().collect::<Vec<_>>().into())
}

async fn create_user(
    State(db): State<Db>,
    Json(input): Json<CreateUser>,
) -> Result<(StatusCode, Json<User>), StatusCode> {
    let mut dir = db.write().await;
    if dir.users.values().any(|u| u.user_name == input.user_name) {
        return Err(StatusCode::CONFLICT);
    }
    let user = User {
        id: Uuid::new_v4().to_string(),
        user_name: input.user_name,
        emails: input.emails,
        active: true,
    };
    dir.users.insert(user.id.clone(), user.clone());
    Ok((StatusCode::CREATED, Json(user)))
}

async fn get_user(State(db): State<Db>, Path(id): Path<String>) -> Result<Json<User>, StatusCode> {
    let dir = db.read().await;
    dir.users.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn replace_user(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(input): Json<ReplaceUser>,
) -> Result<Json<User>, StatusCode> {
    let mut dir = db.write().await;
    let user = dir.users.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    if let Some(user_name) = input.user_name {
        user.user_name = user_name;
    }
    if let Some(emails) = input.emails {
        user.emails = emails;
    }
    if let Some(active) = input.active {
        user.active = active;
    }
    Ok(Json(user.clone()))
}

async fn delete_user(State(db): State<Db>, Path(id): Path<String>) -> StatusCode {
    let mut dir = db.write().await;
    if dir.users.remove(&id).is_none() {
        return StatusCode::NOT_FOUND;
    }
    for group in dir.groups.values_mut() {
        group.members.retain(|m| m.value != id);
    }
    StatusCode::NO_CONTENT
}

async fn list_groups(State(db): State<Db>) -> Json<ListResponse<Group>> {
    let dir = db.read().await;
    Json(dir.groups.values().cloned().collect::<Vec<_>>().into())
}

async fn create_group(
    State(db): State<Db>,
    Json(input): Json<CreateGroup>,
) -> Result<(StatusCode, Json<Group>), StatusCode> {
    let mut dir = db.write().await;
    if input.members.iter().any(|m| !dir.users.contains_key(&m.value)) {
        return Err(StatusCode::BAD_REQUEST);
    }
    let group = Group {
        id: Uuid::new_v4().to_string(),
        display_name: input.display_name,
        members: input.members,
    };
    dir.groups.insert(group.id.clone(), group.clone());
    Ok((StatusCode::CREATED, Json(group)))
}

async fn get_group(State(db): State<Db>, Path(id): Path<String>) -> Result<Json<Group>, StatusCode> {
    let dir = db.read().await;
    dir.groups.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn delete_group(State(db): State<Db>, Path(id): Path<String>) -> StatusCode {
    let mut dir = db.write().await;
    match dir.groups.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}
