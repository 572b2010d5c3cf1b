use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::api::middleware::validation::{ValidatedJson, ValidatedQuery};
use crate::api::openapi::StandardErrorResponses;
use crate::application::dto::{
    ApiResponse, CursorPaginatedResponse, CursorPaginationQuery, PaginatedResponse,
    PaginationQuery,
};
use crate::domain::error_response::timestamp_now;
use crate::domain::{Exception, HttpException};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    /// Display name
    #[validate(length(min = 1, max = 100, message = "name must be between 1 and 100 characters"))]
    pub name: String,
    #[validate(email(message = "email must be a valid email"))]
    pub email: String,
}

/// In-memory user store backing the demo endpoints
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    users: Arc<DashMap<u64, UserDto>>,
    next_id: Arc<AtomicU64>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, request: CreateUserRequest) -> Result<UserDto, HttpException> {
        let email = request.email.to_lowercase();
        if self.users.iter().any(|user| user.email == email) {
            return Err(HttpException::conflict(format!(
                "A user with email {email} already exists"
            )));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let user = UserDto {
            id,
            name: request.name,
            email,
            created_at: timestamp_now(),
        };
        self.users.insert(id, user.clone());
        Ok(user)
    }

    pub fn get(&self, id: u64) -> Option<UserDto> {
        self.users.get(&id).map(|user| user.value().clone())
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Users ordered by id
    fn sorted(&self) -> Vec<UserDto> {
        let mut users: Vec<UserDto> = self.users.iter().map(|user| user.value().clone()).collect();
        users.sort_by_key(|user| user.id);
        users
    }

    pub fn page(&self, offset: u64, limit: u32) -> (Vec<UserDto>, u64) {
        let users = self.sorted();
        let total = users.len() as u64;
        let page = users
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        (page, total)
    }

    /// Up to `count` users with an id greater than `after`
    pub fn after(&self, after: u64, count: usize) -> Vec<UserDto> {
        self.sorted()
            .into_iter()
            .filter(|user| user.id > after)
            .take(count)
            .collect()
    }
}

/// POST /v1/users
#[utoipa::path(
    post,
    path = "/v1/users",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = ApiResponse<UserDto>),
        (status = 409, description = "Email already registered", body = crate::domain::ErrorResponse),
        StandardErrorResponses
    )
)]
pub async fn create_user_handler(
    State(directory): State<UserDirectory>,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserDto>>), Exception> {
    let user = directory.create(request)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(user).with_message("User created")),
    ))
}

/// GET /v1/users/{id}
#[utoipa::path(
    get,
    path = "/v1/users/{id}",
    tag = "users",
    params(("id" = u64, Path, description = "User id")),
    responses(
        (status = 200, description = "User found", body = ApiResponse<UserDto>),
        StandardErrorResponses
    )
)]
pub async fn get_user_handler(
    State(directory): State<UserDirectory>,
    Path(id): Path<u64>,
) -> Result<Json<ApiResponse<UserDto>>, Exception> {
    directory
        .get(id)
        .map(|user| Json(ApiResponse::ok(user)))
        .ok_or_else(|| HttpException::not_found(format!("User {id} not found")).into())
}

/// GET /v1/users
#[utoipa::path(
    get,
    path = "/v1/users",
    tag = "users",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Page of users", body = PaginatedResponse<UserDto>),
        StandardErrorResponses
    )
)]
pub async fn list_users_handler(
    State(directory): State<UserDirectory>,
    ValidatedQuery(query): ValidatedQuery<PaginationQuery>,
) -> Json<PaginatedResponse<UserDto>> {
    let (users, total) = directory.page(query.offset(), query.limit);
    Json(PaginatedResponse::new(users, total, &query))
}

/// GET /v1/users/cursor
#[utoipa::path(
    get,
    path = "/v1/users/cursor",
    tag = "users",
    params(CursorPaginationQuery),
    responses(
        (status = 200, description = "Page of users", body = CursorPaginatedResponse<UserDto>),
        StandardErrorResponses
    )
)]
pub async fn list_users_cursor_handler(
    State(directory): State<UserDirectory>,
    ValidatedQuery(query): ValidatedQuery<CursorPaginationQuery>,
) -> Result<Json<CursorPaginatedResponse<UserDto>>, Exception> {
    let after = match query.cursor.as_deref() {
        Some(cursor) => cursor
            .parse::<u64>()
            .map_err(|_| HttpException::bad_request("cursor must be a user id"))?,
        None => 0,
    };

    // One extra row tells whether another page exists
    let rows = directory.after(after, query.limit as usize + 1);
    Ok(Json(CursorPaginatedResponse::from_overfetch(
        rows,
        &query,
        |user| user.id.to_string(),
    )))
}
