use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::app::auth::{NewAccount, TokenPair};
use crate::app::categories::CategoryService;
use crate::app::comments::CommentService;
use crate::app::feed::FeedService;
use crate::app::images::{self, ImageService, UploadIntent};
use crate::app::pagination::Page;
use crate::app::permissions::{self, Decision, Requester};
use crate::app::posts::PostService;
use crate::app::users::{ProfileUpdate, UserService};
use crate::domain::category::{self, Category, CategoryDraft, Location, MAX_TITLE_LEN};
use crate::domain::comment::Comment;
use crate::domain::post::{Post, PostDraft, PostForm};
use crate::domain::user::{self, PublicUser, User};
use crate::http::error::{db_constraint, FOREIGN_KEY_VIOLATION, UNIQUE_VIOLATION};
use crate::http::{AdminToken, AppError, AuthUser};
use crate::AppState;

const MAX_PASSWORD_LEN: usize = 128;
const MIN_PASSWORD_LEN: usize = 8;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
}

#[derive(Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

fn redirect_to_post(post_id: i64) -> Response {
    (
        StatusCode::FOUND,
        [(header::LOCATION, format!("/posts/{}/", post_id))],
    )
        .into_response()
}

/// Unwraps a JSON form body; a missing or malformed one becomes a 400.
fn form_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::bad_request(rejection.body_text()))
}

async fn requester(state: &AppState, auth: AuthUser) -> Result<Requester, AppError> {
    let is_staff = UserService::new(state.db.clone())
        .is_staff(auth.user_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = auth.user_id, "failed to load user role");
            AppError::internal("failed to load user")
        })?;

    Ok(Requester {
        user_id: auth.user_id,
        is_staff,
    })
}

async fn optional_requester(
    state: &AppState,
    auth: Option<AuthUser>,
) -> Result<Option<Requester>, AppError> {
    match auth {
        Some(auth) => Ok(Some(requester(state, auth).await?)),
        None => Ok(None),
    }
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let db = state.db.ping().await.is_ok();
    let redis = state.cache.ping().await.is_ok();
    let status = if db && redis { "ok" } else { "degraded" };

    Json(HealthResponse { status })
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct RegistrationRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegistrationRequest>,
) -> Result<Json<User>, AppError> {
    let username = payload.username.trim().to_string();
    if username.is_empty() {
        return Err(AppError::bad_request("username is required"));
    }
    if !user::is_valid_username(&username) {
        return Err(AppError::bad_request(
            "username may contain only letters, digits and @/./+/-/_ (at most 150 characters)",
        ));
    }
    if payload.password.trim().len() < MIN_PASSWORD_LEN {
        return Err(AppError::bad_request("password must be at least 8 characters"));
    }
    if payload.password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::bad_request("password must be at most 128 characters"));
    }

    let account = NewAccount {
        username,
        email: payload.email.unwrap_or_default().trim().to_string(),
        first_name: payload.first_name.unwrap_or_default().trim().to_string(),
        last_name: payload.last_name.unwrap_or_default().trim().to_string(),
        password: payload.password,
    };

    let user = state
        .auth_service()
        .register(account)
        .await
        .map_err(|err| {
            if let Some((code, constraint)) = db_constraint(&err) {
                if code == UNIQUE_VIOLATION && constraint.contains("users_username_key") {
                    return AppError::conflict("username already taken");
                }
            }
            tracing::error!(error = ?err, "failed to register user");
            AppError::internal("failed to register user")
        })?;

    tracing::info!(user_id = user.id, "user registered");
    Ok(Json(user))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    /// Username or email address.
    #[serde(alias = "email")]
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthTokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub access_expires_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub refresh_expires_at: OffsetDateTime,
}

impl From<TokenPair> for AuthTokenResponse {
    fn from(tokens: TokenPair) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            access_expires_at: tokens.access_expires_at,
            refresh_expires_at: tokens.refresh_expires_at,
        }
    }
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthTokenResponse>, AppError> {
    if payload.username.trim().is_empty() || payload.password.trim().is_empty() {
        return Err(AppError::bad_request("username and password are required"));
    }
    if payload.password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::bad_request("password must be at most 128 characters"));
    }

    let tokens = state
        .auth_service()
        .login(payload.username.trim(), &payload.password)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to login");
            AppError::internal("failed to login")
        })?;

    match tokens {
        Some(tokens) => Ok(Json(tokens.into())),
        None => Err(AppError::unauthorized("invalid credentials")),
    }
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

pub async fn refresh_token(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthTokenResponse>, AppError> {
    if payload.refresh_token.trim().is_empty() {
        return Err(AppError::bad_request("refresh_token is required"));
    }

    let tokens = state
        .auth_service()
        .refresh(&payload.refresh_token)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to refresh token");
            AppError::internal("failed to refresh token")
        })?;

    match tokens {
        Some(tokens) => Ok(Json(tokens.into())),
        None => Err(AppError::unauthorized("invalid refresh token")),
    }
}

pub async fn logout(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<StatusCode, AppError> {
    if payload.refresh_token.trim().is_empty() {
        return Err(AppError::bad_request("refresh_token is required"));
    }

    let revoked = state
        .auth_service()
        .revoke_refresh_token(&payload.refresh_token)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to revoke token");
            AppError::internal("failed to revoke token")
        })?;

    tracing::debug!(revoked = revoked, "logout");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Feeds
// ---------------------------------------------------------------------------

pub async fn home_feed(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Post>>, AppError> {
    let service = FeedService::new(state.db.clone(), state.posts_per_page);
    let mut page = service
        .home_feed(query.page.as_deref(), OffsetDateTime::now_utc())
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to load home feed");
            AppError::internal("failed to load feed")
        })?;

    ImageService::new(state.cache.clone(), state.storage.clone())
        .populate_post_image_urls(&mut page.items)
        .await;

    Ok(Json(page))
}

#[derive(Serialize)]
pub struct CategoryFeedResponse {
    pub category: Category,
    pub posts: Page<Post>,
}

pub async fn category_feed(
    Path(slug): Path<String>,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<CategoryFeedResponse>, AppError> {
    let category = CategoryService::new(state.db.clone())
        .find_published_by_slug(&slug)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, slug = %slug, "failed to fetch category");
            AppError::internal("failed to fetch category")
        })?
        .ok_or_else(|| AppError::not_found("category not found"))?;

    let service = FeedService::new(state.db.clone(), state.posts_per_page);
    let mut posts = service
        .category_feed(&category, query.page.as_deref(), OffsetDateTime::now_utc())
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, category_id = category.id, "failed to load category feed");
            AppError::internal("failed to load feed")
        })?;

    ImageService::new(state.cache.clone(), state.storage.clone())
        .populate_post_image_urls(&mut posts.items)
        .await;

    Ok(Json(CategoryFeedResponse { category, posts }))
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub profile: PublicUser,
    pub posts: Page<Post>,
}

pub async fn profile(
    Path(username): Path<String>,
    auth: Option<AuthUser>,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ProfileResponse>, AppError> {
    let author = UserService::new(state.db.clone())
        .find_by_username(&username)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, username = %username, "failed to fetch user");
            AppError::internal("failed to fetch user")
        })?
        .ok_or_else(|| AppError::not_found("user not found"))?;

    let viewer_id = auth.map(|user| user.user_id);
    let service = FeedService::new(state.db.clone(), state.posts_per_page);
    let mut posts = service
        .profile_feed(
            &author,
            viewer_id,
            query.page.as_deref(),
            OffsetDateTime::now_utc(),
        )
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, author_id = author.id, "failed to load profile feed");
            AppError::internal("failed to load feed")
        })?;

    ImageService::new(state.cache.clone(), state.storage.clone())
        .populate_post_image_urls(&mut posts.items)
        .await;

    Ok(Json(ProfileResponse {
        profile: author.into(),
        posts,
    }))
}

// ---------------------------------------------------------------------------
// Profile editing
// ---------------------------------------------------------------------------

pub async fn edit_profile_form(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<User>, AppError> {
    let user = UserService::new(state.db.clone())
        .get_user(auth.user_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = auth.user_id, "failed to fetch user");
            AppError::internal("failed to fetch user")
        })?;

    match user {
        Some(user) => Ok(Json(user)),
        None => Err(AppError::not_found("user not found")),
    }
}

#[derive(Deserialize)]
pub struct ProfileForm {
    pub username: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

pub async fn edit_profile(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<ProfileForm>,
) -> Result<Json<User>, AppError> {
    let username = payload.username.trim().to_string();
    if username.is_empty() {
        return Err(AppError::bad_request("username is required"));
    }
    if !user::is_valid_username(&username) {
        return Err(AppError::bad_request(
            "username may contain only letters, digits and @/./+/-/_ (at most 150 characters)",
        ));
    }

    let update = ProfileUpdate {
        username,
        first_name: payload.first_name.unwrap_or_default().trim().to_string(),
        last_name: payload.last_name.unwrap_or_default().trim().to_string(),
        email: payload.email.unwrap_or_default().trim().to_string(),
    };

    let user = UserService::new(state.db.clone())
        .update_profile(auth.user_id, update)
        .await
        .map_err(|err| {
            if let Some((code, constraint)) = db_constraint(&err) {
                if code == UNIQUE_VIOLATION && constraint.contains("users_username_key") {
                    return AppError::conflict("username already taken");
                }
            }
            tracing::error!(error = ?err, user_id = auth.user_id, "failed to update profile");
            AppError::internal("failed to update profile")
        })?;

    match user {
        Some(user) => Ok(Json(user)),
        None => Err(AppError::not_found("user not found")),
    }
}

// ---------------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct PostDetailResponse {
    pub post: Post,
    pub comments: Vec<Comment>,
    /// Only signed-in viewers get a comment form.
    pub can_comment: bool,
}

pub async fn post_detail(
    Path(id): Path<i64>,
    auth: Option<AuthUser>,
    State(state): State<AppState>,
) -> Result<Json<PostDetailResponse>, AppError> {
    let viewer_id = auth.map(|user| user.user_id);
    let post = PostService::new(state.db.clone())
        .find_visible_post(id, viewer_id, OffsetDateTime::now_utc())
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, post_id = id, "failed to fetch post");
            AppError::internal("failed to fetch post")
        })?;

    let mut post = match post {
        Some(post) => post,
        None => return Err(AppError::not_found("post not found")),
    };

    let comments = CommentService::new(state.db.clone())
        .list_for_post(post.id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, post_id = id, "failed to fetch comments");
            AppError::internal("failed to fetch comments")
        })?;

    ImageService::new(state.cache.clone(), state.storage.clone())
        .populate_post_image_url(&mut post)
        .await;

    Ok(Json(PostDetailResponse {
        post,
        comments,
        can_comment: viewer_id.is_some(),
    }))
}

#[derive(Serialize)]
pub struct PostFormChoices {
    pub categories: Vec<Category>,
    pub locations: Vec<Location>,
}

pub async fn create_post_form(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<PostFormChoices>, AppError> {
    let service = CategoryService::new(state.db.clone());
    let categories = service.list_categories().await.map_err(|err| {
        tracing::error!(error = ?err, "failed to list categories");
        AppError::internal("failed to list categories")
    })?;
    let locations = service.list_locations().await.map_err(|err| {
        tracing::error!(error = ?err, "failed to list locations");
        AppError::internal("failed to list locations")
    })?;

    Ok(Json(PostFormChoices {
        categories,
        locations,
    }))
}

/// Validates a submitted post form on behalf of `author_id`.
fn post_draft(state: &AppState, author_id: i64, form: PostForm) -> Result<PostDraft, AppError> {
    let draft = form
        .validate(state.default_utc_offset)
        .map_err(|message| AppError::bad_request(message))?;

    if let Some(key) = draft.image_key.as_deref() {
        if !images::owns_image_key(author_id, key) {
            return Err(AppError::bad_request("image does not belong to you"));
        }
    }

    Ok(draft)
}

/// Maps a failed post write to the response the client should see.
fn post_write_error(err: anyhow::Error, post_id: Option<i64>) -> AppError {
    if let Some((code, constraint)) = db_constraint(&err) {
        if code == FOREIGN_KEY_VIOLATION {
            if constraint.contains("posts_category_id_fkey") {
                return AppError::bad_request("category does not exist");
            }
            if constraint.contains("posts_location_id_fkey") {
                return AppError::bad_request("location does not exist");
            }
        }
    }
    tracing::error!(error = ?err, post_id = ?post_id, "failed to save post");
    AppError::internal("failed to save post")
}

pub async fn create_post(
    auth: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<PostForm>, JsonRejection>,
) -> Result<Json<Post>, AppError> {
    let draft = post_draft(&state, auth.user_id, form_body(payload)?)?;

    let mut post = PostService::new(state.db.clone())
        .create_post(auth.user_id, draft)
        .await
        .map_err(|err| post_write_error(err, None))?;

    tracing::info!(post_id = post.id, author_id = auth.user_id, "post created");
    ImageService::new(state.cache.clone(), state.storage.clone())
        .populate_post_image_url(&mut post)
        .await;

    Ok(Json(post))
}

async fn load_post(state: &AppState, id: i64) -> Result<Post, AppError> {
    PostService::new(state.db.clone())
        .find_post(id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, post_id = id, "failed to fetch post");
            AppError::internal("failed to fetch post")
        })?
        .ok_or_else(|| AppError::not_found("post not found"))
}

pub async fn edit_post_form(
    Path(id): Path<i64>,
    auth: Option<AuthUser>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let mut post = load_post(&state, id).await?;
    let requester = optional_requester(&state, auth).await?;

    match permissions::post_edit(post.author_id, requester) {
        Decision::Allow => {
            ImageService::new(state.cache.clone(), state.storage.clone())
                .populate_post_image_url(&mut post)
                .await;
            Ok(Json(post).into_response())
        }
        Decision::RedirectToPost => Ok(redirect_to_post(id)),
        Decision::NotFound => Err(AppError::not_found("post not found")),
    }
}

pub async fn edit_post(
    Path(id): Path<i64>,
    auth: Option<AuthUser>,
    State(state): State<AppState>,
    payload: Result<Json<PostForm>, JsonRejection>,
) -> Result<Response, AppError> {
    let post = load_post(&state, id).await?;
    let requester = optional_requester(&state, auth).await?;

    match permissions::post_edit(post.author_id, requester) {
        Decision::Allow => {}
        Decision::RedirectToPost => return Ok(redirect_to_post(id)),
        Decision::NotFound => return Err(AppError::not_found("post not found")),
    }

    let draft = post_draft(&state, post.author_id, form_body(payload)?)?;
    let post = PostService::new(state.db.clone())
        .update_post(id, draft)
        .await
        .map_err(|err| post_write_error(err, Some(id)))?;

    let mut post = post.ok_or_else(|| AppError::not_found("post not found"))?;
    tracing::info!(post_id = id, "post updated");
    ImageService::new(state.cache.clone(), state.storage.clone())
        .populate_post_image_url(&mut post)
        .await;

    Ok(Json(post).into_response())
}

pub async fn delete_post_form(
    Path(id): Path<i64>,
    auth: Option<AuthUser>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let post = load_post(&state, id).await?;
    let requester = optional_requester(&state, auth).await?;

    match permissions::post_delete(post.author_id, requester) {
        Decision::Allow => Ok(Json(post).into_response()),
        Decision::RedirectToPost => Ok(redirect_to_post(id)),
        Decision::NotFound => Err(AppError::not_found("post not found")),
    }
}

pub async fn delete_post(
    Path(id): Path<i64>,
    auth: Option<AuthUser>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let post = load_post(&state, id).await?;
    let requester = optional_requester(&state, auth).await?;

    match permissions::post_delete(post.author_id, requester) {
        Decision::Allow => {}
        Decision::RedirectToPost => return Ok(redirect_to_post(id)),
        Decision::NotFound => return Err(AppError::not_found("post not found")),
    }

    let deleted = PostService::new(state.db.clone())
        .delete_post(id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, post_id = id, "failed to delete post");
            AppError::internal("failed to delete post")
        })?;

    if deleted {
        tracing::info!(post_id = id, "post deleted");
        Ok(StatusCode::NO_CONTENT.into_response())
    } else {
        Err(AppError::not_found("post not found"))
    }
}

#[derive(Deserialize)]
pub struct UploadRequest {
    pub content_type: String,
    pub bytes: i64,
}

pub async fn create_image_upload(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UploadRequest>,
) -> Result<Json<UploadIntent>, AppError> {
    if payload.bytes <= 0 {
        return Err(AppError::bad_request("bytes must be greater than 0"));
    }
    if payload.bytes > state.upload_max_bytes {
        return Err(AppError::bad_request("upload exceeds max size"));
    }
    if images::extension_from_content_type(&payload.content_type).is_err() {
        return Err(AppError::bad_request("unsupported content type"));
    }

    let intent = ImageService::new(state.cache.clone(), state.storage.clone())
        .create_upload(
            auth.user_id,
            &payload.content_type,
            payload.bytes,
            state.upload_url_ttl_seconds,
        )
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = auth.user_id, "failed to create upload");
            AppError::internal("failed to create upload")
        })?;

    Ok(Json(intent))
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: Option<String>,
}

fn comment_text(form: CommentForm) -> Result<String, AppError> {
    let text = form.text.unwrap_or_default();
    if text.trim().is_empty() {
        return Err(AppError::bad_request("text is required"));
    }
    Ok(text)
}

pub async fn add_comment(
    Path(id): Path<i64>,
    auth: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<CommentForm>, JsonRejection>,
) -> Result<Json<Comment>, AppError> {
    let text = comment_text(form_body(payload)?)?;

    let post = PostService::new(state.db.clone())
        .find_visible_post(id, Some(auth.user_id), OffsetDateTime::now_utc())
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, post_id = id, "failed to fetch post");
            AppError::internal("failed to fetch post")
        })?;
    if post.is_none() {
        return Err(AppError::not_found("post not found"));
    }

    let comment = CommentService::new(state.db.clone())
        .create_comment(auth.user_id, id, text)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = auth.user_id, post_id = id, "failed to comment");
            AppError::internal("failed to comment")
        })?;

    Ok(Json(comment))
}

/// Loads a comment the caller may modify under post `post_id`.
async fn load_own_comment(
    state: &AppState,
    auth: AuthUser,
    post_id: i64,
    comment_id: i64,
) -> Result<Comment, AppError> {
    let comment = CommentService::new(state.db.clone())
        .find_comment(comment_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, comment_id = comment_id, "failed to fetch comment");
            AppError::internal("failed to fetch comment")
        })?
        .ok_or_else(|| AppError::not_found("comment not found"))?;

    let requester = requester(state, auth).await?;
    if permissions::comment_modify(&comment, post_id, requester).is_allowed() {
        Ok(comment)
    } else {
        Err(AppError::not_found("comment not found"))
    }
}

pub async fn edit_comment_form(
    Path((id, comment_id)): Path<(i64, i64)>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Comment>, AppError> {
    let comment = load_own_comment(&state, auth, id, comment_id).await?;
    Ok(Json(comment))
}

pub async fn edit_comment(
    Path((id, comment_id)): Path<(i64, i64)>,
    auth: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<CommentForm>, JsonRejection>,
) -> Result<Json<Comment>, AppError> {
    load_own_comment(&state, auth, id, comment_id).await?;
    let text = comment_text(form_body(payload)?)?;

    let comment = CommentService::new(state.db.clone())
        .update_comment(comment_id, id, auth.user_id, text)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, comment_id = comment_id, "failed to update comment");
            AppError::internal("failed to update comment")
        })?;

    match comment {
        Some(comment) => Ok(Json(comment)),
        None => Err(AppError::not_found("comment not found")),
    }
}

pub async fn delete_comment_form(
    Path((id, comment_id)): Path<(i64, i64)>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Comment>, AppError> {
    let comment = load_own_comment(&state, auth, id, comment_id).await?;
    Ok(Json(comment))
}

pub async fn delete_comment(
    Path((id, comment_id)): Path<(i64, i64)>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    load_own_comment(&state, auth, id, comment_id).await?;

    let deleted = CommentService::new(state.db.clone())
        .delete_comment(comment_id, id, auth.user_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, comment_id = comment_id, "failed to delete comment");
            AppError::internal("failed to delete comment")
        })?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("comment not found"))
    }
}

// ---------------------------------------------------------------------------
// Administration
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct CategoryRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub slug: String,
    #[serde(default)]
    pub is_published: Option<bool>,
}

impl CategoryRequest {
    fn into_draft(self) -> Result<CategoryDraft, AppError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::bad_request("title is required"));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(AppError::bad_request("title must be at most 256 characters"));
        }
        let slug = self.slug.trim().to_string();
        if !category::is_valid_slug(&slug) {
            return Err(AppError::bad_request(
                "slug may contain only latin letters, digits, hyphens and underscores (at most 64 characters)",
            ));
        }

        Ok(CategoryDraft {
            title,
            description: self.description.unwrap_or_default(),
            slug,
            is_published: self.is_published.unwrap_or(true),
        })
    }
}

fn category_write_error(err: anyhow::Error) -> AppError {
    if let Some((code, constraint)) = db_constraint(&err) {
        if code == UNIQUE_VIOLATION && constraint.contains("categories_slug_key") {
            return AppError::conflict("slug already taken");
        }
    }
    tracing::error!(error = ?err, "failed to save category");
    AppError::internal("failed to save category")
}

pub async fn admin_create_category(
    _admin: AdminToken,
    State(state): State<AppState>,
    Json(payload): Json<CategoryRequest>,
) -> Result<Json<Category>, AppError> {
    let draft = payload.into_draft()?;
    let category = CategoryService::new(state.db.clone())
        .create_category(draft)
        .await
        .map_err(category_write_error)?;

    tracing::info!(category_id = category.id, slug = %category.slug, "category created");
    Ok(Json(category))
}

pub async fn admin_update_category(
    _admin: AdminToken,
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<CategoryRequest>,
) -> Result<Json<Category>, AppError> {
    let draft = payload.into_draft()?;
    let category = CategoryService::new(state.db.clone())
        .update_category(id, draft)
        .await
        .map_err(category_write_error)?;

    match category {
        Some(category) => Ok(Json(category)),
        None => Err(AppError::not_found("category not found")),
    }
}

pub async fn admin_delete_category(
    _admin: AdminToken,
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let deleted = CategoryService::new(state.db.clone())
        .delete_category(id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, category_id = id, "failed to delete category");
            AppError::internal("failed to delete category")
        })?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("category not found"))
    }
}

#[derive(Deserialize)]
pub struct LocationRequest {
    pub name: String,
    #[serde(default)]
    pub is_published: Option<bool>,
}

pub async fn admin_create_location(
    _admin: AdminToken,
    State(state): State<AppState>,
    Json(payload): Json<LocationRequest>,
) -> Result<Json<Location>, AppError> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::bad_request("name is required"));
    }
    if name.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::bad_request("name must be at most 256 characters"));
    }

    let location = CategoryService::new(state.db.clone())
        .create_location(name, payload.is_published.unwrap_or(true))
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to create location");
            AppError::internal("failed to create location")
        })?;

    Ok(Json(location))
}

pub async fn admin_delete_location(
    _admin: AdminToken,
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let deleted = CategoryService::new(state.db.clone())
        .delete_location(id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, location_id = id, "failed to delete location");
            AppError::internal("failed to delete location")
        })?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("location not found"))
    }
}

#[derive(Deserialize)]
pub struct StaffRequest {
    pub is_staff: bool,
}

pub async fn admin_set_staff(
    _admin: AdminToken,
    Path(username): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<StaffRequest>,
) -> Result<Json<User>, AppError> {
    let user = UserService::new(state.db.clone())
        .set_staff(&username, payload.is_staff)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, username = %username, "failed to update staff role");
            AppError::internal("failed to update user")
        })?;

    match user {
        Some(user) => {
            tracing::info!(user_id = user.id, is_staff = user.is_staff, "staff role changed");
            Ok(Json(user))
        }
        None => Err(AppError::not_found("user not found")),
    }
}
