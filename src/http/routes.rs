use axum::{routing::get, routing::post, Router};

use crate::http::handlers;
use crate::AppState;

pub fn health() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health))
}

pub fn auth() -> Router<AppState> {
    Router::new()
        .route("/auth/registration/", post(handlers::register))
        .route("/auth/login/", post(handlers::login))
        .route("/auth/refresh/", post(handlers::refresh_token))
        .route("/auth/logout/", post(handlers::logout))
}

pub fn posts() -> Router<AppState> {
    Router::new()
        .route(
            "/posts/create/",
            get(handlers::create_post_form).post(handlers::create_post),
        )
        .route("/posts/images/", post(handlers::create_image_upload))
        .route("/posts/:id/", get(handlers::post_detail))
        .route(
            "/posts/:id/edit/",
            get(handlers::edit_post_form).post(handlers::edit_post),
        )
        .route(
            "/posts/:id/delete/",
            get(handlers::delete_post_form).post(handlers::delete_post),
        )
}

pub fn comments() -> Router<AppState> {
    Router::new()
        .route("/posts/:id/comment/", post(handlers::add_comment))
        .route(
            "/posts/:id/edit_comment/:comment_id/",
            get(handlers::edit_comment_form).post(handlers::edit_comment),
        )
        .route(
            "/posts/:id/delete_comment/:comment_id/",
            get(handlers::delete_comment_form).post(handlers::delete_comment),
        )
}

pub fn feeds() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::home_feed))
        .route("/category/:slug/", get(handlers::category_feed))
}

pub fn profiles() -> Router<AppState> {
    Router::new()
        .route(
            "/profile/edit/",
            get(handlers::edit_profile_form).post(handlers::edit_profile),
        )
        .route("/profile/:username/", get(handlers::profile))
}

pub fn admin() -> Router<AppState> {
    Router::new()
        .route("/admin/categories/", post(handlers::admin_create_category))
        .route(
            "/admin/categories/:id/",
            post(handlers::admin_update_category).delete(handlers::admin_delete_category),
        )
        .route("/admin/locations/", post(handlers::admin_create_location))
        .route(
            "/admin/locations/:id/",
            axum::routing::delete(handlers::admin_delete_location),
        )
        .route(
            "/admin/users/:username/staff/",
            post(handlers::admin_set_staff),
        )
}
