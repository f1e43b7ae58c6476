pub mod auth;
pub mod dashboard;
pub mod error;
pub mod extract;
pub mod guestbook;
pub mod live;
pub mod middleware;
pub mod rsvp;
pub mod state;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};

pub use error::ApiError;
pub use state::{ApiSettings, AppState, AppStateInner};

/// Guestbook photos are capped at 2 MB decoded, which is ~2.7 MB as base64
/// inside a JSON body.
const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// All routes, with state applied. CORS and tracing layers are added by the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(auth::login))
        .route("/rsvp", post(rsvp::submit_rsvp))
        .route("/guestbook", get(guestbook::list_memories).post(guestbook::create_memory))
        .route("/guestbook/{id}/like", post(guestbook::toggle_like))
        .route("/guestbook/live", get(live::guestbook_feed))
        // Browsers cannot set headers on a WebSocket upgrade; the token rides in the query.
        .route("/admin/live", get(live::admin_feed));

    let admin_routes = Router::new()
        .route("/admin/rsvps", get(dashboard::list_rsvps).post(dashboard::add_rsvp))
        .route(
            "/admin/rsvps/{id}",
            put(dashboard::update_rsvp).delete(dashboard::delete_rsvp),
        )
        .route("/admin/rsvps/{id}/resend", post(dashboard::resend_invitation))
        .route("/admin/stats", get(dashboard::stats))
        .route("/admin/reminders", post(dashboard::send_reminders))
        .layer(from_fn_with_state(state.clone(), middleware::require_admin));

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
