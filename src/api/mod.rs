mod handlers;
pub mod middleware;

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use strivex_core::Engine;
use tower_http::trace::TraceLayer;

use crate::db::Database;
use self::middleware::{auth_middleware, SecurityConfig};

/// Engine over the SQLite store, shared by every handler.
pub type AppEngine = Engine<Database>;

pub fn create_router(engine: AppEngine, security: SecurityConfig) -> Router {
    let protected = Router::new()
        // Profile
        .route("/profile", get(handlers::get_profile))
        .route("/profile/bonus", post(handlers::grant_bonus))
        .route("/reset", post(handlers::reset))
        // Quests
        .route("/quests/today", get(handlers::todays_quest))
        .route("/quests/complete", post(handlers::complete_quest))
        // Weekly plan
        .route("/plan", get(handlers::get_plan))
        .route("/plan/days/{day}", put(handlers::set_plan_day))
        // Categories
        .route("/categories", get(handlers::list_categories))
        .route("/categories/custom", get(handlers::list_custom_categories))
        .route("/categories/custom", post(handlers::add_custom_category))
        .route("/categories/custom/restore", post(handlers::restore_custom_category))
        .route("/categories/custom/{name}", delete(handlers::delete_custom_category))
        .route("/categories/{name}/exercises", get(handlers::list_exercises))
        .route("/categories/{name}/exercises", put(handlers::replace_exercises))
        .route(
            "/categories/{name}/exercises/{index}/adjust",
            post(handlers::adjust_exercise),
        )
        // Custom exercise library
        .route("/library", get(handlers::list_library))
        .route("/library", post(handlers::save_to_library))
        .route("/library/{name}", delete(handlers::remove_from_library))
        // Hydration
        .route("/hydration", get(handlers::hydration_status))
        .route("/hydration/tap", post(handlers::hydration_tap))
        // Debug
        .route("/storage", get(handlers::storage_preview))
        .route_layer(from_fn_with_state(security.clone(), auth_middleware));

    let api = protected.route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(security.cors_layer())
        .with_state(engine)
}
