use crate::api::{admin, chat, handlers, AppState};
use crate::metrics::MetricsLayer;
use axum::{
    routing::{get, post, put},
    Router,
};
use std::time::Duration;
use tower_http::{
    cors::CorsLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

/// Build the main API router
pub fn build_router(state: AppState) -> Router {
    let chat_enabled = state.chat_enabled;

    let mut router = Router::new()
        // Health endpoints
        .route("/health", get(handlers::health_check))
        .route("/health/live", get(handlers::health_check))
        .route("/health/ready", get(handlers::readiness))
        .route("/metrics", get(handlers::metrics))
        // Accounts
        .route("/v1/accounts/signup", post(handlers::signup))
        .route("/v1/accounts/login", post(handlers::login))
        .route("/v1/accounts/logout", post(handlers::logout))
        .route("/v1/accounts/me", get(handlers::me))
        // Public pages
        .route("/v1/home", get(handlers::home))
        .route("/v1/diseases", get(handlers::list_diseases))
        .route("/v1/diseases/:name", get(handlers::disease_detail))
        .route("/v1/diseases/:name/stats", get(handlers::disease_stats))
        .route(
            "/v1/diseases/:name/stats/:region",
            get(handlers::regional_stats),
        )
        .route("/v1/reviews/wordcloud", get(handlers::public_word_cloud))
        // Predictions
        .route("/v1/diseases/:name/predict", post(handlers::predict))
        .route("/v1/predictions", get(handlers::prediction_history))
        .route("/v1/predictions/:id", get(handlers::get_prediction))
        // Reviews
        .route(
            "/v1/predictions/:id/reviews",
            get(handlers::prediction_reviews).post(handlers::create_review),
        )
        .route(
            "/v1/reviews/:id",
            put(handlers::update_review).delete(handlers::delete_review),
        )
        // Back office
        .route("/v1/admin/dashboard", get(admin::dashboard))
        .route("/v1/admin/wordcloud", get(admin::word_cloud))
        .route("/v1/admin/diseases", get(admin::list_diseases))
        .route("/v1/admin/diseases/:name", put(admin::update_disease))
        .route("/v1/admin/predictions", get(admin::list_predictions))
        .route("/v1/admin/reviews", get(admin::list_reviews))
        .route("/v1/admin/reviews/:id", put(admin::moderate_review))
        .route("/v1/admin/users", get(admin::list_users))
        .route("/v1/admin/users/:id/staff", put(admin::set_staff))
        .route("/v1/admin/models", get(admin::model_status))
        .route(
            "/v1/admin/models/:name/retrain",
            post(admin::retrain_model),
        );

    if chat_enabled {
        router = router.merge(chat_routes());
    }

    router
        // Labels requests by their matched route
        .route_layer(MetricsLayer::new())
        // Add state
        .with_state(state)
        // Add middleware
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
}

fn chat_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/chat/predictions/:id/start",
            post(chat::start_conversation),
        )
        .route("/v1/chat/messages", post(chat::send_message))
        .route("/v1/chat/conversations", get(chat::list_conversations))
        .route(
            "/v1/chat/conversations/:id",
            get(chat::get_conversation).delete(chat::delete_conversation),
        )
}

/// Router with a per-request timeout
pub fn build_router_with_timeout(state: AppState, timeout: Duration) -> Router {
    build_router(state).layer(TimeoutLayer::new(timeout))
}
