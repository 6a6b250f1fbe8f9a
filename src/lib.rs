pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;

use axum::{
    extract::{DefaultBodyLimit, Extension},
    http::{header, HeaderValue, Method},
    middleware::from_fn,
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

pub use state::AppState;

/// Build the full HTTP application around shared state.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state);
    let upload_limit = state.config.uploads.max_upload_bytes;

    Router::new()
        // Public: identity attached when present
        .merge(public_routes())
        // Protected: token required
        .merge(protected_routes(upload_limit))
        // Global middleware, outermost first
        .layer(
            ServiceBuilder::new()
                .layer(Extension(state))
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}

fn public_routes() -> Router {
    use handlers::public::{articles, auth, catalog, posts, qa, resources, system, users};

    Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health))
        // Accounts
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/user/:id/followers", get(users::followers))
        .route("/api/user/:id/following", get(users::following))
        // Catalog
        .route("/api/categories", get(catalog::list_categories))
        .route("/api/tags", get(catalog::list_tags))
        // Q&A browsing
        .route("/qa", get(qa::list_questions))
        .route("/qa/stats", get(qa::question_stats))
        .route("/qa/:id", get(qa::show_question))
        // Posts, articles, resources
        .route("/api/posts", get(posts::list_posts))
        .route("/api/posts/:id", get(posts::show_post))
        .route("/api/tech-share/:id", get(articles::show_article))
        .route("/api/resources/:id", get(resources::show_resource))
        .route_layer(from_fn(middleware::optional_auth))
}

fn protected_routes(upload_limit: usize) -> Router {
    use handlers::protected::{articles, posts, qa, resources, users};

    Router::new()
        // Q&A lifecycle
        .route("/qa/ask", post(qa::ask_question))
        .route("/qa/:id/answer", post(qa::answer_question))
        .route("/qa/answer/:answer_id/accept", post(qa::accept_answer))
        .route("/qa/answer/:answer_id/like", post(qa::like_answer))
        .route("/api/answers", post(qa::create_answer))
        .route("/api/answers/:answer_id/accept", post(qa::accept_answer))
        .route("/api/answers/:answer_id/like", post(qa::like_answer))
        .route("/api/questions/:id/favorite", post(qa::favorite_question))
        .route("/api/questions/:id/report", post(qa::report_question))
        // Current user
        .route("/api/user/me", get(users::me))
        .route("/api/user/profile", put(users::update_profile))
        .route("/api/user/password", put(users::change_password))
        .route(
            "/api/user/avatar",
            post(users::upload_avatar).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/user/:id/follow", post(users::follow_user))
        .route("/api/user/:id/unfollow", delete(users::unfollow_user))
        .route("/api/user/favorites/:id", delete(qa::remove_favorite))
        .route("/api/user/questions/:id", delete(qa::delete_question))
        .route("/api/user/answers/:id", delete(qa::delete_answer))
        .route("/api/user/shares/:id", delete(articles::delete_article))
        .route("/api/user/resources/:id", delete(resources::delete_resource))
        // Posts
        .route("/post/new", post(posts::create_post))
        .route("/post/:id/reply", post(posts::reply_to_post))
        // Tech share
        .route("/api/tech-share/publish", post(articles::publish_article))
        .route("/api/tech-share/:id/like", post(articles::like_article))
        .route("/api/authors/:author_id/follow", post(articles::follow_author))
        // Resources
        .route(
            "/api/resources",
            post(resources::upload_resource).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/resources/:id/download", post(resources::download_resource))
        .route_layer(from_fn(middleware::require_auth))
}

fn cors_layer(state: &AppState) -> CorsLayer {
    if state.config.is_development() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = state
        .config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}
