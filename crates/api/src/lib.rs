pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use state::AppState;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Auth routes
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/logout", post(routes::auth::logout))
        .route("/refresh", post(routes::auth::refresh))
        .route("/me", get(routes::auth::me))
        .route("/me", put(routes::auth::update_me));

    // Resource catalog routes (reference data)
    let resource_routes = Router::new()
        .route("/", get(routes::resource::list))
        .route("/", post(routes::resource::create))
        .route("/{resource_id}", get(routes::resource::get))
        .route("/{resource_id}", put(routes::resource::update));

    let category_routes = Router::new()
        .route("/", get(routes::category::list))
        .route("/", post(routes::category::create))
        .route("/{category_id}", get(routes::category::get))
        .route("/{category_id}", put(routes::category::update));

    // Consortium routes
    let consortium_routes = Router::new()
        .route("/", get(routes::consortium::list))
        .route("/", post(routes::consortium::create))
        .route("/{consortium_id}", get(routes::consortium::get))
        .route("/{consortium_id}/quota", get(routes::consortium::quotas))
        .route("/{consortium_id}/quota", put(routes::consortium::set_quota))
        .route("/{consortium_id}/project", get(routes::consortium::projects));

    // Project routes, including the review workflow actions
    let project_routes = Router::new()
        .route("/", get(routes::project::list))
        .route("/", post(routes::project::create))
        .route("/{project_id}", get(routes::project::get))
        .route("/{project_id}", put(routes::project::update))
        .route(
            "/{project_id}/submit_for_review",
            post(routes::project::submit_for_review),
        )
        .route("/{project_id}/approve", post(routes::project::approve))
        .route(
            "/{project_id}/request_changes",
            post(routes::project::request_changes),
        )
        .route("/{project_id}/collaborator", get(routes::project::collaborators))
        .route("/{project_id}/invitation", get(routes::invitation::list))
        .route("/{project_id}/invitation", post(routes::invitation::create))
        .route("/{project_id}/service", get(routes::service::list))
        .route("/{project_id}/service", post(routes::service::create))
        .route("/{project_id}/comment", get(routes::comment::list))
        .route("/{project_id}/comment", post(routes::comment::create));

    let collaborator_routes = Router::new()
        .route("/{collaborator_id}", put(routes::collaborator::update_role))
        .route("/{collaborator_id}", delete(routes::collaborator::remove));

    // Invitation management; joining happens via /join with a code
    let invitation_routes = Router::new()
        .route("/prune", post(routes::invitation::prune))
        .route("/{invitation_id}", delete(routes::invitation::delete));

    let service_routes = Router::new()
        .route("/{service_id}", get(routes::service::get))
        .route("/{service_id}", delete(routes::service::delete))
        .route("/{service_id}/requirement", get(routes::service::requirements))
        .route(
            "/{service_id}/requirement",
            post(routes::service::create_requirement),
        );

    // Requirement routes, including the approval workflow actions
    let requirement_routes = Router::new()
        .route("/{requirement_id}", get(routes::requirement::get))
        .route("/{requirement_id}", put(routes::requirement::amend))
        .route("/{requirement_id}", delete(routes::requirement::delete))
        .route("/{requirement_id}/approve", post(routes::requirement::approve))
        .route("/{requirement_id}/decline", post(routes::requirement::decline))
        .route(
            "/{requirement_id}/provision",
            post(routes::requirement::provision),
        );

    let comment_routes = Router::new()
        .route("/{comment_id}", put(routes::comment::update))
        .route("/{comment_id}", delete(routes::comment::delete));

    let notification_routes = Router::new()
        .route("/", get(routes::notification::list))
        .route("/{notification_id}/read", put(routes::notification::mark_read));

    // Compose API
    let api = Router::new()
        .nest("/auth", auth_routes)
        .nest("/resource", resource_routes)
        .nest("/category", category_routes)
        .nest("/consortium", consortium_routes)
        .nest("/project", project_routes)
        .nest("/collaborator", collaborator_routes)
        .nest("/invitation", invitation_routes)
        .route("/join", post(routes::invitation::join))
        .nest("/service", service_routes)
        .nest("/requirement", requirement_routes)
        .nest("/comment", comment_routes)
        .nest("/notification", notification_routes);

    // Health check
    let health = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api)
        .merge(health)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
