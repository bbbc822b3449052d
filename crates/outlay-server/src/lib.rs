//! Outlay Web Server
//!
//! Axum-based REST API for the Outlay expense tracker.
//!
//! Every route under /api (except /api/auth/*) requires a Bearer access
//! token; the authenticated user id is attached to the request and passed
//! explicitly into every core query, so there is no ambient session state
//! below this layer. Error responses are sanitized: internal failures are
//! logged in full but reported as a generic message.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, warn};

use outlay_core::db::Database;

pub mod auth;
mod handlers;

#[cfg(test)]
mod tests;

/// Maximum page size for expense listings
pub const MAX_PAGE_SIZE: i64 = 500;

/// Environment variable holding the JWT signing secret
pub const JWT_SECRET_ENV: &str = "OUTLAY_JWT_SECRET";

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// HS256 signing secret for access tokens
    pub jwt_secret: String,
    /// Access token lifetime in hours
    pub token_ttl_hours: i64,
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_hours: 24,
            allowed_origins: vec![],
        }
    }
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub config: ServerConfig,
}

/// The authenticated principal, attached to the request by the auth
/// middleware and consumed by handlers as an extension
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
}

/// Authentication middleware - validates the Bearer access token and
/// attaches the resolved owner to the request
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let claims = match token.map(|t| auth::decode_token(t, &state.config.jwt_secret)) {
        Some(Ok(claims)) => claims,
        Some(Err(e)) => {
            warn!(error = %e, path = %request.uri().path(), "Rejected invalid access token");
            return unauthorized();
        }
        None => {
            warn!(path = %request.uri().path(), "Rejected request without credentials");
            return unauthorized();
        }
    };

    request.extensions_mut().insert(AuthUser {
        id: claims.sub,
        email: claims.email,
    });
    next.run(request).await
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": "Authentication required"
        })),
    )
        .into_response()
}

/// Create the application router
pub fn create_router(db: Database, config: ServerConfig) -> Router {
    let state = Arc::new(AppState {
        db,
        config: config.clone(),
    });

    let public_routes = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login));

    let protected_routes = Router::new()
        // Session
        .route("/api/auth/me", get(handlers::get_me))
        // Categories
        .route(
            "/api/categories",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route(
            "/api/categories/:id",
            get(handlers::get_category)
                .put(handlers::update_category)
                .delete(handlers::delete_category),
        )
        // Expenses
        .route(
            "/api/expenses",
            get(handlers::list_expenses).post(handlers::create_expense),
        )
        .route(
            "/api/expenses/:id",
            get(handlers::get_expense)
                .put(handlers::update_expense)
                .delete(handlers::delete_expense),
        )
        .route(
            "/api/expenses/category/:id",
            get(handlers::list_expenses_by_category),
        )
        .route("/api/expenses/period", get(handlers::list_expenses_by_period))
        .route("/api/expenses/summary/total", get(handlers::sum_for_period))
        .route("/api/expenses/summary/count", get(handlers::count_for_period))
        // Dashboard
        .route("/api/dashboard", get(handlers::get_dashboard))
        // Reports
        .route("/api/reports/expenses.csv", get(handlers::export_expenses_csv))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let cors = build_cors_layer(&config.allowed_origins);

    public_routes
        .merge(protected_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Run the server
pub async fn run_server(db: Database, config: ServerConfig, host: &str, port: u16) -> anyhow::Result<()> {
    let app = create_router(db, config);
    let addr = format!("{}:{}", host, port);

    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// API error with HTTP status and a client-safe message
pub struct AppError {
    status: StatusCode,
    message: String,
    /// Full error for logging; never sent to the client
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn unauthorized(msg: &str) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn conflict(msg: &str) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl From<outlay_core::Error> for AppError {
    fn from(err: outlay_core::Error) -> Self {
        use outlay_core::Error;
        match err {
            Error::NotFound(msg) => Self::not_found(&msg),
            Error::Conflict(msg) => Self::conflict(&msg),
            Error::InvalidData(msg) => Self::bad_request(&msg),
            other => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                // Return generic message to client
                message: "An internal error occurred".to_string(),
                // Keep full error for logging
                internal: Some(other.into()),
            },
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "An internal error occurred".to_string(),
            internal: Some(err),
        }
    }
}
