use std::sync::Arc;
use tokio::sync::Mutex;

use anyhow::Context;
use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::{request::Parts, StatusCode},
    routing::{delete, get},
    Json, Router,
};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::CorsLayer;

use deskd_core::client::DeskdClient;
use deskd_core::error::BookingError;
use deskd_core::types::{Booking, BookingId, DeskId, UserId};

use crate::handlers::*;

pub type AppState = Arc<Mutex<DeskdClient>>;

/// Header carrying the user already authenticated by the fronting proxy.
pub const REMOTE_USER_HEADER: &str = "x-remote-user";

const MAX_IN_FLIGHT: usize = 64;

type Failure = (StatusCode, Json<ApiResponse<()>>);

pub async fn run(host: &str, port: u16, client: DeskdClient) -> anyhow::Result<()> {
    let state: AppState = Arc::new(Mutex::new(client));
    let app = router(state);

    let addr = format!("{}:{}", host, port);
    tracing::info!("deskd server starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app).await.context("Server error")
}

pub fn router(state: AppState) -> Router {
    Router::new()
        // Day views are public; per-user routes extract RemoteUser
        .route("/health", get(health))
        .route("/desks", get(list_desks))
        .route("/available", get(available_desks))
        .route("/bookings", get(day_bookings).post(book_desk))
        .route("/bookings/{id}", delete(cancel_booking))
        .route("/me/bookings", get(my_bookings))
        .layer(ConcurrencyLimitLayer::new(MAX_IN_FLIGHT))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ─── Identity ───────────────────────────────────────────────────────────────

/// The acting user, taken from [`REMOTE_USER_HEADER`]. Requests without it get 401.
pub struct RemoteUser(pub UserId);

impl<S: Send + Sync> FromRequestParts<S> for RemoteUser {
    type Rejection = Failure;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .headers
            .get(REMOTE_USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .unwrap_or("");

        if user.is_empty() {
            tracing::warn!(path = %parts.uri.path(), "Request without remote user");
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::err("missing X-Remote-User header")),
            ));
        }
        Ok(RemoteUser(UserId::new(user)))
    }
}

fn failure(err: BookingError) -> Failure {
    let (status, message) = error_status(&err);
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %err, "Booking storage failure");
    }
    (status, Json(ApiResponse::err(message)))
}

// ─── Handlers ───────────────────────────────────────────────────────────────

async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let client = state.lock().await;
    Json(ApiResponse::ok(HealthResponse {
        status: "ok".to_string(),
        desks: client.desks().len(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

async fn list_desks(State(state): State<AppState>) -> Json<ApiResponse<Vec<DeskId>>> {
    let client = state.lock().await;
    Json(ApiResponse::ok(client.desks()))
}

async fn available_desks(
    State(state): State<AppState>,
    Query(query): Query<DayQuery>,
) -> Result<Json<ApiResponse<AvailableResponse>>, Failure> {
    let client = state.lock().await;
    let desks = client.available_desks(query.day).map_err(failure)?;
    Ok(Json(ApiResponse::ok(AvailableResponse { day: query.day, desks })))
}

async fn day_bookings(
    State(state): State<AppState>,
    Query(query): Query<DayQuery>,
) -> Result<Json<ApiResponse<DayBookingsResponse>>, Failure> {
    let client = state.lock().await;
    let bookings = client.bookings(query.day).map_err(failure)?;
    Ok(Json(ApiResponse::ok(DayBookingsResponse { day: query.day, bookings })))
}

async fn my_bookings(
    State(state): State<AppState>,
    RemoteUser(user): RemoteUser,
) -> Result<Json<ApiResponse<Vec<Booking>>>, Failure> {
    let client = state.lock().await;
    let bookings = client.user_bookings(&user).map_err(failure)?;
    Ok(Json(ApiResponse::ok(bookings)))
}

async fn book_desk(
    State(state): State<AppState>,
    RemoteUser(user): RemoteUser,
    Json(req): Json<BookRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Booking>>), Failure> {
    let (desk, slot) = req
        .validate()
        .map_err(|e| (StatusCode::BAD_REQUEST, Json(ApiResponse::<()>::err(e))))?;

    let client = state.lock().await;
    match client.book(&user, &desk, slot) {
        Ok(booking) => Ok((StatusCode::CREATED, Json(ApiResponse::ok(booking)))),
        Err(e) => {
            tracing::info!(user = %user, desk = %desk, reason = %e, "Booking refused");
            Err(failure(e))
        }
    }
}

async fn cancel_booking(
    State(state): State<AppState>,
    RemoteUser(user): RemoteUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<CancelResponse>>, Failure> {
    let client = state.lock().await;
    client.cancel_booking(BookingId(id), &user).map_err(failure)?;
    Ok(Json(ApiResponse::ok(CancelResponse { cancelled: id })))
}
