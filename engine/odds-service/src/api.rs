//! Read-only REST API over the odds database and scheduler status

use anyhow::{Context, Result};
use odds_store::{Game, GameId, OddsRecord, OddsStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{error, info};
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Reply};

use crate::service::ServiceState;
use crate::signals::ApiServer;

/// Query parameters for the games listing
#[derive(Debug, Deserialize)]
pub struct GamesQuery {
    pub sport: Option<String>,
}

#[derive(Serialize)]
pub struct GamesResponse {
    pub count: usize,
    pub games: Vec<Game>,
}

#[derive(Serialize)]
pub struct GameOddsResponse {
    pub game: Game,
    pub odds: Vec<OddsRecord>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
    pub timestamp: String,
}

/// Error detail
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

fn error_reply(status: StatusCode, code: &str, message: String) -> Response {
    let body = ErrorResponse {
        error: ErrorDetail { code: code.to_string(), message },
        timestamp: chrono::Utc::now().to_rfc3339(),
    };
    warp::reply::with_status(warp::reply::json(&body), status).into_response()
}

/// List games, optionally for one sport
pub async fn list_games(query: GamesQuery, state: Arc<ServiceState>) -> Result<Response, warp::Rejection> {
    let sport = query.sport.map(|s| s.trim().to_uppercase()).filter(|s| !s.is_empty());

    match state.store.list_games(sport.as_deref()).await {
        Ok(games) => Ok(warp::reply::json(&GamesResponse { count: games.len(), games }).into_response()),
        Err(e) => {
            error!("Failed to list games: {}", e);
            Ok(error_reply(StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR", e.to_string()))
        }
    }
}

/// A game and its full odds history
pub async fn get_game_odds(game_id: i64, state: Arc<ServiceState>) -> Result<Response, warp::Rejection> {
    let id = GameId(game_id);

    let game = match state.store.get_game(id).await {
        Ok(Some(game)) => game,
        Ok(None) => {
            return Ok(error_reply(
                StatusCode::NOT_FOUND,
                "GAME_NOT_FOUND",
                format!("Game with ID '{}' not found", game_id),
            ))
        }
        Err(e) => {
            error!("Failed to load game {}: {}", game_id, e);
            return Ok(error_reply(StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR", e.to_string()));
        }
    };

    match state.store.odds_for_game(id).await {
        Ok(odds) => Ok(warp::reply::json(&GameOddsResponse { game, odds }).into_response()),
        Err(e) => {
            error!("Failed to load odds for game {}: {}", game_id, e);
            Ok(error_reply(StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR", e.to_string()))
        }
    }
}

pub async fn get_status(state: Arc<ServiceState>) -> Result<Response, warp::Rejection> {
    Ok(warp::reply::json(&state.status().await).into_response())
}

pub async fn get_health(state: Arc<ServiceState>) -> Result<Response, warp::Rejection> {
    let report = state.health().await;
    let status = if report.is_healthy() { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    Ok(warp::reply::with_status(warp::reply::json(&report), status).into_response())
}

/// Create all API routes
pub fn create_routes(
    state: Arc<ServiceState>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let state_filter = warp::any().map(move || state.clone());

    // Games listing endpoint
    let games = warp::path("api")
        .and(warp::path("v1"))
        .and(warp::path("games"))
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<GamesQuery>())
        .and(state_filter.clone())
        .and_then(list_games);

    // Odds history for one game
    let game_odds = warp::path("api")
        .and(warp::path("v1"))
        .and(warp::path("games"))
        .and(warp::path::param::<i64>())
        .and(warp::path("odds"))
        .and(warp::path::end())
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(get_game_odds);

    // Scheduler status endpoint
    let status = warp::path("api")
        .and(warp::path("v1"))
        .and(warp::path("status"))
        .and(warp::path::end())
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(get_status);

    // Health check endpoint
    let health =
        warp::path("health").and(warp::path::end()).and(warp::get()).and(state_filter).and_then(get_health);

    games.or(game_odds).or(status).or(health).with(
        warp::cors().allow_any_origin().allow_headers(vec!["content-type"]).allow_methods(vec!["GET", "OPTIONS"]),
    )
}

/// Bind the API and serve it until `ApiServer::shutdown` fires
pub fn start_api_server(state: Arc<ServiceState>) -> Result<ApiServer> {
    let addr = state.config.api.socket_addr()?;
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let routes = create_routes(state);
    let (bound, server) = warp::serve(routes)
        .try_bind_with_graceful_shutdown(addr, async move {
            let _ = shutdown_rx.await;
        })
        .with_context(|| format!("Failed to bind HTTP API on {}", addr))?;

    info!("HTTP API listening on http://{}", bound);
    let handle = tokio::spawn(server);

    Ok(ApiServer { shutdown: shutdown_tx, handle })
}
