//! HTTP and WebSocket transport using Axum

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, Request, State,
    },
    http::StatusCode,
    middleware::Next,
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{debug, error, info, warn, Level};

use crate::core::pipeline::SignalPipeline;
use crate::db::{SignalQuery, SignalStats, DEFAULT_QUERY_LIMIT};
use crate::metrics::Metrics;
use crate::models::market::MarketKind;
use crate::models::timeframe::Timeframe;
use crate::services::broadcaster::{BroadcastMessage, SubscriptionFilter};

/// Signals replayed to a WebSocket client right after it subscribes
pub const SUBSCRIBE_BACKLOG: usize = 20;
const MAX_QUERY_LIMIT: usize = 500;

#[derive(Clone)]
pub struct AppState {
    pub health: Arc<RwLock<HealthStatus>>,
    pub metrics: Arc<Metrics>,
    pub start_time: Arc<Instant>,
    pub pipeline: Arc<SignalPipeline>,
}

impl AppState {
    pub fn new(pipeline: Arc<SignalPipeline>) -> Self {
        Self {
            health: Arc::new(RwLock::new(HealthStatus::default())),
            metrics: pipeline.metrics().clone(),
            start_time: Arc::new(Instant::now()),
            pipeline,
        }
    }
}

#[derive(Clone, Debug)]
pub struct HealthStatus {
    pub status: String,
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}

type ApiError = (StatusCode, Json<Value>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({ "error": message.into() })))
}

fn internal(e: impl std::fmt::Display) -> ApiError {
    error!(error = %e, "request failed");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
}

fn parse_timeframe(raw: &str) -> Result<Timeframe, ApiError> {
    raw.parse()
        .map_err(|e: crate::error::PipelineError| api_error(StatusCode::BAD_REQUEST, e.to_string()))
}

pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    let health = state.health.read().await;
    let uptime_seconds = state.start_time.elapsed().as_secs();
    Ok(Json(json!({
        "status": health.status,
        "uptime_seconds": uptime_seconds,
        "service": "trendcast",
        "subscribers": state.pipeline.broadcaster().subscriber_count().await,
    })))
}

pub async fn metrics_handler(State(state): State<AppState>) -> Result<String, StatusCode> {
    state
        .metrics
        .export()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Track HTTP request metrics
async fn metrics_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    state.metrics.http_requests_in_flight.inc();
    let response = next.run(request).await;
    let status = response.status();
    let duration = start.elapsed();
    state.metrics.http_requests_in_flight.dec();

    state.metrics.http_requests_total.inc();
    state
        .metrics
        .http_request_duration_seconds
        .observe(duration.as_secs_f64());

    if status.is_server_error() {
        error!(
            method = %method,
            path = %path,
            status = %status,
            duration_ms = duration.as_millis(),
            "HTTP request error"
        );
    }

    response
}

async fn list_timeframes() -> Json<Value> {
    let timeframes: Vec<&str> = Timeframe::ALL.iter().map(|tf| tf.as_str()).collect();
    let defaults: Vec<&str> = Timeframe::DEFAULTS.iter().map(|tf| tf.as_str()).collect();
    Json(json!({ "timeframes": timeframes, "defaults": defaults }))
}

#[derive(Debug, Default, Deserialize)]
struct SignalsParams {
    instrument: Option<String>,
    /// Comma-separated list, e.g. `5m,1h`
    timeframe: Option<String>,
    limit: Option<usize>,
}

impl SignalsParams {
    fn into_query(self) -> Result<SignalQuery, ApiError> {
        let timeframes = match self.timeframe.as_deref() {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(parse_timeframe)
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };
        Ok(SignalQuery {
            instrument: self.instrument,
            timeframes,
            limit: self.limit.unwrap_or(DEFAULT_QUERY_LIMIT).min(MAX_QUERY_LIMIT),
            ..SignalQuery::default()
        })
    }
}

async fn list_signals(
    State(state): State<AppState>,
    Query(params): Query<SignalsParams>,
) -> Result<Json<Value>, ApiError> {
    let query = params.into_query()?;
    let signals = state.pipeline.store().signals(&query).await.map_err(internal)?;
    Ok(Json(json!({ "count": signals.len(), "signals": signals })))
}

async fn latest_signals(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let signals = state.pipeline.store().latest_signals().await.map_err(internal)?;
    Ok(Json(json!({ "count": signals.len(), "signals": signals })))
}

async fn signal_stats(
    State(state): State<AppState>,
    Query(params): Query<SignalsParams>,
) -> Result<Json<SignalStats>, ApiError> {
    let limit = params.limit;
    let mut query = params.into_query()?;
    query.limit = limit.unwrap_or(MAX_QUERY_LIMIT).min(MAX_QUERY_LIMIT);
    let signals = state.pipeline.store().signals(&query).await.map_err(internal)?;
    Ok(Json(SignalStats::from_signals(&signals)))
}

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    instrument: String,
    timeframe: String,
}

/// On-demand generation. The admitted signal is stored but not broadcast.
async fn generate_signal(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<Value>, ApiError> {
    let timeframe = parse_timeframe(&request.timeframe)?;
    let instrument = request.instrument.trim().to_ascii_uppercase();
    if instrument.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "instrument is required"));
    }

    let signal = state.pipeline.generate_signal(&instrument, timeframe).await;
    if let Some(signal) = &signal {
        state.pipeline.persist(signal);
    }
    Ok(Json(json!({ "signal": signal })))
}

#[derive(Debug, Deserialize)]
struct LimitParams {
    limit: Option<usize>,
}

async fn list_alerts(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Result<Json<Value>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_QUERY_LIMIT).min(MAX_QUERY_LIMIT);
    let alerts = state.pipeline.store().alerts(limit).await.map_err(internal)?;
    Ok(Json(json!({ "count": alerts.len(), "alerts": alerts })))
}

async fn market_data(
    State(state): State<AppState>,
    Path((instrument, timeframe)): Path<(String, String)>,
    Query(params): Query<LimitParams>,
) -> Result<Json<Value>, ApiError> {
    let timeframe = parse_timeframe(&timeframe)?;
    let instrument = instrument.to_ascii_uppercase();
    let limit = params.limit.unwrap_or(state.pipeline.candle_limit()).clamp(1, 1000);
    let candles = state.pipeline.provider().fetch(&instrument, timeframe, limit).await;
    Ok(Json(json!({
        "instrument": instrument,
        "timeframe": timeframe,
        "market": MarketKind::classify(&instrument),
        "count": candles.len(),
        "candles": candles,
    })))
}

/// Client → server WebSocket messages
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ClientMessage {
    Subscribe {
        instrument: String,
        #[serde(default)]
        timeframes: Vec<Timeframe>,
    },
    Unsubscribe,
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| relay(socket, state))
}

/// Forward broadcaster messages to one socket and apply its (re)subscriptions.
/// Until the client subscribes it receives every signal.
async fn relay(socket: WebSocket, state: AppState) {
    let broadcaster = state.pipeline.broadcaster().clone();
    let subscription = broadcaster.subscribe(None).await;
    let id = subscription.id;
    let mut receiver = subscription.receiver;
    let (mut sink, mut stream) = socket.split();
    info!(subscriber = id, "websocket client connected");

    // ends when the client stops accepting frames or the broadcaster prunes us
    let mut forward = tokio::spawn(async move {
        while let Some(message) = receiver.recv().await {
            let text = match serde_json::to_string(&message) {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "failed to encode broadcast message");
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    let read = async {
        while let Some(Ok(message)) = stream.next().await {
            let text = match message {
                Message::Text(text) => text,
                Message::Close(_) => break,
                _ => continue,
            };
            match serde_json::from_str::<ClientMessage>(text.as_str()) {
                Ok(ClientMessage::Subscribe {
                    instrument,
                    timeframes,
                }) => {
                    let filter = SubscriptionFilter::new(instrument, timeframes);
                    if !broadcaster.resubscribe(id, Some(filter.clone())).await {
                        break;
                    }
                    let query = SignalQuery {
                        instrument: Some(filter.instrument.clone()),
                        timeframes: filter.timeframes.iter().copied().collect(),
                        limit: SUBSCRIBE_BACKLOG,
                        ..SignalQuery::default()
                    };
                    match state.pipeline.store().signals(&query).await {
                        Ok(backlog) => {
                            broadcaster
                                .send_to(id, BroadcastMessage::Signals(backlog))
                                .await;
                        }
                        Err(e) => warn!(subscriber = id, error = %e, "failed to load backlog"),
                    }
                    debug!(subscriber = id, instrument = %filter.instrument, "subscription updated");
                }
                Ok(ClientMessage::Unsubscribe) => {
                    broadcaster.resubscribe(id, None).await;
                }
                Err(e) => debug!(subscriber = id, error = %e, "ignoring malformed client message"),
            }
        }
    };

    tokio::select! {
        _ = read => {}
        _ = &mut forward => debug!(subscriber = id, "subscriber dropped by broadcaster"),
    }

    forward.abort();
    broadcaster.unsubscribe(id).await;
    info!(subscriber = id, "websocket client disconnected");
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/api/timeframes", get(list_timeframes))
        .route("/api/signals", get(list_signals))
        .route("/api/signals/latest", get(latest_signals))
        .route("/api/signals/stats", get(signal_stats))
        .route("/api/signals/generate", post(generate_signal))
        .route("/api/alerts", get(list_alerts))
        .route("/api/market-data/{instrument}/{timeframe}", get(market_data))
        .route("/ws", get(ws_handler))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                        .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
                )
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    metrics_middleware,
                ))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn serve(port: u16, state: AppState) -> Result<(), std::io::Error> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    info!(port, "HTTP server listening");
    axum::serve(listener, app).await
}
