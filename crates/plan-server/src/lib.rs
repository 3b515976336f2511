use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use http::{Method, StatusCode};
use plan_ai::{
    ChatMessage, ChatModel, ContractorProfile, CostEstimate, CostInputs, DesignBrief,
    DesignerProfile, GatewayError, PlanningAssistant, ProfileSearch,
};
use plan_core::compute_metrics;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

pub fn app<C: ChatModel + 'static>(assistant: PlanningAssistant<C>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/generate-design", post(generate_design::<C>))
        .route("/estimate-cost", post(estimate_cost::<C>))
        .route("/chat", post(chat::<C>))
        .route("/find-contractors", post(find_contractors::<C>))
        .route("/find-designers", post(find_designers::<C>))
        .with_state(Arc::new(assistant))
        .layer(cors_layer())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DesignRequest {
    plot_length: Option<f64>,
    plot_width: Option<f64>,
    rooms: Option<i64>,
    floors: Option<i64>,
    style: Option<String>,
    open_area: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CostRequest {
    area: Option<f64>,
    quality: Option<String>,
    location: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatApiRequest {
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SearchRequest {
    search_query: Option<String>,
    specialty: Option<String>,
    location: Option<String>,
    budget: Option<String>,
    project_details: Option<String>,
}

impl From<SearchRequest> for ProfileSearch {
    fn from(request: SearchRequest) -> Self {
        Self {
            search_query: request.search_query,
            specialty: request.specialty,
            location: request.location,
            budget: request.budget,
            project_details: request.project_details,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DesignResponse {
    image_url: String,
    specifications: Specifications,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Specifications {
    plot_length: f64,
    plot_width: f64,
    rooms: u32,
    floors: u32,
    style: String,
    total_area: f64,
    open_area: f64,
    covered_area: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatResponse {
    response: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ContractorsResponse {
    contractors: Vec<ContractorProfile>,
}

#[derive(Debug, Serialize, Deserialize)]
struct DesignersResponse {
    designers: Vec<DesignerProfile>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(error: GatewayError) -> Self {
        let status = match error {
            GatewayError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::PaymentRequired => StatusCode::PAYMENT_REQUIRED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Validates the brief locally before any gateway call; a rejected request
/// never reaches the model.
async fn generate_design<C: ChatModel + 'static>(
    State(assistant): State<Arc<PlanningAssistant<C>>>,
    body: Bytes,
) -> Result<Json<DesignResponse>, ApiError> {
    let request: DesignRequest = parse_json(&body)?;

    let plot_length = request.plot_length.unwrap_or(0.0);
    let plot_width = request.plot_width.unwrap_or(0.0);
    let rooms = request.rooms.unwrap_or(0);
    let floors = request.floors.unwrap_or(0);
    let style = request.style.unwrap_or_default();
    let open_area = request.open_area.unwrap_or(0.0);

    // Zero and absent both count as missing, matching the dashboard form.
    if plot_length == 0.0 || plot_width == 0.0 || rooms == 0 || floors == 0 || style.is_empty() {
        return Err(ApiError::bad_request("Missing required parameters"));
    }
    if plot_length < 0.0 || plot_width < 0.0 || rooms < 0 || floors < 0 {
        return Err(ApiError::bad_request(
            "Invalid dimensions, room count, or floor count",
        ));
    }
    if open_area < 0.0 {
        return Err(ApiError::bad_request("Open area cannot be negative"));
    }

    let metrics = compute_metrics(plot_length, plot_width, open_area);
    if open_area > 0.0 && !metrics.is_valid {
        return Err(ApiError::bad_request(
            "Open area cannot be equal to or greater than total plot area",
        ));
    }
    if !metrics.meets_minimum_built_up_area() {
        return Err(ApiError::bad_request(
            "Built-up area is too small for the requested number of rooms",
        ));
    }

    let rooms = rooms as u32;
    let floors = floors as u32;
    tracing::info!(plot_length, plot_width, rooms, floors, style = %style, "generating floor plan design");

    let design = assistant
        .generate_design(&DesignBrief {
            plot_length,
            plot_width,
            rooms,
            floors,
            style: style.clone(),
            open_area,
        })
        .await?;

    Ok(Json(DesignResponse {
        image_url: design.image_url,
        specifications: Specifications {
            plot_length,
            plot_width,
            rooms,
            floors,
            style,
            total_area: metrics.total_area,
            open_area: metrics.open_area,
            covered_area: metrics.built_up_area,
        },
    }))
}

async fn estimate_cost<C: ChatModel + 'static>(
    State(assistant): State<Arc<PlanningAssistant<C>>>,
    body: Bytes,
) -> Result<Json<CostEstimate>, ApiError> {
    let request: CostRequest = parse_json(&body)?;

    let area = request.area.unwrap_or(0.0);
    let quality = request.quality.unwrap_or_default();
    let location = request.location.unwrap_or_default();
    if area == 0.0 || quality.is_empty() || location.is_empty() {
        return Err(ApiError::bad_request("Missing required parameters"));
    }

    tracing::info!(area, quality = %quality, location = %location, "estimating construction cost");

    let estimate = assistant
        .estimate_cost(&CostInputs {
            area,
            quality,
            location,
        })
        .await?;
    Ok(Json(estimate))
}

async fn chat<C: ChatModel + 'static>(
    State(assistant): State<Arc<PlanningAssistant<C>>>,
    body: Bytes,
) -> Result<Json<ChatResponse>, ApiError> {
    let request: ChatApiRequest = parse_json(&body)?;
    if request.messages.is_empty() {
        return Err(ApiError::bad_request("No messages provided"));
    }

    let response = assistant.chat_reply(&request.messages).await?;
    Ok(Json(ChatResponse { response }))
}

async fn find_contractors<C: ChatModel + 'static>(
    State(assistant): State<Arc<PlanningAssistant<C>>>,
    body: Bytes,
) -> Result<Json<ContractorsResponse>, ApiError> {
    let request: SearchRequest = parse_json(&body)?;
    let contractors = assistant.find_contractors(&request.into()).await?;
    tracing::info!(count = contractors.len(), "contractor search complete");
    Ok(Json(ContractorsResponse { contractors }))
}

async fn find_designers<C: ChatModel + 'static>(
    State(assistant): State<Arc<PlanningAssistant<C>>>,
    body: Bytes,
) -> Result<Json<DesignersResponse>, ApiError> {
    let request: SearchRequest = parse_json(&body)?;
    let designers = assistant.find_designers(&request.into()).await?;
    tracing::info!(count = designers.len(), "designer search complete");
    Ok(Json(DesignersResponse { designers }))
}

fn parse_json<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    if body.is_empty() {
        return Err(ApiError::bad_request("request body is required"));
    }

    serde_json::from_slice(body)
        .map_err(|err| ApiError::bad_request(format!("invalid JSON body: {err}")))
}
