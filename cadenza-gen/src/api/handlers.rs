//! HTTP request handlers
//!
//! Implements the generation API: plan, generate, status polling, and
//! artifact download. The public status collapses internal
//! Queued/Composing/Stitching into "processing"; only terminal states
//! are externally distinguished.

use crate::api::server::AppContext;
use crate::planner;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    Json,
};
use cadenza_common::{Error, GenerationOptions, Job, JobMetadata, JobStatus, Plan};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    error: String,
}

#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    prompt: String,
}

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    plan: Plan,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    prompt: String,
    #[serde(flatten)]
    options: GenerationOptions,
    /// Optional pre-built (possibly client-edited) plan; when absent
    /// the planner derives one from the prompt
    #[serde(default)]
    plan: Option<Plan>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    job_id: Uuid,
    status: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    job_id: Uuid,
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    progress: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<JobMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    audio_url: Option<String>,
}

impl StatusResponse {
    fn from_job(job: &Job) -> Self {
        let audio_url = match job.status {
            JobStatus::Completed => Some(format!("/download/{}", job.id)),
            _ => None,
        };
        Self {
            job_id: job.id,
            status: job.status.public_str().to_string(),
            progress: job.progress.clone(),
            metadata: job.metadata.clone(),
            error: job.error.clone(),
            audio_url,
        }
    }
}

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn error_response(e: Error) -> HandlerError {
    let status = match &e {
        Error::Validation(_) => StatusCode::BAD_REQUEST,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health - Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "generation".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// POST /plan - Return a song plan for the prompt without generating audio
pub async fn get_plan(Json(req): Json<PlanRequest>) -> Json<PlanResponse> {
    let plan = planner::plan(&req.prompt);
    Json(PlanResponse { plan })
}

/// POST /generate - Create a generation job
///
/// Returns a job id immediately; processing happens on the worker
/// pool. Validation failures return 400 and issue no job id.
pub async fn generate(
    State(ctx): State<AppContext>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, HandlerError> {
    // A supplied plan (possibly edited client-side) takes precedence
    // over the planner's derivation
    let plan = req.plan.unwrap_or_else(|| planner::plan(&req.prompt));

    match ctx.manager.create(req.prompt, plan, req.options).await {
        Ok(job_id) => Ok(Json(GenerateResponse {
            job_id,
            status: "processing".to_string(),
        })),
        Err(e) => {
            info!("Generate request rejected: {}", e);
            Err(error_response(e))
        }
    }
}

/// GET /status/:job_id - Poll a generation job
pub async fn get_status(
    State(ctx): State<AppContext>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<StatusResponse>, HandlerError> {
    let job = ctx.manager.get_status(job_id).await.map_err(error_response)?;
    Ok(Json(StatusResponse::from_job(&job)))
}

/// GET /download/:job_id - Download the generated audio file
///
/// Valid only once the job is completed; no partial or failed artifact
/// is ever served.
pub async fn download(
    State(ctx): State<AppContext>,
    Path(job_id): Path<Uuid>,
) -> Result<([(header::HeaderName, String); 2], Vec<u8>), HandlerError> {
    let job = ctx.manager.get_status(job_id).await.map_err(error_response)?;

    if job.status != JobStatus::Completed {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("generation not complete (status: {})", job.status.public_str()),
            }),
        ));
    }

    match ctx.publisher.retrieve(job_id) {
        Ok(bytes) => Ok((
            [
                (header::CONTENT_TYPE, "audio/wav".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}.wav\"", job_id),
                ),
            ],
            bytes,
        )),
        Err(e) => {
            error!("Failed to read artifact for job {}: {}", job_id, e);
            Err(error_response(e))
        }
    }
}
