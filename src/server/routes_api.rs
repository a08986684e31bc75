use crate::server::{AppContext, AppError};
use crate::state::{Job, JobStatus, JobView};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use hlsforged_common::{Error, JobId};
use serde::{Deserialize, Serialize};

/// Job routes, mounted both under `/api` and at the root for the bundled UI.
pub fn job_routes() -> Router<AppContext> {
    Router::new()
        .route("/process", post(process))
        .route("/status/:id", get(status))
}

pub fn api_routes() -> Router<AppContext> {
    job_routes().route("/jobs", get(list_jobs))
}

#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    #[serde(default, alias = "url")]
    pub manifest_reference: Option<String>,
    #[serde(default, alias = "audio_offset")]
    pub audio_offset_centiseconds: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub job_id: JobId,
}

async fn process(
    State(ctx): State<AppContext>,
    payload: Result<Json<ProcessRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ProcessResponse>), AppError> {
    let Json(request) =
        payload.map_err(|e| Error::validation(format!("invalid request body: {}", e.body_text())))?;

    let manifest_reference = request
        .manifest_reference
        .ok_or_else(|| Error::validation("manifest_reference is required"))?;

    let job_id = ctx.jobs.submit(
        &manifest_reference,
        request.audio_offset_centiseconds.unwrap_or(0),
    )?;

    Ok((StatusCode::ACCEPTED, Json(ProcessResponse { job_id })))
}

async fn status(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<JobView>, AppError> {
    let job = id
        .parse::<JobId>()
        .ok()
        .and_then(|id| ctx.registry().get(id))
        .ok_or_else(|| Error::not_found("job", &id))?;

    Ok(Json(job.view()))
}

#[derive(Debug, Deserialize)]
struct ListJobsQuery {
    status: Option<String>,
}

async fn list_jobs(
    State(ctx): State<AppContext>,
    Query(params): Query<ListJobsQuery>,
) -> Result<Json<Vec<Job>>, AppError> {
    let mut jobs = ctx.registry().list();

    if let Some(status) = params.status {
        let status: JobStatus = status.parse().map_err(Error::validation)?;
        jobs.retain(|j| j.status == status);
    }

    Ok(Json(jobs))
}
