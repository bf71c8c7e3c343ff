use axum::{
    extract::{Path, State},
    Json,
};

use rm_common::api::{FindMatchesResponse, MatchRecordDto, MatchRequest};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::SharedState;

const DEFAULT_MATCH_LIMIT: usize = 10;
const HISTORY_LIMIT: i64 = 100;

/// Run the matching pipeline for one résumé and return ranked matches plus
/// run statistics.
pub async fn run_match(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Json(request): Json<MatchRequest>,
) -> Result<Json<FindMatchesResponse>, ApiError> {
    if request.resume_id.trim().is_empty() {
        return Err(ApiError::BadRequest("resume_id is required".into()));
    }

    let limit = request.limit.unwrap_or(DEFAULT_MATCH_LIMIT);
    let outcome = state.service.find_matches(&request.resume_id, limit).await?;

    Ok(Json(FindMatchesResponse::from(&outcome)))
}

/// Persisted match history for a résumé, newest first.
pub async fn match_history(
    State(state): State<SharedState>,
    Path(resume_id): Path<String>,
    _auth: AuthUser,
) -> Result<Json<Vec<MatchRecordDto>>, ApiError> {
    if state.store.get_resume(&resume_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("resume {resume_id} not found")));
    }

    let records = state
        .store
        .matches_for_resume(&resume_id, HISTORY_LIMIT)
        .await?;

    Ok(Json(records.iter().map(MatchRecordDto::from).collect()))
}
