use axum::{extract::State, Json};
use serde_json::json;
use tokio::time::{timeout, Duration};

use crate::error::ApiError;
use crate::SharedState;

const READINESS_TIMEOUT: Duration = Duration::from_secs(1);

pub async fn livez() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn readyz(State(state): State<SharedState>) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.readiness.load(std::sync::atomic::Ordering::SeqCst) {
        return Err(ApiError::ServiceUnavailable("shutting_down".into()));
    }

    // In-process stores have nothing to ping.
    if let Some(pool) = &state.pool {
        let client = timeout(READINESS_TIMEOUT, pool.get())
            .await
            .map_err(|_| ApiError::ServiceUnavailable("db_pool_timeout".into()))
            .and_then(|result| {
                result.map_err(|err| {
                    ApiError::ServiceUnavailable(format!(
                        "failed to check out pool connection: {err}"
                    ))
                })
            })?;

        timeout(READINESS_TIMEOUT, client.simple_query("SELECT 1"))
            .await
            .map_err(|_| ApiError::ServiceUnavailable("db_ping_timeout".into()))
            .and_then(|result| {
                result.map_err(|err| {
                    ApiError::ServiceUnavailable(format!("health check failed: {err}"))
                })
            })?;
    }

    Ok(Json(json!({
        "status": "ok",
        "application": env!("CARGO_PKG_NAME"),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_state;

    #[tokio::test]
    async fn readyz_rejects_when_shutting_down() {
        let (state, _store) = test_state("test-key");
        state
            .readiness
            .store(false, std::sync::atomic::Ordering::SeqCst);

        match readyz(State(state)).await {
            Err(ApiError::ServiceUnavailable(code)) => assert!(code.contains("shutting_down")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn readyz_passes_without_a_database_pool() {
        let (state, _store) = test_state("test-key");
        let response = readyz(State(state)).await.unwrap();
        assert_eq!(response.0["status"], "ok");
    }
}
