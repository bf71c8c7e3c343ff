use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use rm_api::{create_router, test_state};
use rm_common::{ExperienceTier, Job, Resume, ResumeProfile};

fn seed_job(id: &str, skills: &[&str]) -> Job {
    Job {
        id: id.into(),
        title: "Full-Stack Engineer".into(),
        company: "Acme".into(),
        location: "Berlin".into(),
        industry: "software".into(),
        experience_tier: ExperienceTier::Mid,
        skills: skills.iter().map(|s| s.to_string()).collect(),
        ..Job::default()
    }
}

fn seed_resume(id: &str) -> Resume {
    Resume {
        id: id.into(),
        raw_text: "react and node engineer".into(),
        profile: ResumeProfile {
            skills: vec!["react".into(), "node.js".into()],
            primary_role: "Full-Stack Engineer".into(),
            industries: vec!["software".into()],
            experience_tier: ExperienceTier::Mid,
            years_experience: 4.0,
        },
        embedding: None,
    }
}

#[tokio::test]
async fn match_endpoint_requires_api_key() {
    let (state, _store) = test_state("secret");
    let app = create_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/matches")
                .header("content-type", "application/json")
                .body(Body::from(json!({"resume_id": "r1"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn match_endpoint_returns_ranked_matches() {
    let (state, store) = test_state("secret");
    store.add_job(seed_job("job-a", &["react", "node.js", "typescript"]));
    store.add_job(seed_job("job-b", &["salesforce", "crm"]));
    store.add_resume(seed_resume("r1"));

    let app = create_router(state);
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/matches")
                .header("content-type", "application/json")
                .header("x-api-key", "secret")
                .body(Body::from(
                    json!({"resume_id": "r1", "limit": 5}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    let matches = body["matches"].as_array().unwrap();
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0]["job_id"], "job-a");
    assert_eq!(body["stats"]["total_jobs"], 2);
    assert_eq!(body["stats"]["matches_found"], 2);
}

#[tokio::test]
async fn unknown_resume_is_a_bad_request() {
    let (state, _store) = test_state("secret");
    let app = create_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/matches")
                .header("content-type", "application/json")
                .header("x-api-key", "secret")
                .body(Body::from(json!({"resume_id": "ghost"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn match_history_reflects_persisted_runs() {
    let (state, store) = test_state("secret");
    store.add_job(seed_job("job-a", &["react"]));
    store.add_resume(seed_resume("r1"));

    let app = create_router(state);

    let run = Request::builder()
        .method("POST")
        .uri("/api/matches")
        .header("content-type", "application/json")
        .header("x-api-key", "secret")
        .body(Body::from(json!({"resume_id": "r1"}).to_string()))
        .unwrap();
    let response = app.clone().oneshot(run).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let history = Request::builder()
        .uri("/api/resumes/r1/matches")
        .header("x-api-key", "secret")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(history).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let records: Value = serde_json::from_slice(&bytes).unwrap();
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["job_id"], "job-a");
    assert_eq!(records[0]["resume_id"], "r1");
}

#[tokio::test]
async fn history_for_unknown_resume_is_not_found() {
    let (state, _store) = test_state("secret");
    let app = create_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/resumes/ghost/matches")
                .header("x-api-key", "secret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_endpoints_respond() {
    let (state, _store) = test_state("secret");
    let app = create_router(state);

    let response = app
        .oneshot(Request::builder().uri("/livez").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
