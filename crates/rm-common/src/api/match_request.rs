use serde::Deserialize;

/// Request body for running the matching pipeline over one résumé.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchRequest {
    pub resume_id: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_optional() {
        let request: MatchRequest = serde_json::from_str(r#"{"resume_id": "r1"}"#).unwrap();
        assert_eq!(request.resume_id, "r1");
        assert_eq!(request.limit, None);

        let request: MatchRequest =
            serde_json::from_str(r#"{"resume_id": "r1", "limit": 5}"#).unwrap();
        assert_eq!(request.limit, Some(5));
    }
}
