//! Request and response types for the cache server

use crate::error::AppError;
use serde::{Deserialize, Serialize};

const MISSING_TEAM: &str = "querystring should have required property teamid or slug";

/// Team selector accepted on every artifact route
#[derive(Debug, Default, Deserialize)]
pub struct TeamQuery {
    #[serde(rename = "teamId")]
    pub team_id: Option<String>,
    pub teamid: Option<String>,
    pub slug: Option<String>,
}

impl TeamQuery {
    /// First non-empty of `teamId`, `teamid`, `slug`
    pub fn team(&self) -> Result<&str, AppError> {
        [&self.team_id, &self.teamid, &self.slug]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|t| !t.is_empty())
            .ok_or_else(|| AppError::BadRequest(MISSING_TEAM.to_string()))
    }
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub started_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_query_precedence() {
        let query = TeamQuery {
            team_id: Some("from-team-id".to_string()),
            teamid: Some("from-teamid".to_string()),
            slug: Some("from-slug".to_string()),
        };
        assert_eq!(query.team().unwrap(), "from-team-id");

        let query = TeamQuery {
            team_id: Some(String::new()),
            teamid: None,
            slug: Some("acme".to_string()),
        };
        assert_eq!(query.team().unwrap(), "acme");
    }

    #[test]
    fn test_team_query_missing() {
        let err = TeamQuery::default().team().unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == MISSING_TEAM));
    }

    #[test]
    fn test_team_query_deserialization() {
        let query: TeamQuery = serde_json::from_str(r#"{"teamid":"acme"}"#).unwrap();
        assert_eq!(query.team().unwrap(), "acme");
    }

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "ok".to_string(),
            uptime_secs: 3600,
            started_at: "2026-01-01T00:00:00+00:00".to_string(),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(json.contains("3600"));
    }
}
