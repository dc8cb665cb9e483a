//! Client for a Places-style structured search API (text search + details).

use crate::error::{AppError, Result};
use reqwest::Client;
use serde::Deserialize;
use std::fmt;

pub(crate) const DEFAULT_PLACES_BASE_URL: &str = "https://maps.googleapis.com/maps/api/place";

/// Classified non-OK `status` values returned by the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PlacesStatus {
    ZeroResults,
    InvalidRequest,
    OverQueryLimit,
    RequestDenied,
    NotFound,
    Other(String),
}

impl PlacesStatus {
    pub(crate) fn from_api(status: &str) -> Self {
        match status {
            "ZERO_RESULTS" => PlacesStatus::ZeroResults,
            "INVALID_REQUEST" => PlacesStatus::InvalidRequest,
            "OVER_QUERY_LIMIT" => PlacesStatus::OverQueryLimit,
            "REQUEST_DENIED" => PlacesStatus::RequestDenied,
            "NOT_FOUND" => PlacesStatus::NotFound,
            other => PlacesStatus::Other(other.to_string()),
        }
    }

    /// The source itself is unusable right now (quota or credentials), as
    /// opposed to this particular query having no answer.
    pub(crate) fn is_unavailable(&self) -> bool {
        matches!(self, PlacesStatus::OverQueryLimit | PlacesStatus::RequestDenied)
    }
}

impl fmt::Display for PlacesStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlacesStatus::ZeroResults => f.write_str("ZERO_RESULTS"),
            PlacesStatus::InvalidRequest => f.write_str("INVALID_REQUEST"),
            PlacesStatus::OverQueryLimit => f.write_str("OVER_QUERY_LIMIT"),
            PlacesStatus::RequestDenied => f.write_str("REQUEST_DENIED"),
            PlacesStatus::NotFound => f.write_str("NOT_FOUND"),
            PlacesStatus::Other(s) => f.write_str(s),
        }
    }
}

#[derive(Deserialize, Debug)]
struct TextSearchResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<PlaceResult>,
}

/// One text-search hit.
#[derive(Deserialize, Debug, Clone, Default)]
pub(crate) struct PlaceResult {
    pub place_id: Option<String>,
    #[serde(default)]
    pub name: String,
    pub formatted_address: Option<String>,
    pub rating: Option<f64>,
    pub user_ratings_total: Option<u32>,
    #[serde(default)]
    pub types: Vec<String>,
    pub business_status: Option<String>,
}

#[derive(Deserialize, Debug)]
struct DetailsResponse {
    status: String,
    #[serde(default)]
    result: Option<PlaceContact>,
}

/// Contact fields from the details sub-resource.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub(crate) struct PlaceContact {
    pub formatted_phone_number: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct PlacesClient {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl PlacesClient {
    pub(crate) fn new(http_client: Client, api_key: String, base_url: String) -> Self {
        Self {
            http_client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Runs a text search. Any non-OK status comes back as `AppError::Places`.
    pub(crate) async fn text_search(&self, query: &str) -> Result<Vec<PlaceResult>> {
        let url = format!("{}/textsearch/json", self.base_url);
        tracing::debug!(target: "places_task", "Text search: {}", query);

        let response: TextSearchResponse = self
            .http_client
            .get(&url)
            .query(&[("query", query), ("key", self.api_key.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.status != "OK" {
            return Err(AppError::Places {
                status: PlacesStatus::from_api(&response.status),
                message: response.error_message,
            });
        }
        Ok(response.results)
    }

    /// Fetches phone and website for a place. `Ok(None)` when the API has no details.
    pub(crate) async fn details(&self, place_id: &str) -> Result<Option<PlaceContact>> {
        let url = format!("{}/details/json", self.base_url);

        let response: DetailsResponse = self
            .http_client
            .get(&url)
            .query(&[
                ("place_id", place_id),
                ("key", self.api_key.as_str()),
                ("fields", "formatted_phone_number,website"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.status != "OK" {
            tracing::debug!(target: "places_task", "No details for {}: {}", place_id, response.status);
            return Ok(None);
        }
        Ok(response.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path, query_param},
    };

    fn client(server: &MockServer) -> PlacesClient {
        PlacesClient::new(Client::new(), "test-key".to_string(), server.uri())
    }

    #[tokio::test]
    async fn test_text_search_parses_results() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/textsearch/json"))
            .and(query_param("query", "dental clinic in Mumbai, India"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "OK",
                "results": [
                    {
                        "place_id": "p1",
                        "name": "Smile Dental",
                        "formatted_address": "Andheri West, Mumbai",
                        "rating": 3.4,
                        "user_ratings_total": 12,
                        "types": ["dentist", "health"]
                    },
                    { "name": "No Id Clinic" }
                ]
            })))
            .mount(&mock_server)
            .await;

        let results = client(&mock_server)
            .text_search("dental clinic in Mumbai, India")
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].place_id.as_deref(), Some("p1"));
        assert_eq!(results[0].user_ratings_total, Some(12));
        assert_eq!(results[0].types, vec!["dentist", "health"]);
        assert_eq!(results[1].place_id, None);
        assert_eq!(results[1].rating, None);
    }

    #[tokio::test]
    async fn test_text_search_classifies_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/textsearch/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "REQUEST_DENIED",
                "error_message": "The provided API key is invalid.",
                "results": []
            })))
            .mount(&mock_server)
            .await;

        let err = client(&mock_server).text_search("gym in Pune, India").await.unwrap_err();
        match err {
            AppError::Places { status, message } => {
                assert_eq!(status, PlacesStatus::RequestDenied);
                assert!(status.is_unavailable());
                assert_eq!(message.as_deref(), Some("The provided API key is invalid."));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_details_missing_is_none() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/details/json"))
            .and(query_param("place_id", "p1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "OK",
                "result": { "formatted_phone_number": "022 1234 5678", "website": "https://smile.in" }
            })))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/details/json"))
            .and(query_param("place_id", "p2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "NOT_FOUND" })))
            .mount(&mock_server)
            .await;

        let places = client(&mock_server);
        let details = places.details("p1").await.unwrap().unwrap();
        assert_eq!(details.formatted_phone_number.as_deref(), Some("022 1234 5678"));
        assert_eq!(details.website.as_deref(), Some("https://smile.in"));
        assert_eq!(places.details("p2").await.unwrap(), None);
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(PlacesStatus::from_api("ZERO_RESULTS"), PlacesStatus::ZeroResults);
        assert!(!PlacesStatus::ZeroResults.is_unavailable());
        assert!(PlacesStatus::from_api("OVER_QUERY_LIMIT").is_unavailable());
        assert_eq!(
            PlacesStatus::from_api("UNKNOWN_ERROR").to_string(),
            "UNKNOWN_ERROR"
        );
    }
}
