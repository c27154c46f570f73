//! Integration tests for the geocoding resolver using wiremock.

use forecast_core::{
    Coordinate, DEFAULT_GEOCODE_LIMIT, Endpoints, Feed, ForecastError, LocationQuery,
    OpenWeatherService, StaticCredentials, WeatherService,
};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: &str = "GEO_KEY";

fn service(server: &MockServer) -> OpenWeatherService {
    OpenWeatherService::new(StaticCredentials::key(KEY))
        .unwrap()
        .with_endpoints(Endpoints::single(server.uri()))
}

fn springfields() -> serde_json::Value {
    json!([
        {
            "name": "Springfield",
            "local_names": { "en": "Springfield" },
            "lat": 39.7990,
            "lon": -89.6440,
            "country": "US",
            "state": "Illinois"
        },
        {
            "name": "Springfield",
            "lat": 37.2090,
            "lon": -93.2923,
            "country": "US",
            "state": "Missouri"
        }
    ])
}

#[tokio::test]
async fn test_direct_lookup_keeps_upstream_order() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .and(query_param("q", "Springfield"))
        .and(query_param("limit", "5"))
        .and(query_param("appid", KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(springfields()))
        .expect(1)
        .mount(&server)
        .await;

    let query = LocationQuery::Text("Springfield".into());
    let resolution = service(&server)
        .resolve_location(&query, DEFAULT_GEOCODE_LIMIT)
        .await
        .unwrap();

    assert_eq!(resolution.matches.len(), 2);
    assert_eq!(resolution.matches[0].state.as_deref(), Some("Illinois"));
    assert_eq!(resolution.matches[1].state.as_deref(), Some("Missouri"));

    // The first upstream match is remembered, without re-ranking.
    let remembered = resolution.remembered.unwrap();
    assert_eq!(remembered.label, "Springfield, Illinois, US");
    assert_eq!((remembered.lat, remembered.lon), (39.7990, -89.6440));
}

#[tokio::test]
async fn test_direct_lookup_without_matches_is_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let query = LocationQuery::Text("Atlantis".into());
    let resolution = service(&server).resolve_location(&query, 5).await.unwrap();

    assert!(resolution.matches.is_empty());
    assert!(resolution.remembered.is_none());
}

#[tokio::test]
async fn test_reverse_lookup_uses_coordinates_and_limit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geo/1.0/reverse"))
        .and(query_param("lat", "51.5098"))
        .and(query_param("lon", "-0.118"))
        .and(query_param("limit", "1"))
        .and(query_param("appid", KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "name": "London", "lat": 51.5073, "lon": -0.1276, "country": "GB", "state": "England" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let coords = Coordinate::new(51.5098, -0.118).unwrap();
    let query = LocationQuery::from_parts(None, Some(coords)).unwrap();
    let resolution = service(&server).resolve_location(&query, 1).await.unwrap();

    let remembered = resolution.remembered.unwrap();
    assert_eq!(remembered.label, "London, England, GB");
    // The caller's coordinates are kept, not the provider's.
    assert_eq!((remembered.lat, remembered.lon), (51.5098, -0.118));
}

#[tokio::test]
async fn test_upstream_error_carries_status_and_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "cod": 401, "message": "Invalid API key" })),
        )
        .mount(&server)
        .await;

    let query = LocationQuery::Text("Paris".into());
    let err = service(&server).resolve_location(&query, 5).await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(err.feed(), Some(Feed::Geocoding));
    assert!(err.to_string().contains("Invalid API key"));
}

#[tokio::test]
async fn test_missing_credential_makes_no_requests() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let err = OpenWeatherService::new(StaticCredentials::missing())
        .unwrap()
        .with_endpoints(Endpoints::single(server.uri()))
        .resolve_location(&LocationQuery::Text("Paris".into()), 5)
        .await
        .unwrap_err();

    assert!(matches!(err, ForecastError::UpstreamConfigMissing { .. }));
}

#[test]
fn test_missing_query_and_coordinates_is_invalid() {
    let err = LocationQuery::from_parts(None, None).unwrap_err();
    assert!(matches!(err, ForecastError::InvalidRequest(_)));
}

#[tokio::test]
async fn test_matches_without_coordinates_are_skipped() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "name": "Lisbon", "country": "PT" },
            { "name": "Lisbon", "lat": 38.7223, "lon": -9.1393, "country": "PT" }
        ])))
        .mount(&server)
        .await;

    let query = LocationQuery::Text("Lisbon".into());
    let resolution = service(&server).resolve_location(&query, 5).await.unwrap();

    assert_eq!(resolution.matches.len(), 1);
    let remembered = resolution.remembered.unwrap();
    assert_eq!((remembered.lat, remembered.lon), (38.7223, -9.1393));
}

#[tokio::test]
async fn test_non_list_geocoding_payload_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "cod": "200" })))
        .mount(&server)
        .await;

    let query = LocationQuery::Text("Lisbon".into());
    let err = service(&server).resolve_location(&query, 5).await.unwrap_err();

    assert_eq!(err.status(), Some(200));
    assert_eq!(err.feed(), Some(Feed::Geocoding));
}
