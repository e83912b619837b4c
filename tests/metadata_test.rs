//! TMDB client against a mock HTTP server.

use assert_matches::assert_matches;
use marquee::config::TmdbConfig;
use marquee::metadata::{MetadataClient, TmdbClient};
use marquee_common::{SearchError, DEFAULT_REJECTION_MESSAGE, GENERIC_FETCH_MESSAGE};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> TmdbClient {
    TmdbClient::new(&TmdbConfig {
        api_key: "test-token".into(),
        base_url: server.uri(),
        ..TmdbConfig::default()
    })
}

fn results_body() -> serde_json::Value {
    json!({
        "page": 1,
        "results": [
            {
                "id": 268,
                "title": "Batman",
                "poster_path": "/cij4dd21v2Rk2YtUQbV5kW69WB2.jpg",
                "popularity": 48.2,
                "vote_average": 7.2,
                "release_date": "1989-06-21",
                "original_language": "en"
            },
            {
                "id": 414906,
                "title": "The Batman",
                "poster_path": null,
                "popularity": 120.5,
                "vote_average": 7.7,
                "release_date": "2022-03-01",
                "original_language": "en"
            }
        ],
        "total_pages": 1,
        "total_results": 2
    })
}

#[tokio::test]
async fn search_sends_query_and_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .and(query_param("query", "batman"))
        .and(header("authorization", "Bearer test-token"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(results_body()))
        .expect(1)
        .mount(&server)
        .await;

    let movies = client_for(&server).search("batman").await.unwrap();

    assert_eq!(movies.len(), 2);
    assert_eq!(movies[0].id, 268);
    assert_eq!(movies[0].title, "Batman");
    assert_eq!(movies[0].release_year(), Some(1989));
    assert_eq!(movies[0].original_language.as_deref(), Some("en"));
    assert_eq!(movies[1].poster_path, None);
}

#[tokio::test]
async fn blank_query_lists_popular_movies() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/discover/movie"))
        .and(query_param("sort_by", "popularity.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(results_body()))
        .expect(1)
        .mount(&server)
        .await;

    let movies = client_for(&server).search("").await.unwrap();
    assert_eq!(movies.len(), 2);
}

#[tokio::test]
async fn null_results_are_an_empty_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 1,
            "results": null,
            "total_results": 0
        })))
        .mount(&server)
        .await;

    let movies = client_for(&server).search("zzzzqx").await.unwrap();
    assert!(movies.is_empty());
}

#[tokio::test]
async fn flagged_failure_is_a_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "status_code": 7,
            "status_message": "Invalid API key"
        })))
        .mount(&server)
        .await;

    let err = client_for(&server).search("alien").await.unwrap_err();
    assert_matches!(&err, SearchError::Rejected(m) if m == "Invalid API key");
    assert_eq!(err.user_message(), "Invalid API key");
}

#[tokio::test]
async fn rejection_without_message_uses_default() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Response": "False" })))
        .mount(&server)
        .await;

    let err = client_for(&server).search("alien").await.unwrap_err();
    assert!(err.is_rejection());
    assert_eq!(err.user_message(), DEFAULT_REJECTION_MESSAGE);
}

#[tokio::test]
async fn server_error_is_a_fetch_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let err = client_for(&server).search("heat").await.unwrap_err();
    assert_matches!(&err, SearchError::Fetch(detail) if detail.contains("500"));
    assert_eq!(err.user_message(), GENERIC_FETCH_MESSAGE);
}

#[tokio::test]
async fn unauthorized_status_is_a_fetch_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "success": false,
            "status_message": "Invalid API key"
        })))
        .mount(&server)
        .await;

    let err = client_for(&server).search("heat").await.unwrap_err();
    assert!(!err.is_rejection());
}

#[tokio::test]
async fn malformed_body_is_a_fetch_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).search("heat").await.unwrap_err();
    assert_matches!(err, SearchError::Fetch(_));
}

#[tokio::test]
async fn unreachable_service_is_a_fetch_failure() {
    let client = TmdbClient::new(&TmdbConfig {
        api_key: "test-token".into(),
        base_url: "http://127.0.0.1:1".into(),
        timeout_secs: 2,
        ..TmdbConfig::default()
    });

    let err = client.search("heat").await.unwrap_err();
    assert_matches!(err, SearchError::Fetch(_));
}
