use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use docsync_http::{HttpExecutor, HttpRequest, ReqwestExecutor};

#[tokio::test]
async fn test_get_with_query_and_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/1/classes/GameScore"))
        .and(query_param("limit", "10"))
        .and(header("X-Parse-Application-Id", "app"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [{"objectId": "a"}]
        })))
        .mount(&server)
        .await;

    let url = format!("{}/1/classes/GameScore", server.uri());

    let response = tokio::task::spawn_blocking(move || {
        let executor = ReqwestExecutor::with_default_timeout().unwrap();
        executor
            .execute(
                &HttpRequest::get(url)
                    .with_header("X-Parse-Application-Id", "app")
                    .with_query("limit", "10"),
            )
            .unwrap()
    })
    .await
    .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.json().unwrap()["results"][0]["objectId"], "a");
}

#[tokio::test]
async fn test_post_sends_json_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/1/classes/GameScore"))
        .and(body_json(serde_json::json!({"score": 1234})))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "objectId": "xyz",
            "createdAt": "2015-01-01T00:00:00.000Z"
        })))
        .mount(&server)
        .await;

    let url = format!("{}/1/classes/GameScore", server.uri());

    let response = tokio::task::spawn_blocking(move || {
        let executor = ReqwestExecutor::with_default_timeout().unwrap();
        executor
            .execute(&HttpRequest::post(url).with_json_body(serde_json::json!({"score": 1234})))
            .unwrap()
    })
    .await
    .unwrap();

    assert_eq!(response.status, 201);
    assert_eq!(response.json().unwrap()["objectId"], "xyz");
}

#[tokio::test]
async fn test_error_status_is_not_a_transport_error() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/1/classes/GameScore/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "code": 101,
            "error": "object not found for delete"
        })))
        .mount(&server)
        .await;

    let url = format!("{}/1/classes/GameScore/missing", server.uri());

    let response = tokio::task::spawn_blocking(move || {
        let executor = ReqwestExecutor::with_default_timeout().unwrap();
        executor.execute(&HttpRequest::delete(url)).unwrap()
    })
    .await
    .unwrap();

    assert!(response.is_client_error());
    assert_eq!(response.json().unwrap()["code"], 101);
}

#[test]
fn test_unreachable_host_is_transport_error() {
    let executor = ReqwestExecutor::new(std::time::Duration::from_secs(2)).unwrap();
    let result = executor.execute(&HttpRequest::get("http://127.0.0.1:1/unreachable"));
    assert!(result.is_err());
}

#[test]
fn test_malformed_url_is_rejected() {
    let executor = ReqwestExecutor::with_default_timeout().unwrap();
    let result = executor.execute(&HttpRequest::get("not a url"));
    assert!(matches!(result, Err(docsync_http::Error::UrlParse(_))));
}
