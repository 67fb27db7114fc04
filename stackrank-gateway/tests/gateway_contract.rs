//! Backend contract tests for `HttpGateway`.
//!
//! These tests verify the exact HTTP shape of every call and the mapping of
//! each failure mode onto `GatewayError`, against a wiremock server.

use serde_json::json;
use stackrank_gateway::{
    Answer, AnswerGateway, AnswerId, GatewayConfig, GatewayError, HttpGateway, Owner, Query,
};
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gateway_for(server: &MockServer) -> HttpGateway {
    let config = GatewayConfig::new(server.uri()).with_timeout_seconds(2);
    HttpGateway::new(&config).unwrap_or_else(|e| panic!("gateway should build: {e}"))
}

fn answer_json(id: u64, score: i64, title: &str) -> serde_json::Value {
    json!({
        "answer_id": id,
        "body": format!("<p>answer {id}</p>"),
        "score": score,
        "is_accepted": false,
        "creation_date": 1_600_000_000,
        "owner": {"display_name": format!("user{id}")},
        "question": {"question_id": 900, "title": title, "link": "https://example.com/q/900"}
    })
}

fn answer(id: u64) -> Answer {
    Answer {
        answer_id: AnswerId(id),
        body: format!("<p>answer {id}</p>"),
        score: 1,
        is_accepted: false,
        creation_date: 0,
        owner: Owner::default(),
        question: None,
    }
}

// ── search ─────────────────────────────────────────────────────

#[tokio::test]
async fn search_posts_query_and_parses_answers() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/search"))
        .and(body_partial_json(json!({"query": "null pointer exception"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "query": "null pointer exception",
            "answers": [
                answer_json(1, 10, "What is a NullPointerException?"),
                answer_json(2, 50, "What is a NullPointerException?"),
            ],
            "total": 120,
            "suggestions": ["NullPointerException java"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let query = Query::new("  null pointer exception ").expect("valid query");
    let response = gateway.search(&query).await.expect("search should succeed");

    assert_eq!(response.answers.len(), 2);
    assert_eq!(response.answers[1].answer_id, AnswerId(2));
    assert_eq!(response.total, 120);
    assert_eq!(response.suggestions, vec!["NullPointerException java".to_owned()]);
}

#[tokio::test]
async fn search_total_defaults_to_answer_count() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "answers": [answer_json(7, 1, "t")]
        })))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let response = gateway
        .search(&Query::new("segfault").expect("valid"))
        .await
        .expect("search should succeed");
    assert_eq!(response.total, 1);
    assert_eq!(response.query, "segfault");
    assert!(response.suggestions.is_empty());
}

#[tokio::test]
async fn search_success_false_is_backend_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": "Stack Exchange quota exhausted"
        })))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let err = gateway
        .search(&Query::new("rust").expect("valid"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        GatewayError::Backend("Stack Exchange quota exhausted".into())
    );
}

#[tokio::test]
async fn search_success_false_without_message_uses_fallback() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": false})))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let err = gateway
        .search(&Query::new("rust").expect("valid"))
        .await
        .unwrap_err();
    assert_eq!(err, GatewayError::Backend("Search failed".into()));
}

#[tokio::test]
async fn search_missing_answers_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let err = gateway
        .search(&Query::new("rust").expect("valid"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Malformed(_)), "got {err:?}");
}

#[tokio::test]
async fn search_non_json_body_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let err = gateway
        .search(&Query::new("rust").expect("valid"))
        .await
        .unwrap_err();
    match err {
        GatewayError::Malformed(detail) => assert!(detail.starts_with("search:")),
        other => panic!("expected Malformed, got {other:?}"),
    }
}

#[tokio::test]
async fn search_500_maps_to_status_with_backend_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/search"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "success": false,
            "error": "database unavailable"
        })))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let err = gateway
        .search(&Query::new("rust").expect("valid"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        GatewayError::Status {
            status: 500,
            message: "database unavailable".into()
        }
    );
}

#[tokio::test]
async fn search_502_with_empty_body_uses_reason_phrase() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/search"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let err = gateway
        .search(&Query::new("rust").expect("valid"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        GatewayError::Status {
            status: 502,
            message: "Bad Gateway".into()
        }
    );
}

#[tokio::test]
async fn search_timeout_is_transport_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "answers": []}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let config = GatewayConfig::new(server.uri()).with_timeout_seconds(1);
    let gateway = HttpGateway::new(&config).expect("gateway");
    let err = gateway
        .search(&Query::new("rust").expect("valid"))
        .await
        .unwrap_err();
    assert_eq!(err, GatewayError::Transport("request timed out".into()));
}

#[tokio::test]
async fn search_connection_refused_is_transport_error() {
    // Bind then drop a plain listener so the port is known to be closed.
    let uri = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("local addr");
        format!("http://{addr}")
    };
    let gateway = HttpGateway::new(&GatewayConfig::new(uri).with_timeout_seconds(2)).expect("gateway");
    let err = gateway
        .search(&Query::new("rust").expect("valid"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Transport(_)), "got {err:?}");
}

// ── re-rank ────────────────────────────────────────────────────

#[tokio::test]
async fn rerank_posts_question_and_answers() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/re-rank"))
        .and(body_partial_json(json!({
            "question": "What is a NullPointerException?",
            "answers": [{"answer_id": 1}, {"answer_id": 2}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "ranked_answers": [
                {"answer_id": "2", "score": 9.0, "reason": "explains root cause"},
                {"answer_id": "1", "score": 3.0, "reason": "partial"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let response = gateway
        .rerank("What is a NullPointerException?", &[answer(1), answer(2)])
        .await
        .expect("rerank should succeed");

    assert_eq!(response.ranked.len(), 2);
    assert_eq!(response.ranked[0].canonical_id(), Some(AnswerId(2)));
    assert_eq!(response.ranked[0].reason, "explains root cause");
}

#[tokio::test]
async fn rerank_empty_answers_never_reaches_backend() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/re-rank"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let err = gateway.rerank("anything", &[]).await.unwrap_err();
    assert!(matches!(err, GatewayError::Precondition(_)));
}

#[tokio::test]
async fn rerank_success_false_is_backend_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/re-rank"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": "LLM not configured"
        })))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let err = gateway.rerank("q", &[answer(1)]).await.unwrap_err();
    assert_eq!(err, GatewayError::Backend("LLM not configured".into()));
}

#[tokio::test]
async fn rerank_missing_ranked_answers_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/re-rank"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let err = gateway.rerank("q", &[answer(1)]).await.unwrap_err();
    assert!(matches!(err, GatewayError::Malformed(_)), "got {err:?}");
}

// ── capability ─────────────────────────────────────────────────

#[tokio::test]
async fn probe_reads_llm_available_flag() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/llm-status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "llm_available": true,
            "message": "LLM ready"
        })))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    assert_eq!(gateway.probe_capability().await, Ok(true));
}

#[tokio::test]
async fn probe_success_false_is_backend_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/llm-status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "status unknown"
        })))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    assert_eq!(
        gateway.probe_capability().await,
        Err(GatewayError::Backend("status unknown".into()))
    );
}

#[tokio::test]
async fn probe_missing_flag_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/llm-status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    assert!(matches!(
        gateway.probe_capability().await,
        Err(GatewayError::Malformed(_))
    ));
}

// ── recent ─────────────────────────────────────────────────────

#[tokio::test]
async fn recent_searches_parses_list() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/recent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "recent_searches": [
                {"id": "a1", "query": "borrow checker", "inserted_at": "2024-05-01T10:00:00Z"},
                {"id": 2, "query": "lifetimes", "inserted_at": "2024-05-01T09:00:00Z"}
            ]
        })))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let recent = gateway.recent_searches().await.expect("recent should succeed");
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].query, "borrow checker");
    assert_eq!(recent[1].id, "2");
}

#[tokio::test]
async fn recent_searches_missing_list_is_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/recent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let recent = gateway.recent_searches().await.expect("recent should succeed");
    assert!(recent.is_empty());
}
