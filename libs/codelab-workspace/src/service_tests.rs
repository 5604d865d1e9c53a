/// HTTP execution service tests
///
/// Each test serves a small axum router on an ephemeral port and points
/// `HttpExecutionService` at it, so the real reqwest path is exercised:
/// 1. Envelope unwrapping on success
/// 2. `success: false` and non-2xx map to `ServiceError::Api`
/// 3. Unreachable hosts and garbage bodies map to `ServiceError::Transport`

#[cfg(test)]
mod http_service_tests {
    use std::sync::{Arc, Mutex};

    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use codelab_common::config::ClientConfig;
    use codelab_common::types::{CustomTestCase, Language, McqSubmitRequest, QuestionType, RunRequest, SubmitRequest};
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    use crate::error::ServiceError;
    use crate::service::{ExecutionService, HttpExecutionService};

    async fn serve(router: Router) -> HttpExecutionService {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind mock backend");
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let config = ClientConfig::default().with_base_url(format!("http://{}/", addr));
        HttpExecutionService::new(config).expect("Failed to build service")
    }

    /// Router that records every body posted to `path` and answers with `reply`
    fn recording(path: &str, reply: Value) -> (Router, Arc<Mutex<Vec<Value>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let router = Router::new().route(
            path,
            post(move |Json(body): Json<Value>| {
                let sink = sink.clone();
                let reply = reply.clone();
                async move {
                    sink.lock().unwrap().push(body);
                    Json(reply)
                }
            }),
        );
        (router, seen)
    }

    fn run_request() -> RunRequest {
        RunRequest {
            problem_id: "sum".to_string(),
            code: "print(int(input()) + int(input()))".to_string(),
            language: Language::Python,
            custom_test_cases: Some(vec![CustomTestCase {
                input: "1 | 2".to_string(),
                output: "3".to_string(),
                is_hidden: false,
            }]),
        }
    }

    fn submit_request() -> SubmitRequest {
        SubmitRequest {
            problem_id: "sum".to_string(),
            contest_id: Some("c1".to_string()),
            code: "print(3)".to_string(),
            language: Language::Python,
        }
    }

    #[tokio::test]
    async fn test_run_unwraps_envelope() {
        let (router, seen) = recording(
            "/api/code/run",
            json!({
                "success": true,
                "data": {"results": [
                    {"isCorrect": true, "actualOutput": "3", "expectedOutput": "3", "time": 0.02, "status": "Accepted"}
                ]}
            }),
        );
        let service = serve(router).await;

        let data = service.run(&run_request()).await.unwrap();

        assert_eq!(data.results.len(), 1);
        assert!(data.results[0].is_correct);
        assert_eq!(data.results[0].actual_output.as_deref(), Some("3"));
        assert_eq!(data.results[0].time, Some(0.02));

        let body = seen.lock().unwrap()[0].clone();
        assert_eq!(body["problemId"], "sum");
        assert_eq!(body["language"], "python");
        assert_eq!(body["customTestCases"][0]["input"], "1 | 2");
        assert_eq!(body["customTestCases"][0]["isHidden"], false);
    }

    #[tokio::test]
    async fn test_run_without_data_yields_no_results() {
        let (router, _) = recording("/api/code/run", json!({"success": true}));
        let service = serve(router).await;

        let data = service.run(&run_request()).await.unwrap();
        assert!(data.results.is_empty());
    }

    #[tokio::test]
    async fn test_submit_never_sends_cases() {
        let (router, seen) = recording(
            "/api/code/submit",
            json!({
                "success": true,
                "data": {
                    "status": "Accepted",
                    "passedTests": 2,
                    "totalTests": 2,
                    "testResults": [
                        {"isCorrect": true, "isHidden": false, "testCaseNumber": 1},
                        {"isCorrect": true, "isHidden": true, "testCaseNumber": 2}
                    ]
                }
            }),
        );
        let service = serve(router).await;

        let data = service.submit(&submit_request()).await.unwrap();

        assert_eq!(data.status, "Accepted");
        assert_eq!(data.passed_tests, 2);
        assert!(data.test_results[1].is_hidden);
        assert_eq!(data.test_results[1].test_case_number, Some(2));

        let body = seen.lock().unwrap()[0].clone();
        assert_eq!(body["contestId"], "c1");
        assert!(body.get("customTestCases").is_none());
    }

    #[tokio::test]
    async fn test_submit_without_data_is_an_api_error() {
        let (router, _) = recording("/api/code/submit", json!({"success": true, "data": null}));
        let service = serve(router).await;

        let err = service.submit(&submit_request()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Api(_)));
    }

    #[tokio::test]
    async fn test_success_false_is_an_api_error() {
        let (router, _) = recording(
            "/api/code/run",
            json!({"success": false, "message": "Compiler pool exhausted"}),
        );
        let service = serve(router).await;

        let err = service.run(&run_request()).await.unwrap_err();
        assert_eq!(err, ServiceError::Api("Compiler pool exhausted".to_string()));
        assert_eq!(err.result_status(), "API Error");
    }

    #[tokio::test]
    async fn test_non_2xx_is_an_api_error() {
        let router = Router::new().route(
            "/api/code/run",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, Json(json!({"message": "Rate limited"}))) }),
        );
        let service = serve(router).await;

        let err = service.run(&run_request()).await.unwrap_err();
        assert_eq!(
            err,
            ServiceError::Api("Execution service returned 429: Rate limited".to_string())
        );
    }

    #[tokio::test]
    async fn test_non_json_body_is_a_transport_error() {
        let router = Router::new().route("/api/code/run", post(|| async { "<html>bad gateway</html>" }));
        let service = serve(router).await;

        let err = service.run(&run_request()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Transport(_)));
        assert_eq!(err.result_status(), "Execution Error");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = ClientConfig::default().with_base_url(format!("http://{}", addr));
        let service = HttpExecutionService::new(config).unwrap();

        let err = service.run(&run_request()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Transport(_)));
    }

    #[tokio::test]
    async fn test_mcq_submission_posts_option_index() {
        let (router, seen) = recording("/api/code/submit-mcq", json!({"success": true, "data": {"recorded": true}}));
        let service = serve(router).await;

        let request = McqSubmitRequest {
            problem_id: "q1".to_string(),
            contest_id: None,
            mcq_answer: 2,
            is_correct: true,
            question_type: QuestionType::Mcq,
        };
        service.submit_mcq(&request).await.unwrap();

        let body = seen.lock().unwrap()[0].clone();
        assert_eq!(body["problemId"], "q1");
        assert_eq!(body["mcqAnswer"], 2);
        assert_eq!(body["isCorrect"], true);
        assert_eq!(body["questionType"], "mcq");
        assert!(body.get("contestId").is_none());
    }
}
