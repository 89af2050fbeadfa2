//! Gateway Adapter Integration Tests
//! Test File: gateway_tests.rs
//!
//! Runs the HTTP adapters against wiremock servers standing in for the
//! hosted recognition and solver functions.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mm_pipeline::gateways::{
    AsrClient, GatewayError, GatewayHttp, MediaCapture, OcrClient, RecognitionGateway,
    SolverClient, SolvingGateway,
};
use mm_pipeline::models::{Topic, VerificationStatus};

fn http(server: &MockServer) -> GatewayHttp {
    GatewayHttp::new(server.uri(), Some("test-key".to_string()), Duration::from_secs(5))
}

fn png() -> MediaCapture {
    MediaCapture::new(b"png-bytes".to_vec(), "image/png")
}

/// TC-GW-001: OCR request carries data URL and auth headers
#[tokio::test]
async fn tc_gw_001_ocr_request_shape() {
    // Given: OCR function expecting the image as a data URL
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ocr-extract"))
        .and(header("authorization", "Bearer test-key"))
        .and(header("apikey", "test-key"))
        .and(body_json(json!({ "imageData": png().to_data_url() })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "extractedText": "  3x + 2 = 11  ",
            "confidence": 0.88
        })))
        .expect(1)
        .mount(&server)
        .await;

    // When: the image is recognized
    let extraction = OcrClient::new(http(&server)).recognize(&png()).await.unwrap();

    // Then: trimmed text with the reported confidence
    assert_eq!(extraction.text, "3x + 2 = 11");
    assert_eq!(extraction.confidence, 0.88);
}

/// TC-GW-002: OCR confidence heuristic when the service omits it
#[tokio::test]
async fn tc_gw_002_ocr_uncertainty_marker() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ocr-extract"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "extractedText": "x² + [?] = 4" })),
        )
        .mount(&server)
        .await;

    let extraction = OcrClient::new(http(&server)).recognize(&png()).await.unwrap();
    assert_eq!(extraction.confidence, 0.6);
}

/// TC-GW-003: ASR transcript is rewritten into math notation
#[tokio::test]
async fn tc_gw_003_asr_rewrites_notation() {
    let server = MockServer::start().await;
    let audio = MediaCapture::new(b"webm".to_vec(), "audio/webm");
    Mock::given(method("POST"))
        .and(path("/asr-transcribe"))
        .and(body_json(json!({ "audioData": audio.to_data_url() })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "extractedText": "integral of x squared from zero to infinity"
        })))
        .mount(&server)
        .await;

    let extraction = AsrClient::new(http(&server)).recognize(&audio).await.unwrap();

    assert_eq!(extraction.text, "∫ x ² from zero to ∞");
    assert_eq!(extraction.confidence, 0.9);
}

/// TC-GW-004: Solver payload is parsed and default-filled
#[tokio::test]
async fn tc_gw_004_solver_parses_solution() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/math-solver"))
        .and(body_json(json!({
            "problemText": "Find the derivative of x^2",
            "topic": "calculus"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "steps": [
                { "stepNumber": 1, "description": "Apply the power rule", "formula": "d/dx xⁿ = n·xⁿ⁻¹" },
                { "stepNumber": 2, "description": "Simplify", "result": "2x" }
            ],
            "finalAnswer": "2x",
            "confidence": 0.98,
            "verificationStatus": "verified",
            "retrievedContext": ["Power rule"]
        })))
        .mount(&server)
        .await;

    let solution = SolverClient::new(http(&server))
        .solve("Find the derivative of x^2", Topic::Calculus)
        .await
        .unwrap();

    assert_eq!(solution.steps.len(), 2);
    assert_eq!(solution.final_answer, "2x");
    assert_eq!(solution.verification_status, VerificationStatus::Verified);
    assert_eq!(solution.explanation, "Solution provided by AI.");
    assert_eq!(solution.retrieved_context, vec!["Power rule".to_string()]);
}

/// TC-GW-005: Status codes map to failure kinds
#[tokio::test]
async fn tc_gw_005_status_mapping() {
    let cases = [
        (429, GatewayError::RateLimited),
        (402, GatewayError::QuotaExhausted),
        (
            500,
            GatewayError::Upstream {
                status: Some(500),
                message: "AI API error: 500".to_string(),
            },
        ),
    ];

    for (status, expected) in cases {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/math-solver"))
            .respond_with(
                ResponseTemplate::new(status).set_body_json(json!({ "error": "AI API error: 500" })),
            )
            .mount(&server)
            .await;

        let result = SolverClient::new(http(&server))
            .solve("2 + 2", Topic::Unknown)
            .await;
        assert_eq!(result, Err(expected), "status {}", status);
    }
}

/// TC-GW-006: A 200 carrying an error body is an upstream failure
#[tokio::test]
async fn tc_gw_006_error_body_on_success_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ocr-extract"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "No image data provided",
            "extractedText": "",
            "confidence": 0
        })))
        .mount(&server)
        .await;

    let result = OcrClient::new(http(&server)).recognize(&png()).await;
    assert!(matches!(
        result,
        Err(GatewayError::Upstream { ref message, .. }) if message == "No image data provided"
    ));
}

/// TC-GW-007: Malformed payloads
#[tokio::test]
async fn tc_gw_007_malformed_responses() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/math-solver"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/asr-transcribe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "extractedText": "" })))
        .mount(&server)
        .await;

    let solver = SolverClient::new(http(&server)).solve("x", Topic::Algebra).await;
    assert!(matches!(solver, Err(GatewayError::MalformedResponse(_))));

    let asr = AsrClient::new(http(&server))
        .recognize(&MediaCapture::new(vec![1, 2, 3], "audio/wav"))
        .await;
    assert!(matches!(asr, Err(GatewayError::MalformedResponse(_))));
}

/// TC-GW-008: Timeouts surface as unreachable
#[tokio::test]
async fn tc_gw_008_timeout_is_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/math-solver"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "finalAnswer": "4" }))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let http = GatewayHttp::new(server.uri(), None, Duration::from_millis(50));
    let result = SolverClient::new(http).solve("2 + 2", Topic::Unknown).await;

    assert!(matches!(result, Err(GatewayError::Unreachable(_))));
}

/// TC-GW-009: Connection refused surfaces as unreachable
#[tokio::test]
async fn tc_gw_009_connection_refused() {
    // Bind then drop to get a port nobody listens on
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let http = GatewayHttp::new(
        format!("http://127.0.0.1:{}", port),
        None,
        Duration::from_secs(2),
    );

    let result = OcrClient::new(http).recognize(&png()).await;
    assert!(matches!(result, Err(GatewayError::Unreachable(_))));
}
