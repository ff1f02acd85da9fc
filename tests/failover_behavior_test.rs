//! Failover, selection and health behavior against mock providers.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use modelrelay::prelude::*;
use modelrelay::{ModelDescriptor, RelayConfig};

fn completion_response(model: &str, text: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "created": 1_700_000_000,
        "model": model,
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": text },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 3, "completion_tokens": 2, "total_tokens": 5 }
    })
}

/// Catalog of message-array models sharing one mock server.
fn config_of(server: &MockServer, models: &[(&str, u32)]) -> RelayConfig {
    RelayConfig {
        models: models
            .iter()
            .map(|(name, priority)| {
                ModelDescriptor::new(*name, ProviderKind::Kimi, "sk-test", server.uri(), *priority)
            })
            .collect(),
        default_model: models[0].0.to_string(),
    }
}

fn succeed_for(model: &'static str) -> Mock {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({ "model": model })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_response(model, "ok")))
}

fn fail_for(model: &'static str) -> Mock {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({ "model": model })))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
}

fn request() -> InvokeRequest {
    InvokeRequest::new(vec![Message::user("hi")])
}

#[tokio::test]
async fn failover_advances_to_the_next_candidate() {
    let server = MockServer::start().await;
    fail_for("alpha").expect(1).mount(&server).await;
    succeed_for("beta").expect(1).mount(&server).await;

    let client = RelayClient::new(config_of(&server, &[("alpha", 1), ("beta", 2)]));
    let result = client.invoke(request()).await.unwrap();

    assert_eq!(result.model, "beta");

    let status = client.status();
    let alpha = status.models.iter().find(|m| m.name == "alpha").unwrap();
    assert!(alpha.in_cooldown);
    assert!(alpha.healthy); // one failure does not flip classification
}

#[tokio::test]
async fn preferred_model_is_attempted_first_despite_priority() {
    let server = MockServer::start().await;
    succeed_for("gamma").expect(1).mount(&server).await;
    fail_for("alpha").expect(0).mount(&server).await;
    fail_for("beta").expect(0).mount(&server).await;

    let client = RelayClient::new(config_of(
        &server,
        &[("alpha", 1), ("beta", 2), ("gamma", 3)],
    ));
    let result = client.invoke(request().with_model("gamma")).await.unwrap();

    assert_eq!(result.model, "gamma");
}

#[tokio::test]
async fn failed_preferred_model_costs_exactly_one_extra_call() {
    let server = MockServer::start().await;
    fail_for("beta").expect(1).mount(&server).await;
    succeed_for("alpha").expect(1).mount(&server).await;
    fail_for("gamma").expect(0).mount(&server).await;

    let client = RelayClient::new(config_of(
        &server,
        &[("alpha", 1), ("beta", 2), ("gamma", 3)],
    ));
    let result = client.invoke(request().with_model("beta")).await.unwrap();

    assert_eq!(result.model, "alpha");
}

#[tokio::test]
async fn exhausting_all_candidates_aggregates_every_failure() {
    let server = MockServer::start().await;
    fail_for("alpha").expect(1).mount(&server).await;
    fail_for("beta").expect(1).mount(&server).await;

    let client = RelayClient::new(config_of(&server, &[("alpha", 1), ("beta", 2)]));
    let error = client.invoke(request()).await.unwrap_err();

    match error {
        LlmError::AllModelsFailed(failures) => {
            let models: Vec<_> = failures.iter().map(|f| f.model.as_str()).collect();
            assert_eq!(models, vec!["alpha", "beta"]);
        }
        other => panic!("unexpected error variant: {other:?}"),
    }
}

#[tokio::test]
async fn zero_enabled_models_fails_without_any_network_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = RelayConfig {
        models: vec![ModelDescriptor::new(
            "alpha",
            ProviderKind::Kimi,
            "",
            server.uri(),
            1,
        )],
        default_model: "alpha".to_string(),
    };

    let client = RelayClient::new(config);
    let error = client.invoke(request()).await.unwrap_err();
    assert!(matches!(error, LlmError::NoModelAvailable));
}

#[tokio::test]
async fn configuration_error_short_circuits_before_any_network_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = RelayClient::new(config_of(&server, &[("alpha", 1)]));
    let bad = request()
        .with_tools(vec![
            Tool::function("a", None, None),
            Tool::function("b", None, None),
        ])
        .with_tool_choice(ToolChoice::Required);

    let error = client.invoke(bad).await.unwrap_err();
    assert!(matches!(error, LlmError::ConfigurationError(_)));
}

#[tokio::test]
async fn unhealthy_model_is_excluded_from_selection() {
    let server = MockServer::start().await;
    // alpha fails on every call; beta always answers.
    fail_for("alpha").expect(3).mount(&server).await;
    succeed_for("beta").mount(&server).await;

    // Zero cooldown isolates the consecutive-failure classification.
    let client = RelayClient::builder(config_of(&server, &[("alpha", 1), ("beta", 2)]))
        .with_cooldown(Duration::ZERO)
        .build();

    // Three invocations: alpha fails each time, beta covers.
    for _ in 0..3 {
        let result = client.invoke(request()).await.unwrap();
        assert_eq!(result.model, "beta");
    }

    let status = client.status();
    let alpha = status.models.iter().find(|m| m.name == "alpha").unwrap();
    assert!(!alpha.healthy);
    assert_eq!(status.healthy, 1);

    // The fourth invocation must skip alpha entirely (its mock allows only 3 calls).
    let result = client.invoke(request()).await.unwrap();
    assert_eq!(result.model, "beta");

    client.reset_health();
    assert_eq!(client.status().healthy, 2);
}

#[tokio::test]
async fn cooldown_excludes_a_model_even_while_classified_healthy() {
    let server = MockServer::start().await;
    fail_for("alpha").expect(1).mount(&server).await;
    succeed_for("beta").expect(2).mount(&server).await;

    let client = RelayClient::builder(config_of(&server, &[("alpha", 1), ("beta", 2)]))
        .with_cooldown(Duration::from_secs(3600))
        .build();

    let first = client.invoke(request()).await.unwrap();
    assert_eq!(first.model, "beta");

    // alpha failed once: still healthy, but cooling down, so only beta is called.
    let second = client.invoke(request()).await.unwrap();
    assert_eq!(second.model, "beta");

    let alpha = client
        .status()
        .models
        .iter()
        .find(|m| m.name == "alpha")
        .cloned()
        .unwrap();
    assert!(alpha.healthy);
    assert!(alpha.in_cooldown);
}

#[tokio::test]
async fn total_outage_falls_back_to_trying_everything() {
    let server = MockServer::start().await;
    fail_for("alpha").mount(&server).await;
    fail_for("beta").mount(&server).await;

    let client = RelayClient::builder(config_of(&server, &[("alpha", 1), ("beta", 2)]))
        .with_failure_threshold(1)
        .with_cooldown(Duration::ZERO)
        .build();

    // One round marks both models unhealthy.
    let error = client.invoke(request()).await.unwrap_err();
    assert!(matches!(error, LlmError::AllModelsFailed(_)));
    assert_eq!(client.status().healthy, 0);

    // Providers recover; selection ignores the stale health signal rather
    // than reporting an outage with recovered backends.
    server.reset().await;
    succeed_for("alpha").expect(1).mount(&server).await;

    let result = client.invoke(request()).await.unwrap();
    assert_eq!(result.model, "alpha");
    // The success restores alpha; beta stays unhealthy until it is tried.
    assert_eq!(client.status().healthy, 1);
}

#[tokio::test]
async fn timeout_is_treated_like_any_other_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({ "model": "slow" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion_response("slow", "late"))
                .set_delay(Duration::from_millis(500)),
        )
        .expect(1)
        .mount(&server)
        .await;
    succeed_for("fast").expect(1).mount(&server).await;

    let config = RelayConfig {
        models: vec![
            ModelDescriptor::new("slow", ProviderKind::Kimi, "sk-test", server.uri(), 1)
                .with_timeout(Duration::from_millis(50)),
            ModelDescriptor::new("fast", ProviderKind::Kimi, "sk-test", server.uri(), 2),
        ],
        default_model: "slow".to_string(),
    };

    let client = RelayClient::new(config);
    let result = client.invoke(request()).await.unwrap();
    assert_eq!(result.model, "fast");
}
