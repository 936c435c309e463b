use serde_json::json;
use std::time::{Duration, Instant};
use sumo_forwarder::domain::{Chunk, Record, SinkError};
use sumo_forwarder::sender::DeliveryError;
use sumo_forwarder::{Config, Sink, SumoSink};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn chunk() -> Chunk {
    let serde_json::Value::Object(fields) = json!({"message": "payload"}) else {
        unreachable!()
    };
    Chunk::new("tag", vec![Record::new(1_598_400_000, fields)])
}

fn config(endpoint: &str) -> Config {
    Config {
        endpoint: endpoint.to_string(),
        ..Config::default()
    }
}

#[tokio::test]
async fn disabled_retry_propagates_delivery_error_after_one_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let sink = SumoSink::new(config(&server.uri())).unwrap();
    let result = sink.write(&chunk()).await;

    match result {
        Err(SinkError::Delivery(e)) => {
            let message = e.to_string();
            assert!(message.contains("500"), "{message}");
            assert!(message.contains("boom"), "{message}");
        }
        other => panic!("expected delivery error, got {other:?}"),
    }
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn persistent_500_drops_after_max_attempts_without_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let sink = SumoSink::new(Config {
        use_internal_retry: true,
        retry_max_times: 3,
        retry_min_interval_secs: 1,
        retry_max_interval_secs: 1,
        ..config(&server.uri())
    })
    .unwrap();

    // Exhaustion is a silent drop from the caller's perspective.
    assert!(sink.write(&chunk()).await.is_ok());
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn retry_recovers_when_destination_comes_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let sink = SumoSink::new(Config {
        use_internal_retry: true,
        retry_max_times: 5,
        retry_min_interval_secs: 1,
        retry_max_interval_secs: 1,
        ..config(&server.uri())
    })
    .unwrap();

    assert!(sink.write(&chunk()).await.is_ok());
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn invalid_header_value_fails_fast_instead_of_retrying() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    // A control character in the resolved category can never become a valid
    // header, so the unit must not enter the backoff loop at all.
    let sink = SumoSink::new(Config {
        source_category: Some("bad\nvalue".to_string()),
        use_internal_retry: true,
        retry_max_times: 3,
        retry_min_interval_secs: 1,
        ..config(&server.uri())
    })
    .unwrap();

    let started = Instant::now();
    let result = sink.write(&chunk()).await;

    match result {
        Err(SinkError::Delivery(DeliveryError::InvalidHeader(name))) => {
            assert_eq!(name, "x-sumo-category");
        }
        other => panic!("expected invalid header error, got {other:?}"),
    }
    assert!(
        started.elapsed() < Duration::from_millis(500),
        "no backoff sleeps expected"
    );
    assert_eq!(server.received_requests().await.unwrap().len(), 0);
}

#[tokio::test]
async fn retried_bodies_are_byte_identical() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let sink = SumoSink::new(Config {
        use_internal_retry: true,
        retry_max_times: 2,
        retry_min_interval_secs: 1,
        compress: true,
        ..config(&server.uri())
    })
    .unwrap();

    assert!(sink.write(&chunk()).await.is_ok());

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 2);
    assert_eq!(received[0].body, received[1].body);
}
