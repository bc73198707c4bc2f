//! Request-reply bridge tests against the in-memory broker.

use std::sync::Arc;
use std::time::{Duration, Instant};

use predict_gateway::bridge::{BridgeError, RpcBridge};
use predict_gateway::broker::{OutboundMessage, ReplyMessage, JSON_CONTENT_TYPE};
use predict_gateway::prediction::PredictionRequest;

mod common;
use common::FakeBroker;

const WORK_QUEUE: &str = "mnist_requests";

fn bridge(broker: &Arc<FakeBroker>, timeout: Duration) -> RpcBridge {
    RpcBridge::new(broker.clone(), WORK_QUEUE, timeout)
}

fn request() -> PredictionRequest {
    PredictionRequest::new(common::blank_image()).unwrap()
}

#[tokio::test]
async fn test_round_trip_returns_worker_reply() {
    let broker = FakeBroker::predicting(7);
    let reply = bridge(&broker, Duration::from_secs(5))
        .send(&request())
        .await
        .unwrap();

    assert_eq!(reply, common::one_hot(7));
}

#[tokio::test]
async fn test_publishes_once_with_reply_address() {
    let broker = FakeBroker::predicting(3);
    bridge(&broker, Duration::from_secs(5))
        .send(&request())
        .await
        .unwrap();

    let declared = broker.declared();
    let published = broker.published();
    assert_eq!(declared.len(), 1);
    assert_eq!(broker.consumed(), declared);
    assert_eq!(published.len(), 1);

    let (routing_key, message) = &published[0];
    assert_eq!(routing_key, WORK_QUEUE);
    assert_eq!(message.reply_to, declared[0]);
    assert_eq!(message.content_type, JSON_CONTENT_TYPE);
    assert!(uuid::Uuid::parse_str(&message.correlation_id).is_ok());

    let body: serde_json::Value = serde_json::from_slice(&message.body).unwrap();
    assert_eq!(body["image"].as_array().unwrap().len(), 784);

    assert_eq!(broker.deleted(), declared);
}

#[tokio::test]
async fn test_timeout_releases_reply_queue_once() {
    let broker = FakeBroker::silent();
    let start = Instant::now();
    let err = bridge(&broker, Duration::from_millis(100))
        .send(&request())
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::Timeout { .. }), "got {err:?}");
    assert!(start.elapsed() >= Duration::from_millis(100));
    assert_eq!(broker.deleted(), broker.declared());
}

#[tokio::test]
async fn test_slow_reply_within_deadline_succeeds() {
    let broker = FakeBroker::predicting(4);
    broker.set_reply_delay(Duration::from_millis(50));

    let reply = bridge(&broker, Duration::from_secs(2))
        .send(&request())
        .await
        .unwrap();
    assert_eq!(reply.digit, 4);
}

#[tokio::test]
async fn test_per_call_timeout_overrides_default() {
    let broker = FakeBroker::predicting(4);
    broker.set_reply_delay(Duration::from_millis(300));

    let err = bridge(&broker, Duration::from_secs(5))
        .send_with_timeout(&request(), Duration::from_millis(50))
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::Timeout { .. }));
}

#[tokio::test]
async fn test_mismatched_correlation_fails_fast() {
    let broker = FakeBroker::new(Arc::new(|_: &OutboundMessage| {
        Some(ReplyMessage {
            correlation_id: Some(uuid::Uuid::new_v4().to_string()),
            body: serde_json::to_vec(&common::one_hot(1)).unwrap(),
        })
    }));

    let start = Instant::now();
    let err = bridge(&broker, Duration::from_secs(5))
        .send(&request())
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::CorrelationMismatch { .. }), "got {err:?}");
    assert!(err.is_timeout_equivalent());
    assert!(start.elapsed() < Duration::from_secs(1));
    assert_eq!(broker.deleted(), broker.declared());
}

#[tokio::test]
async fn test_missing_correlation_is_a_mismatch() {
    let broker = FakeBroker::new(Arc::new(|_: &OutboundMessage| {
        Some(ReplyMessage {
            correlation_id: None,
            body: serde_json::to_vec(&common::one_hot(1)).unwrap(),
        })
    }));

    let err = bridge(&broker, Duration::from_secs(5))
        .send(&request())
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::CorrelationMismatch { .. }));
}

#[tokio::test]
async fn test_malformed_reply_is_distinct_error() {
    let broker = FakeBroker::new(Arc::new(|message: &OutboundMessage| {
        Some(ReplyMessage {
            correlation_id: Some(message.correlation_id.clone()),
            body: b"{\"digit\":\"seven\"}".to_vec(),
        })
    }));

    let err = bridge(&broker, Duration::from_secs(5))
        .send(&request())
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::MalformedReply { .. }), "got {err:?}");
    assert!(!err.is_timeout_equivalent());
    assert_eq!(broker.deleted().len(), 1);
}

#[tokio::test]
async fn test_publish_failure_releases_reply_queue() {
    let broker = FakeBroker::predicting(2);
    broker.fail_publish(true);

    let err = bridge(&broker, Duration::from_secs(5))
        .send(&request())
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::Publish { .. }), "got {err:?}");
    assert_eq!(broker.declared().len(), 1);
    assert_eq!(broker.deleted(), broker.declared());
}

#[tokio::test]
async fn test_consume_failure_deletes_queue_without_publishing() {
    let broker = FakeBroker::predicting(2);
    broker.fail_consume(true);

    let err = bridge(&broker, Duration::from_secs(5))
        .send(&request())
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::Consume(_)), "got {err:?}");
    assert!(broker.published().is_empty());
    assert_eq!(broker.deleted(), broker.declared());
}

#[tokio::test]
async fn test_declare_failure_publishes_nothing() {
    let broker = FakeBroker::predicting(2);
    broker.fail_declare(true);

    let err = bridge(&broker, Duration::from_secs(5))
        .send(&request())
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::ReplyQueue(_)), "got {err:?}");
    assert!(broker.published().is_empty());
    assert!(broker.deleted().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_get_their_own_replies() {
    let broker = FakeBroker::new(Arc::new(|message: &OutboundMessage| {
        // The digit is smuggled through the first pixel.
        let body: serde_json::Value = serde_json::from_slice(&message.body).unwrap();
        let digit = body["image"][0].as_f64().unwrap() as i32;
        Some(ReplyMessage {
            correlation_id: Some(message.correlation_id.clone()),
            body: serde_json::to_vec(&common::one_hot(digit)).unwrap(),
        })
    }));
    broker.set_reply_delay(Duration::from_millis(20));
    let bridge = bridge(&broker, Duration::from_secs(5));

    let mut handles = Vec::new();
    for i in 0..50 {
        let bridge = bridge.clone();
        handles.push(tokio::spawn(async move {
            let digit = i % 10;
            let mut image = common::blank_image();
            image[0] = digit as f32;
            let reply = bridge
                .send(&PredictionRequest::new(image).unwrap())
                .await
                .unwrap();
            assert_eq!(reply.digit, digit);
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let mut ids: Vec<String> = broker
        .published()
        .into_iter()
        .map(|(_, m)| m.correlation_id)
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 50);
    assert_eq!(broker.deleted().len(), 50);
}

#[tokio::test]
async fn test_abandoned_request_still_deletes_queue() {
    let broker = FakeBroker::silent();
    let bridge = bridge(&broker, Duration::from_secs(30));

    let task = tokio::spawn(async move { bridge.send(&request()).await });
    assert!(broker.wait_for(|b| b.published().len() == 1).await);

    task.abort();
    let _ = task.await;

    assert!(broker.wait_for(|b| b.deleted().len() == 1).await);
    assert_eq!(broker.deleted(), broker.declared());
}

#[tokio::test]
async fn test_delivery_error_names_the_request() {
    let broker = FakeBroker::predicting(2);
    broker.fail_delivery(true);

    let err = bridge(&broker, Duration::from_secs(5))
        .send(&request())
        .await
        .unwrap_err();

    let published = broker.published();
    match &err {
        BridgeError::Receive { correlation_id, .. } => {
            assert_eq!(correlation_id, &published[0].1.correlation_id)
        }
        other => panic!("expected receive error, got {other:?}"),
    }
    assert!(err.to_string().contains(&published[0].1.correlation_id));
    assert_eq!(broker.deleted(), broker.declared());
}

#[tokio::test]
async fn test_closed_broker_fails_before_publishing() {
    let broker = FakeBroker::predicting(2);
    broker.set_live(false);

    let err = bridge(&broker, Duration::from_secs(5))
        .send(&request())
        .await
        .unwrap_err();

    assert!(
        matches!(err, BridgeError::ReplyQueue(predict_gateway::broker::BrokerError::Closed)),
        "got {err:?}"
    );
    assert!(broker.published().is_empty());
}
