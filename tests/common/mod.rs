//! Shared utilities for integration tests: an in-memory broker that plays
//! the part of the worker pool.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::sync::mpsc;

use predict_gateway::broker::{
    BrokerError, BrokerResult, MessageBroker, OutboundMessage, ReplyMessage, ReplyStream,
};
use predict_gateway::prediction::{PredictionResponse, CLASS_COUNT, IMAGE_SIZE};

/// Decides what the "worker" sends back for a published request.
/// `None` means the worker stays silent.
pub type Responder = Arc<dyn Fn(&OutboundMessage) -> Option<ReplyMessage> + Send + Sync>;

type ReplySender = mpsc::UnboundedSender<BrokerResult<ReplyMessage>>;
type ReplyReceiver = mpsc::UnboundedReceiver<BrokerResult<ReplyMessage>>;

#[derive(Default)]
struct Recorded {
    senders: HashMap<String, ReplySender>,
    pending: HashMap<String, ReplyReceiver>,
    declared: Vec<String>,
    consumed: Vec<String>,
    published: Vec<(String, OutboundMessage)>,
    deleted: Vec<String>,
}

pub struct FakeBroker {
    recorded: Mutex<Recorded>,
    responder: Responder,
    reply_delay: Mutex<Duration>,
    live: AtomicBool,
    fail_declare: AtomicBool,
    fail_consume: AtomicBool,
    fail_publish: AtomicBool,
    fail_delivery: AtomicBool,
    next_queue: AtomicU64,
}

impl FakeBroker {
    pub fn new(responder: Responder) -> Arc<Self> {
        Arc::new(Self {
            recorded: Mutex::new(Recorded::default()),
            responder,
            reply_delay: Mutex::new(Duration::ZERO),
            live: AtomicBool::new(true),
            fail_declare: AtomicBool::new(false),
            fail_consume: AtomicBool::new(false),
            fail_publish: AtomicBool::new(false),
            fail_delivery: AtomicBool::new(false),
            next_queue: AtomicU64::new(1),
        })
    }

    /// A worker that always predicts `digit` and echoes the correlation ID.
    pub fn predicting(digit: i32) -> Arc<Self> {
        Self::new(Arc::new(move |message: &OutboundMessage| {
            Some(ReplyMessage {
                correlation_id: Some(message.correlation_id.clone()),
                body: serde_json::to_vec(&one_hot(digit)).unwrap(),
            })
        }))
    }

    /// A worker that never answers.
    pub fn silent() -> Arc<Self> {
        Self::new(Arc::new(|_: &OutboundMessage| None))
    }

    pub fn set_reply_delay(&self, delay: Duration) {
        *self.reply_delay.lock().unwrap() = delay;
    }

    pub fn set_live(&self, live: bool) {
        self.live.store(live, Ordering::SeqCst);
    }

    pub fn fail_declare(&self, fail: bool) {
        self.fail_declare.store(fail, Ordering::SeqCst);
    }

    pub fn fail_consume(&self, fail: bool) {
        self.fail_consume.store(fail, Ordering::SeqCst);
    }

    pub fn fail_publish(&self, fail: bool) {
        self.fail_publish.store(fail, Ordering::SeqCst);
    }

    /// Push a consumer error onto the reply queue instead of the reply.
    pub fn fail_delivery(&self, fail: bool) {
        self.fail_delivery.store(fail, Ordering::SeqCst);
    }

    pub fn declared(&self) -> Vec<String> {
        self.recorded.lock().unwrap().declared.clone()
    }

    pub fn consumed(&self) -> Vec<String> {
        self.recorded.lock().unwrap().consumed.clone()
    }

    pub fn published(&self) -> Vec<(String, OutboundMessage)> {
        self.recorded.lock().unwrap().published.clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.recorded.lock().unwrap().deleted.clone()
    }

    /// Poll until `check` holds or a second passes.
    pub async fn wait_for(&self, check: impl Fn(&Self) -> bool) -> bool {
        for _ in 0..100 {
            if check(self) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        check(self)
    }
}

#[async_trait]
impl MessageBroker for FakeBroker {
    async fn declare_reply_queue(&self) -> BrokerResult<String> {
        if !self.is_live() {
            return Err(BrokerError::Closed);
        }
        if self.fail_declare.load(Ordering::SeqCst) {
            return Err(BrokerError::Unavailable("declare refused".into()));
        }
        let name = format!("amq.gen-{}", self.next_queue.fetch_add(1, Ordering::SeqCst));
        let (tx, rx) = mpsc::unbounded_channel();

        let mut recorded = self.recorded.lock().unwrap();
        recorded.senders.insert(name.clone(), tx);
        recorded.pending.insert(name.clone(), rx);
        recorded.declared.push(name.clone());
        Ok(name)
    }

    async fn consume(&self, queue: &str) -> BrokerResult<ReplyStream> {
        if self.fail_consume.load(Ordering::SeqCst) {
            return Err(BrokerError::Unavailable("consume refused".into()));
        }
        let mut recorded = self.recorded.lock().unwrap();
        let rx = recorded
            .pending
            .remove(queue)
            .ok_or_else(|| BrokerError::Unavailable(format!("no queue {}", queue)))?;
        recorded.consumed.push(queue.to_string());

        let stream = futures_util::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });
        Ok(stream.boxed())
    }

    async fn publish(&self, routing_key: &str, message: OutboundMessage) -> BrokerResult<()> {
        if !self.is_live() {
            return Err(BrokerError::Closed);
        }
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(BrokerError::Unavailable("publish refused".into()));
        }

        let reply = if self.fail_delivery.load(Ordering::SeqCst) {
            Some(Err(BrokerError::Unavailable("delivery failed".into())))
        } else {
            (self.responder)(&message).map(Ok)
        };
        let delay = *self.reply_delay.lock().unwrap();

        let sender = {
            let mut recorded = self.recorded.lock().unwrap();
            recorded
                .published
                .push((routing_key.to_string(), message.clone()));
            recorded.senders.get(&message.reply_to).cloned()
        };

        if let (Some(reply), Some(sender)) = (reply, sender) {
            if delay.is_zero() {
                let _ = sender.send(reply);
            } else {
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = sender.send(reply);
                });
            }
        }
        Ok(())
    }

    async fn delete_queue(&self, queue: &str) -> BrokerResult<()> {
        let mut recorded = self.recorded.lock().unwrap();
        recorded.senders.remove(queue);
        recorded.pending.remove(queue);
        recorded.deleted.push(queue.to_string());
        Ok(())
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}

/// A reply that puts all probability on `digit`.
pub fn one_hot(digit: i32) -> PredictionResponse {
    let mut probabilities = [0.0f32; CLASS_COUNT];
    probabilities[digit as usize] = 1.0;
    PredictionResponse {
        digit,
        probabilities,
    }
}

/// A valid 784-value image.
pub fn blank_image() -> Vec<f32> {
    vec![0.0; IMAGE_SIZE]
}
