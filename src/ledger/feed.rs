use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tracing::warn;

use crate::ledger::model::{Balance, Transaction};
use crate::ledger::orders::OrderRequest;

/// Events a subscriber may have queued before it falls behind.
const SUBSCRIBER_BUFFER: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum LedgerEvent {
    TransactionRecorded { transaction: Transaction, balance: Balance },
    OrderUpdated { order: OrderRequest },
}

impl LedgerEvent {
    fn parties(&self) -> (&str, &str) {
        match self {
            LedgerEvent::TransactionRecorded { transaction, .. } => (&transaction.farmer_id, &transaction.dealer_id),
            LedgerEvent::OrderUpdated { order } => (&order.farmer_id, &order.dealer_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Topic {
    Farmer(String),
    Dealer(String),
    Pair { farmer_id: String, dealer_id: String },
}

impl Topic {
    fn matches(&self, event: &LedgerEvent) -> bool {
        let (farmer, dealer) = event.parties();
        match self {
            Topic::Farmer(id) => id == farmer,
            Topic::Dealer(id) => id == dealer,
            Topic::Pair { farmer_id, dealer_id } => farmer_id == farmer && dealer_id == dealer,
        }
    }
}

struct Subscriber {
    topic: Topic,
    sender: Sender<LedgerEvent>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    subscribers: HashMap<u64, Subscriber>,
}

/// In-process fan-out of ledger changes.
#[derive(Clone, Default)]
pub struct ChangeFeed {
    registry: Arc<Mutex<Registry>>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, topic: Topic) -> Subscription {
        let (sender, receiver) = mpsc::channel(SUBSCRIBER_BUFFER);
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        registry.next_id += 1;
        let id = registry.next_id;
        registry.subscribers.insert(id, Subscriber { topic, sender });
        Subscription {
            id,
            registry: Arc::clone(&self.registry),
            receiver,
        }
    }

    /// Never blocks: a subscriber with a full queue misses the event, a
    /// subscriber whose handle is gone is removed.
    pub fn publish(&self, event: LedgerEvent) {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        registry.subscribers.retain(|id, sub| {
            if !sub.topic.matches(&event) {
                return true;
            }
            match sub.sender.try_send(event.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    warn!(subscriber = *id, "subscriber queue full, dropping ledger event");
                    true
                }
                Err(TrySendError::Closed(_)) => false,
            }
        });
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .subscribers
            .len()
    }
}

/// A registered interest in ledger events. Dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    registry: Arc<Mutex<Registry>>,
    receiver: Receiver<LedgerEvent>,
}

impl Subscription {
    /// Waits up to `timeout` for the first event, then drains whatever else is
    /// already queued.
    pub async fn wait(&mut self, timeout: Duration) -> Vec<LedgerEvent> {
        match tokio::time::timeout(timeout, self.receiver.recv()).await {
            Ok(Some(first)) => {
                let mut events = vec![first];
                events.append(&mut self.drain());
                events
            }
            Ok(None) | Err(_) => Vec::new(),
        }
    }

    /// Takes the queued events without waiting.
    pub fn drain(&mut self) -> Vec<LedgerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .subscribers
            .remove(&self.id);
    }
}
