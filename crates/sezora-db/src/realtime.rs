//! Change feed: one event per committed row change, fanned out to every
//! subscriber. There is no replay; a subscriber that falls more than the
//! feed capacity behind is told how many events it lost.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::debug;

use sezora_types::events::{ChangeEvent, ChangeKind, Record, Table};

#[derive(Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
    active: Arc<AtomicUsize>,
    next_id: Arc<AtomicU64>,
}

/// OR of column equality clauses. An empty filter matches every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    clauses: Vec<(String, String)>,
}

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn where_eq(column: &str, value: impl ToString) -> Self {
        Self::all().or_eq(column, value)
    }

    pub fn or_eq(mut self, column: &str, value: impl ToString) -> Self {
        self.clauses.push((column.to_string(), value.to_string()));
        self
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.clauses.is_empty()
            || self
                .clauses
                .iter()
                .any(|(column, value)| record.column(column).as_deref() == Some(value.as_str()))
    }
}

/// What a subscription yields on each receive.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Event(ChangeEvent),
    /// The subscriber fell behind and this many events were dropped.
    Lagged(u64),
    /// The feed is gone; nothing more will arrive.
    Closed,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            active: Arc::new(AtomicUsize::new(0)),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Publish a committed change. Having no subscribers is fine.
    pub fn publish(&self, event: ChangeEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self, table: Table, kind: ChangeKind, filter: Filter) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.active.fetch_add(1, Ordering::AcqRel);
        debug!("Opened subscription {} on {:?}/{:?} {:?}", id, table, kind, filter);

        Subscription {
            id,
            table,
            kind,
            filter,
            rx: self.tx.subscribe(),
            active: self.active.clone(),
        }
    }

    /// Number of subscriptions not yet released.
    pub fn active_subscriptions(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }
}

/// A live subscription. Released when dropped.
pub struct Subscription {
    id: u64,
    table: Table,
    kind: ChangeKind,
    filter: Filter,
    rx: broadcast::Receiver<ChangeEvent>,
    active: Arc<AtomicUsize>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    fn wants(&self, event: &ChangeEvent) -> bool {
        event.kind == self.kind && event.table() == self.table && self.filter.matches(&event.record)
    }

    /// Wait for the next matching event.
    pub async fn recv(&mut self) -> Delivery {
        loop {
            match self.rx.recv().await {
                Ok(event) if self.wants(&event) => return Delivery::Event(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(n)) => return Delivery::Lagged(n),
                Err(RecvError::Closed) => return Delivery::Closed,
            }
        }
    }

    /// Next matching event if one is already queued.
    pub fn try_recv(&mut self) -> Option<Delivery> {
        loop {
            match self.rx.try_recv() {
                Ok(event) if self.wants(&event) => return Some(Delivery::Event(event)),
                Ok(_) => continue,
                Err(TryRecvError::Lagged(n)) => return Some(Delivery::Lagged(n)),
                Err(TryRecvError::Closed) => return Some(Delivery::Closed),
                Err(TryRecvError::Empty) => return None,
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::AcqRel);
        debug!("Released subscription {}", self.id);
    }
}
