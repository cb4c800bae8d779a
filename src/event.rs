use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::order::Order;

/// A change to the book, carrying the order as it stood afterwards (for a
/// cancellation, as it stood when withdrawn)
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum EventKind {
    Post(Order),
    Amend(Order),
    Cancel(Order),
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Event {
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
}

impl Event {
    pub fn new(timestamp: DateTime<Utc>, kind: EventKind) -> Self {
        Self { timestamp, kind }
    }

    pub fn order(&self) -> &Order {
        match &self.kind {
            EventKind::Post(order)
            | EventKind::Amend(order)
            | EventKind::Cancel(order) => order,
        }
    }
}
