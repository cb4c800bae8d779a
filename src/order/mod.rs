use std::fmt::{self, Display};

use arbitrary::Arbitrary;
use chrono::{DateTime, Utc};
use eq_float::F64;
use serde::{Deserialize, Serialize};

use crate::common::{Price, Quantity};

pub type OrderId = u64;

#[derive(
    Arbitrary, Copy, Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize,
)]
pub enum OrderKind {
    Bid,
    Ask,
}

impl Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderKind::Bid => write!(f, "BID"),
            OrderKind::Ask => write!(f, "ASK"),
        }
    }
}

/// A resting limit order
///
/// Identifier, side and arrival time are fixed at creation; price and
/// quantity change only through an amendment.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Order {
    id: OrderId,
    kind: OrderKind,
    price: Price,
    quantity: Quantity,
    created: DateTime<Utc>,
    modified: DateTime<Utc>,
}

impl PartialEq for Order {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.kind == other.kind
            && F64(self.price) == F64(other.price)
            && self.quantity == other.quantity
            && self.created == other.created
            && self.modified == other.modified
    }
}

impl Eq for Order {}

impl Order {
    pub fn new(
        id: OrderId,
        kind: OrderKind,
        price: Price,
        quantity: Quantity,
        created: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            kind,
            price,
            quantity,
            created,
            modified: created,
        }
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn kind(&self) -> OrderKind {
        self.kind
    }

    pub fn price(&self) -> Price {
        self.price
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Arrival time of the order
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created
    }

    pub fn modified_at(&self) -> DateTime<Utc> {
        self.modified
    }

    pub(crate) fn amend(
        &mut self,
        price: Price,
        quantity: Quantity,
        at: DateTime<Utc>,
    ) {
        self.price = price;
        self.quantity = quantity;
        self.modified = at;
    }
}
