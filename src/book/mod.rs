pub mod btree_book;
pub mod level;
pub mod side;

use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    common::{Price, Quantity},
    order::{Order, OrderId, OrderKind},
};

pub type BookId = u64;

#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum BookError {
    #[error("price must be finite and greater than zero (got {0})")]
    InvalidPrice(Price),
    #[error("quantity must be greater than zero")]
    InvalidQuantity,
    #[error("resting quantity on this side would exceed the maximum")]
    QuantityOverflow,
}

/// Aggregate resting interest at one price
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct PriceLevelView {
    pub price: Price,
    pub quantity: Quantity,
}

impl PriceLevelView {
    /// Stands in for a side with no resting orders. Never a real level, since
    /// orders at a price of zero are rejected.
    pub const EMPTY: PriceLevelView = PriceLevelView {
        price: 0.0,
        quantity: 0,
    };

    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }
}

/// Best levels of both sides, each in best-first order
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Snapshot {
    pub bids: Vec<PriceLevelView>,
    pub asks: Vec<PriceLevelView>,
}

/// Best bid and offer
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Bbo {
    pub bid: PriceLevelView,
    pub ask: PriceLevelView,
}

/// Information about the market a book represents
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Metadata {
    /// A unique identifier for the book
    pub id: BookId,
    /// The human-readable name of the market
    pub name: String,
    /// The abbreviated, human-readable identifier of the market
    pub ticker: String,
}

/// Resting-order state of a two-sided limit order book under price-time
/// priority. Orders are never matched against each other.
pub trait Book: Clone + Debug {
    type Error;

    fn id(&self) -> BookId;
    fn name(&self) -> String;
    fn ticker(&self) -> String;

    /// Rest a new order, returning its freshly assigned identifier
    fn new_order(
        &mut self,
        kind: OrderKind,
        price: Price,
        quantity: Quantity,
    ) -> Result<OrderId, Self::Error>;

    /// Withdraw a resting order. `false` if no such order is resting.
    fn cancel_order(&mut self, order_id: OrderId) -> bool;

    /// Change the price and/or quantity of a resting order. `Ok(false)` if no
    /// such order is resting.
    fn amend_order(
        &mut self,
        order_id: OrderId,
        price: Price,
        quantity: Quantity,
    ) -> Result<bool, Self::Error>;

    fn order(&self, order_id: OrderId) -> Option<Order>;

    /// Up to `depth` aggregated levels per side
    fn snapshot(&self, depth: usize) -> Snapshot;

    /// Best level of each side, [`PriceLevelView::EMPTY`] for an empty side
    fn bbo(&self) -> Bbo;

    /// Best price of each side, if any
    fn top(&self) -> (Option<Price>, Option<Price>);

    /// Total resting quantity of each side
    fn depth(&self) -> (Quantity, Quantity);

    fn crossed(&self) -> bool;
}
