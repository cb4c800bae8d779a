//! One side of the book: price levels kept in best-first order.
//!
//! Both sides share a single implementation. The only difference between them
//! is how a price maps onto the ordered key of the underlying B-tree, which is
//! captured by [`Priority`]: bids sort on the reversed price, asks on the
//! price itself, so the first entry of either map is always the best level.

use std::cmp::Reverse;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::marker::PhantomData;

use eq_float::F64;
use tracing::trace;

use crate::{
    common::{Price, Quantity},
    order::OrderKind,
    store::{OrderHandle, OrderStore},
};

use super::{level::PriceLevel, PriceLevelView};

/// Ordering of price levels on a side of the book
pub trait Priority: Clone + Copy + Debug + Default {
    type Key: Ord + Copy + Debug;

    /// The kind of order resting on this side
    const KIND: OrderKind;

    fn key(price: Price) -> Self::Key;
    fn price(key: &Self::Key) -> Price;
}

/// Highest price first
#[derive(Clone, Copy, Debug, Default)]
pub struct Descending;

impl Priority for Descending {
    type Key = Reverse<F64>;

    const KIND: OrderKind = OrderKind::Bid;

    fn key(price: Price) -> Self::Key {
        Reverse(F64(price))
    }

    fn price(key: &Self::Key) -> Price {
        key.0 .0
    }
}

/// Lowest price first
#[derive(Clone, Copy, Debug, Default)]
pub struct Ascending;

impl Priority for Ascending {
    type Key = F64;

    const KIND: OrderKind = OrderKind::Ask;

    fn key(price: Price) -> Self::Key {
        F64(price)
    }

    fn price(key: &Self::Key) -> Price {
        key.0
    }
}

pub type BidSide = BookSide<Descending>;
pub type AskSide = BookSide<Ascending>;

#[derive(Clone, Debug)]
pub struct BookSide<P: Priority> {
    levels: BTreeMap<P::Key, PriceLevel>,
    /// Sum of the aggregates of every level on this side
    total_quantity: Quantity,
    _priority: PhantomData<P>,
}

impl<P> Default for BookSide<P>
where
    P: Priority,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<P> BookSide<P>
where
    P: Priority,
{
    pub fn new() -> Self {
        Self {
            levels: BTreeMap::new(),
            total_quantity: 0,
            _priority: PhantomData,
        }
    }

    /// Rest an order at the back of the level for its price, creating the
    /// level if this is the first order there
    pub fn add_order(
        &mut self,
        store: &mut OrderStore,
        handle: OrderHandle,
    ) {
        let order = store.resolve(handle);
        let (price, quantity) = (order.price(), order.quantity());

        self.levels
            .entry(P::key(price))
            .or_insert_with(|| {
                trace!(kind = %P::KIND, price, "opened price level");
                PriceLevel::default()
            })
            .push_back(store, handle);
        self.total_quantity += quantity;
    }

    /// Unlink an order from its level, dropping the level once it is empty
    ///
    /// # Panics
    ///
    /// If no level exists at the order's price; the order was never added to
    /// this side or its price changed behind the side's back.
    pub fn remove_order(
        &mut self,
        store: &mut OrderStore,
        handle: OrderHandle,
    ) {
        let order = store.resolve(handle);
        let (id, price, quantity) =
            (order.id(), order.price(), order.quantity());

        match self.levels.entry(P::key(price)) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().remove(store, handle);
                if entry.get().is_empty() {
                    debug_assert_eq!(entry.get().total_quantity(), 0);
                    entry.remove();
                    trace!(kind = %P::KIND, price, "closed price level");
                }
            }
            Entry::Vacant(_) => panic!(
                "Book corrupted: no {} level at {} for resting order {}",
                P::KIND,
                price,
                id
            ),
        }
        self.total_quantity -= quantity;
    }

    /// Account for an order at `price` changing size from `old` to `new`
    /// while keeping its place in the queue
    pub fn adjust_quantity(
        &mut self,
        price: Price,
        old: Quantity,
        new: Quantity,
    ) {
        match self.levels.get_mut(&P::key(price)) {
            Some(level) => level.adjust(old, new),
            None => panic!(
                "Book corrupted: no {} level at {} to adjust",
                P::KIND,
                price
            ),
        }
        self.total_quantity = self.total_quantity - old + new;
    }

    pub fn best(&self) -> Option<PriceLevelView> {
        self.levels
            .first_key_value()
            .map(|(key, level)| Self::view(key, level))
    }

    /// Aggregated levels, best first
    pub fn levels(&self) -> impl Iterator<Item = PriceLevelView> + '_ {
        self.levels.iter().map(|(key, level)| Self::view(key, level))
    }

    pub fn level(&self, price: Price) -> Option<&PriceLevel> {
        self.levels.get(&P::key(price))
    }

    /// Levels with their prices, best first
    pub fn iter(&self) -> impl Iterator<Item = (Price, &PriceLevel)> + '_ {
        self.levels.iter().map(|(key, level)| (P::price(key), level))
    }

    pub fn total_quantity(&self) -> Quantity {
        self.total_quantity
    }

    /// Number of distinct price levels
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    fn view(key: &P::Key, level: &PriceLevel) -> PriceLevelView {
        PriceLevelView {
            price: P::price(key),
            quantity: level.total_quantity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::order::{Order, OrderId};

    use super::*;

    fn post<P: Priority>(
        side: &mut BookSide<P>,
        store: &mut OrderStore,
        id: OrderId,
        price: Price,
        quantity: Quantity,
    ) -> OrderHandle {
        let handle = store.allocate(Order::new(
            id,
            P::KIND,
            price,
            quantity,
            Utc::now(),
        ));
        side.add_order(store, handle);
        handle
    }

    fn prices<P: Priority>(side: &BookSide<P>) -> Vec<Price> {
        side.levels().map(|x| x.price).collect()
    }

    #[test]
    fn test_new_side_is_empty() {
        let bids = BidSide::new();
        let asks = AskSide::default();

        assert!(bids.is_empty() && asks.is_empty());
        assert_eq!(bids.best(), None);
        assert_eq!(asks.total_quantity(), 0);
    }

    #[test]
    fn test_bids_are_highest_first() {
        let mut store = OrderStore::new();
        let mut bids = BidSide::new();

        post(&mut bids, &mut store, 1, 99.0, 20);
        post(&mut bids, &mut store, 2, 100.0, 10);
        post(&mut bids, &mut store, 3, 98.5, 1);

        assert_eq!(prices(&bids), vec![100.0, 99.0, 98.5]);
        assert_eq!(
            bids.best(),
            Some(PriceLevelView {
                price: 100.0,
                quantity: 10
            })
        );
    }

    #[test]
    fn test_asks_are_lowest_first() {
        let mut store = OrderStore::new();
        let mut asks = AskSide::new();

        post(&mut asks, &mut store, 1, 102.0, 10);
        post(&mut asks, &mut store, 2, 100.0, 15);
        post(&mut asks, &mut store, 3, 101.0, 5);

        assert_eq!(prices(&asks), vec![100.0, 101.0, 102.0]);
        assert_eq!(
            asks.best(),
            Some(PriceLevelView {
                price: 100.0,
                quantity: 15
            })
        );
    }

    #[test]
    fn test_same_price_shares_level() {
        let mut store = OrderStore::new();
        let mut bids = BidSide::new();

        post(&mut bids, &mut store, 1, 100.0, 10);
        post(&mut bids, &mut store, 2, 100.0, 5);

        assert_eq!(bids.len(), 1);
        assert_eq!(bids.total_quantity(), 15);
        let level = bids.level(100.0).expect("level at 100.0");
        assert_eq!(level.len(), 2);
        assert_eq!(level.total_quantity(), 15);
    }

    #[test]
    fn test_removing_last_order_drops_level() {
        let mut store = OrderStore::new();
        let mut asks = AskSide::new();

        let lone = post(&mut asks, &mut store, 1, 102.0, 10);
        post(&mut asks, &mut store, 2, 101.0, 5);

        asks.remove_order(&mut store, lone);

        assert!(asks.level(102.0).is_none());
        assert_eq!(prices(&asks), vec![101.0]);
        assert_eq!(asks.total_quantity(), 5);
    }

    #[test]
    fn test_adjust_quantity_updates_level_and_side() {
        let mut store = OrderStore::new();
        let mut bids = BidSide::new();

        post(&mut bids, &mut store, 1, 99.0, 20);
        bids.adjust_quantity(99.0, 20, 25);

        assert_eq!(bids.level(99.0).map(PriceLevel::total_quantity), Some(25));
        assert_eq!(bids.total_quantity(), 25);
    }

    #[test]
    #[should_panic(expected = "no BID level")]
    fn test_removing_unknown_level_panics() {
        let mut store = OrderStore::new();
        let mut bids = BidSide::new();
        let handle = store.allocate(Order::new(
            1,
            OrderKind::Bid,
            100.0,
            10,
            Utc::now(),
        ));

        bids.remove_order(&mut store, handle);
    }
}
