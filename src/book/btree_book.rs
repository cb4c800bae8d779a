use std::fmt::Display;

use eq_float::F64;
use tracing::{debug, warn};

use crate::{
    book::{
        side::{AskSide, BidSide},
        Bbo, Book, BookError, Metadata, PriceLevelView, Snapshot,
    },
    common::{Clock, Price, Quantity},
    event::{Event, EventKind},
    order::{Order, OrderId, OrderKind},
    store::{OrderHandle, OrderIndex, OrderStore},
};

use super::BookId;

/// Limit order book where each side of the book is an ordered mapping (using
/// B-trees) keyed on price
///
/// Orders live in a single [`OrderStore`]; the price levels and the
/// identifier index only hold handles into it.
#[derive(Clone, Debug)]
pub struct BTreeBook {
    /// Metadata for the market this book represents
    metadata: Metadata,
    /// Event log for this book (describes all mutations)
    events: Vec<Event>,
    /// Owner of every resting order
    orders: OrderStore,
    /// Identifier to handle mapping for every resting order
    index: OrderIndex,
    /// Bid-side of the market
    bids: BidSide,
    /// Ask-side of the market
    asks: AskSide,
    /// Identifier handed to the next new order
    next_order_id: OrderId,
    clock: Clock,
}

impl Display for BTreeBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let asks: Vec<PriceLevelView> = self.asks.levels().collect();

        let col_width = 17;

        writeln!(f, "{:>17} | {:<17}", "BIDS", "ASKS")?;

        for ask in asks.iter().rev() {
            writeln!(
                f,
                "{} | {:<8.2} {:<8}",
                " ".repeat(col_width),
                ask.price,
                ask.quantity
            )?;
        }

        for bid in self.bids.levels() {
            writeln!(f, "{:8.2} {:8} |", bid.price, bid.quantity)?;
        }

        Ok(())
    }
}

impl BTreeBook {
    pub fn new(id: BookId, name: String, ticker: String) -> Self {
        Self::meta(Metadata { id, name, ticker })
    }

    pub fn meta(metadata: Metadata) -> Self {
        Self {
            metadata,
            events: vec![],
            orders: OrderStore::new(),
            index: OrderIndex::new(),
            bids: BidSide::new(),
            asks: AskSide::new(),
            next_order_id: 1,
            clock: Clock::new(),
        }
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Number of resting orders
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Identifiers of the orders resting at `price`, in time priority
    pub fn orders_at(&self, kind: OrderKind, price: Price) -> Vec<OrderId> {
        let level = match kind {
            OrderKind::Bid => self.bids.level(price),
            OrderKind::Ask => self.asks.level(price),
        };

        level
            .map(|level| level.iter(&self.orders).map(Order::id).collect())
            .unwrap_or_default()
    }

    fn validate(price: Price, quantity: Quantity) -> Result<(), BookError> {
        if !price.is_finite() || price <= 0.0 {
            return Err(BookError::InvalidPrice(price));
        }
        if quantity == 0 {
            return Err(BookError::InvalidQuantity);
        }
        Ok(())
    }

    /// Fail unless `kind`'s side can hold `new` in place of `old`. A level
    /// never holds more than its side, so this bounds every aggregate.
    fn check_capacity(
        &self,
        kind: OrderKind,
        old: Quantity,
        new: Quantity,
    ) -> Result<(), BookError> {
        let total = match kind {
            OrderKind::Bid => self.bids.total_quantity(),
            OrderKind::Ask => self.asks.total_quantity(),
        };
        (total - old)
            .checked_add(new)
            .map(|_| ())
            .ok_or(BookError::QuantityOverflow)
    }

    /// Insert (post) an order to its side of the book
    fn add_order(&mut self, handle: OrderHandle) {
        match self.orders.resolve(handle).kind() {
            OrderKind::Bid => self.bids.add_order(&mut self.orders, handle),
            OrderKind::Ask => self.asks.add_order(&mut self.orders, handle),
        }
    }

    fn remove_order(&mut self, handle: OrderHandle) {
        match self.orders.resolve(handle).kind() {
            OrderKind::Bid => self.bids.remove_order(&mut self.orders, handle),
            OrderKind::Ask => self.asks.remove_order(&mut self.orders, handle),
        }
    }
}

impl Book for BTreeBook {
    type Error = BookError;

    fn id(&self) -> BookId {
        self.metadata.id
    }

    fn name(&self) -> String {
        self.metadata.name.clone()
    }

    fn ticker(&self) -> String {
        self.metadata.ticker.clone()
    }

    fn new_order(
        &mut self,
        kind: OrderKind,
        price: Price,
        quantity: Quantity,
    ) -> Result<OrderId, BookError> {
        if let Err(e) = Self::validate(price, quantity) {
            warn!(%kind, price, quantity, "rejected new order: {e}");
            return Err(e);
        }
        if let Err(e) = self.check_capacity(kind, 0, quantity) {
            warn!(%kind, price, quantity, "rejected new order: {e}");
            return Err(e);
        }

        let id = self.next_order_id;
        self.next_order_id += 1;

        let order = Order::new(id, kind, price, quantity, self.clock.now());
        let created = order.created_at();
        let handle = self.orders.allocate(order.clone());
        self.index.insert(id, handle);
        self.add_order(handle);

        debug!(order_id = id, %kind, price, quantity, "posted order");
        self.events.push(Event::new(created, EventKind::Post(order)));
        Ok(id)
    }

    fn cancel_order(&mut self, order_id: OrderId) -> bool {
        let Some(handle) = self.index.lookup(order_id) else {
            debug!(order_id, "cancel for unknown order");
            return false;
        };

        self.remove_order(handle);
        self.index.remove(order_id);
        let order = match self.orders.release(handle) {
            Some(order) => order,
            None => panic!(
                "Book corrupted: order {} indexed but not stored",
                order_id
            ),
        };

        debug!(
            order_id,
            kind = %order.kind(),
            price = order.price(),
            quantity = order.quantity(),
            "cancelled order"
        );
        self.events
            .push(Event::new(self.clock.now(), EventKind::Cancel(order)));
        true
    }

    fn amend_order(
        &mut self,
        order_id: OrderId,
        price: Price,
        quantity: Quantity,
    ) -> Result<bool, BookError> {
        if let Err(e) = Self::validate(price, quantity) {
            warn!(order_id, price, quantity, "rejected amendment: {e}");
            return Err(e);
        }

        let Some(handle) = self.index.lookup(order_id) else {
            debug!(order_id, "amend for unknown order");
            return Ok(false);
        };

        let order = self.orders.resolve(handle);
        let (kind, old_price, old_quantity) =
            (order.kind(), order.price(), order.quantity());

        if let Err(e) = self.check_capacity(kind, old_quantity, quantity) {
            warn!(order_id, price, quantity, "rejected amendment: {e}");
            return Err(e);
        }

        let now = self.clock.now();

        if F64(old_price) == F64(price) {
            // Keeps its place in the queue, even when growing
            self.orders.resolve_mut(handle).amend(price, quantity, now);
            match kind {
                OrderKind::Bid => {
                    self.bids.adjust_quantity(price, old_quantity, quantity)
                }
                OrderKind::Ask => {
                    self.asks.adjust_quantity(price, old_quantity, quantity)
                }
            }
        } else {
            self.remove_order(handle);
            self.orders.resolve_mut(handle).amend(price, quantity, now);
            self.add_order(handle);
        }

        debug!(
            order_id,
            %kind,
            old_price,
            old_quantity,
            price,
            quantity,
            "amended order"
        );
        let order = self.orders.resolve(handle).clone();
        self.events.push(Event::new(now, EventKind::Amend(order)));
        Ok(true)
    }

    fn order(&self, order_id: OrderId) -> Option<Order> {
        self.index
            .lookup(order_id)
            .and_then(|handle| self.orders.get(handle))
            .cloned()
    }

    fn snapshot(&self, depth: usize) -> Snapshot {
        Snapshot {
            bids: self.bids.levels().take(depth).collect(),
            asks: self.asks.levels().take(depth).collect(),
        }
    }

    fn bbo(&self) -> Bbo {
        Bbo {
            bid: self.bids.best().unwrap_or(PriceLevelView::EMPTY),
            ask: self.asks.best().unwrap_or(PriceLevelView::EMPTY),
        }
    }

    fn top(&self) -> (Option<Price>, Option<Price>) {
        (
            self.bids.best().map(|x| x.price),
            self.asks.best().map(|x| x.price),
        )
    }

    fn depth(&self) -> (Quantity, Quantity) {
        (self.bids.total_quantity(), self.asks.total_quantity())
    }

    fn crossed(&self) -> bool {
        match self.top() {
            (Some(best_bid), Some(best_ask)) => best_bid >= best_ask,
            _ => false,
        }
    }
}
