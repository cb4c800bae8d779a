use crate::{
    common::Quantity,
    order::Order,
    store::{OrderHandle, OrderStore},
};

/// All resting orders at a single price on one side of the book
///
/// Orders form a doubly-linked FIFO threaded through the store (each order
/// carries its own prev/next links), so removal from any position is O(1).
#[derive(Clone, Debug, Default)]
pub struct PriceLevel {
    head: Option<OrderHandle>,
    tail: Option<OrderHandle>,
    total_quantity: Quantity,
    len: usize,
}

impl PriceLevel {
    pub fn total_quantity(&self) -> Quantity {
        self.total_quantity
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append an order at the back of the queue
    pub(crate) fn push_back(
        &mut self,
        store: &mut OrderStore,
        handle: OrderHandle,
    ) {
        let quantity = store.resolve(handle).quantity();

        {
            let link = store.link_mut(handle);
            link.prev = self.tail;
            link.next = None;
        }

        match self.tail {
            Some(tail) => store.link_mut(tail).next = Some(handle),
            None => self.head = Some(handle),
        }

        self.tail = Some(handle);
        self.total_quantity += quantity;
        self.len += 1;
    }

    /// Unlink an order from wherever it sits in the queue. The order must
    /// currently be linked into this level.
    pub(crate) fn remove(
        &mut self,
        store: &mut OrderStore,
        handle: OrderHandle,
    ) {
        let quantity = store.resolve(handle).quantity();
        let link = store.link(handle);

        match link.prev {
            Some(prev) => store.link_mut(prev).next = link.next,
            None => self.head = link.next,
        }
        match link.next {
            Some(next) => store.link_mut(next).prev = link.prev,
            None => self.tail = link.prev,
        }

        *store.link_mut(handle) = Default::default();
        self.total_quantity -= quantity;
        self.len -= 1;
    }

    /// Replace `old` with `new` in the aggregate without touching the queue
    pub(crate) fn adjust(&mut self, old: Quantity, new: Quantity) {
        self.total_quantity = self.total_quantity - old + new;
    }

    /// Resting orders, oldest first
    pub fn iter<'a>(&self, store: &'a OrderStore) -> Orders<'a> {
        Orders {
            store,
            cursor: self.head,
        }
    }
}

/// FIFO walk over a [`PriceLevel`]
pub struct Orders<'a> {
    store: &'a OrderStore,
    cursor: Option<OrderHandle>,
}

impl<'a> Iterator for Orders<'a> {
    type Item = &'a Order;

    fn next(&mut self) -> Option<Self::Item> {
        let handle = self.cursor?;
        self.cursor = self.store.link(handle).next;
        Some(self.store.resolve(handle))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::order::{OrderId, OrderKind};

    use super::*;

    fn post(
        store: &mut OrderStore,
        level: &mut PriceLevel,
        id: OrderId,
        quantity: Quantity,
    ) -> OrderHandle {
        let handle = store.allocate(Order::new(
            id,
            OrderKind::Ask,
            101.0,
            quantity,
            Utc::now(),
        ));
        level.push_back(store, handle);
        handle
    }

    fn ids(level: &PriceLevel, store: &OrderStore) -> Vec<OrderId> {
        level.iter(store).map(|x| x.id()).collect()
    }

    #[test]
    fn test_push_back_preserves_arrival_order() {
        let mut store = OrderStore::new();
        let mut level = PriceLevel::default();

        post(&mut store, &mut level, 1, 10);
        post(&mut store, &mut level, 2, 5);
        post(&mut store, &mut level, 3, 20);

        assert_eq!(ids(&level, &store), vec![1, 2, 3]);
        assert_eq!(level.total_quantity(), 35);
        assert_eq!(level.len(), 3);
    }

    #[test]
    fn test_remove_from_middle_head_and_tail() {
        let mut store = OrderStore::new();
        let mut level = PriceLevel::default();

        let first = post(&mut store, &mut level, 1, 10);
        let second = post(&mut store, &mut level, 2, 5);
        let third = post(&mut store, &mut level, 3, 20);
        let fourth = post(&mut store, &mut level, 4, 1);

        level.remove(&mut store, second);
        assert_eq!(ids(&level, &store), vec![1, 3, 4]);
        assert_eq!(level.total_quantity(), 31);

        level.remove(&mut store, first);
        assert_eq!(ids(&level, &store), vec![3, 4]);

        level.remove(&mut store, fourth);
        assert_eq!(ids(&level, &store), vec![3]);
        assert_eq!(level.total_quantity(), 20);

        level.remove(&mut store, third);
        assert!(level.is_empty());
        assert_eq!(level.total_quantity(), 0);
        assert_eq!(level.iter(&store).count(), 0);
    }

    #[test]
    fn test_requeued_order_goes_to_back() {
        let mut store = OrderStore::new();
        let mut level = PriceLevel::default();

        let first = post(&mut store, &mut level, 1, 10);
        post(&mut store, &mut level, 2, 5);

        level.remove(&mut store, first);
        level.push_back(&mut store, first);

        assert_eq!(ids(&level, &store), vec![2, 1]);
        assert_eq!(level.total_quantity(), 15);
    }

    #[test]
    fn test_adjust_changes_aggregate_only() {
        let mut store = OrderStore::new();
        let mut level = PriceLevel::default();

        post(&mut store, &mut level, 1, 10);
        post(&mut store, &mut level, 2, 5);

        level.adjust(10, 3);
        assert_eq!(level.total_quantity(), 8);
        assert_eq!(level.len(), 2);
        assert_eq!(ids(&level, &store), vec![1, 2]);
    }
}
