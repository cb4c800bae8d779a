//! Ownership of order records and identifier lookup.
//!
//! [`OrderStore`] is the only owner of [`Order`] data. Everything else in the
//! book (price levels, the identifier index) refers to orders through an
//! [`OrderHandle`]: a slot key paired with the generation the slot had when the
//! order was allocated. Slots are recycled after release, but generations are
//! never reused, so a released handle cannot resolve to a later order.

use std::collections::HashMap;

use slab::Slab;

use crate::order::{Order, OrderId};

/// Opaque, copyable reference to an order held by an [`OrderStore`]
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub struct OrderHandle {
    key: usize,
    generation: u64,
}

/// Position of an order within its price level's FIFO sequence
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct Link {
    pub(crate) prev: Option<OrderHandle>,
    pub(crate) next: Option<OrderHandle>,
}

#[derive(Clone, Debug)]
struct Slot {
    generation: u64,
    order: Order,
    link: Link,
}

#[derive(Clone, Debug, Default)]
pub struct OrderStore {
    slots: Slab<Slot>,
    generation: u64,
}

impl OrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `order`, returning the handle that addresses it
    ///
    /// Existing records are never moved, so every handle already issued
    /// stays valid.
    pub fn allocate(&mut self, order: Order) -> OrderHandle {
        self.generation += 1;
        let generation = self.generation;
        let key = self.slots.insert(Slot {
            generation,
            order,
            link: Link::default(),
        });
        OrderHandle { key, generation }
    }

    /// Free the slot addressed by `handle`, returning the order it held
    ///
    /// Returns `None` (and changes nothing) if the handle was already released.
    pub fn release(&mut self, handle: OrderHandle) -> Option<Order> {
        self.slot(handle)?;
        Some(self.slots.remove(handle.key).order)
    }

    pub fn get(&self, handle: OrderHandle) -> Option<&Order> {
        self.slot(handle).map(|slot| &slot.order)
    }

    pub fn get_mut(&mut self, handle: OrderHandle) -> Option<&mut Order> {
        self.slot_mut(handle).map(|slot| &mut slot.order)
    }

    pub fn contains(&self, handle: OrderHandle) -> bool {
        self.slot(handle).is_some()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Resolve a handle the book itself holds. A stale handle here means the
    /// levels and the store have diverged.
    pub(crate) fn resolve(&self, handle: OrderHandle) -> &Order {
        match self.slot(handle) {
            Some(slot) => &slot.order,
            None => panic!("Book corrupted: stale order handle {:?}", handle),
        }
    }

    pub(crate) fn resolve_mut(&mut self, handle: OrderHandle) -> &mut Order {
        match self.slot_mut(handle) {
            Some(slot) => &mut slot.order,
            None => panic!("Book corrupted: stale order handle {:?}", handle),
        }
    }

    pub(crate) fn link(&self, handle: OrderHandle) -> Link {
        match self.slot(handle) {
            Some(slot) => slot.link,
            None => panic!("Book corrupted: stale order handle {:?}", handle),
        }
    }

    pub(crate) fn link_mut(&mut self, handle: OrderHandle) -> &mut Link {
        match self.slot_mut(handle) {
            Some(slot) => &mut slot.link,
            None => panic!("Book corrupted: stale order handle {:?}", handle),
        }
    }

    fn slot(&self, handle: OrderHandle) -> Option<&Slot> {
        self.slots
            .get(handle.key)
            .filter(|slot| slot.generation == handle.generation)
    }

    fn slot_mut(&mut self, handle: OrderHandle) -> Option<&mut Slot> {
        self.slots
            .get_mut(handle.key)
            .filter(|slot| slot.generation == handle.generation)
    }
}

/// Non-owning map from order identifier to store handle
#[derive(Clone, Debug, Default)]
pub struct OrderIndex {
    handles: HashMap<OrderId, OrderHandle>,
}

impl OrderIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        id: OrderId,
        handle: OrderHandle,
    ) -> Option<OrderHandle> {
        self.handles.insert(id, handle)
    }

    pub fn lookup(&self, id: OrderId) -> Option<OrderHandle> {
        self.handles.get(&id).copied()
    }

    pub fn remove(&mut self, id: OrderId) -> Option<OrderHandle> {
        self.handles.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (OrderId, OrderHandle)> + '_ {
        self.handles.iter().map(|(id, handle)| (*id, *handle))
    }
}
