use std::cmp::Reverse;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};

/// An opaque entity handle. Carries no data; identity only.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Entity(u32);

impl Entity {
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Reusing id pool: freed ids come back in ascending order before the
/// high-water mark advances. Also backs the per-entity handler-id pools in
/// the event bus.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: u32,
    free: BinaryHeap<Reverse<u32>>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> u32 {
        if let Some(Reverse(id)) = self.free.pop() {
            id
        } else {
            let id = self.next;
            self.next = self
                .next
                .checked_add(1)
                .expect("id space exhausted");
            id
        }
    }

    pub fn release(&mut self, id: u32) {
        debug_assert!(id < self.next, "released id {id} was never allocated");
        self.free.push(Reverse(id));
    }
}

/// Issues and recycles [`Entity`] handles. Holds no component data; the
/// caller is responsible for cascading destruction through the stores,
/// systems and listeners before releasing the id.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    ids: IdAllocator,
    live: usize,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the smallest currently-unused id.
    pub fn create(&mut self) -> Entity {
        self.live += 1;
        Entity(self.ids.allocate())
    }

    /// Returns the id to the free pool.
    pub fn destroy(&mut self, entity: Entity) {
        self.live -= 1;
        self.ids.release(entity.0);
    }

    pub fn live_count(&self) -> usize {
        self.live
    }
}
