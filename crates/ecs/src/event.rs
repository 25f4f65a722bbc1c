use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::coordinator::Coordinator;
use crate::entity::{Entity, IdAllocator};

/// What happened to the component a notification refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Added,
    Changed,
    Deleted,
}

/// Identifies one subscription. Scoped to the entity it was issued for;
/// ids are recycled with the same smallest-first strategy as entity ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u32);

/// Type-erased event handler. The typed `Coordinator::subscribe` wrapper
/// downcasts the value back to the concrete component type.
pub type HandlerFn = dyn FnMut(&mut Coordinator, Entity, &dyn Any, EventKind);

pub(crate) type SharedHandler = Rc<RefCell<HandlerFn>>;

#[derive(Default)]
struct EntityListeners {
    ids: IdAllocator,
    /// Handlers per component type, in insertion order.
    by_component: HashMap<TypeId, Vec<(HandlerId, SharedHandler)>>,
}

/// Per-entity, per-component-type publish/subscribe.
///
/// Reentrancy is the one hazard here: a handler running under dispatch may
/// subscribe, unsubscribe, or trigger further dispatches. Dispatch therefore
/// iterates an owned snapshot of the handler list taken at dispatch start,
/// and unsubscriptions requested while any dispatch is active are queued and
/// flushed only once the outermost dispatch unwinds. Erasing from the live
/// list mid-iteration is exactly the bug class this queue exists to prevent.
#[derive(Default)]
pub struct EventBus {
    listeners: HashMap<Entity, EntityListeners>,
    depth: u32,
    pending_removals: Vec<(Entity, TypeId, HandlerId)>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn subscribe(
        &mut self,
        entity: Entity,
        type_id: TypeId,
        handler: SharedHandler,
    ) -> HandlerId {
        let listeners = self.listeners.entry(entity).or_default();
        let id = HandlerId(listeners.ids.allocate());
        listeners
            .by_component
            .entry(type_id)
            .or_default()
            .push((id, handler));
        id
    }

    /// Request removal of a subscription. Effective immediately when no
    /// dispatch is in progress; queued otherwise. Unknown ids are ignored,
    /// since a queued removal may target listener state that an entity
    /// destruction has already swept away.
    pub(crate) fn unsubscribe(&mut self, entity: Entity, type_id: TypeId, id: HandlerId) {
        if self.depth > 0 {
            self.pending_removals.push((entity, type_id, id));
        } else {
            self.remove_now(entity, type_id, id);
        }
    }

    /// Snapshot the handlers registered for `(entity, type_id)` and enter a
    /// dispatch scope. Handlers with a queued removal are excluded, so a
    /// self-unsubscribed handler never sees a later event even within the
    /// same outer dispatch.
    pub(crate) fn begin_dispatch(&mut self, entity: Entity, type_id: TypeId) -> Vec<SharedHandler> {
        if self.depth == 0 {
            self.flush_pending();
        }
        self.depth += 1;

        match self
            .listeners
            .get(&entity)
            .and_then(|l| l.by_component.get(&type_id))
        {
            Some(handlers) => handlers
                .iter()
                .filter(|(id, _)| !self.pending_removals.contains(&(entity, type_id, *id)))
                .map(|(_, h)| Rc::clone(h))
                .collect(),
            None => Vec::new(),
        }
    }

    pub(crate) fn end_dispatch(&mut self) {
        debug_assert!(self.depth > 0, "end_dispatch without begin_dispatch");
        self.depth -= 1;
        if self.depth == 0 {
            self.flush_pending();
        }
    }

    /// Drop all listener state for the entity and recycle its handler ids.
    /// The coordinator synthesizes the `Deleted` notifications before
    /// calling this.
    pub(crate) fn entity_destroyed(&mut self, entity: Entity) {
        self.listeners.remove(&entity);
        self.pending_removals.retain(|(e, _, _)| *e != entity);
    }

    fn flush_pending(&mut self) {
        while let Some((entity, type_id, id)) = self.pending_removals.pop() {
            self.remove_now(entity, type_id, id);
        }
    }

    fn remove_now(&mut self, entity: Entity, type_id: TypeId, id: HandlerId) {
        let Some(listeners) = self.listeners.get_mut(&entity) else {
            return;
        };
        let Some(handlers) = listeners.by_component.get_mut(&type_id) else {
            return;
        };
        if let Some(pos) = handlers.iter().position(|(hid, _)| *hid == id) {
            handlers.remove(pos);
            listeners.ids.release(id.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_handler() -> SharedHandler {
        Rc::new(RefCell::new(
            |_: &mut Coordinator, _: Entity, _: &dyn Any, _: EventKind| {},
        ))
    }

    fn entity(index: u32) -> Entity {
        // Entities for bookkeeping tests only; ids come from a throwaway
        // registry so the opaque constructor stays private.
        let mut reg = crate::entity::EntityRegistry::new();
        let mut last = reg.create();
        for _ in 0..index {
            last = reg.create();
        }
        last
    }

    #[derive(Clone)]
    struct Dummy;

    #[test]
    fn handler_ids_are_entity_scoped_and_recycled() {
        let mut bus = EventBus::new();
        let e = entity(0);
        let ty = TypeId::of::<Dummy>();

        let a = bus.subscribe(e, ty, noop_handler());
        let b = bus.subscribe(e, ty, noop_handler());
        assert_ne!(a, b);

        bus.unsubscribe(e, ty, a);
        let c = bus.subscribe(e, ty, noop_handler());
        assert_eq!(a, c);
    }

    #[test]
    fn unsubscribe_during_dispatch_is_deferred() {
        let mut bus = EventBus::new();
        let e = entity(0);
        let ty = TypeId::of::<Dummy>();
        let id = bus.subscribe(e, ty, noop_handler());

        let snapshot = bus.begin_dispatch(e, ty);
        assert_eq!(snapshot.len(), 1);

        bus.unsubscribe(e, ty, id);
        // Still registered while the dispatch is open, but excluded from any
        // nested snapshot.
        assert!(bus.begin_dispatch(e, ty).is_empty());
        bus.end_dispatch();
        bus.end_dispatch();

        // Queue flushed at outermost unwind.
        assert!(bus.begin_dispatch(e, ty).is_empty());
        bus.end_dispatch();
    }

    #[test]
    fn unknown_unsubscribe_is_ignored() {
        let mut bus = EventBus::new();
        let e = entity(3);
        let ty = TypeId::of::<Dummy>();
        let id = bus.subscribe(e, ty, noop_handler());
        bus.unsubscribe(e, ty, id);
        // A second removal of the same id must not panic.
        bus.unsubscribe(e, ty, id);
    }
}
