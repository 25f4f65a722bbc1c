use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use tracing::debug;

use crate::component::{Component, ComponentManager};
use crate::entity::{Entity, EntityRegistry};
use crate::event::{EventBus, EventKind, HandlerId, SharedHandler};
use crate::system::SystemRegistry;

/// Composition root for the ECS: entities, component stores, systems and the
/// event bus behind one API.
///
/// Every component mutation performed through this facade is published on
/// the event bus; there is no mutation path that bypasses notification.
/// Dependent state (mesh caches, curve staleness, system membership) relies
/// on that contract.
///
/// References handed out by `get_component` are valid only until the next
/// mutating call; callers must not cache them across mutations.
#[derive(Default)]
pub struct Coordinator {
    entities: EntityRegistry,
    components: ComponentManager,
    systems: SystemRegistry,
    events: EventBus,
}

impl Coordinator {
    pub fn new() -> Self {
        Self {
            entities: EntityRegistry::new(),
            components: ComponentManager::new(),
            systems: SystemRegistry::new(),
            events: EventBus::new(),
        }
    }

    // ─── Entity lifecycle ───────────────────────────────────────────────────

    pub fn create_entity(&mut self) -> Entity {
        let entity = self.entities.create();
        self.components.entity_created(entity);
        debug!(entity = entity.index(), "entity created");
        entity
    }

    /// Destroy an entity. Cascade order: events first (listeners can still
    /// read the doomed components), then component stores, then system
    /// membership, then id recycling.
    pub fn destroy_entity(&mut self, entity: Entity) {
        let attached: Vec<TypeId> = self.components.signature(entity).iter().copied().collect();

        for type_id in &attached {
            if let Some(value) = self.components.cloned_value(*type_id, entity) {
                self.dispatch(entity, *type_id, &*value, EventKind::Deleted);
            }
        }

        self.events.entity_destroyed(entity);
        self.components.entity_destroyed(entity);
        self.systems.entity_deleted(entity);
        self.entities.destroy(entity);
        debug!(entity = entity.index(), components = attached.len(), "entity destroyed");
    }

    pub fn is_live(&self, entity: Entity) -> bool {
        self.components.is_live(entity)
    }

    pub fn live_entities(&self) -> usize {
        self.entities.live_count()
    }

    // ─── Components ─────────────────────────────────────────────────────────

    /// Create the store for `T`. Idempotent; `add_component` also registers
    /// lazily, so calling this is only needed to pre-declare types.
    pub fn register_component<T: Component>(&mut self) {
        self.components.register::<T>();
    }

    /// Attach a component, updating system membership and publishing
    /// `Added`. Attaching a component the entity already has overwrites.
    pub fn add_component<T: Component>(&mut self, entity: Entity, value: T) {
        let snapshot = value.clone();
        self.components.insert(entity, value);
        self.systems.entity_gained_component(
            TypeId::of::<T>(),
            entity,
            self.components.signature(entity),
        );
        self.dispatch(entity, TypeId::of::<T>(), &snapshot, EventKind::Added);
    }

    /// Overwrite an existing component and publish `Changed`. The entity
    /// must already have `T`.
    pub fn set_component<T: Component>(&mut self, entity: Entity, value: T) {
        assert!(
            self.components.has::<T>(entity),
            "set_component: entity {} has no {}",
            entity.index(),
            std::any::type_name::<T>()
        );
        let snapshot = value.clone();
        self.components.insert(entity, value);
        self.dispatch(entity, TypeId::of::<T>(), &snapshot, EventKind::Changed);
    }

    /// Remove a component: publish `Deleted` carrying the value read before
    /// removal, drop it from the store, then update system membership.
    pub fn delete_component<T: Component>(&mut self, entity: Entity) {
        let value = self.components.get::<T>(entity).clone();
        self.dispatch(entity, TypeId::of::<T>(), &value, EventKind::Deleted);
        // Listeners may mutate while the event is out: if one already
        // removed the value this is a no-op, and if one re-added the
        // component the delete still wins and takes the fresh value with it.
        if self.components.has::<T>(entity) {
            self.components.remove::<T>(entity);
        }
        self.systems.entity_lost_component(TypeId::of::<T>(), entity);
    }

    /// Read-modify-write: run the mutator in place, then publish `Changed`
    /// with the post-mutation value so listeners never observe a stale
    /// snapshot.
    pub fn edit_component<T: Component>(&mut self, entity: Entity, mutate: impl FnOnce(&mut T)) {
        mutate(self.components.get_mut::<T>(entity));
        let snapshot = self.components.get::<T>(entity).clone();
        self.dispatch(entity, TypeId::of::<T>(), &snapshot, EventKind::Changed);
    }

    pub fn get_component<T: Component>(&self, entity: Entity) -> &T {
        self.components.get(entity)
    }

    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.components.has::<T>(entity)
    }

    pub fn component_signature(&self, entity: Entity) -> &HashSet<TypeId> {
        self.components.signature(entity)
    }

    // ─── Systems ────────────────────────────────────────────────────────────

    pub fn register_system<S: 'static>(&mut self, system: S) {
        self.systems.register(system);
    }

    pub fn require_component<S: 'static, C: Component>(&mut self) {
        self.components.register::<C>();
        self.systems.require_component::<S, C>();
    }

    pub fn get_system<S: 'static>(&self) -> &S {
        self.systems.get::<S>()
    }

    pub fn get_system_mut<S: 'static>(&mut self) -> &mut S {
        self.systems.get_mut::<S>()
    }

    pub fn members_of<S: 'static>(&self) -> &HashSet<Entity> {
        self.systems.members_of::<S>()
    }

    // ─── Events ─────────────────────────────────────────────────────────────

    /// Subscribe to notifications for component `T` on one entity. The
    /// handler receives the coordinator itself, so it may edit components,
    /// publish further events, or unsubscribe (itself included) reentrantly.
    pub fn subscribe<T: Component>(
        &mut self,
        entity: Entity,
        mut handler: impl FnMut(&mut Coordinator, Entity, &T, EventKind) + 'static,
    ) -> HandlerId {
        let erased: SharedHandler = Rc::new(RefCell::new(
            move |coordinator: &mut Coordinator,
                  entity: Entity,
                  value: &dyn Any,
                  kind: EventKind| {
                let value = value
                    .downcast_ref::<T>()
                    .expect("event payload type mismatch");
                handler(coordinator, entity, value, kind);
            },
        ));
        self.events.subscribe(entity, TypeId::of::<T>(), erased)
    }

    pub fn unsubscribe<T: Component>(&mut self, entity: Entity, id: HandlerId) {
        self.events.unsubscribe(entity, TypeId::of::<T>(), id);
    }

    /// Deliver one event to every handler registered for the pair at
    /// dispatch start. Handlers run over an owned snapshot, so reentrant
    /// subscription changes cannot corrupt the iteration.
    fn dispatch(&mut self, entity: Entity, type_id: TypeId, value: &dyn Any, kind: EventKind) {
        let snapshot = self.events.begin_dispatch(entity, type_id);
        for handler in snapshot {
            (&mut *handler.borrow_mut())(self, entity, value, kind);
        }
        self.events.end_dispatch();
    }
}
