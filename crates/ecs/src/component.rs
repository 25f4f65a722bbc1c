use std::any::{type_name, Any, TypeId};
use std::collections::{HashMap, HashSet};

use crate::entity::Entity;

/// A component is any plain value type. The `Clone` bound exists because
/// event dispatch hands listeners an owned snapshot of the value rather than
/// a borrow into the store.
pub trait Component: Clone + 'static {}

impl<T: Clone + 'static> Component for T {}

// ─── Typed storage ───────────────────────────────────────────────────────────

/// Per-type component storage keyed by entity id.
///
/// A zero-sized tag component stored here costs only its entity key; the
/// value occupies no memory, so tags need no separate presence-only path.
#[derive(Debug, Default)]
pub struct ComponentStore<T: Component> {
    entries: HashMap<Entity, T>,
}

impl<T: Component> ComponentStore<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Attach a value. Attaching to an entity that already has one overwrites.
    pub fn insert(&mut self, entity: Entity, value: T) {
        self.entries.insert(entity, value);
    }

    /// Missing components are a caller bug, not a runtime condition: call
    /// sites are expected to consult the entity's signature first.
    pub fn get(&self, entity: Entity) -> &T {
        self.entries.get(&entity).unwrap_or_else(|| {
            panic!(
                "entity {} has no {} component",
                entity.index(),
                type_name::<T>()
            )
        })
    }

    pub fn get_mut(&mut self, entity: Entity) -> &mut T {
        self.entries.get_mut(&entity).unwrap_or_else(|| {
            panic!(
                "entity {} has no {} component",
                entity.index(),
                type_name::<T>()
            )
        })
    }

    pub fn remove(&mut self, entity: Entity) -> T {
        self.entries.remove(&entity).unwrap_or_else(|| {
            panic!(
                "removing {} from entity {} which does not have it",
                type_name::<T>(),
                entity.index()
            )
        })
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.entries.contains_key(&entity)
    }
}

// ─── Type-erased storage ─────────────────────────────────────────────────────

/// Object-safe facade over a `ComponentStore<T>` so stores of distinct types
/// can live in one map keyed by `TypeId`.
pub(crate) trait AnyStore {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Drop the entity's value if present; silently no-ops otherwise.
    /// Used only by the destruction cascade.
    fn remove_entity(&mut self, entity: Entity);

    /// Owned copy of the entity's value, for synthesizing `Deleted` events
    /// without borrowing the store across dispatch.
    fn cloned_value(&self, entity: Entity) -> Option<Box<dyn Any>>;
}

impl<T: Component> AnyStore for ComponentStore<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn remove_entity(&mut self, entity: Entity) {
        self.entries.remove(&entity);
    }

    fn cloned_value(&self, entity: Entity) -> Option<Box<dyn Any>> {
        self.entries
            .get(&entity)
            .map(|v| Box::new(v.clone()) as Box<dyn Any>)
    }
}

// ─── Store manager ───────────────────────────────────────────────────────────

/// Owns every type-erased store plus the per-entity signature sets
/// (which component types each live entity currently carries).
#[derive(Default)]
pub struct ComponentManager {
    stores: HashMap<TypeId, Box<dyn AnyStore>>,
    signatures: HashMap<Entity, HashSet<TypeId>>,
}

impl ComponentManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the store for `T` if it does not exist yet. Idempotent.
    pub fn register<T: Component>(&mut self) {
        self.stores
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(ComponentStore::<T>::new()));
    }

    pub fn entity_created(&mut self, entity: Entity) {
        let previous = self.signatures.insert(entity, HashSet::new());
        debug_assert!(previous.is_none(), "entity id issued twice");
    }

    pub fn is_live(&self, entity: Entity) -> bool {
        self.signatures.contains_key(&entity)
    }

    pub fn signature(&self, entity: Entity) -> &HashSet<TypeId> {
        self.signatures.get(&entity).unwrap_or_else(|| {
            panic!("entity {} is not live", entity.index())
        })
    }

    pub fn insert<T: Component>(&mut self, entity: Entity, value: T) {
        self.register::<T>();
        self.store_mut::<T>().insert(entity, value);
        self.signatures
            .get_mut(&entity)
            .unwrap_or_else(|| panic!("entity {} is not live", entity.index()))
            .insert(TypeId::of::<T>());
    }

    pub fn get<T: Component>(&self, entity: Entity) -> &T {
        self.store::<T>().get(entity)
    }

    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> &mut T {
        self.store_mut::<T>().get_mut(entity)
    }

    pub fn remove<T: Component>(&mut self, entity: Entity) -> T {
        let value = self.store_mut::<T>().remove(entity);
        if let Some(signature) = self.signatures.get_mut(&entity) {
            signature.remove(&TypeId::of::<T>());
        }
        value
    }

    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.signatures
            .get(&entity)
            .is_some_and(|s| s.contains(&TypeId::of::<T>()))
    }

    pub fn cloned_value(&self, type_id: TypeId, entity: Entity) -> Option<Box<dyn Any>> {
        self.stores
            .get(&type_id)
            .and_then(|store| store.cloned_value(entity))
    }

    /// Destruction cascade: drop the value from every store that has one,
    /// then forget the signature.
    pub fn entity_destroyed(&mut self, entity: Entity) {
        for store in self.stores.values_mut() {
            store.remove_entity(entity);
        }
        self.signatures.remove(&entity);
    }

    fn store<T: Component>(&self) -> &ComponentStore<T> {
        self.stores
            .get(&TypeId::of::<T>())
            .unwrap_or_else(|| panic!("component {} was never registered", type_name::<T>()))
            .as_any()
            .downcast_ref()
            .expect("store type mismatch")
    }

    fn store_mut<T: Component>(&mut self) -> &mut ComponentStore<T> {
        self.stores
            .get_mut(&TypeId::of::<T>())
            .unwrap_or_else(|| panic!("component {} was never registered", type_name::<T>()))
            .as_any_mut()
            .downcast_mut()
            .expect("store type mismatch")
    }
}
