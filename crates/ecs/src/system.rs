use std::any::{type_name, Any, TypeId};
use std::collections::{HashMap, HashSet};

use crate::component::Component;
use crate::entity::Entity;

struct SystemEntry {
    system: Box<dyn Any>,
    /// Live entities whose signature is a superset of `required`.
    members: HashSet<Entity>,
    required: HashSet<TypeId>,
}

/// Owns the system instances and keeps each system's member set consistent
/// with its declared required-component set as components come and go.
///
/// Member sets live here rather than inside the system objects so that
/// systems hold no entity state of their own; they read their membership
/// back through the coordinator.
#[derive(Default)]
pub struct SystemRegistry {
    entries: HashMap<TypeId, SystemEntry>,
    /// Reverse index: component type to the systems that require it.
    requirers: HashMap<TypeId, Vec<TypeId>>,
}

impl SystemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a system instance. One instance per system type; a second
    /// registration of the same type is a startup wiring bug and panics.
    pub fn register<S: 'static>(&mut self, system: S) {
        let previous = self.entries.insert(
            TypeId::of::<S>(),
            SystemEntry {
                system: Box::new(system),
                members: HashSet::new(),
                required: HashSet::new(),
            },
        );
        assert!(
            previous.is_none(),
            "system {} registered twice",
            type_name::<S>()
        );
    }

    /// Declare that system `S` requires component `C`.
    pub fn require_component<S: 'static, C: Component>(&mut self) {
        let system_id = TypeId::of::<S>();
        let component_id = TypeId::of::<C>();

        let entry = self.entries.get_mut(&system_id).unwrap_or_else(|| {
            panic!(
                "cannot declare requirements for unregistered system {}",
                type_name::<S>()
            )
        });
        entry.required.insert(component_id);

        let requirers = self.requirers.entry(component_id).or_default();
        if !requirers.contains(&system_id) {
            requirers.push(system_id);
        }
    }

    /// An entity gained `component_id`; admit it to every system whose full
    /// requirement set its signature now satisfies.
    pub fn entity_gained_component(
        &mut self,
        component_id: TypeId,
        entity: Entity,
        signature: &HashSet<TypeId>,
    ) {
        let Some(systems) = self.requirers.get(&component_id) else {
            return;
        };
        for system_id in systems {
            let entry = self.entries.get_mut(system_id).expect("stale reverse index");
            if entry.required.is_subset(signature) {
                entry.members.insert(entity);
            }
        }
    }

    /// An entity lost `component_id`; evict it from every system requiring
    /// that component. Removing a non-member is a cheap no-op.
    pub fn entity_lost_component(&mut self, component_id: TypeId, entity: Entity) {
        let Some(systems) = self.requirers.get(&component_id) else {
            return;
        };
        for system_id in systems {
            let entry = self.entries.get_mut(system_id).expect("stale reverse index");
            entry.members.remove(&entity);
        }
    }

    pub fn entity_deleted(&mut self, entity: Entity) {
        for entry in self.entries.values_mut() {
            entry.members.remove(&entity);
        }
    }

    /// Look up a registered system. Requesting a type that was never
    /// registered fails loudly; silently constructing a default would mask
    /// a missing startup registration.
    pub fn get<S: 'static>(&self) -> &S {
        self.entry::<S>()
            .system
            .downcast_ref()
            .expect("system type mismatch")
    }

    pub fn get_mut<S: 'static>(&mut self) -> &mut S {
        self.entries
            .get_mut(&TypeId::of::<S>())
            .unwrap_or_else(|| panic!("system {} was never registered", type_name::<S>()))
            .system
            .downcast_mut()
            .expect("system type mismatch")
    }

    pub fn members_of<S: 'static>(&self) -> &HashSet<Entity> {
        &self.entry::<S>().members
    }

    fn entry<S: 'static>(&self) -> &SystemEntry {
        self.entries
            .get(&TypeId::of::<S>())
            .unwrap_or_else(|| panic!("system {} was never registered", type_name::<S>()))
    }
}
