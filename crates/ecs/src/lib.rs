//! Entity-Component-System runtime for the modeler.
//!
//! The pieces compose bottom-up: [`entity::EntityRegistry`] issues recycled
//! ids, [`component`] holds one type-erased store per component type,
//! [`event::EventBus`] delivers per-entity per-component notifications, and
//! [`system::SystemRegistry`] keeps system member sets in sync with the
//! components entities carry. [`coordinator::Coordinator`] wires the four
//! together behind a single facade; domain code talks only to it.
//!
//! The whole runtime is single-threaded by construction (handlers are
//! `Rc`-shared), so it is deliberately neither `Send` nor `Sync`.

pub mod component;
pub mod coordinator;
pub mod entity;
pub mod event;
pub mod system;

pub use component::Component;
pub use coordinator::Coordinator;
pub use entity::Entity;
pub use event::{EventKind, HandlerId};
