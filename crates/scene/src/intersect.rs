use std::cell::{Cell, RefCell};
use std::rc::Rc;

use cad_ecs::{Component, Coordinator, Entity, EventKind, HandlerId};
use cad_kernel::intersection::{trace_intersection, TraceConfig};
use cad_kernel::Point3;
use tracing::info;

use crate::adapter::surface_for_entity;
use crate::components::{
    IntersectionCurveData, PatchControlGrid, PlaneShape, Position, Stale, TorusShape,
};
use crate::SceneError;

/// Trace the intersection of two shape entities and record it as a new
/// entity carrying [`IntersectionCurveData`].
///
/// On success the curve entity watches the shape and position components of
/// both sources: any change or removal marks the curve [`Stale`]. Removing
/// the curve data (or destroying the curve entity) detaches those watchers.
/// On any failure the scene is left untouched.
pub fn find_intersection(
    coordinator: &mut Coordinator,
    source_a: Entity,
    source_b: Entity,
    step: f64,
    guide: Option<Point3>,
) -> Result<Entity, SceneError> {
    if !step.is_finite() || step <= 0.0 {
        return Err(SceneError::InvalidStep { step });
    }

    let surface_a = surface_for_entity(coordinator, source_a)?;
    let surface_b = surface_for_entity(coordinator, source_b)?;

    let mut config = TraceConfig::with_step(step);
    config.guide = guide;
    let traced = trace_intersection(surface_a.as_ref(), surface_b.as_ref(), &config)?;

    let curve = coordinator.create_entity();
    coordinator.add_component(
        curve,
        IntersectionCurveData {
            points: traced.points,
            closed: traced.closed,
            surfaces: (source_a, source_b),
        },
    );
    info!(
        curve = curve.index(),
        a = source_a.index(),
        b = source_b.index(),
        "intersection curve entity created"
    );

    let watchers: WatcherList = Rc::new(RefCell::new(Vec::new()));
    for source in [source_a, source_b] {
        watch_source(coordinator, source, curve, &watchers);
    }

    // The cleanup listener hears the Deleted event for the curve data and
    // detaches every watcher still on record, itself included. Unsubscribing
    // from inside dispatch is deferred by the event bus, which is exactly
    // what we rely on here.
    let own_id: Rc<Cell<Option<HandlerId>>> = Rc::new(Cell::new(None));
    let own_id_inner = Rc::clone(&own_id);
    let cleanup_watchers = Rc::clone(&watchers);
    let id = coordinator.subscribe::<IntersectionCurveData>(
        curve,
        move |coordinator, entity, _data, kind| {
            if kind != EventKind::Deleted {
                return;
            }
            let drained: Vec<Watcher> = cleanup_watchers.borrow_mut().drain(..).collect();
            for watcher in &drained {
                watcher.detach(coordinator);
            }
            if let Some(id) = own_id_inner.get() {
                coordinator.unsubscribe::<IntersectionCurveData>(entity, id);
            }
        },
    );
    own_id.set(Some(id));

    Ok(curve)
}

/// A live subscription on a source entity, remembered so it can be removed
/// when the curve goes away. The detach function re-supplies the component
/// type the handler was registered under.
struct Watcher {
    source: Entity,
    id: HandlerId,
    unsubscribe: fn(&mut Coordinator, Entity, HandlerId),
}

impl Watcher {
    fn detach(&self, coordinator: &mut Coordinator) {
        (self.unsubscribe)(coordinator, self.source, self.id);
    }
}

/// The record list is shared between the curve's cleanup listener and the
/// watchers themselves: a watcher that sees its component die purges its own
/// record. Entity and handler ids are both recycled, so a record must never
/// outlive the subscription it names; a stale detach could otherwise remove
/// an unrelated handler that inherited the id.
type WatcherList = Rc<RefCell<Vec<Watcher>>>;

fn watch_source(
    coordinator: &mut Coordinator,
    source: Entity,
    curve: Entity,
    watchers: &WatcherList,
) {
    if coordinator.has_component::<Position>(source) {
        watch::<Position>(coordinator, source, curve, watchers);
    }
    if coordinator.has_component::<TorusShape>(source) {
        watch::<TorusShape>(coordinator, source, curve, watchers);
    }
    if coordinator.has_component::<PlaneShape>(source) {
        watch::<PlaneShape>(coordinator, source, curve, watchers);
    }
    if coordinator.has_component::<PatchControlGrid>(source) {
        watch::<PatchControlGrid>(coordinator, source, curve, watchers);
    }
}

fn watch<T: Component>(
    coordinator: &mut Coordinator,
    source: Entity,
    curve: Entity,
    watchers: &WatcherList,
) {
    let own_id: Rc<Cell<Option<HandlerId>>> = Rc::new(Cell::new(None));
    let id_cell = Rc::clone(&own_id);
    let records = Rc::clone(watchers);
    let id = coordinator.subscribe::<T>(source, move |coordinator, source, _value, kind| {
        if !matches!(kind, EventKind::Changed | EventKind::Deleted) {
            return;
        }
        if !coordinator.has_component::<Stale>(curve) {
            coordinator.add_component(curve, Stale);
        }
        // A deleted component (removal or source destruction) will not
        // change again; retire the watcher and its record now, before the
        // bus can reissue this handler id to someone else.
        if kind == EventKind::Deleted {
            if let Some(id) = id_cell.get() {
                coordinator.unsubscribe::<T>(source, id);
                records
                    .borrow_mut()
                    .retain(|w| !(w.source == source && w.id == id));
            }
        }
    });
    own_id.set(Some(id));
    watchers.borrow_mut().push(Watcher {
        source,
        id,
        unsubscribe: |coordinator, source, id| coordinator.unsubscribe::<T>(source, id),
    });
}
