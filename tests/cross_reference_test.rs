//! Tests for cross-references and move notification

use std::cell::RefCell;
use std::rc::Rc;

use rsmodel::util::testing;
use rsmodel::{
    Location, ModelArena, ModelError, MoveAction, MoveEvent, NodeId, ReferenceId, SingleSlot,
};
use rstest::{fixture, rstest};

struct Model {
    arena: ModelArena<&'static str>,
    root: NodeId,
    inner: NodeId,
    other: NodeId,
    child: SingleSlot,
    reference: ReferenceId,
}

#[fixture]
fn model() -> Model {
    testing::init_test_setup();
    let mut arena = ModelArena::new();
    let inner = arena.insert("innerNode");
    let other = arena.insert("someOtherInnerNode");
    let root = arena.insert("root");
    let child = arena.add_single(root, Some(inner)).unwrap();
    let reference = arena.add_cross_reference(root, Some(inner)).unwrap();
    Model {
        arena,
        root,
        inner,
        other,
        child,
        reference,
    }
}

type Events = Rc<RefCell<Vec<MoveEvent>>>;

fn record(arena: &mut ModelArena<&'static str>, reference: ReferenceId) -> Events {
    let events: Events = Rc::default();
    let sink = Rc::clone(&events);
    arena
        .set_move_handler(reference, move |event| sink.borrow_mut().push(*event))
        .unwrap();
    events
}

// ============================================================
// Registration
// ============================================================

#[rstest]
fn given_reference_when_holder_then_returns_declaring_node(model: Model) {
    assert_eq!(model.arena.holder(model.reference).unwrap(), model.root);
    assert_eq!(model.arena.held_references(model.root), vec![model.reference]);
}

#[rstest]
fn given_new_target_when_set_then_registers_on_it(mut model: Model) {
    model
        .arena
        .set_target(model.reference, Some(model.other))
        .unwrap();

    assert_eq!(model.arena.inbound_references(model.other), vec![model.reference]);
}

#[rstest]
fn given_new_target_when_set_then_updates_value(mut model: Model) {
    let previous = model
        .arena
        .set_target(model.reference, Some(model.other))
        .unwrap();

    assert_eq!(previous, Some(model.inner));
    assert_eq!(model.arena.target(model.reference).unwrap(), Some(model.other));
}

#[rstest]
fn given_new_target_when_set_then_deregisters_from_old(mut model: Model) {
    model
        .arena
        .set_target(model.reference, Some(model.other))
        .unwrap();

    assert!(model.arena.inbound_references(model.inner).is_empty());
}

#[rstest]
fn given_current_target_when_set_then_registers_only_once(mut model: Model) {
    let previous = model
        .arena
        .set_target(model.reference, Some(model.inner))
        .unwrap();

    assert_eq!(previous, Some(model.inner));
    assert_eq!(model.arena.inbound_references(model.inner), vec![model.reference]);
}

#[rstest]
fn given_removed_reference_when_removed_then_deregisters(mut model: Model) {
    model.arena.remove_cross_reference(model.reference).unwrap();

    assert!(model.arena.inbound_references(model.inner).is_empty());
    assert!(model.arena.held_references(model.root).is_empty());
    assert_eq!(
        model.arena.target(model.reference),
        Err(ModelError::StaleReference(model.reference))
    );
}

// ============================================================
// Move notification
// ============================================================

#[rstest]
fn given_handler_when_target_released_then_is_called_with_locations(mut model: Model) {
    let events = record(&mut model.arena, model.reference);

    model.arena.release(model.inner).unwrap();

    let events = events.borrow();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].reference, model.reference);
    assert_eq!(events[0].target, model.inner);
    assert_eq!(events[0].from, Location::attached(model.child));
    assert_eq!(events[0].to, Location::DETACHED);
}

#[rstest]
fn given_handler_when_unrelated_node_released_then_not_called(mut model: Model) {
    let events = record(&mut model.arena, model.reference);

    model.arena.release(model.other).unwrap();

    assert!(events.borrow().is_empty());
}

#[rstest]
fn given_handler_when_target_transferred_then_sees_release_and_attach(mut model: Model) {
    let events = record(&mut model.arena, model.reference);
    let holder = model.arena.insert("holder");
    let list = model.arena.add_mutable_list(holder, []).unwrap();

    model.arena.push(list, model.inner).unwrap();

    let moves: Vec<(Location, Location)> = events.borrow().iter().map(|e| (e.from, e.to)).collect();
    assert_eq!(
        moves,
        vec![
            (Location::attached(model.child), Location::DETACHED),
            (Location::DETACHED, Location::attached(list)),
        ]
    );
}

#[rstest]
fn given_several_references_when_target_moves_then_each_notified_once(mut model: Model) {
    let first = record(&mut model.arena, model.reference);
    let second_ref = model
        .arena
        .add_cross_reference(model.other, Some(model.inner))
        .unwrap();
    let second = record(&mut model.arena, second_ref);
    let bystander_ref = model
        .arena
        .add_cross_reference(model.root, Some(model.other))
        .unwrap();
    let bystander = record(&mut model.arena, bystander_ref);

    model.arena.set_single(model.child, None).unwrap();

    assert_eq!(first.borrow().len(), 1);
    assert_eq!(second.borrow().len(), 1);
    assert!(bystander.borrow().is_empty());
}

#[rstest]
fn given_handler_given_at_creation_when_target_moves_then_called(mut model: Model) {
    let events: Events = Rc::default();
    let sink = Rc::clone(&events);
    model
        .arena
        .add_cross_reference_with(model.other, Some(model.inner), move |event| {
            sink.borrow_mut().push(*event)
        })
        .unwrap();

    model.arena.release(model.inner).unwrap();

    assert_eq!(events.borrow().len(), 1);
}

#[rstest]
fn given_cleared_handler_when_target_moves_then_not_called(mut model: Model) {
    let events = record(&mut model.arena, model.reference);
    model.arena.clear_move_handler(model.reference).unwrap();

    model.arena.release(model.inner).unwrap();

    assert!(events.borrow().is_empty());
}

#[rstest]
fn given_retargeted_reference_when_old_target_moves_then_not_called(mut model: Model) {
    let events = record(&mut model.arena, model.reference);
    model
        .arena
        .set_target(model.reference, Some(model.other))
        .unwrap();

    model.arena.release(model.inner).unwrap();

    assert!(events.borrow().is_empty());
}

// ============================================================
// Handlers acting on their own reference
// ============================================================

/// Clears the reference as soon as its target is detached.
fn clear_when_detached(event: &MoveEvent) -> MoveAction {
    if event.to.is_detached() {
        MoveAction::Retarget(None)
    } else {
        MoveAction::Keep
    }
}

#[rstest]
fn given_clearing_handler_when_target_released_then_reference_is_empty(mut model: Model) {
    model
        .arena
        .set_move_handler(model.reference, clear_when_detached)
        .unwrap();
    let bystander_ref = model
        .arena
        .add_cross_reference(model.other, Some(model.inner))
        .unwrap();
    let bystander = record(&mut model.arena, bystander_ref);

    model.arena.release(model.inner).unwrap();

    assert_eq!(model.arena.target(model.reference).unwrap(), None);
    assert_eq!(model.arena.inbound_references(model.inner), vec![bystander_ref]);
    assert_eq!(bystander.borrow().len(), 1);
    assert_eq!(bystander.borrow()[0].to, Location::DETACHED);
}

#[rstest]
fn given_only_reference_clears_itself_when_target_released_then_no_inbound_left(mut model: Model) {
    model
        .arena
        .set_move_handler(model.reference, clear_when_detached)
        .unwrap();

    model.arena.set_single(model.child, None).unwrap();

    assert_eq!(model.arena.target(model.reference).unwrap(), None);
    assert!(model.arena.inbound_references(model.inner).is_empty());
}

#[rstest]
fn given_clearing_handler_when_target_transferred_then_sees_release_only(mut model: Model) {
    let seen: Events = Rc::default();
    let sink = Rc::clone(&seen);
    model
        .arena
        .set_move_handler(model.reference, move |event| {
            sink.borrow_mut().push(*event);
            clear_when_detached(event)
        })
        .unwrap();
    let holder = model.arena.insert("holder");
    let list = model.arena.add_mutable_list(holder, []).unwrap();

    model.arena.push(list, model.inner).unwrap();

    assert_eq!(seen.borrow().len(), 1);
    assert_eq!(model.arena.target(model.reference).unwrap(), None);
    assert_eq!(model.arena.container(model.inner), Some(list.id()));
}

#[rstest]
fn given_retargeting_handler_when_target_moves_then_follows_new_node(mut model: Model) {
    let replacement = model.other;
    model
        .arena
        .set_move_handler(model.reference, move |_| MoveAction::Retarget(Some(replacement)))
        .unwrap();

    model.arena.release(model.inner).unwrap();

    assert_eq!(model.arena.target(model.reference).unwrap(), Some(model.other));
    assert!(model.arena.inbound_references(model.inner).is_empty());
    assert_eq!(model.arena.inbound_references(model.other), vec![model.reference]);
}

#[rstest]
fn given_retarget_to_removed_node_when_target_moves_then_keeps_old_target(mut model: Model) {
    let gone = model.arena.insert("gone");
    model.arena.remove_subtree(gone).unwrap();
    model
        .arena
        .set_move_handler(model.reference, move |_| MoveAction::Retarget(Some(gone)))
        .unwrap();

    model.arena.release(model.inner).unwrap();

    assert_eq!(model.arena.target(model.reference).unwrap(), Some(model.inner));
    assert_eq!(model.arena.inbound_references(model.inner), vec![model.reference]);
}

// ============================================================
// Removal of referenced nodes
// ============================================================

#[rstest]
fn given_target_removed_when_reading_reference_then_target_is_empty(mut model: Model) {
    let events = record(&mut model.arena, model.reference);

    model.arena.remove_subtree(model.inner).unwrap();

    assert_eq!(model.arena.target(model.reference).unwrap(), None);
    // Only the release is a move; the removal itself is not reported
    assert_eq!(events.borrow().len(), 1);
}

#[rstest]
fn given_holder_removed_when_removing_subtree_then_reference_is_gone(mut model: Model) {
    let reference = model
        .arena
        .add_cross_reference(model.other, Some(model.inner))
        .unwrap();

    model.arena.remove_subtree(model.other).unwrap();

    assert_eq!(model.arena.inbound_references(model.inner), vec![model.reference]);
    assert_eq!(
        model.arena.holder(reference),
        Err(ModelError::StaleReference(reference))
    );
}
