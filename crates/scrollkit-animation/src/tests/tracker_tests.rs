use std::cell::RefCell;
use std::rc::Rc;

use scrollkit_core::ElementId;
use scrollkit_testing::ScrollTestRule;

use super::*;

// Shared geometry: a 400px element at document offset 1000 in a 600px
// viewport. Default positions put the progress span at scroll 520..1280.
fn hero_rule() -> (ScrollTestRule, ElementId) {
    let rule = ScrollTestRule::new();
    let hero = ElementId::from_label("hero");
    rule.place_element(hero, 1000.0, 400.0);
    (rule, hero)
}

fn tracker_for(rule: &ScrollTestRule) -> ScrollTracker {
    ScrollTracker::new(rule.runtime_handle(), rule.viewport_rc())
}

fn recorded() -> (Rc<RefCell<Vec<f32>>>, impl FnMut(ElementId, f32)) {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&calls);
    (calls, move |_, progress| sink.borrow_mut().push(progress))
}

#[test]
fn attachment_exists_only_while_near_viewport() {
    let (rule, hero) = hero_rule();
    let tracker = tracker_for(&rule);
    let tracked = tracker.track(hero, TriggerConfig::default(), |_, _| {});
    assert!(!tracked.is_near_viewport());
    assert!(!tracked.has_progress_attachment());

    rule.scroll_to(900.0);
    assert!(tracked.is_near_viewport());
    assert!(tracked.has_progress_attachment());
    assert_eq!(rule.runtime_handle().scroll_listener_count(), 1);

    rule.scroll_to(0.0);
    assert!(!tracked.is_near_viewport());
    assert!(!tracked.has_progress_attachment());
    assert_eq!(rule.runtime_handle().scroll_listener_count(), 0);

    // Rapid exit and re-entry must neither leak nor double-register.
    rule.scroll_to(900.0);
    rule.scroll_to(0.0);
    rule.scroll_to(900.0);
    assert!(tracked.has_progress_attachment());
    assert_eq!(rule.runtime_handle().scroll_listener_count(), 1);
}

#[test]
fn no_callbacks_after_guard_drop() {
    let (rule, hero) = hero_rule();
    let tracker = tracker_for(&rule);
    let (calls, callback) = recorded();
    let tracked = tracker.track(hero, TriggerConfig::default(), callback);

    rule.scroll_to(900.0);
    let before = calls.borrow().len();
    assert!(before > 0);

    drop(tracked);
    assert_eq!(rule.runtime_handle().scroll_listener_count(), 0);
    assert!(rule.runtime_handle().observed_elements().is_empty());

    rule.scroll_to(1000.0);
    assert_eq!(calls.borrow().len(), before);
}

#[test]
fn once_fires_exactly_once_at_full_progress() {
    let (rule, hero) = hero_rule();
    let tracker = tracker_for(&rule);
    let (calls, callback) = recorded();
    let _tracked = tracker.track(hero, TriggerConfig::default().once(), callback);

    rule.scroll_to(900.0);
    rule.scroll_to(0.0);
    rule.scroll_to(900.0);
    rule.scroll_to(0.0);
    rule.scroll_to(900.0);

    assert_eq!(&*calls.borrow(), &[1.0]);
    // The observation is released after the single firing.
    assert!(rule.runtime_handle().observed_elements().is_empty());
}

#[test]
fn direct_scrub_emits_once_per_scroll_event() {
    let (rule, hero) = hero_rule();
    let tracker = tracker_for(&rule);
    let (calls, callback) = recorded();
    let _tracked = tracker.track(hero, TriggerConfig::default(), callback);

    // Ten scroll events stepping evenly across the 520..1280 span.
    for i in 1..=10 {
        rule.scroll_to(520.0 + i as f32 * 76.0);
    }

    let calls = calls.borrow();
    assert_eq!(calls.len(), 10);
    for (i, progress) in calls.iter().enumerate() {
        let expected = (i + 1) as f32 / 10.0;
        assert!(
            (progress - expected).abs() < 1e-5,
            "event {} reported {}",
            i,
            progress
        );
    }
    assert!(calls.windows(2).all(|pair| pair[0] <= pair[1]));
    assert!((calls[9] - 1.0).abs() < 1e-6);
}

#[test]
fn staggered_children_resolve_on_each_activation() {
    let rule = ScrollTestRule::new();
    let grid = ElementId::from_label("grid");
    let card_a = ElementId::from_label("card-a");
    let card_b = ElementId::from_label("card-b");
    let card_c = ElementId::from_label("card-c");
    rule.place_element(grid, 1000.0, 400.0);
    rule.set_children(grid, ".card", vec![card_a, card_b]);

    let tracker = tracker_for(&rule);
    let seen: Rc<RefCell<Vec<Vec<ElementId>>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let _tracked = tracker.track_staggered(
        grid,
        ".card",
        TriggerConfig::default(),
        move |children, _| sink.borrow_mut().push(children.to_vec()),
    );

    rule.scroll_to(900.0);
    assert_eq!(seen.borrow().last().unwrap(), &[card_a, card_b]);

    // A card added while the grid is off screen is picked up on the next
    // activation.
    rule.scroll_to(0.0);
    rule.set_children(grid, ".card", vec![card_a, card_b, card_c]);
    rule.scroll_to(900.0);
    assert_eq!(seen.borrow().last().unwrap(), &[card_a, card_b, card_c]);
}

#[test]
fn smoothed_scrub_converges_over_frames() {
    let (rule, hero) = hero_rule();
    let tracker = tracker_for(&rule);
    let (calls, callback) = recorded();
    let config = TriggerConfig::default().with_scrub(Scrub::Smoothed(0.2));
    let _tracked = tracker.track(hero, config, callback);

    // Scroll to the midpoint of the span; nothing reports until frames run.
    rule.scroll_to(900.0);
    assert!(calls.borrow().is_empty());

    let frames = rule.pump_frames(16_000_000, 16_000_000, 400);
    assert!(frames > 1, "smoothing must span multiple frames");
    assert!(frames < 400, "smoothing must settle");

    let calls = calls.borrow();
    assert!(calls.windows(2).all(|pair| pair[0] <= pair[1]));
    assert!((calls.last().copied().unwrap() - 0.5).abs() < 1e-6);
}

#[test]
fn unplaced_element_stays_idle() {
    let rule = ScrollTestRule::new();
    let ghost = ElementId::from_label("ghost");
    let tracker = tracker_for(&rule);
    let (calls, callback) = recorded();
    let tracked = tracker.track(ghost, TriggerConfig::default(), callback);

    rule.scroll_to(900.0);
    assert!(!tracked.is_near_viewport());
    assert!(!tracked.has_progress_attachment());
    assert!(calls.borrow().is_empty());
}

#[test]
fn detached_geometry_suppresses_progress() {
    let (rule, hero) = hero_rule();
    let tracker = tracker_for(&rule);
    let (calls, callback) = recorded();
    let _tracked = tracker.track(hero, TriggerConfig::default(), callback);

    rule.scroll_to(900.0);
    let before = calls.borrow().len();
    assert_eq!(before, 1);

    // Element leaves the render tree but the scroll event is already queued.
    rule.remove_element(hero);
    rule.runtime_handle().dispatch_scroll(950.0);
    assert_eq!(calls.borrow().len(), before);
}
