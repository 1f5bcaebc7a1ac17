//! Tests for the focusable-element search

use super::{init_tracing, Call, FakeEngine, FakeNode};
use crate::{AutomationEngine, AutomationError, CandidateOutcome, FocusableSearch, Selector};
use std::collections::HashSet;

const BASE: &str = "//VoiceTextEditBox";

fn base() -> Selector {
    Selector::new(BASE)
}

#[test]
fn test_base_focusable_is_filled_in_one_attempt() {
    init_tracing();
    let engine = FakeEngine::new().with_node(BASE, FakeNode::focusable());

    let report = FocusableSearch::new(2, 3).run(&engine, &base(), "qa").unwrap();

    assert!(report.succeeded());
    assert_eq!(report.resolutions(), 1);
    assert_eq!(engine.finds(), vec![BASE.to_string()]);
    assert_eq!(
        engine.deliveries(),
        vec![(BASE.to_string(), "qa".to_string())]
    );
}

#[test]
fn test_parent_focusable_is_filled_on_second_attempt() {
    init_tracing();
    let parent = base().parent();
    let engine = FakeEngine::new()
        .with_node(BASE, FakeNode::plain())
        .with_node(parent.clone(), FakeNode::focusable());

    let report = FocusableSearch::new(2, 3).run(&engine, &base(), "en").unwrap();

    assert!(report.succeeded());
    assert_eq!(report.resolutions(), 2);
    assert_eq!(report.delivered_to(), Some(&parent));
    assert_eq!(
        report.attempts[0].outcome,
        CandidateOutcome::NotFocusable,
        "base was resolved but not focusable"
    );
    assert_eq!(engine.deliveries(), vec![(parent.to_string(), "en".into())]);
}

#[test]
fn test_exhausted_neighborhood_fails_after_bounded_attempts() {
    init_tracing();
    let search = FocusableSearch::new(2, 2);
    let level1 = base().parent();
    let level2 = level1.parent();
    let engine = FakeEngine::new()
        .with_node(BASE, FakeNode::plain())
        .with_node(level1.clone(), FakeNode::plain())
        .with_node(level2.clone(), FakeNode::plain())
        .with_node(level1.nth_child(1), FakeNode::plain());

    let filled = search.find_and_fill(&engine, &base(), "latest").unwrap();

    assert!(!filled);
    assert_eq!(search.max_attempts(), 7);
    assert_eq!(engine.finds().len(), 7);
    assert!(engine.deliveries().is_empty());
}

#[test]
fn test_candidate_order_interleaves_ancestors_and_children() {
    let engine = FakeEngine::new();
    FocusableSearch::new(2, 2)
        .find_and_fill(&engine, &base(), "x")
        .unwrap();

    let expected = vec![
        "//VoiceTextEditBox",
        "(//VoiceTextEditBox)/parent::*",
        "(//VoiceTextEditBox)/parent::*/*[1]",
        "(//VoiceTextEditBox)/parent::*/*[2]",
        "((//VoiceTextEditBox)/parent::*)/parent::*",
        "((//VoiceTextEditBox)/parent::*)/parent::*/*[1]",
        "((//VoiceTextEditBox)/parent::*)/parent::*/*[2]",
    ];
    assert_eq!(engine.finds(), expected);
}

#[test]
fn test_resolution_count_never_exceeds_bound() {
    for max_up in 0..5 {
        for max_down in 0..5 {
            let engine = FakeEngine::new();
            let search = FocusableSearch::new(max_up, max_down);
            let report = search.run(&engine, &base(), "x").unwrap();

            let finds = engine.finds();
            let distinct: HashSet<&String> = finds.iter().collect();
            assert_eq!(finds.len(), search.max_attempts(), "up={max_up} down={max_down}");
            assert_eq!(distinct.len(), finds.len(), "a selector was resolved twice");
            assert_eq!(report.resolutions(), finds.len());
            assert!(!report.succeeded());
        }
    }
}

#[test]
fn test_first_focusable_candidate_wins() {
    let parent = base().parent();
    let engine = FakeEngine::new()
        .with_node(parent.clone(), FakeNode::focusable())
        .with_node(parent.nth_child(1), FakeNode::focusable())
        .with_node(parent.parent(), FakeNode::focusable());

    let report = FocusableSearch::new(2, 3).run(&engine, &base(), "qa").unwrap();

    assert_eq!(report.delivered_to(), Some(&parent));
    // base, then parent; nothing after the successful delivery
    assert_eq!(
        engine.calls().last(),
        Some(&Call::SendKeys(parent.to_string(), "qa".into()))
    );
    assert_eq!(engine.finds().len(), 2);
}

#[test]
fn test_rejected_delivery_moves_to_next_candidate() {
    init_tracing();
    let parent = base().parent();
    let engine = FakeEngine::new()
        .with_node(BASE, FakeNode::rejecting())
        .with_node(parent.clone(), FakeNode::focusable());

    let report = FocusableSearch::new(2, 3).run(&engine, &base(), "qa").unwrap();

    assert!(report.succeeded());
    assert!(matches!(
        report.attempts[0].outcome,
        CandidateOutcome::DeliveryRejected(_)
    ));
    assert_eq!(
        engine.deliveries(),
        vec![
            (BASE.to_string(), "qa".to_string()),
            (parent.to_string(), "qa".to_string()),
        ],
        "the rejecting node gets exactly one delivery attempt"
    );
}

#[test]
fn test_rejected_delivery_everywhere_reports_failure() {
    let parent = base().parent();
    let engine = FakeEngine::new()
        .with_node(BASE, FakeNode::rejecting())
        .with_node(parent.clone(), FakeNode::rejecting());

    let filled = FocusableSearch::new(1, 0)
        .find_and_fill(&engine, &base(), "qa")
        .unwrap();

    assert!(!filled);
    assert_eq!(engine.deliveries().len(), 2);
}

#[test]
fn test_transport_failure_is_recovered_and_search_continues() {
    let parent = base().parent();
    let engine = FakeEngine::new()
        .with_lookup_error(BASE, AutomationError::Transport("connection reset".into()))
        .with_node(parent.clone(), FakeNode::focusable());

    let report = FocusableSearch::new(1, 0).run(&engine, &base(), "qa").unwrap();

    assert!(report.succeeded());
    assert_eq!(
        report.attempts[0].outcome,
        CandidateOutcome::TransportError("Transport error: connection reset".into())
    );
}

#[test]
fn test_attribute_read_failure_counts_as_not_focusable() {
    let engine = FakeEngine::new().with_node(
        BASE,
        FakeNode {
            focusable: Err(AutomationError::Transport("timeout".into())),
            accepts: Ok(()),
        },
    );

    let report = FocusableSearch::new(0, 0).run(&engine, &base(), "qa").unwrap();

    assert_eq!(report.attempts[0].outcome, CandidateOutcome::NotFocusable);
    assert!(engine.deliveries().is_empty());
}

#[test]
fn test_missing_focusable_attribute_counts_as_not_focusable() {
    let engine = FakeEngine::new().with_node(
        BASE,
        FakeNode {
            focusable: Ok(None),
            accepts: Ok(()),
        },
    );

    assert!(!FocusableSearch::new(0, 0)
        .find_and_fill(&engine, &base(), "qa")
        .unwrap());
    assert!(engine.deliveries().is_empty());
}

#[test]
fn test_lost_session_aborts_search() {
    let engine = FakeEngine::new().with_lookup_error(
        base().parent(),
        AutomationError::SessionUnavailable("invalid session id".into()),
    );

    let result = FocusableSearch::new(2, 3).find_and_fill(&engine, &base(), "qa");

    assert!(matches!(result, Err(AutomationError::SessionUnavailable(_))));
    assert_eq!(engine.finds().len(), 2, "no lookups after the session was lost");
}

#[test]
fn test_zero_bounds_only_try_base() {
    let engine = FakeEngine::new();
    let search = FocusableSearch::new(0, 5);

    assert!(!search.find_and_fill(&engine, &base(), "qa").unwrap());
    assert_eq!(engine.finds(), vec![BASE.to_string()]);
}

#[test]
fn test_default_bounds() {
    let search = FocusableSearch::default();
    assert_eq!((search.max_up, search.max_down), (2, 3));
    assert_eq!(search.max_attempts(), 9);
}

#[test]
fn test_candidates_are_derived_from_the_hint() {
    let engine = FakeEngine::new();
    let search = FocusableSearch::new(2, 1);

    assert!(!search.find_and_fill(&engine, &base(), "qa").unwrap());

    let expected: Vec<String> = [
        base().derive(0, None),
        base().derive(1, None),
        base().derive(1, Some(1)),
        base().derive(2, None),
        base().derive(2, Some(1)),
    ]
    .iter()
    .map(Selector::to_string)
    .collect();
    assert_eq!(engine.finds(), expected);
}

#[test]
fn test_fill_refuses_non_focusable_element() {
    let engine = FakeEngine::new().with_node(BASE, FakeNode::plain());
    let element = engine.find_element(&base()).unwrap();

    assert_eq!(
        element.fill("qa"),
        Err(AutomationError::NotFocusable(BASE.to_string()))
    );
    assert!(engine.deliveries().is_empty());
}
