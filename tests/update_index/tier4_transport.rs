//! Tier 4: Transport Scoping
//!
//! The capture is installed only while the action runs, and the previous
//! transport comes back on every way out.

use crate::test_utils::*;
use indexcheck::{
    expect_index_touched, json, DocOptions, Error, NullTransport, StrategyKind, TransportError, TransportHandle,
};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

#[test]
fn tier4_transport_restored_after_success() -> anyhow::Result<()> {
    let (_real, handle) = recording_handle();
    let before = handle.current();

    expect_index_touched("users").evaluate(&handle, |scope| {
        assert!(!same_transport(&scope.transport().current(), &before));
        anyhow::Ok(())
    })?;

    assert!(same_transport(&handle.current(), &before));
    Ok(())
}

#[test]
fn tier4_action_error_propagates_and_restores() {
    #[derive(Debug, PartialEq)]
    enum ActionError {
        Boom,
        Transport(TransportError),
    }
    impl From<TransportError> for ActionError {
        fn from(e: TransportError) -> Self {
            ActionError::Transport(e)
        }
    }

    let (real, handle) = recording_handle();
    let before = handle.current();

    let result = expect_index_touched("users").evaluate(&handle, |scope| -> Result<(), ActionError> {
        scope.import("users", vec![index_op(1, json!({}))])?;
        Err(ActionError::Boom)
    });

    assert_eq!(result.unwrap_err(), ActionError::Boom);
    assert!(same_transport(&handle.current(), &before));
    assert_eq!(real.batch_count(), 0);
}

#[test]
fn tier4_panicking_action_restores_transport() {
    let (_real, handle) = recording_handle();
    let before = handle.current();

    let result = catch_unwind(AssertUnwindSafe(|| {
        expect_index_touched("users").evaluate(&handle, |_scope| -> anyhow::Result<()> { panic!("boom") })
    }));

    assert!(result.is_err());
    assert!(same_transport(&handle.current(), &before));
}

#[test]
fn tier4_malformed_operation_is_rejected() {
    let (_real, handle) = recording_handle();

    let result = expect_index_touched("users")
        .strategy(StrategyKind::Urgent)
        .evaluate(&handle, |scope| scope.import("users", vec![json!({"upsert": {"_id": 1}})]));

    assert!(matches!(
        result,
        Err(TransportError::Rejected(Error::MalformedOperation(_)))
    ));
}

#[test]
fn tier4_malformed_operation_surfaces_at_flush_under_atomic() {
    let (_real, handle) = recording_handle();
    let before = handle.current();

    let result = expect_index_touched("users").evaluate(&handle, |scope| {
        scope.import("users", vec![json!({"index": {"data": {}}})])?;
        Ok::<_, TransportError>(())
    });

    assert!(matches!(result, Err(TransportError::Rejected(_))));
    assert!(same_transport(&handle.current(), &before));
}

#[test]
fn tier4_passthrough_failure_surfaces_to_the_action() {
    let handle = TransportHandle::new(Arc::new(FailingTransport));

    let result = expect_index_touched("users")
        .strategy(StrategyKind::Urgent)
        .evaluate(&handle, |scope| scope.import("posts", vec![index_op(1, json!({}))]));

    match result {
        Err(TransportError::Backend { index, .. }) => assert_eq!(index, "posts"),
        other => panic!("expected backend error, got {:?}", other.map(|o| o.passed())),
    }
}

#[test]
fn tier4_nested_chains_route_to_their_own_index() -> anyhow::Result<()> {
    let (real, handle) = recording_handle();

    let outer = expect_index_touched("users")
        .and_reindex([1], DocOptions::new())?
        .evaluate(&handle, |scope| {
            let inner = expect_index_touched("posts")
                .and_delete([9], DocOptions::new())?
                .evaluate(scope.transport(), |inner_scope| {
                    inner_scope.import("posts", vec![delete_op(9)])?;
                    inner_scope.import("users", vec![index_op(1, json!({}))])?;
                    anyhow::Ok(())
                })?;
            inner.assert_passed();
            anyhow::Ok(())
        })?;

    outer.assert_passed();
    assert_eq!(real.batch_count(), 0);
    Ok(())
}

#[test]
fn tier4_atomic_deduplicates_identical_imports() -> anyhow::Result<()> {
    let (_real, handle) = recording_handle();
    let action = |scope: &mut indexcheck::StrategyScope<'_>| {
        scope.import("users", vec![index_op(1, json!({"name": "Ann"}))])?;
        scope.import("users", vec![index_op(1, json!({"name": "Ann"}))])?;
        anyhow::Ok(())
    };

    let atomic = expect_index_touched("users")
        .and_reindex([1], DocOptions::new().times(1))?
        .evaluate(&handle, action)?;
    atomic.assert_passed();

    let urgent = expect_index_touched("users")
        .and_reindex([1], DocOptions::new().times(2))?
        .strategy(StrategyKind::Urgent)
        .evaluate(&handle, action)?;
    urgent.assert_passed();
    Ok(())
}

#[test]
fn tier4_atomic_sends_one_batch_per_index() -> anyhow::Result<()> {
    let (real, handle) = recording_handle();

    expect_index_touched("users").evaluate(&handle, |scope| {
        scope.import("posts", vec![index_op(1, json!({}))])?;
        scope.import("posts", vec![index_op(2, json!({}))])?;
        assert_eq!(real.batch_count(), 0);
        anyhow::Ok(())
    })?;

    assert_eq!(real.indices(), vec!["posts".to_string()]);
    Ok(())
}

#[test]
fn tier4_direct_transport_calls_bypass_the_strategy() -> anyhow::Result<()> {
    let (_real, handle) = recording_handle();

    let outcome = expect_index_touched("users").evaluate(&handle, |scope| {
        scope
            .transport()
            .bulk("users", &Default::default(), vec![delete_op(4)])?;
        anyhow::Ok(())
    })?;

    assert_eq!(outcome.observed().len(), 1);
    outcome.assert_passed();
    Ok(())
}

#[test]
fn tier4_default_handle_discards_passthrough() -> anyhow::Result<()> {
    let handle = TransportHandle::default();
    let null = TransportHandle::new(Arc::new(NullTransport));

    for handle in [&handle, &null] {
        expect_index_touched("users")
            .evaluate(handle, |scope| {
                scope.import("posts", vec![index_op(1, json!({}))])?;
                anyhow::Ok(())
            })?
            .assert_not_touched();
    }
    Ok(())
}
