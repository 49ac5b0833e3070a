//! Tier 3: Upsert Protocol

use crate::test_utils::*;
use indexcheck::{expect_index_touched, json, Category, DocOptions, UpsertViolation};

#[test]
fn tier3_no_updates_at_all() -> anyhow::Result<()> {
    let (_real, handle) = recording_handle();

    let outcome = expect_index_touched("users")
        .doc_as_upsert()
        .evaluate(&handle, |scope| {
            scope.import("users", vec![index_op(1, json!({"name": "Ann"}))])?;
            anyhow::Ok(())
        })?;

    assert!(!outcome.passed());
    assert_eq!(
        outcome.evaluation().upsert(),
        Err(&UpsertViolation::NoUpdatesPerformed)
    );
    assert!(outcome
        .failure_message()
        .starts_with("Expected partial updates with doc_as_upsert, but no partial updates were performed\n"));
    Ok(())
}

#[test]
fn tier3_missing_flag_is_distinct_from_no_updates() -> anyhow::Result<()> {
    let (_real, handle) = recording_handle();

    let outcome = expect_index_touched("users")
        .doc_as_upsert()
        .evaluate(&handle, |scope| {
            scope.import("users", vec![upsert_op(1, json!({"a": 1})), update_op(2, json!({"a": 2}))])?;
            anyhow::Ok(())
        })?;

    assert!(!outcome.passed());
    assert!(matches!(
        outcome.evaluation().upsert(),
        Err(UpsertViolation::MissingUpsertFlag(ids)) if ids.len() == 1 && ids[0].as_str() == "2"
    ));
    let message = outcome.failure_message();
    assert!(message.starts_with("Expected doc_as_upsert flag for updates [\"2\"], but it was missing\n"));
    assert!(!message.contains("no partial updates were performed"));
    Ok(())
}

#[test]
fn tier3_all_flagged_updates_pass() -> anyhow::Result<()> {
    let (_real, handle) = recording_handle();

    expect_index_touched("users")
        .doc_as_upsert()
        .evaluate(&handle, |scope| {
            scope.import("users", vec![upsert_op(1, json!({"a": 1})), upsert_op(2, json!({"a": 2}))])?;
            anyhow::Ok(())
        })?
        .assert_passed();
    Ok(())
}

#[test]
fn tier3_flagged_update_counts_as_reindex() -> anyhow::Result<()> {
    let (_real, handle) = recording_handle();

    expect_index_touched("users")
        .and_reindex([1], DocOptions::new().with(json!({"name": "Duke"})))?
        .doc_as_upsert()
        .evaluate(&handle, |scope| {
            scope.import("users", vec![upsert_op(1, json!({"name": "Duke"}))])?;
            anyhow::Ok(())
        })?
        .assert_passed();
    Ok(())
}

#[test]
fn tier3_flagged_update_does_not_satisfy_update_expectation() -> anyhow::Result<()> {
    let (_real, handle) = recording_handle();

    let outcome = expect_index_touched("users")
        .and_update([1], DocOptions::new())?
        .evaluate(&handle, |scope| {
            scope.import("users", vec![upsert_op(1, json!({"name": "Duke"}))])?;
            anyhow::Ok(())
        })?;

    assert!(!outcome.passed());
    assert!(outcome
        .failure_message()
        .starts_with("Expected document with id `1` to be updated, but it was not\n"));
    Ok(())
}

#[test]
fn tier3_flagged_update_skips_with_only() -> anyhow::Result<()> {
    let (_real, handle) = recording_handle();

    let outcome = expect_index_touched("users")
        .and_update([1], DocOptions::new().with_only(json!({"name": "A"})))?
        .and_reindex([2], DocOptions::new())?
        .evaluate(&handle, |scope| {
            scope.import(
                "users",
                vec![update_op(1, json!({"name": "A"})), upsert_op(2, json!({"name": "B", "age": 5}))],
            )?;
            anyhow::Ok(())
        })?;

    outcome.assert_passed();
    let reindexed = &outcome.reconciliation().verdicts(Category::Reindex)[0];
    assert_eq!(reindexed.only_keys_ok, None);
    assert_eq!(reindexed.observation.real_attributes.len(), 2);
    Ok(())
}

#[test]
fn tier3_update_dump_shows_payload_as_sent() -> anyhow::Result<()> {
    let (_real, handle) = recording_handle();

    let outcome = expect_index_touched("users")
        .and_delete([9], DocOptions::new())?
        .evaluate(&handle, |scope| {
            scope.import("users", vec![upsert_op(1, json!({"a": 1}))])?;
            anyhow::Ok(())
        })?;

    assert!(outcome.failure_message().contains(
        "Actually updated documents:\n  document id `1` and attributes {\"doc\":{\"a\":1},\"doc_as_upsert\":true}\n"
    ));
    Ok(())
}
