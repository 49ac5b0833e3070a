//! Tier 5: Usage and Configuration

use crate::test_utils::*;
use indexcheck::{
    expect_index_touched, expect_index_touched_with, json, Category, CheckConfig, DocOptions, Error, StrategyKind,
};

#[test]
fn tier5_only_requires_a_declaration() {
    let err = expect_index_touched("users").only().unwrap_err();
    assert_eq!(err, Error::OnlyWithoutDeclarations);
    assert!(err.is_usage_error());
    assert_eq!(
        err.to_string(),
        "Use `only` in conjunction with `and_reindex`, `and_update` or `and_delete`"
    );
}

#[test]
fn tier5_only_after_any_category_is_accepted() {
    assert!(expect_index_touched("users")
        .and_delete([1], DocOptions::new())
        .and_then(|chain| chain.only())
        .is_ok());
}

#[test]
fn tier5_with_only_outside_update_is_rejected() {
    let err = expect_index_touched("users")
        .and_reindex([1], DocOptions::new().with_only(json!({"a": 1})))
        .unwrap_err();
    assert_eq!(
        err,
        Error::UnsupportedOption {
            option: "with_only",
            category: Category::Reindex
        }
    );
    assert_eq!(err.to_string(), "`with_only` cannot be used with `and_reindex`");

    let err = expect_index_touched("users")
        .and_delete([1], DocOptions::new().with_only(json!({"a": 1})))
        .unwrap_err();
    assert_eq!(err.to_string(), "`with_only` cannot be used with `and_delete`");
}

#[test]
fn tier5_with_on_delete_is_ignored() -> anyhow::Result<()> {
    let (_real, handle) = recording_handle();

    expect_index_touched("users")
        .and_delete([1], DocOptions::new().with(json!({"a": 1})))?
        .evaluate(&handle, |scope| {
            scope.import("users", vec![delete_op(1)])?;
            anyhow::Ok(())
        })?
        .assert_passed();
    Ok(())
}

#[test]
fn tier5_non_object_attributes_are_rejected() {
    let err = expect_index_touched("users")
        .and_update([1], DocOptions::new().with(json!(["a"])))
        .unwrap_err();
    assert!(matches!(err, Error::AttributesNotAMap { option: "with", .. }));
}

#[test]
fn tier5_config_prefix_targets_prefixed_index() -> anyhow::Result<()> {
    let (real, handle) = recording_handle();
    let config = CheckConfig::from_toml_str("index_prefix = \"test\"")?;

    let chain = expect_index_touched_with(&config, "users")?;
    assert_eq!(chain.index(), "test_users");

    chain
        .and_reindex([1], DocOptions::new())?
        .evaluate(&handle, |scope| {
            scope.import("test_users", vec![index_op(1, json!({}))])?;
            scope.import("users", vec![index_op(2, json!({}))])?;
            anyhow::Ok(())
        })?
        .assert_passed();

    assert_eq!(real.indices(), vec!["users".to_string()]);
    Ok(())
}

#[test]
fn tier5_config_strategy_is_used_and_overridable() -> anyhow::Result<()> {
    let (_real, handle) = recording_handle();
    let config = CheckConfig::from_toml_str("strategy = \"urgent\"")?;
    let action = |scope: &mut indexcheck::StrategyScope<'_>| {
        scope.import("users", vec![index_op(1, json!({}))])?;
        scope.import("users", vec![index_op(1, json!({}))])?;
        anyhow::Ok(())
    };

    expect_index_touched_with(&config, "users")?
        .and_reindex([1], DocOptions::new().times(2))?
        .evaluate(&handle, action)?
        .assert_passed();

    expect_index_touched_with(&config, "users")?
        .strategy(StrategyKind::Atomic)
        .and_reindex([1], DocOptions::new().times(1))?
        .evaluate(&handle, action)?
        .assert_passed();
    Ok(())
}

#[test]
fn tier5_invalid_strategy_in_config() {
    let config = CheckConfig {
        strategy: "eventually".to_string(),
        ..CheckConfig::default()
    };
    let err = expect_index_touched_with(&config, "users").unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));
}

#[test]
fn tier5_config_file_round_trip() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join(indexcheck::CONFIG_FILE_NAME);
    std::fs::write(&path, "strategy = \"atomic_no_refresh\"\nindex_prefix = \"ci\"\n")?;

    let config = CheckConfig::from_file(&path)?;
    assert_eq!(config.strategy_kind()?, StrategyKind::AtomicNoRefresh);
    assert_eq!(expect_index_touched_with(&config, "users")?.index(), "ci_users");
    Ok(())
}

#[test]
#[should_panic(expected = "Expected index `users` to be updated, but it was not")]
fn tier5_assert_passed_panics_with_diagnostic() {
    let (_real, handle) = recording_handle();
    expect_index_touched("users")
        .evaluate(&handle, |_| anyhow::Ok(()))
        .unwrap()
        .assert_passed();
}

#[test]
#[should_panic(expected = "not to be updated, but it was with")]
fn tier5_assert_not_touched_panics_with_diagnostic() {
    let (_real, handle) = recording_handle();
    expect_index_touched("users")
        .evaluate(&handle, |scope| {
            scope.import("users", vec![delete_op(1)])?;
            anyhow::Ok(())
        })
        .unwrap()
        .assert_not_touched();
}
