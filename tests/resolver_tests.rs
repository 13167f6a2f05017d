//! Path resolution against storage tiers

mod common;

use std::path::PathBuf;

use common::MemoryStore;
use ovms_script::{PathResolver, ScriptError, StorageTier};

fn tiers() -> Vec<StorageTier> {
    vec![StorageTier::new("sd", "/sd"), StorageTier::new("store", "/store")]
}

#[test]
fn test_absolute_name_tries_only_that_path() {
    let store = MemoryStore::new();
    store.add("/sd/scripts/boot.ovms", "help\n");
    let resolver = PathResolver::new(tiers());

    let result = resolver.resolve(&store, "/tmp/boot.ovms");
    assert!(matches!(result, Err(ScriptError::NotFound { ref name }) if name == "/tmp/boot.ovms"));
    assert_eq!(store.attempts(), vec![PathBuf::from("/tmp/boot.ovms")]);
}

#[test]
fn test_absolute_name_opens_directly() {
    let store = MemoryStore::new();
    store.add("/store/other/x.ovms", "help\n");
    let resolver = PathResolver::new(tiers());

    let script = resolver.resolve(&store, "/store/other/x.ovms").unwrap();
    assert_eq!(script.path, PathBuf::from("/store/other/x.ovms"));
    assert_eq!(store.attempts().len(), 1);
}

#[test]
fn test_relative_name_falls_through_to_second_tier() {
    let store = MemoryStore::new();
    store.add("/store/scripts/boot.ovms", "help\n");
    let resolver = PathResolver::new(tiers());

    let script = resolver.resolve(&store, "boot.ovms").unwrap();
    assert_eq!(script.path, PathBuf::from("/store/scripts/boot.ovms"));
    assert_eq!(
        store.attempts(),
        vec![
            PathBuf::from("/sd/scripts/boot.ovms"),
            PathBuf::from("/store/scripts/boot.ovms"),
        ]
    );
}

#[test]
fn test_first_tier_wins() {
    let store = MemoryStore::new();
    store.add("/sd/scripts/boot.ovms", "help\n");
    store.add("/store/scripts/boot.ovms", "help\n");
    let resolver = PathResolver::new(tiers());

    let script = resolver.resolve(&store, "boot.ovms").unwrap();
    assert_eq!(script.path, PathBuf::from("/sd/scripts/boot.ovms"));
    assert_eq!(store.attempts().len(), 1);
}

#[test]
fn test_relative_name_not_found_anywhere() {
    let store = MemoryStore::new();
    let resolver = PathResolver::new(tiers());

    let err = resolver.resolve(&store, "missing.js").unwrap_err();
    assert_eq!(err.sink_message(), "Error: Script not found");
    assert_eq!(store.attempts().len(), 2);
    assert!(store.opened().is_empty());
}

#[test]
fn test_directory_is_not_a_script() {
    let store = MemoryStore::new();
    store.add("/store/scripts/lib/util.js", "1");
    let resolver = PathResolver::new(tiers());

    assert!(resolver.resolve(&store, "lib").is_err());
}

#[test]
fn test_dropping_resolved_script_closes_it() {
    let store = MemoryStore::new();
    store.add("/store/scripts/boot.ovms", "help\n");
    let resolver = PathResolver::new(tiers());

    let script = resolver.resolve(&store, "boot.ovms").unwrap();
    assert_eq!(store.closed(), 0);
    drop(script);
    assert_eq!(store.closed(), 1);
}
