use tracebook::error::TracebookError;
use tracebook::store::{MetaKey, Store, SELF_ALIAS};

#[test]
fn self_alias_writes_land_on_the_root_key() {
    let mut store = Store::new();
    store
        .set_metadata(SELF_ALIAS, "operator", "mh")
        .expect("set through the alias");
    let root = store.root_key().to_owned();
    assert_eq!(
        store.get_metadata(root.as_str(), "operator").expect("root"),
        Some("mh")
    );
}

#[test]
fn root_key_writes_read_back_through_the_alias() {
    let mut store = Store::new();
    let root = store.root_key().to_owned();
    store
        .set_metadata(root.as_str(), "operator", "mh")
        .expect("set on the root directly");
    assert_eq!(
        store.get_metadata(SELF_ALIAS, "operator").expect("alias"),
        Some("mh")
    );
    assert_eq!(
        store.get_metadata(MetaKey::Root, "operator").expect("enum"),
        Some("mh")
    );
}

#[test]
fn alias_resolution_happens_at_the_boundary() {
    assert_eq!(MetaKey::from(SELF_ALIAS), MetaKey::Root);
    assert_eq!(MetaKey::from("run1"), MetaKey::Named("run1"));
}

#[test]
fn absent_tags_on_known_keys_are_not_errors() {
    let mut store = Store::new();
    store.add_key("run1");
    assert_eq!(store.get_metadata("run1", "missing").expect("known key"), None);
    assert_eq!(store.get_metadata(SELF_ALIAS, "missing").expect("root"), None);
}

#[test]
fn unknown_keys_are_loud() {
    let mut store = Store::new();
    assert!(matches!(
        store.get_metadata("ghost", "tag"),
        Err(TracebookError::KeyNotFound(_))
    ));
    assert!(matches!(
        store.set_metadata("ghost", "tag", "value"),
        Err(TracebookError::KeyNotFound(_))
    ));
}

#[test]
fn note_helpers_use_the_root_namespace() {
    let mut store = Store::new();
    assert_eq!(store.note(), None);
    store.set_note("sample B, second cooldown").expect("note");
    assert_eq!(store.note(), Some("sample B, second cooldown"));
    assert_eq!(
        store.get_metadata(SELF_ALIAS, "__note__").expect("root"),
        Some("sample B, second cooldown"),
        "the note is ordinary root metadata"
    );
}

#[test]
fn metadata_without_a_record_is_allowed() {
    let store = Store::new();
    let root = store.root_key().to_owned();
    assert!(
        !store.contains_key(&root),
        "the root key carries metadata but never a record"
    );
}
