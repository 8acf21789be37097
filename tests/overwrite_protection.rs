use tracebook::error::TracebookError;
use tracebook::persist;
use tracebook::store::Store;

fn occupied_store() -> Store {
    let mut store = Store::new();
    store.add_key("kept");
    store.set_subkeys("kept", &["x"]).expect("subkeys");
    store.append_subkey_data("kept", "x", 42.0).expect("x");
    store
}

fn archive_file(rows: &str) -> tempfile::NamedTempFile {
    let file = tempfile::NamedTempFile::new().expect("temp file");
    std::fs::write(file.path(), rows).expect("write archive");
    file
}

#[test]
fn occupied_stores_refuse_a_read_without_permission() {
    let file = archive_file("#! data incoming\nv\n1.0\n");
    let mut store = occupied_store();
    let err = store.read(file.path(), false).expect_err("protected");
    assert!(matches!(err, TracebookError::OverwriteProtected), "{err}");
    assert_eq!(
        store.get_subkey_data("kept", "x").expect("x"),
        &[42.0],
        "the store is untouched"
    );
    assert!(!store.contains_key("incoming"));
}

#[test]
fn permission_replaces_the_whole_store() {
    let file = archive_file("*! hash beef007\n\n#! data incoming\nv\n1.0\n");
    let mut store = occupied_store();
    store.read(file.path(), true).expect("overwrite allowed");
    assert!(!store.contains_key("kept"), "old keys are gone");
    assert_eq!(store.get_subkey_data("incoming", "v").expect("v"), &[1.0]);
    assert_eq!(store.root_key(), "beef007", "root identity adopted");
}

#[test]
fn empty_stores_read_without_permission() {
    let file = archive_file("#! data incoming\nv\n1.0\n");
    let mut store = Store::new();
    store.read(file.path(), false).expect("empty store needs no permission");
    assert!(store.contains_key("incoming"));
}

#[test]
fn a_parse_failure_leaves_the_store_untouched() {
    let file = archive_file("#! data incoming\nv\n1.0\nbroken\n");
    let mut store = occupied_store();
    let err = store.read(file.path(), true).expect_err("malformed row");
    assert!(matches!(err, TracebookError::Parse { .. }), "{err}");
    assert!(store.contains_key("kept"), "nothing staged lands in the store");
    assert!(!store.contains_key("incoming"));
    assert_eq!(store.get_subkey_data("kept", "x").expect("x"), &[42.0]);
}

#[test]
fn read_into_refuses_an_occupied_store_before_parsing() {
    let mut store = occupied_store();
    let err =
        persist::read_into(&mut store, "#! data incoming\nv\n1.0\n".as_bytes(), "memory", false)
            .expect_err("protected");
    assert!(matches!(err, TracebookError::OverwriteProtected), "{err}");
    assert_eq!(store.get_subkey_data("kept", "x").expect("x"), &[42.0]);
    assert!(!store.contains_key("incoming"));
}

#[test]
fn read_into_with_permission_commits_the_staged_store() {
    let mut store = occupied_store();
    persist::read_into(
        &mut store,
        "*! hash beef007\n\n#! data incoming\nv\n1.0\n".as_bytes(),
        "memory",
        true,
    )
    .expect("overwrite allowed");
    assert!(!store.contains_key("kept"));
    assert_eq!(store.get_subkey_data("incoming", "v").expect("v"), &[1.0]);
    assert_eq!(store.root_key(), "beef007");
}

#[test]
fn missing_files_surface_as_io_errors() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut store = Store::new();
    let err = store
        .read(dir.path().join("absent.dat"), false)
        .expect_err("no such file");
    assert!(matches!(err, TracebookError::Io(_)), "{err}");
}

#[test]
fn write_then_read_through_files_round_trips() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("session.dat");
    let mut store = Store::new();
    store.set_note("overnight run").expect("note");
    let run = store.add_hash_key("sweep");
    store.set_subkeys(&run, &["v", "i"]).expect("subkeys");
    store.append_subkey_data(&run, "v", 1.0).expect("v");
    store.append_subkey_data(&run, "i", 0.1).expect("i");
    store.write(&path).expect("write");

    let mut restored = Store::new();
    restored.read(&path, false).expect("read");
    assert_eq!(restored.root_key(), store.root_key());
    assert_eq!(restored.note(), Some("overnight run"));
    assert_eq!(restored.get_subkey_data(&run, "v").expect("v"), &[1.0]);
    assert_eq!(restored.get_subkey_data(&run, "i").expect("i"), &[0.1]);
}

#[test]
fn a_failed_write_leaves_no_file_behind() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("ragged.dat");
    let mut store = Store::new();
    store.add_key("run1");
    store.set_subkeys("run1", &["v", "i"]).expect("subkeys");
    store.append_subkey_data("run1", "v", 1.0).expect("v");
    store.write(&path).expect_err("ragged record refused");
    assert!(!path.exists(), "nothing truncated lands on disk");
}
