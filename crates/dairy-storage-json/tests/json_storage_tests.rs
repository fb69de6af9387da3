use dairy_core::storage::{Collection, CollectionStorage};
use dairy_domain::{Catalog, Customer, DairyBook, ItemSpec, Product, TimeSlot};
use dairy_storage_json::{JsonCollectionStorage, StoragePaths};
use std::fs;
use tempfile::tempdir;

fn sample_book() -> DairyBook {
    let mut book = DairyBook::with_catalog(Catalog::new(vec![Product::new(
        "milk", "Milk", "litre", 60.0,
    )]));
    book.customers.push(
        Customer::fixed("Asha")
            .with_slot_items(TimeSlot::Morning, vec![ItemSpec::new("milk", 1.0)]),
    );
    book
}

#[test]
fn missing_collections_load_as_empty() {
    let dir = tempdir().expect("tempdir");
    let storage = JsonCollectionStorage::new(StoragePaths::under(dir.path())).expect("storage");
    let book = storage.load_book().expect("load");
    assert_eq!(book, DairyBook::default());
}

#[test]
fn collections_round_trip_as_separate_files() {
    let dir = tempdir().expect("tempdir");
    let paths = StoragePaths::under(dir.path());
    let storage = JsonCollectionStorage::new(paths.clone()).expect("storage");
    let book = sample_book();

    storage.save_all(&book).expect("save");
    for collection in Collection::ALL {
        let path = storage.collection_path(collection);
        assert!(path.exists(), "{} should exist", path.display());
        assert!(!path.with_extension("json.tmp").exists());
    }

    let loaded = storage.load_book().expect("load");
    assert_eq!(loaded, book);
    let raw = fs::read_to_string(paths.data_root.join("products.json")).unwrap();
    assert!(raw.trim_start().starts_with('['));
}

#[test]
fn saving_one_collection_leaves_the_others() {
    let dir = tempdir().expect("tempdir");
    let storage = JsonCollectionStorage::new(StoragePaths::under(dir.path())).expect("storage");
    let mut book = sample_book();
    storage.save_all(&book).unwrap();

    book.customers.clear();
    book.catalog.products[0].price = 64.0;
    storage
        .save_collection(&book, Collection::Products)
        .unwrap();

    let loaded = storage.load_book().unwrap();
    assert_eq!(loaded.customers.len(), 1);
    assert_eq!(loaded.catalog.products[0].price, 64.0);
}

#[test]
fn corrupt_collection_reports_serde_error() {
    let dir = tempdir().expect("tempdir");
    let storage = JsonCollectionStorage::new(StoragePaths::under(dir.path())).expect("storage");
    fs::write(storage.collection_path(Collection::Sales), "{not json").unwrap();
    let err = storage.load_book().unwrap_err();
    assert!(err.to_string().contains("sales"));
}

#[test]
fn snapshots_restore_previous_state() {
    let dir = tempdir().expect("tempdir");
    let storage = JsonCollectionStorage::new(StoragePaths::under(dir.path())).expect("storage");
    let book = sample_book();
    storage.save_all(&book).unwrap();

    let info = storage.backup(Some("Before close")).expect("backup");
    assert!(info.id.starts_with("snapshot_"));
    assert!(info.id.contains("before-close"));

    let mut changed = book.clone();
    changed.customers.clear();
    storage.save_all(&changed).unwrap();

    let backups = storage.list_backups().unwrap();
    assert!(backups.iter().any(|entry| entry.id == info.id));

    let restored = storage.restore_backup(&info).expect("restore");
    assert_eq!(restored, book);
    assert_eq!(storage.load_book().unwrap(), book);
}

#[test]
fn retention_keeps_newest_snapshots() {
    let dir = tempdir().expect("tempdir");
    let storage = JsonCollectionStorage::with_retention(StoragePaths::under(dir.path()), 3)
        .expect("storage");
    storage.save_all(&sample_book()).unwrap();

    let mut created = Vec::new();
    for _ in 0..5 {
        created.push(storage.backup(None).unwrap().id);
    }
    let backups = storage.list_backups().unwrap();
    assert_eq!(backups.len(), 3);
    let newest = created.last().unwrap();
    assert!(backups.iter().any(|entry| &entry.id == newest));
}

#[test]
fn listing_ignores_stray_entries_in_backup_root() {
    let dir = tempdir().expect("tempdir");
    let storage = JsonCollectionStorage::new(StoragePaths::under(dir.path())).expect("storage");
    storage.save_all(&sample_book()).unwrap();
    let info = storage.backup(None).unwrap();

    fs::create_dir_all(storage.backups_dir().join("manual-copy")).unwrap();
    fs::write(storage.backups_dir().join("notes.txt"), "kept by hand").unwrap();

    let backups = storage.list_backups().unwrap();
    assert_eq!(backups.len(), 1);
    assert_eq!(backups[0].id, info.id);
    assert!(backups[0].path.join("customers.json").exists());
}
