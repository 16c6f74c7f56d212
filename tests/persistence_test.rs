use tempfile::TempDir;

use sorrel::{Document, FieldValue, OpenMode, SorrelError, Store, StoreConfig};

fn config(dir: &TempDir) -> StoreConfig {
    StoreConfig::builder()
        .path(dir.path().join("index"))
        .fields(vec!["title", "body"])
        .build()
}

#[test]
fn test_writes_visible_after_flush() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store = Store::open(config(&dir))?;

    Document::new()
        .add_field("title", "Pasture")
        .add_field("body", "the cow ate grass")
        .save(&store)?;

    // The read-only handle sees the last flushed snapshot.
    assert_eq!(store.size()?, 0);
    assert!(store.search("cow")?.is_empty());

    store.flush()?;
    assert_eq!(store.size()?, 1);
    assert_eq!(store.search("cow")?.len(), 1);

    Ok(())
}

#[test]
fn test_transaction_commit_reopens_reader() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store = Store::open(config(&dir))?;
    assert_eq!(store.size()?, 0);

    store.transaction(|s| -> anyhow::Result<()> {
        Document::new().add_field("title", "one").save(s)?;
        Document::new().add_field("title", "two").save(s)?;
        Ok(())
    })?;
    assert_eq!(store.size()?, 2);

    Ok(())
}

#[test]
fn test_reopen_existing_index() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    {
        let store = Store::open(config(&dir))?;
        Document::new()
            .add_field("title", "Barn")
            .add_field("body", "hay bales")
            .save(&store)?;
        store.close()?;
    }

    let store = Store::open(config(&dir))?;
    assert_eq!(store.size()?, 1);
    let doc = store.find(1)?;
    assert_eq!(doc.get("title"), Some(&FieldValue::from("Barn")));

    // New ids continue from the persisted ones.
    let id = Document::new().add_field("title", "Silo").save(&store)?;
    assert_eq!(id, 2);

    Ok(())
}

#[test]
fn test_open_modes() -> anyhow::Result<()> {
    let dir = TempDir::new()?;

    let missing = StoreConfig::builder()
        .path(dir.path().join("missing"))
        .mode(OpenMode::Open)
        .build();
    assert!(Store::open(missing).is_err());

    let store = Store::open(config(&dir))?;
    Document::new().add_field("title", "kept").save(&store)?;
    store.close()?;

    let overwrite = StoreConfig {
        mode: OpenMode::CreateOrOverwrite,
        ..config(&dir)
    };
    let store = Store::open(overwrite)?;
    assert_eq!(store.size()?, 0);
    assert!(matches!(store.find(1), Err(SorrelError::DocNotFound(1))));

    Ok(())
}
