use std::collections::HashMap;

use sorrel::{Document, FieldValue, SorrelError, Store, StoreConfig, StoreState};

fn content_store() -> sorrel::Result<Store> {
    Store::open(StoreConfig::builder().fields(vec!["content"]).build())
}

#[test]
fn test_save_assigns_increasing_ids() -> sorrel::Result<()> {
    let store = content_store()?;

    let mut ids = Vec::new();
    for text in ["cow", "dog", "cat"] {
        let mut doc = Document::from_text(text);
        ids.push(doc.save(&store)?);
    }
    assert_eq!(ids, vec![1, 2, 3]);

    // Ids are not reused after a delete.
    store.delete(3)?;
    let mut doc = Document::from_text("mouse");
    assert_eq!(doc.save(&store)?, 4);

    Ok(())
}

#[test]
fn test_save_with_explicit_id_is_idempotent() -> sorrel::Result<()> {
    let store = content_store()?;

    let fields = HashMap::from([
        ("id".to_string(), FieldValue::Integer(10)),
        ("content".to_string(), FieldValue::from("cow dog")),
    ]);
    let mut doc = Document::from_fields(fields)?;
    assert_eq!(doc.save(&store)?, 10);
    assert_eq!(doc.save(&store)?, 10);
    assert_eq!(doc.save(&store)?, 10);
    assert_eq!(store.size()?, 1);

    // Fresh ids continue after the highest id in use.
    let mut other = Document::from_text("cat");
    assert_eq!(other.save(&store)?, 11);
    assert_eq!(store.size()?, 2);

    Ok(())
}

#[test]
fn test_find_missing_document() -> sorrel::Result<()> {
    let store = content_store()?;
    Document::from_text("cow").save(&store)?;

    assert!(matches!(store.find(42), Err(SorrelError::DocNotFound(42))));
    assert!(store.get(42)?.is_none());
    assert!(store.get(1)?.is_some());
    assert_eq!(store.delete(42)?, None);

    Ok(())
}

#[test]
fn test_document_terms() -> sorrel::Result<()> {
    let store = content_store()?;
    let mut doc = Document::from_text("once upon a time");
    doc.save(&store)?;

    let terms = store.find(doc.id.unwrap_or_default())?.terms()?;
    assert_eq!(terms.last().map(String::as_str), Some("upon"));
    assert!(terms.contains(&"XCONTENTonce".to_string()));

    // Unsaved documents have nothing to look terms up in.
    assert!(matches!(
        Document::from_text("cow").terms(),
        Err(SorrelError::DocNotSet)
    ));

    Ok(())
}

#[test]
fn test_stored_fields_and_data() -> sorrel::Result<()> {
    let config: StoreConfig = serde_json::from_value(serde_json::json!({
        "fields": {
            "name": { "type": "text" },
            "age": { "type": "integer", "sortable": true, "stored": false },
            "tags": { "type": "text", "stored": false }
        }
    }))?;
    let store = Store::open(config)?;

    let mut doc = Document::new()
        .add_field("name", "john")
        .add_field("age", 30)
        .add_field("tags", "admin")
        .with_data(&serde_json::json!({ "source": "import" }))?;
    let id = store.add(&mut doc)?;

    let found = store.find(id)?;
    assert_eq!(found.get("name"), Some(&FieldValue::from("john")));
    assert!(found.get("age").is_none());
    assert!(found.get("tags").is_none());
    assert_eq!(found.get_value("age")?, FieldValue::Integer(30));
    assert_eq!(
        found.data_as::<serde_json::Value>()?,
        Some(serde_json::json!({ "source": "import" }))
    );

    Ok(())
}

#[test]
fn test_transaction_rollback_keeps_size() -> sorrel::Result<()> {
    let store = content_store()?;
    Document::from_text("cow").save(&store)?;
    store.flush()?;
    let before = store.size()?;

    let result: sorrel::Result<()> = store.transaction(|s| {
        Document::from_text("dog").save(s)?;
        Document::from_text("cat").save(s)?;
        Err(SorrelError::invalid_operation("abort"))
    });
    assert!(matches!(result, Err(SorrelError::InvalidOperation(_))));

    store.flush()?;
    assert_eq!(store.size()?, before);

    Ok(())
}

#[test]
fn test_transaction_rollback_discards_dictionary_updates() -> sorrel::Result<()> {
    let store = content_store()?;
    Document::from_text("a herd of cattle").save(&store)?;
    store.flush()?;
    let synonyms = || {
        sorrel::SearchRequest::builder("cow")
            .flags(sorrel::QueryFlags::default() | sorrel::QueryFlags::SYNONYM)
            .build()
    };

    let result: sorrel::Result<()> = store.transaction(|s| {
        Document::from_text("zebra").save(s)?;
        s.add_synonym("cow", "cattle")?;
        Err(SorrelError::invalid_operation("abort"))
    });
    assert!(result.is_err());

    store.flush()?;
    assert_eq!(store.size()?, 1);
    assert_eq!(store.search("zebr")?.corrected_query, None);
    assert!(store.search(synonyms())?.is_empty());

    // The same work committed is kept.
    store.transaction(|s| -> sorrel::Result<()> {
        Document::from_text("zebra").save(s)?;
        s.add_synonym("cow", "cattle")
    })?;
    assert_eq!(store.search("zebr")?.corrected_query.as_deref(), Some("zebra"));
    assert_eq!(store.search(synonyms())?.len(), 1);

    Ok(())
}

#[test]
fn test_transaction_commit() -> sorrel::Result<()> {
    let store = content_store()?;

    let ids = store.transaction(|s| -> sorrel::Result<Vec<u32>> {
        let a = Document::from_text("cow").save(s)?;
        let b = Document::from_text("dog").save(s)?;
        Ok(vec![a, b])
    })?;
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(store.size()?, 2);
    assert_eq!(store.search("dog")?.len(), 1);

    Ok(())
}

#[test]
fn test_transaction_with_caller_error_type() -> sorrel::Result<()> {
    #[derive(Debug)]
    enum AppError {
        Store(SorrelError),
        Rejected,
    }

    impl From<SorrelError> for AppError {
        fn from(e: SorrelError) -> Self {
            AppError::Store(e)
        }
    }

    let store = content_store()?;
    let result: Result<(), AppError> = store.transaction(|s| {
        Document::from_text("cow").save(s)?;
        Err(AppError::Rejected)
    });
    assert!(matches!(result, Err(AppError::Rejected)));
    assert_eq!(store.size()?, 0);

    Ok(())
}

#[test]
fn test_flush_inside_transaction_fails() -> sorrel::Result<()> {
    let store = content_store()?;

    let result: sorrel::Result<()> = store.transaction(|s| s.flush());
    assert!(matches!(result, Err(SorrelError::Concurrency(_))));

    // The failed transaction was rolled back and the lock released.
    store.flush()?;

    Ok(())
}

#[test]
fn test_transactions_serialize_across_threads() -> sorrel::Result<()> {
    let store = content_store()?;

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let store = store.clone();
            std::thread::spawn(move || {
                store.transaction(|s| -> sorrel::Result<()> {
                    for j in 0..5 {
                        Document::from_text(format!("thread{i} doc{j}")).save(s)?;
                    }
                    Ok(())
                })
            })
        })
        .collect();

    for handle in handles {
        handle
            .join()
            .map_err(|_| SorrelError::invalid_operation("worker panicked"))??;
    }
    assert_eq!(store.size()?, 20);

    Ok(())
}

#[test]
fn test_unsupported_language_fails_at_open() -> sorrel::Result<()> {
    let config = StoreConfig::builder().language("elvish").build();
    assert!(matches!(
        Store::open(config),
        Err(SorrelError::UnsupportedLanguage(_))
    ));

    let config = StoreConfig::builder().language("french").build();
    assert_eq!(Store::open(config)?.state(), StoreState::Open);

    Ok(())
}

#[test]
fn test_range_marker_requires_sortable_field() {
    let config: StoreConfig = serde_json::from_value(serde_json::json!({
        "fields": { "price": { "type": "float", "range_prefix": "$" } }
    }))
    .unwrap();
    assert!(matches!(Store::open(config), Err(SorrelError::Config(_))));

    let config: StoreConfig = serde_json::from_value(serde_json::json!({
        "fields": { "price": { "type": "float", "sortable": true, "range_prefix": "$" } }
    }))
    .unwrap();
    assert!(Store::open(config).is_ok());
}

#[test]
fn test_close() -> sorrel::Result<()> {
    let store = content_store()?;
    Document::from_text("cow").save(&store)?;
    store.close()?;

    assert_eq!(store.state(), StoreState::Closed);
    assert!(matches!(
        Document::from_text("dog").save(&store),
        Err(SorrelError::InvalidOperation(_))
    ));
    // Closing twice is harmless.
    store.close()?;

    Ok(())
}

#[test]
fn test_max_by_id_and_value() -> sorrel::Result<()> {
    let config: StoreConfig = serde_json::from_value(serde_json::json!({
        "fields": {
            "name": {},
            "age": { "type": "integer", "sortable": true }
        }
    }))?;
    let store = Store::open(config)?;
    assert!(store.max_by_id()?.is_none());
    assert!(store.max_by_value("age")?.is_none());

    for (name, age) in [("ann", 41), ("bob", 29), ("cid", 35)] {
        Document::new()
            .add_field("name", name)
            .add_field("age", age)
            .save(&store)?;
    }

    assert_eq!(store.max_by_id()?.and_then(|d| d.id), Some(3));
    let oldest = store.max_by_value("age")?;
    assert_eq!(
        oldest.as_ref().and_then(|d| d.get("name")),
        Some(&FieldValue::from("ann"))
    );
    assert!(matches!(
        store.max_by_value("name"),
        Err(SorrelError::InvalidArgument(_))
    ));

    Ok(())
}
