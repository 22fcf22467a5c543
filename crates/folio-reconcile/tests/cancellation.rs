//! A caller that gives up mid-upload must not leak blobs.

use folio_asset::ResourceKind;
use folio_reconcile::{fields, Coordinator, FormFields, ReconcileConfig};
use folio_store::MemoryDocumentStore;
use folio_test_utils::{png, seeded_document, FaultyGateway};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn abandoned_update_rolls_back_finished_uploads() {
    let gateway = Arc::new(
        FaultyGateway::new()
            .delay_upload("slow.png", Duration::from_millis(50))
            .delay_upload("slower.png", Duration::from_millis(80)),
    );
    let store = Arc::new(MemoryDocumentStore::new());
    let coordinator = Coordinator::new(gateway.clone(), store.clone(), ReconcileConfig::default());

    let doc = seeded_document(gateway.inner(), "d1", &["i1"], None);
    store.insert(doc.clone());

    let form = FormFields::new()
        .file(fields::NEW_IMAGES, png("slow.png"))
        .file(fields::NEW_IMAGES, png("slower.png"));

    let abandoned =
        tokio::time::timeout(Duration::from_millis(10), coordinator.update(&doc.id, &form)).await;
    assert!(abandoned.is_err());

    // Let the detached upload task finish and compensate.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let uploaded: HashSet<_> = gateway.inner().uploaded_ids().into_iter().collect();
    let deleted: HashSet<_> = gateway.inner().deleted_ids().into_iter().collect();
    assert_eq!(uploaded.len(), 2);
    assert_eq!(uploaded, deleted);
    assert_eq!(gateway.inner().blob_count(ResourceKind::Image), 1);
    assert_eq!(store.get(&doc.id).unwrap(), doc);
}
