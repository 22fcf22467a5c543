//! Document creation and deletion through the coordinator.

use folio_asset::{DocumentId, DocumentStatus, ResourceKind};
use folio_reconcile::{
    fields, Coordinator, FormFields, ReconcileConfig, ReconcileError, ReconcilePhase,
    ValidationError,
};
use folio_store::MemoryDocumentStore;
use folio_test_utils::{image_captions, mp4, png, seeded_document, FaultyGateway};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn setup(gateway: FaultyGateway) -> (Arc<FaultyGateway>, Arc<MemoryDocumentStore>, Coordinator) {
    let gateway = Arc::new(gateway);
    let store = Arc::new(MemoryDocumentStore::new());
    let coordinator = Coordinator::new(gateway.clone(), store.clone(), ReconcileConfig::default());
    (gateway, store, coordinator)
}

#[tokio::test]
async fn create_uploads_and_persists() {
    let (gateway, store, coordinator) = setup(FaultyGateway::new());

    let form = FormFields::new()
        .text(fields::TITLE, "Hello")
        .text(fields::CONTENT, "<p>body</p>")
        .text(fields::TAGS, "a,b")
        .file(fields::NEW_IMAGES, png("one.png"))
        .file(fields::NEW_IMAGES, png("two.png"))
        .text(fields::NEW_IMAGE_CAPTIONS, "first")
        .text(fields::NEW_IMAGE_CAPTIONS, "second")
        .file(fields::NEW_VIDEO, mp4("clip.mp4"))
        .text(fields::NEW_VIDEO_CAPTION, "clip");
    let outcome = coordinator.create(&form).await.unwrap();

    let doc = &outcome.document;
    assert_eq!(doc.title, "Hello");
    assert_eq!(doc.slug, "hello");
    assert_eq!(doc.status, DocumentStatus::Inactive);
    assert_eq!(doc.tags, vec!["a", "b"]);
    assert_eq!(image_captions(doc), vec!["first", "second"]);
    assert_eq!(doc.video.as_ref().unwrap().caption, "clip");
    assert_eq!(doc.version, 1);
    assert_eq!(store.get(&doc.id).as_ref(), Some(doc));

    assert_eq!(gateway.inner().blob_count(ResourceKind::Image), 2);
    assert_eq!(gateway.inner().blob_count(ResourceKind::Video), 1);
    assert_eq!(
        outcome.phases,
        vec![
            ReconcilePhase::Validating,
            ReconcilePhase::Uploading,
            ReconcilePhase::Merging,
            ReconcilePhase::Persisting,
            ReconcilePhase::Done,
        ]
    );
}

#[tokio::test]
async fn create_requires_title() {
    let (gateway, store, coordinator) = setup(FaultyGateway::new());

    let form = FormFields::new()
        .text(fields::CONTENT, "body")
        .file(fields::NEW_IMAGES, png("one.png"));
    let err = coordinator.create(&form).await.unwrap_err();

    assert!(matches!(
        err,
        ReconcileError::Validation(ValidationError::MissingField("title"))
    ));
    assert_eq!(gateway.upload_attempts(), 0);
    assert!(store.is_empty());
}

#[tokio::test]
async fn create_upload_failure_rolls_back() {
    let (gateway, store, coordinator) = setup(FaultyGateway::new().fail_upload("clip.mp4"));

    let form = FormFields::new()
        .text(fields::TITLE, "t")
        .text(fields::CONTENT, "c")
        .file(fields::NEW_IMAGES, png("one.png"))
        .file(fields::NEW_VIDEO, mp4("clip.mp4"));
    let err = coordinator.create(&form).await.unwrap_err();

    assert!(matches!(err, ReconcileError::AssetUploadFailed { .. }));
    assert!(store.is_empty());
    assert_eq!(gateway.inner().blob_count(ResourceKind::Image), 0);
    assert_eq!(gateway.inner().deleted_ids(), gateway.inner().uploaded_ids());
}

#[tokio::test]
async fn delete_removes_document_then_blobs() {
    let (gateway, store, coordinator) = setup(FaultyGateway::new());
    let doc = seeded_document(gateway.inner(), "d1", &["i1", "i2"], Some("v1"));
    store.insert(doc.clone());

    let outcome = coordinator.delete(&doc.id).await.unwrap();

    assert!(outcome.warnings.is_empty());
    assert_eq!(outcome.document, doc);
    assert!(store.get(&doc.id).is_none());
    assert_eq!(gateway.inner().blob_count(ResourceKind::Image), 0);
    assert_eq!(gateway.inner().blob_count(ResourceKind::Video), 0);
    assert_eq!(
        outcome.phases,
        vec![
            ReconcilePhase::Validating,
            ReconcilePhase::Persisting,
            ReconcilePhase::Deleting,
            ReconcilePhase::Done,
        ]
    );
}

#[tokio::test]
async fn delete_blob_failure_is_a_warning() {
    let (gateway, store, coordinator) = setup(FaultyGateway::new().fail_delete("v1"));
    let doc = seeded_document(gateway.inner(), "d1", &["i1"], Some("v1"));
    store.insert(doc.clone());

    let outcome = coordinator.delete(&doc.id).await.unwrap();

    assert_eq!(outcome.warnings.len(), 1);
    assert_eq!(outcome.warnings[0].reference().id.as_str(), "v1");
    assert!(store.is_empty());
    assert!(gateway.inner().contains(ResourceKind::Video, &"v1".into()));
}

#[tokio::test]
async fn delete_unknown_document() {
    let (gateway, _, coordinator) = setup(FaultyGateway::new());
    let err = coordinator
        .delete(&DocumentId::from("nope"))
        .await
        .unwrap_err();
    assert!(matches!(err, ReconcileError::NotFound(_)));
    assert!(gateway.inner().calls().is_empty());
}
