//! End-to-end update reconciliation against an in-memory store and a
//! fault-injecting gateway.

use folio_asset::{AssetId, ResourceKind};
use folio_gateway::GatewayCall;
use folio_reconcile::{
    fields, Coordinator, FormFields, ReconcileConfig, ReconcileError, ReconcileWarning, UploadSlot,
};
use folio_store::MemoryDocumentStore;
use folio_test_utils::{
    image_captions, image_ids, kept_images_json, mp4, png, seeded_document, FaultyGateway,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

struct Harness {
    gateway: Arc<FaultyGateway>,
    store: Arc<MemoryDocumentStore>,
    coordinator: Coordinator,
}

fn harness(gateway: FaultyGateway) -> Harness {
    let gateway = Arc::new(gateway);
    let store = Arc::new(MemoryDocumentStore::new());
    let coordinator = Coordinator::new(gateway.clone(), store.clone(), ReconcileConfig::default());
    Harness {
        gateway,
        store,
        coordinator,
    }
}

fn ids(list: &[AssetId]) -> Vec<String> {
    list.iter().map(|id| id.as_str().to_string()).collect()
}

#[tokio::test]
async fn noop_update_leaves_images_unchanged() {
    let h = harness(FaultyGateway::new());
    let mut doc = seeded_document(h.gateway.inner(), "d1", &["i1", "i2", "i3"], None);
    doc.images[1].caption = "second".into();
    h.store.insert(doc.clone());

    let form = FormFields::new().text(fields::EXISTING_IMAGES, kept_images_json(&["i1", "i2", "i3"]));
    let outcome = h.coordinator.update(&doc.id, &form).await.unwrap();

    assert_eq!(outcome.document.images, doc.images);
    assert!(outcome.warnings.is_empty());
    assert!(h.gateway.inner().calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn captions_follow_form_order_not_completion_order() {
    let gateway = FaultyGateway::new()
        .delay_upload("a.png", Duration::from_millis(30))
        .delay_upload("b.png", Duration::from_millis(20));
    let h = harness(gateway);
    let doc = seeded_document(h.gateway.inner(), "d1", &["i1"], None);
    h.store.insert(doc.clone());

    let form = FormFields::new()
        .file(fields::NEW_IMAGES, png("a.png"))
        .file(fields::NEW_IMAGES, png("b.png"))
        .file(fields::NEW_IMAGES, png("c.png"))
        .text(fields::NEW_IMAGE_CAPTIONS, "a")
        .text(fields::NEW_IMAGE_CAPTIONS, "b")
        .text(fields::NEW_IMAGE_CAPTIONS, "c");
    let outcome = h.coordinator.update(&doc.id, &form).await.unwrap();

    assert_eq!(image_captions(&outcome.document), vec!["", "a", "b", "c"]);

    // c finished first, a last
    let mut completion = ids(&h.gateway.inner().uploaded_ids());
    completion.reverse();
    assert_eq!(image_ids(&outcome.document)[1..].to_vec(), completion);
}

#[tokio::test]
async fn failed_upload_rolls_back_siblings_and_leaves_document() {
    let h = harness(FaultyGateway::new().fail_upload("b.png"));
    let doc = seeded_document(h.gateway.inner(), "d1", &["i1", "i2"], Some("v1"));
    h.store.insert(doc.clone());

    let form = FormFields::new()
        .text(fields::EXISTING_IMAGES, kept_images_json(&["i2"]))
        .file(fields::NEW_IMAGES, png("a.png"))
        .file(fields::NEW_IMAGES, png("b.png"))
        .file(fields::NEW_IMAGES, png("c.png"))
        .text(fields::REMOVE_VIDEO, "true");
    let err = h.coordinator.update(&doc.id, &form).await.unwrap_err();

    assert!(matches!(
        err,
        ReconcileError::AssetUploadFailed {
            slot: UploadSlot::Image(1),
            ..
        }
    ));
    assert_eq!(err.http_status_hint(), 502);
    assert_eq!(h.store.get(&doc.id).unwrap(), doc);

    let uploaded: HashSet<_> = h.gateway.inner().uploaded_ids().into_iter().collect();
    let deleted: HashSet<_> = h.gateway.inner().deleted_ids().into_iter().collect();
    assert_eq!(uploaded.len(), 2);
    assert_eq!(uploaded, deleted);

    // Discarded assets are untouched because the request never reached deletion.
    assert!(h.gateway.inner().contains(ResourceKind::Image, &"i1".into()));
    assert!(h.gateway.inner().contains(ResourceKind::Video, &"v1".into()));
    assert_eq!(h.gateway.upload_attempts(), 3);
}

#[tokio::test]
async fn failed_rollback_keeps_the_upload_error() {
    let h = harness(FaultyGateway::new().fail_upload("b.png").fail_all_deletes());
    let doc = seeded_document(h.gateway.inner(), "d1", &["i1", "i2"], None);
    h.store.insert(doc.clone());

    let form = FormFields::new()
        .text(fields::EXISTING_IMAGES, kept_images_json(&["i2"]))
        .file(fields::NEW_IMAGES, png("a.png"))
        .file(fields::NEW_IMAGES, png("b.png"))
        .file(fields::NEW_IMAGES, png("c.png"));
    let err = h.coordinator.update(&doc.id, &form).await.unwrap_err();

    assert!(matches!(
        err,
        ReconcileError::AssetUploadFailed {
            slot: UploadSlot::Image(1),
            ..
        }
    ));
    assert_eq!(h.store.get(&doc.id).unwrap(), doc);

    // Both rollback deletes were attempted and failed; the blobs are orphaned.
    let failures = h.gateway.injected_failures();
    assert_eq!(failures.iter().filter(|f| f.starts_with("delete ")).count(), 2);
    assert!(h.gateway.inner().deleted_ids().is_empty());
    assert_eq!(h.gateway.inner().blob_count(ResourceKind::Image), 4);
}

#[tokio::test]
async fn unusable_existing_images_is_rejected_before_any_call() {
    let h = harness(FaultyGateway::new());
    let doc = seeded_document(h.gateway.inner(), "d1", &["i1", "i2"], None);
    h.store.insert(doc.clone());

    let forms = [
        FormFields::new().text(fields::EXISTING_IMAGES, ""),
        FormFields::new().text(fields::EXISTING_IMAGES, "  "),
        FormFields::new().file(fields::EXISTING_IMAGES, png("list.json")),
    ];
    for form in &forms {
        let err = h.coordinator.update(&doc.id, form).await.unwrap_err();
        assert!(err.is_validation(), "{err}");
        assert_eq!(err.http_status_hint(), 400);
    }

    assert_eq!(h.store.get(&doc.id).unwrap(), doc);
    assert!(h.gateway.inner().calls().is_empty());
    assert_eq!(h.gateway.inner().blob_count(ResourceKind::Image), 2);
}

#[tokio::test]
async fn failed_deletion_is_a_warning() {
    let h = harness(FaultyGateway::new().fail_delete("i1"));
    let doc = seeded_document(h.gateway.inner(), "d1", &["i1", "i2"], None);
    h.store.insert(doc.clone());

    let form = FormFields::new().text(fields::EXISTING_IMAGES, kept_images_json(&["i2"]));
    let outcome = h.coordinator.update(&doc.id, &form).await.unwrap();

    assert_eq!(image_ids(&outcome.document), vec!["i2"]);
    assert_eq!(image_ids(&h.store.get(&doc.id).unwrap()), vec!["i2"]);
    assert_eq!(outcome.warnings.len(), 1);
    match &outcome.warnings[0] {
        ReconcileWarning::AssetDeletionFailed { kind, reference, .. } => {
            assert_eq!(*kind, ResourceKind::Image);
            assert_eq!(reference.id.as_str(), "i1");
        }
        other => panic!("unexpected warning {other:?}"),
    }
}

#[tokio::test]
async fn keep_one_add_one_remove_video() {
    let h = harness(FaultyGateway::new());
    let doc = seeded_document(h.gateway.inner(), "d1", &["i1", "i2"], Some("v1"));
    h.store.insert(doc.clone());

    let form = FormFields::new()
        .text(fields::EXISTING_IMAGES, kept_images_json(&["i2"]))
        .file(fields::NEW_IMAGES, png("new.png"))
        .text(fields::REMOVE_VIDEO, "true");
    let outcome = h.coordinator.update(&doc.id, &form).await.unwrap();

    let uploaded = h.gateway.inner().uploaded_ids();
    assert_eq!(uploaded.len(), 1);
    assert_eq!(
        image_ids(&outcome.document),
        vec!["i2".to_string(), uploaded[0].as_str().to_string()]
    );
    assert!(outcome.document.video.is_none());

    let deletes: Vec<_> = h
        .gateway
        .inner()
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            GatewayCall::Delete { kind, id } => Some((kind, id.as_str().to_string())),
            _ => None,
        })
        .collect();
    assert_eq!(deletes.len(), 2);
    assert!(deletes.contains(&(ResourceKind::Image, "i1".to_string())));
    assert!(deletes.contains(&(ResourceKind::Video, "v1".to_string())));

    let stored = h.store.get(&doc.id).unwrap();
    assert_eq!(stored, outcome.document);
    assert_eq!(stored.version, doc.version + 1);
}

#[tokio::test]
async fn replacing_video_deletes_previous_blob() {
    let h = harness(FaultyGateway::new());
    let doc = seeded_document(h.gateway.inner(), "d1", &[], Some("v1"));
    h.store.insert(doc.clone());

    let form = FormFields::new()
        .file(fields::NEW_VIDEO, mp4("clip.mp4"))
        .text(fields::NEW_VIDEO_CAPTION, "fresh");
    let outcome = h.coordinator.update(&doc.id, &form).await.unwrap();

    let video = outcome.document.video.unwrap();
    assert_ne!(video.id.as_str(), "v1");
    assert_eq!(video.caption, "fresh");
    assert!(!h.gateway.inner().contains(ResourceKind::Video, &"v1".into()));
    assert!(h.gateway.inner().contains(ResourceKind::Video, &video.id));
}

#[tokio::test]
async fn kept_captions_and_scalars_are_merged() {
    let h = harness(FaultyGateway::new());
    let doc = seeded_document(h.gateway.inner(), "d1", &["i1"], Some("v1"));
    h.store.insert(doc.clone());

    let form = FormFields::new()
        .text(fields::EXISTING_IMAGES, r#"[{"public_id":"i1","caption":"cover"}]"#)
        .text(fields::EXISTING_VIDEO, r#"{"public_id":"v1","caption":"intro"}"#)
        .text(fields::TITLE, "Renamed")
        .text(fields::TAGS, r#"["rust","media"]"#)
        .text(fields::HEADINGS, "## Setup\n## Usage");
    let outcome = h.coordinator.update(&doc.id, &form).await.unwrap();

    let d = outcome.document;
    assert_eq!(image_captions(&d), vec!["cover"]);
    assert_eq!(d.video.unwrap().caption, "intro");
    assert_eq!(d.title, "Renamed");
    assert_eq!(d.slug, "renamed");
    assert_eq!(d.tags, vec!["rust", "media"]);
    assert_eq!(d.headings.len(), 2);
    assert_eq!(d.headings[1].slug, "usage");
    assert!(h.gateway.inner().calls().is_empty());
}

#[tokio::test]
async fn unknown_kept_ids_do_not_introduce_references() {
    let h = harness(FaultyGateway::new());
    let doc = seeded_document(h.gateway.inner(), "d1", &["i1"], None);
    h.store.insert(doc.clone());

    let form = FormFields::new().text(fields::EXISTING_IMAGES, kept_images_json(&["i1", "ghost"]));
    let outcome = h.coordinator.update(&doc.id, &form).await.unwrap();

    assert_eq!(image_ids(&outcome.document), vec!["i1"]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn final_images_contain_kept_and_exclude_deleted(
        image_count in 0usize..6,
        keep_mask in proptest::collection::vec(any::<bool>(), 6),
        new_count in 0usize..3,
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let h = harness(FaultyGateway::new());
        let current: Vec<String> = (0..image_count).map(|i| format!("i{i}")).collect();
        let current_refs: Vec<&str> = current.iter().map(String::as_str).collect();
        let doc = seeded_document(h.gateway.inner(), "d1", &current_refs, None);
        h.store.insert(doc.clone());

        let kept: Vec<&str> = current_refs
            .iter()
            .zip(&keep_mask)
            .filter(|(_, keep)| **keep)
            .map(|(id, _)| *id)
            .collect();

        let mut form = FormFields::new().text(fields::EXISTING_IMAGES, kept_images_json(&kept));
        for n in 0..new_count {
            form = form.file(fields::NEW_IMAGES, png(&format!("n{n}.png")));
        }

        let outcome = runtime.block_on(h.coordinator.update(&doc.id, &form)).unwrap();
        let final_ids: HashSet<String> = image_ids(&outcome.document).into_iter().collect();
        let deleted: HashSet<String> = ids(&h.gateway.inner().deleted_ids()).into_iter().collect();

        for id in &kept {
            prop_assert!(final_ids.contains(*id));
        }
        prop_assert!(final_ids.is_disjoint(&deleted));
        prop_assert_eq!(final_ids.len(), kept.len() + new_count);
        prop_assert_eq!(deleted.len(), image_count - kept.len());
    }
}
