//! Integration tests for the trash lifecycle: soft delete, restore,
//! purge, and emptying the trash.

mod helpers;

use cirrus_core::ErrorKind;
use cirrus_core::types::{NodeListOptions, PageRequest};
use cirrus_entity::{SharePermission, ShareResource};
use cirrus_service::ShareRequest;

#[tokio::test]
async fn test_trash_does_not_cascade() {
    let app = helpers::TestApp::new().await;
    let ctx = app.create_test_user("alice@cirrus.test").await;

    let parent = app.create_folder(&ctx, "Parent", None).await;
    let child = app.create_folder(&ctx, "Child", Some(parent.id)).await;
    let file = app
        .upload_text(&ctx, "inside.txt", Some(parent.id), "body")
        .await;

    app.trash
        .trash_folder(&ctx, parent.id)
        .await
        .expect("trash should succeed");

    // Children keep their own state; only the parent row is marked.
    let child = app.folders.get(&ctx, child.id).await.expect("child exists");
    assert!(!child.is_trashed());
    let file = app.files.get(&ctx, file.id).await.expect("file exists");
    assert!(!file.is_trashed());

    // The flat trash view shows the parent alone.
    let trashed = app
        .folders
        .list(
            &ctx,
            None,
            &NodeListOptions::trashed_only(),
            &PageRequest::new(1, 20),
        )
        .await
        .expect("trash listing should succeed");
    assert_eq!(trashed.total_items, 1);
    assert_eq!(trashed.items[0].id, parent.id);
}

#[tokio::test]
async fn test_trashed_folder_children_stay_listable() {
    let app = helpers::TestApp::new().await;
    let ctx = app.create_test_user("alice@cirrus.test").await;

    let parent = app.create_folder(&ctx, "Parent", None).await;
    let child = app.create_folder(&ctx, "Child", Some(parent.id)).await;
    app.trash
        .trash_folder(&ctx, parent.id)
        .await
        .expect("trash should succeed");

    let listing = app
        .folders
        .list(
            &ctx,
            Some(parent.id),
            &NodeListOptions::default(),
            &PageRequest::new(1, 20),
        )
        .await
        .expect("children of a trashed folder are still reachable");

    assert_eq!(listing.total_items, 1);
    assert_eq!(listing.items[0].id, child.id);
}

#[tokio::test]
async fn test_trash_twice_is_not_found() {
    let app = helpers::TestApp::new().await;
    let ctx = app.create_test_user("alice@cirrus.test").await;

    let folder = app.create_folder(&ctx, "Once", None).await;
    app.trash
        .trash_folder(&ctx, folder.id)
        .await
        .expect("first trash should succeed");

    let err = app
        .trash
        .trash_folder(&ctx, folder.id)
        .await
        .expect_err("second trash should fail");
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_restore_requires_a_trashed_node() {
    let app = helpers::TestApp::new().await;
    let ctx = app.create_test_user("alice@cirrus.test").await;

    let folder = app.create_folder(&ctx, "Live", None).await;
    let err = app
        .trash
        .restore_folder(&ctx, folder.id)
        .await
        .expect_err("restoring a live folder should fail");
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_trash_and_restore_roundtrip() {
    let app = helpers::TestApp::new().await;
    let ctx = app.create_test_user("alice@cirrus.test").await;

    let file = app.upload_text(&ctx, "draft.txt", None, "v1").await;

    let trashed = app
        .trash
        .trash_file(&ctx, file.id)
        .await
        .expect("trash should succeed");
    assert!(trashed.is_trashed());

    let restored = app
        .trash
        .restore_file(&ctx, file.id)
        .await
        .expect("restore should succeed");
    assert!(!restored.is_trashed());

    let live = app
        .files
        .list(
            &ctx,
            None,
            &NodeListOptions::default(),
            &PageRequest::new(1, 20),
        )
        .await
        .expect("listing should succeed");
    assert_eq!(live.total_items, 1);
}

#[tokio::test]
async fn test_trashed_file_rejects_metadata_changes() {
    let app = helpers::TestApp::new().await;
    let ctx = app.create_test_user("alice@cirrus.test").await;

    let file = app.upload_text(&ctx, "frozen.txt", None, "body").await;
    app.trash
        .trash_file(&ctx, file.id)
        .await
        .expect("trash should succeed");

    let err = app
        .files
        .rename(&ctx, file.id, "thawed.txt")
        .await
        .expect_err("rename should fail");
    assert_eq!(err.kind, ErrorKind::NotFound);

    let err = app
        .files
        .toggle_star(&ctx, file.id)
        .await
        .expect_err("star should fail");
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_purge_file_removes_row_and_bytes() {
    let app = helpers::TestApp::new().await;
    let ctx = app.create_test_user("alice@cirrus.test").await;

    let file = app.upload_text(&ctx, "doomed.txt", None, "gone soon").await;
    let key = file.storage_key.clone();
    assert!(app.storage.get_bytes(&key).await.is_ok());

    app.trash
        .trash_file(&ctx, file.id)
        .await
        .expect("trash should succeed");
    app.trash
        .purge_file(&ctx, file.id)
        .await
        .expect("purge should succeed");

    let row = app
        .file_repo
        .find_by_id_unscoped(file.id)
        .await
        .expect("query should succeed");
    assert!(row.is_none());

    let err = app.storage.get_bytes(&key).await.expect_err("bytes gone");
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_purge_folder_cascades_and_revokes_grants() {
    let app = helpers::TestApp::new().await;
    let ctx = app.create_test_user("alice@cirrus.test").await;

    let a = app.create_folder(&ctx, "a", None).await;
    let b = app.create_folder(&ctx, "b", Some(a.id)).await;
    let f1 = app.upload_text(&ctx, "f1.txt", Some(a.id), "one").await;
    let f2 = app.upload_text(&ctx, "f2.txt", Some(b.id), "two").await;

    let share = app
        .shares
        .create_or_update(
            &ctx,
            ShareRequest {
                resource: ShareResource::File(f2.id),
                recipient_email: None,
                permission: SharePermission::Viewer,
                expires_at: None,
                password: None,
                download_enabled: true,
            },
        )
        .await
        .expect("share should succeed");

    app.trash
        .trash_folder(&ctx, a.id)
        .await
        .expect("trash should succeed");
    app.trash
        .purge_folder(&ctx, a.id)
        .await
        .expect("purge should succeed");

    for folder_id in [a.id, b.id] {
        let row = app
            .folder_repo
            .find_by_id_unscoped(folder_id)
            .await
            .expect("query should succeed");
        assert!(row.is_none(), "folder {folder_id} should be gone");
    }
    for file in [&f1, &f2] {
        let row = app
            .file_repo
            .find_by_id_unscoped(file.id)
            .await
            .expect("query should succeed");
        assert!(row.is_none(), "file {} should be gone", file.id);

        let err = app
            .storage
            .get_bytes(&file.storage_key)
            .await
            .expect_err("bytes gone");
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    // The grant row survives but can no longer be resolved.
    let resolved = app
        .share_repo
        .find_by_token(&share.token)
        .await
        .expect("query should succeed");
    assert!(resolved.is_none());
}

#[tokio::test]
async fn test_purge_is_scoped_to_the_owner() {
    let app = helpers::TestApp::new().await;
    let alice = app.create_test_user("alice@cirrus.test").await;
    let bob = app.create_test_user("bob@cirrus.test").await;

    let file = app.upload_text(&alice, "mine.txt", None, "body").await;

    let err = app
        .trash
        .purge_file(&bob, file.id)
        .await
        .expect_err("purge should fail");
    assert_eq!(err.kind, ErrorKind::NotFound);

    assert!(app.files.get(&alice, file.id).await.is_ok());
}

#[tokio::test]
async fn test_empty_trash_reports_item_count() {
    let app = helpers::TestApp::new().await;
    let ctx = app.create_test_user("alice@cirrus.test").await;

    let keep = app.upload_text(&ctx, "keep.txt", None, "stays").await;
    let f1 = app.upload_text(&ctx, "one.txt", None, "1").await;
    let f2 = app.upload_text(&ctx, "two.txt", None, "2").await;
    let folder = app.create_folder(&ctx, "Old", None).await;
    // A live child purged as part of the cascade, not counted on its own.
    app.create_folder(&ctx, "Nested", Some(folder.id)).await;

    app.trash.trash_file(&ctx, f1.id).await.expect("trash f1");
    app.trash.trash_file(&ctx, f2.id).await.expect("trash f2");
    app.trash
        .trash_folder(&ctx, folder.id)
        .await
        .expect("trash folder");

    let purged = app.trash.empty_trash(&ctx).await.expect("empty trash");
    assert_eq!(purged, 3);

    // Only the live file is left.
    let live = app
        .files
        .list(
            &ctx,
            None,
            &NodeListOptions::default(),
            &PageRequest::new(1, 20),
        )
        .await
        .expect("listing should succeed");
    assert_eq!(live.total_items, 1);
    assert_eq!(live.items[0].id, keep.id);

    // An empty trash empties to zero, not an error.
    let purged = app.trash.empty_trash(&ctx).await.expect("empty trash");
    assert_eq!(purged, 0);
}

#[tokio::test]
async fn test_empty_trash_handles_nested_trashed_folders() {
    let app = helpers::TestApp::new().await;
    let ctx = app.create_test_user("alice@cirrus.test").await;

    let outer = app.create_folder(&ctx, "Outer", None).await;
    let inner = app.create_folder(&ctx, "Inner", Some(outer.id)).await;

    // Both land in the trash; purging the outer one already removes the
    // inner one before its own turn comes up.
    app.trash
        .trash_folder(&ctx, inner.id)
        .await
        .expect("trash inner");
    app.trash
        .trash_folder(&ctx, outer.id)
        .await
        .expect("trash outer");

    let purged = app.trash.empty_trash(&ctx).await.expect("empty trash");
    assert_eq!(purged, 2);

    for id in [outer.id, inner.id] {
        let row = app
            .folder_repo
            .find_by_id_unscoped(id)
            .await
            .expect("query should succeed");
        assert!(row.is_none());
    }
}
