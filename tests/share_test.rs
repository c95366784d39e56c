//! Integration tests for share grants and token resolution.

mod helpers;

use chrono::{Duration, Utc};

use cirrus_core::ErrorKind;
use cirrus_core::types::PageRequest;
use cirrus_entity::{SharePermission, ShareResource};
use cirrus_service::ShareRequest;

fn viewer_link(resource: ShareResource) -> ShareRequest {
    ShareRequest {
        resource,
        recipient_email: None,
        permission: SharePermission::Viewer,
        expires_at: None,
        password: None,
        download_enabled: true,
    }
}

#[tokio::test]
async fn test_create_share_returns_usable_token() {
    let app = helpers::TestApp::new().await;
    let ctx = app.create_test_user("alice@cirrus.test").await;
    let file = app.upload_text(&ctx, "notes.txt", None, "body").await;

    let share = app
        .shares
        .create_or_update(&ctx, viewer_link(ShareResource::File(file.id)))
        .await
        .expect("share should succeed");

    assert!(share.token.len() >= 10);
    assert!(share.is_active);
    assert_eq!(share.views, 0);

    let resolved = app
        .share_access
        .resolve(&share.token, None)
        .await
        .expect("resolve should succeed");
    assert_eq!(resolved.resource.name, "notes.txt");
    assert_eq!(resolved.resource.kind, "file");
}

#[tokio::test]
async fn test_editor_links_require_a_recipient() {
    let app = helpers::TestApp::new().await;
    let ctx = app.create_test_user("alice@cirrus.test").await;
    let file = app.upload_text(&ctx, "doc.txt", None, "body").await;

    let err = app
        .shares
        .create_or_update(
            &ctx,
            ShareRequest {
                permission: SharePermission::Editor,
                ..viewer_link(ShareResource::File(file.id))
            },
        )
        .await
        .expect_err("public editor link should fail");

    assert_eq!(err.kind, ErrorKind::InvalidOperation);
}

#[tokio::test]
async fn test_unknown_recipient_is_not_found() {
    let app = helpers::TestApp::new().await;
    let ctx = app.create_test_user("alice@cirrus.test").await;
    let file = app.upload_text(&ctx, "doc.txt", None, "body").await;

    let err = app
        .shares
        .create_or_update(
            &ctx,
            ShareRequest {
                recipient_email: Some("nobody@cirrus.test".to_string()),
                ..viewer_link(ShareResource::File(file.id))
            },
        )
        .await
        .expect_err("unknown recipient should fail");

    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_sharing_a_trashed_resource_fails() {
    let app = helpers::TestApp::new().await;
    let ctx = app.create_test_user("alice@cirrus.test").await;
    let file = app.upload_text(&ctx, "doc.txt", None, "body").await;

    app.trash
        .trash_file(&ctx, file.id)
        .await
        .expect("trash should succeed");

    let err = app
        .shares
        .create_or_update(&ctx, viewer_link(ShareResource::File(file.id)))
        .await
        .expect_err("trashed resource should fail");

    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_regrant_updates_in_place_and_keeps_the_token() {
    let app = helpers::TestApp::new().await;
    let ctx = app.create_test_user("alice@cirrus.test").await;
    let file = app.upload_text(&ctx, "doc.txt", None, "body").await;

    let original = app
        .shares
        .create_or_update(&ctx, viewer_link(ShareResource::File(file.id)))
        .await
        .expect("share should succeed");

    // A view lands before the grant is reconfigured.
    app.share_access
        .resolve(&original.token, None)
        .await
        .expect("resolve should succeed");

    let expires = Utc::now() + Duration::days(7);
    let updated = app
        .shares
        .create_or_update(
            &ctx,
            ShareRequest {
                expires_at: Some(expires),
                download_enabled: false,
                ..viewer_link(ShareResource::File(file.id))
            },
        )
        .await
        .expect("regrant should succeed");

    assert_eq!(updated.id, original.id);
    assert_eq!(updated.token, original.token);
    assert_eq!(updated.views, 1);
    assert!(!updated.download_enabled);
    assert_eq!(
        updated.expires_at.map(|t| t.timestamp()),
        Some(expires.timestamp())
    );
}

#[tokio::test]
async fn test_recipient_grant_upgrades_viewer_to_editor() {
    let app = helpers::TestApp::new().await;
    let alice = app.create_test_user("alice@cirrus.test").await;
    app.create_test_user("bob@cirrus.test").await;
    let file = app.upload_text(&alice, "doc.txt", None, "body").await;

    let viewer = app
        .shares
        .create_or_update(
            &alice,
            ShareRequest {
                recipient_email: Some("bob@cirrus.test".to_string()),
                ..viewer_link(ShareResource::File(file.id))
            },
        )
        .await
        .expect("viewer grant should succeed");
    assert_eq!(viewer.permission, SharePermission::Viewer);

    let editor = app
        .shares
        .create_or_update(
            &alice,
            ShareRequest {
                recipient_email: Some("bob@cirrus.test".to_string()),
                permission: SharePermission::Editor,
                ..viewer_link(ShareResource::File(file.id))
            },
        )
        .await
        .expect("editor upgrade should succeed");

    assert_eq!(editor.id, viewer.id);
    assert_eq!(editor.token, viewer.token);
    assert_eq!(editor.permission, SharePermission::Editor);
}

#[tokio::test]
async fn test_unknown_token_is_not_found() {
    let app = helpers::TestApp::new().await;

    let err = app
        .share_access
        .resolve("does-not-exist", None)
        .await
        .expect_err("unknown token should fail");

    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_expired_share_is_lazily_deactivated() {
    let app = helpers::TestApp::new().await;
    let ctx = app.create_test_user("alice@cirrus.test").await;
    let file = app.upload_text(&ctx, "doc.txt", None, "body").await;

    let share = app
        .shares
        .create_or_update(
            &ctx,
            ShareRequest {
                expires_at: Some(Utc::now() - Duration::hours(1)),
                ..viewer_link(ShareResource::File(file.id))
            },
        )
        .await
        .expect("share should succeed");

    let err = app
        .share_access
        .resolve(&share.token, None)
        .await
        .expect_err("expired token should fail");
    assert_eq!(err.kind, ErrorKind::NotFound);

    // The first touch persisted the deactivation.
    let listing = app
        .shares
        .list_for_resource(&ctx, ShareResource::File(file.id), &PageRequest::new(1, 20))
        .await
        .expect("listing should succeed");
    assert_eq!(listing.items.len(), 1);
    assert!(!listing.items[0].is_active);

    // A second resolve behaves exactly like an unknown token.
    let err = app
        .share_access
        .resolve(&share.token, None)
        .await
        .expect_err("still expired");
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_password_gate() {
    let app = helpers::TestApp::new().await;
    let ctx = app.create_test_user("alice@cirrus.test").await;
    let file = app.upload_text(&ctx, "secret.txt", None, "body").await;

    let share = app
        .shares
        .create_or_update(
            &ctx,
            ShareRequest {
                password: Some("hunter2".to_string()),
                ..viewer_link(ShareResource::File(file.id))
            },
        )
        .await
        .expect("share should succeed");

    let err = app
        .share_access
        .resolve(&share.token, None)
        .await
        .expect_err("missing password should fail");
    assert_eq!(err.kind, ErrorKind::Unauthorized);

    let err = app
        .share_access
        .resolve(&share.token, Some("wrong"))
        .await
        .expect_err("wrong password should fail");
    assert_eq!(err.kind, ErrorKind::Unauthorized);

    // Failed attempts never count as views.
    let current = app
        .share_repo
        .find_by_token(&share.token)
        .await
        .expect("query should succeed")
        .expect("share still active");
    assert_eq!(current.views, 0);

    let resolved = app
        .share_access
        .resolve(&share.token, Some("hunter2"))
        .await
        .expect("correct password should succeed");
    assert_eq!(resolved.resource.name, "secret.txt");

    let current = app
        .share_repo
        .find_by_token(&share.token)
        .await
        .expect("query should succeed")
        .expect("share still active");
    assert_eq!(current.views, 1);
}

#[tokio::test]
async fn test_resolution_counts_views() {
    let app = helpers::TestApp::new().await;
    let ctx = app.create_test_user("alice@cirrus.test").await;
    let file = app.upload_text(&ctx, "doc.txt", None, "body").await;

    let share = app
        .shares
        .create_or_update(&ctx, viewer_link(ShareResource::File(file.id)))
        .await
        .expect("share should succeed");

    for _ in 0..3 {
        app.share_access
            .resolve(&share.token, None)
            .await
            .expect("resolve should succeed");
    }

    let current = app
        .share_repo
        .find_by_token(&share.token)
        .await
        .expect("query should succeed")
        .expect("share still active");
    assert_eq!(current.views, 3);
}

#[tokio::test]
async fn test_resolution_never_exposes_internals() {
    let app = helpers::TestApp::new().await;
    let ctx = app.create_test_user("alice@cirrus.test").await;
    let file = app.upload_text(&ctx, "doc.txt", None, "body").await;

    let share = app
        .shares
        .create_or_update(
            &ctx,
            ShareRequest {
                password: Some("hunter2".to_string()),
                ..viewer_link(ShareResource::File(file.id))
            },
        )
        .await
        .expect("share should succeed");

    let resolved = app
        .share_access
        .resolve(&share.token, Some("hunter2"))
        .await
        .expect("resolve should succeed");

    let json = serde_json::to_value(&resolved).expect("serialization should succeed");
    let rendered = json.to_string();
    assert!(json["share"].get("password_hash").is_none());
    assert!(json["resource"].get("storage_key").is_none());
    assert!(!rendered.contains(&file.storage_key));
}

#[tokio::test]
async fn test_revoke_deactivates_every_grant() {
    let app = helpers::TestApp::new().await;
    let ctx = app.create_test_user("alice@cirrus.test").await;
    app.create_test_user("bob@cirrus.test").await;
    let file = app.upload_text(&ctx, "doc.txt", None, "body").await;

    let public = app
        .shares
        .create_or_update(&ctx, viewer_link(ShareResource::File(file.id)))
        .await
        .expect("public link should succeed");
    let direct = app
        .shares
        .create_or_update(
            &ctx,
            ShareRequest {
                recipient_email: Some("bob@cirrus.test".to_string()),
                permission: SharePermission::Editor,
                ..viewer_link(ShareResource::File(file.id))
            },
        )
        .await
        .expect("direct grant should succeed");

    let revoked = app
        .shares
        .revoke(&ctx, ShareResource::File(file.id))
        .await
        .expect("revoke should succeed");
    assert_eq!(revoked, 2);

    for token in [&public.token, &direct.token] {
        let err = app
            .share_access
            .resolve(token, None)
            .await
            .expect_err("revoked token should fail");
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    // Rows survive revocation for the listing history.
    let listing = app
        .shares
        .list_for_resource(&ctx, ShareResource::File(file.id), &PageRequest::new(1, 20))
        .await
        .expect("listing should succeed");
    assert_eq!(listing.items.len(), 2);
    assert!(listing.items.iter().all(|s| !s.is_active));

    let err = app
        .shares
        .revoke(&ctx, ShareResource::File(file.id))
        .await
        .expect_err("nothing left to revoke");
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_shared_with_me_lists_received_grants() {
    let app = helpers::TestApp::new().await;
    let alice = app.create_test_user("alice@cirrus.test").await;
    let bob = app.create_test_user("bob@cirrus.test").await;

    let folder = app.create_folder(&alice, "Team", None).await;
    app.shares
        .create_or_update(
            &alice,
            ShareRequest {
                recipient_email: Some("bob@cirrus.test".to_string()),
                ..viewer_link(ShareResource::Folder(folder.id))
            },
        )
        .await
        .expect("grant should succeed");

    let received = app
        .shares
        .shared_with_me(&bob, &PageRequest::new(1, 20))
        .await
        .expect("listing should succeed");

    assert_eq!(received.total_items, 1);
    let entry = &received.items[0];
    assert_eq!(entry.share.recipient_id, Some(bob.user_id));
    let resource = entry.resource.as_ref().expect("snapshot present");
    assert_eq!(resource.name, "Team");
    assert_eq!(resource.kind, "folder");

    // Alice granted it, so her own received view is empty.
    let own = app
        .shares
        .shared_with_me(&alice, &PageRequest::new(1, 20))
        .await
        .expect("listing should succeed");
    assert_eq!(own.total_items, 0);
}

#[tokio::test]
async fn test_separate_recipients_get_separate_grants() {
    let app = helpers::TestApp::new().await;
    let ctx = app.create_test_user("alice@cirrus.test").await;
    app.create_test_user("bob@cirrus.test").await;
    let file = app.upload_text(&ctx, "doc.txt", None, "body").await;

    let public = app
        .shares
        .create_or_update(&ctx, viewer_link(ShareResource::File(file.id)))
        .await
        .expect("public link should succeed");
    let direct = app
        .shares
        .create_or_update(
            &ctx,
            ShareRequest {
                recipient_email: Some("bob@cirrus.test".to_string()),
                ..viewer_link(ShareResource::File(file.id))
            },
        )
        .await
        .expect("direct grant should succeed");

    // Different (resource, creator, recipient) triples, different rows.
    assert_ne!(public.id, direct.id);
    assert_ne!(public.token, direct.token);
}
