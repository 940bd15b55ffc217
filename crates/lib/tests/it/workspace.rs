//! End-to-end flows through [`Workspace`] against the in-memory remote.

use scholar_sync::{
    AugmentationKind, FileKind, ProjectType,
    constants::{MAX_UPLOAD_BYTES, TARGET_IMAGE_OVERWRITE_WARNING},
    remote::Operation,
    session::FileSessionLinkage,
    transfer::{FieldSelection, FieldSources},
};

use crate::helpers::{ALICE_TOKEN, TestEnv};

#[tokio::test]
async fn test_login_mirrors_projects_made_on_website() {
    let env = TestEnv::new();
    env.remote.add_project(ALICE_TOKEN, "Paper", ProjectType::Paper);

    let report = env
        .workspace
        .login("alice", Some(ALICE_TOKEN))
        .await
        .unwrap();

    assert!(report.new_user);
    assert_eq!(report.projects.added, vec!["Paper".to_string()]);
    assert_eq!(env.workspace.users().await.unwrap(), vec!["alice".to_string()]);
    let projects = env.workspace.projects("alice").await.unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].project_type, ProjectType::Paper);
}

#[tokio::test]
async fn test_login_rejects_unknown_token_without_storing_user() {
    let env = TestEnv::new();

    let err = env
        .workspace
        .login("mallory", Some("not-a-token"))
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    assert!(env.workspace.users().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_login_without_token_needs_known_user() {
    let env = TestEnv::new();

    let err = env.workspace.login("alice", None).await.unwrap_err();
    assert!(err.is_validation_error());

    env.workspace
        .login("alice", Some(ALICE_TOKEN))
        .await
        .unwrap();
    let again = env.workspace.login("alice", None).await.unwrap();
    assert!(!again.new_user);
}

#[tokio::test]
async fn test_invalid_titles_never_reach_remote() {
    let env = TestEnv::with_alice().await;
    env.remote.reset_calls();

    let err = env
        .workspace
        .select_or_create_project("alice", "Paper/1", ProjectType::Paper, "")
        .await
        .unwrap_err();

    assert!(err.is_validation_error());
    assert_eq!(env.remote.total_calls(), 0);
    assert!(env.workspace.projects("alice").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_select_or_create_project_creates_once() {
    let env = TestEnv::with_alice().await;

    let first = env
        .workspace
        .select_or_create_project("alice", "Paper", ProjectType::Paper, "https://doi.org/x")
        .await
        .unwrap();
    assert!(first.created);
    assert_eq!(first.record.url.as_deref(), Some("https://doi.org/x"));

    let second = env
        .workspace
        .select_or_create_project("alice", "Paper", ProjectType::Paper, "")
        .await
        .unwrap();
    assert!(!second.created);
    assert_eq!(second.record.remote_id, first.record.remote_id);
    assert!(second.synced.is_some());

    assert_eq!(env.remote.calls(Operation::CreateProject), 1);
    assert_eq!(env.remote.project_count(ALICE_TOKEN), 1);
    let project_dir = env
        .workspace
        .store()
        .layout()
        .project_dir("alice", &first.record.remote_id);
    assert!(project_dir.join("qr").join("pub").is_dir());
    assert!(project_dir.join("qr").join("admin").is_dir());
}

#[tokio::test]
async fn test_select_picks_up_project_made_after_login() {
    let env = TestEnv::with_alice().await;
    let id = env.remote.add_project(ALICE_TOKEN, "Poster", ProjectType::Poster);

    let selection = env
        .workspace
        .select_or_create_project("alice", "Poster", ProjectType::Poster, "")
        .await
        .unwrap();

    assert!(!selection.created);
    assert_eq!(selection.record.remote_id, id);
    assert_eq!(env.remote.calls(Operation::CreateProject), 0);
}

#[tokio::test]
async fn test_selecting_project_mirrors_new_augmentations() {
    let env = TestEnv::with_alice().await;
    let pid = env.remote.add_project(ALICE_TOKEN, "Paper", ProjectType::Paper);
    env.workspace
        .select_or_create_project("alice", "Paper", ProjectType::Paper, "")
        .await
        .unwrap();
    env.remote
        .add_augmentation(ALICE_TOKEN, &pid, "Protein")
        .unwrap();

    let selection = env
        .workspace
        .select_or_create_project("alice", "Paper", ProjectType::Paper, "")
        .await
        .unwrap();

    let synced = selection.synced.unwrap();
    assert_eq!(synced.added, vec!["Protein".to_string()]);
    let augmentations = env.workspace.augmentations("alice", "Paper").await.unwrap();
    assert_eq!(augmentations.len(), 1);
    assert!(!augmentations[0].has_session);
}

#[tokio::test]
async fn test_unreachable_remote_still_selects_local_project() {
    let env = TestEnv::with_alice().await;
    env.workspace
        .select_or_create_project("alice", "Paper", ProjectType::Paper, "")
        .await
        .unwrap();
    env.remote.fail(Operation::ListAugmentations);

    let selection = env
        .workspace
        .select_or_create_project("alice", "Paper", ProjectType::Paper, "")
        .await
        .unwrap();

    assert!(!selection.created);
    assert!(selection.synced.is_none());
}

#[tokio::test]
async fn test_new_augmentation_uploads_initial_files() {
    let env = TestEnv::with_alice().await;
    let project = env
        .workspace
        .select_or_create_project("alice", "Paper", ProjectType::Paper, "")
        .await
        .unwrap()
        .record;
    let model = env.source("protein.glb", b"glTF-model").await;
    let sources = FieldSources {
        model: Some(model),
        target_image: None,
    };

    let result = env
        .workspace
        .select_or_create_augmentation("alice", "Paper", "Protein", AugmentationKind::Model, &sources)
        .await
        .unwrap();

    assert!(result.selection.created);
    let upload = result.initial_upload.unwrap();
    assert!(upload.is_success());
    assert_eq!(upload.outcomes.len(), 1);
    let record = &result.selection.record;
    assert!(record.has_model_file);
    assert!(!record.has_target_image);
    assert_eq!(
        env.remote
            .file(&project.remote_id, &record.remote_id, FileKind::Model)
            .as_deref(),
        Some(&b"glTF-model"[..])
    );

    let again = env
        .workspace
        .select_or_create_augmentation(
            "alice",
            "Paper",
            "Protein",
            AugmentationKind::Model,
            &FieldSources::default(),
        )
        .await
        .unwrap();
    assert!(!again.selection.created);
    assert!(again.initial_upload.is_none());
    assert_eq!(env.remote.calls(Operation::CreateAugmentation), 1);
}

#[tokio::test]
async fn test_oversized_initial_file_creates_nothing() {
    let env = TestEnv::with_alice().await;
    let project = env
        .workspace
        .select_or_create_project("alice", "Paper", ProjectType::Paper, "")
        .await
        .unwrap()
        .record;
    let big = env.sized_source("big.png", MAX_UPLOAD_BYTES);
    env.remote.reset_calls();

    let err = env
        .workspace
        .select_or_create_augmentation(
            "alice",
            "Paper",
            "Protein",
            AugmentationKind::Model,
            &FieldSources {
                model: None,
                target_image: Some(big),
            },
        )
        .await
        .unwrap_err();

    assert!(err.is_size_error());
    assert_eq!(env.remote.mutating_calls(), 0);
    assert_eq!(env.remote.augmentation_count(ALICE_TOKEN, &project.remote_id), 0);
    assert!(env.workspace.augmentations("alice", "Paper").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_reports_each_field_independently() {
    let env = TestEnv::with_alice().await;
    env.workspace
        .select_or_create_project("alice", "Paper", ProjectType::Paper, "")
        .await
        .unwrap();
    env.workspace
        .select_or_create_augmentation(
            "alice",
            "Paper",
            "Protein",
            AugmentationKind::Model,
            &FieldSources::default(),
        )
        .await
        .unwrap();
    let sources = FieldSources {
        model: Some(env.source("m.glb", b"model").await),
        target_image: Some(env.source("t.png", b"image").await),
    };
    env.remote
        .fail_scoped(Operation::ReplaceFile, FileKind::TargetImage.as_str());

    let report = env
        .workspace
        .upload("alice", "Paper", "Protein", FieldSelection::all(), &sources)
        .await
        .unwrap();

    assert!(!report.is_success());
    assert!(report.outcome(FileKind::Model).unwrap().is_success());
    let failed = report.outcome(FileKind::TargetImage).unwrap();
    assert!(failed.error().unwrap().is_non_local());
    assert_eq!(report.warnings().count(), 0);

    let record = &env.workspace.augmentations("alice", "Paper").await.unwrap()[0];
    assert!(record.has_model_file);
    assert!(!record.has_target_image);
}

#[tokio::test]
async fn test_target_image_upload_carries_overwrite_warning() {
    let env = TestEnv::with_alice().await;
    env.workspace
        .select_or_create_project("alice", "Paper", ProjectType::Paper, "")
        .await
        .unwrap();
    env.workspace
        .select_or_create_augmentation(
            "alice",
            "Paper",
            "Protein",
            AugmentationKind::Model,
            &FieldSources::default(),
        )
        .await
        .unwrap();
    let sources = FieldSources {
        model: None,
        target_image: Some(env.source("t.png", b"image").await),
    };

    let report = env
        .workspace
        .upload(
            "alice",
            "Paper",
            "Protein",
            FieldSelection {
                model: false,
                target_image: true,
            },
            &sources,
        )
        .await
        .unwrap();

    assert!(report.is_success());
    let warnings: Vec<_> = report.warnings().collect();
    assert_eq!(
        warnings,
        vec![(FileKind::TargetImage, TARGET_IMAGE_OVERWRITE_WARNING)]
    );
}

#[tokio::test]
async fn test_download_then_store_all() {
    let env = TestEnv::with_alice().await;
    let pid = env.remote.add_project(ALICE_TOKEN, "Paper", ProjectType::Paper);
    let aid = env
        .remote
        .add_augmentation(ALICE_TOKEN, &pid, "Protein")
        .unwrap();
    env.remote.put_file(&pid, &aid, FileKind::TargetImage, b"target".to_vec());
    env.remote.put_file(&pid, &aid, FileKind::Model, b"model".to_vec());
    env.workspace
        .select_or_create_project("alice", "Paper", ProjectType::Paper, "")
        .await
        .unwrap();

    let report = env
        .workspace
        .download("alice", "Paper", "Protein", FieldSelection::download_defaults())
        .await
        .unwrap();
    assert!(report.is_success());
    assert_eq!(report.outcomes.len(), 1);
    let image = report.outcome(FileKind::TargetImage).unwrap().path().unwrap();
    assert_eq!(tokio::fs::read(image).await.unwrap(), b"target");
    assert!(image.starts_with(env.root()));

    let out = env.dir.path().join("export");
    let stored = env
        .workspace
        .store_all("alice", "Paper", "Protein", &out)
        .await
        .unwrap();
    assert!(stored.is_success());
    assert_eq!(tokio::fs::read(out.join("Protein.glb")).await.unwrap(), b"model");
    assert_eq!(tokio::fs::read(out.join("Protein.png")).await.unwrap(), b"target");
    assert!(out.join("Paper_qr.png").is_file());
}

#[tokio::test]
async fn test_download_qr_fetches_both_codes() {
    let env = TestEnv::with_alice().await;
    env.workspace
        .select_or_create_project("alice", "Paper", ProjectType::Paper, "")
        .await
        .unwrap();

    let report = env.workspace.download_qr("alice", "Paper").await.unwrap();

    assert!(report.is_success());
    let public = report.outcome(FileKind::QrPublic).unwrap().path().unwrap();
    let private = report.outcome(FileKind::QrPrivate).unwrap().path().unwrap();
    assert!(public.starts_with(env.root()));
    assert_ne!(public.parent(), private.parent());
}

#[tokio::test]
async fn test_session_save_and_open_round_trip() {
    let env = TestEnv::with_alice().await;
    env.workspace
        .select_or_create_project("alice", "Paper", ProjectType::Paper, "")
        .await
        .unwrap();
    env.workspace
        .select_or_create_augmentation(
            "alice",
            "Paper",
            "Protein",
            AugmentationKind::Model,
            &FieldSources::default(),
        )
        .await
        .unwrap();
    let editor_file = env.source("editor.cxs", b"<session/>").await;
    let linkage = FileSessionLinkage::new(&editor_file);
    env.remote.reset_calls();

    let saved = env
        .workspace
        .save_session("alice", "Paper", "Protein", &linkage, None)
        .await
        .unwrap();
    assert_eq!(saved.file_name().unwrap(), "Protein-session.cxs");

    tokio::fs::write(&editor_file, b"edited").await.unwrap();
    let opened = env
        .workspace
        .open_session("alice", "Paper", "Protein", &linkage)
        .await
        .unwrap();
    assert_eq!(opened, Some(saved));
    assert_eq!(tokio::fs::read(&editor_file).await.unwrap(), b"<session/>");

    let record = &env.workspace.augmentations("alice", "Paper").await.unwrap()[0];
    assert!(record.has_session);
    assert_eq!(env.remote.mutating_calls(), 0);
}
