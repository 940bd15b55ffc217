//! User removal and cleanup of entries deleted on the website.

use scholar_sync::{AugmentationKind, ProjectType, remote::Operation, transfer::FieldSources};

use crate::helpers::{ALICE_TOKEN, BOB_TOKEN, TestEnv};

#[tokio::test]
async fn test_clean_removes_projects_deleted_remotely() {
    let env = TestEnv::with_alice().await;
    let keep = env
        .workspace
        .select_or_create_project("alice", "Keep", ProjectType::Paper, "")
        .await
        .unwrap()
        .record;
    let gone = env
        .workspace
        .select_or_create_project("alice", "Gone", ProjectType::Book, "")
        .await
        .unwrap()
        .record;
    env.remote.delete_project(ALICE_TOKEN, &gone.remote_id);

    let report = env.workspace.clean_local(Some("alice")).await.unwrap();

    assert_eq!(report.removed_projects.len(), 1);
    assert_eq!(report.removed_projects[0].remote_id, gone.remote_id);
    let layout = env.workspace.store().layout();
    assert!(!layout.project_dir("alice", &gone.remote_id).exists());
    assert!(layout.project_dir("alice", &keep.remote_id).exists());
    let titles: Vec<_> = env
        .workspace
        .projects("alice")
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.title)
        .collect();
    assert_eq!(titles, vec!["Keep".to_string()]);
}

#[tokio::test]
async fn test_clean_removes_augmentations_deleted_remotely() {
    let env = TestEnv::with_alice().await;
    let project = env
        .workspace
        .select_or_create_project("alice", "Paper", ProjectType::Paper, "")
        .await
        .unwrap()
        .record;
    for title in ["Protein", "Cell"] {
        env.workspace
            .select_or_create_augmentation(
                "alice",
                "Paper",
                title,
                AugmentationKind::Model,
                &FieldSources::default(),
            )
            .await
            .unwrap();
    }
    let cell = env
        .workspace
        .augmentations("alice", "Paper")
        .await
        .unwrap()
        .into_iter()
        .find(|a| a.title == "Cell")
        .unwrap();
    env.remote
        .delete_augmentation(ALICE_TOKEN, &project.remote_id, &cell.remote_id);
    env.remote.reset_calls();

    let report = env.workspace.clean_local(None).await.unwrap();

    assert!(report.removed_projects.is_empty());
    assert_eq!(report.removed_augmentations.len(), 1);
    assert_eq!(report.removed_augmentations[0].title.as_deref(), Some("Cell"));
    assert_eq!(env.remote.mutating_calls(), 0);
    let remaining = env.workspace.augmentations("alice", "Paper").await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].title, "Protein");
}

#[tokio::test]
async fn test_unreadable_user_does_not_block_other_users() {
    let env = TestEnv::with_alice().await;
    env.workspace.login("bob", Some(BOB_TOKEN)).await.unwrap();
    let gone = env
        .workspace
        .select_or_create_project("alice", "Gone", ProjectType::Other, "")
        .await
        .unwrap()
        .record;
    env.remote.delete_project(ALICE_TOKEN, &gone.remote_id);
    let bob_manifest = env.workspace.store().layout().projects_manifest("bob");
    tokio::fs::write(&bob_manifest, b"{ not json").await.unwrap();

    let report = env.workspace.clean_local(None).await.unwrap();

    assert_eq!(report.removed_projects.len(), 1);
    assert_eq!(report.removed_projects[0].scope, "alice");
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].scope, "bob");
    assert_eq!(
        tokio::fs::read(&bob_manifest).await.unwrap(),
        b"{ not json"
    );
}

#[tokio::test]
async fn test_failed_listing_removes_nothing() {
    let env = TestEnv::with_alice().await;
    env.workspace
        .select_or_create_project("alice", "Paper", ProjectType::Paper, "")
        .await
        .unwrap();
    env.remote.fail(Operation::ListProjects);

    let report = env.workspace.clean_local(Some("alice")).await.unwrap();

    assert_eq!(report.removed_count(), 0);
    assert_eq!(report.skipped.len(), 1);
    env.remote.clear_failures();
    assert_eq!(env.workspace.projects("alice").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_removed_user_logs_back_in_as_new_user() {
    let env = TestEnv::with_alice().await;
    let project = env
        .workspace
        .select_or_create_project("alice", "Paper", ProjectType::Paper, "")
        .await
        .unwrap()
        .record;
    let user_dir = env.workspace.store().layout().user_dir("alice");
    env.remote.reset_calls();

    env.workspace.remove_user("alice").await.unwrap();

    assert!(!user_dir.exists());
    assert!(env.workspace.users().await.unwrap().is_empty());
    assert_eq!(env.remote.total_calls(), 0);
    assert_eq!(env.remote.project_count(ALICE_TOKEN), 1);
    let err = env.workspace.projects("alice").await.unwrap_err();
    assert!(err.is_not_found());

    let report = env
        .workspace
        .login("alice", Some(ALICE_TOKEN))
        .await
        .unwrap();
    assert!(report.new_user);
    assert_eq!(report.projects.added, vec!["Paper".to_string()]);
    let projects = env.workspace.projects("alice").await.unwrap();
    assert_eq!(projects[0].remote_id, project.remote_id);
}
