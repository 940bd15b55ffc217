use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use scholar_sync::{Workspace, remote::InMemoryRemote};

pub const ALICE_TOKEN: &str = "alice-token";
pub const BOB_TOKEN: &str = "bob-token";

/// A mirror in a temporary directory wired to an in-memory Schol-AR.
pub struct TestEnv {
    pub dir: tempfile::TempDir,
    pub remote: Arc<InMemoryRemote>,
    pub workspace: Workspace,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let remote = Arc::new(InMemoryRemote::new());
        remote.add_account(ALICE_TOKEN);
        remote.add_account(BOB_TOKEN);
        let workspace = Workspace::new(dir.path().join("Schol-AR"), remote.clone());
        Self {
            dir,
            remote,
            workspace,
        }
    }

    /// Environment with `alice` already logged in.
    pub async fn with_alice() -> Self {
        let env = Self::new();
        env.workspace
            .login("alice", Some(ALICE_TOKEN))
            .await
            .expect("Failed to log in alice");
        env
    }

    pub fn root(&self) -> &Path {
        self.workspace.store().layout().root()
    }

    /// Write a source file outside the mirror.
    pub async fn source(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.dir.path().join("sources").join(name);
        tokio::fs::create_dir_all(path.parent().unwrap())
            .await
            .unwrap();
        tokio::fs::write(&path, bytes).await.unwrap();
        path
    }

    /// Sparse file of the given size outside the mirror.
    pub fn sized_source(&self, name: &str, len: u64) -> PathBuf {
        let dir = self.dir.path().join("sources");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::File::create(&path).unwrap().set_len(len).unwrap();
        path
    }
}
