// ABOUTME: Works out a container's project and user from live data or the store.
// ABOUTME: Live reads are written back; failures degrade to the "-" sentinel.

use crate::inspector::{ContainerHandle, Inspector};
use crate::runtime::{ContainerError, ContainerState, FullRuntime};
use crate::store::{MetadataStore, StoreError, UNKNOWN};
use parking_lot::Mutex;
use serde::Serialize;
use std::path::{Path, PathBuf};

const PROJECT_VAR: &str = "PROJECT_ID=";

/// One row of the container list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerView {
    pub status: String,
    pub name: String,
    pub project: String,
    pub version: String,
    pub user: String,
    pub deployment: String,
    pub machine_info: String,
    pub address: String,
    #[serde(skip)]
    pub state: ContainerState,
}

impl ContainerView {
    pub fn is_running(&self) -> bool {
        self.state == ContainerState::Running
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("failed to list containers: {0}")]
    List(#[from] ContainerError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Path of the credentials file the guest writes for a container.
pub fn credentials_path(local_drive: &Path, name: &str) -> PathBuf {
    local_drive
        .join("containers")
        .join(name)
        .join(".config")
        .join("credentials")
}

/// Value of the first `PROJECT_ID=` line in `printenv` output.
pub fn parse_project(env_output: &str) -> Option<String> {
    env_output
        .split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .find_map(|line| line.strip_prefix(PROJECT_VAR))
        .map(|value| value.replace(['\r', '\n'], ""))
}

/// Account in a credentials document, at `data[0].key.account`.
pub fn parse_credentials_account(content: &str) -> Option<String> {
    let doc: serde_json::Value = serde_json::from_str(content).ok()?;
    doc.get("data")?
        .get(0)?
        .get("key")?
        .get("account")?
        .as_str()
        .map(str::to_string)
}

/// Reconciles live container data with the metadata store.
pub struct Reconciler<'a, R: ?Sized> {
    runtime: &'a R,
    store: &'a Mutex<MetadataStore>,
    local_drive: &'a Path,
}

impl<'a, R: FullRuntime + ?Sized> Reconciler<'a, R> {
    pub fn new(runtime: &'a R, store: &'a Mutex<MetadataStore>, local_drive: &'a Path) -> Self {
        Self {
            runtime,
            store,
            local_drive,
        }
    }

    /// Project id of a container.
    ///
    /// Read live from a running container's environment when possible, else
    /// from the store. Only a failure to persist a live read is an error.
    pub async fn project(&self, handle: &ContainerHandle) -> Result<String, StoreError> {
        if let Some(project) = self.live_project(handle).await {
            self.store.lock().set_project(&handle.name, &project)?;
            return Ok(project);
        }

        Ok(self
            .store
            .lock()
            .get(&handle.name)
            .and_then(|r| r.project_id.clone())
            .unwrap_or_else(|| UNKNOWN.to_string()))
    }

    async fn live_project(&self, handle: &ContainerHandle) -> Option<String> {
        let inspector = Inspector::new(self.runtime);
        match inspector.state(handle).await {
            Ok(ContainerState::Running) => {}
            Ok(_) => return None,
            Err(e) => {
                tracing::debug!("state of {} unavailable: {}", handle.name, e);
                return None;
            }
        }

        match inspector.exec_inside(handle, &["bash", "-c", "printenv"]).await {
            Ok(output) => {
                let project = parse_project(&output);
                if project.is_none() {
                    tracing::debug!("{} has no PROJECT_ID in its environment", handle.name);
                }
                project
            }
            Err(e) => {
                tracing::debug!("printenv in {} failed: {}", handle.name, e);
                None
            }
        }
    }

    /// User signed in inside a container.
    ///
    /// Read from the guest's credentials file when present, else from the store.
    pub async fn user(&self, handle: &ContainerHandle) -> Result<String, StoreError> {
        let path = credentials_path(self.local_drive, &handle.name);
        let live = match tokio::fs::read_to_string(&path).await {
            Ok(content) => parse_credentials_account(&content),
            Err(e) => {
                tracing::debug!("credentials for {} unavailable: {}", handle.name, e);
                None
            }
        };

        if let Some(user) = live {
            self.store.lock().set_user(&handle.name, &user)?;
            return Ok(user);
        }

        Ok(self
            .store
            .lock()
            .get(&handle.name)
            .and_then(|r| r.user.clone())
            .unwrap_or_else(|| UNKNOWN.to_string()))
    }

    /// A view row for every managed container.
    ///
    /// A store write failure degrades only the affected row.
    pub async fn list_all(&self) -> Result<Vec<ContainerView>, ReconcileError> {
        let handles = Inspector::new(self.runtime).list_managed().await?;
        let mut views = Vec::with_capacity(handles.len());

        for handle in handles {
            let project = self.project(&handle).await.unwrap_or_else(|e| {
                tracing::warn!("{}", e);
                UNKNOWN.to_string()
            });
            let user = self.user(&handle).await.unwrap_or_else(|e| {
                tracing::warn!("{}", e);
                UNKNOWN.to_string()
            });

            views.push(ContainerView {
                status: handle.state.display_text().to_string(),
                name: handle.name.clone(),
                project,
                version: handle.version().to_string(),
                user,
                deployment: handle.deployment().to_string(),
                machine_info: handle.machine_info().to_string(),
                address: handle.address().to_string(),
                state: handle.state,
            });
        }

        Ok(views)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::fake::{FakeRuntime, datalab_labels};

    struct Fixture {
        runtime: FakeRuntime,
        store: Mutex<MetadataStore>,
        dir: tempfile::TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let store = MetadataStore::load(dir.path().join("containers.json")).unwrap();
            Self {
                runtime: FakeRuntime::new(),
                store: Mutex::new(store),
                dir,
            }
        }

        fn reconciler(&self) -> Reconciler<'_, FakeRuntime> {
            Reconciler::new(&self.runtime, &self.store, self.dir.path())
        }

        async fn handle(&self, name: &str) -> ContainerHandle {
            Inspector::new(&self.runtime)
                .find(name)
                .await
                .unwrap()
                .unwrap()
        }

        fn on_disk(&self) -> serde_json::Value {
            let raw = std::fs::read_to_string(self.dir.path().join("containers.json")).unwrap();
            serde_json::from_str(&raw).unwrap()
        }
    }

    #[test]
    fn parse_project_strips_tty_line_endings() {
        let output = "PATH=/usr/bin\r\nPROJECT_ID=abc123\r\nHOME=/root\r\n";
        assert_eq!(parse_project(output).as_deref(), Some("abc123"));
    }

    #[test]
    fn parse_project_requires_line_start() {
        assert_eq!(parse_project("OLD_PROJECT_ID=x\n"), None);
    }

    #[test]
    fn parse_credentials_reads_first_account() {
        let doc = r#"{"data": [{"key": {"account": "ana@example.com"}}, {"key": {"account": "b"}}]}"#;
        assert_eq!(
            parse_credentials_account(doc).as_deref(),
            Some("ana@example.com")
        );
        assert_eq!(parse_credentials_account(r#"{"data": []}"#), None);
        assert_eq!(parse_credentials_account("garbage"), None);
    }

    #[tokio::test]
    async fn running_container_project_is_read_live_and_persisted() {
        let fx = Fixture::new();
        fx.runtime
            .add_container("live", ContainerState::Running, datalab_labels("1"), "abc123");
        fx.store.lock().seed("other", "keep-me").unwrap();

        let handle = fx.handle("live").await;
        assert_eq!(fx.reconciler().project(&handle).await.unwrap(), "abc123");

        let disk = fx.on_disk();
        assert_eq!(disk["live"]["PROJECT_ID"], "abc123");
        assert_eq!(disk["other"]["PROJECT_ID"], "keep-me");
        assert_eq!(disk["other"]["USER"], "-");
    }

    #[tokio::test]
    async fn stopped_container_without_record_is_unknown() {
        let fx = Fixture::new();
        fx.runtime
            .add_container("cold", ContainerState::Exited, datalab_labels("1"), "abc");
        let handle = fx.handle("cold").await;
        assert_eq!(fx.reconciler().project(&handle).await.unwrap(), "-");
    }

    #[tokio::test]
    async fn stopped_container_falls_back_to_store() {
        let fx = Fixture::new();
        fx.runtime
            .add_container("cold", ContainerState::Exited, datalab_labels("1"), "abc");
        fx.store.lock().seed("cold", "stored-proj").unwrap();
        let handle = fx.handle("cold").await;
        assert_eq!(
            fx.reconciler().project(&handle).await.unwrap(),
            "stored-proj"
        );
    }

    #[tokio::test]
    async fn user_comes_from_credentials_file() {
        let fx = Fixture::new();
        fx.runtime
            .add_container("u", ContainerState::Exited, datalab_labels("1"), "p");
        let path = credentials_path(fx.dir.path(), "u");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"data":[{"key":{"account":"me@x.org"}}]}"#).unwrap();

        let handle = fx.handle("u").await;
        assert_eq!(fx.reconciler().user(&handle).await.unwrap(), "me@x.org");
        assert_eq!(fx.on_disk()["u"]["USER"], "me@x.org");
    }

    #[tokio::test]
    async fn user_without_credentials_uses_store_then_unknown() {
        let fx = Fixture::new();
        fx.runtime
            .add_container("u", ContainerState::Running, datalab_labels("1"), "p");
        let handle = fx.handle("u").await;
        assert_eq!(fx.reconciler().user(&handle).await.unwrap(), "-");

        fx.store.lock().set_user("u", "remembered").unwrap();
        assert_eq!(fx.reconciler().user(&handle).await.unwrap(), "remembered");
    }

    #[tokio::test]
    async fn list_all_builds_rows_from_labels_and_store() {
        let fx = Fixture::new();
        fx.runtime
            .add_container("a", ContainerState::Running, datalab_labels("2.1"), "pa");
        fx.runtime
            .add_container("b", ContainerState::Exited, datalab_labels("2.0"), "pb");

        let views = fx.reconciler().list_all().await.unwrap();
        assert_eq!(views.len(), 2);

        let a = views.iter().find(|v| v.name == "a").unwrap();
        assert_eq!(a.status, "Running...");
        assert_eq!(a.project, "pa");
        assert_eq!(a.version, "2.1");
        assert_eq!(a.deployment, "Local");
        assert_eq!(a.address, "-");

        let b = views.iter().find(|v| v.name == "b").unwrap();
        assert_eq!(b.status, "Stopped");
        assert_eq!(b.project, "-");
    }

    #[tokio::test]
    async fn unwritable_store_degrades_rows_without_dropping_any() {
        let fx = Fixture::new();
        fx.runtime
            .add_container("a", ContainerState::Running, datalab_labels("1"), "pa");
        fx.runtime
            .add_container("b", ContainerState::Running, datalab_labels("1"), "pb");
        fx.runtime
            .add_container("cold", ContainerState::Exited, datalab_labels("1"), "pc");
        fx.store.lock().seed("cold", "stored-proj").unwrap();

        let credentials = credentials_path(fx.dir.path(), "a");
        std::fs::create_dir_all(credentials.parent().unwrap()).unwrap();
        std::fs::write(&credentials, r#"{"data":[{"key":{"account":"me@x.org"}}]}"#).unwrap();

        let store_path = fx.dir.path().join("containers.json");
        std::fs::remove_file(&store_path).unwrap();
        std::fs::create_dir(&store_path).unwrap();

        let views = fx.reconciler().list_all().await.unwrap();
        assert_eq!(views.len(), 3);

        let row = |name: &str| views.iter().find(|v| v.name == name).unwrap();
        assert_eq!(row("a").project, "-");
        assert_eq!(row("a").user, "-");
        assert_eq!(row("b").project, "-");
        assert_eq!(row("b").status, "Running...");
        assert_eq!(row("cold").project, "stored-proj");
        assert_eq!(row("cold").user, "-");
    }
}
