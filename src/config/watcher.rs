//! Configuration file watcher for hot reload.
//!
//! # Responsibilities
//! - Notice changes to the configuration file
//! - Re-load and validate it, forwarding only accepted configurations
//!
//! # Design Decisions
//! - The parent directory is watched, not the file: editors and deploy tools
//!   often replace the file by rename, which would orphan a file watch
//! - Events for sibling files are ignored
//! - A rejected file is logged and dropped; the receiver keeps the last good one

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::ServiceConfig;

/// Watches one configuration file and forwards every valid revision of it.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<ServiceConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and a receiver for validated configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<ServiceConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. The returned watcher must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let file_name = self.path.file_name().map(OsString::from);
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let ConfigWatcher { path, update_tx } = self;
        let watched = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if touches_file(&event, file_name.as_deref()) {
                        forward_reload(&path, &update_tx);
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?watched, "Config watcher started");
        Ok(watcher)
    }
}

fn touches_file(event: &Event, file_name: Option<&OsStr>) -> bool {
    let Some(file_name) = file_name else {
        return false;
    };
    matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
        && event.paths.iter().any(|p| p.file_name() == Some(file_name))
}

/// Load `path` and send it on if it is valid.
fn forward_reload(path: &Path, tx: &mpsc::UnboundedSender<ServiceConfig>) {
    match load_config(path) {
        Ok(config) => {
            tracing::info!(path = ?path, level = %config.logging.level, "Config reloaded");
            let _ = tx.send(config);
        }
        Err(e) => {
            tracing::error!(path = ?path, error = %e, "Rejected config reload, keeping current configuration");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::{Level, LoggerRegistry};
    use crate::observability::logging::apply_reloads;
    use std::fs;
    use std::time::Instant;

    static REGISTRY: LoggerRegistry = LoggerRegistry::new();

    /// Replace `path` atomically, the way deploy tools do.
    fn replace_file(dir: &Path, path: &Path, content: &str) {
        let staging = dir.join("staging.tmp");
        fs::write(&staging, content).unwrap();
        fs::rename(&staging, path).unwrap();
    }

    fn config_with_level(level: &str) -> String {
        format!("[logging]\nlevel = \"{}\"\noutput = \"discard\"\n", level)
    }

    async fn wait_for_level(level: Level) -> bool {
        let start = Instant::now();
        while start.elapsed() < Duration::from_secs(10) {
            if REGISTRY.get().level() == level {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        false
    }

    #[test]
    fn test_only_valid_revisions_are_forwarded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("service.toml");
        let (tx, mut rx) = mpsc::unbounded_channel();

        fs::write(&path, "[logging\nlevel = ").unwrap();
        forward_reload(&path, &tx);
        fs::write(&path, "[timeouts]\nrequest_secs = 0").unwrap();
        forward_reload(&path, &tx);
        assert!(rx.try_recv().is_err());

        fs::write(&path, config_with_level("debug")).unwrap();
        forward_reload(&path, &tx);
        assert_eq!(rx.try_recv().unwrap().logging.level, "debug");
    }

    #[test]
    fn test_sibling_files_are_ignored() {
        use notify::event::{CreateKind, ModifyKind, RemoveKind};

        let name = OsStr::new("service.toml");
        let own = Event::new(EventKind::Modify(ModifyKind::Any))
            .add_path(PathBuf::from("/etc/app/service.toml"));
        let sibling = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/etc/app/other.toml"));
        let removed = Event::new(EventKind::Remove(RemoveKind::File))
            .add_path(PathBuf::from("/etc/app/service.toml"));

        assert!(touches_file(&own, Some(name)));
        assert!(!touches_file(&sibling, Some(name)));
        assert!(!touches_file(&removed, Some(name)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_watcher_applies_valid_and_skips_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("service.toml");
        fs::write(&path, config_with_level("warn")).unwrap();

        let (watcher, updates) = ConfigWatcher::new(&path);
        let _watcher = watcher.run().unwrap();
        tokio::spawn(apply_reloads(&REGISTRY, updates));

        replace_file(dir.path(), &path, &config_with_level("error"));
        assert!(wait_for_level(Level::Error).await);

        replace_file(dir.path(), &path, "[logging\nlevel = ");
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(REGISTRY.get().level(), Level::Error);

        // Reloading keeps working after a rejected revision
        replace_file(dir.path(), &path, &config_with_level("debug"));
        assert!(wait_for_level(Level::Debug).await);
    }
}
