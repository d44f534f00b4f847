// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Host filesystem endpoint.

use async_trait::async_trait;
use directories::BaseDirs;
use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use walkdir::WalkDir;

use super::endpoint::{
    BoxedReader, BoxedWalk, BoxedWriter, Endpoint, EntryKind, Side, TreeWalk, WalkEntry,
};
use super::paths;

/// The filesystem of the machine running the copy.
#[derive(Debug, Clone, Default)]
pub struct LocalEndpoint {
    home_override: Option<String>,
}

impl LocalEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `home` for `~` expansion instead of the current user's home.
    pub fn with_home(home: impl AsRef<Path>) -> Self {
        Self {
            home_override: Some(to_slash(&home.as_ref().to_string_lossy())),
        }
    }
}

#[cfg(windows)]
fn to_slash(path: &str) -> String {
    paths::backslashes_to_slashes(path)
}

#[cfg(not(windows))]
fn to_slash(path: &str) -> String {
    path.to_string()
}

#[async_trait]
impl Endpoint for LocalEndpoint {
    fn side(&self) -> Side {
        Side::Local
    }

    fn canonical_separators(&self, raw: &str) -> String {
        to_slash(raw)
    }

    async fn home_dir(&self) -> io::Result<String> {
        if let Some(home) = &self.home_override {
            return Ok(home.clone());
        }
        let dirs = BaseDirs::new().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                "could not determine home directory of current user",
            )
        })?;
        Ok(to_slash(&dirs.home_dir().to_string_lossy()))
    }

    async fn stat(&self, path: &str) -> io::Result<Option<EntryKind>> {
        match tokio::fs::metadata(path).await {
            Ok(metadata) if metadata.is_dir() => Ok(Some(EntryKind::Directory)),
            Ok(_) => Ok(Some(EntryKind::File)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn open(&self, path: &str) -> io::Result<BoxedReader> {
        let file = tokio::fs::File::open(path).await?;
        Ok(Box::pin(file))
    }

    async fn create(&self, path: &str) -> io::Result<BoxedWriter> {
        let file = tokio::fs::File::create(path).await?;
        Ok(Box::pin(file))
    }

    async fn mkdir_all(&self, path: &str) -> io::Result<()> {
        tokio::fs::create_dir_all(path).await
    }

    async fn remove_all(&self, path: &str) -> io::Result<()> {
        let metadata = tokio::fs::symlink_metadata(path).await?;
        if metadata.is_dir() {
            tokio::fs::remove_dir_all(path).await
        } else {
            tokio::fs::remove_file(path).await
        }
    }

    async fn walk<'s>(&'s self, root: &str) -> io::Result<BoxedWalk<'s>> {
        let root = PathBuf::from(root);
        tokio::fs::metadata(&root).await?;

        let (tx, rx) = mpsc::channel(WALK_CHANNEL_CAPACITY);
        let worker = tokio::task::spawn_blocking(move || walk_blocking(&root, &tx));

        Ok(Box::new(LocalWalk {
            rx,
            worker: Some(worker),
        }))
    }
}

/// Entries buffered between the walker thread and the consumer.
const WALK_CHANNEL_CAPACITY: usize = 256;

/// Receiving half of a walk running on the blocking pool.
struct LocalWalk {
    rx: mpsc::Receiver<io::Result<WalkEntry>>,
    worker: Option<JoinHandle<()>>,
}

#[async_trait]
impl TreeWalk for LocalWalk {
    async fn next_entry(&mut self) -> io::Result<Option<WalkEntry>> {
        match self.rx.recv().await {
            Some(entry) => entry.map(Some),
            None => {
                // Sender dropped; a panicked walker must not look like a finished one.
                if let Some(worker) = self.worker.take() {
                    worker.await.map_err(io::Error::other)?;
                }
                Ok(None)
            }
        }
    }
}

fn walk_blocking(root: &Path, tx: &mpsc::Sender<io::Result<WalkEntry>>) {
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry
            .map_err(io::Error::from)
            .and_then(|entry| to_walk_entry(root, &entry));
        let failed = entry.is_err();

        // A closed channel means the consumer stopped early.
        if tx.blocking_send(entry).is_err() || failed {
            return;
        }
    }
}

fn to_walk_entry(root: &Path, entry: &walkdir::DirEntry) -> io::Result<WalkEntry> {
    let relative = entry
        .path()
        .strip_prefix(root)
        .map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "failed to determine relative path of '{}': {e}",
                    entry.path().display()
                ),
            )
        })?
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();

    let kind = if entry.file_type().is_dir() {
        EntryKind::Directory
    } else {
        EntryKind::File
    };

    Ok(WalkEntry {
        path: paths::clean(&to_slash(&entry.path().to_string_lossy())),
        relative,
        kind,
    })
}
