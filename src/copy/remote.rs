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

//! Node filesystem endpoint backed by an SFTP sub-session.

use async_trait::async_trait;
use russh_sftp::client::error::Error as SftpError;
use russh_sftp::client::SftpSession;
use russh_sftp::protocol::{OpenFlags, StatusCode};
use std::future::Future;
use std::io;
use std::pin::Pin;
use tokio::sync::OnceCell;

use super::endpoint::{
    BoxedReader, BoxedWalk, BoxedWriter, Endpoint, EntryKind, Side, TreeWalk, WalkEntry,
};
use super::paths;

/// How the node reports its home directory over SFTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeKind {
    /// A regular POSIX home such as `/home/remote`.
    Posix,
    /// A Windows path exposed with POSIX separators, e.g. `/C:/Users/remote`.
    WindowsUnderPosixPath,
}

/// Home directory of the remote user, classified once per session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteHome {
    path: String,
    kind: HomeKind,
}

impl RemoteHome {
    /// Classify the working directory reported by the SFTP server.
    ///
    /// Only homes below `/home/` are treated as POSIX; anything else is a
    /// Windows node whose spurious leading slash is stripped.
    pub fn classify(reported: &str) -> Self {
        if reported.starts_with("/home/") {
            Self {
                path: reported.to_string(),
                kind: HomeKind::Posix,
            }
        } else {
            Self {
                path: reported.strip_prefix('/').unwrap_or(reported).to_string(),
                kind: HomeKind::WindowsUnderPosixPath,
            }
        }
    }

    /// Home path used for `~` expansion.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> HomeKind {
        self.kind
    }
}

/// A node's filesystem as seen through one SFTP sub-session.
pub struct RemoteEndpoint<'a> {
    sftp: &'a SftpSession,
    home: OnceCell<RemoteHome>,
}

impl<'a> RemoteEndpoint<'a> {
    pub fn new(sftp: &'a SftpSession) -> Self {
        Self {
            sftp,
            home: OnceCell::new(),
        }
    }

    /// Query and classify the remote home on first use; later calls reuse it.
    pub async fn home(&self) -> io::Result<&RemoteHome> {
        self.home
            .get_or_try_init(|| async {
                let reported = self.sftp.canonicalize(".").await.map_err(to_io_error)?;
                let home = RemoteHome::classify(&reported);
                match home.kind() {
                    HomeKind::Posix => {
                        tracing::debug!("Linux remote home dir detected: {}", home.path())
                    }
                    HomeKind::WindowsUnderPosixPath => {
                        tracing::debug!("Windows remote home dir detected: {}", home.path())
                    }
                }
                Ok(home)
            })
            .await
    }

    fn remove_tree<'b>(
        &'b self,
        dir: String,
    ) -> Pin<Box<dyn Future<Output = io::Result<()>> + Send + 'b>> {
        Box::pin(async move {
            for child in list_children(self.sftp, &dir, &[]).await? {
                match child.kind {
                    EntryKind::Directory => self.remove_tree(child.path).await?,
                    EntryKind::File => {
                        self.sftp.remove_file(child.path).await.map_err(to_io_error)?
                    }
                }
            }

            self.sftp.remove_dir(dir).await.map_err(to_io_error)
        })
    }
}

#[async_trait]
impl Endpoint for RemoteEndpoint<'_> {
    fn side(&self) -> Side {
        Side::Remote
    }

    fn canonical_separators(&self, raw: &str) -> String {
        paths::backslashes_to_slashes(raw)
    }

    async fn home_dir(&self) -> io::Result<String> {
        Ok(self.home().await?.path().to_string())
    }

    async fn stat(&self, path: &str) -> io::Result<Option<EntryKind>> {
        match self.sftp.metadata(path).await {
            Ok(metadata) if metadata.is_dir() => Ok(Some(EntryKind::Directory)),
            Ok(_) => Ok(Some(EntryKind::File)),
            Err(e) => {
                let e = to_io_error(e);
                if e.kind() == io::ErrorKind::NotFound {
                    Ok(None)
                } else {
                    Err(e)
                }
            }
        }
    }

    async fn open(&self, path: &str) -> io::Result<BoxedReader> {
        let file = self
            .sftp
            .open_with_flags(path, OpenFlags::READ)
            .await
            .map_err(to_io_error)?;
        Ok(Box::pin(file))
    }

    async fn create(&self, path: &str) -> io::Result<BoxedWriter> {
        let file = self
            .sftp
            .open_with_flags(
                path,
                OpenFlags::CREATE | OpenFlags::TRUNCATE | OpenFlags::WRITE,
            )
            .await
            .map_err(to_io_error)?;
        Ok(Box::pin(file))
    }

    async fn mkdir_all(&self, path: &str) -> io::Result<()> {
        // Climb until an existing ancestor is found, then create downwards.
        let mut missing = Vec::new();
        let mut current = paths::clean(path);
        loop {
            match self.stat(&current).await? {
                Some(EntryKind::Directory) => break,
                Some(EntryKind::File) => {
                    return Err(io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        format!("'{current}' exists and is not a directory"),
                    ));
                }
                None => {
                    let parent = paths::parent(&current);
                    missing.push(current);
                    if missing.last() == Some(&parent) {
                        break;
                    }
                    current = parent;
                }
            }
        }

        for dir in missing.into_iter().rev() {
            tracing::debug!("Creating remote dir {}", dir);
            self.sftp.create_dir(dir).await.map_err(to_io_error)?;
        }
        Ok(())
    }

    async fn remove_all(&self, path: &str) -> io::Result<()> {
        match self.stat(path).await? {
            Some(EntryKind::Directory) => self.remove_tree(path.to_string()).await,
            Some(EntryKind::File) => self.sftp.remove_file(path).await.map_err(to_io_error),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("'{path}' does not exist"),
            )),
        }
    }

    async fn walk<'s>(&'s self, root: &str) -> io::Result<BoxedWalk<'s>> {
        let root = paths::clean(root);
        let kind = self.stat(&root).await?.ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("'{root}' does not exist"))
        })?;

        Ok(Box::new(RemoteWalk {
            sftp: self.sftp,
            pending: vec![WalkEntry {
                path: root,
                relative: Vec::new(),
                kind,
            }],
        }))
    }
}

/// Pre-order walk over SFTP. A directory is listed only when it is reached,
/// so at most the listings along the current path are held at once.
struct RemoteWalk<'a> {
    sftp: &'a SftpSession,
    /// Entries still to be yielded, next one last.
    pending: Vec<WalkEntry>,
}

#[async_trait]
impl TreeWalk for RemoteWalk<'_> {
    async fn next_entry(&mut self) -> io::Result<Option<WalkEntry>> {
        let Some(entry) = self.pending.pop() else {
            return Ok(None);
        };

        if entry.kind.is_dir() {
            let children = list_children(self.sftp, &entry.path, &entry.relative).await?;
            self.pending.extend(children.into_iter().rev());
        }

        Ok(Some(entry))
    }
}

/// Direct children of `dir`, without `.` and `..`.
async fn list_children(
    sftp: &SftpSession,
    dir: &str,
    relative: &[String],
) -> io::Result<Vec<WalkEntry>> {
    let entries = sftp.read_dir(dir).await.map_err(to_io_error)?;

    Ok(entries
        .filter_map(|entry| {
            let name = entry.file_name();
            if name == "." || name == ".." {
                return None;
            }

            let kind = if entry.metadata().file_type().is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };
            let mut child_relative = relative.to_vec();
            child_relative.push(name.clone());

            Some(WalkEntry {
                path: paths::join(dir, &name),
                relative: child_relative,
                kind,
            })
        })
        .collect())
}

/// Map SFTP status codes onto the io error kinds the engine inspects.
pub(crate) fn to_io_error(err: SftpError) -> io::Error {
    let kind = match &err {
        SftpError::Status(status) => match status.status_code {
            StatusCode::NoSuchFile => io::ErrorKind::NotFound,
            StatusCode::PermissionDenied => io::ErrorKind::PermissionDenied,
            StatusCode::OpUnsupported => io::ErrorKind::Unsupported,
            StatusCode::NoConnection | StatusCode::ConnectionLost => {
                io::ErrorKind::ConnectionAborted
            }
            _ => io::ErrorKind::Other,
        },
        SftpError::Timeout => io::ErrorKind::TimedOut,
        _ => io::ErrorKind::Other,
    };
    io::Error::new(kind, err)
}
