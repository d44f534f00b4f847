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

//! Filesystem capabilities the copy engine needs from either side of a
//! transfer.
//!
//! The engine is written once against [`Endpoint`]; [`LocalEndpoint`] and
//! [`RemoteEndpoint`] supply the host filesystem and an SFTP sub-session.
//!
//! [`LocalEndpoint`]: super::local::LocalEndpoint
//! [`RemoteEndpoint`]: super::remote::RemoteEndpoint

use async_trait::async_trait;
use std::fmt;
use std::io;
use std::pin::Pin;
use tokio::io::{AsyncRead, AsyncWrite};

pub type BoxedReader = Pin<Box<dyn AsyncRead + Send>>;
pub type BoxedWriter = Pin<Box<dyn AsyncWrite + Send>>;

/// Which side of the transfer an endpoint represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Local,
    Remote,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Local => write!(f, "local"),
            Side::Remote => write!(f, "remote"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    pub fn is_dir(self) -> bool {
        self == EntryKind::Directory
    }
}

/// One entry produced by [`Endpoint::walk`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    /// Full path on the walked endpoint.
    pub path: String,
    /// Path elements below the walk root; empty for the root itself.
    pub relative: Vec<String>,
    pub kind: EntryKind,
}

impl WalkEntry {
    /// Relative path joined with `/`, empty for the root.
    pub fn relative_path(&self) -> String {
        self.relative.join("/")
    }
}

/// A depth-first pre-order traversal that yields one entry at a time.
///
/// Entries are produced on demand, so a caller that stops early never lists
/// the rest of the tree.
#[async_trait]
pub trait TreeWalk: Send {
    /// The next entry, or `Ok(None)` once the tree is exhausted.
    async fn next_entry(&mut self) -> io::Result<Option<WalkEntry>>;
}

pub type BoxedWalk<'a> = Box<dyn TreeWalk + 'a>;

/// The filesystem primitives consumed by the resolver and the executor.
///
/// Paths passed in are already normalized by the resolver (forward slashes,
/// lexically clean). Implementations report a missing path as
/// [`io::ErrorKind::NotFound`] from every method except [`Endpoint::stat`],
/// which returns `Ok(None)` instead.
#[async_trait]
pub trait Endpoint: Send + Sync {
    fn side(&self) -> Side;

    /// Rewrite user input into this endpoint's separator convention.
    fn canonical_separators(&self, raw: &str) -> String;

    /// Home directory of the user this endpoint acts for.
    async fn home_dir(&self) -> io::Result<String>;

    async fn stat(&self, path: &str) -> io::Result<Option<EntryKind>>;

    async fn open(&self, path: &str) -> io::Result<BoxedReader>;

    /// Create or truncate a file for writing.
    async fn create(&self, path: &str) -> io::Result<BoxedWriter>;

    /// Create `path` and any missing ancestors. Existing directories are fine.
    async fn mkdir_all(&self, path: &str) -> io::Result<()>;

    /// Delete a file, or a directory with everything below it.
    async fn remove_all(&self, path: &str) -> io::Result<()>;

    /// Start a depth-first pre-order walk of the tree rooted at `root`; the
    /// root itself is the first entry.
    async fn walk<'s>(&'s self, root: &str) -> io::Result<BoxedWalk<'s>>;
}
