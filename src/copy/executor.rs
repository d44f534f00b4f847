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

//! File and directory-tree transfer between two endpoints.
//!
//! Transfers are strictly sequential and fail fast: the first I/O error
//! aborts the whole operation. In move mode the source is deleted only once
//! everything below it has been copied.

use std::io;
use tokio::io::{AsyncWriteExt, BufReader};

use super::endpoint::{Endpoint, EntryKind};
use super::error::{CopyError, Operation};
use super::paths;

/// Read buffer used while streaming a single file.
const COPY_BUFFER_SIZE: usize = 256 * 1024;

/// Whether the source survives a successful transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferMode {
    #[default]
    Copy,
    /// Delete the source after everything has been copied.
    Move,
}

impl TransferMode {
    pub fn deletes_source(self) -> bool {
        self == TransferMode::Move
    }
}

/// What a successful transfer touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransferSummary {
    pub files: u64,
    pub directories: u64,
    pub bytes: u64,
}

/// Streams data from a source endpoint into a target endpoint.
pub struct Executor<'a> {
    source: &'a dyn Endpoint,
    target: &'a dyn Endpoint,
    mode: TransferMode,
}

impl<'a> Executor<'a> {
    pub fn new(source: &'a dyn Endpoint, target: &'a dyn Endpoint, mode: TransferMode) -> Self {
        Self {
            source,
            target,
            mode,
        }
    }

    /// Copy one file to `dst`, creating or truncating it.
    pub async fn copy_file(&self, src: &str, dst: &str) -> Result<TransferSummary, CopyError> {
        tracing::debug!(
            "Copying {} file '{}' to {} path '{}'",
            self.source.side(),
            src,
            self.target.side(),
            dst
        );

        let bytes = self.stream(src, dst).await?;

        if self.mode.deletes_source() {
            self.delete_source(src).await?;
        }

        Ok(TransferSummary {
            files: 1,
            directories: 0,
            bytes,
        })
    }

    /// Mirror the tree rooted at `src` below `dst`.
    ///
    /// `dst` itself is created when missing; existing directories are merged
    /// into and existing files are overwritten.
    pub async fn copy_dir(&self, src: &str, dst: &str) -> Result<TransferSummary, CopyError> {
        tracing::debug!(
            "Copying {} dir '{}' to {} path '{}'",
            self.source.side(),
            src,
            self.target.side(),
            dst
        );

        let walk_error =
            |e: io::Error| CopyError::transfer(Operation::Walk, self.source.side(), src, e);
        let mut walk = self.source.walk(src).await.map_err(walk_error)?;

        let mut summary = TransferSummary::default();

        while let Some(entry) = walk.next_entry().await.map_err(walk_error)? {
            let dst_path = paths::join(dst, &entry.relative_path());

            match entry.kind {
                EntryKind::Directory => {
                    tracing::debug!("Creating {} dir '{}'", self.target.side(), dst_path);
                    self.target.mkdir_all(&dst_path).await.map_err(|e| {
                        CopyError::transfer(Operation::CreateDir, self.target.side(), &dst_path, e)
                    })?;
                    summary.directories += 1;
                }
                EntryKind::File => {
                    tracing::debug!("Copying file '{}' to '{}'", entry.path, dst_path);
                    summary.bytes += self.stream(&entry.path, &dst_path).await?;
                    summary.files += 1;
                }
            }
        }

        drop(walk);

        if self.mode.deletes_source() {
            self.delete_source(src).await?;
        }

        Ok(summary)
    }

    async fn stream(&self, src: &str, dst: &str) -> Result<u64, CopyError> {
        let reader = self
            .source
            .open(src)
            .await
            .map_err(|e| CopyError::transfer(Operation::Open, self.source.side(), src, e))?;

        let mut writer = self
            .target
            .create(dst)
            .await
            .map_err(|e| CopyError::transfer(Operation::Create, self.target.side(), dst, e))?;

        let mut reader = BufReader::with_capacity(COPY_BUFFER_SIZE, reader);
        let bytes = tokio::io::copy_buf(&mut reader, &mut writer)
            .await
            .map_err(|e| CopyError::transfer(Operation::Stream, self.source.side(), src, e))?;

        writer
            .shutdown()
            .await
            .map_err(|e| CopyError::transfer(Operation::Stream, self.target.side(), dst, e))?;

        Ok(bytes)
    }

    async fn delete_source(&self, path: &str) -> Result<(), CopyError> {
        tracing::debug!("Deleting {} source '{}'", self.source.side(), path);
        self.source
            .remove_all(path)
            .await
            .map_err(|e| CopyError::transfer(Operation::Delete, self.source.side(), path, e))
    }
}
