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

//! Error types for copy and move operations.

use std::fmt;
use std::io;

use super::endpoint::Side;

/// Filesystem operation that failed during resolution or transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ResolveHome,
    Stat,
    Open,
    Create,
    Stream,
    CreateDir,
    Walk,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Operation::ResolveHome => "determine home dir for",
            Operation::Stat => "retrieve information about",
            Operation::Open => "open",
            Operation::Create => "create/open",
            Operation::Stream => "copy",
            Operation::CreateDir => "create dir",
            Operation::Walk => "walk dir",
            Operation::Delete => "delete source",
        };
        f.write_str(verb)
    }
}

/// Errors returned by [`copy_path`](super::copy_path) and
/// [`move_path`](super::move_path).
#[derive(Debug, thiserror::Error)]
pub enum CopyError {
    /// Source does not exist on its endpoint
    #[error("{side} source '{path}' does not exist")]
    NotFound { side: Side, path: String },

    /// Target does not exist and neither does its parent
    #[error("{side} parent '{parent}' of target '{path}' does not exist")]
    InvalidTarget {
        side: Side,
        path: String,
        parent: String,
    },

    /// A directory cannot be copied onto an existing file
    #[error("{side} target '{path}' is a file")]
    TargetIsFile { side: Side, path: String },

    /// Session establishment, handshake, authentication or SFTP start-up failed
    #[error("failed to connect via SSH to '{address}': {source}")]
    Connection {
        address: String,
        #[source]
        source: crate::ssh::Error,
    },

    /// I/O failure while resolving or transferring
    #[error("failed to {operation} {side} path '{path}': {source}")]
    Transfer {
        operation: Operation,
        side: Side,
        path: String,
        #[source]
        source: io::Error,
    },
}

impl CopyError {
    pub(crate) fn transfer(
        operation: Operation,
        side: Side,
        path: impl Into<String>,
        source: io::Error,
    ) -> Self {
        CopyError::Transfer {
            operation,
            side,
            path: path.into(),
            source,
        }
    }

    /// Whether the request itself was invalid, as opposed to a failure while
    /// talking to either filesystem.
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            CopyError::NotFound { .. }
                | CopyError::InvalidTarget { .. }
                | CopyError::TargetIsFile { .. }
        )
    }

    /// Process exit status for this failure: `2` for an invalid request,
    /// `1` for everything else.
    pub fn exit_code(&self) -> i32 {
        if self.is_invalid_request() {
            2
        } else {
            1
        }
    }

    /// Short suggestion printed below the error, if one applies.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            CopyError::Connection { source, .. } if source.is_authentication() => Some(
                "check that the private key is readable and authorized for this user on the node",
            ),
            CopyError::Connection {
                source: crate::ssh::Error::ServerCheckFailed,
                ..
            } => Some("the node's host key is unknown or changed; check your known_hosts file"),
            CopyError::InvalidTarget { .. } => {
                Some("create the parent directory first or pick an existing target")
            }
            _ => None,
        }
    }
}
