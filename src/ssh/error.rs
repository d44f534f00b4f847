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

use std::io;
use std::time::Duration;

/// Errors raised while establishing the SSH session or its SFTP sub-session.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("Invalid address: {0}")]
    AddressInvalid(#[source] io::Error),

    #[error("Connection timed out after {0:?}")]
    ConnectTimeout(Duration),

    #[error("Failed to load private key: {0}")]
    KeyInvalid(#[source] russh::keys::Error),

    #[error("The private key was rejected by the server")]
    KeyAuthFailed,

    #[error("Host key verification failed")]
    ServerCheckFailed,

    #[error("SSH error: {0}")]
    SshError(#[from] russh::Error),

    #[error("SFTP error: {0}")]
    SftpError(#[from] russh_sftp::client::error::Error),
}

impl Error {
    /// Whether the failure happened while authenticating rather than while
    /// reaching the host.
    pub fn is_authentication(&self) -> bool {
        matches!(self, Error::KeyInvalid(_) | Error::KeyAuthFailed)
    }
}
