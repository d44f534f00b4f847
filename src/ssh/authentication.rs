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

//! Public-key authentication and server host key verification.
//!
//! Nodes are reached with a key pair only; password, agent and
//! keyboard-interactive logins are not offered.

use russh::client::{Handle, Handler};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use zeroize::Zeroizing;

/// Private key used to authenticate against the node.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AuthMethod {
    PrivateKey {
        /// entire contents of private key file
        key_data: Zeroizing<String>,
        key_pass: Option<Zeroizing<String>>,
    },
    PrivateKeyFile {
        key_file_path: PathBuf,
        key_pass: Option<Zeroizing<String>>,
    },
}

impl AuthMethod {
    pub fn with_key(key: &str, passphrase: Option<&str>) -> Self {
        Self::PrivateKey {
            key_data: Zeroizing::new(key.to_string()),
            key_pass: passphrase.map(|p| Zeroizing::new(p.to_string())),
        }
    }

    pub fn with_key_file<T: AsRef<Path>>(key_file_path: T, passphrase: Option<&str>) -> Self {
        Self::PrivateKeyFile {
            key_file_path: key_file_path.as_ref().to_path_buf(),
            key_pass: passphrase.map(|p| Zeroizing::new(p.to_string())),
        }
    }

    /// Short description for log lines; never includes key material.
    pub fn describe(&self) -> String {
        match self {
            AuthMethod::PrivateKey { .. } => "in-memory private key".to_string(),
            AuthMethod::PrivateKeyFile { key_file_path, .. } => {
                format!("private key file {}", key_file_path.display())
            }
        }
    }
}

/// Server host key verification methods.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum ServerCheckMethod {
    /// Accept any host key. Only meant for nodes inside a trusted private network.
    #[default]
    NoCheck,
    /// Use default known_hosts file (~/.ssh/known_hosts)
    DefaultKnownHostsFile,
    /// Use a specific known_hosts file path
    KnownHostsFile(PathBuf),
}

impl ServerCheckMethod {
    pub fn with_known_hosts_file<T: AsRef<Path>>(known_hosts_file: T) -> Self {
        Self::KnownHostsFile(known_hosts_file.as_ref().to_path_buf())
    }
}

/// This takes a handle and performs authentication with the given method.
pub(super) async fn authenticate<H: Handler>(
    handle: &mut Handle<H>,
    username: &str,
    auth: &AuthMethod,
) -> Result<(), super::Error> {
    let private_key = match auth {
        AuthMethod::PrivateKey { key_data, key_pass } => {
            russh::keys::decode_secret_key(key_data, key_pass.as_ref().map(|p| p.as_str()))
                .map_err(super::Error::KeyInvalid)?
        }
        AuthMethod::PrivateKeyFile {
            key_file_path,
            key_pass,
        } => russh::keys::load_secret_key(key_file_path, key_pass.as_ref().map(|p| p.as_str()))
            .map_err(super::Error::KeyInvalid)?,
    };

    let is_authenticated = handle
        .authenticate_publickey(
            username,
            russh::keys::PrivateKeyWithHashAlg::new(
                Arc::new(private_key),
                handle.best_supported_rsa_hash().await?.flatten(),
            ),
        )
        .await?;
    if !is_authenticated.success() {
        return Err(super::Error::KeyAuthFailed);
    }
    Ok(())
}
