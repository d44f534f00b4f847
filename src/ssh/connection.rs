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

//! SSH connection establishment and the SFTP sub-session on top of it.
//!
//! This module handles address resolution, connection attempts, the
//! handshake, public-key authentication and opening the `sftp` subsystem.

use russh::client::{Config, Handle, Handler};
use russh_sftp::client::SftpSession;
use std::fmt::Debug;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::authentication::{AuthMethod, ServerCheckMethod};

/// Default SSH port of cluster nodes.
pub const DEFAULT_PORT: u16 = 22;

/// Default connect/handshake timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything needed to reach and authenticate against one node.
#[derive(Debug, Clone)]
pub struct ConnectionParams {
    pub address: String,
    pub port: u16,
    pub remote_user: String,
    pub auth: AuthMethod,
    /// Covers TCP connect, handshake and authentication.
    pub timeout: Duration,
    pub server_check: ServerCheckMethod,
}

impl ConnectionParams {
    pub fn new(
        address: impl Into<String>,
        remote_user: impl Into<String>,
        private_key_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            address: address.into(),
            port: DEFAULT_PORT,
            remote_user: remote_user.into(),
            auth: AuthMethod::with_key_file(private_key_path.into(), None),
            timeout: DEFAULT_CONNECT_TIMEOUT,
            server_check: ServerCheckMethod::NoCheck,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_server_check(mut self, server_check: ServerCheckMethod) -> Self {
        self.server_check = server_check;
        self
    }

    /// `address:port` as used in log lines and error messages.
    pub fn endpoint(&self) -> String {
        if self.address.contains(':') {
            format!("[{}]:{}", self.address, self.port)
        } else {
            format!("{}:{}", self.address, self.port)
        }
    }
}

/// An authenticated SSH connection to a node.
///
/// A `Client` is exclusively owned by one copy/move invocation. Call
/// [`Client::disconnect`] when done; the orchestrator does this on every
/// exit path.
pub struct Client {
    connection_handle: Handle<ClientHandler>,
    username: String,
    address: SocketAddr,
}

impl Client {
    /// Open an SSH connection to a node and authenticate with its key.
    ///
    /// The whole sequence (resolve, connect, handshake, authenticate) is
    /// bounded by `params.timeout`.
    pub async fn connect(params: &ConnectionParams) -> Result<Self, super::Error> {
        tracing::debug!(
            "Connecting via SSH to {} as {} using {} (timeout {:?})",
            params.endpoint(),
            params.remote_user,
            params.auth.describe(),
            params.timeout
        );

        match tokio::time::timeout(params.timeout, Self::connect_inner(params)).await {
            Ok(result) => result,
            Err(_) => Err(super::Error::ConnectTimeout(params.timeout)),
        }
    }

    async fn connect_inner(params: &ConnectionParams) -> Result<Self, super::Error> {
        let config = Arc::new(Config::default());

        // Connection code inspired from std::net::TcpStream::connect and std::net::each_addr
        let socket_addrs = tokio::net::lookup_host((params.address.as_str(), params.port))
            .await
            .map_err(super::Error::AddressInvalid)?;
        let mut connect_res = Err(super::Error::AddressInvalid(io::Error::new(
            io::ErrorKind::InvalidInput,
            "could not resolve to any addresses",
        )));
        for socket_addr in socket_addrs {
            let handler = ClientHandler {
                hostname: params.address.clone(),
                host: socket_addr,
                server_check: params.server_check.clone(),
            };
            match russh::client::connect(config.clone(), socket_addr, handler).await {
                Ok(h) => {
                    connect_res = Ok((socket_addr, h));
                    break;
                }
                Err(e) => {
                    tracing::debug!("Connection attempt to {} failed: {}", socket_addr, e);
                    connect_res = Err(e);
                }
            }
        }
        let (address, mut handle) = connect_res?;

        super::authentication::authenticate(&mut handle, &params.remote_user, &params.auth)
            .await?;

        tracing::debug!("Connected via SSH to {}", address);

        Ok(Self {
            connection_handle: handle,
            username: params.remote_user.clone(),
            address,
        })
    }

    /// Start the `sftp` subsystem on a fresh session channel.
    ///
    /// Some sshd_config does not enable sftp by default, so make sure it is enabled.
    /// A config line like a `Subsystem sftp internal-sftp` or
    /// `Subsystem sftp /usr/lib/openssh/sftp-server` is needed in the sshd_config in remote machine.
    pub async fn open_sftp(&self) -> Result<SftpSession, super::Error> {
        let channel = self.connection_handle.channel_open_session().await?;
        channel.request_subsystem(true, "sftp").await?;
        let sftp = SftpSession::new(channel.into_stream()).await?;

        tracing::debug!("SFTP client created on top of SSH connection");
        Ok(sftp)
    }

    /// Disconnect from the remote host.
    pub async fn disconnect(&self) -> Result<(), super::Error> {
        self.connection_handle
            .disconnect(russh::Disconnect::ByApplication, "", "")
            .await
            .map_err(super::Error::SshError)
    }
}

impl Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("username", &self.username)
            .field("address", &self.address)
            .field("connection_handle", &"Handle<ClientHandler>")
            .finish()
    }
}

/// SSH client handler for managing server key verification.
#[derive(Debug, Clone)]
pub struct ClientHandler {
    hostname: String,
    host: SocketAddr,
    server_check: ServerCheckMethod,
}

impl Handler for ClientHandler {
    type Error = super::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &russh::keys::PublicKey,
    ) -> Result<bool, Self::Error> {
        match &self.server_check {
            ServerCheckMethod::NoCheck => Ok(true),
            ServerCheckMethod::KnownHostsFile(known_hosts_path) => {
                russh::keys::check_known_hosts_path(
                    &self.hostname,
                    self.host.port(),
                    server_public_key,
                    known_hosts_path,
                )
                .map_err(|_| super::Error::ServerCheckFailed)
            }
            ServerCheckMethod::DefaultKnownHostsFile => russh::keys::check_known_hosts(
                &self.hostname,
                self.host.port(),
                server_public_key,
            )
            .map_err(|_| super::Error::ServerCheckFailed),
        }
    }
}
