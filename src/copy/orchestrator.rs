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

//! Copy/move entry points between the host and one node.
//!
//! Every call runs the same sequence: the local side of the request is
//! resolved before any network activity, then the SSH session and its SFTP
//! sub-session are opened, the remote side is resolved, the final target is
//! synthesized and the transfer runs. The sub-session and the session are
//! always closed again, in that order.

use std::fmt;

use super::endpoint::Endpoint;
use super::error::CopyError;
use super::executor::{Executor, TransferMode, TransferSummary};
use super::local::LocalEndpoint;
use super::remote::RemoteEndpoint;
use super::resolver::{self, PathDescriptor, TargetDescriptor};
use crate::ssh::{Client, ConnectionParams};

/// Direction of a transfer relative to the host running it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Host to node.
    Push,
    /// Node to host.
    Pull,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Push => write!(f, "local -> remote"),
            Direction::Pull => write!(f, "remote -> local"),
        }
    }
}

/// A single copy or move request as given by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyRequest {
    pub source: String,
    pub target: String,
    pub direction: Direction,
}

impl CopyRequest {
    pub fn push(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            direction: Direction::Push,
        }
    }

    pub fn pull(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            direction: Direction::Pull,
        }
    }
}

/// Progress of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    ResolvingLocalEndpoint,
    Connecting,
    ResolvingRemoteEndpoint,
    Transferring,
    Completed,
    Failed,
}

#[derive(Debug)]
struct PhaseTracker {
    current: Phase,
}

impl PhaseTracker {
    fn new() -> Self {
        Self {
            current: Phase::Idle,
        }
    }

    fn advance(&mut self, next: Phase) {
        tracing::debug!("Copy phase {:?} -> {:?}", self.current, next);
        self.current = next;
    }
}

/// Copy `request.source` to `request.target`, keeping the source.
pub async fn copy_path(
    request: &CopyRequest,
    params: &ConnectionParams,
) -> Result<TransferSummary, CopyError> {
    execute(request, params, TransferMode::Copy).await
}

/// Copy `request.source` to `request.target` and delete the source once the
/// copy has fully succeeded.
pub async fn move_path(
    request: &CopyRequest,
    params: &ConnectionParams,
) -> Result<TransferSummary, CopyError> {
    execute(request, params, TransferMode::Move).await
}

/// Synthesize the final target for already-resolved paths and run the
/// transfer between the two endpoints.
pub async fn transfer(
    source_endpoint: &dyn Endpoint,
    source: &PathDescriptor,
    target_endpoint: &dyn Endpoint,
    target: &TargetDescriptor,
    mode: TransferMode,
) -> Result<TransferSummary, CopyError> {
    let final_target = resolver::synthesize_target(source, target, target_endpoint.side())?;
    let executor = Executor::new(source_endpoint, target_endpoint, mode);

    if source.is_dir {
        executor.copy_dir(&source.path, &final_target).await
    } else {
        executor.copy_file(&source.path, &final_target).await
    }
}

async fn execute(
    request: &CopyRequest,
    params: &ConnectionParams,
    mode: TransferMode,
) -> Result<TransferSummary, CopyError> {
    tracing::debug!(
        "{:?} '{}' to '{}' ({}) on {}",
        mode,
        request.source,
        request.target,
        request.direction,
        params.endpoint()
    );

    let mut tracker = PhaseTracker::new();
    let result = run(request, params, mode, &mut tracker).await;

    match &result {
        Ok(summary) => {
            tracker.advance(Phase::Completed);
            tracing::info!(
                "Transferred {} file(s), {} dir(s), {} byte(s) from '{}' to '{}'",
                summary.files,
                summary.directories,
                summary.bytes,
                request.source,
                request.target
            );
        }
        Err(e) => {
            tracker.advance(Phase::Failed);
            tracing::debug!("Transfer failed: {}", e);
        }
    }

    result
}

async fn run(
    request: &CopyRequest,
    params: &ConnectionParams,
    mode: TransferMode,
    tracker: &mut PhaseTracker,
) -> Result<TransferSummary, CopyError> {
    let local = LocalEndpoint::new();

    tracker.advance(Phase::ResolvingLocalEndpoint);
    let local_side = match request.direction {
        Direction::Push => {
            LocalSide::Source(resolver::resolve_source(&local, &request.source).await?)
        }
        Direction::Pull => {
            LocalSide::Target(resolver::resolve_target(&local, &request.target).await?)
        }
    };

    tracker.advance(Phase::Connecting);
    let client = Client::connect(params)
        .await
        .map_err(|source| CopyError::Connection {
            address: params.endpoint(),
            source,
        })?;

    let sftp = match client.open_sftp().await {
        Ok(sftp) => sftp,
        Err(source) => {
            disconnect(&client).await;
            return Err(CopyError::Connection {
                address: params.endpoint(),
                source,
            });
        }
    };

    let result = {
        let remote = RemoteEndpoint::new(&sftp);
        run_remote(request, &local, local_side, &remote, mode, tracker).await
    };

    if let Err(e) = sftp.close().await {
        tracing::error!("Failed to close SFTP session: {}", e);
    }
    disconnect(&client).await;

    result
}

enum LocalSide {
    Source(PathDescriptor),
    Target(TargetDescriptor),
}

async fn run_remote(
    request: &CopyRequest,
    local: &LocalEndpoint,
    local_side: LocalSide,
    remote: &RemoteEndpoint<'_>,
    mode: TransferMode,
    tracker: &mut PhaseTracker,
) -> Result<TransferSummary, CopyError> {
    tracker.advance(Phase::ResolvingRemoteEndpoint);

    match local_side {
        LocalSide::Source(source) => {
            let target = resolver::resolve_target(remote, &request.target).await?;
            tracker.advance(Phase::Transferring);
            transfer(local, &source, remote, &target, mode).await
        }
        LocalSide::Target(target) => {
            let source = resolver::resolve_source(remote, &request.source).await?;
            tracker.advance(Phase::Transferring);
            transfer(remote, &source, local, &target, mode).await
        }
    }
}

async fn disconnect(client: &Client) {
    if let Err(e) = client.disconnect().await {
        tracing::error!("Failed to close SSH connection: {}", e);
    }
}
