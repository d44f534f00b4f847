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

//! Path resolution and `cp`-like target synthesis.
//!
//! Resolution is the same for both sides of a transfer: user input is put
//! into the endpoint's separator convention, a leading `~` is replaced with
//! the endpoint's home directory, the result is cleaned lexically and then
//! checked against the endpoint's filesystem.

use super::endpoint::{Endpoint, EntryKind, Side};
use super::error::{CopyError, Operation};
use super::paths;

/// A resolved source path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathDescriptor {
    pub path: String,
    pub is_dir: bool,
}

/// A resolved target path, which may not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDescriptor {
    pub path: String,
    pub is_dir: bool,
    pub exists: bool,
}

/// Bring raw user input into the canonical, cleaned form for `endpoint`.
pub async fn normalize<E>(endpoint: &E, raw: &str) -> Result<String, CopyError>
where
    E: Endpoint + ?Sized,
{
    let canonical = endpoint.canonical_separators(raw);

    let expanded = if canonical.starts_with('~') {
        let home = endpoint.home_dir().await.map_err(|e| {
            CopyError::transfer(Operation::ResolveHome, endpoint.side(), raw, e)
        })?;
        paths::expand_tilde(&canonical, &home)
    } else {
        canonical
    };

    Ok(paths::clean(&expanded))
}

/// Resolve a source path; it must exist.
pub async fn resolve_source<E>(endpoint: &E, raw: &str) -> Result<PathDescriptor, CopyError>
where
    E: Endpoint + ?Sized,
{
    let path = normalize(endpoint, raw).await?;
    let side = endpoint.side();

    match stat(endpoint, &path).await? {
        Some(kind) => {
            tracing::debug!("Resolved {} source '{}' ({:?})", side, path, kind);
            Ok(PathDescriptor {
                path,
                is_dir: kind.is_dir(),
            })
        }
        None => Err(CopyError::NotFound { side, path }),
    }
}

/// Resolve a target path.
///
/// An existing target is returned with its kind. A missing target is only
/// accepted when its parent directory exists.
pub async fn resolve_target<E>(endpoint: &E, raw: &str) -> Result<TargetDescriptor, CopyError>
where
    E: Endpoint + ?Sized,
{
    let path = normalize(endpoint, raw).await?;
    let side = endpoint.side();

    if let Some(kind) = stat(endpoint, &path).await? {
        tracing::debug!("Resolved existing {} target '{}' ({:?})", side, path, kind);
        return Ok(TargetDescriptor {
            path,
            is_dir: kind.is_dir(),
            exists: true,
        });
    }

    let parent = paths::parent(&path);
    match stat(endpoint, &parent).await? {
        Some(EntryKind::Directory) => {
            tracing::debug!("Resolved new {} target '{}'", side, path);
            Ok(TargetDescriptor {
                path,
                is_dir: false,
                exists: false,
            })
        }
        _ => Err(CopyError::InvalidTarget { side, path, parent }),
    }
}

/// Pick the final destination path the way `cp` would.
///
/// | source | target                | result                       |
/// |--------|-----------------------|------------------------------|
/// | dir    | existing dir          | `target/basename(source)`    |
/// | dir    | existing file         | [`CopyError::TargetIsFile`]  |
/// | dir    | missing               | `target`                     |
/// | file   | existing dir          | `target/basename(source)`    |
/// | file   | existing file/missing | `target`                     |
pub fn synthesize_target(
    source: &PathDescriptor,
    target: &TargetDescriptor,
    target_side: Side,
) -> Result<String, CopyError> {
    if target.exists && target.is_dir {
        return Ok(paths::join(&target.path, paths::base_name(&source.path)));
    }

    if source.is_dir && target.exists {
        return Err(CopyError::TargetIsFile {
            side: target_side,
            path: target.path.clone(),
        });
    }

    Ok(target.path.clone())
}

async fn stat<E>(endpoint: &E, path: &str) -> Result<Option<EntryKind>, CopyError>
where
    E: Endpoint + ?Sized,
{
    endpoint
        .stat(path)
        .await
        .map_err(|e| CopyError::transfer(Operation::Stat, endpoint.side(), path, e))
}
