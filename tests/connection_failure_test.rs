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

//! Requests that are invalid on the host side must fail before any
//! connection attempt; everything else must surface connection failures.

use nodecp::copy::{copy_path, move_path, CopyError, CopyRequest, Side};
use nodecp::ssh::ConnectionParams;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

/// Nothing listens on port 1, so any connection attempt is refused.
fn unreachable_node() -> ConnectionParams {
    ConnectionParams::new("127.0.0.1", "remote", "/nonexistent/id_rsa")
        .with_port(1)
        .with_timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn test_missing_local_source_fails_before_connecting() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("report.txt");
    let request = CopyRequest::push(missing.to_string_lossy(), "~/");

    let err = copy_path(&request, &unreachable_node()).await.unwrap_err();

    assert!(matches!(
        err,
        CopyError::NotFound {
            side: Side::Local,
            ..
        }
    ));
}

#[tokio::test]
async fn test_missing_local_target_parent_fails_before_connecting() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("no").join("such").join("dir");
    let request = CopyRequest::pull("build/", target.to_string_lossy());

    let err = move_path(&request, &unreachable_node()).await.unwrap_err();

    assert!(matches!(
        err,
        CopyError::InvalidTarget {
            side: Side::Local,
            ..
        }
    ));
}

#[tokio::test]
async fn test_unreachable_node_is_a_connection_error() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("report.txt");
    fs::write(&source, b"r").unwrap();
    let request = CopyRequest::push(source.to_string_lossy(), "~/");

    let err = move_path(&request, &unreachable_node()).await.unwrap_err();

    match err {
        CopyError::Connection { address, .. } => assert_eq!(address, "127.0.0.1:1"),
        other => panic!("unexpected error: {other}"),
    }
    // A failed move never deletes its source.
    assert!(source.exists());
}
