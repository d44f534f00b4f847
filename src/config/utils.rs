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

//! Configuration utility functions.

use anyhow::{Context, Result};
use directories::BaseDirs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Expand a leading `~` in a host path to the current user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if path_str == "~" || path_str.starts_with("~/") {
            if let Some(dirs) = BaseDirs::new() {
                let rest = path_str.trim_start_matches('~').trim_start_matches('/');
                return dirs.home_dir().join(rest);
            }
        }
    }
    path.to_path_buf()
}

/// Parse a duration like `30s`, `2m` or `1m 30s`.
pub fn parse_timeout(value: &str) -> Result<Duration> {
    humantime::parse_duration(value.trim())
        .with_context(|| format!("Invalid timeout '{value}'. Use a duration such as '30s' or '2m'."))
}
