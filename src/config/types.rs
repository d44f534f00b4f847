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

//! Configuration type definitions.

use serde::{Deserialize, Serialize};

/// Main configuration structure.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,
}

/// Connection defaults applied when the matching flag is not given.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Defaults {
    /// Remote user name.
    pub user: Option<String>,
    pub port: Option<u16>,
    /// Private key used for public-key authentication.
    pub ssh_key: Option<String>,
    /// Connect timeout as a human-readable duration such as `30s` or `1m`.
    pub timeout: Option<String>,
    /// known_hosts file used when host keys are checked.
    pub known_hosts: Option<String>,
    #[serde(default)]
    pub strict_host_key_checking: Option<bool>,
}
