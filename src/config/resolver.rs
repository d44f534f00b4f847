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

//! Merging command-line flags with configured defaults.

use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;

use super::types::Config;
use super::utils::{expand_tilde, parse_timeout};
use crate::ssh::{ConnectionParams, ServerCheckMethod, DEFAULT_CONNECT_TIMEOUT, DEFAULT_PORT};

/// User the nodes are provisioned with.
pub const DEFAULT_USER: &str = "remote";

/// Private key used when neither the command line nor the config names one.
pub const DEFAULT_KEY_FILE: &str = "~/.ssh/id_rsa";

/// Values given on the command line; each one beats the config file.
#[derive(Debug, Clone, Default)]
pub struct ConnectionOverrides {
    pub user: Option<String>,
    pub port: Option<u16>,
    pub ssh_key: Option<PathBuf>,
    pub timeout: Option<Duration>,
    pub known_hosts: Option<PathBuf>,
    pub strict_host_key_checking: bool,
}

impl Config {
    /// Build the connection parameters for `address`.
    pub fn connection_params(
        &self,
        address: &str,
        overrides: &ConnectionOverrides,
    ) -> Result<ConnectionParams> {
        let user = overrides
            .user
            .clone()
            .or_else(|| self.defaults.user.clone())
            .unwrap_or_else(|| DEFAULT_USER.to_string());

        let port = overrides
            .port
            .or(self.defaults.port)
            .unwrap_or(DEFAULT_PORT);

        let key_file = overrides
            .ssh_key
            .clone()
            .or_else(|| self.defaults.ssh_key.as_ref().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_KEY_FILE));

        let timeout = match overrides.timeout {
            Some(timeout) => timeout,
            None => match &self.defaults.timeout {
                Some(value) => parse_timeout(value)?,
                None => DEFAULT_CONNECT_TIMEOUT,
            },
        };

        Ok(ConnectionParams::new(address, user, expand_tilde(&key_file))
            .with_port(port)
            .with_timeout(timeout)
            .with_server_check(self.server_check(overrides)))
    }

    /// Host keys are only verified when asked to; nodes live on a private
    /// network and are re-created with fresh keys.
    fn server_check(&self, overrides: &ConnectionOverrides) -> ServerCheckMethod {
        let known_hosts = overrides
            .known_hosts
            .clone()
            .or_else(|| self.defaults.known_hosts.as_ref().map(PathBuf::from));

        if let Some(path) = known_hosts {
            return ServerCheckMethod::with_known_hosts_file(expand_tilde(&path));
        }

        let strict = overrides.strict_host_key_checking
            || self.defaults.strict_host_key_checking.unwrap_or(false);
        if strict {
            ServerCheckMethod::DefaultKnownHostsFile
        } else {
            ServerCheckMethod::NoCheck
        }
    }
}

