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

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::ConnectionOverrides;
use crate::copy::{CopyRequest, Direction};

#[derive(Parser, Debug)]
#[command(
    name = "nodecp",
    version,
    about = "Copy files and folders between this host and a cluster node over SSH/SFTP",
    long_about = "nodecp copies or moves files and directories between the local host and a remote node.\nSource and target follow cp semantics: copying onto an existing directory places the\nsource inside it, otherwise the target path is used as the new name.\nA leading '~' refers to the home directory of the respective side.",
    after_help = "EXAMPLES:\n  Copy a file into the node's home:   nodecp -i 172.19.1.100 -s /tmp/report.txt -t '~/'\n  Fetch a folder from the node:       nodecp -i 172.19.1.100 -s build/ -t ./out/ -r\n  Move a file to the node:            nodecp -i 172.19.1.100 -s logs.txt -t archive/logs.txt --move"
)]
pub struct Cli {
    #[arg(short = 'i', long = "ip-addr", help = "IP address or hostname of the node")]
    pub ip_addr: String,

    #[arg(short = 's', long, help = "Path to the source file or folder")]
    pub source: String,

    #[arg(short = 't', long, help = "Path to the target file or folder")]
    pub target: String,

    #[arg(
        short = 'r',
        long,
        help = "Copy from the node to this host instead of from this host to the node"
    )]
    pub reverse: bool,

    #[arg(
        short = 'u',
        long,
        help = "Remote user name [default: remote, or the config file's user]"
    )]
    pub username: Option<String>,

    #[arg(short = 'p', long, help = "SSH port of the node [default: 22]")]
    pub port: Option<u16>,

    #[arg(
        long,
        value_parser = humantime::parse_duration,
        help = "Connection timeout, e.g. '30s' or '1m' [default: 30s]"
    )]
    pub timeout: Option<Duration>,

    #[arg(
        short = 'k',
        long,
        help = "SSH private key file path [default: ~/.ssh/id_rsa]"
    )]
    pub identity: Option<PathBuf>,

    #[arg(long = "move", help = "Delete the source after it was copied successfully")]
    pub move_source: bool,

    #[arg(
        long,
        help = "Verify the node's host key against this known_hosts file"
    )]
    pub known_hosts: Option<PathBuf>,

    #[arg(
        long,
        help = "Verify the node's host key against ~/.ssh/known_hosts"
    )]
    pub strict_host_key_checking: bool,

    #[arg(
        long,
        help = "Configuration file path [default: <config dir>/nodecp/config.yaml]"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        short = 'v',
        long,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,
}

impl Cli {
    pub fn direction(&self) -> Direction {
        if self.reverse {
            Direction::Pull
        } else {
            Direction::Push
        }
    }

    pub fn copy_request(&self) -> CopyRequest {
        CopyRequest {
            source: self.source.clone(),
            target: self.target.clone(),
            direction: self.direction(),
        }
    }

    pub fn connection_overrides(&self) -> ConnectionOverrides {
        ConnectionOverrides {
            user: self.username.clone(),
            port: self.port,
            ssh_key: self.identity.clone(),
            timeout: self.timeout,
            known_hosts: self.known_hosts.clone(),
            strict_host_key_checking: self.strict_host_key_checking,
        }
    }
}
