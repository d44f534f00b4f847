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

//! Secure session provider.
//!
//! An asynchronous SSH client for the tokio runtime, powered by russh, that
//! authenticates with a private key and hands out SFTP sub-sessions.

pub mod authentication;
pub mod connection;
pub mod error;

pub use authentication::{AuthMethod, ServerCheckMethod};
pub use connection::{
    Client, ClientHandler, ConnectionParams, DEFAULT_CONNECT_TIMEOUT, DEFAULT_PORT,
};
pub use error::Error;
