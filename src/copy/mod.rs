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

//! The copy engine.
//!
//! [`copy_path`] and [`move_path`] resolve both sides of a [`CopyRequest`],
//! pick the final target like `cp` does and transfer a single file or a
//! whole tree between the host and a node. The same engine runs over any
//! pair of [`Endpoint`]s through [`transfer`].

mod endpoint;
mod error;
mod executor;
mod local;
mod orchestrator;
pub mod paths;
mod remote;
mod resolver;

pub use endpoint::{
    BoxedReader, BoxedWalk, BoxedWriter, Endpoint, EntryKind, Side, TreeWalk, WalkEntry,
};
pub use error::{CopyError, Operation};
pub use executor::{Executor, TransferMode, TransferSummary};
pub use local::LocalEndpoint;
pub use orchestrator::{copy_path, move_path, transfer, CopyRequest, Direction, Phase};
pub use remote::{HomeKind, RemoteEndpoint, RemoteHome};
pub use resolver::{
    normalize, resolve_source, resolve_target, synthesize_target, PathDescriptor,
    TargetDescriptor,
};
