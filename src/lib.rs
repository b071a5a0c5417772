// Copyright 2025 Johann Kempter
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
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]

//! # cilquery
//!
//! A read-only code-intelligence query engine for collections of loaded .NET
//! assemblies. `cilquery` answers structural questions - "find all types
//! matching X", "who calls method M", "what derives from type T", "is there a
//! path from type A to type B", "what attributes decorate members matching
//! pattern P" - over an already-parsed metadata model that an external loader
//! owns and keeps current.
//!
//! ## What this crate is not
//!
//! It parses no binary formats, implements no decompiler, manages no module
//! lifetimes and persists nothing. The [`metadata`] module is a *view* the
//! host constructs; the [`decompile::Decompiler`] trait is a collaborator the
//! host plugs in; transports are entirely external.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use cilquery::metadata::builder::{ModuleBuilder, TypeBuilder};
//! use cilquery::metadata::workspace::Workspace;
//! use cilquery::rpc::dispatch::Dispatcher;
//! use serde_json::json;
//!
//! let workspace = Arc::new(Workspace::new());
//! let module = ModuleBuilder::new(
//!     "app.dll",
//!     uguid::guid!("01234567-89ab-cdef-0123-456789abcdef"),
//! )
//! .build();
//! TypeBuilder::new(0x0200_0001, "Program", "App").register(&module);
//! workspace.insert(module);
//!
//! let dispatcher = Dispatcher::new(workspace);
//! let response = dispatcher
//!     .handle_value(json!({
//!         "id": 1,
//!         "method": "listTypes",
//!         "params": {
//!             "moduleMvid": "01234567-89ab-cdef-0123-456789abcdef",
//!             "namespace": "App",
//!         },
//!     }))
//!     .unwrap();
//! assert_eq!(response["result"][0]["fullName"], "App.Program");
//! ```
//!
//! ## Architecture
//!
//! - [`metadata`] - the externally-owned view model: modules, types, members,
//!   signatures, instruction streams, and the builders that assemble them
//! - [`analysis`] - the engine: pattern and text matchers, per-query indices,
//!   the bounded/deduplicated result collector, BFS traversals, override
//!   resolution and usage discovery
//! - [`rpc`] - the envelope, the handler registry and the serialized
//!   execution context
//! - [`decompile`] - the decompiler collaborator interface
//!
//! Every query runs to completion inside one serialized execution context
//! ([`rpc::executor::QueryExecutor`]); indices are rebuilt per query from a
//! workspace snapshot and nothing is cached between queries.

#[macro_use]
pub(crate) mod error;

pub mod analysis;
pub mod decompile;
pub mod metadata;
pub mod prelude;
pub mod rpc;

pub use error::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
