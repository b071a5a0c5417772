//! The read-only metadata view model.
//!
//! Everything in this module is owned by the external loader: the engine
//! observes modules, types, members and instruction streams but never mutates
//! them, parses nothing, and manages no lifetimes. The [`workspace::Workspace`]
//! is the hand-off point - the loader keeps it current, the engine snapshots it
//! at the start of each query.
//!
//! # Key Types
//!
//! - [`workspace::Workspace`] - the loaded-module collection
//! - [`module::CilModule`] - one loaded binary with its types and token map
//! - [`types::CilType`] - one type definition
//! - [`members::Method`] / [`members::Field`] / [`members::Property`] /
//!   [`members::Event`] - member definitions
//! - [`signatures::TypeSig`] - declared-type signatures with recursive wrappers
//! - [`body::MethodBody`] - decoded instruction streams
//! - [`builder::ModuleBuilder`] / [`builder::TypeBuilder`] - the construction
//!   surface used by loaders and tests

pub mod body;
pub mod builder;
pub mod members;
pub mod module;
pub mod signatures;
pub mod token;
pub mod types;
pub mod workspace;
