//! Convenient re-exports of the most commonly used types.
//!
//! ```rust
//! use cilquery::prelude::*;
//!
//! let workspace = std::sync::Arc::new(Workspace::new());
//! let dispatcher = Dispatcher::new(workspace);
//! assert!(dispatcher.method_names().contains(&"search"));
//! ```

pub use crate::analysis::collector::{SearchCollector, DEFAULT_MAX_RESULTS};
pub use crate::analysis::pattern::PatternMatcher;
pub use crate::analysis::search::SearchKind;
pub use crate::analysis::text::TermMatcher;
pub use crate::decompile::{DecompileTarget, Decompiler};
pub use crate::metadata::body::{Instruction, MethodBody, OpCode, Operand};
pub use crate::metadata::builder::{
    EventBuilder, FieldBuilder, MethodBuilder, ModuleBuilder, PropertyBuilder, TypeBuilder,
};
pub use crate::metadata::members::{
    Event, Field, FieldFlags, MemberLink, Method, MethodFlags, Property,
};
pub use crate::metadata::module::{CilDef, CilModule, ModuleRc};
pub use crate::metadata::signatures::{MethodSig, TypeSig};
pub use crate::metadata::token::Token;
pub use crate::metadata::types::{CilType, CilTypeRc, CilTypeRef, CustomAttribute, TypeFlags};
pub use crate::metadata::workspace::Workspace;
pub use crate::rpc::dispatch::Dispatcher;
pub use crate::rpc::executor::QueryExecutor;
pub use crate::{Error, Result};
