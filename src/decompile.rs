//! The decompiler collaborator interface.
//!
//! Decompilation itself is out of scope: the engine resolves a definition and
//! forwards it, passing the produced text through unmodified. Hosts plug in an
//! implementation; without one, the decompile operations report an internal
//! error.

use crate::metadata::{
    members::{EventRc, FieldRc, MethodRc, PropertyRc},
    types::CilTypeRc,
};
use crate::Result;

/// A resolved definition handed to the decompiler.
pub enum DecompileTarget {
    /// A method definition.
    Method(MethodRc),
    /// A field definition.
    Field(FieldRc),
    /// A property definition.
    Property(PropertyRc),
    /// An event definition.
    Event(EventRc),
    /// A type definition.
    Type(CilTypeRc),
}

/// Produces source text for resolved definitions in some display language.
pub trait Decompiler: Send + Sync {
    /// The display language name reported alongside decompiled text.
    fn language(&self) -> &str;

    /// Decompiles one resolved definition to source text.
    ///
    /// # Errors
    ///
    /// Implementations report failures as
    /// [`Error::Internal`](crate::Error::Internal); the dispatcher converts
    /// them into error responses.
    fn decompile(&self, target: &DecompileTarget) -> Result<String>;
}
