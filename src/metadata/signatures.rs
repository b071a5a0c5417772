//! Declared-type signatures.
//!
//! A [`TypeSig`] is the declared type of a field, property, parameter or return
//! slot: a recursive tagged union of wrapper shapes (pointer, by-ref, array,
//! pinned, modifier, generic instantiation, function pointer) around named leaf
//! references. The engine needs to see *through* these wrappers in several places
//! (dependency collection, usage discovery, path edges, type-match testing), so
//! the unwrap logic lives here once, as [`TypeSig::visit_named`], parameterized by
//! what to do with each leaf.

use std::fmt;

use crate::metadata::types::{CilType, CilTypeRef};

/// The declared type of a field, property, parameter, local or return slot.
///
/// Signatures are trees: wrappers recurse into their element type, generic
/// instantiations recurse into both the definition and every argument, and
/// function pointers recurse into a full [`MethodSig`]. Leaves are either a
/// named type reference or a generic parameter position.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeSig {
    /// A resolved-or-symbolic reference to a named type.
    Named(CilTypeRef),
    /// A generic parameter position (`T` / `!0` for types, `!!0` for methods).
    GenericParam {
        /// Index into the owner's generic parameter list.
        index: u32,
        /// `true` when the parameter belongs to a method rather than a type.
        method: bool,
    },
    /// An unmanaged pointer (`T*`).
    Pointer(Box<TypeSig>),
    /// A by-reference slot (`ref T` / `T&`).
    ByRef(Box<TypeSig>),
    /// A single-dimensional zero-based array (`T[]`).
    SzArray(Box<TypeSig>),
    /// A multi-dimensional array (`T[,]`).
    Array {
        /// Number of dimensions.
        rank: u32,
        /// Element type.
        element: Box<TypeSig>,
    },
    /// A pinned local slot.
    Pinned(Box<TypeSig>),
    /// A required or optional custom modifier wrapper.
    Modified {
        /// `true` for `modreq`, `false` for `modopt`.
        required: bool,
        /// The modifier type itself.
        modifier: CilTypeRef,
        /// The modified type.
        inner: Box<TypeSig>,
    },
    /// A generic instantiation (`List<int>`).
    GenericInst {
        /// The open generic definition.
        definition: Box<TypeSig>,
        /// The type arguments, in declaration order.
        args: Vec<TypeSig>,
    },
    /// A function pointer with a full method signature.
    FnPtr(Box<MethodSig>),
}

impl TypeSig {
    /// Creates a leaf signature naming a type that is not (or not yet) resolved
    /// to a loaded definition.
    #[must_use]
    pub fn named(full_name: &str) -> Self {
        TypeSig::Named(CilTypeRef::named(full_name))
    }

    /// Creates a leaf signature pointing at a loaded type definition.
    #[must_use]
    pub fn of(ty: &std::sync::Arc<CilType>) -> Self {
        TypeSig::Named(CilTypeRef::to(ty))
    }

    /// Invokes `visit` for every named leaf reference in this signature.
    ///
    /// Wrappers (pointer, by-ref, arrays, pinned, modifiers) are peeled, generic
    /// instantiations contribute both their definition and every argument, and
    /// function pointers contribute their return and parameter types. Generic
    /// parameter positions have no name and are skipped. Modifier types
    /// themselves are *not* reported; only the modified type is.
    pub fn visit_named<F: FnMut(&CilTypeRef)>(&self, visit: &mut F) {
        match self {
            TypeSig::Named(type_ref) => visit(type_ref),
            TypeSig::GenericParam { .. } => {}
            TypeSig::Pointer(inner)
            | TypeSig::ByRef(inner)
            | TypeSig::SzArray(inner)
            | TypeSig::Pinned(inner) => inner.visit_named(visit),
            TypeSig::Array { element, .. } => element.visit_named(visit),
            TypeSig::Modified { inner, .. } => inner.visit_named(visit),
            TypeSig::GenericInst { definition, args } => {
                definition.visit_named(visit);
                for arg in args {
                    arg.visit_named(visit);
                }
            }
            TypeSig::FnPtr(sig) => {
                sig.return_type.visit_named(visit);
                for param in &sig.params {
                    param.visit_named(visit);
                }
            }
        }
    }

    /// Returns `true` if any named leaf of this signature refers to `target`.
    ///
    /// Resolution is tried first (definition identity); unresolved symbolic
    /// references fall back to full-name comparison.
    #[must_use]
    pub fn references(&self, target: &CilType) -> bool {
        let mut hit = false;
        self.visit_named(&mut |type_ref| {
            if type_ref.refers_to(target) {
                hit = true;
            }
        });
        hit
    }

    /// Renders the signature as a display name, e.g. `System.Int32*` or
    /// `System.Collections.Generic.List`1<System.String>`.
    #[must_use]
    pub fn full_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TypeSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSig::Named(type_ref) => write!(f, "{}", type_ref.full_name()),
            TypeSig::GenericParam { index, method } => {
                if *method {
                    write!(f, "!!{index}")
                } else {
                    write!(f, "!{index}")
                }
            }
            TypeSig::Pointer(inner) => write!(f, "{inner}*"),
            TypeSig::ByRef(inner) => write!(f, "{inner}&"),
            TypeSig::SzArray(inner) => write!(f, "{inner}[]"),
            TypeSig::Array { rank, element } => {
                write!(f, "{element}[")?;
                for _ in 1..*rank {
                    write!(f, ",")?;
                }
                write!(f, "]")
            }
            TypeSig::Pinned(inner) => write!(f, "{inner} pinned"),
            TypeSig::Modified { inner, .. } => write!(f, "{inner}"),
            TypeSig::GenericInst { definition, args } => {
                write!(f, "{definition}<")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ">")
            }
            TypeSig::FnPtr(sig) => {
                write!(f, "method {}(", sig.return_type)?;
                for (i, param) in sig.params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{param}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// A method signature: return type, parameter types and generic arity.
///
/// Two signatures are structurally equal when their shapes match leaf-for-leaf;
/// leaf comparison is by full name, so an unresolved symbolic reference equals a
/// resolved definition with the same name. This is the equality used by override
/// and implementation resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSig {
    /// Declared return type.
    pub return_type: TypeSig,
    /// Declared parameter types, in order, excluding the implicit `this`.
    pub params: Vec<TypeSig>,
    /// Number of generic parameters the method declares.
    pub generic_arity: u32,
}

impl MethodSig {
    /// Creates a signature with the given return and parameter types.
    #[must_use]
    pub fn new(return_type: TypeSig, params: Vec<TypeSig>) -> Self {
        MethodSig {
            return_type,
            params,
            generic_arity: 0,
        }
    }
}

impl fmt::Display for MethodSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.return_type)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{param}")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visit_named_peels_wrappers() {
        let sig = TypeSig::SzArray(Box::new(TypeSig::Pointer(Box::new(TypeSig::named(
            "Game.World",
        )))));
        let mut names = Vec::new();
        sig.visit_named(&mut |r| names.push(r.full_name().to_string()));
        assert_eq!(names, vec!["Game.World"]);
    }

    #[test]
    fn test_visit_named_generic_instantiation() {
        let sig = TypeSig::GenericInst {
            definition: Box::new(TypeSig::named("System.Collections.Generic.List`1")),
            args: vec![TypeSig::named("Game.Item")],
        };
        let mut names = Vec::new();
        sig.visit_named(&mut |r| names.push(r.full_name().to_string()));
        assert_eq!(
            names,
            vec!["System.Collections.Generic.List`1", "Game.Item"]
        );
    }

    #[test]
    fn test_visit_named_fnptr() {
        let sig = TypeSig::FnPtr(Box::new(MethodSig::new(
            TypeSig::named("System.Void"),
            vec![TypeSig::named("System.Int32")],
        )));
        let mut names = Vec::new();
        sig.visit_named(&mut |r| names.push(r.full_name().to_string()));
        assert_eq!(names, vec!["System.Void", "System.Int32"]);
    }

    #[test]
    fn test_structural_equality_by_name() {
        let a = MethodSig::new(
            TypeSig::named("System.Void"),
            vec![TypeSig::named("System.Int32")],
        );
        let b = MethodSig::new(
            TypeSig::named("System.Void"),
            vec![TypeSig::named("System.Int32")],
        );
        let c = MethodSig::new(
            TypeSig::named("System.Void"),
            vec![TypeSig::named("System.Int64")],
        );
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_display_rendering() {
        assert_eq!(TypeSig::named("System.Int32").to_string(), "System.Int32");
        assert_eq!(
            TypeSig::SzArray(Box::new(TypeSig::named("System.Byte"))).to_string(),
            "System.Byte[]"
        );
        assert_eq!(
            TypeSig::Array {
                rank: 2,
                element: Box::new(TypeSig::named("System.Int32")),
            }
            .to_string(),
            "System.Int32[,]"
        );
        assert_eq!(
            TypeSig::GenericParam {
                index: 0,
                method: true
            }
            .to_string(),
            "!!0"
        );
    }
}
