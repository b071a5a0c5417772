//! Type definitions and type references.
//!
//! [`CilType`] is the read-only view of one type definition inside a loaded
//! module. Types refer to other types through [`CilTypeRef`], a weak,
//! name-carrying reference: cross-module and framework references frequently
//! cannot be resolved to a loaded definition, in which case the reference keeps
//! working symbolically through its full name. This mirrors how the rest of the
//! engine compares types - definition identity first, full name as the fallback.

use std::fmt;
use std::sync::{Arc, Weak};

use bitflags::bitflags;

use crate::metadata::{
    members::{EventRc, FieldRc, MethodRc, PropertyRc},
    module::{CilModule, ModuleRc},
    token::Token,
};

/// Reference counted pointer to a [`CilType`].
pub type CilTypeRc = Arc<CilType>;

bitflags! {
    /// Classification flags for a type definition.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TypeFlags: u32 {
        /// Type is visible outside its assembly (including nested-public).
        const PUBLIC = 0x0001;
        /// Type is nested inside another type.
        const NESTED = 0x0002;
        /// Type is abstract.
        const ABSTRACT = 0x0004;
        /// Type is sealed.
        const SEALED = 0x0008;
        /// Type is an interface.
        const INTERFACE = 0x0010;
        /// Type is a value type.
        const VALUE_TYPE = 0x0020;
        /// Type is an enum.
        const ENUM = 0x0040;
        /// Type is a delegate.
        const DELEGATE = 0x0080;
        /// Fields are laid out at explicit offsets.
        const EXPLICIT_LAYOUT = 0x0100;
        /// Fields are laid out sequentially.
        const SEQUENTIAL_LAYOUT = 0x0200;
    }
}

/// Explicit size/packing information attached to a type definition.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeLayout {
    /// Field packing alignment in bytes, 0 when unspecified.
    pub packing_size: u16,
    /// Total size of the type in bytes, 0 when unspecified.
    pub class_size: u32,
}

/// A generic parameter declared by a type or method.
#[derive(Debug, Clone)]
pub struct GenericParam {
    /// Parameter name (e.g. `T`).
    pub name: String,
    /// Position in the declaring entity's generic parameter list.
    pub index: u32,
    /// Declared constraints (`where T : ...`).
    pub constraints: Vec<CilTypeRef>,
}

/// A constant value: a field constant, a parameter default, or a custom
/// attribute argument.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    /// The null constant.
    Null,
    /// A boolean constant.
    Bool(bool),
    /// A character constant.
    Char(char),
    /// A signed integer constant (i8 through i64 are widened).
    Int(i64),
    /// An unsigned integer constant.
    UInt(u64),
    /// A floating point constant.
    Float(f64),
    /// A string constant.
    String(String),
}

impl ConstantValue {
    /// Converts the constant to its JSON representation.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ConstantValue::Null => serde_json::Value::Null,
            ConstantValue::Bool(v) => serde_json::Value::from(*v),
            ConstantValue::Char(v) => serde_json::Value::from(v.to_string()),
            ConstantValue::Int(v) => serde_json::Value::from(*v),
            ConstantValue::UInt(v) => serde_json::Value::from(*v),
            ConstantValue::Float(v) => serde_json::Value::from(*v),
            ConstantValue::String(v) => serde_json::Value::from(v.clone()),
        }
    }
}

impl fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstantValue::Null => write!(f, ""),
            ConstantValue::Bool(v) => write!(f, "{v}"),
            ConstantValue::Char(v) => write!(f, "{v}"),
            ConstantValue::Int(v) => write!(f, "{v}"),
            ConstantValue::UInt(v) => write!(f, "{v}"),
            ConstantValue::Float(v) => write!(f, "{v}"),
            ConstantValue::String(v) => write!(f, "{v}"),
        }
    }
}

/// A custom attribute application on a type, member, parameter, module or
/// assembly.
#[derive(Debug, Clone)]
pub struct CustomAttribute {
    /// The attribute type.
    pub attribute_type: CilTypeRef,
    /// Positional constructor arguments.
    pub constructor_args: Vec<ConstantValue>,
    /// Named arguments as `(name, value)` pairs.
    pub named_args: Vec<(String, ConstantValue)>,
}

impl CustomAttribute {
    /// Creates an attribute application with no arguments.
    #[must_use]
    pub fn new(attribute_type: CilTypeRef) -> Self {
        CustomAttribute {
            attribute_type,
            constructor_args: Vec::new(),
            named_args: Vec::new(),
        }
    }
}

/// A weak, name-carrying reference to a type.
///
/// References created from a loaded definition resolve back to it for as long as
/// the owning module stays loaded; references created from a symbolic name only
/// (imports from modules that are not loaded) never resolve but still compare
/// and render through their full name.
#[derive(Clone)]
pub struct CilTypeRef {
    full_name: String,
    target: Weak<CilType>,
}

impl CilTypeRef {
    /// Creates a reference to a loaded type definition.
    #[must_use]
    pub fn to(ty: &CilTypeRc) -> Self {
        CilTypeRef {
            full_name: ty.full_name.clone(),
            target: Arc::downgrade(ty),
        }
    }

    /// Creates a symbolic reference that carries only a full name.
    #[must_use]
    pub fn named(full_name: &str) -> Self {
        CilTypeRef {
            full_name: full_name.to_string(),
            target: Weak::new(),
        }
    }

    /// Returns the referenced definition if it is still loaded.
    #[must_use]
    pub fn resolve(&self) -> Option<CilTypeRc> {
        self.target.upgrade()
    }

    /// Returns the full name this reference was created with.
    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Returns the token of the referenced definition, if resolvable.
    #[must_use]
    pub fn token(&self) -> Option<Token> {
        self.resolve().map(|t| t.token)
    }

    /// Returns `true` if this reference designates `target` - by definition
    /// identity when resolvable, by full name otherwise.
    #[must_use]
    pub fn refers_to(&self, target: &CilType) -> bool {
        if let Some(resolved) = self.resolve() {
            std::ptr::eq(Arc::as_ptr(&resolved), target as *const CilType)
                || resolved.full_name == target.full_name
        } else {
            self.full_name == target.full_name
        }
    }
}

impl PartialEq for CilTypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.full_name == other.full_name
    }
}

impl fmt::Debug for CilTypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CilTypeRef")
            .field("full_name", &self.full_name)
            .field("resolved", &(self.target.strong_count() > 0))
            .finish()
    }
}

/// A read-only view of one type definition.
///
/// Owned by its module; members hold weak back-references to it, so dropping a
/// module releases the whole subtree. All fields are frozen once the loader has
/// registered the type - the engine never mutates them.
#[derive(Debug)]
pub struct CilType {
    /// Metadata token, unique within the owning module.
    pub token: Token,
    /// Simple name without namespace.
    pub name: String,
    /// Namespace; empty string for the global namespace.
    pub namespace: String,
    /// Namespace-qualified, nesting-qualified name. Unique within a module,
    /// not guaranteed unique across modules.
    pub full_name: String,
    /// Classification flags.
    pub flags: TypeFlags,
    /// Base type, if any (`None` for `System.Object` and interfaces).
    pub base: Option<CilTypeRef>,
    /// Implemented interfaces.
    pub interfaces: Vec<CilTypeRef>,
    /// Generic parameters with their constraints.
    pub generic_params: Vec<GenericParam>,
    /// Methods declared by this type.
    pub methods: boxcar::Vec<MethodRc>,
    /// Fields declared by this type.
    pub fields: boxcar::Vec<FieldRc>,
    /// Properties declared by this type.
    pub properties: boxcar::Vec<PropertyRc>,
    /// Events declared by this type.
    pub events: boxcar::Vec<EventRc>,
    /// Nested types, as weak references.
    pub nested_types: boxcar::Vec<CilTypeRef>,
    /// Custom attributes applied to this type.
    pub attributes: Vec<CustomAttribute>,
    /// Explicit layout information, if declared.
    pub layout: Option<TypeLayout>,
    pub(crate) module: Weak<CilModule>,
}

impl CilType {
    /// Returns the owning module if it is still loaded.
    #[must_use]
    pub fn module(&self) -> Option<ModuleRc> {
        self.module.upgrade()
    }

    /// Returns the owning module's MVID as a display string, or the empty
    /// string if the module is gone.
    #[must_use]
    pub fn mvid_text(&self) -> String {
        self.module()
            .map(|m| m.mvid.to_string())
            .unwrap_or_default()
    }

    /// Returns `true` for enum definitions.
    #[must_use]
    pub fn is_enum(&self) -> bool {
        self.flags.contains(TypeFlags::ENUM)
    }

    /// Returns `true` for interface definitions.
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.flags.contains(TypeFlags::INTERFACE)
    }

    /// Returns `true` for value types (including enums).
    #[must_use]
    pub fn is_value_type(&self) -> bool {
        self.flags.contains(TypeFlags::VALUE_TYPE) || self.is_enum()
    }

    /// Returns `true` for delegates.
    #[must_use]
    pub fn is_delegate(&self) -> bool {
        self.flags.contains(TypeFlags::DELEGATE)
    }

    /// Returns `true` for classes (reference types that are neither interfaces
    /// nor value types).
    #[must_use]
    pub fn is_class(&self) -> bool {
        !self.is_interface() && !self.is_value_type()
    }

    /// Returns `true` for abstract types.
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.flags.contains(TypeFlags::ABSTRACT)
    }

    /// Returns `true` for sealed types.
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.flags.contains(TypeFlags::SEALED)
    }

    /// Returns `true` for nested types.
    #[must_use]
    pub fn is_nested(&self) -> bool {
        self.flags.contains(TypeFlags::NESTED)
    }

    /// Returns `true` for static types (abstract and sealed).
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.is_abstract() && self.is_sealed()
    }

    /// Returns `true` for generic type definitions.
    #[must_use]
    pub fn is_generic(&self) -> bool {
        !self.generic_params.is_empty()
    }

    /// Returns the kind tag used in result records: `enum`, `interface`,
    /// `struct`, `delegate` or `class`.
    #[must_use]
    pub fn type_kind(&self) -> &'static str {
        if self.is_enum() {
            "enum"
        } else if self.is_interface() {
            "interface"
        } else if self.is_value_type() {
            "struct"
        } else if self.is_delegate() {
            "delegate"
        } else {
            "class"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::builder::ModuleBuilder;
    use uguid::guid;

    #[test]
    fn test_type_ref_symbolic() {
        let r = CilTypeRef::named("System.IDisposable");
        assert_eq!(r.full_name(), "System.IDisposable");
        assert!(r.resolve().is_none());
        assert!(r.token().is_none());
    }

    #[test]
    fn test_type_ref_resolved_and_refers_to() {
        let module = ModuleBuilder::new("lib.dll", guid!("11111111-2222-3333-4444-555555555555"))
            .build();
        let ty = crate::metadata::builder::TypeBuilder::new(0x0200_0001, "Thing", "Game")
            .register(&module);

        let r = CilTypeRef::to(&ty);
        assert_eq!(r.full_name(), "Game.Thing");
        assert!(r.refers_to(&ty));
        assert_eq!(r.token(), Some(crate::metadata::token::Token::new(0x0200_0001)));

        // A symbolic reference with the same name also designates the type.
        let symbolic = CilTypeRef::named("Game.Thing");
        assert!(symbolic.refers_to(&ty));
    }

    #[test]
    fn test_type_kind_tags() {
        let module = ModuleBuilder::new("lib.dll", guid!("11111111-2222-3333-4444-555555555555"))
            .build();
        let e = crate::metadata::builder::TypeBuilder::new(0x0200_0002, "Color", "Game")
            .flags(TypeFlags::ENUM | TypeFlags::VALUE_TYPE)
            .register(&module);
        let i = crate::metadata::builder::TypeBuilder::new(0x0200_0003, "IRun", "Game")
            .flags(TypeFlags::INTERFACE | TypeFlags::ABSTRACT)
            .register(&module);
        assert_eq!(e.type_kind(), "enum");
        assert_eq!(i.type_kind(), "interface");
        assert!(!i.is_class());
        assert!(e.is_value_type());
    }
}
