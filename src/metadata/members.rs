//! Member definitions: methods, fields, properties and events.
//!
//! Members are owned by their declaring type and hold weak back-references to
//! it. Cross-member references (property accessors, override declarations,
//! instruction operands) go through [`MemberLink`], which - like
//! [`CilTypeRef`](crate::metadata::types::CilTypeRef) - keeps a full name next
//! to the weak pointer so unresolved symbolic references stay usable.

use std::fmt;
use std::sync::{Arc, Weak};

use bitflags::bitflags;

use crate::metadata::{
    body::MethodBody,
    module::ModuleRc,
    signatures::{MethodSig, TypeSig},
    token::Token,
    types::{CilType, CilTypeRc, CilTypeRef, ConstantValue, CustomAttribute, GenericParam},
};

/// Reference counted pointer to a [`Method`].
pub type MethodRc = Arc<Method>;
/// Reference counted pointer to a [`Field`].
pub type FieldRc = Arc<Field>;
/// Reference counted pointer to a [`Property`].
pub type PropertyRc = Arc<Property>;
/// Reference counted pointer to an [`Event`].
pub type EventRc = Arc<Event>;

/// A weak, name-carrying reference to a member definition.
///
/// Instruction operands and accessor slots use this to point at methods and
/// fields that may live in another module - or in a module that is not loaded
/// at all, in which case only the full name is available.
pub struct MemberLink<T> {
    full_name: String,
    target: Weak<T>,
}

impl<T> Clone for MemberLink<T> {
    fn clone(&self) -> Self {
        MemberLink {
            full_name: self.full_name.clone(),
            target: self.target.clone(),
        }
    }
}

impl<T> MemberLink<T> {
    /// Creates a link to a loaded member definition.
    #[must_use]
    pub fn new(full_name: &str, target: &Arc<T>) -> Self {
        MemberLink {
            full_name: full_name.to_string(),
            target: Arc::downgrade(target),
        }
    }

    /// Creates a symbolic link that carries only a full name.
    #[must_use]
    pub fn external(full_name: &str) -> Self {
        MemberLink {
            full_name: full_name.to_string(),
            target: Weak::new(),
        }
    }

    /// Returns the linked definition if it is still loaded.
    #[must_use]
    pub fn resolve(&self) -> Option<Arc<T>> {
        self.target.upgrade()
    }

    /// Returns the full name the link was created with.
    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }
}

impl<T> fmt::Debug for MemberLink<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberLink")
            .field("full_name", &self.full_name)
            .field("resolved", &(self.target.strong_count() > 0))
            .finish()
    }
}

bitflags! {
    /// Access and semantic flags of a method definition.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MethodFlags: u32 {
        /// Method is static.
        const STATIC = 0x0001;
        /// Method is public.
        const PUBLIC = 0x0002;
        /// Method is private.
        const PRIVATE = 0x0004;
        /// Method is protected (family).
        const FAMILY = 0x0008;
        /// Method is internal (assembly).
        const ASSEMBLY = 0x0010;
        /// Method is abstract.
        const ABSTRACT = 0x0020;
        /// Method is virtual.
        const VIRTUAL = 0x0040;
        /// Method is final (sealed override).
        const FINAL = 0x0080;
        /// Method has no managed body (P/Invoke or runtime-provided).
        const EXTERNAL = 0x0100;
    }
}

bitflags! {
    /// Access and semantic flags of a field definition.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FieldFlags: u32 {
        /// Field is static.
        const STATIC = 0x0001;
        /// Field is public.
        const PUBLIC = 0x0002;
        /// Field is read-only after construction.
        const INIT_ONLY = 0x0004;
        /// Field is a compile-time literal.
        const LITERAL = 0x0008;
    }
}

/// A parameter of a method.
#[derive(Debug, Clone)]
pub struct Param {
    /// Parameter name; empty when the module carries no name for it.
    pub name: String,
    /// Zero-based position, excluding the implicit `this`.
    pub index: u32,
    /// Declared type.
    pub param_type: TypeSig,
    /// Default value, if declared.
    pub default: Option<ConstantValue>,
    /// `true` for optional parameters.
    pub optional: bool,
    /// Custom attributes applied to this parameter.
    pub attributes: Vec<CustomAttribute>,
}

/// A read-only view of one method definition.
#[derive(Debug)]
pub struct Method {
    /// Metadata token, unique within the owning module.
    pub token: Token,
    /// Simple name.
    pub name: String,
    /// Fully qualified name (`Namespace.Type::Name`).
    pub full_name: String,
    /// Access and semantic flags.
    pub flags: MethodFlags,
    /// Declared signature.
    pub signature: MethodSig,
    /// Parameters, in order.
    pub params: Vec<Param>,
    /// Generic parameters with their constraints.
    pub generic_params: Vec<GenericParam>,
    /// Instruction stream, absent for abstract/external methods.
    pub body: Option<MethodBody>,
    /// Explicitly declared override targets (interface methods or base methods).
    pub overrides: Vec<MemberLink<Method>>,
    /// Custom attributes applied to this method.
    pub attributes: Vec<CustomAttribute>,
    pub(crate) declaring: Weak<CilType>,
}

impl Method {
    /// Returns the declaring type if it is still loaded.
    #[must_use]
    pub fn declaring_type(&self) -> Option<CilTypeRc> {
        self.declaring.upgrade()
    }

    /// Returns the owning module if it is still loaded.
    #[must_use]
    pub fn module(&self) -> Option<ModuleRc> {
        self.declaring_type().and_then(|t| t.module())
    }

    /// Returns the owning module's MVID as a display string, or the empty
    /// string if the module is gone.
    #[must_use]
    pub fn mvid_text(&self) -> String {
        self.module()
            .map(|m| m.mvid.to_string())
            .unwrap_or_default()
    }

    /// Returns `true` for instance and static constructors.
    #[must_use]
    pub fn is_constructor(&self) -> bool {
        self.name == ".ctor" || self.name == ".cctor"
    }

    /// Returns `true` for static methods.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.flags.contains(MethodFlags::STATIC)
    }

    /// Returns `true` for abstract methods.
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.flags.contains(MethodFlags::ABSTRACT)
    }

    /// Returns `true` for virtual methods.
    #[must_use]
    pub fn is_virtual(&self) -> bool {
        self.flags.contains(MethodFlags::VIRTUAL)
    }

    /// Returns `true` when the method has an instruction stream to scan.
    #[must_use]
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }
}

/// A read-only view of one field definition.
#[derive(Debug)]
pub struct Field {
    /// Metadata token, unique within the owning module.
    pub token: Token,
    /// Simple name.
    pub name: String,
    /// Fully qualified name (`Namespace.Type::Name`).
    pub full_name: String,
    /// Access and semantic flags.
    pub flags: FieldFlags,
    /// Declared type.
    pub field_type: TypeSig,
    /// Constant value for literal fields.
    pub constant: Option<ConstantValue>,
    /// Custom attributes applied to this field.
    pub attributes: Vec<CustomAttribute>,
    pub(crate) declaring: Weak<CilType>,
}

impl Field {
    /// Returns the declaring type if it is still loaded.
    #[must_use]
    pub fn declaring_type(&self) -> Option<CilTypeRc> {
        self.declaring.upgrade()
    }

    /// Returns the owning module if it is still loaded.
    #[must_use]
    pub fn module(&self) -> Option<ModuleRc> {
        self.declaring_type().and_then(|t| t.module())
    }

    /// Returns the owning module's MVID as a display string, or the empty
    /// string if the module is gone.
    #[must_use]
    pub fn mvid_text(&self) -> String {
        self.module()
            .map(|m| m.mvid.to_string())
            .unwrap_or_default()
    }

    /// Returns `true` for static fields.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.flags.contains(FieldFlags::STATIC)
    }

    /// Returns `true` for init-only fields.
    #[must_use]
    pub fn is_init_only(&self) -> bool {
        self.flags.contains(FieldFlags::INIT_ONLY)
    }

    /// Returns `true` for literal (compile-time constant) fields.
    #[must_use]
    pub fn is_literal(&self) -> bool {
        self.flags.contains(FieldFlags::LITERAL)
    }
}

/// A read-only view of one property definition.
#[derive(Debug)]
pub struct Property {
    /// Metadata token, unique within the owning module.
    pub token: Token,
    /// Simple name.
    pub name: String,
    /// Fully qualified name (`Namespace.Type::Name`).
    pub full_name: String,
    /// Declared property type.
    pub property_type: TypeSig,
    /// Getter accessor, if present.
    pub getter: Option<MemberLink<Method>>,
    /// Setter accessor, if present.
    pub setter: Option<MemberLink<Method>>,
    /// Custom attributes applied to this property.
    pub attributes: Vec<CustomAttribute>,
    pub(crate) declaring: Weak<CilType>,
}

impl Property {
    /// Returns the declaring type if it is still loaded.
    #[must_use]
    pub fn declaring_type(&self) -> Option<CilTypeRc> {
        self.declaring.upgrade()
    }

    /// Returns the owning module's MVID as a display string, or the empty
    /// string if the module is gone.
    #[must_use]
    pub fn mvid_text(&self) -> String {
        self.declaring_type()
            .and_then(|t| t.module())
            .map(|m| m.mvid.to_string())
            .unwrap_or_default()
    }
}

/// A read-only view of one event definition.
#[derive(Debug)]
pub struct Event {
    /// Metadata token, unique within the owning module.
    pub token: Token,
    /// Simple name.
    pub name: String,
    /// Fully qualified name (`Namespace.Type::Name`).
    pub full_name: String,
    /// Declared event (handler) type.
    pub event_type: CilTypeRef,
    /// `add` accessor, if present.
    pub add: Option<MemberLink<Method>>,
    /// `remove` accessor, if present.
    pub remove: Option<MemberLink<Method>>,
    /// `raise` accessor, if present.
    pub raise: Option<MemberLink<Method>>,
    /// Custom attributes applied to this event.
    pub attributes: Vec<CustomAttribute>,
    pub(crate) declaring: Weak<CilType>,
}

impl Event {
    /// Returns the declaring type if it is still loaded.
    #[must_use]
    pub fn declaring_type(&self) -> Option<CilTypeRc> {
        self.declaring.upgrade()
    }

    /// Returns the owning module's MVID as a display string, or the empty
    /// string if the module is gone.
    #[must_use]
    pub fn mvid_text(&self) -> String {
        self.declaring_type()
            .and_then(|t| t.module())
            .map(|m| m.mvid.to_string())
            .unwrap_or_default()
    }
}
