//! Loaded-module views.
//!
//! A [`CilModule`] is the engine's picture of one loaded binary: identity,
//! naming, the owning assembly, references, resources and the flat list of all
//! types defined in it (nested types included). The module also owns the
//! token → definition map that backs `resolve_token`, which is how result
//! records handed to a caller are re-resolved later.

use std::sync::Arc;

use dashmap::DashMap;

use crate::metadata::{
    members::{EventRc, FieldRc, MethodRc, PropertyRc},
    token::Token,
    types::{CilTypeRc, CustomAttribute},
};

/// Reference counted pointer to a [`CilModule`].
pub type ModuleRc = Arc<CilModule>;

/// Identity and naming of the assembly a module belongs to.
#[derive(Debug, Clone, Default)]
pub struct AssemblyInfo {
    /// Simple assembly name.
    pub name: String,
    /// Display name including version, culture and public key token.
    pub full_name: String,
    /// Four-part version string.
    pub version: String,
    /// Culture; empty for culture-neutral assemblies.
    pub culture: String,
    /// Public key token as hex text; empty for unsigned assemblies.
    pub public_key_token: String,
    /// Assembly-level custom attributes.
    pub attributes: Vec<CustomAttribute>,
}

/// A reference from a module to another assembly.
#[derive(Debug, Clone)]
pub struct AssemblyRefInfo {
    /// Simple name of the referenced assembly.
    pub name: String,
    /// Display name of the referenced assembly.
    pub full_name: String,
    /// Referenced version string.
    pub version: String,
}

/// A reference from a module to another module of the same assembly.
#[derive(Debug, Clone)]
pub struct ModuleRefInfo {
    /// Name of the referenced module.
    pub name: String,
}

/// An embedded or linked resource.
#[derive(Debug, Clone)]
pub struct Resource {
    /// Resource name.
    pub name: String,
    /// Resource kind tag (embedded, linked, ...).
    pub kind: String,
}

/// A definition resolved from a metadata token.
#[derive(Debug, Clone)]
pub enum CilDef {
    /// A type definition.
    Type(CilTypeRc),
    /// A method definition.
    Method(MethodRc),
    /// A field definition.
    Field(FieldRc),
    /// A property definition.
    Property(PropertyRc),
    /// An event definition.
    Event(EventRc),
}

impl CilDef {
    /// Returns the type definition, if this is one.
    #[must_use]
    pub fn as_type(&self) -> Option<CilTypeRc> {
        match self {
            CilDef::Type(t) => Some(t.clone()),
            _ => None,
        }
    }

    /// Returns the method definition, if this is one.
    #[must_use]
    pub fn as_method(&self) -> Option<MethodRc> {
        match self {
            CilDef::Method(m) => Some(m.clone()),
            _ => None,
        }
    }

    /// Returns the field definition, if this is one.
    #[must_use]
    pub fn as_field(&self) -> Option<FieldRc> {
        match self {
            CilDef::Field(f) => Some(f.clone()),
            _ => None,
        }
    }

    /// Returns the property definition, if this is one.
    #[must_use]
    pub fn as_property(&self) -> Option<PropertyRc> {
        match self {
            CilDef::Property(p) => Some(p.clone()),
            _ => None,
        }
    }

    /// Returns the event definition, if this is one.
    #[must_use]
    pub fn as_event(&self) -> Option<EventRc> {
        match self {
            CilDef::Event(e) => Some(e.clone()),
            _ => None,
        }
    }
}

/// A read-only view of one loaded module.
#[derive(Debug)]
pub struct CilModule {
    /// Module version id, the 128-bit identity stable per loaded binary.
    pub mvid: uguid::Guid,
    /// Module display name (e.g. `Game.dll`).
    pub name: String,
    /// Filesystem path the module was loaded from; may be empty.
    pub path: String,
    /// Owning assembly, if the module belongs to one.
    pub assembly: Option<AssemblyInfo>,
    /// Referenced assemblies.
    pub assembly_refs: Vec<AssemblyRefInfo>,
    /// Referenced modules.
    pub module_refs: Vec<ModuleRefInfo>,
    /// Resources carried by the module.
    pub resources: Vec<Resource>,
    /// Module-level custom attributes.
    pub attributes: Vec<CustomAttribute>,
    pub(crate) types: boxcar::Vec<CilTypeRc>,
    pub(crate) defs: DashMap<u32, CilDef>,
}

impl CilModule {
    /// Iterates over all types defined in this module, nested types included.
    pub fn types(&self) -> impl Iterator<Item = &CilTypeRc> {
        self.types.iter().map(|(_, ty)| ty)
    }

    /// Returns the number of types defined in this module.
    #[must_use]
    pub fn type_count(&self) -> usize {
        self.types.count()
    }

    /// Resolves a metadata token to the definition it names, if any.
    #[must_use]
    pub fn resolve_token(&self, token: Token) -> Option<CilDef> {
        self.defs.get(&token.value()).map(|entry| entry.value().clone())
    }

    /// Returns the MVID as a display string.
    #[must_use]
    pub fn mvid_text(&self) -> String {
        self.mvid.to_string()
    }

    /// Returns the simple name of the owning assembly, or the empty string.
    #[must_use]
    pub fn assembly_name(&self) -> &str {
        self.assembly.as_ref().map_or("", |a| a.name.as_str())
    }

    /// Registers a fully built type (and its members) in the token map.
    pub(crate) fn register_type(&self, ty: &CilTypeRc) {
        self.types.push(ty.clone());
        self.defs.insert(ty.token.value(), CilDef::Type(ty.clone()));
        for (_, method) in ty.methods.iter() {
            self.defs
                .insert(method.token.value(), CilDef::Method(method.clone()));
        }
        for (_, field) in ty.fields.iter() {
            self.defs
                .insert(field.token.value(), CilDef::Field(field.clone()));
        }
        for (_, property) in ty.properties.iter() {
            self.defs
                .insert(property.token.value(), CilDef::Property(property.clone()));
        }
        for (_, event) in ty.events.iter() {
            self.defs
                .insert(event.token.value(), CilDef::Event(event.clone()));
        }
    }
}
