//! Per-query module and type indices.
//!
//! Indices are rebuilt from a workspace snapshot at the start of every query
//! and discarded at its end - the metadata model is live, externally-mutable
//! state, so nothing here survives across queries.

use std::collections::HashMap;

use crate::analysis::heuristics::is_framework_assembly;
use crate::metadata::{
    module::{CilModule, ModuleRc},
    types::{CilType, CilTypeRc},
    workspace::Workspace,
};

/// One module of the current query scope, with its precomputed identity texts.
#[derive(Clone)]
pub struct ModuleEntry {
    /// The module itself.
    pub module: ModuleRc,
    /// Stable index key (MVID, path or name based).
    pub key: String,
    /// MVID display text.
    pub mvid: String,
}

impl ModuleEntry {
    /// Wraps a module, computing its key and identity text.
    #[must_use]
    pub fn new(module: ModuleRc) -> Self {
        let key = module_key(&module);
        let mvid = module.mvid_text();
        ModuleEntry { module, key, mvid }
    }

    /// Returns the filename the module was loaded from.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.module.path
    }
}

/// Computes the stable per-module index key.
///
/// Priority order: MVID when present, else the filesystem path, else the
/// display name - so two distinct modules never collide merely because their
/// identity metadata is missing.
#[must_use]
pub fn module_key(module: &CilModule) -> String {
    if module.mvid != uguid::Guid::ZERO {
        return module.mvid.to_string();
    }
    if !module.path.is_empty() {
        return format!("file:{}", module.path);
    }
    format!("module:{}", module.name)
}

/// Builds the module index from a workspace snapshot.
///
/// Entries keep snapshot order; a second module with an already-seen key is
/// dropped rather than replacing the first.
#[must_use]
pub fn build_module_index(workspace: &Workspace) -> Vec<ModuleEntry> {
    let mut entries: Vec<ModuleEntry> = Vec::new();
    let mut seen: HashMap<String, ()> = HashMap::new();
    for module in workspace.snapshot() {
        let entry = ModuleEntry::new(module);
        if seen.insert(entry.key.clone(), ()).is_none() {
            entries.push(entry);
        }
    }
    entries
}

/// Drops framework/runtime modules from the scope unless the caller opted in.
#[must_use]
pub fn filter_modules(entries: Vec<ModuleEntry>, include_framework: bool) -> Vec<ModuleEntry> {
    if include_framework {
        return entries;
    }
    entries
        .into_iter()
        .filter(|entry| {
            !is_framework_assembly(&entry.module.path, entry.module.assembly_name())
        })
        .collect()
}

/// First-registered-wins map from fully-qualified type name to definition.
///
/// Later duplicates (the same type loaded from two paths) must not silently
/// replace an already-chosen representative: traversals compare definitions by
/// identity, and swapping representatives mid-index would split the graph.
pub struct TypeIndex {
    map: HashMap<String, CilTypeRc>,
}

impl TypeIndex {
    /// Builds the index over every type of the given modules.
    #[must_use]
    pub fn build(modules: &[ModuleEntry]) -> Self {
        let mut map: HashMap<String, CilTypeRc> = HashMap::new();
        for entry in modules {
            for ty in entry.module.types() {
                map.entry(ty.full_name.clone()).or_insert_with(|| ty.clone());
            }
        }
        TypeIndex { map }
    }

    /// Looks a type up by fully-qualified name.
    #[must_use]
    pub fn get(&self, full_name: &str) -> Option<&CilTypeRc> {
        self.map.get(full_name)
    }

    /// Returns the number of indexed names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` when the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Resolves a type reference to a loaded definition, falling back to the
/// first-registered representative under the reference's full name.
#[must_use]
pub fn resolve_type_ref(
    type_ref: &crate::metadata::types::CilTypeRef,
    index: &TypeIndex,
) -> Option<CilTypeRc> {
    type_ref
        .resolve()
        .or_else(|| index.get(type_ref.full_name()).cloned())
}

/// Inverse adjacency from a base type's full name to its immediate subtypes.
///
/// Types whose base reference has no resolvable full name are excluded - they
/// cannot have discoverable subtypes through this index.
#[must_use]
pub fn build_derived_map(modules: &[ModuleEntry]) -> HashMap<String, Vec<CilTypeRc>> {
    let mut map: HashMap<String, Vec<CilTypeRc>> = HashMap::new();
    for entry in modules {
        for ty in entry.module.types() {
            let Some(base) = &ty.base else { continue };
            let base_name = base
                .resolve()
                .map(|b| b.full_name.clone())
                .unwrap_or_else(|| base.full_name().to_string());
            if base_name.is_empty() {
                continue;
            }
            map.entry(base_name).or_default().push(ty.clone());
        }
    }
    map
}

/// Identity-based visited-set key for a type: `(mvid, token)`.
///
/// Name collisions across modules must not merge distinct nodes during
/// traversal, so graph algorithms key their visited sets with this instead of
/// the full name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeKey {
    mvid: [u8; 16],
    token: u32,
}

/// Computes the visited-set key of a type.
#[must_use]
pub fn type_key(ty: &CilType) -> TypeKey {
    TypeKey {
        mvid: ty
            .module()
            .map(|m| m.mvid.to_bytes())
            .unwrap_or([0; 16]),
        token: ty.token.value(),
    }
}
