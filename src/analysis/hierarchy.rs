//! Inheritance-graph traversal and override resolution.
//!
//! All traversals here are plain BFS with an identity-keyed visited set
//! ([`TypeKey`]) and a FIFO queue: a node is enqueued at most once, so cyclic
//! shapes (including cyclic generic instantiations) terminate, and results come
//! out in minimum-depth order.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use crate::analysis::indices::{resolve_type_ref, type_key, TypeIndex, TypeKey};
use crate::metadata::{
    members::{MemberLink, Method, MethodRc},
    types::CilTypeRc,
};

/// One type reached by a downward (derived-type) traversal.
pub struct DerivedEntry {
    /// The reached type.
    pub ty: CilTypeRc,
    /// Distance from the traversal root (root itself is depth 0).
    pub depth: u32,
}

/// Walks the base-type chain upward, from the immediate base to the ultimate
/// ancestor. Unresolvable bases end the walk.
#[must_use]
pub fn base_chain(ty: &CilTypeRc) -> Vec<CilTypeRc> {
    let mut chain = Vec::new();
    let mut guard: HashSet<TypeKey> = HashSet::new();
    let mut current = ty.base.as_ref().and_then(|b| b.resolve());
    while let Some(base) = current {
        if !guard.insert(type_key(&base)) {
            break;
        }
        current = base.base.as_ref().and_then(|b| b.resolve());
        chain.push(base);
    }
    chain
}

/// Enumerates derived types breadth-first through the derived map.
///
/// `max_depth < 0` means unbounded. With `include_self` the root itself is
/// reported at depth 0. A diamond shape reports each type exactly once, at its
/// minimum depth.
#[must_use]
pub fn enumerate_derived(
    root: &CilTypeRc,
    derived_map: &HashMap<String, Vec<CilTypeRc>>,
    include_self: bool,
    max_depth: i32,
) -> Vec<DerivedEntry> {
    let mut out = Vec::new();
    let mut seen: HashSet<TypeKey> = HashSet::new();
    let mut queue: VecDeque<DerivedEntry> = VecDeque::new();

    if include_self {
        seen.insert(type_key(root));
        out.push(DerivedEntry {
            ty: root.clone(),
            depth: 0,
        });
    }
    if root.full_name.is_empty() {
        return out;
    }
    if let Some(children) = derived_map.get(&root.full_name) {
        for child in children {
            queue.push_back(DerivedEntry {
                ty: child.clone(),
                depth: 1,
            });
        }
    }

    while let Some(entry) = queue.pop_front() {
        if !seen.insert(type_key(&entry.ty)) {
            continue;
        }
        let depth = entry.depth;
        let full_name = entry.ty.full_name.clone();
        out.push(entry);
        if max_depth >= 0 && depth as i32 >= max_depth {
            continue;
        }
        if let Some(children) = derived_map.get(&full_name) {
            for child in children {
                queue.push_back(DerivedEntry {
                    ty: child.clone(),
                    depth: depth + 1,
                });
            }
        }
    }
    out
}

/// Returns `true` if two method definitions are the same definition -
/// pointer-identical, or carrying the same token inside the same module.
#[must_use]
pub fn methods_match(candidate: &MethodRc, target: &MethodRc) -> bool {
    if Arc::ptr_eq(candidate, target) {
        return true;
    }
    if candidate.token == target.token {
        if let (Some(a), Some(b)) = (candidate.module(), target.module()) {
            return a.mvid == b.mvid;
        }
    }
    false
}

/// Returns `true` if a method link designates `target` - definition identity
/// when the link resolves, full-name equality for unresolved symbolic links.
#[must_use]
pub fn method_link_matches(link: &MemberLink<Method>, target: &MethodRc) -> bool {
    match link.resolve() {
        Some(resolved) => methods_match(&resolved, target),
        None => link.full_name() == target.full_name,
    }
}

/// Returns `true` when two methods agree in name and structural signature.
#[must_use]
pub fn signature_matches(candidate: &Method, target: &Method) -> bool {
    candidate.name == target.name && candidate.signature == target.signature
}

/// Finds the method a given method overrides, one base level at a time.
///
/// Walks the declaring type's base chain and returns the first method with a
/// matching name and signature.
#[must_use]
pub fn find_base_method(method: &MethodRc) -> Option<MethodRc> {
    let declaring = method.declaring_type()?;
    let mut guard: HashSet<TypeKey> = HashSet::new();
    let mut current = declaring.base.as_ref().and_then(|b| b.resolve());
    while let Some(base) = current {
        if !guard.insert(type_key(&base)) {
            break;
        }
        for (_, candidate) in base.methods.iter() {
            if signature_matches(candidate, method) {
                return Some(candidate.clone());
            }
        }
        current = base.base.as_ref().and_then(|b| b.resolve());
    }
    None
}

/// Finds the method on `ty` that implements an interface method.
///
/// An explicit override declaration wins; otherwise the first method with a
/// matching name and signature is taken.
#[must_use]
pub fn find_interface_implementation(ty: &CilTypeRc, iface_method: &MethodRc) -> Option<MethodRc> {
    for (_, method) in ty.methods.iter() {
        if method
            .overrides
            .iter()
            .any(|o| method_link_matches(o, iface_method))
        {
            return Some(method.clone());
        }
        if signature_matches(method, iface_method) {
            return Some(method.clone());
        }
    }
    None
}

/// Finds the method on a derived type `ty` that overrides `target`.
///
/// Candidates must match the target's name and signature; beyond that, either
/// an explicit override declaration names the target, or the candidate's own
/// resolved base method (walked one level at a time) is the target. Methods
/// that merely hide a base method with the same signature therefore also
/// qualify.
#[must_use]
pub fn find_override_method(ty: &CilTypeRc, target: &MethodRc) -> Option<MethodRc> {
    for (_, method) in ty.methods.iter() {
        if !signature_matches(method, target) {
            continue;
        }
        if method.overrides.iter().any(|o| method_link_matches(o, target)) {
            return Some(method.clone());
        }
        if let Some(base_method) = find_base_method(method) {
            if methods_match(&base_method, target) {
                return Some(method.clone());
            }
        }
    }
    None
}

/// Returns `true` when `ty` implements `iface`, directly, through a base
/// interface, or through its base-type chain.
#[must_use]
pub fn type_implements_interface(ty: &CilTypeRc, iface: &CilTypeRc, index: &TypeIndex) -> bool {
    let mut visited: HashSet<String> = HashSet::new();
    implements_core(ty, iface, &mut visited, index)
}

fn implements_core(
    ty: &CilTypeRc,
    iface: &CilTypeRc,
    visited: &mut HashSet<String>,
    index: &TypeIndex,
) -> bool {
    if !visited.insert(ty.full_name.clone()) {
        return false;
    }
    for implemented in &ty.interfaces {
        if implemented.refers_to(iface) {
            return true;
        }
        if let Some(resolved) = resolve_type_ref(implemented, index) {
            if implements_core(&resolved, iface, visited, index) {
                return true;
            }
        }
    }
    if let Some(base) = &ty.base {
        if let Some(resolved) = resolve_type_ref(base, index) {
            return implements_core(&resolved, iface, visited, index);
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::indices::{build_derived_map, build_module_index};
    use crate::metadata::builder::{MethodBuilder, ModuleBuilder, TypeBuilder};
    use crate::metadata::signatures::TypeSig;
    use crate::metadata::types::CilTypeRef;
    use crate::metadata::workspace::Workspace;
    use uguid::guid;

    #[test]
    fn test_diamond_bfs_visits_each_type_once() {
        // A <- B, C;  B, C <- D
        let workspace = Workspace::new();
        let m = ModuleBuilder::new("m.dll", guid!("00000000-0000-0000-0000-0000000000e1")).build();
        let a = TypeBuilder::new(0x0200_0001, "A", "G").register(&m);
        let b = TypeBuilder::new(0x0200_0002, "B", "G")
            .base(CilTypeRef::to(&a))
            .register(&m);
        let _c = TypeBuilder::new(0x0200_0003, "C", "G")
            .base(CilTypeRef::to(&a))
            .register(&m);
        let d = TypeBuilder::new(0x0200_0004, "D", "G")
            .base(CilTypeRef::to(&b))
            .register(&m);
        workspace.insert(m.clone());
        let modules = build_module_index(&workspace);
        let mut map = build_derived_map(&modules);
        // Close the diamond: make D an immediate subtype of C as well.
        map.entry("G.C".to_string()).or_default().push(d);

        let reached = enumerate_derived(&a, &map, false, -1);
        let mut names: Vec<_> = reached.iter().map(|e| e.ty.name.clone()).collect();
        names.sort();
        assert_eq!(names, vec!["B", "C", "D"]);
    }

    #[test]
    fn test_depth_bound() {
        let workspace = Workspace::new();
        let m = ModuleBuilder::new("m.dll", guid!("00000000-0000-0000-0000-0000000000e2")).build();
        let a = TypeBuilder::new(0x0200_0001, "A", "G").register(&m);
        let b = TypeBuilder::new(0x0200_0002, "B", "G")
            .base(CilTypeRef::to(&a))
            .register(&m);
        let _c = TypeBuilder::new(0x0200_0003, "C", "G")
            .base(CilTypeRef::to(&b))
            .register(&m);
        workspace.insert(m);
        let modules = build_module_index(&workspace);
        let map = build_derived_map(&modules);

        let bounded = enumerate_derived(&a, &map, false, 1);
        assert_eq!(bounded.len(), 1);
        assert_eq!(bounded[0].ty.name, "B");

        let with_self = enumerate_derived(&a, &map, true, -1);
        assert_eq!(with_self.len(), 3);
        assert_eq!(with_self[0].depth, 0);
    }

    #[test]
    fn test_base_chain_walks_to_root() {
        let m = ModuleBuilder::new("m.dll", guid!("00000000-0000-0000-0000-0000000000e3")).build();
        let root = TypeBuilder::new(0x0200_0001, "Root", "G").register(&m);
        let mid = TypeBuilder::new(0x0200_0002, "Mid", "G")
            .base(CilTypeRef::to(&root))
            .register(&m);
        let leaf = TypeBuilder::new(0x0200_0003, "Leaf", "G")
            .base(CilTypeRef::to(&mid))
            .register(&m);

        let chain: Vec<_> = base_chain(&leaf).iter().map(|t| t.name.clone()).collect();
        assert_eq!(chain, vec!["Mid", "Root"]);
    }

    #[test]
    fn test_override_by_name_and_signature_without_declaration() {
        let m = ModuleBuilder::new("m.dll", guid!("00000000-0000-0000-0000-0000000000e4")).build();
        let base = TypeBuilder::new(0x0200_0001, "A", "G")
            .method(
                MethodBuilder::new(0x0600_0001, "Update")
                    .param("dt", TypeSig::named("System.Single")),
            )
            .register(&m);
        let derived = TypeBuilder::new(0x0200_0002, "B", "G")
            .base(CilTypeRef::to(&base))
            .method(
                MethodBuilder::new(0x0600_0002, "Update")
                    .param("dt", TypeSig::named("System.Single")),
            )
            .method(MethodBuilder::new(0x0600_0003, "Update"))
            .register(&m);

        let (_, target) = base.methods.iter().next().unwrap();
        let found = find_override_method(&derived, target).unwrap();
        assert_eq!(found.token.value(), 0x0600_0002);

        // The zero-arg overload does not match the signature.
        let (_, zero_arg) = derived.methods.iter().nth(1).unwrap();
        assert!(find_base_method(zero_arg).is_none());
    }

    #[test]
    fn test_interface_implementation_resolution() {
        let m = ModuleBuilder::new("m.dll", guid!("00000000-0000-0000-0000-0000000000e5")).build();
        let iface = TypeBuilder::new(0x0200_0001, "IRun", "G")
            .flags(crate::metadata::types::TypeFlags::INTERFACE)
            .method(MethodBuilder::new(0x0600_0001, "Run"))
            .register(&m);
        let implementing = TypeBuilder::new(0x0200_0002, "Runner", "G")
            .implements(CilTypeRef::to(&iface))
            .method(MethodBuilder::new(0x0600_0002, "Run"))
            .register(&m);
        let unrelated = TypeBuilder::new(0x0200_0003, "Walker", "G")
            .method(MethodBuilder::new(0x0600_0003, "Walk"))
            .register(&m);

        let workspace = Workspace::new();
        workspace.insert(m);
        let modules = build_module_index(&workspace);
        let index = TypeIndex::build(&modules);

        assert!(type_implements_interface(&implementing, &iface, &index));
        assert!(!type_implements_interface(&unrelated, &iface, &index));

        let (_, iface_method) = iface.methods.iter().next().unwrap();
        let found = find_interface_implementation(&implementing, iface_method).unwrap();
        assert_eq!(found.token.value(), 0x0600_0002);
        assert!(find_interface_implementation(&unrelated, iface_method).is_none());
    }
}
