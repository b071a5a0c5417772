//! Shortest-path search between two types.
//!
//! Edges are "type A references type B via field or property F" - field and
//! property declared types of the *source* type only, recursively unwrapped
//! through signature wrappers. BFS gives the shortest hop sequence; a miss is
//! reported as `None`, never as an error.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;

use crate::analysis::indices::{resolve_type_ref, type_key, TypeIndex, TypeKey};
use crate::metadata::types::CilTypeRc;

/// One hop of a found path.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathHop {
    /// Full name of the type the hop leaves.
    pub from: String,
    /// Edge kind: `field` or `property`.
    pub via_kind: &'static str,
    /// Name of the member that forms the edge.
    pub via_name: String,
    /// Full name of the type the hop reaches.
    pub to: String,
}

/// Finds the shortest field/property reference path from `from` to `to`,
/// bounded by `max_depth` hops. Returns `None` when no path exists within the
/// bound; an empty path when the two types are the same.
#[must_use]
pub fn find_path(
    from: &CilTypeRc,
    to: &CilTypeRc,
    max_depth: u32,
    index: &TypeIndex,
) -> Option<Vec<PathHop>> {
    let origin_key = type_key(from);
    let target_key = type_key(to);

    let mut visited: HashSet<TypeKey> = HashSet::new();
    let mut prev: HashMap<TypeKey, (CilTypeRc, &'static str, String)> = HashMap::new();
    let mut depths: HashMap<TypeKey, u32> = HashMap::new();
    let mut queue: VecDeque<CilTypeRc> = VecDeque::new();

    visited.insert(origin_key);
    depths.insert(origin_key, 0);
    queue.push_back(from.clone());

    while let Some(current) = queue.pop_front() {
        let current_key = type_key(&current);
        if current_key == target_key {
            break;
        }
        let depth = depths.get(&current_key).copied().unwrap_or(0);
        if depth >= max_depth {
            continue;
        }
        for (target, via_kind, via_name) in type_edges(&current, index) {
            let target_id = type_key(&target);
            if visited.contains(&target_id) {
                continue;
            }
            visited.insert(target_id);
            prev.insert(target_id, (current.clone(), via_kind, via_name));
            depths.insert(target_id, depth + 1);
            queue.push_back(target);
        }
    }

    if !visited.contains(&target_key) {
        return None;
    }

    let mut hops = Vec::new();
    let mut cursor = to.clone();
    while type_key(&cursor) != origin_key {
        let Some((from_ty, via_kind, via_name)) = prev.get(&type_key(&cursor)) else {
            break;
        };
        hops.push(PathHop {
            from: from_ty.full_name.clone(),
            via_kind,
            via_name: via_name.clone(),
            to: cursor.full_name.clone(),
        });
        cursor = from_ty.clone();
    }
    hops.reverse();
    Some(hops)
}

fn type_edges(ty: &CilTypeRc, index: &TypeIndex) -> Vec<(CilTypeRc, &'static str, String)> {
    let mut edges = Vec::new();
    for (_, field) in ty.fields.iter() {
        field.field_type.visit_named(&mut |leaf| {
            if let Some(target) = resolve_type_ref(leaf, index) {
                edges.push((target, "field", field.name.clone()));
            }
        });
    }
    for (_, property) in ty.properties.iter() {
        property.property_type.visit_named(&mut |leaf| {
            if let Some(target) = resolve_type_ref(leaf, index) {
                edges.push((target, "property", property.name.clone()));
            }
        });
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::indices::build_module_index;
    use crate::metadata::builder::{FieldBuilder, ModuleBuilder, TypeBuilder};
    use crate::metadata::signatures::TypeSig;
    use crate::metadata::workspace::Workspace;
    use uguid::guid;

    fn chain_fixture() -> (Workspace, CilTypeRc, CilTypeRc) {
        // A has a field of type B; B has a field of type C.
        let workspace = Workspace::new();
        let m = ModuleBuilder::new("m.dll", guid!("00000000-0000-0000-0000-0000000000f1")).build();
        let c = TypeBuilder::new(0x0200_0003, "C", "G").register(&m);
        let b = TypeBuilder::new(0x0200_0002, "B", "G")
            .field(FieldBuilder::new(0x0400_0002, "next", TypeSig::of(&c)))
            .register(&m);
        let a = TypeBuilder::new(0x0200_0001, "A", "G")
            .field(FieldBuilder::new(0x0400_0001, "child", TypeSig::of(&b)))
            .register(&m);
        workspace.insert(m);
        (workspace, a, c)
    }

    #[test]
    fn test_two_hop_path() {
        let (workspace, a, c) = chain_fixture();
        let index = TypeIndex::build(&build_module_index(&workspace));
        let path = find_path(&a, &c, 4, &index).unwrap();
        assert_eq!(path.len(), 2);
        assert_eq!(path[0].from, "G.A");
        assert_eq!(path[0].via_kind, "field");
        assert_eq!(path[0].via_name, "child");
        assert_eq!(path[0].to, "G.B");
        assert_eq!(path[1].to, "G.C");
    }

    #[test]
    fn test_depth_bound_reports_not_found() {
        let (workspace, a, c) = chain_fixture();
        let index = TypeIndex::build(&build_module_index(&workspace));
        assert!(find_path(&a, &c, 1, &index).is_none());
    }

    #[test]
    fn test_same_type_yields_empty_path() {
        let (workspace, a, _) = chain_fixture();
        let index = TypeIndex::build(&build_module_index(&workspace));
        let path = find_path(&a, &a, 4, &index).unwrap();
        assert!(path.is_empty());
    }

    #[test]
    fn test_edges_unwrap_generic_instantiations() {
        // A field of type List<C> still produces an edge to C.
        let workspace = Workspace::new();
        let m = ModuleBuilder::new("m.dll", guid!("00000000-0000-0000-0000-0000000000f2")).build();
        let c = TypeBuilder::new(0x0200_0002, "C", "G").register(&m);
        let holder = TypeBuilder::new(0x0200_0001, "Holder", "G")
            .field(FieldBuilder::new(
                0x0400_0001,
                "items",
                TypeSig::GenericInst {
                    definition: Box::new(TypeSig::named("System.Collections.Generic.List`1")),
                    args: vec![TypeSig::of(&c)],
                },
            ))
            .register(&m);
        workspace.insert(m);
        let index = TypeIndex::build(&build_module_index(&workspace));
        let path = find_path(&holder, &c, 4, &index).unwrap();
        assert_eq!(path.len(), 1);
        assert_eq!(path[0].via_name, "items");
    }
}
