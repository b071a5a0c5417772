//! Inheritance, implementation and path operations.

use std::collections::HashSet;

use serde_json::{json, Map, Value};

use crate::analysis::{
    collector::SearchCollector,
    dependencies::collect_type_dependencies,
    hierarchy::{
        base_chain, enumerate_derived, find_base_method, find_interface_implementation,
        find_override_method, type_implements_interface,
    },
    indices::{build_derived_map, build_module_index, TypeIndex},
    typepaths::find_path,
};
use crate::metadata::types::CilTypeRc;
use crate::rpc::dispatch::QueryContext;
use crate::rpc::handlers::{find_module, resolve_method, resolve_type, results_json, type_to_json};
use crate::rpc::params::{get_bool, get_int, max_results, opt_u32, require_str, require_u32};
use crate::{Error, Result};

/// `getTypeDependencies` - distinct full names a type reaches, sorted.
pub(crate) fn get_type_dependencies(
    ctx: &QueryContext<'_>,
    params: &Map<String, Value>,
) -> Result<Value> {
    let module = find_module(ctx, params, "moduleMvid")?;
    let ty = resolve_type(&module, require_u32(params, "typeToken")?)?;
    let dependencies: Vec<String> = collect_type_dependencies(&ty).into_iter().collect();
    Ok(json!(dependencies))
}

/// `getInheritanceTree` - the base chain upward plus a bounded derived-type
/// tree downward.
pub(crate) fn get_inheritance_tree(
    ctx: &QueryContext<'_>,
    params: &Map<String, Value>,
) -> Result<Value> {
    let module = find_module(ctx, params, "moduleMvid")?;
    let ty = resolve_type(&module, require_u32(params, "typeToken")?)?;
    let max_depth = get_int(params, "maxDepth", 3).max(1);

    let chain: Vec<Value> = base_chain(&ty)
        .iter()
        .map(|base| json!(base.full_name))
        .collect();

    // Downward walk dedups by fully-qualified name: a diamond-shaped graph is
    // reported once per name, at minimum depth.
    let modules = build_module_index(ctx.workspace);
    let derived_map = build_derived_map(&modules);
    let mut derived = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut queue: std::collections::VecDeque<(String, i64)> = std::collections::VecDeque::new();
    visited.insert(ty.full_name.clone());
    queue.push_back((ty.full_name.clone(), 0));

    while let Some((full_name, depth)) = queue.pop_front() {
        if depth >= max_depth {
            continue;
        }
        let Some(children) = derived_map.get(&full_name) else {
            continue;
        };
        for child in children {
            if !visited.insert(child.full_name.clone()) {
                continue;
            }
            derived.push(json!({
                "fullName": child.full_name,
                "depth": depth + 1,
                "token": child.token.value(),
                "moduleMvid": child.mvid_text(),
            }));
            queue.push_back((child.full_name.clone(), depth + 1));
        }
    }

    Ok(json!({
        "baseChain": chain,
        "derivedTypes": derived,
    }))
}

/// `findDerivedTypes` - derived-type enumeration with optional unbounded depth
/// and optional inclusion of the root.
pub(crate) fn find_derived_types(
    ctx: &QueryContext<'_>,
    params: &Map<String, Value>,
) -> Result<Value> {
    let module = find_module(ctx, params, "moduleMvid")?;
    let ty = resolve_type(&module, require_u32(params, "typeToken")?)?;
    let include_self = get_bool(params, "includeSelf", false);
    let max_depth = get_int(params, "maxDepth", -1) as i32;
    let mut collector = SearchCollector::new(max_results(params));

    let modules = build_module_index(ctx.workspace);
    let derived_map = build_derived_map(&modules);
    for entry in enumerate_derived(&ty, &derived_map, include_self, max_depth) {
        if collector.truncated() {
            break;
        }
        let mut record = type_to_json(&entry.ty);
        record["depth"] = json!(entry.depth);
        collector.try_add(
            format!("type:{}:{:08X}", entry.ty.mvid_text(), entry.ty.token.value()),
            record,
        );
    }
    Ok(results_json(collector))
}

/// `findImplementations` - implementors/overriders of a method, or
/// implementors/subtypes of a type.
pub(crate) fn find_implementations(
    ctx: &QueryContext<'_>,
    params: &Map<String, Value>,
) -> Result<Value> {
    let module = find_module(ctx, params, "moduleMvid")?;
    let method_token = opt_u32(params, "methodToken")?;
    let type_token = opt_u32(params, "typeToken")?;
    let include_abstract = get_bool(params, "includeAbstract", true);
    if method_token.is_none() && type_token.is_none() {
        return Err(Error::InvalidParameter(
            "Missing parameter: methodToken or typeToken".to_string(),
        ));
    }

    let mut collector = SearchCollector::new(max_results(params));
    let modules = crate::rpc::handlers::scope_modules(ctx, params);
    let derived_map = build_derived_map(&modules);
    let type_index = TypeIndex::build(&modules);
    let all_types = || modules.iter().flat_map(|entry| entry.module.types());

    if let Some(token) = method_token {
        let method = resolve_method(&module, token)?;
        let declaring = method
            .declaring_type()
            .ok_or_else(|| invalid_param_error!("Declaring type not found"))?;
        if declaring.is_interface() {
            for candidate in all_types() {
                if collector.truncated() {
                    break;
                }
                if !include_abstract && candidate.is_abstract() {
                    continue;
                }
                if !type_implements_interface(candidate, &declaring, &type_index) {
                    continue;
                }
                let Some(implementation) = find_interface_implementation(candidate, &method)
                else {
                    continue;
                };
                collector.try_add(
                    format!(
                        "impl:{}:{:08X}",
                        candidate.mvid_text(),
                        implementation.token.value()
                    ),
                    json!({
                        "implementationKind": "interface",
                        "declaringType": candidate.full_name,
                        "declaringTypeToken": candidate.token.value(),
                        "methodName": implementation.name,
                        "methodFullName": implementation.full_name,
                        "methodToken": implementation.token.value(),
                        "moduleMvid": candidate.mvid_text(),
                    }),
                );
            }
        } else {
            for entry in enumerate_derived(&declaring, &derived_map, false, -1) {
                if collector.truncated() {
                    break;
                }
                if !include_abstract && entry.ty.is_abstract() {
                    continue;
                }
                let Some(implementation) = find_override_method(&entry.ty, &method) else {
                    continue;
                };
                collector.try_add(
                    format!(
                        "impl:{}:{:08X}",
                        entry.ty.mvid_text(),
                        implementation.token.value()
                    ),
                    json!({
                        "implementationKind": "override",
                        "declaringType": entry.ty.full_name,
                        "declaringTypeToken": entry.ty.token.value(),
                        "methodName": implementation.name,
                        "methodFullName": implementation.full_name,
                        "methodToken": implementation.token.value(),
                        "moduleMvid": entry.ty.mvid_text(),
                    }),
                );
            }
        }
    } else if let Some(token) = type_token {
        let target = resolve_type(&module, token)?;
        if target.is_interface() {
            for candidate in all_types() {
                if collector.truncated() {
                    break;
                }
                if !include_abstract && candidate.is_abstract() {
                    continue;
                }
                if !type_implements_interface(candidate, &target, &type_index) {
                    continue;
                }
                let mut record = type_to_json(candidate);
                record["implementationKind"] = json!("interface");
                collector.try_add(
                    format!("type:{}:{:08X}", candidate.mvid_text(), candidate.token.value()),
                    record,
                );
            }
        } else {
            for entry in enumerate_derived(&target, &derived_map, false, -1) {
                if collector.truncated() {
                    break;
                }
                if !include_abstract && entry.ty.is_abstract() {
                    continue;
                }
                let mut record = type_to_json(&entry.ty);
                record["implementationKind"] = json!("derived");
                record["depth"] = json!(entry.depth);
                collector.try_add(
                    format!("type:{}:{:08X}", entry.ty.mvid_text(), entry.ty.token.value()),
                    record,
                );
            }
        }
    }

    Ok(results_json(collector))
}

/// `findPathToType` - shortest field/property reference path between two
/// types.
pub(crate) fn find_path_to_type(
    ctx: &QueryContext<'_>,
    params: &Map<String, Value>,
) -> Result<Value> {
    let from_module = find_module(ctx, params, "fromModuleMvid")?;
    let from_type = resolve_type(&from_module, require_u32(params, "fromTypeToken")?)?;
    let max_depth = get_int(params, "maxDepth", 4).max(1) as u32;

    let modules = build_module_index(ctx.workspace);
    let index = TypeIndex::build(&modules);
    let to_type: CilTypeRc = if let Some(to_token) = opt_u32(params, "toTypeToken")? {
        let to_module = find_module(ctx, params, "toModuleMvid")?;
        resolve_type(&to_module, to_token)?
    } else {
        let full_name = require_str(params, "toTypeFullName")?;
        index
            .get(&full_name)
            .cloned()
            .ok_or_else(|| invalid_param_error!("Target type not found"))?
    };

    match find_path(&from_type, &to_type, max_depth, &index) {
        None => Ok(json!({
            "found": false,
            "path": [],
        })),
        Some(hops) => Ok(json!({
            "found": true,
            "depth": hops.len(),
            "path": hops,
        })),
    }
}

/// `getOverridesChain` - the base-method chain above a method plus every
/// override below it.
pub(crate) fn get_overrides_chain(
    ctx: &QueryContext<'_>,
    params: &Map<String, Value>,
) -> Result<Value> {
    let module = find_module(ctx, params, "moduleMvid")?;
    let method = resolve_method(&module, require_u32(params, "token")?)?;

    let mut chain = vec![method.clone()];
    let mut current = method.clone();
    while let Some(base_method) = find_base_method(&current) {
        chain.push(base_method.clone());
        current = base_method;
    }
    chain.reverse();
    let base_array: Vec<Value> = chain
        .iter()
        .map(|m| {
            let declaring = m.declaring_type();
            json!({
                "methodName": m.name,
                "methodFullName": m.full_name,
                "methodToken": m.token.value(),
                "declaringType": declaring.as_ref().map_or("", |t| t.full_name.as_str()),
                "declaringTypeToken": declaring.as_ref().map_or(0, |t| t.token.value()),
                "moduleMvid": m.mvid_text(),
            })
        })
        .collect();

    let mut collector = SearchCollector::new(max_results(params));
    if let Some(declaring) = method.declaring_type() {
        let modules = build_module_index(ctx.workspace);
        let derived_map = build_derived_map(&modules);
        for entry in enumerate_derived(&declaring, &derived_map, false, -1) {
            if collector.truncated() {
                break;
            }
            let Some(implementation) = find_override_method(&entry.ty, &method) else {
                continue;
            };
            collector.try_add(
                format!(
                    "override:{}:{:08X}",
                    entry.ty.mvid_text(),
                    implementation.token.value()
                ),
                json!({
                    "methodName": implementation.name,
                    "methodFullName": implementation.full_name,
                    "methodToken": implementation.token.value(),
                    "declaringType": entry.ty.full_name,
                    "declaringTypeToken": entry.ty.token.value(),
                    "moduleMvid": entry.ty.mvid_text(),
                    "depth": entry.depth,
                }),
            );
        }
    }

    let (overrides, truncated) = collector.into_results();
    Ok(json!({
        "baseChain": base_array,
        "overrides": overrides,
        "tooManyResults": truncated,
    }))
}
