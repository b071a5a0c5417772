//! Module and assembly level operations.

use std::collections::HashSet;

use serde_json::{json, Map, Value};

use crate::analysis::indices::{build_module_index, filter_modules};
use crate::rpc::dispatch::QueryContext;
use crate::rpc::handlers::find_module;
use crate::rpc::params::get_bool;
use crate::Result;

/// `listAssemblies` - one record per loaded module.
pub(crate) fn list_assemblies(
    ctx: &QueryContext<'_>,
    _params: &Map<String, Value>,
) -> Result<Value> {
    let mut list = Vec::new();
    for entry in build_module_index(ctx.workspace) {
        let module = &entry.module;
        list.push(json!({
            "moduleName": module.name,
            "moduleMvid": entry.mvid,
            "assemblyName": module.assembly_name(),
            "assemblyFullName": module.assembly.as_ref().map(|a| a.full_name.clone()),
            "filename": module.path,
        }));
    }
    Ok(Value::Array(list))
}

/// `getAssemblyInfo` - identity, references and resources of one module.
pub(crate) fn get_assembly_info(
    ctx: &QueryContext<'_>,
    params: &Map<String, Value>,
) -> Result<Value> {
    let module = find_module(ctx, params, "moduleMvid")?;
    let assembly = module.assembly.as_ref();

    let references: Vec<Value> = module
        .assembly_refs
        .iter()
        .map(|reference| {
            json!({
                "name": reference.name,
                "fullName": reference.full_name,
                "version": reference.version,
            })
        })
        .collect();

    let resources: Vec<Value> = module
        .resources
        .iter()
        .map(|resource| {
            json!({
                "name": resource.name,
                "resourceType": resource.kind,
            })
        })
        .collect();

    Ok(json!({
        "assemblyName": assembly.map_or("", |a| a.name.as_str()),
        "assemblyFullName": assembly.map_or("", |a| a.full_name.as_str()),
        "version": assembly.map_or("", |a| a.version.as_str()),
        "culture": assembly.map_or("", |a| a.culture.as_str()),
        "publicKeyToken": assembly.map_or("", |a| a.public_key_token.as_str()),
        "modules": [{
            "moduleName": module.name,
            "moduleMvid": module.mvid_text(),
            "filename": module.path,
        }],
        "references": references,
        "resources": resources,
        "moduleMvid": module.mvid_text(),
        "filename": module.path,
    }))
}

/// `listNamespaces` - distinct namespaces of a module, sorted.
pub(crate) fn list_namespaces(
    ctx: &QueryContext<'_>,
    params: &Map<String, Value>,
) -> Result<Value> {
    let module = find_module(ctx, params, "moduleMvid")?;
    let mut namespaces: Vec<String> = module
        .types()
        .map(|ty| ty.namespace.clone())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    namespaces.sort();
    Ok(json!(namespaces))
}

/// `getAssemblyGraph` - assembly nodes and reference edges across the
/// workspace.
pub(crate) fn get_assembly_graph(
    ctx: &QueryContext<'_>,
    params: &Map<String, Value>,
) -> Result<Value> {
    let include_framework = get_bool(params, "includeFrameworkAssemblies", true);
    let modules = filter_modules(build_module_index(ctx.workspace), include_framework);

    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    let mut node_keys: HashSet<String> = HashSet::new();
    let mut edge_keys: HashSet<String> = HashSet::new();

    for entry in &modules {
        let module = &entry.module;
        let assembly_name = module.assembly_name().to_string();
        let assembly_full = module
            .assembly
            .as_ref()
            .map(|a| a.full_name.clone())
            .unwrap_or_default();
        let node_key = if assembly_full.is_empty() {
            entry.mvid.clone()
        } else {
            assembly_full.clone()
        };
        if node_keys.insert(node_key.clone()) {
            nodes.push(json!({
                "assemblyName": assembly_name,
                "assemblyFullName": assembly_full,
                "moduleMvid": entry.mvid,
                "filename": module.path,
            }));
        }

        for reference in &module.assembly_refs {
            let edge_key = format!("{node_key}->{}", reference.full_name);
            if !edge_keys.insert(edge_key) {
                continue;
            }
            edges.push(json!({
                "fromAssembly": assembly_full,
                "fromModuleMvid": entry.mvid,
                "toAssembly": reference.name,
                "toAssemblyFullName": reference.full_name,
            }));
        }
    }

    Ok(json!({
        "nodes": nodes,
        "edges": edges,
    }))
}
