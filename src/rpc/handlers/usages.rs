//! Reference and usage discovery operations.

use serde_json::{Map, Value};

use crate::analysis::{
    collector::SearchCollector,
    indices::build_module_index,
    usages::{
        event_targets, find_field_references, find_field_usages as scan_field_usages,
        find_method_references, find_method_usages as scan_method_usages, find_type_references,
        find_type_usages as scan_type_usages, list_callees, property_targets, MethodTarget,
    },
};
use crate::rpc::dispatch::QueryContext;
use crate::rpc::handlers::{
    find_module, resolve_event, resolve_field, resolve_method, resolve_property, resolve_type,
    results_json, scope_modules,
};
use crate::rpc::params::{max_results, opt_str, require_str, require_u32};
use crate::{Error, Result};

/// `findReferences` - call/access/dependency references to a member or type.
pub(crate) fn find_references(
    ctx: &QueryContext<'_>,
    params: &Map<String, Value>,
) -> Result<Value> {
    let kind = require_str(params, "kind")?.to_lowercase();
    let module = find_module(ctx, params, "moduleMvid")?;
    let token = require_u32(params, "token")?;
    let mut collector = SearchCollector::new(max_results(params));
    let modules = build_module_index(ctx.workspace);

    match kind.as_str() {
        "method" => {
            let method = resolve_method(&module, token)?;
            find_method_references(
                &modules,
                &[MethodTarget::plain(method)],
                &mut collector,
                false,
            );
        }
        "field" => {
            let field = resolve_field(&module, token)?;
            find_field_references(&modules, &field, &mut collector);
        }
        "property" => {
            let property = resolve_property(&module, token)?;
            let targets = property_targets(&property);
            find_method_references(&modules, &targets, &mut collector, false);
        }
        "event" => {
            let event = resolve_event(&module, token)?;
            let targets = event_targets(&event);
            find_method_references(&modules, &targets, &mut collector, false);
        }
        "type" => {
            let ty = resolve_type(&module, token)?;
            find_type_references(&modules, &ty, &mut collector);
        }
        other => {
            return Err(Error::InvalidParameter(format!("Unknown kind: {other}")));
        }
    }
    Ok(results_json(collector))
}

/// `getCallers` - methods whose bodies call the target method.
pub(crate) fn get_callers(ctx: &QueryContext<'_>, params: &Map<String, Value>) -> Result<Value> {
    let module = find_module(ctx, params, "moduleMvid")?;
    let method = resolve_method(&module, require_u32(params, "token")?)?;
    let mut collector = SearchCollector::new(max_results(params));
    let modules = build_module_index(ctx.workspace);
    find_method_references(&modules, &[MethodTarget::plain(method)], &mut collector, true);
    Ok(results_json(collector))
}

/// `getCallees` - methods the target method calls.
pub(crate) fn get_callees(ctx: &QueryContext<'_>, params: &Map<String, Value>) -> Result<Value> {
    let module = find_module(ctx, params, "moduleMvid")?;
    let method = resolve_method(&module, require_u32(params, "token")?)?;
    let mut collector = SearchCollector::new(max_results(params));
    list_callees(&method, &mut collector);
    Ok(results_json(collector))
}

/// `findTypeUsages` - declaration slots using the target type.
pub(crate) fn find_type_usages(
    ctx: &QueryContext<'_>,
    params: &Map<String, Value>,
) -> Result<Value> {
    let module = find_module(ctx, params, "moduleMvid")?;
    let ty = resolve_type(&module, require_u32(params, "typeToken")?)?;
    let mut collector = SearchCollector::new(max_results(params));
    let modules = scope_modules(ctx, params);
    scan_type_usages(&modules, &ty, &mut collector);
    Ok(results_json(collector))
}

/// `findMethodUsages` - classified call sites of the target method.
pub(crate) fn find_method_usages(
    ctx: &QueryContext<'_>,
    params: &Map<String, Value>,
) -> Result<Value> {
    let module = find_module(ctx, params, "moduleMvid")?;
    let method = resolve_method(&module, require_u32(params, "token")?)?;
    let mut collector = SearchCollector::new(max_results(params));
    let modules = scope_modules(ctx, params);
    scan_method_usages(&modules, &method, &mut collector);
    Ok(results_json(collector))
}

/// `findFieldUsages` - classified field accesses, optionally filtered to one
/// access kind.
pub(crate) fn find_field_usages(
    ctx: &QueryContext<'_>,
    params: &Map<String, Value>,
) -> Result<Value> {
    let module = find_module(ctx, params, "moduleMvid")?;
    let field = resolve_field(&module, require_u32(params, "token")?)?;
    let access_kind = opt_str(params, "accessKind")
        .unwrap_or_else(|| "any".to_string())
        .to_lowercase();
    if !matches!(access_kind.as_str(), "any" | "read" | "write" | "address") {
        return Err(Error::InvalidParameter(format!(
            "Unknown accessKind: {access_kind}"
        )));
    }
    let mut collector = SearchCollector::new(max_results(params));
    let modules = scope_modules(ctx, params);
    scan_field_usages(&modules, &field, &access_kind, &mut collector);
    Ok(results_json(collector))
}
