//! Operation handlers.
//!
//! One function per wire operation, grouped by concern. Handlers are
//! stateless: each receives the query context (workspace + decompiler) and the
//! request's parameter object, builds whatever per-query indices it needs, and
//! returns a JSON result.

pub(crate) mod bodies;
pub(crate) mod decompile;
pub(crate) mod graph;
pub(crate) mod modules;
pub(crate) mod searches;
pub(crate) mod types;
pub(crate) mod usages;

use serde_json::{json, Map, Value};

use crate::analysis::collector::SearchCollector;
use crate::analysis::indices::{build_module_index, filter_modules, ModuleEntry};
use crate::metadata::{
    members::{EventRc, FieldRc, MethodRc, PropertyRc},
    module::{CilDef, ModuleRc},
    token::Token,
    types::CilTypeRc,
};
use crate::rpc::dispatch::QueryContext;
use crate::rpc::params::{get_bool, require_mvid};
use crate::Result;

pub(crate) fn find_module(
    ctx: &QueryContext<'_>,
    params: &Map<String, Value>,
    name: &str,
) -> Result<ModuleRc> {
    let mvid = require_mvid(params, name)?;
    ctx.workspace
        .module_by_mvid(&mvid)
        .ok_or_else(|| invalid_param_error!("Module not found"))
}

pub(crate) fn resolve_def(module: &ModuleRc, token: u32) -> Result<CilDef> {
    module
        .resolve_token(Token::new(token))
        .ok_or_else(|| invalid_param_error!("Member not found"))
}

pub(crate) fn resolve_type(module: &ModuleRc, token: u32) -> Result<CilTypeRc> {
    module
        .resolve_token(Token::new(token))
        .and_then(|def| def.as_type())
        .ok_or_else(|| invalid_param_error!("Type not found"))
}

pub(crate) fn resolve_method(module: &ModuleRc, token: u32) -> Result<MethodRc> {
    module
        .resolve_token(Token::new(token))
        .and_then(|def| def.as_method())
        .ok_or_else(|| invalid_param_error!("Member not found"))
}

pub(crate) fn resolve_field(module: &ModuleRc, token: u32) -> Result<FieldRc> {
    module
        .resolve_token(Token::new(token))
        .and_then(|def| def.as_field())
        .ok_or_else(|| invalid_param_error!("Member not found"))
}

pub(crate) fn resolve_property(module: &ModuleRc, token: u32) -> Result<PropertyRc> {
    module
        .resolve_token(Token::new(token))
        .and_then(|def| def.as_property())
        .ok_or_else(|| invalid_param_error!("Member not found"))
}

pub(crate) fn resolve_event(module: &ModuleRc, token: u32) -> Result<EventRc> {
    module
        .resolve_token(Token::new(token))
        .and_then(|def| def.as_event())
        .ok_or_else(|| invalid_param_error!("Member not found"))
}

/// Builds the module scope for a scan, honoring `searchFrameworkAssemblies`.
pub(crate) fn scope_modules(
    ctx: &QueryContext<'_>,
    params: &Map<String, Value>,
) -> Vec<ModuleEntry> {
    let include_framework = get_bool(params, "searchFrameworkAssemblies", true);
    filter_modules(build_module_index(ctx.workspace), include_framework)
}

/// The standard `{ results, tooManyResults }` response shape.
pub(crate) fn results_json(collector: SearchCollector) -> Value {
    let (results, truncated) = collector.into_results();
    json!({
        "results": results,
        "tooManyResults": truncated,
    })
}

pub(crate) fn type_to_json(ty: &CilTypeRc) -> Value {
    json!({
        "kind": "type",
        "name": ty.name,
        "fullName": ty.full_name,
        "token": ty.token.value(),
        "moduleMvid": ty.mvid_text(),
    })
}

pub(crate) fn member_to_json(kind: &str, name: &str, full_name: &str, token: u32, mvid: &str) -> Value {
    json!({
        "kind": kind,
        "name": name,
        "fullName": full_name,
        "token": token,
        "moduleMvid": mvid,
    })
}

pub(crate) fn field_info_json(field: &FieldRc) -> Value {
    json!({
        "name": field.name,
        "fullName": field.full_name,
        "fieldType": field.field_type.full_name(),
        "isStatic": field.is_static(),
        "isInitOnly": field.is_init_only(),
        "isLiteral": field.is_literal(),
        "hasConstant": field.constant.is_some(),
        "constantValue": field.constant.as_ref().map_or(Value::Null, |c| c.to_json()),
        "token": field.token.value(),
        "moduleMvid": field.mvid_text(),
    })
}

pub(crate) fn property_info_json(property: &PropertyRc) -> Value {
    let getter = property.getter.as_ref().and_then(|link| link.resolve());
    let setter = property.setter.as_ref().and_then(|link| link.resolve());
    json!({
        "name": property.name,
        "fullName": property.full_name,
        "propertyType": property.property_type.full_name(),
        "hasGetter": getter.is_some(),
        "hasSetter": setter.is_some(),
        "getterToken": getter.map_or(0, |m| m.token.value()),
        "setterToken": setter.map_or(0, |m| m.token.value()),
        "token": property.token.value(),
        "moduleMvid": property.mvid_text(),
    })
}

pub(crate) fn method_info_json(method: &MethodRc) -> Value {
    json!({
        "name": method.name,
        "fullName": method.full_name,
        "signature": method.signature.to_string(),
        "isStatic": method.is_static(),
        "isPublic": method.flags.contains(crate::metadata::members::MethodFlags::PUBLIC),
        "isAbstract": method.is_abstract(),
        "isVirtual": method.is_virtual(),
        "isConstructor": method.is_constructor(),
        "token": method.token.value(),
        "moduleMvid": method.mvid_text(),
    })
}

pub(crate) fn event_info_json(event: &EventRc) -> Value {
    let add = event.add.as_ref().and_then(|link| link.resolve());
    let remove = event.remove.as_ref().and_then(|link| link.resolve());
    let raise = event.raise.as_ref().and_then(|link| link.resolve());
    json!({
        "name": event.name,
        "fullName": event.full_name,
        "eventType": event.event_type.full_name(),
        "addToken": add.map_or(0, |m| m.token.value()),
        "removeToken": remove.map_or(0, |m| m.token.value()),
        "raiseToken": raise.map_or(0, |m| m.token.value()),
        "token": event.token.value(),
        "moduleMvid": event.mvid_text(),
    })
}
