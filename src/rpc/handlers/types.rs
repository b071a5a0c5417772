//! Type and member inspection operations.

use serde_json::{json, Map, Value};

use crate::analysis::pattern::PatternMatcher;
use crate::metadata::types::TypeFlags;
use crate::rpc::dispatch::QueryContext;
use crate::rpc::handlers::{
    event_info_json, field_info_json, find_module, member_to_json, method_info_json,
    property_info_json, resolve_method, resolve_property, resolve_type,
};
use crate::rpc::params::{get_bool, opt_str, opt_u32, require_str, require_str_allow_empty,
    require_u32};
use crate::Result;

/// `listTypes` - all types of a module within one namespace (empty string for
/// the global namespace).
pub(crate) fn list_types(ctx: &QueryContext<'_>, params: &Map<String, Value>) -> Result<Value> {
    let module = find_module(ctx, params, "moduleMvid")?;
    let namespace = require_str_allow_empty(params, "namespace")?;
    let mvid = module.mvid_text();
    let types: Vec<Value> = module
        .types()
        .filter(|ty| ty.namespace == namespace)
        .map(|ty| {
            json!({
                "name": ty.name,
                "fullName": ty.full_name,
                "isNested": ty.is_nested(),
                "token": ty.token.value(),
                "moduleMvid": mvid,
            })
        })
        .collect();
    Ok(Value::Array(types))
}

/// `listMembers` - every member of a type, tagged by kind.
pub(crate) fn list_members(ctx: &QueryContext<'_>, params: &Map<String, Value>) -> Result<Value> {
    let module = find_module(ctx, params, "moduleMvid")?;
    let ty = resolve_type(&module, require_u32(params, "typeToken")?)?;
    let mvid = module.mvid_text();

    let mut list = Vec::new();
    for (_, method) in ty.methods.iter() {
        list.push(member_to_json(
            "method",
            &method.name,
            &method.full_name,
            method.token.value(),
            &mvid,
        ));
    }
    for (_, field) in ty.fields.iter() {
        list.push(member_to_json(
            "field",
            &field.name,
            &field.full_name,
            field.token.value(),
            &mvid,
        ));
    }
    for (_, property) in ty.properties.iter() {
        list.push(member_to_json(
            "property",
            &property.name,
            &property.full_name,
            property.token.value(),
            &mvid,
        ));
    }
    for (_, event) in ty.events.iter() {
        list.push(member_to_json(
            "event",
            &event.name,
            &event.full_name,
            event.token.value(),
            &mvid,
        ));
    }
    Ok(Value::Array(list))
}

/// `getTypeInfo` - the full structural picture of one type.
pub(crate) fn get_type_info(ctx: &QueryContext<'_>, params: &Map<String, Value>) -> Result<Value> {
    let module = find_module(ctx, params, "moduleMvid")?;
    let ty = resolve_type(&module, require_u32(params, "typeToken")?)?;

    let fields: Vec<Value> = ty.fields.iter().map(|(_, f)| field_info_json(f)).collect();
    let properties: Vec<Value> = ty
        .properties
        .iter()
        .map(|(_, p)| property_info_json(p))
        .collect();
    let methods: Vec<Value> = ty.methods.iter().map(|(_, m)| method_info_json(m)).collect();
    let events: Vec<Value> = ty.events.iter().map(|(_, e)| event_info_json(e)).collect();
    let attributes: Vec<Value> = ty
        .attributes
        .iter()
        .map(|a| json!(a.attribute_type.full_name()))
        .collect();
    let interfaces: Vec<Value> = ty
        .interfaces
        .iter()
        .map(|i| json!(i.full_name()))
        .collect();

    Ok(json!({
        "name": ty.name,
        "fullName": ty.full_name,
        "namespace": ty.namespace,
        "baseType": ty.base.as_ref().map_or("", |b| b.full_name()),
        "interfaces": interfaces,
        "attributes": attributes,
        "isPublic": ty.flags.contains(TypeFlags::PUBLIC),
        "isNested": ty.is_nested(),
        "isAbstract": ty.is_abstract(),
        "isSealed": ty.is_sealed(),
        "isStatic": ty.is_static(),
        "isValueType": ty.is_value_type(),
        "isEnum": ty.is_enum(),
        "isInterface": ty.is_interface(),
        "isDelegate": ty.is_delegate(),
        "fields": fields,
        "properties": properties,
        "methods": methods,
        "events": events,
        "token": ty.token.value(),
        "moduleMvid": module.mvid_text(),
    }))
}

/// `getTypeFields` - fields of a type filtered by a name pattern.
pub(crate) fn get_type_fields(
    ctx: &QueryContext<'_>,
    params: &Map<String, Value>,
) -> Result<Value> {
    let module = find_module(ctx, params, "moduleMvid")?;
    let ty = resolve_type(&module, require_u32(params, "typeToken")?)?;
    let pattern = opt_str(params, "pattern").unwrap_or_else(|| "*".to_string());
    let case_sensitive = get_bool(params, "caseSensitive", false);
    let use_regex = get_bool(params, "useRegex", false);
    let matcher = PatternMatcher::compile(&pattern, use_regex, case_sensitive)?;

    let fields: Vec<Value> = ty
        .fields
        .iter()
        .filter(|(_, field)| {
            matcher.is_match(&field.name) || matcher.is_match(&field.full_name)
        })
        .map(|(_, field)| field_info_json(field))
        .collect();
    Ok(Value::Array(fields))
}

/// `getTypeProperty` - one property, addressed by token or by type + name.
pub(crate) fn get_type_property(
    ctx: &QueryContext<'_>,
    params: &Map<String, Value>,
) -> Result<Value> {
    let module = find_module(ctx, params, "moduleMvid")?;
    if let Some(token) = opt_u32(params, "propertyToken")? {
        let property = resolve_property(&module, token)?;
        return Ok(property_info_json(&property));
    }

    let ty = resolve_type(&module, require_u32(params, "typeToken")?)?;
    let name = require_str(params, "name")?;
    let case_sensitive = get_bool(params, "caseSensitive", false);
    for (_, property) in ty.properties.iter() {
        let matched = if case_sensitive {
            property.name == name
        } else {
            property.name.eq_ignore_ascii_case(&name)
        };
        if matched {
            return Ok(property_info_json(property));
        }
    }
    Err(invalid_param_error!("Property not found"))
}

/// `getFieldInfo` - one field with flags and constant.
pub(crate) fn get_field_info(
    ctx: &QueryContext<'_>,
    params: &Map<String, Value>,
) -> Result<Value> {
    let module = find_module(ctx, params, "moduleMvid")?;
    let field = crate::rpc::handlers::resolve_field(&module, require_u32(params, "token")?)?;
    Ok(field_info_json(&field))
}

/// `getEnumInfo` - name/value pairs of an enum definition.
pub(crate) fn get_enum_info(ctx: &QueryContext<'_>, params: &Map<String, Value>) -> Result<Value> {
    let module = find_module(ctx, params, "moduleMvid")?;
    let ty = resolve_type(&module, require_u32(params, "typeToken")?)?;
    if !ty.is_enum() {
        return Err(invalid_param_error!("Type is not an enum"));
    }

    let mut values = Vec::new();
    let mut underlying = String::new();
    for (_, field) in ty.fields.iter() {
        if field.name == "value__" {
            underlying = field.field_type.full_name();
            continue;
        }
        if !field.is_static() || field.constant.is_none() {
            continue;
        }
        values.push(json!({
            "name": field.name,
            "value": field.constant.as_ref().map_or(Value::Null, |c| c.to_json()),
            "token": field.token.value(),
        }));
    }

    Ok(json!({
        "name": ty.name,
        "fullName": ty.full_name,
        "underlyingType": underlying,
        "values": values,
        "token": ty.token.value(),
        "moduleMvid": module.mvid_text(),
    }))
}

/// `getStructInfo` - layout and fields of a value type.
pub(crate) fn get_struct_info(
    ctx: &QueryContext<'_>,
    params: &Map<String, Value>,
) -> Result<Value> {
    let module = find_module(ctx, params, "moduleMvid")?;
    let ty = resolve_type(&module, require_u32(params, "typeToken")?)?;
    if !ty.is_value_type() || ty.is_enum() {
        return Err(invalid_param_error!("Type is not a struct"));
    }

    let fields: Vec<Value> = ty
        .fields
        .iter()
        .map(|(_, field)| {
            json!({
                "name": field.name,
                "fieldType": field.field_type.full_name(),
                "isStatic": field.is_static(),
                "token": field.token.value(),
            })
        })
        .collect();

    Ok(json!({
        "name": ty.name,
        "fullName": ty.full_name,
        "isExplicitLayout": ty.flags.contains(TypeFlags::EXPLICIT_LAYOUT),
        "isSequentialLayout": ty.flags.contains(TypeFlags::SEQUENTIAL_LAYOUT),
        "packingSize": ty.layout.map_or(0, |l| u32::from(l.packing_size)),
        "classSize": ty.layout.map_or(0, |l| l.class_size),
        "fields": fields,
        "token": ty.token.value(),
        "moduleMvid": module.mvid_text(),
    }))
}

/// `getInterfaceInfo` - members and base interfaces of an interface.
pub(crate) fn get_interface_info(
    ctx: &QueryContext<'_>,
    params: &Map<String, Value>,
) -> Result<Value> {
    let module = find_module(ctx, params, "moduleMvid")?;
    let ty = resolve_type(&module, require_u32(params, "typeToken")?)?;
    if !ty.is_interface() {
        return Err(invalid_param_error!("Type is not an interface"));
    }

    let methods: Vec<Value> = ty
        .methods
        .iter()
        .map(|(_, m)| json!({"name": m.name, "fullName": m.full_name, "token": m.token.value()}))
        .collect();
    let properties: Vec<Value> = ty
        .properties
        .iter()
        .map(|(_, p)| json!({"name": p.name, "fullName": p.full_name, "token": p.token.value()}))
        .collect();
    let events: Vec<Value> = ty
        .events
        .iter()
        .map(|(_, e)| json!({"name": e.name, "fullName": e.full_name, "token": e.token.value()}))
        .collect();
    let base_interfaces: Vec<Value> = ty
        .interfaces
        .iter()
        .map(|i| json!(i.full_name()))
        .collect();

    Ok(json!({
        "name": ty.name,
        "fullName": ty.full_name,
        "baseInterfaces": base_interfaces,
        "methods": methods,
        "properties": properties,
        "events": events,
        "token": ty.token.value(),
        "moduleMvid": module.mvid_text(),
    }))
}

/// `getMethodSignature` - the declared shape of one method.
pub(crate) fn get_method_signature(
    ctx: &QueryContext<'_>,
    params: &Map<String, Value>,
) -> Result<Value> {
    let module = find_module(ctx, params, "moduleMvid")?;
    let method = resolve_method(&module, require_u32(params, "token")?)?;

    let parameters: Vec<Value> = method
        .params
        .iter()
        .map(|param| {
            json!({
                "name": param.name,
                "index": param.index,
                "type": param.param_type.full_name(),
                "hasDefault": param.default.is_some(),
                "defaultValue": param.default.as_ref().map_or(Value::Null, |c| c.to_json()),
                "isOptional": param.optional,
            })
        })
        .collect();
    let generic_params: Vec<Value> = method
        .generic_params
        .iter()
        .map(|gp| json!(gp.name))
        .collect();

    use crate::metadata::members::MethodFlags;
    Ok(json!({
        "name": method.name,
        "fullName": method.full_name,
        "returnType": method.signature.return_type.full_name(),
        "parameters": parameters,
        "genericParameters": generic_params,
        "isStatic": method.is_static(),
        "isPublic": method.flags.contains(MethodFlags::PUBLIC),
        "isPrivate": method.flags.contains(MethodFlags::PRIVATE),
        "isFamily": method.flags.contains(MethodFlags::FAMILY),
        "isAssembly": method.flags.contains(MethodFlags::ASSEMBLY),
        "isAbstract": method.is_abstract(),
        "isVirtual": method.is_virtual(),
        "isConstructor": method.is_constructor(),
        "token": method.token.value(),
        "moduleMvid": module.mvid_text(),
    }))
}
