//! Usage and reference discovery.
//!
//! Scans every method body's instruction stream and every declaration slot in
//! the query scope to find callers, callees, field accesses, type usages and
//! attribute applications. Records are emitted into a
//! [`SearchCollector`](crate::analysis::collector::SearchCollector) with
//! `(mvid, token)`-based dedup keys; scans stop early once the collector is
//! full.

use std::sync::Arc;

use serde_json::json;

use crate::analysis::{
    collector::SearchCollector,
    dependencies::collect_type_dependencies,
    hierarchy::method_link_matches,
    indices::ModuleEntry,
    pattern::PatternMatcher,
};
use crate::metadata::{
    body::Operand,
    members::{EventRc, Field, FieldRc, MemberLink, MethodRc, PropertyRc},
    types::{CilTypeRc, CustomAttribute},
};

/// A method reference-search target, optionally tagged with the accessor slot
/// it came from (`get`, `set`, `add`, `remove`, `raise`).
pub struct MethodTarget {
    /// The target method definition.
    pub method: MethodRc,
    /// Accessor tag when the target was derived from a property or event.
    pub accessor: Option<&'static str>,
}

impl MethodTarget {
    /// Wraps a plain method target.
    #[must_use]
    pub fn plain(method: MethodRc) -> Self {
        MethodTarget {
            method,
            accessor: None,
        }
    }
}

/// Expands a property into its accessor method targets.
#[must_use]
pub fn property_targets(property: &PropertyRc) -> Vec<MethodTarget> {
    let mut targets = Vec::new();
    if let Some(getter) = property.getter.as_ref().and_then(MemberLink::resolve) {
        targets.push(MethodTarget {
            method: getter,
            accessor: Some("get"),
        });
    }
    if let Some(setter) = property.setter.as_ref().and_then(MemberLink::resolve) {
        targets.push(MethodTarget {
            method: setter,
            accessor: Some("set"),
        });
    }
    targets
}

/// Expands an event into its accessor method targets.
#[must_use]
pub fn event_targets(event: &EventRc) -> Vec<MethodTarget> {
    let mut targets = Vec::new();
    if let Some(add) = event.add.as_ref().and_then(MemberLink::resolve) {
        targets.push(MethodTarget {
            method: add,
            accessor: Some("add"),
        });
    }
    if let Some(remove) = event.remove.as_ref().and_then(MemberLink::resolve) {
        targets.push(MethodTarget {
            method: remove,
            accessor: Some("remove"),
        });
    }
    if let Some(raise) = event.raise.as_ref().and_then(MemberLink::resolve) {
        targets.push(MethodTarget {
            method: raise,
            accessor: Some("raise"),
        });
    }
    targets
}

/// Returns `true` if two field definitions are the same definition.
#[must_use]
pub fn fields_match(candidate: &FieldRc, target: &FieldRc) -> bool {
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

/// Returns `true` if a field link designates `target`.
#[must_use]
pub fn field_link_matches(link: &MemberLink<Field>, target: &FieldRc) -> bool {
    match link.resolve() {
        Some(resolved) => fields_match(&resolved, target),
        None => link.full_name() == target.full_name,
    }
}

fn simple_name_of(full_name: &str) -> &str {
    full_name.rsplit("::").next().unwrap_or(full_name)
}

/// Finds call-site references to any of `targets` across the module scope.
///
/// With `callers_only` each calling method is reported once, without
/// per-instruction detail; otherwise every call site is reported with its IL
/// offset.
pub fn find_method_references(
    modules: &[ModuleEntry],
    targets: &[MethodTarget],
    collector: &mut SearchCollector,
    callers_only: bool,
) {
    if targets.is_empty() {
        return;
    }
    for entry in modules {
        for ty in entry.module.types() {
            for (_, method) in ty.methods.iter() {
                if collector.truncated() {
                    return;
                }
                let Some(body) = &method.body else { continue };
                let mut matched_in_method = false;
                for instr in &body.instructions {
                    if collector.truncated() {
                        return;
                    }
                    let Operand::Method(link) = &instr.operand else {
                        continue;
                    };
                    for target in targets {
                        if !method_link_matches(link, &target.method) {
                            continue;
                        }
                        let key = if callers_only {
                            format!("caller:{}:{:08X}", entry.mvid, method.token.value())
                        } else {
                            format!(
                                "call:{}:{:08X}:{}:{:08X}",
                                entry.mvid,
                                method.token.value(),
                                instr.offset,
                                target.method.token.value()
                            )
                        };
                        let mut record = json!({
                            "kind": "method",
                            "referenceKind": "call",
                            "methodToken": method.token.value(),
                            "methodFullName": method.full_name,
                            "declaringType": ty.full_name,
                            "declaringTypeToken": ty.token.value(),
                            "moduleMvid": entry.mvid,
                            "documentFilename": entry.filename(),
                            "targetToken": target.method.token.value(),
                            "targetFullName": target.method.full_name,
                        });
                        if !callers_only {
                            record["ilOffset"] = json!(instr.offset);
                        }
                        if let Some(accessor) = target.accessor {
                            record["accessor"] = json!(accessor);
                        }
                        collector.try_add(key, record);
                        matched_in_method = true;
                        if callers_only {
                            break;
                        }
                    }
                    if callers_only && matched_in_method {
                        break;
                    }
                }
            }
        }
    }
}

/// Reports every call site of `target` with call-kind classification.
pub fn find_method_usages(
    modules: &[ModuleEntry],
    target: &MethodRc,
    collector: &mut SearchCollector,
) {
    for entry in modules {
        for ty in entry.module.types() {
            for (_, method) in ty.methods.iter() {
                if collector.truncated() {
                    return;
                }
                let Some(body) = &method.body else { continue };
                for instr in &body.instructions {
                    if collector.truncated() {
                        return;
                    }
                    let Operand::Method(link) = &instr.operand else {
                        continue;
                    };
                    if !method_link_matches(link, target) {
                        continue;
                    }
                    collector.try_add(
                        format!(
                            "call:{}:{:08X}:{}:{:08X}",
                            entry.mvid,
                            method.token.value(),
                            instr.offset,
                            target.token.value()
                        ),
                        json!({
                            "usageKind": "call",
                            "callKind": instr.opcode.call_kind(),
                            "opcode": instr.opcode.mnemonic,
                            "ilOffset": instr.offset,
                            "methodToken": method.token.value(),
                            "methodFullName": method.full_name,
                            "declaringType": ty.full_name,
                            "declaringTypeToken": ty.token.value(),
                            "moduleMvid": entry.mvid,
                            "documentFilename": entry.filename(),
                            "targetToken": target.token.value(),
                            "targetFullName": target.full_name,
                        }),
                    );
                }
            }
        }
    }
}

/// Lists the methods a given method calls, one record per distinct callee.
pub fn list_callees(method: &MethodRc, collector: &mut SearchCollector) {
    let Some(body) = &method.body else { return };
    for instr in &body.instructions {
        if collector.truncated() {
            return;
        }
        let Operand::Method(link) = &instr.operand else {
            continue;
        };
        let resolved = link.resolve();
        let (name, full_name, token, mvid) = match &resolved {
            Some(callee) => (
                callee.name.clone(),
                callee.full_name.clone(),
                callee.token.value(),
                callee.mvid_text(),
            ),
            None => (
                simple_name_of(link.full_name()).to_string(),
                link.full_name().to_string(),
                0,
                String::new(),
            ),
        };
        if full_name.is_empty() {
            continue;
        }
        collector.try_add(
            format!("callee:{mvid}:{token}:{full_name}"),
            json!({
                "name": name,
                "fullName": full_name,
                "token": token,
                "moduleMvid": mvid,
            }),
        );
    }
}

/// Reports every instruction that accesses `target`, without access-kind
/// classification (the `findReferences` shape).
pub fn find_field_references(
    modules: &[ModuleEntry],
    target: &FieldRc,
    collector: &mut SearchCollector,
) {
    for entry in modules {
        for ty in entry.module.types() {
            for (_, method) in ty.methods.iter() {
                if collector.truncated() {
                    return;
                }
                let Some(body) = &method.body else { continue };
                for instr in &body.instructions {
                    if collector.truncated() {
                        return;
                    }
                    let Operand::Field(link) = &instr.operand else {
                        continue;
                    };
                    if !field_link_matches(link, target) {
                        continue;
                    }
                    collector.try_add(
                        format!(
                            "fieldref:{}:{:08X}:{}:{:08X}",
                            entry.mvid,
                            method.token.value(),
                            instr.offset,
                            target.token.value()
                        ),
                        json!({
                            "kind": "field",
                            "referenceKind": "access",
                            "methodToken": method.token.value(),
                            "methodFullName": method.full_name,
                            "declaringType": ty.full_name,
                            "declaringTypeToken": ty.token.value(),
                            "moduleMvid": entry.mvid,
                            "documentFilename": entry.filename(),
                            "targetToken": target.token.value(),
                            "targetFullName": target.full_name,
                            "ilOffset": instr.offset,
                        }),
                    );
                }
            }
        }
    }
}

/// Reports field accesses classified as read/write/address, optionally
/// filtered to one access kind (`any` keeps everything).
pub fn find_field_usages(
    modules: &[ModuleEntry],
    target: &FieldRc,
    access_filter: &str,
    collector: &mut SearchCollector,
) {
    for entry in modules {
        for ty in entry.module.types() {
            for (_, method) in ty.methods.iter() {
                if collector.truncated() {
                    return;
                }
                let Some(body) = &method.body else { continue };
                for instr in &body.instructions {
                    if collector.truncated() {
                        return;
                    }
                    let Operand::Field(link) = &instr.operand else {
                        continue;
                    };
                    if !field_link_matches(link, target) {
                        continue;
                    }
                    let access_kind = instr.opcode.field_access_kind();
                    if access_filter != "any" && access_kind != access_filter {
                        continue;
                    }
                    collector.try_add(
                        format!(
                            "field:{}:{:08X}:{}:{:08X}",
                            entry.mvid,
                            method.token.value(),
                            instr.offset,
                            target.token.value()
                        ),
                        json!({
                            "usageKind": "fieldAccess",
                            "accessKind": access_kind,
                            "opcode": instr.opcode.mnemonic,
                            "ilOffset": instr.offset,
                            "methodToken": method.token.value(),
                            "methodFullName": method.full_name,
                            "declaringType": ty.full_name,
                            "declaringTypeToken": ty.token.value(),
                            "moduleMvid": entry.mvid,
                            "documentFilename": entry.filename(),
                            "targetToken": target.token.value(),
                            "targetFullName": target.full_name,
                        }),
                    );
                }
            }
        }
    }
}

fn attributes_reference(attributes: &[CustomAttribute], target: &CilTypeRc) -> bool {
    attributes
        .iter()
        .any(|attr| attr.attribute_type.refers_to(target))
}

/// Reports every declaration slot in scope that uses `target`: base-type and
/// interface slots, field/property/return/parameter declared types, generic
/// constraints on types and methods, and attribute applications.
pub fn find_type_usages(
    modules: &[ModuleEntry],
    target: &CilTypeRc,
    collector: &mut SearchCollector,
) {
    let target_name = target.full_name.clone();
    for entry in modules {
        for ty in entry.module.types() {
            if collector.truncated() {
                return;
            }

            let context = |member_kind: &str,
                           member_name: &str,
                           member_full: &str,
                           member_token: u32,
                           usage_kind: &str| {
                json!({
                    "usageKind": usage_kind,
                    "memberKind": member_kind,
                    "memberName": member_name,
                    "memberFullName": member_full,
                    "memberToken": member_token,
                    "declaringType": ty.full_name,
                    "declaringTypeToken": ty.token.value(),
                    "moduleMvid": entry.mvid,
                    "documentFilename": entry.filename(),
                    "targetFullName": target_name,
                })
            };

            if ty.base.as_ref().is_some_and(|b| b.refers_to(target)) {
                collector.try_add(
                    format!("base:{}:{:08X}", entry.mvid, ty.token.value()),
                    json!({
                        "usageKind": "baseType",
                        "declaringType": ty.full_name,
                        "declaringTypeToken": ty.token.value(),
                        "moduleMvid": entry.mvid,
                        "documentFilename": entry.filename(),
                        "targetFullName": target_name,
                    }),
                );
            }

            for interface in &ty.interfaces {
                if !interface.refers_to(target) {
                    continue;
                }
                collector.try_add(
                    format!(
                        "iface:{}:{:08X}:{}",
                        entry.mvid,
                        ty.token.value(),
                        interface.full_name()
                    ),
                    json!({
                        "usageKind": "interface",
                        "declaringType": ty.full_name,
                        "declaringTypeToken": ty.token.value(),
                        "moduleMvid": entry.mvid,
                        "documentFilename": entry.filename(),
                        "targetFullName": target_name,
                    }),
                );
            }

            for (_, field) in ty.fields.iter() {
                if !field.field_type.references(target) {
                    continue;
                }
                collector.try_add(
                    format!("field:{}:{:08X}", entry.mvid, field.token.value()),
                    context("field", &field.name, &field.full_name, field.token.value(), "field"),
                );
            }

            for (_, property) in ty.properties.iter() {
                if !property.property_type.references(target) {
                    continue;
                }
                collector.try_add(
                    format!("prop:{}:{:08X}", entry.mvid, property.token.value()),
                    context(
                        "property",
                        &property.name,
                        &property.full_name,
                        property.token.value(),
                        "property",
                    ),
                );
            }

            for (_, method) in ty.methods.iter() {
                if method.signature.return_type.references(target) {
                    collector.try_add(
                        format!("ret:{}:{:08X}", entry.mvid, method.token.value()),
                        context(
                            "method",
                            &method.name,
                            &method.full_name,
                            method.token.value(),
                            "returnType",
                        ),
                    );
                }

                for param in &method.params {
                    if !param.param_type.references(target) {
                        continue;
                    }
                    collector.try_add(
                        format!(
                            "param:{}:{:08X}:{}",
                            entry.mvid,
                            method.token.value(),
                            param.index
                        ),
                        json!({
                            "usageKind": "paramType",
                            "memberKind": "param",
                            "memberName": param.name,
                            "memberIndex": param.index,
                            "methodToken": method.token.value(),
                            "methodFullName": method.full_name,
                            "declaringType": ty.full_name,
                            "declaringTypeToken": ty.token.value(),
                            "moduleMvid": entry.mvid,
                            "documentFilename": entry.filename(),
                            "targetFullName": target_name,
                        }),
                    );
                }

                for generic_param in &method.generic_params {
                    if !generic_param
                        .constraints
                        .iter()
                        .any(|c| c.refers_to(target))
                    {
                        continue;
                    }
                    collector.try_add(
                        format!(
                            "methodgp:{}:{:08X}:{}",
                            entry.mvid,
                            method.token.value(),
                            generic_param.index
                        ),
                        context(
                            "method",
                            &method.name,
                            &method.full_name,
                            method.token.value(),
                            "genericConstraint",
                        ),
                    );
                }
            }

            for generic_param in &ty.generic_params {
                if !generic_param
                    .constraints
                    .iter()
                    .any(|c| c.refers_to(target))
                {
                    continue;
                }
                collector.try_add(
                    format!(
                        "typegp:{}:{:08X}:{}",
                        entry.mvid,
                        ty.token.value(),
                        generic_param.index
                    ),
                    context("type", &ty.name, &ty.full_name, ty.token.value(), "genericConstraint"),
                );
            }

            if attributes_reference(&ty.attributes, target) {
                collector.try_add(
                    format!("typeattr:{}:{:08X}", entry.mvid, ty.token.value()),
                    context("type", &ty.name, &ty.full_name, ty.token.value(), "attribute"),
                );
            }
            for (_, field) in ty.fields.iter() {
                if !attributes_reference(&field.attributes, target) {
                    continue;
                }
                collector.try_add(
                    format!("fieldattr:{}:{:08X}", entry.mvid, field.token.value()),
                    context("field", &field.name, &field.full_name, field.token.value(), "attribute"),
                );
            }
            for (_, property) in ty.properties.iter() {
                if !attributes_reference(&property.attributes, target) {
                    continue;
                }
                collector.try_add(
                    format!("propattr:{}:{:08X}", entry.mvid, property.token.value()),
                    context(
                        "property",
                        &property.name,
                        &property.full_name,
                        property.token.value(),
                        "attribute",
                    ),
                );
            }
            for (_, event) in ty.events.iter() {
                if !attributes_reference(&event.attributes, target) {
                    continue;
                }
                collector.try_add(
                    format!("eventattr:{}:{:08X}", entry.mvid, event.token.value()),
                    context("event", &event.name, &event.full_name, event.token.value(), "attribute"),
                );
            }
            for (_, method) in ty.methods.iter() {
                if !attributes_reference(&method.attributes, target) {
                    continue;
                }
                collector.try_add(
                    format!("methodattr:{}:{:08X}", entry.mvid, method.token.value()),
                    context(
                        "method",
                        &method.name,
                        &method.full_name,
                        method.token.value(),
                        "attribute",
                    ),
                );
            }
        }
    }
}

/// Reports every type whose dependency set contains `target` (the
/// `findReferences` type shape).
pub fn find_type_references(
    modules: &[ModuleEntry],
    target: &CilTypeRc,
    collector: &mut SearchCollector,
) {
    let target_name = &target.full_name;
    for entry in modules {
        for ty in entry.module.types() {
            if collector.truncated() {
                return;
            }
            let deps = collect_type_dependencies(ty);
            if !deps.contains(target_name.as_str()) {
                continue;
            }
            collector.try_add(
                format!(
                    "typeref:{}:{:08X}:{:08X}",
                    entry.mvid,
                    ty.token.value(),
                    target.token.value()
                ),
                json!({
                    "kind": "type",
                    "referenceKind": "dependency",
                    "typeFullName": ty.full_name,
                    "typeToken": ty.token.value(),
                    "moduleMvid": entry.mvid,
                    "documentFilename": entry.filename(),
                    "targetToken": target.token.value(),
                    "targetFullName": target_name,
                }),
            );
        }
    }
}

fn attribute_matches(attribute: &CustomAttribute, matcher: &PatternMatcher) -> bool {
    matcher.is_match(attribute.attribute_type.full_name())
}

/// Finds attribute applications whose attribute type matches a pattern.
///
/// Assembly- and module-level attributes are scanned when
/// `include_assembly_module` is set; parameter attributes when
/// `include_parameters` is set. Compiler-generated carriers are skipped unless
/// `include_generated`.
#[allow(clippy::too_many_lines)]
pub fn find_attributes(
    modules: &[ModuleEntry],
    matcher: &PatternMatcher,
    include_assembly_module: bool,
    include_parameters: bool,
    include_generated: bool,
    collector: &mut SearchCollector,
) {
    use crate::analysis::heuristics::is_compiler_generated;

    for entry in modules {
        if collector.truncated() {
            return;
        }
        if include_assembly_module {
            if let Some(assembly) = &entry.module.assembly {
                for attribute in &assembly.attributes {
                    if !attribute_matches(attribute, matcher) {
                        continue;
                    }
                    collector.try_add(
                        format!(
                            "asmattr:{}:{}",
                            entry.mvid,
                            attribute.attribute_type.full_name()
                        ),
                        json!({
                            "targetKind": "assembly",
                            "attributeFullName": attribute.attribute_type.full_name(),
                            "assemblyFullName": assembly.full_name,
                            "moduleMvid": entry.mvid,
                            "documentFilename": entry.filename(),
                        }),
                    );
                }
            }
            for attribute in &entry.module.attributes {
                if !attribute_matches(attribute, matcher) {
                    continue;
                }
                collector.try_add(
                    format!(
                        "modattr:{}:{}",
                        entry.mvid,
                        attribute.attribute_type.full_name()
                    ),
                    json!({
                        "targetKind": "module",
                        "attributeFullName": attribute.attribute_type.full_name(),
                        "moduleMvid": entry.mvid,
                        "documentFilename": entry.filename(),
                    }),
                );
            }
        }

        for ty in entry.module.types() {
            if collector.truncated() {
                return;
            }
            if !include_generated && is_compiler_generated(&ty.name, &ty.attributes) {
                continue;
            }
            for attribute in &ty.attributes {
                if !attribute_matches(attribute, matcher) {
                    continue;
                }
                collector.try_add(
                    format!(
                        "typeattr:{}:{:08X}:{}",
                        entry.mvid,
                        ty.token.value(),
                        attribute.attribute_type.full_name()
                    ),
                    json!({
                        "targetKind": "type",
                        "attributeFullName": attribute.attribute_type.full_name(),
                        "targetName": ty.name,
                        "targetFullName": ty.full_name,
                        "token": ty.token.value(),
                        "moduleMvid": entry.mvid,
                        "documentFilename": entry.filename(),
                    }),
                );
            }

            for (_, field) in ty.fields.iter() {
                if !include_generated && is_compiler_generated(&field.name, &field.attributes) {
                    continue;
                }
                for attribute in &field.attributes {
                    if !attribute_matches(attribute, matcher) {
                        continue;
                    }
                    collector.try_add(
                        format!(
                            "fieldattr:{}:{:08X}:{}",
                            entry.mvid,
                            field.token.value(),
                            attribute.attribute_type.full_name()
                        ),
                        json!({
                            "targetKind": "field",
                            "attributeFullName": attribute.attribute_type.full_name(),
                            "targetName": field.name,
                            "targetFullName": field.full_name,
                            "token": field.token.value(),
                            "declaringType": ty.full_name,
                            "declaringTypeToken": ty.token.value(),
                            "moduleMvid": entry.mvid,
                            "documentFilename": entry.filename(),
                        }),
                    );
                }
            }

            for (_, property) in ty.properties.iter() {
                if !include_generated
                    && is_compiler_generated(&property.name, &property.attributes)
                {
                    continue;
                }
                for attribute in &property.attributes {
                    if !attribute_matches(attribute, matcher) {
                        continue;
                    }
                    collector.try_add(
                        format!(
                            "propattr:{}:{:08X}:{}",
                            entry.mvid,
                            property.token.value(),
                            attribute.attribute_type.full_name()
                        ),
                        json!({
                            "targetKind": "property",
                            "attributeFullName": attribute.attribute_type.full_name(),
                            "targetName": property.name,
                            "targetFullName": property.full_name,
                            "token": property.token.value(),
                            "declaringType": ty.full_name,
                            "declaringTypeToken": ty.token.value(),
                            "moduleMvid": entry.mvid,
                            "documentFilename": entry.filename(),
                        }),
                    );
                }
            }

            for (_, event) in ty.events.iter() {
                if !include_generated && is_compiler_generated(&event.name, &event.attributes) {
                    continue;
                }
                for attribute in &event.attributes {
                    if !attribute_matches(attribute, matcher) {
                        continue;
                    }
                    collector.try_add(
                        format!(
                            "eventattr:{}:{:08X}:{}",
                            entry.mvid,
                            event.token.value(),
                            attribute.attribute_type.full_name()
                        ),
                        json!({
                            "targetKind": "event",
                            "attributeFullName": attribute.attribute_type.full_name(),
                            "targetName": event.name,
                            "targetFullName": event.full_name,
                            "token": event.token.value(),
                            "declaringType": ty.full_name,
                            "declaringTypeToken": ty.token.value(),
                            "moduleMvid": entry.mvid,
                            "documentFilename": entry.filename(),
                        }),
                    );
                }
            }

            for (_, method) in ty.methods.iter() {
                if !include_generated && is_compiler_generated(&method.name, &method.attributes) {
                    continue;
                }
                for attribute in &method.attributes {
                    if !attribute_matches(attribute, matcher) {
                        continue;
                    }
                    collector.try_add(
                        format!(
                            "methodattr:{}:{:08X}:{}",
                            entry.mvid,
                            method.token.value(),
                            attribute.attribute_type.full_name()
                        ),
                        json!({
                            "targetKind": "method",
                            "attributeFullName": attribute.attribute_type.full_name(),
                            "targetName": method.name,
                            "targetFullName": method.full_name,
                            "token": method.token.value(),
                            "declaringType": ty.full_name,
                            "declaringTypeToken": ty.token.value(),
                            "moduleMvid": entry.mvid,
                            "documentFilename": entry.filename(),
                        }),
                    );
                }

                if !include_parameters {
                    continue;
                }
                for param in &method.params {
                    for attribute in &param.attributes {
                        if !attribute_matches(attribute, matcher) {
                            continue;
                        }
                        collector.try_add(
                            format!(
                                "paramattr:{}:{:08X}:{}:{}",
                                entry.mvid,
                                method.token.value(),
                                param.index,
                                attribute.attribute_type.full_name()
                            ),
                            json!({
                                "targetKind": "param",
                                "attributeFullName": attribute.attribute_type.full_name(),
                                "targetName": param.name,
                                "paramIndex": param.index,
                                "methodToken": method.token.value(),
                                "methodFullName": method.full_name,
                                "declaringType": ty.full_name,
                                "declaringTypeToken": ty.token.value(),
                                "moduleMvid": entry.mvid,
                                "documentFilename": entry.filename(),
                            }),
                        );
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::indices::build_module_index;
    use crate::metadata::body::{opcodes, Instruction, Operand};
    use crate::metadata::builder::{FieldBuilder, MethodBuilder, ModuleBuilder, TypeBuilder};
    use crate::metadata::signatures::TypeSig;
    use crate::metadata::workspace::Workspace;
    use uguid::guid;

    fn call_fixture() -> (Workspace, MethodRc) {
        let workspace = Workspace::new();
        let m = ModuleBuilder::new("m.dll", guid!("00000000-0000-0000-0000-000000000201")).build();
        let callee_ty = TypeBuilder::new(0x0200_0001, "Service", "G")
            .method(MethodBuilder::new(0x0600_0001, "Execute"))
            .register(&m);
        let (_, callee) = callee_ty.methods.iter().next().unwrap();
        let callee = callee.clone();

        TypeBuilder::new(0x0200_0002, "Client", "G")
            .method(
                MethodBuilder::new(0x0600_0002, "Run").instructions(vec![
                    Instruction::new(
                        0,
                        opcodes::CALL,
                        Operand::Method(MemberLink::new(&callee.full_name, &callee)),
                    ),
                    Instruction::new(5, opcodes::RET, Operand::None),
                ]),
            )
            .register(&m);
        workspace.insert(m);
        (workspace, callee)
    }

    #[test]
    fn test_callers_found_by_definition_identity() {
        let (workspace, callee) = call_fixture();
        let modules = build_module_index(&workspace);
        let mut collector = SearchCollector::new(100);
        find_method_references(
            &modules,
            &[MethodTarget::plain(callee)],
            &mut collector,
            true,
        );
        let (results, truncated) = collector.into_results();
        assert!(!truncated);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["methodFullName"], "G.Client::Run");
    }

    #[test]
    fn test_callees_listing() {
        let (workspace, _) = call_fixture();
        let modules = build_module_index(&workspace);
        let caller = modules[0]
            .module
            .resolve_token(crate::metadata::token::Token::new(0x0600_0002))
            .and_then(|d| d.as_method())
            .unwrap();
        let mut collector = SearchCollector::new(100);
        list_callees(&caller, &mut collector);
        let (results, _) = collector.into_results();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["fullName"], "G.Service::Execute");
    }

    #[test]
    fn test_symbolic_call_matches_by_full_name() {
        let workspace = Workspace::new();
        let m = ModuleBuilder::new("m.dll", guid!("00000000-0000-0000-0000-000000000202")).build();
        let target_ty = TypeBuilder::new(0x0200_0001, "Api", "G")
            .method(MethodBuilder::new(0x0600_0001, "Ping"))
            .register(&m);
        let (_, target) = target_ty.methods.iter().next().unwrap();
        let target = target.clone();
        TypeBuilder::new(0x0200_0002, "User", "G")
            .method(
                MethodBuilder::new(0x0600_0002, "Go").instructions(vec![Instruction::new(
                    0,
                    opcodes::CALLVIRT,
                    Operand::Method(MemberLink::external("G.Api::Ping")),
                )]),
            )
            .register(&m);
        workspace.insert(m);

        let modules = build_module_index(&workspace);
        let mut collector = SearchCollector::new(100);
        find_method_usages(&modules, &target, &mut collector);
        let (results, _) = collector.into_results();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["callKind"], "callvirt");
    }

    #[test]
    fn test_field_usage_classification_and_filter() {
        let workspace = Workspace::new();
        let m = ModuleBuilder::new("m.dll", guid!("00000000-0000-0000-0000-000000000203")).build();
        let holder = TypeBuilder::new(0x0200_0001, "State", "G")
            .field(FieldBuilder::new(
                0x0400_0001,
                "count",
                TypeSig::named("System.Int32"),
            ))
            .register(&m);
        let (_, field) = holder.fields.iter().next().unwrap();
        let field = field.clone();
        TypeBuilder::new(0x0200_0002, "Mutator", "G")
            .method(
                MethodBuilder::new(0x0600_0001, "Bump").instructions(vec![
                    Instruction::new(
                        0,
                        opcodes::LDFLD,
                        Operand::Field(MemberLink::new(&field.full_name, &field)),
                    ),
                    Instruction::new(
                        5,
                        opcodes::STFLD,
                        Operand::Field(MemberLink::new(&field.full_name, &field)),
                    ),
                ]),
            )
            .register(&m);
        workspace.insert(m);

        let modules = build_module_index(&workspace);
        let mut collector = SearchCollector::new(100);
        find_field_usages(&modules, &field, "any", &mut collector);
        let (results, _) = collector.into_results();
        assert_eq!(results.len(), 2);

        let mut collector = SearchCollector::new(100);
        find_field_usages(&modules, &field, "write", &mut collector);
        let (writes, _) = collector.into_results();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0]["accessKind"], "write");
    }

    #[test]
    fn test_type_usages_cover_declaration_slots() {
        let workspace = Workspace::new();
        let m = ModuleBuilder::new("m.dll", guid!("00000000-0000-0000-0000-000000000204")).build();
        let target = TypeBuilder::new(0x0200_0001, "Target", "G").register(&m);
        TypeBuilder::new(0x0200_0002, "Uses", "G")
            .base(crate::metadata::types::CilTypeRef::to(&target))
            .field(FieldBuilder::new(0x0400_0001, "t", TypeSig::of(&target)))
            .method(
                MethodBuilder::new(0x0600_0001, "Make")
                    .returns(TypeSig::of(&target))
                    .param("input", TypeSig::of(&target)),
            )
            .register(&m);
        workspace.insert(m);

        let modules = build_module_index(&workspace);
        let mut collector = SearchCollector::new(100);
        find_type_usages(&modules, &target, &mut collector);
        let (results, _) = collector.into_results();
        let kinds: Vec<&str> = results
            .iter()
            .map(|r| r["usageKind"].as_str().unwrap())
            .collect();
        assert!(kinds.contains(&"baseType"));
        assert!(kinds.contains(&"field"));
        assert!(kinds.contains(&"returnType"));
        assert!(kinds.contains(&"paramType"));
    }

    #[test]
    fn test_attribute_search_with_pattern() {
        let workspace = Workspace::new();
        let m = ModuleBuilder::new("m.dll", guid!("00000000-0000-0000-0000-000000000205")).build();
        TypeBuilder::new(0x0200_0001, "Saved", "G")
            .attribute(CustomAttribute::new(
                crate::metadata::types::CilTypeRef::named("System.SerializableAttribute"),
            ))
            .register(&m);
        workspace.insert(m);

        let modules = build_module_index(&workspace);
        let matcher = PatternMatcher::compile("*Serializable*", false, false).unwrap();
        let mut collector = SearchCollector::new(100);
        find_attributes(&modules, &matcher, true, false, true, &mut collector);
        let (results, _) = collector.into_results();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["targetKind"], "type");
    }
}
