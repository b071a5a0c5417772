//! The unified multi-kind search.
//!
//! One operation searches every name space the model has - assemblies,
//! modules, namespaces, types, members, parameters, locals, references,
//! resources - restricted by a [`SearchKind`], with an optional literal mode
//! that scans string operands, field constants and attribute argument values
//! instead of names.

use std::collections::HashSet;
use std::str::FromStr;

use serde_json::json;
use strum::EnumString;

use crate::analysis::{
    collector::SearchCollector, heuristics::is_compiler_generated, indices::ModuleEntry,
    text::TermMatcher,
};
use crate::metadata::{
    body::Operand,
    members::Method,
    types::{CilType, CustomAttribute},
};
use crate::{Error, Result};

/// What a `search` request is allowed to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum SearchKind {
    /// Assembly names.
    Assembly,
    /// Module names.
    Module,
    /// Namespace names.
    Namespace,
    /// Type names, any classification.
    Type,
    /// Field names.
    Field,
    /// Method names.
    Method,
    /// Property names.
    Property,
    /// Event names.
    Event,
    /// Parameter names.
    Param,
    /// Local variable names.
    Local,
    /// Parameter and local variable names.
    ParamLocal,
    /// Assembly reference names.
    AssemblyRef,
    /// Module reference names.
    ModuleRef,
    /// Resource names.
    Resource,
    /// Generic type definitions only.
    Generic,
    /// Non-generic types only.
    NonGeneric,
    /// Enums only.
    Enum,
    /// Interfaces only.
    Interface,
    /// Classes only.
    Class,
    /// Structs only.
    Struct,
    /// Delegates only.
    Delegate,
    /// Any member kind (fields, methods, properties, events).
    Member,
    /// Everything.
    Any,
    /// Literal mode: constants, string operands and attribute arguments.
    Literal,
}

impl SearchKind {
    /// Parses the wire value of `searchType`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] for unknown values.
    pub fn parse(value: &str) -> Result<Self> {
        SearchKind::from_str(value)
            .map_err(|_| Error::InvalidParameter(format!("Unknown searchType: {value}")))
    }

    fn assemblies(self) -> bool {
        matches!(self, SearchKind::Any | SearchKind::Assembly)
    }

    fn modules(self) -> bool {
        matches!(self, SearchKind::Any | SearchKind::Module)
    }

    fn namespaces(self) -> bool {
        matches!(self, SearchKind::Any | SearchKind::Namespace)
    }

    fn types(self) -> bool {
        matches!(
            self,
            SearchKind::Any
                | SearchKind::Type
                | SearchKind::Generic
                | SearchKind::NonGeneric
                | SearchKind::Enum
                | SearchKind::Interface
                | SearchKind::Class
                | SearchKind::Struct
                | SearchKind::Delegate
        )
    }

    fn fields(self) -> bool {
        matches!(
            self,
            SearchKind::Any | SearchKind::Field | SearchKind::Member | SearchKind::Literal
        )
    }

    fn methods(self) -> bool {
        matches!(
            self,
            SearchKind::Any | SearchKind::Method | SearchKind::Member | SearchKind::Literal
        )
    }

    fn properties(self) -> bool {
        matches!(
            self,
            SearchKind::Any | SearchKind::Property | SearchKind::Member
        )
    }

    fn events(self) -> bool {
        matches!(self, SearchKind::Any | SearchKind::Event | SearchKind::Member)
    }

    fn params(self) -> bool {
        matches!(
            self,
            SearchKind::Any | SearchKind::Param | SearchKind::ParamLocal
        )
    }

    fn locals(self) -> bool {
        matches!(
            self,
            SearchKind::Any | SearchKind::Local | SearchKind::ParamLocal
        )
    }

    fn assembly_refs(self) -> bool {
        matches!(self, SearchKind::Any | SearchKind::AssemblyRef)
    }

    fn module_refs(self) -> bool {
        matches!(self, SearchKind::Any | SearchKind::ModuleRef)
    }

    fn resources(self) -> bool {
        matches!(
            self,
            SearchKind::Any | SearchKind::Resource | SearchKind::Literal
        )
    }

    fn type_classification_matches(self, ty: &CilType) -> bool {
        match self {
            SearchKind::Generic => ty.is_generic(),
            SearchKind::NonGeneric => !ty.is_generic(),
            SearchKind::Enum => ty.is_enum(),
            SearchKind::Interface => ty.is_interface(),
            SearchKind::Class => ty.is_class() && !ty.is_delegate(),
            SearchKind::Struct => ty.is_value_type() && !ty.is_enum(),
            SearchKind::Delegate => ty.is_delegate(),
            _ => true,
        }
    }
}

fn operand_text(operand: &Operand) -> Option<String> {
    match operand {
        Operand::Method(link) => Some(link.full_name().to_string()),
        Operand::Field(link) => Some(link.full_name().to_string()),
        Operand::Type(type_ref) => Some(type_ref.full_name().to_string()),
        Operand::Branch(offset) => Some(offset.to_string()),
        Operand::Local(index) => Some(format!("V_{index}")),
        Operand::Param(index) => Some(format!("A_{index}")),
        Operand::Int(value) => Some(value.to_string()),
        Operand::Float(value) => Some(value.to_string()),
        Operand::None | Operand::String(_) | Operand::Switch(_) => None,
    }
}

fn attribute_literal_matches(attributes: &[CustomAttribute], matcher: &TermMatcher) -> bool {
    attributes.iter().any(|attribute| {
        attribute
            .constructor_args
            .iter()
            .any(|value| matcher.is_match(&value.to_string()))
            || attribute
                .named_args
                .iter()
                .any(|(_, value)| matcher.is_match(&value.to_string()))
    })
}

fn method_body_matches(method: &Method, matcher: &TermMatcher, literal_only: bool) -> bool {
    let Some(body) = &method.body else {
        return false;
    };
    for instr in &body.instructions {
        if let Operand::String(text) = &instr.operand {
            if matcher.is_match(text) {
                return true;
            }
            continue;
        }
        if !literal_only {
            if let Some(text) = operand_text(&instr.operand) {
                if matcher.is_match(&text) {
                    return true;
                }
            }
        }
    }
    false
}

/// Searches one module under the given kind restriction, emitting records into
/// the collector.
#[allow(clippy::too_many_lines)]
pub fn search_module(
    entry: &ModuleEntry,
    kind: SearchKind,
    matcher: &TermMatcher,
    search_decompiled_data: bool,
    include_generated: bool,
    collector: &mut SearchCollector,
) {
    let module = &entry.module;
    let mvid = &entry.mvid;

    if kind.assemblies() {
        if let Some(assembly) = &module.assembly {
            if matcher.is_match(&assembly.name) || matcher.is_match(&assembly.full_name) {
                collector.try_add(
                    format!("assembly:{mvid}:{}", assembly.full_name),
                    json!({
                        "kind": "assembly",
                        "name": assembly.name,
                        "fullName": assembly.full_name,
                        "moduleMvid": mvid,
                        "documentFilename": entry.filename(),
                    }),
                );
            }
        }
    }
    if collector.truncated() {
        return;
    }

    if kind.modules() && (matcher.is_match(&module.name) || matcher.is_match(&module.path)) {
        collector.try_add(
            format!("module:{mvid}"),
            json!({
                "kind": "module",
                "name": module.name,
                "fullName": module.name,
                "moduleMvid": mvid,
                "documentFilename": entry.filename(),
            }),
        );
    }
    if collector.truncated() {
        return;
    }

    if kind.namespaces() {
        let namespaces: HashSet<&str> =
            module.types().map(|ty| ty.namespace.as_str()).collect();
        for namespace in namespaces {
            if !matcher.is_match(namespace) {
                continue;
            }
            if !collector.try_add(
                format!("namespace:{mvid}:{namespace}"),
                json!({
                    "kind": "namespace",
                    "namespace": namespace,
                    "moduleMvid": mvid,
                    "documentFilename": entry.filename(),
                }),
            ) {
                return;
            }
        }
    }

    if kind.assembly_refs() {
        for reference in &module.assembly_refs {
            if !matcher.is_match(&reference.name) && !matcher.is_match(&reference.full_name) {
                continue;
            }
            if !collector.try_add(
                format!("assemblyRef:{mvid}:{}", reference.full_name),
                json!({
                    "kind": "assemblyRef",
                    "name": reference.name,
                    "fullName": reference.full_name,
                    "moduleMvid": mvid,
                    "documentFilename": entry.filename(),
                }),
            ) {
                return;
            }
        }
    }

    if kind.module_refs() {
        for reference in &module.module_refs {
            if !matcher.is_match(&reference.name) {
                continue;
            }
            if !collector.try_add(
                format!("moduleRef:{mvid}:{}", reference.name),
                json!({
                    "kind": "moduleRef",
                    "name": reference.name,
                    "fullName": reference.name,
                    "moduleMvid": mvid,
                    "documentFilename": entry.filename(),
                }),
            ) {
                return;
            }
        }
    }

    if kind.resources() {
        for resource in &module.resources {
            if !matcher.is_match(&resource.name) {
                continue;
            }
            if !collector.try_add(
                format!("resource:{mvid}:{}", resource.name),
                json!({
                    "kind": "resource",
                    "name": resource.name,
                    "resourceType": resource.kind,
                    "moduleMvid": mvid,
                    "documentFilename": entry.filename(),
                }),
            ) {
                return;
            }
        }
    }

    for ty in module.types() {
        if collector.truncated() {
            return;
        }
        if !include_generated && is_compiler_generated(&ty.name, &ty.attributes) {
            continue;
        }

        if kind.types() && kind.type_classification_matches(ty) {
            let name_matched = kind != SearchKind::Literal
                && (matcher.is_match(&ty.name) || matcher.is_match(&ty.full_name));
            let literal_matched = kind == SearchKind::Literal
                && search_decompiled_data
                && attribute_literal_matches(&ty.attributes, matcher);
            if name_matched || literal_matched {
                let key_tag = if literal_matched { "typeLiteral" } else { "type" };
                if !collector.try_add(
                    format!("{key_tag}:{mvid}:{:08X}", ty.token.value()),
                    json!({
                        "kind": "type",
                        "name": ty.name,
                        "fullName": ty.full_name,
                        "token": ty.token.value(),
                        "typeKind": ty.type_kind(),
                        "moduleMvid": mvid,
                        "documentFilename": entry.filename(),
                    }),
                ) {
                    return;
                }
            }
        }

        if collector.truncated() {
            return;
        }
        search_type_members(
            entry,
            ty,
            kind,
            matcher,
            search_decompiled_data,
            include_generated,
            collector,
        );
    }
}

fn search_type_members(
    entry: &ModuleEntry,
    ty: &CilType,
    kind: SearchKind,
    matcher: &TermMatcher,
    search_decompiled_data: bool,
    include_generated: bool,
    collector: &mut SearchCollector,
) {
    let mvid = &entry.mvid;
    let literal_only = kind == SearchKind::Literal;

    if kind.fields() {
        for (_, field) in ty.fields.iter() {
            if !include_generated && is_compiler_generated(&field.name, &field.attributes) {
                continue;
            }
            let mut matched = !literal_only
                && (matcher.is_match(&field.name) || matcher.is_match(&field.full_name));
            if !matched && search_decompiled_data {
                matched = field
                    .constant
                    .as_ref()
                    .is_some_and(|value| matcher.is_match(&value.to_string()))
                    || attribute_literal_matches(&field.attributes, matcher);
            }
            if !matched {
                continue;
            }
            if !collector.try_add(
                format!("field:{mvid}:{:08X}", field.token.value()),
                json!({
                    "kind": "field",
                    "name": field.name,
                    "fullName": field.full_name,
                    "token": field.token.value(),
                    "declaringType": ty.full_name,
                    "declaringTypeToken": ty.token.value(),
                    "moduleMvid": mvid,
                    "documentFilename": entry.filename(),
                }),
            ) {
                return;
            }
        }
    }
    if collector.truncated() {
        return;
    }

    if kind.properties() {
        for (_, property) in ty.properties.iter() {
            if !include_generated && is_compiler_generated(&property.name, &property.attributes) {
                continue;
            }
            let mut matched = !literal_only
                && (matcher.is_match(&property.name) || matcher.is_match(&property.full_name));
            if !matched && search_decompiled_data {
                matched = attribute_literal_matches(&property.attributes, matcher);
            }
            if !matched {
                continue;
            }
            if !collector.try_add(
                format!("property:{mvid}:{:08X}", property.token.value()),
                json!({
                    "kind": "property",
                    "name": property.name,
                    "fullName": property.full_name,
                    "token": property.token.value(),
                    "declaringType": ty.full_name,
                    "declaringTypeToken": ty.token.value(),
                    "moduleMvid": mvid,
                    "documentFilename": entry.filename(),
                }),
            ) {
                return;
            }
        }
    }
    if collector.truncated() {
        return;
    }

    if kind.events() {
        for (_, event) in ty.events.iter() {
            if !include_generated && is_compiler_generated(&event.name, &event.attributes) {
                continue;
            }
            let mut matched = !literal_only
                && (matcher.is_match(&event.name) || matcher.is_match(&event.full_name));
            if !matched && search_decompiled_data {
                matched = attribute_literal_matches(&event.attributes, matcher);
            }
            if !matched {
                continue;
            }
            if !collector.try_add(
                format!("event:{mvid}:{:08X}", event.token.value()),
                json!({
                    "kind": "event",
                    "name": event.name,
                    "fullName": event.full_name,
                    "token": event.token.value(),
                    "declaringType": ty.full_name,
                    "declaringTypeToken": ty.token.value(),
                    "moduleMvid": mvid,
                    "documentFilename": entry.filename(),
                }),
            ) {
                return;
            }
        }
    }
    if collector.truncated() {
        return;
    }

    if kind.methods() || kind.params() || kind.locals() || literal_only {
        let match_method_names = matches!(
            kind,
            SearchKind::Any | SearchKind::Method | SearchKind::Member
        );
        for (_, method) in ty.methods.iter() {
            if !include_generated && is_compiler_generated(&method.name, &method.attributes) {
                continue;
            }
            let mut matched = match_method_names
                && !literal_only
                && (matcher.is_match(&method.name) || matcher.is_match(&method.full_name));
            if !matched && search_decompiled_data {
                matched = method_body_matches(method, matcher, literal_only);
            }
            if matched
                && !collector.try_add(
                    format!("method:{mvid}:{:08X}", method.token.value()),
                    json!({
                        "kind": "method",
                        "name": method.name,
                        "fullName": method.full_name,
                        "token": method.token.value(),
                        "declaringType": ty.full_name,
                        "declaringTypeToken": ty.token.value(),
                        "moduleMvid": mvid,
                        "documentFilename": entry.filename(),
                    }),
                )
            {
                return;
            }

            if kind.params() {
                for param in &method.params {
                    if !matcher.is_match(&param.name) {
                        continue;
                    }
                    if !collector.try_add(
                        format!("param:{mvid}:{:08X}:{}", method.token.value(), param.index),
                        json!({
                            "kind": "param",
                            "name": param.name,
                            "index": param.index,
                            "methodToken": method.token.value(),
                            "methodFullName": method.full_name,
                            "declaringType": ty.full_name,
                            "declaringTypeToken": ty.token.value(),
                            "moduleMvid": mvid,
                            "documentFilename": entry.filename(),
                        }),
                    ) {
                        return;
                    }
                }
            }

            if kind.locals() {
                if let Some(body) = &method.body {
                    for local in &body.locals {
                        if local.name.is_empty() || !matcher.is_match(&local.name) {
                            continue;
                        }
                        if !collector.try_add(
                            format!(
                                "local:{mvid}:{:08X}:{}",
                                method.token.value(),
                                local.index
                            ),
                            json!({
                                "kind": "local",
                                "name": local.name,
                                "index": local.index,
                                "methodToken": method.token.value(),
                                "methodFullName": method.full_name,
                                "declaringType": ty.full_name,
                                "declaringTypeToken": ty.token.value(),
                                "moduleMvid": mvid,
                                "documentFilename": entry.filename(),
                            }),
                        ) {
                            return;
                        }
                    }
                }
            }
        }
    }
}
