//! Type dependency collection.
//!
//! Gathers the set of distinct full names a type reaches through its base
//! type, implemented interfaces, field/property/return/parameter declared
//! types (recursively unwrapped) and applied attribute types. Backs both the
//! direct "what does this type depend on" operation and the dependency-based
//! reference scan.

use std::collections::BTreeSet;

use crate::metadata::types::CilType;

/// Collects the distinct full names `ty` depends on, in sorted order.
#[must_use]
pub fn collect_type_dependencies(ty: &CilType) -> BTreeSet<String> {
    let mut set = BTreeSet::new();
    let mut add = |name: &str| {
        if !name.is_empty() {
            set.insert(name.to_string());
        }
    };

    if let Some(base) = &ty.base {
        add(base.full_name());
    }
    for interface in &ty.interfaces {
        add(interface.full_name());
    }
    for (_, field) in ty.fields.iter() {
        field.field_type.visit_named(&mut |leaf| add(leaf.full_name()));
    }
    for (_, property) in ty.properties.iter() {
        property
            .property_type
            .visit_named(&mut |leaf| add(leaf.full_name()));
    }
    for (_, method) in ty.methods.iter() {
        method
            .signature
            .return_type
            .visit_named(&mut |leaf| add(leaf.full_name()));
        for param in &method.params {
            param.param_type.visit_named(&mut |leaf| add(leaf.full_name()));
        }
    }
    for attribute in &ty.attributes {
        add(attribute.attribute_type.full_name());
    }
    set
}
