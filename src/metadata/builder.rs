//! Fluent builders for assembling metadata view models.
//!
//! The external loader (and the test suite) constructs modules through these
//! builders rather than by hand: they compute full names, wire the weak
//! back-references between modules, types and members, resolve property and
//! event accessors by method name, and register every definition in the owning
//! module's token map.

use std::sync::{Arc, Weak};

use crate::metadata::{
    body::MethodBody,
    members::{
        Event, EventRc, Field, FieldFlags, FieldRc, MemberLink, Method, MethodFlags, MethodRc,
        Param, PropertyRc,
    },
    module::{
        AssemblyInfo, AssemblyRefInfo, CilModule, ModuleRc, ModuleRefInfo, Resource,
    },
    signatures::{MethodSig, TypeSig},
    token::Token,
    types::{
        CilType, CilTypeRc, CilTypeRef, CustomAttribute, GenericParam, TypeFlags, TypeLayout,
    },
};

/// Builder for a [`CilModule`].
pub struct ModuleBuilder {
    name: String,
    mvid: uguid::Guid,
    path: String,
    assembly: Option<AssemblyInfo>,
    assembly_refs: Vec<AssemblyRefInfo>,
    module_refs: Vec<ModuleRefInfo>,
    resources: Vec<Resource>,
    attributes: Vec<CustomAttribute>,
}

impl ModuleBuilder {
    /// Starts a module with the given display name and identity.
    #[must_use]
    pub fn new(name: &str, mvid: uguid::Guid) -> Self {
        ModuleBuilder {
            name: name.to_string(),
            mvid,
            path: String::new(),
            assembly: None,
            assembly_refs: Vec::new(),
            module_refs: Vec::new(),
            resources: Vec::new(),
            attributes: Vec::new(),
        }
    }

    /// Sets the filesystem path the module was loaded from.
    #[must_use]
    pub fn path(mut self, path: &str) -> Self {
        self.path = path.to_string();
        self
    }

    /// Attaches the owning assembly with a conventional full name.
    #[must_use]
    pub fn assembly(mut self, name: &str, version: &str) -> Self {
        self.assembly = Some(AssemblyInfo {
            name: name.to_string(),
            full_name: format!(
                "{name}, Version={version}, Culture=neutral, PublicKeyToken=null"
            ),
            version: version.to_string(),
            culture: String::new(),
            public_key_token: String::new(),
            attributes: Vec::new(),
        });
        self
    }

    /// Attaches a fully specified owning assembly.
    #[must_use]
    pub fn assembly_info(mut self, info: AssemblyInfo) -> Self {
        self.assembly = Some(info);
        self
    }

    /// Adds an assembly reference.
    #[must_use]
    pub fn assembly_ref(mut self, name: &str, version: &str) -> Self {
        self.assembly_refs.push(AssemblyRefInfo {
            name: name.to_string(),
            full_name: format!(
                "{name}, Version={version}, Culture=neutral, PublicKeyToken=null"
            ),
            version: version.to_string(),
        });
        self
    }

    /// Adds a module reference.
    #[must_use]
    pub fn module_ref(mut self, name: &str) -> Self {
        self.module_refs.push(ModuleRefInfo {
            name: name.to_string(),
        });
        self
    }

    /// Adds a resource entry.
    #[must_use]
    pub fn resource(mut self, name: &str, kind: &str) -> Self {
        self.resources.push(Resource {
            name: name.to_string(),
            kind: kind.to_string(),
        });
        self
    }

    /// Adds a module-level custom attribute.
    #[must_use]
    pub fn attribute(mut self, attribute: CustomAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Builds the module. Types are registered afterwards through
    /// [`TypeBuilder::register`].
    #[must_use]
    pub fn build(self) -> ModuleRc {
        Arc::new(CilModule {
            mvid: self.mvid,
            name: self.name,
            path: self.path,
            assembly: self.assembly,
            assembly_refs: self.assembly_refs,
            module_refs: self.module_refs,
            resources: self.resources,
            attributes: self.attributes,
            types: boxcar::Vec::new(),
            defs: dashmap::DashMap::new(),
        })
    }
}

/// Builder for a [`Method`].
pub struct MethodBuilder {
    token: u32,
    name: String,
    flags: MethodFlags,
    return_type: TypeSig,
    params: Vec<Param>,
    generic_params: Vec<GenericParam>,
    body: Option<MethodBody>,
    overrides: Vec<MemberLink<Method>>,
    attributes: Vec<CustomAttribute>,
}

impl MethodBuilder {
    /// Starts a method with the given token and name. The signature defaults
    /// to `System.Void ()`.
    #[must_use]
    pub fn new(token: u32, name: &str) -> Self {
        MethodBuilder {
            token,
            name: name.to_string(),
            flags: MethodFlags::empty(),
            return_type: TypeSig::named("System.Void"),
            params: Vec::new(),
            generic_params: Vec::new(),
            body: None,
            overrides: Vec::new(),
            attributes: Vec::new(),
        }
    }

    /// Unions the given flags into the method's flag set.
    #[must_use]
    pub fn flags(mut self, flags: MethodFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Sets the return type.
    #[must_use]
    pub fn returns(mut self, return_type: TypeSig) -> Self {
        self.return_type = return_type;
        self
    }

    /// Appends a parameter.
    #[must_use]
    pub fn param(mut self, name: &str, param_type: TypeSig) -> Self {
        let index = self.params.len() as u32;
        self.params.push(Param {
            name: name.to_string(),
            index,
            param_type,
            default: None,
            optional: false,
            attributes: Vec::new(),
        });
        self
    }

    /// Appends a fully specified parameter.
    #[must_use]
    pub fn param_full(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// Appends a generic parameter.
    #[must_use]
    pub fn generic_param(mut self, name: &str, constraints: Vec<CilTypeRef>) -> Self {
        let index = self.generic_params.len() as u32;
        self.generic_params.push(GenericParam {
            name: name.to_string(),
            index,
            constraints,
        });
        self
    }

    /// Attaches a body.
    #[must_use]
    pub fn body(mut self, body: MethodBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Attaches a body consisting of the given instructions only.
    #[must_use]
    pub fn instructions(mut self, instructions: Vec<crate::metadata::body::Instruction>) -> Self {
        self.body = Some(MethodBody {
            instructions,
            ..MethodBody::default()
        });
        self
    }

    /// Declares an explicit override of another method.
    #[must_use]
    pub fn overrides(mut self, target: MemberLink<Method>) -> Self {
        self.overrides.push(target);
        self
    }

    /// Adds a custom attribute.
    #[must_use]
    pub fn attribute(mut self, attribute: CustomAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    fn build(self, declaring: Weak<CilType>, type_full_name: &str) -> MethodRc {
        let signature = MethodSig {
            return_type: self.return_type,
            params: self.params.iter().map(|p| p.param_type.clone()).collect(),
            generic_arity: self.generic_params.len() as u32,
        };
        Arc::new(Method {
            token: Token::new(self.token),
            full_name: format!("{type_full_name}::{}", self.name),
            name: self.name,
            flags: self.flags,
            signature,
            params: self.params,
            generic_params: self.generic_params,
            body: self.body,
            overrides: self.overrides,
            attributes: self.attributes,
            declaring,
        })
    }
}

/// Builder for a [`Field`].
pub struct FieldBuilder {
    token: u32,
    name: String,
    flags: FieldFlags,
    field_type: TypeSig,
    constant: Option<crate::metadata::types::ConstantValue>,
    attributes: Vec<CustomAttribute>,
}

impl FieldBuilder {
    /// Starts a field with the given token, name and declared type.
    #[must_use]
    pub fn new(token: u32, name: &str, field_type: TypeSig) -> Self {
        FieldBuilder {
            token,
            name: name.to_string(),
            flags: FieldFlags::empty(),
            field_type,
            constant: None,
            attributes: Vec::new(),
        }
    }

    /// Unions the given flags into the field's flag set.
    #[must_use]
    pub fn flags(mut self, flags: FieldFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Attaches a constant value (also marks the field as a literal holder).
    #[must_use]
    pub fn constant(mut self, value: crate::metadata::types::ConstantValue) -> Self {
        self.constant = Some(value);
        self
    }

    /// Adds a custom attribute.
    #[must_use]
    pub fn attribute(mut self, attribute: CustomAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    fn build(self, declaring: Weak<CilType>, type_full_name: &str) -> FieldRc {
        Arc::new(Field {
            token: Token::new(self.token),
            full_name: format!("{type_full_name}::{}", self.name),
            name: self.name,
            flags: self.flags,
            field_type: self.field_type,
            constant: self.constant,
            attributes: self.attributes,
            declaring,
        })
    }
}

/// Builder for a [`Property`](crate::metadata::members::Property).
pub struct PropertyBuilder {
    token: u32,
    name: String,
    property_type: TypeSig,
    getter: Option<String>,
    setter: Option<String>,
    attributes: Vec<CustomAttribute>,
}

impl PropertyBuilder {
    /// Starts a property with the given token, name and declared type.
    #[must_use]
    pub fn new(token: u32, name: &str, property_type: TypeSig) -> Self {
        PropertyBuilder {
            token,
            name: name.to_string(),
            property_type,
            getter: None,
            setter: None,
            attributes: Vec::new(),
        }
    }

    /// Names the getter accessor; resolved against the declaring type's
    /// methods when the type is registered.
    #[must_use]
    pub fn getter(mut self, method_name: &str) -> Self {
        self.getter = Some(method_name.to_string());
        self
    }

    /// Names the setter accessor; resolved against the declaring type's
    /// methods when the type is registered.
    #[must_use]
    pub fn setter(mut self, method_name: &str) -> Self {
        self.setter = Some(method_name.to_string());
        self
    }

    /// Adds a custom attribute.
    #[must_use]
    pub fn attribute(mut self, attribute: CustomAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }
}

/// Builder for an [`Event`].
pub struct EventBuilder {
    token: u32,
    name: String,
    event_type: CilTypeRef,
    add: Option<String>,
    remove: Option<String>,
    raise: Option<String>,
    attributes: Vec<CustomAttribute>,
}

impl EventBuilder {
    /// Starts an event with the given token, name and handler type.
    #[must_use]
    pub fn new(token: u32, name: &str, event_type: CilTypeRef) -> Self {
        EventBuilder {
            token,
            name: name.to_string(),
            event_type,
            add: None,
            remove: None,
            raise: None,
            attributes: Vec::new(),
        }
    }

    /// Names the `add` accessor.
    #[must_use]
    pub fn add(mut self, method_name: &str) -> Self {
        self.add = Some(method_name.to_string());
        self
    }

    /// Names the `remove` accessor.
    #[must_use]
    pub fn remove(mut self, method_name: &str) -> Self {
        self.remove = Some(method_name.to_string());
        self
    }

    /// Names the `raise` accessor.
    #[must_use]
    pub fn raise(mut self, method_name: &str) -> Self {
        self.raise = Some(method_name.to_string());
        self
    }

    /// Adds a custom attribute.
    #[must_use]
    pub fn attribute(mut self, attribute: CustomAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }
}

/// Builder for a [`CilType`] and its members.
pub struct TypeBuilder {
    token: u32,
    name: String,
    namespace: String,
    flags: TypeFlags,
    base: Option<CilTypeRef>,
    interfaces: Vec<CilTypeRef>,
    generic_params: Vec<GenericParam>,
    attributes: Vec<CustomAttribute>,
    layout: Option<TypeLayout>,
    methods: Vec<MethodBuilder>,
    fields: Vec<FieldBuilder>,
    properties: Vec<PropertyBuilder>,
    events: Vec<EventBuilder>,
}

impl TypeBuilder {
    /// Starts a type with the given token, simple name and namespace (empty
    /// string for the global namespace).
    #[must_use]
    pub fn new(token: u32, name: &str, namespace: &str) -> Self {
        TypeBuilder {
            token,
            name: name.to_string(),
            namespace: namespace.to_string(),
            flags: TypeFlags::empty(),
            base: None,
            interfaces: Vec::new(),
            generic_params: Vec::new(),
            attributes: Vec::new(),
            layout: None,
            methods: Vec::new(),
            fields: Vec::new(),
            properties: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Unions the given flags into the type's flag set.
    #[must_use]
    pub fn flags(mut self, flags: TypeFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Sets the base type.
    #[must_use]
    pub fn base(mut self, base: CilTypeRef) -> Self {
        self.base = Some(base);
        self
    }

    /// Adds an implemented interface.
    #[must_use]
    pub fn implements(mut self, interface: CilTypeRef) -> Self {
        self.interfaces.push(interface);
        self
    }

    /// Appends a generic parameter.
    #[must_use]
    pub fn generic_param(mut self, name: &str, constraints: Vec<CilTypeRef>) -> Self {
        let index = self.generic_params.len() as u32;
        self.generic_params.push(GenericParam {
            name: name.to_string(),
            index,
            constraints,
        });
        self
    }

    /// Adds a custom attribute.
    #[must_use]
    pub fn attribute(mut self, attribute: CustomAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Sets explicit layout information.
    #[must_use]
    pub fn layout(mut self, layout: TypeLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Adds a method.
    #[must_use]
    pub fn method(mut self, method: MethodBuilder) -> Self {
        self.methods.push(method);
        self
    }

    /// Adds a field.
    #[must_use]
    pub fn field(mut self, field: FieldBuilder) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds a property.
    #[must_use]
    pub fn property(mut self, property: PropertyBuilder) -> Self {
        self.properties.push(property);
        self
    }

    /// Adds an event.
    #[must_use]
    pub fn event(mut self, event: EventBuilder) -> Self {
        self.events.push(event);
        self
    }

    /// Builds the type, wires its members and registers everything in the
    /// module's token map.
    #[must_use]
    pub fn register(self, module: &ModuleRc) -> CilTypeRc {
        self.register_with_full_name(module, None)
    }

    /// Builds the type as a nested type of `outer` and registers it.
    #[must_use]
    pub fn register_nested(self, module: &ModuleRc, outer: &CilTypeRc) -> CilTypeRc {
        let ty = self.register_with_full_name(module, Some(outer.full_name.as_str()));
        outer.nested_types.push(CilTypeRef::to(&ty));
        ty
    }

    fn register_with_full_name(self, module: &ModuleRc, outer: Option<&str>) -> CilTypeRc {
        let mut flags = self.flags;
        let full_name = match outer {
            Some(outer_name) => {
                flags |= TypeFlags::NESTED;
                format!("{outer_name}/{}", self.name)
            }
            None if self.namespace.is_empty() => self.name.clone(),
            None => format!("{}.{}", self.namespace, self.name),
        };

        if let Some(base) = &self.base {
            let base_name = base.full_name();
            if base_name == "System.MulticastDelegate" || base_name == "System.Delegate" {
                flags |= TypeFlags::DELEGATE;
            }
        }

        let ty = Arc::new(CilType {
            token: Token::new(self.token),
            name: self.name,
            namespace: self.namespace,
            full_name: full_name.clone(),
            flags,
            base: self.base,
            interfaces: self.interfaces,
            generic_params: self.generic_params,
            methods: boxcar::Vec::new(),
            fields: boxcar::Vec::new(),
            properties: boxcar::Vec::new(),
            events: boxcar::Vec::new(),
            nested_types: boxcar::Vec::new(),
            attributes: self.attributes,
            layout: self.layout,
            module: Arc::downgrade(module),
        });

        for method in self.methods {
            let built = method.build(Arc::downgrade(&ty), &full_name);
            ty.methods.push(built);
        }
        for field in self.fields {
            let built = field.build(Arc::downgrade(&ty), &full_name);
            ty.fields.push(built);
        }
        for property in self.properties {
            let built = build_property(property, &ty, &full_name);
            ty.properties.push(built);
        }
        for event in self.events {
            let built = build_event(event, &ty, &full_name);
            ty.events.push(built);
        }

        module.register_type(&ty);
        ty
    }
}

fn accessor_link(ty: &CilTypeRc, method_name: &Option<String>) -> Option<MemberLink<Method>> {
    let name = method_name.as_ref()?;
    for (_, method) in ty.methods.iter() {
        if method.name == *name {
            return Some(MemberLink::new(&method.full_name, method));
        }
    }
    Some(MemberLink::external(name))
}

fn build_property(builder: PropertyBuilder, ty: &CilTypeRc, type_full_name: &str) -> PropertyRc {
    Arc::new(crate::metadata::members::Property {
        token: Token::new(builder.token),
        full_name: format!("{type_full_name}::{}", builder.name),
        name: builder.name,
        property_type: builder.property_type,
        getter: accessor_link(ty, &builder.getter),
        setter: accessor_link(ty, &builder.setter),
        attributes: builder.attributes,
        declaring: Arc::downgrade(ty),
    })
}

fn build_event(builder: EventBuilder, ty: &CilTypeRc, type_full_name: &str) -> EventRc {
    Arc::new(Event {
        token: Token::new(builder.token),
        full_name: format!("{type_full_name}::{}", builder.name),
        name: builder.name,
        event_type: builder.event_type,
        add: accessor_link(ty, &builder.add),
        remove: accessor_link(ty, &builder.remove),
        raise: accessor_link(ty, &builder.raise),
        attributes: builder.attributes,
        declaring: Arc::downgrade(ty),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uguid::guid;

    #[test]
    fn test_full_name_computation() {
        let module =
            ModuleBuilder::new("lib.dll", guid!("00000000-0000-0000-0000-00000000000a")).build();
        let outer = TypeBuilder::new(0x0200_0001, "Outer", "App").register(&module);
        let nested = TypeBuilder::new(0x0200_0002, "Inner", "App")
            .register_nested(&module, &outer);
        let global = TypeBuilder::new(0x0200_0003, "Loose", "").register(&module);

        assert_eq!(outer.full_name, "App.Outer");
        assert_eq!(nested.full_name, "App.Outer/Inner");
        assert!(nested.is_nested());
        assert_eq!(global.full_name, "Loose");
        assert_eq!(outer.nested_types.count(), 1);
    }

    #[test]
    fn test_member_registration_and_token_resolution() {
        let module =
            ModuleBuilder::new("lib.dll", guid!("00000000-0000-0000-0000-00000000000b")).build();
        let ty = TypeBuilder::new(0x0200_0001, "Widget", "App")
            .method(
                MethodBuilder::new(0x0600_0001, "get_Size")
                    .returns(TypeSig::named("System.Int32")),
            )
            .field(FieldBuilder::new(
                0x0400_0001,
                "size",
                TypeSig::named("System.Int32"),
            ))
            .property(
                PropertyBuilder::new(0x1700_0001, "Size", TypeSig::named("System.Int32"))
                    .getter("get_Size"),
            )
            .register(&module);

        assert_eq!(ty.methods.count(), 1);
        let method = module
            .resolve_token(Token::new(0x0600_0001))
            .and_then(|d| d.as_method())
            .unwrap();
        assert_eq!(method.full_name, "App.Widget::get_Size");
        assert!(method.declaring_type().is_some());

        let (_, property) = ty.properties.iter().next().unwrap();
        let getter = property.getter.as_ref().unwrap().resolve().unwrap();
        assert_eq!(getter.token, method.token);

        assert!(module.resolve_token(Token::new(0x0400_0001)).is_some());
        assert!(module.resolve_token(Token::new(0x1700_0001)).is_some());
        assert!(module.resolve_token(Token::new(0x0600_00FF)).is_none());
    }

    #[test]
    fn test_delegate_flag_from_base() {
        let module =
            ModuleBuilder::new("lib.dll", guid!("00000000-0000-0000-0000-00000000000c")).build();
        let ty = TypeBuilder::new(0x0200_0001, "Handler", "App")
            .base(CilTypeRef::named("System.MulticastDelegate"))
            .register(&module);
        assert!(ty.is_delegate());
        assert_eq!(ty.type_kind(), "delegate");
    }
}
