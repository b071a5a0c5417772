//! Request dispatch.
//!
//! The dispatcher maps a request name to one of ~40 registered handlers,
//! normalizes the envelope semantics (notifications, error taxonomy) and
//! shields the execution context from handler panics. The registry is built
//! once at construction - a map from name to handler function, not a branch
//! chain.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::decompile::Decompiler;
use crate::metadata::workspace::Workspace;
use crate::rpc::envelope::{make_error, make_result, Request};
use crate::rpc::handlers;
use crate::{Error, Result};

/// Per-request view of the engine's collaborators.
pub struct QueryContext<'a> {
    /// The loaded-module collection.
    pub workspace: &'a Workspace,
    /// The decompiler collaborator, when one is plugged in.
    pub decompiler: Option<&'a dyn Decompiler>,
}

/// An operation handler: context + parameter object in, JSON result out.
pub type HandlerFn = fn(&QueryContext<'_>, &Map<String, Value>) -> Result<Value>;

/// Maps request names to operations and converts failures into error
/// responses.
pub struct Dispatcher {
    workspace: Arc<Workspace>,
    decompiler: Option<Arc<dyn Decompiler>>,
    handlers: HashMap<&'static str, HandlerFn>,
}

impl Dispatcher {
    /// Creates a dispatcher over a workspace, with the full handler registry.
    #[must_use]
    pub fn new(workspace: Arc<Workspace>) -> Self {
        Dispatcher {
            workspace,
            decompiler: None,
            handlers: registry(),
        }
    }

    /// Plugs in a decompiler collaborator.
    #[must_use]
    pub fn with_decompiler(mut self, decompiler: Arc<dyn Decompiler>) -> Self {
        self.decompiler = Some(decompiler);
        self
    }

    /// Returns the registered operation names, sorted.
    #[must_use]
    pub fn method_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Processes one request envelope.
    ///
    /// Returns `None` for notifications (no correlation id), which execute but
    /// never produce a response - not even on error.
    #[must_use]
    pub fn handle_value(&self, request: Value) -> Option<Value> {
        let request = match Request::from_value(request) {
            Ok(request) => request,
            Err(err) => return Some(make_error(&Value::Null, &err)),
        };
        let id = request.id.clone();
        let method = match request.method.as_deref() {
            Some(method) if !method.trim().is_empty() => method,
            _ => {
                let err = Error::InvalidRequest("Invalid Request".to_string());
                return id.map(|id| make_error(&id, &err));
            }
        };

        tracing::debug!(method, "dispatching query");
        match self.execute(method, &request.params) {
            Ok(result) => id.map(|id| make_result(&id, result)),
            Err(err) => {
                tracing::warn!(method, error = %err, "query failed");
                id.map(|id| make_error(&id, &err))
            }
        }
    }

    /// Processes one request from raw text, for transports that frame plain
    /// byte streams. Malformed bodies produce a parse-failure envelope.
    #[must_use]
    pub fn handle_text(&self, text: &str) -> Option<String> {
        let value: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(err) => {
                let failure = Error::ParseFailure(err.to_string());
                return Some(make_error(&Value::Null, &failure).to_string());
            }
        };
        self.handle_value(value).map(|response| response.to_string())
    }

    fn execute(&self, method: &str, params: &Map<String, Value>) -> Result<Value> {
        let Some(handler) = self.handlers.get(method) else {
            return Err(Error::MethodNotFound(method.to_string()));
        };
        let ctx = QueryContext {
            workspace: &self.workspace,
            decompiler: self.decompiler.as_deref(),
        };
        match std::panic::catch_unwind(AssertUnwindSafe(|| handler(&ctx, params))) {
            Ok(outcome) => outcome,
            Err(payload) => Err(Error::Internal(panic_text(&payload))),
        }
    }
}

fn panic_text(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "handler panicked".to_string()
    }
}

fn registry() -> HashMap<&'static str, HandlerFn> {
    let entries: [(&'static str, HandlerFn); 40] = [
        ("listAssemblies", handlers::modules::list_assemblies),
        ("getAssemblyInfo", handlers::modules::get_assembly_info),
        ("listNamespaces", handlers::modules::list_namespaces),
        ("getAssemblyGraph", handlers::modules::get_assembly_graph),
        ("listTypes", handlers::types::list_types),
        ("listMembers", handlers::types::list_members),
        ("getTypeInfo", handlers::types::get_type_info),
        ("getTypeFields", handlers::types::get_type_fields),
        ("getTypeProperty", handlers::types::get_type_property),
        ("getFieldInfo", handlers::types::get_field_info),
        ("getEnumInfo", handlers::types::get_enum_info),
        ("getStructInfo", handlers::types::get_struct_info),
        ("getInterfaceInfo", handlers::types::get_interface_info),
        ("getMethodSignature", handlers::types::get_method_signature),
        ("searchTypes", handlers::searches::search_types),
        ("searchMembers", handlers::searches::search_members),
        ("searchStrings", handlers::searches::search_strings),
        ("search", handlers::searches::search),
        ("symbolResolve", handlers::searches::symbol_resolve),
        ("findAttributes", handlers::searches::find_attributes),
        ("getTypeDependencies", handlers::graph::get_type_dependencies),
        ("getInheritanceTree", handlers::graph::get_inheritance_tree),
        ("findDerivedTypes", handlers::graph::find_derived_types),
        ("findImplementations", handlers::graph::find_implementations),
        ("findPathToType", handlers::graph::find_path_to_type),
        ("getOverridesChain", handlers::graph::get_overrides_chain),
        ("findReferences", handlers::usages::find_references),
        ("getCallers", handlers::usages::get_callers),
        ("getCallees", handlers::usages::get_callees),
        ("findTypeUsages", handlers::usages::find_type_usages),
        ("findMethodUsages", handlers::usages::find_method_usages),
        ("findFieldUsages", handlers::usages::find_field_usages),
        ("disassembleMethod", handlers::bodies::disassemble_method),
        ("getMethodBodyInfo", handlers::bodies::get_method_body_info),
        ("decompile", handlers::decompile::decompile),
        ("decompileMethod", handlers::decompile::decompile_method),
        ("decompileField", handlers::decompile::decompile_field),
        ("decompileProperty", handlers::decompile::decompile_property),
        ("decompileEvent", handlers::decompile::decompile_event),
        ("decompileType", handlers::decompile::decompile_type),
    ];
    entries.into_iter().collect()
}
