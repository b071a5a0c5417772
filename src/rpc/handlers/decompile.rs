//! Decompiler pass-through operations.
//!
//! The engine resolves the definition and forwards it to the plugged-in
//! [`Decompiler`](crate::decompile::Decompiler); the produced text is returned
//! unmodified.

use serde_json::{json, Map, Value};

use crate::decompile::DecompileTarget;
use crate::rpc::dispatch::QueryContext;
use crate::rpc::handlers::{
    find_module, resolve_event, resolve_field, resolve_method, resolve_property, resolve_type,
};
use crate::rpc::params::{require_str, require_u32};
use crate::{Error, Result};

fn decompile_resolved(ctx: &QueryContext<'_>, target: &DecompileTarget) -> Result<Value> {
    let Some(decompiler) = ctx.decompiler else {
        return Err(Error::Internal("No decompiler is available".to_string()));
    };
    let text = decompiler.decompile(target)?;
    Ok(json!({
        "language": decompiler.language(),
        "text": text,
    }))
}

/// `decompile` - kind-dispatched member decompilation. Type/assembly/module
/// scale targets are rejected; the dedicated operations handle those.
pub(crate) fn decompile(ctx: &QueryContext<'_>, params: &Map<String, Value>) -> Result<Value> {
    let kind = require_str(params, "kind")?;
    let module = find_module(ctx, params, "moduleMvid")?;
    let token = require_u32(params, "token")?;
    match kind.as_str() {
        "method" => {
            decompile_resolved(ctx, &DecompileTarget::Method(resolve_method(&module, token)?))
        }
        "field" => decompile_resolved(ctx, &DecompileTarget::Field(resolve_field(&module, token)?)),
        "property" => decompile_resolved(
            ctx,
            &DecompileTarget::Property(resolve_property(&module, token)?),
        ),
        "event" => decompile_resolved(ctx, &DecompileTarget::Event(resolve_event(&module, token)?)),
        "assembly" | "module" | "namespace" | "type" => Err(Error::InvalidParameter(
            "Decompile kind not allowed. Use decompileMethod/decompileField/decompileProperty/decompileEvent."
                .to_string(),
        )),
        other => Err(Error::InvalidParameter(format!("Unknown kind: {other}"))),
    }
}

/// `decompileMethod` - decompile one method.
pub(crate) fn decompile_method(
    ctx: &QueryContext<'_>,
    params: &Map<String, Value>,
) -> Result<Value> {
    let module = find_module(ctx, params, "moduleMvid")?;
    let method = resolve_method(&module, require_u32(params, "token")?)?;
    decompile_resolved(ctx, &DecompileTarget::Method(method))
}

/// `decompileField` - decompile one field.
pub(crate) fn decompile_field(
    ctx: &QueryContext<'_>,
    params: &Map<String, Value>,
) -> Result<Value> {
    let module = find_module(ctx, params, "moduleMvid")?;
    let field = resolve_field(&module, require_u32(params, "token")?)?;
    decompile_resolved(ctx, &DecompileTarget::Field(field))
}

/// `decompileProperty` - decompile one property.
pub(crate) fn decompile_property(
    ctx: &QueryContext<'_>,
    params: &Map<String, Value>,
) -> Result<Value> {
    let module = find_module(ctx, params, "moduleMvid")?;
    let property = resolve_property(&module, require_u32(params, "token")?)?;
    decompile_resolved(ctx, &DecompileTarget::Property(property))
}

/// `decompileEvent` - decompile one event.
pub(crate) fn decompile_event(
    ctx: &QueryContext<'_>,
    params: &Map<String, Value>,
) -> Result<Value> {
    let module = find_module(ctx, params, "moduleMvid")?;
    let event = resolve_event(&module, require_u32(params, "token")?)?;
    decompile_resolved(ctx, &DecompileTarget::Event(event))
}

/// `decompileType` - decompile one whole type.
pub(crate) fn decompile_type(
    ctx: &QueryContext<'_>,
    params: &Map<String, Value>,
) -> Result<Value> {
    let module = find_module(ctx, params, "moduleMvid")?;
    let ty = resolve_type(&module, require_u32(params, "typeToken")?)?;
    decompile_resolved(ctx, &DecompileTarget::Type(ty))
}
