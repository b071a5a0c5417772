//! Instruction-stream inspection operations.

use std::fmt::Write as _;

use serde_json::{json, Map, Value};

use crate::metadata::{
    body::{FlowControl, Instruction, MethodBody, Operand},
    members::MethodRc,
};
use crate::rpc::dispatch::QueryContext;
use crate::rpc::handlers::{find_module, resolve_method};
use crate::rpc::params::require_u32;
use crate::Result;

fn operand_json(method: &MethodRc, body: &MethodBody, operand: &Operand) -> Value {
    match operand {
        Operand::None => Value::Null,
        Operand::Method(link) => json!(link.full_name()),
        Operand::Field(link) => json!(link.full_name()),
        Operand::Type(type_ref) => json!(type_ref.full_name()),
        Operand::String(text) => json!(text),
        Operand::Branch(offset) => json!(offset),
        Operand::Switch(targets) => json!(targets),
        Operand::Int(value) => json!(value),
        Operand::Float(value) => json!(value),
        Operand::Local(index) => {
            let local = body.locals.iter().find(|l| l.index == u32::from(*index));
            json!({
                "index": index,
                "name": local.map_or("", |l| l.name.as_str()),
                "type": local.map_or(String::new(), |l| l.local_type.full_name()),
            })
        }
        Operand::Param(index) => {
            let param = method.params.iter().find(|p| p.index == u32::from(*index));
            json!({
                "index": index,
                "name": param.map_or("", |p| p.name.as_str()),
                "type": param.map_or(String::new(), |p| p.param_type.full_name()),
            })
        }
    }
}

fn operand_listing_text(operand: &Value) -> Option<String> {
    match operand {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// `disassembleMethod` - the raw instruction listing of a method body.
pub(crate) fn disassemble_method(
    ctx: &QueryContext<'_>,
    params: &Map<String, Value>,
) -> Result<Value> {
    let module = find_module(ctx, params, "moduleMvid")?;
    let method = resolve_method(&module, require_u32(params, "token")?)?;
    let Some(body) = &method.body else {
        return Ok(json!({
            "hasBody": false,
            "methodToken": method.token.value(),
            "methodFullName": method.full_name,
        }));
    };

    let mut instructions = Vec::new();
    let mut text = String::new();
    for instr in &body.instructions {
        let operand = operand_json(&method, body, &instr.operand);
        instructions.push(json!({
            "offset": instr.offset,
            "opcode": instr.opcode.mnemonic,
            "operand": operand,
        }));
        let _ = write!(text, "IL_{:04X}: {}", instr.offset, instr.opcode.mnemonic);
        if let Some(operand_text) = operand_listing_text(&operand) {
            let _ = write!(text, " {operand_text}");
        }
        text.push('\n');
    }

    Ok(json!({
        "hasBody": true,
        "methodToken": method.token.value(),
        "methodFullName": method.full_name,
        "maxStack": body.max_stack,
        "instructionCount": body.instructions.len(),
        "instructions": instructions,
        "text": text,
    }))
}

fn body_stats(instructions: &[Instruction]) -> (u32, u32, u32, u32) {
    let mut branches = 0;
    let mut calls = 0;
    let mut throws = 0;
    let mut switches = 0;
    for instr in instructions {
        match instr.opcode.flow {
            FlowControl::Branch | FlowControl::CondBranch => branches += 1,
            FlowControl::Call => calls += 1,
            _ => {}
        }
        match instr.opcode.mnemonic {
            "throw" | "rethrow" => throws += 1,
            "switch" => switches += 1,
            _ => {}
        }
    }
    (branches, calls, throws, switches)
}

/// `getMethodBodyInfo` - body-level statistics without the full listing.
pub(crate) fn get_method_body_info(
    ctx: &QueryContext<'_>,
    params: &Map<String, Value>,
) -> Result<Value> {
    let module = find_module(ctx, params, "moduleMvid")?;
    let method = resolve_method(&module, require_u32(params, "token")?)?;
    let Some(body) = &method.body else {
        return Ok(json!({
            "hasBody": false,
            "methodToken": method.token.value(),
            "methodFullName": method.full_name,
        }));
    };

    let (branches, calls, throws, switches) = body_stats(&body.instructions);
    Ok(json!({
        "hasBody": true,
        "methodToken": method.token.value(),
        "methodFullName": method.full_name,
        "instructionCount": body.instructions.len(),
        "localCount": body.locals.len(),
        "exceptionHandlerCount": body.exception_handlers.len(),
        "maxStack": body.max_stack,
        "initLocals": body.init_locals,
        "branchCount": branches,
        "callCount": calls,
        "throwCount": throws,
        "switchCount": switches,
    }))
}
