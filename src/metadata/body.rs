//! Method bodies and instruction streams.
//!
//! The engine never decodes bytes; the external loader hands it already-decoded
//! instruction streams. An [`Instruction`] carries its byte offset, an
//! [`OpCode`] (mnemonic plus flow classification) and a resolved [`Operand`].
//! The opcode table below covers the instructions the engine classifies -
//! calls, field accesses, string loads, branches and throws; hosts are free to
//! construct instructions with opcodes outside this table.

use crate::metadata::{
    members::{Field, MemberLink, Method},
    signatures::TypeSig,
    types::CilTypeRef,
};

/// Flow-control classification of an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowControl {
    /// Falls through to the next instruction.
    Next,
    /// Unconditional branch.
    Branch,
    /// Conditional branch.
    CondBranch,
    /// Method call.
    Call,
    /// Returns from the method.
    Return,
    /// Raises an exception.
    Throw,
    /// No runtime effect (prefixes and markers).
    Meta,
}

/// A CIL opcode: mnemonic plus flow classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpCode {
    /// Instruction mnemonic as it appears in IL listings.
    pub mnemonic: &'static str,
    /// Flow-control classification.
    pub flow: FlowControl,
}

impl OpCode {
    /// Classifies a call-shaped instruction: `call`, `callvirt`, `newobj`,
    /// `calli` or `jmp`. Any other opcode carrying a method operand (e.g.
    /// `ldftn`) is reported as a plain `call`.
    #[must_use]
    pub fn call_kind(&self) -> &'static str {
        match self.mnemonic {
            "callvirt" => "callvirt",
            "newobj" => "newobj",
            "calli" => "calli",
            "jmp" => "jmp",
            _ => "call",
        }
    }

    /// Classifies a field-access instruction into `read`, `write` or
    /// `address`; other opcodes report `access`.
    #[must_use]
    pub fn field_access_kind(&self) -> &'static str {
        match self.mnemonic {
            "ldfld" | "ldsfld" => "read",
            "stfld" | "stsfld" => "write",
            "ldflda" | "ldsflda" => "address",
            _ => "access",
        }
    }
}

/// Well-known opcodes referenced by the engine and by model builders.
#[allow(missing_docs)]
pub mod opcodes {
    use super::{FlowControl, OpCode};

    macro_rules! op {
        ($name:ident, $mnemonic:literal, $flow:ident) => {
            pub const $name: OpCode = OpCode {
                mnemonic: $mnemonic,
                flow: FlowControl::$flow,
            };
        };
    }

    op!(NOP, "nop", Next);
    op!(RET, "ret", Return);
    op!(DUP, "dup", Next);
    op!(POP, "pop", Next);
    op!(LDNULL, "ldnull", Next);
    op!(LDC_I4, "ldc.i4", Next);
    op!(LDSTR, "ldstr", Next);
    op!(LDLOC, "ldloc", Next);
    op!(STLOC, "stloc", Next);
    op!(LDARG, "ldarg", Next);
    op!(STARG, "starg", Next);
    op!(CALL, "call", Call);
    op!(CALLVIRT, "callvirt", Call);
    op!(NEWOBJ, "newobj", Call);
    op!(CALLI, "calli", Call);
    op!(JMP, "jmp", Call);
    op!(LDFTN, "ldftn", Next);
    op!(LDVIRTFTN, "ldvirtftn", Next);
    op!(LDFLD, "ldfld", Next);
    op!(LDSFLD, "ldsfld", Next);
    op!(STFLD, "stfld", Next);
    op!(STSFLD, "stsfld", Next);
    op!(LDFLDA, "ldflda", Next);
    op!(LDSFLDA, "ldsflda", Next);
    op!(LDTOKEN, "ldtoken", Next);
    op!(NEWARR, "newarr", Next);
    op!(ISINST, "isinst", Next);
    op!(CASTCLASS, "castclass", Next);
    op!(BOX, "box", Next);
    op!(UNBOX_ANY, "unbox.any", Next);
    op!(BR, "br", Branch);
    op!(LEAVE, "leave", Branch);
    op!(BRTRUE, "brtrue", CondBranch);
    op!(BRFALSE, "brfalse", CondBranch);
    op!(BEQ, "beq", CondBranch);
    op!(SWITCH, "switch", CondBranch);
    op!(THROW, "throw", Throw);
    op!(RETHROW, "rethrow", Throw);
    op!(ENDFINALLY, "endfinally", Return);
}

/// A resolved instruction operand.
#[derive(Debug, Clone)]
pub enum Operand {
    /// No operand.
    None,
    /// A method reference (call targets, `ldftn`).
    Method(MemberLink<Method>),
    /// A field reference.
    Field(MemberLink<Field>),
    /// A type reference (`newarr`, `isinst`, `ldtoken`, ...).
    Type(CilTypeRef),
    /// An inline string literal (`ldstr`).
    String(String),
    /// A local variable index.
    Local(u16),
    /// A parameter index.
    Param(u16),
    /// A branch target byte offset.
    Branch(u32),
    /// Switch target byte offsets.
    Switch(Vec<u32>),
    /// An integer immediate.
    Int(i64),
    /// A floating point immediate.
    Float(f64),
}

/// One decoded instruction in a method body.
#[derive(Debug, Clone)]
pub struct Instruction {
    /// Byte offset from the start of the body.
    pub offset: u32,
    /// The opcode.
    pub opcode: OpCode,
    /// The resolved operand.
    pub operand: Operand,
}

impl Instruction {
    /// Creates an instruction at the given offset.
    #[must_use]
    pub fn new(offset: u32, opcode: OpCode, operand: Operand) -> Self {
        Instruction {
            offset,
            opcode,
            operand,
        }
    }
}

/// A local variable slot in a method body.
#[derive(Debug, Clone)]
pub struct LocalVar {
    /// Slot index.
    pub index: u32,
    /// Variable name; empty when the module carries no name for it.
    pub name: String,
    /// Declared type.
    pub local_type: TypeSig,
}

/// Exception handler region kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// `catch` clause.
    Catch,
    /// `filter` clause.
    Filter,
    /// `finally` clause.
    Finally,
    /// `fault` clause.
    Fault,
}

/// One exception handler region of a method body.
#[derive(Debug, Clone)]
pub struct ExceptionHandler {
    /// Region kind.
    pub kind: HandlerKind,
    /// Protected region start offset.
    pub try_offset: u32,
    /// Protected region length.
    pub try_length: u32,
    /// Handler start offset.
    pub handler_offset: u32,
    /// Handler length.
    pub handler_length: u32,
}

/// A method's decoded instruction stream and body-level metadata.
#[derive(Debug, Clone, Default)]
pub struct MethodBody {
    /// Declared maximum evaluation stack depth.
    pub max_stack: u32,
    /// `true` when locals are zero-initialized.
    pub init_locals: bool,
    /// Local variable slots.
    pub locals: Vec<LocalVar>,
    /// Exception handler regions.
    pub exception_handlers: Vec<ExceptionHandler>,
    /// Instructions in stream order.
    pub instructions: Vec<Instruction>,
}
