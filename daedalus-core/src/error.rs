use thiserror::Error;

use crate::vm::{InstanceType, ValueKind};

pub type Result<T, E = VmError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum VmError {
    #[error("failed to load script: {0}")]
    Load(String),

    #[error("symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("symbol {name} is not an external function")]
    NotExternal { name: String },

    #[error("symbol {name} is not a callable function")]
    NotAFunction { name: String },

    #[error("symbol {name} is not an instance")]
    NotAnInstance { name: String },

    #[error("address out of bounds: address=0x{address:X}, code_len=0x{len:X}")]
    OutOfBounds { address: u32, len: u32 },

    #[error("invalid opcode: 0x{opcode:02X} at address=0x{address:X}")]
    InvalidOpcode { opcode: u8, address: u32 },

    #[error("stack underflow")]
    StackUnderflow,

    #[error("stack type mismatch: expected {expected}, found {found}")]
    StackTypeMismatch { expected: &'static str, found: &'static str },

    #[error("signature mismatch for {name}: {reason}")]
    SignatureMismatch { name: String, reason: String },

    #[error("instance type mismatch: expected {expected}, found {found}")]
    InstanceTypeMismatch { expected: InstanceType, found: String },

    #[error("instance allocation exhausted (limit={limit})")]
    AllocationExhausted { limit: usize },

    #[error("instance handle is stale or was freed")]
    StaleInstance,

    #[error("class {class} has no member {member}")]
    UnknownMember { class: String, member: String },

    #[error("access to member {name} without an instance context")]
    NullInstanceAccess { name: String },

    #[error("illegal access to member {name} through an instance of class {class}")]
    IllegalMemberAccess { name: String, class: String },

    #[error("attempt to modify constant symbol {name}")]
    IllegalConstAccess { name: String },

    #[error("index {index} out of range for symbol {name} (count={count})")]
    IndexOutOfRange { name: String, index: usize, count: usize },

    #[error("symbol {name} holds {actual}, not {requested}")]
    SymbolTypeMismatch { name: String, requested: ValueKind, actual: &'static str },

    #[error("division by zero at address=0x{address:X}")]
    DivisionByZero { address: u32 },

    #[error("call depth exceeded (limit={limit})")]
    CallDepthExceeded { limit: usize },

    #[error("external {name} failed: {source}")]
    ExternalFailed {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("vm is poisoned by an earlier fatal error")]
    Poisoned,
}

impl VmError {
    /// Errors after which the evaluation stack and call frames can no longer be trusted.
    ///
    /// Non-fatal errors raised by host-facing calls leave the VM usable. Any error that escapes
    /// executing script code unwinds every nested frame and poisons the VM regardless.
    pub fn is_fatal(&self) -> bool {
        match self {
            VmError::Load(_)
            | VmError::SymbolNotFound(_)
            | VmError::NotExternal { .. }
            | VmError::NotAFunction { .. }
            | VmError::NotAnInstance { .. }
            | VmError::InstanceTypeMismatch { .. }
            | VmError::AllocationExhausted { .. }
            | VmError::StaleInstance
            | VmError::UnknownMember { .. }
            | VmError::SignatureMismatch { .. }
            | VmError::Poisoned => false,

            VmError::OutOfBounds { .. }
            | VmError::InvalidOpcode { .. }
            | VmError::StackUnderflow
            | VmError::StackTypeMismatch { .. }
            | VmError::NullInstanceAccess { .. }
            | VmError::IllegalMemberAccess { .. }
            | VmError::IllegalConstAccess { .. }
            | VmError::IndexOutOfRange { .. }
            | VmError::SymbolTypeMismatch { .. }
            | VmError::DivisionByZero { .. }
            | VmError::CallDepthExceeded { .. }
            | VmError::ExternalFailed { .. } => true,
        }
    }

    pub(crate) fn load(msg: impl Into<String>) -> Self {
        VmError::Load(msg.into())
    }

    pub(crate) fn signature(name: &str, reason: impl Into<String>) -> Self {
        VmError::SignatureMismatch { name: name.to_string(), reason: reason.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_errors_are_recoverable() {
        assert!(!VmError::SymbolNotFound("FOO".into()).is_fatal());
        assert!(!VmError::signature("FOO", "arity").is_fatal());
        assert!(!VmError::AllocationExhausted { limit: 1 }.is_fatal());
    }

    #[test]
    fn stack_errors_are_fatal() {
        assert!(VmError::StackUnderflow.is_fatal());
        assert!(VmError::StackTypeMismatch { expected: "int", found: "string" }.is_fatal());
        assert!(VmError::OutOfBounds { address: 4, len: 2 }.is_fatal());
    }

    #[test]
    fn messages_carry_context() {
        let e = VmError::InvalidOpcode { opcode: 0xAB, address: 0x10 };
        assert_eq!(e.to_string(), "invalid opcode: 0xAB at address=0x10");
    }
}
