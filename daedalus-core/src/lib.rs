//! daedalus-core
//!
//! Loader and stack-based interpreter for compiled Daedalus scripts (`.DAT`).
//!
//! A [`format::Script`] holds the symbol table and the bytecode. A [`vm::DaedalusVm`] executes it,
//! dispatches `external` functions to host callbacks and owns every script instance. Typed field
//! access to instances goes through the views in [`schema`].

pub mod config;
pub mod error;
pub mod format;
pub mod schema;
pub mod trace;
pub mod vm;

pub use config::{ExecutionFlags, VmConfig, VmConfigBuilder, VmConfigReader};
pub use error::{Result, VmError};
pub use format::{DataType, Script, ScriptBuilder, Symbol, SymbolFlags, SymbolKey};
pub use vm::{
    DaedalusVm, GlobalSlot, InstanceHandle, InstanceState, InstanceType, StackFrame, Value, ValueKind,
};
