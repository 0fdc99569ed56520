//! Compiled script (`.DAT`) loading: symbol table, bytecode decoding and an in-memory assembler.

pub mod builder;
pub mod instruction;
pub mod opcode;
mod reader;
pub mod script;
pub mod symbol;

pub use builder::{FunctionBuilder, Label, ScriptBuilder};
pub use instruction::{Instruction, Operand};
pub use opcode::{Opcode, OperandKind};
pub use script::{Script, GLOBAL_SLOT_NAMES};
pub use symbol::{DataType, Symbol, SymbolData, SymbolFlags, SymbolKey};
