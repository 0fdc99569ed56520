use std::fmt;

use bitflags::bitflags;
use serde::Serialize;
use strum::{Display, FromRepr};

use crate::vm::ValueKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, FromRepr, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[repr(u32)]
pub enum DataType {
    Void = 0,
    Float = 1,
    Int = 2,
    String = 3,
    Class = 4,
    Function = 5,
    Prototype = 6,
    Instance = 7,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SymbolFlags: u32 {
        const CONST = 1 << 0;
        const RETURN = 1 << 1;
        const MEMBER = 1 << 2;
        const EXTERNAL = 1 << 3;
        const MERGED = 1 << 4;
        /// Never stored in a compiled file; set on symbols the loader synthesizes.
        const GENERATED = 1 << 8;
    }
}

impl SymbolFlags {
    /// Bits that may legally appear in a compiled file.
    pub const FILE_MASK: u32 = 0x1F;
}

/// Initial value of a data symbol as stored in the compiled file.
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolData {
    None,
    Int(Vec<i32>),
    Float(Vec<f32>),
    String(Vec<String>),
}

/// A compiled script symbol. Immutable after load; runtime values live in the VM.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub(crate) name: String,
    pub(crate) index: u32,
    pub(crate) ty: DataType,
    pub(crate) flags: SymbolFlags,
    pub(crate) count: u32,
    pub(crate) vary: u32,
    pub(crate) address: u32,
    pub(crate) class_offset: i32,
    pub(crate) parent: Option<u32>,
    pub(crate) file_index: u32,
    pub(crate) line_start: u32,
    pub(crate) line_count: u32,
    pub(crate) char_start: u32,
    pub(crate) char_count: u32,
    pub(crate) data: SymbolData,
}

impl Symbol {
    pub(crate) fn generated(name: &str, index: u32, ty: DataType, parent: Option<u32>) -> Self {
        Self {
            name: name.to_string(),
            index,
            ty,
            flags: SymbolFlags::GENERATED,
            count: 1,
            vary: 0,
            address: 0,
            class_offset: 0,
            parent,
            file_index: 0,
            line_start: 0,
            line_count: 0,
            char_start: 0,
            char_count: 0,
            data: SymbolData::None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn data_type(&self) -> DataType {
        self.ty
    }

    pub fn flags(&self) -> SymbolFlags {
        self.flags
    }

    pub fn is_const(&self) -> bool {
        self.flags.contains(SymbolFlags::CONST)
    }

    pub fn is_member(&self) -> bool {
        self.flags.contains(SymbolFlags::MEMBER)
    }

    pub fn is_external(&self) -> bool {
        self.flags.contains(SymbolFlags::EXTERNAL)
    }

    pub fn is_merged(&self) -> bool {
        self.flags.contains(SymbolFlags::MERGED)
    }

    pub fn is_generated(&self) -> bool {
        self.flags.contains(SymbolFlags::GENERATED)
    }

    pub fn has_return(&self) -> bool {
        self.flags.contains(SymbolFlags::RETURN)
    }

    /// Element count for data symbols, parameter count for functions, member count for classes.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Bytecode address of functions, prototypes and instances.
    pub fn address(&self) -> u32 {
        self.address
    }

    pub fn parent(&self) -> Option<u32> {
        self.parent
    }

    pub fn return_type(&self) -> Option<DataType> {
        if self.has_return() {
            DataType::from_repr(self.vary)
        } else {
            None
        }
    }

    pub fn class_size(&self) -> Option<u32> {
        (self.ty == DataType::Class).then_some(self.vary)
    }

    pub fn member_offset(&self) -> Option<u32> {
        self.is_member().then_some(self.vary)
    }

    pub fn class_offset(&self) -> Option<i32> {
        (self.ty == DataType::Class).then_some(self.class_offset)
    }

    pub fn file_index(&self) -> u32 {
        self.file_index
    }

    pub fn line_start(&self) -> u32 {
        self.line_start
    }

    pub fn line_count(&self) -> u32 {
        self.line_count
    }

    pub fn char_start(&self) -> u32 {
        self.char_start
    }

    pub fn char_count(&self) -> u32 {
        self.char_count
    }

    pub fn data(&self) -> &SymbolData {
        &self.data
    }

    /// Whether `call()` and `bl` can enter this symbol.
    pub fn is_callable(&self) -> bool {
        self.ty == DataType::Function && self.is_const()
    }

    /// How a value of this symbol travels over the evaluation stack.
    ///
    /// Function references are passed as their symbol index, hence as ints.
    pub fn value_kind(&self) -> Option<ValueKind> {
        ValueKind::from_data_type(self.ty)
    }

    /// Member name without the `CLASS.` qualifier.
    pub fn short_name(&self) -> &str {
        match self.name.rsplit_once('.') {
            Some((_, member)) => member,
            None => &self.name,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (#{}, {})", self.name, self.index, self.ty)
    }
}

/// How a symbol is looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKey<'a> {
    Name(&'a str),
    Index(u32),
    Address(u32),
}

impl<'a> From<&'a str> for SymbolKey<'a> {
    fn from(name: &'a str) -> Self {
        SymbolKey::Name(name)
    }
}

impl<'a> From<&'a String> for SymbolKey<'a> {
    fn from(name: &'a String) -> Self {
        SymbolKey::Name(name)
    }
}

impl From<u32> for SymbolKey<'_> {
    fn from(index: u32) -> Self {
        SymbolKey::Index(index)
    }
}

impl<'a> From<&'a Symbol> for SymbolKey<'a> {
    fn from(symbol: &'a Symbol) -> Self {
        SymbolKey::Index(symbol.index)
    }
}

impl fmt::Display for SymbolKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolKey::Name(name) => write!(f, "{}", name),
            SymbolKey::Index(index) => write!(f, "#{}", index),
            SymbolKey::Address(address) => write!(f, "@0x{:08x}", address),
        }
    }
}
