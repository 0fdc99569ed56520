use std::collections::HashMap;
use std::fs;
use std::path::Path;

use encoding_rs::{Encoding, WINDOWS_1252};

use crate::error::{Result, VmError};
use crate::format::instruction::{Instruction, Operand};
use crate::format::opcode::Opcode;
use crate::format::reader::Reader;
use crate::format::symbol::{DataType, Symbol, SymbolData, SymbolFlags, SymbolKey};

/// Names of the instance variables the engine binds implicitly.
pub const GLOBAL_SLOT_NAMES: [&str; 5] = ["SELF", "OTHER", "VICTIM", "HERO", "ITEM"];

/// A loaded compiled script: the symbol table plus the bytecode it indexes into.
#[derive(Debug, Clone)]
pub struct Script {
    version: u8,
    symbols: Vec<Symbol>,
    code: Vec<u8>,
    by_name: HashMap<String, u32>,
    by_address: HashMap<u32, u32>,
}

impl Script {
    pub fn load(bytes: &[u8]) -> Result<Self> {
        Self::load_with_encoding(bytes, WINDOWS_1252)
    }

    /// Loads a script whose strings use a code page other than Windows-1252
    /// (Polish and Russian releases, for instance).
    pub fn load_with_encoding(bytes: &[u8], encoding: &'static Encoding) -> Result<Self> {
        let mut r = Reader::new(bytes, encoding);

        let version = r.read_u8("version")?;
        let count = r.read_u32("symbol count")?;
        r.skip(count as u64 * 4, "sort table")?;

        let mut symbols = Vec::with_capacity(count.min(0x10000) as usize);
        for index in 0..count {
            symbols.push(read_symbol(&mut r, index)?);
        }

        let code_size = r.read_u32("code size")?;
        let code = r.read_bytes(code_size as usize, "bytecode")?;

        log::debug!("loaded script v{}: {} symbols, {} bytes of code", version, symbols.len(), code.len());
        Ok(Self::from_parts(version, symbols, code))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| VmError::load(format!("read {:?}: {}", path, e)))?;
        Self::load(&bytes)
    }

    fn from_parts(version: u8, mut symbols: Vec<Symbol>, code: Vec<u8>) -> Self {
        let mut by_name = HashMap::with_capacity(symbols.len());
        for sym in &symbols {
            by_name.entry(sym.name.to_ascii_uppercase()).or_insert(sym.index);
        }

        for name in GLOBAL_SLOT_NAMES {
            if !by_name.contains_key(name) {
                let index = symbols.len() as u32;
                by_name.insert(name.to_string(), index);
                symbols.push(Symbol::generated(name, index, DataType::Instance, None));
            }
        }

        // Const symbols claim their address first. Prototypes and instances without the const
        // flag only fill addresses nothing else claimed; `var func` references never do.
        let mut by_address = HashMap::new();
        let code_bearing = symbols
            .iter()
            .filter(|s| !s.is_external() && !s.is_member() && !s.is_generated());
        for sym in code_bearing.clone().filter(|s| s.is_const()) {
            if matches!(sym.ty, DataType::Function | DataType::Prototype | DataType::Instance) {
                by_address.entry(sym.address).or_insert(sym.index);
            }
        }
        for sym in code_bearing.filter(|s| !s.is_const()) {
            if matches!(sym.ty, DataType::Prototype | DataType::Instance) {
                by_address.entry(sym.address).or_insert(sym.index);
            }
        }

        Self { version, symbols, code, by_name, by_address }
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    /// All symbols in load order.
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn symbol_by_index(&self, index: u32) -> Option<&Symbol> {
        self.symbols.get(index as usize)
    }

    /// Case-insensitive, like the script language itself.
    pub fn symbol_by_name(&self, name: &str) -> Option<&Symbol> {
        let index = match self.by_name.get(name) {
            Some(index) => *index,
            None => *self.by_name.get(&name.to_ascii_uppercase())?,
        };
        self.symbol_by_index(index)
    }

    pub fn symbol_by_address(&self, address: u32) -> Option<&Symbol> {
        self.by_address.get(&address).and_then(|i| self.symbol_by_index(*i))
    }

    pub fn resolve<'k>(&self, key: impl Into<SymbolKey<'k>>) -> Option<&Symbol> {
        match key.into() {
            SymbolKey::Name(name) => self.symbol_by_name(name),
            SymbolKey::Index(index) => self.symbol_by_index(index),
            SymbolKey::Address(address) => self.symbol_by_address(address),
        }
    }

    /// Like [`Script::resolve`], failing with `SymbolNotFound`.
    pub fn find<'k>(&self, key: impl Into<SymbolKey<'k>>) -> Result<&Symbol> {
        let key = key.into();
        self.resolve(key).ok_or_else(|| VmError::SymbolNotFound(key.to_string()))
    }

    pub fn decode(&self, address: u32) -> Result<Instruction> {
        Instruction::decode(&self.code, address)
    }

    /// Parameter symbols of a function, in declaration order.
    pub fn parameters_of(&self, function: &Symbol) -> &[Symbol] {
        if function.ty != DataType::Function {
            return &[];
        }
        self.following(function)
    }

    /// Member symbols of a class, in declaration order.
    pub fn members_of(&self, class: &Symbol) -> &[Symbol] {
        if class.ty != DataType::Class {
            return &[];
        }
        self.following(class)
    }

    fn following(&self, symbol: &Symbol) -> &[Symbol] {
        let start = (symbol.index as usize + 1).min(self.symbols.len());
        let end = (start + symbol.count as usize).min(self.symbols.len());
        &self.symbols[start..end]
    }

    /// Finds a member of `class` by its unqualified name.
    pub fn find_member(&self, class: &Symbol, member: &str) -> Option<&Symbol> {
        self.members_of(class)
            .iter()
            .find(|m| m.short_name().eq_ignore_ascii_case(member))
    }

    /// Follows the parent chain of an instance or prototype up to its class.
    pub fn class_of<'a>(&'a self, symbol: &'a Symbol) -> Option<&'a Symbol> {
        let mut current = symbol;
        for _ in 0..self.symbols.len() {
            if current.ty == DataType::Class {
                return Some(current);
            }
            current = self.symbol_by_index(current.parent?)?;
        }
        None
    }

    /// Code-bearing symbols ordered by address, with the end of each body.
    pub fn code_ranges(&self) -> Vec<(&Symbol, u32)> {
        let mut entries: Vec<&Symbol> = self.by_address.values().filter_map(|i| self.symbol_by_index(*i)).collect();
        entries.sort_by_key(|s| s.address);

        let code_len = self.code.len() as u32;
        let mut ranges = Vec::with_capacity(entries.len());
        for (i, sym) in entries.iter().enumerate() {
            let end = entries.get(i + 1).map(|next| next.address).unwrap_or(code_len);
            ranges.push((*sym, end));
        }
        ranges
    }

    /// Decodes `[start, end)` into instructions.
    pub fn disassemble_range(&self, start: u32, end: u32) -> Result<Vec<Instruction>> {
        let mut out = Vec::new();
        let mut pc = start;
        while pc < end {
            let inst = self.decode(pc)?;
            pc = inst.next_address();
            out.push(inst);
        }
        Ok(out)
    }

    /// Disassembly line with symbol names substituted for indices and addresses.
    pub fn describe(&self, inst: &Instruction) -> String {
        let name = |index: u32| self.symbol_by_index(index).map(|s| s.name.as_str()).unwrap_or("?");
        match inst.operand() {
            Operand::Symbol(index) => format!("{:8} {}", inst.mnemonic(), name(index)),
            Operand::Element { symbol, index } => format!("{:8} {}[{}]", inst.mnemonic(), name(symbol), index),
            Operand::Address(target) => match self.symbol_by_address(target) {
                Some(sym) if inst.opcode() == Opcode::Bl => {
                    format!("{:8} {}", inst.mnemonic(), sym.name)
                }
                _ => inst.disassemble(),
            },
            _ => inst.disassemble(),
        }
    }
}

fn read_symbol(r: &mut Reader, index: u32) -> Result<Symbol> {
    let named = r.read_u32("symbol name flag")?;
    let name = if named != 0 { r.read_line("symbol name")? } else { String::new() };

    let vary = r.read_u32("symbol offset")?;
    let bits = r.read_u32("symbol properties")?;
    let count = bits & 0xFFF;
    let raw_type = (bits >> 12) & 0xF;
    let ty = DataType::from_repr(raw_type)
        .ok_or_else(|| VmError::load(format!("symbol {} ({}) has unknown type {}", index, name, raw_type)))?;
    let flags = SymbolFlags::from_bits_truncate((bits >> 16) & SymbolFlags::FILE_MASK);

    let file_index = r.read_u32("file index")?;
    let line_start = r.read_u32("line start")?;
    let line_count = r.read_u32("line count")?;
    let char_start = r.read_u32("char start")?;
    let char_count = r.read_u32("char count")?;

    let mut address = 0;
    let mut class_offset = 0;
    let mut data = SymbolData::None;

    if !flags.contains(SymbolFlags::MEMBER) {
        match ty {
            DataType::Float => {
                let values = (0..count).map(|_| r.read_f32("float value")).collect::<Result<_>>()?;
                data = SymbolData::Float(values);
            }
            DataType::Int => {
                let values = (0..count).map(|_| r.read_i32("int value")).collect::<Result<_>>()?;
                data = SymbolData::Int(values);
            }
            DataType::String => {
                let values = (0..count).map(|_| r.read_line("string value")).collect::<Result<_>>()?;
                data = SymbolData::String(values);
            }
            DataType::Class => class_offset = r.read_i32("class offset")?,
            DataType::Function => {
                address = r.read_i32("function address")? as u32;
                if !flags.contains(SymbolFlags::CONST) {
                    // `var func` holds a function reference rather than a body.
                    data = SymbolData::Int(vec![address as i32]);
                }
            }
            DataType::Prototype | DataType::Instance => address = r.read_i32("address")? as u32,
            DataType::Void => {}
        }
    }

    let parent = r.read_i32("parent")?;

    Ok(Symbol {
        name,
        index,
        ty,
        flags,
        count,
        vary,
        address,
        class_offset,
        parent: (parent >= 0).then_some(parent as u32),
        file_index,
        line_start,
        line_count,
        char_start,
        char_count,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::ScriptBuilder;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_input_fails_to_load() {
        assert!(matches!(Script::load(&[]), Err(VmError::Load(_))));
        assert!(matches!(Script::load(&[0x32, 5, 0, 0, 0]), Err(VmError::Load(_))));
    }

    #[test]
    fn global_slots_are_synthesized() {
        let script = ScriptBuilder::new().load().unwrap();
        for name in GLOBAL_SLOT_NAMES {
            let sym = script.symbol_by_name(name).unwrap();
            assert!(sym.is_generated());
            assert_eq!(sym.data_type(), DataType::Instance);
        }
        assert_eq!(script.symbol_count(), 5);
    }

    #[test]
    fn resolve_by_name_index_and_address() {
        let mut b = ScriptBuilder::new();
        let x = b.int_var("X", 1);
        let f = b.function("Fn_Answer", &[], Some(DataType::Int)).pushi(42).finish();
        let script = b.load().unwrap();

        assert_eq!(script.resolve("x").unwrap().index(), x);
        assert_eq!(script.resolve(SymbolKey::Index(f)).unwrap().name(), "FN_ANSWER");
        let address = script.symbol_by_index(f).unwrap().address();
        assert_eq!(script.resolve(SymbolKey::Address(address)).unwrap().index(), f);
        assert!(matches!(script.find("NOPE"), Err(VmError::SymbolNotFound(n)) if n == "NOPE"));
    }

    #[test]
    fn members_and_class_chain() {
        let mut b = ScriptBuilder::new();
        let class = b.class("C_NPC", &[("ID", DataType::Int, 1), ("NAME", DataType::String, 5)]);
        let proto = b.prototype("PROTO_NPC", class).finish();
        let inst = b.instance("PC_HERO", proto).finish();
        let script = b.load().unwrap();

        let class_sym = script.symbol_by_index(class).unwrap();
        let members = script.members_of(class_sym);
        assert_eq!(members.len(), 2);
        assert_eq!(members[1].name(), "C_NPC.NAME");
        assert_eq!(members[1].count(), 5);
        assert_eq!(script.find_member(class_sym, "name").unwrap().index(), class + 2);

        let hero = script.symbol_by_index(inst).unwrap();
        assert_eq!(script.class_of(hero).unwrap().index(), class);
        let detached = class_sym.clone();
        assert_eq!(script.class_of(&detached).unwrap().name(), "C_NPC");
    }

    #[test]
    fn address_lookup_prefers_const_definitions() {
        let mut b = ScriptBuilder::new();
        let class = b.class("C_NPC", &[("ID", DataType::Int, 1)]);
        b.instance_var("SOME_NPC", class);
        let startup = b.function("STARTUP", &[], None).finish();
        let proto = b.prototype("PROTO_NPC", class).finish();
        let loaded = b.load().unwrap();

        let mut symbols = loaded.symbols().to_vec();
        symbols[proto as usize].flags.remove(SymbolFlags::CONST);
        let script = Script::from_parts(loaded.version(), symbols, loaded.code().to_vec());

        assert_eq!(script.symbol_by_address(0).unwrap().index(), startup);
        let proto_sym = script.symbol_by_index(proto).unwrap();
        assert!(!proto_sym.is_const());
        assert_ne!(proto_sym.address(), 0);
        assert_eq!(script.symbol_by_address(proto_sym.address()).unwrap().index(), proto);
    }
}
