//! In-memory assembler for compiled scripts.
//!
//! Emits the same `.DAT` layout the game's compiler produces, so anything assembled here goes
//! through the real loader. Function bodies get the compiler's parameter prologue.

use encoding_rs::{Encoding, WINDOWS_1252};

use crate::error::Result;
use crate::format::instruction::{Instruction, Operand};
use crate::format::opcode::Opcode;
use crate::format::script::Script;
use crate::format::symbol::{DataType, Symbol, SymbolData, SymbolFlags};

pub struct ScriptBuilder {
    version: u8,
    encoding: &'static Encoding,
    symbols: Vec<Symbol>,
    code: Vec<u8>,
    literals: usize,
}

impl Default for ScriptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self { version: 50, encoding: WINDOWS_1252, symbols: Vec::new(), code: Vec::new(), literals: 0 }
    }

    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    fn add(&mut self, name: &str, ty: DataType, flags: SymbolFlags, count: u32, parent: Option<u32>) -> &mut Symbol {
        let index = self.symbols.len() as u32;
        let mut sym = Symbol::generated(&name.to_ascii_uppercase(), index, ty, parent);
        sym.flags = flags;
        sym.count = count;
        self.symbols.push(sym);
        let last = self.symbols.len() - 1;
        &mut self.symbols[last]
    }

    fn zeroed(ty: DataType, count: u32) -> SymbolData {
        let n = count as usize;
        match ty {
            DataType::Int => SymbolData::Int(vec![0; n]),
            DataType::Float => SymbolData::Float(vec![0.0; n]),
            DataType::String => SymbolData::String(vec![String::new(); n]),
            _ => SymbolData::None,
        }
    }

    /// Declares a class followed by its members (`(name, type, count)`).
    pub fn class(&mut self, name: &str, members: &[(&str, DataType, u32)]) -> u32 {
        let class_name = name.to_ascii_uppercase();
        let class = self.add(&class_name, DataType::Class, SymbolFlags::empty(), members.len() as u32, None);
        let class_index = class.index;

        let mut offset = 0;
        for (member, ty, count) in members {
            let sym = self.add(
                &format!("{}.{}", class_name, member),
                *ty,
                SymbolFlags::MEMBER,
                *count,
                Some(class_index),
            );
            sym.vary = offset;
            offset += 4 * count;
        }
        self.symbols[class_index as usize].vary = offset;
        class_index
    }

    pub fn var(&mut self, name: &str, ty: DataType, count: u32) -> u32 {
        let sym = self.add(name, ty, SymbolFlags::empty(), count, None);
        sym.data = Self::zeroed(ty, count);
        sym.index
    }

    pub fn int_var(&mut self, name: &str, count: u32) -> u32 {
        self.var(name, DataType::Int, count)
    }

    pub fn float_var(&mut self, name: &str, count: u32) -> u32 {
        self.var(name, DataType::Float, count)
    }

    pub fn string_var(&mut self, name: &str, count: u32) -> u32 {
        self.var(name, DataType::String, count)
    }

    /// `var C_FOO name;`
    pub fn instance_var(&mut self, name: &str, class: u32) -> u32 {
        self.add(name, DataType::Instance, SymbolFlags::empty(), 1, Some(class)).index
    }

    pub fn int_const(&mut self, name: &str, values: &[i32]) -> u32 {
        let sym = self.add(name, DataType::Int, SymbolFlags::CONST, values.len() as u32, None);
        sym.data = SymbolData::Int(values.to_vec());
        sym.index
    }

    pub fn float_const(&mut self, name: &str, values: &[f32]) -> u32 {
        let sym = self.add(name, DataType::Float, SymbolFlags::CONST, values.len() as u32, None);
        sym.data = SymbolData::Float(values.to_vec());
        sym.index
    }

    pub fn string_const(&mut self, name: &str, value: &str) -> u32 {
        let sym = self.add(name, DataType::String, SymbolFlags::CONST, 1, None);
        sym.data = SymbolData::String(vec![value.to_string()]);
        sym.index
    }

    /// Anonymous string constant, named the way the compiler names literals.
    pub fn string_literal(&mut self, value: &str) -> u32 {
        self.literals += 1;
        let name = format!("\u{FF}{}", 10000 + self.literals);
        self.string_const(&name, value)
    }

    fn add_params(&mut self, owner: &str, params: &[DataType]) {
        for (i, ty) in params.iter().enumerate() {
            let sym = self.add(&format!("{}.PAR{}", owner, i), *ty, SymbolFlags::empty(), 1, None);
            sym.data = Self::zeroed(*ty, 1);
        }
    }

    fn function_flags(ret: Option<DataType>) -> (SymbolFlags, u32) {
        match ret {
            Some(ty) => (SymbolFlags::CONST | SymbolFlags::RETURN, ty as u32),
            None => (SymbolFlags::CONST, 0),
        }
    }

    pub fn external(&mut self, name: &str, params: &[DataType], ret: Option<DataType>) -> u32 {
        let (flags, vary) = Self::function_flags(ret);
        let sym = self.add(name, DataType::Function, flags | SymbolFlags::EXTERNAL, params.len() as u32, None);
        sym.vary = vary;
        let index = sym.index;
        self.add_params(&name.to_ascii_uppercase(), params);
        index
    }

    /// Starts a script function. The parameter prologue is emitted immediately.
    pub fn function(&mut self, name: &str, params: &[DataType], ret: Option<DataType>) -> FunctionBuilder<'_> {
        let (flags, vary) = Self::function_flags(ret);
        let address = self.code.len() as u32;
        let sym = self.add(name, DataType::Function, flags, params.len() as u32, None);
        sym.vary = vary;
        sym.address = address;
        let index = sym.index;
        self.add_params(&name.to_ascii_uppercase(), params);

        let mut f = FunctionBuilder::new(self, index);
        for (i, ty) in params.iter().enumerate().rev() {
            let param = index + 1 + i as u32;
            f.pushv(param);
            f.op(match ty {
                DataType::Float => Opcode::Movf,
                DataType::String => Opcode::Movs,
                DataType::Instance => Opcode::Movvi,
                _ => Opcode::Movi,
            });
        }
        f
    }

    pub fn prototype(&mut self, name: &str, class: u32) -> FunctionBuilder<'_> {
        let address = self.code.len() as u32;
        let sym = self.add(name, DataType::Prototype, SymbolFlags::CONST, 0, Some(class));
        sym.address = address;
        let index = sym.index;
        FunctionBuilder::new(self, index)
    }

    /// Starts an instance body. Instances derived from a prototype call it first.
    pub fn instance(&mut self, name: &str, parent: u32) -> FunctionBuilder<'_> {
        let address = self.code.len() as u32;
        let sym = self.add(name, DataType::Instance, SymbolFlags::CONST, 0, Some(parent));
        sym.address = address;
        let index = sym.index;

        let proto = self
            .symbols
            .get(parent as usize)
            .filter(|p| p.ty == DataType::Prototype)
            .map(|p| p.address);

        let mut f = FunctionBuilder::new(self, index);
        if let Some(proto_address) = proto {
            f.emit(Opcode::Bl, Operand::Address(proto_address));
        }
        f
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.push(self.version);
        put_u32(&mut out, self.symbols.len() as u32);

        let mut sorted: Vec<&Symbol> = self.symbols.iter().collect();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));
        for sym in sorted {
            put_u32(&mut out, sym.index);
        }

        for sym in &self.symbols {
            self.write_symbol(&mut out, sym);
        }

        put_u32(&mut out, self.code.len() as u32);
        out.extend_from_slice(&self.code);
        out
    }

    pub fn load(&self) -> Result<Script> {
        Script::load_with_encoding(&self.build(), self.encoding)
    }

    fn put_line(&self, out: &mut Vec<u8>, text: &str) {
        let (bytes, _, _) = self.encoding.encode(text);
        out.extend_from_slice(&bytes);
        out.push(b'\n');
    }

    fn write_symbol(&self, out: &mut Vec<u8>, sym: &Symbol) {
        put_u32(out, u32::from(!sym.name.is_empty()));
        if !sym.name.is_empty() {
            self.put_line(out, &sym.name);
        }
        put_u32(out, sym.vary);
        let flags = sym.flags.bits() & SymbolFlags::FILE_MASK;
        put_u32(out, (sym.count & 0xFFF) | (sym.ty as u32) << 12 | flags << 16);
        for v in [sym.file_index, sym.line_start, sym.line_count, sym.char_start, sym.char_count] {
            put_u32(out, v);
        }

        if !sym.is_member() {
            match (&sym.ty, &sym.data) {
                (DataType::Float, SymbolData::Float(values)) => {
                    values.iter().for_each(|v| out.extend_from_slice(&v.to_le_bytes()))
                }
                (DataType::Int, SymbolData::Int(values)) => {
                    values.iter().for_each(|v| out.extend_from_slice(&v.to_le_bytes()))
                }
                (DataType::String, SymbolData::String(values)) => values.iter().for_each(|v| self.put_line(out, v)),
                (DataType::Float, _) => (0..sym.count).for_each(|_| out.extend_from_slice(&0f32.to_le_bytes())),
                (DataType::Int, _) => (0..sym.count).for_each(|_| put_u32(out, 0)),
                (DataType::String, _) => (0..sym.count).for_each(|_| out.push(b'\n')),
                (DataType::Class, _) => out.extend_from_slice(&sym.class_offset.to_le_bytes()),
                (DataType::Function | DataType::Prototype | DataType::Instance, _) => put_u32(out, sym.address),
                (DataType::Void, _) => {}
            }
        }

        out.extend_from_slice(&sym.parent.map(|p| p as i32).unwrap_or(-1).to_le_bytes());
    }
}

fn put_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label(usize);

/// Emits one code body. Finish it with [`FunctionBuilder::finish`], which appends `rsr`.
pub struct FunctionBuilder<'a> {
    builder: &'a mut ScriptBuilder,
    symbol: u32,
    labels: Vec<Option<u32>>,
    fixups: Vec<(usize, Label)>,
    finished: bool,
}

impl<'a> FunctionBuilder<'a> {
    fn new(builder: &'a mut ScriptBuilder, symbol: u32) -> Self {
        Self { builder, symbol, labels: Vec::new(), fixups: Vec::new(), finished: false }
    }

    pub fn symbol(&self) -> u32 {
        self.symbol
    }

    /// Symbol index of the `i`-th parameter.
    pub fn param(&self, i: u32) -> u32 {
        self.symbol + 1 + i
    }

    pub fn emit(&mut self, opcode: Opcode, operand: Operand) -> &mut Self {
        let address = self.builder.code.len() as u32;
        Instruction::new(address, opcode, operand).encode(&mut self.builder.code);
        self
    }

    pub fn op(&mut self, opcode: Opcode) -> &mut Self {
        self.emit(opcode, Operand::None)
    }

    pub fn pushi(&mut self, value: i32) -> &mut Self {
        self.emit(Opcode::Pushi, Operand::Immediate(value))
    }

    /// Float literals travel as their bit pattern, like the compiler emits them.
    pub fn pushf(&mut self, value: f32) -> &mut Self {
        self.pushi(value.to_bits() as i32)
    }

    /// Pushes a reference to a fresh string literal.
    pub fn pushs(&mut self, value: &str) -> &mut Self {
        let literal = self.builder.string_literal(value);
        self.pushv(literal)
    }

    pub fn pushv(&mut self, symbol: u32) -> &mut Self {
        self.emit(Opcode::Pushv, Operand::Symbol(symbol))
    }

    pub fn pushvv(&mut self, symbol: u32, index: u8) -> &mut Self {
        self.emit(Opcode::Pushvv, Operand::Element { symbol, index })
    }

    pub fn pushvi(&mut self, symbol: u32) -> &mut Self {
        self.emit(Opcode::Pushvi, Operand::Symbol(symbol))
    }

    pub fn gmovi(&mut self, symbol: u32) -> &mut Self {
        self.emit(Opcode::Gmovi, Operand::Symbol(symbol))
    }

    pub fn be(&mut self, symbol: u32) -> &mut Self {
        self.emit(Opcode::Be, Operand::Symbol(symbol))
    }

    pub fn bl(&mut self, symbol: u32) -> &mut Self {
        let address = self.builder.symbols.get(symbol as usize).map(|s| s.address).unwrap_or(u32::MAX);
        self.emit(Opcode::Bl, Operand::Address(address))
    }

    /// `be` for externals, `bl` for everything else.
    pub fn call(&mut self, symbol: u32) -> &mut Self {
        let external = self.builder.symbols.get(symbol as usize).is_some_and(|s| s.is_external());
        if external {
            self.be(symbol)
        } else {
            self.bl(symbol)
        }
    }

    /// `symbol = value` for an int variable.
    pub fn set_int(&mut self, symbol: u32, value: i32) -> &mut Self {
        self.pushi(value).pushv(symbol).op(Opcode::Movi)
    }

    /// `symbol[index] = value` for an int array element.
    pub fn set_int_at(&mut self, symbol: u32, index: u8, value: i32) -> &mut Self {
        self.pushi(value).pushvv(symbol, index).op(Opcode::Movi)
    }

    pub fn set_float(&mut self, symbol: u32, value: f32) -> &mut Self {
        self.pushf(value).pushv(symbol).op(Opcode::Movf)
    }

    pub fn set_string(&mut self, symbol: u32, value: &str) -> &mut Self {
        self.pushs(value).pushv(symbol).op(Opcode::Movs)
    }

    pub fn new_label(&mut self) -> Label {
        self.labels.push(None);
        Label(self.labels.len() - 1)
    }

    pub fn bind(&mut self, label: Label) -> &mut Self {
        self.labels[label.0] = Some(self.builder.code.len() as u32);
        self
    }

    fn branch(&mut self, opcode: Opcode, label: Label) -> &mut Self {
        let operand_at = self.builder.code.len() + 1;
        self.fixups.push((operand_at, label));
        self.emit(opcode, Operand::Address(0))
    }

    pub fn b(&mut self, label: Label) -> &mut Self {
        self.branch(Opcode::B, label)
    }

    pub fn bz(&mut self, label: Label) -> &mut Self {
        self.branch(Opcode::Bz, label)
    }

    /// Appends bytes verbatim, for exercising malformed code.
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.builder.code.extend_from_slice(bytes);
        self
    }

    /// Appends the closing `rsr`, patches branches and returns the symbol index.
    pub fn finish(&mut self) -> u32 {
        if !self.finished {
            self.op(Opcode::Rsr);
            for (at, label) in self.fixups.drain(..) {
                let target = self.labels[label.0].unwrap_or(u32::MAX);
                self.builder.code[at..at + 4].copy_from_slice(&target.to_le_bytes());
            }
            self.finished = true;
        }
        self.symbol
    }
}
