use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Result, VmError};
use crate::format::opcode::{OperandKind, Opcode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    None,
    Address(u32),
    Immediate(i32),
    Symbol(u32),
    Element { symbol: u32, index: u8 },
}

/// One decoded bytecode record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    address: u32,
    opcode: Opcode,
    operand: Operand,
}

impl Instruction {
    pub fn new(address: u32, opcode: Opcode, operand: Operand) -> Self {
        Self { address, opcode, operand }
    }

    /// Decodes the instruction starting at `address`. Pure; no cursor is advanced.
    pub fn decode(code: &[u8], address: u32) -> Result<Self> {
        let len = code.len() as u32;
        let out_of_bounds = || VmError::OutOfBounds { address, len };

        let start = address as usize;
        let byte = *code.get(start).ok_or_else(out_of_bounds)?;
        let opcode = Opcode::try_from(byte).map_err(|opcode| VmError::InvalidOpcode { opcode, address })?;

        let end = start + opcode.size() as usize;
        let body = code.get(start + 1..end).ok_or_else(out_of_bounds)?;

        let operand = match opcode.operand_kind() {
            OperandKind::None => Operand::None,
            OperandKind::Address => Operand::Address(LittleEndian::read_u32(body)),
            OperandKind::Immediate => Operand::Immediate(LittleEndian::read_i32(body)),
            OperandKind::Symbol => Operand::Symbol(LittleEndian::read_u32(body)),
            OperandKind::Element => Operand::Element {
                symbol: LittleEndian::read_u32(&body[..4]),
                index: body[4],
            },
        };

        Ok(Self { address, opcode, operand })
    }

    pub fn address(&self) -> u32 {
        self.address
    }

    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    pub fn operand(&self) -> Operand {
        self.operand
    }

    pub fn size(&self) -> u32 {
        self.opcode.size()
    }

    pub fn next_address(&self) -> u32 {
        self.address + self.size()
    }

    pub fn mnemonic(&self) -> &'static str {
        self.opcode.mnemonic()
    }

    pub fn disassemble(&self) -> String {
        match self.operand {
            Operand::None => self.mnemonic().to_string(),
            Operand::Address(target) => format!("{:8} 0x{:08x}", self.mnemonic(), target),
            Operand::Immediate(value) => format!("{:8} {}", self.mnemonic(), value),
            Operand::Symbol(symbol) => format!("{:8} #{}", self.mnemonic(), symbol),
            Operand::Element { symbol, index } => format!("{:8} #{}[{}]", self.mnemonic(), symbol, index),
        }
    }

    pub(crate) fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.opcode as u8);
        match self.operand {
            Operand::None => {}
            Operand::Address(v) | Operand::Symbol(v) => out.extend_from_slice(&v.to_le_bytes()),
            Operand::Immediate(v) => out.extend_from_slice(&v.to_le_bytes()),
            Operand::Element { symbol, index } => {
                out.extend_from_slice(&symbol.to_le_bytes());
                out.push(index);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decode_operands() {
        let code = [64, 0xFE, 0xFF, 0xFF, 0xFF, 245, 7, 0, 0, 0, 3, 60];
        let pushi = Instruction::decode(&code, 0).unwrap();
        assert_eq!(pushi.operand(), Operand::Immediate(-2));
        assert_eq!(pushi.next_address(), 5);

        let pushvv = Instruction::decode(&code, 5).unwrap();
        assert_eq!(pushvv.operand(), Operand::Element { symbol: 7, index: 3 });
        assert_eq!(pushvv.disassemble(), "pushvv   #7[3]");

        let rsr = Instruction::decode(&code, 11).unwrap();
        assert_eq!(rsr.opcode(), Opcode::Rsr);
    }

    #[test]
    fn decode_errors() {
        let code = [61, 0, 0, 99];
        assert!(matches!(Instruction::decode(&code, 0), Err(VmError::OutOfBounds { .. })));
        assert!(matches!(Instruction::decode(&code, 4), Err(VmError::OutOfBounds { address: 4, len: 4 })));
        assert!(matches!(
            Instruction::decode(&code, 3),
            Err(VmError::InvalidOpcode { opcode: 99, address: 3 })
        ));
    }
}
