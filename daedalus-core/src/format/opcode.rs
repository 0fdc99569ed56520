use strum::{Display, EnumIter, FromRepr, IntoStaticStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr, FromRepr, EnumIter)]
#[strum(serialize_all = "lowercase")]
#[repr(u8)]
pub enum Opcode {
    Add = 0,
    Sub = 1,
    Mul = 2,
    Div = 3,
    Mod = 4,
    Or = 5,
    Andb = 6,
    Lt = 7,
    Gt = 8,
    Movi = 9,
    Orr = 11,
    And = 12,
    Lsl = 13,
    Lsr = 14,
    Lte = 15,
    Eq = 16,
    Neq = 17,
    Gte = 18,
    Addmovi = 19,
    Submovi = 20,
    Mulmovi = 21,
    Divmovi = 22,
    Plus = 30,
    Negate = 31,
    Not = 32,
    Cmpl = 33,
    Nop = 45,
    Rsr = 60,
    Bl = 61,
    Be = 62,
    Pushi = 64,
    Pushv = 65,
    Pushvi = 67,
    Movs = 70,
    Movss = 71,
    Movvf = 72,
    Movf = 73,
    Movvi = 74,
    B = 75,
    Bz = 76,
    Gmovi = 80,
    Pushvv = 245,
}

/// How the bytes following an opcode are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    None,
    Address,
    Immediate,
    Symbol,
    /// Symbol index followed by a one-byte array index.
    Element,
}

impl Opcode {
    pub fn operand_kind(self) -> OperandKind {
        match self {
            Opcode::Bl | Opcode::B | Opcode::Bz => OperandKind::Address,
            Opcode::Pushi => OperandKind::Immediate,
            Opcode::Be | Opcode::Pushv | Opcode::Pushvi | Opcode::Gmovi => OperandKind::Symbol,
            Opcode::Pushvv => OperandKind::Element,
            _ => OperandKind::None,
        }
    }

    /// Encoded size in bytes, opcode included.
    pub fn size(self) -> u32 {
        match self.operand_kind() {
            OperandKind::None => 1,
            OperandKind::Address | OperandKind::Immediate | OperandKind::Symbol => 5,
            OperandKind::Element => 6,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        self.into()
    }
}

impl TryFrom<u8> for Opcode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Opcode::from_repr(value).ok_or(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn opcode_bytes_round_trip() {
        for op in Opcode::iter() {
            assert_eq!(Opcode::try_from(op as u8), Ok(op));
        }
        assert_eq!(Opcode::try_from(10), Err(10));
        assert_eq!(Opcode::try_from(0xFF), Err(0xFF));
    }

    #[test]
    fn sizes_and_mnemonics() {
        assert_eq!(Opcode::Add.size(), 1);
        assert_eq!(Opcode::Pushi.size(), 5);
        assert_eq!(Opcode::Pushvv.size(), 6);
        assert_eq!(Opcode::Addmovi.mnemonic(), "addmovi");
        assert_eq!(Opcode::B.to_string(), "b");
    }
}
