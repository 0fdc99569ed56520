use crate::format::{DataType, Symbol, SymbolData};
use crate::vm::instance::InstanceHandle;

/// Backing cells of one data symbol, either a global variable or an instance member.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Storage {
    Empty,
    Int(Vec<i32>),
    Float(Vec<f32>),
    String(Vec<String>),
    Instance(Vec<Option<InstanceHandle>>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CellError {
    WrongKind(&'static str),
    OutOfRange(usize),
}

fn cell<T>(cells: &[T], i: usize) -> Result<&T, CellError> {
    cells.get(i).ok_or(CellError::OutOfRange(cells.len()))
}

fn cell_mut<T>(cells: &mut [T], i: usize) -> Result<&mut T, CellError> {
    let len = cells.len();
    cells.get_mut(i).ok_or(CellError::OutOfRange(len))
}

impl Storage {
    /// Initial storage: the compiled value for globals, zeroes for members.
    pub fn for_symbol(sym: &Symbol) -> Self {
        let n = sym.count().max(1) as usize;
        match (sym.data_type(), sym.data()) {
            (_, SymbolData::Int(v)) if !v.is_empty() => Storage::Int(v.clone()),
            (_, SymbolData::Float(v)) if !v.is_empty() => Storage::Float(v.clone()),
            (_, SymbolData::String(v)) if !v.is_empty() => Storage::String(v.clone()),
            (DataType::Int | DataType::Function, _) => Storage::Int(vec![0; n]),
            (DataType::Float, _) => Storage::Float(vec![0.0; n]),
            (DataType::String, _) => Storage::String(vec![String::new(); n]),
            (DataType::Instance, _) => Storage::Instance(vec![None; n]),
            _ => Storage::Empty,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Storage::Empty => "nothing",
            Storage::Int(_) => "int",
            Storage::Float(_) => "float",
            Storage::String(_) => "string",
            Storage::Instance(_) => "instance",
        }
    }

    pub fn int(&self, i: usize) -> Result<i32, CellError> {
        match self {
            Storage::Int(v) => cell(v, i).copied(),
            other => Err(CellError::WrongKind(other.kind_name())),
        }
    }

    pub fn float(&self, i: usize) -> Result<f32, CellError> {
        match self {
            Storage::Float(v) => cell(v, i).copied(),
            other => Err(CellError::WrongKind(other.kind_name())),
        }
    }

    pub fn string(&self, i: usize) -> Result<&str, CellError> {
        match self {
            Storage::String(v) => cell(v, i).map(String::as_str),
            other => Err(CellError::WrongKind(other.kind_name())),
        }
    }

    pub fn instance(&self, i: usize) -> Result<Option<InstanceHandle>, CellError> {
        match self {
            Storage::Instance(v) => cell(v, i).copied(),
            other => Err(CellError::WrongKind(other.kind_name())),
        }
    }

    pub fn set_int(&mut self, i: usize, value: i32) -> Result<(), CellError> {
        match self {
            Storage::Int(v) => Ok(*cell_mut(v, i)? = value),
            other => Err(CellError::WrongKind(other.kind_name())),
        }
    }

    pub fn set_float(&mut self, i: usize, value: f32) -> Result<(), CellError> {
        match self {
            Storage::Float(v) => Ok(*cell_mut(v, i)? = value),
            other => Err(CellError::WrongKind(other.kind_name())),
        }
    }

    pub fn set_string(&mut self, i: usize, value: String) -> Result<(), CellError> {
        match self {
            Storage::String(v) => Ok(*cell_mut(v, i)? = value),
            other => Err(CellError::WrongKind(other.kind_name())),
        }
    }

    pub fn set_instance(&mut self, i: usize, value: Option<InstanceHandle>) -> Result<(), CellError> {
        match self {
            Storage::Instance(v) => Ok(*cell_mut(v, i)? = value),
            other => Err(CellError::WrongKind(other.kind_name())),
        }
    }

    /// Drops every reference to `handle`.
    pub fn forget(&mut self, handle: InstanceHandle) {
        if let Storage::Instance(v) = self {
            for slot in v.iter_mut().filter(|s| **s == Some(handle)) {
                *slot = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_cells() {
        let mut s = Storage::Int(vec![1, 2]);
        assert_eq!(s.int(1), Ok(2));
        assert_eq!(s.int(2), Err(CellError::OutOfRange(2)));
        assert_eq!(s.float(0), Err(CellError::WrongKind("int")));
        s.set_int(0, 7).unwrap();
        assert_eq!(s, Storage::Int(vec![7, 2]));

        let mut t = Storage::String(vec![String::new()]);
        t.set_string(0, "hi".into()).unwrap();
        assert_eq!(t.string(0), Ok("hi"));
    }
}
