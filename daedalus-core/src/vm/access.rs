use crate::config::ExecutionFlags;
use crate::error::{Result, VmError};
use crate::format::SymbolKey;
use crate::vm::instance::InstanceHandle;
use crate::vm::storage::{CellError, Storage};
use crate::vm::value::ValueKind;
use crate::vm::DaedalusVm;

impl DaedalusVm {
    fn symbol_name(&self, symbol: u32) -> String {
        self.script.symbol_by_index(symbol).map(|s| s.name().to_string()).unwrap_or_else(|| format!("#{}", symbol))
    }

    fn cell_error(&self, symbol: u32, requested: ValueKind, index: usize, e: CellError) -> VmError {
        match e {
            CellError::WrongKind(actual) => VmError::SymbolTypeMismatch { name: self.symbol_name(symbol), requested, actual },
            CellError::OutOfRange(count) => VmError::IndexOutOfRange { name: self.symbol_name(symbol), index, count },
        }
    }

    /// Storage behind a symbol. Members go through `context`; `None` means the access is
    /// dropped under `ALLOW_NULL_INSTANCE_ACCESS`.
    fn locate(&self, symbol: u32, context: Option<InstanceHandle>) -> Result<Option<&Storage>> {
        let sym = self.script.symbol_by_index(symbol).ok_or_else(|| VmError::SymbolNotFound(format!("#{}", symbol)))?;
        if !sym.is_member() {
            return Ok(self.globals.get(symbol as usize));
        }

        let Some(handle) = context else {
            if self.config.flags.contains(ExecutionFlags::ALLOW_NULL_INSTANCE_ACCESS) {
                return Ok(None);
            }
            return Err(VmError::NullInstanceAccess { name: sym.name().to_string() });
        };

        let data = self.instances.get(handle)?;
        let illegal = || VmError::IllegalMemberAccess {
            name: sym.name().to_string(),
            class: self.symbol_name(data.class),
        };
        if sym.parent() != Some(data.class) {
            return Err(illegal());
        }
        let ordinal = (symbol - data.class - 1) as usize;
        data.fields.get(ordinal).map(Some).ok_or_else(illegal)
    }

    fn locate_mut(&mut self, symbol: u32, context: Option<InstanceHandle>) -> Result<Option<&mut Storage>> {
        let sym = self.script.symbol_by_index(symbol).ok_or_else(|| VmError::SymbolNotFound(format!("#{}", symbol)))?;

        if sym.is_const() && !self.config.flags.contains(ExecutionFlags::IGNORE_CONST_SPECIFIER) {
            return Err(VmError::IllegalConstAccess { name: sym.name().to_string() });
        }

        if !sym.is_member() {
            return Ok(self.globals.get_mut(symbol as usize));
        }

        let Some(handle) = context else {
            if self.config.flags.contains(ExecutionFlags::ALLOW_NULL_INSTANCE_ACCESS) {
                return Ok(None);
            }
            return Err(VmError::NullInstanceAccess { name: sym.name().to_string() });
        };

        let class = self.instances.get(handle)?.class;
        if sym.parent() != Some(class) {
            let class_name = self.symbol_name(class);
            return Err(VmError::IllegalMemberAccess { name: sym.name().to_string(), class: class_name });
        }
        let ordinal = (symbol - class - 1) as usize;
        let name = sym.name().to_string();
        self.instances
            .get_mut(handle)?
            .fields
            .get_mut(ordinal)
            .map(Some)
            .ok_or(VmError::IllegalMemberAccess { name, class: String::new() })
    }

    pub(crate) fn read_int(&self, symbol: u32, index: usize, context: Option<InstanceHandle>) -> Result<i32> {
        match self.locate(symbol, context)? {
            Some(storage) => storage.int(index).map_err(|e| self.cell_error(symbol, ValueKind::Int, index, e)),
            None => Ok(0),
        }
    }

    pub(crate) fn read_float(&self, symbol: u32, index: usize, context: Option<InstanceHandle>) -> Result<f32> {
        match self.locate(symbol, context)? {
            Some(storage) => storage.float(index).map_err(|e| self.cell_error(symbol, ValueKind::Float, index, e)),
            None => Ok(0.0),
        }
    }

    pub(crate) fn read_string(&self, symbol: u32, index: usize, context: Option<InstanceHandle>) -> Result<&str> {
        match self.locate(symbol, context)? {
            Some(storage) => storage.string(index).map_err(|e| self.cell_error(symbol, ValueKind::String, index, e)),
            None => Ok(""),
        }
    }

    pub(crate) fn read_instance(
        &self,
        symbol: u32,
        index: usize,
        context: Option<InstanceHandle>,
    ) -> Result<Option<InstanceHandle>> {
        match self.locate(symbol, context)? {
            Some(storage) => storage
                .instance(index)
                .map_err(|e| self.cell_error(symbol, ValueKind::Instance, index, e)),
            None => Ok(None),
        }
    }

    pub(crate) fn write_int(&mut self, symbol: u32, index: usize, context: Option<InstanceHandle>, value: i32) -> Result<()> {
        let result = match self.locate_mut(symbol, context)? {
            Some(storage) => storage.set_int(index, value),
            None => Ok(()),
        };
        result.map_err(|e| self.cell_error(symbol, ValueKind::Int, index, e))
    }

    pub(crate) fn write_float(
        &mut self,
        symbol: u32,
        index: usize,
        context: Option<InstanceHandle>,
        value: f32,
    ) -> Result<()> {
        let result = match self.locate_mut(symbol, context)? {
            Some(storage) => storage.set_float(index, value),
            None => Ok(()),
        };
        result.map_err(|e| self.cell_error(symbol, ValueKind::Float, index, e))
    }

    pub(crate) fn write_string(
        &mut self,
        symbol: u32,
        index: usize,
        context: Option<InstanceHandle>,
        value: String,
    ) -> Result<()> {
        let result = match self.locate_mut(symbol, context)? {
            Some(storage) => storage.set_string(index, value),
            None => Ok(()),
        };
        result.map_err(|e| self.cell_error(symbol, ValueKind::String, index, e))
    }

    pub(crate) fn write_instance(
        &mut self,
        symbol: u32,
        index: usize,
        context: Option<InstanceHandle>,
        value: Option<InstanceHandle>,
    ) -> Result<()> {
        let result = match self.locate_mut(symbol, context)? {
            Some(storage) => storage.set_instance(index, value),
            None => Ok(()),
        };
        result.map_err(|e| self.cell_error(symbol, ValueKind::Instance, index, e))
    }

    fn key_index<'k>(&self, key: impl Into<SymbolKey<'k>>) -> Result<u32> {
        Ok(self.script.find(key)?.index())
    }

    /// Reads an int variable or member. Members need the owning instance as `context`.
    pub fn get_int<'k>(&self, key: impl Into<SymbolKey<'k>>, index: usize, context: Option<InstanceHandle>) -> Result<i32> {
        self.read_int(self.key_index(key)?, index, context)
    }

    pub fn get_float<'k>(
        &self,
        key: impl Into<SymbolKey<'k>>,
        index: usize,
        context: Option<InstanceHandle>,
    ) -> Result<f32> {
        self.read_float(self.key_index(key)?, index, context)
    }

    pub fn get_string<'k>(
        &self,
        key: impl Into<SymbolKey<'k>>,
        index: usize,
        context: Option<InstanceHandle>,
    ) -> Result<&str> {
        self.read_string(self.key_index(key)?, index, context)
    }

    pub fn get_instance<'k>(
        &self,
        key: impl Into<SymbolKey<'k>>,
        context: Option<InstanceHandle>,
    ) -> Result<Option<InstanceHandle>> {
        self.read_instance(self.key_index(key)?, 0, context)
    }

    pub fn set_int<'k>(
        &mut self,
        key: impl Into<SymbolKey<'k>>,
        index: usize,
        context: Option<InstanceHandle>,
        value: i32,
    ) -> Result<()> {
        let symbol = self.key_index(key)?;
        self.write_int(symbol, index, context, value)
    }

    pub fn set_float<'k>(
        &mut self,
        key: impl Into<SymbolKey<'k>>,
        index: usize,
        context: Option<InstanceHandle>,
        value: f32,
    ) -> Result<()> {
        let symbol = self.key_index(key)?;
        self.write_float(symbol, index, context, value)
    }

    pub fn set_string<'k>(
        &mut self,
        key: impl Into<SymbolKey<'k>>,
        index: usize,
        context: Option<InstanceHandle>,
        value: impl Into<String>,
    ) -> Result<()> {
        let symbol = self.key_index(key)?;
        self.write_string(symbol, index, context, value.into())
    }

    pub fn set_instance<'k>(
        &mut self,
        key: impl Into<SymbolKey<'k>>,
        context: Option<InstanceHandle>,
        value: Option<InstanceHandle>,
    ) -> Result<()> {
        let symbol = self.key_index(key)?;
        self.write_instance(symbol, 0, context, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VmConfigBuilder;
    use crate::format::{DataType, ScriptBuilder};
    use crate::vm::InstanceType;

    fn script() -> ScriptBuilder {
        let mut b = ScriptBuilder::new();
        let class = b.class("C_ITEM", &[("VALUE", DataType::Int, 1), ("TEXT", DataType::String, 6)]);
        b.instance("ITFO_APPLE", class).finish();
        b.int_var("COUNTER", 2);
        b.int_const("MAX_LEVEL", &[40]);
        b
    }

    #[test]
    fn globals_read_and_write() {
        let mut vm = DaedalusVm::new(script().load().unwrap());
        vm.set_int("COUNTER", 1, None, 9).unwrap();
        assert_eq!(vm.get_int("counter", 1, None).unwrap(), 9);
        assert_eq!(vm.get_int("COUNTER", 0, None).unwrap(), 0);
        assert!(matches!(
            vm.get_int("COUNTER", 2, None),
            Err(VmError::IndexOutOfRange { index: 2, count: 2, .. })
        ));
        assert!(matches!(vm.get_float("COUNTER", 0, None), Err(VmError::SymbolTypeMismatch { .. })));
    }

    #[test]
    fn constants_are_read_only_unless_relaxed() {
        let mut vm = DaedalusVm::new(script().load().unwrap());
        assert_eq!(vm.get_int("MAX_LEVEL", 0, None).unwrap(), 40);
        assert!(matches!(vm.set_int("MAX_LEVEL", 0, None, 1), Err(VmError::IllegalConstAccess { .. })));

        let config = VmConfigBuilder::new().with_flags(ExecutionFlags::IGNORE_CONST_SPECIFIER).get();
        let mut vm = DaedalusVm::with_config(script().load().unwrap(), config);
        vm.set_int("MAX_LEVEL", 0, None, 1).unwrap();
        assert_eq!(vm.get_int("MAX_LEVEL", 0, None).unwrap(), 1);
    }

    #[test]
    fn members_need_an_instance() {
        let mut vm = DaedalusVm::new(script().load().unwrap());
        let apple = vm.alloc_instance("ITFO_APPLE", InstanceType::Item).unwrap();
        vm.set_string("C_ITEM.TEXT", 3, Some(apple), "Heals").unwrap();
        assert_eq!(vm.get_string("C_ITEM.TEXT", 3, Some(apple)).unwrap(), "Heals");
        assert!(matches!(vm.get_int("C_ITEM.VALUE", 0, None), Err(VmError::NullInstanceAccess { .. })));

        let config = VmConfigBuilder::new().with_flags(ExecutionFlags::ALLOW_NULL_INSTANCE_ACCESS).get();
        let mut vm = DaedalusVm::with_config(script().load().unwrap(), config);
        assert_eq!(vm.get_int("C_ITEM.VALUE", 0, None).unwrap(), 0);
        vm.set_int("C_ITEM.VALUE", 0, None, 5).unwrap();
    }
}
