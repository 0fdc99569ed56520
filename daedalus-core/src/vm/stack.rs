use crate::error::{Result, VmError};
use crate::vm::instance::InstanceHandle;
use crate::vm::value::{Value, ValueKind};
use crate::vm::DaedalusVm;

/// One evaluation stack slot.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum StackEntry {
    /// Typed value pushed by the host, an external, or an instruction result.
    Value(Value),
    /// `pushi` operand. Float literals are compiled to their bit pattern, so this pops as either.
    Immediate(i32),
    /// Variable reference from `pushv`/`pushvv`, resolved when popped.
    Reference { symbol: u32, index: usize, context: Option<InstanceHandle> },
}

impl StackEntry {
    fn kind_name(&self) -> &'static str {
        match self {
            StackEntry::Value(v) => v.kind_name(),
            StackEntry::Immediate(_) => "immediate",
            StackEntry::Reference { .. } => "reference",
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct EvalStack {
    entries: Vec<StackEntry>,
}

impl EvalStack {
    pub fn push(&mut self, entry: StackEntry) {
        self.entries.push(entry);
    }

    pub fn pop(&mut self) -> Result<StackEntry> {
        self.entries.pop().ok_or(VmError::StackUnderflow)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl DaedalusVm {
    /// A kind mismatch means the stack no longer matches the code that reads it, so the VM is
    /// poisoned even when the caller drops the error.
    fn type_mismatch(&mut self, expected: &'static str, found: &StackEntry) -> VmError {
        let err = VmError::StackTypeMismatch { expected, found: found.kind_name() };
        self.poison_with(&err);
        err
    }

    /// Pushes a value. Host values are strictly typed: an `Int` never pops as a float.
    pub fn push(&mut self, value: impl Into<Value>) {
        self.stack.push(StackEntry::Value(value.into()));
    }

    pub fn stack_len(&self) -> usize {
        self.stack.len()
    }

    pub(crate) fn push_int(&mut self, value: i32) {
        self.stack.push(StackEntry::Value(Value::Int(value)));
    }

    pub fn pop_int(&mut self) -> Result<i32> {
        match self.stack.pop()? {
            StackEntry::Value(Value::Int(v)) | StackEntry::Immediate(v) => Ok(v),
            StackEntry::Reference { symbol, index, context } => self.read_int(symbol, index, context),
            other => Err(self.type_mismatch(ValueKind::Int.into(), &other)),
        }
    }

    pub fn pop_float(&mut self) -> Result<f32> {
        match self.stack.pop()? {
            StackEntry::Value(Value::Float(v)) => Ok(v),
            StackEntry::Immediate(bits) => Ok(f32::from_bits(bits as u32)),
            StackEntry::Reference { symbol, index, context } => self.read_float(symbol, index, context),
            other => Err(self.type_mismatch(ValueKind::Float.into(), &other)),
        }
    }

    pub fn pop_string(&mut self) -> Result<String> {
        match self.stack.pop()? {
            StackEntry::Value(Value::String(v)) => Ok(v),
            StackEntry::Reference { symbol, index, context } => {
                self.read_string(symbol, index, context).map(str::to_string)
            }
            other => Err(self.type_mismatch(ValueKind::String.into(), &other)),
        }
    }

    pub fn pop_instance(&mut self) -> Result<Option<InstanceHandle>> {
        match self.stack.pop()? {
            StackEntry::Value(Value::Instance(v)) => Ok(v),
            StackEntry::Reference { symbol, index, context } => self.read_instance(symbol, index, context),
            other => Err(self.type_mismatch(ValueKind::Instance.into(), &other)),
        }
    }

    /// Pops one value of `kind`. `Void` pops nothing.
    pub fn pop_value(&mut self, kind: ValueKind) -> Result<Value> {
        Ok(match kind {
            ValueKind::Int => Value::Int(self.pop_int()?),
            ValueKind::Float => Value::Float(self.pop_float()?),
            ValueKind::String => Value::String(self.pop_string()?),
            ValueKind::Instance => Value::Instance(self.pop_instance()?),
            ValueKind::Void => Value::Void,
        })
    }

    pub(crate) fn pop_reference(&mut self) -> Result<(u32, usize, Option<InstanceHandle>)> {
        match self.stack.pop()? {
            StackEntry::Reference { symbol, index, context } => Ok((symbol, index, context)),
            other => Err(self.type_mismatch("reference", &other)),
        }
    }

    /// Pushes a value produced for the script, skipping `Void`.
    pub(crate) fn push_result(&mut self, value: Value) {
        if value != Value::Void {
            self.stack.push(StackEntry::Value(value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::ScriptBuilder;

    fn vm() -> DaedalusVm {
        DaedalusVm::new(ScriptBuilder::new().load().unwrap())
    }

    #[test]
    fn pops_are_strictly_typed() {
        let mut vm = vm();
        vm.push(3);
        assert!(matches!(vm.pop_int(), Ok(3)));
        assert!(matches!(vm.pop_int(), Err(VmError::StackUnderflow)));
        assert!(!vm.is_poisoned());

        vm.push(1);
        vm.push("name");
        assert!(matches!(
            vm.pop_int(),
            Err(VmError::StackTypeMismatch { expected: "int", found: "string" })
        ));
        assert!(vm.is_poisoned());
        assert_eq!(vm.stack_len(), 0);
    }

    #[test]
    fn ignored_mismatch_still_poisons() {
        let mut vm = vm();
        vm.push(2.5f32);
        let _ = vm.pop_string();
        assert!(vm.is_poisoned());
        assert!(matches!(vm.call("ANYTHING", &[], None), Err(VmError::Poisoned)));
    }

    #[test]
    fn immediates_pop_as_int_or_float_bits() {
        let mut vm = vm();
        vm.stack.push(StackEntry::Immediate(1.5f32.to_bits() as i32));
        assert_eq!(vm.pop_float().unwrap(), 1.5);
        vm.stack.push(StackEntry::Immediate(-4));
        assert_eq!(vm.pop_int().unwrap(), -4);
    }

    #[test]
    fn lifo_order() {
        let mut vm = vm();
        vm.push(1);
        vm.push(2.0f32);
        vm.push(None::<InstanceHandle>);
        assert_eq!(vm.stack_len(), 3);
        assert_eq!(vm.pop_value(ValueKind::Instance).unwrap(), Value::Instance(None));
        assert_eq!(vm.pop_value(ValueKind::Float).unwrap(), Value::Float(2.0));
        assert_eq!(vm.pop_value(ValueKind::Int).unwrap(), Value::Int(1));
        assert_eq!(vm.pop_value(ValueKind::Void).unwrap(), Value::Void);
        assert_eq!(vm.stack_len(), 0);
    }
}
