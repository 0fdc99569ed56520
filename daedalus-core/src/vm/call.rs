use std::rc::Rc;

use crate::error::{Result, VmError};
use crate::format::{Symbol, SymbolKey};
use crate::trace;
use crate::vm::marshal::{CallArgs, CallReturn};
use crate::vm::value::{Value, ValueKind};
use crate::vm::DaedalusVm;

impl DaedalusVm {
    /// Calls a script function with `args` pushed in order.
    ///
    /// `expected` must match the declared return kind; `None` discards any returned value and
    /// yields `Value::Void`. Argument and resolution errors leave the VM usable. An error raised
    /// while the function runs poisons it.
    pub fn call<'k>(
        &mut self,
        key: impl Into<SymbolKey<'k>>,
        args: &[Value],
        expected: Option<ValueKind>,
    ) -> Result<Value> {
        self.ensure_usable()?;
        let script = Rc::clone(&self.script);
        let sym = script.find(key)?;
        if !sym.is_callable() {
            return Err(VmError::NotAFunction { name: sym.name().to_string() });
        }

        let (params, returns) = self.declared_signature(sym)?;
        if args.len() != params.len() {
            return Err(VmError::signature(
                sym.name(),
                format!("expected {} arguments, got {}", params.len(), args.len()),
            ));
        }
        for (i, (arg, kind)) in args.iter().zip(&params).enumerate() {
            if arg.kind() != *kind {
                return Err(VmError::signature(sym.name(), format!("argument {} is {}, expected {}", i, arg.kind(), kind)));
            }
        }
        if let Some(kind) = expected {
            if kind != returns {
                return Err(VmError::signature(sym.name(), format!("returns {}, caller expects {}", returns, kind)));
            }
        }

        trace::vm(format_args!("call {}", sym.name()));
        let depth = self.stack.len();
        for arg in args {
            self.push(arg.clone());
        }

        let result = self.invoke(sym).and_then(|_| self.take_return(sym, returns, depth));
        if let Err(e) = &result {
            self.poison_with(e);
        }

        let value = result?;
        Ok(match expected {
            Some(_) => value,
            None => Value::Void,
        })
    }

    /// Typed form of [`DaedalusVm::call`]. The return type decides what is popped.
    ///
    /// ```ignore
    /// let attitude: i32 = vm.call_function("B_GETATTITUDE", (hero, npc))?;
    /// vm.call_function::<()>("STARTUP_WORLD", ())?;
    /// ```
    pub fn call_function<'k, R: CallReturn>(&mut self, key: impl Into<SymbolKey<'k>>, args: impl CallArgs) -> Result<R> {
        let value = self.call(key, &args.into_values(), R::KIND)?;
        R::from_result(value)
    }

    fn invoke(&mut self, sym: &Symbol) -> Result<()> {
        if self.externals.has_override(sym.index()) {
            self.call_override(sym.index())
        } else if sym.is_external() {
            self.call_external(sym.index())
        } else {
            self.run_function(sym.index(), sym.address())
        }
    }

    /// Pops the function's return value. A body that fell off its end without returning
    /// yields the zero value of the declared kind.
    fn take_return(&mut self, sym: &Symbol, returns: ValueKind, depth: usize) -> Result<Value> {
        if returns == ValueKind::Void {
            return Ok(Value::Void);
        }
        if self.stack.len() <= depth {
            log::warn!("{} returned without a value", sym.name());
            return Ok(Value::default_for(returns));
        }
        self.pop_value(returns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{DataType, Opcode, ScriptBuilder};

    fn vm() -> DaedalusVm {
        let mut b = ScriptBuilder::new();
        let mut f = b.function("SUB", &[DataType::Int, DataType::Int], Some(DataType::Int));
        let (a, c) = (f.param(0), f.param(1));
        f.pushv(c).pushv(a).op(Opcode::Sub).finish();
        b.function("NOTHING", &[], Some(DataType::String)).finish();
        b.int_var("COUNTER", 1);
        DaedalusVm::new(b.load().unwrap())
    }

    #[test]
    fn arguments_are_pushed_in_order() {
        let mut vm = vm();
        let v = vm.call("SUB", &[Value::Int(10), Value::Int(3)], Some(ValueKind::Int)).unwrap();
        assert_eq!(v, Value::Int(7));
        let v: i32 = vm.call_function("sub", (1, 5)).unwrap();
        assert_eq!(v, -4);
        assert_eq!(vm.stack_len(), 0);
    }

    #[test]
    fn ignored_return_is_discarded() {
        let mut vm = vm();
        vm.call_function::<()>("SUB", (1, 2)).unwrap();
        assert_eq!(vm.stack_len(), 0);
    }

    #[test]
    fn caller_errors_do_not_poison() {
        let mut vm = vm();
        assert!(matches!(vm.call("MISSING", &[], None), Err(VmError::SymbolNotFound(_))));
        assert!(matches!(vm.call("COUNTER", &[], None), Err(VmError::NotAFunction { .. })));
        assert!(matches!(
            vm.call("SUB", &[Value::Int(1)], Some(ValueKind::Int)),
            Err(VmError::SignatureMismatch { .. })
        ));
        assert!(matches!(
            vm.call("SUB", &[Value::Int(1), Value::Float(1.0)], Some(ValueKind::Int)),
            Err(VmError::SignatureMismatch { .. })
        ));
        assert!(matches!(
            vm.call("SUB", &[Value::Int(1), Value::Int(1)], Some(ValueKind::Float)),
            Err(VmError::SignatureMismatch { .. })
        ));
        assert!(!vm.is_poisoned());
        assert_eq!(vm.stack_len(), 0);
    }

    #[test]
    fn missing_return_value_defaults() {
        let mut vm = vm();
        let s: String = vm.call_function("NOTHING", ()).unwrap();
        assert_eq!(s, "");
    }
}
