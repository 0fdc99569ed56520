use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use itertools::Itertools;

use crate::error::{Result, VmError};
use crate::format::{Symbol, SymbolKey};
use crate::trace;
use crate::vm::marshal::{ExternalArgs, ExternalReturn};
use crate::vm::value::{Value, ValueKind};
use crate::vm::DaedalusVm;

pub(crate) type ExternalFn = Rc<dyn Fn(&mut DaedalusVm, Vec<Value>) -> anyhow::Result<Value>>;
pub(crate) type DefaultExternalFn = Rc<dyn Fn(&mut DaedalusVm, &Symbol) -> anyhow::Result<()>>;

#[derive(Clone)]
pub(crate) struct Binding {
    callback: ExternalFn,
    params: Vec<ValueKind>,
    returns: ValueKind,
}

/// Native callbacks bound to script symbols.
#[derive(Default)]
pub(crate) struct ExternalRegistry {
    externals: HashMap<u32, Binding>,
    overrides: HashMap<u32, Binding>,
    fallback: Option<DefaultExternalFn>,
    /// Unregistered externals already reported, so each is logged once.
    warned: HashSet<u32>,
}

impl ExternalRegistry {
    pub fn has_override(&self, symbol: u32) -> bool {
        self.overrides.contains_key(&symbol)
    }
}

/// Errors a callback raised through the VM pass through untouched.
fn callback_error(name: &str, e: anyhow::Error) -> VmError {
    match e.downcast::<VmError>() {
        Ok(e) => e,
        Err(source) => VmError::ExternalFailed { name: name.to_string(), source },
    }
}

fn typed<A, R, F>(f: F) -> ExternalFn
where
    A: ExternalArgs,
    R: ExternalReturn,
    F: Fn(&mut DaedalusVm, A) -> anyhow::Result<R> + 'static,
{
    Rc::new(move |vm: &mut DaedalusVm, args: Vec<Value>| {
        let args = A::from_values(args)?;
        Ok(f(vm, args)?.into_result())
    })
}

impl DaedalusVm {
    /// Stack kinds of a function's declared parameters and return.
    pub(crate) fn declared_signature(&self, sym: &Symbol) -> Result<(Vec<ValueKind>, ValueKind)> {
        let params = self
            .script
            .parameters_of(sym)
            .iter()
            .map(|p| {
                p.value_kind().ok_or_else(|| {
                    VmError::signature(sym.name(), format!("parameter {} has type {}", p.name(), p.data_type()))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let returns = match sym.return_type() {
            Some(ty) => ValueKind::from_data_type(ty)
                .ok_or_else(|| VmError::signature(sym.name(), format!("return type {}", ty)))?,
            None => ValueKind::Void,
        };
        Ok((params, returns))
    }

    fn check_signature(&self, sym: &Symbol, params: &[ValueKind], returns: ValueKind) -> Result<()> {
        let (declared, declared_return) = self.declared_signature(sym)?;
        if declared.len() != params.len() {
            return Err(VmError::signature(
                sym.name(),
                format!("script declares {} parameters, callback takes {}", declared.len(), params.len()),
            ));
        }
        if let Some((i, (d, p))) = declared.iter().zip(params).enumerate().find(|(_, (d, p))| d != p) {
            return Err(VmError::signature(sym.name(), format!("parameter {} is {}, callback takes {}", i, d, p)));
        }
        if declared_return != returns {
            return Err(VmError::signature(
                sym.name(),
                format!("script returns {}, callback returns {}", declared_return, returns),
            ));
        }
        Ok(())
    }

    fn external_symbol<'k>(&self, key: impl Into<SymbolKey<'k>>) -> Result<u32> {
        let sym = self.script.find(key)?;
        if !sym.is_external() {
            return Err(VmError::NotExternal { name: sym.name().to_string() });
        }
        Ok(sym.index())
    }

    fn bind_external(&mut self, symbol: u32, binding: Binding) -> Result<()> {
        let script = Rc::clone(&self.script);
        let sym = script.find(symbol)?;
        self.check_signature(sym, &binding.params, binding.returns)?;
        if self.externals.externals.insert(symbol, binding).is_some() {
            log::debug!("external {} re-registered", sym.name());
        }
        Ok(())
    }

    /// Binds a typed native implementation to an `external` script function.
    ///
    /// The parameter and return types of `f` must match the script declaration, otherwise this
    /// fails with `SignatureMismatch`. Registering the same symbol again replaces the callback.
    ///
    /// ```ignore
    /// vm.register_external("HLP_STRCMP", |_vm, (a, b): (String, String)| Ok(a.eq_ignore_ascii_case(&b)))?;
    /// ```
    pub fn register_external<'k, A, R, F>(&mut self, key: impl Into<SymbolKey<'k>>, f: F) -> Result<()>
    where
        A: ExternalArgs,
        R: ExternalReturn,
        F: Fn(&mut DaedalusVm, A) -> anyhow::Result<R> + 'static,
    {
        let symbol = self.external_symbol(key)?;
        self.bind_external(symbol, Binding { callback: typed(f), params: A::kinds(), returns: R::KIND })
    }

    /// Binds an untyped callback. The declared kinds are checked now; the kind of the value the
    /// callback returns is checked on every call.
    pub fn register_external_raw<'k, F>(
        &mut self,
        key: impl Into<SymbolKey<'k>>,
        params: &[ValueKind],
        returns: ValueKind,
        f: F,
    ) -> Result<()>
    where
        F: Fn(&mut DaedalusVm, Vec<Value>) -> anyhow::Result<Value> + 'static,
    {
        let symbol = self.external_symbol(key)?;
        self.bind_external(symbol, Binding { callback: Rc::new(f), params: params.to_vec(), returns })
    }

    /// Callback for externals with no registration. The stack is balanced before it runs.
    pub fn register_external_default<F>(&mut self, f: F)
    where
        F: Fn(&mut DaedalusVm, &Symbol) -> anyhow::Result<()> + 'static,
    {
        self.externals.fallback = Some(Rc::new(f));
    }

    /// Replaces a script function with a native one. Applies to `bl` and to host calls.
    pub fn override_function<'k, A, R, F>(&mut self, key: impl Into<SymbolKey<'k>>, f: F) -> Result<()>
    where
        A: ExternalArgs,
        R: ExternalReturn,
        F: Fn(&mut DaedalusVm, A) -> anyhow::Result<R> + 'static,
    {
        let script = Rc::clone(&self.script);
        let sym = script.find(key)?;
        if !sym.is_callable() || sym.is_external() {
            return Err(VmError::NotAFunction { name: sym.name().to_string() });
        }
        self.check_signature(sym, &A::kinds(), R::KIND)?;
        self.externals
            .overrides
            .insert(sym.index(), Binding { callback: typed(f), params: A::kinds(), returns: R::KIND });
        log::debug!("function {} overridden", sym.name());
        Ok(())
    }

    pub fn has_external<'k>(&self, key: impl Into<SymbolKey<'k>>) -> bool {
        self.script
            .resolve(key)
            .map(|s| self.externals.externals.contains_key(&s.index()))
            .unwrap_or(false)
    }

    /// Dispatches an external call from `be` or from the host.
    pub(crate) fn call_external(&mut self, symbol: u32) -> Result<()> {
        let script = Rc::clone(&self.script);
        let sym = script.find(symbol)?;
        if !sym.is_external() {
            return Err(VmError::NotExternal { name: sym.name().to_string() });
        }
        match self.externals.externals.get(&symbol).cloned() {
            Some(binding) => self.invoke_binding(sym, &binding),
            None => self.call_default(sym),
        }
    }

    pub(crate) fn call_override(&mut self, symbol: u32) -> Result<()> {
        let script = Rc::clone(&self.script);
        let sym = script.find(symbol)?;
        match self.externals.overrides.get(&symbol).cloned() {
            Some(binding) => self.invoke_binding(sym, &binding),
            None => Err(VmError::NotAFunction { name: sym.name().to_string() }),
        }
    }

    fn invoke_binding(&mut self, sym: &Symbol, binding: &Binding) -> Result<()> {
        let mut args = Vec::with_capacity(binding.params.len());
        for kind in binding.params.iter().rev() {
            args.push(self.pop_value(*kind)?);
        }
        args.reverse();

        trace::external(format_args!("{}({})", sym.name(), args.iter().join(", ")));
        let value = (binding.callback)(self, args).map_err(|e| callback_error(sym.name(), e))?;
        self.ensure_usable()?;

        if value.kind() != binding.returns {
            return Err(VmError::signature(
                sym.name(),
                format!("callback returned {}, script expects {}", value.kind(), binding.returns),
            ));
        }
        self.push_result(value);
        Ok(())
    }

    /// Keeps the stack balanced for an external nobody registered: the declared arguments are
    /// dropped and a zero value of the declared return kind is pushed.
    fn call_default(&mut self, sym: &Symbol) -> Result<()> {
        for _ in 0..self.script.parameters_of(sym).len() {
            self.stack.pop()?;
        }
        if let Some(kind) = sym.return_type().and_then(ValueKind::from_data_type) {
            self.push_result(Value::default_for(kind));
        }

        match self.externals.fallback.clone() {
            Some(f) => f(self, sym).map_err(|e| callback_error(sym.name(), e))?,
            None => {
                if self.externals.warned.insert(sym.index()) {
                    log::warn!("external {} is not registered", sym.name());
                }
            }
        }
        self.ensure_usable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{DataType, ScriptBuilder};

    fn vm() -> DaedalusVm {
        let mut b = ScriptBuilder::new();
        b.external("HLP_RANDOM", &[DataType::Int], Some(DataType::Int));
        b.external("PRINTSCREEN", &[DataType::String, DataType::Int, DataType::Int], None);
        b.external("NPC_GETDISTTOWP", &[DataType::Instance, DataType::String], Some(DataType::Int));
        b.int_var("COUNTER", 1);
        b.function("MAIN", &[], None).finish();
        DaedalusVm::new(b.load().unwrap())
    }

    #[test]
    fn registration_checks_the_declared_signature() {
        let mut vm = vm();
        vm.register_external("HLP_RANDOM", |_vm, max: i32| Ok(max - 1)).unwrap();
        assert!(vm.has_external("hlp_random"));

        let wrong_return = vm.register_external("HLP_RANDOM", |_vm, _max: i32| Ok(()));
        assert!(matches!(wrong_return, Err(VmError::SignatureMismatch { .. })));

        let wrong_arity = vm.register_external("PRINTSCREEN", |_vm, _text: String| Ok(()));
        assert!(matches!(wrong_arity, Err(VmError::SignatureMismatch { .. })));

        let wrong_kind = vm.register_external("PRINTSCREEN", |_vm, (_a, _b, _c): (String, f32, i32)| Ok(()));
        assert!(matches!(wrong_kind, Err(VmError::SignatureMismatch { .. })));

        let not_external = vm.register_external("COUNTER", |_vm, ()| Ok(()));
        assert!(matches!(not_external, Err(VmError::NotExternal { .. })));
        assert!(matches!(
            vm.register_external("MISSING", |_vm, ()| Ok(())),
            Err(VmError::SymbolNotFound(_))
        ));
    }

    #[test]
    fn default_path_balances_the_stack() {
        let mut vm = vm();
        vm.push(None::<crate::vm::InstanceHandle>);
        vm.push("WP_START");
        let dist = vm.script().find("NPC_GETDISTTOWP").unwrap().index();
        vm.call_external(dist).unwrap();
        assert_eq!(vm.stack_len(), 1);
        assert_eq!(vm.pop_int().unwrap(), 0);
    }

    #[test]
    fn overrides_only_apply_to_script_functions() {
        let mut vm = vm();
        assert!(matches!(
            vm.override_function("HLP_RANDOM", |_vm, _max: i32| Ok(0)),
            Err(VmError::NotAFunction { .. })
        ));
        vm.override_function("MAIN", |_vm, ()| Ok(())).unwrap();
        let main = vm.script().find("MAIN").unwrap().index();
        assert!(vm.externals.has_override(main));
    }
}
