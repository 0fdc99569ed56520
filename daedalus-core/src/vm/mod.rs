mod access;
mod call;
mod exec;
mod external;
mod frame;
pub(crate) mod instance;
mod marshal;
pub(crate) mod stack;
pub(crate) mod storage;
pub(crate) mod value;

use std::rc::Rc;

use crate::config::VmConfig;
use crate::error::{Result, VmError};
use crate::format::{Script, Symbol};

pub use frame::StackFrame;
pub use instance::{GlobalSlot, InstanceHandle, InstanceState, InstanceType};
pub use marshal::{CallArgs, CallReturn, ExternalArgs, ExternalReturn, FromValue, IntoValue};
pub use value::{Value, ValueKind};

use external::ExternalRegistry;
use frame::CallFrame;
use instance::InstanceRegistry;
use stack::EvalStack;
use storage::Storage;

/// Interpreter for one loaded script.
///
/// The VM owns the evaluation stack, the global variable storage and every instance created
/// from script symbols. It is single threaded; host callbacks receive `&mut DaedalusVm` and may
/// call back into script code.
pub struct DaedalusVm {
    pub(crate) script: Rc<Script>,
    pub(crate) config: VmConfig,
    pub(crate) stack: EvalStack,
    pub(crate) globals: Vec<Storage>,
    pub(crate) instances: InstanceRegistry,
    pub(crate) externals: ExternalRegistry,
    pub(crate) frames: Vec<CallFrame>,
    pub(crate) pc: u32,
    /// Instance that unqualified member references resolve against.
    pub(crate) context: Option<InstanceHandle>,
    /// Symbol indices of SELF, OTHER, VICTIM, HERO and ITEM.
    pub(crate) slots: [u32; 5],
    /// Stack trace captured by the fatal error that poisoned the VM.
    pub(crate) poison: Option<Vec<StackFrame>>,
}

fn initial_storage(sym: &Symbol) -> Storage {
    if sym.is_member() {
        Storage::Empty
    } else {
        Storage::for_symbol(sym)
    }
}

impl DaedalusVm {
    pub fn new(script: Script) -> Self {
        Self::with_config(script, VmConfig::default())
    }

    pub fn with_config(script: Script, config: VmConfig) -> Self {
        let globals = script.symbols().iter().map(initial_storage).collect();
        let slots = [
            GlobalSlot::Self_,
            GlobalSlot::Other,
            GlobalSlot::Victim,
            GlobalSlot::Hero,
            GlobalSlot::Item,
        ]
        .map(|slot| script.symbol_by_name(slot.symbol_name()).map(|s| s.index()).unwrap_or(u32::MAX));

        log::debug!(
            "vm ready: {} symbols, {} bytes of code, flags={:?}",
            script.symbol_count(),
            script.code().len(),
            config.flags
        );

        Self {
            script: Rc::new(script),
            instances: InstanceRegistry::new(config.max_instances),
            config,
            stack: EvalStack::default(),
            globals,
            externals: ExternalRegistry::default(),
            frames: Vec::new(),
            pc: 0,
            context: None,
            slots,
            poison: None,
        }
    }

    /// Parses `bytes` as a compiled script and wraps it in a VM with the default configuration.
    pub fn load(bytes: &[u8]) -> Result<Self> {
        Ok(Self::new(Script::load(bytes)?))
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    pub fn is_poisoned(&self) -> bool {
        self.poison.is_some()
    }

    /// Instance the executing code is currently bound to.
    pub fn current_instance(&self) -> Option<InstanceHandle> {
        self.context
    }

    pub(crate) fn slot_symbol(&self, slot: GlobalSlot) -> u32 {
        self.slots[slot as usize]
    }

    pub fn global(&self, slot: GlobalSlot) -> Option<InstanceHandle> {
        self.bound_instance(self.slot_symbol(slot))
    }

    pub fn set_global(&mut self, slot: GlobalSlot, handle: Option<InstanceHandle>) {
        self.bind_instance(self.slot_symbol(slot), handle);
    }

    pub fn global_self(&self) -> Option<InstanceHandle> {
        self.global(GlobalSlot::Self_)
    }

    pub fn set_global_self(&mut self, handle: Option<InstanceHandle>) {
        self.set_global(GlobalSlot::Self_, handle)
    }

    pub fn global_other(&self) -> Option<InstanceHandle> {
        self.global(GlobalSlot::Other)
    }

    pub fn set_global_other(&mut self, handle: Option<InstanceHandle>) {
        self.set_global(GlobalSlot::Other, handle)
    }

    pub fn global_victim(&self) -> Option<InstanceHandle> {
        self.global(GlobalSlot::Victim)
    }

    pub fn set_global_victim(&mut self, handle: Option<InstanceHandle>) {
        self.set_global(GlobalSlot::Victim, handle)
    }

    pub fn global_hero(&self) -> Option<InstanceHandle> {
        self.global(GlobalSlot::Hero)
    }

    pub fn set_global_hero(&mut self, handle: Option<InstanceHandle>) {
        self.set_global(GlobalSlot::Hero, handle)
    }

    pub fn global_item(&self) -> Option<InstanceHandle> {
        self.global(GlobalSlot::Item)
    }

    pub fn set_global_item(&mut self, handle: Option<InstanceHandle>) {
        self.set_global(GlobalSlot::Item, handle)
    }

    pub(crate) fn ensure_usable(&self) -> Result<()> {
        match self.poison {
            Some(_) => Err(VmError::Poisoned),
            None => Ok(()),
        }
    }

    /// Marks the VM unusable after an error escaped script code. Only the first trace is kept.
    pub(crate) fn poison_with(&mut self, err: &VmError) {
        if self.poison.is_some() {
            return;
        }
        log::error!("fatal script error: {}", err);
        self.poison = Some(self.live_trace());
        self.print_stack_trace();
        self.stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{DataType, ScriptBuilder};

    #[test]
    fn global_slots_exist_even_when_not_declared() {
        let mut b = ScriptBuilder::new();
        let class = b.class("C_NPC", &[("ID", DataType::Int, 1)]);
        b.instance("PC_HERO", class).finish();
        let mut vm = DaedalusVm::new(b.load().unwrap());

        let hero = vm.alloc_instance("PC_HERO", InstanceType::Npc).unwrap();
        assert_eq!(vm.global_hero(), None);
        vm.set_global_hero(Some(hero));
        assert_eq!(vm.global_hero(), Some(hero));
        assert_eq!(vm.global(GlobalSlot::Hero), Some(hero));
        assert_eq!(vm.global_other(), None);
    }

    #[test]
    fn fresh_vm_is_usable() {
        let vm = DaedalusVm::load(&ScriptBuilder::new().build()).unwrap();
        assert!(!vm.is_poisoned());
        assert!(vm.stack_trace().is_empty());
        assert_eq!(vm.current_instance(), None);
    }
}
