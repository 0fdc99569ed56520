use std::fmt;

use itertools::Itertools;

use crate::vm::instance::InstanceHandle;
use crate::vm::DaedalusVm;

#[derive(Clone, Debug)]
pub(crate) struct CallFrame {
    /// Function symbol, if the call target resolved to one.
    pub function: Option<u32>,
    /// Program counter to resume at in the caller.
    pub return_pc: u32,
    /// Instance context to restore on return.
    pub context: Option<InstanceHandle>,
    /// Entered from the host (`call()`, instance init, or an external calling back in) rather than `bl`.
    pub host_entry: bool,
}

/// One line of a stack trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    pub function: String,
    pub address: u32,
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ 0x{:08x}", self.function, self.address)
    }
}

impl DaedalusVm {
    pub(crate) fn live_trace(&self) -> Vec<StackFrame> {
        let mut trace = Vec::with_capacity(self.frames.len());
        let mut address = self.pc;
        for frame in self.frames.iter().rev() {
            let function = frame
                .function
                .and_then(|i| self.script.symbol_by_index(i))
                .map(|s| s.name().to_string())
                .unwrap_or_else(|| "<anonymous>".to_string());
            trace.push(StackFrame { function, address });
            address = frame.return_pc;
        }
        trace
    }

    /// Current call chain, innermost first.
    ///
    /// Once the VM is poisoned this is the chain captured at the failure.
    pub fn stack_trace(&self) -> Vec<StackFrame> {
        match &self.poison {
            Some(trace) => trace.clone(),
            None => self.live_trace(),
        }
    }

    /// Logs [`DaedalusVm::stack_trace`]. Does not touch VM state.
    pub fn print_stack_trace(&self) {
        let trace = self.stack_trace();
        if trace.is_empty() {
            log::error!("stack trace: <no script frames>");
            return;
        }
        log::error!(
            "stack trace:\n{}",
            trace.iter().enumerate().map(|(i, f)| format!("  #{:02} {}", i, f)).join("\n")
        );
    }
}
