use crate::error::{Result, VmError};
use crate::format::{Instruction, Opcode, Operand};
use crate::trace;
use crate::vm::frame::CallFrame;
use crate::vm::stack::StackEntry;
use crate::vm::value::Value;
use crate::vm::DaedalusVm;

enum Flow {
    Continue,
    Return,
}

fn operand_error(inst: &Instruction) -> VmError {
    VmError::InvalidOpcode { opcode: inst.opcode() as u8, address: inst.address() }
}

/// Result of a two-operand integer instruction. `a` is the first value popped.
fn binary(op: Opcode, a: i32, b: i32) -> i32 {
    match op {
        Opcode::Add => a.wrapping_add(b),
        Opcode::Sub => a.wrapping_sub(b),
        Opcode::Mul => a.wrapping_mul(b),
        Opcode::Or => a | b,
        Opcode::Andb => a & b,
        Opcode::Orr => (a != 0 || b != 0) as i32,
        Opcode::And => (a != 0 && b != 0) as i32,
        Opcode::Lsl => a.wrapping_shl(b as u32),
        Opcode::Lsr => a.wrapping_shr(b as u32),
        Opcode::Lt => (a < b) as i32,
        Opcode::Gt => (a > b) as i32,
        Opcode::Lte => (a <= b) as i32,
        Opcode::Gte => (a >= b) as i32,
        Opcode::Eq => (a == b) as i32,
        Opcode::Neq => (a != b) as i32,
        _ => 0,
    }
}

impl DaedalusVm {
    fn enter(&mut self, function: Option<u32>, target: u32, host_entry: bool) -> Result<()> {
        let limit = self.config.max_call_depth;
        if self.frames.len() >= limit {
            return Err(VmError::CallDepthExceeded { limit });
        }
        self.frames.push(CallFrame { function, return_pc: self.pc, context: self.context, host_entry });
        self.pc = target;
        Ok(())
    }

    /// Pops the innermost frame. Returns whether control goes back to the host.
    fn leave(&mut self) -> bool {
        match self.frames.pop() {
            Some(frame) => {
                self.pc = frame.return_pc;
                self.context = frame.context;
                frame.host_entry
            }
            None => true,
        }
    }

    /// Executes script code at `address` on behalf of `function` until it returns.
    ///
    /// Any error escaping the loop is fatal: the VM is poisoned and every frame entered here
    /// is unwound.
    pub(crate) fn run_function(&mut self, function: u32, address: u32) -> Result<()> {
        let base = self.frames.len();
        let result = self.enter(Some(function), address, true).and_then(|_| self.run_loop());

        if let Err(e) = &result {
            self.poison_with(e);
            if self.frames.len() > base {
                let entry = self.frames[base].clone();
                self.frames.truncate(base);
                self.pc = entry.return_pc;
                self.context = entry.context;
            }
        }
        result
    }

    fn run_loop(&mut self) -> Result<()> {
        loop {
            let inst = self.script.decode(self.pc)?;
            trace::vm(format_args!("{:08x}: {}", inst.address(), self.script.describe(&inst)));
            self.pc = inst.next_address();

            if let Flow::Return = self.exec(&inst)? {
                if self.leave() {
                    return Ok(());
                }
            }
        }
    }

    fn exec(&mut self, inst: &Instruction) -> Result<Flow> {
        let op = inst.opcode();
        match (op, inst.operand()) {
            (
                Opcode::Add
                | Opcode::Sub
                | Opcode::Mul
                | Opcode::Or
                | Opcode::Andb
                | Opcode::Orr
                | Opcode::And
                | Opcode::Lsl
                | Opcode::Lsr
                | Opcode::Lt
                | Opcode::Gt
                | Opcode::Lte
                | Opcode::Gte
                | Opcode::Eq
                | Opcode::Neq,
                _,
            ) => {
                let a = self.pop_int()?;
                let b = self.pop_int()?;
                self.push_int(binary(op, a, b));
            }
            (Opcode::Div | Opcode::Mod, _) => {
                let a = self.pop_int()?;
                let b = self.pop_int()?;
                if b == 0 {
                    return Err(VmError::DivisionByZero { address: inst.address() });
                }
                self.push_int(if op == Opcode::Div { a.wrapping_div(b) } else { a.wrapping_rem(b) });
            }

            (Opcode::Plus, _) => {
                let a = self.pop_int()?;
                self.push_int(a);
            }
            (Opcode::Negate, _) => {
                let a = self.pop_int()?;
                self.push_int(a.wrapping_neg());
            }
            (Opcode::Not, _) => {
                let a = self.pop_int()?;
                self.push_int((a == 0) as i32);
            }
            (Opcode::Cmpl, _) => {
                let a = self.pop_int()?;
                self.push_int(!a);
            }

            (Opcode::Movi | Opcode::Movvf, _) => {
                let (symbol, index, context) = self.pop_reference()?;
                let value = self.pop_int()?;
                self.write_int(symbol, index, context, value)?;
            }
            (Opcode::Addmovi | Opcode::Submovi | Opcode::Mulmovi | Opcode::Divmovi, _) => {
                let (symbol, index, context) = self.pop_reference()?;
                let value = self.pop_int()?;
                let current = self.read_int(symbol, index, context)?;
                let result = match op {
                    Opcode::Addmovi => current.wrapping_add(value),
                    Opcode::Submovi => current.wrapping_sub(value),
                    Opcode::Mulmovi => current.wrapping_mul(value),
                    _ if value == 0 => return Err(VmError::DivisionByZero { address: inst.address() }),
                    _ => current.wrapping_div(value),
                };
                self.write_int(symbol, index, context, result)?;
            }
            (Opcode::Movf, _) => {
                let (symbol, index, context) = self.pop_reference()?;
                let value = self.pop_float()?;
                self.write_float(symbol, index, context, value)?;
            }
            (Opcode::Movs | Opcode::Movss, _) => {
                let (symbol, index, context) = self.pop_reference()?;
                let value = self.pop_string()?;
                self.write_string(symbol, index, context, value)?;
            }
            (Opcode::Movvi, _) => {
                let (symbol, index, context) = self.pop_reference()?;
                let value = self.pop_instance()?;
                self.write_instance(symbol, index, context, value)?;
            }

            (Opcode::Pushi, Operand::Immediate(value)) => self.stack.push(StackEntry::Immediate(value)),
            (Opcode::Pushv, Operand::Symbol(symbol)) => {
                self.stack.push(StackEntry::Reference { symbol, index: 0, context: self.context })
            }
            (Opcode::Pushvv, Operand::Element { symbol, index }) => {
                self.stack.push(StackEntry::Reference { symbol, index: index as usize, context: self.context })
            }
            (Opcode::Pushvi, Operand::Symbol(symbol)) => {
                let instance = self.bound_instance(symbol);
                self.stack.push(StackEntry::Value(Value::Instance(instance)));
            }
            (Opcode::Gmovi, Operand::Symbol(symbol)) => {
                self.context = self.bound_instance(symbol);
            }

            (Opcode::B, Operand::Address(target)) => self.pc = target,
            (Opcode::Bz, Operand::Address(target)) => {
                if self.pop_int()? == 0 {
                    self.pc = target;
                }
            }
            (Opcode::Bl, Operand::Address(target)) => {
                let function = self.script.symbol_by_address(target).map(|s| s.index());
                match function {
                    Some(f) if self.externals.has_override(f) => self.call_override(f)?,
                    _ => self.enter(function, target, false)?,
                }
            }
            (Opcode::Be, Operand::Symbol(symbol)) => self.call_external(symbol)?,
            (Opcode::Rsr, _) => return Ok(Flow::Return),
            (Opcode::Nop, _) => {}

            _ => return Err(operand_error(inst)),
        }
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_operators_take_first_pop_as_left() {
        assert_eq!(binary(Opcode::Sub, 10, 3), 7);
        assert_eq!(binary(Opcode::Lt, 1, 2), 1);
        assert_eq!(binary(Opcode::Lsl, 1, 4), 16);
        assert_eq!(binary(Opcode::Orr, 0, 5), 1);
        assert_eq!(binary(Opcode::Or, 4, 1), 5);
        assert_eq!(binary(Opcode::And, 3, 0), 0);
        assert_eq!(binary(Opcode::Add, i32::MAX, 1), i32::MIN);
    }
}
