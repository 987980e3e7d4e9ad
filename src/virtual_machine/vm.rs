//! Core virtual machine implementation.
//!
//! The VM executes a configured [`Program`] against an operand stack, a call
//! stack and the program's registers. All arithmetic uses wrapping semantics
//! to prevent overflow panics.

use crate::debug;
use crate::virtual_machine::console::Console;
use crate::virtual_machine::errors::VMError;
use crate::virtual_machine::instruction::Instruction;
use crate::virtual_machine::program::Program;
use crate::virtual_machine::stack::Stack;
use crate::virtual_machine::symbols::{LabelId, RegisterId};

/// Where execution continues after an instruction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Next {
    /// Continue at this 0-based line.
    Line(usize),
    /// Stop; produced by `END`.
    Halt,
}

/// Stack-based virtual machine.
///
/// Execution starts at the `BEGIN` line and stops on `END`, when the program
/// counter leaves the program, or on the first runtime error.
pub struct VM {
    program: Program,
    /// Program counter (0-based line of the next instruction).
    pc: usize,
    stack: Stack,
    /// Lines of pending `CALL`s.
    call_stack: Vec<usize>,
    halted: bool,
    steps: u64,
}

impl VM {
    /// Creates a VM positioned at the program's entry point.
    pub fn new(program: Program) -> Self {
        Self {
            pc: program.entry(),
            program,
            stack: Stack::new(),
            call_stack: Vec::new(),
            halted: false,
            steps: 0,
        }
    }

    /// Executes until the program halts or fails.
    pub fn run<C: Console>(&mut self, console: &mut C) -> Result<(), VMError> {
        while self.step(console)? {}
        debug!(
            "halted at line {} after {} instructions",
            self.pc + 1,
            self.steps
        );
        Ok(())
    }

    /// Executes a single instruction.
    ///
    /// Returns `false` once the VM has halted. A runtime error halts the VM
    /// and is tagged with the 1-based line that raised it.
    pub fn step<C: Console>(&mut self, console: &mut C) -> Result<bool, VMError> {
        if self.halted {
            return Ok(false);
        }
        let Some(instr) = self.program.get(self.pc) else {
            self.halted = true;
            return Ok(false);
        };

        debug!(
            "{:>4} | {:<5} {:<8} stack={:?}",
            self.pc + 1,
            instr.mnemonic(),
            self.program.raw().instructions[self.pc].operand.as_str(),
            self.stack.as_slice()
        );

        self.steps = self.steps.wrapping_add(1);
        match self.exec(instr, console) {
            Ok(Next::Line(line)) => {
                self.pc = line;
                self.halted = line >= self.program.len();
            }
            Ok(Next::Halt) => self.halted = true,
            Err(e) => {
                self.halted = true;
                return Err(e.at_runtime_line(self.pc + 1));
            }
        }
        Ok(!self.halted)
    }

    /// Operand stack, bottom to top.
    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    /// Current value of register `name`, if the program uses it.
    pub fn register(&self, name: &str) -> Option<i64> {
        self.program.symbols().register_value(name)
    }

    /// 0-based line of the next instruction.
    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn call_depth(&self) -> usize {
        self.call_stack.len()
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Number of instructions executed so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    fn exec<C: Console>(&mut self, instr: Instruction, console: &mut C) -> Result<Next, VMError> {
        match instr {
            Instruction::Begin | Instruction::Blank | Instruction::Label(_) => Ok(self.advance()),
            Instruction::End => Ok(Next::Halt),
            // Stack and registers
            Instruction::Push(value) => self.op_push(value),
            Instruction::Pop => self.op_pop(),
            Instruction::PushR(reg) => self.op_push_r(reg),
            Instruction::PopR(reg) => self.op_pop_r(reg),
            // Integer arithmetic
            Instruction::Add => self.op_arith(|b, a| b.wrapping_add(a)),
            Instruction::Sub => self.op_arith(|b, a| b.wrapping_sub(a)),
            Instruction::Mul => self.op_arith(|b, a| a.wrapping_mul(b)),
            Instruction::Div => self.op_div(),
            // Console
            Instruction::In => self.op_in(console),
            Instruction::Out => self.op_out(console),
            // Control flow
            Instruction::Jmp(label) => self.jump(label),
            Instruction::Jeq(label) => self.op_branch(label, |a, b| a == b),
            Instruction::Jne(label) => self.op_branch(label, |a, b| a != b),
            Instruction::Ja(label) => self.op_branch(label, |a, b| a > b),
            Instruction::Jae(label) => self.op_branch(label, |a, b| a >= b),
            Instruction::Jb(label) => self.op_branch(label, |a, b| a < b),
            Instruction::Jbe(label) => self.op_branch(label, |a, b| a <= b),
            Instruction::Call(label) => self.op_call(label),
            Instruction::Ret => self.op_ret(),
        }
    }

    fn advance(&self) -> Next {
        Next::Line(self.pc + 1)
    }

    fn pop(&mut self) -> Result<i64, VMError> {
        self.stack.pop().ok_or(VMError::EmptyStack)
    }

    fn jump(&self, label: LabelId) -> Result<Next, VMError> {
        self.program.symbols().jump_target(label).map(Next::Line)
    }

    fn op_push(&mut self, value: i64) -> Result<Next, VMError> {
        self.stack.push(value);
        Ok(self.advance())
    }

    fn op_pop(&mut self) -> Result<Next, VMError> {
        self.pop()?;
        Ok(self.advance())
    }

    fn op_push_r(&mut self, reg: RegisterId) -> Result<Next, VMError> {
        let value = self.program.symbols().read_register(reg);
        self.stack.push(value);
        Ok(self.advance())
    }

    fn op_pop_r(&mut self, reg: RegisterId) -> Result<Next, VMError> {
        let value = self.pop()?;
        self.program.symbols_mut().write_register(reg, value);
        Ok(self.advance())
    }

    /// Pops `a` then `b` and pushes `f(b, a)`.
    fn op_arith(&mut self, f: impl FnOnce(i64, i64) -> i64) -> Result<Next, VMError> {
        let a = self.pop()?;
        let b = self.pop()?;
        self.stack.push(f(b, a));
        Ok(self.advance())
    }

    fn op_div(&mut self) -> Result<Next, VMError> {
        let a = self.pop()?;
        let b = self.pop()?;
        if a == 0 {
            return Err(VMError::DivisionByZero);
        }
        self.stack.push(b.wrapping_div(a));
        Ok(self.advance())
    }

    fn op_in<C: Console>(&mut self, console: &mut C) -> Result<Next, VMError> {
        let value = console.read_int()?;
        self.stack.push(value);
        Ok(self.advance())
    }

    fn op_out<C: Console>(&mut self, console: &mut C) -> Result<Next, VMError> {
        let value = self.pop()?;
        console.write_int(value)?;
        Ok(self.advance())
    }

    /// Compares top `a` with second `b`, consuming `b` and keeping `a`.
    fn op_branch(
        &mut self,
        label: LabelId,
        cond: impl FnOnce(i64, i64) -> bool,
    ) -> Result<Next, VMError> {
        let a = self.pop()?;
        let b = self.pop()?;
        self.stack.push(a);
        if cond(a, b) {
            self.jump(label)
        } else {
            Ok(self.advance())
        }
    }

    fn op_call(&mut self, label: LabelId) -> Result<Next, VMError> {
        let next = self.jump(label)?;
        self.call_stack.push(self.pc);
        Ok(next)
    }

    fn op_ret(&mut self) -> Result<Next, VMError> {
        let line = self.call_stack.pop().ok_or(VMError::ReturnWithoutCall)?;
        Ok(Next::Line(line + 1))
    }
}
