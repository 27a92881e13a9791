//! Run loop and interrupt polling
//!
//! Interrupts and the WAI/STP states are only looked at between
//! instructions.

use crate::{backend::Backend, cpu::Status, device::Device, interrupt::Vector};
use save_state_macro::*;

/// CPU cycles at the machine's nominal clock
pub type Cycles = u32;

/// Cycles charged for the reset sequence
const RESET_CYCLES: Cycles = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, InSaveState)]
pub enum RunState {
    Running,
    /// Stopped by WAI until any interrupt line is raised
    Waiting,
    /// Stopped by STP until reset
    Halted,
}

impl Default for RunState {
    fn default() -> Self {
        Self::Running
    }
}

impl<B: Backend> Device<B> {
    /// Execute instructions until at least `max` cycles passed or the CPU
    /// stops in WAI or STP. Returns the cycles actually spent.
    pub fn run_until(&mut self, max: Cycles) -> Cycles {
        let mut cycles: Cycles = 0;
        while cycles < max {
            match self.step() {
                Some(n) => cycles += n,
                None => break,
            }
        }
        self.total_cycles += u64::from(cycles);
        cycles
    }

    /// Service the highest priority pending interrupt or, if there is
    /// none, execute one instruction. `None` means the CPU is stopped.
    ///
    /// This does not count towards [`Device::total_cycles`].
    pub fn step(&mut self) -> Option<Cycles> {
        if self.interrupts.take_reset() {
            self.reset();
            return Some(RESET_CYCLES);
        }
        if self.run_state == RunState::Halted {
            return None;
        }
        if self.interrupts.take_abort() {
            self.run_state = RunState::Running;
            return Some(self.hardware_interrupt(Vector::Abort));
        }
        if self.interrupts.take_nmi() {
            self.run_state = RunState::Running;
            self.mmu.snapshot_banks();
            return Some(self.hardware_interrupt(Vector::Nmi));
        }
        if self.interrupts.irq_count() > 0 {
            self.run_state = RunState::Running;
            if !self.cpu.regs.status.has(Status::IRQ_DISABLE) {
                return Some(self.hardware_interrupt(Vector::Irq));
            }
        }
        if self.run_state == RunState::Waiting {
            return None;
        }
        Some(self.dispatch_instruction())
    }
}
