//! Interrupt lines and interrupt entry

use crate::{
    backend::Backend,
    cpu::Status,
    device::{Addr24, Device, Wrap},
    timing::Cycles,
};
use save_state_macro::*;

/// Pending interrupt requests, sampled by the engine before every fetch
#[derive(Debug, Clone, PartialEq, Eq, InSaveState, DefaultByNew)]
pub struct Interrupts {
    reset: bool,
    abort: bool,
    nmi: bool,
    /// Number of devices currently asserting the shared IRQ line
    irq: u32,
}

impl Interrupts {
    pub const fn new() -> Self {
        Self {
            reset: false,
            abort: false,
            nmi: false,
            irq: 0,
        }
    }

    pub fn raise_irq(&mut self) {
        self.irq = self.irq.saturating_add(1)
    }

    pub fn clear_irq(&mut self) {
        self.irq = self.irq.saturating_sub(1)
    }

    pub const fn irq_count(&self) -> u32 {
        self.irq
    }

    pub fn raise_nmi(&mut self) {
        self.nmi = true
    }

    pub fn raise_abort(&mut self) {
        self.abort = true
    }

    pub fn raise_reset(&mut self) {
        self.reset = true
    }

    /// Is any line asserted, masked or not
    pub const fn any_pending(&self) -> bool {
        self.reset || self.abort || self.nmi || self.irq > 0
    }

    /// Drop pending RESET, ABORT and NMI requests. The IRQ count belongs
    /// to the devices driving the line.
    pub fn clear_latches(&mut self) {
        self.reset = false;
        self.abort = false;
        self.nmi = false;
    }

    pub fn take_reset(&mut self) -> bool {
        core::mem::take(&mut self.reset)
    }

    pub fn take_abort(&mut self) -> bool {
        core::mem::take(&mut self.abort)
    }

    pub fn take_nmi(&mut self) -> bool {
        core::mem::take(&mut self.nmi)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vector {
    Cop,
    Brk,
    Abort,
    Nmi,
    Irq,
}

impl Vector {
    /// Location of the vector in bank `$00`
    pub const fn address(self, emulation: bool) -> u16 {
        match (self, emulation) {
            (Self::Cop, false) => 0xffe4,
            (Self::Brk, false) => 0xffe6,
            (Self::Abort, false) => 0xffe8,
            (Self::Nmi, false) => 0xffea,
            (Self::Irq, false) => 0xffee,
            (Self::Cop, true) => 0xfff4,
            (Self::Abort, true) => 0xfff8,
            (Self::Nmi, true) => 0xfffa,
            (Self::Brk | Self::Irq, true) => 0xfffe,
        }
    }

    /// Only `BRK` and `COP` are raised by instructions
    pub const fn is_software(self) -> bool {
        matches!(self, Self::Brk | Self::Cop)
    }
}

impl<B: Backend> Device<B> {
    pub fn raise_irq(&mut self) {
        self.interrupts.raise_irq()
    }

    pub fn clear_irq(&mut self) {
        self.interrupts.clear_irq()
    }

    pub fn raise_nmi(&mut self) {
        self.interrupts.raise_nmi()
    }

    pub fn raise_abort(&mut self) {
        self.interrupts.raise_abort()
    }

    pub fn raise_reset(&mut self) {
        self.interrupts.raise_reset()
    }

    pub fn interrupts(&self) -> &Interrupts {
        &self.interrupts
    }

    /// Push the return state and jump through `vector`. The caller is
    /// responsible for the cycle cost.
    pub fn enter_interrupt(&mut self, vector: Vector) {
        let emulation = self.cpu.regs.is_emulation;
        if !emulation {
            self.push(self.cpu.regs.pc.bank);
        }
        self.push(self.cpu.regs.pc.addr);
        let mut status = self.cpu.regs.status;
        if emulation && !vector.is_software() {
            status &= !Status::BREAK;
        }
        self.push(status.0);
        self.cpu.regs.status |= Status::IRQ_DISABLE;
        self.cpu.regs.status &= !Status::DECIMAL;
        self.cpu.mode_switch();
        let addr = self.read::<u16>(Addr24::new(0, vector.address(emulation)), Wrap::Bank);
        self.cpu.regs.pc = Addr24::new(0, addr);
        log::trace!("{:?} interrupt, continuing at {}", vector, self.cpu.regs.pc);
    }

    /// Interrupt raised by a line: 7 cycles in emulation mode, 8 native
    pub(crate) fn hardware_interrupt(&mut self, vector: Vector) -> Cycles {
        let cycles = if self.cpu.regs.is_emulation { 7 } else { 8 };
        self.enter_interrupt(vector);
        cycles
    }
}
