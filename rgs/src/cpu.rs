//! 65816/65C816 CPU handling types
//!
//! # Literature
//!
//! - <https://www.westerndesigncenter.com/wdc/documentation/w65c816s.pdf>
//! - <https://wiki.superfamicom.org/65816-reference>
//! - <https://apprize.best/programming/65816/>

use crate::device::Addr24;
use core::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};
use save_state_macro::*;

/// Structure containing the processor registers
#[derive(Debug, Clone, PartialEq, Eq, InSaveState)]
pub struct Regs {
    /// The accumulator register (called `C` when used as a whole)
    pub a: u16,
    /// The first index register
    pub x: u16,
    /// The second index register
    pub y: u16,
    /// The stack pointer
    pub sp: u16,
    /// The direct page register (the direct page is limited to bank zero)
    pub dp: u16,
    /// The program counter with the program bank register.
    pub pc: Addr24,
    /// The data bank register
    pub db: u8,
    /// The processor status
    pub status: Status,
    /// 6502 emulation mode
    pub is_emulation: bool,
}

pub const fn low_byte(val: u16) -> u8 {
    (val & 0xff) as u8
}

pub const fn high_byte(val: u16) -> u8 {
    (val >> 8) as u8
}

pub const fn word(low: u8, high: u8) -> u16 {
    low as u16 | ((high as u16) << 8)
}

impl Regs {
    pub const fn a8(&self) -> u8 {
        low_byte(self.a)
    }

    pub fn set_a8(&mut self, val: u8) {
        self.a = (self.a & 0xff00) | val as u16
    }

    pub const fn x8(&self) -> u8 {
        low_byte(self.x)
    }

    pub fn set_x8(&mut self, val: u8) {
        self.x = (self.x & 0xff00) | val as u16
    }

    pub const fn y8(&self) -> u8 {
        low_byte(self.y)
    }

    pub fn set_y8(&mut self, val: u8) {
        self.y = (self.y & 0xff00) | val as u16
    }

    /// Low byte of the direct page register. Direct page modes cost one
    /// extra cycle whenever it is not zero.
    pub const fn dl(&self) -> u8 {
        low_byte(self.dp)
    }
}

/// Processor status flags
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, InSaveState)]
pub struct Status(pub u8);

macro_rules! bitor { ($t:ident, $($vs:ident)|*) => { $t($(<$t>::$vs.0)|*) }; }

impl Status {
    /// Negative Flag
    pub const NEGATIVE: Self = Self(0b1000_0000);
    /// Overflow Flag
    pub const OVERFLOW: Self = Self(0b0100_0000);
    /// Memory/Accumulator size
    ///  - `0`: 16-bit
    ///  - `1`: 8-bit
    ///
    /// **native only**
    pub const ACCUMULATION: Self = Self(0b0010_0000);
    /// Index register size
    ///  - `0`: 16-bit
    ///  - `1`: 8-bit
    ///
    /// **native only**
    pub const INDEX_REGISTER_SIZE: Self = Self(0b0001_0000);
    /// Decimal Flag
    pub const DECIMAL: Self = Self(0b0000_1000);
    /// IRQ-Disable Flag
    ///  - `0`: Enabled
    ///  - `1`: Disabled
    pub const IRQ_DISABLE: Self = Self(0b0000_0100);
    /// Zero Flag
    pub const ZERO: Self = Self(0b0000_0010);
    /// Carry Flag
    pub const CARRY: Self = Self(0b0000_0001);
    /// Break Flag
    ///
    /// **6502 emulation mode only**, only visible in the pushed copy
    pub const BREAK: Self = Self(0b0001_0000);

    /// The value that the status register gets reset to
    pub const RESET_DEFAULT: Self = bitor!(Self, ACCUMULATION | INDEX_REGISTER_SIZE | IRQ_DISABLE);

    pub const fn has(&self, flag: Self) -> bool {
        self.0 & flag.0 > 0
    }

    pub fn set_if(&mut self, flag: Self, condition: bool) {
        if condition {
            *self |= flag
        } else {
            *self &= !flag
        }
    }
}

impl BitAnd for Status {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl BitOr for Status {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Status {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0
    }
}

impl BitAndAssign for Status {
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0
    }
}

impl Not for Status {
    type Output = Self;
    fn not(self) -> Self {
        Self(!self.0)
    }
}

/// The five instruction dispatch selections.
///
/// Emulation mode forces 8-bit registers, so only one of its four
/// `(M, X)` combinations exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Emulation,
    M8X8,
    M8X16,
    M16X8,
    M16X16,
}

impl Mode {
    pub const fn from_flags(emulation: bool, m8: bool, x8: bool) -> Self {
        match (emulation, m8, x8) {
            (true, _, _) => Self::Emulation,
            (false, true, true) => Self::M8X8,
            (false, true, false) => Self::M8X16,
            (false, false, true) => Self::M16X8,
            (false, false, false) => Self::M16X16,
        }
    }
}

/// Structure for emulating the 65816 Processor
#[derive(Debug, Clone, InSaveState, DefaultByNew)]
pub struct Cpu {
    pub regs: Regs,
    /// Currently active dispatch selection, only ever changed by
    /// [`Cpu::mode_switch`]
    #[save_state(skip)]
    mode: Mode,
}

impl Cpu {
    pub fn new() -> Self {
        Self {
            regs: Regs {
                a: 0,
                x: 0,
                y: 0,
                sp: 0x1ff,
                dp: 0,
                pc: Addr24::default(),
                db: 0,
                status: Status::RESET_DEFAULT,
                is_emulation: true,
            },
            mode: Mode::Emulation,
        }
    }

    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Indicate if the A register is in 8-bit mode
    pub const fn is_reg8(&self) -> bool {
        self.regs.status.has(Status::ACCUMULATION)
    }

    /// Indicate if the X and Y registers are in 8-bit mode
    pub const fn is_idx8(&self) -> bool {
        self.regs.status.has(Status::INDEX_REGISTER_SIZE)
    }

    /// Build an [`Addr24`] from an 16-bit address with the data bank register
    pub const fn get_data_addr(&self, addr: u16) -> Addr24 {
        Addr24::new(self.regs.db, addr)
    }

    pub fn update_nz8(&mut self, val: u8) {
        if val > 0 {
            self.regs.status = (self.regs.status & !(Status::ZERO | Status::NEGATIVE))
                | Status(val & Status::NEGATIVE.0);
        } else {
            self.regs.status = (self.regs.status & !Status::NEGATIVE) | Status::ZERO
        }
    }

    pub fn update_nz16(&mut self, val: u16) {
        if val > 0 {
            self.regs.status = (self.regs.status & !(Status::ZERO | Status::NEGATIVE))
                | Status(high_byte(val) & Status::NEGATIVE.0);
        } else {
            self.regs.status = (self.regs.status & !Status::NEGATIVE) | Status::ZERO
        }
    }

    /// Update N and Z for a value of the given width
    pub fn update_nz(&mut self, val: u16, wide: bool) {
        if wide {
            self.update_nz16(val)
        } else {
            self.update_nz8(low_byte(val))
        }
    }

    /// Enforce the register width invariants after E, M or X may have
    /// changed and select the matching dispatch table.
    pub fn mode_switch(&mut self) {
        if self.regs.is_emulation {
            self.regs.status |= Status::INDEX_REGISTER_SIZE | Status::ACCUMULATION;
            self.regs.sp = (self.regs.sp & 0xff) | 0x100;
        }
        if self.is_idx8() {
            self.regs.x &= 0xff;
            self.regs.y &= 0xff;
        }
        self.mode = Mode::from_flags(self.regs.is_emulation, self.is_reg8(), self.is_idx8());
    }

    /// Replace the whole status register, e.g. for `PLP` or `RTI`
    pub fn set_status(&mut self, status: u8) {
        self.regs.status = Status(status);
        self.mode_switch()
    }

    pub fn set_emulation(&mut self, emulation: bool) {
        self.regs.is_emulation = emulation;
        self.mode_switch()
    }
}
