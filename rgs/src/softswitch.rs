//! Memory management softswitch state
//!
//! # Literature
//!
//! - Apple IIgs Hardware Reference, chapter 2 (memory management)
//! - <https://www.kreativekorp.com/miscpages/a2info/iomemory.shtml>

use save_state_macro::*;

/// Bits of the shadow register (`$C035`). A set bit *inhibits* shadowing.
pub mod shadow {
    pub const TEXT1: u8 = 0x01;
    pub const HIRES1: u8 = 0x02;
    pub const HIRES2: u8 = 0x04;
    pub const SUPER_HIRES: u8 = 0x08;
    /// Inhibit shadowing of the hires pages in bank `$01`
    pub const AUX_HIRES: u8 = 0x10;
    /// Only wired on ROM 03 machines
    pub const TEXT2: u8 = 0x20;
    /// Replace the I/O and language card space of banks `$00/$01` by RAM
    pub const IOLC: u8 = 0x40;

    pub const POWER_ON: u8 = SUPER_HIRES;
}

/// Bits of the state register (`$C068`)
pub mod statereg {
    pub const INTCXROM: u8 = 0x01;
    pub const ROMBANK: u8 = 0x02;
    pub const LCBNK2: u8 = 0x04;
    pub const RDROM: u8 = 0x08;
    pub const RAMWRT: u8 = 0x10;
    pub const RAMRD: u8 = 0x20;
    pub const PAGE2: u8 = 0x40;
    pub const ALTZP: u8 = 0x80;
}

#[derive(Debug, Clone, PartialEq, Eq, InSaveState)]
pub struct SoftswitchState {
    pub store80: bool,
    pub ramrd: bool,
    pub ramwrt: bool,
    pub altzp: bool,
    pub intcxrom: bool,
    pub slotc3rom: bool,
    pub lcbank2: bool,
    pub lcread: bool,
    pub lcwrite: bool,
    /// First of the two reads needed to write-enable the language card
    pub lc_prewrite: bool,
    pub page2: bool,
    pub hires: bool,
    pub text: bool,
    pub mixed: bool,
    pub shadow: u8,
    /// Bit `n` set: slot `n` is served by a peripheral card
    pub slot_register: u8,
}

impl SoftswitchState {
    pub const fn new(slot_register: u8, shadow: u8) -> Self {
        Self {
            store80: false,
            ramrd: false,
            ramwrt: false,
            altzp: false,
            intcxrom: false,
            slotc3rom: false,
            lcbank2: true,
            lcread: false,
            lcwrite: true,
            lc_prewrite: false,
            page2: false,
            hires: false,
            text: true,
            mixed: false,
            shadow,
            slot_register,
        }
    }

    /// Return every bank and overlay switch to its power-on value.
    /// The slot and shadow registers survive a reset.
    pub fn reset(&mut self) {
        *self = Self::new(self.slot_register, self.shadow)
    }

    pub const fn shadow_inhibited(&self, bits: u8) -> bool {
        self.shadow & bits != 0
    }

    pub const fn card_installed(&self, slot: u8) -> bool {
        slot < 8 && self.slot_register & (1 << slot) != 0
    }

    /// Pack the switches mirrored by the state register
    pub const fn state_register(&self) -> u8 {
        let mut val = 0;
        if self.altzp {
            val |= statereg::ALTZP
        }
        if self.page2 {
            val |= statereg::PAGE2
        }
        if self.ramrd {
            val |= statereg::RAMRD
        }
        if self.ramwrt {
            val |= statereg::RAMWRT
        }
        if !self.lcread {
            val |= statereg::RDROM
        }
        if self.lcbank2 {
            val |= statereg::LCBNK2
        }
        if self.intcxrom {
            val |= statereg::INTCXROM
        }
        val
    }

    /// Unpack a value written to the state register. ROMBANK is not
    /// wired and ignored; the write-enable latch is left alone.
    pub fn set_state_register(&mut self, val: u8) {
        self.altzp = val & statereg::ALTZP != 0;
        self.page2 = val & statereg::PAGE2 != 0;
        self.ramrd = val & statereg::RAMRD != 0;
        self.ramwrt = val & statereg::RAMWRT != 0;
        self.lcread = val & statereg::RDROM == 0;
        self.lcbank2 = val & statereg::LCBNK2 != 0;
        self.intcxrom = val & statereg::INTCXROM != 0;
    }
}

impl Default for SoftswitchState {
    fn default() -> Self {
        Self::new(0, shadow::POWER_ON)
    }
}
