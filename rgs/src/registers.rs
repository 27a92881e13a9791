//! The memory management softswitches owned by the core
//!
//! # Literature
//!
//! - Apple IIgs Hardware Reference, chapter 2 and appendix on softswitches
//! - <https://www.kreativekorp.com/miscpages/a2info/iomemory.shtml>

use crate::{backend::Backend, device::Device, io::IoTables};

/// The part of the page table a switch change invalidates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rebuild {
    Main,
    AltZp,
    LanguageCard,
    Shadow,
    /// Everything the state register covers
    State,
}

pub(crate) fn register_softswitches<B: Backend>(io: &mut IoTables<B>) {
    for offset in 0x00..=0x0b {
        io.register_write(offset, write_handler::<B>);
    }
    for offset in (0x11..=0x18).chain(0x1a..=0x1d) {
        io.register_read(offset, read_handler::<B>);
    }
    for offset in [0x2d, 0x35, 0x68]
        .into_iter()
        .chain(0x50..=0x57)
        .chain(0x80..=0x8f)
    {
        io.register(offset, read_handler::<B>, write_handler::<B>);
    }
}

fn read_handler<B: Backend>(device: &mut Device<B>, offset: u8, _value: u8) -> u8 {
    device.read_softswitch(offset)
}

fn write_handler<B: Backend>(device: &mut Device<B>, offset: u8, value: u8) -> u8 {
    device.write_softswitch(offset, value);
    0
}

/// Set `flag` and report whether it changed
fn update(flag: &mut bool, value: bool) -> bool {
    core::mem::replace(flag, value) != value
}

impl<B: Backend> Device<B> {
    pub fn rebuild(&mut self, what: Rebuild) {
        let switches = &self.switches;
        match what {
            Rebuild::Main => self.mmu.rebuild_main(switches),
            Rebuild::AltZp => self.mmu.rebuild_altzp(switches),
            Rebuild::LanguageCard => self.mmu.rebuild_language_card(switches),
            Rebuild::Shadow => self.mmu.rebuild_shadow(switches),
            Rebuild::State => {
                self.mmu.rebuild_altzp(switches);
                self.mmu.rebuild_main(switches);
                self.mmu.rebuild_language_card(switches);
            }
        }
        log::debug!("rebuilt pages ({:?})", what);
    }

    fn read_softswitch(&mut self, offset: u8) -> u8 {
        let sw = &self.switches;
        let status = |flag: bool| if flag { 0x80 } else { 0 };
        match offset {
            // RDLCBNK2 - language card bank 2 selected
            0x11 => status(sw.lcbank2),
            // RDLCRAM - language card RAM read enabled
            0x12 => status(sw.lcread),
            // RDRAMRD - auxiliary memory read enabled
            0x13 => status(sw.ramrd),
            // RDRAMWRT - auxiliary memory write enabled
            0x14 => status(sw.ramwrt),
            // RDCXROM - internal slot ROM selected
            0x15 => status(sw.intcxrom),
            // RDALTZP - auxiliary zero page and stack
            0x16 => status(sw.altzp),
            // RDC3ROM - slot 3 peripheral ROM
            0x17 => status(sw.slotc3rom),
            // RD80STORE
            0x18 => status(sw.store80),
            0x1a => status(sw.text),
            0x1b => status(sw.mixed),
            0x1c => status(sw.page2),
            0x1d => status(sw.hires),
            // SLOTROMSEL
            0x2d => sw.slot_register,
            // SHADOW
            0x35 => sw.shadow,
            // STATEREG
            0x68 => sw.state_register(),
            0x50..=0x57 => {
                self.display_switch(offset);
                0
            }
            0x80..=0x8f => {
                self.language_card_switch(offset, true);
                0
            }
            _ => {
                debug_assert!(false, "softswitch $C0{:02X} not readable", offset);
                0
            }
        }
    }

    fn write_softswitch(&mut self, offset: u8, value: u8) {
        let on = offset & 1 != 0;
        let sw = &mut self.switches;
        let rebuild = match offset {
            // 80STOREOFF/80STOREON
            0x00 | 0x01 => update(&mut sw.store80, on).then(|| Rebuild::Main),
            // RDMAINRAM/RDCARDRAM
            0x02 | 0x03 => update(&mut sw.ramrd, on).then(|| Rebuild::Main),
            // WRMAINRAM/WRCARDRAM
            0x04 | 0x05 => update(&mut sw.ramwrt, on).then(|| Rebuild::Main),
            // SETSLOTCXROM/SETINTCXROM
            0x06 | 0x07 => update(&mut sw.intcxrom, on).then(|| Rebuild::LanguageCard),
            // SETSTDZP/SETALTZP
            0x08 | 0x09 => update(&mut sw.altzp, on).then(|| Rebuild::AltZp),
            // SETINTC3ROM/SETSLOTC3ROM
            0x0a | 0x0b => update(&mut sw.slotc3rom, on).then(|| Rebuild::LanguageCard),
            0x2d => {
                // SLOTROMSEL - which slots are served by cards
                sw.slot_register = value;
                Some(Rebuild::LanguageCard)
            }
            0x35 => {
                // SHADOW - shadow register
                sw.shadow = value;
                Some(Rebuild::Shadow)
            }
            0x68 => {
                // STATEREG - state register
                sw.set_state_register(value);
                Some(Rebuild::State)
            }
            0x50..=0x57 => {
                self.display_switch(offset);
                None
            }
            0x80..=0x8f => {
                self.language_card_switch(offset, false);
                None
            }
            _ => {
                debug_assert!(false, "softswitch $C0{:02X} not writable", offset);
                None
            }
        };
        if let Some(what) = rebuild {
            log::debug!("softswitch $C0{:02X} <- ${:02X}", offset, value);
            self.rebuild(what)
        }
    }

    /// `$C050-$C057`, triggered by reads and writes alike
    fn display_switch(&mut self, offset: u8) {
        let on = offset & 1 != 0;
        let sw = &mut self.switches;
        // only PAGE2 and HIRES affect banking, and only with 80STORE on
        let remaps = match offset {
            // TXTCLR/TXTSET
            0x50 | 0x51 => {
                sw.text = on;
                false
            }
            // MIXCLR/MIXSET
            0x52 | 0x53 => {
                sw.mixed = on;
                false
            }
            // TXTPAGE1/TXTPAGE2
            0x54 | 0x55 => update(&mut sw.page2, on),
            // LORES/HIRES
            _ => update(&mut sw.hires, on),
        };
        if remaps && sw.store80 {
            self.rebuild(Rebuild::Main)
        }
    }

    /// `$C080-$C08F`: bit 3 selects bank 1, bits 0/1 select RAM or ROM
    /// reads. Writing gets enabled by two successive reads of an odd
    /// location; any even location disables it again.
    fn language_card_switch(&mut self, offset: u8, read: bool) {
        let sw = &mut self.switches;
        let before = (sw.lcbank2, sw.lcread, sw.lcwrite);
        sw.lcbank2 = offset & 0x08 == 0;
        sw.lcread = matches!(offset & 0x03, 0 | 3);
        if offset & 1 == 0 {
            sw.lcwrite = false;
            sw.lc_prewrite = false;
        } else if read {
            if sw.lc_prewrite {
                sw.lcwrite = true
            }
            sw.lc_prewrite = true;
        } else {
            sw.lc_prewrite = false;
        }
        if before != (sw.lcbank2, sw.lcread, sw.lcwrite) {
            log::debug!(
                "language card: bank {}, read {}, write {}",
                if sw.lcbank2 { 2 } else { 1 },
                if sw.lcread { "RAM" } else { "ROM" },
                if sw.lcwrite { "RAM" } else { "off" }
            );
            self.rebuild(Rebuild::LanguageCard)
        }
    }
}
