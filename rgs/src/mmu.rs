//! The page table mapping the 24-bit address space onto the RAM and ROM
//! arenas
//!
//! Every 256-byte page has its own [`PageEntry`]. Softswitch changes never
//! touch individual accesses; instead they rebuild the affected slice of the
//! table, so a memory access is one table lookup plus one arena index.
//!
//! # Literature
//!
//! - Apple IIgs Hardware Reference, chapter 2
//! - Apple IIgs Firmware Reference, appendix on the memory map

use crate::{
    device::Addr24,
    rom::{ReadRomError, Rom, RomVersion},
    softswitch::{shadow, SoftswitchState},
};
use save_state::{InSaveState, SaveStateDeserializer, SaveStateSerializer};

pub const PAGE_COUNT: usize = 0x1_0000;
pub const BANK_SIZE: usize = 0x1_0000;
pub const FAST_RAM_MIN: usize = 0x10_0000;
pub const FAST_RAM_MAX: usize = 0x80_0000;
pub const SLOW_RAM_SIZE: usize = 0x2_0000;
pub const SAVE_RAM_SIZE: usize = 0x2_0000;
/// Pages of slow RAM, one dirty word each
pub const SLOW_PAGE_COUNT: usize = SLOW_RAM_SIZE >> 8;

static JUNK: [u8; 0x100] = [0; 0x100];

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("invalid ROM image: {0}")]
    Rom(#[from] ReadRomError),
    #[error("fast RAM must be 1 to 8 MiB in 64 KiB steps (got {0} bytes)")]
    FastRamSize(usize),
    #[error("slow RAM must be exactly {} bytes (got {0})", SLOW_RAM_SIZE)]
    SlowRamSize(usize),
    #[error("save RAM must be exactly {} bytes (got {0})", SAVE_RAM_SIZE)]
    SaveRamSize(usize),
    #[error("could not allocate {size} bytes of {what}")]
    Allocation { what: &'static str, size: usize },
}

/// The backing buffer a page reference points into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arena {
    Fast,
    Slow,
    Rom,
    Save,
    /// 256 bytes of zeros backing unmapped pages
    Junk,
}

/// Start of a page inside one of the arenas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRef {
    pub arena: Arena,
    pub offset: u32,
}

impl PageRef {
    pub const JUNK: Self = Self::new(Arena::Junk, 0);

    pub const fn new(arena: Arena, offset: u32) -> Self {
        Self { arena, offset }
    }
}

#[repr(transparent)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageFlags(pub u8);

impl PageFlags {
    pub const NONE: Self = Self(0);
    /// Accesses go through the I/O dispatch tables
    pub const IO: Self = Self(0x01);
    /// Slow RAM page the video collaborator watches
    pub const SPECIAL: Self = Self(0x02);
    /// Writes are mirrored into bank `$E0`
    pub const SHADOW_E0: Self = Self(0x04);
    /// Writes are mirrored into bank `$E1`
    pub const SHADOW_E1: Self = Self(0x08);
    pub const INVALID: Self = Self(0x10);

    pub const fn has(self, flags: Self) -> bool {
        self.0 & flags.0 != 0
    }
}

impl core::ops::BitOr for PageFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageEntry {
    pub read: PageRef,
    pub write: Option<PageRef>,
    pub flags: PageFlags,
}

impl PageEntry {
    pub const INVALID: Self = Self {
        read: PageRef::JUNK,
        write: None,
        flags: PageFlags::INVALID,
    };

    pub const IO: Self = Self {
        read: PageRef::JUNK,
        write: None,
        flags: PageFlags::IO,
    };

    pub const fn ram(page: PageRef, flags: PageFlags) -> Self {
        Self {
            read: page,
            write: Some(page),
            flags,
        }
    }

    pub const fn rom(page: PageRef) -> Self {
        Self {
            read: page,
            write: None,
            flags: PageFlags::NONE,
        }
    }
}

/// The backing buffers. They are validated once and never resized.
#[derive(Debug, Clone)]
pub struct Memory {
    fast: Box<[u8]>,
    slow: Box<[u8]>,
    save: Box<[u8]>,
    rom: Rom,
}

impl Memory {
    pub fn new(
        fast: impl Into<Box<[u8]>>,
        slow: impl Into<Box<[u8]>>,
        rom: Rom,
        save: impl Into<Box<[u8]>>,
    ) -> Result<Self, InitError> {
        let (fast, slow, save) = (fast.into(), slow.into(), save.into());
        if !(FAST_RAM_MIN..=FAST_RAM_MAX).contains(&fast.len()) || fast.len() % BANK_SIZE != 0 {
            return Err(InitError::FastRamSize(fast.len()));
        }
        if slow.len() != SLOW_RAM_SIZE {
            return Err(InitError::SlowRamSize(slow.len()));
        }
        if save.len() != SAVE_RAM_SIZE {
            return Err(InitError::SaveRamSize(save.len()));
        }
        Ok(Self {
            fast,
            slow,
            save,
            rom,
        })
    }

    /// Number of fast RAM banks, starting at bank `$00`
    pub fn fast_banks(&self) -> usize {
        self.fast.len() / BANK_SIZE
    }

    pub fn rom(&self) -> &Rom {
        &self.rom
    }

    pub fn arena(&self, arena: Arena) -> &[u8] {
        match arena {
            Arena::Fast => &self.fast,
            Arena::Slow => &self.slow,
            Arena::Rom => self.rom.data(),
            Arena::Save => &self.save,
            Arena::Junk => &JUNK,
        }
    }

    fn arena_mut(&mut self, arena: Arena) -> Option<&mut [u8]> {
        match arena {
            Arena::Fast => Some(&mut self.fast),
            Arena::Slow => Some(&mut self.slow),
            Arena::Save => Some(&mut self.save),
            Arena::Rom | Arena::Junk => None,
        }
    }
}

/// The ROM image is supplied by the host on every start and is not saved
impl InSaveState for Memory {
    fn serialize(&self, state: &mut SaveStateSerializer) {
        self.fast.serialize(state);
        self.slow.serialize(state);
        self.save.serialize(state);
    }

    fn deserialize(&mut self, state: &mut SaveStateDeserializer) -> save_state::Result<()> {
        self.fast.deserialize(state)?;
        self.slow.deserialize(state)?;
        self.save.deserialize(state)
    }
}

const fn fast_page(bank: u8, page: u8) -> PageRef {
    PageRef::new(Arena::Fast, ((bank as u32) << 16) | ((page as u32) << 8))
}

const fn slow_page(bank: u8, page: u8) -> PageRef {
    PageRef::new(Arena::Slow, (((bank & 1) as u32) << 16) | ((page as u32) << 8))
}

/// RAM backing `page` of `bank` for the banks with special mappings
const fn ram_page(bank: u8, page: u8) -> PageRef {
    match bank {
        0xe0 | 0xe1 => slow_page(bank, page),
        _ => fast_page(bank, page),
    }
}

const fn is_special(bank: u8, page: u8) -> bool {
    matches!(
        (bank, page),
        (0xe0 | 0xe1, 0x04..=0x0b) | (0xe0 | 0xe1, 0x20..=0x5f) | (0xe1, 0x60..=0x9f)
    )
}

#[derive(Debug)]
pub struct Mmu {
    memory: Memory,
    pages: Box<[PageEntry]>,
    changed: [u32; SLOW_PAGE_COUNT],
}

impl Mmu {
    pub fn new(memory: Memory, switches: &SoftswitchState) -> Self {
        let mut mmu = Self {
            memory,
            pages: vec![PageEntry::INVALID; PAGE_COUNT].into_boxed_slice(),
            changed: [0; SLOW_PAGE_COUNT],
        };
        mmu.rebuild_all(switches);
        mmu
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Swap in restored RAM contents and rebuild the table around them.
    /// Every slow page is marked as changed afterwards.
    pub fn replace_memory(&mut self, memory: Memory, switches: &SoftswitchState) {
        self.memory = memory;
        self.rebuild_all(switches);
        self.changed = [u32::MAX; SLOW_PAGE_COUNT];
    }

    pub fn pages(&self) -> &[PageEntry] {
        &self.pages
    }

    pub fn entry(&self, addr: Addr24) -> PageEntry {
        self.pages[addr.page()]
    }

    fn set(&mut self, bank: u8, page: u8, entry: PageEntry) {
        self.pages[((bank as usize) << 8) | page as usize] = entry
    }

    pub fn changed_pages(&self) -> &[u32] {
        &self.changed
    }

    pub fn clear_changed(&mut self, page: usize, mask: u32) {
        if let Some(bits) = self.changed.get_mut(page) {
            *bits &= !mask
        }
    }

    pub fn save_ram(&self) -> &[u8] {
        self.memory.arena(Arena::Save)
    }

    /// Copy fast banks `$00/$01` into save RAM
    pub fn snapshot_banks(&mut self) {
        let Memory { fast, save, .. } = &mut self.memory;
        save.copy_from_slice(&fast[..SAVE_RAM_SIZE]);
    }

    pub fn read_mapped(&self, entry: PageEntry, low: u8) -> u8 {
        let data = self.memory.arena(entry.read.arena);
        data[entry.read.offset as usize + low as usize]
    }

    pub fn write_mapped(&mut self, entry: PageEntry, low: u8, value: u8) {
        let target = match entry.write {
            Some(target) => target,
            None => return,
        };
        if entry.flags.has(PageFlags::SPECIAL) {
            debug_assert_eq!(target.arena, Arena::Slow);
            self.store_tracked(target.offset as usize + low as usize, value);
            return;
        }
        let index = target.offset as usize + low as usize;
        if let Some(data) = self.memory.arena_mut(target.arena) {
            data[index] = value
        } else {
            debug_assert!(false, "write reference into read-only arena {:?}", target.arena);
            return;
        }
        let mirror_bank = if entry.flags.has(PageFlags::SHADOW_E0) {
            0
        } else if entry.flags.has(PageFlags::SHADOW_E1) {
            1
        } else {
            return;
        };
        self.store_tracked((mirror_bank << 16) | (index & 0xffff), value)
    }

    /// Store into slow RAM and set the dirty bit on an actual change
    fn store_tracked(&mut self, index: usize, value: u8) {
        let slot = &mut self.memory.slow[index];
        if *slot != value {
            *slot = value;
            self.changed[index >> 8] |= 1 << ((index & 0xff) >> 3);
        }
    }

    /// Rebuild the whole table from scratch
    pub fn rebuild_all(&mut self, switches: &SoftswitchState) {
        self.build_static();
        self.build_slow_banks();
        self.rebuild_altzp(switches);
        self.rebuild_main(switches);
        self.build_aux_bank(switches);
        self.rebuild_language_card(switches);
        log::debug!("rebuilt all pages");
    }

    /// Banks whose mapping does not depend on any softswitch
    fn build_static(&mut self) {
        let fast_banks = self.memory.fast_banks();
        let version = self.memory.rom.version();
        for bank in 0..=0xffu8 {
            if matches!(bank, 0x00 | 0x01 | 0xe0 | 0xe1) {
                continue;
            }
            for page in 0..=0xffu8 {
                let entry = if (bank as usize) < fast_banks && bank < 0xe0 {
                    PageEntry::ram(fast_page(bank, page), PageFlags::NONE)
                } else if bank >= version.first_bank() {
                    match self.memory.rom.page_offset(bank, page) {
                        Some(offset) => PageEntry::rom(PageRef::new(Arena::Rom, offset)),
                        None => PageEntry::INVALID,
                    }
                } else {
                    PageEntry::INVALID
                };
                self.set(bank, page, entry);
            }
        }
    }

    /// Pages `$00-$BF` of banks `$E0/$E1`
    fn build_slow_banks(&mut self) {
        for bank in [0xe0, 0xe1] {
            for page in 0x00..=0xbf {
                let flags = if is_special(bank, page) {
                    PageFlags::SPECIAL
                } else {
                    PageFlags::NONE
                };
                self.set(bank, page, PageEntry::ram(slow_page(bank, page), flags));
            }
        }
    }

    /// Shadow flag for a write to `page` of fast bank `bank` (`$00` or `$01`)
    fn shadow_flags(&self, bank: u8, page: u8, switches: &SoftswitchState) -> PageFlags {
        debug_assert!(bank <= 1);
        let aux = bank == 1;
        let hires_ok = !aux || !switches.shadow_inhibited(shadow::AUX_HIRES);
        let super_hires = aux && !switches.shadow_inhibited(shadow::SUPER_HIRES);
        let shadowed = match page {
            0x04..=0x07 => !switches.shadow_inhibited(shadow::TEXT1),
            0x08..=0x0b => {
                self.memory.rom.version() == RomVersion::Rom03
                    && !switches.shadow_inhibited(shadow::TEXT2)
            }
            0x20..=0x3f => {
                (hires_ok && !switches.shadow_inhibited(shadow::HIRES1)) || super_hires
            }
            0x40..=0x5f => {
                (hires_ok && !switches.shadow_inhibited(shadow::HIRES2)) || super_hires
            }
            0x60..=0x9f => super_hires,
            _ => false,
        };
        match (shadowed, aux) {
            (false, _) => PageFlags::NONE,
            (true, false) => PageFlags::SHADOW_E0,
            (true, true) => PageFlags::SHADOW_E1,
        }
    }

    /// Bank `$00` pages `$02-$BF`
    pub fn rebuild_main(&mut self, switches: &SoftswitchState) {
        for page in 0x02..=0xbfu8 {
            let follows_page2 = switches.store80
                && (matches!(page, 0x04..=0x07) || (switches.hires && matches!(page, 0x20..=0x3f)));
            let (read_bank, write_bank) = if follows_page2 {
                (switches.page2 as u8, switches.page2 as u8)
            } else {
                (switches.ramrd as u8, switches.ramwrt as u8)
            };
            let entry = PageEntry {
                read: fast_page(read_bank, page),
                write: Some(fast_page(write_bank, page)),
                flags: self.shadow_flags(write_bank, page, switches),
            };
            self.set(0, page, entry);
        }
    }

    /// Bank `$00` pages `$00-$01` and its language card space
    pub fn rebuild_altzp(&mut self, switches: &SoftswitchState) {
        let bank = switches.altzp as u8;
        for page in 0x00..=0x01 {
            self.set(0, page, PageEntry::ram(fast_page(bank, page), PageFlags::NONE));
        }
        self.build_language_card(0x00, bank, switches);
    }

    /// Bank `$01` pages `$00-$BF`
    fn build_aux_bank(&mut self, switches: &SoftswitchState) {
        for page in 0x00..=0xbf {
            let flags = self.shadow_flags(1, page, switches);
            self.set(1, page, PageEntry::ram(fast_page(1, page), flags));
        }
    }

    /// Pages `$C0-$FF` of all four banks carrying a language card
    pub fn rebuild_language_card(&mut self, switches: &SoftswitchState) {
        self.build_language_card(0x00, switches.altzp as u8, switches);
        self.build_language_card(0x01, 0x01, switches);
        self.build_language_card(0xe0, 0xe0, switches);
        self.build_language_card(0xe1, 0xe1, switches);
    }

    /// Everything the shadow register influences
    pub fn rebuild_shadow(&mut self, switches: &SoftswitchState) {
        self.rebuild_main(switches);
        self.build_aux_bank(switches);
        self.build_language_card(0x00, switches.altzp as u8, switches);
        self.build_language_card(0x01, 0x01, switches);
    }

    /// Map pages `$C0-$FF` of `dst_bank`, taking the RAM from `src_bank`
    pub fn build_language_card(&mut self, dst_bank: u8, src_bank: u8, switches: &SoftswitchState) {
        if dst_bank <= 1 && switches.shadow_inhibited(shadow::IOLC) {
            for page in 0xc0..=0xff {
                self.set(dst_bank, page, PageEntry::ram(ram_page(src_bank, page), PageFlags::NONE));
            }
            return;
        }
        let rom = &self.memory.rom;
        let rom_page = |page: u8| match rom.page_offset(0xff, page) {
            Some(offset) => PageRef::new(Arena::Rom, offset),
            None => PageRef::JUNK,
        };
        let mut entries = [PageEntry::INVALID; 0x40];
        entries[0] = PageEntry::IO;
        for page in 0xc1..=0xcfu8 {
            let slot = page & 0x0f;
            let card = match slot {
                3 => switches.slotc3rom && switches.card_installed(3),
                1..=6 => switches.card_installed(slot),
                _ => false,
            };
            entries[(page - 0xc0) as usize] = if card && !switches.intcxrom {
                PageEntry::INVALID
            } else {
                PageEntry::rom(rom_page(page))
            };
        }
        for page in 0xd0..=0xffu8 {
            let ram_src = if page < 0xe0 && !switches.lcbank2 {
                page - 0x10
            } else {
                page
            };
            let ram = ram_page(src_bank, ram_src);
            entries[(page - 0xc0) as usize] = PageEntry {
                read: if switches.lcread { ram } else { rom_page(page) },
                write: if switches.lcwrite { Some(ram) } else { None },
                flags: PageFlags::NONE,
            };
        }
        for (page, entry) in (0xc0..=0xffu8).zip(entries) {
            self.set(dst_bank, page, entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rom::{ROM01_SIZE, ROM03_SIZE};

    fn mmu(rom_size: usize, switches: &SoftswitchState) -> Mmu {
        let mut rom = vec![0u8; rom_size];
        // tag every ROM page with its bank so mappings can be told apart
        for (i, chunk) in rom.chunks_mut(0x100).enumerate() {
            chunk[0] = (i >> 8) as u8;
            chunk[1] = i as u8;
        }
        let memory = Memory::new(
            vec![0; FAST_RAM_MIN],
            vec![0; SLOW_RAM_SIZE],
            Rom::from_bytes(rom).unwrap(),
            vec![0; SAVE_RAM_SIZE],
        )
        .unwrap();
        Mmu::new(memory, switches)
    }

    fn read(mmu: &Mmu, bank: u8, addr: u16) -> u8 {
        let addr = Addr24::new(bank, addr);
        mmu.read_mapped(mmu.entry(addr), addr.low())
    }

    fn write(mmu: &mut Mmu, bank: u8, addr: u16, value: u8) {
        let addr = Addr24::new(bank, addr);
        mmu.write_mapped(mmu.entry(addr), addr.low(), value)
    }

    #[test]
    fn rejects_bad_buffers() {
        let build = |fast: usize, slow: usize, save: usize| {
            let rom = Rom::from_bytes(vec![0; ROM01_SIZE]).unwrap();
            Memory::new(vec![0; fast], vec![0; slow], rom, vec![0; save])
        };
        assert!(matches!(
            build(0x1_8000, SLOW_RAM_SIZE, SAVE_RAM_SIZE),
            Err(InitError::FastRamSize(0x1_8000))
        ));
        assert!(matches!(
            build(FAST_RAM_MAX + BANK_SIZE, SLOW_RAM_SIZE, SAVE_RAM_SIZE),
            Err(InitError::FastRamSize(_))
        ));
        assert!(matches!(
            build(FAST_RAM_MIN, 10, SAVE_RAM_SIZE),
            Err(InitError::SlowRamSize(10))
        ));
        assert!(matches!(
            build(FAST_RAM_MIN, SLOW_RAM_SIZE, 0),
            Err(InitError::SaveRamSize(0))
        ));
        assert!(build(FAST_RAM_MAX, SLOW_RAM_SIZE, SAVE_RAM_SIZE).is_ok());
    }

    #[test]
    fn static_map() {
        let mmu = mmu(ROM03_SIZE, &SoftswitchState::default());
        // 1 MiB of fast RAM covers banks $00-$0F
        assert!(!mmu.entry(Addr24::new(0x0f, 0)).flags.has(PageFlags::INVALID));
        assert_eq!(mmu.entry(Addr24::new(0x10, 0)), PageEntry::INVALID);
        assert_eq!(mmu.entry(Addr24::new(0xe2, 0)), PageEntry::INVALID);
        assert_eq!(read(&mmu, 0xfc, 0x0100), 0x00);
        assert_eq!(read(&mmu, 0xfc, 0x0101), 0x01);
        assert_eq!(read(&mmu, 0xff, 0xff00), 0x03);
        assert_eq!(read(&mmu, 0xff, 0xff01), 0xff);
        assert!(mmu.entry(Addr24::new(0xe1, 0x2000)).flags.has(PageFlags::SPECIAL));
        assert!(!mmu.entry(Addr24::new(0xe0, 0x6000)).flags.has(PageFlags::SPECIAL));
        assert!(mmu.entry(Addr24::new(0xe0, 0xc000)).flags.has(PageFlags::IO));
    }

    #[test]
    fn rom01_leaves_low_rom_banks_unmapped() {
        let mmu = mmu(ROM01_SIZE, &SoftswitchState::default());
        assert_eq!(mmu.entry(Addr24::new(0xfd, 0x1234)), PageEntry::INVALID);
        assert_eq!(read(&mmu, 0xfe, 0x0000), 0x00);
        assert_eq!(read(&mmu, 0xff, 0x0001), 0x00);
        assert_eq!(read(&mmu, 0xff, 0x0000), 0x01);
    }

    #[test]
    fn invalid_pages_read_zero_and_drop_writes() {
        let mut mmu = mmu(ROM01_SIZE, &SoftswitchState::default());
        write(&mut mmu, 0x40, 0x1234, 0x55);
        assert_eq!(read(&mmu, 0x40, 0x1234), 0);
        // ROM is not writable either
        write(&mut mmu, 0xff, 0x0000, 0x55);
        assert_eq!(read(&mmu, 0xff, 0x0000), 0x01);
    }

    #[test]
    fn shadowing_mirrors_into_slow_ram() {
        let mut switches = SoftswitchState::default();
        let mut mmu = mmu(ROM03_SIZE, &switches);
        write(&mut mmu, 0x00, 0x0400, 0xa0);
        assert_eq!(read(&mmu, 0xe0, 0x0400), 0xa0);
        assert_eq!(mmu.changed_pages()[0x04], 1);
        // super hires is inhibited at power on
        write(&mut mmu, 0x01, 0x6000, 0x11);
        assert_eq!(read(&mmu, 0xe1, 0x6000), 0);

        switches.shadow = shadow::TEXT1;
        mmu.rebuild_shadow(&switches);
        write(&mut mmu, 0x00, 0x0408, 0xa1);
        assert_eq!(read(&mmu, 0x00, 0x0408), 0xa1);
        assert_eq!(read(&mmu, 0xe0, 0x0408), 0);
        write(&mut mmu, 0x01, 0x6000, 0x11);
        assert_eq!(read(&mmu, 0xe1, 0x6000), 0x11);
        assert_eq!(mmu.changed_pages()[0x160], 1);
    }

    #[test]
    fn text2_shadowing_needs_rom03() {
        let mut mmu = mmu(ROM01_SIZE, &SoftswitchState::default());
        write(&mut mmu, 0x00, 0x0800, 0x42);
        assert_eq!(read(&mmu, 0xe0, 0x0800), 0);
        let mut mmu = self::mmu(ROM03_SIZE, &SoftswitchState::default());
        write(&mut mmu, 0x00, 0x0800, 0x42);
        assert_eq!(read(&mmu, 0xe0, 0x0800), 0x42);
    }

    #[test]
    fn aux_hires_inhibit() {
        let mut switches = SoftswitchState::new(0, shadow::SUPER_HIRES | shadow::AUX_HIRES);
        let mut mmu = mmu(ROM03_SIZE, &switches);
        write(&mut mmu, 0x01, 0x2000, 0x33);
        assert_eq!(read(&mmu, 0xe1, 0x2000), 0);
        write(&mut mmu, 0x00, 0x2000, 0x33);
        assert_eq!(read(&mmu, 0xe0, 0x2000), 0x33);
        switches.shadow = shadow::SUPER_HIRES;
        mmu.rebuild_shadow(&switches);
        write(&mut mmu, 0x01, 0x2000, 0x34);
        assert_eq!(read(&mmu, 0xe1, 0x2000), 0x34);
    }

    #[test]
    fn slot_rom_selection() {
        let mut switches = SoftswitchState::new(1 << 6, shadow::POWER_ON);
        let mut mmu = mmu(ROM03_SIZE, &switches);
        assert_eq!(mmu.entry(Addr24::new(0x00, 0xc600)), PageEntry::INVALID);
        assert_eq!(read(&mmu, 0x00, 0xc501), 0xc5);
        assert_eq!(read(&mmu, 0xe0, 0xc701), 0xc7);
        switches.intcxrom = true;
        mmu.rebuild_language_card(&switches);
        assert_eq!(read(&mmu, 0x00, 0xc601), 0xc6);
    }

    #[test]
    fn language_card_banks() {
        let mut switches = SoftswitchState::default();
        let mut mmu = mmu(ROM03_SIZE, &switches);
        // power on: ROM read, RAM write into bank 2
        write(&mut mmu, 0x00, 0xd000, 0x22);
        assert_eq!(read(&mmu, 0x00, 0xd001), 0xd0);
        switches.lcread = true;
        mmu.rebuild_language_card(&switches);
        assert_eq!(read(&mmu, 0x00, 0xd000), 0x22);
        switches.lcbank2 = false;
        mmu.rebuild_language_card(&switches);
        assert_eq!(read(&mmu, 0x00, 0xd000), 0);
        write(&mut mmu, 0x00, 0xd000, 0x11);
        assert_eq!(mmu.memory().arena(Arena::Fast)[0xc000], 0x11);
        switches.lcbank2 = true;
        mmu.rebuild_language_card(&switches);
        assert_eq!(read(&mmu, 0x00, 0xd000), 0x22);
    }

    #[test]
    fn iolc_inhibit_maps_plain_ram() {
        let switches = SoftswitchState::new(0, shadow::POWER_ON | shadow::IOLC);
        let mut mmu = mmu(ROM03_SIZE, &switches);
        assert!(!mmu.entry(Addr24::new(0x00, 0xc000)).flags.has(PageFlags::IO));
        write(&mut mmu, 0x01, 0xc080, 0x99);
        assert_eq!(read(&mmu, 0x01, 0xc080), 0x99);
        // the slow banks keep their I/O page
        assert!(mmu.entry(Addr24::new(0xe1, 0xc000)).flags.has(PageFlags::IO));
    }

    #[test]
    fn store80_follows_page2() {
        let mut switches = SoftswitchState::default();
        switches.store80 = true;
        switches.page2 = true;
        switches.ramrd = false;
        let mut mmu = mmu(ROM03_SIZE, &switches);
        write(&mut mmu, 0x00, 0x0400, 0x5a);
        assert_eq!(mmu.memory().arena(Arena::Fast)[0x1_0400], 0x5a);
        assert_eq!(read(&mmu, 0xe1, 0x0400), 0x5a);
        // hires only follows PAGE2 with HIRES on
        write(&mut mmu, 0x00, 0x2000, 0x5b);
        assert_eq!(mmu.memory().arena(Arena::Fast)[0x2000], 0x5b);
        switches.hires = true;
        mmu.rebuild_main(&switches);
        write(&mut mmu, 0x00, 0x2001, 0x5c);
        assert_eq!(mmu.memory().arena(Arena::Fast)[0x1_2001], 0x5c);
    }

    #[test]
    fn nmi_snapshot_copies_low_banks() {
        let mut mmu = mmu(ROM03_SIZE, &SoftswitchState::default());
        write(&mut mmu, 0x00, 0x0300, 0x12);
        write(&mut mmu, 0x01, 0x0300, 0x34);
        mmu.snapshot_banks();
        assert_eq!(mmu.save_ram()[0x0300], 0x12);
        assert_eq!(mmu.save_ram()[0x1_0300], 0x34);
    }
}
