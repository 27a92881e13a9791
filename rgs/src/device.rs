//! The Apple IIgs-style machine core: CPU, MMU and I/O window

use crate::{
    backend::Backend,
    config::Config,
    cpu::{Cpu, Regs},
    interrupt::Interrupts,
    io::IoTables,
    mmu::{InitError, Memory, Mmu, PageFlags},
    registers::register_softswitches,
    rom::Rom,
    softswitch::SoftswitchState,
    timing::RunState,
};
use save_state::{InSaveState, SaveStateDeserializer, SaveStateError, SaveStateSerializer};
use save_state_macro::*;

/// The 24-bit address type used
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, InSaveState)]
pub struct Addr24 {
    pub bank: u8,
    pub addr: u16,
}

/// How a multi-byte access continues after its first byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wrap {
    /// carry into the bank byte (data bank accesses)
    Linear,
    /// stay inside the bank (program fetches, direct page, stack)
    Bank,
    /// stay inside the 256-byte page (emulation mode direct page)
    Page,
}

impl Addr24 {
    pub const fn new(bank: u8, addr: u16) -> Self {
        Self { bank, addr }
    }

    pub const fn from_u32(val: u32) -> Self {
        Self::new((val >> 16) as u8, (val & 0xffff) as u16)
    }

    pub const fn to_u32(self) -> u32 {
        ((self.bank as u32) << 16) | self.addr as u32
    }

    /// The page number within the whole 24-bit address space
    pub const fn page(self) -> usize {
        (self.to_u32() >> 8) as usize
    }

    pub const fn low(self) -> u8 {
        (self.addr & 0xff) as u8
    }

    pub const fn offset(self, n: u16, wrap: Wrap) -> Self {
        match wrap {
            Wrap::Linear => Self::from_u32(self.to_u32().wrapping_add(n as u32) & 0xff_ffff),
            Wrap::Bank => Self::new(self.bank, self.addr.wrapping_add(n)),
            Wrap::Page => Self::new(
                self.bank,
                (self.addr & 0xff00) | (self.addr.wrapping_add(n) & 0xff),
            ),
        }
    }
}

impl std::fmt::Display for Addr24 {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:02x}:{:04x}", self.bank, self.addr)
    }
}

pub trait Data: std::fmt::Debug + Sized + Default + Clone + Copy {
    type Arr: AsRef<[u8]> + AsMut<[u8]> + Default + std::fmt::Debug + Clone + Copy;
    fn to_bytes(self) -> Self::Arr;
    fn from_bytes(bytes: &Self::Arr) -> Self;
}

impl Data for u8 {
    type Arr = [u8; 1];
    fn to_bytes(self) -> [u8; 1] {
        [self]
    }
    fn from_bytes(bytes: &[u8; 1]) -> Self {
        bytes[0]
    }
}

impl Data for u16 {
    type Arr = [u8; 2];
    fn to_bytes(self) -> [u8; 2] {
        self.to_le_bytes()
    }
    fn from_bytes(bytes: &[u8; 2]) -> Self {
        u16::from_le_bytes(*bytes)
    }
}

impl Data for Addr24 {
    type Arr = [u8; 3];
    fn to_bytes(self) -> [u8; 3] {
        let bytes = self.addr.to_le_bytes();
        [bytes[0], bytes[1], self.bank]
    }
    fn from_bytes(bytes: &[u8; 3]) -> Self {
        Self::new(bytes[2], u16::from_le_bytes([bytes[0], bytes[1]]))
    }
}

#[derive(Debug)]
pub struct Device<B> {
    pub(crate) cpu: Cpu,
    pub(crate) mmu: Mmu,
    pub(crate) switches: SoftswitchState,
    pub(crate) io: IoTables<B>,
    pub(crate) interrupts: Interrupts,
    pub(crate) run_state: RunState,
    pub(crate) total_cycles: u64,
    pub backend: B,
}

impl<B: Backend> Device<B> {
    /// Build a powered-on machine from already validated backing storage.
    ///
    /// The I/O window is populated here, first with the memory-management
    /// softswitches and then with the backend's handlers; it is never
    /// changed afterwards.
    pub fn new(backend: B, memory: Memory, switches: SoftswitchState) -> Self {
        let mut io = IoTables::new();
        register_softswitches(&mut io);
        B::register_io(&mut io);
        let mmu = Mmu::new(memory, &switches);
        let mut device = Self {
            cpu: Cpu::new(),
            mmu,
            switches,
            io,
            interrupts: Interrupts::new(),
            run_state: RunState::Running,
            total_cycles: 0,
            backend,
        };
        device.reset();
        device
    }

    /// Allocate the backing storage described by `config` and build the machine
    pub fn with_config(backend: B, config: &Config, rom: Rom) -> Result<Self, InitError> {
        let memory = config.allocate_memory(rom)?;
        Ok(Self::new(backend, memory, config.softswitches()))
    }

    /// Perform a hardware reset: memory switches go back to their power-on
    /// values, pending edge interrupts are dropped and the CPU fetches the
    /// reset vector. Devices still asserting IRQ keep doing so.
    pub fn reset(&mut self) {
        self.switches.reset();
        self.mmu.rebuild_all(&self.switches);
        self.interrupts.clear_latches();
        self.run_state = RunState::Running;

        let regs = &mut self.cpu.regs;
        regs.status = crate::cpu::Status::RESET_DEFAULT;
        regs.is_emulation = true;
        regs.dp = 0;
        regs.db = 0;
        regs.sp = 0x1ff;
        regs.pc.bank = 0;
        self.cpu.mode_switch();
        self.cpu.regs.pc.addr = self.read(Addr24::new(0, 0xfffc), Wrap::Bank);
        log::info!("reset, starting at {}", self.cpu.regs.pc);
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn regs(&self) -> &Regs {
        &self.cpu.regs
    }

    /// Mutable register access for debuggers and tests. Call
    /// [`Cpu::mode_switch`] after touching the E, M or X flags.
    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    pub fn switches(&self) -> &SoftswitchState {
        &self.switches
    }

    pub fn mmu(&self) -> &Mmu {
        &self.mmu
    }

    pub const fn run_state(&self) -> RunState {
        self.run_state
    }

    pub const fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    /// Per slow-RAM page bitmask of 8-byte blocks changed since the
    /// consumer last cleared them
    pub fn changed_pages(&self) -> &[u32] {
        self.mmu.changed_pages()
    }

    pub fn clear_changed(&mut self, page: usize, mask: u32) {
        self.mmu.clear_changed(page, mask)
    }

    /// Banks $00/$01 as they were when the last NMI got serviced
    pub fn save_ram(&self) -> &[u8] {
        self.mmu.save_ram()
    }

    /// Read one byte from the mapped memory, running I/O handlers
    pub fn read_byte(&mut self, addr: Addr24) -> u8 {
        let entry = self.mmu.entry(addr);
        if entry.flags.has(PageFlags::IO) {
            self.dispatch_read(addr.low())
        } else {
            self.mmu.read_mapped(entry, addr.low())
        }
    }

    /// Write one byte to the mapped memory, running I/O handlers
    pub fn write_byte(&mut self, addr: Addr24, value: u8) {
        let entry = self.mmu.entry(addr);
        if entry.flags.has(PageFlags::IO) {
            self.dispatch_write(addr.low(), value)
        } else {
            self.mmu.write_mapped(entry, addr.low(), value)
        }
    }

    /// Read a value from the mapped memory at the specified address.
    pub fn read<D: Data>(&mut self, addr: Addr24, wrap: Wrap) -> D {
        let mut arr = D::Arr::default();
        for (i, d) in arr.as_mut().iter_mut().enumerate() {
            *d = self.read_byte(addr.offset(i as u16, wrap));
        }
        D::from_bytes(&arr)
    }

    /// Write a value to the mapped memory at the specified address.
    pub fn write<D: Data>(&mut self, addr: Addr24, value: D, wrap: Wrap) {
        for (i, d) in value.to_bytes().as_ref().iter().enumerate() {
            self.write_byte(addr.offset(i as u16, wrap), *d);
        }
    }

    /// Fetch a value from the program counter memory region
    pub fn load<D: Data>(&mut self) -> D {
        let val = self.read::<D>(self.cpu.regs.pc, Wrap::Bank);
        let len = core::mem::size_of::<D::Arr>() as u16;
        // yes, an overflow on addr does not carry the bank
        self.cpu.regs.pc.addr = self.cpu.regs.pc.addr.wrapping_add(len);
        val
    }

    /// Push data on the stack
    pub fn push<D: Data>(&mut self, val: D) {
        for d in val.to_bytes().as_ref().iter().rev() {
            self.write_byte(Addr24::new(0, self.cpu.regs.sp), *d);
            self.cpu.regs.sp = self.cpu.regs.sp.wrapping_sub(1);
            if self.cpu.regs.is_emulation {
                self.cpu.regs.sp = (self.cpu.regs.sp & 0xff) | 0x100
            }
        }
    }

    /// Pull data from the stack
    pub fn pull<D: Data>(&mut self) -> D {
        let mut arr = D::Arr::default();
        for d in arr.as_mut() {
            self.cpu.regs.sp = self.cpu.regs.sp.wrapping_add(1);
            if self.cpu.regs.is_emulation {
                self.cpu.regs.sp = (self.cpu.regs.sp & 0xff) | 0x100
            }
            *d = self.read_byte(Addr24::new(0, self.cpu.regs.sp));
        }
        D::from_bytes(&arr)
    }

    /// Serialize the CPU, interrupt latch, softswitches and all RAM.
    /// The ROM image and the I/O tables are not part of a save state.
    pub fn save_state(&self) -> Vec<u8> {
        let mut state = SaveStateSerializer::new();
        self.cpu.serialize(&mut state);
        self.switches.serialize(&mut state);
        self.interrupts.serialize(&mut state);
        self.run_state.serialize(&mut state);
        self.total_cycles.serialize(&mut state);
        self.mmu.memory().serialize(&mut state);
        state.finish()
    }

    /// Restore a state produced by [`Device::save_state`]. On error the
    /// device is left untouched.
    pub fn load_state(&mut self, data: &[u8]) -> Result<(), SaveStateError> {
        let mut state = SaveStateDeserializer::new(data);
        let mut cpu = self.cpu.clone();
        let mut switches = self.switches.clone();
        let mut interrupts = self.interrupts.clone();
        let mut run_state = self.run_state;
        let mut total_cycles = self.total_cycles;
        let mut memory = self.mmu.memory().clone();
        cpu.deserialize(&mut state)?;
        switches.deserialize(&mut state)?;
        interrupts.deserialize(&mut state)?;
        run_state.deserialize(&mut state)?;
        total_cycles.deserialize(&mut state)?;
        memory.deserialize(&mut state)?;
        state.finish()?;

        cpu.mode_switch();
        self.cpu = cpu;
        self.switches = switches;
        self.interrupts = interrupts;
        self.run_state = run_state;
        self.total_cycles = total_cycles;
        self.mmu.replace_memory(memory, &self.switches);
        Ok(())
    }
}
