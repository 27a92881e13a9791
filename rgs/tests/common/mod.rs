//! Helpers shared by the integration tests

#![allow(dead_code)]

use rgs::{
    backend::Dummy,
    config::Config,
    device::{Addr24, Device},
    rom::{Rom, ROM01_SIZE},
};

/// Where the reset vector points; test programs are placed here
pub const ENTRY: u16 = 0x1000;
pub const IRQ_HANDLER: u16 = 0x2000;
pub const NMI_HANDLER: u16 = 0x2100;
pub const BRK_HANDLER: u16 = 0x2200;
pub const COP_HANDLER: u16 = 0x2300;
pub const ABORT_HANDLER: u16 = 0x2400;

/// Vector table of the test ROMs, both native and emulation entries
pub const VECTORS: &[(u16, u16)] = &[
    (0xffe4, COP_HANDLER),
    (0xffe6, BRK_HANDLER),
    (0xffe8, ABORT_HANDLER),
    (0xffea, NMI_HANDLER),
    (0xffee, IRQ_HANDLER),
    (0xfff4, COP_HANDLER),
    (0xfff8, ABORT_HANDLER),
    (0xfffa, NMI_HANDLER),
    (0xfffc, ENTRY),
    (0xfffe, IRQ_HANDLER),
];

/// A ROM image of `size` bytes whose last bank carries `vectors`
pub fn rom_image(size: usize, vectors: &[(u16, u16)]) -> Vec<u8> {
    let mut image = vec![0u8; size];
    for &(vector, target) in vectors {
        let at = size - 0x1_0000 + vector as usize;
        image[at..at + 2].copy_from_slice(&target.to_le_bytes());
    }
    image
}

pub fn rom() -> Rom {
    Rom::from_bytes(rom_image(ROM01_SIZE, VECTORS)).unwrap()
}

pub fn config() -> Config {
    Config {
        fast_ram_mib: 1,
        ..Config::default()
    }
}

/// A freshly reset machine with 1 MiB fast RAM and a ROM 01 image
pub fn device() -> Device<Dummy> {
    Device::with_config(Dummy, &config(), rom()).unwrap()
}

/// Copy `code` into bank `$00` at `addr`
pub fn load_program(device: &mut Device<Dummy>, addr: u16, code: &[u8]) {
    for (i, byte) in code.iter().enumerate() {
        device.write_byte(Addr24::new(0, addr + i as u16), *byte);
    }
}

/// A machine that starts executing `code` at [`ENTRY`] in emulation mode
pub fn device_with_program(code: &[u8]) -> Device<Dummy> {
    let mut device = device();
    load_program(&mut device, ENTRY, code);
    device
}

/// Prefix switching the CPU to native mode with the given M and X flags
pub fn native(m8: bool, x8: bool) -> Vec<u8> {
    let mut flags = 0;
    if !m8 {
        flags |= 0x20
    }
    if !x8 {
        flags |= 0x10
    }
    // CLC; XCE; REP #flags
    vec![0x18, 0xfb, 0xc2, flags]
}

/// Execute `n` instructions, returning the cycles they took
pub fn steps(device: &mut Device<Dummy>, n: usize) -> u32 {
    (0..n).map(|_| device.step().unwrap()).sum()
}

pub fn peek(device: &mut Device<Dummy>, bank: u8, addr: u16) -> u8 {
    device.read_byte(Addr24::new(bank, addr))
}
