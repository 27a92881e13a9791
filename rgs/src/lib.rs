//! Core of an Apple IIgs-style machine: a 65816 instruction engine, the
//! paged memory map and the `$C0xx` I/O window.
//!
//! Peripherals are not part of this crate. They plug in through a
//! [`backend::Backend`] that claims locations of the I/O window and drive
//! the interrupt lines of the [`device::Device`].

pub mod addressing;
pub mod alu;
pub mod backend;
pub mod config;
pub mod cpu;
pub mod device;
pub mod instr;
pub mod interrupt;
pub mod io;
pub mod mmu;
pub mod registers;
pub mod rom;
pub mod softswitch;
pub mod timing;
