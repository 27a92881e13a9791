//! Hooks for the peripherals living outside of the core

use crate::io::IoTables;

/// The host side of a [`Device`](crate::device::Device): disk, sound,
/// video and input emulation
pub trait Backend: Sized {
    /// Claim locations of the I/O window. This is called once while the
    /// device is built, after the core registered its own softswitches,
    /// so a backend can take over any of them.
    fn register_io(io: &mut IoTables<Self>) {
        let _ = io;
    }
}

/// A backend without any peripherals
#[derive(Debug, Default, Clone, Copy)]
pub struct Dummy;

impl Backend for Dummy {}
