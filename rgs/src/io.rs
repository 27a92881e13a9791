//! Dispatch of the `$C000-$C0FF` I/O window
//!
//! Both tables are filled while the [`Device`] is being built and stay
//! fixed afterwards. Offsets nobody claimed read as zero and swallow writes.

use crate::{backend::Backend, device::Device};

/// A handler gets the offset into the I/O window and, for writes, the
/// written value. Reads are passed `0`; the return value of a write
/// handler is ignored.
pub type IoHandler<B> = fn(&mut Device<B>, u8, u8) -> u8;

pub enum IoEntry<B> {
    Unimplemented,
    Handler(IoHandler<B>),
}

impl<B> Clone for IoEntry<B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B> Copy for IoEntry<B> {}

impl<B> core::fmt::Debug for IoEntry<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            Self::Unimplemented => f.write_str("Unimplemented"),
            Self::Handler(_) => f.write_str("Handler"),
        }
    }
}

impl<B> IoEntry<B> {
    pub const fn is_handler(&self) -> bool {
        matches!(self, Self::Handler(_))
    }
}

pub struct IoTables<B> {
    read: [IoEntry<B>; 0x100],
    write: [IoEntry<B>; 0x100],
}

impl<B> IoTables<B> {
    pub(crate) fn new() -> Self {
        Self {
            read: [IoEntry::Unimplemented; 0x100],
            write: [IoEntry::Unimplemented; 0x100],
        }
    }

    /// Bind both directions of `offset`
    pub fn register(&mut self, offset: u8, read: IoHandler<B>, write: IoHandler<B>) {
        self.register_read(offset, read);
        self.register_write(offset, write);
    }

    pub fn register_read(&mut self, offset: u8, handler: IoHandler<B>) {
        if self.read[offset as usize].is_handler() {
            log::debug!("read handler for $C0{:02X} replaced", offset);
        }
        self.read[offset as usize] = IoEntry::Handler(handler)
    }

    pub fn register_write(&mut self, offset: u8, handler: IoHandler<B>) {
        if self.write[offset as usize].is_handler() {
            log::debug!("write handler for $C0{:02X} replaced", offset);
        }
        self.write[offset as usize] = IoEntry::Handler(handler)
    }

    pub fn read_entry(&self, offset: u8) -> IoEntry<B> {
        self.read[offset as usize]
    }

    pub fn write_entry(&self, offset: u8) -> IoEntry<B> {
        self.write[offset as usize]
    }
}

impl<B> core::fmt::Debug for IoTables<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let count = |table: &[IoEntry<B>]| table.iter().filter(|e| e.is_handler()).count();
        f.debug_struct("IoTables")
            .field("read_handlers", &count(&self.read))
            .field("write_handlers", &count(&self.write))
            .finish()
    }
}

impl<B: Backend> Device<B> {
    pub fn dispatch_read(&mut self, offset: u8) -> u8 {
        match self.io.read_entry(offset) {
            IoEntry::Handler(handler) => handler(self, offset, 0),
            IoEntry::Unimplemented => {
                log::trace!("read from unimplemented I/O location $C0{:02X}", offset);
                0
            }
        }
    }

    pub fn dispatch_write(&mut self, offset: u8, value: u8) {
        match self.io.write_entry(offset) {
            IoEntry::Handler(handler) => {
                handler(self, offset, value);
            }
            IoEntry::Unimplemented => {
                log::trace!(
                    "write of ${:02X} to unimplemented I/O location $C0{:02X}",
                    value,
                    offset
                );
            }
        }
    }
}
