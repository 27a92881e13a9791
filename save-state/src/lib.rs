//! Binary snapshot helpers for the `rgs` machine state
//!
//! Every value is written in little-endian order without any framing;
//! the reader has to know the layout, which is given by the order of
//! the `serialize` calls.


#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SaveStateError {
    #[error("not enough data to deserialize (needed {needed} more bytes, got {got})")]
    Truncated { needed: usize, got: usize },
    #[error("unknown discriminant {value} for `{ty}`")]
    InvalidDiscriminant { ty: &'static str, value: u8 },
    #[error("length mismatch for `{what}` (expected {expected}, got {got})")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("trailing data after save state ({0} bytes)")]
    TrailingData(usize),
}

pub type Result<T> = core::result::Result<T, SaveStateError>;

#[derive(Debug, Default)]
pub struct SaveStateSerializer {
    pub data: Vec<u8>,
}

impl SaveStateSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> Vec<u8> {
        self.data
    }
}

pub struct SaveStateDeserializer<'a> {
    pub data: core::slice::Iter<'a, u8>,
}

impl<'a> SaveStateDeserializer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data: data.iter() }
    }

    pub fn consume(&mut self, n: usize) {
        if n > 0 {
            let _ = self.data.nth(n - 1);
        }
    }

    /// Borrow the next `n` bytes and advance past them
    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let rest = self.data.as_slice();
        if rest.len() < n {
            return Err(SaveStateError::Truncated {
                needed: n,
                got: rest.len(),
            });
        }
        self.consume(n);
        Ok(&rest[..n])
    }

    /// Fails if any unread bytes remain
    pub fn finish(self) -> Result<()> {
        match self.data.as_slice().len() {
            0 => Ok(()),
            n => Err(SaveStateError::TrailingData(n)),
        }
    }
}

pub trait InSaveState: Sized {
    fn serialize(&self, state: &mut SaveStateSerializer);
    fn deserialize(&mut self, state: &mut SaveStateDeserializer) -> Result<()>;
}

macro_rules! impl_for_int {
    ($t:ty) => {
        impl InSaveState for $t {
            fn serialize(&self, state: &mut SaveStateSerializer) {
                state.data.extend_from_slice(&self.to_le_bytes())
            }

            fn deserialize(&mut self, state: &mut SaveStateDeserializer) -> Result<()> {
                let mut bytes = [0u8; core::mem::size_of::<$t>()];
                bytes.copy_from_slice(state.take(core::mem::size_of::<$t>())?);
                *self = Self::from_le_bytes(bytes);
                Ok(())
            }
        }
    };
    () => {};
    ($t1:ty $(,$t:ty)*) => { impl_for_int!($t1); impl_for_int!($($t),*); };
}

impl_for_int! { u8, u16, u32, u64 }

/// Lengths are stored as `u64` whatever the host's pointer width
impl InSaveState for usize {
    fn serialize(&self, state: &mut SaveStateSerializer) {
        (*self as u64).serialize(state)
    }

    fn deserialize(&mut self, state: &mut SaveStateDeserializer) -> Result<()> {
        let mut i: u64 = 0;
        i.deserialize(state)?;
        *self = i as usize;
        Ok(())
    }
}

// This uses 0 and 255 for false and true. That will make the memory
// representation more robust against memory corruption by random
// bit flips.
impl InSaveState for bool {
    fn serialize(&self, state: &mut SaveStateSerializer) {
        let i: u8 = if *self { 0xff } else { 0 };
        i.serialize(state)
    }

    fn deserialize(&mut self, state: &mut SaveStateDeserializer) -> Result<()> {
        let mut i: u8 = 0;
        i.deserialize(state)?;
        *self = i.count_ones() >= 4;
        Ok(())
    }
}

/// RAM arenas are fixed-size; the stored length has to match the
/// length of the buffer being restored into.
impl InSaveState for Box<[u8]> {
    fn serialize(&self, state: &mut SaveStateSerializer) {
        self.len().serialize(state);
        state.data.extend_from_slice(self)
    }

    fn deserialize(&mut self, state: &mut SaveStateDeserializer) -> Result<()> {
        let mut n: usize = 0;
        n.deserialize(state)?;
        if n != self.len() {
            return Err(SaveStateError::LengthMismatch {
                what: "byte buffer",
                expected: self.len(),
                got: n,
            });
        }
        self.copy_from_slice(state.take(n)?);
        Ok(())
    }
}
