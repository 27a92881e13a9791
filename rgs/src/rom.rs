//! System ROM images
//!
//! The firmware revision is told apart by the image size alone: ROM 01
//! is 128 KiB and lives in banks `$FE-$FF`, ROM 03 is 256 KiB and lives
//! in banks `$FC-$FF`.

pub const ROM01_SIZE: usize = 0x2_0000;
pub const ROM03_SIZE: usize = 0x4_0000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReadRomError {
    #[error("the ROM image is empty")]
    Empty,
    #[error(
        "unsupported ROM image size of {0} bytes (expected {} for ROM 01 or {} for ROM 03)",
        ROM01_SIZE,
        ROM03_SIZE
    )]
    UnsupportedSize(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RomVersion {
    Rom01,
    Rom03,
}

impl RomVersion {
    pub const fn from_size(size: usize) -> Option<Self> {
        match size {
            ROM01_SIZE => Some(Self::Rom01),
            ROM03_SIZE => Some(Self::Rom03),
            _ => None,
        }
    }

    pub const fn number(self) -> u8 {
        match self {
            Self::Rom01 => 1,
            Self::Rom03 => 3,
        }
    }

    pub const fn size(self) -> usize {
        match self {
            Self::Rom01 => ROM01_SIZE,
            Self::Rom03 => ROM03_SIZE,
        }
    }

    /// The lowest bank the image is mapped into
    pub const fn first_bank(self) -> u8 {
        (0x100 - (self.size() >> 16)) as u8
    }

    /// The first page of the address space the image is mapped to
    pub const fn base_page(self) -> u16 {
        (self.first_bank() as u16) << 8
    }
}

#[derive(Debug, Clone)]
pub struct Rom {
    data: Box<[u8]>,
    version: RomVersion,
}

impl Rom {
    pub fn from_bytes(data: impl Into<Box<[u8]>>) -> Result<Self, ReadRomError> {
        let data = data.into();
        if data.is_empty() {
            return Err(ReadRomError::Empty);
        }
        let version =
            RomVersion::from_size(data.len()).ok_or(ReadRomError::UnsupportedSize(data.len()))?;
        log::info!(
            "detected ROM {:02} image, mapped from bank ${:02X}",
            version.number(),
            version.first_bank()
        );
        Ok(Self { data, version })
    }

    pub const fn version(&self) -> RomVersion {
        self.version
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Offset into the image of the page `page` in bank `bank`, if the
    /// image covers that bank
    pub const fn page_offset(&self, bank: u8, page: u8) -> Option<u32> {
        let first = self.version.first_bank();
        if bank < first {
            None
        } else {
            Some((((bank - first) as u32) << 16) | ((page as u32) << 8))
        }
    }
}
