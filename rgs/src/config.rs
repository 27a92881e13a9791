//! Host side machine configuration
//!
//! ```toml
//! fast-ram = 4      # MiB, 1 to 8
//! cards = [5, 6]    # slots served by peripheral cards
//! shadow = 0x08     # initial shadow register
//! ```

use crate::{
    mmu::{InitError, Memory, BANK_SIZE, SAVE_RAM_SIZE, SLOW_RAM_SIZE},
    rom::Rom,
    softswitch::{shadow, SoftswitchState},
};
use std::path::{Path, PathBuf};
use toml::value::{Table, Value};

static CONFIG_FILE_PATHS: &[(bool, &str)] = &[
    (true, ".config/rgs/config.toml"),
    (true, ".config/rgs.toml"),
    (false, "/etc/rgs.toml"),
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("unable to read config file ({0})")]
    Io(#[from] std::io::Error),
    #[error("config file parsing error: {0}")]
    De(#[from] toml::de::Error),
    #[error("expected type `{expected}`, got `{got}`")]
    WrongType {
        expected: &'static str,
        got: &'static str,
    },
    #[error("unknown field `{0}`")]
    UnknownField(String),
    #[error("value {value} out of range for field `{field}`")]
    OutOfRange { field: &'static str, value: i64 },
}

macro_rules! getval {
    ($val:expr, $ty:ident) => {
        match $val {
            Value::$ty(val) => Ok(val),
            val => Err(ConfigLoadError::WrongType {
                expected: stringify!($ty),
                got: val.type_str(),
            }),
        }
    };
}

fn get_ranged(
    val: &Value,
    field: &'static str,
    range: core::ops::RangeInclusive<i64>,
) -> Result<u8, ConfigLoadError> {
    let value = *getval!(val, Integer)?;
    if range.contains(&value) {
        Ok(value as u8)
    } else {
        Err(ConfigLoadError::OutOfRange { field, value })
    }
}

fn zeroed(what: &'static str, size: usize) -> Result<Box<[u8]>, InitError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(size)
        .map_err(|_| InitError::Allocation { what, size })?;
    buf.resize(size, 0);
    Ok(buf.into_boxed_slice())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Fast RAM in MiB
    pub fast_ram_mib: u8,
    /// Slots `1..=7` with a peripheral card
    pub cards: Vec<u8>,
    pub shadow: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fast_ram_mib: 4,
            cards: Vec::new(),
            shadow: shadow::POWER_ON,
        }
    }
}

impl Config {
    /// Load `path`, or the first config file found in the default
    /// locations. Without any file the defaults are used.
    pub fn load(path: Option<PathBuf>) -> Result<Self, ConfigLoadError> {
        if let Some(path) = path.or_else(Self::seek_config_path) {
            log::info!("loading config file `{}`", path.display());
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        Self::from_str(&std::fs::read_to_string(path)?)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigLoadError> {
        let main: Table = toml::de::from_str(content)?;
        let mut slf = Self::default();
        for (key, val) in main.iter() {
            match key.as_str() {
                "fast-ram" => slf.fast_ram_mib = get_ranged(val, "fast-ram", 1..=8)?,
                "cards" => {
                    slf.cards = getval!(val, Array)?
                        .iter()
                        .map(|slot| get_ranged(slot, "cards", 1..=7))
                        .collect::<Result<_, _>>()?;
                    slf.cards.sort_unstable();
                    slf.cards.dedup();
                }
                "shadow" => slf.shadow = get_ranged(val, "shadow", 0..=0xff)?,
                _ => return Err(ConfigLoadError::UnknownField(key.clone())),
            }
        }
        Ok(slf)
    }

    pub fn seek_config_path() -> Option<PathBuf> {
        CONFIG_FILE_PATHS
            .iter()
            .filter_map(|&(with_home, path)| {
                if with_home {
                    std::env::var_os("HOME").map(|home| Path::new(&home).join(path))
                } else {
                    Some(PathBuf::from(path))
                }
            })
            .find(|path| path.is_file())
    }

    /// Value of the `$C02D` slot register
    pub fn slot_register(&self) -> u8 {
        self.cards.iter().fold(0, |reg, slot| reg | (1 << slot))
    }

    pub fn fast_ram_size(&self) -> usize {
        usize::from(self.fast_ram_mib) * 16 * BANK_SIZE
    }

    pub fn softswitches(&self) -> SoftswitchState {
        SoftswitchState::new(self.slot_register(), self.shadow)
    }

    /// Allocate zeroed RAM buffers for `rom`
    pub fn allocate_memory(&self, rom: Rom) -> Result<Memory, InitError> {
        Memory::new(
            zeroed("fast RAM", self.fast_ram_size())?,
            zeroed("slow RAM", SLOW_RAM_SIZE)?,
            rom,
            zeroed("save RAM", SAVE_RAM_SIZE)?,
        )
    }
}
