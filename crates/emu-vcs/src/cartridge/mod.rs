//! Cartridge attachment: loading, mapper fingerprinting and dispatch.
//!
//! A ROM file carries no header; the banking scheme is identified by a
//! fingerprint over the image bytes — instruction patterns for the
//! bus-snooping boards, characteristic three-byte stores for Parker Bros,
//! plain file length for the Supercharger — falling back to a size-based
//! dispatch. File extensions can force a mapper and bypass the heuristics.

mod atari;
mod cbs;
mod dpc;
mod fe;
mod harmony;
mod mapper;
mod mnetwork;
mod parkerbros;
mod supercharger;
mod tigervision;

pub use atari::Atari;
pub use cbs::Cbs;
pub use dpc::Dpc;
pub use fe::Fe;
pub use harmony::DpcPlus;
pub use mapper::{BankDetails, CartridgeError, Ejected, Mapper};
pub use mnetwork::MNetwork;
pub use parkerbros::ParkerBros;
pub use supercharger::Supercharger;
pub use tigervision::Tigervision;

use sha1::{Digest, Sha1};

/// Describes a cartridge to attach: the image bytes, the filename it came
/// from and a mapping hint. An empty hint or "AUTO" means fingerprint;
/// otherwise the hint must be a mapper ID (taken from the file extension
/// by [`Loader::new`], with ".BIN" and ".A26" meaning auto).
#[derive(Debug, Clone, Default)]
pub struct Loader {
    pub filename: String,
    pub mapping: String,
    pub data: Vec<u8>,
}

impl Loader {
    /// Build a loader from raw bytes, deriving the mapping hint from the
    /// filename extension unless one is given.
    #[must_use]
    pub fn new(filename: &str, mapping: &str, data: Vec<u8>) -> Self {
        let mapping = mapping.trim().to_uppercase();
        let mapping = if mapping.is_empty() || mapping == "AUTO" {
            match filename
                .rsplit('.')
                .next()
                .map(str::to_uppercase)
                .as_deref()
            {
                Some("2K" | "4K" | "F8" | "F6" | "F4" | "FA" | "FE" | "E0" | "E7" | "3F" | "3E"
                | "AR" | "DPC" | "SC") => {
                    filename.rsplit('.').next().unwrap().to_uppercase()
                }
                Some("DP+") => "DPC+".to_string(),
                _ => "AUTO".to_string(),
            }
        } else {
            mapping
        };

        Self {
            filename: filename.to_string(),
            mapping,
            data,
        }
    }

    /// SHA-1 of the image, as recorded for regression and playback
    /// identification.
    #[must_use]
    pub fn hash(&self) -> String {
        let mut hasher = Sha1::new();
        hasher.update(&self.data);
        let digest = hasher.finalize();
        digest.iter().map(|b| format!("{b:02x}")).collect()
    }
}

/// The attached cartridge: a fingerprinted mapper plus identification.
pub struct Cartridge {
    mapper: Box<dyn Mapper>,
    filename: String,
    hash: String,
}

impl Cartridge {
    /// The empty slot.
    #[must_use]
    pub fn ejected() -> Self {
        Self {
            mapper: Box::new(Ejected),
            filename: String::new(),
            hash: String::new(),
        }
    }

    /// Attach a cartridge, choosing the mapper from the loader's hint or
    /// by fingerprinting the image.
    pub fn attach(loader: &Loader) -> Result<Self, CartridgeError> {
        let mapper = match loader.mapping.as_str() {
            "AUTO" => fingerprint(&loader.data)?,
            hint => from_hint(hint, &loader.data)?,
        };
        Ok(Self {
            mapper,
            filename: loader.filename.clone(),
            hash: loader.hash(),
        })
    }

    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    #[must_use]
    pub fn hash(&self) -> &str {
        &self.hash
    }

    #[must_use]
    pub fn id(&self) -> &'static str {
        self.mapper.id()
    }

    pub fn mapper(&mut self) -> &mut dyn Mapper {
        self.mapper.as_mut()
    }

    #[must_use]
    pub fn mapper_ref(&self) -> &dyn Mapper {
        self.mapper.as_ref()
    }

    /// Deep copy for snapshots.
    #[must_use]
    pub fn snapshot(&self) -> Self {
        Self {
            mapper: self.mapper.snapshot(),
            filename: self.filename.clone(),
            hash: self.hash.clone(),
        }
    }
}

fn from_hint(hint: &str, data: &[u8]) -> Result<Box<dyn Mapper>, CartridgeError> {
    Ok(match hint {
        "2K" => Box::new(Atari::new_2k(data)?),
        "4K" => Box::new(Atari::new_4k(data)?),
        "F8" => Box::new(Atari::new_f8(data)?),
        "F6" => Box::new(Atari::new_f6(data)?),
        "F4" => Box::new(Atari::new_f4(data)?),
        "SC" => {
            // explicit Superchip request on the matching Atari board
            let mut cart = match data.len() {
                8192 => Atari::new_f8(data)?,
                16384 => Atari::new_f6(data)?,
                32768 => Atari::new_f4(data)?,
                len => return Err(CartridgeError::UnrecognisedSize(len)),
            };
            cart.add_superchip();
            Box::new(cart)
        }
        "FA" => Box::new(Cbs::new(data)?),
        "FE" => Box::new(Fe::new(data)?),
        "E0" => Box::new(ParkerBros::new(data)?),
        "E7" => Box::new(MNetwork::new(data)?),
        "3F" => Box::new(Tigervision::new_3f(data)?),
        "3E" => Box::new(Tigervision::new_3e(data)?),
        "AR" => Box::new(Supercharger::new(data)?),
        "DPC" => Box::new(Dpc::new(data)?),
        "DPC+" => Box::new(DpcPlus::new(data)?),
        _ => return Err(CartridgeError::UnknownMapping(hint.to_string())),
    })
}

// ---------------------------------------------------------------------
// fingerprinting
// ---------------------------------------------------------------------

/// Tigervision boards switch banks with `STA $3F`; five occurrences of
/// `85 3F` is taken as proof.
fn fingerprint_tigervision(data: &[u8]) -> bool {
    data.windows(2).filter(|w| w == &[0x85, 0x3F]).count() >= 5
}

/// The 3E scheme additionally writes to $3E for its RAM banks.
fn fingerprint_3e(data: &[u8]) -> bool {
    data.windows(2).filter(|w| w == &[0x85, 0x3E]).count() >= 5 && fingerprint_tigervision(data)
}

/// Parker Bros hotspot accesses, patterns as catalogued by Stella.
fn fingerprint_parkerbros(data: &[u8]) -> bool {
    const PATTERNS: [[u8; 3]; 8] = [
        [0x8D, 0xE0, 0x1F],
        [0x8D, 0xE0, 0x5F],
        [0x8D, 0xE9, 0xFF],
        [0x0C, 0xE0, 0x1F],
        [0xAD, 0xE0, 0x1F],
        [0xAD, 0xE9, 0xFF],
        [0xAD, 0xED, 0xFF],
        [0xAD, 0xF3, 0xBF],
    ];
    data.windows(3)
        .any(|w| PATTERNS.iter().any(|p| w == p))
}

fn fingerprint_mnetwork(data: &[u8]) -> bool {
    data.windows(4)
        .filter(|w| w == &[0x7E, 0x66, 0x66, 0x66])
        .count()
        >= 2
}

fn fingerprint_harmony(data: &[u8]) -> bool {
    data.len() >= 0x24 && data[0x20..0x24] == [0x1E, 0xAB, 0xAD, 0x10]
}

/// Supercharger fast-load files are identified purely by length.
fn fingerprint_supercharger(data: &[u8]) -> bool {
    matches!(data.len(), 8448 | 25344 | 33792)
}

fn fingerprint_8k(data: &[u8]) -> Result<Box<dyn Mapper>, CartridgeError> {
    if fingerprint_tigervision(data) {
        return Ok(Box::new(Tigervision::new_3f(data)?));
    }
    if fingerprint_parkerbros(data) {
        return Ok(Box::new(ParkerBros::new(data)?));
    }
    Ok(Box::new(with_superchip(Atari::new_f8(data)?, data)))
}

fn fingerprint_16k(data: &[u8]) -> Result<Box<dyn Mapper>, CartridgeError> {
    if fingerprint_tigervision(data) {
        return Ok(Box::new(Tigervision::new_3f(data)?));
    }
    if fingerprint_mnetwork(data) {
        return Ok(Box::new(MNetwork::new(data)?));
    }
    Ok(Box::new(with_superchip(Atari::new_f6(data)?, data)))
}

fn fingerprint_32k(data: &[u8]) -> Result<Box<dyn Mapper>, CartridgeError> {
    if fingerprint_tigervision(data) {
        return Ok(Box::new(Tigervision::new_3f(data)?));
    }
    Ok(Box::new(with_superchip(Atari::new_f4(data)?, data)))
}

fn with_superchip(mut cart: Atari, data: &[u8]) -> Atari {
    if Atari::wants_superchip(data) {
        cart.add_superchip();
    }
    cart
}

/// Choose a mapper for an un-hinted image. Applied in fixed priority so
/// ambiguous images resolve deterministically.
pub fn fingerprint(data: &[u8]) -> Result<Box<dyn Mapper>, CartridgeError> {
    if fingerprint_harmony(data) {
        return Ok(Box::new(DpcPlus::new(data)?));
    }
    if fingerprint_supercharger(data) {
        return Ok(Box::new(Supercharger::new(data)?));
    }
    if fingerprint_3e(data) {
        return Ok(Box::new(Tigervision::new_3e(data)?));
    }

    match data.len() {
        2048 => Ok(Box::new(Atari::new_2k(data)?)),
        4096 => Ok(Box::new(Atari::new_4k(data)?)),
        8192 => fingerprint_8k(data),
        10240 | 10495 => Ok(Box::new(Dpc::new(data)?)),
        12288 => Ok(Box::new(Cbs::new(data)?)),
        16384 => fingerprint_16k(data),
        32768 => fingerprint_32k(data),
        len => Err(CartridgeError::UnrecognisedSize(len)),
    }
}
