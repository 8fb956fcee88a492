use thiserror::Error;

use crate::image::SegmentKind;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{file}: invalid hex record: {message}")]
    Hex { file: String, message: String },
    #[error("{file}: data at 0x{address:08x} runs past the end of the address space")]
    AddressOverflow { file: String, address: u32 },
    #[error("data region [{low:x}-{high:x}] in {file} overlaps earlier data")]
    Conflict { file: String, low: u32, high: u32 },
    #[error("invalid address range '{0}', expected LOW-HIGH")]
    InvalidRange(String),
    #[error("Want {0}, but can't find it")]
    SegmentNotFound(SegmentKind),
    #[error("No softdevice, bootloader, or application found")]
    NoSegments,
    #[error("Unsupported image combination; application must be updated alone")]
    UnsupportedCombination,
}
