//! Flash and RAM memory map of the nRF51/nRF52 parts targeted by the
//! bootloader. Porting to another device family means changing this table.

/// The softdevice sits directly after the 4 kB master boot record.
pub const SOFTDEVICE_START: u32 = 0x1000;

/**
 * The softdevice info structure lives 0x2000 bytes into the softdevice, and
 * its third word holds the first flash address past the softdevice (which is
 * also where the application starts).
 */
pub const SOFTDEVICE_INFO_OFFSET: u32 = 0x2000;
pub const SOFTDEVICE_END_OFFSET: u32 = SOFTDEVICE_INFO_OFFSET + 0x8;

/// A softdevice must have data over the whole of '[SOFTDEVICE_START, SOFTDEVICE_INFO_END)'.
pub const SOFTDEVICE_INFO_END: u32 = SOFTDEVICE_START + SOFTDEVICE_END_OFFSET + 4;

/// Initial stack pointers must point into the (at most 64 kB) RAM.
pub const RAM_START: u32 = 0x2000_0000;
pub const RAM_SIZE: u32 = 64 * 1024;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct FlashWindow {
    pub start: u32,
    pub end: u32,
    /// Erase page size, and the alignment of any image start.
    pub page: u32,
}

/**
 * Places the bootloader may live, in search order: the nRF52 location with
 * 4 kB pages first, then the nRF51 location with 1 kB pages.
 */
pub const BOOTLOADER_WINDOWS: [FlashWindow; 2] = [
    FlashWindow {
        start: 0x70000,
        end: 0x7e000,
        page: 0x1000,
    },
    FlashWindow {
        start: 0x37000,
        end: 0x3f800,
        page: 0x400,
    },
];

pub const APPLICATION_WINDOW: FlashWindow = FlashWindow {
    start: 0x10000,
    end: 0x49000,
    page: 0x1000,
};

/// Exclusive bounds on a softdevice-declared application start address.
pub const APPLICATION_START_MIN: u32 = 0x10000;
pub const APPLICATION_START_MAX: u32 = 0x30000;

/// Rounding used when trimming a segment to the data actually present.
pub const WORD: u32 = 4;
