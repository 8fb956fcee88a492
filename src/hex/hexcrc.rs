/**
 * CRC-32 as computed by the bootloader's own 'crc32()' routine (reflected
 * 0x04C11DB7, initial value and final XOR of 0xFFFFFFFF).
 */
pub const BOOTLOADER_ALG: &crc::Algorithm<u32> = &crc::CRC_32_ISO_HDLC;

pub fn crc32(data: &[u8]) -> u32 {
    crc::Crc::<u32>::new(BOOTLOADER_ALG).checksum(data)
}

//----------------------------------------------------------------------------
// Tests
//----------------------------------------------------------------------------
