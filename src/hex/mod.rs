use std::path::Path;

use crate::error::Error;

pub mod hexcrc;
pub mod region;
pub mod store;

pub use region::{build_regions, Region};
pub use store::{HexStore, PAD};

/// Decode the text of one HEX file into sorted, contiguous regions.
pub fn parse_hex(file: &str, text: &str) -> Result<Vec<Region>, Error> {
    let reader = ihex::Reader::new_with_options(
        text,
        ihex::ReaderOptions {
            stop_after_first_error: true,
            stop_after_eof: true,
        },
    );
    let records = reader
        .collect::<Result<Vec<ihex::Record>, _>>()
        .map_err(|e| Error::Hex {
            file: file.to_string(),
            message: e.to_string(),
        })?;
    build_regions(file, records)
}

pub fn read_hex_file<P: AsRef<Path>>(path: P) -> Result<Vec<Region>, Error> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    parse_hex(&path.display().to_string(), &text)
}

/// Encode '(address, bytes)' regions as HEX text, 16 bytes per data record.
#[cfg(test)]
pub(crate) fn to_hex_text(regions: &[(u32, Vec<u8>)]) -> String {
    let mut records = Vec::new();
    let mut upper: Option<u32> = None;
    for (base, data) in regions {
        let mut addr = *base;
        let mut rest = &data[..];
        while !rest.is_empty() {
            if upper != Some(addr >> 16) {
                upper = Some(addr >> 16);
                records.push(ihex::Record::ExtendedLinearAddress((addr >> 16) as u16));
            }
            let room = 0x10000 - (addr & 0xffff) as usize;
            let (chunk, tail) = rest.split_at(rest.len().min(16).min(room));
            records.push(ihex::Record::Data {
                offset: addr as u16,
                value: chunk.to_vec(),
            });
            addr += chunk.len() as u32;
            rest = tail;
        }
    }
    records.push(ihex::Record::EndOfFile);
    ihex::create_object_file_representation(&records).unwrap()
}

//----------------------------------------------------------------------------
// Tests
//----------------------------------------------------------------------------
