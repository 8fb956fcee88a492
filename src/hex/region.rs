use ihex::Record;
use std::cmp::Ordering;

use crate::error::Error;

/**
 * Represents a single contiguous region of 'u8' values, read from a HEX file.
 *
 * The end address ('base + len') always fits in a 'u32'.
 */
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Region {
    base: u32,
    data: Vec<u8>,
}

impl Ord for Region {
    fn cmp(&self, other: &Region) -> Ordering {
        self.base.cmp(&other.base)
    }
}

impl PartialOrd for Region {
    fn partial_cmp(&self, other: &Region) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Region {
    pub fn new(base: u32) -> Self {
        Self {
            base,
            data: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn address(&self) -> u32 {
        self.base
    }

    /// First address past the end of the region.
    pub fn end(&self) -> u32 {
        self.base + self.data.len() as u32
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Append bytes at the end of the region, failing if they would run past
    /// the 32-bit address space.
    pub fn append(&mut self, file: &str, value: &[u8]) -> Result<(), Error> {
        let fits = u32::try_from(self.data.len() + value.len())
            .ok()
            .and_then(|len| self.base.checked_add(len))
            .is_some();
        if !fits {
            return Err(Error::AddressOverflow {
                file: file.to_string(),
                address: self.base,
            });
        }
        self.data.extend_from_slice(value);
        Ok(())
    }
}

/**
 * Build the (sorted) array of contiguous regions of firmware (binary-)data
 * described by the records of one HEX file.
 */
pub fn build_regions(file: &str, records: Vec<Record>) -> Result<Vec<Region>, Error> {
    let mut regions: Vec<Region> = Vec::new();
    let mut segment: u32 = 0;
    let mut region = Region::new(0);

    for r in records {
        match r {
            Record::Data { offset, value } => {
                // Type: 0x00
                if value.is_empty() {
                    continue;
                }
                let address = segment + offset as u32;
                if region.is_empty() {
                    region.base = address;
                } else if address != region.end() {
                    // Data isn't contiguous, so store the current region,
                    // and then start a new region
                    regions.push(std::mem::replace(&mut region, Region::new(address)));
                }
                region.append(file, &value)?;
            }
            Record::EndOfFile => {
                // Type: 0x01
                break;
            }
            Record::ExtendedSegmentAddress(base) => {
                // Type: 0x02
                segment = (base as u32) << 4;
            }
            Record::ExtendedLinearAddress(base) => {
                // Type: 0x04
                segment = (base as u32) << 16;
            }
            Record::StartSegmentAddress { .. } | Record::StartLinearAddress(_) => {
                // Type: 0x03, 0x05 (entry points, ignored for firmware images)
            }
        }
    }

    if !region.is_empty() {
        regions.push(region);
    }
    regions.sort();
    Ok(regions)
}

//----------------------------------------------------------------------------
// Tests
//----------------------------------------------------------------------------
