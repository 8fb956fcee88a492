use std::collections::BTreeMap;
use std::path::Path;

use super::region::Region;
use super::read_hex_file;
use crate::error::Error;

/// Value used for addresses that no input file covers (erased flash).
pub const PAD: u8 = 0xff;

/**
 * Sparse byte store holding the merged contents of one or more HEX files.
 *
 * Areas are keyed by start address, and are kept disjoint and non-adjacent:
 * accepted data that overlaps or touches an existing area is coalesced into it.
 */
#[derive(Debug, Default, Clone)]
pub struct HexStore {
    areas: BTreeMap<u32, Vec<u8>>,
}

impl HexStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every HEX file, in order, into a single store.
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Self, Error> {
        let mut store = Self::new();
        for path in paths {
            let file = path.as_ref().display().to_string();
            let regions = read_hex_file(path)?;
            log::debug!("{}: found {} HEX regions", file, regions.len());
            for r in regions {
                log::trace!(" - Region: ADDR = {:08x}, SIZE = {}", r.address(), r.len());
                store.insert(&file, r)?;
            }
        }
        if store.is_empty() {
            log::warn!("no data found in the HEX files");
        }
        log::debug!("merged HEX data into {} areas", store.len());
        Ok(store)
    }

    /// Number of disjoint areas in the store.
    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    /**
     * Add a region read from 'file'. Overlap with earlier data is accepted only
     * when the overlapping bytes are identical.
     */
    pub fn insert(&mut self, file: &str, region: Region) -> Result<(), Error> {
        if region.is_empty() {
            return Ok(());
        }
        let start = region.address();
        let end = region.end();

        for (&ostart, odata) in self.areas.range(..end) {
            let oend = ostart + odata.len() as u32;
            let low = start.max(ostart);
            let high = end.min(oend);
            if low >= high {
                continue;
            }
            let new = &region.data()[(low - start) as usize..(high - start) as usize];
            let old = &odata[(low - ostart) as usize..(high - ostart) as usize];
            if new != old {
                return Err(Error::Conflict {
                    file: file.to_string(),
                    low,
                    high,
                });
            }
        }

        // Coalesce with every area that overlaps or touches the new one
        let touching: Vec<u32> = self
            .areas
            .range(..=end)
            .filter(|(&ostart, odata)| ostart + odata.len() as u32 >= start)
            .map(|(&ostart, _)| ostart)
            .collect();
        let mut parts = Vec::with_capacity(touching.len() + 1);
        for ostart in touching {
            if let Some(odata) = self.areas.remove(&ostart) {
                parts.push((ostart, odata));
            }
        }
        parts.push((start, region.into_data()));

        let low = parts.iter().map(|(s, _)| *s).min().unwrap_or(start);
        let high = parts
            .iter()
            .map(|(s, d)| s + d.len() as u32)
            .max()
            .unwrap_or(end);
        let mut merged = vec![PAD; (high - low) as usize];
        for (s, d) in parts {
            let at = (s - low) as usize;
            merged[at..at + d.len()].copy_from_slice(&d);
        }
        self.areas.insert(low, merged);
        Ok(())
    }

    /**
     * Return the extents of the data present between 'min' and 'max', with the
     * low bound rounded down and the high bound rounded up to 'round' bytes.
     */
    pub fn extents(&self, min: u32, max: u32, round: u32) -> Option<(u32, u32)> {
        let mut covered = self.areas.range(..max).filter_map(|(&start, data)| {
            let low = start.max(min);
            let high = (start + data.len() as u32).min(max);
            (low < high).then_some((low, high))
        });
        let (low, mut high) = covered.next()?;
        if let Some((_, last)) = covered.last() {
            high = last;
        }
        let low = low - low % round;
        let high = high.checked_next_multiple_of(round).unwrap_or(u32::MAX);
        Some((low, high))
    }

    /// Return all data in '[min, max)', with missing bytes set to 'pad'.
    pub fn extract(&self, min: u32, max: u32, pad: u8) -> Vec<u8> {
        if max <= min {
            return Vec::new();
        }
        let mut buf = vec![pad; (max - min) as usize];
        for (&start, data) in self.areas.range(..max) {
            let end = start + data.len() as u32;
            if end <= min {
                continue;
            }
            let low = start.max(min);
            let high = end.min(max);
            buf[(low - min) as usize..(high - min) as usize]
                .copy_from_slice(&data[(low - start) as usize..(high - start) as usize]);
        }
        buf
    }

    /// Little-endian word at 'addr', with missing bytes read as 'PAD'.
    pub fn uint32le(&self, addr: u32) -> u32 {
        let mut word = [PAD; 4];
        let bytes = self.extract(addr, addr.saturating_add(4), PAD);
        word[..bytes.len()].copy_from_slice(&bytes);
        u32::from_le_bytes(word)
    }
}

//----------------------------------------------------------------------------
// Tests
//----------------------------------------------------------------------------
