//! Heuristics that find the softdevice, bootloader and application in the
//! merged HEX data when no address range was given for them.

use super::layout::*;
use super::AddressRange;
use crate::hex::HexStore;

/**
 * Return true if the initial SP and reset vector at 'min' look like those of
 * a valid image residing between 'min' and 'max'.
 */
pub fn valid_code(store: &HexStore, min: u32, max: u32) -> bool {
    let initial_sp = store.uint32le(min);
    let reset = store.uint32le(min.saturating_add(4));

    // unaligned?
    if initial_sp % 4 != 0 {
        return false;
    }
    // outside of RAM?
    if !(RAM_START..RAM_START + RAM_SIZE).contains(&initial_sp) {
        return false;
    }
    // non-thumb reset vector?
    if reset % 2 != 1 {
        return false;
    }
    // reset vector pointing outside the address range?
    (min..max).contains(&reset)
}

/// First page-aligned address in '[low, high)' that starts valid code.
fn scan(store: &HexStore, low: u32, high: u32, page: u32) -> Option<u32> {
    let found = (low..high)
        .step_by(page as usize)
        .find(|&addr| valid_code(store, addr, high));
    log::trace!("scan 0x{:05x} - 0x{:05x}: {:x?}", low, high, found);
    found
}

pub fn find_softdevice(store: &HexStore, explicit: Option<AddressRange>) -> Option<AddressRange> {
    if explicit.is_some() {
        return explicit;
    }
    // Must have data from the start up to and including the info structure
    if store.extents(SOFTDEVICE_START, SOFTDEVICE_INFO_END, WORD)
        != Some((SOFTDEVICE_START, SOFTDEVICE_INFO_END))
    {
        log::debug!("no softdevice info structure");
        return None;
    }
    let end = store.uint32le(SOFTDEVICE_START + SOFTDEVICE_END_OFFSET);
    if !valid_code(store, SOFTDEVICE_START, end) {
        log::debug!("no valid softdevice code below 0x{:05x}", end);
        return None;
    }
    // The image may be shorter than the declared end
    let (_, high) = store.extents(SOFTDEVICE_START, end, WORD)?;
    Some(AddressRange::new(SOFTDEVICE_START, high))
}

pub fn find_bootloader(store: &HexStore, explicit: Option<AddressRange>) -> Option<AddressRange> {
    if explicit.is_some() {
        return explicit;
    }
    let (window, (low, high)) = BOOTLOADER_WINDOWS
        .iter()
        .find_map(|w| store.extents(w.start, w.end, w.page).map(|e| (*w, e)))?;
    let start = scan(store, low, high, window.page)?;
    store
        .extents(start, window.end, WORD)
        .map(AddressRange::from)
}

pub fn find_application(
    store: &HexStore,
    explicit: Option<AddressRange>,
    softdevice: Option<AddressRange>,
    bootloader: Option<AddressRange>,
) -> Option<AddressRange> {
    if explicit.is_some() {
        return explicit;
    }
    let mut min = APPLICATION_WINDOW.start;
    let mut max = APPLICATION_WINDOW.end;

    // The app must end before the bootloader
    if let Some(bl) = bootloader {
        max = bl.low;
    }
    // The softdevice tells us where the app starts
    if let Some(sd) = softdevice {
        let app_start = store.uint32le(sd.low.saturating_add(SOFTDEVICE_END_OFFSET));
        if app_start > APPLICATION_START_MIN && app_start < APPLICATION_START_MAX {
            min = app_start;
        }
    }

    let (low, high) = store.extents(min, max, APPLICATION_WINDOW.page)?;
    let start = scan(store, low, high, APPLICATION_WINDOW.page)?;
    store.extents(start, high, WORD).map(AddressRange::from)
}

//----------------------------------------------------------------------------
// Tests
//----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::tests::{code, softdevice, store_of};

    fn vectors(sp: u32, reset: u32) -> HexStore {
        store_of(&[&[(0x20000, code(sp, reset, 8))]]).unwrap()
    }

    #[test]
    fn valid_code_accepts_plausible_vectors() {
        assert!(valid_code(&vectors(0x2000_8000, 0x20101), 0x20000, 0x21000));
        assert!(valid_code(&vectors(0x2000_0000, 0x20001), 0x20000, 0x20002));
        assert!(valid_code(&vectors(0x2000_fffc, 0x20fff), 0x20000, 0x21000));
    }

    #[test]
    fn valid_code_rejects_misaligned_sp() {
        assert!(!valid_code(&vectors(0x2000_8002, 0x20101), 0x20000, 0x21000));
    }

    #[test]
    fn valid_code_rejects_sp_outside_ram() {
        assert!(!valid_code(&vectors(0x1fff_fffc, 0x20101), 0x20000, 0x21000));
        assert!(!valid_code(&vectors(0x2001_0000, 0x20101), 0x20000, 0x21000));
    }

    #[test]
    fn valid_code_rejects_even_reset() {
        assert!(!valid_code(&vectors(0x2000_8000, 0x20100), 0x20000, 0x21000));
    }

    #[test]
    fn valid_code_rejects_reset_outside_range() {
        assert!(!valid_code(&vectors(0x2000_8000, 0x1ffff), 0x20000, 0x21000));
        assert!(!valid_code(&vectors(0x2000_8000, 0x21001), 0x20000, 0x21000));
    }

    #[test]
    fn erased_flash_is_not_code() {
        assert!(!valid_code(&HexStore::new(), 0x20000, 0x21000));
    }

    #[test]
    fn softdevice_needs_the_whole_info_window() {
        let (base, mut data) = softdevice(0x4000);
        data.truncate(0x2000);
        let store = store_of(&[&[(base, data)]]).unwrap();
        assert_eq!(find_softdevice(&store, None), None);
    }

    #[test]
    fn softdevice_shorter_than_declared() {
        let (base, mut data) = softdevice(0x18000);
        data.truncate(0x2004);
        let store = store_of(&[&[(base, data)]]).unwrap();
        assert_eq!(find_softdevice(&store, None), None);

        let (base, mut data) = softdevice(0x18000);
        data.truncate(0x2100);
        let store = store_of(&[&[(base, data)]]).unwrap();
        assert_eq!(
            find_softdevice(&store, None),
            Some(AddressRange::new(0x1000, 0x3100))
        );
    }

    #[test]
    fn softdevice_with_invalid_code() {
        let (base, mut data) = softdevice(0x4000);
        data[4..8].copy_from_slice(&0x5001u32.to_le_bytes());
        let store = store_of(&[&[(base, data)]]).unwrap();
        assert_eq!(find_softdevice(&store, None), None);
    }

    #[test]
    fn bootloader_scans_pages_in_order() {
        let mut data = vec![0xff; 0x400];
        data.extend(code(0x2000_4000, 0x37411, 0x400));
        let store = store_of(&[&[(0x37000, data)]]).unwrap();
        assert_eq!(
            find_bootloader(&store, None),
            Some(AddressRange::new(0x37400, 0x37800))
        );
    }

    #[test]
    fn bootloader_prefers_the_nrf52_window() {
        let store = store_of(&[&[
            (0x37000, code(0x2000_4000, 0x37011, 0x400)),
            (0x7d000, code(0x2000_4000, 0x7d011, 0x200)),
        ]])
        .unwrap();
        assert_eq!(
            find_bootloader(&store, None),
            Some(AddressRange::new(0x7d000, 0x7d200))
        );
    }

    #[test]
    fn bootloader_window_with_data_but_no_code() {
        let store = store_of(&[&[
            (0x37000, code(0x2000_4000, 0x37011, 0x400)),
            (0x70000, vec![0; 0x100]),
        ]])
        .unwrap();
        assert_eq!(find_bootloader(&store, None), None);
    }

    #[test]
    fn application_ends_before_bootloader() {
        let store = store_of(&[&[
            (0x20000, code(0x2000_4000, 0x20101, 0x800)),
            (0x3a000, code(0x2000_4000, 0x3a101, 0x800)),
        ]])
        .unwrap();
        let bl = Some(AddressRange::new(0x3a000, 0x3b000));
        assert_eq!(
            find_application(&store, None, None, bl),
            Some(AddressRange::new(0x20000, 0x20800))
        );
        let bl = Some(AddressRange::new(0x20000, 0x21000));
        assert_eq!(find_application(&store, None, None, bl), None);
    }

    #[test]
    fn application_starts_where_softdevice_says() {
        let (base, mut sd) = softdevice(0x14000);
        sd.truncate(0x2100);
        let store = store_of(&[&[
            (base, sd),
            (0x12000, code(0x2000_4000, 0x12101, 0x200)),
            (0x14000, code(0x2000_4000, 0x14101, 0x200)),
        ]])
        .unwrap();
        // Everything covered below the declared end counts as softdevice
        let sd = find_softdevice(&store, None);
        assert_eq!(sd, Some(AddressRange::new(0x1000, 0x12200)));
        assert_eq!(
            find_application(&store, None, sd, None),
            Some(AddressRange::new(0x14000, 0x14200))
        );
        assert_eq!(
            find_application(&store, None, None, None),
            Some(AddressRange::new(0x12000, 0x14200))
        );
    }

    #[test]
    fn application_start_bounds_are_exclusive() {
        for declared in [APPLICATION_START_MIN, APPLICATION_START_MAX] {
            let (base, mut sd) = softdevice(declared);
            sd.truncate(0x2100);
            let store = store_of(&[&[
                (base, sd),
                (0x10000, code(0x2000_4000, 0x10101, 0x200)),
            ]])
            .unwrap();
            let sd = find_softdevice(&store, None);
            assert!(sd.is_some());
            assert_eq!(
                find_application(&store, None, sd, None),
                Some(AddressRange::new(0x10000, 0x10200)),
                "declared application start 0x{:05x}",
                declared
            );
        }
    }

    #[test]
    fn explicit_ranges_skip_the_search() {
        let store = HexStore::new();
        let range = Some(AddressRange::new(0x1000, 0x2000));
        assert_eq!(find_softdevice(&store, range), range);
        assert_eq!(find_bootloader(&store, range), range);
        assert_eq!(find_application(&store, range, None, None), range);
    }
}
