use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::hex::HexStore;

pub mod assemble;
pub mod layout;
pub mod locate;

pub use assemble::Image;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SegmentKind {
    Softdevice,
    Bootloader,
    Application,
}

impl fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            SegmentKind::Softdevice => "Softdevice",
            SegmentKind::Bootloader => "Bootloader",
            SegmentKind::Application => "Application",
        })
    }
}

/// Half-open flash address range '[low, high)'.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct AddressRange {
    pub low: u32,
    pub high: u32,
}

impl AddressRange {
    pub fn new(low: u32, high: u32) -> Self {
        Self { low, high }
    }

    pub fn len(&self) -> u32 {
        self.high - self.low
    }
}

impl From<(u32, u32)> for AddressRange {
    fn from((low, high): (u32, u32)) -> Self {
        Self::new(low, high)
    }
}

/// Parses 'LOW-HIGH', with each bound in hex ('0x1000') or decimal.
impl FromStr for AddressRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidRange(s.to_string());
        let (low, high) = s.split_once('-').ok_or_else(invalid)?;
        let low = parse_int::parse::<u32>(low.trim()).map_err(|_| invalid())?;
        let high = parse_int::parse::<u32>(high.trim()).map_err(|_| invalid())?;
        if low > high {
            return Err(invalid());
        }
        Ok(Self::new(low, high))
    }
}

/**
 * What is known about one segment: whether the user asked for it, and where it
 * is (given on the command line, or found in the HEX data).
 */
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Segment {
    pub requested: bool,
    pub range: Option<AddressRange>,
}

impl Segment {
    pub fn new(requested: bool, range: Option<AddressRange>) -> Self {
        Self { requested, range }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Request {
    pub softdevice: Segment,
    pub bootloader: Segment,
    pub application: Segment,
}

/**
 * With 'Explicit' selection only the requested segments go into the image;
 * with 'Auto' (nothing requested) every segment that can be found does.
 */
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Selection {
    Explicit,
    Auto,
}

impl Selection {
    pub fn of(request: &Request) -> Self {
        if request.softdevice.requested
            || request.bootloader.requested
            || request.application.requested
        {
            Selection::Explicit
        } else {
            Selection::Auto
        }
    }
}

/// Address ranges of the segments that go into the image.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Plan {
    pub softdevice: Option<AddressRange>,
    pub bootloader: Option<AddressRange>,
    pub application: Option<AddressRange>,
}

impl Plan {
    /**
     * Locate the softdevice, bootloader and application (in that order, as
     * each search narrows the next), then decide which of them to include.
     */
    pub fn resolve(store: &HexStore, request: Request) -> Result<Self, Error> {
        let selection = Selection::of(&request);

        let softdevice = Segment {
            range: locate::find_softdevice(store, request.softdevice.range),
            ..request.softdevice
        };
        let bootloader = Segment {
            range: locate::find_bootloader(store, request.bootloader.range),
            ..request.bootloader
        };
        let application = Segment {
            range: locate::find_application(
                store,
                request.application.range,
                softdevice.range,
                bootloader.range,
            ),
            ..request.application
        };

        let plan = Self {
            softdevice: select(SegmentKind::Softdevice, softdevice, selection)?,
            bootloader: select(SegmentKind::Bootloader, bootloader, selection)?,
            application: select(SegmentKind::Application, application, selection)?,
        };

        if plan.is_empty() {
            return Err(Error::NoSegments);
        }
        if plan.application.is_some() && (plan.softdevice.is_some() || plan.bootloader.is_some())
        {
            return Err(Error::UnsupportedCombination);
        }
        Ok(plan)
    }

    pub fn is_empty(&self) -> bool {
        self.softdevice.is_none() && self.bootloader.is_none() && self.application.is_none()
    }

    /// Segments in image order.
    pub fn segments(&self) -> [(SegmentKind, Option<AddressRange>); 3] {
        [
            (SegmentKind::Softdevice, self.softdevice),
            (SegmentKind::Bootloader, self.bootloader),
            (SegmentKind::Application, self.application),
        ]
    }
}

fn select(
    kind: SegmentKind,
    segment: Segment,
    selection: Selection,
) -> Result<Option<AddressRange>, Error> {
    let include = segment.requested || (selection == Selection::Auto && segment.range.is_some());
    if !include {
        return Ok(None);
    }
    let range = segment.range.ok_or(Error::SegmentNotFound(kind))?;
    log::info!(
        "{:>12}: 0x{:05x} - 0x{:05x} ({} bytes)",
        kind,
        range.low,
        range.high,
        range.len()
    );
    Ok(Some(range))
}

//----------------------------------------------------------------------------
// Tests
//----------------------------------------------------------------------------
