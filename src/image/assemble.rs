use super::{Plan, SegmentKind};
use crate::hex::{HexStore, PAD};

/// Softdevice, bootloader and application lengths (little-endian 'u32's).
pub const HEADER_LENGTH: usize = 12;
/// Zero-filled AES-EAX IV and tag placeholders follow the lengths.
pub const IV_LENGTH: usize = 16;
pub const TAG_LENGTH: usize = 16;
pub const DATA_OFFSET: usize = HEADER_LENGTH + IV_LENGTH + TAG_LENGTH;

/**
 * RigDFU update image. The bootloader reads it by fixed offsets: the three
 * segment lengths, the IV and tag, then the segment data in the order
 * softdevice, bootloader, application.
 */
#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct Image {
    softdevice: Vec<u8>,
    bootloader: Vec<u8>,
    application: Vec<u8>,
}

impl Image {
    /// Extract the planned segments from the store; excluded segments are empty.
    pub fn assemble(store: &HexStore, plan: &Plan) -> Self {
        let [softdevice, bootloader, application] = plan.segments().map(|(_, range)| {
            range
                .map(|r| store.extract(r.low, r.high, PAD))
                .unwrap_or_default()
        });
        Self {
            softdevice,
            bootloader,
            application,
        }
    }

    pub fn segments(&self) -> [(SegmentKind, &[u8]); 3] {
        [
            (SegmentKind::Softdevice, self.softdevice.as_slice()),
            (SegmentKind::Bootloader, self.bootloader.as_slice()),
            (SegmentKind::Application, self.application.as_slice()),
        ]
    }

    pub fn lengths(&self) -> [u32; 3] {
        self.segments().map(|(_, data)| data.len() as u32)
    }

    /// Total length of the serialized image.
    pub fn len(&self) -> usize {
        DATA_OFFSET + self.softdevice.len() + self.bootloader.len() + self.application.len()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes: Vec<u8> = Vec::with_capacity(self.len());
        for len in self.lengths() {
            bytes.extend(len.to_le_bytes());
        }
        bytes.resize(DATA_OFFSET, 0);
        for (_, data) in self.segments() {
            bytes.extend_from_slice(data);
        }
        bytes
    }
}

//----------------------------------------------------------------------------
// Tests
//----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::Region;
    use crate::image::AddressRange;

    fn store() -> HexStore {
        let mut store = HexStore::new();
        let mut r = Region::new(0x1000);
        r.append("a.hex", &(0..=255).collect::<Vec<u8>>()).unwrap();
        store.insert("a.hex", r).unwrap();
        store
    }

    #[test]
    fn empty_plan_is_only_a_header() {
        let image = Image::assemble(&store(), &Plan::default());
        assert_eq!(image.lengths(), [0, 0, 0]);
        assert_eq!(image.to_bytes(), vec![0; DATA_OFFSET]);
    }

    #[test]
    fn header_lengths_match_ranges() {
        let plan = Plan {
            softdevice: Some(AddressRange::new(0x1000, 0x1010)),
            bootloader: Some(AddressRange::new(0x10f8, 0x1108)),
            application: Some(AddressRange::new(0x1020, 0x1024)),
        };
        let image = Image::assemble(&store(), &plan);
        let bytes = image.to_bytes();

        assert_eq!(bytes.len(), image.len());
        assert_eq!(bytes.len(), DATA_OFFSET + 0x10 + 0x10 + 4);
        for (i, (_, range)) in plan.segments().iter().enumerate() {
            let range = range.unwrap();
            let field = &bytes[i * 4..i * 4 + 4];
            assert_eq!(field, &range.len().to_le_bytes());
        }
        assert_eq!(&bytes[HEADER_LENGTH..DATA_OFFSET], &[0; 32]);
    }

    #[test]
    fn segments_follow_in_fixed_order() {
        let plan = Plan {
            softdevice: Some(AddressRange::new(0x1000, 0x1004)),
            bootloader: Some(AddressRange::new(0x10fe, 0x1102)),
            application: None,
        };
        let bytes = Image::assemble(&store(), &plan).to_bytes();
        assert_eq!(&bytes[0..12], &[4, 0, 0, 0, 4, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(&bytes[DATA_OFFSET..], &[0, 1, 2, 3, 0xfe, 0xff, PAD, PAD]);
    }
}
