use super::{address, Error};
use ndp_model::TypedBuffer;

/// A typed buffer placed at a base address.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub base_addr: address,
    pub buffer: TypedBuffer,
}

impl Region {
    /// Address range covered by the unpadded elements.
    #[must_use]
    pub fn range(&self) -> std::ops::Range<address> {
        self.base_addr..self.base_addr.saturating_add(self.buffer.byte_len())
    }

    /// Address range covered once the last row is padded to `packet_size`.
    #[must_use]
    pub fn padded_range(&self, packet_size: u64) -> std::ops::Range<address> {
        let len = self.buffer.byte_len().div_ceil(packet_size) * packet_size;
        self.base_addr..self.base_addr.saturating_add(len)
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Region")
            .field("name", &self.buffer.name())
            .field("base_addr", &format_args!("{:#x}", self.base_addr))
            .field("dtype", &self.buffer.element_type())
            .field("len", &self.buffer.len())
            .field(
                "size",
                &human_bytes::human_bytes(self.buffer.byte_len() as f64),
            )
            .finish()
    }
}

/// Ordered snapshot of the simulated global address space.
///
/// Regions of one map never overlap. Maps are assembled with
/// [`MemoryRegionMap::with_region`] and not modified afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryRegionMap {
    regions: Vec<Region>,
    ranges: rangemap::RangeMap<address, usize>,
}

impl MemoryRegionMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `buffer` at `base_addr`.
    ///
    /// Fails with [`Error::OverlappingRegion`] if the buffer overlaps a region
    /// already in the map.
    pub fn with_region(mut self, base_addr: address, buffer: TypedBuffer) -> Result<Self, Error> {
        let region = Region { base_addr, buffer };
        let range = region.range();
        if !range.is_empty() {
            if let Some((_, &existing)) = self.ranges.overlapping(&range).next() {
                return Err(Error::OverlappingRegion {
                    name: region.buffer.name().to_string(),
                    base_addr,
                    existing: self.regions[existing].base_addr,
                });
            }
            self.ranges.insert(range, self.regions.len());
        }
        log::trace!("adding {}", region);
        self.regions.push(region);
        Ok(self)
    }

    pub fn from_regions(
        regions: impl IntoIterator<Item = (address, TypedBuffer)>,
    ) -> Result<Self, Error> {
        regions
            .into_iter()
            .try_fold(Self::new(), |map, (base_addr, buffer)| {
                map.with_region(base_addr, buffer)
            })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Region> {
        self.regions.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// The region whose elements contain `addr`.
    #[must_use]
    pub fn region_containing(&self, addr: address) -> Option<&Region> {
        self.ranges.get(&addr).map(|&idx| &self.regions[idx])
    }

    /// Total number of element bytes in the map.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.iter().map(|region| region.buffer.byte_len()).sum()
    }
}

impl<'a> IntoIterator for &'a MemoryRegionMap {
    type Item = &'a Region;
    type IntoIter = std::slice::Iter<'a, Region>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryRegionMap;
    use crate::Error;
    use ndp_model::TypedBuffer;
    use similar_asserts as diff;

    #[test]
    fn test_regions_keep_insertion_order() -> Result<(), Error> {
        let map = MemoryRegionMap::new()
            .with_region(0x2000, TypedBuffer::new("b", vec![1i32; 8]))?
            .with_region(0x1000, TypedBuffer::new("a", vec![1.0f32; 8]))?;
        let bases: Vec<_> = map.iter().map(|region| region.base_addr).collect();
        diff::assert_eq!(have: bases, want: vec![0x2000, 0x1000]);
        diff::assert_eq!(have: map.total_bytes(), want: 64);
        Ok(())
    }

    #[test]
    fn test_overlapping_regions_are_rejected() -> Result<(), Error> {
        let map = MemoryRegionMap::new().with_region(0x1000, TypedBuffer::new("a", vec![0i64; 4]))?;
        let err = map
            .clone()
            .with_region(0x1018, TypedBuffer::new("b", vec![0i64; 4]))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::OverlappingRegion {
                base_addr: 0x1018,
                existing: 0x1000,
                ..
            }
        ));
        // adjacent regions are fine
        let map = map.with_region(0x1020, TypedBuffer::new("c", vec![0i64; 4]))?;
        diff::assert_eq!(have: map.len(), want: 2);
        Ok(())
    }

    #[test]
    fn test_empty_buffers_occupy_no_range() -> Result<(), Error> {
        let map = MemoryRegionMap::new()
            .with_region(0x1000, TypedBuffer::new::<u8>("empty", vec![]))?
            .with_region(0x1000, TypedBuffer::new("a", vec![0u8; 32]))?;
        diff::assert_eq!(have: map.len(), want: 2);
        diff::assert_eq!(
            have: map.region_containing(0x101f).map(|r| r.buffer.name()),
            want: Some("a"),
        );
        diff::assert_eq!(have: map.region_containing(0x1020).map(|r| r.buffer.name()), want: None);
        Ok(())
    }

    #[test]
    fn test_padded_range() -> Result<(), Error> {
        let map = MemoryRegionMap::from_regions([(0x40, TypedBuffer::new("a", vec![0i64; 10]))])?;
        let region = map.iter().next().unwrap();
        diff::assert_eq!(have: region.range(), want: 0x40..0x90);
        diff::assert_eq!(have: region.padded_range(32), want: 0x40..0xa0);
        Ok(())
    }
}
