//! Address interleaving across NDP units.
//!
//! The global address space is cut into `stride` byte stripes that are
//! assigned to the NDP units round-robin. Data only reaches the unit that
//! owns the stripe it was placed in.

use super::{address, config::EncodingConfig};

impl EncodingConfig {
    /// The NDP unit owning `addr`.
    #[must_use]
    pub fn ndp_unit_of(&self, addr: address) -> usize {
        ((addr / self.stride) % self.num_ndp_units as u64) as usize
    }

    /// Number of packets each NDP unit processes when sweeping `size` bytes
    /// starting at `base_addr`.
    #[must_use]
    pub fn packets_per_unit(&self, base_addr: address, size: u64) -> Vec<u64> {
        let mut counts = vec![0; self.num_ndp_units];
        let mut offset = 0;
        while offset < size {
            counts[self.ndp_unit_of(base_addr + offset)] += 1;
            offset += self.packet_size;
        }
        counts
    }

    /// Smallest non-zero per-unit packet count over a sweep of `size` bytes.
    ///
    /// Kernels that unroll their per-unit loop use this as the trip count
    /// every unit is guaranteed to reach.
    #[must_use]
    pub fn min_packets_per_unit(&self, size: u64) -> Option<u64> {
        self.packets_per_unit(0, size)
            .into_iter()
            .filter(|&count| count > 0)
            .min()
    }

    /// Whether `addr` starts a stripe.
    #[must_use]
    pub fn is_stripe_aligned(&self, addr: address) -> bool {
        addr % self.stride == 0
    }
}

/// Rounds `len` up to the next multiple of `multiple`.
#[must_use]
pub fn pad_to_multiple(len: usize, multiple: usize) -> usize {
    if multiple == 0 {
        return len;
    }
    len.div_ceil(multiple) * multiple
}

#[cfg(test)]
mod tests {
    use crate::config::EncodingConfig;
    use similar_asserts as diff;

    fn config(num_ndp_units: usize) -> EncodingConfig {
        EncodingConfig {
            num_ndp_units,
            stride: 256,
            packet_size: 32,
            ..EncodingConfig::default()
        }
    }

    #[test]
    fn test_ndp_unit_of() {
        let config = config(4);
        diff::assert_eq!(have: config.ndp_unit_of(0), want: 0);
        diff::assert_eq!(have: config.ndp_unit_of(255), want: 0);
        diff::assert_eq!(have: config.ndp_unit_of(256), want: 1);
        diff::assert_eq!(have: config.ndp_unit_of(4 * 256), want: 0);
        diff::assert_eq!(have: config.ndp_unit_of(0x100_0000_0000_0300), want: 3);
    }

    #[test]
    fn test_packets_per_unit() {
        let config = config(4);
        // 3 full stripes of 8 packets and 2 packets into the fourth
        diff::assert_eq!(have: config.packets_per_unit(0, 3 * 256 + 64), want: vec![8, 8, 8, 2]);
        // starting in the middle of the stripe owned by unit 1
        diff::assert_eq!(have: config.packets_per_unit(256 + 128, 256), want: vec![0, 4, 4, 0]);
    }

    #[test]
    fn test_min_packets_per_unit() {
        let config = config(4);
        diff::assert_eq!(have: config.min_packets_per_unit(3 * 256 + 64), want: Some(2));
        diff::assert_eq!(have: config.min_packets_per_unit(64), want: Some(2));
        diff::assert_eq!(have: config.min_packets_per_unit(0), want: None);
        diff::assert_eq!(have: config.min_packets_per_unit(16 * 256), want: Some(32));
    }

    #[test]
    fn test_pad_to_multiple() {
        diff::assert_eq!(have: super::pad_to_multiple(10, 4), want: 12);
        diff::assert_eq!(have: super::pad_to_multiple(8, 4), want: 8);
        diff::assert_eq!(have: super::pad_to_multiple(0, 4), want: 0);
    }
}
