//! Key size legality ranges.
//!
//! Every algorithm declares one or more [`KeySizes`] ranges, and every
//! credential check funnels through [`KeySizes::is_legal_size`] before
//! any key bytes are touched.

/// An inclusive range of legal key sizes in bits, with an optional
/// alignment step.
///
/// A size is legal iff it lies in `[min_bits, max_bits]` and, when
/// `skip_bits > 0`, `(size - min_bits) % skip_bits == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySizes {
    /// Smallest legal size, in bits.
    pub min_bits: u32,
    /// Largest legal size, in bits.
    pub max_bits: u32,
    /// Step between legal sizes, in bits. Zero makes the range
    /// continuous.
    pub skip_bits: u32,
}

impl KeySizes {
    /// A range admitting exactly one size.
    pub const fn fixed(bits: u32) -> Self {
        KeySizes {
            min_bits: bits,
            max_bits: bits,
            skip_bits: 0,
        }
    }

    /// A range from `min_bits` to `max_bits` stepping by `skip_bits`.
    pub const fn range(min_bits: u32, max_bits: u32, skip_bits: u32) -> Self {
        KeySizes {
            min_bits,
            max_bits,
            skip_bits,
        }
    }

    /// Whether `bits` is admitted by this range.
    pub fn is_legal(&self, bits: u32) -> bool {
        if bits < self.min_bits || bits > self.max_bits {
            return false;
        }
        self.skip_bits == 0 || (bits - self.min_bits) % self.skip_bits == 0
    }

    /// Whether any range in `sizes` admits `bits`.
    pub fn is_legal_size(sizes: &[KeySizes], bits: u32) -> bool {
        sizes.iter().any(|s| s.is_legal(bits))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fixed_admits_only_itself() {
        let sizes = [KeySizes::fixed(256)];
        assert!(KeySizes::is_legal_size(&sizes, 256));
        assert!(!KeySizes::is_legal_size(&sizes, 255));
        assert!(!KeySizes::is_legal_size(&sizes, 257));
    }

    #[test]
    fn range_boundaries_and_alignment() {
        let sizes = [KeySizes::range(2048, 16384, 64)];
        assert!(KeySizes::is_legal_size(&sizes, 2048));
        assert!(KeySizes::is_legal_size(&sizes, 16384));
        assert!(KeySizes::is_legal_size(&sizes, 2048 + 64));
        assert!(KeySizes::is_legal_size(&sizes, 2048 + 7 * 64));
        assert!(!KeySizes::is_legal_size(&sizes, 2048 - 64));
        assert!(!KeySizes::is_legal_size(&sizes, 16384 + 64));
        assert!(!KeySizes::is_legal_size(&sizes, 2048 + 63));
        assert!(!KeySizes::is_legal_size(&sizes, 2048 + 65));
    }

    #[test]
    fn zero_skip_is_continuous() {
        let sizes = [KeySizes::range(8, 16, 0)];
        for bits in 8..=16 {
            assert!(KeySizes::is_legal_size(&sizes, bits));
        }
        assert!(!KeySizes::is_legal_size(&sizes, 7));
        assert!(!KeySizes::is_legal_size(&sizes, 17));
    }

    #[test]
    fn multiple_ranges() {
        let sizes = [KeySizes::fixed(128), KeySizes::fixed(256)];
        assert!(KeySizes::is_legal_size(&sizes, 128));
        assert!(KeySizes::is_legal_size(&sizes, 256));
        assert!(!KeySizes::is_legal_size(&sizes, 192));
        assert!(!KeySizes::is_legal_size(&[], 128));
    }
}
