use std::sync::OnceLock;

/// Widths at or below this are served from the precomputed tables.
pub const MAX_FAST_BITS: usize = 16;

static SHARED: OnceLock<BitReversalTable> = OnceLock::new();

/// Reverse the low `bits` bits of `index` by iterative extraction.
pub fn reverse_bits(mut index: usize, bits: usize) -> usize {
    let mut rev = 0;
    for _ in 0..bits {
        rev = (rev << 1) | (index & 1);
        index >>= 1;
    }
    rev
}

/// Precomputed bit-reversal permutations for every width `1..=MAX_FAST_BITS`.
///
/// Immutable once built. Either construct one explicitly and hand it to
/// [`ComplexFft::with_table`](super::ComplexFft::with_table), or use the
/// process-wide instance from [`BitReversalTable::shared`].
#[derive(Debug)]
pub struct BitReversalTable {
    // tables[b - 1] has 2^b entries
    tables: Vec<Box<[u32]>>,
}

impl BitReversalTable {
    pub fn new() -> Self {
        let tables = (1..=MAX_FAST_BITS)
            .map(|bits| {
                (0..1usize << bits)
                    .map(|i| reverse_bits(i, bits) as u32)
                    .collect::<Box<[u32]>>()
            })
            .collect();
        log::debug!("Built bit-reversal tables for widths 1..={}", MAX_FAST_BITS);
        Self { tables }
    }

    /// Lazily built on first use; concurrent first callers all observe the
    /// same single build.
    pub fn shared() -> &'static BitReversalTable {
        SHARED.get_or_init(BitReversalTable::new)
    }

    #[inline]
    pub fn reverse(&self, index: usize, bits: usize) -> usize {
        match bits {
            0 => 0,
            b if b <= MAX_FAST_BITS => {
                let mask = (1usize << b) - 1;
                self.tables[b - 1][index & mask] as usize
            }
            b => reverse_bits(index, b),
        }
    }
}

impl Default for BitReversalTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverses_three_bits() {
        let expected = [0, 4, 2, 6, 1, 5, 3, 7];
        for (i, &e) in expected.iter().enumerate() {
            assert_eq!(reverse_bits(i, 3), e);
        }
    }

    #[test]
    fn table_matches_direct_computation() {
        let table = BitReversalTable::new();
        for bits in 1..=12 {
            for i in 0..(1usize << bits) {
                assert_eq!(table.reverse(i, bits), reverse_bits(i, bits), "bits={bits} i={i}");
            }
        }
        // spot-check the widest table
        for i in [0usize, 1, 2, 255, 4096, 65535] {
            assert_eq!(table.reverse(i, 16), reverse_bits(i, 16));
        }
    }

    #[test]
    fn wide_indices_fall_back_to_direct() {
        let table = BitReversalTable::new();
        assert_eq!(table.reverse(1, 17), 1 << 16);
        assert_eq!(table.reverse(0b101, 20), reverse_bits(0b101, 20));
    }

    #[test]
    fn zero_width_is_zero() {
        assert_eq!(BitReversalTable::new().reverse(0, 0), 0);
    }

    #[test]
    fn shared_table_is_built_once_across_threads() {
        let ptrs: Vec<usize> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| BitReversalTable::shared() as *const _ as usize))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(ptrs.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(BitReversalTable::shared().reverse(1, 10), 512);
    }
}
