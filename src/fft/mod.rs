//! Hand-written radix-2 transforms.
//!
//! All routines work in single precision. In practice `f32` holds up well to
//! a few thousand points; past 8192 the accumulated rounding becomes visible
//! and a double-precision transform is the better tool.

pub mod bitrev;
pub mod complex;
pub mod real;

pub use bitrev::{reverse_bits, BitReversalTable, MAX_FAST_BITS};
pub use complex::{ComplexFft, ComplexSequence, Direction};
pub use real::{real_transform, RealFft};

pub fn is_power_of_two(n: usize) -> bool {
    n != 0 && n & (n - 1) == 0
}

/// log2 of a power of two.
pub fn bits_needed(n: usize) -> usize {
    n.trailing_zeros() as usize
}
