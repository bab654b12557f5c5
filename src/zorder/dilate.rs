//! Dilated integers.
//!
//! Dilating `x` by `D` spreads its bits so that bit `k` lands on bit `k * D`,
//! leaving `D - 1` zero bits between consecutive original bits:
//!
//! ```text
//! D = 3, x = 0b1011
//!
//!   x            :                 1   0   1   1
//!   dilate::<3>  :   0 0 1 0 0 0 0 0 1 0 0 1
//!                    ^     ^     ^     ^
//!                 bit 9  bit 6  bit 3  bit 0
//! ```
//!
//! OR-ing `dilate(c_i) << i` over the D axes gives the Morton (Z-order) code of
//! `(c_0, .., c_{D-1})`. `undilate` is the exact inverse: it keeps every D-th
//! bit starting at bit 0 and packs them back together.
//!
//! Both directions use the usual mask-and-shift cascade: `ceil(log2(W / D))`
//! steps, each moving half of the remaining bit groups at once. The masks only
//! depend on `D`, so they are computed once per `D` at compile time.

use core::fmt::{Debug, Display};
use core::hash::Hash;
use num_traits::PrimInt;

/// Steps needed for a 64-bit word, plus the final mask used by `undilate`.
const MASK_LEVELS: usize = 7;

/// `masks[t]` keeps groups of `2^t` bits repeating every `2^t * d` bits.
const fn spread_masks(d: u32) -> [u128; MASK_LEVELS] {
    let mut masks = [0u128; MASK_LEVELS];
    let mut t = 0;
    while t < MASK_LEVELS {
        let s = 1u32 << t;
        let period = if d == 0 { s } else { s * d };
        let mut mask = 0u128;
        let mut p = 0u32;
        while p < 128 {
            if p % period < s {
                mask |= 1u128 << p;
            }
            p += 1;
        }
        masks[t] = mask;
        t += 1;
    }
    masks
}

struct Spread<const D: usize>;

impl<const D: usize> Spread<D> {
    const MASKS: [u128; MASK_LEVELS] = spread_masks(D as u32);
}

/// Unsigned word usable as a hierarchical address.
///
/// Implemented for `u32` and `u64`.
pub trait Address:
    PrimInt + Hash + Debug + Display + Default + Send + Sync + 'static
{
    /// Word width in bits.
    const BITS: u32;

    /// Spread the bits of `self` by `D` (bit `k` moves to bit `k * D`).
    ///
    /// Only the low `BITS / D` bits of `self` take part; anything above is
    /// discarded.
    fn dilate<const D: usize>(self) -> Self;

    /// Inverse of [`Address::dilate`]: gather bits `0, D, 2D, ..` into the low bits.
    fn undilate<const D: usize>(self) -> Self;

    /// Lossless widening to `u64`.
    fn to_u64_lossless(self) -> u64;

    /// Truncating conversion from `u64`.
    fn from_u64_truncating(v: u64) -> Self;

    /// `self << n`, or zero when `n >= BITS`.
    #[inline]
    fn shl_bits(self, n: u32) -> Self {
        if n >= Self::BITS {
            Self::zero()
        } else {
            self << n as usize
        }
    }

    /// `self >> n`, or zero when `n >= BITS`.
    #[inline]
    fn shr_bits(self, n: u32) -> Self {
        if n >= Self::BITS {
            Self::zero()
        } else {
            self >> n as usize
        }
    }

    /// Mask of the low `n` bits (all ones when `n >= BITS`).
    #[inline]
    fn low_mask(n: u32) -> Self {
        if n >= Self::BITS {
            Self::max_value()
        } else {
            (Self::one() << n as usize) - Self::one()
        }
    }

    /// Number of significant bits (`0` for zero).
    #[inline]
    fn bit_len(self) -> u32 {
        Self::BITS - self.leading_zeros()
    }
}

/// Number of cascade steps for `n` significant bits: `ceil(log2(n))`.
#[inline]
const fn cascade_steps(n: u32) -> u32 {
    if n <= 1 {
        0
    } else {
        u32::BITS - (n - 1).leading_zeros()
    }
}

macro_rules! impl_address {
    ($($t:ty),*) => {$(
        impl Address for $t {
            const BITS: u32 = <$t>::BITS;

            #[inline]
            fn dilate<const D: usize>(self) -> Self {
                if D <= 1 {
                    return self;
                }
                let d = D as u32;
                let n = Self::BITS / d;
                let masks = &Spread::<D>::MASKS;
                let mut x = self & <Self as Address>::low_mask(n);
                let mut t = cascade_steps(n);
                while t > 0 {
                    t -= 1;
                    let s = 1u32 << t;
                    x = (x | (x << (s * (d - 1)))) & (masks[t as usize] as $t);
                }
                x
            }

            #[inline]
            fn undilate<const D: usize>(self) -> Self {
                if D <= 1 {
                    return self;
                }
                let d = D as u32;
                let n = Self::BITS / d;
                let masks = &Spread::<D>::MASKS;
                let mut x = self & (masks[0] as $t);
                for t in 0..cascade_steps(n) {
                    let s = 1u32 << t;
                    x = (x | (x >> (s * (d - 1)))) & (masks[t as usize + 1] as $t);
                }
                x & <Self as Address>::low_mask(n)
            }

            #[inline]
            fn to_u64_lossless(self) -> u64 {
                self as u64
            }

            #[inline]
            fn from_u64_truncating(v: u64) -> Self {
                v as $t
            }
        }
    )*};
}

impl_address!(u32, u64);

/// Free-function form of [`Address::dilate`].
#[inline]
pub fn dilate<const D: usize, I: Address>(x: I) -> I {
    x.dilate::<D>()
}

/// Free-function form of [`Address::undilate`].
#[inline]
pub fn undilate<const D: usize, I: Address>(y: I) -> I {
    y.undilate::<D>()
}
