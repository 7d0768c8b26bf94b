//! Fixed-width bit vectors used to pack and unpack instruction encodings.
//!
//! Every encoder in this crate is written as a [`BitField::concat`] of fields
//! ordered high-to-low, and every decoder as [`BitField::slice`] calls on the
//! fetched word. Values are stored masked to their width; [`BitField::n`] and
//! [`BitField::sn`] give the unsigned and two's-complement readings.

use thiserror::Error;

/// Widest supported bit field.
pub const MAX_WIDTH: u32 = 64;

/// Errors raised when constructing or slicing a [`BitField`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BitFieldError {
    /// Width was zero or wider than [`MAX_WIDTH`].
    #[error("bit field width {width} is not in the valid range [1,{MAX_WIDTH}]")]
    InvalidWidth {
        /// Requested width.
        width: u32,
    },
    /// Value is not representable at the requested width.
    #[error("value {value} does not fit into {width} bits")]
    ValueOutOfRange {
        /// Rejected value.
        value: i128,
        /// Requested width.
        width: u32,
    },
    /// Slice bound lies outside the field.
    #[error("bit index {index} is out of range for a {width}-bit field")]
    IndexOutOfRange {
        /// Offending (normalized) index.
        index: i32,
        /// Width of the sliced field.
        width: u32,
    },
}

/// A value of exactly `width` bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BitField {
    bits: u64,
    width: u32,
}

const fn width_mask(width: u32) -> u64 {
    if width >= MAX_WIDTH {
        u64::MAX
    } else {
        (1_u64 << width) - 1
    }
}

/// Sign-extends the low `bits` bits of `value` to a full `i64`.
#[must_use]
pub const fn sign_extend(value: i64, bits: u32) -> i64 {
    if bits == 0 || bits >= MAX_WIDTH {
        return value;
    }
    let shift = MAX_WIDTH - bits;
    (value << shift) >> shift
}

impl BitField {
    /// Creates a field from a signed or unsigned value.
    ///
    /// # Errors
    ///
    /// Returns [`BitFieldError::InvalidWidth`] for a width of zero or above
    /// [`MAX_WIDTH`], and [`BitFieldError::ValueOutOfRange`] when `value` lies
    /// outside `[-2^(width-1), 2^width - 1]`.
    pub fn new(value: i64, width: u32) -> Result<Self, BitFieldError> {
        Self::from_wide(i128::from(value), width)
    }

    /// Creates a field from raw unsigned bits.
    ///
    /// # Errors
    ///
    /// Same conditions as [`BitField::new`].
    pub fn from_bits(bits: u64, width: u32) -> Result<Self, BitFieldError> {
        Self::from_wide(i128::from(bits), width)
    }

    fn from_wide(value: i128, width: u32) -> Result<Self, BitFieldError> {
        if width == 0 || width > MAX_WIDTH {
            return Err(BitFieldError::InvalidWidth { width });
        }
        let min = -(1_i128 << (width - 1));
        let max = (1_i128 << width) - 1;
        if value < min || value > max {
            return Err(BitFieldError::ValueOutOfRange { value, width });
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let bits = (value as u64) & width_mask(width);
        Ok(Self { bits, width })
    }

    /// Field width in bits.
    #[must_use]
    pub const fn width(self) -> u32 {
        self.width
    }

    /// Unsigned value.
    #[must_use]
    pub const fn n(self) -> u64 {
        self.bits
    }

    /// Two's-complement value at the field's own width.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn sn(self) -> i64 {
        sign_extend(self.bits as i64, self.width)
    }

    fn normalize(self, index: i32) -> Result<u32, BitFieldError> {
        #[allow(clippy::cast_possible_wrap)]
        let width = self.width as i32;
        let resolved = if index < 0 { index + width } else { index };
        if resolved < 0 || resolved >= width {
            return Err(BitFieldError::IndexOutOfRange {
                index: resolved,
                width: self.width,
            });
        }
        #[allow(clippy::cast_sign_loss)]
        Ok(resolved as u32)
    }

    /// Returns bits `hi..=lo` as a new field of width `hi - lo + 1`.
    ///
    /// Negative bounds count from the top bit (`-1` is the most significant
    /// bit) and swapped bounds are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`BitFieldError::IndexOutOfRange`] when a bound lies outside
    /// the field.
    pub fn slice(self, hi: i32, lo: i32) -> Result<Self, BitFieldError> {
        let mut hi = self.normalize(hi)?;
        let mut lo = self.normalize(lo)?;
        if hi < lo {
            std::mem::swap(&mut hi, &mut lo);
        }
        let width = hi - lo + 1;
        Ok(Self {
            bits: (self.bits >> lo) & width_mask(width),
            width,
        })
    }

    /// Returns a single bit as a one-bit field.
    ///
    /// # Errors
    ///
    /// Returns [`BitFieldError::IndexOutOfRange`] when `index` lies outside
    /// the field.
    pub fn bit(self, index: i32) -> Result<Self, BitFieldError> {
        self.slice(index, index)
    }

    /// Concatenates `parts` high-to-low into one field.
    ///
    /// # Errors
    ///
    /// Returns [`BitFieldError::InvalidWidth`] when the combined width is
    /// zero or exceeds [`MAX_WIDTH`].
    pub fn concat(parts: &[Self]) -> Result<Self, BitFieldError> {
        let width: u32 = parts.iter().map(|part| part.width).sum();
        if width == 0 || width > MAX_WIDTH {
            return Err(BitFieldError::InvalidWidth { width });
        }
        let bits = parts.iter().fold(0_u64, |acc, part| {
            acc.checked_shl(part.width).unwrap_or(0) | part.bits
        });
        Ok(Self { bits, width })
    }

    /// Adds modulo `2^max(width)`.
    #[must_use]
    pub const fn wrapping_add(self, other: Self) -> Self {
        let width = if self.width > other.width {
            self.width
        } else {
            other.width
        };
        Self {
            bits: self.bits.wrapping_add(other.bits) & width_mask(width),
            width,
        }
    }

    /// Subtracts modulo `2^max(width)`.
    #[must_use]
    pub const fn wrapping_sub(self, other: Self) -> Self {
        let width = if self.width > other.width {
            self.width
        } else {
            other.width
        };
        Self {
            bits: self.bits.wrapping_sub(other.bits) & width_mask(width),
            width,
        }
    }

    /// Two's-complement negation at the field's width.
    #[must_use]
    pub const fn wrapping_neg(self) -> Self {
        Self {
            bits: self.bits.wrapping_neg() & width_mask(self.width),
            width: self.width,
        }
    }
}
