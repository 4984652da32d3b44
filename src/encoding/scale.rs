//! SCALE codec subset used by Substrate extrinsics
//!
//! Fixed-width integers are little-endian. `Compact` uses the four SCALE
//! length modes and covers the full `u128` range.

/// Types with a SCALE encoding
pub trait ScaleEncode {
    fn encode_to(&self, out: &mut Vec<u8>);

    fn to_scale(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_to(&mut out);
        out
    }
}

macro_rules! impl_fixed_int {
    ($($t:ty),*) => {
        $(
            impl ScaleEncode for $t {
                fn encode_to(&self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }
            }
        )*
    };
}

impl_fixed_int!(u8, u16, u32, u64, u128);

impl ScaleEncode for bool {
    fn encode_to(&self, out: &mut Vec<u8>) {
        out.push(u8::from(*self));
    }
}

impl<T: ScaleEncode> ScaleEncode for Option<T> {
    fn encode_to(&self, out: &mut Vec<u8>) {
        match self {
            None => out.push(0x00),
            Some(value) => {
                out.push(0x01);
                value.encode_to(out);
            }
        }
    }
}

impl<T: ScaleEncode> ScaleEncode for Vec<T> {
    fn encode_to(&self, out: &mut Vec<u8>) {
        Compact(self.len() as u128).encode_to(out);
        for item in self {
            item.encode_to(out);
        }
    }
}

impl<T: ScaleEncode + ?Sized> ScaleEncode for &T {
    fn encode_to(&self, out: &mut Vec<u8>) {
        (**self).encode_to(out)
    }
}

/// Variable-length integer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Compact(pub u128);

impl ScaleEncode for Compact {
    fn encode_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&encode_compact(self.0));
    }
}

/// Length-prefixed raw bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bytes(pub Vec<u8>);

impl ScaleEncode for Bytes {
    fn encode_to(&self, out: &mut Vec<u8>) {
        Compact(self.0.len() as u128).encode_to(out);
        out.extend_from_slice(&self.0);
    }
}

/// Bytes copied verbatim (already-encoded calls, hashes, keys)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raw(pub Vec<u8>);

impl ScaleEncode for Raw {
    fn encode_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.0);
    }
}

pub fn encode_compact(value: u128) -> Vec<u8> {
    if value < 1 << 6 {
        vec![(value as u8) << 2]
    } else if value < 1 << 14 {
        (((value as u16) << 2) | 0b01).to_le_bytes().to_vec()
    } else if value < 1 << 30 {
        (((value as u32) << 2) | 0b10).to_le_bytes().to_vec()
    } else {
        let le = value.to_le_bytes();
        let significant = 16 - (value.leading_zeros() as usize / 8);
        let len = significant.max(4);
        let mut out = Vec::with_capacity(len + 1);
        out.push((((len - 4) as u8) << 2) | 0b11);
        out.extend_from_slice(&le[..len]);
        out
    }
}

/// Decode a compact integer, returning the value and bytes consumed
pub fn decode_compact(data: &[u8]) -> Option<(u128, usize)> {
    let first = *data.first()?;
    match first & 0b11 {
        0b00 => Some(((first >> 2) as u128, 1)),
        0b01 => {
            let raw = u16::from_le_bytes(data.get(..2)?.try_into().ok()?);
            let value = (raw >> 2) as u128;
            (value >= 1 << 6).then_some((value, 2))
        }
        0b10 => {
            let raw = u32::from_le_bytes(data.get(..4)?.try_into().ok()?);
            let value = (raw >> 2) as u128;
            (value >= 1 << 14).then_some((value, 4))
        }
        _ => {
            let len = (first >> 2) as usize + 4;
            if len > 16 {
                return None;
            }
            let body = data.get(1..1 + len)?;
            // Minimal form: the top byte is non-zero
            if body[len - 1] == 0 {
                return None;
            }
            let mut le = [0u8; 16];
            le[..len].copy_from_slice(body);
            let value = u128::from_le_bytes(le);
            (value >= 1 << 30).then_some((value, 1 + len))
        }
    }
}

/// Transaction validity window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Era {
    Immortal,
    Mortal { period: u64, phase: u64 },
}

impl Era {
    /// Mortal era anchored at `block`; a zero period means immortal
    pub fn mortal(block: u64, period: u64) -> Self {
        if period == 0 {
            return Era::Immortal;
        }
        let period = period
            .checked_next_power_of_two()
            .unwrap_or(1 << 16)
            .clamp(4, 1 << 16);
        let phase = block % period;
        let quantize_factor = (period >> 12).max(1);
        Era::Mortal {
            period,
            phase: phase / quantize_factor * quantize_factor,
        }
    }
}

impl ScaleEncode for Era {
    fn encode_to(&self, out: &mut Vec<u8>) {
        match *self {
            Era::Immortal => out.push(0x00),
            Era::Mortal { period, phase } => {
                let quantize_factor = (period >> 12).max(1);
                let low = (period.trailing_zeros().saturating_sub(1)).clamp(1, 15) as u16;
                let encoded = low | (((phase / quantize_factor) as u16) << 4);
                out.extend_from_slice(&encoded.to_le_bytes());
            }
        }
    }
}
