use super::*;

/// `00000000ffff0000...0000`, the difficulty-1 target.
pub const HIGHEST_TARGET: U256 = U256([0, 0, 0, 0xffff_0000]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, DeserializeFromStr, SerializeDisplay)]
pub struct Target(U256);

impl Target {
    pub const MAX: Self = Self(U256::MAX);
    pub const HIGHEST: Self = Self(HIGHEST_TARGET);

    pub fn from_be_bytes(bytes: [u8; 32]) -> Self {
        Self(U256::from_big_endian(&bytes))
    }

    pub fn to_be_bytes(self) -> [u8; 32] {
        self.0.to_big_endian()
    }

    /// Targets as returned by `createauxblock`, which are little-endian hex.
    pub fn from_le_hex(s: &str) -> Result<Self, PoolError> {
        codec::reverse_hex_pairs(s)?.parse()
    }

    pub fn from_bits(bits: &str) -> Result<Self, PoolError> {
        if bits.len() != 8 {
            return Err(PoolError::encoding(format!(
                "compact bits `{bits}` must be 8 hex characters"
            )));
        }

        let compact = u32::from_str_radix(bits, 16)
            .map_err(|err| PoolError::encoding(format!("invalid compact bits `{bits}`: {err}")))?;

        Self::from_compact(compact)
    }

    pub fn from_compact(compact: u32) -> Result<Self, PoolError> {
        let exponent = compact >> 24;
        let mantissa = compact & 0x007f_ffff;

        if mantissa != 0 && compact & 0x0080_0000 != 0 {
            return Err(PoolError::encoding(format!(
                "compact bits {compact:08x} encode a negative target"
            )));
        }

        if mantissa != 0
            && (exponent > 34
                || (mantissa > 0xff && exponent > 33)
                || (mantissa > 0xffff && exponent > 32))
        {
            return Err(PoolError::encoding(format!(
                "compact bits {compact:08x} overflow 256 bits"
            )));
        }

        let mantissa = U256::from(mantissa);

        Ok(Self(if exponent <= 3 {
            mantissa >> (8 * (3 - exponent) as usize)
        } else {
            mantissa << (8 * (exponent - 3) as usize)
        }))
    }

    pub fn to_compact(self) -> u32 {
        let mut size = self.0.bits().div_ceil(8) as u32;

        let mut compact = if size <= 3 {
            (self.0.low_u64() << (8 * (3 - size))) as u32
        } else {
            (self.0 >> (8 * (size - 3) as usize)).low_u64() as u32
        };

        if compact & 0x0080_0000 != 0 {
            compact >>= 8;
            size += 1;
        }

        compact | (size << 24)
    }

    /// `highest / self` as a float. A zero target is infinitely difficult.
    pub fn to_difficulty(self) -> f64 {
        if self.0.is_zero() {
            return f64::INFINITY;
        }

        to_f64(HIGHEST_TARGET) / to_f64(self.0)
    }

    /// `floor(highest / difficulty)`, saturating at the 256-bit maximum.
    pub fn from_difficulty(difficulty: f64) -> Result<Self, PoolError> {
        if !difficulty.is_finite() || difficulty <= 0.0 {
            return Err(PoolError::encoding(format!(
                "difficulty must be finite and positive, got {difficulty}"
            )));
        }

        let (mantissa, exponent) = decompose(difficulty);

        if exponent >= 0 {
            let shifted = match usize::try_from(exponent) {
                Ok(shift) if shift < 256 => HIGHEST_TARGET >> shift,
                _ => U256::zero(),
            };

            return Ok(Self(shifted / U256::from(mantissa)));
        }

        let shift = exponent.unsigned_abs() as usize;

        if shift >= 256 {
            return Ok(Self::MAX);
        }

        let quotient = (U512::from(HIGHEST_TARGET) << shift) / U512::from(mantissa);

        Ok(Self(U256::try_from(quotient).unwrap_or(U256::MAX)))
    }

    pub fn as_u256(self) -> U256 {
        self.0
    }
}

impl From<U256> for Target {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl FromStr for Target {
    type Err = PoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s.len() > 64 {
            return Err(PoolError::encoding(format!(
                "target `{s}` must be 1 to 64 hex characters"
            )));
        }

        let padded = format!("{s:0>64}");
        let mut bytes = [0u8; 32];

        hex::decode_to_slice(&padded, &mut bytes)
            .map_err(|err| PoolError::encoding(format!("invalid target `{s}`: {err}")))?;

        Ok(Self::from_be_bytes(bytes))
    }
}

impl Display for Target {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.to_be_bytes()))
    }
}

/// Splits a positive finite float into an integer mantissa and a power of two.
fn decompose(value: f64) -> (u64, i32) {
    let bits = value.to_bits();
    let exponent = ((bits >> 52) & 0x7ff) as i32;
    let fraction = bits & ((1 << 52) - 1);

    if exponent == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1 << 52), exponent - 1075)
    }
}

fn to_f64(value: U256) -> f64 {
    value
        .0
        .iter()
        .rev()
        .fold(0.0, |acc, limb| acc * 18_446_744_073_709_551_616.0 + *limb as f64)
}
