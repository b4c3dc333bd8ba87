//! Bit-packed codec for a single sector sweep record.
//!
//! # Record Layout
//! ```text
//! offset  len  field
//!      0    4  ctr         (u32, little-endian)
//!      4    6  src         (MAC address)
//!     10    3  swp         (packed direction / countdown / sector)
//!     13    1  snr         (packed integer / fraction nibbles)
//!     14    8  dmg_tmstmp  (u64, big-endian)
//!     22    2  padding
//! ```
//!
//! # Packed Sweep Bytes
//! ```text
//! byte0: [c6 c5 c4 c3 c2 c1 c0 d ]
//! byte1: [s5 s4 s3 s2 s1 s0 c8 c7]
//! byte2: [ -  -  -  -  -  - s7 s6]
//! ```
//! where `d` is the direction bit, `c*` the 9-bit countdown and `s*` the 8-bit sector.
//!
//! Every function here is pure. Decoding never fails on field values, only on slice
//! length; encoding rejects values that do not fit their bit width.

use crate::error::{AppResult, SweepError};
use serde::Serialize;
use std::fmt;

/// Serialized size of one record in bytes (including trailing padding).
pub const RECORD_LEN: usize = 24;

const CTR_OFFSET: usize = 0;
const SRC_OFFSET: usize = 4;
const SWP_OFFSET: usize = 10;
const SNR_OFFSET: usize = 13;
const TMSTMP_OFFSET: usize = 14;

/// Width of the packed sweep field in bytes.
pub const SWP_LEN: usize = 3;
/// Width of the damage timestamp field in bytes.
pub const TMSTMP_LEN: usize = 8;

/// Bit width of the direction flag.
pub const DIRECTION_BITS: u32 = 1;
/// Bit width of the countdown field.
pub const COUNTDOWN_BITS: u32 = 9;
/// Bit width of the sector field.
pub const SECTOR_BITS: u32 = 8;
/// Bit width of each SNR nibble.
pub const SNR_NIBBLE_BITS: u32 = 4;

/// Largest representable direction value.
pub const DIRECTION_MAX: u32 = (1 << DIRECTION_BITS) - 1;
/// Largest representable countdown value.
pub const COUNTDOWN_MAX: u32 = (1 << COUNTDOWN_BITS) - 1;
/// Largest representable sector value.
pub const SECTOR_MAX: u32 = (1 << SECTOR_BITS) - 1;

const SNR_NIBBLE_MASK: u8 = (1 << SNR_NIBBLE_BITS) - 1;

/// Six-byte hardware address of the sweep transmitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacAddress(pub [u8; 6]);

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl Serialize for MacAddress {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Unpacked contents of the three `swp` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SectorSweep {
    /// Sweep direction bit (0 or 1).
    pub direction: u8,
    /// Countdown, 0..=511.
    pub countdown: u16,
    /// Sector index, 0..=255.
    pub sector: u8,
}

impl SectorSweep {
    /// Build a sweep value, rejecting anything that does not fit its bit width.
    pub fn new(direction: u8, countdown: u16, sector: u8) -> AppResult<Self> {
        check_range("direction", u32::from(direction), DIRECTION_MAX)?;
        check_range("countdown", u32::from(countdown), COUNTDOWN_MAX)?;
        // sector is a full u8, so it always fits
        Ok(Self {
            direction,
            countdown,
            sector,
        })
    }

    /// Unpack the three raw `swp` bytes.
    pub fn decode(swp: [u8; SWP_LEN]) -> Self {
        let direction = swp[0] & 0x01;
        let countdown = u16::from(swp[0] >> 1) | (u16::from(swp[1] & 0x03) << 7);
        let sector = (swp[1] >> 2) | ((swp[2] & 0x03) << 6);
        Self {
            direction,
            countdown,
            sector,
        }
    }

    /// Pack into the three raw `swp` bytes. Unused high bits of byte 2 are zero.
    pub fn encode(&self) -> [u8; SWP_LEN] {
        let dir = self.direction & 0x01;
        let cdown = self.countdown & COUNTDOWN_MAX as u16;
        [
            dir | (((cdown & 0x7f) as u8) << 1),
            ((cdown >> 7) as u8 & 0x03) | ((self.sector & 0x3f) << 2),
            (self.sector >> 6) & 0x03,
        ]
    }
}

fn check_range(field: &'static str, value: u32, max: u32) -> AppResult<()> {
    if value > max {
        return Err(SweepError::FieldOutOfRange { field, value, max });
    }
    Ok(())
}

/// Packed signal-to-noise byte: high nibble integer part, low nibble sixteenths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Snr(pub u8);

impl Snr {
    /// Build from an integer part and a fractional nibble (both 0..=15).
    pub fn from_parts(integer: u8, nibble: u8) -> AppResult<Self> {
        let max = u32::from(SNR_NIBBLE_MASK);
        check_range("snr_integer", u32::from(integer), max)?;
        check_range("snr_nibble", u32::from(nibble), max)?;
        Ok(Self((integer << SNR_NIBBLE_BITS) | nibble))
    }

    /// Raw byte as stored.
    pub fn raw(self) -> u8 {
        self.0
    }

    /// Integer part, 0..=15.
    pub fn integer(self) -> u8 {
        self.0 >> SNR_NIBBLE_BITS
    }

    /// Fractional part as two decimal digits, rounded from nibble/16. Range 0..=99.
    pub fn fraction(self) -> u8 {
        let nibble = u16::from(self.0 & SNR_NIBBLE_MASK);
        ((nibble * 100 + 8) >> SNR_NIBBLE_BITS) as u8
    }
}

impl fmt::Display for Snr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.integer(), self.fraction())
    }
}

/// Fold eight bytes into an unsigned big-endian value, wrapping on overflow.
pub fn decode_timestamp(bytes: [u8; TMSTMP_LEN]) -> u64 {
    bytes
        .iter()
        .fold(0u64, |acc, &b| acc.wrapping_mul(256).wrapping_add(u64::from(b)))
}

/// Inverse of [`decode_timestamp`].
pub fn encode_timestamp(value: u64) -> [u8; TMSTMP_LEN] {
    value.to_be_bytes()
}

/// One decoded sector sweep measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepRecord {
    /// Hardware counter.
    pub ctr: u32,
    /// Transmitter address.
    pub src: MacAddress,
    /// Direction, countdown and sector.
    pub sweep: SectorSweep,
    /// Packed SNR.
    pub snr: Snr,
    /// Damage timestamp from the radio.
    pub dmg_tmstmp: u64,
}

impl SweepRecord {
    /// Decode one record from the front of `bytes`.
    ///
    /// Returns `TruncatedRecord` if fewer than [`RECORD_LEN`] bytes are available.
    /// Bytes past [`RECORD_LEN`] are ignored.
    pub fn decode(bytes: &[u8]) -> AppResult<Self> {
        let Some(raw) = bytes.get(..RECORD_LEN) else {
            return Err(SweepError::TruncatedRecord {
                expected: RECORD_LEN,
                actual: bytes.len(),
            });
        };

        Ok(Self {
            ctr: u32::from_le_bytes(field(raw, CTR_OFFSET)),
            src: MacAddress(field(raw, SRC_OFFSET)),
            sweep: SectorSweep::decode(field(raw, SWP_OFFSET)),
            snr: Snr(raw[SNR_OFFSET]),
            dmg_tmstmp: decode_timestamp(field(raw, TMSTMP_OFFSET)),
        })
    }

    /// Serialize into the exact on-wire layout; padding bytes are zero.
    pub fn encode(&self) -> [u8; RECORD_LEN] {
        let mut out = [0u8; RECORD_LEN];
        out[CTR_OFFSET..SRC_OFFSET].copy_from_slice(&self.ctr.to_le_bytes());
        out[SRC_OFFSET..SWP_OFFSET].copy_from_slice(&self.src.0);
        out[SWP_OFFSET..SNR_OFFSET].copy_from_slice(&self.sweep.encode());
        out[SNR_OFFSET] = self.snr.raw();
        out[TMSTMP_OFFSET..TMSTMP_OFFSET + TMSTMP_LEN]
            .copy_from_slice(&encode_timestamp(self.dmg_tmstmp));
        out
    }
}

/// Copy a fixed-width field out of an already length-checked record slice.
fn field<const N: usize>(raw: &[u8], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&raw[offset..offset + N]);
    out
}
