// BringWire - RISC-V SoC Bring-up Diagnostics
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Fixed-buffer decimal encoders for targets with no formatting runtime.
//!
//! The float encoder is a diagnostic formatter: it truncates instead of
//! rounding, and digits beyond the ~7 significant decimal digits of an `f32`
//! carry no information. Neither encoder writes a NUL terminator.

use crate::{DiagError, DiagResult};

/// Hard cap on emitted fractional digits, whatever the buffer allows.
pub const MAX_FRACTION_DIGITS: usize = 16;

/// Encode `value` as a truncating fixed-point decimal into `buf`.
///
/// Returns the number of bytes written. Integer digits are emitted with one
/// trailing byte of the buffer held in reserve, so a capacity of `n` fits at
/// most `n - 2` integer digits (plus sign). Fails with `CapacityExceeded`
/// before overrunning the buffer; a buffer under two bytes fails immediately
/// with nothing written.
pub fn encode_f32(value: f32, buf: &mut [u8]) -> DiagResult<usize> {
    let n = buf.len();
    if n < 2 {
        return Err(DiagError::CapacityExceeded(n));
    }

    let mut pos = 0;
    let mut f = value;
    if f < 0.0 {
        buf[pos] = b'-';
        pos += 1;
        f = -f;
    }

    let mut int_part = f as u32;
    if int_part == 0 {
        if pos + 2 >= n {
            return Err(DiagError::CapacityExceeded(n));
        }
        buf[pos] = b'0';
        pos += 1;
    } else {
        // Digits come out least-significant-first and are reversed in place.
        let digits_start = pos;
        while int_part > 0 {
            if pos + 2 >= n {
                return Err(DiagError::CapacityExceeded(n));
            }
            buf[pos] = b'0' + (int_part % 10) as u8;
            pos += 1;
            int_part /= 10;
        }
        buf[digits_start..pos].reverse();
    }

    // Whatever remains after one byte for the decimal point becomes
    // fractional digits.
    let places = (n - pos - 1).min(MAX_FRACTION_DIGITS);
    if places < 1 {
        return Ok(pos);
    }
    buf[pos] = b'.';
    pos += 1;

    f -= f as u32 as f32;
    for _ in 0..places {
        f *= 10.0;
        let digit = f as u32;
        buf[pos] = b'0' + digit as u8;
        pos += 1;
        f -= digit as f32;
    }

    Ok(pos)
}

/// Encode a signed integer in decimal. Returns the number of bytes written.
pub fn encode_i32(value: i32, buf: &mut [u8]) -> DiagResult<usize> {
    let n = buf.len();
    let mut pos = 0;
    if value < 0 {
        if n == 0 {
            return Err(DiagError::CapacityExceeded(n));
        }
        buf[pos] = b'-';
        pos += 1;
    }

    let mut mag = value.unsigned_abs();
    let digits_start = pos;
    loop {
        if pos >= n {
            return Err(DiagError::CapacityExceeded(n));
        }
        buf[pos] = b'0' + (mag % 10) as u8;
        pos += 1;
        mag /= 10;
        if mag == 0 {
            break;
        }
    }
    buf[digits_start..pos].reverse();

    Ok(pos)
}
