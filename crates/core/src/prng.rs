// BringWire - RISC-V SoC Bring-up Diagnostics
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

/// Feedback polynomial of the test-vector generator.
pub const FEEDBACK_POLY: u32 = 0x8000_0057;

/// Default seed used by the deployed diagnostics.
pub const DEFAULT_SEED: u32 = 0xACE1;

/// Galois-form 32-bit linear-feedback shift register.
///
/// Deterministic given its seed and cheap enough for bare metal; this is a
/// test-vector generator, not a cryptographic source. A zero seed is a
/// degenerate absorbing state (the stream stays zero forever) and is the
/// caller's responsibility to avoid; any non-zero state can never reach zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lfsr32 {
    state: u32,
}

impl Lfsr32 {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    pub fn state(&self) -> u32 {
        self.state
    }

    /// Advance the register one step and return the new state.
    pub fn next_value(&mut self) -> u32 {
        let lsb = self.state & 1;
        self.state >>= 1;
        if lsb != 0 {
            self.state ^= FEEDBACK_POLY;
        }
        self.state
    }
}

impl Iterator for Lfsr32 {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        Some(self.next_value())
    }
}
