// BringWire - RISC-V SoC Bring-up Diagnostics
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

pub mod encoder;
pub mod harness;
pub mod irq;
pub mod peripherals;
pub mod prng;
pub mod regs;
pub mod uart;


pub use regs::{Status, UartReg, UartRegisterBus};

#[derive(Debug, thiserror::Error)]
pub enum DiagError {
    #[error("spin wait on {flag} gave up after {limit} iterations")]
    SpinTimeout { flag: &'static str, limit: u32 },
    #[error("encoding buffer of {0} bytes cannot hold the value")]
    CapacityExceeded(usize),
}

pub type DiagResult<T> = Result<T, DiagError>;
