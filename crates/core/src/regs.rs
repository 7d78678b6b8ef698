// BringWire - RISC-V SoC Bring-up Diagnostics
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use bitflags::bitflags;

/// Machine-external interrupt line wired to the UART receiver.
pub const UART_RXI: u32 = 16;

/// The four 32-bit registers of the UART block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UartReg {
    /// Configuration register (write-only baud divisor).
    Cfgr,
    /// Transmit data register.
    Txdr,
    /// Receive data register.
    Rxdr,
    /// Status register. `TX_DONE` and `RX_DONE` are write-one-to-clear.
    Sr,
}

impl UartReg {
    /// Byte offset from the peripheral base.
    pub const fn offset(self) -> u32 {
        match self {
            UartReg::Cfgr => 0x00,
            UartReg::Txdr => 0x04,
            UartReg::Rxdr => 0x08,
            UartReg::Sr => 0x0C,
        }
    }
}

bitflags! {
    /// Status register bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Status: u32 {
        const TX_BUSY = 1 << 0;
        const TX_DONE = 1 << 1;
        const RX_DONE = 1 << 3;
    }
}

/// Handle to the UART register block.
///
/// Exactly one transport owns the handle for a given block; there is no way
/// to alias a second handle to the same registers. Reads take `&mut self`
/// because reading a register is a bus transaction with observable side
/// effects on the peripheral.
pub trait UartRegisterBus {
    fn read(&mut self, reg: UartReg) -> u32;
    fn write(&mut self, reg: UartReg, value: u32);
}
