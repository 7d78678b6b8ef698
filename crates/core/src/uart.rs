// BringWire - RISC-V SoC Bring-up Diagnostics
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Blocking UART transport over an exclusively-owned register bus.
//!
//! All waits are busy-wait spins on the status register, matching the
//! hardware behavior. The transport itself carries no lock: if the
//! receive-interrupt echo path transmits while the main line is mid-send,
//! the two byte streams interleave on the wire. That hazard is part of the
//! deployed diagnostics and is deliberately not fixed here.

use crate::regs::{Status, UartReg, UartRegisterBus};
use crate::{DiagError, DiagResult};
use std::str::FromStr;

/// Transmit-completion handshake profile.
///
/// Two variants of the peripheral shipped with different completion
/// signalling; hardware documentation never settled which one the final
/// silicon uses, so both stay selectable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TxHandshake {
    /// Wait for `TX_BUSY` to pulse high after the data write; the next
    /// send's leading wait observes it dropping again.
    #[default]
    BusyPulse,
    /// Wait for `TX_DONE`, then clear it by writing the bit back.
    DoneClear,
}

impl FromStr for TxHandshake {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let v = value.trim().to_ascii_lowercase();
        match v.as_str() {
            "busy-pulse" | "busy" | "pulse" => Ok(Self::BusyPulse),
            "done-clear" | "done" | "tx-done" => Ok(Self::DoneClear),
            _ => Err(format!(
                "unsupported transmit handshake '{}'; supported: busy-pulse, done-clear",
                value
            )),
        }
    }
}

/// Blocking transport over the UART register block.
#[derive(Debug)]
pub struct Uart<B: UartRegisterBus> {
    bus: B,
    handshake: TxHandshake,
    spin_limit: Option<u32>,
}

impl<B: UartRegisterBus> Uart<B> {
    /// Take ownership of the register bus. The bus handle moves in, so no
    /// second transport can reach the same block.
    pub fn new(bus: B, handshake: TxHandshake) -> Self {
        Self {
            bus,
            handshake,
            spin_limit: None,
        }
    }

    /// Bound every status spin to `limit` polls, failing with `SpinTimeout`
    /// instead of hanging. Unbounded spins are hardware-accurate; the bound
    /// exists for harnesses that cannot model real peripheral timing.
    pub fn with_spin_limit(mut self, limit: u32) -> Self {
        self.spin_limit = Some(limit);
        self
    }

    pub fn handshake(&self) -> TxHandshake {
        self.handshake
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn into_bus(self) -> B {
        self.bus
    }

    /// Program the baud divisor (reference clock / desired baud).
    pub fn init(&mut self, divisor: u32) {
        tracing::info!(divisor, "configuring uart");
        self.bus.write(UartReg::Cfgr, divisor);
    }

    fn wait_status<F>(&mut self, flag: &'static str, mut ready: F) -> DiagResult<Status>
    where
        F: FnMut(Status) -> bool,
    {
        let mut spins = 0;
        loop {
            let sr = Status::from_bits_truncate(self.bus.read(UartReg::Sr));
            if ready(sr) {
                return Ok(sr);
            }
            if let Some(limit) = self.spin_limit {
                spins += 1;
                if spins >= limit {
                    return Err(DiagError::SpinTimeout { flag, limit });
                }
            }
        }
    }

    /// Send one byte, blocking through the configured handshake.
    pub fn send_byte(&mut self, byte: u8) -> DiagResult<()> {
        self.wait_status("tx_busy", |sr| !sr.contains(Status::TX_BUSY))?;
        self.bus.write(UartReg::Txdr, byte as u32);
        match self.handshake {
            TxHandshake::BusyPulse => {
                self.wait_status("tx_busy", |sr| sr.contains(Status::TX_BUSY))?;
            }
            TxHandshake::DoneClear => {
                self.wait_status("tx_done", |sr| sr.contains(Status::TX_DONE))?;
                self.bus.write(UartReg::Sr, Status::TX_DONE.bits());
            }
        }
        Ok(())
    }

    /// Send a byte slice in order. An empty slice touches no register.
    pub fn send_bytes(&mut self, bytes: &[u8]) -> DiagResult<()> {
        for &byte in bytes {
            self.send_byte(byte)?;
        }
        Ok(())
    }

    pub fn send_str(&mut self, s: &str) -> DiagResult<()> {
        self.send_bytes(s.as_bytes())
    }

    /// Block until a byte arrives, read it and acknowledge `RX_DONE`.
    pub fn receive_byte(&mut self) -> DiagResult<u8> {
        self.wait_status("rx_done", |sr| sr.contains(Status::RX_DONE))?;
        let byte = self.bus.read(UartReg::Rxdr) as u8;
        self.bus.write(UartReg::Sr, Status::RX_DONE.bits());
        Ok(byte)
    }

    /// Acknowledge `RX_DONE` without touching the data register. The
    /// receive-interrupt handler must do this before any other work.
    pub fn clear_rx_done(&mut self) {
        self.bus.write(UartReg::Sr, Status::RX_DONE.bits());
    }

    /// Raw read of the receive data register, no wait, no acknowledge.
    pub fn rx_data(&mut self) -> u8 {
        self.bus.read(UartReg::Rxdr) as u8
    }
}
