// BringWire - RISC-V SoC Bring-up Diagnostics
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! YAML board profiles for the bring-up diagnostics.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default schema version for YAML profiles
fn default_schema_version() -> String {
    "1.0".to_string()
}

fn default_seed() -> u32 {
    0xACE1
}

fn default_uart_base() -> u32 {
    0x0002_0000
}

fn default_handshake() -> String {
    "busy-pulse".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UartProfile {
    #[serde(default = "default_uart_base")]
    pub base_address: u32,
    /// Transmit-completion handshake: "busy-pulse" or "done-clear". Parsed
    /// by the transport, kept as a string here so profiles stay readable.
    #[serde(default = "default_handshake")]
    pub handshake: String,
    #[serde(default)]
    pub irq: Option<u32>,
}

impl Default for UartProfile {
    fn default() -> Self {
        Self {
            base_address: default_uart_base(),
            handshake: default_handshake(),
            irq: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BoardProfile {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    pub name: String,
    /// Reference clock feeding the UART divisor, in Hz.
    pub clock_hz: u32,
    pub baud: u32,
    #[serde(default)]
    pub uart: UartProfile,
    /// LFSR seed for the test-vector stream. Must be non-zero; zero is the
    /// generator's absorbing state.
    #[serde(default = "default_seed")]
    pub seed: u32,
}

impl BoardProfile {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read board profile {:?}", path))?;
        let profile = Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse board profile {:?}", path))?;
        tracing::debug!("loaded board profile '{}'", profile.name);
        Ok(profile)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let profile: Self = serde_yaml::from_str(content)?;
        profile.validate()?;
        Ok(profile)
    }

    /// The 50 MHz / 115200 baud profile the deployed diagnostics use.
    pub fn default_board() -> Self {
        Self {
            schema_version: default_schema_version(),
            name: "bringup-rv32".to_string(),
            clock_hz: 50_000_000,
            baud: 115_200,
            uart: UartProfile::default(),
            seed: default_seed(),
        }
    }

    /// Baud divisor programmed into the configuration register.
    pub fn divisor(&self) -> u32 {
        self.clock_hz / self.baud
    }

    pub fn validate(&self) -> Result<()> {
        if self.clock_hz == 0 {
            bail!("clock_hz must be non-zero");
        }
        if self.baud == 0 || self.baud > self.clock_hz {
            bail!(
                "baud {} is not reachable from a {} Hz reference clock",
                self.baud,
                self.clock_hz
            );
        }
        if self.seed == 0 {
            bail!("seed 0 is the LFSR's degenerate absorbing state");
        }
        Ok(())
    }
}
