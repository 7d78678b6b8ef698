// BringWire - RISC-V SoC Bring-up Diagnostics
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Diagnostic report loops: thin composition of the LFSR, the encoders and
//! the transport. The bare-metal build runs these forever; hosts pass an
//! iteration count.

use crate::encoder::{encode_f32, encode_i32};
use crate::irq::{interrupt_cause, IrqControl, TrapOutcome, TrapRaise, VectorTable};
use crate::peripherals::uart::RxInject;
use crate::prng::Lfsr32;
use crate::regs::{UartRegisterBus, UART_RXI};
use crate::uart::{TxHandshake, Uart};
use crate::DiagResult;
use bringwire_config::BoardProfile;

/// Line buffer of the float report, as deployed.
pub const LINE_CAPACITY: usize = 64;

/// Build a transport from a board profile: program the divisor and enable
/// the receive-interrupt line.
pub fn configure<B: UartRegisterBus, C: IrqControl>(
    bus: B,
    ctl: &mut C,
    profile: &BoardProfile,
) -> anyhow::Result<Uart<B>> {
    profile.validate()?;
    let handshake: TxHandshake = profile
        .uart
        .handshake
        .parse()
        .map_err(anyhow::Error::msg)?;
    let mut uart = Uart::new(bus, handshake);
    uart.init(profile.divisor());
    ctl.enable_line(profile.uart.irq.unwrap_or(UART_RXI));
    Ok(uart)
}

fn send_bits<B: UartRegisterBus>(uart: &mut Uart<B>, value: u32) -> DiagResult<()> {
    for i in (0..32).rev() {
        uart.send_byte(if (value >> i) & 1 != 0 { b'1' } else { b'0' })?;
    }
    Ok(())
}

/// Hardware-divider exercise: binary renderings of two LFSR operands, their
/// quotient and remainder, one line per iteration.
pub fn divider_report<B: UartRegisterBus>(
    uart: &mut Uart<B>,
    lfsr: &mut Lfsr32,
    iterations: u32,
) -> DiagResult<()> {
    uart.send_str("Starting divider test...\n")?;
    for _ in 0..iterations {
        let a = lfsr.next_value() as i32;
        let b = lfsr.next_value() as i32;
        // The divisor is never zero for a well-seeded LFSR. i32::MIN / -1 is
        // reachable from the stream though, so wrap instead of trapping.
        let quotient = a.wrapping_div(b);
        let remainder = a.wrapping_rem(b);

        send_bits(uart, a as u32)?;
        uart.send_str(" / ")?;
        send_bits(uart, b as u32)?;
        uart.send_str(" = ")?;
        send_bits(uart, quotient as u32)?;
        uart.send_str(" R ")?;
        send_bits(uart, remainder as u32)?;
        uart.send_byte(b'\n')?;
    }
    Ok(())
}

/// Software-float exercise: decimal operands and their quotient encoded by
/// the fixed-buffer formatter, one line per iteration.
pub fn float_report<B: UartRegisterBus>(
    uart: &mut Uart<B>,
    lfsr: &mut Lfsr32,
    iterations: u32,
) -> DiagResult<()> {
    uart.send_str("Starting test...\n")?;
    let mut line = [0u8; LINE_CAPACITY];
    for _ in 0..iterations {
        let a = lfsr.next_value() as i32;
        let b = lfsr.next_value() as i32;
        let result = if b as f32 != 0.0 {
            a as f32 / b as f32
        } else {
            0.0
        };

        let mut pos = encode_i32(a, &mut line)?;
        line[pos..pos + 3].copy_from_slice(b" / ");
        pos += 3;
        pos += encode_i32(b, &mut line[pos..])?;
        line[pos..pos + 3].copy_from_slice(b" = ");
        pos += 3;

        // Deployed line budget: two bytes reserved for the newline, and the
        // float field never grows past 16 bytes.
        let room = (LINE_CAPACITY - 2 - pos).min(16);
        pos += encode_f32(result, &mut line[pos..pos + room])?;
        line[pos] = b'\n';
        pos += 1;

        uart.send_bytes(&line[..pos])?;
    }
    Ok(())
}

/// Feed bytes into the receive path, taking the receive trap for each one
/// the way the wired-up hardware would.
pub fn echo_input<B, C>(
    uart: &mut Uart<B>,
    csr: &mut C,
    table: &VectorTable<B, C>,
    input: &[u8],
    return_addr: u32,
) -> DiagResult<()>
where
    B: UartRegisterBus + RxInject,
    C: IrqControl + TrapRaise,
{
    for &byte in input {
        uart.bus_mut().inject_rx(byte);
        csr.raise(interrupt_cause(UART_RXI), return_addr);
        match table.dispatch(uart, csr)? {
            TrapOutcome::Handled => {}
            TrapOutcome::Halt => break,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::irq::{SimCsr, TrapContext};
    use crate::peripherals::uart::SimUart;
    use crate::prng::DEFAULT_SEED;

    fn sim_uart(handshake: TxHandshake) -> Uart<SimUart> {
        Uart::new(SimUart::new(), handshake).with_spin_limit(64)
    }

    #[test]
    fn test_configure_from_default_board() {
        let mut csr = SimCsr::new();
        let uart = configure(SimUart::new(), &mut csr, &BoardProfile::default_board()).unwrap();
        assert_eq!(uart.bus().cfgr(), 434);
        assert_eq!(uart.handshake(), TxHandshake::BusyPulse);
        assert!(csr.line_enabled(UART_RXI));
    }

    #[test]
    fn test_configure_rejects_unknown_handshake() {
        let mut profile = BoardProfile::default_board();
        profile.uart.handshake = "dma".to_string();
        let mut csr = SimCsr::new();
        assert!(configure(SimUart::new(), &mut csr, &profile).is_err());
    }

    #[test]
    fn test_divider_report_line_format() {
        let mut uart = sim_uart(TxHandshake::BusyPulse);
        let mut lfsr = Lfsr32::new(DEFAULT_SEED);
        divider_report(&mut uart, &mut lfsr, 1).unwrap();

        let out = uart.bus().tx_as_string();
        let mut lines = out.lines();
        assert_eq!(lines.next(), Some("Starting divider test..."));

        let line = lines.next().unwrap();
        let (operands, results) = line.split_once(" = ").unwrap();
        let (a_bits, b_bits) = operands.split_once(" / ").unwrap();
        let (q_bits, r_bits) = results.split_once(" R ").unwrap();
        for field in [a_bits, b_bits, q_bits, r_bits] {
            assert_eq!(field.len(), 32);
        }

        let a = 0x8000_5627_u32;
        let b = 0xC000_2B44_u32;
        assert_eq!(u32::from_str_radix(a_bits, 2).unwrap(), a);
        assert_eq!(u32::from_str_radix(b_bits, 2).unwrap(), b);
        let quotient = (a as i32).wrapping_div(b as i32);
        let remainder = (a as i32).wrapping_rem(b as i32);
        assert_eq!(u32::from_str_radix(q_bits, 2).unwrap(), quotient as u32);
        assert_eq!(u32::from_str_radix(r_bits, 2).unwrap(), remainder as u32);
    }

    #[test]
    fn test_divider_report_iteration_count() {
        let mut uart = sim_uart(TxHandshake::DoneClear);
        let mut lfsr = Lfsr32::new(DEFAULT_SEED);
        divider_report(&mut uart, &mut lfsr, 5).unwrap();
        // Banner plus five report lines.
        assert_eq!(uart.bus().tx_as_string().lines().count(), 6);
    }

    #[test]
    fn test_float_report_line_format() {
        let mut uart = sim_uart(TxHandshake::BusyPulse);
        let mut lfsr = Lfsr32::new(DEFAULT_SEED);
        float_report(&mut uart, &mut lfsr, 1).unwrap();

        let out = uart.bus().tx_as_string();
        let mut lines = out.lines();
        assert_eq!(lines.next(), Some("Starting test..."));

        let a = 0x8000_5627_u32 as i32;
        let b = 0xC000_2B44_u32 as i32;
        let line = lines.next().unwrap();
        // Both operands are negative, the ratio is a hair above two.
        assert!(line.starts_with(&format!("{} / {} = 2.000000", a, b)));
        // Prefix plus a 16-byte encoded float.
        assert_eq!(line.len(), format!("{} / {} = ", a, b).len() + 16);
    }

    #[test]
    fn test_echo_input_accepts_any_csr_backend() {
        #[derive(Default)]
        struct BareCsr {
            mstatus: u32,
            mepc: u32,
            mcause: u32,
            mie: u32,
        }

        impl IrqControl for BareCsr {
            fn context(&self) -> TrapContext {
                TrapContext {
                    cause: self.mcause,
                    status: self.mstatus,
                    return_addr: self.mepc,
                }
            }

            fn set_global_enable(&mut self, enabled: bool) {
                if enabled {
                    self.mstatus |= 1 << 3;
                } else {
                    self.mstatus &= !(1 << 3);
                }
            }

            fn restore(&mut self, ctx: TrapContext) {
                self.mepc = ctx.return_addr;
                self.mstatus = ctx.status;
            }

            fn enable_line(&mut self, line: u32) {
                self.mie |= 1 << line;
            }
        }

        impl TrapRaise for BareCsr {
            fn raise(&mut self, cause: u32, return_addr: u32) {
                self.mcause = cause;
                self.mepc = return_addr;
                self.mstatus &= !(1 << 3);
            }
        }

        let mut uart = sim_uart(TxHandshake::BusyPulse);
        let mut csr = BareCsr::default();
        let table = VectorTable::with_defaults();
        echo_input(&mut uart, &mut csr, &table, b"ab", 0x100).unwrap();
        assert_eq!(uart.bus().tx_bytes(), b"ab");
        assert_eq!(csr.mepc, 0x100);
        assert_eq!(csr.mie, 0);
    }

    #[test]
    fn test_echo_input_loops_bytes_back() {
        let mut uart = sim_uart(TxHandshake::BusyPulse);
        let mut csr = SimCsr::new();
        let table = VectorTable::with_defaults();
        echo_input(&mut uart, &mut csr, &table, b"ping", 0x100).unwrap();
        assert_eq!(uart.bus().tx_bytes(), b"ping");
        assert_eq!(csr.mepc, 0x100);
        assert!(!csr.global_enabled());
    }
}
