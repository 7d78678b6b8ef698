// BringWire - RISC-V SoC Bring-up Diagnostics
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Trap dispatch for the diagnostic firmware.
//!
//! Three vectors exist: the UART receive echo, and two terminal handlers
//! for unknown interrupts and processor exceptions. The terminal handlers
//! emit a diagnostic string best-effort and halt; there is no recovery path
//! for an unexpected trap in bring-up firmware.

use crate::regs::{UartRegisterBus, UART_RXI};
use crate::uart::Uart;
use crate::DiagResult;

/// Interrupt bit of the trap-cause register.
pub const INTERRUPT_BIT: u32 = 1 << 31;

/// Cause value for a machine-external interrupt on `line`.
pub const fn interrupt_cause(line: u32) -> u32 {
    INTERRUPT_BIT | line
}

/// Saved copies of the trap CSRs, scoped to one handler invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrapContext {
    pub cause: u32,
    pub status: u32,
    pub return_addr: u32,
}

/// CSR surface the trap machinery needs: cause/status/return-address
/// capture, the global interrupt enable, and per-line enables.
pub trait IrqControl {
    fn context(&self) -> TrapContext;
    fn set_global_enable(&mut self, enabled: bool);
    /// Restore return address and status from a saved context. Called with
    /// interrupts disabled so the pair lands atomically.
    fn restore(&mut self, ctx: TrapContext);
    fn enable_line(&mut self, line: u32);
}

/// Hardware side of trap entry: latch cause and return address, clear the
/// global enable. Separate from [`IrqControl`] because handlers never raise;
/// only the wired-up interrupt source does.
pub trait TrapRaise {
    fn raise(&mut self, cause: u32, return_addr: u32);
}

/// Scoped nesting guard around interrupt service.
///
/// Entering captures the trap context and re-enables interrupts so a nested
/// trap can be taken. Dropping disables interrupts first and only then
/// restores the saved return address and status; that ordering is what
/// keeps a nested trap from clobbering the restore. The restore runs
/// exactly once on every exit path, early returns included.
#[derive(Debug)]
pub struct NestGuard<'a, C: IrqControl> {
    ctl: &'a mut C,
    saved: TrapContext,
}

impl<'a, C: IrqControl> NestGuard<'a, C> {
    pub fn enter(ctl: &'a mut C) -> Self {
        let saved = ctl.context();
        ctl.set_global_enable(true);
        Self { ctl, saved }
    }
}

impl<C: IrqControl> Drop for NestGuard<'_, C> {
    fn drop(&mut self) {
        self.ctl.set_global_enable(false);
        self.ctl.restore(self.saved);
    }
}

/// The three modeled trap vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapKind {
    UartReceive,
    UnknownInterrupt,
    Exception,
}

impl TrapKind {
    pub fn from_cause(cause: u32) -> Self {
        if cause & INTERRUPT_BIT == 0 {
            TrapKind::Exception
        } else if cause & !INTERRUPT_BIT == UART_RXI {
            TrapKind::UartReceive
        } else {
            TrapKind::UnknownInterrupt
        }
    }
}

/// Whether a handler returns to the interrupted context or parks the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapOutcome {
    Handled,
    /// Fail-fast: the bare-metal build spins forever here.
    Halt,
}

pub type Handler<B, C> =
    fn(&mut Uart<B>, &mut C, &mut TrapContext) -> DiagResult<TrapOutcome>;

/// Ordered mapping from trap kind to handler.
pub struct VectorTable<B: UartRegisterBus, C: IrqControl> {
    entries: Vec<(TrapKind, Handler<B, C>)>,
}

impl<B: UartRegisterBus, C: IrqControl> VectorTable<B, C> {
    pub fn with_defaults() -> Self {
        Self {
            entries: vec![
                (TrapKind::UartReceive, uart_rx_echo as Handler<B, C>),
                (TrapKind::UnknownInterrupt, unknown_interrupt),
                (TrapKind::Exception, exception),
            ],
        }
    }

    pub fn set(&mut self, kind: TrapKind, handler: Handler<B, C>) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == kind) {
            entry.1 = handler;
        } else {
            self.entries.push((kind, handler));
        }
    }

    /// Decode the pending cause and run the matching handler. Traps with no
    /// entry fall through to the unknown-interrupt policy.
    pub fn dispatch(&self, uart: &mut Uart<B>, ctl: &mut C) -> DiagResult<TrapOutcome> {
        let mut ctx = ctl.context();
        let kind = TrapKind::from_cause(ctx.cause);
        tracing::debug!("trap cause={:#x}, kind={:?}", ctx.cause, kind);
        let handler = self
            .entries
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, h)| *h)
            .unwrap_or(unknown_interrupt);
        handler(uart, ctl, &mut ctx)
    }
}

/// UART receive echo.
///
/// The flag is acknowledged at the peripheral before anything else; holding
/// it across the guarded section would lose a byte edge arriving mid-echo.
pub fn uart_rx_echo<B: UartRegisterBus, C: IrqControl>(
    uart: &mut Uart<B>,
    ctl: &mut C,
    _ctx: &mut TrapContext,
) -> DiagResult<TrapOutcome> {
    uart.clear_rx_done();
    let guard = NestGuard::enter(ctl);
    let byte = uart.rx_data();
    uart.send_byte(byte)?;
    drop(guard);
    Ok(TrapOutcome::Handled)
}

pub fn unknown_interrupt<B: UartRegisterBus, C: IrqControl>(
    uart: &mut Uart<B>,
    _ctl: &mut C,
    ctx: &mut TrapContext,
) -> DiagResult<TrapOutcome> {
    tracing::error!("unknown interrupt, cause={:#x}", ctx.cause);
    // Best-effort: the transport may already be wedged.
    let _ = uart.send_str("Unknown Interrupt!\n");
    Ok(TrapOutcome::Halt)
}

pub fn exception<B: UartRegisterBus, C: IrqControl>(
    uart: &mut Uart<B>,
    _ctl: &mut C,
    ctx: &mut TrapContext,
) -> DiagResult<TrapOutcome> {
    tracing::error!("exception, cause={:#x}", ctx.cause);
    let _ = uart.send_str("Exception!\n");
    Ok(TrapOutcome::Halt)
}

/// Machine-status interrupt-enable bit.
const MIE: u32 = 1 << 3;

/// Event log entry for the simulated CSR file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsrEvent {
    GlobalEnable(bool),
    Restored { status: u32, return_addr: u32 },
    LineEnabled(u32),
}

/// Host-side stand-in for the machine-mode CSRs the guard touches.
#[derive(Debug, Default)]
pub struct SimCsr {
    pub mstatus: u32,
    pub mie: u32,
    pub mepc: u32,
    pub mcause: u32,
    pub events: Vec<CsrEvent>,
}

impl SimCsr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global_enabled(&self) -> bool {
        self.mstatus & MIE != 0
    }

    pub fn line_enabled(&self, line: u32) -> bool {
        self.mie & (1 << line) != 0
    }
}

impl TrapRaise for SimCsr {
    fn raise(&mut self, cause: u32, return_addr: u32) {
        self.mcause = cause;
        self.mepc = return_addr;
        self.mstatus &= !MIE;
    }
}

impl IrqControl for SimCsr {
    fn context(&self) -> TrapContext {
        TrapContext {
            cause: self.mcause,
            status: self.mstatus,
            return_addr: self.mepc,
        }
    }

    fn set_global_enable(&mut self, enabled: bool) {
        if enabled {
            self.mstatus |= MIE;
        } else {
            self.mstatus &= !MIE;
        }
        self.events.push(CsrEvent::GlobalEnable(enabled));
    }

    fn restore(&mut self, ctx: TrapContext) {
        self.mepc = ctx.return_addr;
        self.mstatus = ctx.status;
        self.events.push(CsrEvent::Restored {
            status: ctx.status,
            return_addr: ctx.return_addr,
        });
    }

    fn enable_line(&mut self, line: u32) {
        self.mie |= 1 << line;
        self.events.push(CsrEvent::LineEnabled(line));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peripherals::uart::{Access, SimUart};
    use crate::regs::{Status, UartReg};
    use crate::uart::TxHandshake;

    fn setup() -> (Uart<SimUart>, SimCsr, VectorTable<SimUart, SimCsr>) {
        let uart = Uart::new(SimUart::new(), TxHandshake::BusyPulse).with_spin_limit(64);
        (uart, SimCsr::new(), VectorTable::with_defaults())
    }

    #[test]
    fn test_trap_kind_decoding() {
        assert_eq!(TrapKind::from_cause(2), TrapKind::Exception);
        assert_eq!(
            TrapKind::from_cause(interrupt_cause(UART_RXI)),
            TrapKind::UartReceive
        );
        assert_eq!(
            TrapKind::from_cause(interrupt_cause(7)),
            TrapKind::UnknownInterrupt
        );
    }

    #[test]
    fn test_echo_acknowledges_before_reading_data() {
        let (mut uart, mut csr, table) = setup();
        uart.bus_mut().push_rx(b'q');
        csr.raise(interrupt_cause(UART_RXI), 0x100);

        let outcome = table.dispatch(&mut uart, &mut csr).unwrap();
        assert_eq!(outcome, TrapOutcome::Handled);
        assert_eq!(uart.bus().tx_bytes(), b"q");

        let trace = uart.bus().trace();
        let ack = trace
            .iter()
            .position(|a| {
                matches!(
                    a,
                    Access::Write { reg: UartReg::Sr, value } if value & Status::RX_DONE.bits() != 0
                )
            })
            .expect("no rx_done acknowledge in trace");
        let data_read = trace
            .iter()
            .position(|a| matches!(a, Access::Read { reg: UartReg::Rxdr, .. }))
            .expect("no rx data read in trace");
        assert!(ack < data_read, "rx_done must be cleared before the data read");
    }

    #[test]
    fn test_guard_orders_enable_and_restore() {
        let (mut uart, mut csr, table) = setup();
        uart.bus_mut().push_rx(b'a');
        csr.raise(interrupt_cause(UART_RXI), 0x2000_0040);
        table.dispatch(&mut uart, &mut csr).unwrap();

        assert_eq!(
            csr.events,
            vec![
                CsrEvent::GlobalEnable(true),
                CsrEvent::GlobalEnable(false),
                CsrEvent::Restored {
                    status: 0,
                    return_addr: 0x2000_0040
                },
            ]
        );
        assert_eq!(csr.mepc, 0x2000_0040);
        assert!(!csr.global_enabled());
    }

    #[test]
    fn test_guard_restores_once_on_error_paths() {
        let (mut uart, mut csr, table) = setup();
        uart.bus_mut().push_rx(b'a');
        uart.bus_mut().set_stalled(true);
        csr.raise(interrupt_cause(UART_RXI), 0x100);

        // The stalled transmitter makes the echo send time out inside the
        // guarded section.
        assert!(table.dispatch(&mut uart, &mut csr).is_err());
        let restores = csr
            .events
            .iter()
            .filter(|e| matches!(e, CsrEvent::Restored { .. }))
            .count();
        assert_eq!(restores, 1);
        assert!(!csr.global_enabled());
    }

    #[test]
    fn test_unknown_interrupt_is_terminal() {
        let (mut uart, mut csr, table) = setup();
        csr.raise(interrupt_cause(7), 0x100);
        let outcome = table.dispatch(&mut uart, &mut csr).unwrap();
        assert_eq!(outcome, TrapOutcome::Halt);
        assert_eq!(uart.bus().tx_as_string(), "Unknown Interrupt!\n");
    }

    #[test]
    fn test_exception_is_terminal() {
        let (mut uart, mut csr, table) = setup();
        // Illegal-instruction cause, interrupt bit clear.
        csr.raise(2, 0x100);
        let outcome = table.dispatch(&mut uart, &mut csr).unwrap();
        assert_eq!(outcome, TrapOutcome::Halt);
        assert_eq!(uart.bus().tx_as_string(), "Exception!\n");
    }

    #[test]
    fn test_vector_override() {
        fn drop_byte<B: UartRegisterBus, C: IrqControl>(
            uart: &mut Uart<B>,
            _ctl: &mut C,
            _ctx: &mut TrapContext,
        ) -> DiagResult<TrapOutcome> {
            uart.clear_rx_done();
            Ok(TrapOutcome::Handled)
        }

        let (mut uart, mut csr, mut table) = setup();
        table.set(TrapKind::UartReceive, drop_byte);
        uart.bus_mut().push_rx(b'x');
        csr.raise(interrupt_cause(UART_RXI), 0x100);
        table.dispatch(&mut uart, &mut csr).unwrap();
        assert!(uart.bus().tx_bytes().is_empty());
    }
}
