// BringWire - RISC-V SoC Bring-up Diagnostics
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Bare-metal divider diagnostic for the bring-up SoC.
//!
//! Mirrors the host-side model in `bringwire-core`: same register layout,
//! same LFSR stream, same report format, with the receive-interrupt echo
//! wired through the machine trap vector. Runs forever.

#![no_std]
#![no_main]
#![allow(clippy::empty_loop)]

use core::arch::asm;
use panic_halt as _;
use riscv::register::mcause;
use riscv_rt::entry;

const UART_BASE: usize = 0x0002_0000;
const CFGR: *mut u32 = UART_BASE as *mut u32;
const TXDR: *mut u32 = (UART_BASE + 0x04) as *mut u32;
const RXDR: *mut u32 = (UART_BASE + 0x08) as *mut u32;
const SR: *mut u32 = (UART_BASE + 0x0C) as *mut u32;

const TX_BUSY: u32 = 1 << 0;
const RX_DONE: u32 = 1 << 3;

// 50 MHz reference clock / 115200 baud.
const BAUD_DIVISOR: u32 = 434;

/// Machine-external line wired to the UART receiver.
const UART_RXI: u32 = 16;

const FEEDBACK_POLY: u32 = 0x8000_0057;

fn uart_init() {
    unsafe {
        CFGR.write_volatile(BAUD_DIVISOR);
        asm!("csrs mie, {}", in(reg) 1u32 << UART_RXI);
        riscv::interrupt::enable();
    }
}

/// Busy-pulse handshake: this board signals completion by pulsing TX_BUSY
/// after the data write.
fn uart_send(byte: u8) {
    unsafe {
        while SR.read_volatile() & TX_BUSY != 0 {}
        TXDR.write_volatile(byte as u32);
        while SR.read_volatile() & TX_BUSY == 0 {}
    }
}

fn uart_send_str(s: &str) {
    for byte in s.bytes() {
        uart_send(byte);
    }
}

fn send_bits(value: u32) {
    for i in (0..32).rev() {
        uart_send(if (value >> i) & 1 != 0 { b'1' } else { b'0' });
    }
}

fn lfsr_next(state: &mut u32) -> u32 {
    let lsb = *state & 1;
    *state >>= 1;
    if lsb != 0 {
        *state ^= FEEDBACK_POLY;
    }
    *state
}

fn uart_rx_echo() {
    // Acknowledge at the peripheral before anything else.
    unsafe { SR.write_volatile(RX_DONE) };

    // Save the trap context, then allow nesting.
    let status: u32;
    let epc: u32;
    unsafe {
        asm!("csrr {}, mstatus", out(reg) status);
        asm!("csrr {}, mepc", out(reg) epc);
        asm!("csrsi mstatus, 0x8");
    }

    let byte = unsafe { RXDR.read_volatile() } as u8;
    uart_send(byte);

    // Kill the enable before putting the saved state back.
    unsafe {
        asm!("csrci mstatus, 0x8");
        asm!("csrw mepc, {}", in(reg) epc);
        asm!("csrw mstatus, {}", in(reg) status);
    }
}

#[export_name = "DefaultHandler"]
fn default_handler() {
    let cause = mcause::read();
    if cause.is_interrupt() && cause.code() == UART_RXI as usize {
        uart_rx_echo();
    } else {
        uart_send_str("Unknown Interrupt!\n");
        loop {}
    }
}

#[export_name = "ExceptionHandler"]
fn exception_handler(_frame: &riscv_rt::TrapFrame) -> ! {
    uart_send_str("Exception!\n");
    loop {}
}

#[entry]
fn main() -> ! {
    uart_init();
    uart_send_str("Starting divider test...\n");

    let mut lfsr: u32 = 0xACE1;
    loop {
        let a = lfsr_next(&mut lfsr) as i32;
        let b = lfsr_next(&mut lfsr) as i32;
        // The LFSR never yields zero; i32::MIN / -1 wraps instead of
        // trapping.
        let quotient = a.wrapping_div(b);
        let remainder = a.wrapping_rem(b);

        send_bits(a as u32);
        uart_send_str(" / ");
        send_bits(b as u32);
        uart_send_str(" = ");
        send_bits(quotient as u32);
        uart_send_str(" R ");
        send_bits(remainder as u32);
        uart_send(b'\n');
    }
}
