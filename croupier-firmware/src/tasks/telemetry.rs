//! Telemetry UART transmit task
//!
//! Writes telemetry lines from the dealer to the serial console.

use defmt::*;
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::BufferedUartTx;
use embedded_io_async::Write;

use crate::channels::TELEMETRY;

/// Telemetry TX task - drains the telemetry channel
#[embassy_executor::task]
pub async fn telemetry_task(mut tx: BufferedUartTx<'static, UART0>) {
    info!("Telemetry task started");

    loop {
        let line = TELEMETRY.receive().await;
        if let Err(e) = tx.write_all(line.as_bytes()).await {
            warn!("Failed to send telemetry: {:?}", e);
        }
    }
}
