use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal_async::digital::Wait;

use crate::drivers::charger::GpioError;

use super::{bus::RegisterBus, charger::Charger};

/// Where the charger's interrupt handling currently stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IrqState {
    /// Line enabled, waiting for the IC to signal.
    Armed,
    /// Edge seen, line disabled, debounce pass queued.
    Pending,
    /// Pass finished, line re-enables once the hold-off expires.
    Rearming,
    Shutdown,
}

/// GPIO line carrying the charger's INTB output.
pub trait InterruptLine {
    fn is_ready(&self) -> bool {
        true
    }

    fn configure_input(&mut self) -> Result<(), GpioError>;

    /// Enables or disables edge detection. Called from interrupt context as
    /// well as from the worker, so it must not block.
    fn set_interrupt(&self, enabled: bool) -> Result<(), GpioError>;
}

/// Interrupt line gated in software, for pins that expose edges through
/// [`Wait`] (EXTI inputs and similar). Feed it with [`watch_edges`].
pub struct WaitLine {
    enabled: AtomicBool,
}

impl WaitLine {
    pub const fn new() -> Self {
        Self {
            enabled: AtomicBool::new(false),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }
}

impl Default for WaitLine {
    fn default() -> Self {
        Self::new()
    }
}

impl InterruptLine for WaitLine {
    fn configure_input(&mut self) -> Result<(), GpioError> {
        // the pin was configured as an input when the Wait impl was built
        Ok(())
    }

    fn set_interrupt(&self, enabled: bool) -> Result<(), GpioError> {
        self.enabled.store(enabled, Ordering::Release);
        Ok(())
    }
}

/// Forwards active edges of `pin` to the charger while its line is enabled.
/// Returns once the charger has been shut down.
pub async fn watch_edges<P, M, B>(
    pin: &mut P,
    pin_mask: u32,
    charger: &Charger<M, B, WaitLine>,
) -> Result<(), P::Error>
where
    P: Wait,
    M: RawMutex,
    B: RegisterBus,
{
    let active_low = charger.config().int_active_low;

    loop {
        if active_low {
            pin.wait_for_falling_edge().await?;
        } else {
            pin.wait_for_rising_edge().await?;
        }

        if charger.irq_state() == IrqState::Shutdown {
            return Ok(());
        }

        if charger.line().is_enabled() {
            charger.on_edge(pin_mask);
        }
    }
}
