/*
 * NXP PF1550 charger block.
 *
 * registers.rs  - register map, field layouts and unit ranges
 * bus.rs        - byte register access (I2C or anything else)
 * device.rs     - property cache and charge parameter programming
 * charger.rs    - init, interrupt debounce and re-arm lifecycle
 * irq.rs        - interrupt line abstraction and edge forwarding
 */

pub mod bus;
pub mod charger;
pub mod config;
pub mod device;
pub mod irq;
pub mod registers;
pub mod status;

#[cfg(test)]
pub(crate) mod mock;

pub use bus::{I2cRegisterBus, RegisterBus};
pub use charger::{Charger, INT_ENABLE_DELAY};
pub use config::{ChargerConfig, LedBehaviour, LedConfig, LedFrequency, ThermistorMode};
pub use device::{ChargerState, Pf1550};
pub use irq::{watch_edges, InterruptLine, IrqState, WaitLine};
pub use status::{ChargeSense, InterruptSource};
