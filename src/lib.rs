#![cfg_attr(not(test), no_std)]
#![allow(async_fn_in_trait)]

//! Async driver for the NXP PF1550 charge-management IC.
//!
//! The driver owns a [`drivers::charger::pf1550::RegisterBus`] and an
//! [`drivers::charger::pf1550::InterruptLine`], applies the configured
//! charge parameters at init and keeps status/online up to date from the
//! IC's interrupt line. A single worker future ([`drivers::charger::pf1550::Charger::run`])
//! services interrupts; application tasks use the property interface.
//!
//! ```ignore
//! type Pf1550Charger = Charger<CriticalSectionRawMutex, I2cRegisterBus<I2c<'static, Async>>, WaitLine>;
//!
//! static CHARGER: StaticCell<Pf1550Charger> = StaticCell::new();
//!
//! #[embassy_executor::task]
//! async fn charger_worker(charger: &'static Pf1550Charger) {
//!     charger.run().await;
//! }
//!
//! let bus = I2cRegisterBus::new(i2c);
//! let charger = CHARGER.init(Charger::init(bus, WaitLine::new(), ChargerConfig::DEFAULT).await?);
//! spawner.spawn(charger_worker(charger)).unwrap();
//! watch_edges(&mut int_pin, 1 << 4, charger).await?;
//! ```

pub(crate) mod fmt;

pub mod drivers;
pub mod math;
