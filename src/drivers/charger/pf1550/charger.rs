/*
 * Charger lifecycle and interrupt servicing.
 *
 * INTB edge -> on_edge() disables the line and queues a pass -> run() reads
 * the interrupt source, refreshes status/online, notifies and restores the
 * charge parameters -> the line is re-enabled after INT_ENABLE_DELAY.
 */

use core::cell::Cell;

use embassy_futures::select::{select, Either};
use embassy_sync::{
    blocking_mutex::{raw::RawMutex, Mutex as BlockingMutex},
    channel::Channel,
    mutex::{Mutex, MutexGuard},
    signal::Signal,
};
use embassy_time::{Duration, Timer};

use crate::drivers::charger::{ChargerProperty, Error, PropertyValue};

use super::{
    bus::RegisterBus,
    config::{ChargerConfig, LedConfig, ThermistorMode},
    device::Pf1550,
    irq::{InterruptLine, IrqState},
    status::ChargeSense,
};

/// Hold-off between the end of a debounce pass and re-enabling the line.
pub const INT_ENABLE_DELAY: Duration = Duration::from_millis(500);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Work {
    ServiceInterrupt,
}

pub struct Charger<M: RawMutex, B: RegisterBus, L: InterruptLine> {
    config: ChargerConfig,
    device: Mutex<M, Pf1550<B>>,
    line: L,
    irq_state: BlockingMutex<M, Cell<IrqState>>,
    work: Channel<M, Work, 1>,
    stop: Signal<M, ()>,
}

impl<M: RawMutex, B: RegisterBus, L: InterruptLine> Charger<M, B, L> {
    /// Brings the charger up: snapshot status, arm the interrupt line,
    /// unmask the IC's interrupts and apply `config`. Any failure leaves the
    /// line disabled.
    pub async fn init(bus: B, mut line: L, config: ChargerConfig) -> Result<Self, Error> {
        if !bus.is_ready() {
            error!("pf1550 bus not ready");
            return Err(Error::NotReady);
        }

        if !line.is_ready() {
            error!("pf1550 interrupt GPIO not ready");
            return Err(Error::NotReady);
        }

        let mut device = Pf1550::new(bus, config);
        device.init_properties().await?;

        line.configure_input().map_err(|err| {
            error!("pf1550 could not configure interrupt GPIO: {:?}", err);
            Error::from(err)
        })?;

        line.set_interrupt(true).map_err(|err| {
            error!("pf1550 could not enable interrupt GPIO: {:?}", err);
            Error::from(err)
        })?;

        if let Err(err) = device.enable_interrupts().await {
            error!("pf1550 failed to enable interrupts: {:?}", err);
            Self::disarm(&line);
            return Err(err);
        }

        if let Err(err) = device.update_properties().await {
            error!("pf1550 failed to setup charger: {:?}", err);
            Self::disarm(&line);
            return Err(err);
        }

        info!(
            "pf1550 up, status {:?}, online {:?}",
            device.state().status,
            device.state().online
        );

        Ok(Self {
            config,
            device: Mutex::new(device),
            line,
            irq_state: BlockingMutex::new(Cell::new(IrqState::Armed)),
            work: Channel::new(),
            stop: Signal::new(),
        })
    }

    fn disarm(line: &L) {
        if let Err(err) = line.set_interrupt(false) {
            warn!("pf1550 could not disable interrupt GPIO: {:?}", err);
        }
    }

    pub fn config(&self) -> &ChargerConfig {
        &self.config
    }

    pub fn line(&self) -> &L {
        &self.line
    }

    pub fn irq_state(&self) -> IrqState {
        self.irq_state.lock(|state| state.get())
    }

    /// Exclusive access to the device, serialized with the interrupt worker.
    pub async fn device(&self) -> MutexGuard<'_, M, Pf1550<B>> {
        self.device.lock().await
    }

    /// Edge callback for the INTB line. Safe to call from interrupt context:
    /// it only disables the line and queues work for [`Charger::run`].
    pub fn on_edge(&self, pins: u32) {
        let armed = self.irq_state.lock(|state| {
            if state.get() == IrqState::Armed {
                state.set(IrqState::Pending);
                true
            } else {
                false
            }
        });

        if !armed {
            return;
        }

        trace!("pf1550 edge on {:#x}", pins);

        if let Err(err) = self.line.set_interrupt(false) {
            error!("pf1550 could not disable interrupt GPIO: {:?}", err);
        }

        if self.work.try_send(Work::ServiceInterrupt).is_err() {
            warn!("pf1550 could not submit interrupt work");
        }
    }

    /// Interrupt worker. Services queued edges one at a time and returns
    /// after [`Charger::shutdown`].
    pub async fn run(&self) {
        loop {
            match select(self.work.receive(), self.stop.wait()).await {
                Either::First(Work::ServiceInterrupt) => {}
                Either::Second(()) => return,
            }

            // work queued before a shutdown is dropped unserviced
            if self.irq_state() == IrqState::Shutdown {
                return;
            }

            if !self.debounce_pass().await {
                return;
            }

            if !self.wait_rearm().await {
                return;
            }
        }
    }

    /// Disables the interrupt line and stops the worker. A pending re-arm
    /// will not touch the line afterwards. Calling it again does nothing.
    pub fn shutdown(&self) {
        let prev = self.irq_state.lock(|state| state.replace(IrqState::Shutdown));
        if prev == IrqState::Shutdown {
            return;
        }

        if let Err(err) = self.line.set_interrupt(false) {
            warn!("pf1550 could not disable interrupt GPIO: {:?}", err);
        }

        self.stop.signal(());
        debug!("pf1550 shut down");
    }

    /// Runs one debounce pass and schedules the re-arm. False once shut down.
    pub(crate) async fn debounce_pass(&self) -> bool {
        if self.irq_state() == IrqState::Shutdown {
            return false;
        }

        let mut device = self.device.lock().await;
        // shutdown may have landed while waiting for the lock
        if self.irq_state() == IrqState::Shutdown {
            return false;
        }
        device.service_interrupt().await;
        drop(device);

        self.irq_state.lock(|state| {
            if state.get() == IrqState::Shutdown {
                false
            } else {
                state.set(IrqState::Rearming);
                true
            }
        })
    }

    async fn wait_rearm(&self) -> bool {
        loop {
            match select(Timer::after(INT_ENABLE_DELAY), self.stop.wait()).await {
                Either::First(()) => {
                    if self.rearm() {
                        return true;
                    }
                }
                Either::Second(()) => return false,
            }
        }
    }

    /// Re-enables the line if a re-arm is due. False means the line could
    /// not be enabled and another attempt is needed.
    pub(crate) fn rearm(&self) -> bool {
        self.irq_state.lock(|state| {
            if state.get() != IrqState::Rearming {
                return true;
            }

            match self.line.set_interrupt(true) {
                Ok(()) => {
                    state.set(IrqState::Armed);
                    true
                }
                Err(err) => {
                    warn!("pf1550 could not enable interrupt GPIO: {:?}", err);
                    false
                }
            }
        })
    }

    pub async fn get(&self, prop: ChargerProperty) -> Result<PropertyValue, Error> {
        self.device.lock().await.get_property(prop)
    }

    pub async fn set(&self, val: PropertyValue) -> Result<(), Error> {
        let result = self.device.lock().await.set_property(val).await;
        if let Err(Error::Bus(err)) = result {
            warn!("pf1550 failed to set {:?}: {:?}", val.property(), err);
        }
        result
    }

    pub async fn set_enabled(&self, enable: bool) -> Result<(), Error> {
        let result = self.device.lock().await.set_enabled(enable).await;
        log_bus_failure("set_enabled", &result);
        result
    }

    pub async fn set_vsys_min(&self, voltage_uv: u32) -> Result<(), Error> {
        let result = self.device.lock().await.set_vsys_min(voltage_uv).await;
        log_bus_failure("set_vsys_min", &result);
        result
    }

    pub async fn set_charge_termination_uv(&self, voltage_uv: u32) -> Result<(), Error> {
        let result = self.device.lock().await.set_charge_termination_uv(voltage_uv).await;
        log_bus_failure("set_charge_termination_uv", &result);
        result
    }

    pub async fn set_thermistor_mode(&self, mode: ThermistorMode) -> Result<(), Error> {
        let result = self.device.lock().await.set_thermistor_mode(mode).await;
        log_bus_failure("set_thermistor_mode", &result);
        result
    }

    pub async fn set_led_config(&self, led: LedConfig) -> Result<(), Error> {
        let result = self.device.lock().await.set_led_config(led).await;
        log_bus_failure("set_led_config", &result);
        result
    }

    pub async fn read_charge_sense(&self) -> Result<ChargeSense, Error> {
        self.device.lock().await.read_charge_sense().await
    }

    /// Charge current as currently programmed in the IC, not the cached value.
    pub async fn read_constant_charge_current(&self) -> Result<u32, Error> {
        self.device.lock().await.read_constant_charge_current().await
    }

    pub async fn read_input_current_limit(&self) -> Result<u32, Error> {
        self.device.lock().await.read_input_current_limit().await
    }
}

fn log_bus_failure(op: &str, result: &Result<(), Error>) {
    if let Err(Error::Bus(err)) = result {
        warn!("pf1550 {} failed: {:?}", op, err);
    }
}

#[cfg(test)]
mod tests {
    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    use super::*;
    use crate::drivers::charger::pf1550::{
        mock::{Event, MockBus, MockLine},
        registers::*,
    };
    use crate::drivers::charger::{ChargerOnline, ChargerStatus, GpioError};

    type TestCharger = Charger<NoopRawMutex, MockBus, MockLine>;

    fn charger(bus: &MockBus) -> TestCharger {
        let charger = block_on(Charger::init(bus.clone(), bus.line(), ChargerConfig::DEFAULT)).unwrap();
        bus.clear_events();
        charger
    }

    #[test]
    fn init_sequence() {
        let bus = MockBus::new();
        bus.set_reg(CHARGER_CHG_SNS, 0x02);
        bus.set_reg(CHARGER_CHG_OPER, 0x02);
        bus.set_reg(CHARGER_CHG_INT, CHG_INT_CHG);

        let charger: TestCharger =
            block_on(Charger::init(bus.clone(), bus.line(), ChargerConfig::DEFAULT)).unwrap();

        let events = bus.events();
        assert_eq!(
            events[..6],
            [
                Event::Read(CHARGER_CHG_SNS),
                Event::Read(CHARGER_CHG_OPER),
                Event::LineConfigured,
                Event::LineEnabled(true),
                Event::Read(CHARGER_CHG_INT),
                Event::Write(CHARGER_CHG_INT_MASK, CHG_INT_MASK_ENABLE_ALL),
            ]
        );
        assert_eq!(events.last(), Some(&Event::Write(CHARGER_LED_CNFG, 0)));
        assert_eq!(charger.irq_state(), IrqState::Armed);
        assert!(matches!(
            block_on(charger.get(ChargerProperty::Status)),
            Ok(PropertyValue::Status(ChargerStatus::Charging))
        ));
        assert!(matches!(
            block_on(charger.get(ChargerProperty::Online)),
            Ok(PropertyValue::Online(ChargerOnline::Fixed))
        ));
    }

    #[test]
    fn init_requires_ready_resources() {
        let bus = MockBus::new();
        bus.set_ready(false);
        let result: Result<TestCharger, _> =
            block_on(Charger::init(bus.clone(), bus.line(), ChargerConfig::DEFAULT));
        assert!(matches!(result, Err(Error::NotReady)));
        assert!(bus.events().is_empty());

        let bus = MockBus::new();
        let mut line = bus.line();
        line.set_ready(false);
        let result: Result<TestCharger, _> =
            block_on(Charger::init(bus.clone(), line, ChargerConfig::DEFAULT));
        assert!(matches!(result, Err(Error::NotReady)));
        assert!(bus.events().is_empty());
    }

    #[test]
    fn init_failure_leaves_line_disabled() {
        let bus = MockBus::new();
        bus.fail_writes(CHARGER_CHG_CURR_CFG);

        let result: Result<TestCharger, _> =
            block_on(Charger::init(bus.clone(), bus.line(), ChargerConfig::DEFAULT));

        assert!(matches!(result, Err(Error::Bus(MockBus::ERROR))));
        assert_eq!(bus.events().last(), Some(&Event::LineEnabled(false)));
        assert!(!bus.line_enabled());
    }

    #[test]
    fn init_gpio_failure_is_reported() {
        let bus = MockBus::new();
        let mut line = bus.line();
        line.fail_configure(GpioError(-19));

        let result: Result<TestCharger, _> =
            block_on(Charger::init(bus.clone(), line, ChargerConfig::DEFAULT));

        assert!(matches!(result, Err(Error::Gpio(GpioError(-19)))));
        assert!(!bus.line_enabled());
    }

    #[test]
    fn edge_disables_line_before_register_access() {
        let bus = MockBus::new();
        let charger = charger(&bus);

        charger.on_edge(1 << 4);

        assert_eq!(charger.irq_state(), IrqState::Pending);
        assert_eq!(bus.events(), [Event::LineEnabled(false)]);
        assert_eq!(charger.work.try_receive().ok(), Some(Work::ServiceInterrupt));
    }

    #[test]
    fn edges_while_pending_are_dropped() {
        let bus = MockBus::new();
        let charger = charger(&bus);

        charger.on_edge(1);
        charger.on_edge(1);
        charger.on_edge(1);

        assert_eq!(bus.events(), [Event::LineEnabled(false)]);
        assert!(charger.work.try_receive().is_ok());
        assert!(charger.work.try_receive().is_err());

        assert!(block_on(charger.debounce_pass()));
        charger.on_edge(1);
        assert_eq!(charger.irq_state(), IrqState::Rearming);
        assert!(charger.work.try_receive().is_err());
    }

    #[test]
    fn pass_always_rearms_once() {
        let bus = MockBus::new();
        let charger = charger(&bus);
        bus.fail_reads(CHARGER_CHG_INT);

        charger.on_edge(1);
        assert!(block_on(charger.debounce_pass()));
        assert_eq!(charger.irq_state(), IrqState::Rearming);
        assert!(!bus.line_enabled());

        assert!(charger.rearm());
        assert_eq!(charger.irq_state(), IrqState::Armed);
        // a stray second re-arm is a no-op
        assert!(charger.rearm());

        let enables = bus
            .events()
            .iter()
            .filter(|e| **e == Event::LineEnabled(true))
            .count();
        assert_eq!(enables, 1);
        assert!(bus.line_enabled());
    }

    #[test]
    fn rearm_retries_when_line_fails() {
        let bus = MockBus::new();
        let charger = charger(&bus);

        charger.on_edge(1);
        assert!(block_on(charger.debounce_pass()));

        bus.fail_line(Some(GpioError(-5)));
        assert!(!charger.rearm());
        assert_eq!(charger.irq_state(), IrqState::Rearming);

        bus.fail_line(None);
        assert!(charger.rearm());
        assert_eq!(charger.irq_state(), IrqState::Armed);
    }

    #[test]
    fn set_before_pass_survives_restore() {
        let bus = MockBus::new();
        let charger = charger(&bus);

        block_on(charger.set(PropertyValue::ConstantChargeCurrentUa(250_000))).unwrap();
        block_on(charger.set(PropertyValue::InputCurrentLimitUa(500_000))).unwrap();

        // supply re-attached, IC back at power-on defaults
        bus.set_reg(CHARGER_CHG_OPER, 0x02);
        bus.set_reg(CHARGER_CHG_CURR_CFG, 0x00);
        bus.set_reg(CHARGER_VBUS_INLIM_CNFG, 0x00);

        charger.on_edge(1);
        assert!(block_on(charger.debounce_pass()));

        assert_eq!(bus.reg(CHARGER_CHG_CURR_CFG), 3);
        assert_eq!(bus.reg(CHARGER_VBUS_INLIM_CNFG), 14 << 3);
    }

    #[test]
    fn shutdown_is_idempotent_and_blocks_rearm() {
        let bus = MockBus::new();
        let charger = charger(&bus);

        charger.on_edge(1);
        assert!(charger.work.try_receive().is_ok());
        assert!(block_on(charger.debounce_pass()));

        charger.shutdown();
        charger.shutdown();

        assert_eq!(charger.irq_state(), IrqState::Shutdown);
        assert!(charger.rearm());
        assert!(!bus.line_enabled());

        charger.on_edge(1);
        assert!(charger.work.try_receive().is_err());
        assert_eq!(charger.irq_state(), IrqState::Shutdown);

        let disables = bus
            .events()
            .iter()
            .filter(|e| **e == Event::LineEnabled(false))
            .count();
        assert_eq!(disables, 2);
    }

    #[test]
    fn shutdown_during_pass_skips_rearm() {
        let bus = MockBus::new();
        let charger = charger(&bus);

        charger.on_edge(1);
        charger.shutdown();

        assert!(!block_on(charger.debounce_pass()));
        assert_eq!(charger.irq_state(), IrqState::Shutdown);
    }

    #[test]
    fn queued_work_is_dropped_after_shutdown() {
        let bus = MockBus::new();
        bus.set_reg(CHARGER_CHG_OPER, 0x02);
        let charger = charger(&bus);

        charger.on_edge(1);
        charger.shutdown();
        bus.clear_events();

        block_on(charger.run());

        assert!(bus.events().is_empty());
        assert_eq!(charger.irq_state(), IrqState::Shutdown);
    }

    #[test]
    fn init_unmask_failure_disarms_line() {
        let bus = MockBus::new();
        bus.fail_writes(CHARGER_CHG_INT_MASK);

        let result: Result<TestCharger, _> =
            block_on(Charger::init(bus.clone(), bus.line(), ChargerConfig::DEFAULT));

        assert!(matches!(result, Err(Error::Bus(MockBus::ERROR))));
        assert_eq!(bus.events().last(), Some(&Event::LineEnabled(false)));
        assert!(!bus.line_enabled());
    }

    #[test]
    fn setter_failures_are_returned() {
        let bus = MockBus::new();
        let charger = charger(&bus);
        bus.fail_writes(CHARGER_CHG_OPER);
        bus.fail_writes(CHARGER_LED_PWM);

        assert_eq!(block_on(charger.set_enabled(false)), Err(Error::Bus(MockBus::ERROR)));
        assert_eq!(
            block_on(charger.set_led_config(LedConfig::DEFAULT)),
            Err(Error::Bus(MockBus::ERROR))
        );
        assert!(block_on(charger.set_vsys_min(3_700_000)).is_ok());
    }

    #[test]
    fn run_returns_after_shutdown() {
        let bus = MockBus::new();
        let charger = charger(&bus);

        charger.shutdown();
        block_on(charger.run());
    }
}
