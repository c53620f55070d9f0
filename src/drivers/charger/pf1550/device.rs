/*
 * Register-level control of the PF1550 charger block: property cache,
 * physical unit encoding and the charge parameter setters.
 */

use crate::drivers::charger::{
    ChargerOnline, ChargerProperty, ChargerStatus, Error, OnlineNotifier, PropertyValue,
    StatusNotifier,
};

use super::{
    bus::RegisterBus,
    config::{ChargerConfig, LedConfig, ThermistorMode},
    registers::*,
    status::{decode_online, decode_status, ChargeSense, InterruptSource},
};

/// Runtime view of the charger, kept so property reads don't hit the bus.
#[derive(Clone, Copy, Debug)]
pub struct ChargerState {
    pub status: ChargerStatus,
    pub online: ChargerOnline,
    pub charge_current_ua: u32,
    pub vbus_ilim_ua: u32,
    pub enabled: bool,
    pub led: LedConfig,
    pub status_notifier: Option<StatusNotifier>,
    pub online_notifier: Option<OnlineNotifier>,
}

impl ChargerState {
    fn from_config(config: &ChargerConfig) -> Self {
        Self {
            status: ChargerStatus::NotCharging,
            online: ChargerOnline::Offline,
            charge_current_ua: config.charge_current_ua,
            vbus_ilim_ua: config.vbus_ilim_ua,
            enabled: true,
            led: config.led,
            status_notifier: None,
            online_notifier: None,
        }
    }
}

pub struct Pf1550<B> {
    bus: B,
    config: ChargerConfig,
    state: ChargerState,
}

impl<B: RegisterBus> Pf1550<B> {
    pub fn new(bus: B, config: ChargerConfig) -> Self {
        Self {
            bus,
            state: ChargerState::from_config(&config),
            config,
        }
    }

    pub fn config(&self) -> &ChargerConfig {
        &self.config
    }

    pub fn state(&self) -> &ChargerState {
        &self.state
    }

    pub fn bus(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn release(self) -> B {
        self.bus
    }

    /// Takes the initial status/online snapshot.
    pub async fn init_properties(&mut self) -> Result<(), Error> {
        self.state = ChargerState::from_config(&self.config);

        self.state.status = self.read_status().await.map_err(|err| {
            error!("pf1550 failed to read charger status: {:?}", err);
            err
        })?;

        self.state.online = self.read_online().await.map_err(|err| {
            error!("pf1550 failed to read charger online: {:?}", err);
            err
        })?;

        Ok(())
    }

    pub async fn read_status(&mut self) -> Result<ChargerStatus, Error> {
        let raw = self.bus.read_field(CHG_SNS_STATE).await?;
        Ok(decode_status(raw))
    }

    pub async fn read_online(&mut self) -> Result<ChargerOnline, Error> {
        let raw = self.bus.read_field(CHG_OPER_MODE).await?;
        Ok(decode_online(raw))
    }

    pub async fn read_charge_sense(&mut self) -> Result<ChargeSense, Error> {
        let raw = self.bus.read_field(CHG_SNS_STATE).await?;
        Ok(ChargeSense::from_raw(raw))
    }

    /// Reads CHG_INT, which also clears the latched bits.
    pub async fn read_interrupt_source(&mut self) -> Result<InterruptSource, Error> {
        let raw = self.bus.read_byte(CHARGER_CHG_INT).await?;
        Ok(InterruptSource(raw))
    }

    /// Clears anything latched and unmasks every charger interrupt.
    pub async fn enable_interrupts(&mut self) -> Result<(), Error> {
        if let Err(err) = self.read_interrupt_source().await {
            warn!("pf1550 failed to clear pending interrupts: {:?}", err);
            return Err(err);
        }

        self.bus
            .write_byte(CHARGER_CHG_INT_MASK, CHG_INT_MASK_ENABLE_ALL)
            .await?;
        Ok(())
    }

    pub async fn set_constant_charge_current(&mut self, current_ua: u32) -> Result<(), Error> {
        let idx = FAST_CHARGE_UA.encode(current_ua)?;
        self.bus.update_field(CHG_CURR_CFG_ICHG, idx as u8).await?;
        Ok(())
    }

    pub async fn set_vbus_ilim(&mut self, current_ua: u32) -> Result<(), Error> {
        let idx = VBUS_ILIM_UA.encode(current_ua)?;
        self.bus.update_field(VBUS_INLIM_CNFG_ILIM, idx as u8).await?;
        Ok(())
    }

    pub async fn set_vsys_min(&mut self, voltage_uv: u32) -> Result<(), Error> {
        let idx = VSYS_MIN_UV.encode(voltage_uv)?;
        self.bus.update_field(BATT_REG_VSYSMIN, idx as u8).await?;
        Ok(())
    }

    pub async fn set_charge_termination_uv(&mut self, voltage_uv: u32) -> Result<(), Error> {
        let idx = TERMINATION_UV.encode(voltage_uv)?;
        self.bus.update_field(BATT_REG_CHGCV, idx as u8).await?;
        Ok(())
    }

    pub async fn set_thermistor_mode(&mut self, mode: ThermistorMode) -> Result<(), Error> {
        self.bus.update_field(THM_REG_CNFG_MODE, mode.bits()).await?;
        Ok(())
    }

    pub async fn set_enabled(&mut self, enable: bool) -> Result<(), Error> {
        let mode = if enable {
            CHG_OPER_CHARGER_ON_LINEAR_ON
        } else {
            CHG_OPER_CHARGER_OFF_LINEAR_OFF
        };

        self.bus.update_field(CHG_OPER_MODE, mode).await?;
        self.state.enabled = enable;
        Ok(())
    }

    /// Writes LED_PWM then LED_CNFG. The cached config only changes once
    /// both writes land.
    pub async fn set_led_config(&mut self, led: LedConfig) -> Result<(), Error> {
        let pwm = LED_PWM_EN.prep(led.enabled as u8) | LED_PWM_DUTY.prep(led.duty_code());
        self.bus.write_byte(CHARGER_LED_PWM, pwm).await?;

        let cnfg = LED_CNFG_MANUAL.prep(led.manual as u8)
            | LED_CNFG_BEHAVIOUR.prep(led.behaviour as u8)
            | LED_CNFG_FREQ.prep(led.frequency as u8);
        self.bus.write_byte(CHARGER_LED_CNFG, cnfg).await?;

        self.state.led = led;
        Ok(())
    }

    pub async fn read_constant_charge_current(&mut self) -> Result<u32, Error> {
        let idx = self.bus.read_field(CHG_CURR_CFG_ICHG).await?;
        Ok(FAST_CHARGE_UA.decode(idx as u16)?)
    }

    pub async fn read_input_current_limit(&mut self) -> Result<u32, Error> {
        let idx = self.bus.read_field(VBUS_INLIM_CNFG_ILIM).await?;
        Ok(VBUS_ILIM_UA.decode(idx as u16)?)
    }

    /// Pushes every operating parameter to the IC. Current limits come from
    /// the cache so values set at runtime survive a supply re-attach.
    pub async fn update_properties(&mut self) -> Result<(), Error> {
        let config = self.config;
        let state = self.state;

        self.set_vbus_ilim(state.vbus_ilim_ua).await.map_err(|err| {
            error!("pf1550 failed to set vbus current limit: {:?}", err);
            err
        })?;

        self.set_vsys_min(config.vsys_min_uv).await.map_err(|err| {
            error!("pf1550 failed to set minimum system voltage threshold: {:?}", err);
            err
        })?;

        self.set_charge_termination_uv(config.battery_charge_termination_uv)
            .await
            .map_err(|err| {
                error!("pf1550 failed to set charge termination voltage: {:?}", err);
                err
            })?;

        self.set_thermistor_mode(config.thermistor_mode)
            .await
            .map_err(|err| {
                error!("pf1550 failed to set thermistor mode: {:?}", err);
                err
            })?;

        self.set_constant_charge_current(state.charge_current_ua)
            .await
            .map_err(|err| {
                error!("pf1550 failed to set charge current: {:?}", err);
                err
            })?;

        self.set_enabled(state.enabled).await.map_err(|err| {
            error!("pf1550 failed to set enabled: {:?}", err);
            err
        })?;

        self.set_led_config(state.led).await.map_err(|err| {
            error!("pf1550 failed to configure led: {:?}", err);
            err
        })?;

        Ok(())
    }

    pub fn get_property(&self, prop: ChargerProperty) -> Result<PropertyValue, Error> {
        match prop {
            ChargerProperty::Online => Ok(PropertyValue::Online(self.state.online)),
            ChargerProperty::Status => Ok(PropertyValue::Status(self.state.status)),
            ChargerProperty::ConstantChargeCurrentUa => Ok(PropertyValue::ConstantChargeCurrentUa(
                self.state.charge_current_ua,
            )),
            ChargerProperty::InputCurrentLimitUa => {
                Ok(PropertyValue::InputCurrentLimitUa(self.state.vbus_ilim_ua))
            }
            _ => Err(Error::Unsupported),
        }
    }

    pub async fn set_property(&mut self, val: PropertyValue) -> Result<(), Error> {
        match val {
            PropertyValue::ConstantChargeCurrentUa(current_ua) => {
                self.set_constant_charge_current(current_ua).await?;
                self.state.charge_current_ua = current_ua;
                Ok(())
            }
            PropertyValue::InputCurrentLimitUa(current_ua) => {
                self.set_vbus_ilim(current_ua).await?;
                self.state.vbus_ilim_ua = current_ua;
                Ok(())
            }
            PropertyValue::StatusNotification(notifier) => {
                self.state.status_notifier = notifier;
                Ok(())
            }
            PropertyValue::OnlineNotification(notifier) => {
                self.state.online_notifier = notifier;
                Ok(())
            }
            _ => Err(Error::Unsupported),
        }
    }

    /// One debounce pass: acknowledge the interrupt, refresh status/online,
    /// notify, and restore the charge parameters if a supply is present.
    /// A failed read ends the pass early and leaves the cache as it was.
    pub async fn service_interrupt(&mut self) {
        let src = match self.read_interrupt_source().await {
            Ok(src) => src,
            Err(err) => {
                warn!("pf1550 failed to read interrupt source: {:?}", err);
                return;
            }
        };

        debug!(
            "pf1550 interrupt {:#x} (bat: {}, chg: {}, vbus: {})",
            src.0,
            src.battery(),
            src.charger(),
            src.vbus()
        );

        match self.read_status().await {
            Ok(status) => {
                self.state.status = status;
                if let Some(notify) = self.state.status_notifier {
                    notify(status);
                }
            }
            Err(err) => {
                warn!("pf1550 failed to read charger status: {:?}", err);
                return;
            }
        }

        match self.read_online().await {
            Ok(online) => {
                self.state.online = online;
                if let Some(notify) = self.state.online_notifier {
                    notify(online);
                }
            }
            Err(err) => {
                warn!("pf1550 failed to read charger online: {:?}", err);
                return;
            }
        }

        if self.state.online != ChargerOnline::Offline {
            if let Err(err) = self.update_properties().await {
                warn!("pf1550 failed to restore charge parameters: {:?}", err);
            }
        }
    }
}
