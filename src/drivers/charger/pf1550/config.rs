use core::str::FromStr;

/// Thermistor monitoring mode (THM_REG_CNFG[1:0]).
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ThermistorMode {
    Disabled = 0,
    Thermistor = 1,
    Jeita1 = 2,
    Jeita2 = 3,
    /// Unrecognized configuration string, programmed as disabled.
    Unknown = 4,
}

impl ThermistorMode {
    pub const fn from_name(name: &str) -> Self {
        match name.as_bytes() {
            b"disabled" => ThermistorMode::Disabled,
            b"thermistor" => ThermistorMode::Thermistor,
            b"JEITA-1" => ThermistorMode::Jeita1,
            b"JEITA-2" => ThermistorMode::Jeita2,
            _ => ThermistorMode::Unknown,
        }
    }

    pub const fn bits(self) -> u8 {
        match self {
            ThermistorMode::Unknown => ThermistorMode::Disabled as u8,
            mode => mode as u8,
        }
    }
}

impl FromStr for ThermistorMode {
    type Err = core::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedFrequency {
    Hz1 = 0,
    Hz0_5 = 1,
    Hz256 = 2,
    Hz8 = 3,
}

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedBehaviour {
    OnChargingFlashFaultOffDone = 0,
    FlashChargingOnFaultOffDone = 1,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LedConfig {
    pub enabled: bool,
    /// Software drives the LED instead of the charger state machine.
    pub manual: bool,
    /// Duty cycle, in percent.
    pub duty: u8,
    pub frequency: LedFrequency,
    pub behaviour: LedBehaviour,
}

impl LedConfig {
    pub const DEFAULT: LedConfig = LedConfig {
        enabled: true,
        manual: false,
        duty: 10,
        frequency: LedFrequency::Hz1,
        behaviour: LedBehaviour::OnChargingFlashFaultOffDone,
    };

    /// LED_PWM duty code, roughly 3 % per step.
    pub const fn duty_code(&self) -> u8 {
        self.duty / 3
    }
}

impl Default for LedConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Charge parameters applied at init and after every supply attach.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChargerConfig {
    pub charge_current_ua: u32,
    pub vbus_ilim_ua: u32,
    pub battery_charge_termination_uv: u32,
    pub vsys_min_uv: u32,
    pub thermistor_mode: ThermistorMode,
    /// INTB is open drain and pulls low on an event.
    pub int_active_low: bool,
    pub led: LedConfig,
}

impl ChargerConfig {
    pub const DEFAULT: ChargerConfig = ChargerConfig {
        charge_current_ua: 1_000_000,
        vbus_ilim_ua: 1_500_000,
        battery_charge_termination_uv: 4_200_000,
        vsys_min_uv: 3_500_000,
        thermistor_mode: ThermistorMode::Disabled,
        int_active_low: true,
        led: LedConfig::DEFAULT,
    };

    /// Builds a config from board properties, parsing the thermistor mode
    /// name once.
    pub const fn from_properties(
        charge_current_ua: u32,
        vbus_ilim_ua: u32,
        battery_charge_termination_uv: u32,
        vsys_min_uv: u32,
        thermistor_mode: &str,
    ) -> Self {
        Self {
            charge_current_ua,
            vbus_ilim_ua,
            battery_charge_termination_uv,
            vsys_min_uv,
            thermistor_mode: ThermistorMode::from_name(thermistor_mode),
            ..Self::DEFAULT
        }
    }

    pub const fn with_led(self, led: LedConfig) -> Self {
        Self { led, ..self }
    }

    pub const fn with_int_active_low(self, int_active_low: bool) -> Self {
        Self { int_active_low, ..self }
    }
}

impl Default for ChargerConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
