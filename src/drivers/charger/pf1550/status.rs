use crate::drivers::charger::{ChargerOnline, ChargerStatus};

use super::registers::{CHG_INT_BAT, CHG_INT_CHG, CHG_INT_VBUS, CHG_OPER_CHARGER_ON_LINEAR_ON};

/// Charger state machine position reported in CHG_SNS[3:0].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChargeSense {
    Precharge,
    FastChargeConstantCurrent,
    FastChargeConstantVoltage,
    EndOfCharge,
    ChargeDone,
    TimerFault,
    ThermistorSuspend,
    ChargerOffInvalidInput,
    BatteryOvervoltage,
    BatteryOvertemperature,
    ChargerOffLinearMode,
    Reserved(u8),
}

impl ChargeSense {
    pub const CHARGE_DONE: u8 = 4;

    pub const fn from_raw(raw: u8) -> Self {
        match raw & 0x0F {
            0 => ChargeSense::Precharge,
            1 => ChargeSense::FastChargeConstantCurrent,
            2 => ChargeSense::FastChargeConstantVoltage,
            3 => ChargeSense::EndOfCharge,
            4 => ChargeSense::ChargeDone,
            6 => ChargeSense::TimerFault,
            7 => ChargeSense::ThermistorSuspend,
            8 => ChargeSense::ChargerOffInvalidInput,
            9 => ChargeSense::BatteryOvervoltage,
            10 => ChargeSense::BatteryOvertemperature,
            12 => ChargeSense::ChargerOffLinearMode,
            raw => ChargeSense::Reserved(raw),
        }
    }
}

/// Every code below "charge done" is an active charge phase, everything
/// above it is some flavour of not charging.
pub const fn decode_status(raw: u8) -> ChargerStatus {
    let raw = raw & 0x0F;
    if raw == ChargeSense::CHARGE_DONE {
        ChargerStatus::Full
    } else if raw < ChargeSense::CHARGE_DONE {
        ChargerStatus::Charging
    } else {
        ChargerStatus::NotCharging
    }
}

pub const fn decode_online(raw: u8) -> ChargerOnline {
    match raw & 0x03 {
        CHG_OPER_CHARGER_ON_LINEAR_ON => ChargerOnline::Fixed,
        _ => ChargerOnline::Offline,
    }
}

/// Latched CHG_INT contents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InterruptSource(pub u8);

impl InterruptSource {
    pub const fn battery(&self) -> bool {
        self.0 & CHG_INT_BAT != 0
    }

    pub const fn charger(&self) -> bool {
        self.0 & CHG_INT_CHG != 0
    }

    pub const fn vbus(&self) -> bool {
        self.0 & CHG_INT_VBUS != 0
    }
}
