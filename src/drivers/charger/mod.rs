/*
 * Chip-independent charger types: status, online state, the property
 * interface and the error taxonomy shared by charger drivers.
 */

use crate::math::linear_range::RangeError;

pub mod pf1550;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChargerStatus {
    NotCharging,
    Charging,
    Full,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChargerOnline {
    Offline,
    /// A fixed supply is powering the charger input.
    Fixed,
}

pub type StatusNotifier = fn(ChargerStatus);
pub type OnlineNotifier = fn(ChargerOnline);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChargerProperty {
    Online,
    Status,
    ConstantChargeCurrentUa,
    InputCurrentLimitUa,
    StatusNotification,
    OnlineNotification,
}

#[derive(Clone, Copy, Debug)]
pub enum PropertyValue {
    Online(ChargerOnline),
    Status(ChargerStatus),
    ConstantChargeCurrentUa(u32),
    InputCurrentLimitUa(u32),
    StatusNotification(Option<StatusNotifier>),
    OnlineNotification(Option<OnlineNotifier>),
}

impl PropertyValue {
    pub fn property(&self) -> ChargerProperty {
        match self {
            PropertyValue::Online(_) => ChargerProperty::Online,
            PropertyValue::Status(_) => ChargerProperty::Status,
            PropertyValue::ConstantChargeCurrentUa(_) => ChargerProperty::ConstantChargeCurrentUa,
            PropertyValue::InputCurrentLimitUa(_) => ChargerProperty::InputCurrentLimitUa,
            PropertyValue::StatusNotification(_) => ChargerProperty::StatusNotification,
            PropertyValue::OnlineNotification(_) => ChargerProperty::OnlineNotification,
        }
    }
}

/// Opaque error code reported by the bus transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusError(pub i32);

/// Opaque error code reported by the GPIO controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GpioError(pub i32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Bus or interrupt line was not ready at init.
    NotReady,
    Bus(BusError),
    Gpio(GpioError),
    Unsupported,
    /// Requested value has no register encoding. Nothing was written.
    OutOfRange,
}

impl From<BusError> for Error {
    fn from(err: BusError) -> Self {
        Error::Bus(err)
    }
}

impl From<GpioError> for Error {
    fn from(err: GpioError) -> Self {
        Error::Gpio(err)
    }
}

impl From<RangeError> for Error {
    fn from(err: RangeError) -> Self {
        match err {
            RangeError::OutOfRange => Error::OutOfRange,
        }
    }
}
