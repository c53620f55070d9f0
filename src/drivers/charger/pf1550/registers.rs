/*
 * PF1550 charger register map. The charger block sits at 0x80 in the
 * PMIC's register space.
 */

use crate::math::linear_range::{LinearRange, LinearRangeGroup};

pub const PF1550_I2C_ADDRESS: u8 = 0x08;

const CHARGER_BASE: u8 = 0x80;

pub const CHARGER_CHG_INT: u8 = CHARGER_BASE + 0x00;
pub const CHARGER_CHG_INT_MASK: u8 = CHARGER_BASE + 0x02;
pub const CHARGER_CHG_INT_OK: u8 = CHARGER_BASE + 0x04;
pub const CHARGER_VBUS_SNS: u8 = CHARGER_BASE + 0x06;
pub const CHARGER_CHG_SNS: u8 = CHARGER_BASE + 0x07;
pub const CHARGER_BATT_SNS: u8 = CHARGER_BASE + 0x08;
pub const CHARGER_CHG_OPER: u8 = CHARGER_BASE + 0x09;
pub const CHARGER_CHG_TMR: u8 = CHARGER_BASE + 0x0A;
pub const CHARGER_CHG_EOC_CNFG: u8 = CHARGER_BASE + 0x0D;
pub const CHARGER_CHG_CURR_CFG: u8 = CHARGER_BASE + 0x0E;
pub const CHARGER_BATT_REG: u8 = CHARGER_BASE + 0x0F;
pub const CHARGER_BATFET_CNFG: u8 = CHARGER_BASE + 0x11;
pub const CHARGER_THM_REG_CNFG: u8 = CHARGER_BASE + 0x12;
pub const CHARGER_VBUS_INLIM_CNFG: u8 = CHARGER_BASE + 0x14;
pub const CHARGER_VBUS_LIN_DPM: u8 = CHARGER_BASE + 0x15;
pub const CHARGER_USB_PHY_LDO_CNFG: u8 = CHARGER_BASE + 0x16;
pub const CHARGER_DBNC_DELAY_TIME: u8 = CHARGER_BASE + 0x18;
pub const CHARGER_CHG_INT_CNFG: u8 = CHARGER_BASE + 0x19;
pub const CHARGER_THM_ADJ_SETTING: u8 = CHARGER_BASE + 0x1A;
pub const CHARGER_VBUS2SYS_CNFG: u8 = CHARGER_BASE + 0x1B;
pub const CHARGER_LED_PWM: u8 = CHARGER_BASE + 0x1C;
pub const CHARGER_FAULT_BATFET_CNFG: u8 = CHARGER_BASE + 0x1D;
pub const CHARGER_LED_CNFG: u8 = CHARGER_BASE + 0x1E;
pub const CHARGER_CHGR_KEY2: u8 = CHARGER_BASE + 0x1F;

/// Writing this to CHG_INT_MASK unmasks every charger interrupt source.
pub const CHG_INT_MASK_ENABLE_ALL: u8 = 0xFF;

// CHG_INT source bits
pub const CHG_INT_BAT: u8 = 1 << 2;
pub const CHG_INT_CHG: u8 = 1 << 3;
pub const CHG_INT_VBUS: u8 = 1 << 5;

/// A bit field inside a single register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Field {
    pub reg: u8,
    pub offset: u8,
    pub width: u8,
}

impl Field {
    pub const fn new(reg: u8, offset: u8, width: u8) -> Self {
        Self { reg, offset, width }
    }

    pub const fn mask(&self) -> u8 {
        (((1u16 << self.width) - 1) << self.offset) as u8
    }

    /// Shifts `value` into position. Bits that don't fit the field are dropped.
    pub const fn prep(&self, value: u8) -> u8 {
        ((value as u16) << self.offset) as u8 & self.mask()
    }

    pub const fn get(&self, reg_val: u8) -> u8 {
        (reg_val & self.mask()) >> self.offset
    }
}

pub const CHG_SNS_STATE: Field = Field::new(CHARGER_CHG_SNS, 0, 4);
pub const CHG_OPER_MODE: Field = Field::new(CHARGER_CHG_OPER, 0, 2);
pub const CHG_CURR_CFG_ICHG: Field = Field::new(CHARGER_CHG_CURR_CFG, 0, 5);
pub const BATT_REG_CHGCV: Field = Field::new(CHARGER_BATT_REG, 0, 6);
pub const BATT_REG_VSYSMIN: Field = Field::new(CHARGER_BATT_REG, 6, 2);
pub const THM_REG_CNFG_MODE: Field = Field::new(CHARGER_THM_REG_CNFG, 0, 2);
pub const VBUS_INLIM_CNFG_ILIM: Field = Field::new(CHARGER_VBUS_INLIM_CNFG, 3, 5);
pub const LED_PWM_EN: Field = Field::new(CHARGER_LED_PWM, 7, 1);
pub const LED_PWM_DUTY: Field = Field::new(CHARGER_LED_PWM, 0, 6);
pub const LED_CNFG_MANUAL: Field = Field::new(CHARGER_LED_CNFG, 5, 1);
pub const LED_CNFG_BEHAVIOUR: Field = Field::new(CHARGER_LED_CNFG, 4, 1);
pub const LED_CNFG_FREQ: Field = Field::new(CHARGER_LED_CNFG, 0, 2);

// CHG_OPER[1:0] encodings
pub const CHG_OPER_CHARGER_OFF_LINEAR_OFF: u8 = 0b00;
pub const CHG_OPER_CHARGER_OFF_LINEAR_ON: u8 = 0b01;
pub const CHG_OPER_CHARGER_ON_LINEAR_ON: u8 = 0b10;

const VBUS_ILIM_RANGES: [LinearRange; 4] = [
    LinearRange::new(10_000, 5_000, 0, 8),
    LinearRange::new(100_000, 50_000, 9, 10),
    LinearRange::new(200_000, 100_000, 11, 19),
    LinearRange::new(1_500_000, 0, 20, 20),
];

const FAST_CHARGE_UA_RANGES: [LinearRange; 1] = [LinearRange::new(100_000, 50_000, 0, 18)];

const TERMINATION_UV_RANGES: [LinearRange; 1] = [LinearRange::new(3_500_000, 20_000, 8, 55)];

const VSYS_MIN_UV_RANGES: [LinearRange; 3] = [
    LinearRange::new(3_500_000, 0, 0, 0),
    LinearRange::new(3_700_000, 0, 1, 1),
    LinearRange::new(4_300_000, 0, 2, 2),
];

pub const VBUS_ILIM_UA: LinearRangeGroup<'static> = LinearRangeGroup::new(&VBUS_ILIM_RANGES);
pub const FAST_CHARGE_UA: LinearRangeGroup<'static> = LinearRangeGroup::new(&FAST_CHARGE_UA_RANGES);
pub const TERMINATION_UV: LinearRangeGroup<'static> = LinearRangeGroup::new(&TERMINATION_UV_RANGES);
pub const VSYS_MIN_UV: LinearRangeGroup<'static> = LinearRangeGroup::new(&VSYS_MIN_UV_RANGES);
