use embedded_hal::i2c::{Error as _, ErrorKind};
use embedded_hal_async::i2c::I2c;

use crate::drivers::charger::BusError;

use super::registers::{Field, PF1550_I2C_ADDRESS};

// errno values reported for transport failures
const EIO: i32 = 5;
const ENXIO: i32 = 6;
const EAGAIN: i32 = 11;
const EOVERFLOW: i32 = 75;

/// Byte-wide register access to the charger.
pub trait RegisterBus {
    fn is_ready(&self) -> bool {
        true
    }

    async fn read_byte(&mut self, reg: u8) -> Result<u8, BusError>;

    async fn write_byte(&mut self, reg: u8, value: u8) -> Result<(), BusError>;

    /// Read-modify-write touching only the bits set in `mask`.
    async fn update_byte(&mut self, reg: u8, mask: u8, value: u8) -> Result<(), BusError> {
        let old = self.read_byte(reg).await?;
        let new = (old & !mask) | (value & mask);
        self.write_byte(reg, new).await
    }

    async fn read_field(&mut self, field: Field) -> Result<u8, BusError> {
        let val = self.read_byte(field.reg).await?;
        Ok(field.get(val))
    }

    async fn update_field(&mut self, field: Field, value: u8) -> Result<(), BusError> {
        self.update_byte(field.reg, field.mask(), field.prep(value)).await
    }
}

impl From<ErrorKind> for BusError {
    fn from(kind: ErrorKind) -> Self {
        let code = match kind {
            ErrorKind::NoAcknowledge(_) => ENXIO,
            ErrorKind::ArbitrationLoss => EAGAIN,
            ErrorKind::Overrun => EOVERFLOW,
            _ => EIO,
        };
        BusError(-code)
    }
}

/// [`RegisterBus`] over an async I2C bus.
pub struct I2cRegisterBus<I> {
    i2c: I,
    addr: u8,
}

impl<I: I2c> I2cRegisterBus<I> {
    pub fn new(i2c: I) -> Self {
        Self::with_address(i2c, PF1550_I2C_ADDRESS)
    }

    pub fn with_address(i2c: I, addr: u8) -> Self {
        Self { i2c, addr }
    }

    pub fn release(self) -> I {
        self.i2c
    }
}

impl<I: I2c> RegisterBus for I2cRegisterBus<I> {
    async fn read_byte(&mut self, reg: u8) -> Result<u8, BusError> {
        let mut buf = [0u8];
        self.i2c
            .write_read(self.addr, &[reg], &mut buf)
            .await
            .map_err(|e| BusError::from(e.kind()))?;
        trace!("pf1550 read {:#x} = {:#x}", reg, buf[0]);
        Ok(buf[0])
    }

    async fn write_byte(&mut self, reg: u8, value: u8) -> Result<(), BusError> {
        trace!("pf1550 write {:#x} = {:#x}", reg, value);
        self.i2c
            .write(self.addr, &[reg, value])
            .await
            .map_err(|e| BusError::from(e.kind()))
    }
}
