//! In-memory register file and interrupt line for host tests.

use std::{cell::RefCell, collections::BTreeSet, rc::Rc, vec::Vec};

use crate::drivers::charger::{BusError, GpioError};

use super::{bus::RegisterBus, irq::InterruptLine, registers::CHARGER_CHG_INT};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Read(u8),
    Write(u8, u8),
    LineConfigured,
    LineEnabled(bool),
}

struct Inner {
    regs: [u8; 256],
    events: Vec<Event>,
    failing_reads: BTreeSet<u8>,
    failing_writes: BTreeSet<u8>,
    ready: bool,
    line_ready: bool,
    line_enabled: bool,
    line_error: Option<GpioError>,
    configure_error: Option<GpioError>,
}

/// Cloning hands out another handle to the same register file.
#[derive(Clone)]
pub struct MockBus {
    inner: Rc<RefCell<Inner>>,
}

impl MockBus {
    pub const ERROR: BusError = BusError(-5);

    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                regs: [0; 256],
                events: Vec::new(),
                failing_reads: BTreeSet::new(),
                failing_writes: BTreeSet::new(),
                ready: true,
                line_ready: true,
                line_enabled: false,
                line_error: None,
                configure_error: None,
            })),
        }
    }

    pub fn line(&self) -> MockLine {
        MockLine {
            inner: self.inner.clone(),
        }
    }

    pub fn set_reg(&self, reg: u8, value: u8) {
        self.inner.borrow_mut().regs[reg as usize] = value;
    }

    pub fn reg(&self, reg: u8) -> u8 {
        self.inner.borrow().regs[reg as usize]
    }

    pub fn set_ready(&self, ready: bool) {
        self.inner.borrow_mut().ready = ready;
    }

    pub fn fail_reads(&self, reg: u8) {
        self.inner.borrow_mut().failing_reads.insert(reg);
    }

    pub fn fail_writes(&self, reg: u8) {
        self.inner.borrow_mut().failing_writes.insert(reg);
    }

    /// Makes every later line enable/disable fail with `err`, or succeed again.
    pub fn fail_line(&self, err: Option<GpioError>) {
        self.inner.borrow_mut().line_error = err;
    }

    pub fn line_enabled(&self) -> bool {
        self.inner.borrow().line_enabled
    }

    pub fn events(&self) -> Vec<Event> {
        self.inner.borrow().events.clone()
    }

    pub fn clear_events(&self) {
        self.inner.borrow_mut().events.clear();
    }
}

impl RegisterBus for MockBus {
    fn is_ready(&self) -> bool {
        self.inner.borrow().ready
    }

    async fn read_byte(&mut self, reg: u8) -> Result<u8, BusError> {
        let mut inner = self.inner.borrow_mut();
        inner.events.push(Event::Read(reg));
        if inner.failing_reads.contains(&reg) {
            return Err(Self::ERROR);
        }

        let val = inner.regs[reg as usize];
        // latched interrupt bits clear on read
        if reg == CHARGER_CHG_INT {
            inner.regs[reg as usize] = 0;
        }
        Ok(val)
    }

    async fn write_byte(&mut self, reg: u8, value: u8) -> Result<(), BusError> {
        let mut inner = self.inner.borrow_mut();
        inner.events.push(Event::Write(reg, value));
        if inner.failing_writes.contains(&reg) {
            return Err(Self::ERROR);
        }

        inner.regs[reg as usize] = value;
        Ok(())
    }
}

pub struct MockLine {
    inner: Rc<RefCell<Inner>>,
}

impl MockLine {
    pub fn set_ready(&mut self, ready: bool) {
        self.inner.borrow_mut().line_ready = ready;
    }

    pub fn fail_configure(&mut self, err: GpioError) {
        self.inner.borrow_mut().configure_error = Some(err);
    }
}

impl InterruptLine for MockLine {
    fn is_ready(&self) -> bool {
        self.inner.borrow().line_ready
    }

    fn configure_input(&mut self) -> Result<(), GpioError> {
        let mut inner = self.inner.borrow_mut();
        if let Some(err) = inner.configure_error {
            return Err(err);
        }
        inner.events.push(Event::LineConfigured);
        Ok(())
    }

    fn set_interrupt(&self, enabled: bool) -> Result<(), GpioError> {
        let mut inner = self.inner.borrow_mut();
        if let Some(err) = inner.line_error {
            return Err(err);
        }
        inner.events.push(Event::LineEnabled(enabled));
        inner.line_enabled = enabled;
        Ok(())
    }
}
