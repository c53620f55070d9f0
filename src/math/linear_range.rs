use num_traits::{clamp_max, clamp_min};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RangeError {
    OutOfRange,
}

/// One linear segment: register index `min_idx` encodes `min`, every further
/// index adds `step`. A zero step pins the whole segment to `min_idx`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinearRange {
    pub min: u32,
    pub step: u32,
    pub min_idx: u16,
    pub max_idx: u16,
}

impl LinearRange {
    pub const fn new(min: u32, step: u32, min_idx: u16, max_idx: u16) -> Self {
        Self {
            min,
            step,
            min_idx,
            max_idx,
        }
    }

    /// Largest value this segment can represent.
    pub const fn max_value(&self) -> u32 {
        self.min + (self.max_idx - self.min_idx) as u32 * self.step
    }

    fn index_of(&self, val: u32) -> u16 {
        if self.step == 0 {
            return self.min_idx;
        }

        let offset = (clamp_min(val, self.min) - self.min) / self.step;
        let offset = clamp_max(offset, (self.max_idx - self.min_idx) as u32);
        self.min_idx + offset as u16
    }

    fn contains_index(&self, idx: u16) -> bool {
        self.min_idx <= idx && idx <= self.max_idx
    }
}

/// Ordered set of segments, ascending by `min`. Segment `i` owns values in
/// `[min_i, min_{i+1})`, the last one everything from its `min` upwards.
#[derive(Clone, Copy, Debug)]
pub struct LinearRangeGroup<'a> {
    ranges: &'a [LinearRange],
}

impl<'a> LinearRangeGroup<'a> {
    pub const fn new(ranges: &'a [LinearRange]) -> Self {
        Self { ranges }
    }

    pub fn ranges(&self) -> &'a [LinearRange] {
        self.ranges
    }

    /// Maps a physical value onto a register index. Values below the first
    /// segment clamp to its lowest index, values past the last saturate.
    pub fn encode(&self, val: u32) -> Result<u16, RangeError> {
        let first = self.ranges.first().ok_or(RangeError::OutOfRange)?;
        if val < first.min {
            return Ok(first.min_idx);
        }

        // walk backwards, the first segment starting at or below val owns it
        let range = self
            .ranges
            .iter()
            .rev()
            .find(|range| range.min <= val)
            .ok_or(RangeError::OutOfRange)?;

        Ok(range.index_of(val))
    }

    /// Maps a register index back to the physical value it programs.
    pub fn decode(&self, idx: u16) -> Result<u32, RangeError> {
        self.ranges
            .iter()
            .find(|range| range.contains_index(idx))
            .map(|range| range.min + (idx - range.min_idx) as u32 * range.step)
            .ok_or(RangeError::OutOfRange)
    }
}
