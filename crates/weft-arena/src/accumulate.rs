//! Lock-free fixed-point accumulation buffers.
//!
//! Several pipeline stages have many writers per particle: bending pairs
//! scatter into shared vertices, edge collision corrects both endpoints,
//! and self-collision contacts touch up to four particles each. Those
//! writes go through these buffers: values are scaled to fixed point and
//! added with atomic integer ops, then a single-writer drain pass averages
//! and applies them. Fixed point keeps the result independent of write
//! order, which floating-point atomics would not be.

use std::sync::atomic::{AtomicI32, AtomicU32, Ordering};

use weft_math::Vec3;
use weft_types::constants::ACCUMULATE_FIXED_SCALE;

#[inline]
fn to_fixed(v: f32) -> i32 {
    (v * ACCUMULATE_FIXED_SCALE) as i32
}

#[inline]
fn to_float(v: i32) -> f32 {
    v as f32 / ACCUMULATE_FIXED_SCALE
}

/// Per-slot vector accumulator with a contribution count.
#[derive(Debug, Default)]
pub struct AccumulateBuffer {
    count: Vec<AtomicU32>,
    sum: Vec<AtomicI32>,
}

impl AccumulateBuffer {
    /// Buffer with `slots` zeroed slots.
    pub fn new(slots: usize) -> Self {
        let mut buf = AccumulateBuffer::default();
        buf.ensure_slots(slots);
        buf
    }

    /// Number of slots.
    pub fn slots(&self) -> usize {
        self.count.len()
    }

    /// Grow to at least `slots` slots. New slots start zeroed.
    pub fn ensure_slots(&mut self, slots: usize) {
        while self.count.len() < slots {
            self.count.push(AtomicU32::new(0));
        }
        while self.sum.len() < slots * 3 {
            self.sum.push(AtomicI32::new(0));
        }
    }

    /// Add a contribution to `slot`, incrementing its count.
    pub fn add(&self, slot: usize, v: Vec3) {
        self.count[slot].fetch_add(1, Ordering::Relaxed);
        self.add_sum(slot, v);
    }

    /// Add to `slot`'s sum without counting a contribution.
    pub fn add_sum(&self, slot: usize, v: Vec3) {
        let base = slot * 3;
        self.sum[base].fetch_add(to_fixed(v.x), Ordering::Relaxed);
        self.sum[base + 1].fetch_add(to_fixed(v.y), Ordering::Relaxed);
        self.sum[base + 2].fetch_add(to_fixed(v.z), Ordering::Relaxed);
    }

    /// Contribution count for `slot`.
    pub fn contribution_count(&self, slot: usize) -> u32 {
        self.count[slot].load(Ordering::Relaxed)
    }

    /// Raw sum stored in `slot`.
    pub fn sum(&self, slot: usize) -> Vec3 {
        let base = slot * 3;
        Vec3::new(
            to_float(self.sum[base].load(Ordering::Relaxed)),
            to_float(self.sum[base + 1].load(Ordering::Relaxed)),
            to_float(self.sum[base + 2].load(Ordering::Relaxed)),
        )
    }

    /// Sum divided by contribution count, or zero when nothing was added.
    pub fn average(&self, slot: usize) -> Vec3 {
        let n = self.contribution_count(slot);
        if n == 0 {
            Vec3::ZERO
        } else {
            self.sum(slot) / n as f32
        }
    }

    /// Read the average and zero the slot. Single-writer drain only.
    pub fn take_average(&self, slot: usize) -> Vec3 {
        let avg = self.average(slot);
        self.clear_slot(slot);
        avg
    }

    /// Read the raw sum and zero the slot. Single-writer drain only.
    pub fn take_sum(&self, slot: usize) -> Vec3 {
        let s = self.sum(slot);
        self.clear_slot(slot);
        s
    }

    /// Zero one slot.
    pub fn clear_slot(&self, slot: usize) {
        self.count[slot].store(0, Ordering::Relaxed);
        let base = slot * 3;
        self.sum[base].store(0, Ordering::Relaxed);
        self.sum[base + 1].store(0, Ordering::Relaxed);
        self.sum[base + 2].store(0, Ordering::Relaxed);
    }

    /// Zero every slot.
    pub fn clear(&self) {
        for c in &self.count {
            c.store(0, Ordering::Relaxed);
        }
        for s in &self.sum {
            s.store(0, Ordering::Relaxed);
        }
    }
}

/// Per-slot scalar maximum, merged atomically.
///
/// Used for friction: overlapping contacts keep the strongest value
/// rather than summing. Values must be non-negative so fixed-point
/// integer ordering matches float ordering.
#[derive(Debug, Default)]
pub struct AtomicMaxBuffer {
    values: Vec<AtomicI32>,
}

impl AtomicMaxBuffer {
    /// Buffer with `slots` zeroed slots.
    pub fn new(slots: usize) -> Self {
        let mut buf = AtomicMaxBuffer::default();
        buf.ensure_slots(slots);
        buf
    }

    /// Number of slots.
    pub fn slots(&self) -> usize {
        self.values.len()
    }

    /// Grow to at least `slots` slots. New slots start zeroed.
    pub fn ensure_slots(&mut self, slots: usize) {
        while self.values.len() < slots {
            self.values.push(AtomicI32::new(0));
        }
    }

    /// Merge `v` into `slot`, keeping the maximum.
    pub fn merge_max(&self, slot: usize, v: f32) {
        debug_assert!(v >= 0.0);
        self.values[slot].fetch_max(to_fixed(v), Ordering::Relaxed);
    }

    /// Current value of `slot`.
    pub fn read(&self, slot: usize) -> f32 {
        to_float(self.values[slot].load(Ordering::Relaxed))
    }

    /// Read and zero `slot`. Single-writer drain only.
    pub fn take(&self, slot: usize) -> f32 {
        to_float(self.values[slot].swap(0, Ordering::Relaxed))
    }

    /// Zero every slot.
    pub fn clear(&self) {
        for v in &self.values {
            v.store(0, Ordering::Relaxed);
        }
    }
}
