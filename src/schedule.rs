//! Cooperative scheduling hook for long per-pixel loops.
//!
//! On a constrained target the hook hands control back to the system
//! scheduler (watchdog feeding, radio stacks). Hosted builds use [`NoYield`].
//! Results never depend on whether or how often the hook runs.

pub trait CooperativeYield {
    fn yield_now(&mut self);
}

/// Hosted default: yielding is a no-op.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoYield;

impl CooperativeYield for NoYield {
    #[inline]
    fn yield_now(&mut self) {}
}

/// Invokes a [`CooperativeYield`] hook once every `every_rows` rows.
pub struct RowYield<'a> {
    hook: &'a mut dyn CooperativeYield,
    every_rows: usize,
}

impl<'a> RowYield<'a> {
    /// `every_rows == 0` disables yielding.
    pub fn new(hook: &'a mut dyn CooperativeYield, every_rows: usize) -> Self {
        Self { hook, every_rows }
    }

    /// Call after finishing row `y`.
    #[inline]
    pub fn row_done(&mut self, y: usize) {
        if self.every_rows != 0 && (y + 1) % self.every_rows == 0 {
            self.hook.yield_now();
        }
    }
}

/// Counts invocations so tests can assert that long loops yield.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct CountingYield {
    pub calls: usize,
}

#[cfg(test)]
impl CooperativeYield for CountingYield {
    fn yield_now(&mut self) {
        self.calls += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yields_at_fixed_row_interval() {
        let mut hook = CountingYield::default();
        let mut rows = RowYield::new(&mut hook, 16);
        for y in 0..100 {
            rows.row_done(y);
        }
        assert_eq!(hook.calls, 6);
    }

    #[test]
    fn zero_interval_never_yields() {
        let mut hook = CountingYield::default();
        let mut rows = RowYield::new(&mut hook, 0);
        for y in 0..64 {
            rows.row_done(y);
        }
        assert_eq!(hook.calls, 0);
    }
}
