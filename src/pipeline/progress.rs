//! Monotonic progress reporting.
//!
//! Callers hand in a plain callback; the reporter guarantees the values
//! it forwards never decrease for one request and end at 100 on success.

pub struct ProgressReporter<'a> {
    sink: Box<dyn FnMut(u8) + 'a>,
    last: Option<u8>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new(sink: impl FnMut(u8) + 'a) -> Self {
        Self {
            sink: Box::new(sink),
            last: None,
        }
    }

    /// Forward an absolute percentage, dropping regressions and repeats.
    pub fn report(&mut self, percent: u8) {
        let clamped = percent.min(100);
        if self.last.is_some_and(|last| clamped <= last) {
            return;
        }
        self.last = Some(clamped);
        (self.sink)(clamped);
    }

    /// Map a stage-local fraction into the stage's [lo, hi] span.
    pub fn report_span(&mut self, lo: u8, hi: u8, fraction: f32) {
        let lo = lo.min(100);
        let hi = hi.max(lo).min(100);
        let fraction = fraction.clamp(0.0, 1.0);
        let value = lo as f32 + (hi - lo) as f32 * fraction;
        self.report(value.floor() as u8);
    }

    pub fn finish(&mut self) {
        self.report(100);
    }
}
