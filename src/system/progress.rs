/// Wraps a caller's progress callback so a run's values never go backwards
/// and never exceed 100.
pub struct ProgressReporter<F: FnMut(u8)> {
    sink: F,
    last: u8,
}

impl<F: FnMut(u8)> ProgressReporter<F> {
    pub fn new(sink: F) -> Self {
        ProgressReporter { sink, last: 0 }
    }

    pub fn report(&mut self, percent: u8) {
        let percent = percent.min(100).max(self.last);
        self.last = percent;
        (self.sink)(percent);
    }

    /// Report `done` out of `total`, rounded down. Nothing is reported when
    /// `total` is zero.
    pub fn step(&mut self, done: usize, total: usize) {
        if total == 0 {
            return;
        }
        let percent = done.min(total) * 100 / total;
        self.report(percent as u8);
    }

    pub fn finish(&mut self) {
        self.report(100);
    }

    pub fn last(&self) -> u8 {
        self.last
    }
}
