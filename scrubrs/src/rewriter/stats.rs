use std::time::Duration;

/// One timing entry: how often something ran and for how long in total.
#[derive(Debug, Clone, PartialEq)]
pub struct Stat {
    pub label: String,
    pub count: usize,
    pub millis: f64,
}

/// Timings collected over one pipeline run, in the order they completed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stats {
    entries: Vec<Stat>,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    pub fn record(&mut self, label: impl Into<String>, count: usize, elapsed: Duration) {
        self.entries.push(Stat {
            label: label.into(),
            count,
            millis: elapsed.as_secs_f64() * 1000.0,
        });
    }

    pub fn entries(&self) -> &[Stat] {
        &self.entries
    }

    pub fn get(&self, label: &str) -> Option<&Stat> {
        self.entries.iter().find(|stat| stat.label == label)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends every entry of `other`, keeping its order.
    pub fn extend(&mut self, other: Stats) {
        self.entries.extend(other.entries);
    }

    pub fn into_entries(self) -> Vec<Stat> {
        self.entries
    }
}

/// Running total for one handler.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CallTimer {
    pub(crate) calls: usize,
    pub(crate) elapsed: Duration,
}

impl CallTimer {
    pub(crate) fn add(&mut self, elapsed: Duration) {
        self.calls += 1;
        self.elapsed += elapsed;
    }
}
