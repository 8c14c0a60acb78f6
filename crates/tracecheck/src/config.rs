/// Limits applied to a checking run.
///
/// Both limits are cooperative: they are tested once per loop step and never
/// interrupt a pair that is already being checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckConfig {
    /// Stop once this many instruction pairs have been checked.
    pub max_instructions: Option<usize>,
    /// Stop after the first error (sync warnings never stop the run).
    pub stop_on_error: bool,
    /// Give up after this many consecutive candidate skips without a match.
    pub max_resync: Option<usize>,
}

impl CheckConfig {
    /// Cap the run at `n` checked instructions; zero means unbounded.
    #[must_use]
    pub const fn with_max_instructions(mut self, n: usize) -> Self {
        self.max_instructions = if n == 0 { None } else { Some(n) };
        self
    }

    #[must_use]
    pub const fn with_stop_on_error(mut self, stop: bool) -> Self {
        self.stop_on_error = stop;
        self
    }

    #[must_use]
    pub const fn with_max_resync(mut self, limit: Option<usize>) -> Self {
        self.max_resync = limit;
        self
    }
}
