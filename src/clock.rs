//! Monotonic time source for the polling state machine.

/// Millisecond monotonic clock
///
/// The counter may wrap; elapsed time is computed with wrapping arithmetic,
/// so any gate shorter than the wrap period works across the rollover.
pub trait Clock {
    /// Milliseconds since an arbitrary, fixed starting point
    fn now_ms(&self) -> u32;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}

/// Milliseconds elapsed from `since` to `now`
#[must_use]
pub(crate) const fn elapsed(now: u32, since: u32) -> u32 {
    now.wrapping_sub(since)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_survives_wraparound() {
        assert_eq!(elapsed(15, 5), 10);
        assert_eq!(elapsed(4, u32::MAX - 5), 10);
    }
}
