//! Trait for components advanced by clock ticks.

/// A component that can be advanced by clock ticks.
///
/// Components track their own phase relative to the clock that drives them.
/// In the VCS the RIOT ticks at the CPU rate and the TIA at three times
/// that; the orchestrator owns the ratio, each chip only sees `tick()`.
pub trait Tickable {
    /// Advance the component by one tick of its own clock.
    fn tick(&mut self);

    /// Advance the component by multiple ticks.
    fn tick_n(&mut self, count: u64) {
        for _ in 0..count {
            self.tick();
        }
    }
}
