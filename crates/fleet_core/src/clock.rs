use bevy_ecs::prelude::Resource;

/// Fixed-step simulation clock in seconds. Only moves forward.
#[derive(Debug, Default, Clone, Copy, Resource)]
pub struct SimulationClock {
    now: f64,
    ticks: u64,
}

impl SimulationClock {
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Whole seconds elapsed, as printed in the event log.
    pub fn now_secs(&self) -> u64 {
        self.now as u64
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Advance by one tick. A negative or non-finite step counts as zero.
    pub fn advance(&mut self, step_secs: f64) {
        if step_secs.is_finite() && step_secs > 0.0 {
            self.now += step_secs;
        } else if step_secs != 0.0 {
            tracing::warn!(step_secs, "ignoring invalid time step; clock not advanced");
        }
        self.ticks += 1;
    }
}

/// Demand probability of the tick currently being executed.
#[derive(Debug, Clone, Copy, Resource)]
pub struct CurrentTick {
    pub demand_probability: f64,
}
