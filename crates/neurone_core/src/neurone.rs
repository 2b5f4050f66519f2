use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Energy displayed while waiting for the installation to start; outside the
/// operating range so the lights know nothing is animated yet.
pub const IDLE_ENERGY: f32 = -2.0;
/// Energy a neurone drops to immediately after firing.
pub const FIRE_RESET_ENERGY: f32 = -1.0;
/// Energy at the end of a cooldown or startup sweep.
pub const BASELINE_ENERGY: f32 = 0.0;

/// Animation phase of the axon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Holding until the master signals startup (visited once, at boot).
    Wait,
    /// Non-interactive intro sweep (visited once, after `Wait`).
    Startup,
    /// Integrating excitation from the dendrites.
    Accumulate,
    /// Refractory sweep back to baseline after firing.
    Cooldown,
    /// Short flash after a large single burst of excitation.
    Powerup,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Wait => "wait",
            Phase::Startup => "startup",
            Phase::Accumulate => "accumulate",
            Phase::Cooldown => "cooldown",
            Phase::Powerup => "powerup",
        };
        f.write_str(name)
    }
}

/// Immutable snapshot of a neurone. Each step of the axon returns a new one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neurone {
    pub phase: Phase,
    /// Currently displayed energy.
    pub energy: f32,
    /// Energy when the phase was entered; the cooldown sweep starts here.
    pub origin: f32,
    pub phase_start: Instant,
    pub phase_duration: Duration,
}

impl Neurone {
    /// Boot state: waiting, idle energy, timer running for `wait_length`.
    pub fn waiting(now: Instant, wait_length: Duration) -> Self {
        Self::enter(Phase::Wait, IDLE_ENERGY, now, wait_length)
    }

    pub(crate) fn enter(phase: Phase, energy: f32, now: Instant, duration: Duration) -> Self {
        Self {
            phase,
            energy,
            origin: energy,
            phase_start: now,
            phase_duration: duration,
        }
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.phase_start)
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.elapsed(now) >= self.phase_duration
    }

    /// Linear sweep from `origin` to baseline over the phase duration.
    pub fn interpolated_energy(&self, now: Instant) -> f32 {
        if self.phase_duration.is_zero() {
            return BASELINE_ENERGY;
        }
        let t = (self.elapsed(now).as_secs_f64() / self.phase_duration.as_secs_f64()).min(1.0);
        self.origin + (BASELINE_ENERGY - self.origin) * t as f32
    }

    pub fn snapshot(&self, now: Instant) -> NeuroneSnapshot {
        NeuroneSnapshot {
            phase: self.phase,
            energy: self.energy,
            elapsed_secs: self.elapsed(now).as_secs_f64(),
            duration_secs: self.phase_duration.as_secs_f64(),
        }
    }
}

/// Serializable view of a neurone for logging and the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NeuroneSnapshot {
    pub phase: Phase,
    pub energy: f32,
    pub elapsed_secs: f64,
    pub duration_secs: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolation_endpoints() {
        let t0 = Instant::now();
        let n = Neurone::enter(Phase::Cooldown, -1.0, t0, Duration::from_secs(4));

        assert_eq!(n.interpolated_energy(t0), -1.0);
        assert!((n.interpolated_energy(t0 + Duration::from_secs(1)) + 0.75).abs() < 1e-6);
        assert!((n.interpolated_energy(t0 + Duration::from_secs(2)) + 0.5).abs() < 1e-6);
        assert_eq!(n.interpolated_energy(t0 + Duration::from_secs(10)), 0.0);
    }

    #[test]
    fn test_snapshot_reports_phase_timing() {
        let t0 = Instant::now();
        let n = Neurone::waiting(t0, Duration::from_secs(30));
        let snap = n.snapshot(t0 + Duration::from_millis(1500));

        assert_eq!(snap.phase, Phase::Wait);
        assert_eq!(snap.energy, IDLE_ENERGY);
        assert!((snap.elapsed_secs - 1.5).abs() < 1e-9);
        assert_eq!(snap.duration_secs, 30.0);
    }
}
