//! Axon State Machine
//!
//! Integrates excitation from the dendrites into a neurone's energy, fires
//! into adjacent neurones when the energy crosses the fire threshold, and
//! steps the lighting through the wait, startup, cooldown and powerup
//! animations.
//!
//! `Axon::step` is the whole machine: given the current snapshot, the event
//! received this tick (or `None` on timeout) and the current time, it performs
//! the side effects for that transition and returns the next snapshot.

use crate::config::NodeConfig;
use crate::lighting::{LightCommand, LightingSink};
use crate::neurone::{Neurone, Phase, BASELINE_ENERGY, FIRE_RESET_ENERGY, IDLE_ENERGY};
use crate::notify::{fan_out, PeerNotifier};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// While waiting, a follower treats any excitation below this as the master's
/// startup signal.
pub const STARTUP_SIGNAL: f32 = -0.5;

/// Transition context: configuration plus the lighting and notification
/// capabilities the machine drives.
pub struct Axon<S, N> {
    config: Arc<NodeConfig>,
    sink: S,
    notifier: N,
}

impl<S: LightingSink, N: PeerNotifier> Axon<S, N> {
    pub fn new(config: Arc<NodeConfig>, sink: S, notifier: N) -> Self {
        Self {
            config,
            sink,
            notifier,
        }
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Create the boot snapshot and show the idle level on the lights.
    pub fn boot(&mut self, now: Instant) -> Neurone {
        self.display(LightCommand::Energy(IDLE_ENERGY));
        Neurone::waiting(now, self.config.timings.wait_length())
    }

    /// How long the loop may block for the next event before stepping anyway.
    pub fn receive_timeout(&self, neurone: &Neurone, now: Instant) -> Duration {
        let timings = &self.config.timings;
        match neurone.phase {
            Phase::Wait if self.config.master_node => timings.master_poll(),
            Phase::Wait => timings.wait_timeout().saturating_sub(neurone.elapsed(now)),
            Phase::Accumulate | Phase::Startup | Phase::Cooldown | Phase::Powerup => {
                timings.drain_poll()
            }
        }
    }

    /// Advance the machine by one tick.
    pub fn step(&mut self, neurone: Neurone, event: Option<f32>, now: Instant) -> Neurone {
        let next = match neurone.phase {
            Phase::Wait if self.config.master_node => self.master_wait(neurone, now),
            Phase::Wait => self.follower_wait(neurone, event, now),
            Phase::Startup | Phase::Cooldown => self.sweep(neurone, now),
            Phase::Accumulate => self.accumulate(neurone, event, now),
            Phase::Powerup => self.powerup(neurone, now),
        };

        if next.phase != neurone.phase {
            info!(
                from = %neurone.phase,
                to = %next.phase,
                energy = next.energy,
                "Phase transition"
            );
        }
        debug!(phase = %next.phase, energy = next.energy, "Tick");

        next
    }

    fn master_wait(&mut self, neurone: Neurone, now: Instant) -> Neurone {
        // Events reaching the master before startup are discarded.
        if !neurone.is_expired(now) {
            return neurone;
        }

        info!(
            peers = self.config.all_nodes.len(),
            "Broadcasting startup to all neurones"
        );
        fan_out(&self.notifier, &self.config.all_nodes);

        self.enter_startup(now)
    }

    fn follower_wait(&mut self, neurone: Neurone, event: Option<f32>, now: Instant) -> Neurone {
        if event.is_some_and(|de| de < STARTUP_SIGNAL) {
            return self.enter_startup(now);
        }

        if neurone.elapsed(now) >= self.config.timings.wait_timeout() {
            // The master never showed up; go straight to interactive mode.
            warn!("No startup signal from master, skipping intro");
            return Neurone::enter(Phase::Accumulate, BASELINE_ENERGY, now, Duration::ZERO);
        }

        neurone
    }

    fn enter_startup(&mut self, now: Instant) -> Neurone {
        Neurone::enter(
            Phase::Startup,
            FIRE_RESET_ENERGY,
            now,
            self.config.timings.startup_length(),
        )
    }

    fn accumulate(&mut self, neurone: Neurone, event: Option<f32>, now: Instant) -> Neurone {
        let Some(de) = event else {
            return neurone;
        };
        let timings = &self.config.timings;
        let energy = neurone.energy + de;

        if energy > timings.fire_threshold {
            info!(
                energy,
                peers = self.config.adjacent_nodes.len(),
                "Threshold crossed, firing axon"
            );
            fan_out(&self.notifier, &self.config.adjacent_nodes);

            let cooldown = timings.cooldown_length();
            return Neurone::enter(Phase::Cooldown, FIRE_RESET_ENERGY, now, cooldown);
        }

        // A single large jump means a neighbour just fired into us.
        if de > timings.powerup_threshold {
            let powerup = timings.powerup_length();
            self.display(LightCommand::Powerup);
            return Neurone::enter(Phase::Powerup, energy, now, powerup);
        }

        self.display(LightCommand::Energy(energy));
        Neurone::enter(Phase::Accumulate, energy, now, Duration::ZERO)
    }

    /// Cooldown and startup: sweep the displayed energy back to baseline.
    fn sweep(&mut self, neurone: Neurone, now: Instant) -> Neurone {
        if neurone.is_expired(now) {
            return Neurone::enter(Phase::Accumulate, BASELINE_ENERGY, now, Duration::ZERO);
        }

        let energy = neurone.interpolated_energy(now);
        self.display(LightCommand::Cooldown(energy));
        Neurone { energy, ..neurone }
    }

    fn powerup(&mut self, neurone: Neurone, now: Instant) -> Neurone {
        if neurone.is_expired(now) {
            return Neurone::enter(Phase::Accumulate, neurone.energy, now, Duration::ZERO);
        }
        neurone
    }

    fn display(&mut self, command: LightCommand) {
        if let Err(e) = self.sink.send(command) {
            warn!(error = %e, command = ?command, "Lighting sink write failed");
        }
    }
}
