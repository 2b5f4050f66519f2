use crate::dendrite_web::{spawn_dendrite, DendriteState};
use crate::peer::HttpNotifier;
use crate::serial::{open_lighting_sink, DevDirectory};
use neurone_core::{Axon, LightingSink, Neurone, NeuroneSnapshot, NodeConfig, PeerNotifier};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

/// Excitation waiting for the axon; producers block once it is full.
const EXCITATION_QUEUE_DEPTH: usize = 64;

/// Current time on the runtime clock (virtual when the clock is paused in tests).
fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

/// Bring up a neurone: lighting, dendrites, and the axon loop. Runs until the
/// process is terminated.
pub async fn run_node(config: NodeConfig) -> anyhow::Result<()> {
    let config = Arc::new(config);
    info!(
        master = config.master_node,
        adjacent = config.adjacent_nodes.len(),
        listen = %config.listen_address,
        "Starting neurone"
    );

    let sink = open_lighting_sink(&DevDirectory::default()).await;
    let notifier = HttpNotifier::new()?;
    let mut axon = Axon::new(config.clone(), sink, notifier);

    let neurone = axon.boot(now());
    let (status_tx, status_rx) = watch::channel(neurone.snapshot(now()));
    let (excitation_tx, excitation_rx) = mpsc::channel(EXCITATION_QUEUE_DEPTH);

    spawn_dendrite(
        config.bind_address(),
        DendriteState {
            excitation: excitation_tx.clone(),
            status: status_rx,
        },
    );

    run_axon(axon, neurone, excitation_rx, status_tx).await;

    // Only reachable if every producer hung up, which the held sender prevents.
    drop(excitation_tx);
    Ok(())
}

/// The axon loop: the sole owner of the neurone. Each pass waits (bounded by
/// the phase's timeout) for one excitation event, steps the machine and
/// publishes the new snapshot. Returns once every dendrite has disconnected.
pub async fn run_axon<S, N>(
    mut axon: Axon<S, N>,
    mut neurone: Neurone,
    mut dendrites: mpsc::Receiver<f32>,
    status: watch::Sender<NeuroneSnapshot>,
) where
    S: LightingSink,
    N: PeerNotifier,
{
    loop {
        let wait = axon.receive_timeout(&neurone, now());
        let event = match tokio::time::timeout(wait, dendrites.recv()).await {
            Ok(Some(delta)) => Some(delta),
            Ok(None) => {
                warn!("All dendrites disconnected, axon stopping");
                return;
            }
            Err(_) => None,
        };

        neurone = axon.step(neurone, event, now());
        status.send_replace(neurone.snapshot(now()));
    }
}
