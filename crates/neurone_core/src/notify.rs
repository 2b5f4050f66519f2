use crate::config::Peer;

/// One-way, best-effort delivery of excitation to another neurone.
///
/// Implementations must return immediately; the axon never waits on delivery
/// and never learns whether it succeeded.
pub trait PeerNotifier {
    fn notify(&self, address: &str, transfer: f32);
}

impl<N: PeerNotifier + ?Sized> PeerNotifier for &N {
    fn notify(&self, address: &str, transfer: f32) {
        (**self).notify(address, transfer)
    }
}

impl<N: PeerNotifier + ?Sized> PeerNotifier for std::sync::Arc<N> {
    fn notify(&self, address: &str, transfer: f32) {
        (**self).notify(address, transfer)
    }
}

/// URL used to excite a peer: `<address>?e=<transfer>`.
pub fn excitation_url(address: &str, transfer: f32) -> String {
    format!("{}?e={:.6}", address, transfer)
}

/// Notify every peer in `peers` with its own configured transfer weight.
pub fn fan_out<N: PeerNotifier + ?Sized>(notifier: &N, peers: &[Peer]) {
    for peer in peers {
        notifier.notify(&peer.address, peer.transfer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excitation_url_format() {
        assert_eq!(
            excitation_url("http://10.1.1.5:8080/", 0.8),
            "http://10.1.1.5:8080/?e=0.800000"
        );
        assert_eq!(
            excitation_url("http://10.1.1.4:8080/", -1.0),
            "http://10.1.1.4:8080/?e=-1.000000"
        );
    }
}
