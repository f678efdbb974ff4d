//! Off-thread collaborator calls with a single completion hand-off.
//!
//! A call runs as a tokio task and delivers exactly one finished value
//! through a [`Completion`]. The receiving side swaps that value into its
//! state in one step; nothing is streamed or merged incrementally.

use crate::error::ClientError;
use crate::generator::{PacketGeneratorClient, Scenario, TopologySnapshot};
use crate::simulator::SimulatorClient;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use topotrace_types::{PacketRecord, SimulationResult};
use tracing::debug;

/// Receiving end of an off-thread call.
#[derive(Debug)]
pub struct Completion<T> {
    rx: oneshot::Receiver<T>,
    cancel: CancellationToken,
}

impl<T> Completion<T> {
    fn pair(cancel: CancellationToken) -> (oneshot::Sender<T>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx, cancel })
    }

    /// Wait for the value. `None` if the task ended without sending one.
    pub async fn wait(self) -> Option<T> {
        self.rx.await.ok()
    }

    /// Take the value if it has arrived, without blocking.
    pub fn try_take(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// Ask the task to stop early.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

/// Run a simulation on the tokio runtime.
///
/// Must be called from within a runtime. Failures arrive as an unsuccessful
/// [`SimulationResult`].
pub fn spawn_simulation(
    client: SimulatorClient,
    script_name: String,
    script: Vec<u8>,
    cancel: CancellationToken,
) -> Completion<SimulationResult> {
    let (tx, completion) = Completion::pair(cancel.clone());
    tokio::spawn(async move {
        let result = client.run(&script_name, &script, &cancel).await;
        if tx.send(result).is_err() {
            debug!(script = %script_name, "Simulation result dropped, receiver gone");
        }
    });
    completion
}

/// Request packets from the remote generator on the tokio runtime.
pub fn spawn_generation(
    client: PacketGeneratorClient,
    topology: TopologySnapshot,
    scenario: Scenario,
    count: usize,
    cancel: CancellationToken,
) -> Completion<Result<Vec<PacketRecord>, ClientError>> {
    let (tx, completion) = Completion::pair(cancel.clone());
    tokio::spawn(async move {
        let result = client.generate(&topology, &scenario, count, &cancel).await;
        if tx.send(result).is_err() {
            debug!(scenario = %scenario, "Generated packets dropped, receiver gone");
        }
    });
    completion
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;

    #[tokio::test]
    async fn test_completion_delivers_once() {
        let (tx, mut completion) = Completion::pair(CancellationToken::new());
        assert_eq!(completion.try_take(), None);
        tx.send(7u32).unwrap();
        assert_eq!(completion.try_take(), Some(7));
        assert_eq!(completion.try_take(), None);
    }

    #[tokio::test]
    async fn test_dropped_sender_yields_none() {
        let (tx, completion) = Completion::<u32>::pair(CancellationToken::new());
        drop(tx);
        assert_eq!(completion.wait().await, None);
    }

    #[tokio::test]
    async fn test_spawned_generation_hands_back_result() {
        let client =
            PacketGeneratorClient::new(ClientConfig::new("http://127.0.0.1:9/generate")).unwrap();
        let completion = spawn_generation(
            client,
            TopologySnapshot::default(),
            Scenario::Normal,
            5,
            CancellationToken::new(),
        );
        let packets = completion.wait().await.unwrap().unwrap();
        assert!(packets.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_simulation_reports_failure() {
        let client =
            SimulatorClient::new(ClientConfig::new("http://127.0.0.1:9/simulate")).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let completion = spawn_simulation(client, "net.tcl".to_string(), Vec::new(), cancel);
        let result = completion.wait().await.unwrap();
        assert!(!result.success);
    }
}
