use anyhow::bail;
use espnow_comm::{
    event_channel, CommConfig, EspNowComm, LinkLayer, MacAddress, ReceiveEvent, SendEvent,
    DEFAULT_EVENT_CAPACITY,
};
use log::{info, warn};
use smol::channel::Receiver;
use std::fmt::Debug;

/// A basic echo server: every frame received is sent back to its source.
pub struct EchoServer<L: LinkLayer> {
    pub comm: EspNowComm<L>,
    received: Receiver<ReceiveEvent>,
    reports: Receiver<SendEvent>,
}

impl<L: LinkLayer> EchoServer<L>
where
    L::Error: Sync + Send + Debug + 'static,
{
    pub fn new(device: L) -> anyhow::Result<(Self, MacAddress)> {
        let (rx_sender, received) = event_channel(DEFAULT_EVENT_CAPACITY);
        let (tx_sender, reports) = event_channel(DEFAULT_EVENT_CAPACITY);
        let comm = EspNowComm::new(device);
        let address = comm.init(
            CommConfig::new()
                .with_receive_handler(rx_sender)
                .with_send_handler(tx_sender),
        )?;
        Ok((
            Self {
                comm,
                received,
                reports,
            },
            address,
        ))
    }

    /// Echoes frames until the communication is shut down.
    pub async fn run(&self) -> anyhow::Result<usize> {
        let mut echoed = 0;
        loop {
            let msg = match self.received.recv().await {
                Ok(msg) => msg,
                Err(_) => break,
            };
            info!(
                "Received {} bytes from {}: {}",
                msg.payload.len(),
                msg.source,
                String::from_utf8_lossy(&msg.payload)
            );
            // Reception is open to anyone, sending back needs the source registered.
            if !self.comm.is_peer(&msg.source) {
                if let Err(err) = self.comm.add_peer(msg.source) {
                    warn!("Cannot echo to {}: {}", msg.source, err);
                    continue;
                }
            }
            self.comm.send(msg.source, &msg.payload)?;
            echoed += 1;

            while let Ok(report) = self.reports.try_recv() {
                if !report.status.is_success() {
                    warn!("Echo to {} was not acknowledged.", report.destination);
                }
            }
        }
        if echoed == 0 {
            bail!("Server stopped before echoing anything.");
        }
        Ok(echoed)
    }
}
