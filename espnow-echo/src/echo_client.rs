use anyhow::bail;
use espnow_comm::{
    event_channel, CommConfig, EspNowComm, LinkLayer, MacAddress, ReceiveEvent, SendEvent,
    DEFAULT_EVENT_CAPACITY,
};
use log::{info, warn};
use smol::channel::{Receiver, RecvError};
use smol::future::FutureExt;
use smol::Timer;
use std::fmt::Debug;
use std::time::Duration;

/// How long to wait for an echo before giving up on a message.
const ECHO_TIMEOUT: Duration = Duration::from_millis(500);

/// A basic echo client //
pub struct EchoClient<L: LinkLayer> {
    pub comm: EspNowComm<L>,
    pub messages: Vec<Vec<u8>>,
    received: Receiver<ReceiveEvent>,
    reports: Receiver<SendEvent>,
}

enum Waited {
    Echo(Result<ReceiveEvent, RecvError>),
    Timeout,
}

impl<L: LinkLayer> EchoClient<L>
where
    L::Error: Sync + Send + Debug + 'static,
{
    pub fn new(device: L, msgs: Vec<Vec<u8>>) -> anyhow::Result<Self> {
        let (rx_sender, received) = event_channel(DEFAULT_EVENT_CAPACITY);
        let (tx_sender, reports) = event_channel(DEFAULT_EVENT_CAPACITY);
        let comm = EspNowComm::new(device);
        comm.init(
            CommConfig::new()
                .with_receive_handler(rx_sender)
                .with_send_handler(tx_sender),
        )?;
        Ok(Self {
            comm,
            messages: msgs,
            received,
            reports,
        })
    }

    /// Sends every message to `server` and waits for its echo. Returns the number of echoes.
    pub async fn run(&mut self, server: MacAddress) -> anyhow::Result<usize> {
        self.comm.add_peer(server)?;
        let mut echoes = 0;
        for msg in std::mem::take(&mut self.messages) {
            info!("Sending message: {}", String::from_utf8_lossy(&msg));
            self.comm.send(server, &msg)?;

            match self.reports.recv().await {
                Ok(report) => info!(
                    "Send to {}: {}",
                    report.destination,
                    if report.status.is_success() { "SUCCESS" } else { "FAIL" }
                ),
                Err(_) => bail!("Fatal error: radio disconnected."),
            }

            let echo = async { Waited::Echo(self.received.recv().await) }
                .or(async {
                    Timer::after(ECHO_TIMEOUT).await;
                    Waited::Timeout
                })
                .await;
            match echo {
                Waited::Echo(Ok(echo)) if echo.payload == msg => {
                    info!("Received {} bytes from {}", echo.payload.len(), echo.source);
                    echoes += 1;
                }
                Waited::Echo(Ok(echo)) => warn!("Unexpected frame from {}", echo.source),
                Waited::Echo(Err(_)) => bail!("Fatal error: radio disconnected."),
                Waited::Timeout => warn!("No echo in {:?}.", ECHO_TIMEOUT),
            }
        }
        Ok(echoes)
    }
}
