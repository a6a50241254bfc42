#![allow(dead_code)]

use espnow_comm::device::sim::{AirMedium, SimRadio};
use espnow_comm::{
    event_channel, CommConfig, EspNowComm, MacAddress, ReceiveEvent, SendEvent,
    DEFAULT_EVENT_CAPACITY,
};
use smol::channel::Receiver;

// Init logger for tests
#[ctor::ctor]
pub fn init_log() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

/// Initialized node of a test medium, with its event queues.
pub struct TestNode {
    pub radio: SimRadio,
    pub comm: EspNowComm<SimRadio>,
    pub received: Receiver<ReceiveEvent>,
    pub reports: Receiver<SendEvent>,
}

impl TestNode {
    pub fn address(&self) -> MacAddress {
        self.radio.address()
    }

    /// Every event received so far.
    pub fn drain_received(&self) -> Vec<ReceiveEvent> {
        std::iter::from_fn(|| self.received.try_recv().ok()).collect()
    }

    /// Every send report so far.
    pub fn drain_reports(&self) -> Vec<SendEvent> {
        std::iter::from_fn(|| self.reports.try_recv().ok()).collect()
    }
}

pub fn mac(last: u8) -> MacAddress {
    MacAddress::new([0x24, 0x6F, 0x28, 0x00, 0x00, last])
}

/// Attaches a node to `medium`, brings its radio up and initializes the communication.
pub fn ready_node(medium: &AirMedium, last: u8) -> TestNode {
    let radio = medium.attach(mac(last));
    radio.bring_up();
    let comm = EspNowComm::new(radio.clone());
    let (received, reports, config) = handlers();
    comm.init(config).expect("init failed");
    TestNode {
        radio,
        comm,
        received,
        reports,
    }
}

pub fn handlers() -> (Receiver<ReceiveEvent>, Receiver<SendEvent>, CommConfig) {
    let (rx_sender, received) = event_channel(DEFAULT_EVENT_CAPACITY);
    let (tx_sender, reports) = event_channel(DEFAULT_EVENT_CAPACITY);
    let config = CommConfig::new()
        .with_receive_handler(rx_sender)
        .with_send_handler(tx_sender);
    (received, reports, config)
}
