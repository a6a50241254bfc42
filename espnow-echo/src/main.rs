use anyhow::{anyhow, Result};
use espnow_comm::device::sim::AirMedium;
use espnow_comm::MacAddress;
use std::sync::Arc;
use std::thread;

mod echo_client;
mod echo_server;

/// Station address of the motor controller node (echo server).
const MOTOR_NODE: MacAddress = MacAddress::new([0x24, 0x6F, 0x28, 0x4A, 0x10, 0x01]);
/// Station address of the remote controller node (echo client).
const REMOTE_NODE: MacAddress = MacAddress::new([0x24, 0x6F, 0x28, 0x4A, 0x10, 0x02]);

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let medium = AirMedium::new();
    let motor = medium.attach(MOTOR_NODE);
    let remote = medium.attach(REMOTE_NODE);
    // Radios are brought up by their owner, before any communication runs on them.
    motor.bring_up();
    remote.bring_up();

    let (server, server_address) = echo_server::EchoServer::new(motor)?;
    let server = Arc::new(server);
    log::info!("Motor node is ready ({}).", server_address);
    let handle = {
        let server = server.clone();
        thread::spawn(move || smol::block_on(server.run()))
    };

    let mut client = echo_client::EchoClient::new(
        remote,
        vec!["HELO1", "HELO2", "forward 50", "stop"]
            .into_iter()
            .map(|s| s.as_bytes().to_owned())
            .collect(),
    )?;
    let echoes = smol::block_on(client.run(server_address))?;
    log::info!("Remote node got {} echo(es).", echoes);
    client.comm.deinit()?;

    // Closes the server event channels, which ends its loop.
    server.comm.deinit()?;
    let echoed = handle
        .join()
        .map_err(|_| anyhow!("Echo server panicked!"))??;
    log::info!("Motor node echoed {} message(s). Stopping!", echoed);

    Ok(())
}
