use std::net::SocketAddr;
use std::time::{Duration, Instant};

use netsdr_control::NetSdrClient;
use netsdr_iq::IqReceiverConfig;
use tracing::{info, warn};

use crate::cmd::{connect, parse_optional_duration, wait_for_interrupt, StreamArgs};
use crate::exit::{protocol_error, CliResult, SUCCESS};
use crate::output::{print_stream_report, OutputFormat, StreamReport};

pub async fn run(args: StreamArgs, format: OutputFormat) -> CliResult<i32> {
    let limit = parse_optional_duration(args.duration.as_deref())?;
    let mut client = connect(&args.receiver).await?;

    if let Some(frequency_hz) = args.frequency {
        if let Err(err) = client.set_frequency(args.channel.into(), frequency_hz).await {
            client.disconnect().await;
            return Err(protocol_error("set frequency failed", err));
        }
    }

    let iq_config = IqReceiverConfig {
        bind_addr: SocketAddr::new(args.iq_bind, args.iq_port),
        ..IqReceiverConfig::default()
    };
    let iq_addr = match client.start_iq_receiver(&iq_config, &args.output).await {
        Ok(addr) => addr,
        Err(err) => {
            client.disconnect().await;
            return Err(protocol_error("iq receiver failed", err));
        }
    };

    let started = Instant::now();
    if let Err(err) = client
        .start_iq_stream(args.data_format.into(), args.mode.into(), args.fifo_blocks)
        .await
    {
        client.disconnect().await;
        return Err(protocol_error("start streaming failed", err));
    }
    info!(%iq_addr, output = %args.output.display(), "streaming");

    let interrupted = tokio::select! {
        result = wait_for_interrupt(limit) => result,
        () = session_ended(&client) => Ok(()),
    };

    let stopped = client.stop_iq_stream().await;
    if let Err(err) = &stopped {
        warn!(error = %err, "receiver did not acknowledge stop");
    }
    let summary = client.stop_iq_receiver().await;
    let elapsed = started.elapsed();
    client.disconnect().await;

    interrupted?;
    stopped.map_err(|err| protocol_error("stop streaming failed", err))?;
    let summary = summary
        .map_err(|err| protocol_error("iq receiver failed", err))?
        .unwrap_or_default();

    let report = StreamReport {
        receiver: args.receiver.endpoint(),
        output: args.output.display().to_string(),
        iq_addr: iq_addr.to_string(),
        frequency_hz: args.frequency,
        elapsed_ms: elapsed.as_millis(),
        datagrams: summary.datagrams,
        bytes: summary.bytes,
    };
    print_stream_report(&report, format);

    Ok(SUCCESS)
}

const HEALTH_CHECK_INTERVAL: Duration = Duration::from_millis(250);

/// Resolves once the IQ receiver or the control connection is gone.
async fn session_ended(client: &NetSdrClient) {
    loop {
        if !client.iq_receiver_running() {
            warn!("iq receiver stopped before the stream ended");
            return;
        }
        if !client.is_connected() {
            warn!("control connection lost while streaming");
            return;
        }
        tokio::time::sleep(HEALTH_CHECK_INTERVAL).await;
    }
}
