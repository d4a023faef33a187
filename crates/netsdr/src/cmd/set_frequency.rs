use netsdr_control::RECEIVER_FREQUENCY;

use crate::cmd::{connect, SetFrequencyArgs};
use crate::exit::{protocol_error, CliResult, SUCCESS};
use crate::output::{print_ack_report, AckReport, OutputFormat};

pub async fn run(args: SetFrequencyArgs, format: OutputFormat) -> CliResult<i32> {
    let mut client = connect(&args.receiver).await?;

    let result = client
        .set_frequency(args.channel.into(), args.frequency)
        .await;
    client.disconnect().await;
    result.map_err(|err| protocol_error("set frequency failed", err))?;

    print_ack_report(
        &AckReport {
            receiver: args.receiver.endpoint(),
            control_code: format!("0x{RECEIVER_FREQUENCY:04X}"),
            channel: args.channel.name().to_string(),
            frequency_hz: args.frequency,
        },
        format,
    );
    Ok(SUCCESS)
}
