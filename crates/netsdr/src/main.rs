mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "netsdr", version, about = "NetSDR receiver control and IQ streaming")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format).await;

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::{CaptureModeArg, ChannelArg, DataFormatArg};

    #[test]
    fn parses_stream_subcommand() {
        let cli = Cli::try_parse_from([
            "netsdr",
            "stream",
            "--host",
            "10.0.0.5",
            "--output",
            "/tmp/iq.raw",
            "--data-format",
            "real",
            "--mode",
            "fifo16",
            "--fifo-blocks",
            "8",
            "--frequency",
            "14010000",
            "--channel",
            "2",
            "--duration",
            "10s",
        ])
        .expect("stream args should parse");

        let Command::Stream(args) = cli.command else {
            panic!("expected stream command");
        };
        assert_eq!(args.receiver.host, "10.0.0.5");
        assert_eq!(args.receiver.port, 50000);
        assert_eq!(args.iq_port, 60000);
        assert_eq!(args.data_format, DataFormatArg::Real);
        assert_eq!(args.mode, CaptureModeArg::Fifo16);
        assert_eq!(args.fifo_blocks, 8);
        assert_eq!(args.frequency, Some(14_010_000));
        assert_eq!(args.channel, ChannelArg::Channel2);
        assert_eq!(args.duration.as_deref(), Some("10s"));
    }

    #[test]
    fn parses_set_frequency_with_global_format() {
        let cli = Cli::try_parse_from([
            "netsdr",
            "set-frequency",
            "--host",
            "sdr.local",
            "--port",
            "50001",
            "7074000",
            "--channel",
            "all",
            "--format",
            "json",
        ])
        .expect("set-frequency args should parse");

        assert!(matches!(cli.format, Some(OutputFormat::Json)));
        let Command::SetFrequency(args) = cli.command else {
            panic!("expected set-frequency command");
        };
        assert_eq!(args.frequency, 7_074_000);
        assert_eq!(args.receiver.port, 50001);
        assert_eq!(args.channel, ChannelArg::All);
    }

    #[test]
    fn rejects_unknown_capture_mode() {
        let err = Cli::try_parse_from([
            "netsdr", "stream", "--host", "10.0.0.5", "--mode", "contiguous32",
        ])
        .expect_err("unknown mode should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn parses_watch_subcommand() {
        let cli = Cli::try_parse_from(["netsdr", "watch", "--host", "10.0.0.5", "--count", "3"])
            .expect("watch args should parse");
        assert!(matches!(cli.command, Command::Watch(_)));
    }
}
