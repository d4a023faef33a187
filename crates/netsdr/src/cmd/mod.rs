use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use netsdr_control::{CaptureMode, ClientConfig, DataFormat, NetSdrClient, ReceiverChannel};
use netsdr_transport::{DEFAULT_CONTROL_PORT, DEFAULT_IQ_PORT};

use crate::exit::{protocol_error, CliError, CliResult, INTERNAL, USAGE};
use crate::output::OutputFormat;

pub mod set_frequency;
pub mod stream;
pub mod version;
pub mod watch;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Stream IQ data from the receiver into a file.
    Stream(StreamArgs),
    /// Tune a receiver channel.
    SetFrequency(SetFrequencyArgs),
    /// Print unsolicited control items pushed by the receiver.
    Watch(WatchArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub async fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Stream(args) => stream::run(args, format).await,
        Command::SetFrequency(args) => set_frequency::run(args, format).await,
        Command::Watch(args) => watch::run(args, format).await,
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ReceiverArgs {
    /// Receiver host name or address.
    #[arg(long, env = "NETSDR_HOST")]
    pub host: String,
    /// Receiver control port.
    #[arg(long, env = "NETSDR_PORT", default_value_t = DEFAULT_CONTROL_PORT)]
    pub port: u16,
    /// Connection timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub connect_timeout: String,
    /// Time to wait for each ACK/NAK (e.g. 2s, 500ms).
    #[arg(long, default_value = "2s")]
    pub response_timeout: String,
}

impl ReceiverArgs {
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Args, Debug)]
pub struct StreamArgs {
    #[command(flatten)]
    pub receiver: ReceiverArgs,
    /// File that receives the raw IQ payload (created or truncated).
    #[arg(long, short = 'o', default_value = "iq.raw")]
    pub output: PathBuf,
    /// Local address for the IQ data socket.
    #[arg(long, default_value = "0.0.0.0")]
    pub iq_bind: IpAddr,
    /// Local port for the IQ data socket.
    #[arg(long, env = "NETSDR_IQ_PORT", default_value_t = DEFAULT_IQ_PORT)]
    pub iq_port: u16,
    /// Sample data format.
    #[arg(long, value_enum, default_value = "complex")]
    pub data_format: DataFormatArg,
    /// Capture mode.
    #[arg(long, value_enum, default_value = "contiguous16")]
    pub mode: CaptureModeArg,
    /// FIFO block count (only sent in fifo16 mode).
    #[arg(long, default_value_t = 0)]
    pub fifo_blocks: u8,
    /// Tune before streaming (Hz).
    #[arg(long)]
    pub frequency: Option<u64>,
    /// Channel to tune with --frequency.
    #[arg(long, value_enum, default_value = "1")]
    pub channel: ChannelArg,
    /// Stop after this long (e.g. 10s, 500ms). Default: until Ctrl-C.
    #[arg(long)]
    pub duration: Option<String>,
}

#[derive(Args, Debug)]
pub struct SetFrequencyArgs {
    #[command(flatten)]
    pub receiver: ReceiverArgs,
    /// Frequency in Hz (low 40 bits are sent).
    pub frequency: u64,
    /// Receiver channel.
    #[arg(long, value_enum, default_value = "1")]
    pub channel: ChannelArg,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub receiver: ReceiverArgs,
    /// Exit after printing N items.
    #[arg(long)]
    pub count: Option<usize>,
    /// Stop after this long (e.g. 10s, 500ms). Default: until Ctrl-C.
    #[arg(long)]
    pub duration: Option<String>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum DataFormatArg {
    Real,
    Complex,
}

impl From<DataFormatArg> for DataFormat {
    fn from(value: DataFormatArg) -> Self {
        match value {
            DataFormatArg::Real => DataFormat::Real,
            DataFormatArg::Complex => DataFormat::Complex,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum CaptureModeArg {
    Contiguous16,
    Contiguous24,
    Fifo16,
    Triggered24,
    Triggered16,
}

impl From<CaptureModeArg> for CaptureMode {
    fn from(value: CaptureModeArg) -> Self {
        match value {
            CaptureModeArg::Contiguous16 => CaptureMode::Contiguous16Bit,
            CaptureModeArg::Contiguous24 => CaptureMode::Contiguous24Bit,
            CaptureModeArg::Fifo16 => CaptureMode::Fifo16Bit,
            CaptureModeArg::Triggered24 => CaptureMode::HardwareTriggered24Bit,
            CaptureModeArg::Triggered16 => CaptureMode::HardwareTriggered16Bit,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ChannelArg {
    #[value(name = "1")]
    Channel1,
    #[value(name = "2")]
    Channel2,
    All,
}

impl ChannelArg {
    pub fn name(self) -> &'static str {
        match self {
            ChannelArg::Channel1 => "1",
            ChannelArg::Channel2 => "2",
            ChannelArg::All => "all",
        }
    }
}

impl From<ChannelArg> for ReceiverChannel {
    fn from(value: ChannelArg) -> Self {
        match value {
            ChannelArg::Channel1 => ReceiverChannel::Channel1,
            ChannelArg::Channel2 => ReceiverChannel::Channel2,
            ChannelArg::All => ReceiverChannel::All,
        }
    }
}

/// Build a client from the receiver flags and connect it.
pub async fn connect(args: &ReceiverArgs) -> CliResult<NetSdrClient> {
    let config = ClientConfig {
        connect_timeout: parse_duration(&args.connect_timeout)?,
        response_timeout: parse_duration(&args.response_timeout)?,
        ..ClientConfig::default()
    };

    let mut client = NetSdrClient::new(config);
    client
        .connect(&args.host, args.port)
        .await
        .map_err(|err| protocol_error("connect failed", err))?;
    Ok(client)
}

/// Resolve when Ctrl-C arrives or `limit` elapses, whichever is first.
pub async fn wait_for_interrupt(limit: Option<Duration>) -> CliResult<()> {
    let deadline = async move {
        match limit {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        signal = tokio::signal::ctrl_c() => signal.map_err(|err| {
            CliError::new(INTERNAL, format!("signal handler setup failed: {err}"))
        }),
        () = deadline => Ok(()),
    }
}

pub fn parse_optional_duration(input: Option<&str>) -> CliResult<Option<Duration>> {
    input.map(parse_duration).transpose()
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
