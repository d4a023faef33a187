use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use netsdr_control::UnsolicitedItem;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Result of a `stream` session.
#[derive(Debug, Serialize)]
pub struct StreamReport {
    pub receiver: String,
    pub output: String,
    pub iq_addr: String,
    pub frequency_hz: Option<u64>,
    pub elapsed_ms: u128,
    pub datagrams: u64,
    pub bytes: u64,
}

/// Result of a single acknowledged control item.
#[derive(Debug, Serialize)]
pub struct AckReport {
    pub receiver: String,
    pub control_code: String,
    pub channel: String,
    pub frequency_hz: u64,
}

#[derive(Serialize)]
struct EventOutput<'a> {
    control_code: String,
    body_len: usize,
    body_hex: String,
    timestamp: &'a str,
}

pub fn print_stream_report(report: &StreamReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["RECEIVER", "IQ ADDR", "OUTPUT", "DATAGRAMS", "BYTES", "ELAPSED"])
                .add_row(vec![
                    report.receiver.clone(),
                    report.iq_addr.clone(),
                    report.output.clone(),
                    report.datagrams.to_string(),
                    report.bytes.to_string(),
                    format!("{}ms", report.elapsed_ms),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "receiver={} iq_addr={} output={} datagrams={} bytes={} elapsed={}ms",
                report.receiver,
                report.iq_addr,
                report.output,
                report.datagrams,
                report.bytes,
                report.elapsed_ms
            );
        }
    }
}

pub fn print_ack_report(report: &AckReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["RECEIVER", "CONTROL ITEM", "CHANNEL", "FREQUENCY (HZ)"])
                .add_row(vec![
                    report.receiver.clone(),
                    report.control_code.clone(),
                    report.channel.clone(),
                    report.frequency_hz.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "receiver={} control_item={} channel={} frequency_hz={} ack",
                report.receiver, report.control_code, report.channel, report.frequency_hz
            );
        }
    }
}

pub fn print_event(item: &UnsolicitedItem, format: OutputFormat) {
    let control_code = format!("0x{:04X}", item.control_code);
    let body_hex = hex(item.body.as_ref());

    match format {
        OutputFormat::Json => {
            let timestamp = now_unix_seconds();
            print_json(&EventOutput {
                control_code,
                body_len: item.body.len(),
                body_hex,
                timestamp: &timestamp,
            });
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["CONTROL ITEM", "SIZE", "BODY"])
                .add_row(vec![control_code, item.body.len().to_string(), body_hex]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "control_item={control_code} size={} body={body_hex}",
                item.body.len()
            );
        }
    }
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
