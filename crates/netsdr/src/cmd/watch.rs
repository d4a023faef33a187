use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::cmd::{connect, parse_optional_duration, WatchArgs};
use crate::exit::{CliError, CliResult, INTERNAL, SUCCESS, TRANSPORT_ERROR};
use crate::output::{print_event, OutputFormat};

pub async fn run(args: WatchArgs, format: OutputFormat) -> CliResult<i32> {
    let limit = parse_optional_duration(args.duration.as_deref())?;
    let mut client = connect(&args.receiver).await?;
    let mut events = client.subscribe();
    let mut status = client
        .listener_updates()
        .ok_or_else(|| CliError::new(INTERNAL, "control listener not running"))?;

    let deadline = async move {
        match limit {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    let mut printed = 0usize;
    let outcome = loop {
        tokio::select! {
            received = events.recv() => match received {
                Ok(item) => {
                    print_event(&item, format);
                    printed = printed.saturating_add(1);
                    if args.count.is_some_and(|count| printed >= count) {
                        break Ok(SUCCESS);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "output too slow, unsolicited items dropped");
                }
                Err(RecvError::Closed) => break Ok(SUCCESS),
            },
            changed = status.changed() => {
                let current = status.borrow_and_update().clone();
                if changed.is_err() || !current.is_running() {
                    break Err(CliError::new(
                        TRANSPORT_ERROR,
                        format!("control connection {}", current.state.as_str()),
                    ));
                }
            },
            signal = tokio::signal::ctrl_c() => {
                break signal.map(|()| SUCCESS).map_err(|err| {
                    CliError::new(INTERNAL, format!("signal handler setup failed: {err}"))
                });
            },
            () = &mut deadline => break Ok(SUCCESS),
        }
    };

    client.disconnect().await;
    info!(printed, "watch finished");
    outcome
}
