use std::time::Duration;

use netsdr_transport::DEFAULT_CONNECT_TIMEOUT;

/// Configuration for a [`crate::NetSdrClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Upper bound for establishing the TCP connection.
    pub connect_timeout: Duration,
    /// How long a control item waits for its ACK/NAK.
    ///
    /// Responses carry no request id. Ones that arrive after their request
    /// timed out are discarded before the next request is written, but a
    /// response arriving later than that is taken as the reply to whatever
    /// request is then waiting. When both requests use the same control
    /// code, a late ACK can mask the second request's NAK. Keep this well
    /// above the receiver's worst response time.
    pub response_timeout: Duration,
    /// Unsolicited items buffered per subscriber before it starts lagging.
    pub event_capacity: usize,
    /// Responses buffered between the reader task and the waiting request.
    pub response_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            response_timeout: Duration::from_secs(2),
            event_capacity: 64,
            response_capacity: 4,
        }
    }
}
