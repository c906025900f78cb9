use reqwest::Client;
use std::net::IpAddr;
use std::time::Duration;

use super::error::SpeedTestError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Build an async reqwest client, optionally bound to a local address.
///
/// The request timeout is only a backstop; each test phase carries its own
/// tighter limit.
pub fn build_client(local_addr: Option<IpAddr>) -> Result<Client, SpeedTestError> {
    let mut builder = Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")));

    if let Some(addr) = local_addr {
        builder = builder.local_address(addr);
    }

    Ok(builder.build()?)
}
