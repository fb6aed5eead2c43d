//! One request/result exchange.

use crate::error::AppResult;
use rrg_ws::{result_or_empty, HandshakeClient};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Send `payload` and return the result JSON.
///
/// With `legacy` set, any handshake failure is logged and turned into an
/// empty result instead of an error.
pub async fn send_request(
    client: &HandshakeClient,
    payload: String,
    shutdown: CancellationToken,
    legacy: bool,
) -> AppResult<String> {
    let outcome = client.connect_with_shutdown(payload, shutdown).await;

    if legacy {
        if let Err(ref e) = outcome {
            warn!(error = %e, "No result received");
        }
        return Ok(result_or_empty(outcome));
    }

    Ok(outcome?)
}
