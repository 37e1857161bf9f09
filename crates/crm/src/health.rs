//! Remote endpoint health checks.

use crate::config::EndpointConfig;
use crate::endpoint::RemoteEndpoint;
use tracing::{debug, error};

/// Check that the endpoint answers a one-row user listing.
pub async fn check_connection(endpoint: &dyn RemoteEndpoint, config: &EndpointConfig) -> bool {
    match endpoint.fetch(&config.lookup_page(1, 0)).await {
        Ok(_) => {
            debug!("CRM endpoint healthy");
            true
        }
        Err(e) => {
            error!("CRM endpoint health check failed: {}", e);
            false
        }
    }
}
