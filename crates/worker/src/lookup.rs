//! Phase 1: owner identifier → display name.

use crate::context::FetchContext;
use crm_client::models::{decode, UsersPage};
use engine_core::{LookupTable, Phase, ProgressEvent, ProgressSink, Result};
use telemetry::metrics;
use tracing::{debug, info};

/// Pages through the user listing.
pub struct LookupFetcher {
    context: FetchContext,
    page_size: usize,
}

impl LookupFetcher {
    pub fn new(context: FetchContext, page_size: usize) -> Self {
        Self {
            context,
            page_size: page_size.max(1),
        }
    }

    /// Fetch every page until a short or empty one.
    pub async fn fetch(&self, sink: &dyn ProgressSink) -> Result<LookupTable> {
        sink.emit(ProgressEvent::new(Phase::Lookup, "Fetching owners", 0, 1, 0.0));

        let mut lookup = LookupTable::new();
        let mut offset = 0;

        loop {
            let path = self.context.paths.lookup_page(self.page_size, offset);
            let body = self.context.get(&path).await?;
            let page: UsersPage = decode(body, "users")?;
            let rows = page.users.len();

            for user in page.users {
                let name = user.display_name();
                lookup.insert(user.id, name);
            }
            metrics().lookup_entries_fetched.inc_by(rows as u64);
            debug!(offset, rows, "Fetched user page");

            if rows < self.page_size {
                break;
            }
            offset += self.page_size;
        }

        info!(owners = lookup.len(), "Owner lookup complete");
        Ok(lookup)
    }
}
