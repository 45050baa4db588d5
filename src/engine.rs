use anyhow::Result;

use crate::api::{self, ReplySource};
use crate::extract;
use crate::logger::EventLogger;
use crate::resolver::{self, ResolverStrategy};
use crate::types::ResolvedAddress;

/// Run the full pipeline: collect every reply in the thread, extract
/// address-like and name-like candidates, then resolve them into validated
/// recipients.
///
/// Everything runs sequentially on one logical thread. The network calls are
/// the suspend points; the upstream APIs are externally rate limited, so no
/// stage fans out. Transport failures abort with no partial result;
/// per-candidate failures only show up in the event log.
pub async fn run_pipeline(
    source: &impl ReplySource,
    strategy: &ResolverStrategy,
    logger: &mut EventLogger,
) -> Result<Vec<ResolvedAddress>> {
    let replies = api::collect_replies(source, logger).await?;
    logger.info(format!("Collected {} total tweets", replies.len()));

    let candidates = extract::extract_candidates(&replies);
    logger.info(format!("Collected {} addresses from tweets", candidates.len()));

    let resolved = resolver::resolve_candidates(strategy, candidates, logger).await?;
    logger.info("Converted ENS names to addresses");

    Ok(resolved)
}
