use serde::{Deserialize, Serialize};

/// A single reply from the discussion thread, as returned by the search API.
#[derive(Debug, Clone, Deserialize)]
pub struct Reply {
    pub id: String,
    pub text: String,
}

/// An address-like or name-like substring pulled out of a reply, before
/// validation. One reply may yield zero, one, or two candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// The matched text, truncated to 42 chars for address-shaped matches.
    pub raw: String,
    /// Full text of the reply the match came from, kept for log traceability.
    pub source_text: String,
}

/// A validated airdrop recipient.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedAddress {
    /// EIP-55 checksummed address, never a raw ENS name.
    pub address: String,
    /// The ENS name this address was resolved from, if any.
    pub name: Option<String>,
    /// Full text of the originating reply.
    pub source_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Error,
}

/// One entry in the run's append-only event log.
#[derive(Debug, Clone, Serialize)]
pub struct LogEvent {
    pub level: LogLevel,
    pub message: String,
}
