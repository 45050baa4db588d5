use std::sync::LazyLock;

use regex::Regex;

use crate::types::{Candidate, Reply};

/// Address-shaped token: 0x followed by a run of ASCII word characters.
/// Matches are truncated to 42 chars afterwards to shed trailing noise.
static ADDRESS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(0x[a-zA-Z0-9])(?-u:\w)+").expect("valid address regex"));

/// Dotted name ending in the fixed `.eth` label, matched case-insensitively.
/// Word characters are ASCII-only, like the address pattern.
static ENS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[a-zA-Z0-9](?-u:\w)+\.eth").expect("valid ens regex"));

/// Canonical length of a hex chain address, `0x` prefix included.
const ADDRESS_LEN: usize = 42;

/// Scan each reply for address-like and name-like substrings.
///
/// The two patterns are independent passes: a reply matching both yields two
/// candidates, each carrying the same source text. Reply order is preserved.
pub fn extract_candidates(replies: &[Reply]) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    for reply in replies {
        let cleaned: String = reply
            .text
            .chars()
            .filter(|c| *c != '\r' && *c != '\n')
            .collect();

        if let Some(m) = ADDRESS_RE.find(&cleaned) {
            let raw: String = m.as_str().chars().take(ADDRESS_LEN).collect();
            candidates.push(Candidate {
                raw,
                source_text: reply.text.clone(),
            });
        }

        if let Some(m) = ENS_RE.find(&cleaned) {
            candidates.push(Candidate {
                raw: m.as_str().to_string(),
                source_text: reply.text.clone(),
            });
        }
    }

    candidates
}
