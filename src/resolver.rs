use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::logger::EventLogger;
use crate::types::{Candidate, ResolvedAddress};
use crate::{ENS_BATCH_SIZE, ENS_REGISTRY, eth};

/// GraphQL document sent to the ENS subgraph; `names` is the only variable.
const RESOLVES_QUERY: &str = r#"
query resolves($names: [String!]){
  domains(where:{
    name_in: $names
  }) {
    name
    resolvedAddress {
      id
    }
  }
}
"#;

/// `resolver(bytes32)` function selector on the ENS registry.
const RESOLVER_SELECTOR: &str = "0178b8bf";

/// `addr(bytes32)` function selector on a resolver contract.
const ADDR_SELECTOR: &str = "3b3b57de";

/// How ENS names get turned into addresses, chosen once at construction from
/// the configured endpoint. `Disabled` still runs: every name candidate is
/// rejected with an error event rather than silently skipped.
pub enum ResolverStrategy {
    /// Batch lookups against a graph-style ENS indexer.
    BatchIndexer(GraphClient),
    /// Per-name resolution through an Ethereum JSON-RPC endpoint.
    DirectRpc(RpcClient),
    /// No resolution endpoint configured.
    Disabled,
}

/// Classify every candidate and resolve the name-shaped ones.
///
/// Syntactically valid addresses are accepted directly (checksum-normalized);
/// `.eth` names go through the configured strategy; everything else is
/// rejected. Every rejection produces exactly one log event. Only transport
/// failures abort the run.
pub async fn resolve_candidates(
    strategy: &ResolverStrategy,
    candidates: Vec<Candidate>,
    logger: &mut EventLogger,
) -> Result<Vec<ResolvedAddress>> {
    let mut accepted = Vec::new();
    let mut names = Vec::new();

    for candidate in candidates {
        let folded = candidate.raw.to_lowercase();
        if eth::is_address(&folded) {
            logger.info(format!("address-like {} valid", candidate.raw));
            accepted.push(ResolvedAddress {
                address: eth::to_checksum(&candidate.raw)?,
                name: None,
                source_text: candidate.source_text,
            });
        } else if folded.contains(".eth") {
            names.push(candidate);
        } else {
            logger.error(format!("address-like {} invalid", candidate.raw));
        }
    }

    match strategy {
        ResolverStrategy::BatchIndexer(client) => {
            accepted.extend(resolve_names_batched(client, &names, logger).await?);
        }
        ResolverStrategy::DirectRpc(client) => {
            accepted.extend(resolve_each(client, &names, logger).await?);
        }
        ResolverStrategy::Disabled => {
            for candidate in &names {
                logger.error(format!(
                    "No resolution endpoint configured, dropping {} -- {}",
                    candidate.raw,
                    flatten(&candidate.source_text)
                ));
            }
        }
    }

    Ok(accepted)
}

/// Group name candidates into fixed-size batches, issue one indexer query per
/// batch, and reconcile each batch against the returned mappings.
async fn resolve_names_batched(
    resolver: &impl BatchResolver,
    names: &[Candidate],
    logger: &mut EventLogger,
) -> Result<Vec<ResolvedAddress>> {
    let mut accepted = Vec::new();
    for batch in names.chunks(ENS_BATCH_SIZE) {
        let batch_names: Vec<String> = batch.iter().map(|c| c.raw.clone()).collect();
        let mappings = resolver.resolve_batch(&batch_names).await?;
        accepted.extend(match_batch(batch, &mappings, logger)?);
    }
    Ok(accepted)
}

/// Match one batch of candidates against the mappings the indexer returned.
/// Matching is by exact name equality; unmatched candidates are rejected.
fn match_batch(
    batch: &[Candidate],
    mappings: &[EnsMapping],
    logger: &mut EventLogger,
) -> Result<Vec<ResolvedAddress>> {
    let mut accepted = Vec::new();
    for candidate in batch {
        match mappings.iter().find(|m| m.name == candidate.raw) {
            Some(found) => {
                logger.info(format!("Found address {} from {}", found.name, candidate.raw));
                accepted.push(ResolvedAddress {
                    address: eth::to_checksum(&found.address)?,
                    name: Some(found.name.clone()),
                    source_text: candidate.source_text.clone(),
                });
            }
            None => {
                logger.error(format!(
                    "Could not resolve {} -- {}",
                    candidate.raw,
                    flatten(&candidate.source_text)
                ));
            }
        }
    }
    Ok(accepted)
}

/// Resolve candidates one at a time. A miss is an info event here, not an
/// error: direct RPC deployments treat unresolvable names as expected noise.
async fn resolve_each(
    resolver: &impl NameResolver,
    names: &[Candidate],
    logger: &mut EventLogger,
) -> Result<Vec<ResolvedAddress>> {
    let mut accepted = Vec::new();
    for candidate in names {
        match resolve_with_prefix_retry(resolver, &candidate.raw).await? {
            Some((name, address)) => {
                logger.info(format!("Resolved {name} to {address}"));
                accepted.push(ResolvedAddress {
                    address: eth::to_checksum(&address)?,
                    name: Some(name),
                    source_text: candidate.source_text.clone(),
                });
            }
            None => {
                logger.info(format!(
                    "Could not resolve {} -- {}",
                    candidate.raw,
                    flatten(&candidate.source_text)
                ));
            }
        }
    }
    Ok(accepted)
}

/// Try the name as-is; on a miss, retry once with a leading `0x` stripped.
/// Handles replies where an address prefix got glued onto a name.
async fn resolve_with_prefix_retry(
    resolver: &impl NameResolver,
    name: &str,
) -> Result<Option<(String, String)>> {
    if let Some(address) = resolver.resolve(name).await? {
        return Ok(Some((name.to_string(), address)));
    }
    if let Some(stripped) = name.strip_prefix("0x")
        && let Some(address) = resolver.resolve(stripped).await?
    {
        return Ok(Some((stripped.to_string(), address)));
    }
    Ok(None)
}

fn flatten(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

/// One name-to-address mapping returned by the indexer.
#[derive(Debug, Clone)]
pub struct EnsMapping {
    pub name: String,
    pub address: String,
}

/// Batch name resolution: one call per group of names. Names absent from the
/// returned mappings are unresolved.
#[allow(async_fn_in_trait)]
pub trait BatchResolver {
    async fn resolve_batch(&self, names: &[String]) -> Result<Vec<EnsMapping>>;
}

/// Client for the batch name-resolution endpoint (ENS subgraph).
pub struct GraphClient {
    http: reqwest::Client,
    endpoint: String,
}

#[derive(Deserialize)]
struct GraphResponse {
    data: GraphData,
}

impl GraphResponse {
    /// Keep only domains carrying both a name and a resolved address; the
    /// subgraph returns nulls for domains it knows but cannot resolve.
    fn into_mappings(self) -> Vec<EnsMapping> {
        self.data
            .domains
            .into_iter()
            .filter_map(|domain| {
                let name = domain.name?;
                let resolved = domain.resolved_address?;
                Some(EnsMapping {
                    name,
                    address: resolved.id,
                })
            })
            .collect()
    }
}

#[derive(Deserialize)]
struct GraphData {
    domains: Vec<GraphDomain>,
}

#[derive(Deserialize)]
struct GraphDomain {
    name: Option<String>,
    #[serde(rename = "resolvedAddress")]
    resolved_address: Option<GraphResolvedAddress>,
}

#[derive(Deserialize)]
struct GraphResolvedAddress {
    id: String,
}

impl GraphClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

impl BatchResolver for GraphClient {
    /// One POST per batch. Domains the indexer doesn't know are simply absent
    /// from the response; a transport or parse failure is fatal.
    async fn resolve_batch(&self, names: &[String]) -> Result<Vec<EnsMapping>> {
        debug!("Resolving batch of {} names via {}", names.len(), self.endpoint);
        let body = json!({
            "query": RESOLVES_QUERY,
            "variables": { "names": names },
            "operationName": "resolves",
        });

        let resp = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .context("batch resolution request failed")?;
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("batch resolution request returned {status}");
        }

        let parsed: GraphResponse = resp
            .json()
            .await
            .context("malformed batch resolution response")?;
        Ok(parsed.into_mappings())
    }
}

/// Single-name resolution. `Ok(None)` means no match; `Err` means the
/// endpoint itself failed and the run should abort.
#[allow(async_fn_in_trait)]
pub trait NameResolver {
    async fn resolve(&self, name: &str) -> Result<Option<String>>;
}

/// Resolves names through `eth_call` against the ENS registry: look up the
/// name's resolver contract, then ask it for the address record.
pub struct RpcClient {
    http: reqwest::Client,
    endpoint: String,
}

impl RpcClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Issue one `eth_call`. A JSON-RPC level error is treated as no-match
    /// since unknown names make resolver contracts revert.
    async fn eth_call(&self, to: &str, data: String) -> Result<Option<Vec<u8>>> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_call",
            "params": [{ "to": to, "data": data }, "latest"],
        });

        let resp = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .context("rpc request failed")?;
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("rpc request returned {status}");
        }

        let value: serde_json::Value =
            resp.json().await.context("malformed rpc response")?;
        if value.get("error").is_some() {
            debug!("eth_call reverted: {value}");
            return Ok(None);
        }

        let result = value
            .get("result")
            .and_then(|r| r.as_str())
            .ok_or_else(|| anyhow::anyhow!("rpc response missing result"))?;
        let bytes = hex::decode(result.trim_start_matches("0x"))
            .context("rpc result is not hex")?;
        Ok(if bytes.is_empty() { None } else { Some(bytes) })
    }
}

/// Extract the address from a 32-byte ABI word; zero means unset.
fn address_from_word(word: &[u8]) -> Option<String> {
    if word.len() != 32 {
        return None;
    }
    let addr = &word[12..];
    if addr.iter().all(|b| *b == 0) {
        return None;
    }
    Some(format!("0x{}", hex::encode(addr)))
}

impl NameResolver for RpcClient {
    async fn resolve(&self, name: &str) -> Result<Option<String>> {
        let node = hex::encode(eth::namehash(name));

        let resolver = match self
            .eth_call(ENS_REGISTRY, format!("0x{RESOLVER_SELECTOR}{node}"))
            .await?
            .as_deref()
            .and_then(address_from_word)
        {
            Some(resolver) => resolver,
            None => return Ok(None),
        };

        let address = self
            .eth_call(&resolver, format!("0x{ADDR_SELECTOR}{node}"))
            .await?
            .as_deref()
            .and_then(address_from_word);
        Ok(address)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn candidate(raw: &str) -> Candidate {
        Candidate {
            raw: raw.to_string(),
            source_text: format!("tweet containing {raw}"),
        }
    }

    fn mapping(name: &str, address: &str) -> EnsMapping {
        EnsMapping {
            name: name.to_string(),
            address: address.to_string(),
        }
    }

    const ALICE_ADDR: &str = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed";

    /// Resolves only the names it was seeded with.
    struct TableResolver(HashMap<String, String>);

    /// Batch resolver that maps every requested name to `ALICE_ADDR` and
    /// records the size of each batch it was handed.
    struct CannedBatches {
        batch_sizes: std::cell::RefCell<Vec<usize>>,
    }

    impl BatchResolver for CannedBatches {
        async fn resolve_batch(&self, names: &[String]) -> Result<Vec<EnsMapping>> {
            self.batch_sizes.borrow_mut().push(names.len());
            Ok(names
                .iter()
                .map(|name| mapping(name, ALICE_ADDR))
                .collect())
        }
    }

    impl NameResolver for TableResolver {
        async fn resolve(&self, name: &str) -> Result<Option<String>> {
            Ok(self.0.get(name).cloned())
        }
    }

    #[tokio::test]
    async fn direct_address_accepted_and_checksummed() {
        let mut logger = EventLogger::new();
        let accepted = resolve_candidates(
            &ResolverStrategy::Disabled,
            vec![candidate("0x5AAEB6053F3E94C9B9A09F33669435E7EF1BEAED")],
            &mut logger,
        )
        .await
        .unwrap();

        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].address, "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
        assert!(accepted[0].name.is_none());
    }

    #[tokio::test]
    async fn garbage_candidate_rejected_with_one_error() {
        let mut logger = EventLogger::new();
        let accepted = resolve_candidates(
            &ResolverStrategy::Disabled,
            vec![candidate("0xnothexatall")],
            &mut logger,
        )
        .await
        .unwrap();

        assert!(accepted.is_empty());
        let errors: Vec<_> = logger
            .events()
            .iter()
            .filter(|e| e.level == crate::types::LogLevel::Error)
            .collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("0xnothexatall"));
    }

    #[tokio::test]
    async fn disabled_strategy_rejects_every_name() {
        let mut logger = EventLogger::new();
        let accepted = resolve_candidates(
            &ResolverStrategy::Disabled,
            vec![candidate("alice.eth"), candidate("bob.eth")],
            &mut logger,
        )
        .await
        .unwrap();

        assert!(accepted.is_empty());
        let errors: Vec<_> = logger
            .events()
            .iter()
            .filter(|e| e.level == crate::types::LogLevel::Error)
            .collect();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn batch_match_accepts_hits_and_logs_misses() {
        let mut logger = EventLogger::new();
        let batch = [candidate("alice.eth"), candidate("bob.eth")];
        let mappings = [mapping("alice.eth", ALICE_ADDR)];

        let accepted = match_batch(&batch, &mappings, &mut logger).unwrap();

        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].name.as_deref(), Some("alice.eth"));
        assert_eq!(
            accepted[0].address,
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
        );

        let errors: Vec<_> = logger
            .events()
            .iter()
            .filter(|e| e.level == crate::types::LogLevel::Error)
            .collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("bob.eth"));
    }

    #[tokio::test]
    async fn batched_resolution_groups_by_25() {
        let names: Vec<Candidate> = (0..26)
            .map(|i| candidate(&format!("name{i}.eth")))
            .collect();
        let resolver = CannedBatches {
            batch_sizes: std::cell::RefCell::new(Vec::new()),
        };
        let mut logger = EventLogger::new();

        let accepted = resolve_names_batched(&resolver, &names, &mut logger)
            .await
            .unwrap();

        // 26 names make one full batch plus a remainder of one.
        assert_eq!(*resolver.batch_sizes.borrow(), vec![25, 1]);
        assert_eq!(accepted.len(), 26);
        assert_eq!(accepted[0].name.as_deref(), Some("name0.eth"));
        assert_eq!(accepted[25].name.as_deref(), Some("name25.eth"));
        assert!(accepted.iter().all(|r| eth::is_address(&r.address)));
    }

    #[test]
    fn graph_response_drops_null_domains() {
        let parsed: GraphResponse = serde_json::from_str(
            r#"{
                "data": {
                    "domains": [
                        {
                            "name": "alice.eth",
                            "resolvedAddress": { "id": "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed" }
                        },
                        { "name": "ghost.eth", "resolvedAddress": null },
                        { "name": null, "resolvedAddress": { "id": "0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359" } }
                    ]
                }
            }"#,
        )
        .unwrap();

        let mappings = parsed.into_mappings();
        assert_eq!(mappings.len(), 1);
        assert_eq!(mappings[0].name, "alice.eth");
        assert_eq!(mappings[0].address, ALICE_ADDR);
    }

    #[test]
    fn batch_match_is_exact_equality() {
        let mut logger = EventLogger::new();
        let batch = [candidate("Alice.eth")];
        let mappings = [mapping("alice.eth", ALICE_ADDR)];

        let accepted = match_batch(&batch, &mappings, &mut logger).unwrap();
        assert!(accepted.is_empty());
    }

    #[tokio::test]
    async fn prefix_retry_strips_leading_0x() {
        let resolver = TableResolver(HashMap::from([(
            "notaname.eth".to_string(),
            ALICE_ADDR.to_string(),
        )]));

        let hit = resolve_with_prefix_retry(&resolver, "0xnotaname.eth")
            .await
            .unwrap();
        assert_eq!(
            hit,
            Some(("notaname.eth".to_string(), ALICE_ADDR.to_string()))
        );
    }

    #[tokio::test]
    async fn prefix_retry_prefers_exact_name() {
        let resolver = TableResolver(HashMap::from([(
            "0xstrange.eth".to_string(),
            ALICE_ADDR.to_string(),
        )]));

        let hit = resolve_with_prefix_retry(&resolver, "0xstrange.eth")
            .await
            .unwrap();
        assert_eq!(
            hit,
            Some(("0xstrange.eth".to_string(), ALICE_ADDR.to_string()))
        );
    }

    #[tokio::test]
    async fn rpc_miss_logs_info_not_error() {
        let resolver = TableResolver(HashMap::new());
        let mut logger = EventLogger::new();

        let accepted = resolve_each(&resolver, &[candidate("ghost.eth")], &mut logger)
            .await
            .unwrap();

        assert!(accepted.is_empty());
        assert_eq!(logger.events().len(), 1);
        assert_eq!(logger.events()[0].level, crate::types::LogLevel::Info);
        assert!(logger.events()[0].message.contains("ghost.eth"));
    }

    #[test]
    fn abi_word_address_extraction() {
        let mut word = vec![0u8; 32];
        assert!(address_from_word(&word).is_none());

        word[12..].copy_from_slice(&hex::decode(&ALICE_ADDR[2..]).unwrap());
        assert_eq!(address_from_word(&word).as_deref(), Some(ALICE_ADDR));

        assert!(address_from_word(&[0u8; 20]).is_none());
    }
}
