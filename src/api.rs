use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::PAGE_SIZE;
use crate::logger::EventLogger;
use crate::types::Reply;

/// One page of recent-search results.
#[derive(Debug, Deserialize)]
pub struct SearchPage {
    /// Replies in this page. Absent when the page is empty.
    #[serde(default)]
    pub data: Vec<Reply>,
    pub meta: SearchMeta,
}

#[derive(Debug, Deserialize)]
pub struct SearchMeta {
    /// Continuation token; present when more results exist.
    pub next_token: Option<String>,
}

/// Anything that can serve pages of thread replies. Lets the page-walking
/// loop run against a canned source in tests.
#[allow(async_fn_in_trait)]
pub trait ReplySource {
    async fn fetch_page(&self, token: Option<&str>) -> Result<SearchPage>;
}

/// Client for the paged recent-search endpoint.
pub struct SearchClient {
    http: reqwest::Client,
    base_url: String,
    conversation_id: String,
    bearer: Option<String>,
}

impl SearchClient {
    /// `bearer` is optional: without it requests go out unauthenticated and
    /// the proxy in front of the API applies the application default.
    pub fn new(base_url: impl Into<String>, conversation_id: impl Into<String>, bearer: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            conversation_id: conversation_id.into(),
            bearer,
        }
    }

    fn endpoint(&self, token: Option<&str>) -> String {
        let base = format!(
            "{}/2/tweets/search/recent?query=conversation_id:{}&max_results={}",
            self.base_url, self.conversation_id, PAGE_SIZE
        );
        match token {
            Some(token) => format!("{base}&next_token={token}"),
            None => base,
        }
    }
}

impl ReplySource for SearchClient {
    async fn fetch_page(&self, token: Option<&str>) -> Result<SearchPage> {
        let url = self.endpoint(token);
        debug!("GET {url}");

        let mut req = self.http.get(&url);
        if let Some(bearer) = &self.bearer {
            req = req.bearer_auth(bearer);
        }

        let resp = req.send().await.context("search request failed")?;
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("search request returned {status}");
        }
        resp.json::<SearchPage>()
            .await
            .context("malformed search response body")
    }
}

/// Walk every page of the thread, accumulating replies in API return order.
///
/// Iterative loop with a mutable continuation token rather than recursion, so
/// very long threads cannot grow the call stack. Emits one info event per page
/// with that page's reply count. Any transport failure aborts the whole run.
pub async fn collect_replies(
    source: &impl ReplySource,
    logger: &mut EventLogger,
) -> Result<Vec<Reply>> {
    let mut replies = Vec::new();
    let mut token: Option<String> = None;

    loop {
        let page = source.fetch_page(token.as_deref()).await?;
        logger.info(format!("Collected {} tweets", page.data.len()));
        replies.extend(page.data);

        match page.meta.next_token {
            Some(next) => token = Some(next),
            None => break,
        }
    }

    Ok(replies)
}
