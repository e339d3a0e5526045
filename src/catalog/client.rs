//! Paginated catalog traversal.
//!
//! The models endpoint returns a page of items plus a `metadata.nextPage`
//! cursor. [`CatalogClient::pages`] follows the cursors lazily, one request per
//! polled page, and stops on the first of: no cursor, an empty page without
//! metadata, or a cursor that points back to a page already requested.

use super::model::{CatalogItem, CatalogPage, PageMetadata, RawPage};
use super::survey::CatalogSurvey;
use crate::error::{Error, Result};
use crate::retry::RetryPolicy;
use crate::utils::query::{cursor_key, redacted, with_auth};

use futures::stream::{self, Stream, TryStreamExt};
use reqwest::{header::CONTENT_TYPE, Url};
use reqwest_middleware::ClientWithMiddleware;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info, warn};

/// Default models listing endpoint.
pub const DEFAULT_API_BASE: &str = "https://civitai.com/api/v1/models";

/// Client for the models listing endpoint.
#[derive(Clone)]
pub struct CatalogClient {
    client: ClientWithMiddleware,
    api_base: Url,
    token: String,
    nsfw: bool,
    retry: RetryPolicy,
}

impl fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogClient")
            .field("api_base", &self.api_base.as_str())
            .field("nsfw", &self.nsfw)
            .field("retry", &self.retry)
            .finish()
    }
}

struct Walk<'a> {
    creator: &'a str,
    next: Option<Url>,
    seen: HashSet<String>,
    number: usize,
}

impl CatalogClient {
    pub fn new(
        client: ClientWithMiddleware,
        api_base: Url,
        token: impl Into<String>,
        nsfw: bool,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client,
            api_base,
            token: token.into(),
            nsfw,
            retry,
        }
    }

    /// URL of the first page for `creator`.
    pub fn first_page_url(&self, creator: &str) -> Url {
        let mut url = self.api_base.clone();
        url.query_pairs_mut().append_pair("username", creator);
        with_auth(&url, &self.token, self.nsfw)
    }

    /// Lazily walk every page published for `creator`.
    ///
    /// Each call starts again from the first page. A page that still fails after
    /// every retry ends the stream with [`Error::CatalogUnavailable`].
    pub fn pages<'a>(&'a self, creator: &'a str) -> impl Stream<Item = Result<CatalogPage>> + 'a {
        let walk = Walk {
            creator,
            next: Some(self.first_page_url(creator)),
            seen: HashSet::new(),
            number: 0,
        };

        stream::try_unfold(walk, move |mut walk| async move {
            let Some(url) = walk.next.take() else {
                info!(creator = walk.creator, "End of pagination reached");
                return Ok::<_, Error>(None);
            };
            walk.seen.insert(cursor_key(&url));

            let (items, metadata) = self.fetch_page_with_retry(walk.creator, &url).await?;
            let metadata = metadata.unwrap_or_default();
            if items.is_empty() && metadata.is_empty() {
                info!(creator = walk.creator, "Empty page without metadata, end of data");
                return Ok(None);
            }

            walk.number += 1;
            let next_page = metadata.next_page.filter(|cursor| !cursor.is_empty());
            walk.next = next_page.as_deref().and_then(|cursor| self.follow(&walk, cursor));

            debug!(
                creator = walk.creator,
                page = walk.number,
                items = items.len(),
                "Fetched catalog page"
            );
            let page = CatalogPage {
                number: walk.number,
                items,
                next_page,
            };
            Ok(Some((page, walk)))
        })
    }

    /// Walk the whole catalog of `creator` and tally it by category.
    pub async fn survey(&self, creator: &str) -> Result<CatalogSurvey> {
        let mut survey = CatalogSurvey::new();
        let pages = self.pages(creator);
        futures::pin_mut!(pages);
        while let Some(page) = pages.try_next().await? {
            for item in &page.items {
                survey.record(item);
            }
        }
        info!(creator, total = survey.total(), "Catalog survey complete");
        Ok(survey)
    }

    /// Resolve the next cursor, or `None` when the walk must stop.
    fn follow(&self, walk: &Walk<'_>, cursor: &str) -> Option<Url> {
        let url = match Url::parse(cursor) {
            Ok(url) => with_auth(&url, &self.token, self.nsfw),
            Err(e) => {
                warn!(creator = walk.creator, "Unusable nextPage cursor {cursor:?}: {e}");
                return None;
            }
        };
        if walk.seen.contains(&cursor_key(&url)) {
            warn!(
                creator = walk.creator,
                page = walk.number,
                "nextPage cursor repeats an earlier page, stopping"
            );
            return None;
        }
        Some(url)
    }

    async fn fetch_page_with_retry(
        &self,
        creator: &str,
        url: &Url,
    ) -> Result<(Vec<CatalogItem>, Option<PageMetadata>)> {
        self.retry
            .run("Catalog request", |_| self.fetch_page(url))
            .await
            .map_err(|exhausted| Error::CatalogUnavailable {
                creator: creator.to_string(),
                attempts: exhausted.attempts,
                source: Box::new(exhausted.error),
            })
    }

    async fn fetch_page(&self, url: &Url) -> Result<(Vec<CatalogItem>, Option<PageMetadata>)> {
        debug!("Requesting {}", redacted(url));
        let res = self
            .client
            .get(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status,
                url: redacted(url),
            });
        }

        let body = res.bytes().await?;
        let raw: RawPage = serde_json::from_slice(&body)?;
        let items = raw
            .items
            .into_iter()
            .map(CatalogItem::from_value)
            .collect::<Result<Vec<_>>>()?;
        Ok((items, raw.metadata))
    }
}
