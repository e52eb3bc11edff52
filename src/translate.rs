//! Cross-lingual entity translator (spec §4.2).
//!
//! Resolves a batch of entity local names known in a source language to
//! their titles in a set of target languages via a batched, continuation-
//! aware call against a langlinks-shaped catalog endpoint. Grounded on the
//! same `reqwest`/`tokio` client idiom as the teacher's `download.rs`
//! (`Client`, `buffered` fan-out), with the continuation loop from
//! `translate_entity_new.py` reshaped from self-recursion into a bounded
//! iteration (spec §9 "recursive continuation… is really a bounded loop").
use std::collections::HashMap;
use std::time::Duration;

use futures::{stream, StreamExt};
use log::{debug, warn};
use rand::Rng;
use serde::Deserialize;

use crate::error::Error;
use crate::lang::LangCode;
use crate::triple::normalize_name;

/// max titles joined into a single `titles=` query, per spec §4.2.
const MAX_TITLES_PER_REQUEST: usize = 50;
/// bounded retry budget for HTTP 429 / timeout, per spec §7 (">=3").
const MAX_ATTEMPTS: usize = 5;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// maps a language code to the entity's title in that language.
pub type Translation = HashMap<String, String>;

pub struct Translator {
    client: reqwest::Client,
    /// host suffix the catalog endpoint lives under, e.g. "wikipedia.org".
    host: String,
    concurrency: usize,
}

impl Translator {
    pub fn new(host: impl Into<String>) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Translator {
            client,
            host: host.into(),
            concurrency: 4,
        })
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    fn base_url(&self, src_lang: &LangCode) -> String {
        format!("https://{}.{}/w/api.php", src_lang.as_str(), self.host)
    }

    /// translates an arbitrary-length list of entity names, chunking into
    /// ≤50-title requests and fanning them out across `self.concurrency`
    /// concurrent tasks. Order of the returned vector matches `entities`.
    pub async fn translate_many(
        &self,
        src_lang: &LangCode,
        entities: &[String],
        targets: &[LangCode],
    ) -> Result<Vec<Translation>, Error> {
        let chunks: Vec<&[String]> = entities.chunks(MAX_TITLES_PER_REQUEST).collect();
        let concurrency = self.concurrency;

        // `buffered` preserves chunk order (unlike `buffer_unordered`), which
        // the positional concatenation below depends on.
        let results = stream::iter(chunks.into_iter())
            .map(|chunk| self.translate_batch(src_lang, chunk, targets))
            .buffered(concurrency)
            .collect::<Vec<_>>()
            .await;

        let mut out = Vec::with_capacity(entities.len());
        for r in results {
            out.extend(r?);
        }
        Ok(out)
    }

    /// translates a single batch of ≤50 entity names, looping over
    /// `continue` pages until the catalog reports none remaining.
    pub async fn translate_batch(
        &self,
        src_lang: &LangCode,
        entities: &[String],
        targets: &[LangCode],
    ) -> Result<Vec<Translation>, Error> {
        assert!(
            entities.len() <= MAX_TITLES_PER_REQUEST,
            "batch exceeds max titles per request"
        );

        let normalized: Vec<String> = entities.iter().map(|e| normalize_name(e)).collect();
        let mut results: Vec<Option<Translation>> = vec![None; normalized.len()];
        let target_set: std::collections::HashSet<&str> =
            targets.iter().map(|l| l.as_str()).collect();

        let url = self.base_url(src_lang);
        let titles_param = normalized.join("|");
        let mut params: HashMap<&str, String> = HashMap::from([
            ("action", "query".to_string()),
            ("titles", titles_param),
            ("prop", "langlinks".to_string()),
            ("lllimit", "500".to_string()),
            ("formatversion", "2".to_string()),
            ("format", "json".to_string()),
        ]);

        loop {
            let data = self.request_with_backoff(&url, &params).await?;

            for page in &data.query.pages {
                let page_title = normalize_name(&page.title);
                for (idx, entity) in normalized.iter().enumerate() {
                    if *entity != page_title {
                        continue;
                    }
                    let slot = results[idx].get_or_insert_with(HashMap::new);
                    slot.insert(src_lang.as_str().to_string(), page_title.clone());
                    if let Some(links) = &page.langlinks {
                        for link in links {
                            if target_set.contains(link.lang.as_str()) {
                                slot.insert(link.lang.clone(), normalize_name(&link.title));
                            }
                        }
                    }
                }
            }

            match data.cont.and_then(|c| c.llcontinue) {
                Some(token) => {
                    params.insert("llcontinue", token);
                }
                None => break,
            }
        }

        // titles absent from the response resolve to `{ src_lang -> itself }`
        Ok(normalized
            .into_iter()
            .enumerate()
            .map(|(idx, title)| {
                results[idx].take().unwrap_or_else(|| {
                    HashMap::from([(src_lang.as_str().to_string(), title)])
                })
            })
            .collect())
    }

    async fn request_with_backoff(
        &self,
        url: &str,
        params: &HashMap<&str, String>,
    ) -> Result<LangLinksResponse, Error> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let resp = self.client.get(url).query(params).send().await?;
            let status = resp.status();

            if status.is_success() {
                return Ok(resp.json::<LangLinksResponse>().await?);
            }

            if status.as_u16() == 429 {
                if attempt >= MAX_ATTEMPTS {
                    return Err(Error::HttpTransient(format!(
                        "{} kept returning 429 after {} attempts",
                        url, attempt
                    )));
                }
                let backoff = rand::thread_rng().gen_range(1..=10);
                warn!(
                    "{} rate-limited (attempt {}/{}), backing off {}s",
                    url, attempt, MAX_ATTEMPTS, backoff
                );
                tokio::time::sleep(Duration::from_secs(backoff)).await;
                continue;
            }

            return Err(Error::HttpFatal(format!("{} returned {}", url, status)));
        }
    }
}

#[derive(Debug, Deserialize)]
struct LangLinksResponse {
    query: QueryPages,
    #[serde(rename = "continue")]
    cont: Option<ContinueToken>,
}

#[derive(Debug, Deserialize)]
struct QueryPages {
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    title: String,
    langlinks: Option<Vec<LangLink>>,
}

#[derive(Debug, Deserialize)]
struct LangLink {
    lang: String,
    title: String,
}

#[derive(Debug, Deserialize)]
struct ContinueToken {
    llcontinue: Option<String>,
}
