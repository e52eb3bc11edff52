//! Category-membership collaborator (spec §1 "out of scope", §6).
//!
//! The orchestrator treats the subject-filter source as an external
//! collaborator: given a category title, it returns the set of member
//! entity names. Specified here as a trait so the ingester/matcher depend
//! only on the contract; the one real implementation calls the same
//! `action=query&list=categorymembers` shape the translator's endpoint
//! lives under, grounded on `utils.get_category_members`.
use std::collections::HashSet;
use std::time::Duration;

use log::warn;
use rand::Rng;
use serde::Deserialize;

use crate::error::Error;
use crate::lang::LangCode;
use crate::triple::normalize_name;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_ATTEMPTS: usize = 5;

#[async_trait::async_trait]
pub trait CategoryFetcher {
    /// returns the set of normalized entity names belonging to `category`
    /// in language `lang`.
    async fn members(&self, category: &str, lang: &LangCode) -> Result<HashSet<String>, Error>;
}

pub struct WikiCategoryFetcher {
    client: reqwest::Client,
    host: String,
}

impl WikiCategoryFetcher {
    pub fn new(host: impl Into<String>) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(WikiCategoryFetcher {
            client,
            host: host.into(),
        })
    }
}

#[async_trait::async_trait]
impl CategoryFetcher for WikiCategoryFetcher {
    async fn members(&self, category: &str, lang: &LangCode) -> Result<HashSet<String>, Error> {
        let url = format!("https://{}.{}/w/api.php", lang.as_str(), self.host);
        let mut params: Vec<(&str, String)> = vec![
            ("action", "query".to_string()),
            ("list", "categorymembers".to_string()),
            ("cmtitle", category.to_string()),
            ("cmlimit", "max".to_string()),
            ("cmtype", "page".to_string()),
            ("formatversion", "2".to_string()),
            ("format", "json".to_string()),
        ];

        let mut results = HashSet::new();

        loop {
            let data = request_with_backoff(&self.client, &url, &params).await?;

            for member in &data.query.categorymembers {
                results.insert(normalize_name(&member.title));
            }

            match data.cont.and_then(|c| c.cmcontinue) {
                Some(token) => {
                    params.retain(|(k, _)| *k != "cmcontinue");
                    params.push(("cmcontinue", token));
                }
                None => break,
            }
        }

        Ok(results)
    }
}

async fn request_with_backoff(
    client: &reqwest::Client,
    url: &str,
    params: &[(&str, String)],
) -> Result<CategoryMembersResponse, Error> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        let resp = client.get(url).query(params).send().await?;
        let status = resp.status();

        if status.is_success() {
            return Ok(resp.json::<CategoryMembersResponse>().await?);
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

#[derive(Debug, Deserialize)]
struct CategoryMembersResponse {
    query: CategoryMembersQuery,
    #[serde(rename = "continue")]
    cont: Option<ContinueToken>,
}

#[derive(Debug, Deserialize)]
struct CategoryMembersQuery {
    categorymembers: Vec<CategoryMember>,
}

#[derive(Debug, Deserialize)]
struct CategoryMember {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ContinueToken {
    cmcontinue: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_parses_members_and_continue() {
        let json = r#"{
            "query": {"categorymembers": [{"title": "Foo Bar"}]},
            "continue": {"cmcontinue": "page|2"}
        }"#;
        let parsed: CategoryMembersResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.query.categorymembers[0].title, "Foo Bar");
        assert_eq!(parsed.cont.unwrap().cmcontinue, Some("page|2".to_string()));
    }
}
