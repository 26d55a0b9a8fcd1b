//! Cursor-paginated harvesting.
//!
//! The provider pages collections with a `Link: <...>; rel="next"` header.
//! The harvest loop follows the cursor until it disappears, accumulating
//! records in arrival order with a courtesy delay between pages so a long
//! harvest stays under the provider's rate limits.
//!
//! Failure contract: a transport failure aborts with nothing (the partial
//! page set is discarded); a non-success page stops pagination and
//! preserves what was already accumulated. Callers distinguish a
//! legitimately empty collection from a failed harvest via the error slot,
//! not the record count.

use colored::Colorize;
use reqwest::header::{HeaderMap, LINK};
use serde_json::Value;

use crate::audit::Auditor;
use crate::client::{api_error, IdpClient};
use crate::error::Error;

const AUDIT_SOURCE: &str = "client::fetcher";

/// Outcome of a multi-page harvest.
#[derive(Debug, Default)]
pub struct Harvest {
    pub records: Vec<Value>,
    pub error: Option<Error>,
}

impl Harvest {
    pub fn failed(&self) -> bool {
        self.error.is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl IdpClient {
    /// Retrieve every page of a collection endpoint, e.g. `/users`.
    /// `resource` is the plural noun used in log and audit lines.
    pub async fn get_all(
        &self,
        auditor: &Auditor,
        path: &str,
        params: Option<&[(&str, &str)]>,
        resource: &str,
    ) -> Harvest {
        let mut url = format!("{}{}", self.base_url(), path);
        let mut params = params;
        let mut records: Vec<Value> = Vec::new();

        loop {
            let response = match self.get_with_retry(&url, params).await {
                Ok(response) => response,
                Err(e) => {
                    let msg = format!("Error retrieving {resource}: {e}");
                    auditor.error(AUDIT_SOURCE, &msg).await;
                    println!("{}", format!("[!] {msg}").red());
                    return Harvest { records: Vec::new(), error: Some(e) };
                }
            };

            if !response.status().is_success() {
                let e = api_error(response).await;
                let msg = format!("Error retrieving {resource}\n    {}", e.detail());
                auditor.error(AUDIT_SOURCE, &msg).await;
                println!("{}", format!("[!] {msg}").red());
                return Harvest { records, error: Some(e) };
            }

            // The cursor must be read before the body consumes the response.
            let next = next_link(response.headers());

            let page: Vec<Value> = match response.json().await {
                Ok(page) => page,
                Err(e) => {
                    let e = Error::from(e);
                    let msg = format!("Error decoding {resource} page: {e}");
                    auditor.error(AUDIT_SOURCE, &msg).await;
                    println!("{}", format!("[!] {msg}").red());
                    return Harvest { records: Vec::new(), error: Some(e) };
                }
            };

            let msg = format!("Retrieved information for {} {resource}", page.len());
            auditor.info(AUDIT_SOURCE, &msg).await;
            println!("{}", format!("[*] {msg}").green());

            records.extend(page);
            tokio::time::sleep(self.page_delay()).await;

            match next {
                Some(next_url) => {
                    url = next_url;
                    // Continuation URLs carry their own query string.
                    params = None;
                }
                None => {
                    println!("[*] No more {resource} found");
                    break;
                }
            }
        }

        if !records.is_empty() {
            let msg = format!("Total {resource} harvested: {}", records.len());
            auditor.info(AUDIT_SOURCE, &msg).await;
            println!("[*] {msg}");
        }

        Harvest { records, error: None }
    }
}

/// Extract the `rel="next"` target from the response's `Link` headers.
pub(crate) fn next_link(headers: &HeaderMap) -> Option<String> {
    for value in headers.get_all(LINK) {
        let Ok(value) = value.to_str() else { continue };

        for part in value.split(',') {
            let mut segments = part.split(';');
            let Some(target) = segments.next() else { continue };
            let target = target.trim();
            if !(target.starts_with('<') && target.ends_with('>')) {
                continue;
            }

            let is_next = segments.any(|param| {
                let param = param.trim();
                param == "rel=\"next\"" || param == "rel=next"
            });

            if is_next {
                return Some(target[1..target.len() - 1].to_string());
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers(values: &[&str]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for value in values {
            map.append(LINK, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn next_link_found_among_multiple_relations() {
        let map = headers(&[
            "<https://org.example.com/api/v1/users?limit=200>; rel=\"self\", \
             <https://org.example.com/api/v1/users?after=00u1&limit=200>; rel=\"next\"",
        ]);
        assert_eq!(
            next_link(&map).as_deref(),
            Some("https://org.example.com/api/v1/users?after=00u1&limit=200")
        );
    }

    #[test]
    fn next_link_found_across_separate_headers() {
        let map = headers(&[
            "<https://org.example.com/api/v1/users?limit=200>; rel=\"self\"",
            "<https://org.example.com/api/v1/users?after=00u2>; rel=\"next\"",
        ]);
        assert_eq!(next_link(&map).as_deref(), Some("https://org.example.com/api/v1/users?after=00u2"));
    }

    #[test]
    fn terminal_page_has_no_next_link() {
        let map = headers(&["<https://org.example.com/api/v1/users?limit=200>; rel=\"self\""]);
        assert_eq!(next_link(&map), None);
    }
}
