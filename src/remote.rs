//! Remote EULA resolution from the Steam storefront.
//!
//! A [`RemoteResolver`] walks an ordered list of [`EulaLocator`] strategies
//! (store API first, store page second) and stops at the first one that
//! produces an [`EulaReference`]. A URL reference is then downloaded and, for
//! HTML responses, reduced to plain text.
//!
//! Every network or parse failure is logged and treated as "this source
//! yielded nothing", so discovery always falls through to local files.

use anyhow::{anyhow, bail, Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, COOKIE};
use reqwest::Url;
use serde_json::Value;
use std::time::Duration;

use crate::config::StoreConfig;
use crate::extract::html;
use crate::models::Package;

/// Label used as the candidate source for remotely found text.
pub const STORE_SOURCE: &str = "Steam API/Store";

/// Cookies that get past the store's age gate.
const AGE_GATE_COOKIES: &str = "birthtime=0; lastagecheckage=1-0-1970; wants_mature_content=1";

/// A fetched HTTP response body.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub content_type: Option<String>,
    pub body: String,
}

impl FetchedPage {
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("text/html"))
    }
}

/// Minimal blocking HTTP GET, so locators can be exercised without a network.
pub trait HttpFetch {
    fn get(&self, url: &str) -> Result<FetchedPage>;
}

/// [`HttpFetch`] over a blocking `reqwest` client.
pub struct HttpClient {
    client: reqwest::blocking::Client,
}

impl HttpClient {
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static(AGE_GATE_COOKIES));
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()?;
        Ok(Self { client })
    }
}

impl HttpFetch for HttpClient {
    fn get(&self, url: &str) -> Result<FetchedPage> {
        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("GET {}", url))?;
        let status = response.status();
        if !status.is_success() {
            bail!("GET {} returned {}", url, status);
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let final_url = response.url().to_string();
        let body = response.text()?;
        Ok(FetchedPage {
            url: final_url,
            content_type,
            body,
        })
    }
}

/// What a locator found: a link to the EULA, or the EULA text itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EulaReference {
    Url(String),
    Inline(String),
}

impl EulaReference {
    /// Values that look like web addresses are links; anything else is text.
    pub fn classify(value: String) -> Self {
        if value.starts_with("http") {
            EulaReference::Url(value)
        } else {
            EulaReference::Inline(value)
        }
    }
}

/// One remote lookup strategy.
pub trait EulaLocator {
    /// Short name for logs (e.g. `"store-api"`).
    fn name(&self) -> &str;

    /// Looks up a EULA reference for `package`. `Ok(None)` means the source
    /// answered but had nothing; `Err` means the source could not be used.
    fn locate(&self, http: &dyn HttpFetch, package: &Package) -> Result<Option<EulaReference>>;
}

/// Queries the `appdetails` JSON API.
pub struct StoreApiLocator {
    api_url: String,
    country: String,
    language: String,
}

impl StoreApiLocator {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            api_url: config.api_url.clone(),
            country: config.country.clone(),
            language: config.language.clone(),
        }
    }

    fn details_url(&self, app_id: &str) -> Result<Url> {
        Ok(Url::parse_with_params(
            &self.api_url,
            &[
                ("appids", app_id),
                ("cc", self.country.as_str()),
                ("l", self.language.as_str()),
            ],
        )?)
    }
}

impl EulaLocator for StoreApiLocator {
    fn name(&self) -> &str {
        "store-api"
    }

    fn locate(&self, http: &dyn HttpFetch, package: &Package) -> Result<Option<EulaReference>> {
        let url = self.details_url(&package.app_id)?;
        let page = http.get(url.as_str())?;
        let json: Value = serde_json::from_str(&page.body).context("appdetails is not JSON")?;
        let details = app_details(&json, &package.app_id)?;
        Ok(eula_url_from_details(details).map(EulaReference::Url))
    }
}

/// Unwraps the `{ "<appid>": { "success": bool, "data": {...} } }` envelope.
pub fn app_details<'a>(json: &'a Value, app_id: &str) -> Result<&'a Value> {
    let entry = json
        .get(app_id)
        .ok_or_else(|| anyhow!("appdetails response has no entry for {}", app_id))?;
    if !entry.get("success").and_then(Value::as_bool).unwrap_or(false) {
        bail!("appdetails reported failure for {}", app_id);
    }
    entry
        .get("data")
        .ok_or_else(|| anyhow!("appdetails response for {} has no data", app_id))
}

/// Explicit `eula.url`, else an absolute `legal_notice`, else a EULA link
/// inside `about_the_game`.
pub fn eula_url_from_details(details: &Value) -> Option<String> {
    if let Some(url) = details
        .get("eula")
        .and_then(|e| e.get("url"))
        .and_then(Value::as_str)
        .filter(|u| !u.trim().is_empty())
    {
        return Some(url.trim().to_string());
    }
    if let Some(notice) = details
        .get("legal_notice")
        .and_then(Value::as_str)
        .filter(|n| n.starts_with("http"))
    {
        return Some(notice.trim().to_string());
    }
    details
        .get("about_the_game")
        .and_then(Value::as_str)
        .and_then(|about| {
            html::find_anchor_href_where(about, "eula", |href| href.starts_with("http"))
        })
}

/// Scrapes the public store page.
pub struct StorePageLocator {
    page_url: String,
}

impl StorePageLocator {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            page_url: config.page_url.clone(),
        }
    }
}

impl EulaLocator for StorePageLocator {
    fn name(&self) -> &str {
        "store-page"
    }

    fn locate(&self, http: &dyn HttpFetch, package: &Package) -> Result<Option<EulaReference>> {
        let url = format!("{}/{}", self.page_url.trim_end_matches('/'), package.app_id);
        let page = http.get(&url)?;

        if let Some(href) = html::find_anchor_href(&page.body, "eula") {
            let absolute = Url::parse(&page.url)
                .and_then(|base| base.join(&href))
                .map(|u| u.to_string())
                .unwrap_or(href);
            return Ok(Some(EulaReference::classify(absolute)));
        }
        Ok(html::legal_notice_block(&page.body).map(EulaReference::Inline))
    }
}

/// Ordered remote strategies plus the HTTP client they share.
pub struct RemoteResolver {
    http: Box<dyn HttpFetch>,
    locators: Vec<Box<dyn EulaLocator>>,
}

impl RemoteResolver {
    pub fn new(http: Box<dyn HttpFetch>, locators: Vec<Box<dyn EulaLocator>>) -> Self {
        Self { http, locators }
    }

    /// Store API then store page, or no locators when the store is disabled.
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        let http = Box::new(HttpClient::new(config)?);
        let locators: Vec<Box<dyn EulaLocator>> = if config.enabled {
            vec![
                Box::new(StoreApiLocator::new(config)),
                Box::new(StorePageLocator::new(config)),
            ]
        } else {
            Vec::new()
        };
        Ok(Self::new(http, locators))
    }

    /// First reference any locator produces, in order.
    pub fn locate(&self, package: &Package) -> Option<EulaReference> {
        for locator in &self.locators {
            match locator.locate(self.http.as_ref(), package) {
                Ok(Some(reference)) => {
                    tracing::info!(
                        app_id = %package.app_id,
                        locator = locator.name(),
                        "EULA reference found"
                    );
                    return Some(reference);
                }
                Ok(None) => {
                    tracing::debug!(
                        app_id = %package.app_id,
                        locator = locator.name(),
                        "no EULA reference"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        app_id = %package.app_id,
                        locator = locator.name(),
                        "lookup failed: {:#}",
                        e
                    );
                }
            }
        }
        None
    }

    /// Turns a reference into text: links are downloaded (HTML stripped),
    /// inline text is used as is. Empty results are `None`.
    pub fn materialize(&self, reference: EulaReference) -> Option<String> {
        let text = match reference {
            EulaReference::Inline(text) => text,
            EulaReference::Url(url) => match self.http.get(&url) {
                Ok(page) if page.is_html() => html::html_to_text(&page.body),
                Ok(page) => page.body,
                Err(e) => {
                    tracing::warn!(url = %url, "failed to download EULA: {:#}", e);
                    return None;
                }
            },
        };
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }

    /// Locate then materialize.
    pub fn resolve(&self, package: &Package) -> Option<String> {
        self.locate(package)
            .and_then(|reference| self.materialize(reference))
    }
}
