//! EODHD search and fundamentals client.
//!
//! Both endpoints are addressed by EODHD symbol (`CODE.EXCHANGE`). Calls are
//! issued one symbol at a time behind a batched interface; symbols the API
//! does not know, or answers with blank values for, are left out of the
//! result rather than reported as empty.

use super::http::{HttpBody, HttpFetcher};
use super::provider::{EodhdProvider, Fundamentals, ProviderError};
use crate::domain::field::non_blank;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://eodhd.com/api";

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "Code")]
    code: String,
    #[serde(rename = "Exchange")]
    exchange: String,
    #[serde(rename = "ISIN", default)]
    isin: Option<String>,
}

#[derive(Debug, Deserialize)]
struct General {
    #[serde(rename = "ISIN", default)]
    isin: Option<String>,
    #[serde(rename = "Sector", default)]
    sector: Option<String>,
    #[serde(rename = "Industry", default)]
    industry: Option<String>,
    #[serde(rename = "GicIndustry", default)]
    gic_industry: Option<String>,
    #[serde(rename = "GicSector", default)]
    gic_sector: Option<String>,
}

fn clean(value: Option<String>) -> Option<String> {
    value.as_deref().and_then(non_blank).map(str::to_string)
}

pub struct EodhdClient {
    http: HttpFetcher,
    base_url: String,
    api_token: String,
}

impl EodhdClient {
    pub fn new(api_token: impl Into<String>) -> Result<Self, ProviderError> {
        Self::with_base_url(api_token, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(
        api_token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            http: HttpFetcher::new("eodhd", Duration::from_secs(30))?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token: api_token.into(),
        })
    }

    /// Split `CODE.EXCHANGE`; symbols without an exchange are rejected.
    fn split_symbol(symbol: &str) -> Option<(&str, &str)> {
        symbol
            .rsplit_once('.')
            .filter(|(code, exchange)| !code.is_empty() && !exchange.is_empty())
    }

    /// ISIN of the hit matching `symbol` exactly (code and exchange).
    fn parse_search(symbol: &str, body: &str) -> Result<Option<String>, ProviderError> {
        let Some((code, exchange)) = Self::split_symbol(symbol) else {
            return Ok(None);
        };
        let hits: Vec<SearchHit> = serde_json::from_str(body).map_err(|e| {
            ProviderError::ResponseFormatChanged(format!("eodhd search for {symbol}: {e}"))
        })?;
        Ok(hits
            .into_iter()
            .find(|h| h.code.eq_ignore_ascii_case(code) && h.exchange.eq_ignore_ascii_case(exchange))
            .and_then(|h| clean(h.isin)))
    }

    /// Fundamentals from the `General` section. GICS values are used only
    /// when the plain fields are absent.
    fn parse_fundamentals(symbol: &str, body: &str) -> Result<Fundamentals, ProviderError> {
        let general: General = serde_json::from_str(body).map_err(|e| {
            ProviderError::ResponseFormatChanged(format!("eodhd fundamentals for {symbol}: {e}"))
        })?;
        Ok(Fundamentals {
            industry: clean(general.industry).or_else(|| clean(general.gic_industry)),
            sector: clean(general.sector).or_else(|| clean(general.gic_sector)),
            isin: clean(general.isin),
        })
    }

    fn get(&self, path: &str, extra: &[(&str, &str)], label: &str) -> Result<Option<String>, ProviderError> {
        let url = format!("{}/{path}", self.base_url);
        let mut query: Vec<(&str, &str)> = vec![("api_token", self.api_token.as_str()), ("fmt", "json")];
        query.extend_from_slice(extra);
        match self.http.get_text(&url, &query, label)? {
            HttpBody::Ok(body) => Ok(Some(body)),
            HttpBody::NotFound => Ok(None),
        }
    }
}

impl EodhdProvider for EodhdClient {
    fn search(&self, symbols: &[String]) -> Result<BTreeMap<String, String>, ProviderError> {
        let mut out = BTreeMap::new();
        for symbol in symbols {
            let Some((code, _)) = Self::split_symbol(symbol) else {
                tracing::warn!(symbol, "not an EODHD symbol, skipping search");
                continue;
            };
            let label = format!("search {symbol}");
            let Some(body) = self.get(&format!("search/{code}"), &[], &label)? else {
                continue;
            };
            if let Some(isin) = Self::parse_search(symbol, &body)? {
                out.insert(symbol.clone(), isin);
            }
        }
        tracing::debug!(requested = symbols.len(), found = out.len(), "eodhd search done");
        Ok(out)
    }

    fn get_fundamentals(
        &self,
        symbols: &[String],
    ) -> Result<BTreeMap<String, Fundamentals>, ProviderError> {
        let mut out = BTreeMap::new();
        for symbol in symbols {
            let label = format!("fundamentals {symbol}");
            let Some(body) = self.get(&format!("fundamentals/{symbol}"), &[("filter", "General")], &label)?
            else {
                continue;
            };
            let fundamentals = Self::parse_fundamentals(symbol, &body)?;
            if fundamentals != Fundamentals::default() {
                out.insert(symbol.clone(), fundamentals);
            }
        }
        tracing::debug!(requested = symbols.len(), found = out.len(), "eodhd fundamentals done");
        Ok(out)
    }
}
