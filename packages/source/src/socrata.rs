//! Socrata SODA API fetcher for aggregate queries.
//!
//! Pages through a `$select ... $group` query with `$limit` and `$offset`.
//! A stable `$order` over the group columns keeps pages from overlapping.

use tree_census_models::RawRecord;

use crate::{FetchOptions, SourceError, retry};

/// NYC 2015 Street Tree Census resource.
pub const TREE_CENSUS_API_URL: &str = "https://data.cityofnewyork.us/resource/nwxe-4ae8.json";

/// Columns the census is grouped by.
const GROUP_COLUMNS: &str = "spc_common,boroname,health,steward";

/// Default page size. Large enough that the whole aggregate usually fits in
/// one page.
pub const DEFAULT_PAGE_SIZE: u64 = 50_000;

/// Configuration for a Socrata aggregate fetch.
pub struct SocrataConfig<'a> {
    /// Resource URL (e.g. [`TREE_CENSUS_API_URL`]).
    pub api_url: &'a str,
    /// `$select` clause.
    pub select: &'a str,
    /// `$group` clause.
    pub group: &'a str,
    /// `$order` clause.
    pub order: &'a str,
    /// Label for log messages.
    pub label: &'a str,
    /// Page size for pagination.
    pub page_size: u64,
}

impl<'a> SocrataConfig<'a> {
    /// The tree census aggregate: tree counts per species, borough, health
    /// and steward level.
    #[must_use]
    pub const fn tree_census(api_url: &'a str) -> Self {
        Self {
            api_url,
            select: "spc_common,boroname,health,steward,count(tree_id)",
            group: GROUP_COLUMNS,
            order: GROUP_COLUMNS,
            label: "tree census",
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Query parameters for one page.
    #[must_use]
    pub fn page_query(&self, offset: u64, limit: u64) -> Vec<(&'static str, String)> {
        vec![
            ("$select", self.select.to_string()),
            ("$group", self.group.to_string()),
            ("$order", self.order.to_string()),
            ("$limit", limit.to_string()),
            ("$offset", offset.to_string()),
        ]
    }
}

/// Fetches every aggregate row, page by page.
///
/// # Errors
///
/// Returns [`SourceError`] if a request fails after retries or a page is
/// not an array of census rows.
pub async fn fetch_socrata(
    client: &reqwest::Client,
    config: &SocrataConfig<'_>,
    options: &FetchOptions,
) -> Result<Vec<RawRecord>, SourceError> {
    let mut all_records: Vec<RawRecord> = Vec::new();
    let mut offset: u64 = 0;
    let fetch_limit = options.limit.unwrap_or(u64::MAX);
    let page_size = options.page_size.unwrap_or(config.page_size).max(1);

    loop {
        let remaining = fetch_limit.saturating_sub(offset);
        if remaining == 0 {
            break;
        }
        let page_limit = remaining.min(page_size);
        let query = config.page_query(offset, page_limit);

        log::info!(
            "Fetching {} data: offset={offset}, limit={page_limit}",
            config.label
        );
        let body = retry::send_json(|| {
            let request = client.get(config.api_url).query(&query);
            match &options.app_token {
                Some(token) => request.header("X-App-Token", token),
                None => request,
            }
        })
        .await?;

        let records: Vec<RawRecord> = serde_json::from_value(body)?;
        let count = records.len() as u64;
        if count == 0 {
            break;
        }

        all_records.extend(records);
        offset += count;

        if count < page_limit {
            break;
        }
    }

    log::info!(
        "Downloaded {} {} rows total",
        all_records.len(),
        config.label
    );

    Ok(all_records)
}
