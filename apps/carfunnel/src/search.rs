//! # Listing Search URL
//!
//! Turns the funnel's selections into the car listing query the search
//! form submits, e.g. `/cars_list/?make=honda&model=civic`.

use carfunnel_core::{FunnelError, StageDescriptor};
use reqwest::Url;

/// Listing page path on the backend.
pub const LISTING_PATH: &str = "/cars_list/";

/// Build the listing URL for `selections` (funnel order, selected stages only).
pub fn search_url(
    base_url: &str,
    selections: &[(&'static StageDescriptor, &str)],
) -> Result<Url, FunnelError> {
    let listing = format!("{}{}", base_url.trim_end_matches('/'), LISTING_PATH);
    let pairs = selections.iter().map(|(d, v)| (d.search_param, *v));

    let mut url = Url::parse_with_params(&listing, pairs)
        .map_err(|e| FunnelError::Config(format!("Invalid backend URL '{}': {}", base_url, e)))?;
    if url.query() == Some("") {
        url.set_query(None);
    }
    Ok(url)
}
