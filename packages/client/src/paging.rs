use serde_json::{Map, Value};

use crate::error::Error;
use crate::types::Payload;

/// Follow `paging.next` links from `first`, merging every page's `data`.
///
/// `fetch_next` is called with each continuation URL in turn. The returned
/// object is `first` without its `paging` block, with `data` replaced by the
/// merged array when that is non-empty and `pages_seen` always set.
///
/// If a follow-up page fails with an API error, the data collected so far
/// and the page count travel on the error.
pub(crate) fn aggregate_pages<F>(
    mut first: Map<String, Value>,
    mut fetch_next: F,
) -> Result<Map<String, Value>, Error>
where
    F: FnMut(&str) -> Result<Payload, Error>,
{
    let mut data = page_data(&first);
    let mut pages_seen: u32 = 1;
    let mut next_url = next_page_url(&first);
    first.remove("paging");

    while let Some(url) = next_url {
        let page = match fetch_next(&url) {
            Ok(page) => page,
            Err(Error::Api(e)) => return Err(e.with_partial(data, pages_seen).into()),
            Err(e) => return Err(e),
        };
        let page = page.as_object();
        data.extend(page.map(page_data).unwrap_or_default());
        pages_seen += 1;
        next_url = page.and_then(next_page_url);
    }

    if !data.is_empty() {
        first.insert("data".to_string(), Value::Array(data));
    }
    first.insert("pages_seen".to_string(), Value::from(pages_seen));
    Ok(first)
}

fn page_data(page: &Map<String, Value>) -> Vec<Value> {
    match page.get("data") {
        Some(Value::Array(items)) => items.clone(),
        _ => Vec::new(),
    }
}

fn next_page_url(page: &Map<String, Value>) -> Option<String> {
    page.get("paging")?
        .get("next")?
        .as_str()
        .filter(|url| !url.is_empty())
        .map(str::to_owned)
}
