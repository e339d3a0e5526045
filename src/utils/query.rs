//! Query-string helpers.
//!
//! Both the catalog and the download endpoints authenticate through `token` and
//! `nsfw` query parameters.

use reqwest::Url;

/// Whether `url` already carries the query parameter `key`.
pub fn has_query_param(url: &Url, key: &str) -> bool {
    form_urlencoded::parse(url.query().unwrap_or_default().as_bytes()).any(|(k, _)| k == key)
}

/// Return a copy of `url` with the API token and the nsfw flag appended.
///
/// Parameters already present are left alone, so a continuation cursor that
/// already embeds the token is not duplicated.
pub fn with_auth(url: &Url, token: &str, nsfw: bool) -> Url {
    let mut url = url.clone();
    let add_token = !token.is_empty() && !has_query_param(&url, "token");
    let add_nsfw = nsfw && !has_query_param(&url, "nsfw");
    if add_token || add_nsfw {
        let mut pairs = url.query_pairs_mut();
        if add_token {
            pairs.append_pair("token", token);
        }
        if add_nsfw {
            pairs.append_pair("nsfw", "true");
        }
    }
    url
}

/// Render `url` for logs and failure records, with the token masked.
pub fn redacted(url: &Url) -> String {
    if !has_query_param(url, "token") {
        return url.to_string();
    }
    let mut url = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "token" { "***".into() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();
    url.query_pairs_mut().clear().extend_pairs(pairs);
    url.to_string()
}

/// Order-insensitive identity of a URL, used to spot repeated cursors.
pub fn cursor_key(url: &Url) -> String {
    let mut pairs: Vec<(String, String)> = form_urlencoded::parse(url.query().unwrap_or_default().as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    pairs.sort();
    let mut key = format!("{}://{}{}", url.scheme(), url.host_str().unwrap_or_default(), url.path());
    if let Some(port) = url.port() {
        key.push_str(&format!("#{port}"));
    }
    for (k, v) in pairs {
        key.push_str(&format!("&{k}={v}"));
    }
    key
}
