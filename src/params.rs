//! `application/x-www-form-urlencoded` decoding, shared by query strings
//! and form bodies, and the merge of both into request parameters.

use std::collections::HashMap;

use percent_encoding::percent_decode_str;


/// Name to every value it was given, in order.
pub type MultiParams = HashMap<String, Vec<String>>;

/// Name to the last value it was given.
pub type FormParams = HashMap<String, String>;


fn plus_to_space(raw: &str) -> String {
    raw.replace('+', " ")
}

/// `None` when the decoded bytes are not UTF-8.
fn decode_name(raw: &str) -> Option<String> {
    percent_decode_str(&plus_to_space(raw))
        .decode_utf8()
        .ok()
        .map(|name| name.into_owned())
}

fn decode_value(raw: &str) -> String {
    percent_decode_str(&plus_to_space(raw))
        .decode_utf8_lossy()
        .into_owned()
}

/// Splits `a=1&b=2&flag` into decoded pairs.
///
/// A token without `=` gets an empty value. Tokens whose name is empty
/// or does not decode are skipped, the others are still returned.
pub fn decode_pairs(source: &str) -> impl Iterator<Item = (String, String)> + '_ {
    source.split('&').filter_map(|token| {
        let (raw_name, raw_value) = token.split_once('=').unwrap_or((token, ""));
        match decode_name(raw_name) {
            Some(name) if !name.is_empty() => Some((name, decode_value(raw_value))),
            _ => {
                if !token.is_empty() {
                    tracing::trace!(token, "skipping parameter with an undecodable name");
                }
                None
            }
        }
    })
}

/// Query parameters; repeated names keep all their values.
pub fn parse_query(query: Option<&str>) -> MultiParams {
    let mut params = MultiParams::new();
    if let Some(query) = query {
        for (name, value) in decode_pairs(query) {
            params.entry(name).or_default().push(value);
        }
    }
    params
}

/// Form parameters from a form-url-encoded body; the last value wins.
pub fn parse_form(body: &[u8]) -> FormParams {
    let source = String::from_utf8_lossy(body);
    decode_pairs(&source).collect()
}

/// Request parameters: form values, replaced name by name by query values.
///
/// A name present in both keeps only its query values.
pub fn merge_parameters(form: &FormParams, query: &MultiParams) -> MultiParams {
    let mut merged: MultiParams = form
        .iter()
        .map(|(name, value)| (name.clone(), vec![value.clone()]))
        .collect();
    merged.extend(query.iter().map(|(name, values)| (name.clone(), values.clone())));
    merged
}
