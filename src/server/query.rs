//! # Query-String Parsing
//!
//! Translates REST query parameters into the access layer's options
//! contract. Reserved parameters: `page`, `limit`, `sort`, `lookup`,
//! `returnNew`; every other parameter is a filter condition, optionally
//! prefixed with an operator (`age=gt.18`).

use std::collections::HashMap;

use serde_json::Value;

use crate::access::{FetchOptions, LookupSpec, PageSpec};
use crate::errors::ErrorRecord;
use crate::store::{FilterDoc, FilterOp, SortKey};

/// Parse the full query map into fetch options
pub fn parse_fetch_options(params: &HashMap<String, String>) -> Result<FetchOptions, ErrorRecord> {
    let mut options = FetchOptions::default();
    let mut page = PageSpec::DEFAULT_PAGE;
    let mut limit = PageSpec::DEFAULT_LIMIT;
    let mut filter = FilterDoc::new();

    for (key, value) in params {
        match key.as_str() {
            "page" => page = parse_number(value, "page")?,
            "limit" => limit = parse_number(value, "limit")?,
            "sort" => options.sort = parse_sort(value)?,
            "lookup" => options.lookup = Some(parse_lookup(value)?),
            "returnNew" => {} // consumed by the update handler
            field => {
                let (op, value) = parse_condition(value);
                filter = match op {
                    Some(op) => filter.with(field, condition_value(op, value)),
                    None => filter.with(field, parse_scalar(value)),
                };
            }
        }
    }

    options.filter = filter;
    options.page = PageSpec::new(page, limit)
        .map_err(|_| ErrorRecord::bad_request("page and limit must both be at least 1"))?;
    Ok(options)
}

/// Parse the `returnNew` parameter; defaults to returning the new image
pub fn parse_return_new(params: &HashMap<String, String>) -> Result<bool, ErrorRecord> {
    match params.get("returnNew").map(String::as_str) {
        None => Ok(true),
        Some("true") => Ok(true),
        Some("false") => Ok(false),
        Some(other) => Err(ErrorRecord::bad_request(format!(
            "returnNew must be true or false, got {other}"
        ))),
    }
}

fn parse_number(value: &str, name: &str) -> Result<u64, ErrorRecord> {
    value
        .parse()
        .map_err(|_| ErrorRecord::bad_request(format!("{name} must be a positive integer")))
}

/// `sort=created_at.desc,name.asc`; direction defaults to ascending
fn parse_sort(value: &str) -> Result<Vec<SortKey>, ErrorRecord> {
    let mut keys = Vec::new();

    for part in value.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let key = match part.rsplit_once('.') {
            Some((field, "asc")) => SortKey::asc(field),
            Some((field, "desc")) => SortKey::desc(field),
            Some((_, direction)) => {
                return Err(ErrorRecord::bad_request(format!(
                    "invalid sort direction: {direction}"
                )))
            }
            None => SortKey::asc(part),
        };
        keys.push(key);
    }

    Ok(keys)
}

/// `lookup=local_field:from:foreign_field[:alias]`
fn parse_lookup(value: &str) -> Result<LookupSpec, ErrorRecord> {
    let parts: Vec<&str> = value.split(':').collect();
    match parts.as_slice() {
        [local, from, foreign] => Ok(LookupSpec::new(*local, *from, *foreign)),
        [local, from, foreign, alias] => {
            Ok(LookupSpec::new(*local, *from, *foreign).with_alias(*alias))
        }
        _ => Err(ErrorRecord::bad_request(
            "lookup must be local_field:from:foreign_field[:alias]",
        )),
    }
}

/// Split an operator prefix off a filter value: `gt.18` -> (Gt, "18")
fn parse_condition(value: &str) -> (Option<FilterOp>, &str) {
    if let Some((prefix, rest)) = value.split_once('.') {
        if let Some(op) = FilterOp::from_key(prefix) {
            return (Some(op), rest);
        }
    }
    (None, value)
}

fn condition_value(op: FilterOp, raw: &str) -> Value {
    let mut object = serde_json::Map::new();
    object.insert(op.as_str().to_string(), parse_scalar(raw));
    Value::Object(object)
}

/// Type a raw filter value: list, null, boolean, number, or string
fn parse_scalar(value: &str) -> Value {
    if let Some(inner) = value.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        let items = inner
            .split(',')
            .map(|item| Value::String(item.trim().to_string()))
            .collect();
        return Value::Array(items);
    }

    match value {
        "null" => return Value::Null,
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }

    if let Ok(n) = value.parse::<i64>() {
        return Value::Number(n.into());
    }
    if let Ok(n) = value.parse::<f64>() {
        if let Some(number) = serde_json::Number::from_f64(n) {
            return Value::Number(number);
        }
    }

    Value::String(value.to_string())
}
