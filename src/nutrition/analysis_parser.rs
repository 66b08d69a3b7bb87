// ABOUTME: Cleans generative model output and normalizes it into a structured food analysis
// ABOUTME: Strips code fences or leading labels, parses JSON and coerces list fields to arrays
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Model output normalization
//!
//! Models asked for JSON often wrap it in a fenced block, prefix it with a
//! label or return list fields as a single bulleted string. [`clean_and_parse`]
//! recovers the JSON object when there is one and guarantees that `risks`,
//! `warnings` and `recommendations` are arrays and that `summary`,
//! `dietSuitability` and `disclaimer` are present.

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::LazyLock;

/// Fenced block with an optional language tag
static FENCE_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?is)```(?:json|js|javascript)?\s*(.*?)\s*```").ok()
});

/// Line breaks, bullets, dashes and semicolons separating list items
static LIST_SEPARATOR_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\r?\n|[\x{2022}\-\x{2013}\x{2014}]\s*|;\s*").ok());

/// Text fields trimmed during normalization
const TEXT_FIELDS: &[&str] = &["summary", "dietSuitability", "disclaimer"];

/// List fields and the alternative keys models use for them
const LIST_FIELDS: &[(&str, &[&str])] = &[
    ("risks", &["risks", "risk", "Risks"]),
    ("warnings", &["warnings", "warning", "Warnings"]),
    (
        "recommendations",
        &["recommendations", "recs", "recommendation"],
    ),
];

/// Result of cleaning a model answer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParsedAnalysis {
    /// A JSON object with normalized fields
    Structured(Map<String, Value>),
    /// Valid JSON that is not an object, returned unchanged
    Raw(Value),
    /// Text that could not be parsed, after cleanup
    Text(String),
}

impl ParsedAnalysis {
    /// The normalized object, if the answer contained one
    #[must_use]
    pub const fn as_object(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Structured(map) => Some(map),
            _ => None,
        }
    }

    /// Convert into a JSON value for responses and storage
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Structured(map) => Value::Object(map),
            Self::Raw(value) => value,
            Self::Text(text) => Value::String(text),
        }
    }
}

/// Clean a model answer and parse it into a normalized analysis
#[must_use]
pub fn clean_and_parse(analysis_text: &str) -> ParsedAnalysis {
    let text = extract_payload(&analysis_text.replace('\r', ""));

    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(map)) => ParsedAnalysis::Structured(normalize_object(map)),
        Ok(other) => ParsedAnalysis::Raw(other),
        Err(_) => ParsedAnalysis::Text(text),
    }
}

/// Normalize an answer the model already returned as structured JSON
#[must_use]
pub fn normalize_value(value: Value) -> ParsedAnalysis {
    match value {
        Value::Object(map) => ParsedAnalysis::Structured(normalize_object(map)),
        Value::String(text) => clean_and_parse(&text),
        other => ParsedAnalysis::Raw(other),
    }
}

/// Take the fenced block body, or the outermost braces, or the trimmed text
fn extract_payload(text: &str) -> String {
    let text = text.trim();

    let fenced = FENCE_PATTERN
        .as_ref()
        .and_then(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|body| !body.is_empty());
    if let Some(body) = fenced {
        return body.to_owned();
    }

    match (text.find('{'), text.rfind('}')) {
        (Some(first), Some(last)) if last > first => text[first..=last].trim().to_owned(),
        _ => text.to_owned(),
    }
}

fn normalize_object(mut map: Map<String, Value>) -> Map<String, Value> {
    for field in TEXT_FIELDS {
        let normalized = match map.get(*field) {
            Some(Value::String(s)) => Value::String(s.trim().to_owned()),
            Some(Value::Null) | None => Value::String(String::new()),
            Some(other) => other.clone(),
        };
        map.insert((*field).to_owned(), normalized);
    }

    for (field, aliases) in LIST_FIELDS {
        let source = aliases
            .iter()
            .find_map(|alias| map.get(*alias).filter(|v| !v.is_null()))
            .cloned()
            .unwrap_or(Value::Null);
        map.insert((*field).to_owned(), Value::Array(to_list(&source)));
    }

    map
}

/// Coerce a field to a list of items
fn to_list(value: &Value) -> Vec<Value> {
    match value {
        Value::Null | Value::Bool(false) => Vec::new(),
        Value::String(s) if s.is_empty() => Vec::new(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Value::String(s.trim().to_owned()),
                other => other.clone(),
            })
            .collect(),
        Value::String(s) => split_list(s).into_iter().map(Value::String).collect(),
        Value::Number(n) => vec![Value::String(n.to_string())],
        other => vec![Value::String(other.to_string())],
    }
}

/// Split a single string into list items, preferring bullets and line breaks over commas
fn split_list(text: &str) -> Vec<String> {
    let non_empty = |parts: Vec<&str>| -> Vec<String> {
        parts
            .into_iter()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_owned)
            .collect()
    };

    if let Some(re) = LIST_SEPARATOR_PATTERN.as_ref() {
        let parts = non_empty(re.split(text).collect());
        if parts.len() > 1 {
            return parts;
        }
    }

    let parts = non_empty(text.split(',').collect());
    if parts.len() > 1 {
        return parts;
    }

    vec![text.trim().to_owned()]
}
