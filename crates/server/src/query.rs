//! Query-string parsing with parse-or-default semantics.
//!
//! Every numeric parameter follows the same rule: an unparseable or
//! out-of-range value is logged and replaced by the configured default, never
//! rejected. Only a missing url fails a request. Keys are matched
//! case-insensitively; `force` is presence-based.

use std::collections::HashMap;

use webshot_core::CaptureRequest;
use webshot_core::config::CaptureDefaults;

/// Resolve raw query parameters into a capture request.
pub fn parse_request(params: &HashMap<String, String>, defaults: &CaptureDefaults) -> CaptureRequest {
    let params: HashMap<String, &str> = params
        .iter()
        .map(|(key, value)| (key.to_ascii_lowercase(), value.as_str()))
        .collect();

    CaptureRequest {
        url: params.get("url").map(|url| (*url).to_string()).unwrap_or_default(),
        width: positive(&params, "width", defaults.width),
        height: positive(&params, "height", defaults.height),
        scale: positive_float(&params, "scale", defaults.scale),
        quality: positive(&params, "quality", defaults.quality),
        wait_ms: positive(&params, "wait", defaults.wait_ms),
        wait_for_idle: flag(&params, "waitforidle"),
        timeout_ms: positive(&params, "timeout", defaults.timeout_ms),
        max_age_secs: non_negative(&params, "maxage", defaults.max_age_secs),
        force: params.contains_key("force"),
    }
}

/// Parse a positive integer, falling back to `default` on anything else.
fn positive<T>(params: &HashMap<String, &str>, name: &str, default: T) -> T
where
    T: std::str::FromStr + PartialOrd + From<u8>,
{
    let Some(raw) = params.get(name) else {
        return default;
    };
    match raw.parse::<T>() {
        Ok(value) if value > T::from(0u8) => value,
        _ => {
            tracing::warn!(field = name, value = raw, "not a positive integer, falling back to default");
            default
        }
    }
}

/// Parse a non-negative integer; zero is a meaningful value here ("never expire").
fn non_negative(params: &HashMap<String, &str>, name: &str, default: u64) -> u64 {
    let Some(raw) = params.get(name) else {
        return default;
    };
    match raw.parse::<u64>() {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!(field = name, value = raw, "not a non-negative integer, falling back to default");
            default
        }
    }
}

/// Parse a positive float, falling back to `default` on anything else.
fn positive_float(params: &HashMap<String, &str>, name: &str, default: f64) -> f64 {
    let Some(raw) = params.get(name) else {
        return default;
    };
    match raw.parse::<f64>() {
        Ok(value) if value > 0.0 && value.is_finite() => value,
        _ => {
            tracing::warn!(field = name, value = raw, "not a positive float, falling back to default");
            default
        }
    }
}

/// Boolean parameter: a bare key counts as true, otherwise the value decides.
fn flag(params: &HashMap<String, &str>, name: &str) -> bool {
    match params.get(name) {
        None => false,
        Some(&"") => true,
        Some(raw) => match raw.parse::<bool>() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(field = name, value = raw, "not a boolean, falling back to default");
                false
            }
        },
    }
}
