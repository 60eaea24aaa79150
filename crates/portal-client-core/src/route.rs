use std::borrow::Cow;

pub const BILLING_OVERVIEW_PATH: &str = "/billing";
pub const DASHBOARD_PATH: &str = "/dashboard";
pub const CAPTURE_RETURN_PATH: &str = "/billing/return";
pub const CAPTURE_RETURN_PATH_ALIAS: &str = "/billing/capture";
pub const CONSOLE_PATH_PREFIX: &str = "/console";

pub const TOKEN_QUERY_KEY: &str = "token";
pub const LABEL_QUERY_KEY: &str = "label";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellRoute {
    CaptureReturn,
    Console { session_id: Option<String> },
    BillingOverview,
    Dashboard,
    NotFound { path: String },
}

impl ShellRoute {
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        let trimmed = path.trim();
        let normalized = if trimmed.len() > 1 {
            trimmed.trim_end_matches('/')
        } else {
            trimmed
        };

        match normalized {
            BILLING_OVERVIEW_PATH => return Self::BillingOverview,
            DASHBOARD_PATH => return Self::Dashboard,
            CAPTURE_RETURN_PATH | CAPTURE_RETURN_PATH_ALIAS => return Self::CaptureReturn,
            CONSOLE_PATH_PREFIX => return Self::Console { session_id: None },
            _ => {}
        }

        if let Some(rest) = normalized
            .strip_prefix(CONSOLE_PATH_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))
        {
            let segment = rest.split('/').next().unwrap_or_default();
            let session_id = decode_path_segment(segment);
            let session_id = session_id.trim();
            return Self::Console {
                session_id: (!session_id.is_empty()).then(|| session_id.to_string()),
            };
        }

        Self::NotFound {
            path: normalized.to_string(),
        }
    }

    #[must_use]
    pub fn to_path(&self) -> String {
        match self {
            Self::CaptureReturn => CAPTURE_RETURN_PATH.to_string(),
            Self::Console {
                session_id: Some(session_id),
            } => format!(
                "{CONSOLE_PATH_PREFIX}/{}",
                urlencoding::encode(session_id.as_str())
            ),
            Self::Console { session_id: None } => CONSOLE_PATH_PREFIX.to_string(),
            Self::BillingOverview => BILLING_OVERVIEW_PATH.to_string(),
            Self::Dashboard => DASHBOARD_PATH.to_string(),
            Self::NotFound { path } => path.clone(),
        }
    }
}

/// Query string parsed the way a browser `URLSearchParams` reads it: `+` is a
/// space and malformed escapes are kept literally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    #[must_use]
    pub fn parse(query: &str) -> Self {
        let query = query.trim();
        let query = query.strip_prefix('?').unwrap_or(query);
        let pairs = query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                (
                    decode_component_lossy(key).into_owned(),
                    decode_component_lossy(value).into_owned(),
                )
            })
            .collect();
        Self { pairs }
    }

    /// First value for `key`, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, value)| value.as_str())
    }

    /// First value for `key` with surrounding whitespace removed; empty values
    /// count as absent.
    #[must_use]
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Strict percent-decoding of a display label.
///
/// A `%` that is not followed by two hex digits, or escapes that decode to
/// invalid UTF-8, make the whole decode fail; the raw input is returned
/// unchanged in that case. This never errors.
#[must_use]
pub fn decode_label(raw: &str) -> String {
    if !has_well_formed_escapes(raw) {
        tracing::debug!(label = raw, "label has malformed escapes, using raw value");
        return raw.to_string();
    }
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(error) => {
            tracing::debug!(label = raw, error = %error, "label decode failed, using raw value");
            raw.to_string()
        }
    }
}

fn has_well_formed_escapes(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    let mut index = 0usize;
    while index < bytes.len() {
        if bytes[index] == b'%' {
            let Some(escape) = bytes.get(index + 1..index + 3) else {
                return false;
            };
            if !escape.iter().all(u8::is_ascii_hexdigit) {
                return false;
            }
            index += 3;
        } else {
            index += 1;
        }
    }
    true
}

/// Path segments keep `+` literally.
fn decode_path_segment(raw: &str) -> Cow<'_, str> {
    if !raw.contains('%') {
        return Cow::Borrowed(raw);
    }
    let decoded = urlencoding::decode_binary(raw.as_bytes());
    Cow::Owned(String::from_utf8_lossy(&decoded).into_owned())
}

fn decode_component_lossy(raw: &str) -> Cow<'_, str> {
    if !raw.contains(['%', '+']) {
        return Cow::Borrowed(raw);
    }
    let spaced = raw.replace('+', " ");
    let decoded = urlencoding::decode_binary(spaced.as_bytes());
    Cow::Owned(String::from_utf8_lossy(&decoded).into_owned())
}
