use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

const MAX_API_ERROR_CHARS: usize = 200;

/// Bare key prefixes: the whole token is the secret.
static PREFIXED_TOKEN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?:sk-|sk_|ghp_|gho_|github_pat_|xox[bpsa]-|hf_|glpat-|AIza|AKIA|eyJ)[A-Za-z0-9._\-+/=:]+")
        .ok()
});

/// Header/query/json markers: the value after the marker is the secret.
static MARKED_VALUE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)(authorization:\s*bearer\s+|"authorization"\s*:\s*"bearer\s+|api_key=|access_token=|refresh_token=|"(?:api_key|access_token|refresh_token|token|secret|password)"\s*:\s*")[A-Za-z0-9._\-+/=:]+"#,
    )
    .ok()
});

/// Scrub known secret-like token patterns from generator error strings.
pub fn scrub_secret_patterns(input: &str) -> Cow<'_, str> {
    let mut output = Cow::Borrowed(input);

    if let Some(marked) = MARKED_VALUE.as_ref()
        && marked.is_match(&output)
    {
        output = Cow::Owned(marked.replace_all(&output, "${1}[REDACTED]").into_owned());
    }

    if let Some(prefixed) = PREFIXED_TOKEN.as_ref()
        && prefixed.is_match(&output)
    {
        output = Cow::Owned(prefixed.replace_all(&output, "[REDACTED]").into_owned());
    }

    output
}

/// Sanitize API error text by scrubbing secrets and truncating length.
pub fn sanitize_api_error(input: &str) -> String {
    let scrubbed = scrub_secret_patterns(input);

    match scrubbed.char_indices().nth(MAX_API_ERROR_CHARS) {
        Some((idx, _)) => format!("{}...", &scrubbed[..idx]),
        None => scrubbed.into_owned(),
    }
}
