//! Bearer token lookup. Acquiring and storing tokens happens elsewhere; this
//! only reads what the user already has.

/// `--token` wins, then the configured environment variable. Blank values count as absent.
pub fn resolve_token(flag: Option<String>, token_env: &str) -> Option<String> {
    resolve_token_with(flag, token_env, |name| std::env::var(name).ok())
}

fn resolve_token_with(
    flag: Option<String>,
    token_env: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Option<String> {
    flag.or_else(|| lookup(token_env))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}
