//! Cache key derivation.

use std::borrow::Cow;

use crate::scope::CredentialScope;

/// Region used when a scope carries none.
pub const DEFAULT_REGION: &str = "NA";

const SEPARATOR: char = '|';

/// Compose `"{environment_id}|{client_id}|{region}"`.
///
/// Never fails. An absent region and `"NA"` produce the same key. Inside each
/// component `%` becomes `%25` and `|` becomes `%7C`, so ids without those
/// characters appear verbatim.
pub(crate) fn compose_key(scope: &CredentialScope) -> String {
    let region = scope.region.as_deref().unwrap_or(DEFAULT_REGION);
    format!(
        "{}{SEPARATOR}{}{SEPARATOR}{}",
        escape(&scope.environment_id),
        escape(&scope.client_id),
        escape(region)
    )
}

fn escape(component: &str) -> Cow<'_, str> {
    if !component.contains(['%', SEPARATOR]) {
        return Cow::Borrowed(component);
    }
    Cow::Owned(component.replace('%', "%25").replace(SEPARATOR, "%7C"))
}
