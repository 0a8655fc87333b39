use crate::driver::PageElement;

/// Walks `selectors` in order and returns the first non-empty value that
/// `read` produces from a selector's first match.
///
/// Invalid selectors and empty reads fall through to the next selector, so a
/// misconfigured or stale selector degrades to "not found" instead of
/// failing the listing.
pub(crate) fn first_match<E, F>(node: &E, selectors: &[String], read: F) -> Option<String>
where
    E: PageElement,
    F: Fn(&E) -> Option<String>,
{
    selectors.iter().find_map(|selector| {
        let found = match node.find(selector) {
            Ok(found) => found?,
            Err(e) => {
                tracing::debug!(selector = %selector, error = %e, "selector skipped");
                return None;
            }
        };
        read(&found)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
    })
}
