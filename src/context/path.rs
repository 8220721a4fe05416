//! Request path location.
//!
//! The path is located once per request: it starts at the first `/` after an
//! optional `scheme://authority` prefix and ends at the first `?`, or at the
//! end of the string. The asterisk-form target (`OPTIONS *`) is its own path.

use std::ops::Range;

/// Locate the path inside a request target as a half-open byte range.
///
/// Origin-form targets (`/users?id=1`) start at offset 0. Absolute-form targets
/// (`http://host/users?id=1`) skip the scheme and authority. When the target
/// carries no path the returned range is empty. The asterisk form (`*`) spans
/// the whole target.
pub fn locate(target: &str) -> Range<usize> {
    if target == "*" {
        return 0..1;
    }

    let start = if target.starts_with('/') {
        0
    } else {
        let authority = target.find("://").map_or(0, |i| i + 3);
        target[authority..]
            .find(|c| c == '/' || c == '?')
            .map_or(target.len(), |i| authority + i)
    };

    let end = target[start..].find('?').map_or(target.len(), |i| start + i);
    start..end
}

/// Materialize the located path. An empty path reads as the root.
pub fn materialize(target: &str, range: &Range<usize>) -> String {
    if range.is_empty() {
        "/".to_string()
    } else {
        target[range.clone()].to_string()
    }
}
