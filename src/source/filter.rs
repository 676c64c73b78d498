//! Location filtering.

use lsp_types::Location;
use once_cell::sync::Lazy;
use regex::Regex;

/// Deno virtual documents whose URI carries a percent-encoded fragment
/// starting with `^`, `~`, `<` or `=` (denoland/deno#19304). Navigating to
/// them fails, so they are dropped.
static DENO_FRAGMENT_URI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^deno:.*%23(%5E|%7E|%3C|%3D)").expect("Invalid deno fragment regex")
});

/// Whether a location must be dropped before it becomes an item.
pub fn is_excluded(location: &Location) -> bool {
    DENO_FRAGMENT_URI.is_match(location.uri.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsp_types::{Range, Url};

    fn location(uri: &str) -> Location {
        Location {
            uri: Url::parse(uri).unwrap(),
            range: Range::default(),
        }
    }

    #[test]
    fn test_sentinel_fragments_excluded() {
        for sentinel in ["%5E", "%7E", "%3C", "%3D"] {
            let uri = format!("deno:/https/deno.land/x/mod.ts%23{sentinel}1.0.0");
            assert!(is_excluded(&location(&uri)), "{uri} should be excluded");
        }
    }

    #[test]
    fn test_other_uris_kept() {
        assert!(!is_excluded(&location("deno:/https/deno.land/x/mod.ts")));
        assert!(!is_excluded(&location("deno:/https/deno.land/x/mod.ts%23main")));
        assert!(!is_excluded(&location("file:///tmp/%23%5E.ts")));
    }
}
