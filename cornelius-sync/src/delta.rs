//! Net-new / changed detection between a source listing and a destination
//! listing.
//!
//! A source object is selected when:
//! 1. it is transferable (non-empty and within [`FILE_SIZE_LIMIT`]), and
//! 2. no destination file exists at `join(root, key)`, or
//! 3. its timestamp is strictly later than that destination file's.
//!
//! Equal timestamps count as already synced.
//!
//! [`FILE_SIZE_LIMIT`]: crate::model::FILE_SIZE_LIMIT

use std::collections::{HashMap, HashSet};

use crate::model::{DestinationObject, SourceObject};

/// Select the source objects that must be transferred this cycle.
///
/// Pure and deterministic: neither input is modified and no I/O happens.
/// Callers must treat the result as a set; its order is unspecified.
pub fn compute_delta(
    source: &[SourceObject],
    destination: &[DestinationObject],
    root: &str,
) -> Vec<SourceObject> {
    let existing: HashMap<String, &DestinationObject> = destination
        .iter()
        .map(|object| (normalize_path(&object.path), object))
        .collect();

    let mut seen: HashSet<&str> = HashSet::new();
    let mut delta = Vec::new();
    for object in source {
        if !object.is_transferable() || !seen.insert(object.key.as_str()) {
            continue;
        }
        let candidate = join_logical_path(root, &object.key);
        let needed = match existing.get(&candidate) {
            None => true,
            Some(found) => object.last_modified > found.last_modified,
        };
        if needed {
            delta.push(object.clone());
        }
    }
    delta
}

/// Compose the destination path a source key is expected to land at.
///
/// Separators are collapsed and `.` segments dropped, so `("/root/", "/a//b")`
/// and `("/root", "a/b")` both give `/root/a/b`.
pub fn join_logical_path(root: &str, key: &str) -> String {
    normalize_path(&format!("{root}/{key}"))
}

fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect();
    format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};

    use super::*;
    use crate::model::FILE_SIZE_LIMIT;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn src(key: &str, t: i64) -> SourceObject {
        SourceObject {
            key: key.into(),
            last_modified: at(t),
            content_type: None,
            size: 10,
        }
    }

    fn dst(path: &str, t: i64) -> DestinationObject {
        DestinationObject {
            path: path.into(),
            last_modified: at(t),
            content_type: None,
        }
    }

    fn keys(delta: &[SourceObject]) -> Vec<&str> {
        let mut keys: Vec<&str> = delta.iter().map(|o| o.key.as_str()).collect();
        keys.sort_unstable();
        keys
    }

    #[test]
    fn everything_is_new_against_an_empty_destination() {
        let delta = compute_delta(&[src("a", 10), src("b", 5)], &[], "/root");
        assert_eq!(keys(&delta), vec!["a", "b"]);
    }

    #[test]
    fn newer_source_is_selected() {
        let delta = compute_delta(&[src("a", 10)], &[dst("/root/a", 5)], "/root");
        assert_eq!(keys(&delta), vec!["a"]);
    }

    #[test]
    fn older_or_equal_source_is_skipped() {
        assert!(compute_delta(&[src("a", 5)], &[dst("/root/a", 10)], "/root").is_empty());
        assert!(compute_delta(&[src("a", 7)], &[dst("/root/a", 7)], "/root").is_empty());
    }

    #[test]
    fn paths_outside_the_root_do_not_match() {
        let delta = compute_delta(&[src("a", 5)], &[dst("/other/a", 10)], "/root");
        assert_eq!(keys(&delta), vec!["a"]);
    }

    #[test]
    fn nested_keys_compose_under_the_root() {
        let delta = compute_delta(
            &[src("site/css/app.css", 5), src("site/index.html", 5)],
            &[dst("/Drive/site/css/app.css", 9)],
            "/Drive",
        );
        assert_eq!(keys(&delta), vec!["site/index.html"]);
    }

    #[test]
    fn untransferable_sizes_never_appear() {
        let mut empty = src("empty", 99);
        empty.size = 0;
        let mut huge = src("huge", 99);
        huge.size = FILE_SIZE_LIMIT + 1;
        let delta = compute_delta(&[empty, huge, src("ok", 1)], &[], "/root");
        assert_eq!(keys(&delta), vec!["ok"]);
    }

    #[test]
    fn inputs_are_not_modified() {
        let source = vec![src("a", 10), src("b", 1)];
        let destination = vec![dst("/root/b", 2)];
        let (s_before, d_before) = (source.clone(), destination.clone());
        let _ = compute_delta(&source, &destination, "/root");
        assert_eq!(source, s_before);
        assert_eq!(destination, d_before);
    }

    #[test]
    fn permuting_inputs_gives_the_same_set() {
        let source = vec![src("a", 10), src("b", 1), src("c", 4), src("d", 8)];
        let destination = vec![dst("/r/a", 10), dst("/r/b", 0), dst("/r/d", 9)];

        let forward = compute_delta(&source, &destination, "/r");
        let mut rs = source.clone();
        rs.reverse();
        let mut rd = destination.clone();
        rd.reverse();
        let backward = compute_delta(&rs, &rd, "/r");

        assert_eq!(keys(&forward), keys(&backward));
        assert_eq!(keys(&forward), vec!["b", "c"]);
        assert_eq!(keys(&compute_delta(&source, &destination, "/r")), keys(&forward));
    }

    #[test]
    fn join_normalizes_separators() {
        assert_eq!(join_logical_path("/root", "a"), "/root/a");
        assert_eq!(join_logical_path("/root/", "/a//b"), "/root/a/b");
        assert_eq!(join_logical_path("/root", "./a"), "/root/a");
    }

    #[test]
    fn destination_paths_are_normalized_before_lookup() {
        let delta = compute_delta(&[src("a", 5)], &[dst("/root//a", 10)], "/root/");
        assert!(delta.is_empty());
    }
}
