//! Slash-separated key paths.
//!
//! Parameter keys are hierarchical (`/svc/db/port`). Every key the binder
//! requests or looks up goes through [`join`], so a record's prefix and its
//! fields' lookup names can be written with or without surrounding slashes.

/// Joins path elements with `/` and [`clean`]s the result.
///
/// Empty elements are ignored. If every element is empty, the result is the
/// empty string.
///
/// ```
/// use parambind::path::join;
///
/// assert_eq!(join(["/svc/", "/db/port"]), "/svc/db/port");
/// assert_eq!(join(["/svc", ""]), "/svc");
/// assert_eq!(join(["", ""]), "");
/// ```
pub fn join<'a>(elements: impl IntoIterator<Item = &'a str>) -> String {
    let mut joined = String::new();
    for element in elements.into_iter().filter(|e| !e.is_empty()) {
        if !joined.is_empty() {
            joined.push('/');
        }
        joined.push_str(element);
    }

    if joined.is_empty() {
        joined
    } else {
        clean(&joined)
    }
}

/// Returns the shortest path equivalent to `path`.
///
/// Repeated slashes collapse into one, `.` elements are dropped, `..`
/// elements remove the element before them (or are dropped at the root), and
/// trailing slashes are removed except for the root itself. An empty result
/// becomes `.` for relative paths and `/` for rooted ones.
pub fn clean(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ if rooted => {}
                _ => segments.push(".."),
            },
            _ => segments.push(segment),
        }
    }

    let body = segments.join("/");
    match (rooted, body.is_empty()) {
        (true, _) => format!("/{body}"),
        (false, true) => ".".to_owned(),
        (false, false) => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[parambind_testhelpers::test]
    fn separators_around_elements_do_not_matter() {
        assert_eq!(join(["/a/", "b"]), join(["/a", "/b"]));
        assert_eq!(join(["/a/", "b"]), "/a/b");
        assert_eq!(join(["/base/", "/strings/s1"]), "/base/strings/s1");
        assert_eq!(join(["base", "port"]), "base/port");
    }

    #[parambind_testhelpers::test]
    fn empty_elements_are_ignored() {
        assert_eq!(join(["", "/svc/name"]), "/svc/name");
        assert_eq!(join(["/svc", ""]), "/svc");
        assert_eq!(join(["", ""]), "");
        assert_eq!(join(core::iter::empty()), "");
    }

    #[parambind_testhelpers::test]
    fn clean_resolves_dots() {
        let cases = [
            ("", "."),
            ("/", "/"),
            ("//a//b//", "/a/b"),
            ("/a/./b", "/a/b"),
            ("/a/b/../c", "/a/c"),
            ("/../a", "/a"),
            ("a/..", "."),
            ("../../a", "../../a"),
            ("a/../../b", "../b"),
        ];
        for (input, expected) in cases {
            assert_eq!(clean(input), expected, "clean({input:?})");
        }
    }

    #[parambind_testhelpers::test]
    fn join_cleans_the_result() {
        assert_eq!(join(["/svc/db", "../cache/ttl"]), "/svc/cache/ttl");
        assert_eq!(join(["/svc", "."]), "/svc");
    }
}
