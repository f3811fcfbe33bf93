//! URL path joining.

/// Join path parts with a single `/`.
///
/// Empty and blank parts are skipped, backslashes become `/` and runs of
/// separators collapse into one. A leading or trailing separator on the
/// outer parts survives, so `join_paths(&["/", "assets", "/"])` is `/assets/`.
pub fn join_paths(parts: &[&str]) -> String {
    let joined = parts
        .iter()
        .filter(|part| !part.trim().is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("/")
        .replace('\\', "/");

    let mut out = String::with_capacity(joined.len());
    let mut previous_slash = false;
    for c in joined.chars() {
        if c == '/' {
            if !previous_slash {
                out.push(c);
            }
            previous_slash = true;
        } else {
            out.push(c);
            previous_slash = false;
        }
    }
    out
}
