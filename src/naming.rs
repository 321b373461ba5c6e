// Default names for auto-generated entities ("Track 1", "Clip 3", ...)

/// Returns `"{prefix} {n}"` for the smallest `n >= 1` that `taken` reports as
/// free.
///
/// `taken` is the caller's uniqueness query over its own collection.
///
/// # Example
/// ```
/// use dawg_history::naming::unique_name;
///
/// let tracks = ["Track 1", "Track 2"];
/// let name = unique_name("Track", |candidate| tracks.contains(&candidate));
/// assert_eq!(name, "Track 3");
/// ```
pub fn unique_name(prefix: &str, taken: impl Fn(&str) -> bool) -> String {
    (1..)
        .map(|n| format!("{} {}", prefix, n))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| prefix.to_string())
}
