/// Map an App Store locale to the coarser tag used when no exact file exists.
///
/// `"no"` maps to `"nb"` since App Store Connect names Norwegian after the
/// macro language while translation files are usually named `nb`. Anything
/// else drops everything from the first `-` on. A tag without a separator
/// comes back unchanged.
pub fn fallback(tag: &str) -> String {
    if tag == "no" {
        return "nb".to_string();
    }

    match tag.split_once('-') {
        Some((language, _)) => language.to_string(),
        None => tag.to_string(),
    }
}
