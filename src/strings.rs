//! English UI strings.

const STRINGS: &[(&str, &str)] = &[
    ("keyword", "Search Term"),
    ("pluginname", "Open Clipart"),
    ("pluginname_help", "A Open Clipart repository"),
    ("openclipart:view", "View Open Clipart repository"),
    ("configplugin", "Open Clipart Repository Configuration"),
    ("recent", "Recent"),
    ("imageheight", "Height of clipart images"),
    (
        "imageheight_help",
        "This is the height of the selected images in pixels - default is {$a}px.",
    ),
    ("maxfiles", "Maximum number of images"),
    (
        "maxfiles_help",
        "Maximum number of images to return from searches - default is {$a}.",
    ),
];

/// Look up `key`, substituting `{$a}` with `a` when given.
/// Unknown keys render as `[[key]]` so they stand out in the UI.
pub fn get_string(key: &str, a: Option<&str>) -> String {
    match STRINGS.iter().find(|(k, _)| *k == key) {
        Some((_, text)) => match a {
            Some(a) => text.replace("{$a}", a),
            None => (*text).to_string(),
        },
        None => format!("[[{}]]", key),
    }
}
