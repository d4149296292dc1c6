//! Root-relative rewriting of named path mappings.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::warn;

/// One auto-corrected path mapping, reported for visibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRewrite {
    pub name: String,
    pub from: String,
    pub to: String,
}

/// Rewrite named paths nested under `root` relative to it, in place.
///
/// Loader path mappings are expected to be relative to the base URL, but
/// configs assembled programmatically often carry absolute locations. Any
/// mapping whose value sits under `root + "/"` is corrected to the relative
/// form; the rewrite is non-fatal and each one is logged as a warning and
/// returned. Values equal to `root` itself, or outside it, are untouched.
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
/// use dray_config::relativize_named_paths;
///
/// let mut paths = BTreeMap::from([
///     ("root".to_string(), "/proj".to_string()),
///     ("foo".to_string(), "/proj/src".to_string()),
/// ]);
/// let rewrites = relativize_named_paths("/proj", &mut paths);
///
/// assert_eq!(paths["foo"], "src");
/// assert_eq!(paths["root"], "/proj");
/// assert_eq!(rewrites.len(), 1);
/// ```
pub fn relativize_named_paths(
    root: impl AsRef<Path>,
    paths: &mut BTreeMap<String, String>,
) -> Vec<PathRewrite> {
    let root = root.as_ref().to_string_lossy();
    let prefix = format!("{}/", root.trim_end_matches('/'));

    let mut rewrites = Vec::new();
    for (name, location) in paths.iter_mut() {
        if let Some(relative) = location.strip_prefix(&prefix) {
            let relative = relative.to_string();
            warn!(
                name = %name,
                from = %location,
                to = %relative,
                "path mapping nested under root rewritten relative to it"
            );
            rewrites.push(PathRewrite {
                name: name.clone(),
                from: location.clone(),
                to: relative.clone(),
            });
            *location = relative;
        }
    }
    rewrites
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn nested_absolute_path_becomes_relative() {
        let mut paths = mapping(&[("root", "/proj"), ("foo", "/proj/src")]);
        let rewrites = relativize_named_paths("/proj", &mut paths);

        assert_eq!(paths["foo"], "src");
        assert_eq!(paths["root"], "/proj");
        assert_eq!(
            rewrites,
            vec![PathRewrite {
                name: "foo".into(),
                from: "/proj/src".into(),
                to: "src".into(),
            }]
        );
    }

    #[test]
    fn already_relative_path_is_untouched() {
        let mut paths = mapping(&[("root", "/proj"), ("foo", "src")]);
        let rewrites = relativize_named_paths("/proj", &mut paths);

        assert_eq!(paths["foo"], "src");
        assert!(rewrites.is_empty());
    }

    #[test]
    fn path_outside_root_is_untouched() {
        let mut paths = mapping(&[("vendor", "/opt/vendor/lib")]);
        let rewrites = relativize_named_paths("/proj", &mut paths);

        assert_eq!(paths["vendor"], "/opt/vendor/lib");
        assert!(rewrites.is_empty());
    }

    #[test]
    fn trailing_slash_on_root_is_tolerated() {
        let mut paths = mapping(&[("deep", "/proj/a/b/c")]);
        let rewrites = relativize_named_paths("/proj/", &mut paths);

        assert_eq!(paths["deep"], "a/b/c");
        assert_eq!(rewrites.len(), 1);
    }
}
