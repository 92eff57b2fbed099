//! Steam library discovery.
//!
//! Reads `steamapps/libraryfolders.vdf` to find every library root, then
//! parses the `appmanifest_*.acf` files in each root into [`Package`]s.
//! Unreadable or incomplete manifests are skipped with a warning.

use anyhow::{Context, Result};
use globset::{Glob, GlobMatcher};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

use crate::models::Package;

/// Legacy `"1"  "D:\\Games"` entries and current `"path"  "D:\\Games"` entries.
static LIBRARY_ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*"(?:\d+|path)"\s+"(.+)"\s*$"#).expect("library entry pattern is valid")
});
static APPID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""appid"\s+"(\d+)""#).expect("appid pattern is valid"));
static NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""name"\s+"([^"]+)""#).expect("name pattern is valid"));
static INSTALLDIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""installdir"\s+"([^"]+)""#).expect("installdir pattern is valid")
});

/// Fields read from one app manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub app_id: String,
    pub name: String,
    pub install_dir: String,
}

/// Returns every `steamapps` directory: the Steam install's own first, then
/// one per library listed in `libraryfolders.vdf`, without duplicates.
pub fn library_roots(steam_path: &Path) -> Vec<PathBuf> {
    let primary = steam_path.join("steamapps");
    let vdf = primary.join("libraryfolders.vdf");
    let mut roots = vec![primary];

    match std::fs::read_to_string(&vdf) {
        Ok(content) => {
            for lib in parse_library_folders(&content) {
                let root = PathBuf::from(lib).join("steamapps");
                if !roots.contains(&root) {
                    roots.push(root);
                }
            }
        }
        Err(e) => {
            tracing::warn!(path = %vdf.display(), "could not read libraryfolders.vdf: {}", e);
        }
    }
    roots
}

/// Extracts library paths from `libraryfolders.vdf` content, unescaping
/// doubled backslashes.
pub fn parse_library_folders(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|line| LIBRARY_ENTRY.captures(line))
        .map(|caps| caps[1].replace("\\\\", "\\"))
        // `"apps"` blocks also use numeric keys; only paths have separators.
        .filter(|value| value.contains('/') || value.contains('\\'))
        .collect()
}

/// Parses the three required fields of an `.acf` manifest.
pub fn parse_manifest(content: &str) -> Option<ManifestEntry> {
    Some(ManifestEntry {
        app_id: APPID.captures(content)?[1].to_string(),
        name: NAME.captures(content)?[1].to_string(),
        install_dir: INSTALLDIR.captures(content)?[1].to_string(),
    })
}

/// Collects installed packages from every root, in root order and then
/// manifest file-name order.
pub fn installed_packages(roots: &[PathBuf]) -> Result<Vec<Package>> {
    let matcher = manifest_matcher()?;
    let mut packages = Vec::new();

    for root in roots {
        let entries = match std::fs::read_dir(root) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(root = %root.display(), "skipping library: {}", e);
                continue;
            }
        };

        let mut manifests: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.is_file()
                    && p.file_name()
                        .map(|n| matcher.is_match(Path::new(n)))
                        .unwrap_or(false)
            })
            .collect();
        manifests.sort();

        for manifest in manifests {
            match read_manifest(&manifest) {
                Ok(Some(entry)) => packages.push(Package {
                    install_path: root.join("common").join(&entry.install_dir),
                    app_id: entry.app_id,
                    name: entry.name,
                }),
                Ok(None) => {
                    tracing::warn!(
                        path = %manifest.display(),
                        "manifest is missing appid/name/installdir"
                    );
                }
                Err(e) => {
                    tracing::warn!(path = %manifest.display(), "error reading manifest: {:#}", e);
                }
            }
        }
    }

    Ok(packages)
}

/// Convenience: roots from `steam_path`, then their packages.
pub fn discover_packages(steam_path: &Path) -> Result<Vec<Package>> {
    installed_packages(&library_roots(steam_path))
}

fn read_manifest(path: &Path) -> Result<Option<ManifestEntry>> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(parse_manifest(&String::from_utf8_lossy(&bytes)))
}

fn manifest_matcher() -> Result<GlobMatcher> {
    Ok(Glob::new("appmanifest_*.acf")?.compile_matcher())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#""AppState"
{
	"appid"		"620"
	"Universe"		"1"
	"name"		"Portal 2"
	"StateFlags"		"4"
	"installdir"		"Portal 2"
}
"#;

    #[test]
    fn parses_manifest_fields() {
        let entry = parse_manifest(MANIFEST).unwrap();
        assert_eq!(entry.app_id, "620");
        assert_eq!(entry.name, "Portal 2");
        assert_eq!(entry.install_dir, "Portal 2");
    }

    #[test]
    fn incomplete_manifest_is_none() {
        assert_eq!(parse_manifest(r#""appid" "620" "name" "Portal 2""#), None);
    }

    #[test]
    fn parses_both_vdf_formats() {
        let legacy = r#""LibraryFolders"
{
	"TimeNextStatsReport"		"1234"
	"1"		"D:\\SteamLibrary"
}"#;
        assert_eq!(parse_library_folders(legacy), vec!["D:\\SteamLibrary"]);

        let current = r#""libraryfolders"
{
	"0"
	{
		"path"		"C:\\Program Files (x86)\\Steam"
		"label"		""
	}
	"1"
	{
		"path"		"/mnt/games/steam"
		"apps"
		{
			"620"		"12969472000"
		}
	}
}"#;
        assert_eq!(
            parse_library_folders(current),
            vec!["C:\\Program Files (x86)\\Steam", "/mnt/games/steam"]
        );
    }

    #[test]
    fn roots_without_vdf_is_primary_only() {
        let dir = tempfile::tempdir().unwrap();
        let roots = library_roots(dir.path());
        assert_eq!(roots, vec![dir.path().join("steamapps")]);
    }

    #[test]
    fn roots_are_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        let steamapps = dir.path().join("steamapps");
        std::fs::create_dir_all(&steamapps).unwrap();
        let vdf = format!(
            "\"libraryfolders\"\n{{\n\"0\"\n{{\n\"path\"\t\t\"{}\"\n}}\n}}\n",
            dir.path().display()
        );
        std::fs::write(steamapps.join("libraryfolders.vdf"), vdf).unwrap();
        assert_eq!(library_roots(dir.path()), vec![steamapps]);
    }

    #[test]
    fn malformed_manifests_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("steamapps");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("appmanifest_620.acf"), MANIFEST).unwrap();
        std::fs::write(root.join("appmanifest_999.acf"), "garbage").unwrap();
        std::fs::write(root.join("notes.acf"), MANIFEST).unwrap();

        let packages = installed_packages(&[root.clone()]).unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].app_id, "620");
        assert_eq!(packages[0].install_path, root.join("common").join("Portal 2"));
    }
}
