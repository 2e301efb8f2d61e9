//! Output file placement
//!
//! The script may only land directly inside the requested directory, under a
//! plain file name.

use openapi2locust_common::{GeneratorError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Check a user-supplied file name and append `.py` when missing
pub fn validate_filename(name: &str) -> Result<String> {
    let invalid = |reason: &str| -> Result<String> {
        Err(GeneratorError::InvalidFilename(format!("{:?}: {}", name, reason)))
    };

    if name.trim().is_empty() {
        return invalid("name is empty");
    }
    if name.contains("..") {
        return invalid("name must not contain '..'");
    }
    if name.contains(['/', '\\']) {
        return invalid("name must not contain path separators");
    }
    if name.starts_with('.') {
        return invalid("name must not start with '.'");
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(*c, '.' | '_' | '-')))
    {
        return invalid(&format!("character {:?} is not allowed", bad));
    }

    if name.ends_with(".py") {
        Ok(name.to_string())
    } else {
        Ok(format!("{}.py", name))
    }
}

/// `locustfile_<stem>.py` for the given spec path
pub fn default_filename(spec_path: &Path) -> String {
    let stem: String = spec_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let stem = stem.trim_matches('_');
    if stem.is_empty() {
        "locustfile.py".to_string()
    } else {
        format!("locustfile_{}.py", stem)
    }
}

/// Final script path inside `output_dir`
pub fn resolve_output_path(
    output_dir: &Path,
    filename: Option<&str>,
    spec_path: &Path,
) -> Result<PathBuf> {
    let name = match filename {
        Some(name) => validate_filename(name)?,
        None => default_filename(spec_path),
    };

    // Not created yet when canonicalize fails
    let output_dir = output_dir
        .canonicalize()
        .unwrap_or_else(|_| output_dir.to_path_buf());
    let output_dir = output_dir.as_path();

    let path = output_dir.join(&name);
    if path.parent() != Some(output_dir) {
        return Err(GeneratorError::InvalidFilename(format!(
            "{} escapes the output directory {}",
            name,
            output_dir.display()
        )));
    }

    reject_symlink(&path)?;
    Ok(path)
}

/// Write the script, creating the parent directory when needed
///
/// An existing symlink at `path` is refused rather than followed.
pub fn write_script(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    reject_symlink(path)?;
    fs::write(path, content)?;

    info!(path = %path.display(), bytes = content.len(), "Wrote locust script");
    Ok(())
}

fn reject_symlink(path: &Path) -> Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => Err(GeneratorError::InvalidFilename(format!(
            "{} is a symbolic link",
            path.display()
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_filename_accepts_and_appends_extension() {
        assert_eq!(validate_filename("load_test").unwrap(), "load_test.py");
        assert_eq!(validate_filename("load-test.v2.py").unwrap(), "load-test.v2.py");
    }

    #[test]
    fn test_validate_filename_rejects_unsafe_names() {
        for name in ["", "  ", "../evil", "a/b", "a\\b", ".hidden", "semi;colon", "sp ace", "ünï"] {
            assert!(
                matches!(validate_filename(name), Err(GeneratorError::InvalidFilename(_))),
                "{:?} should be rejected",
                name
            );
        }
    }

    #[test]
    fn test_default_filename() {
        assert_eq!(
            default_filename(Path::new("specs/petstore.yaml")),
            "locustfile_petstore.py"
        );
        assert_eq!(
            default_filename(Path::new("my api.v1.json")),
            "locustfile_my_api_v1.py"
        );
        assert_eq!(default_filename(Path::new("")), "locustfile.py");
    }

    #[test]
    fn test_resolve_output_path() {
        let dir = Path::new("out");
        let path = resolve_output_path(dir, Some("custom"), Path::new("x.yaml")).unwrap();
        assert_eq!(path, Path::new("out/custom.py"));

        let path = resolve_output_path(dir, None, Path::new("x.yaml")).unwrap();
        assert_eq!(path, Path::new("out/locustfile_x.py"));

        assert!(resolve_output_path(dir, Some("../x"), Path::new("x.yaml")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_target_is_not_followed() {
        let temp = tempfile::tempdir().unwrap();
        let out = temp.path().join("out");
        let elsewhere = temp.path().join("elsewhere");
        fs::create_dir_all(&out).unwrap();
        fs::create_dir_all(&elsewhere).unwrap();
        let victim = elsewhere.join("victim.py");
        fs::write(&victim, "original").unwrap();
        std::os::unix::fs::symlink(&victim, out.join("locustfile_x.py")).unwrap();

        let result = resolve_output_path(&out, None, Path::new("x.yaml"));
        assert!(matches!(result, Err(GeneratorError::InvalidFilename(_))));

        let result = write_script(&out.join("locustfile_x.py"), "OVERWRITTEN");
        assert!(matches!(result, Err(GeneratorError::InvalidFilename(_))));
        assert_eq!(fs::read_to_string(&victim).unwrap(), "original");
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_output_dir_resolves_to_real_directory() {
        let temp = tempfile::tempdir().unwrap();
        let real = temp.path().join("real");
        fs::create_dir_all(&real).unwrap();
        let link = temp.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let path = resolve_output_path(&link, Some("load"), Path::new("x.yaml")).unwrap();
        assert_eq!(path, real.canonicalize().unwrap().join("load.py"));
    }

    #[test]
    fn test_write_script_creates_directory() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("nested").join("locustfile.py");

        write_script(&path, "print('hi')\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "print('hi')\n");
    }
}
