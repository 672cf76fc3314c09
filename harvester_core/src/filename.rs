//! Regex-driven filename transforms
//!
//! A [`FilenameTemplate`] pairs a regex with a format string containing `$n`
//! placeholders. Applying it to a filename replaces each placeholder with the
//! n-th capture group (`$0` is the whole match).
//!
//! The renamer treats a non-matching name as an error. Archive path
//! derivation treats it as "no subdirectory" and carries on.

use crate::{Result, error::ValidationError};
use log::{debug, info, warn};
use regex::{Captures, Regex};
use std::path::{Component, Path, PathBuf};

/// A compiled regex plus substitution template
#[derive(Debug, Clone)]
pub struct FilenameTemplate {
    regex: Regex,
    template: String,
}

impl FilenameTemplate {
    /// Compile `pattern`; an invalid pattern is a configuration error
    pub fn new(pattern: &str, template: &str) -> Result<Self> {
        debug!("Compiling regex {pattern}");
        let regex = Regex::new(pattern)
            .map_err(|e| ValidationError::invalid_regex(pattern, &e.to_string()))?;
        Ok(Self {
            regex,
            template: template.to_string(),
        })
    }

    /// The regex source
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// The substitution template
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Apply the template, or `None` when the regex does not match
    pub fn apply(&self, name: &str) -> Option<String> {
        debug!("Matching regex {} against {name}", self.regex.as_str());
        let captures = self.regex.captures(name)?;
        debug!("Matches found: {}", captures.len());
        Some(substitute(&self.template, &captures))
    }

    /// Apply the template, failing when the regex does not match
    pub fn rename(&self, name: &str) -> Result<String> {
        let renamed = self
            .apply(name)
            .ok_or_else(|| ValidationError::no_match(self.regex.as_str(), name))?;
        debug!("Renamed {name} -> {renamed}");
        Ok(renamed)
    }

    /// Derive an archive subdirectory, falling back to the empty path on no match
    ///
    /// The derived path must stay below the archive root: absolute paths and
    /// `..` components are rejected.
    pub fn archive_subpath(&self, name: &str) -> Result<PathBuf> {
        let Some(formatted) = self.apply(name) else {
            warn!(
                "No matches found for regex {} in {name}, archiving in the root directory",
                self.regex.as_str()
            );
            return Ok(PathBuf::new());
        };

        let subpath = PathBuf::from(&formatted);
        let escapes = subpath
            .components()
            .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(ValidationError::invalid_parameter(
                "archive subpath",
                &format!("'{formatted}' derived from '{name}' leaves the archive directory"),
            )
            .into());
        }

        info!("Subpath formatted: {}", subpath.display());
        Ok(subpath)
    }
}

/// Rename `name` using `pattern` and `template`, compiling the pattern per call
///
/// Fails on an invalid pattern and on a non-matching name.
pub fn transform_filename(name: &str, pattern: &str, template: &str) -> Result<String> {
    FilenameTemplate::new(pattern, template)?.rename(name)
}

/// Derive the archive subpath for `name`, compiling the pattern per call
///
/// Fails on an invalid pattern; a non-matching name yields an empty path.
pub fn archive_subpath(name: &str, pattern: &str, template: &str) -> Result<PathBuf> {
    FilenameTemplate::new(pattern, template)?.archive_subpath(name)
}

/// Check that `name` is a single plain path component
pub fn validate_plain_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(ValidationError::invalid_parameter(
            "filename",
            &format!("'{name}' is not a plain file name"),
        )
        .into()),
    }
}

/// Replace `$n` placeholders in `template`, left to right
///
/// The longest digit run naming an existing group wins; otherwise the longest
/// prefix that does. A `$` without a usable group stays literal, and a group
/// that did not participate in the match expands to nothing.
fn substitute(template: &str, captures: &Captures<'_>) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(dollar) = rest.find('$') {
        output.push_str(&rest[..dollar]);
        let after = &rest[dollar + 1..];
        let digits = after.bytes().take_while(u8::is_ascii_digit).count();

        let group = (1..=digits).rev().find_map(|len| {
            let index: usize = after[..len].parse().ok()?;
            (index < captures.len()).then_some((index, len))
        });

        match group {
            Some((index, len)) => {
                output.push_str(captures.get(index).map_or("", |m| m.as_str()));
                rest = &after[len..];
            }
            None => {
                output.push('$');
                rest = after;
            }
        }
    }

    output.push_str(rest);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rename_date() {
        let renamed =
            transform_filename("20240501.dat", r"(\d{4})(\d{2})(\d{2})", "$1-$2-$3.txt").unwrap();
        assert_eq!(renamed, "2024-05-01.txt");
    }

    #[test]
    fn test_rename_no_match_is_error() {
        let err =
            transform_filename("readme.dat", r"(\d{4})(\d{2})(\d{2})", "$1-$2-$3.txt").unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Validation(ValidationError::NoMatch { .. })
        ));
    }

    #[test]
    fn test_invalid_regex_is_configuration_error() {
        let err = transform_filename("a.txt", r"(\d{4}", "$1").unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Validation(ValidationError::InvalidRegex { .. })
        ));
    }

    #[test]
    fn test_archive_subpath_date() {
        let subpath = archive_subpath(
            "2024-05-01-report.csv",
            r"(\d{4})-(\d{2})-(\d{2})",
            "$1/$2/$3",
        )
        .unwrap();
        assert_eq!(subpath, PathBuf::from("2024/05/01"));
    }

    #[test]
    fn test_archive_subpath_falls_back_to_root() {
        let subpath =
            archive_subpath("report.csv", r"(\d{4})-(\d{2})-(\d{2})", "$1/$2/$3").unwrap();
        assert_eq!(subpath, PathBuf::new());
    }

    #[test]
    fn test_archive_subpath_invalid_regex_still_fails() {
        assert!(archive_subpath("report.csv", r"(\d{4}", "$1").is_err());
    }

    #[test]
    fn test_archive_subpath_cannot_escape_root() {
        let template = FilenameTemplate::new(r"^(.*)\.csv$", "../$1").unwrap();
        assert!(template.archive_subpath("report.csv").is_err());

        let template = FilenameTemplate::new(r"^(.*)\.csv$", "/$1").unwrap();
        assert!(template.archive_subpath("report.csv").is_err());
    }

    #[test]
    fn test_whole_match_and_repeated_placeholders() {
        let template = FilenameTemplate::new(r"(\w+)\.log", "$1-$1 [$0]").unwrap();
        assert_eq!(template.rename("app.log").unwrap(), "app-app [app.log]");
    }

    #[test]
    fn test_multi_digit_placeholders() {
        let pattern = r"(a)(b)(c)(d)(e)(f)(g)(h)(i)(j)(k)";
        let template = FilenameTemplate::new(pattern, "$11$10$1").unwrap();
        assert_eq!(template.rename("abcdefghijk").unwrap(), "kja");

        // Only three groups: "$10" means group 1 followed by a literal 0
        let template = FilenameTemplate::new(r"(a)(b)(c)", "$10").unwrap();
        assert_eq!(template.rename("abc").unwrap(), "a0");
    }

    #[test]
    fn test_literal_dollar_and_missing_groups() {
        let template = FilenameTemplate::new(r"(x)?(\d+)", "$$2 $ $9").unwrap();
        assert_eq!(template.rename("42").unwrap(), "$42 $ $9");

        let template = FilenameTemplate::new(r"(x)?(\d+)", "[$1]$2").unwrap();
        assert_eq!(template.rename("7").unwrap(), "[]7");
    }

    #[test]
    fn test_validate_plain_name() {
        assert!(validate_plain_name("a.txt").is_ok());
        assert!(validate_plain_name("dir/a.txt").is_err());
        assert!(validate_plain_name("..").is_err());
        assert!(validate_plain_name("").is_err());
        assert!(validate_plain_name("/a.txt").is_err());
    }
}
