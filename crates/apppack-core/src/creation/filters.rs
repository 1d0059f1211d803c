//! Path exclusion rules for packaging.
//!
//! Exclusion is decided from strings alone: prefix and suffix rules look at
//! the slash-normalized virtual path, regex rules look at the bare basename.
//! Nothing here touches the filesystem, so the walker can reject an entry
//! before it stats or opens it.

use crate::PackError;
use crate::Result;
use crate::creation::config::DEFAULT_EXCLUDE_PREFIXES;
use crate::creation::config::DEFAULT_EXCLUDE_SUFFIXES;
use crate::creation::config::PackConfig;
use regex::Regex;
use std::path::Path;

/// Compiled exclusion rule set.
///
/// A path is excluded if any rule in any list matches.
///
/// # Examples
///
/// ```
/// use apppack_core::creation::filters::ExclusionRules;
///
/// let rules = ExclusionRules::default();
/// assert!(rules.is_excluded_path(".git/config"));
/// assert!(rules.is_excluded_path("main.go"));
/// assert!(!rules.is_excluded_path("static/css/app.css"));
/// assert!(!rules.is_excluded_name("app.css"));
/// ```
#[derive(Debug, Clone)]
pub struct ExclusionRules {
    prefixes: Vec<String>,
    suffixes: Vec<String>,
    regexes: Vec<Regex>,
}

impl Default for ExclusionRules {
    fn default() -> Self {
        Self {
            prefixes: DEFAULT_EXCLUDE_PREFIXES
                .iter()
                .map(ToString::to_string)
                .collect(),
            suffixes: DEFAULT_EXCLUDE_SUFFIXES
                .iter()
                .map(ToString::to_string)
                .collect(),
            regexes: Vec::new(),
        }
    }
}

impl ExclusionRules {
    /// Creates a rule set from already compiled parts.
    #[must_use]
    pub fn new(prefixes: Vec<String>, suffixes: Vec<String>, regexes: Vec<Regex>) -> Self {
        Self {
            prefixes,
            suffixes,
            regexes,
        }
    }

    /// Creates a rule set, compiling each basename pattern.
    ///
    /// Empty patterns are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::InvalidPattern`] for the first pattern that does
    /// not compile.
    pub fn compile(
        prefixes: Vec<String>,
        suffixes: Vec<String>,
        patterns: &[String],
    ) -> Result<Self> {
        let regexes = patterns
            .iter()
            .filter(|p| !p.is_empty())
            .map(|p| {
                Regex::new(p).map_err(|source| PackError::InvalidPattern {
                    pattern: p.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(prefixes, suffixes, regexes))
    }

    /// Builds the rule set described by a [`PackConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`PackError::InvalidPattern`] if a configured regex is invalid.
    pub fn from_config(config: &PackConfig) -> Result<Self> {
        Self::compile(
            config.exclude_prefixes.clone(),
            config.exclude_suffixes.clone(),
            &config.exclude_regexes,
        )
    }

    /// Returns `true` if the virtual path is empty, starts with an excluded
    /// prefix, or ends with an excluded suffix.
    ///
    /// # Examples
    ///
    /// ```
    /// use apppack_core::creation::filters::ExclusionRules;
    ///
    /// let rules = ExclusionRules::new(vec!["logs/".into()], vec![".bak".into()], vec![]);
    /// assert!(rules.is_excluded_path(""));
    /// assert!(rules.is_excluded_path("logs/today.txt"));
    /// assert!(rules.is_excluded_path("conf/app.conf.bak"));
    /// assert!(!rules.is_excluded_path("conf/app.conf"));
    /// ```
    #[must_use]
    pub fn is_excluded_path(&self, virtual_path: &str) -> bool {
        if virtual_path.is_empty() {
            return true;
        }

        self.prefixes
            .iter()
            .any(|prefix| virtual_path.starts_with(prefix.as_str()))
            || self
                .suffixes
                .iter()
                .any(|suffix| virtual_path.ends_with(suffix.as_str()))
    }

    /// Returns `true` if the basename matches any exclusion regex.
    #[must_use]
    pub fn is_excluded_name(&self, name: &str) -> bool {
        self.regexes.iter().any(|re| re.is_match(name))
    }

    /// Excluded prefixes, in configuration order.
    #[must_use]
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// Excluded suffixes, in configuration order.
    #[must_use]
    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }

    /// Source text of the basename regexes.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.regexes.iter().map(Regex::as_str)
    }
}

/// Computes the virtual path of `path` under `root`.
///
/// The root prefix is stripped, components are joined with `/`, and no
/// leading separator is kept. The root itself maps to the empty string.
///
/// # Errors
///
/// Returns an error if `path` is not under `root` or a component of the
/// relative path is not valid UTF-8.
///
/// # Examples
///
/// ```
/// use apppack_core::creation::filters::virtual_path;
/// use std::path::Path;
///
/// let root = Path::new("/home/user/blog");
/// assert_eq!(
///     virtual_path(root, Path::new("/home/user/blog/static/css/app.css")).unwrap(),
///     "static/css/app.css"
/// );
/// assert_eq!(virtual_path(root, root).unwrap(), "");
/// ```
pub fn virtual_path(root: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(root).map_err(|_| {
        PackError::Io(std::io::Error::other(format!(
            "path {} is not under include root {}",
            path.display(),
            root.display()
        )))
    })?;

    let parts = relative
        .components()
        .map(|c| {
            c.as_os_str().to_str().ok_or_else(|| {
                PackError::Io(std::io::Error::other(format!(
                    "path is not valid UTF-8: {}",
                    path.display()
                )))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(parts.join("/"))
}
