use regex::{Regex, RegexBuilder};
use std::fmt;
use thiserror::Error;

pub const DEFAULT_COMMENT_PREFIX: &str = "// ";
pub const DEFAULT_SHELL_OPEN: &str = "await $`";
pub const DEFAULT_SHELL_CLOSE: &str = "`";
pub const DEFAULT_SCRIPT_TAGS: [&str; 4] = ["js", "javascript", "ts", "typescript"];
pub const DEFAULT_SHELL_TAGS: [&str; 3] = ["sh", "shell", "bash"];

/// Output vocabulary used when rewriting a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialect {
    /// Prepended to prose lines and to lines of unrecognised fences.
    pub comment_prefix: String,
    /// Emitted in place of a shell fence opener.
    pub shell_open: String,
    /// Emitted in place of a shell fence closer.
    pub shell_close: String,
    pub script_tags: Vec<String>,
    pub shell_tags: Vec<String>,
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            comment_prefix: DEFAULT_COMMENT_PREFIX.into(),
            shell_open: DEFAULT_SHELL_OPEN.into(),
            shell_close: DEFAULT_SHELL_CLOSE.into(),
            script_tags: DEFAULT_SCRIPT_TAGS.iter().map(|tag| tag.to_string()).collect(),
            shell_tags: DEFAULT_SHELL_TAGS.iter().map(|tag| tag.to_string()).collect(),
        }
    }
}

/// How the contents of a fenced block are rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Script,
    Shell,
    Unknown,
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Bucket::Script => "script",
            Bucket::Shell => "shell",
            Bucket::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum DialectError {
    #[error("{bucket} language tags must not be empty")]
    EmptyTag { bucket: Bucket },

    #[error("failed to compile {bucket} language tags: {source}")]
    Pattern {
        bucket: Bucket,
        source: regex::Error,
    },
}

/// Compiled case-insensitive prefix matchers for the script and shell tags.
#[derive(Debug, Clone)]
pub(crate) struct LanguageTags {
    script: Option<Regex>,
    shell: Option<Regex>,
}

impl LanguageTags {
    pub(crate) fn compile(dialect: &Dialect) -> Result<Self, DialectError> {
        Ok(Self {
            script: compile_tags(Bucket::Script, &dialect.script_tags)?,
            shell: compile_tags(Bucket::Shell, &dialect.shell_tags)?,
        })
    }

    /// Script tags win over shell tags; no word boundary is required, so
    /// `jsx` lands in the script bucket.
    pub(crate) fn classify(&self, info: &str) -> Bucket {
        if matches_prefix(self.script.as_ref(), info) {
            Bucket::Script
        } else if matches_prefix(self.shell.as_ref(), info) {
            Bucket::Shell
        } else {
            Bucket::Unknown
        }
    }
}

fn matches_prefix(pattern: Option<&Regex>, info: &str) -> bool {
    pattern.is_some_and(|regex| regex.is_match(info))
}

fn compile_tags(bucket: Bucket, tags: &[String]) -> Result<Option<Regex>, DialectError> {
    if tags.is_empty() {
        return Ok(None);
    }
    if tags.iter().any(|tag| tag.is_empty()) {
        return Err(DialectError::EmptyTag { bucket });
    }

    let alternatives = tags
        .iter()
        .map(|tag| regex::escape(tag))
        .collect::<Vec<_>>()
        .join("|");

    RegexBuilder::new(&format!("^(?:{alternatives})"))
        .case_insensitive(true)
        .size_limit(1024 * 100) // 100 kb
        .build()
        .map(Some)
        .map_err(|source| DialectError::Pattern { bucket, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_tags() -> LanguageTags {
        LanguageTags::compile(&Dialect::default()).unwrap()
    }

    #[test]
    fn classifies_default_tags() {
        let tags = default_tags();
        assert_eq!(tags.classify("js"), Bucket::Script);
        assert_eq!(tags.classify("typescript"), Bucket::Script);
        assert_eq!(tags.classify("bash"), Bucket::Shell);
        assert_eq!(tags.classify("shell"), Bucket::Shell);
        assert_eq!(tags.classify("python"), Bucket::Unknown);
        assert_eq!(tags.classify(""), Bucket::Unknown);
    }

    #[test]
    fn classification_is_case_insensitive_prefix_match() {
        let tags = default_tags();
        assert_eq!(tags.classify("JS"), Bucket::Script);
        assert_eq!(tags.classify("jsx"), Bucket::Script);
        assert_eq!(tags.classify("Bash {title=x}"), Bucket::Shell);
        assert_eq!(tags.classify("shellscript"), Bucket::Shell);
    }

    #[test]
    fn leading_space_in_info_is_not_a_tag() {
        assert_eq!(default_tags().classify(" js"), Bucket::Unknown);
    }

    #[test]
    fn script_bucket_wins_over_shell() {
        let dialect = Dialect {
            script_tags: vec!["sh".into()],
            ..Dialect::default()
        };
        let tags = LanguageTags::compile(&dialect).unwrap();
        assert_eq!(tags.classify("sh"), Bucket::Script);
    }

    #[test]
    fn tags_are_matched_literally() {
        let dialect = Dialect {
            script_tags: vec!["c++".into()],
            ..Dialect::default()
        };
        let tags = LanguageTags::compile(&dialect).unwrap();
        assert_eq!(tags.classify("c++"), Bucket::Script);
        assert_eq!(tags.classify("cc"), Bucket::Unknown);
    }

    #[test]
    fn empty_tag_list_never_matches() {
        let dialect = Dialect {
            shell_tags: Vec::new(),
            ..Dialect::default()
        };
        let tags = LanguageTags::compile(&dialect).unwrap();
        assert_eq!(tags.classify("sh"), Bucket::Unknown);
    }

    #[test]
    fn rejects_empty_tag() {
        let dialect = Dialect {
            shell_tags: vec!["sh".into(), String::new()],
            ..Dialect::default()
        };
        let err = LanguageTags::compile(&dialect).unwrap_err();
        assert!(matches!(
            err,
            DialectError::EmptyTag {
                bucket: Bucket::Shell
            }
        ));
        assert_eq!(err.to_string(), "shell language tags must not be empty");
    }
}
