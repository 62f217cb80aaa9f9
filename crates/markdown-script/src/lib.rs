//! Rewrites a markdown document into an executable script.
//!
//! Prose becomes comments, fences tagged with a script language are kept as
//! code, fences tagged with a shell language are wrapped in a shell
//! invocation, and anything else is commented out. The rewrite is line based
//! and never fails:
//!
//! ```
//! let script = markdown_script::transform_markdown("# Build\n```sh\nmake\n```");
//! assert_eq!(script, "// # Build\nawait $`\nmake\n`");
//! ```
//!
//! This is not a CommonMark parser. A fence is only recognised at the start
//! of a line with at most three spaces of indentation, and an indented block
//! is only recognised directly after a blank line.

mod dialect;
mod fence;
mod line;
mod state;

pub use dialect::{
    Bucket, Dialect, DialectError, DEFAULT_COMMENT_PREFIX, DEFAULT_SCRIPT_TAGS,
    DEFAULT_SHELL_CLOSE, DEFAULT_SHELL_OPEN, DEFAULT_SHELL_TAGS,
};
pub use fence::{
    detect_fence_open, is_closing_fence, FenceOpen, MAX_FENCE_INDENT, MAX_FENCE_LEN,
    MIN_FENCE_LEN,
};
pub use line::{split_lines, LineRecord};

use dialect::LanguageTags;
use line::read_text;
use state::Transducer;
use std::{
    fs::File,
    io::{self, BufReader, Read},
    path::Path,
    sync::LazyLock,
};

static DEFAULT_TRANSFORMER: LazyLock<Transformer> = LazyLock::new(Transformer::default);

/// A compiled [`Dialect`], ready to rewrite any number of documents.
#[derive(Debug, Clone)]
pub struct Transformer {
    dialect: Dialect,
    tags: LanguageTags,
}

impl Transformer {
    pub fn new(dialect: Dialect) -> Result<Self, DialectError> {
        let tags = LanguageTags::compile(&dialect)?;
        Ok(Self { dialect, tags })
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// Buckets the info string that follows an opening fence.
    pub fn classify(&self, info: &str) -> Bucket {
        self.tags.classify(info)
    }

    /// Rewrites `input` and returns the output lines before joining.
    pub fn transform_lines(&self, input: &str) -> Vec<String> {
        let mut transducer = Transducer::new(self);
        for line in split_lines(input) {
            transducer.push_line(&line);
        }
        transducer.finish()
    }

    pub fn transform(&self, input: &str) -> String {
        self.transform_lines(input).join("\n")
    }

    pub fn transform_reader<R: Read>(&self, reader: &mut R) -> io::Result<String> {
        let text = read_text(reader)?;
        Ok(self.transform(&text))
    }

    pub fn transform_path(&self, path: &Path) -> io::Result<String> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        self.transform_reader(&mut reader)
    }
}

impl Default for Transformer {
    fn default() -> Self {
        let dialect = Dialect::default();
        let tags = LanguageTags::compile(&dialect)
            .unwrap_or_else(|err| panic!("default dialect failed to compile: {err}"));
        Self { dialect, tags }
    }
}

/// Rewrites `input` with the default dialect.
pub fn transform_markdown(input: &str) -> String {
    DEFAULT_TRANSFORMER.transform(input)
}

pub fn transform_from_reader<R: Read>(reader: &mut R) -> io::Result<String> {
    DEFAULT_TRANSFORMER.transform_reader(reader)
}

pub fn transform_from_path(path: &Path) -> io::Result<String> {
    DEFAULT_TRANSFORMER.transform_path(path)
}
