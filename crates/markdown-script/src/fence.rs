use regex::Regex;
use std::sync::LazyLock;

pub const MAX_FENCE_INDENT: usize = 3;
pub const MIN_FENCE_LEN: usize = 3;
pub const MAX_FENCE_LEN: usize = 20;

static FENCE_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    let run = format!("{MIN_FENCE_LEN},{MAX_FENCE_LEN}");
    Regex::new(&format!(
        r"^( {{0,{MAX_FENCE_INDENT}}})(`{{{run}}}|~{{{run}}})([^\r\x{{2028}}\x{{2029}}]*)$"
    ))
    .expect("Failed to init regex for fence openers")
});

/// An opening fence line, split into its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FenceOpen<'a> {
    pub indent: usize,
    pub fence_char: char,
    pub fence_len: usize,
    pub info: &'a str,
}

/// Recognises an opening fence: up to three spaces, then 3 to 20 backticks
/// or tildes, then an info string without carriage returns or line
/// separators. A longer run opens with 20 and leaves the rest as info.
///
/// Tabs never count as indentation here, so a tab-indented fence is prose.
pub fn detect_fence_open(line: &str) -> Option<FenceOpen<'_>> {
    let caps = FENCE_OPEN.captures(line)?;
    let indent = caps.get(1)?.as_str().len();
    let fence = caps.get(2)?.as_str();
    let info = caps.get(3)?.as_str();

    let fence_len = fence.len();
    let fence_char = fence.chars().next()?;
    Some(FenceOpen {
        indent,
        fence_char,
        fence_len,
        info,
    })
}

/// True when `line` closes a block opened with `min_len` copies of
/// `fence_char`: up to three spaces, at least `min_len` fence characters,
/// then only spaces or tabs.
pub fn is_closing_fence(line: &str, fence_char: char, min_len: usize) -> bool {
    let rest = line.trim_start_matches(' ');
    if line.len() - rest.len() > MAX_FENCE_INDENT {
        return false;
    }

    let after_run = rest.trim_start_matches(fence_char);
    let run = (rest.len() - after_run.len()) / fence_char.len_utf8();
    if run < min_len {
        return false;
    }

    after_run.chars().all(|ch| ch == ' ' || ch == '\t')
}

/// Legacy indented-code test: two or more spaces, or a tab, at column 0.
pub fn is_indented(line: &str) -> bool {
    line.starts_with("  ") || line.starts_with('\t')
}

/// Removes at most `max` leading spaces.
pub fn strip_indent(line: &str, max: usize) -> &str {
    let spaces = line.bytes().take(max).take_while(|&b| b == b' ').count();
    &line[spaces..]
}
