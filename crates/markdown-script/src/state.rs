use crate::dialect::Bucket;
use crate::fence::{detect_fence_open, is_closing_fence, is_indented, strip_indent};
use crate::line::LineRecord;
use crate::Transformer;
use tracing::{debug, trace};

/// Parameters of the fenced block currently being rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FenceContext<'t> {
    fence_char: char,
    min_close_len: usize,
    strip: usize,
    prefix: &'t str,
    closing: &'t str,
    opened_at: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum State<'t> {
    Root,
    TabBlock,
    FenceBlock(FenceContext<'t>),
}

/// Single-pass rewriter. One instance per document.
pub(crate) struct Transducer<'t> {
    transformer: &'t Transformer,
    state: State<'t>,
    prev_empty: bool,
    out: Vec<String>,
}

impl<'t> Transducer<'t> {
    pub(crate) fn new(transformer: &'t Transformer) -> Self {
        Self {
            transformer,
            state: State::Root,
            prev_empty: true,
            out: Vec::new(),
        }
    }

    pub(crate) fn push_line(&mut self, line: &LineRecord<'_>) {
        let state = std::mem::replace(&mut self.state, State::Root);
        self.state = match state {
            State::Root => self.root_line(line),
            State::TabBlock => self.tab_line(line),
            State::FenceBlock(fence) => self.fence_line(fence, line),
        };
    }

    pub(crate) fn finish(self) -> Vec<String> {
        if let State::FenceBlock(fence) = &self.state {
            debug!(
                opened_at = fence.opened_at,
                "input ended inside an unterminated fenced block"
            );
        }
        self.out
    }

    fn root_line(&mut self, line: &LineRecord<'_>) -> State<'t> {
        if let Some(open) = detect_fence_open(line.text) {
            let transformer: &'t Transformer = self.transformer;
            let dialect = transformer.dialect();
            let bucket = transformer.classify(open.info);
            let (opening, prefix, closing) = match bucket {
                Bucket::Script => ("", "", ""),
                Bucket::Shell => (
                    dialect.shell_open.as_str(),
                    "",
                    dialect.shell_close.as_str(),
                ),
                Bucket::Unknown => ("", dialect.comment_prefix.as_str(), ""),
            };

            trace!(
                line = line.number,
                fence = %open.fence_char,
                len = open.fence_len,
                indent = open.indent,
                %bucket,
                "entering fenced block"
            );

            self.out.push(opening.to_string());
            self.prev_empty = false;
            return State::FenceBlock(FenceContext {
                fence_char: open.fence_char,
                min_close_len: open.fence_len,
                strip: open.indent,
                prefix,
                closing,
                opened_at: line.number,
            });
        }

        if self.prev_empty && is_indented(line.text) {
            trace!(line = line.number, "entering indented block");
            self.out.push(line.text.to_string());
            return State::TabBlock;
        }

        self.prev_empty = line.text.is_empty();
        self.push_comment(line.text);
        State::Root
    }

    fn tab_line(&mut self, line: &LineRecord<'_>) -> State<'t> {
        self.prev_empty = line.text.is_empty();

        if line.text.is_empty() || is_indented(line.text) {
            self.out.push(line.text.to_string());
            return State::TabBlock;
        }

        trace!(line = line.number, "leaving indented block");
        self.push_comment(line.text);
        State::Root
    }

    fn fence_line(&mut self, fence: FenceContext<'t>, line: &LineRecord<'_>) -> State<'t> {
        if is_closing_fence(line.text, fence.fence_char, fence.min_close_len) {
            trace!(
                line = line.number,
                opened_at = fence.opened_at,
                "leaving fenced block"
            );
            self.out.push(fence.closing.to_string());
            self.prev_empty = true;
            return State::Root;
        }

        let body = strip_indent(line.text, fence.strip);
        self.out.push(format!("{}{}", fence.prefix, body));
        self.prev_empty = false;
        State::FenceBlock(fence)
    }

    fn push_comment(&mut self, text: &str) {
        let prefix = &self.transformer.dialect().comment_prefix;
        self.out.push(format!("{prefix}{text}"));
    }
}
