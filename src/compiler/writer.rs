/// Line-oriented builder for generated source text.
pub(crate) struct CodeWriter<'a> {
    unit: &'a str,
    out: String,
}

impl<'a> CodeWriter<'a> {
    pub(crate) fn new(unit: &'a str) -> Self {
        Self {
            unit,
            out: String::new(),
        }
    }

    /// Writes `text` at `level`. Only the first line is indented; embedded
    /// newlines must already carry their own indentation.
    pub(crate) fn line(&mut self, level: usize, text: impl AsRef<str>) {
        for _ in 0..level {
            self.out.push_str(self.unit);
        }
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    pub(crate) fn blank(&mut self) {
        self.out.push('\n');
    }

    pub(crate) fn finish(self) -> String {
        self.out
    }
}

/// Flattens text for use inside a single-line `#` comment.
pub(crate) fn comment_text(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

/// Indents every non-empty line of `code` by one `unit`.
pub(crate) fn indent_lines(code: &str, unit: &str) -> String {
    let mut out = String::with_capacity(code.len() + unit.len() * 4);
    for line in code.lines() {
        if !line.is_empty() {
            out.push_str(unit);
            out.push_str(line);
        }
        out.push('\n');
    }
    out
}
