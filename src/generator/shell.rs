//! Shell quoting and script text assembly

/// Quote a value for POSIX sh. Values made only of safe characters are
/// returned untouched.
pub fn quote(value: &str) -> String {
    let safe = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | ':' | '@' | '+' | ',' | '='));
    if safe {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', r"'\''"))
    }
}

/// Quote a path, keeping a leading `~/` expandable as `$HOME`
pub fn quote_path(path: &str) -> String {
    let path = path.trim();
    if path == "~" {
        return "\"$HOME\"".to_string();
    }
    match path.strip_prefix("~/") {
        Some(rest) => format!("\"$HOME/{}\"", escape_double(rest)),
        None => format!("\"{}\"", escape_double(path)),
    }
}

pub(crate) fn escape_double(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Line-oriented script builder. Blank commands are dropped and blank
/// separators never repeat, so omitted stages leave no artifacts.
#[derive(Debug, Default)]
pub struct ScriptWriter {
    buf: String,
}

impl ScriptWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&mut self, text: &str) -> &mut Self {
        if !text.trim().is_empty() {
            self.buf.push_str(text.trim_end());
            self.buf.push('\n');
        }
        self
    }

    /// Emit a (possibly multi-line) command snippet. Only the outer edges
    /// are trimmed; inner blank lines and spacing are kept verbatim so
    /// heredocs and quoted strings survive.
    pub fn command(&mut self, cmd: &str) -> &mut Self {
        let cmd = cmd.trim();
        if !cmd.is_empty() {
            self.buf.push_str(cmd);
            self.buf.push('\n');
        }
        self
    }

    pub fn echo(&mut self, message: &str) -> &mut Self {
        self.line(&format!("echo {}", quote(message)))
    }

    pub fn export(&mut self, name: &str, value: &str) -> &mut Self {
        self.line(&format!("export {}={}", name, quote(value)))
    }

    pub fn section(&mut self, title: &str) -> &mut Self {
        self.blank();
        self.line(&format!("# --- {} ---", title))
    }

    pub fn blank(&mut self) -> &mut Self {
        if !self.buf.is_empty() && !self.buf.ends_with("\n\n") {
            self.buf.push('\n');
        }
        self
    }

    pub fn finish(mut self) -> String {
        while self.buf.ends_with("\n\n") {
            self.buf.pop();
        }
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote() {
        assert_eq!(quote("venv"), "venv");
        assert_eq!(quote("hello world"), "'hello world'");
        assert_eq!(quote("it's"), r"'it'\''s'");
        assert_eq!(quote(""), "''");
    }

    #[test]
    fn test_quote_path_expands_home() {
        assert_eq!(quote_path("~/dev/saleor"), "\"$HOME/dev/saleor\"");
        assert_eq!(quote_path("/srv/my app"), "\"/srv/my app\"");
        assert_eq!(quote_path("/tmp/$x"), "\"/tmp/\\$x\"");
    }

    #[test]
    fn test_writer_skips_empty_and_collapses_blanks() {
        let mut w = ScriptWriter::new();
        w.line("a").blank().blank().command("   ").section("S").command("\n b\nc \n");
        assert_eq!(w.finish(), "a\n\n# --- S ---\nb\nc\n");
    }

    #[test]
    fn test_command_keeps_inner_text_verbatim() {
        let heredoc = "cat > settings.py <<'EOF'\nA = 1\n\nB = 2   \nEOF";
        let mut w = ScriptWriter::new();
        w.command(heredoc);
        assert_eq!(w.finish(), format!("{}\n", heredoc));
    }
}
