//! Batch splitting on `GO` separator lines.
//!
//! A separator is a line holding only `GO` (any case), optionally followed by
//! a `--` comment. The scanner understands comments, string literals
//! (including `$tag$` dollar quoting), quoted identifiers and parentheses, so
//! a `GO` inside any of them never splits.
//! Each batch is the exact source substring from its first to its last
//! non-whitespace character.

use crate::dialect::SqlDialect;
use crate::error::{SqlError, SqlResult};

/// One independently executable unit of SQL within a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Batch text, verbatim from the script
    pub sql: String,
    /// 1-based line where the batch starts in the script
    pub line: usize,
    /// 1-based column where the batch starts in the script
    pub column: usize,
}

/// Splits scripts into batches, optionally validating each batch.
#[derive(Debug, Default)]
pub struct BatchSplitter {
    dialect: Option<SqlDialect>,
}

impl BatchSplitter {
    /// Splitter that only tokenizes, without dialect validation
    pub fn new() -> Self {
        Self { dialect: None }
    }

    /// Splitter that also parses every batch with `dialect`
    pub fn with_dialect(dialect: SqlDialect) -> Self {
        Self {
            dialect: Some(dialect),
        }
    }

    /// Name of the validating dialect, if any
    pub fn dialect_name(&self) -> Option<&'static str> {
        self.dialect.as_ref().map(|d| d.name())
    }

    /// Split `text` into batches.
    ///
    /// A script with no statements yields no batches.
    pub fn split(&self, text: &str) -> SqlResult<Vec<Batch>> {
        let mut scanner = Scanner::default();
        let mut batches = Vec::new();
        let mut offset = 0;

        for (idx, line) in text.split_inclusive('\n').enumerate() {
            if scanner.is_between_tokens() && is_separator_line(line) {
                batches.extend(scanner.take_batch(text)?);
            } else {
                scanner.scan_line(line, offset, idx + 1)?;
            }
            offset += line.len();
        }
        scanner.check_terminated()?;
        batches.extend(scanner.take_batch(text)?);

        if let Some(dialect) = &self.dialect {
            for batch in &batches {
                validate_batch(dialect, batch)?;
            }
        }

        log::debug!("Split script into {} batch(es)", batches.len());
        Ok(batches)
    }
}

/// Split `text` into batches without dialect validation
pub fn split_batches(text: &str) -> SqlResult<Vec<Batch>> {
    BatchSplitter::new().split(text)
}

/// Parse one batch, translating error locations into script coordinates.
fn validate_batch(dialect: &SqlDialect, batch: &Batch) -> SqlResult<()> {
    match dialect.parse(&batch.sql) {
        Ok(_) => Ok(()),
        Err(SqlError::Syntax {
            message,
            line,
            column,
        }) => {
            let (line, column) = match (line, column) {
                (0, _) => (batch.line, batch.column),
                (1, column) => (batch.line, batch.column + column - 1),
                (line, column) => (batch.line + line - 1, column),
            };
            Err(SqlError::Syntax {
                message,
                line,
                column,
            })
        }
        Err(other) => Err(other),
    }
}

/// Whether `line` is a batch separator.
fn is_separator_line(line: &str) -> bool {
    let trimmed = line.trim();
    if !trimmed
        .get(..2)
        .is_some_and(|keyword| keyword.eq_ignore_ascii_case("go"))
    {
        return false;
    }
    let rest = &trimmed[2..];
    rest.is_empty()
        || rest.starts_with("--")
        || (rest.starts_with(char::is_whitespace) && rest.trim_start().starts_with("--"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Position {
    line: usize,
    column: usize,
}

#[derive(Debug, Clone, Copy)]
enum Mode {
    Normal,
    BlockComment {
        depth: usize,
        start: Position,
    },
    Quoted {
        close: char,
        start: Position,
        what: &'static str,
    },
    DollarQuoted {
        start: Position,
    },
}

/// Batch under construction.
#[derive(Debug, Default)]
struct Pending {
    start: Option<(usize, Position)>,
    end: usize,
    has_statement: bool,
    parens: Vec<Position>,
}

#[derive(Debug)]
struct Scanner {
    mode: Mode,
    /// Delimiter of the open dollar-quoted string, e.g. `$$` or `$body$`
    dollar_tag: String,
    pending: Pending,
}

impl Default for Scanner {
    fn default() -> Self {
        Self {
            mode: Mode::Normal,
            dollar_tag: String::new(),
            pending: Pending::default(),
        }
    }
}

impl Scanner {
    fn is_between_tokens(&self) -> bool {
        matches!(self.mode, Mode::Normal)
    }

    /// Record a non-whitespace byte range as part of the batch span.
    fn mark(&mut self, offset: usize, len: usize, pos: Position) {
        if self.pending.start.is_none() {
            self.pending.start = Some((offset, pos));
        }
        self.pending.end = offset + len;
    }

    fn scan_line(&mut self, line: &str, offset: usize, line_no: usize) -> SqlResult<()> {
        let mut chars = line.char_indices().peekable();
        let mut column = 0;

        while let Some((i, c)) = chars.next() {
            column += 1;
            let pos = Position {
                line: line_no,
                column,
            };
            if !c.is_whitespace() {
                self.mark(offset + i, c.len_utf8(), pos);
            }
            let next = chars.peek().map(|&(_, n)| n);

            match self.mode {
                Mode::Normal => match c {
                    '-' if next == Some('-') => {
                        let comment = line[i..].trim_end();
                        self.mark(offset + i, comment.len(), pos);
                        return Ok(());
                    }
                    '/' if next == Some('*') => {
                        if let Some((j, n)) = chars.next() {
                            column += 1;
                            self.mark(offset + j, n.len_utf8(), pos);
                        }
                        self.mode = Mode::BlockComment {
                            depth: 1,
                            start: pos,
                        };
                    }
                    '\'' => self.open_quoted('\'', pos, "string literal"),
                    '"' => self.open_quoted('"', pos, "quoted identifier"),
                    '[' => self.open_quoted(']', pos, "bracketed identifier"),
                    '$' => {
                        self.pending.has_statement = true;
                        if let Some(delimiter) = dollar_quote_delimiter(line, i) {
                            for _ in 1..delimiter.len() {
                                if let Some((j, n)) = chars.next() {
                                    column += 1;
                                    self.mark(offset + j, n.len_utf8(), pos);
                                }
                            }
                            self.dollar_tag = delimiter.to_string();
                            self.mode = Mode::DollarQuoted { start: pos };
                        }
                    }
                    '(' => {
                        self.pending.has_statement = true;
                        self.pending.parens.push(pos);
                    }
                    ')' => {
                        self.pending.has_statement = true;
                        if self.pending.parens.pop().is_none() {
                            return Err(syntax("Unmatched ')'", pos));
                        }
                    }
                    ';' => {}
                    c if c.is_whitespace() => {}
                    _ => self.pending.has_statement = true,
                },
                Mode::BlockComment { depth, start } => {
                    let opens = c == '/' && next == Some('*');
                    let closes = c == '*' && next == Some('/');
                    if opens || closes {
                        if let Some((j, n)) = chars.next() {
                            column += 1;
                            self.mark(offset + j, n.len_utf8(), pos);
                        }
                    }
                    if opens {
                        self.mode = Mode::BlockComment {
                            depth: depth + 1,
                            start,
                        };
                    } else if closes {
                        self.mode = if depth > 1 {
                            Mode::BlockComment {
                                depth: depth - 1,
                                start,
                            }
                        } else {
                            Mode::Normal
                        };
                    }
                }
                Mode::Quoted { close, .. } => {
                    if c == close {
                        if next == Some(close) {
                            if let Some((j, n)) = chars.next() {
                                column += 1;
                                self.mark(offset + j, n.len_utf8(), pos);
                            }
                        } else {
                            self.mode = Mode::Normal;
                        }
                    }
                }
                Mode::DollarQuoted { .. } => {
                    if c == '$' && line[i..].starts_with(self.dollar_tag.as_str()) {
                        for _ in 1..self.dollar_tag.len() {
                            if let Some((j, n)) = chars.next() {
                                column += 1;
                                self.mark(offset + j, n.len_utf8(), pos);
                            }
                        }
                        self.mode = Mode::Normal;
                    }
                }
            }
        }
        Ok(())
    }

    fn open_quoted(&mut self, close: char, start: Position, what: &'static str) {
        self.pending.has_statement = true;
        self.mode = Mode::Quoted { close, start, what };
    }

    /// Fail if the text ended inside a comment, string or identifier.
    fn check_terminated(&self) -> SqlResult<()> {
        match self.mode {
            Mode::Normal => Ok(()),
            Mode::BlockComment { start, .. } => Err(syntax("Unterminated block comment", start)),
            Mode::Quoted { start, what, .. } => {
                Err(syntax(&format!("Unterminated {what}"), start))
            }
            Mode::DollarQuoted { start } => {
                Err(syntax("Unterminated dollar-quoted string", start))
            }
        }
    }

    /// Close the pending batch, returning it if it holds any statement.
    fn take_batch(&mut self, text: &str) -> SqlResult<Option<Batch>> {
        let pending = std::mem::take(&mut self.pending);
        if let Some(open) = pending.parens.last() {
            return Err(syntax("Unclosed '('", *open));
        }
        if !pending.has_statement {
            return Ok(None);
        }
        let (start, pos) = pending.start.ok_or(SqlError::UnexpectedFragment {
            start: 0,
            end: pending.end,
        })?;
        let sql = text
            .get(start..pending.end)
            .ok_or(SqlError::UnexpectedFragment {
                start,
                end: pending.end,
            })?;
        Ok(Some(Batch {
            sql: sql.to_string(),
            line: pos.line,
            column: pos.column,
        }))
    }
}

/// The `$tag$` delimiter opening a dollar-quoted string at byte `i` of
/// `line`, if one starts there. Tags follow identifier rules and may be empty.
/// `$1` parameters and `$` inside identifiers do not open a string.
fn dollar_quote_delimiter(line: &str, i: usize) -> Option<&str> {
    if line[..i]
        .chars()
        .next_back()
        .is_some_and(|prev| prev.is_alphanumeric() || prev == '_')
    {
        return None;
    }
    let rest = &line[i + 1..];
    if rest.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    let tag_len = rest.find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))?;
    if !rest[tag_len..].starts_with('$') {
        return None;
    }
    Some(&line[i..i + tag_len + 2])
}

fn syntax(message: &str, pos: Position) -> SqlError {
    SqlError::Syntax {
        message: message.to_string(),
        line: pos.line,
        column: pos.column,
    }
}

#[cfg(test)]
#[path = "splitter_test.rs"]
mod tests;
