//! Connections used by `readLines`, `writeLines`, `textConnection`,
//! `file` and `close`.
//!
//! A connection value is an integer vector holding the connection number
//! with class `c("<kind>", "connection")`; the session's
//! [`ConnectionTable`] maps numbers to live connections. Number 1 is the
//! console, which collects written lines in memory.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use subset_r_vm_runtime::{RError, RResult, RString, Value, Vector};

pub const STDOUT: i32 = 1;
const FIRST_USER_CONNECTION: i32 = 3;

/// One open (or openable) connection.
pub trait Connection: fmt::Debug {
    fn description(&self) -> &str;

    /// First element of the class vector, e.g. `"file"`.
    fn class(&self) -> &'static str;

    /// Read up to `n` lines, all remaining lines for `None`.
    fn read_lines(&mut self, n: Option<usize>) -> RResult<Vec<String>>;

    /// Write each line followed by `sep`.
    fn write_lines(&mut self, lines: &[String], sep: &str) -> RResult<()>;

    fn close(&mut self) -> RResult<()> {
        Ok(())
    }
}

fn cannot_read() -> RError {
    RError::io_message("cannot read from this connection")
}

fn cannot_write() -> RError {
    RError::io_message("cannot write to this connection")
}

/// The console. Written text is kept line by line.
#[derive(Debug, Default)]
pub struct ConsoleConnection {
    output: Vec<String>,
    partial: String,
}

impl ConsoleConnection {
    /// Completed lines written so far.
    pub fn lines(&self) -> &[String] {
        &self.output
    }

    pub fn take_lines(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }
}

impl Connection for ConsoleConnection {
    fn description(&self) -> &str {
        "stdout"
    }

    fn class(&self) -> &'static str {
        "terminal"
    }

    fn read_lines(&mut self, _n: Option<usize>) -> RResult<Vec<String>> {
        Err(cannot_read())
    }

    fn write_lines(&mut self, lines: &[String], sep: &str) -> RResult<()> {
        for line in lines {
            self.partial.push_str(line);
            self.partial.push_str(sep);
        }
        while let Some(pos) = self.partial.find('\n') {
            let rest = self.partial.split_off(pos + 1);
            let mut done = std::mem::replace(&mut self.partial, rest);
            done.pop();
            self.output.push(done);
        }
        Ok(())
    }
}

/// Read-only connection over a character vector.
#[derive(Debug)]
pub struct TextConnection {
    description: String,
    lines: Vec<String>,
    position: usize,
}

impl TextConnection {
    /// NA elements read back as `"NA"`.
    pub fn new<S: Into<String>>(description: S, text: &[RString]) -> Self {
        TextConnection {
            description: description.into(),
            lines: text.iter().map(|s| s.as_display_str().to_string()).collect(),
            position: 0,
        }
    }
}

impl Connection for TextConnection {
    fn description(&self) -> &str {
        &self.description
    }

    fn class(&self) -> &'static str {
        "textConnection"
    }

    fn read_lines(&mut self, n: Option<usize>) -> RResult<Vec<String>> {
        let remaining = self.lines.len() - self.position;
        let take = n.map_or(remaining, |n| n.min(remaining));
        let out = self.lines[self.position..self.position + take].to_vec();
        self.position += take;
        Ok(out)
    }

    fn write_lines(&mut self, _lines: &[String], _sep: &str) -> RResult<()> {
        Err(cannot_write())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    Write,
    Append,
}

impl OpenMode {
    /// Parse an `open` argument. The empty string means "not opened".
    pub fn parse(mode: &str) -> RResult<Option<OpenMode>> {
        Ok(match mode {
            "" => None,
            "r" | "rt" | "rb" => Some(OpenMode::Read),
            "w" | "wt" | "wb" => Some(OpenMode::Write),
            "a" | "at" | "ab" => Some(OpenMode::Append),
            other => {
                return Err(RError::value_error(format!(
                    "unimplemented open mode: {}",
                    other
                )))
            }
        })
    }
}

#[derive(Debug)]
enum FileState {
    Closed,
    Reading(BufReader<File>),
    Writing(BufWriter<File>),
}

/// Connection to a file on disk.
///
/// A connection created without an open mode opens the file for each
/// `readLines`/`writeLines` call and closes it again, so every read starts
/// at the beginning and every write truncates.
#[derive(Debug)]
pub struct FileConnection {
    path: PathBuf,
    description: String,
    mode: Option<OpenMode>,
    state: FileState,
}

impl FileConnection {
    /// Create the connection, opening the file now if `mode` says so.
    pub fn open(description: &str, mode: Option<OpenMode>) -> RResult<Self> {
        let mut conn = FileConnection {
            path: expand_tilde(description),
            description: description.to_string(),
            mode,
            state: FileState::Closed,
        };
        if let Some(mode) = mode {
            conn.state = conn.open_state(mode)?;
        }
        Ok(conn)
    }

    fn open_state(&self, mode: OpenMode) -> RResult<FileState> {
        let result = match mode {
            OpenMode::Read => File::open(&self.path).map(|f| FileState::Reading(BufReader::new(f))),
            OpenMode::Write => {
                File::create(&self.path).map(|f| FileState::Writing(BufWriter::new(f)))
            }
            OpenMode::Append => OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .map(|f| FileState::Writing(BufWriter::new(f))),
        };
        result.map_err(|e| RError::io(format!("cannot open file '{}'", self.description), e))
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.state, FileState::Closed)
    }

    /// Mode the connection was opened with, `None` once closed.
    pub fn mode(&self) -> Option<OpenMode> {
        self.mode
    }
}

fn read_from<R: BufRead>(reader: &mut R, n: Option<usize>) -> std::io::Result<Vec<String>> {
    let mut out = Vec::new();
    while n.map_or(true, |n| out.len() < n) {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        out.push(line);
    }
    Ok(out)
}

fn write_to<W: Write>(writer: &mut W, lines: &[String], sep: &str) -> std::io::Result<()> {
    for line in lines {
        writer.write_all(line.as_bytes())?;
        writer.write_all(sep.as_bytes())?;
    }
    writer.flush()
}

impl Connection for FileConnection {
    fn description(&self) -> &str {
        &self.description
    }

    fn class(&self) -> &'static str {
        "file"
    }

    fn read_lines(&mut self, n: Option<usize>) -> RResult<Vec<String>> {
        let reading_error = |e: std::io::Error| RError::io("error reading connection", e);
        if let FileState::Closed = self.state {
            return match self.open_state(OpenMode::Read)? {
                FileState::Reading(mut reader) => read_from(&mut reader, n).map_err(reading_error),
                _ => Err(cannot_read()),
            };
        }
        match &mut self.state {
            FileState::Reading(reader) => read_from(reader, n).map_err(reading_error),
            _ => Err(cannot_read()),
        }
    }

    fn write_lines(&mut self, lines: &[String], sep: &str) -> RResult<()> {
        let writing_error = |e: std::io::Error| RError::io("error writing connection", e);
        if let FileState::Closed = self.state {
            return match self.open_state(OpenMode::Write)? {
                FileState::Writing(mut writer) => {
                    write_to(&mut writer, lines, sep).map_err(writing_error)
                }
                _ => Err(cannot_write()),
            };
        }
        match &mut self.state {
            FileState::Writing(writer) => write_to(writer, lines, sep).map_err(writing_error),
            _ => Err(cannot_write()),
        }
    }

    fn close(&mut self) -> RResult<()> {
        if let FileState::Writing(writer) = &mut self.state {
            writer
                .flush()
                .map_err(|e| RError::io("error closing connection", e))?;
        }
        self.state = FileState::Closed;
        self.mode = None;
        Ok(())
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(path),
    }
}

/// Live connections of one session.
#[derive(Debug)]
pub struct ConnectionTable {
    console: ConsoleConnection,
    open: BTreeMap<i32, Box<dyn Connection>>,
    next_id: i32,
}

impl Default for ConnectionTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionTable {
    pub fn new() -> Self {
        ConnectionTable {
            console: ConsoleConnection::default(),
            open: BTreeMap::new(),
            next_id: FIRST_USER_CONNECTION,
        }
    }

    /// Register `conn` and return its number.
    pub fn add(&mut self, conn: Box<dyn Connection>) -> i32 {
        let id = self.next_id;
        self.next_id += 1;
        self.open.insert(id, conn);
        id
    }

    pub fn get_mut(&mut self, id: i32) -> RResult<&mut dyn Connection> {
        if id == STDOUT {
            return Ok(&mut self.console);
        }
        match self.open.get_mut(&id) {
            Some(conn) => Ok(conn.as_mut()),
            None => Err(RError::value_error("invalid connection")),
        }
    }

    /// Close and forget a connection. The console cannot be closed.
    pub fn close(&mut self, id: i32) -> RResult<()> {
        if id == STDOUT {
            return Err(RError::value_error("cannot close standard connections"));
        }
        let mut conn = self
            .open
            .remove(&id)
            .ok_or_else(|| RError::value_error("invalid connection"))?;
        conn.close()
    }

    pub fn console(&self) -> &ConsoleConnection {
        &self.console
    }

    pub fn console_mut(&mut self) -> &mut ConsoleConnection {
        &mut self.console
    }

    /// Number of user connections currently open.
    pub fn len(&self) -> usize {
        self.open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }
}

/// The value handed to user code for connection `id`.
pub fn connection_value(id: i32, class: &'static str) -> Value {
    let mut v = Vector::from_vec(vec![id]);
    v.attributes_mut()
        .set_class(Some(vec![RString::from(class), RString::from("connection")]));
    Value::IntVector(v)
}

/// Connection number of `value`, which must inherit from `connection`.
pub fn connection_id(value: &Value, param: &str) -> RResult<i32> {
    match value {
        Value::IntVector(v) if value.inherits("connection") && v.len() == 1 => Ok(v.as_slice()[0]),
        _ => Err(RError::value_error(format!(
            "'{}' is not a connection",
            param
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use subset_r_vm_runtime::attributes::CLASS;
    use subset_r_vm_runtime::ErrorKind;

    fn text(lines: &[&str]) -> Vec<RString> {
        lines.iter().map(|s| RString::from(*s)).collect()
    }

    #[test]
    fn test_text_connection_reads_incrementally() {
        let mut conn = TextConnection::new("x", &text(&["a", "b", "c"]));
        assert_eq!(conn.read_lines(Some(2)).unwrap(), vec!["a", "b"]);
        assert_eq!(conn.read_lines(None).unwrap(), vec!["c"]);
        assert!(conn.read_lines(None).unwrap().is_empty());
        assert_eq!(
            conn.write_lines(&["z".to_string()], "\n").unwrap_err().kind(),
            ErrorKind::Io
        );
    }

    #[test]
    fn test_console_splits_lines() {
        let mut console = ConsoleConnection::default();
        console
            .write_lines(&["a".to_string(), "b".to_string()], "\n")
            .unwrap();
        console.write_lines(&["c".to_string()], " ").unwrap();
        assert_eq!(console.lines(), &["a".to_string(), "b".to_string()]);
        console.write_lines(&["d".to_string()], "\n").unwrap();
        assert_eq!(console.lines().last().map(String::as_str), Some("c d"));
    }

    #[test]
    fn test_open_mode() {
        assert_eq!(OpenMode::parse("").unwrap(), None);
        assert_eq!(OpenMode::parse("rt").unwrap(), Some(OpenMode::Read));
        assert_eq!(OpenMode::parse("a").unwrap(), Some(OpenMode::Append));
        assert!(OpenMode::parse("r+").is_err());
    }

    #[test]
    fn test_missing_file_is_io_failure() {
        let err = FileConnection::open("/definitely/not/here.txt", Some(OpenMode::Read)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err
            .to_string()
            .starts_with("cannot open file '/definitely/not/here.txt'"));
    }

    #[test]
    fn test_table() {
        let mut table = ConnectionTable::new();
        let id = table.add(Box::new(TextConnection::new("x", &text(&["q"]))));
        assert_eq!(id, 3);
        assert_eq!(table.get_mut(id).unwrap().read_lines(None).unwrap(), vec!["q"]);
        table.close(id).unwrap();
        assert!(table.get_mut(id).is_err());
        assert!(table.close(STDOUT).is_err());
    }

    #[test]
    fn test_connection_value() {
        let v = connection_value(4, "file");
        assert_eq!(connection_id(&v, "con").unwrap(), 4);
        assert_eq!(
            connection_id(&Value::Integer(4), "con").unwrap_err().to_string(),
            "'con' is not a connection"
        );
        assert_eq!(
            v.get_attr(CLASS),
            Some(Value::string_vec(&["file", "connection"]))
        );
    }
}
