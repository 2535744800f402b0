use std::env;
use std::fmt;
use std::io::{self, BufRead, Write};
use std::path::Path;

use failure::{Fail, ResultExt};
use log::warn;
use rustyline::{
    self,
    completion::{Completer, FilenameCompleter, Pair},
    error::ReadlineError,
    highlight::Highlighter,
    hint::Hinter,
    validate::Validator,
    Cmd, CompletionType, Config, Helper, KeyEvent,
};

use crate::errors::{ErrorKind, Result};

struct EditorHelper(FilenameCompleter);

impl Completer for EditorHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &rustyline::Context<'_>,
    ) -> ::std::result::Result<(usize, Vec<Pair>), ReadlineError> {
        self.0.complete(line, pos, ctx)
    }
}

impl Hinter for EditorHelper {
    type Hint = String;

    fn hint(&self, _line: &str, _pos: usize, _ctx: &rustyline::Context<'_>) -> Option<Self::Hint> {
        None
    }
}

impl Highlighter for EditorHelper {}

impl Helper for EditorHelper {}

impl Validator for EditorHelper {}

enum Input {
    Terminal(rustyline::Editor<EditorHelper>),
    /// Commands piped in or read from a file; no line editing.
    Pipe(io::Stdin),
}

/// Reads command lines, with line editing when stdin is a terminal.
pub struct Editor {
    input: Input,
}

impl Editor {
    pub fn new(interactive: bool) -> Editor {
        let input = if interactive {
            let config = Config::builder()
                .max_history_size(0)
                .completion_type(CompletionType::Circular)
                .build();

            let mut internal = rustyline::Editor::with_config(config);
            internal.set_helper(Some(EditorHelper(FilenameCompleter::new())));
            // The shell itself is never suspended from the prompt.
            internal.bind_sequence(KeyEvent::ctrl('Z'), Cmd::Noop);
            Input::Terminal(internal)
        } else {
            Input::Pipe(io::stdin())
        };

        Editor { input }
    }

    pub fn is_interactive(&self) -> bool {
        match self.input {
            Input::Terminal(_) => true,
            Input::Pipe(_) => false,
        }
    }

    /// Returns `None` when end of file is reached. An interrupted line comes
    /// back empty.
    pub fn readline(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.input {
            Input::Terminal(ref mut internal) => match internal.readline(prompt) {
                Ok(line) => Ok(Some(line)),
                Err(ReadlineError::Eof) => Ok(None),
                Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
                Err(ReadlineError::Utf8Error) => {
                    warn!("discarding input line that is not valid UTF-8");
                    Ok(Some(String::new()))
                }
                Err(e) => Err(e.context(ErrorKind::Readline).into()),
            },
            Input::Pipe(ref stdin) => {
                print!("{}", prompt);
                io::stdout().flush().context(ErrorKind::Io)?;

                read_line_lossy(&mut stdin.lock())
            }
        }
    }
}

/// Reads one line. Bytes that are not valid UTF-8 are replaced instead of
/// failing the read.
fn read_line_lossy<R: BufRead>(reader: &mut R) -> Result<Option<String>> {
    let mut line = Vec::new();
    if reader.read_until(b'\n', &mut line).context(ErrorKind::Io)? == 0 {
        return Ok(None);
    }

    match String::from_utf8(line) {
        Ok(line) => Ok(Some(line)),
        Err(e) => {
            warn!("input line is not valid UTF-8: {}", e);
            Ok(Some(String::from_utf8_lossy(e.as_bytes()).into_owned()))
        }
    }
}

impl fmt::Debug for Editor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Editor {{ interactive: {} }}", self.is_interactive())
    }
}

/// The prompt for the current working directory.
pub fn prompt() -> String {
    match env::current_dir() {
        Ok(cwd) => render_prompt(&cwd),
        Err(e) => {
            warn!("unable to get current directory: {}", e);
            render_prompt(Path::new(""))
        }
    }
}

/// `[nyush <basename>]$ `, where the root directory's basename is `/`.
pub fn render_prompt(cwd: &Path) -> String {
    let basename = cwd
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_else(|| "/".into());
    format!("[nyush {}]$ ", basename)
}
