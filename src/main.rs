// SPDX-License-Identifier: MIT
//
// n-line: a small line editor driven by n-term.
//
// This binary wires the two halves of n-term together on a real terminal:
//
//   stdin → InputPump → LineDisciplineTerminal → reader → LineEditor
//   LineEditor → frame (prompt + buffer) → Session/Display → stdout
//
// The host tty is put in raw mode, so the in-process line discipline is the
// one turning ^C into a signal and Enter into '\n'. Echo is off: the Display
// draws the buffer itself, diffing each frame against the last.
//
// Inline mode redraws only the prompt line; accepted lines scroll away like
// in a shell. `--full-screen` keeps a history of accepted lines above the
// prompt and lets the Display use scrolling and screen clears.
//
// Logs go to the file named by N_LINE_LOG (filtered by RUST_LOG, default
// `debug`). Without it nothing is logged; the screen is ours.

use std::env;
use std::fs::File;
use std::io::{self, Write};
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use n_term::attributes::{Attributes, ControlChar};
use n_term::capability::Terminfo;
use n_term::display::DisplayOptions;
use n_term::line::StyledLine;
use n_term::line_discipline::LineDisciplineTerminal;
use n_term::pump::InputPump;
use n_term::session::Session;
use n_term::signal::{Signal, SignalHandler};
use n_term::style::{Color, Style};
use n_term::stty;
use n_term::terminal::{self, RawMode, Size};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const PROMPT: &str = "n-line> ";

/// How long a read waits before the loop checks for quit and resize.
const TICK: Duration = Duration::from_millis(100);

const FALLBACK_SIZE: Size = Size { cols: 80, rows: 24 };

const USAGE: &str = "\
usage: n-line [--full-screen] [--tab-width N] [--term NAME] [--stty SETTINGS]

  --full-screen     own the whole screen, keep accepted lines above the prompt
  --tab-width N     distance between tab stops (default 8)
  --term NAME       capability table to use instead of $TERM
  --stty SETTINGS   line discipline settings, e.g. \"intr ^G -isig\"

Enter accepts a line, ^D on an empty line or ^C quits, ^Z suspends.";

// ─── Options ────────────────────────────────────────────────────────────────

#[derive(Debug, Default, PartialEq, Eq)]
struct Options {
    display: DisplayOptions,
    term: Option<String>,
    stty: Option<String>,
    help: bool,
}

impl Options {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, String> {
        let mut options = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--full-screen" => options.display.full_screen = true,
                "--tab-width" => {
                    let value = args.next().ok_or("--tab-width needs a value")?;
                    options.display.tab_width = match value.parse() {
                        Ok(n) if n > 0 => n,
                        _ => return Err(format!("invalid tab width: {value}")),
                    };
                }
                "--term" => options.term = Some(args.next().ok_or("--term needs a value")?),
                "--stty" => options.stty = Some(args.next().ok_or("--stty needs a value")?),
                "-h" | "--help" => options.help = true,
                other => return Err(format!("unknown argument: {other}")),
            }
        }
        Ok(options)
    }
}

// ─── Line editor ────────────────────────────────────────────────────────────

/// What a processed byte asks the main loop to do.
#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Continue,
    Accept(String),
    Quit,
}

/// The edit buffer. Knows nothing about the terminal beyond which control
/// characters the line discipline says mean erase and kill.
#[derive(Debug, Default)]
struct LineEditor {
    buffer: String,
    /// Bytes of an incomplete UTF-8 sequence.
    pending: Vec<u8>,
}

impl LineEditor {
    fn feed(&mut self, byte: u8, attrs: &Attributes) -> Outcome {
        if attrs.is_char(ControlChar::Erase, byte) || byte == 0x08 {
            self.buffer.pop();
            return Outcome::Continue;
        }
        if attrs.is_char(ControlChar::Kill, byte) {
            self.buffer.clear();
            return Outcome::Continue;
        }
        if attrs.is_char(ControlChar::Werase, byte) {
            let kept = self.buffer.trim_end().rfind(' ').map_or(0, |i| i + 1);
            self.buffer.truncate(kept);
            return Outcome::Continue;
        }
        if attrs.is_char(ControlChar::Eof, byte) {
            return if self.buffer.is_empty() {
                Outcome::Quit
            } else {
                Outcome::Continue
            };
        }
        match byte {
            b'\n' | b'\r' => Outcome::Accept(std::mem::take(&mut self.buffer)),
            b'\t' | 0x20..=0x7e => {
                self.buffer.push(char::from(byte));
                Outcome::Continue
            }
            0x80.. => {
                self.pending.push(byte);
                match std::str::from_utf8(&self.pending) {
                    Ok(s) => {
                        self.buffer.push_str(s);
                        self.pending.clear();
                    }
                    // Malformed: drop it. Incomplete: wait for more.
                    Err(e) if e.error_len().is_some() => self.pending.clear(),
                    Err(_) => {}
                }
                Outcome::Continue
            }
            _ => Outcome::Continue,
        }
    }

    /// The prompt followed by the buffer, unwrapped.
    fn frame(&self) -> StyledLine {
        let mut line = StyledLine::styled(PROMPT, Style::new().fg(Color::Ansi256(2)).bold());
        line.push_str(&self.buffer, Style::default());
        line
    }
}

/// Lay out the screen: accepted history (full-screen only), then the prompt
/// line wrapped at the screen width. Returns the rows and the cursor offset.
fn compose(
    editor: &LineEditor,
    history: &[String],
    size: Size,
    tab_width: usize,
) -> (Vec<StyledLine>, usize) {
    let columns = usize::from(size.cols).max(1);
    let prompt_rows = editor.frame().expand_tabs(tab_width).column_split(columns);

    let room = usize::from(size.rows).saturating_sub(prompt_rows.len());
    let skip = history.len().saturating_sub(room);
    let mut lines: Vec<StyledLine> = history[skip..]
        .iter()
        .flat_map(|h| StyledLine::from(h.as_str()).expand_tabs(tab_width).column_split(columns))
        .collect();
    // A wrapped history entry can still overflow.
    let overflow = lines.len().saturating_sub(room);
    lines = lines.split_off(overflow);

    let row = lines.len() + prompt_rows.len() - 1;
    let col = prompt_rows.last().map_or(0, StyledLine::column_length);
    lines.extend(prompt_rows);
    (lines, row * columns + col)
}

// ─── Main loop ──────────────────────────────────────────────────────────────

fn init_logging() {
    let Some(path) = env::var_os("N_LINE_LOG") else {
        return;
    };
    let file = match File::create(&path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("n-line: cannot open log file {}: {e}", path.to_string_lossy());
            return;
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
}

/// A flag the handler for `signal` sets.
fn flag_on<W: Write>(term: &LineDisciplineTerminal<W>, signal: Signal) -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    let set = Arc::clone(&flag);
    term.handle(
        signal,
        SignalHandler::custom(move |_| set.store(true, Ordering::SeqCst)),
    );
    flag
}

fn run(options: &Options) -> io::Result<()> {
    let caps = options
        .term
        .as_deref()
        .map_or_else(Terminfo::from_env, Terminfo::for_name);
    let mut size = terminal::get_size().unwrap_or(FALLBACK_SIZE);
    info!(term = caps.name(), cols = size.cols, rows = size.rows, "starting");

    let mut raw = RawMode::enable()?;
    let mut session = Session::install(caps, io::stdout(), size, options.display);
    let term = session.line_discipline("stdin");
    term.set_echo(false);
    if let Some(settings) = &options.stty {
        let mut attrs = term.attributes();
        stty::apply(&mut attrs, settings)?;
        term.set_attributes(attrs);
    }

    let quit = flag_on(&term, Signal::Int);
    let suspend = flag_on(&term, Signal::Tstp);
    let repaint = flag_on(&term, Signal::Cont);

    let mut pump = InputPump::spawn_stdin(term.clone())?;
    let reader = term.reader();
    let mut editor = LineEditor::default();
    let mut history = Vec::new();
    let mut buf = [0u8; 256];

    session.clear();
    loop {
        let (lines, cursor) = compose(&editor, &history, size, options.display.tab_width);
        session.update(&lines, Some(cursor))?;

        if quit.load(Ordering::SeqCst) {
            break;
        }
        if suspend.swap(false, Ordering::SeqCst) {
            if !options.display.full_screen {
                term.writer().write_all(b"\n")?;
            }
            raw.disable()?;
            terminal::suspend()?;
            raw = RawMode::enable()?;
            term.raise(Signal::Cont)?;
        }
        if repaint.swap(false, Ordering::SeqCst) {
            // The shell drew over us while we were stopped.
            session.reset();
            session.clear();
            continue;
        }
        if let Some(now) = terminal::get_size() {
            if now != size {
                size = now;
                session.resize(size);
                term.set_size(size)?;
            }
        }

        let n = match reader.read_timeout(&mut buf, TICK)? {
            None => continue,
            Some(0) => break,
            Some(n) => n,
        };
        let attrs = term.attributes();
        for &byte in &buf[..n] {
            match editor.feed(byte, &attrs) {
                Outcome::Continue => {}
                Outcome::Quit => quit.store(true, Ordering::SeqCst),
                Outcome::Accept(line) => {
                    debug!(len = line.len(), "line accepted");
                    if options.display.full_screen {
                        history.push(format!("{PROMPT}{line}"));
                    } else {
                        // Show the whole line (a paste may not have been drawn
                        // yet), leave it on screen and start over below.
                        let shown = LineEditor {
                            buffer: line,
                            pending: Vec::new(),
                        };
                        let (lines, cursor) = compose(&shown, &[], size, options.display.tab_width);
                        session.update(&lines, Some(cursor))?;
                        term.writer().write_all(b"\n")?;
                        session.reset();
                    }
                }
            }
        }
    }

    if !options.display.full_screen {
        term.writer().write_all(b"\n")?;
    }
    pump.stop();
    term.close()?;
    raw.disable()?;
    info!("exiting");
    Ok(())
}

fn main() {
    let options = Options::parse(env::args().skip(1)).unwrap_or_else(|e| {
        eprintln!("n-line: {e}\n{USAGE}");
        process::exit(2);
    });
    if options.help {
        println!("{USAGE}");
        return;
    }

    init_logging();

    if let Err(e) = run(&options) {
        eprintln!("n-line: {e}");
        process::exit(1);
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    fn feed(editor: &mut LineEditor, bytes: &[u8]) -> Vec<Outcome> {
        let attrs = Attributes::default();
        bytes
            .iter()
            .map(|&b| editor.feed(b, &attrs))
            .filter(|o| *o != Outcome::Continue)
            .collect()
    }

    // ── Options ──────────────────────────────────────────────────────────

    #[test]
    fn parse_defaults() {
        let o = Options::parse(args(&[])).unwrap();
        assert_eq!(o.display, DisplayOptions::default());
        assert_eq!(o.term, None);
    }

    #[test]
    fn parse_all_flags() {
        let o = Options::parse(args(&[
            "--full-screen",
            "--tab-width",
            "4",
            "--term",
            "vt100",
            "--stty",
            "-isig",
        ]))
        .unwrap();
        assert!(o.display.full_screen);
        assert_eq!(o.display.tab_width, 4);
        assert_eq!(o.term.as_deref(), Some("vt100"));
        assert_eq!(o.stty.as_deref(), Some("-isig"));
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(Options::parse(args(&["--tab-width"])).is_err());
        assert!(Options::parse(args(&["--tab-width", "0"])).is_err());
        assert!(Options::parse(args(&["--tab-width", "x"])).is_err());
        assert!(Options::parse(args(&["--bogus"])).is_err());
    }

    // ── Editing ──────────────────────────────────────────────────────────

    #[test]
    fn typing_and_accepting() {
        let mut e = LineEditor::default();
        assert_eq!(feed(&mut e, b"ls -l\n"), vec![Outcome::Accept("ls -l".into())]);
        assert!(e.buffer.is_empty());
    }

    #[test]
    fn erase_kill_and_werase_follow_attributes() {
        let mut e = LineEditor::default();
        feed(&mut e, b"abc\x7f");
        assert_eq!(e.buffer, "ab");
        feed(&mut e, b" two\x17");
        assert_eq!(e.buffer, "ab ");
        feed(&mut e, b"\x15");
        assert_eq!(e.buffer, "");
    }

    #[test]
    fn eof_quits_only_on_empty_line() {
        let mut e = LineEditor::default();
        assert!(feed(&mut e, b"x\x04").is_empty());
        assert_eq!(feed(&mut e, b"\x7f\x04"), vec![Outcome::Quit]);
    }

    #[test]
    fn utf8_is_reassembled() {
        let mut e = LineEditor::default();
        feed(&mut e, "é中".as_bytes());
        assert_eq!(e.buffer, "é中");
        feed(&mut e, &[0xff, b'a']);
        assert_eq!(e.buffer, "é中a");
    }

    // ── Layout ───────────────────────────────────────────────────────────

    #[test]
    fn cursor_sits_after_buffer() {
        let mut e = LineEditor::default();
        feed(&mut e, b"hi");
        let (lines, cursor) = compose(&e, &[], FALLBACK_SIZE, 8);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text(), "n-line> hi");
        assert_eq!(cursor, 10);
    }

    #[test]
    fn long_input_wraps() {
        let mut e = LineEditor::default();
        feed(&mut e, b"0123456789");
        let size = Size { cols: 10, rows: 5 };
        let (lines, cursor) = compose(&e, &[], size, 8);
        assert_eq!(lines.len(), 2);
        assert_eq!(cursor, 18);
    }

    #[test]
    fn history_is_trimmed_to_screen() {
        let e = LineEditor::default();
        let history: Vec<String> = (0..10).map(|i| format!("line {i}")).collect();
        let size = Size { cols: 20, rows: 4 };
        let (lines, cursor) = compose(&e, &history, size, 8);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].text(), "line 7");
        assert_eq!(cursor, 3 * 20 + PROMPT.len());
    }
}
