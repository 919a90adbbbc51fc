// SPDX-License-Identifier: MIT
//
// n-term demo: the software line discipline on a real keyboard.
//
// The host tty goes raw, stdin is pumped into a LineDisciplineTerminal
// with cooked attributes, and every byte the consumer receives is printed
// in hex next to the echo. Type, press Enter, try ^C, ^Z and ^\ to see
// signals raised instead of data. ^D quits.
//
// Usage:
//   cargo run -p n-term --example demo [-- "stty settings"]

use std::io::{self, Read, Write};

use n_term::line_discipline::LineDisciplineTerminal;
use n_term::pump::InputPump;
use n_term::signal::{Signal, SignalHandler};
use n_term::stty;
use n_term::terminal::RawMode;

fn main() -> io::Result<()> {
    let term = LineDisciplineTerminal::with_sink("demo", io::stdout());
    if let Some(settings) = std::env::args().nth(1) {
        let mut attrs = term.attributes();
        stty::apply(&mut attrs, &settings)?;
        term.set_attributes(attrs);
    }
    println!("{}\r", stty::format(&term.attributes()));

    // Handlers must not own a terminal handle: the terminal owns them.
    for signal in Signal::ALL {
        term.handle(signal, SignalHandler::custom(|s| eprint!(" <{s:?}>\r\n")));
    }

    let mut raw = RawMode::enable()?;
    let mut pump = InputPump::spawn_stdin(term.clone())?;

    let mut reader = term.reader();
    let mut writer = term.writer();
    let mut buf = [0u8; 64];
    'outer: loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        for &b in &buf[..n] {
            if b == 0x04 {
                break 'outer;
            }
            write!(writer, "[{b:02x}]")?;
        }
    }

    pump.stop();
    term.close()?;
    raw.disable()?;
    println!();
    Ok(())
}
