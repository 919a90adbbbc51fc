// SPDX-License-Identifier: MIT
//
// n-term: terminal core for n-line.
//
// Two engines, plus what they stand on:
//
//   - `display`: the redraw engine. Remembers the last frame of styled
//     lines, diffs each new frame against it and emits the cheapest byte
//     sequence the terminal's capabilities allow. One write per frame.
//   - `line_discipline`: an in-process tty. Raw bytes come in from a master
//     side, signal characters become signals, CR/NL are translated, input is
//     echoed, and the result is handed to a consumer through a bounded pipe.
//
// Capabilities are looked up through a two-method trait, so the engine works
// with the built-in tables, a real terminfo reader, or a test double. Output
// goes through a mutex-serialized sink that the redraw engine and echo share.

pub mod ansi;
pub mod attributes;
pub mod capability;
pub mod diff;
pub mod display;
pub mod error;
pub mod line;
pub mod line_discipline;
pub mod output;
pub mod pipe;
pub mod pump;
pub mod session;
pub mod signal;
pub mod sink;
pub mod style;
pub mod stty;
pub mod terminal;
pub mod tparm;
pub mod width;

pub use error::{Error, Result};
