//! Audio container I/O used by the command-line tool.

pub mod wav;
