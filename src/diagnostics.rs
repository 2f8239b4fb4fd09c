use crate::lexer::token::Position;

/// A compilation error with an optional source position. Collected per
/// phase; the driver prints whatever a phase accumulated and exits.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub message: String,
    pub position: Option<Position>,
}

impl Diagnostic {
    pub fn simple(message: impl Into<String>) -> Diagnostic {
        Diagnostic {
            message: message.into(),
            position: None,
        }
    }

    pub fn at(position: Position, message: impl Into<String>) -> Diagnostic {
        Diagnostic {
            message: message.into(),
            position: Some(position),
        }
    }
}

/// Print a compact, rustc-like diagnostic to stderr.
pub fn report(file: Option<&str>, diagnostic: &Diagnostic) {
    let red = "\x1b[31m";
    let reset = "\x1b[0m";

    eprintln!("{}error{}: {}", red, reset, diagnostic.message);
    match (file, diagnostic.position) {
        (Some(path), Some(pos)) => {
            eprintln!("  --> {}:{}:{}", path, pos.start_line, pos.start_col + 1)
        }
        (Some(path), None) => eprintln!("  --> {}", path),
        (None, Some(pos)) => eprintln!("  --> {}:{}", pos.start_line, pos.start_col + 1),
        (None, None) => {}
    }
}
