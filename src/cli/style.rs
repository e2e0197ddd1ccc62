//! Terminal styling for submission reports
//!
//! Every styled value carries a [`Tone`] and the stream it is printed on;
//! `owo-colors` decides per stream whether color is emitted (`NO_COLOR`,
//! `CLICOLOR`, `CLICOLOR_FORCE`, TTY detection).
//!
//! | Tone       | Look   | Stream | Used for                                |
//! |------------|--------|--------|-----------------------------------------|
//! | `Accent`   | Cyan   | stdout | Commit ids, tickets, branch names       |
//! | `Landed`   | Green  | stdout | Outcomes that landed, success markers   |
//! | `Rejected` | Red    | stdout | Outcomes that did not land, errors      |
//! | `Warn`     | Yellow | stderr | Hook exit codes, lock contention        |
//! | `Muted`    | Dim    | stdout | Audit messages, old tips                |
//! | `Emphasis` | Bold   | stdout | Phase headers, new tips                 |

use ff_submit::outcome::Outcome;
use owo_colors::{OwoColorize, Stream, Style};
use std::fmt::{self, Display};

/// Semantic color of a printed value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Accent,
    Landed,
    Rejected,
    Warn,
    Muted,
    Emphasis,
}

impl Tone {
    const fn style(self) -> Style {
        match self {
            Self::Accent => Style::new().cyan(),
            Self::Landed => Style::new().green(),
            Self::Rejected => Style::new().red(),
            Self::Warn => Style::new().yellow(),
            Self::Muted => Style::new().dimmed(),
            Self::Emphasis => Style::new().bold(),
        }
    }

    const fn stream(self) -> Stream {
        match self {
            Self::Warn => Stream::Stderr,
            _ => Stream::Stdout,
        }
    }
}

/// A value printed in a [`Tone`]
#[derive(Clone, Debug)]
pub struct Styled<T> {
    value: T,
    tone: Tone,
    stream: Stream,
}

impl<T> Styled<T> {
    const fn new(value: T, tone: Tone) -> Self {
        Self {
            value,
            tone,
            stream: tone.stream(),
        }
    }

    /// Detect color support on stderr instead
    #[must_use]
    pub const fn for_stderr(mut self) -> Self {
        self.stream = Stream::Stderr;
        self
    }

    /// Detect color support on stdout instead
    #[must_use]
    pub const fn for_stdout(mut self) -> Self {
        self.stream = Stream::Stdout;
        self
    }
}

impl<T: Display> Display for Styled<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let style = self.tone.style();
        write!(
            f,
            "{}",
            self.value.if_supports_color(self.stream, |v| v.style(style))
        )
    }
}

/// Tones for anything printable
pub trait Stylize: Display {
    /// Commit ids, tickets, branch names
    fn accent(&self) -> Styled<&Self> {
        Styled::new(self, Tone::Accent)
    }

    /// Error text, on stderr
    fn error(&self) -> Styled<&Self> {
        Styled::new(self, Tone::Rejected).for_stderr()
    }

    /// Warnings, on stderr
    fn warn(&self) -> Styled<&Self> {
        Styled::new(self, Tone::Warn)
    }

    /// Secondary information
    fn muted(&self) -> Styled<&Self> {
        Styled::new(self, Tone::Muted)
    }

    /// Headers and results
    fn emphasis(&self) -> Styled<&Self> {
        Styled::new(self, Tone::Emphasis)
    }
}

impl<T: Display + ?Sized> Stylize for T {}

/// Green check mark
pub const fn check() -> Styled<&'static str> {
    Styled::new("✓", Tone::Landed)
}

/// Red cross
pub const fn cross() -> Styled<&'static str> {
    Styled::new("✗", Tone::Rejected)
}

/// Arrow in front of a hook run
pub const fn arrow() -> Styled<&'static str> {
    Styled::new("→", Tone::Accent)
}

const fn tone_of(outcome: Outcome) -> Tone {
    if outcome.is_success() {
        Tone::Landed
    } else {
        Tone::Rejected
    }
}

/// Outcome tag, green if the commit landed and red otherwise
pub fn outcome(outcome: Outcome) -> Styled<String> {
    Styled::new(outcome.to_string(), tone_of(outcome))
}

/// Check mark or cross for an outcome line
pub const fn outcome_marker(outcome: Outcome) -> Styled<&'static str> {
    if outcome.is_success() { check() } else { cross() }
}
