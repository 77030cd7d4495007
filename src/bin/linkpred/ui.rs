use indicatif::{ProgressBar, ProgressStyle};
use linkpred::ScoredPair;
use nu_ansi_term::{Color, Style};
use std::fmt::{Debug, Display};
use std::io::IsTerminal;
use std::time::{Duration, Instant};

#[derive(Copy, Clone, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum Theme {
    Auto,
    Color,
    Plain,
}

pub struct Ui {
    palette: Palette,
    paint: bool,
    quiet: bool,
}

impl Ui {
    pub fn new(theme: Theme, quiet: bool) -> Self {
        let stdout_is_tty = std::io::stdout().is_terminal();
        let paint = match theme {
            Theme::Plain => false,
            Theme::Auto => stdout_is_tty,
            Theme::Color => true,
        } && !quiet;

        #[cfg(windows)]
        if paint {
            let _ = nu_ansi_term::enable_ansi_support();
        }

        Self {
            palette: if paint {
                Palette::color()
            } else {
                Palette::plain()
            },
            paint,
            quiet,
        }
    }

    pub fn section<'a, I, V>(&self, title: &str, rows: I)
    where
        I: IntoIterator<Item = (&'a str, V)>,
        V: Display,
    {
        let rows: Vec<(&str, String)> = rows
            .into_iter()
            .map(|(key, value)| (key, value.to_string()))
            .collect();
        if rows.is_empty() {
            return;
        }
        self.heading(title);
        let key_width = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        for (key, value) in rows {
            println!(
                "  {} {}",
                self.palette.key.paint(format!("{key:>key_width$}:")),
                self.palette.value.paint(value)
            );
        }
    }

    /// Prints a ranking as `rank. source -> target  score`.
    pub fn ranking<V: Debug>(&self, title: &str, results: &[ScoredPair<V>]) {
        self.heading(title);
        if results.is_empty() {
            println!("  (no scored pairs)");
            return;
        }
        let width = results.len().to_string().len();
        for (rank, pair) in results.iter().enumerate() {
            println!(
                "  {} {:?} -> {:?}  {}",
                self.palette.key.paint(format!("{:>width$}.", rank + 1)),
                pair.source,
                pair.target,
                self.palette.score.paint(format!("{:.6}", pair.score))
            );
        }
    }

    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        println!("{} {message}", self.palette.success.paint(SUCCESS_ICON));
    }

    pub fn warn(&self, message: &str) {
        eprintln!("{} {message}", self.palette.warn.paint(WARNING_ICON));
    }

    /// Starts a spinner that stays up until the guard is finished or dropped.
    pub fn task(&self, label: impl Into<String>) -> TaskGuard<'_> {
        let label = label.into();
        let pb = (self.paint && !self.quiet).then(|| {
            let style = ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ");
            let pb = ProgressBar::new_spinner().with_style(style);
            pb.set_message(label.clone());
            pb.enable_steady_tick(Duration::from_millis(120));
            pb
        });
        TaskGuard {
            ui: self,
            label,
            start: Instant::now(),
            finished: false,
            pb,
        }
    }

    fn heading(&self, title: &str) {
        if self.quiet {
            println!("{title}");
        } else {
            println!("{}", self.palette.heading.paint(format!("{HEADING_ICON} {title}")));
        }
    }
}

pub struct TaskGuard<'a> {
    ui: &'a Ui,
    label: String,
    start: Instant,
    finished: bool,
    pb: Option<ProgressBar>,
}

impl TaskGuard<'_> {
    pub fn finish(mut self) -> Duration {
        self.finished = true;
        if let Some(pb) = self.pb.take() {
            pb.finish_and_clear();
        }
        self.start.elapsed()
    }
}

impl Drop for TaskGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Some(pb) = self.pb.take() {
            pb.finish_and_clear();
        }
        self.ui.warn(&format!(
            "{} failed after {}",
            self.label,
            format_duration(self.start.elapsed())
        ));
    }
}

pub fn format_duration(duration: Duration) -> String {
    if duration.as_secs_f64() >= 1.0 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{:.0}ms", duration.as_secs_f64() * 1_000.0)
    }
}

struct Palette {
    heading: Style,
    key: Style,
    value: Style,
    score: Style,
    success: Style,
    warn: Style,
}

impl Palette {
    fn color() -> Self {
        Self {
            heading: Style::new().fg(Color::Purple).bold(),
            key: Style::new().fg(Color::LightBlue).bold(),
            value: Style::new(),
            score: Style::new().fg(Color::LightGreen),
            success: Style::new().fg(Color::LightGreen).bold(),
            warn: Style::new().fg(Color::Yellow).bold(),
        }
    }

    fn plain() -> Self {
        Self {
            heading: Style::new(),
            key: Style::new(),
            value: Style::new(),
            score: Style::new(),
            success: Style::new(),
            warn: Style::new(),
        }
    }
}

const HEADING_ICON: &str = "▸";
const SUCCESS_ICON: &str = "✔";
const WARNING_ICON: &str = "⚠";
