use super::ProgressState;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, Write};

const BAR_TEMPLATE: &str =
    "[{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} {msg} ({bytes_per_sec}, {eta})";

/// Where status output goes.
pub enum Renderer {
    /// One plain text line per event.
    Lines(Box<dyn Write + Send>),
    /// One bar per task, titles printed above the bars.
    Bars(MultiProgress),
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Renderer::Lines(_) => f.write_str("Renderer::Lines"),
            Renderer::Bars(_) => f.write_str("Renderer::Bars"),
        }
    }
}

impl Renderer {
    pub fn lines(writer: impl Write + Send + 'static) -> Self {
        Renderer::Lines(Box::new(writer))
    }

    pub fn stdout() -> Self {
        Self::lines(io::stdout())
    }

    pub fn bars() -> Self {
        Renderer::Bars(MultiProgress::new())
    }

    pub fn bars_with_target(target: ProgressDrawTarget) -> Self {
        Renderer::Bars(MultiProgress::with_draw_target(target))
    }

    pub(super) fn start(&mut self, total: u64, description: &str) -> Option<ProgressBar> {
        match self {
            Renderer::Lines(_) => None,
            Renderer::Bars(mp) => {
                let bar = mp.add(ProgressBar::new(total));
                let style = ProgressStyle::with_template(BAR_TEMPLATE)
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#-");
                bar.set_style(style);
                bar.set_message(description.to_string());
                Some(bar)
            }
        }
    }

    pub(super) fn line(&mut self, line: &str) -> io::Result<()> {
        match self {
            Renderer::Lines(writer) => {
                writeln!(writer, "{}", line)?;
                writer.flush()
            }
            Renderer::Bars(mp) => mp.println(line),
        }
    }

    pub(super) fn update(&mut self, state: &ProgressState, line: &str) -> io::Result<()> {
        match (self, &state.bar) {
            (Renderer::Bars(_), Some(bar)) => {
                bar.set_position(state.completed);
                Ok(())
            }
            (renderer, _) => renderer.line(line),
        }
    }

    pub(super) fn complete(&mut self, state: &ProgressState, line: &str) -> io::Result<()> {
        match (self, &state.bar) {
            (Renderer::Bars(_), Some(bar)) => {
                bar.set_position(state.completed);
                bar.finish_with_message(format!("Completed: {}", state.description));
                Ok(())
            }
            (renderer, _) => renderer.line(line),
        }
    }
}
