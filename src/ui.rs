use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiMode {
    Auto,
    Plain,
    Pretty,
}

impl UiMode {
    pub fn parse(flag: &str) -> Self {
        match flag {
            "plain" => UiMode::Plain,
            "pretty" => UiMode::Pretty,
            _ => UiMode::Auto,
        }
    }
}

/// Stderr progress reporting for the replay tool.
///
/// The live counter is only drawn on a terminal, and never in auto mode
/// when stdout carries the report stream to a terminal as well.
#[derive(Clone, Debug)]
pub struct Ui {
    pretty: bool,
}

impl Ui {
    pub fn new(mode: UiMode, stderr_is_tty: bool, stdout_is_tty: bool) -> Self {
        let pretty = stderr_is_tty
            && match mode {
                UiMode::Pretty => true,
                UiMode::Auto => !stdout_is_tty,
                UiMode::Plain => false,
            };
        Self { pretty }
    }

    /// Running counter of replayed frames and resets.
    pub fn frames(&self) -> FrameCounter {
        let bar = self.pretty.then(|| {
            let bar = ProgressBar::new_spinner();
            bar.set_draw_target(ProgressDrawTarget::stderr());
            bar.enable_steady_tick(Duration::from_millis(120));
            let style = ProgressStyle::with_template("{spinner} {pos} frames, {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            bar.set_style(style);
            bar
        });
        FrameCounter {
            bar,
            tally: ReplayTally::default(),
            start: Instant::now(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplayTally {
    pub frames: u64,
    pub falls: u64,
    pub resets: u64,
}

impl ReplayTally {
    fn summary(&self) -> String {
        format!(
            "{} frames, {} with falls, {} resets",
            self.frames, self.falls, self.resets
        )
    }
}

pub struct FrameCounter {
    bar: Option<ProgressBar>,
    tally: ReplayTally,
    start: Instant,
}

impl FrameCounter {
    pub fn record(&mut self, fall_detected: bool) {
        self.tally.frames += 1;
        if fall_detected {
            self.tally.falls += 1;
        }
        if let Some(bar) = &self.bar {
            bar.set_position(self.tally.frames);
            bar.set_message(format!("{} with falls", self.tally.falls));
        }
    }

    pub fn record_reset(&mut self) {
        self.tally.resets += 1;
    }

    /// Clear the live counter and print the replay summary.
    pub fn finish(self) -> ReplayTally {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
        let elapsed = self.start.elapsed();
        eprintln!(
            "replayed {} in {:.2}s",
            self.tally.summary(),
            elapsed.as_secs_f64()
        );
        self.tally
    }
}
