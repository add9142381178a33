use cdnmap_core::ProgressFn;
use colored::*;
use indicatif::ProgressStyle;
use tracing::{Span, info_span};
use tracing_indicatif::span_ext::IndicatifSpanExt;

const TEMPLATE: &str = "{spinner:.blue} {msg} {wide_bar:.green/bright_black} {pos}/{len} [{elapsed}]";
const TICKS: &[&str] = &[
    "▁▁▁▁▁",
    "▁▂▂▂▁",
    "▁▄▂▄▁",
    "▂▄▆▄▂",
    "▄▆█▆▄",
    "▂▄▆▄▂",
    "▁▄▂▄▁",
    "▁▂▂▂▁",
];

/// Progress bar of a batch, carried by a tracing span so log lines print
/// above it.
pub struct BatchProgress {
    span: Span,
}

impl BatchProgress {
    /// `jobs` is the total number of jobs (twice the domains in double mode).
    /// `-qq` hides the bar.
    pub fn new(jobs: usize, q_level: u8, listening: bool) -> Self {
        let span = if q_level < 2 {
            info_span!("analysis", indicatif.pb_show = true)
        } else {
            info_span!("analysis")
        };

        span.pb_set_style(&style());
        span.pb_set_length(jobs as u64);
        if listening {
            span.pb_set_message(&format!("{}", "press 'q' to stop early".italic().white()));
        }
        Self { span }
    }

    pub fn span(&self) -> Span {
        self.span.clone()
    }

    /// Callback for the scheduler: moves the bar to the finished job count.
    pub fn callback(&self) -> ProgressFn {
        let span = self.span.clone();
        Box::new(move |done| span.pb_set_position(done as u64))
    }
}

fn style() -> ProgressStyle {
    match ProgressStyle::with_template(TEMPLATE) {
        Ok(style) => style.tick_strings(TICKS),
        Err(_) => ProgressStyle::default_bar(),
    }
}
