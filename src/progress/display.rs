//! Progress display of one catalog page.

use crate::progress::StyleOptions;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget};

/// Coordinates the page bar and the per-transfer bars.
pub struct ProgressDisplay {
    multi: MultiProgress,
    main: ProgressBar,
    style_options: StyleOptions,
}

impl ProgressDisplay {
    /// Create a display for `total_tasks` downloads, labelled `message`.
    pub fn new(style_options: StyleOptions, total_tasks: usize, message: impl Into<String>) -> Self {
        let multi = match style_options.is_enabled() {
            true => MultiProgress::new(),
            false => MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
        };
        let main = multi.add(style_options.main().clone().to_progress_bar(total_tasks as u64));
        main.set_message(message.into());
        main.tick();

        Self {
            multi,
            main,
            style_options,
        }
    }

    /// A display that draws nothing.
    pub fn hidden(total_tasks: usize) -> Self {
        Self::new(StyleOptions::hidden(), total_tasks, "")
    }

    /// Create a child progress bar for one transfer of `size` bytes.
    pub fn create_child_progress(&self, size: u64, name: &str) -> ProgressBar {
        let pb = self
            .multi
            .add(self.style_options.child().clone().to_progress_bar(size));
        pb.set_message(name.to_string());
        pb
    }

    /// Count one settled task.
    pub fn increment_main(&self) {
        self.main.inc(1);
    }

    pub fn position(&self) -> u64 {
        self.main.position()
    }

    /// Finish the page bar.
    pub fn finish(self) {
        if self.style_options.main().clear {
            self.main.finish_and_clear();
        } else {
            self.main.finish();
        }
    }

    /// Finish a child progress bar based on configuration.
    pub fn finish_child(&self, pb: ProgressBar) {
        if self.style_options.child().clear {
            pb.finish_and_clear();
        } else {
            pb.finish();
        }
        self.multi.remove(&pb);
    }
}
