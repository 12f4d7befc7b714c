//! View and display state

/// Display options for the dashboard
#[derive(Debug, Clone)]
pub struct ViewState {
    /// Dark mode theme toggle
    pub dark_mode: bool,

    /// Grid visibility on the chart
    pub show_grid: bool,

    /// Legend visibility on the chart
    pub show_legend: bool,

    /// Insight cards panel visibility
    pub show_cards: bool,

    /// Plot the total line on top of the per-category series
    pub show_total: bool,

    /// Push the controller's range to the plot on the next frame
    pub reset_bounds: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            dark_mode: true,
            show_grid: true,
            show_legend: true,
            show_cards: true,
            show_total: false,
            reset_bounds: true,
        }
    }
}

impl ViewState {
    /// Toggle dark mode
    pub fn toggle_dark_mode(&mut self) {
        self.dark_mode = !self.dark_mode;
    }
}
