mod cards;
mod chart;
mod toolbar;
mod totals;

pub use cards::render_cards;
pub use chart::{render_chart, render_range_buttons};
pub use toolbar::render_toolbar;
pub use totals::render_totals;
