pub mod header;
pub mod latency_plot;
pub mod live_chart;
pub mod progress;
pub mod results;
pub mod speed_gauge;
