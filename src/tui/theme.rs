use ratatui::style::Color;

use crate::engine::types::TestType;
use crate::rating::SpeedRating;

/// Amber for download indicators.
pub const DOWNLOAD_COLOR: Color = Color::Rgb(245, 135, 0);

/// Blue for upload indicators.
pub const UPLOAD_COLOR: Color = Color::Rgb(100, 180, 255);

/// Green for latency indicators.
pub const LATENCY_COLOR: Color = Color::Rgb(130, 220, 130);

/// Red for failures.
pub const ERROR_COLOR: Color = Color::Rgb(230, 90, 90);

/// Muted text.
pub const DIM_TEXT: Color = Color::DarkGray;

/// Bright white for hero numbers.
pub const BRIGHT_TEXT: Color = Color::White;

/// Border color.
pub const BORDER_COLOR: Color = Color::Rgb(80, 80, 80);

/// Header accent.
pub const HEADER_COLOR: Color = Color::Rgb(245, 135, 0);

pub fn transfer_color(test_type: TestType) -> Color {
    match test_type {
        TestType::Download => DOWNLOAD_COLOR,
        TestType::Upload => UPLOAD_COLOR,
    }
}

pub fn rating_color(rating: SpeedRating) -> Color {
    match rating {
        SpeedRating::Excellent | SpeedRating::VeryGood => LATENCY_COLOR,
        SpeedRating::Good => BRIGHT_TEXT,
        SpeedRating::Fair => DOWNLOAD_COLOR,
        SpeedRating::Poor => ERROR_COLOR,
    }
}
