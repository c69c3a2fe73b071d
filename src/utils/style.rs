//! Shared colors and glyphs for record statuses.

use eframe::egui::Color32;

use crate::registry::UploadStatus;

pub const SUCCESS: Color32 = Color32::from_rgb(0, 180, 0);
pub const ERROR: Color32 = Color32::from_rgb(220, 50, 50);
pub const PENDING: Color32 = Color32::from_rgb(150, 150, 150);
pub const INFO: Color32 = Color32::from_rgb(37, 99, 235);
pub const ACCENT: Color32 = Color32::from_rgb(161, 89, 225);

pub fn status_color(status: &UploadStatus) -> Color32 {
    match status {
        UploadStatus::Queued => PENDING,
        UploadStatus::Uploading | UploadStatus::Processing => INFO,
        UploadStatus::Completed => SUCCESS,
        UploadStatus::Error(_) => ERROR,
    }
}

pub fn status_glyph(status: &UploadStatus) -> &'static str {
    match status {
        UploadStatus::Queued => "⏳",
        UploadStatus::Uploading => "📤",
        UploadStatus::Processing => "⚙",
        UploadStatus::Completed => "✅",
        UploadStatus::Error(_) => "❌",
    }
}
