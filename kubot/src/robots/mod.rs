mod desktop_screenshot;
mod google_images;

pub use desktop_screenshot::{
    desktop_screenshot, desktop_screenshot_to_kuflow, DESKTOP_SCREENSHOT_FILE, SCREENSHOT_FILE,
};
pub use google_images::{google_images, search_text, CAPTURE_FILE, SEARCH_TEXT};
