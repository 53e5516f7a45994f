//! Shared inline-keyboard building blocks: series pickers, the pagination
//! row and the ✅/🔙 decorations every wizard uses.

use crate::sonarr::Series;
use crate::transport::{Button, Keyboard};

pub const TOKEN_FIRST_PAGE: &str = "FIRST_PAGE";
pub const TOKEN_PREVIOUS_PAGE: &str = "PREVIOUS_PAGE";
pub const TOKEN_NEXT_PAGE: &str = "NEXT_PAGE";
pub const TOKEN_LAST_PAGE: &str = "LAST_PAGE";
/// No-op token on the page indicator button.
pub const TOKEN_CURRENT_PAGE: &str = "current_page";

pub const CHECK: &str = "\u{2705}";
pub const CROSS: &str = "\u{274C}";
pub const BACK_ARROW: &str = "\u{1F519}";

/// Picker button for one series, token = `prefix` + TVDB id. Multi-select
/// wizards append a trailing ✅ on selected entries.
pub fn series_button(series: &Series, prefix: &str, selected: bool) -> Button {
    let mut label = format!("{} - {}", series.title, series.year);
    if selected {
        label.push_str(&format!(" {}", CHECK));
    }
    Button::new(label, format!("{}{}", prefix, series.tvdb_id))
}

/// One-per-row picker over a window of series.
pub fn series_rows(window: &[&Series], prefix: &str, selected: impl Fn(&Series) -> bool) -> Keyboard {
    let mut keyboard = Keyboard::new();
    for series in window {
        keyboard.push_button(series_button(series, prefix, selected(series)));
    }
    keyboard
}

/// Navigation row for a paged picker. First/Prev appear only when there is
/// something behind, Next/Last only when there is something ahead; the page
/// indicator in the middle is always present and inert.
pub fn pagination_row(page: usize, last: usize) -> Vec<Button> {
    let mut row = Vec::new();
    if page > 0 {
        row.push(Button::new("« 1", TOKEN_FIRST_PAGE));
        row.push(Button::new("‹ Prev", TOKEN_PREVIOUS_PAGE));
    }
    row.push(Button::new(
        format!("{} / {}", page + 1, last + 1),
        TOKEN_CURRENT_PAGE,
    ));
    if page < last {
        row.push(Button::new("Next ›", TOKEN_NEXT_PAGE));
        row.push(Button::new(format!("{} »", last + 1), TOKEN_LAST_PAGE));
    }
    row
}

/// Monitored marker used in labels and detail views.
pub fn monitor_icon(monitored: bool) -> &'static str {
    if monitored {
        CHECK
    } else {
        CROSS
    }
}

/// Standard back button row.
pub fn back_row(token: &str) -> Vec<Button> {
    vec![Button::new(format!("{} Back", BACK_ARROW), token)]
}
