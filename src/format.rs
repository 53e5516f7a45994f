//! Text helpers shared by every wizard step: MarkdownV2 escaping, size
//! formatting and title ordering.

use crate::sonarr::{RootFolder, Series};

/// Characters Telegram requires to be backslash-escaped in MarkdownV2 text.
const SPECIAL: &str = "()[]{}_-*~`><&#+=|!.\\";

/// Escape user-supplied text for MarkdownV2.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if SPECIAL.contains(ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Human-readable size with SI-style binary units ("1.5 GB").
pub fn byte_count(bytes: i64) -> String {
    const UNIT: i64 = 1024;
    if bytes < UNIT {
        return format!("{} B", bytes);
    }
    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    let suffix = ['k', 'M', 'G', 'T', 'P', 'E'][exp];
    format!("{:.1} {}B", bytes as f64 / div as f64, suffix)
}

/// Whole gibibytes, used on the series and season detail views.
pub fn gibibytes(bytes: i64) -> i64 {
    bytes / (1024 * 1024 * 1024)
}

/// Sort key that moves a leading article to the end ("The Wire" sorts as
/// "wire, the").
pub fn sort_key(title: &str) -> String {
    let lower = title.to_lowercase();
    for article in ["a", "an", "the", "and", "or", "of"] {
        if let Some(rest) = lower.strip_prefix(&format!("{} ", article)) {
            return format!("{}, {}", rest.trim(), article);
        }
    }
    lower
}

/// MarkdownV2 line linking a series title to its IMDb page.
pub fn imdb_line(series: &Series) -> String {
    format!(
        "[{}](https://www.imdb.com/title/{}) \\- _{}_\n",
        escape(&series.title),
        series.imdb_id,
        series.year
    )
}

/// Aligned monospace table of root folders and their free space.
pub fn root_folder_table(folders: &[RootFolder]) -> String {
    let width = folders.iter().map(|f| f.path.len()).max().unwrap_or(0) + 2;
    let mut text = String::new();
    for folder in folders {
        text.push_str(&format!(
            "`{:<width$}{:>11}`\n",
            format!("{}:", folder.path),
            escape(&byte_count(folder.free_space)),
            width = width,
        ));
    }
    text
}

/// Label for a season button or heading; season zero is "Specials".
pub fn season_label(season_number: i32) -> String {
    if season_number == 0 {
        "Specials".to_string()
    } else {
        format!("Season {}", season_number)
    }
}
