//! Pagination math and library filter predicates. Pure functions so the
//! boundary cases can be tested without any wizard plumbing.

use crate::sonarr::Series;

/// Resolved window into a paged list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Zero-based page index after clamping.
    pub index: usize,
    /// Zero-based index of the last page.
    pub last: usize,
    /// Start offset into the list, inclusive.
    pub start: usize,
    /// End offset into the list, exclusive.
    pub end: usize,
}

/// Index of the last page for a list of `len` items.
pub fn last_page(len: usize, page_size: usize) -> usize {
    if len == 0 {
        0
    } else {
        (len + page_size - 1) / page_size - 1
    }
}

/// Resolve a requested page against the list length, clamping an
/// out-of-range index to the last page (the list may have shrunk since the
/// keyboard was rendered).
pub fn page(len: usize, requested: usize, page_size: usize) -> Page {
    let last = last_page(len, page_size);
    let index = requested.min(last);
    let start = index * page_size;
    let end = (start + page_size).min(len);
    Page {
        index,
        last,
        start,
        end,
    }
}

/// Library browse filters; every variant is a pure predicate over a series
/// snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryFilter {
    Monitored,
    Unmonitored,
    Continuing,
    Ended,
    OnDisk,
    MissingEpisodes,
    All,
}

impl LibraryFilter {
    pub fn matches(self, series: &Series) -> bool {
        match self {
            LibraryFilter::Monitored => series.monitored,
            LibraryFilter::Unmonitored => !series.monitored,
            LibraryFilter::Continuing => !series.ended,
            LibraryFilter::Ended => series.ended,
            LibraryFilter::OnDisk => series.has_file_on_disk(),
            LibraryFilter::MissingEpisodes => series.has_missing_episodes(),
            LibraryFilter::All => true,
        }
    }

    /// Heading shown above the filtered picker.
    pub fn heading(self) -> &'static str {
        match self {
            LibraryFilter::Monitored => "Monitored series",
            LibraryFilter::Unmonitored => "Unmonitored series",
            LibraryFilter::Continuing => "Continuing series",
            LibraryFilter::Ended => "Ended series",
            LibraryFilter::OnDisk => "Series with files on disk",
            LibraryFilter::MissingEpisodes => "Series with missing episodes",
            LibraryFilter::All => "All series",
        }
    }
}
