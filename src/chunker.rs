//! Sliding-window text chunker.
//!
//! Splits page text into overlapping, bounded [`Chunk`]s. Windows are
//! `chunk_size` characters long and consecutive windows share `overlap`
//! characters; the window start always advances by at least one character,
//! so segmentation terminates even for degenerate parameter combinations.
//!
//! After segmentation, chunks whose trimmed length is at or below
//! `min_chunk_chars` are discarded — this removes near-empty artifacts
//! like running headers and bare page numbers.
//!
//! Chunking is pure and deterministic: identical input text and parameters
//! always produce identical chunks.

use crate::config::ChunkingConfig;
use crate::models::{Chunk, Page};

/// Split a sequence of pages into chunks with contiguous session-scoped ids.
///
/// Each page is segmented independently; provenance (`source`, `page`) is
/// carried onto every chunk it produces. Ids (`ch1`, `ch2`, ...) are
/// assigned after the minimum-length filter, so they are contiguous.
pub fn split_pages(pages: &[Page], config: &ChunkingConfig) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    for page in pages {
        for window in split_text(&page.text, config.chunk_size, config.overlap) {
            if window.trim().chars().count() <= config.min_chunk_chars {
                continue;
            }
            chunks.push(Chunk {
                id: format!("ch{}", chunks.len() + 1),
                text: window,
                source: page.source.clone(),
                page: page.page,
            });
        }
    }
    chunks
}

/// Segment `text` into windows of `chunk_size` characters.
///
/// Boundaries are counted in characters, not bytes, so multi-byte UTF-8
/// never splits mid-codepoint. Empty input yields zero windows; input
/// shorter than `chunk_size` yields exactly one window equal to the input.
pub fn split_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let mut windows = Vec::new();
    if text.is_empty() || chunk_size == 0 {
        return windows;
    }

    // Byte offset of every char boundary, plus the end of the string.
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let n = bounds.len() - 1;

    // Guarantees termination even when overlap >= chunk_size.
    let step = chunk_size.saturating_sub(overlap).max(1);

    let mut start = 0usize;
    loop {
        let end = (start + chunk_size).min(n);
        windows.push(text[bounds[start]..bounds[end]].to_string());
        if end == n {
            break;
        }
        start += step;
    }

    windows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(chunk_size: usize, overlap: usize, min_chunk_chars: usize) -> ChunkingConfig {
        ChunkingConfig {
            chunk_size,
            overlap,
            min_chunk_chars,
        }
    }

    fn page(text: &str) -> Page {
        Page {
            source: "doc.txt".to_string(),
            page: Some(1),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_empty_text_yields_no_windows() {
        assert!(split_text("", 800, 120).is_empty());
    }

    #[test]
    fn test_short_text_single_untrimmed_window() {
        let text = "  hello world  ";
        let windows = split_text(text, 800, 120);
        assert_eq!(windows, vec![text.to_string()]);
    }

    #[test]
    fn test_windows_cover_text_with_exact_overlap() {
        let text: String = ('a'..='z').cycle().take(100).collect();
        let windows = split_text(&text, 30, 10);

        // Every window except possibly the last is full-length.
        for w in &windows[..windows.len() - 1] {
            assert_eq!(w.chars().count(), 30);
        }
        // Consecutive windows share exactly `overlap` characters.
        for pair in windows.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if b.chars().count() == 30 {
                let tail: String = a.chars().skip(20).collect();
                let head: String = b.chars().take(10).collect();
                assert_eq!(tail, head);
            }
        }
        // Concatenating each window's fresh suffix reconstructs the text.
        let mut reconstructed: String = windows[0].clone();
        for b in &windows[1..] {
            reconstructed.extend(b.chars().skip(10));
        }
        assert_eq!(reconstructed, text);
    }

    #[test]
    fn test_terminates_when_overlap_exceeds_chunk_size() {
        let text = "abcdefghij";
        let windows = split_text(text, 3, 5);
        assert!(!windows.is_empty());
        // Step clamps to 1, so starts are 0, 1, 2, ...
        assert_eq!(windows[0], "abc");
        assert_eq!(windows[1], "bcd");
        assert_eq!(windows.last().unwrap(), "hij");
    }

    #[test]
    fn test_multibyte_chars_never_split() {
        let text = "héllo wörld ünïcode ça va très bien aujourd'hui";
        let windows = split_text(text, 10, 3);
        let total_fresh: usize = windows[0].chars().count()
            + windows[1..]
                .iter()
                .map(|w| w.chars().count().saturating_sub(3))
                .sum::<usize>();
        assert_eq!(total_fresh, text.chars().count());
    }

    #[test]
    fn test_min_length_filter_drops_short_chunks() {
        let pages = vec![page("Page 7"), page("x".repeat(50).as_str())];
        let chunks = split_pages(&pages, &cfg(800, 120, 20));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text.len(), 50);
    }

    #[test]
    fn test_ids_contiguous_after_filter() {
        let long = "The quick brown fox jumps over the lazy dog. ".repeat(20);
        let pages = vec![page("hdr"), page(&long), page("p.3"), page(&long)];
        let chunks = split_pages(&pages, &cfg(200, 40, 20));
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.id, format!("ch{}", i + 1));
        }
    }

    #[test]
    fn test_provenance_carried_onto_chunks() {
        let pages = vec![Page {
            source: "manual.pdf".to_string(),
            page: Some(3),
            text: "Baggage allowance is 23kg for checked bags on all routes.".to_string(),
        }];
        let chunks = split_pages(&pages, &ChunkingConfig::default());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].source, "manual.pdf");
        assert_eq!(chunks[0].page, Some(3));
    }

    #[test]
    fn test_deterministic() {
        let text = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. ".repeat(10);
        let a = split_text(&text, 120, 30);
        let b = split_text(&text, 120, 30);
        assert_eq!(a, b);
    }
}
