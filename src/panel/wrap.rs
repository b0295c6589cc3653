use itertools::Itertools as _;

/// Marker appended to a collapsed view that hides content.
pub const ELLIPSIS: &str = "...";

/// Estimated rendered line count: literal lines plus soft wraps at `chars_per_line`.
///
/// `chars_per_line == 0` disables the wrap estimate.
pub fn estimate_visual_lines(text: &str, chars_per_line: usize) -> usize {
    text.split('\n')
        .map(|line| {
            let len = line.chars().count();
            if chars_per_line > 0 && len > chars_per_line {
                1 + len / chars_per_line
            } else {
                1
            }
        })
        .sum()
}

/// The two-line view shown while a panel is collapsed.
///
/// Without `truncate_at` the first two literal lines are kept verbatim, and [`ELLIPSIS`]
/// is appended when more lines exist or the second line is longer than
/// `ellipsis_threshold` characters. With `truncate_at`, a single line longer than the
/// threshold is cut to `truncate_at` characters before the ellipsis, and so is an overlong
/// second line whenever an ellipsis is appended.
pub fn collapsed_view(
    text: &str,
    ellipsis_threshold: usize,
    truncate_at: Option<usize>,
) -> String {
    let lines = text.split('\n').collect_vec();
    if let ([only], Some(limit)) = (lines.as_slice(), truncate_at) {
        if only.chars().count() > ellipsis_threshold {
            return format!("{}{ELLIPSIS}", prefix(only, limit));
        }
        return (*only).to_owned();
    }

    let long_second_line = lines.len() >= 2 && lines[1].chars().count() > ellipsis_threshold;
    if lines.len() <= 2 && !long_second_line {
        return lines.iter().take(2).join("\n");
    }
    let second = match truncate_at {
        Some(limit) => prefix(lines[1], limit),
        None => lines[1],
    };
    format!("{}\n{second}{ELLIPSIS}", lines[0])
}

fn prefix(line: &str, chars: usize) -> &str {
    line.char_indices()
        .nth(chars)
        .map_or(line, |(end, _)| &line[..end])
}
