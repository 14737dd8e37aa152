use crate::models::Poll;

/// Display percentage for each option, rounded independently.
///
/// Rounding is half away from zero, so the entries need not add up to
/// exactly 100. An empty poll yields all zeros.
pub fn percentages(votes: &[u64]) -> Vec<u32> {
    let total = votes.iter().fold(0u64, |total, count| total.saturating_add(*count));
    if total == 0 {
        return vec![0; votes.len()];
    }

    votes
        .iter()
        .map(|&count| (count as f64 / total as f64 * 100.0).round() as u32)
        .collect()
}

// Detailed results as formatted text, one line per option
pub fn format_results(poll: &Poll, percentages: &[u32], selected: Option<usize>) -> String {
    let total = poll.total_votes();
    let mut summary = format!("{}\n", poll.question);

    for (idx, option) in poll.options.iter().enumerate() {
        let marker = if selected == Some(idx) { "*" } else { " " };
        let count = poll.votes.get(idx).copied().unwrap_or(0);

        // Percentages only mean something once someone has voted
        let line = if total > 0 {
            let pct = percentages.get(idx).copied().unwrap_or(0);
            format!(" {} {}. {}: {} votes ({}%)", marker, idx + 1, option, count, pct)
        } else {
            format!(" {} {}. {}", marker, idx + 1, option)
        };

        summary.push_str(&line);
        summary.push('\n');
    }

    if total == 0 {
        summary.push_str("No votes yet.");
    } else {
        summary.push_str(&format!("{} votes cast.", total));
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_total_gives_zeros() {
        assert_eq!(percentages(&[0, 0, 0]), vec![0, 0, 0]);
        assert!(percentages(&[]).is_empty());
    }

    #[test]
    fn rounds_each_entry_independently() {
        assert_eq!(percentages(&[2, 1]), vec![67, 33]);
        assert_eq!(percentages(&[2, 3]), vec![40, 60]);
        // 33.33 each, sums to 99 and stays that way
        assert_eq!(percentages(&[1, 1, 1]), vec![33, 33, 33]);
        // 12.5 and 87.5 both round up
        assert_eq!(percentages(&[1, 7]), vec![13, 88]);
    }

    #[test]
    fn entries_stay_in_range_and_keep_length() {
        let cases: [&[u64]; 4] = [&[5], &[0, 9], &[1, 2, 3, 4, 5, 6], &[1_000_000, 1]];
        for votes in cases {
            let pct = percentages(votes);
            assert_eq!(pct.len(), votes.len());
            assert!(pct.iter().all(|p| *p <= 100));
        }
    }

    #[test]
    fn huge_counts_do_not_overflow() {
        let pct = percentages(&[u64::MAX, 1]);
        assert_eq!(pct, vec![100, 0]);
    }

    #[test]
    fn summary_marks_selected_option() {
        let mut poll = Poll::new("p", "Best Season?", vec!["Spring".into(), "Winter".into()]);
        poll.votes = vec![3, 1];
        let text = format_results(&poll, &percentages(&poll.votes), Some(1));

        assert!(text.contains(" * 2. Winter: 1 votes (25%)"));
        assert!(text.contains("   1. Spring: 3 votes (75%)"));
        assert!(text.ends_with("4 votes cast."));
    }

    #[test]
    fn summary_hides_percentages_without_votes() {
        let poll = Poll::new("p", "Q?", vec!["a".into(), "b".into()]);
        let text = format_results(&poll, &percentages(&poll.votes), None);
        assert!(!text.contains('%'));
        assert!(text.ends_with("No votes yet."));
    }
}
