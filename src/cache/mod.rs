use crate::models::Poll;
use crate::voting::percentages;

/// A known poll with its display percentages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedPoll {
    pub poll: Poll,
    pub percentages: Vec<u32>,
}

impl CachedPoll {
    fn new(poll: Poll) -> Self {
        let percentages = percentages(&poll.votes);
        Self { poll, percentages }
    }

    fn recompute(&mut self) {
        self.percentages = percentages(&self.poll.votes);
    }
}

/// The polls currently on screen, in feed order.
#[derive(Debug, Default)]
pub struct PollCache {
    entries: Vec<CachedPoll>,
}

impl PollCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, poll_id: &str) -> Option<&CachedPoll> {
        self.entries.iter().find(|entry| entry.poll.id == poll_id)
    }

    fn get_mut(&mut self, poll_id: &str) -> Option<&mut CachedPoll> {
        self.entries.iter_mut().find(|entry| entry.poll.id == poll_id)
    }

    pub fn polls(&self) -> impl Iterator<Item = &CachedPoll> {
        self.entries.iter()
    }

    /// Inserts a new poll at the end of the feed or replaces the known one in place.
    pub fn upsert(&mut self, poll: Poll) -> &CachedPoll {
        let idx = match self.entries.iter().position(|entry| entry.poll.id == poll.id) {
            Some(idx) => {
                self.entries[idx] = CachedPoll::new(poll);
                idx
            }
            None => {
                self.entries.push(CachedPoll::new(poll));
                self.entries.len() - 1
            }
        };
        &self.entries[idx]
    }

    pub fn votes(&self, poll_id: &str) -> Option<Vec<u64>> {
        self.get(poll_id).map(|entry| entry.poll.votes.clone())
    }

    /// Moves one vote from `previous` (if any) to `next`.
    ///
    /// Returns `None` when the poll is unknown, an index is out of range or
    /// the count cannot grow any further, leaving the entry untouched.
    pub fn apply_vote(
        &mut self,
        poll_id: &str,
        previous: Option<usize>,
        next: usize,
    ) -> Option<&CachedPoll> {
        let entry = self.get_mut(poll_id)?;
        let len = entry.poll.votes.len();
        if next >= len || previous.is_some_and(|prev| prev >= len) {
            return None;
        }
        let mut votes = entry.poll.votes.clone();

        if let Some(prev) = previous {
            // Counts come from the server, so our earlier vote may not be in them yet
            votes[prev] = votes[prev].saturating_sub(1);
        }
        votes[next] = votes[next].checked_add(1)?;
        // The total has to stay representable as well
        votes.iter().try_fold(0u64, |total, count| total.checked_add(*count))?;

        entry.poll.votes = votes;
        entry.recompute();
        Some(&*entry)
    }

    /// Puts a captured vote vector back verbatim.
    pub fn restore_votes(&mut self, poll_id: &str, votes: Vec<u64>) -> Option<&CachedPoll> {
        let entry = self.get_mut(poll_id)?;
        entry.poll.votes = votes;
        entry.recompute();
        Some(&*entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poll(id: &str, votes: &[u64]) -> Poll {
        let options = (0..votes.len()).map(|i| format!("opt{}", i)).collect();
        let mut poll = Poll::new(id, "Q?", options);
        poll.votes = votes.to_vec();
        poll
    }

    #[test]
    fn upsert_keeps_feed_order() {
        let mut cache = PollCache::new();
        cache.upsert(poll("a", &[0, 0]));
        cache.upsert(poll("b", &[0, 0]));
        cache.upsert(poll("a", &[5, 5]));

        let ids: Vec<_> = cache.polls().map(|entry| entry.poll.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(cache.get("a").unwrap().percentages, vec![50, 50]);
    }

    #[test]
    fn vote_change_moves_a_single_vote() {
        let mut cache = PollCache::new();
        cache.upsert(poll("a", &[3, 1, 0]));

        let entry = cache.apply_vote("a", Some(0), 2).unwrap();
        assert_eq!(entry.poll.votes, vec![2, 1, 1]);
        assert_eq!(entry.percentages, vec![50, 25, 25]);
    }

    #[test]
    fn out_of_range_vote_is_ignored() {
        let mut cache = PollCache::new();
        cache.upsert(poll("a", &[1, 1]));

        assert!(cache.apply_vote("a", None, 2).is_none());
        assert!(cache.apply_vote("missing", None, 0).is_none());
        assert_eq!(cache.votes("a"), Some(vec![1, 1]));
    }

    #[test]
    fn saturated_count_refuses_another_vote() {
        let mut cache = PollCache::new();
        cache.upsert(poll("a", &[u64::MAX, 0]));

        assert!(cache.apply_vote("a", None, 0).is_none());
        assert!(cache.apply_vote("a", None, 1).is_none());
        assert_eq!(cache.votes("a"), Some(vec![u64::MAX, 0]));
    }

    #[test]
    fn restore_recomputes_percentages() {
        let mut cache = PollCache::new();
        cache.upsert(poll("a", &[1, 1]));
        cache.apply_vote("a", None, 0);

        let entry = cache.restore_votes("a", vec![1, 1]).unwrap();
        assert_eq!(entry.percentages, vec![50, 50]);
    }
}
