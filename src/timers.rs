// One-shot deferred work, drained by the main loop in due order.

#[derive(Clone, Debug)]
pub struct TimerQueue<T> {
    entries: Vec<(u64, u64, T)>,
    next_seq: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self { entries: Vec::new(), next_seq: 0 }
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: u64, item: T) {
        self.entries.push((due, self.next_seq, item));
        self.next_seq += 1;
    }

    /// Removes and returns everything due at or before `now`, earliest first;
    /// entries due at the same time keep scheduling order.
    pub fn drain_due(&mut self, now: u64) -> Vec<T> {
        let (mut due, rest): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.entries).into_iter().partition(|(at, _, _)| *at <= now);
        self.entries = rest;
        due.sort_by_key(|(at, seq, _)| (*at, *seq));
        due.into_iter().map(|(_, _, item)| item).collect()
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) {
        self.entries.retain(|(_, _, item)| keep(item));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_in_due_order() {
        let mut q = TimerQueue::new();
        q.schedule(30, "c");
        q.schedule(10, "a");
        q.schedule(10, "b");
        q.schedule(99, "later");
        assert_eq!(q.drain_due(5), Vec::<&str>::new());
        assert_eq!(q.drain_due(30), vec!["a", "b", "c"]);
        q.schedule(40, "kept");
        q.retain(|s| *s != "later");
        assert_eq!(q.drain_due(u64::MAX), vec!["kept"]);
    }
}
