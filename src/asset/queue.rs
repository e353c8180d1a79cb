//! Pending asset queues and the emitted-output ledger.

use rustc_hash::{FxHashMap, FxHashSet};

use super::FileDescriptor;

/// Name of the queue used when the caller does not pick one.
pub const DEFAULT_QUEUE: &str = "_default";

/// Named, append-only queues of asset names.
///
/// A queue is consumed exactly once: [`Queues::take`] removes it.
#[derive(Debug, Default)]
pub struct Queues {
    queues: FxHashMap<String, Vec<String>>,
}

impl Queues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a name (duplicates are kept; the resolver deduplicates).
    pub fn push(&mut self, queue: &str, name: impl Into<String>) {
        self.queues.entry(queue.to_owned()).or_default().push(name.into());
    }

    /// Remove and return a queue's contents.
    pub fn take(&mut self, queue: &str) -> Vec<String> {
        self.queues.remove(queue).unwrap_or_default()
    }

    pub fn len(&self, queue: &str) -> usize {
        self.queues.get(queue).map_or(0, Vec::len)
    }

    pub fn is_empty(&self, queue: &str) -> bool {
        self.len(queue) == 0
    }
}

/// Names (and their aliases) already emitted during this pipeline's lifetime.
#[derive(Debug, Default, Clone)]
pub struct OutputList {
    names: FxHashSet<String>,
}

impl OutputList {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Record a descriptor's name and every alias it provides.
    pub fn record(&mut self, descriptor: &FileDescriptor) {
        for name in descriptor.names() {
            self.names.insert(name.to_owned());
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_take_consumes() {
        let mut queues = Queues::new();
        queues.push(DEFAULT_QUEUE, "a.css");
        queues.push(DEFAULT_QUEUE, "a.css");
        queues.push("head", "b.css");

        assert_eq!(queues.len(DEFAULT_QUEUE), 2);
        assert_eq!(queues.take(DEFAULT_QUEUE), vec!["a.css", "a.css"]);
        assert!(queues.take(DEFAULT_QUEUE).is_empty());
        assert_eq!(queues.take("head"), vec!["b.css"]);
    }

    #[test]
    fn test_output_list_records_aliases() {
        let mut output = OutputList::new();
        let d = FileDescriptor::library("lib/jquery.js", "cdn", "3")
            .with_provides(vec!["lib/jquery-core.js".into()]);
        output.record(&d);

        assert!(output.contains("lib/jquery.js"));
        assert!(output.contains("lib/jquery-core.js"));
        assert!(!output.contains("lib/other.js"));
        assert_eq!(output.len(), 2);
    }
}
