//! Key-grouped batching with size-bounded splitting.

use crate::domain::RoutingKey;
use std::collections::HashMap;

/// Groups formatted lines by routing key in first-seen key order; lines
/// within a key keep their arrival order and are never reordered.
#[derive(Debug, Default)]
pub struct Batcher {
    groups: Vec<(RoutingKey, Vec<String>)>,
    index: HashMap<RoutingKey, usize>,
}

impl Batcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, key: RoutingKey, line: String) {
        match self.index.get(&key) {
            Some(&slot) => self.groups[slot].1.push(line),
            None => {
                self.index.insert(key.clone(), self.groups.len());
                self.groups.push((key, vec![line]));
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Consumes the batcher, splitting each key's lines into ordered
    /// sub-batches whose newline-joined size never exceeds `max_size`
    /// bytes. A single line larger than `max_size` is emitted alone;
    /// `max_size == 0` disables splitting.
    pub fn drain(self, max_size: usize) -> Vec<(RoutingKey, Vec<Vec<String>>)> {
        self.groups
            .into_iter()
            .map(|(key, lines)| (key, split_lines(lines, max_size)))
            .collect()
    }
}

fn split_lines(lines: Vec<String>, max_size: usize) -> Vec<Vec<String>> {
    if max_size == 0 {
        return vec![lines];
    }

    let mut batches = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_size = 0usize;

    for line in lines {
        // One separator byte per line already in the sub-batch
        let joined = if current.is_empty() {
            line.len()
        } else {
            current_size + 1 + line.len()
        };

        if joined > max_size && !current.is_empty() {
            batches.push(std::mem::take(&mut current));
            current_size = line.len();
        } else {
            current_size = joined;
        }
        current.push(line);
    }

    if !current.is_empty() {
        batches.push(current);
    }
    batches
}
