use std::fmt::Debug;
use std::hash::Hash;

use anyhow::{ensure, Result};
use itertools::Itertools;
use rustc_hash::FxHashMap;

/// Tabular action-value function Q(s,a); one value per action index for every visited state
#[derive(Clone, Debug, PartialEq)]
pub struct QTable<K: Hash + Eq> {
    action_space: usize,
    values: FxHashMap<K, Vec<f32>>,
}

impl<K> QTable<K>
where K: Clone + Debug + Hash + Eq + Ord
{
    pub fn new(action_space: usize) -> Self {
        assert!(action_space > 0);
        Self {
            action_space,
            values: FxHashMap::default(),
        }
    }

    pub fn from_entries(action_space: usize, entries: Vec<(K, Vec<f32>)>) -> Result<Self> {
        let mut table = QTable::new(action_space);
        for (key, values) in entries {
            ensure!(values.len() == action_space, "state {:?} has {} action values, expected {}", key, values.len(), action_space);
            table.values.insert(key, values);
        }
        Ok(table)
    }

    pub fn action_space(&self) -> usize { self.action_space }

    /// number of visited states
    pub fn len(&self) -> usize { self.values.len() }

    pub fn is_empty(&self) -> bool { self.values.is_empty() }

    pub fn values(&self, key: &K) -> Option<&[f32]> {
        self.values.get(key).map(|v| v.as_slice())
    }

    /// max_a Q(s,a); zero for never visited states
    pub fn max_value(&self, key: &K) -> f32 {
        self.values(key)
            .map_or(0.0, |v| v.iter().copied().fold(f32::NEG_INFINITY, f32::max))
    }

    /// action indices sharing the highest value (all of them for an unknown state)
    pub fn best_action_indices(&self, key: &K) -> Vec<usize> {
        match self.values(key) {
            None => (0..self.action_space).collect(),
            Some(values) => {
                let max = self.max_value(key);
                values.iter().positions(|&v| v == max).collect()
            }
        }
    }

    /// first action index with the highest value, `None` for an unknown state
    pub fn greedy_action_index(&self, key: &K) -> Option<usize> {
        let max = self.max_value(key);
        self.values(key).and_then(|values| values.iter().position(|&v| v == max))
    }

    /// Moves Q(s,a) by `alpha` towards `target`
    pub fn update(&mut self, key: &K, action_idx: usize, target: f32, alpha: f32) {
        debug_assert!(action_idx < self.action_space);
        let action_space = self.action_space;
        let values = self.values.entry(key.clone()).or_insert_with(|| vec![0.0; action_space]);
        values[action_idx] += alpha * (target - values[action_idx]);
    }

    /// all entries in key order - for a stable serialized form
    pub fn sorted_entries(&self) -> Vec<(K, Vec<f32>)> {
        self.values.iter()
            .sorted_by(|a, b| a.0.cmp(b.0))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_and_greedy() {
        let mut table = QTable::<u32>::new(3);
        assert_eq!(table.greedy_action_index(&7), None);
        assert_eq!(table.best_action_indices(&7), vec![0, 1, 2]);
        assert_eq!(table.max_value(&7), 0.0);

        table.update(&7, 2, 10.0, 0.5);
        assert_eq!(table.values(&7), Some([0.0, 0.0, 5.0].as_slice()));
        assert_eq!(table.greedy_action_index(&7), Some(2));
        assert_eq!(table.max_value(&7), 5.0);

        table.update(&7, 0, 10.0, 0.5);
        assert_eq!(table.best_action_indices(&7), vec![0, 2]);
        // ties resolve to the first index
        assert_eq!(table.greedy_action_index(&7), Some(0));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_negative_values() {
        let mut table = QTable::<u32>::new(2);
        table.update(&1, 0, -4.0, 1.0);
        assert_eq!(table.max_value(&1), 0.0);
        assert_eq!(table.greedy_action_index(&1), Some(1));
    }

    #[test]
    fn test_entries_round_trip() {
        let mut table = QTable::<u32>::new(2);
        table.update(&5, 1, 1.0, 1.0);
        table.update(&3, 0, 2.0, 1.0);

        let entries = table.sorted_entries();
        assert_eq!(entries.iter().map(|e| e.0).collect::<Vec<_>>(), vec![3, 5]);
        assert_eq!(QTable::from_entries(2, entries).unwrap(), table);
        assert!(QTable::<u32>::from_entries(3, vec![(1, vec![0.0])]).is_err());
    }
}
