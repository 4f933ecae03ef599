#![allow(dead_code)]

use std::cell::Cell;
use std::cmp::Ordering;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rbmultiset::{NodeHandle, RbMultiset};
use simplelog::{Config, LevelFilter, TestLogger};

pub fn init_logging() {
    let _ = TestLogger::init(LevelFilter::Debug, Config::default());
}

pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Key that reports how many tracked instances are alive.
///
/// Instances built through `Default` are untracked, which covers the sentinel and
/// the placeholders left behind in released cells.
#[derive(Debug, Default)]
pub struct Tracked {
    pub key: i64,
    live: Option<Rc<Cell<isize>>>,
}

impl Tracked {
    pub fn new(key: i64, live: &Rc<Cell<isize>>) -> Self {
        live.set(live.get() + 1);

        Self {
            key,
            live: Some(Rc::clone(live)),
        }
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        if let Some(live) = &self.live {
            live.set(live.get() - 1);
        }
    }
}

impl PartialEq for Tracked {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Tracked {}

impl PartialOrd for Tracked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tracked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

/// Tree mirrored by a plain list of the live entries.
pub struct Mirrored {
    pub tree: RbMultiset<i64>,
    pub entries: Vec<(NodeHandle, i64)>,
}

impl Mirrored {
    pub fn new() -> Self {
        Self {
            tree: RbMultiset::new(),
            entries: Vec::new(),
        }
    }

    pub fn insert(&mut self, key: i64) {
        let handle = self.tree.insert(key).unwrap();
        self.entries.push((handle, key));
    }

    pub fn erase_at(&mut self, position: usize) -> i64 {
        let (handle, key) = self.entries.swap_remove(position);
        assert_eq!(self.tree.erase(handle), Ok(key));

        key
    }

    pub fn sorted_keys(&self) -> Vec<i64> {
        let mut keys: Vec<i64> = self.entries.iter().map(|&(_, key)| key).collect();
        keys.sort_unstable();

        keys
    }

    /// Applies `steps` random insertions and erasures, inserting about twice as
    /// often as erasing.
    pub fn random_walk(&mut self, rng: &mut StdRng, steps: usize, key_range: i64) {
        for _ in 0..steps {
            if self.entries.is_empty() || rng.gen_bool(0.65) {
                self.insert(rng.gen_range(0..key_range));
            } else {
                let position = rng.gen_range(0..self.entries.len());
                self.erase_at(position);
            }
        }
    }
}
