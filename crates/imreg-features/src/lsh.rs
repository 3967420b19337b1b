use std::collections::HashMap;

use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::knn::push_candidate;
use crate::{
    descriptor_layout, Descriptor, DescriptorKind, DescriptorLayout, KnnSearch, MatchError,
    Neighbor,
};

/// Largest accepted `multi_probe_level`.
pub const MAX_MULTI_PROBE_LEVEL: usize = 3;

/// Parameters of the multi-probe LSH index.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LshParams {
    /// Number of hash tables.
    pub table_number: usize,
    /// Number of sampled bits per hash key (at most 32).
    pub key_size: usize,
    /// Visit every bucket whose key differs by up to this many bits, at most
    /// [`MAX_MULTI_PROBE_LEVEL`].
    pub multi_probe_level: usize,
    /// Seed used to sample the key bits.
    pub seed: u64,
}

impl Default for LshParams {
    fn default() -> Self {
        Self {
            table_number: 6,
            key_size: 12,
            multi_probe_level: 1,
            seed: 0,
        }
    }
}

struct LshTable {
    bits: Vec<usize>,
    buckets: HashMap<u32, Vec<usize>>,
}

impl LshTable {
    fn key(&self, descriptor: &[u8]) -> u32 {
        self.bits
            .iter()
            .enumerate()
            .fold(0u32, |key, (i, &bit)| {
                let set = (descriptor[bit / 8] >> (bit % 8)) & 1;
                key | ((set as u32) << i)
            })
    }
}

/// Approximate nearest-neighbor search for binary descriptors.
///
/// Every table hashes a descriptor by a random subset of its bits. A query
/// visits its own bucket and every bucket within `multi_probe_level` bit
/// flips in every table, then ranks the collected candidates by exact
/// Hamming distance.
///
/// When the buckets hold fewer than `k` distinct candidates the search widens
/// by one more bit flip, and then falls back to scanning the whole corpus, so
/// a query always gets `min(k, corpus_len)` neighbors.
pub struct LshIndex<'a> {
    corpus: Vec<&'a Descriptor>,
    layout: Option<DescriptorLayout>,
    tables: Vec<LshTable>,
    key_size: usize,
    level: usize,
    masks: Vec<u32>,
}

impl<'a> LshIndex<'a> {
    /// Build the index over a borrowed corpus of binary descriptors.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::InvalidDescriptorSet`] for float or mixed
    /// descriptors and [`MatchError::InvalidParams`] for an unusable key size,
    /// table count or multi-probe level.
    pub fn build<D: AsRef<Descriptor>>(
        corpus: &'a [D],
        params: &LshParams,
    ) -> Result<Self, MatchError> {
        if params.table_number == 0 {
            return Err(MatchError::InvalidParams(
                "table_number must be > 0".to_string(),
            ));
        }
        if params.key_size == 0 || params.key_size > 32 {
            return Err(MatchError::InvalidParams(format!(
                "key_size must be in 1..=32, got {}",
                params.key_size
            )));
        }
        if params.multi_probe_level > MAX_MULTI_PROBE_LEVEL {
            return Err(MatchError::InvalidParams(format!(
                "multi_probe_level must be at most {MAX_MULTI_PROBE_LEVEL}, got {}",
                params.multi_probe_level
            )));
        }

        let layout = descriptor_layout(corpus)?;
        if let Some(layout) = layout {
            if layout.kind != DescriptorKind::Binary {
                return Err(MatchError::InvalidDescriptorSet(
                    "LSH index requires binary descriptors".to_string(),
                ));
            }
        }

        let corpus: Vec<&Descriptor> = corpus.iter().map(|d| d.as_ref()).collect();
        let num_bits = layout.map_or(0, |l| l.len * 8);
        let key_size = params.key_size.min(num_bits);

        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut tables = Vec::with_capacity(params.table_number);
        for _ in 0..params.table_number {
            let bits = if key_size == 0 {
                Vec::new()
            } else {
                rand::seq::index::sample(&mut rng, num_bits, key_size).into_vec()
            };
            let mut table = LshTable {
                bits,
                buckets: HashMap::new(),
            };
            for (i, d) in corpus.iter().enumerate() {
                if let Descriptor::Binary(bytes) = d {
                    let key = table.key(bytes);
                    table.buckets.entry(key).or_default().push(i);
                }
            }
            tables.push(table);
        }

        log::debug!(
            "built LSH index over {} descriptors ({} tables, {} bit keys)",
            corpus.len(),
            tables.len(),
            key_size
        );

        Ok(Self {
            corpus,
            layout,
            tables,
            key_size,
            level: params.multi_probe_level.min(key_size),
            masks: key_masks(key_size, params.multi_probe_level),
        })
    }

    /// Mark every entry of the buckets at `key ^ mask` in every table.
    /// Returns the number of newly marked entries.
    fn visit(&self, bytes: &[u8], masks: &[u32], visited: &mut [bool]) -> usize {
        let mut added = 0;
        for table in &self.tables {
            let key = table.key(bytes);
            for mask in masks {
                if let Some(bucket) = table.buckets.get(&(key ^ mask)) {
                    for &i in bucket {
                        if !visited[i] {
                            visited[i] = true;
                            added += 1;
                        }
                    }
                }
            }
        }
        added
    }
}

/// All xor masks over `key_size` bits with exactly `flips` bits set.
fn flip_masks(key_size: usize, flips: usize) -> Vec<u32> {
    let mut frontier = vec![(0u32, 0usize)];
    for _ in 0..flips {
        let mut next = Vec::new();
        for &(mask, start) in &frontier {
            for bit in start..key_size {
                next.push((mask | (1 << bit), bit + 1));
            }
        }
        frontier = next;
    }
    frontier.into_iter().map(|(mask, _)| mask).collect()
}

/// All xor masks over `key_size` bits with at most `level` bits set.
fn key_masks(key_size: usize, level: usize) -> Vec<u32> {
    (0..=level.min(key_size))
        .flat_map(|flips| flip_masks(key_size, flips))
        .collect()
}

impl KnnSearch for LshIndex<'_> {
    fn corpus_len(&self) -> usize {
        self.corpus.len()
    }

    fn layout(&self) -> Option<DescriptorLayout> {
        self.layout
    }

    fn knn_search(&self, query: &Descriptor, k: usize) -> Vec<Neighbor> {
        let Descriptor::Binary(bytes) = query else {
            return Vec::new();
        };
        if Some(query.layout()) != self.layout {
            return Vec::new();
        }

        let wanted = k.min(self.corpus.len());
        let mut visited = vec![false; self.corpus.len()];
        let mut found = self.visit(bytes, &self.masks, &mut visited);
        if found < wanted && self.level < self.key_size {
            found += self.visit(bytes, &flip_masks(self.key_size, self.level + 1), &mut visited);
        }
        if found < wanted {
            log::trace!("lsh buckets hold {found} of {wanted} candidates, scanning the corpus");
            visited.fill(true);
        }

        let mut best = Vec::with_capacity(k.saturating_add(1).min(self.corpus.len()));
        for (index, seen) in visited.into_iter().enumerate() {
            if !seen {
                continue;
            }
            if let Some(distance) = query.distance(self.corpus[index]) {
                push_candidate(&mut best, k, Neighbor { index, distance });
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BruteForceIndex;
    use rand::Rng;

    fn random_binary(rng: &mut StdRng, n: usize) -> Vec<Descriptor> {
        (0..n)
            .map(|_| Descriptor::Binary((0..32).map(|_| rng.random::<u8>()).collect()))
            .collect()
    }

    #[test]
    fn key_masks_levels() {
        assert_eq!(key_masks(12, 0), vec![0]);
        assert_eq!(key_masks(12, 1).len(), 13);
        assert_eq!(key_masks(4, 2).len(), 1 + 4 + 6);
        assert_eq!(flip_masks(4, 2).len(), 6);
        assert!(flip_masks(4, 2).iter().all(|m| m.count_ones() == 2));
        assert!(flip_masks(4, 5).is_empty());
    }

    #[test]
    fn sparse_corpus_still_yields_k_neighbors() -> Result<(), MatchError> {
        // far apart in Hamming space, so no bucket near the query holds another entry
        let corpus = vec![
            Descriptor::Binary(vec![0x00; 32]),
            Descriptor::Binary(vec![0xff; 32]),
            Descriptor::Binary(vec![0xf0; 32]),
        ];
        let index = LshIndex::build(&corpus, &LshParams::default())?;
        let query = Descriptor::Binary(vec![0x00; 32]);

        let neighbors = index.knn_search(&query, 2);
        assert_eq!(neighbors.len(), 2);
        assert_eq!((neighbors[0].index, neighbors[0].distance), (0, 0.0));
        assert_eq!((neighbors[1].index, neighbors[1].distance), (2, 128.0));

        let indices: Vec<usize> = index
            .knn_search(&query, usize::MAX)
            .iter()
            .map(|n| n.index)
            .collect();
        assert_eq!(indices, vec![0, 2, 1]);
        Ok(())
    }

    #[test]
    fn random_corpus_always_yields_two_neighbors() -> Result<(), MatchError> {
        let mut rng = StdRng::seed_from_u64(11);
        let corpus = random_binary(&mut rng, 5);
        let index = LshIndex::build(&corpus, &LshParams::default())?;

        for d in random_binary(&mut rng, 20) {
            let neighbors = index.knn_search(&d, 2);
            assert_eq!(neighbors.len(), 2);
            assert_ne!(neighbors[0].index, neighbors[1].index);
            assert!(neighbors[0].distance <= neighbors[1].distance);
        }
        Ok(())
    }

    #[test]
    fn lsh_finds_exact_duplicates() -> Result<(), MatchError> {
        let mut rng = StdRng::seed_from_u64(7);
        let corpus = random_binary(&mut rng, 200);
        let index = LshIndex::build(&corpus, &LshParams::default())?;
        assert_eq!(index.corpus_len(), 200);

        for (i, d) in corpus.iter().enumerate().step_by(17) {
            let neighbors = index.knn_search(d, 2);
            assert_eq!(neighbors[0].index, i);
            assert_eq!(neighbors[0].distance, 0.0);
        }
        Ok(())
    }

    #[test]
    fn lsh_agrees_with_brute_force_on_near_copies() -> Result<(), MatchError> {
        let mut rng = StdRng::seed_from_u64(3);
        let corpus = random_binary(&mut rng, 100);
        let lsh = LshIndex::build(&corpus, &LshParams::default())?;
        let exact = BruteForceIndex::new(&corpus)?;

        // a single flipped bit keeps most table keys intact
        for d in corpus.iter().step_by(9) {
            let Descriptor::Binary(bytes) = d else {
                unreachable!()
            };
            let mut noisy = bytes.clone();
            noisy[5] ^= 0b0001_0000;
            let query = Descriptor::Binary(noisy);
            assert_eq!(
                lsh.knn_search(&query, 1)[0].index,
                exact.knn_search(&query, 1)[0].index
            );
        }
        Ok(())
    }

    #[test]
    fn lsh_rejects_float_and_bad_params() {
        let floats = vec![Descriptor::Float(vec![0.0; 8])];
        assert!(matches!(
            LshIndex::build(&floats, &LshParams::default()),
            Err(MatchError::InvalidDescriptorSet(_))
        ));

        let binary = vec![Descriptor::Binary(vec![0; 8])];
        let params = LshParams {
            key_size: 40,
            ..Default::default()
        };
        assert!(matches!(
            LshIndex::build(&binary, &params),
            Err(MatchError::InvalidParams(_))
        ));

        let params = LshParams {
            multi_probe_level: MAX_MULTI_PROBE_LEVEL + 1,
            ..Default::default()
        };
        assert!(matches!(
            LshIndex::build(&binary, &params),
            Err(MatchError::InvalidParams(_))
        ));
        let params = LshParams {
            multi_probe_level: MAX_MULTI_PROBE_LEVEL,
            ..Default::default()
        };
        assert!(LshIndex::build(&binary, &params).is_ok());
    }
}
