use crate::{descriptor_layout, Descriptor, DescriptorLayout, MatchError};

/// A corpus entry returned by a nearest-neighbor query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    /// Index into the corpus.
    pub index: usize,
    /// Distance from the query.
    pub distance: f32,
}

/// Nearest-neighbor search over a corpus of descriptors fixed at build time.
pub trait KnnSearch: Sync {
    /// Number of descriptors in the corpus.
    fn corpus_len(&self) -> usize;

    /// Shared layout of the corpus descriptors, `None` when the corpus is empty.
    fn layout(&self) -> Option<DescriptorLayout>;

    /// Find up to `k` neighbors of `query`.
    ///
    /// Neighbors are sorted by ascending distance, ties broken by the lower
    /// corpus index. Approximate searches may return fewer than `k` entries
    /// even when the corpus is larger.
    fn knn_search(&self, query: &Descriptor, k: usize) -> Vec<Neighbor>;
}

/// Keep `best` sorted by distance with at most `k` entries.
///
/// Candidates must be offered in ascending index order so that equal
/// distances keep the lower index first.
pub(crate) fn push_candidate(best: &mut Vec<Neighbor>, k: usize, candidate: Neighbor) {
    if k == 0 {
        return;
    }
    if best.len() == k {
        match best.last() {
            Some(last) if candidate.distance >= last.distance => return,
            _ => {}
        }
    }
    let pos = best.partition_point(|n| n.distance <= candidate.distance);
    best.insert(pos, candidate);
    best.truncate(k);
}

/// Exact nearest-neighbor search by scanning the whole corpus.
///
/// # Example
///
/// ```
/// use imreg_features::{BruteForceIndex, Descriptor, KnnSearch};
///
/// let corpus = vec![
///     Descriptor::Float(vec![0.0, 0.0]),
///     Descriptor::Float(vec![1.0, 0.0]),
///     Descriptor::Float(vec![5.0, 5.0]),
/// ];
/// let index = BruteForceIndex::new(&corpus).unwrap();
///
/// let neighbors = index.knn_search(&Descriptor::Float(vec![0.9, 0.0]), 2);
/// assert_eq!(neighbors[0].index, 1);
/// assert_eq!(neighbors[1].index, 0);
/// ```
pub struct BruteForceIndex<'a> {
    corpus: Vec<&'a Descriptor>,
    layout: Option<DescriptorLayout>,
}

impl<'a> BruteForceIndex<'a> {
    /// Build the index over a borrowed corpus.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::InvalidDescriptorSet`] if the corpus mixes layouts.
    pub fn new<D: AsRef<Descriptor>>(corpus: &'a [D]) -> Result<Self, MatchError> {
        let layout = descriptor_layout(corpus)?;
        Ok(Self {
            corpus: corpus.iter().map(|d| d.as_ref()).collect(),
            layout,
        })
    }
}

impl KnnSearch for BruteForceIndex<'_> {
    fn corpus_len(&self) -> usize {
        self.corpus.len()
    }

    fn layout(&self) -> Option<DescriptorLayout> {
        self.layout
    }

    fn knn_search(&self, query: &Descriptor, k: usize) -> Vec<Neighbor> {
        let mut best = Vec::with_capacity(k.saturating_add(1).min(self.corpus.len()));
        for (index, d) in self.corpus.iter().enumerate() {
            if let Some(distance) = query.distance(d) {
                push_candidate(&mut best, k, Neighbor { index, distance });
            }
        }
        best
    }
}
