use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    descriptor_layout, BruteForceIndex, Descriptor, DescriptorKind, KnnSearch, LshIndex,
    LshParams, MatchError,
};

/// A hypothesized match between a keypoint of image A and one of image B.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Correspondence {
    /// Index into the features of image A.
    pub query_idx: usize,
    /// Index into the features of image B.
    pub train_idx: usize,
    /// Descriptor distance of the match.
    pub distance: f32,
    /// Whether the geometric estimation kept this match.
    pub inlier: bool,
}

/// Nearest-neighbor backend used by [`match_features`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMethod {
    /// Exact search.
    #[default]
    BruteForce,
    /// Multi-probe LSH, binary descriptors only.
    Lsh(LshParams),
}

/// Parameters of the ratio-test matcher.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherParams {
    /// Accept a match when `best < ratio * second_best`. Values `>= 1`
    /// disable the test.
    pub ratio: f32,
    /// Nearest-neighbor backend.
    pub search: SearchMethod,
}

impl Default for MatcherParams {
    fn default() -> Self {
        Self {
            ratio: 0.75,
            search: SearchMethod::BruteForce,
        }
    }
}

#[inline]
fn passes_ratio_test(best: f32, second: f32, ratio: f32) -> bool {
    if ratio >= 1.0 {
        return true;
    }
    best < ratio * second
}

/// Match descriptors with a two-nearest-neighbor ratio test.
///
/// For each query descriptor the two closest corpus descriptors are looked up
/// through `index`. The nearest one is kept when its distance is below
/// `ratio` times the distance of the second one. Queries with fewer than two
/// neighbors are dropped. Matches follow the order of `queries`; several
/// queries may share the same corpus index.
///
/// # Arguments
///
/// * `queries` - Descriptors of image A.
/// * `index` - Nearest-neighbor search over the descriptors of image B.
/// * `ratio` - The ratio threshold.
///
/// # Errors
///
/// Returns [`MatchError::InvalidDescriptorSet`] if the queries mix layouts or
/// do not share the corpus layout.
///
/// # Example
///
/// ```
/// use imreg_features::{match_descriptors, BruteForceIndex, Descriptor};
///
/// let a = vec![Descriptor::Float(vec![0.0, 0.0]), Descriptor::Float(vec![5.0, 5.0])];
/// let b = vec![
///     Descriptor::Float(vec![0.1, 0.0]),
///     Descriptor::Float(vec![3.0, 3.0]),
///     Descriptor::Float(vec![3.1, 3.0]),
/// ];
/// let index = BruteForceIndex::new(&b).unwrap();
/// let matches = match_descriptors(&a, &index, 0.75).unwrap();
///
/// // the second query is ambiguous between b[1] and b[2]
/// assert_eq!(matches.len(), 1);
/// assert_eq!((matches[0].query_idx, matches[0].train_idx), (0, 0));
/// ```
pub fn match_descriptors<D, S>(
    queries: &[D],
    index: &S,
    ratio: f32,
) -> Result<Vec<Correspondence>, MatchError>
where
    D: AsRef<Descriptor> + Sync,
    S: KnnSearch + ?Sized,
{
    let query_layout = descriptor_layout(queries)?;

    let (Some(query_layout), Some(corpus_layout)) = (query_layout, index.layout()) else {
        return Ok(Vec::new());
    };

    if query_layout != corpus_layout {
        return Err(MatchError::InvalidDescriptorSet(format!(
            "query descriptors are {query_layout}, corpus descriptors are {corpus_layout}"
        )));
    }

    let matches = queries
        .par_iter()
        .enumerate()
        .filter_map(|(query_idx, query)| {
            let neighbors = index.knn_search(query.as_ref(), 2);
            let [best, second] = neighbors.as_slice() else {
                return None;
            };
            passes_ratio_test(best.distance, second.distance, ratio).then_some(Correspondence {
                query_idx,
                train_idx: best.index,
                distance: best.distance,
                inlier: false,
            })
        })
        .collect();

    Ok(matches)
}

/// Build the configured search index over `train` and match `query` against it.
///
/// An LSH search over float descriptors falls back to brute force.
///
/// # Errors
///
/// See [`match_descriptors`] and [`LshIndex::build`].
pub fn match_features<D>(
    query: &[D],
    train: &[D],
    params: &MatcherParams,
) -> Result<Vec<Correspondence>, MatchError>
where
    D: AsRef<Descriptor> + Sync,
{
    let matches = match params.search {
        SearchMethod::Lsh(lsh_params) => {
            let is_float =
                descriptor_layout(train)?.is_some_and(|l| l.kind == DescriptorKind::Float);
            if is_float {
                log::warn!("LSH search needs binary descriptors, using brute force instead");
                let index = BruteForceIndex::new(train)?;
                match_descriptors(query, &index, params.ratio)?
            } else {
                let index = LshIndex::build(train, &lsh_params)?;
                match_descriptors(query, &index, params.ratio)?
            }
        }
        SearchMethod::BruteForce => {
            let index = BruteForceIndex::new(train)?;
            match_descriptors(query, &index, params.ratio)?
        }
    };

    log::debug!(
        "ratio test kept {} of {} query descriptors (ratio {})",
        matches.len(),
        query.len(),
        params.ratio
    );

    Ok(matches)
}
