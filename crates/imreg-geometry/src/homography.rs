use serde::{Deserialize, Serialize};

use crate::{linalg, HomographyError};

/// Minimum number of correspondences that determine a homography.
pub const MIN_CORRESPONDENCES: usize = 4;

// relative thresholds for rank and collinearity tests
const DET_EPS: f64 = 1e-9;
const H22_EPS: f64 = 1e-10;
const COLLINEAR_EPS: f64 = 1e-6;

/// A planar projective transform mapping image A coordinates onto image B.
///
/// The matrix is row-major and normalized so that `h[2][2] == 1`. Values
/// built through [`Homography::from_rows`] or the estimators are guaranteed
/// to have full rank.
///
/// # Example
///
/// ```
/// use imreg_geometry::Homography;
///
/// let h = Homography::from_rows([[2.0, 0.0, 4.0], [0.0, 2.0, -2.0], [0.0, 0.0, 2.0]]).unwrap();
/// assert_eq!(h.as_array()[0], [1.0, 0.0, 2.0]);
/// assert_eq!(h.transform_point([1.0, 1.0]), [3.0, 0.0]);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Homography([[f64; 3]; 3]);

impl Default for Homography {
    fn default() -> Self {
        Self::identity()
    }
}

impl Homography {
    /// The identity transform.
    pub const fn identity() -> Self {
        Self([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]])
    }

    /// Build a homography from a row-major matrix defined up to scale.
    ///
    /// # Errors
    ///
    /// Returns [`HomographyError::Degenerate`] if the bottom-right element is
    /// zero or the matrix is singular.
    pub fn from_rows(rows: [[f64; 3]; 3]) -> Result<Self, HomographyError> {
        if rows.iter().flatten().any(|v| !v.is_finite()) {
            return Err(HomographyError::Degenerate("non-finite entries"));
        }

        let norm = linalg::frobenius_norm33(&rows);
        if rows[2][2].abs() <= H22_EPS * norm {
            return Err(HomographyError::Degenerate("h22 is zero"));
        }

        let mut h = rows;
        let scale = 1.0 / rows[2][2];
        h.iter_mut().flatten().for_each(|v| *v *= scale);
        h[2][2] = 1.0;

        let det = linalg::det_mat33(&h);
        if det == 0.0 || !det.is_finite() {
            return Err(HomographyError::Degenerate("matrix is singular"));
        }

        Ok(Self(h))
    }

    /// The normalized row-major matrix.
    pub fn as_array(&self) -> &[[f64; 3]; 3] {
        &self.0
    }

    /// The normalized matrix flattened in row-major order.
    pub fn to_row_major(&self) -> [f64; 9] {
        let h = &self.0;
        [
            h[0][0], h[0][1], h[0][2], h[1][0], h[1][1], h[1][2], h[2][0], h[2][1], h[2][2],
        ]
    }

    /// Determinant of the normalized matrix.
    pub fn determinant(&self) -> f64 {
        linalg::det_mat33(&self.0)
    }

    /// The inverse transform, mapping image B onto image A.
    pub fn inverse(&self) -> Result<Self, HomographyError> {
        let inv = linalg::inverse_mat33(&self.0)
            .ok_or(HomographyError::Degenerate("matrix is singular"))?;
        Self::from_rows(inv)
    }

    /// Map a point, dividing by the homogeneous coordinate.
    ///
    /// Points mapped to the line at infinity come back as infinite values.
    pub fn transform_point(&self, point: [f64; 2]) -> [f64; 2] {
        let mut p = [0.0; 3];
        linalg::mat33_mul_vec3(&self.0, &[point[0], point[1], 1.0], &mut p);
        if p[2] == 0.0 {
            return [f64::INFINITY, f64::INFINITY];
        }
        [p[0] / p[2], p[1] / p[2]]
    }

    /// Composition `self * other`: apply `other` first, then `self`.
    pub fn mul(&self, other: &Homography) -> Result<Self, HomographyError> {
        let mut m = [[0.0; 3]; 3];
        linalg::matmul33(&self.0, &other.0, &mut m);
        Self::from_rows(m)
    }

    /// Pixel distance between the mapped `src` and the observed `dst`.
    pub fn reprojection_error(&self, src: [f64; 2], dst: [f64; 2]) -> f64 {
        let p = self.transform_point(src);
        let (dx, dy) = (p[0] - dst[0], p[1] - dst[1]);
        let err = (dx * dx + dy * dy).sqrt();
        if err.is_nan() {
            f64::INFINITY
        } else {
            err
        }
    }
}

/// Similarity transform moving the centroid to the origin and scaling the
/// mean distance from it to `sqrt(2)`.
///
/// Returns `None` when every point coincides.
pub fn normalize_points(points: &[[f64; 2]]) -> Option<(Vec<[f64; 2]>, [[f64; 3]; 3])> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p[0], sy + p[1]));
    let (cx, cy) = (sx / n, sy / n);

    let mean_dist = points
        .iter()
        .map(|p| ((p[0] - cx).powi(2) + (p[1] - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;
    if mean_dist <= f64::EPSILON * (1.0 + cx.abs().max(cy.abs())) {
        return None;
    }

    let s = std::f64::consts::SQRT_2 / mean_dist;
    let normalized = points
        .iter()
        .map(|p| [s * (p[0] - cx), s * (p[1] - cy)])
        .collect();
    let t = [[s, 0.0, -s * cx], [0.0, s, -s * cy], [0.0, 0.0, 1.0]];
    Some((normalized, t))
}

/// Inverse of a similarity returned by [`normalize_points`].
fn denormalization(t: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let s = t[0][0];
    let (cx, cy) = (-t[0][2] / s, -t[1][2] / s);
    [[1.0 / s, 0.0, cx], [0.0, 1.0 / s, cy], [0.0, 0.0, 1.0]]
}

/// Estimate a homography with the normalized direct linear transform.
///
/// Each point set is normalized with [`normalize_points`], the stacked
/// `2N x 9` system is solved by SVD and the solution is mapped back to pixel
/// coordinates. With exactly four points the fit is exact; with more it is
/// the algebraic least squares solution.
///
/// # Arguments
///
/// * `src` - Points in image A.
/// * `dst` - Matching points in image B.
///
/// # Errors
///
/// Returns [`HomographyError::InvalidInput`] for mismatched lengths,
/// [`HomographyError::InsufficientCorrespondences`] for fewer than four
/// points and [`HomographyError::Degenerate`] when the points do not
/// determine a full rank transform.
pub fn homography_dlt(src: &[[f64; 2]], dst: &[[f64; 2]]) -> Result<Homography, HomographyError> {
    if src.len() != dst.len() {
        return Err(HomographyError::InvalidInput(format!(
            "{} source points and {} destination points",
            src.len(),
            dst.len()
        )));
    }
    if src.len() < MIN_CORRESPONDENCES {
        return Err(HomographyError::InsufficientCorrespondences {
            required: MIN_CORRESPONDENCES,
            actual: src.len(),
        });
    }

    let (src_n, t_src) =
        normalize_points(src).ok_or(HomographyError::Degenerate("source points coincide"))?;
    let (dst_n, t_dst) = normalize_points(dst)
        .ok_or(HomographyError::Degenerate("destination points coincide"))?;

    // construct matrix A
    let mut mat_a = faer::Mat::<f64>::zeros(2 * src.len(), 9);
    for (i, (p, q)) in src_n.iter().zip(dst_n.iter()).enumerate() {
        let (x, y) = (p[0], p[1]);
        let (u, v) = (q[0], q[1]);

        mat_a.write(2 * i, 0, x);
        mat_a.write(2 * i, 1, y);
        mat_a.write(2 * i, 2, 1.0);
        mat_a.write(2 * i, 6, -u * x);
        mat_a.write(2 * i, 7, -u * y);
        mat_a.write(2 * i, 8, -u);

        mat_a.write(2 * i + 1, 3, x);
        mat_a.write(2 * i + 1, 4, y);
        mat_a.write(2 * i + 1, 5, 1.0);
        mat_a.write(2 * i + 1, 6, -v * x);
        mat_a.write(2 * i + 1, 7, -v * y);
        mat_a.write(2 * i + 1, 8, -v);
    }

    // right singular vector of the smallest singular value
    let svd = mat_a.svd();
    let v = svd.v();
    let h_norm = [
        [v.read(0, 8), v.read(1, 8), v.read(2, 8)],
        [v.read(3, 8), v.read(4, 8), v.read(5, 8)],
        [v.read(6, 8), v.read(7, 8), v.read(8, 8)],
    ];

    // the singular vector has unit norm, so this is a relative rank test
    let det_norm = linalg::det_mat33(&h_norm);
    if det_norm.abs() < DET_EPS || !det_norm.is_finite() {
        return Err(HomographyError::Degenerate("rank deficient solution"));
    }

    // H = T_dst^-1 * H_norm * T_src
    let mut tmp = [[0.0; 3]; 3];
    linalg::matmul33(&h_norm, &t_src, &mut tmp);
    let mut h = [[0.0; 3]; 3];
    linalg::matmul33(&denormalization(&t_dst), &tmp, &mut h);

    Homography::from_rows(h)
}

/// Whether any three of the four points are collinear or coincident.
pub fn is_degenerate_configuration(points: &[[f64; 2]; 4]) -> bool {
    let mut max_d2 = 0.0f64;
    for i in 0..4 {
        for j in (i + 1)..4 {
            let d2 = (points[i][0] - points[j][0]).powi(2) + (points[i][1] - points[j][1]).powi(2);
            max_d2 = max_d2.max(d2);
        }
    }
    if max_d2 <= f64::MIN_POSITIVE {
        return true;
    }

    const TRIPLES: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
    TRIPLES.iter().any(|&[a, b, c]| {
        let (pa, pb, pc) = (points[a], points[b], points[c]);
        let cross = (pb[0] - pa[0]) * (pc[1] - pa[1]) - (pb[1] - pa[1]) * (pc[0] - pa[0]);
        cross.abs() <= COLLINEAR_EPS * max_d2
    })
}

/// Compute the homography from four 2d point correspondences.
///
/// The minimal solver used by RANSAC. Samples where three points of either
/// side are collinear are rejected before solving.
///
/// # Arguments
///
/// * `x1` - The source 2d points.
/// * `x2` - The destination 2d points.
///
/// # Errors
///
/// Returns [`HomographyError::Degenerate`] for a degenerate sample or fit.
pub fn homography_4pt2d(
    x1: &[[f64; 2]; 4],
    x2: &[[f64; 2]; 4],
) -> Result<Homography, HomographyError> {
    if is_degenerate_configuration(x1) || is_degenerate_configuration(x2) {
        return Err(HomographyError::Degenerate("collinear sample"));
    }
    homography_dlt(x1, x2)
}
