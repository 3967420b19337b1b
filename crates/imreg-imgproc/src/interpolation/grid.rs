/// Create the pair of sampling maps for a destination grid of `cols x rows`.
///
/// `f` receives the destination column and row and returns the source
/// coordinates to sample from.
///
/// # Returns
///
/// Two row-major buffers of length `rows * cols` with the x and y coordinates.
pub fn meshgrid_from_fn(
    cols: usize,
    rows: usize,
    f: impl Fn(usize, usize) -> (f32, f32),
) -> (Vec<f32>, Vec<f32>) {
    let mut map_x = Vec::with_capacity(rows * cols);
    let mut map_y = Vec::with_capacity(rows * cols);
    for r in 0..rows {
        for c in 0..cols {
            let (x, y) = f(c, r);
            map_x.push(x);
            map_y.push(y);
        }
    }
    (map_x, map_y)
}

#[cfg(test)]
mod tests {
    #[test]
    fn meshgrid_identity() {
        let (map_x, map_y) = super::meshgrid_from_fn(3, 2, |x, y| (x as f32, y as f32));
        assert_eq!(map_x, vec![0.0, 1.0, 2.0, 0.0, 1.0, 2.0]);
        assert_eq!(map_y, vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
    }
}
