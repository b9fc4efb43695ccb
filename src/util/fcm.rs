use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Distances at or below this are treated as a point sitting on a center.
const COINCIDENCE_EPSILON: f64 = 1e-12;

/// Fuzzy c-means parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FcmParams {
    pub clusters: usize,
    /// Fuzziness exponent `m`, strictly greater than 1.
    pub fuzziness: f64,
    /// Stop once no center moves farther than this.
    pub tolerance: f64,
    pub max_iterations: usize,
    pub seed: u64,
}

/// Fuzzy c-means clustering over the rows of a dense matrix.
#[derive(Debug, Clone)]
pub struct FuzzyCMeans {
    /// `clusters × dims`.
    pub centers: Array2<f64>,
    /// `points × clusters`; every row is non-negative and sums to 1.
    pub memberships: Array2<f64>,
    pub iterations: usize,
    pub converged: bool,
}

impl FuzzyCMeans {
    /// Runs fuzzy c-means.
    ///
    /// # Arguments
    /// * `data` - One point per row.
    /// * `params` - Cluster count, fuzziness, stopping rule and RNG seed.
    ///
    /// The initial membership matrix is drawn from a `StdRng` seeded with `params.seed`,
    /// so identical inputs always produce identical memberships.
    #[must_use]
    pub fn new(data: ArrayView2<'_, f64>, params: &FcmParams) -> Self {
        let (points, dims) = data.dim();
        let k = params.clusters;
        if points == 0 || k == 0 {
            return Self {
                centers: Array2::zeros((k, dims)),
                memberships: Array2::zeros((points, k)),
                iterations: 0,
                converged: false,
            };
        }

        let mut rng = StdRng::seed_from_u64(params.seed);

        // Initialize memberships randomly, each row rescaled to sum to 1
        let mut memberships =
            Array2::from_shape_fn((points, k), |_| rng.random::<f64>() + f64::EPSILON);
        for mut row in memberships.rows_mut() {
            let total = row.sum();
            row /= total;
        }

        let fallback = data
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(dims));
        let mut centers = weighted_centers(data, &memberships, params.fuzziness, &fallback);

        let mut iterations = 0;
        let mut converged = false;

        while iterations < params.max_iterations {
            iterations += 1;

            memberships = update_memberships(data, &centers, params.fuzziness);
            let next = weighted_centers(data, &memberships, params.fuzziness, &fallback);

            let shift = centers
                .rows()
                .into_iter()
                .zip(next.rows())
                .map(|(old, new)| distance(old, new))
                .fold(0.0_f64, f64::max);
            centers = next;

            if shift < params.tolerance {
                converged = true;
                break;
            }
        }

        Self {
            centers,
            memberships,
            iterations,
            converged,
        }
    }

    /// Fuzzy partition coefficient: 1 for a crisp partition, `1/k` for a uniform one.
    #[must_use]
    pub fn partition_coefficient(&self) -> f64 {
        let points = self.memberships.nrows();
        if points == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let points = points as f64;
        self.memberships.iter().map(|u| u * u).sum::<f64>() / points
    }
}

/// Recomputes every point's degree of membership to every center.
fn update_memberships(data: ArrayView2<'_, f64>, centers: &Array2<f64>, m: f64) -> Array2<f64> {
    let k = centers.nrows();
    let exponent = 2.0 / (m - 1.0);
    let mut memberships = Array2::zeros((data.nrows(), k));

    for (point, mut row) in data.rows().into_iter().zip(memberships.rows_mut()) {
        let distances: Vec<f64> = centers
            .rows()
            .into_iter()
            .map(|center| distance(point, center))
            .collect();

        let coincident: Vec<usize> = distances
            .iter()
            .enumerate()
            .filter(|(_, d)| **d <= COINCIDENCE_EPSILON)
            .map(|(j, _)| j)
            .collect();

        if coincident.is_empty() {
            // ratios against the nearest center keep the weights in (0, 1]
            let nearest = distances.iter().copied().fold(f64::INFINITY, f64::min);
            let weights: Vec<f64> = distances
                .iter()
                .map(|d| (nearest / d).powf(exponent))
                .collect();
            let total: f64 = weights.iter().sum();
            for (slot, weight) in row.iter_mut().zip(weights) {
                *slot = weight / total;
            }
        } else {
            #[allow(clippy::cast_precision_loss)]
            let share = 1.0 / coincident.len() as f64;
            for j in coincident {
                row[j] = share;
            }
        }
    }

    memberships
}

/// Membership-weighted centroids. A cluster with no weight falls back to `fallback`.
fn weighted_centers(
    data: ArrayView2<'_, f64>,
    memberships: &Array2<f64>,
    m: f64,
    fallback: &Array1<f64>,
) -> Array2<f64> {
    let k = memberships.ncols();
    let mut centers = Array2::zeros((k, data.ncols()));

    for (j, mut center) in centers.rows_mut().into_iter().enumerate() {
        let mut denominator = 0.0;
        for (point, u) in data.rows().into_iter().zip(memberships.column(j)) {
            let weight = u.powf(m);
            center.scaled_add(weight, &point);
            denominator += weight;
        }
        if denominator > 0.0 {
            center /= denominator;
        } else {
            center.assign(fallback);
        }
    }

    centers
}

fn distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}
