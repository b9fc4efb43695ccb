//! Principal component analysis over dense `f64` matrices.
//!
//! Features (columns) are mean-centered across samples and only the top
//! components are extracted, by subspace iteration with Rayleigh-Ritz
//! projection. The covariance matrix is never formed: each sweep costs two
//! matrix products against a `features × (d + oversampling)` basis. The
//! starting basis comes from a fixed seed, so the same matrix always yields
//! the same embedding.

use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

const JACOBI_MAX_SWEEPS: usize = 100;
const JACOBI_EPSILON: f64 = 1e-12;

/// Extra basis vectors carried beyond the requested components.
const OVERSAMPLING: usize = 5;
const SUBSPACE_MAX_SWEEPS: usize = 500;
/// Stop once every kept Ritz pair satisfies `|C v - λ v| <= tol * trace(C)`.
const RESIDUAL_TOLERANCE: f64 = 1e-9;
const BASIS_SEED: u64 = 0x5EED_0F_BA5E;
const DEGENERATE_NORM: f64 = 1e-10;

/// Result of [`fit_transform`].
#[derive(Debug, Clone)]
pub struct PrincipalComponents {
    /// One row per sample, one column per retained component.
    pub embedding: Array2<f64>,
    /// Variance captured by each retained component, descending.
    pub explained_variance: Vec<f64>,
}

impl PrincipalComponents {
    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.embedding.ncols()
    }
}

/// Projects `data` (samples × features) onto its top `max_components` principal axes.
///
/// The number of retained components is `min(max_components, samples, features)`.
#[must_use]
pub fn fit_transform(data: ArrayView2<'_, f64>, max_components: usize) -> PrincipalComponents {
    let (samples, features) = data.dim();
    let dims = max_components.min(samples).min(features);
    if dims == 0 {
        return PrincipalComponents {
            embedding: Array2::zeros((samples, 0)),
            explained_variance: Vec::new(),
        };
    }

    let mean = data
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(features));
    #[allow(clippy::cast_precision_loss)]
    let denominator = samples.saturating_sub(1).max(1) as f64;
    let total_variance = data
        .rows()
        .into_iter()
        .map(|row| {
            row.iter()
                .zip(mean.iter())
                .map(|(x, m)| (x - m).powi(2))
                .sum::<f64>()
        })
        .sum::<f64>()
        / denominator;
    if total_variance <= f64::MIN_POSITIVE {
        return PrincipalComponents {
            embedding: Array2::zeros((samples, dims)),
            explained_variance: vec![0.0; dims],
        };
    }

    let covariance = CenteredCovariance {
        data,
        mean: &mean,
        denominator,
    };

    let width = (dims + OVERSAMPLING).min(features);
    let mut rng = StdRng::seed_from_u64(BASIS_SEED);
    let mut basis = orthonormalize(Array2::from_shape_fn((features, width), |_| {
        rng.random::<f64>() - 0.5
    }));

    let mut sweeps = 0;
    let (components, explained_variance) = loop {
        sweeps += 1;
        let image = covariance.apply(&basis);
        let ritz = basis.t().dot(&image);
        let ritz = (&ritz + &ritz.t()) * 0.5;
        let (values, vectors) = symmetric_eigen(ritz);

        let mut order: Vec<usize> = (0..width).collect();
        order.sort_by(|&a, &b| values[b].total_cmp(&values[a]).then(a.cmp(&b)));
        let mut rotation = Array2::zeros((width, width));
        for (slot, &index) in order.iter().enumerate() {
            rotation.column_mut(slot).assign(&vectors.column(index));
        }

        // Ritz vectors and their images, largest value first
        let ritz_vectors = basis.dot(&rotation);
        let ritz_images = image.dot(&rotation);
        let residual = (0..dims)
            .map(|slot| {
                let value = values[order[slot]];
                let mut gap = ritz_images.column(slot).to_owned();
                gap.scaled_add(-value, &ritz_vectors.column(slot));
                gap.dot(&gap).sqrt()
            })
            .fold(0.0_f64, f64::max);

        if residual <= RESIDUAL_TOLERANCE * total_variance || sweeps >= SUBSPACE_MAX_SWEEPS {
            if residual > RESIDUAL_TOLERANCE * total_variance {
                debug!(sweeps, residual, "principal axes stopped at the sweep cap");
            }
            let mut components = Array2::zeros((features, dims));
            let mut explained = Vec::with_capacity(dims);
            for slot in 0..dims {
                let mut axis = ritz_vectors.column(slot).to_owned();
                fix_sign(&mut axis);
                components.column_mut(slot).assign(&axis);
                explained.push(values[order[slot]].max(0.0));
            }
            break (components, explained);
        }

        basis = orthonormalize(ritz_images);
    };

    let mut embedding = data.dot(&components);
    let shift = mean.dot(&components);
    for mut row in embedding.rows_mut() {
        row -= &shift;
    }

    PrincipalComponents {
        embedding,
        explained_variance,
    }
}

/// `v ↦ Xᵀ X v / (n - 1)` for the column-centered `X`, without materializing `X`.
struct CenteredCovariance<'a, 'm> {
    data: ArrayView2<'a, f64>,
    mean: &'m Array1<f64>,
    denominator: f64,
}

impl CenteredCovariance<'_, '_> {
    fn apply(&self, basis: &Array2<f64>) -> Array2<f64> {
        let mut projected = self.data.dot(basis);
        let shift = self.mean.dot(basis);
        for mut row in projected.rows_mut() {
            row -= &shift;
        }
        let mut image = self.data.t().dot(&projected);
        let column_sums = projected.sum_axis(Axis(0));
        for (mut row, &mean) in image.rows_mut().into_iter().zip(self.mean.iter()) {
            row.scaled_add(-mean, &column_sums);
        }
        image / self.denominator
    }
}

/// Modified Gram-Schmidt over the columns of `basis`.
///
/// A column that falls into the span of the earlier ones is replaced by the
/// coordinate axis least covered by them, so the result is always orthonormal.
fn orthonormalize(mut basis: Array2<f64>) -> Array2<f64> {
    let (rows, width) = basis.dim();
    for j in 0..width {
        for i in 0..j {
            let earlier = basis.column(i).to_owned();
            let overlap = earlier.dot(&basis.column(j));
            basis.column_mut(j).scaled_add(-overlap, &earlier);
        }
        let norm = basis.column(j).dot(&basis.column(j)).sqrt();
        if norm > DEGENERATE_NORM {
            basis.column_mut(j).mapv_inplace(|value| value / norm);
            continue;
        }

        let axis = (0..rows)
            .map(|k| (k, (0..j).map(|i| basis[[k, i]].powi(2)).sum::<f64>()))
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
            .map_or(0, |(k, _)| k);
        let mut column = Array1::zeros(rows);
        column[axis] = 1.0;
        for i in 0..j {
            let earlier = basis.column(i).to_owned();
            let overlap = earlier.dot(&column);
            column.scaled_add(-overlap, &earlier);
        }
        let norm = column.dot(&column).sqrt().max(f64::MIN_POSITIVE);
        basis.column_mut(j).assign(&(column / norm));
    }
    basis
}

/// Flips the axis so that its largest-magnitude loading is positive.
fn fix_sign(axis: &mut Array1<f64>) {
    let pivot = axis
        .iter()
        .copied()
        .enumerate()
        .fold((0, 0.0_f64), |(best, top), (index, value)| {
            if value.abs() > top.abs() {
                (index, value)
            } else {
                (best, top)
            }
        });
    if pivot.1 < 0.0 {
        axis.mapv_inplace(|value| -value);
    }
}

/// Eigen-decomposition of a symmetric matrix by cyclic Jacobi rotations.
///
/// Returns eigenvalues (unsorted) and the matching eigenvectors as columns.
fn symmetric_eigen(mut a: Array2<f64>) -> (Vec<f64>, Array2<f64>) {
    let n = a.nrows();
    let mut v = Array2::<f64>::eye(n);

    let scale = a.iter().map(|x| x * x).sum::<f64>().sqrt().max(f64::MIN_POSITIVE);

    for _ in 0..JACOBI_MAX_SWEEPS {
        let off_diagonal: f64 = (0..n)
            .flat_map(|p| ((p + 1)..n).map(move |q| (p, q)))
            .map(|(p, q)| a[[p, q]] * a[[p, q]])
            .sum::<f64>()
            .sqrt();
        if off_diagonal <= JACOBI_EPSILON * scale {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[[p, q]];
                if apq.abs() <= f64::MIN_POSITIVE {
                    continue;
                }
                let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + theta.mul_add(theta, 1.0).sqrt());
                let c = 1.0 / t.mul_add(t, 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let akp = a[[k, p]];
                    let akq = a[[k, q]];
                    a[[k, p]] = c * akp - s * akq;
                    a[[k, q]] = s * akp + c * akq;
                }
                for k in 0..n {
                    let apk = a[[p, k]];
                    let aqk = a[[q, k]];
                    a[[p, k]] = c * apk - s * aqk;
                    a[[q, k]] = s * apk + c * aqk;
                }
                for k in 0..n {
                    let vkp = v[[k, p]];
                    let vkq = v[[k, q]];
                    v[[k, p]] = c * vkp - s * vkq;
                    v[[k, q]] = s * vkp + c * vkq;
                }
            }
        }
    }

    let eigenvalues = (0..n).map(|i| a[[i, i]]).collect();
    (eigenvalues, v)
}
