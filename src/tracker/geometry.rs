//! Linear algebra of a single predictor-corrector step.
use crate::*;
use nalgebra::DMatrix;
use nalgebra::DVector;

/// Why a Newton correction was abandoned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Breakdown {
    /// Residual non-finite or beyond the sanity bound.
    Diverged(Residual),
    /// Updates stopped contracting, or the iteration budget ran out.
    Stalled,
    /// The bordered system could not be solved.
    Singular,
}

/// A point pulled back onto the solution curve.
#[derive(Debug, Clone)]
pub struct Correction {
    pub y: DVector<f64>,
    pub iterations: usize,
    pub residual: Residual,
}

/// `e_k` in `R^d`.
pub fn unit(d: usize, k: usize) -> DVector<f64> {
    let mut e = DVector::zeros(d);
    e[k] = 1.;
    e
}

/// The square matrix `[J; cᵀ]`.
fn bordered(jacobian: &DMatrix<f64>, border: &DVector<f64>) -> DMatrix<f64> {
    let rows = jacobian.nrows();
    let mut matrix = jacobian.clone().resize_vertically(rows + 1, 0.);
    matrix.row_mut(rows).copy_from(&border.transpose());
    matrix
}

/// Unit null vector of `J` with positive inner product with `border`.
///
/// Solves `[J; cᵀ] τ = e_D` by QR and normalizes.
pub fn tangent(jacobian: &DMatrix<f64>, border: &DVector<f64>) -> Option<DVector<f64>> {
    let d = jacobian.ncols();
    let tau = bordered(jacobian, border).qr().solve(&unit(d, d - 1))?;
    let norm = tau.norm();
    if norm.is_finite() && norm > 0. {
        Some(tau / norm)
    } else {
        None
    }
}

/// Tangent at a starting point, where no previous tangent exists.
///
/// Borders with `e_t` first, then every other coordinate axis, and
/// orients the result so that `t` does not decrease.
pub fn initial_tangent(jacobian: &DMatrix<f64>) -> Option<DVector<f64>> {
    let d = jacobian.ncols();
    std::iter::once(d - 1)
        .chain(0..d - 1)
        .find_map(|k| tangent(jacobian, &unit(d, k)))
        .map(|tau| if tau[d - 1] < 0. { -tau } else { tau })
}

/// Newton iteration restricted to the hyperplane orthogonal to `border`.
///
/// Each update solves `[J; cᵀ] Δ = [-H; 0]` by LU.
pub fn correct<H: Homotopy>(
    homotopy: &H,
    mut y: DVector<f64>,
    border: &DVector<f64>,
    settings: &Settings,
) -> Result<Correction, Breakdown> {
    let d = y.len();
    let mut previous = None::<Residual>;
    for iteration in 0..=settings.corrector_iterations {
        let h = homotopy.h(&y);
        let residual = h.norm();
        if !residual.is_finite() || residual > settings.residual_max {
            return Err(Breakdown::Diverged(residual));
        }
        if residual < settings.corrector_tolerance {
            return Ok(Correction {
                y,
                iterations: iteration,
                residual,
            });
        }
        if iteration == settings.corrector_iterations {
            break;
        }
        let delta = bordered(&homotopy.jacobian(&y), border)
            .lu()
            .solve(&(-h).resize_vertically(d, 0.))
            .ok_or(Breakdown::Singular)?;
        let size = delta.norm();
        if !size.is_finite() {
            return Err(Breakdown::Diverged(residual));
        }
        if let Some(last) = previous {
            if size > settings.corrector_tolerance && size > settings.contraction_max * last {
                return Err(Breakdown::Stalled);
            }
        }
        previous = Some(size);
        y += delta;
    }
    Err(Breakdown::Stalled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tangent_spans_null_space() {
        // J = [1 1 0; 0 1 -1] has null space span (1, -1, -1)
        let jacobian = DMatrix::from_row_slice(2, 3, &[1., 1., 0., 0., 1., -1.]);
        let tau = initial_tangent(&jacobian).unwrap();
        assert!((&jacobian * &tau).norm() < 1e-12);
        assert!((tau.norm() - 1.).abs() < 1e-12);
        assert!(tau[2] > 0.);
        let again = tangent(&jacobian, &tau).unwrap();
        assert!((again - &tau).norm() < 1e-12);
        let reversed = tangent(&jacobian, &-&tau).unwrap();
        assert!((reversed + tau).norm() < 1e-12);
    }
}
