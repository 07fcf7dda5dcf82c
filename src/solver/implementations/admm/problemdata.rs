#![allow(non_snake_case)]
use super::*;
use crate::algebra::*;
use crate::solver::core::{ProblemData, QpSettings};
use crate::solver::QP_INFINITY;

// ---------------
// scaled problem data
// ---------------

/// Equilibrated copy of the problem data used by the ADMM iteration
#[derive(Debug, Clone)]
pub struct AdmmProblemData<T> {
    pub P: CscMatrix<T>,
    pub q: Vec<T>,
    pub A: CscMatrix<T>,
    pub l: Vec<T>,
    pub u: Vec<T>,
    pub n: usize,
    pub m: usize,
    pub equilibration: EquilibrationData<T>,
}

impl<T> AdmmProblemData<T>
where
    T: FloatT,
{
    /// Copy the data, clip infinite bounds to ±QP_INFINITY and
    /// equilibrate with `settings.scaling` Ruiz iterations
    pub fn new(data: &ProblemData<T>, settings: &QpSettings<T>) -> Self {
        let (n, m) = (data.n, data.m);

        let mut l = data.l.clone();
        let mut u = data.u.clone();
        clip_bounds(&mut l, &mut u);

        let mut scaled = Self {
            P: data.P.clone(),
            q: data.q.clone(),
            A: data.A.clone(),
            l,
            u,
            n,
            m,
            equilibration: EquilibrationData::new(n, m),
        };
        scaled.equilibrate(settings.scaling);
        scaled
    }

    fn equilibrate(&mut self, iterations: u32) {
        let data = self;
        let equil = &mut data.equilibration;

        // identity scaling is already in place
        if iterations == 0 {
            return;
        }

        // references to scaling matrices from workspace
        let (d, e) = (&mut equil.d, &mut equil.e);

        // use the inverse scalings as work vectors
        let dwork = &mut equil.dinv;
        let ework = &mut equil.einv;

        // references to problem data
        // note that P is triu, but it shouldn't matter
        let (P, A, q, l, u) = (
            &mut data.P,
            &mut data.A,
            &mut data.q,
            &mut data.l,
            &mut data.u,
        );

        let scale_min: T = MIN_SCALING.as_T();
        let scale_max: T = MAX_SCALING.as_T();

        // perform scaling operations for a fixed number of steps
        for _ in 0..iterations {
            kkt_col_norms(P, A, dwork, ework);

            dwork.scalarop(|x| limit_scaling(x, scale_min, scale_max));
            ework.scalarop(|x| limit_scaling(x, scale_min, scale_max));

            dwork.rsqrt();
            ework.rsqrt();

            // Scale the problem data and update the
            // equilibration matrices
            scale_data(P, A, q, l, u, dwork, ework);
            d.hadamard(dwork);
            e.hadamard(ework);

            // now use the dwork array to hold the
            // column norms of the newly scaled P
            // so that we can compute the mean
            P.col_norms_sym(dwork);
            let mean_col_norm_P = dwork.mean();
            let inf_norm_q = q.norm_inf();

            let scale_cost = T::max(inf_norm_q, mean_col_norm_P);
            let scale_cost = limit_scaling(scale_cost, scale_min, scale_max);
            let ctmp = T::recip(scale_cost);

            // scale the penalty terms and overall scaling
            P.scale(ctmp);
            q.scale(ctmp);
            equil.c *= ctmp;
        } //end Ruiz scaling loop

        // update the inverse scaling data
        equil.dinv.scalarop_from(T::recip, d);
        equil.einv.scalarop_from(T::recip, e);
        equil.cinv = T::recip(equil.c);
    }

    /// Replace the linear cost with unscaled values
    pub(crate) fn set_q(&mut self, q: &[T]) {
        let equil = &self.equilibration;
        self.q.copy_from(q).hadamard(&equil.d).scale(equil.c);
    }

    /// Clipped and scaled copies of unscaled bounds
    pub(crate) fn scaled_bounds(&self, l: &[T], u: &[T]) -> (Vec<T>, Vec<T>) {
        let e = &self.equilibration.e;
        let mut l = l.to_vec();
        let mut u = u.to_vec();
        clip_bounds(&mut l, &mut u);
        l.hadamard(e);
        u.hadamard(e);
        (l, u)
    }

    /// Scaled values for an unscaled nonzero array of P
    pub(crate) fn scaled_P_values(&self, Px: &[T]) -> Vec<T> {
        let equil = &self.equilibration;
        let d = &equil.d;
        scaled_values(&self.P, Px, d, d, equil.c)
    }

    /// Scaled values for an unscaled nonzero array of A
    pub(crate) fn scaled_A_values(&self, Ax: &[T]) -> Vec<T> {
        let equil = &self.equilibration;
        scaled_values(&self.A, Ax, &equil.e, &equil.d, T::one())
    }

    /// ½x̄ᵀP̄x̄ + q̄ᵀx̄ in unscaled units
    pub(crate) fn objective(&self, xbar: &[T]) -> T {
        let half: T = (0.5).as_T();
        let obj = half * self.P.quad_form(xbar, xbar) + self.q.dot(xbar);
        obj * self.equilibration.cinv
    }
}

// ---------------
// utilities
// ---------------

fn kkt_col_norms<T: FloatT>(
    P: &CscMatrix<T>,
    A: &CscMatrix<T>,
    norm_LHS: &mut [T],
    norm_RHS: &mut [T],
) {
    P.col_norms_sym(norm_LHS); // P can be triu
    A.col_norms_no_reset(norm_LHS); // incrementally from P norms
    A.row_norms(norm_RHS); // same as column norms of A'
}

fn limit_scaling<T>(s: T, minval: T, maxval: T) -> T
where
    T: FloatT + ScalarMath<T = T>,
{
    s.clip(minval, maxval, T::one(), maxval)
}

fn scale_data<T: FloatT>(
    P: &mut CscMatrix<T>,
    A: &mut CscMatrix<T>,
    q: &mut [T],
    l: &mut [T],
    u: &mut [T],
    d: &[T],
    e: &[T],
) {
    P.lrscale(d, d); // P[:,:] = Ds*P*Ds
    A.lrscale(e, d); // A[:,:] = Es*A*Ds
    q.hadamard(d);
    l.hadamard(e);
    u.hadamard(e);
}

// nonzero values of diag(lscale)*M*diag(rscale)*c, with the
// values of M replaced by Mx
fn scaled_values<T: FloatT>(M: &CscMatrix<T>, Mx: &[T], lscale: &[T], rscale: &[T], c: T) -> Vec<T> {
    let mut out = Vec::with_capacity(Mx.len());
    for col in 0..M.n {
        for k in M.colptr[col]..M.colptr[col + 1] {
            let row = M.rowval[k];
            out.push(lscale[row] * Mx[k] * rscale[col] * c);
        }
    }
    out
}

fn clip_bounds<T: FloatT>(l: &mut [T], u: &mut [T]) {
    let inf: T = QP_INFINITY.as_T();
    l.scalarop(|x| T::max(x, -inf));
    u.scalarop(|x| T::min(x, inf));
}

#[test]
fn test_equilibration_preserves_solution_map() {
    let P = CscMatrix::from(&[[4., 1.], [0., 2.]]);
    let A = CscMatrix::from(&[[1., 1.], [1., 0.], [0., 1.]]);
    let data = ProblemData::new(&P, &[1., 1.], &A, &[1., 0., 0.], &[1., 0.7, 0.7]).unwrap();
    let settings = QpSettings::<f64>::default();
    let scaled = AdmmProblemData::new(&data, &settings);

    // D*(scaled A)*E reproduces the original values
    let equil = &scaled.equilibration;
    let mut Ax = scaled.A.nzval.clone();
    let mut k = 0;
    for col in 0..2 {
        for ptr in scaled.A.colptr[col]..scaled.A.colptr[col + 1] {
            let row = scaled.A.rowval[ptr];
            Ax[k] *= equil.einv[row] * equil.dinv[col];
            k += 1;
        }
    }
    for (a, b) in Ax.iter().zip(&data.A.nzval) {
        assert!((a - b).abs() < 1e-12);
    }

    // rescaling the original values reproduces the scaled ones
    let Ascaled = scaled.scaled_A_values(&data.A.nzval);
    for (a, b) in Ascaled.iter().zip(&scaled.A.nzval) {
        assert!((a - b).abs() < 1e-12);
    }
    let Pscaled = scaled.scaled_P_values(&data.P.nzval);
    for (a, b) in Pscaled.iter().zip(&scaled.P.nzval) {
        assert!((a - b).abs() < 1e-12);
    }

    assert!(equil.d.iter().all(|&d| d > 0.0 && d.is_finite()));
    assert!(equil.e.iter().all(|&e| e > 0.0 && e.is_finite()));
    assert!(equil.c > 0.0);
    assert!((equil.c * equil.cinv - 1.0).abs() < 1e-12);
}

#[test]
fn test_infinite_bounds_are_clipped() {
    let P = CscMatrix::from(&[[1.]]);
    let A = CscMatrix::from(&[[1.]]);
    let data =
        ProblemData::new(&P, &[0.], &A, &[f64::NEG_INFINITY], &[f64::INFINITY]).unwrap();
    let settings = QpSettings {
        scaling: 0,
        ..QpSettings::<f64>::default()
    };
    let scaled = AdmmProblemData::new(&data, &settings);
    assert_eq!(scaled.l, vec![-QP_INFINITY]);
    assert_eq!(scaled.u, vec![QP_INFINITY]);
}
