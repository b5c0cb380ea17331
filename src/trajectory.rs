//! Integrated orbital evolutions.
//!
//! A [`Trajectory`] holds the stored samples in ascending time together with
//! the integrator output they came from. When both directions were
//! integrated, the samples are the reversed backward solution (minus its
//! duplicate `t = 0` sample) followed by the forward solution, and dense
//! output is delegated to whichever solution covers the requested time, so
//! each keeps its own interpolant.

use std::f64::consts::TAU;

use crate::error::StateError;
use crate::interpolation::MonotoneCubic;
use crate::pn_order::PNOrder;
use crate::solution::OdeSolution;
use crate::state::{index, PNSystem, SystemKind};
use crate::termination::Termination;

/// An orbital evolution, ready for named access and interpolation.
#[derive(Debug, Clone)]
pub struct Trajectory {
    kind: SystemKind,
    order: PNOrder,
    t: Vec<f64>,
    u: Vec<Vec<f64>>,
    forward: OdeSolution,
    backward: Option<OdeSolution>,
    termination: Termination,
    backward_termination: Option<Termination>,
    warnings: Vec<String>,
}

impl Trajectory {
    pub(crate) fn forward_only(
        kind: SystemKind,
        order: PNOrder,
        forward: OdeSolution,
        termination: Termination,
        warnings: Vec<String>,
    ) -> Self {
        Self {
            kind,
            order,
            t: forward.t.clone(),
            u: forward.u.clone(),
            forward,
            backward: None,
            termination,
            backward_termination: None,
            warnings,
        }
    }

    /// Join a backward solution (starting at `t = 0`, descending) and a
    /// forward solution (starting at `t = 0`, ascending).
    ///
    /// The overall termination is the forward one.
    pub(crate) fn stitch(
        kind: SystemKind,
        order: PNOrder,
        backward: (OdeSolution, Termination),
        forward: (OdeSolution, Termination),
        warnings: Vec<String>,
    ) -> Self {
        let (backward, backward_termination) = backward;
        let (forward, termination) = forward;
        let t = backward
            .t
            .iter()
            .skip(1)
            .rev()
            .chain(&forward.t)
            .copied()
            .collect();
        let u = backward
            .u
            .iter()
            .skip(1)
            .rev()
            .chain(&forward.u)
            .cloned()
            .collect();
        Self {
            kind,
            order,
            t,
            u,
            forward,
            backward: Some(backward),
            termination,
            backward_termination: Some(backward_termination),
            warnings,
        }
    }

    /// System variant of every sample.
    pub fn kind(&self) -> SystemKind {
        self.kind
    }

    /// PN order the evolution used.
    pub fn order(&self) -> PNOrder {
        self.order
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.t.len()
    }

    /// True if there are no samples.
    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    /// Sample times, ascending.
    pub fn times(&self) -> &[f64] {
        &self.t
    }

    /// Raw state vectors at the sample times, in field order.
    pub fn samples(&self) -> &[Vec<f64>] {
        &self.u
    }

    /// Why the forward evolution stopped.
    pub fn termination(&self) -> Termination {
        self.termination
    }

    /// Why the backward evolution stopped, if there was one.
    pub fn backward_termination(&self) -> Option<Termination> {
        self.backward_termination
    }

    /// Every warning emitted while building this trajectory.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// The forward integrator output.
    pub fn forward_solution(&self) -> &OdeSolution {
        &self.forward
    }

    /// The backward integrator output, if any.
    pub fn backward_solution(&self) -> Option<&OdeSolution> {
        self.backward.as_ref()
    }

    /// Field `name` of sample `i`.
    pub fn value(&self, name: &str, i: usize) -> Result<f64, StateError> {
        let j = self.kind.checked_index(name)?;
        let sample = self.u.get(i).ok_or(StateError::SampleOutOfRange {
            index: i,
            len: self.u.len(),
        })?;
        Ok(sample[j])
    }

    /// Field `name` at every sample.
    pub fn column(&self, name: &str) -> Result<Vec<f64>, StateError> {
        let j = self.kind.checked_index(name)?;
        Ok(self.u.iter().map(|u| u[j]).collect())
    }

    /// Sample `i` as a state.
    pub fn state(&self, i: usize) -> Option<PNSystem<f64>> {
        PNSystem::from_slice(self.kind, self.u.get(i)?, self.order).ok()
    }

    /// State vector at any `t` in the integrated span.
    pub fn interpolate(&self, t: f64) -> Option<Vec<f64>> {
        if t >= 0.0 {
            self.forward.interpolate(t)
        } else {
            self.backward.as_ref()?.interpolate(t)
        }
    }

    /// State at any `t` in the integrated span.
    pub fn interpolate_state(&self, t: f64) -> Option<PNSystem<f64>> {
        PNSystem::from_slice(self.kind, &self.interpolate(t)?, self.order).ok()
    }

    /// The same evolution sampled at `times`; times outside the integrated
    /// span are skipped.
    pub fn resample(&self, times: &[f64]) -> Trajectory {
        let (t, u) = times
            .iter()
            .filter_map(|&t| Some((t, self.interpolate(t)?)))
            .unzip();
        Trajectory {
            t,
            u,
            ..self.clone()
        }
    }

    /// The same evolution sampled where the orbital phase has advanced by
    /// `2π / samples_per_orbit` since the first sample.
    ///
    /// Sample times come from a monotone cubic fit of `t(Φ)` through the
    /// stored samples. Returns `None` if there are fewer than two samples with
    /// increasing phase or `samples_per_orbit` is zero.
    pub fn resample_uniform_phase(&self, samples_per_orbit: usize) -> Option<Trajectory> {
        if samples_per_orbit == 0 {
            return None;
        }
        let mut phase = Vec::with_capacity(self.len());
        let mut time = Vec::with_capacity(self.len());
        for (t, u) in self.t.iter().zip(&self.u) {
            let phi = u[index::PHI];
            if phase.last().map_or(true, |&last| phi > last) {
                phase.push(phi);
                time.push(*t);
            }
        }
        let spline = MonotoneCubic::new(phase, time)?;
        let (phi_start, phi_end) = spline.domain();
        let dphi = TAU / samples_per_orbit as f64;
        let count = ((phi_end - phi_start) / dphi).floor() as usize + 1;
        let times: Vec<f64> = (0..count)
            .filter_map(|k| spline.eval(phi_start + k as f64 * dphi))
            .collect();
        Some(self.resample(&times))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const OMEGA: f64 = 0.05;

    /// Circular orbit with `v = 0.3 + 10⁻³ t`, `Φ = Ω t`.
    fn sample(t: f64) -> (Vec<f64>, Vec<f64>) {
        let mut u = vec![0.0; SystemKind::BBH.len()];
        let mut dudt = vec![0.0; SystemKind::BBH.len()];
        u[index::M1] = 0.6;
        u[index::M2] = 0.4;
        u[index::R] = 1.0;
        u[index::V] = 0.3 + 1e-3 * t;
        dudt[index::V] = 1e-3;
        u[index::PHI] = OMEGA * t;
        dudt[index::PHI] = OMEGA;
        (u, dudt)
    }

    fn solution(times: &[f64]) -> OdeSolution {
        let (u0, f0) = sample(times[0]);
        let mut sol = OdeSolution::start(times[0], u0, f0);
        for &t in &times[1..] {
            let (u, f) = sample(t);
            sol.push(t, u, f);
        }
        sol
    }

    fn stitched() -> Trajectory {
        Trajectory::stitch(
            SystemKind::BBH,
            PNOrder::MAX,
            (solution(&[0.0, -4.0, -10.0]), Termination::TargetVelocity),
            (solution(&[0.0, 3.0, 7.0, 20.0]), Termination::DecreasingVelocity),
            vec!["careful".to_string()],
        )
    }

    #[test]
    fn test_stitched_samples_ascend_without_duplicate_origin() {
        let traj = stitched();
        assert_eq!(traj.times(), &[-10.0, -4.0, 0.0, 3.0, 7.0, 20.0]);
        assert_eq!(traj.len(), 6);
        assert_eq!(traj.samples()[2], sample(0.0).0);
        assert_eq!(traj.termination(), Termination::DecreasingVelocity);
        assert_eq!(traj.backward_termination(), Some(Termination::TargetVelocity));
        assert_eq!(traj.warnings(), &["careful".to_string()]);
    }

    #[test]
    fn test_interpolation_dispatches_by_sign() {
        let traj = stitched();
        for &t in &[-10.0, -7.5, -0.1, 0.0, 1.5, 19.0] {
            let u = traj.interpolate(t).unwrap();
            assert_relative_eq!(u[index::V], 0.3 + 1e-3 * t, epsilon = 1e-14);
            assert_relative_eq!(u[index::PHI], OMEGA * t, epsilon = 1e-14);
        }
        assert!(traj.interpolate(-10.5).is_none());
        assert!(traj.interpolate(20.5).is_none());
    }

    #[test]
    fn test_forward_only_has_no_negative_times() {
        let traj = Trajectory::forward_only(
            SystemKind::BBH,
            PNOrder::MAX,
            solution(&[0.0, 1.0]),
            Termination::TargetVelocity,
            Vec::new(),
        );
        assert!(traj.interpolate(-0.5).is_none());
        assert!(traj.backward_solution().is_none());
        assert_eq!(traj.backward_termination(), None);
    }

    #[test]
    fn test_named_access() {
        let traj = stitched();
        assert_relative_eq!(traj.value("v", 3).unwrap(), 0.303, epsilon = 1e-15);
        assert_eq!(traj.column("M1").unwrap(), vec![0.6; 6]);
        assert!(matches!(
            traj.column("Lambda2"),
            Err(StateError::UnknownField { .. })
        ));
        let state = traj.state(0).unwrap();
        assert_relative_eq!(state.v(), 0.29, epsilon = 1e-15);
        assert!(traj.state(6).is_none());
        assert_eq!(
            traj.value("v", 6),
            Err(StateError::SampleOutOfRange { index: 6, len: 6 })
        );
        let mid = traj.interpolate_state(5.0).unwrap();
        assert_relative_eq!(mid.phi(), 0.25, epsilon = 1e-14);
    }

    #[test]
    fn test_resample_skips_times_outside_span() {
        let traj = stitched().resample(&[-20.0, -5.0, 0.5, 10.0, 30.0]);
        assert_eq!(traj.times(), &[-5.0, 0.5, 10.0]);
        assert_relative_eq!(traj.value("v", 2).unwrap(), 0.31, epsilon = 1e-14);
        // dense output still spans the full evolution
        assert!(traj.interpolate(-9.0).is_some());
    }

    #[test]
    fn test_uniform_phase_resampling() {
        // Φ runs over [-0.5, 1.0], 8 samples per orbit → ΔΦ = π/4
        let traj = stitched().resample_uniform_phase(8).unwrap();
        let phi = traj.column("Phi").unwrap();
        assert_eq!(phi.len(), 2);
        for (k, p) in phi.iter().enumerate() {
            assert_relative_eq!(*p, -0.5 + k as f64 * TAU / 8.0, epsilon = 1e-12);
        }

        let dense = stitched().resample_uniform_phase(64).unwrap();
        assert_eq!(dense.len(), 16);
        let dt = dense.times()[1] - dense.times()[0];
        assert_relative_eq!(dt, TAU / 64.0 / OMEGA, epsilon = 1e-10);
        assert!(stitched().resample_uniform_phase(0).is_none());
    }
}
