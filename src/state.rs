//! The PN system state: masses, spins, orientation rotor, velocity parameter,
//! orbital phase, and optional tidal parameters.
//!
//! The packed layout is fixed and shared with the integrator's state vector:
//!
//! | index | field | | index | field |
//! |---|---|---|---|---|
//! | 0 | `M1` | | 8 | `Rw` |
//! | 1 | `M2` | | 9 | `Rx` |
//! | 2 | `chi1x` | | 10 | `Ry` |
//! | 3 | `chi1y` | | 11 | `Rz` |
//! | 4 | `chi1z` | | 12 | `v` |
//! | 5 | `chi2x` | | 13 | `Phi` |
//! | 6 | `chi2y` | | 14 | `Lambda2` (BHNS) or `Lambda1` (NSNS) |
//! | 7 | `chi2z` | | 15 | `Lambda2` (NSNS) |
//!
//! Variants that carry no tidal parameter for a body report exactly zero for
//! it, so tidal contributions vanish identically for black holes.

use std::fmt;

use nalgebra::{Quaternion, Vector3};

use crate::error::StateError;
use crate::float::PnFloat;
use crate::pn_order::PNOrder;

/// Positional indices into the packed state vector.
pub mod index {
    /// Mass of body 1
    pub const M1: usize = 0;
    /// Mass of body 2
    pub const M2: usize = 1;
    /// First component of χ⃗₁
    pub const CHI1: usize = 2;
    /// First component of χ⃗₂
    pub const CHI2: usize = 5;
    /// Scalar part of the rotor
    pub const R: usize = 8;
    /// PN velocity parameter
    pub const V: usize = 12;
    /// Orbital phase
    pub const PHI: usize = 13;
}

/// Largest packed length of any variant.
pub const MAX_FIELDS: usize = 16;

const BBH_FIELDS: [&str; 14] = [
    "M1", "M2", "chi1x", "chi1y", "chi1z", "chi2x", "chi2y", "chi2z", "Rw", "Rx", "Ry", "Rz", "v",
    "Phi",
];

const BHNS_FIELDS: [&str; 15] = [
    "M1", "M2", "chi1x", "chi1y", "chi1z", "chi2x", "chi2y", "chi2z", "Rw", "Rx", "Ry", "Rz", "v",
    "Phi", "Lambda2",
];

const NSNS_FIELDS: [&str; 16] = [
    "M1", "M2", "chi1x", "chi1y", "chi1z", "chi2x", "chi2y", "chi2z", "Rw", "Rx", "Ry", "Rz", "v",
    "Phi", "Lambda1", "Lambda2",
];

/// Which bodies are neutron stars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemKind {
    /// Black hole + black hole (14 fields)
    BBH,
    /// Black hole + neutron star; body 2 is the neutron star (15 fields)
    BHNS,
    /// Neutron star + neutron star (16 fields)
    NSNS,
}

impl SystemKind {
    /// Variant implied by the tidal parameters: none, body 2 only, or body 1.
    pub fn from_tidal<T: PnFloat>(lambda1: T, lambda2: T) -> Self {
        if lambda1 != T::zero() {
            SystemKind::NSNS
        } else if lambda2 != T::zero() {
            SystemKind::BHNS
        } else {
            SystemKind::BBH
        }
    }

    /// Short name.
    pub fn name(self) -> &'static str {
        match self {
            SystemKind::BBH => "BBH",
            SystemKind::BHNS => "BHNS",
            SystemKind::NSNS => "NSNS",
        }
    }

    /// Packed length.
    pub fn len(self) -> usize {
        self.field_names().len()
    }

    /// Field names in packed order.
    pub fn field_names(self) -> &'static [&'static str] {
        match self {
            SystemKind::BBH => &BBH_FIELDS,
            SystemKind::BHNS => &BHNS_FIELDS,
            SystemKind::NSNS => &NSNS_FIELDS,
        }
    }

    /// Packed index of `name`, if this variant has such a field.
    pub fn index_of(self, name: &str) -> Option<usize> {
        let common = match name {
            "M1" => Some(0),
            "M2" => Some(1),
            "chi1x" => Some(2),
            "chi1y" => Some(3),
            "chi1z" => Some(4),
            "chi2x" => Some(5),
            "chi2y" => Some(6),
            "chi2z" => Some(7),
            "Rw" => Some(8),
            "Rx" => Some(9),
            "Ry" => Some(10),
            "Rz" => Some(11),
            "v" => Some(12),
            "Phi" => Some(13),
            _ => None,
        };
        common.or(match (self, name) {
            (SystemKind::BHNS, "Lambda2") => Some(14),
            (SystemKind::NSNS, "Lambda1") => Some(14),
            (SystemKind::NSNS, "Lambda2") => Some(15),
            _ => None,
        })
    }

    /// Like [`index_of`](Self::index_of), with an error listing the valid names.
    pub fn checked_index(self, name: &str) -> Result<usize, StateError> {
        self.index_of(name).ok_or_else(|| StateError::UnknownField {
            name: name.to_string(),
            kind: self.name(),
            valid: self.field_names().join(", "),
        })
    }

    fn lambda_indices(self) -> (Option<usize>, Option<usize>) {
        match self {
            SystemKind::BBH => (None, None),
            SystemKind::BHNS => (None, Some(14)),
            SystemKind::NSNS => (Some(14), Some(15)),
        }
    }
}

impl fmt::Display for SystemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// State of a compact binary at one instant, at a declared PN order.
///
/// Storage is a fixed-size array so building one from the integrator's
/// working buffer never allocates; only the first `kind.len()` slots are
/// meaningful and the rest stay zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PNSystem<T> {
    kind: SystemKind,
    order: PNOrder,
    values: [T; MAX_FIELDS],
}

impl<T: PnFloat> PNSystem<T> {
    /// Build from physical quantities. The variant follows from which tidal
    /// parameters are nonzero (see [`SystemKind::from_tidal`]).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        m1: T,
        m2: T,
        chi1: Vector3<T>,
        chi2: Vector3<T>,
        r: Quaternion<T>,
        v: T,
        phi: T,
        lambda1: T,
        lambda2: T,
        order: PNOrder,
    ) -> Self {
        let kind = SystemKind::from_tidal(lambda1, lambda2);
        let mut values = [T::zero(); MAX_FIELDS];
        values[index::M1] = m1;
        values[index::M2] = m2;
        values[index::CHI1..index::CHI1 + 3].copy_from_slice(chi1.as_slice());
        values[index::CHI2..index::CHI2 + 3].copy_from_slice(chi2.as_slice());
        values[index::R] = r.w;
        values[index::R + 1] = r.i;
        values[index::R + 2] = r.j;
        values[index::R + 3] = r.k;
        values[index::V] = v;
        values[index::PHI] = phi;
        let (i1, i2) = kind.lambda_indices();
        if let Some(i) = i1 {
            values[i] = lambda1;
        }
        if let Some(i) = i2 {
            values[i] = lambda2;
        }
        Self {
            kind,
            order,
            values,
        }
    }

    /// Build from a packed vector whose length must match `kind` exactly.
    pub fn from_slice(kind: SystemKind, state: &[T], order: PNOrder) -> Result<Self, StateError> {
        if state.len() != kind.len() {
            return Err(StateError::WrongLength {
                kind: kind.name(),
                expected: kind.len(),
                found: state.len(),
            });
        }
        let mut values = [T::zero(); MAX_FIELDS];
        values[..state.len()].copy_from_slice(state);
        Ok(Self {
            kind,
            order,
            values,
        })
    }

    /// Variant.
    pub fn kind(&self) -> SystemKind {
        self.kind
    }

    /// Declared PN order.
    pub fn order(&self) -> PNOrder {
        self.order
    }

    /// The packed state.
    pub fn as_slice(&self) -> &[T] {
        &self.values[..self.kind.len()]
    }

    /// The packed state, copied.
    pub fn to_vec(&self) -> Vec<T> {
        self.as_slice().to_vec()
    }

    /// Value of a named field.
    pub fn get(&self, name: &str) -> Result<T, StateError> {
        Ok(self.values[self.kind.checked_index(name)?])
    }

    /// Overwrite a named field.
    pub fn set(&mut self, name: &str, value: T) -> Result<(), StateError> {
        let i = self.kind.checked_index(name)?;
        self.values[i] = value;
        Ok(())
    }

    /// A copy of the same variant and order with some fields replaced.
    pub fn with_overrides(&self, overrides: &[(&str, T)]) -> Result<Self, StateError> {
        let mut out = *self;
        for &(name, value) in overrides {
            out.set(name, value)?;
        }
        Ok(out)
    }

    /// Mass of body 1.
    pub fn m1(&self) -> T {
        self.values[index::M1]
    }

    /// Mass of body 2.
    pub fn m2(&self) -> T {
        self.values[index::M2]
    }

    /// Dimensionless spin of body 1.
    pub fn chi1(&self) -> Vector3<T> {
        Vector3::from_column_slice(&self.values[index::CHI1..index::CHI1 + 3])
    }

    /// Dimensionless spin of body 2.
    pub fn chi2(&self) -> Vector3<T> {
        Vector3::from_column_slice(&self.values[index::CHI2..index::CHI2 + 3])
    }

    /// Orientation rotor (not normalized).
    pub fn r(&self) -> Quaternion<T> {
        let i = index::R;
        Quaternion::new(
            self.values[i],
            self.values[i + 1],
            self.values[i + 2],
            self.values[i + 3],
        )
    }

    /// PN velocity parameter.
    pub fn v(&self) -> T {
        self.values[index::V]
    }

    /// Orbital phase.
    pub fn phi(&self) -> T {
        self.values[index::PHI]
    }

    /// Tidal deformability of body 1; zero unless NSNS.
    pub fn lambda1(&self) -> T {
        match self.kind.lambda_indices().0 {
            Some(i) => self.values[i],
            None => T::zero(),
        }
    }

    /// Tidal deformability of body 2; zero for BBH.
    pub fn lambda2(&self) -> T {
        match self.kind.lambda_indices().1 {
            Some(i) => self.values[i],
            None => T::zero(),
        }
    }
}
