use std::collections::BTreeMap;

use crate::method::{Euler, FixedStepMethod, MethodId, Rk2, Rk4};
use crate::params::Params;
use crate::tableau::RichardsonTableau;

/// Everything one method-worker exclusively owns for the duration of a run:
/// its integrator, its tableau, and its own copy of the parameter record.
pub struct MethodEntry {
    pub method: Box<dyn FixedStepMethod>,
    pub tableau: RichardsonTableau,
    pub params: Params,
}

/// Maps method-ID -> (integrator, tableau, per-method parameters),
/// constructed from the parameter record's enable flags and problem hints.
pub struct MethodRegistry {
    entries: BTreeMap<MethodId, MethodEntry>,
}

impl MethodRegistry {
    /// Builds the allowed set of methods per the parameter record's
    /// problem hints and enable flags:
    ///
    /// - `is_stiff`: only implicit methods are eligible; none are
    ///   implemented by this core, so the registry ends up empty and the
    ///   driver fails with `NoAllowedMethods`.
    /// - `is_fast` / `is_large`: RK4 only, regardless of the enable flags.
    /// - otherwise: one entry per enabled explicit-method flag.
    pub fn build(params: &Params) -> Self {
        let mut ids: Vec<MethodId> = Vec::new();

        if params.is_stiff {
            // Implicit methods only; the implicit linear-algebra
            // collaborator is out of scope for this core, so none get
            // installed here.
        } else if params.is_fast || params.is_large {
            ids.push(MethodId::Rk4);
        } else {
            if params.use_euler {
                ids.push(MethodId::Euler);
            }
            if params.use_rk2 {
                ids.push(MethodId::Rk2);
            }
            if params.use_rk4 {
                ids.push(MethodId::Rk4);
            }
        }

        let mut entries = BTreeMap::new();
        for id in ids {
            let method: Box<dyn FixedStepMethod> = match id {
                MethodId::Euler => Box::new(Euler::default()),
                MethodId::Rk2 => Box::new(Rk2::default()),
                MethodId::Rk4 => Box::new(Rk4::default()),
                MethodId::ImplicitEuler | MethodId::CrankNicolson => continue,
            };

            let mut tableau = RichardsonTableau::new();
            tableau.initialize_steps(params.reduction_factor, params.dt);

            let mut method_params = *params;
            method_params.current_table_size = params.min_table_size;

            entries.insert(
                id,
                MethodEntry {
                    method,
                    tableau,
                    params: method_params,
                },
            );
        }

        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> BTreeMap<MethodId, MethodEntry> {
        self.entries
    }
}
