//! Prebuilt example systems.

use crate::consts;
use crate::core::models::field::{Field, Mesh};
use crate::core::models::system::System;
use crate::core::terms::dynamics::{Damping, Precession};
use crate::core::terms::energy::Zeeman;

/// Macrospin example: a single discretisation cell of edge 1 nm with Zeeman
/// energy under `H = (0, 0, 1e6)` A/m, precession and damping dynamics,
/// saturation magnetisation `1e6` A/m and initial magnetisation along
/// `(0, 1, 1)`. The returned system is named `macrospin`.
pub fn macrospin() -> System {
    let mesh = Mesh::new([0.0, 0.0, 0.0], [1e-9, 1e-9, 1e-9], [1, 1, 1])
        .expect("macrospin mesh is valid");
    let m = Field::uniform_with_norm(mesh, [0.0, 1.0, 1.0], 1e6)
        .expect("macrospin magnetisation is valid");
    let dynamics = (Precession::new(consts::GAMMA0).expect("gamma0 is non-negative")
        + Damping::new(0.1).expect("alpha is non-negative"))
    .expect("precession and damping have distinct names");
    System::builder()
        .name("macrospin")
        .energy(Zeeman::new([0.0, 0.0, 1e6]))
        .dynamics(dynamics)
        .m(m)
        .build()
        .expect("macrospin system is valid")
}
