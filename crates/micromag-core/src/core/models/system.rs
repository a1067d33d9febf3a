use super::field::Field;
use crate::core::error::ModelError;
use crate::core::terms::dynamics::Dynamics;
use crate::core::terms::energy::Energy;
use std::fmt;

/// A micromagnetic system: the unit of work handed to a driver.
///
/// A system composes an energy equation, a dynamics equation, an optional
/// magnetization field, a non-negative temperature and an immutable name.
/// The name, together with the drive and compute counters, determines where
/// a driver places the system's on-disk artifacts.
#[derive(Debug, Clone, PartialEq)]
pub struct System {
    name: String,
    energy: Energy,
    dynamics: Dynamics,
    m: Option<Field>,
    temperature: f64,
    drive_number: usize,
    compute_number: usize,
}

impl System {
    pub fn builder() -> SystemBuilder {
        SystemBuilder::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn energy(&self) -> &Energy {
        &self.energy
    }

    pub fn dynamics(&self) -> &Dynamics {
        &self.dynamics
    }

    pub fn m(&self) -> Option<&Field> {
        self.m.as_ref()
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// How many drives this system has been through.
    pub fn drive_number(&self) -> usize {
        self.drive_number
    }

    pub fn compute_number(&self) -> usize {
        self.compute_number
    }

    /// Replaces the energy equation. Accepts a bare term or a container via
    /// `Into<Energy>`.
    pub fn set_energy(&mut self, energy: impl Into<Energy>) {
        self.energy = energy.into();
    }

    /// Replaces the dynamics equation. Accepts a bare term or a container
    /// via `Into<Dynamics>`.
    pub fn set_dynamics(&mut self, dynamics: impl Into<Dynamics>) {
        self.dynamics = dynamics.into();
    }

    pub fn set_m(&mut self, m: Field) {
        self.m = Some(m);
    }

    /// # Errors
    ///
    /// Returns an error if `temperature` is negative.
    pub fn set_temperature(&mut self, temperature: f64) -> Result<(), ModelError> {
        if temperature < 0.0 {
            return Err(ModelError::InvalidValue {
                kind: "System",
                attribute: "temperature",
                reason: format!("must be non-negative, got {temperature:?}"),
            });
        }
        self.temperature = temperature;
        Ok(())
    }

    pub(crate) fn register_drive(&mut self) {
        self.drive_number += 1;
    }

    pub(crate) fn register_compute(&mut self) {
        self.compute_number += 1;
    }
}

impl fmt::Display for System {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "System(name='{}')", self.name)
    }
}

/// Builder for [`System`]. Only the name is required; energy and dynamics
/// default to the empty container, `m` to unset and the temperature to zero.
#[derive(Debug, Clone, Default)]
pub struct SystemBuilder {
    name: Option<String>,
    energy: Energy,
    dynamics: Dynamics,
    m: Option<Field>,
    temperature: f64,
}

impl SystemBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn energy(mut self, energy: impl Into<Energy>) -> Self {
        self.energy = energy.into();
        self
    }

    pub fn dynamics(mut self, dynamics: impl Into<Dynamics>) -> Self {
        self.dynamics = dynamics.into();
        self
    }

    pub fn m(mut self, m: Field) -> Self {
        self.m = Some(m);
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// # Errors
    ///
    /// Returns an error if no name was given or the temperature is negative.
    pub fn build(self) -> Result<System, ModelError> {
        let name = self.name.ok_or(ModelError::MissingParameter("name"))?;
        if self.temperature < 0.0 {
            return Err(ModelError::InvalidValue {
                kind: "System",
                attribute: "temperature",
                reason: format!("must be non-negative, got {:?}", self.temperature),
            });
        }
        Ok(System {
            name,
            energy: self.energy,
            dynamics: self.dynamics,
            m: self.m,
            temperature: self.temperature,
            drive_number: 0,
            compute_number: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::field::Mesh;
    use crate::core::terms::dynamics::{Damping, Precession};
    use crate::core::terms::energy::{Demag, Exchange};

    fn field() -> Field {
        let mesh = Mesh::new([0.0, 0.0, 0.0], [10e-9, 10e-9, 10e-9], [5, 5, 5]).unwrap();
        Field::uniform(mesh, [0.0, 0.0, 1e6])
    }

    #[test]
    fn builder_requires_a_name() {
        let err = SystemBuilder::new().build().unwrap_err();
        assert!(matches!(err, ModelError::MissingParameter("name")));
    }

    #[test]
    fn fresh_system_has_empty_equations_and_zero_counters() {
        let system = System::builder().name("test_system").build().unwrap();
        assert!(system.energy().is_empty());
        assert!(system.dynamics().is_empty());
        assert!(system.m().is_none());
        assert_eq!(system.temperature(), 0.0);
        assert_eq!(system.drive_number(), 0);
        assert_eq!(system.compute_number(), 0);
    }

    #[test]
    fn energy_setter_accepts_bare_term() {
        let mut system = System::builder().name("test_system").build().unwrap();
        system.set_energy(Exchange::new(1e-12));
        assert_eq!(system.energy().len(), 1);
        assert!(system.energy().contains_name("exchange"));
    }

    #[test]
    fn energy_setter_accepts_container() {
        let energy = (Exchange::new(1e-12) + Demag::new()).unwrap();
        let system = System::builder()
            .name("test_system")
            .energy(energy)
            .build()
            .unwrap();
        assert_eq!(system.energy().len(), 2);
    }

    #[test]
    fn dynamics_setter_accepts_term_and_container() {
        let mut system = System::builder().name("test_system").build().unwrap();
        system.set_dynamics(Damping::new(0.1).unwrap());
        assert_eq!(system.dynamics().len(), 1);
        let dynamics = (Precession::new(2.211e5).unwrap() + Damping::new(0.1).unwrap()).unwrap();
        system.set_dynamics(dynamics);
        assert_eq!(system.dynamics().len(), 2);
    }

    #[test]
    fn negative_temperature_is_rejected() {
        let err = System::builder()
            .name("test_system")
            .temperature(-1.0)
            .build()
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidValue { kind: "System", .. }));
        let mut system = System::builder().name("test_system").build().unwrap();
        assert!(system.set_temperature(-0.5).is_err());
        assert!(system.set_temperature(300.0).is_ok());
    }

    #[test]
    fn magnetization_can_be_set_and_replaced() {
        let mut system = System::builder().name("test_system").m(field()).build().unwrap();
        let flipped = field().scaled(-1.0);
        system.set_m(flipped.clone());
        assert!(system.m().unwrap().allclose(&flipped, 0.0));
    }

    #[test]
    fn display_shows_the_name() {
        let system = System::builder().name("my_cool_system").build().unwrap();
        assert_eq!(system.to_string(), "System(name='my_cool_system')");
    }
}
