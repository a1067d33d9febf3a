use super::container::Container;
use super::energy::term_kind;
use super::{Term, name_or_default};
use crate::core::attrs::{AttrValue, Parameter, VectorParameter, format_term};
use crate::core::error::ModelError;
use crate::core::models::field::Field;
use std::fmt;
use std::ops::Add;

/// Dynamics terms container.
pub type Dynamics = Container<DynamicsTerm>;

/// Precession term of the LLG equation.
#[derive(Debug, Clone, PartialEq)]
pub struct Precession {
    pub gamma0: Parameter,
    name: Option<String>,
}

impl Precession {
    /// # Errors
    ///
    /// Returns an error if `gamma0` is negative anywhere.
    pub fn new(gamma0: impl Into<Parameter>) -> Result<Self, ModelError> {
        let gamma0 = gamma0.into();
        gamma0.check(Self::KIND, "gamma0", |v| v >= 0.0, "must be non-negative")?;
        Ok(Self {
            gamma0,
            name: None,
        })
    }

    pub fn attributes(&self) -> Vec<(&'static str, AttrValue)> {
        vec![("gamma0", self.gamma0.attr_value())]
    }

    pub fn latex(&self) -> String {
        r"-\frac{\gamma_{0}}{1 + \alpha^{2}} \mathbf{m} \times \mathbf{H}_\text{eff}".to_string()
    }
}

term_kind!(Precession, DynamicsTerm, Dynamics, "Precession");

/// Gilbert damping term of the LLG equation.
#[derive(Debug, Clone, PartialEq)]
pub struct Damping {
    pub alpha: Parameter,
    name: Option<String>,
}

impl Damping {
    /// # Errors
    ///
    /// Returns an error if `alpha` is negative anywhere.
    pub fn new(alpha: impl Into<Parameter>) -> Result<Self, ModelError> {
        let alpha = alpha.into();
        alpha.check(Self::KIND, "alpha", |v| v >= 0.0, "must be non-negative")?;
        Ok(Self { alpha, name: None })
    }

    pub fn attributes(&self) -> Vec<(&'static str, AttrValue)> {
        vec![("alpha", self.alpha.attr_value())]
    }

    pub fn latex(&self) -> String {
        r"-\frac{\gamma_{0} \alpha}{1 + \alpha^{2}} \mathbf{m} \times (\mathbf{m} \times \mathbf{H}_\text{eff})"
            .to_string()
    }
}

term_kind!(Damping, DynamicsTerm, Dynamics, "Damping");

/// Zhang-Li spin-transfer torque term.
#[derive(Debug, Clone, PartialEq)]
pub struct ZhangLi {
    pub u: Parameter,
    pub beta: f64,
    name: Option<String>,
}

impl ZhangLi {
    pub fn new(u: impl Into<Parameter>, beta: f64) -> Self {
        Self {
            u: u.into(),
            beta,
            name: None,
        }
    }

    pub fn attributes(&self) -> Vec<(&'static str, AttrValue)> {
        vec![
            ("u", self.u.attr_value()),
            ("beta", AttrValue::Scalar(self.beta)),
        ]
    }

    pub fn latex(&self) -> String {
        concat!(
            r"-(\mathbf{u} \cdot \boldsymbol\nabla)\mathbf{m} + ",
            r"\beta\mathbf{m} \times \big[(\mathbf{u} \cdot \boldsymbol\nabla)\mathbf{m}\big]"
        )
        .to_string()
    }
}

term_kind!(ZhangLi, DynamicsTerm, Dynamics, "ZhangLi");

/// Slonczewski spin-transfer torque term.
#[derive(Debug, Clone, PartialEq)]
pub struct Slonczewski {
    pub j: Parameter,
    pub mp: VectorParameter,
    pub p: Parameter,
    pub lambda: Parameter,
    pub eps_prime: Option<f64>,
    name: Option<String>,
}

impl Slonczewski {
    /// # Errors
    ///
    /// Returns an error if the polarisation `p` or `lambda` is not positive.
    pub fn new(
        j: impl Into<Parameter>,
        mp: impl Into<VectorParameter>,
        p: impl Into<Parameter>,
        lambda: impl Into<Parameter>,
    ) -> Result<Self, ModelError> {
        let p = p.into();
        p.check(Self::KIND, "P", |v| v > 0.0, "must be positive")?;
        let lambda = lambda.into();
        lambda.check(Self::KIND, "Lambda", |v| v > 0.0, "must be positive")?;
        Ok(Self {
            j: j.into(),
            mp: mp.into(),
            p,
            lambda,
            eps_prime: None,
            name: None,
        })
    }

    pub fn with_eps_prime(mut self, eps_prime: f64) -> Self {
        self.eps_prime = Some(eps_prime);
        self
    }

    pub fn attributes(&self) -> Vec<(&'static str, AttrValue)> {
        let mut attributes = vec![
            ("J", self.j.attr_value()),
            ("mp", self.mp.attr_value()),
            ("P", self.p.attr_value()),
            ("Lambda", self.lambda.attr_value()),
        ];
        if let Some(eps_prime) = self.eps_prime {
            attributes.push(("eps_prime", AttrValue::Scalar(eps_prime)));
        }
        attributes
    }

    pub fn latex(&self) -> String {
        let mut expression =
            r"\gamma_{0}\beta\epsilon(\mathbf{m} \times \mathbf{m}_\text{p} \times \mathbf{m})"
                .to_string();
        if self.eps_prime.is_some() {
            expression
                .push_str(r"-\gamma_{0}\beta\epsilon' (\mathbf{m} \times \mathbf{m}_\text{p})");
        }
        expression
    }
}

term_kind!(Slonczewski, DynamicsTerm, Dynamics, "Slonczewski");

/// A single dynamics contribution, with the same kind-identity equality and
/// summation behaviour as [`EnergyTerm`](super::energy::EnergyTerm).
#[derive(Debug, Clone)]
pub enum DynamicsTerm {
    Precession(Precession),
    Damping(Damping),
    ZhangLi(ZhangLi),
    Slonczewski(Slonczewski),
}

impl DynamicsTerm {
    /// Time derivative of magnetization `m`; the modeling layer refuses to
    /// compute it.
    pub fn dmdt(&self, _m: &Field, _h_eff: &Field) -> Result<Field, ModelError> {
        Err(ModelError::Unimplemented {
            kind: self.kind(),
            operation: "dmdt",
        })
    }
}

impl Term for DynamicsTerm {
    const FAMILY: &'static str = "Dynamics";

    fn kind(&self) -> &'static str {
        match self {
            DynamicsTerm::Precession(_) => Precession::KIND,
            DynamicsTerm::Damping(_) => Damping::KIND,
            DynamicsTerm::ZhangLi(_) => ZhangLi::KIND,
            DynamicsTerm::Slonczewski(_) => Slonczewski::KIND,
        }
    }

    fn name(&self) -> String {
        match self {
            DynamicsTerm::Precession(t) => t.name(),
            DynamicsTerm::Damping(t) => t.name(),
            DynamicsTerm::ZhangLi(t) => t.name(),
            DynamicsTerm::Slonczewski(t) => t.name(),
        }
    }

    fn attributes(&self) -> Vec<(&'static str, AttrValue)> {
        match self {
            DynamicsTerm::Precession(t) => t.attributes(),
            DynamicsTerm::Damping(t) => t.attributes(),
            DynamicsTerm::ZhangLi(t) => t.attributes(),
            DynamicsTerm::Slonczewski(t) => t.attributes(),
        }
    }

    fn latex(&self) -> String {
        match self {
            DynamicsTerm::Precession(t) => t.latex(),
            DynamicsTerm::Damping(t) => t.latex(),
            DynamicsTerm::ZhangLi(t) => t.latex(),
            DynamicsTerm::Slonczewski(t) => t.latex(),
        }
    }
}

impl PartialEq for DynamicsTerm {
    fn eq(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl Eq for DynamicsTerm {}

impl fmt::Display for DynamicsTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DynamicsTerm::Precession(t) => write!(f, "{t}"),
            DynamicsTerm::Damping(t) => write!(f, "{t}"),
            DynamicsTerm::ZhangLi(t) => write!(f, "{t}"),
            DynamicsTerm::Slonczewski(t) => write!(f, "{t}"),
        }
    }
}

impl Add for DynamicsTerm {
    type Output = Result<Dynamics, ModelError>;

    fn add(self, rhs: Self) -> Self::Output {
        Dynamics::singleton(self).with(rhs)
    }
}

impl Add<Dynamics> for DynamicsTerm {
    type Output = Result<Dynamics, ModelError>;

    fn add(self, rhs: Dynamics) -> Self::Output {
        Dynamics::singleton(self).merged(&rhs)
    }
}

impl Container<DynamicsTerm> {
    /// Total `dm/dt`; the modeling layer refuses to compute it.
    pub fn dmdt(&self, _m: &Field, _h_eff: &Field) -> Result<Field, ModelError> {
        Err(ModelError::Unimplemented {
            kind: "Dynamics",
            operation: "dmdt",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damping_rejects_negative_alpha() {
        let err = Damping::new(-0.1).unwrap_err();
        assert!(matches!(err, ModelError::InvalidValue { kind: "Damping", .. }));
        assert!(err.to_string().contains("alpha"));
    }

    #[test]
    fn precession_rejects_negative_gamma0() {
        assert!(Precession::new(-1.0).is_err());
        assert!(Precession::new(2.211e5).is_ok());
    }

    #[test]
    fn slonczewski_requires_positive_polarisation() {
        assert!(Slonczewski::new(1e12, [0.0, 0.0, 1.0], 0.0, 2.0).is_err());
        assert!(Slonczewski::new(1e12, [0.0, 0.0, 1.0], 0.4, 0.0).is_err());
        assert!(Slonczewski::new(1e12, [0.0, 0.0, 1.0], 0.4, 2.0).is_ok());
    }

    #[test]
    fn dynamics_terms_compare_by_kind() {
        let a: DynamicsTerm = Damping::new(0.1).unwrap().into();
        let b: DynamicsTerm = Damping::new(0.02).unwrap().into();
        let c: DynamicsTerm = Precession::new(2.211e5).unwrap().into();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn adding_dynamics_terms_yields_container() {
        let dynamics = (Precession::new(2.211e5).unwrap() + Damping::new(0.1).unwrap()).unwrap();
        assert_eq!(dynamics.len(), 2);
        assert!(dynamics.contains_name("precession"));
        assert!(dynamics.contains_name("damping"));
    }

    #[test]
    fn damping_repr_shows_alpha() {
        assert_eq!(Damping::new(0.01).unwrap().to_string(), "Damping(alpha=0.01)");
    }

    #[test]
    fn slonczewski_eps_prime_extends_latex() {
        let base = Slonczewski::new(1e12, [0.0, 0.0, 1.0], 0.4, 2.0).unwrap();
        assert!(!base.latex().contains(r"\epsilon'"));
        let extended = base.with_eps_prime(0.02);
        assert!(extended.latex().contains(r"\epsilon'"));
    }

    #[test]
    fn dmdt_is_refused() {
        use crate::core::models::field::{Field, Mesh};
        let mesh = Mesh::new([0.0, 0.0, 0.0], [1e-9, 1e-9, 1e-9], [1, 1, 1]).unwrap();
        let m = Field::uniform(mesh, [0.0, 0.0, 1.0]);
        let term: DynamicsTerm = Damping::new(0.1).unwrap().into();
        assert!(matches!(
            term.dmdt(&m, &m),
            Err(ModelError::Unimplemented { .. })
        ));
    }
}
