use super::container::Container;
use super::{Term, name_or_default};
use crate::core::attrs::{AttrValue, Parameter, VectorParameter, format_term};
use crate::core::error::ModelError;
use crate::core::models::field::Field;
use std::fmt;
use std::ops::Add;

/// Energy terms container.
pub type Energy = Container<EnergyTerm>;

/// Crystallographic classes with a defined Dzyaloshinskii-Moriya energy
/// expression.
static CRYSTAL_CLASSES: phf::Set<&'static str> = phf::phf_set! {
    "Cnv", "Cnv_x", "Cnv_y", "Cnv_z",
    "T", "O",
    "D2d", "D2d_x", "D2d_y", "D2d_z",
};

macro_rules! term_kind {
    ($ty:ident, $family:ident, $container:ident, $kind:literal) => {
        impl $ty {
            pub const KIND: &'static str = $kind;

            /// Overrides the lookup name, letting two terms of the same kind
            /// coexist in one container.
            pub fn with_name(mut self, name: impl Into<String>) -> Self {
                self.name = Some(name.into());
                self
            }

            pub fn name(&self) -> String {
                name_or_default(self.name.as_deref(), Self::KIND)
            }
        }

        impl From<$ty> for $family {
            fn from(term: $ty) -> Self {
                $family::$ty(term)
            }
        }

        impl From<$ty> for $container {
            fn from(term: $ty) -> Self {
                $container::singleton(term.into())
            }
        }

        impl<R: Into<$family>> std::ops::Add<R> for $ty {
            type Output = Result<$container, ModelError>;

            fn add(self, rhs: R) -> Self::Output {
                $container::singleton(self.into()).with(rhs.into())
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                format_term(f, Self::KIND, &self.attributes())
            }
        }
    };
}
pub(crate) use term_kind;

/// Exchange energy term, `w = -A m . laplace(m)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    pub a: Parameter,
    name: Option<String>,
}

impl Exchange {
    pub fn new(a: impl Into<Parameter>) -> Self {
        Self {
            a: a.into(),
            name: None,
        }
    }

    pub fn attributes(&self) -> Vec<(&'static str, AttrValue)> {
        vec![("A", self.a.attr_value())]
    }

    pub fn latex(&self) -> String {
        r"- A \mathbf{m} \cdot \nabla^{2} \mathbf{m}".to_string()
    }
}

term_kind!(Exchange, EnergyTerm, Energy, "Exchange");

/// Pre-factor of a time-dependent external field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeProfile {
    Sine,
    Sinc,
}

impl TimeProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeProfile::Sine => "sin",
            TimeProfile::Sinc => "sinc",
        }
    }
}

/// Zeeman energy term, `w = -mu0 Ms m . H`, optionally modulated in time by
/// a sine wave or sinc pulse.
#[derive(Debug, Clone, PartialEq)]
pub struct Zeeman {
    pub h: VectorParameter,
    pub wave: Option<TimeProfile>,
    pub f: Option<f64>,
    pub t0: Option<f64>,
    name: Option<String>,
}

impl Zeeman {
    pub fn new(h: impl Into<VectorParameter>) -> Self {
        Self {
            h: h.into(),
            wave: None,
            f: None,
            t0: None,
            name: None,
        }
    }

    /// Modulates the field with `wave` at (cut-off) frequency `f`, shifted
    /// by `t0`.
    ///
    /// # Errors
    ///
    /// Returns an error if `f` is not positive.
    pub fn with_wave(mut self, wave: TimeProfile, f: f64, t0: f64) -> Result<Self, ModelError> {
        if f <= 0.0 {
            return Err(ModelError::InvalidValue {
                kind: Self::KIND,
                attribute: "f",
                reason: format!("must be positive, got {f:?}"),
            });
        }
        self.wave = Some(wave);
        self.f = Some(f);
        self.t0 = Some(t0);
        Ok(self)
    }

    pub fn attributes(&self) -> Vec<(&'static str, AttrValue)> {
        let mut attributes = vec![("H", self.h.attr_value())];
        if let Some(wave) = self.wave {
            attributes.push(("wave", AttrValue::Text(wave.as_str().to_string())));
        }
        if let Some(f) = self.f {
            attributes.push(("f", AttrValue::Scalar(f)));
        }
        if let Some(t0) = self.t0 {
            attributes.push(("t0", AttrValue::Scalar(t0)));
        }
        attributes
    }

    pub fn latex(&self) -> String {
        match self.wave {
            None => r"-\mu_{0}M_\text{s} \mathbf{m} \cdot \mathbf{H}".to_string(),
            Some(TimeProfile::Sine) => {
                r"-\mu_{0}M_\text{s} \mathbf{m} \cdot \mathbf{H} \sin[2 \pi f (t-t_{0})]"
                    .to_string()
            }
            Some(TimeProfile::Sinc) => {
                r"-\mu_{0}M_\text{s} \mathbf{m} \cdot \mathbf{H}\, \text{sinc}[2 \pi f (t-t_{0})]"
                    .to_string()
            }
        }
    }
}

term_kind!(Zeeman, EnergyTerm, Energy, "Zeeman");

/// Demagnetisation energy term.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Demag {
    pub asymptotic_radius: Option<f64>,
    name: Option<String>,
}

impl Demag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_asymptotic_radius(mut self, radius: f64) -> Self {
        self.asymptotic_radius = Some(radius);
        self
    }

    pub fn attributes(&self) -> Vec<(&'static str, AttrValue)> {
        self.asymptotic_radius
            .map(|radius| ("asymptotic_radius", AttrValue::Scalar(radius)))
            .into_iter()
            .collect()
    }

    pub fn latex(&self) -> String {
        r"-\frac{1}{2}\mu_{0}M_\text{s}\mathbf{m} \cdot \mathbf{H}_\text{d}".to_string()
    }
}

term_kind!(Demag, EnergyTerm, Energy, "Demag");

/// Dzyaloshinskii-Moriya energy term for a given crystallographic class.
#[derive(Debug, Clone, PartialEq)]
pub struct Dmi {
    pub d: Parameter,
    pub crystal_class: String,
    name: Option<String>,
}

impl Dmi {
    /// # Errors
    ///
    /// Returns an error if `crystal_class` is not one of the supported
    /// crystallographic classes.
    pub fn new(d: impl Into<Parameter>, crystal_class: &str) -> Result<Self, ModelError> {
        if !CRYSTAL_CLASSES.contains(crystal_class) {
            return Err(ModelError::InvalidValue {
                kind: Self::KIND,
                attribute: "crystalclass",
                reason: format!("unknown crystallographic class '{crystal_class}'"),
            });
        }
        Ok(Self {
            d: d.into(),
            crystal_class: crystal_class.to_string(),
            name: None,
        })
    }

    pub fn attributes(&self) -> Vec<(&'static str, AttrValue)> {
        vec![
            ("D", self.d.attr_value()),
            ("crystalclass", AttrValue::Text(self.crystal_class.clone())),
        ]
    }

    pub fn latex(&self) -> String {
        let class = self.crystal_class.as_str();
        if class == "T" || class == "O" {
            r"D \mathbf{m} \cdot (\nabla \times \mathbf{m})".to_string()
        } else if class.starts_with("Cnv") {
            let direction = if class == "Cnv" {
                "z"
            } else {
                &class[class.len() - 1..]
            };
            format!(
                r"D ( \mathbf{{m}} \cdot \nabla m_{{{direction}}} - m_{{{direction}}} \nabla \cdot \mathbf{{m}} )"
            )
        } else {
            let (dir1, dir2) = match class {
                "D2d_x" => ("y", "z"),
                "D2d_y" => ("z", "x"),
                _ => ("x", "y"),
            };
            format!(
                r"D\mathbf{{m}} \cdot \left( \frac{{\partial \mathbf{{m}}}}{{\partial {dir1}}} \times \hat{{{dir1}}} - \frac{{\partial \mathbf{{m}}}}{{\partial {dir2}}} \times \hat{{{dir2}}} \right)"
            )
        }
    }
}

term_kind!(Dmi, EnergyTerm, Energy, "DMI");

/// Uniaxial anisotropy energy term, first order (`K`) or with a fourth-order
/// correction (`K1`, `K2`).
#[derive(Debug, Clone, PartialEq)]
pub struct UniaxialAnisotropy {
    pub k: Option<Parameter>,
    pub k1: Option<Parameter>,
    pub k2: Option<Parameter>,
    pub u: VectorParameter,
    name: Option<String>,
}

impl UniaxialAnisotropy {
    pub fn new(k: impl Into<Parameter>, u: impl Into<VectorParameter>) -> Self {
        Self {
            k: Some(k.into()),
            k1: None,
            k2: None,
            u: u.into(),
            name: None,
        }
    }

    pub fn higher_order(
        k1: impl Into<Parameter>,
        k2: impl Into<Parameter>,
        u: impl Into<VectorParameter>,
    ) -> Self {
        Self {
            k: None,
            k1: Some(k1.into()),
            k2: Some(k2.into()),
            u: u.into(),
            name: None,
        }
    }

    pub fn attributes(&self) -> Vec<(&'static str, AttrValue)> {
        let mut attributes = Vec::new();
        if let Some(k) = &self.k {
            attributes.push(("K", k.attr_value()));
        }
        if let Some(k1) = &self.k1 {
            attributes.push(("K1", k1.attr_value()));
        }
        if let Some(k2) = &self.k2 {
            attributes.push(("K2", k2.attr_value()));
        }
        attributes.push(("u", self.u.attr_value()));
        attributes
    }

    pub fn latex(&self) -> String {
        if self.k2.is_some() {
            r"-K_{1} (\mathbf{m} \cdot \mathbf{u})^{2} - K_{2} (\mathbf{m} \cdot \mathbf{u})^{4}"
                .to_string()
        } else {
            r"-K (\mathbf{m} \cdot \mathbf{u})^{2}".to_string()
        }
    }
}

term_kind!(UniaxialAnisotropy, EnergyTerm, Energy, "UniaxialAnisotropy");

/// Cubic anisotropy energy term.
#[derive(Debug, Clone, PartialEq)]
pub struct CubicAnisotropy {
    pub k: Parameter,
    pub u1: VectorParameter,
    pub u2: VectorParameter,
    name: Option<String>,
}

impl CubicAnisotropy {
    pub fn new(
        k: impl Into<Parameter>,
        u1: impl Into<VectorParameter>,
        u2: impl Into<VectorParameter>,
    ) -> Self {
        Self {
            k: k.into(),
            u1: u1.into(),
            u2: u2.into(),
            name: None,
        }
    }

    pub fn attributes(&self) -> Vec<(&'static str, AttrValue)> {
        vec![
            ("K", self.k.attr_value()),
            ("u1", self.u1.attr_value()),
            ("u2", self.u2.attr_value()),
        ]
    }

    pub fn latex(&self) -> String {
        let a1 = r"(\mathbf{m} \cdot \mathbf{u}_{1})^{2}";
        let a2 = r"(\mathbf{m} \cdot \mathbf{u}_{2})^{2}";
        let a3 = r"(\mathbf{m} \cdot \mathbf{u}_{3})^{2}";
        format!("-K [{a1}{a2}+{a2}{a3}+{a3}{a1}]")
    }
}

term_kind!(CubicAnisotropy, EnergyTerm, Energy, "CubicAnisotropy");

/// A single energy contribution.
///
/// Two energy terms are equal exactly when they are the same concrete kind;
/// parameter values and names do not participate. Summing terms yields an
/// [`Energy`] container.
#[derive(Debug, Clone)]
pub enum EnergyTerm {
    Exchange(Exchange),
    Zeeman(Zeeman),
    Demag(Demag),
    Dmi(Dmi),
    UniaxialAnisotropy(UniaxialAnisotropy),
    CubicAnisotropy(CubicAnisotropy),
}

impl EnergyTerm {
    /// Energy of magnetization `m`; the modeling layer refuses to compute it.
    pub fn energy(&self, _m: &Field) -> Result<f64, ModelError> {
        Err(ModelError::Unimplemented {
            kind: self.kind(),
            operation: "energy",
        })
    }

    /// Energy density of magnetization `m`; refused like [`energy`](Self::energy).
    pub fn density(&self, _m: &Field) -> Result<Field, ModelError> {
        Err(ModelError::Unimplemented {
            kind: self.kind(),
            operation: "density",
        })
    }

    /// Effective field of magnetization `m`; refused like [`energy`](Self::energy).
    pub fn effective_field(&self, _m: &Field) -> Result<Field, ModelError> {
        Err(ModelError::Unimplemented {
            kind: self.kind(),
            operation: "effective_field",
        })
    }
}

impl Term for EnergyTerm {
    const FAMILY: &'static str = "Energy";

    fn kind(&self) -> &'static str {
        match self {
            EnergyTerm::Exchange(_) => Exchange::KIND,
            EnergyTerm::Zeeman(_) => Zeeman::KIND,
            EnergyTerm::Demag(_) => Demag::KIND,
            EnergyTerm::Dmi(_) => Dmi::KIND,
            EnergyTerm::UniaxialAnisotropy(_) => UniaxialAnisotropy::KIND,
            EnergyTerm::CubicAnisotropy(_) => CubicAnisotropy::KIND,
        }
    }

    fn name(&self) -> String {
        match self {
            EnergyTerm::Exchange(t) => t.name(),
            EnergyTerm::Zeeman(t) => t.name(),
            EnergyTerm::Demag(t) => t.name(),
            EnergyTerm::Dmi(t) => t.name(),
            EnergyTerm::UniaxialAnisotropy(t) => t.name(),
            EnergyTerm::CubicAnisotropy(t) => t.name(),
        }
    }

    fn attributes(&self) -> Vec<(&'static str, AttrValue)> {
        match self {
            EnergyTerm::Exchange(t) => t.attributes(),
            EnergyTerm::Zeeman(t) => t.attributes(),
            EnergyTerm::Demag(t) => t.attributes(),
            EnergyTerm::Dmi(t) => t.attributes(),
            EnergyTerm::UniaxialAnisotropy(t) => t.attributes(),
            EnergyTerm::CubicAnisotropy(t) => t.attributes(),
        }
    }

    fn latex(&self) -> String {
        match self {
            EnergyTerm::Exchange(t) => t.latex(),
            EnergyTerm::Zeeman(t) => t.latex(),
            EnergyTerm::Demag(t) => t.latex(),
            EnergyTerm::Dmi(t) => t.latex(),
            EnergyTerm::UniaxialAnisotropy(t) => t.latex(),
            EnergyTerm::CubicAnisotropy(t) => t.latex(),
        }
    }
}

impl PartialEq for EnergyTerm {
    fn eq(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl Eq for EnergyTerm {}

impl fmt::Display for EnergyTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnergyTerm::Exchange(t) => write!(f, "{t}"),
            EnergyTerm::Zeeman(t) => write!(f, "{t}"),
            EnergyTerm::Demag(t) => write!(f, "{t}"),
            EnergyTerm::Dmi(t) => write!(f, "{t}"),
            EnergyTerm::UniaxialAnisotropy(t) => write!(f, "{t}"),
            EnergyTerm::CubicAnisotropy(t) => write!(f, "{t}"),
        }
    }
}

impl Add for EnergyTerm {
    type Output = Result<Energy, ModelError>;

    fn add(self, rhs: Self) -> Self::Output {
        Energy::singleton(self).with(rhs)
    }
}

impl Add<Energy> for EnergyTerm {
    type Output = Result<Energy, ModelError>;

    fn add(self, rhs: Energy) -> Self::Output {
        Energy::singleton(self).merged(&rhs)
    }
}

impl Container<EnergyTerm> {
    /// Total energy of magnetization `m`; the modeling layer refuses to
    /// compute it.
    pub fn energy(&self, _m: &Field) -> Result<f64, ModelError> {
        Err(ModelError::Unimplemented {
            kind: "Energy",
            operation: "energy",
        })
    }

    /// Total effective field of magnetization `m`; refused like
    /// [`energy`](Self::energy).
    pub fn effective_field(&self, _m: &Field) -> Result<Field, ModelError> {
        Err(ModelError::Unimplemented {
            kind: "Energy",
            operation: "effective_field",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terms_of_same_kind_are_equal_regardless_of_parameters() {
        let a: EnergyTerm = Exchange::new(1e-12).into();
        let b: EnergyTerm = Exchange::new(5e-11).into();
        assert_eq!(a, b);
    }

    #[test]
    fn terms_of_same_kind_are_equal_regardless_of_name() {
        let a: EnergyTerm = Exchange::new(1e-12).into();
        let b: EnergyTerm = Exchange::new(1e-12).with_name("my_exchange").into();
        assert_eq!(a, b);
    }

    #[test]
    fn terms_of_different_kinds_are_not_equal() {
        let exchange: EnergyTerm = Exchange::new(1e-12).into();
        let demag: EnergyTerm = Demag::new().into();
        assert_ne!(exchange, demag);
    }

    #[test]
    fn name_defaults_to_lowercase_kind() {
        assert_eq!(Exchange::new(1e-12).name(), "exchange");
        assert_eq!(
            UniaxialAnisotropy::new(5e6, [0.0, 0.0, 1.0]).name(),
            "uniaxialanisotropy"
        );
    }

    #[test]
    fn name_override_wins() {
        assert_eq!(Exchange::new(1e-12).with_name("my_exchange").name(), "my_exchange");
    }

    #[test]
    fn exchange_repr_lists_set_attributes() {
        assert_eq!(Exchange::new(1e-12).to_string(), "Exchange(A=1e-12)");
    }

    #[test]
    fn zeeman_repr_renders_vector_parameter() {
        let zeeman = Zeeman::new([0.0, 0.0, 1e6]);
        assert_eq!(zeeman.to_string(), "Zeeman(H=(0.0, 0.0, 1000000.0))");
    }

    #[test]
    fn unset_optional_attributes_are_skipped() {
        assert_eq!(Demag::new().to_string(), "Demag()");
        assert_eq!(
            Demag::new().with_asymptotic_radius(32.0).to_string(),
            "Demag(asymptotic_radius=32.0)"
        );
    }

    #[test]
    fn zeeman_wave_attributes_appear_once_set() {
        let zeeman = Zeeman::new([0.0, 0.0, 1e5])
            .with_wave(TimeProfile::Sine, 1e9, 0.0)
            .unwrap();
        let attrs: Vec<&str> = zeeman.attributes().iter().map(|(attr, _)| *attr).collect();
        assert_eq!(attrs, ["H", "wave", "f", "t0"]);
    }

    #[test]
    fn zeeman_rejects_non_positive_frequency() {
        let err = Zeeman::new([0.0, 0.0, 1e5])
            .with_wave(TimeProfile::Sinc, 0.0, 0.0)
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidValue { kind: "Zeeman", .. }));
    }

    #[test]
    fn dmi_rejects_unknown_crystal_class() {
        let err = Dmi::new(1e-3, "Cv").unwrap_err();
        assert!(err.to_string().contains("Cv"));
    }

    #[test]
    fn dmi_latex_depends_on_crystal_class() {
        let t_class = Dmi::new(1e-3, "T").unwrap();
        assert_eq!(t_class.latex(), r"D \mathbf{m} \cdot (\nabla \times \mathbf{m})");
        let cnv_x = Dmi::new(1e-3, "Cnv_x").unwrap();
        assert!(cnv_x.latex().contains("m_{x}"));
        let d2d = Dmi::new(1e-3, "D2d_y").unwrap();
        assert!(d2d.latex().contains(r"\partial z"));
    }

    #[test]
    fn uniaxial_latex_switches_with_higher_order() {
        let first = UniaxialAnisotropy::new(5e6, [0.0, 0.0, 1.0]);
        assert_eq!(first.latex(), r"-K (\mathbf{m} \cdot \mathbf{u})^{2}");
        let higher = UniaxialAnisotropy::higher_order(5e6, 1e3, [0.0, 0.0, 1.0]);
        assert!(higher.latex().contains("K_{2}"));
    }

    #[test]
    fn adding_two_terms_yields_a_container() {
        let energy = (Exchange::new(1e-12) + Demag::new()).unwrap();
        assert_eq!(energy.len(), 2);
        assert!(energy.contains_name("exchange"));
        assert!(energy.contains_name("demag"));
        let repr = energy.to_string();
        assert!(repr.contains("Exchange"));
        assert!(repr.contains("Demag"));
    }

    #[test]
    fn adding_same_kind_with_default_names_fails() {
        let err = (Exchange::new(1e-12) + Exchange::new(2e-12)).unwrap_err();
        assert!(matches!(
            err,
            ModelError::DuplicateTerm {
                kind: "Exchange",
                ..
            }
        ));
    }

    #[test]
    fn same_kind_with_distinct_names_coexists() {
        let energy = (Exchange::new(1e-12) + Exchange::new(2e-12).with_name("other")).unwrap();
        assert_eq!(energy.len(), 2);
    }

    #[test]
    fn physics_is_refused_by_terms_and_containers() {
        use crate::core::models::field::{Field, Mesh};
        let mesh = Mesh::new([0.0, 0.0, 0.0], [1e-9, 1e-9, 1e-9], [1, 1, 1]).unwrap();
        let m = Field::uniform(mesh, [0.0, 0.0, 1.0]);
        let term: EnergyTerm = Exchange::new(1e-12).into();
        assert!(matches!(
            term.effective_field(&m),
            Err(ModelError::Unimplemented { .. })
        ));
        let energy: Energy = Demag::new().into();
        assert!(matches!(energy.energy(&m), Err(ModelError::Unimplemented { .. })));
    }
}
