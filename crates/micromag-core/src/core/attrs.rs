use super::error::ModelError;
use super::models::field::Field;
use nalgebra::Vector3;
use std::collections::BTreeMap;
use std::fmt;

/// A set attribute value, as exposed by term iteration and textual
/// representations.
///
/// Terms are plain structs whose fields are their allowed attributes; this
/// union only exists so heterogeneous attributes can be listed and rendered
/// uniformly. Scalars and vectors use the shortest round-trippable notation,
/// strings are single-quoted, per-region maps render as `{region: value}`.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Scalar(f64),
    Vector(Vector3<f64>),
    Text(String),
    RegionMap(BTreeMap<String, AttrValue>),
    Field(Field),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Scalar(v) => write!(f, "{v:?}"),
            AttrValue::Vector(v) => write!(f, "({:?}, {:?}, {:?})", v.x, v.y, v.z),
            AttrValue::Text(s) => write!(f, "'{s}'"),
            AttrValue::RegionMap(map) => {
                write!(f, "{{")?;
                for (i, (region, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{region}: {value}")?;
                }
                write!(f, "}}")
            }
            AttrValue::Field(field) => write!(f, "{field}"),
        }
    }
}

/// A scalar physical parameter: spatially uniform, defined per region, or
/// fully spatially varying.
#[derive(Debug, Clone, PartialEq)]
pub enum Parameter {
    Uniform(f64),
    Regions(BTreeMap<String, f64>),
    Field(Field),
}

impl Parameter {
    /// Checks every spatially-resolvable value against `valid`. Values inside
    /// a `Field` are the external calculator's concern and are not inspected.
    pub(crate) fn check(
        &self,
        kind: &'static str,
        attribute: &'static str,
        valid: impl Fn(f64) -> bool,
        requirement: &str,
    ) -> Result<(), ModelError> {
        let offending = match self {
            Parameter::Uniform(v) => (!valid(*v)).then_some(*v),
            Parameter::Regions(map) => map.values().copied().find(|v| !valid(*v)),
            Parameter::Field(_) => None,
        };
        match offending {
            Some(v) => Err(ModelError::InvalidValue {
                kind,
                attribute,
                reason: format!("{requirement}, got {v:?}"),
            }),
            None => Ok(()),
        }
    }

    pub(crate) fn attr_value(&self) -> AttrValue {
        match self {
            Parameter::Uniform(v) => AttrValue::Scalar(*v),
            Parameter::Regions(map) => AttrValue::RegionMap(
                map.iter()
                    .map(|(region, v)| (region.clone(), AttrValue::Scalar(*v)))
                    .collect(),
            ),
            Parameter::Field(field) => AttrValue::Field(field.clone()),
        }
    }
}

impl From<f64> for Parameter {
    fn from(value: f64) -> Self {
        Parameter::Uniform(value)
    }
}

impl From<BTreeMap<String, f64>> for Parameter {
    fn from(map: BTreeMap<String, f64>) -> Self {
        Parameter::Regions(map)
    }
}

impl From<Field> for Parameter {
    fn from(field: Field) -> Self {
        Parameter::Field(field)
    }
}

/// A 3-vector physical parameter, with the same three spatial flavours as
/// [`Parameter`]. Vector shape is carried by the type; a malformed vector
/// cannot be constructed.
#[derive(Debug, Clone, PartialEq)]
pub enum VectorParameter {
    Uniform(Vector3<f64>),
    Regions(BTreeMap<String, Vector3<f64>>),
    Field(Field),
}

impl VectorParameter {
    pub(crate) fn attr_value(&self) -> AttrValue {
        match self {
            VectorParameter::Uniform(v) => AttrValue::Vector(*v),
            VectorParameter::Regions(map) => AttrValue::RegionMap(
                map.iter()
                    .map(|(region, v)| (region.clone(), AttrValue::Vector(*v)))
                    .collect(),
            ),
            VectorParameter::Field(field) => AttrValue::Field(field.clone()),
        }
    }
}

impl From<[f64; 3]> for VectorParameter {
    fn from(value: [f64; 3]) -> Self {
        VectorParameter::Uniform(Vector3::from(value))
    }
}

impl From<Vector3<f64>> for VectorParameter {
    fn from(value: Vector3<f64>) -> Self {
        VectorParameter::Uniform(value)
    }
}

impl From<BTreeMap<String, [f64; 3]>> for VectorParameter {
    fn from(map: BTreeMap<String, [f64; 3]>) -> Self {
        VectorParameter::Regions(
            map.into_iter()
                .map(|(region, v)| (region, Vector3::from(v)))
                .collect(),
        )
    }
}

impl From<Field> for VectorParameter {
    fn from(field: Field) -> Self {
        VectorParameter::Field(field)
    }
}

/// Renders a term as `Kind(attr=value, ...)`, listing only the attributes
/// that are actually set, in declared order.
pub(crate) fn format_term(
    f: &mut fmt::Formatter<'_>,
    kind: &str,
    attributes: &[(&'static str, AttrValue)],
) -> fmt::Result {
    write!(f, "{kind}(")?;
    for (i, (attr, value)) in attributes.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{attr}={value}")?;
    }
    write!(f, ")")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_attr_value_uses_shortest_notation() {
        assert_eq!(AttrValue::Scalar(1e-12).to_string(), "1e-12");
        assert_eq!(AttrValue::Scalar(0.01).to_string(), "0.01");
        assert_eq!(AttrValue::Scalar(1e6).to_string(), "1000000.0");
    }

    #[test]
    fn vector_attr_value_renders_as_tuple() {
        let value = AttrValue::Vector(Vector3::new(0.0, 0.0, 1e6));
        assert_eq!(value.to_string(), "(0.0, 0.0, 1000000.0)");
    }

    #[test]
    fn text_attr_value_is_quoted() {
        assert_eq!(AttrValue::Text("sin".into()).to_string(), "'sin'");
    }

    #[test]
    fn region_map_renders_sorted_entries() {
        let mut regions = BTreeMap::new();
        regions.insert("r1".to_string(), 1e-12);
        regions.insert("r2".to_string(), 5e-12);
        let value = Parameter::from(regions).attr_value();
        assert_eq!(value.to_string(), "{r1: 1e-12, r2: 5e-12}");
    }

    #[test]
    fn uniform_parameter_check_rejects_offending_value() {
        let alpha = Parameter::from(-0.1);
        let err = alpha
            .check("Damping", "alpha", |v| v >= 0.0, "must be non-negative")
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidValue { kind: "Damping", .. }));
        assert!(err.to_string().contains("alpha"));
    }

    #[test]
    fn region_parameter_check_inspects_every_region() {
        let mut regions = BTreeMap::new();
        regions.insert("r1".to_string(), 0.1);
        regions.insert("r2".to_string(), -0.2);
        let alpha = Parameter::from(regions);
        assert!(
            alpha
                .check("Damping", "alpha", |v| v >= 0.0, "must be non-negative")
                .is_err()
        );
    }
}
