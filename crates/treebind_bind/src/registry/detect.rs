use crate::descriptor::TypeDescriptor;
use crate::error::BuildError;

use super::definition::{Definition, RecordDef};

// -----------------------------------------------------------------------------
// Detector

/// A rule that turns a descriptor's facts into a [`Definition`].
///
/// Detectors run in configured order within their pass; the first one to
/// return a definition wins and detection stops. A detector *extracts* the
/// facts it claims from the descriptor, so later detectors never see them
/// twice.
///
/// Returning an error aborts registration: an ambiguity is a broken setup,
/// not something to silently tie-break.
pub trait Detector: Send + Sync {
    /// A short name, used in logs.
    fn name(&self) -> &'static str;

    /// Examines the descriptor; `Ok(None)` passes to the next detector.
    fn detect(&self, descriptor: &mut TypeDescriptor)
    -> Result<Option<Definition>, BuildError>;
}

// -----------------------------------------------------------------------------
// Converter detectors

/// Picks the converter explicitly marked as preferred.
pub struct MarkedConverterDetector;

impl Detector for MarkedConverterDetector {
    fn name(&self) -> &'static str {
        "marked-converter"
    }

    fn detect(
        &self,
        descriptor: &mut TypeDescriptor,
    ) -> Result<Option<Definition>, BuildError> {
        let marked: Vec<usize> = descriptor
            .converters()
            .iter()
            .enumerate()
            .filter(|(_, c)| c.marked())
            .map(|(i, _)| i)
            .collect();
        match marked.as_slice() {
            [] => Ok(None),
            [index] => Ok(Some(Definition::Scalar(
                descriptor.take_converter(*index).into_def(),
            ))),
            many => Err(BuildError::Ambiguous {
                type_path: descriptor.ty().path(),
                what: "marked converters",
                candidates: many
                    .iter()
                    .map(|&i| descriptor.converters()[i].name())
                    .collect(),
            }),
        }
    }
}

/// Picks the converter when exactly one is declared.
pub struct SoleConverterDetector;

impl Detector for SoleConverterDetector {
    fn name(&self) -> &'static str {
        "sole-converter"
    }

    fn detect(
        &self,
        descriptor: &mut TypeDescriptor,
    ) -> Result<Option<Definition>, BuildError> {
        match descriptor.converters().len() {
            0 => Ok(None),
            1 => Ok(Some(Definition::Scalar(
                descriptor.take_converter(0).into_def(),
            ))),
            _ => Err(BuildError::Ambiguous {
                type_path: descriptor.ty().path(),
                what: "converters",
                candidates: descriptor.converters().iter().map(|c| c.name()).collect(),
            }),
        }
    }
}

// -----------------------------------------------------------------------------
// Container detectors

/// Claims types that declared an explicit absent case.
pub struct OptionalDetector;

impl Detector for OptionalDetector {
    fn name(&self) -> &'static str {
        "optional"
    }

    fn detect(
        &self,
        descriptor: &mut TypeDescriptor,
    ) -> Result<Option<Definition>, BuildError> {
        Ok(descriptor.take_optional().map(Definition::Optional))
    }
}

/// Claims transparent wrapper types.
pub struct DelegateDetector;

impl Detector for DelegateDetector {
    fn name(&self) -> &'static str {
        "delegate"
    }

    fn detect(
        &self,
        descriptor: &mut TypeDescriptor,
    ) -> Result<Option<Definition>, BuildError> {
        Ok(descriptor.take_delegate().map(Definition::Delegate))
    }
}

/// Claims ordered containers.
pub struct SequenceDetector;

impl Detector for SequenceDetector {
    fn name(&self) -> &'static str {
        "sequence"
    }

    fn detect(
        &self,
        descriptor: &mut TypeDescriptor,
    ) -> Result<Option<Definition>, BuildError> {
        Ok(descriptor.take_element().map(Definition::Sequence))
    }
}

/// Claims string-keyed maps.
pub struct MapDetector;

impl Detector for MapDetector {
    fn name(&self) -> &'static str {
        "map"
    }

    fn detect(
        &self,
        descriptor: &mut TypeDescriptor,
    ) -> Result<Option<Definition>, BuildError> {
        Ok(descriptor.take_entries().map(Definition::Dictionary))
    }
}

// -----------------------------------------------------------------------------
// Record detectors

fn record(descriptor: &mut TypeDescriptor, index: usize) -> Definition {
    let fields = descriptor.take_fields();
    let factory = descriptor.take_constructor(index).into_factory();
    Definition::Record(RecordDef::new(fields, factory))
}

/// Picks the creation path explicitly marked as preferred.
pub struct MarkedFactoryDetector;

impl Detector for MarkedFactoryDetector {
    fn name(&self) -> &'static str {
        "marked-factory"
    }

    fn detect(
        &self,
        descriptor: &mut TypeDescriptor,
    ) -> Result<Option<Definition>, BuildError> {
        let marked: Vec<usize> = descriptor
            .constructors()
            .iter()
            .enumerate()
            .filter(|(_, c)| c.marked())
            .map(|(i, _)| i)
            .collect();
        match marked.as_slice() {
            [] => Ok(None),
            [index] => Ok(Some(record(descriptor, *index))),
            many => Err(BuildError::Ambiguous {
                type_path: descriptor.ty().path(),
                what: "marked constructors",
                candidates: many
                    .iter()
                    .map(|&i| descriptor.constructors()[i].name())
                    .collect(),
            }),
        }
    }
}

/// Picks a creation path by naming convention.
///
/// A constructor matches when its name starts with `prefix` and, if `arity`
/// is set, takes exactly that many parameters. More than one match under the
/// same rule is ambiguous, and the error names every candidate.
pub struct NamingFactoryDetector {
    prefix: &'static str,
    arity: Option<usize>,
}

impl NamingFactoryDetector {
    pub fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            arity: None,
        }
    }

    pub fn with_arity(prefix: &'static str, arity: usize) -> Self {
        Self {
            prefix,
            arity: Some(arity),
        }
    }
}

impl Detector for NamingFactoryDetector {
    fn name(&self) -> &'static str {
        "naming-factory"
    }

    fn detect(
        &self,
        descriptor: &mut TypeDescriptor,
    ) -> Result<Option<Definition>, BuildError> {
        let matches: Vec<usize> = descriptor
            .constructors()
            .iter()
            .enumerate()
            .filter(|(_, c)| {
                c.name().starts_with(self.prefix)
                    && self.arity.is_none_or(|arity| c.arity() == arity)
            })
            .map(|(i, _)| i)
            .collect();
        match matches.as_slice() {
            [] => Ok(None),
            [index] => Ok(Some(record(descriptor, *index))),
            many => Err(BuildError::Ambiguous {
                type_path: descriptor.ty().path(),
                what: "constructors matching the naming convention",
                candidates: many
                    .iter()
                    .map(|&i| descriptor.constructors()[i].name())
                    .collect(),
            }),
        }
    }
}

/// The fallback: a record with exactly one declared creation path.
pub struct StructuralDetector;

impl Detector for StructuralDetector {
    fn name(&self) -> &'static str {
        "structural"
    }

    fn detect(
        &self,
        descriptor: &mut TypeDescriptor,
    ) -> Result<Option<Definition>, BuildError> {
        match descriptor.constructors().len() {
            0 => Ok(None),
            1 => Ok(Some(record(descriptor, 0))),
            _ => Err(BuildError::Ambiguous {
                type_path: descriptor.ty().path(),
                what: "constructors",
                candidates: descriptor
                    .constructors()
                    .iter()
                    .map(|c| c.name())
                    .collect(),
            }),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{
        Detector, MarkedConverterDetector, NamingFactoryDetector, SoleConverterDetector,
        StructuralDetector,
    };
    use crate::descriptor::TypeDescriptor;
    use crate::error::{BuildError, ScalarFault};
    use crate::registry::definition::Definition;
    use crate::registry::Param;
    use core::convert::Infallible;
    use treebind_value::{Scalar, ScalarKind};

    struct Id(String);

    fn id_descriptor(marked_second: bool) -> TypeDescriptor {
        let builder = TypeDescriptor::describe::<Id>(&[]).converter(
            "as_str",
            ScalarKind::Str,
            |id: &Id| Scalar::Str(id.0.clone()),
            |scalar| match scalar {
                Scalar::Str(s) => Ok(Id(s)),
                other => Err(ScalarFault::new(format!("expected string, got {other}"))),
            },
        );
        if marked_second {
            builder
                .marked_converter(
                    "as_num",
                    ScalarKind::Num,
                    |_: &Id| Scalar::Num(treebind_value::Number::Int(0)),
                    |_| Ok::<_, ScalarFault>(Id(String::new())),
                )
                .finish()
        } else {
            builder.finish()
        }
    }

    #[test]
    fn marked_converter_wins_over_declaration_order() {
        let mut descriptor = id_descriptor(true);
        let def = MarkedConverterDetector
            .detect(&mut descriptor)
            .unwrap()
            .unwrap();
        let Definition::Scalar(scalar) = def else {
            panic!("expected a scalar definition");
        };
        assert_eq!(scalar.kind(), ScalarKind::Num);
    }

    #[test]
    fn sole_converter_is_detected() {
        let mut descriptor = id_descriptor(false);
        assert!(
            SoleConverterDetector
                .detect(&mut descriptor)
                .unwrap()
                .is_some()
        );
    }

    #[test]
    fn two_unmarked_constructors_are_ambiguous_and_both_are_named() {
        struct Twice(i64);
        let mut descriptor = TypeDescriptor::describe::<Twice>(&[])
            .constructor(
                "from_int",
                vec![Param::of::<i64>("value")],
                |(v,): (i64,)| Ok::<_, Infallible>(Twice(v)),
            )
            .constructor(
                "from_parts",
                vec![Param::of::<i64>("value")],
                |(v,): (i64,)| Ok::<_, Infallible>(Twice(v)),
            )
            .finish();

        let err = StructuralDetector.detect(&mut descriptor).unwrap_err();
        let BuildError::Ambiguous { candidates, .. } = err else {
            panic!("expected an ambiguity");
        };
        assert_eq!(candidates, vec!["from_int", "from_parts"]);
    }

    #[test]
    fn naming_detector_filters_by_prefix_and_arity() {
        struct Conf(i64);
        let mut descriptor = TypeDescriptor::describe::<Conf>(&[])
            .constructor("make", vec![], |(): ()| Ok::<_, Infallible>(Conf(0)))
            .constructor(
                "from_value",
                vec![Param::of::<i64>("value")],
                |(v,): (i64,)| Ok::<_, Infallible>(Conf(v)),
            )
            .finish();

        let def = NamingFactoryDetector::with_arity("from_", 1)
            .detect(&mut descriptor)
            .unwrap();
        assert!(matches!(def, Some(Definition::Record(_))));
        // The unmatched constructor is still there for later detectors.
        assert_eq!(descriptor.constructors().len(), 1);
    }
}
