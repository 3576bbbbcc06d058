//! Parameter declarations and property filling.
//!
//! An operation or filter type lists its parameters once, each with a typed
//! setter. Two binding modes use that list:
//!
//! - [`fill_keyed`] binds a key/value mapping (structured column blocks)
//! - [`fill_positional`] binds an ordered argument list (template filters)
//!
//! A type is only ever filled through one of the two.

use serde_json::{Map, Value};

use super::coerce::{coerce, ValueKind};
use crate::error::{ConversionError, FillResult, PropertyFillError};

/// Typed setter storing an already-coerced value into its field.
pub type Assign<O> = fn(&mut O, Value) -> Result<(), ConversionError>;

/// Declaration of one parameter of type `O`.
pub struct Parameter<O> {
    /// Key used in configuration documents.
    pub property: &'static str,
    /// Field of the operation the value lands in.
    pub field: &'static str,
    pub kind: ValueKind,
    pub required: bool,
    /// Slot in positional binding, `None` for keyed-only parameters.
    pub position: Option<usize>,
    pub description: &'static str,
    assign: Assign<O>,
}

impl<O> Parameter<O> {
    pub fn required(property: &'static str, field: &'static str, kind: ValueKind, assign: Assign<O>) -> Self {
        Self {
            property,
            field,
            kind,
            required: true,
            position: None,
            description: "",
            assign,
        }
    }

    pub fn optional(property: &'static str, field: &'static str, kind: ValueKind, assign: Assign<O>) -> Self {
        Self {
            required: false,
            ..Self::required(property, field, kind, assign)
        }
    }

    /// Bind this parameter positionally at `position`.
    pub fn at(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Coerce `value` to the declared kind and store it.
    pub fn assign(&self, target: &mut O, value: Value) -> FillResult<()> {
        let wrap = |source| PropertyFillError::Conversion {
            property: self.property.to_string(),
            source,
        };
        let coerced = coerce(value, self.kind).map_err(wrap)?;
        (self.assign)(target, coerced).map_err(wrap)
    }

    /// Type-erased view for catalogs and listings.
    pub fn info(&self) -> ParameterInfo {
        ParameterInfo {
            property: self.property,
            field: self.field,
            kind: self.kind,
            required: self.required,
            position: self.position,
            description: self.description,
        }
    }
}

/// Type-erased parameter declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterInfo {
    pub property: &'static str,
    pub field: &'static str,
    pub kind: ValueKind,
    pub required: bool,
    pub position: Option<usize>,
    pub description: &'static str,
}

/// Types whose fields are populated from declared parameters.
pub trait Configurable: Sized {
    fn parameters() -> Vec<Parameter<Self>>;
}

/// Erased parameter list of `O`.
pub fn parameter_infos<O: Configurable>() -> Vec<ParameterInfo> {
    O::parameters().iter().map(Parameter::info).collect()
}

/// Bind supplied values by property name.
///
/// Absent (or `null`) optional parameters keep their defaults; an absent
/// required parameter fails with [`PropertyFillError::Missing`]. Keys that
/// match no declared parameter are ignored.
pub fn fill_keyed<O: Configurable>(target: &mut O, supplied: &Map<String, Value>) -> FillResult<()> {
    for param in O::parameters() {
        match supplied.get(param.property).filter(|v| !v.is_null()) {
            Some(value) => param.assign(target, value.clone())?,
            None if param.required => {
                return Err(PropertyFillError::Missing(param.property.to_string()))
            }
            None => {}
        }
    }
    Ok(())
}

/// Bind supplied arguments in declared position order.
///
/// Arguments are consumed one per parameter. When they run out, a required
/// parameter fails and an optional one stops binding. Parameters without a
/// position are not positionally bindable and are skipped.
pub fn fill_positional<O: Configurable>(target: &mut O, args: Vec<Value>) -> FillResult<()> {
    let mut params: Vec<Parameter<O>> = O::parameters()
        .into_iter()
        .filter(|p| p.position.is_some())
        .collect();
    params.sort_by_key(|p| p.position);

    let mut args = args.into_iter();
    for param in params {
        match args.next() {
            Some(value) => param.assign(target, value)?,
            None if param.required => {
                return Err(PropertyFillError::Missing(param.property.to_string()))
            }
            None => break,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::coerce::{into_count, into_string};
    use serde_json::json;

    #[derive(Debug, Default)]
    struct Window {
        column: String,
        start: usize,
        width: Option<usize>,
    }

    impl Configurable for Window {
        fn parameters() -> Vec<Parameter<Self>> {
            vec![
                Parameter::required("column", "column", ValueKind::String, |w: &mut Self, v: Value| {
                    w.column = into_string(v)?;
                    Ok(())
                })
                .at(0),
                Parameter::required("start", "start", ValueKind::Integer, |w: &mut Self, v: Value| {
                    w.start = into_count(v)?;
                    Ok(())
                })
                .at(1),
                Parameter::optional("width", "width", ValueKind::Integer, |w: &mut Self, v: Value| {
                    w.width = Some(into_count(v)?);
                    Ok(())
                })
                .at(2),
            ]
        }
    }

    fn supplied(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_keyed_all_required_present() {
        let mut w = Window::default();
        fill_keyed(&mut w, &supplied(json!({"column": "name", "start": "2"}))).unwrap();

        assert_eq!(w.column, "name");
        assert_eq!(w.start, 2);
        assert_eq!(w.width, None);
    }

    #[test]
    fn test_keyed_missing_required_names_property() {
        let mut w = Window::default();
        let err = fill_keyed(&mut w, &supplied(json!({"column": "name"}))).unwrap_err();
        assert!(matches!(err, PropertyFillError::Missing(ref p) if p == "start"));

        let err = fill_keyed(&mut w, &supplied(json!({"start": 1}))).unwrap_err();
        assert!(matches!(err, PropertyFillError::Missing(ref p) if p == "column"));
    }

    #[test]
    fn test_keyed_null_counts_as_absent() {
        let mut w = Window::default();
        let err = fill_keyed(&mut w, &supplied(json!({"column": null, "start": 1}))).unwrap_err();
        assert!(matches!(err, PropertyFillError::Missing(ref p) if p == "column"));
    }

    #[test]
    fn test_keyed_conversion_failure() {
        let mut w = Window::default();
        let err = fill_keyed(&mut w, &supplied(json!({"column": "c", "start": "abc"}))).unwrap_err();
        assert!(matches!(
            err,
            PropertyFillError::Conversion { ref property, source: ConversionError::NotNumeric(_) } if property == "start"
        ));
    }

    #[test]
    fn test_positional_binding_in_order() {
        let mut w = Window::default();
        fill_positional(&mut w, vec![json!("c"), json!("1"), json!(4)]).unwrap();

        assert_eq!(w.column, "c");
        assert_eq!(w.start, 1);
        assert_eq!(w.width, Some(4));
    }

    #[test]
    fn test_positional_stops_at_optional() {
        let mut w = Window::default();
        fill_positional(&mut w, vec![json!("c"), json!(1)]).unwrap();
        assert_eq!(w.width, None);
    }

    #[test]
    fn test_positional_runs_out_on_required() {
        let mut w = Window::default();
        let err = fill_positional(&mut w, vec![json!("c")]).unwrap_err();
        assert!(matches!(err, PropertyFillError::Missing(ref p) if p == "start"));
    }
}
