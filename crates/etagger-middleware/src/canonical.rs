//! Canonical JSON serialization
//!
//! Deep-equal values serialize to identical bytes: object keys are written
//! in byte-wise lexicographic order whatever the insertion order of the
//! underlying map, arrays keep their order, and integral numbers are written
//! without a fractional part (`1.0` and `1` are the same number).

use etagger_http::{Error, Result, StringifySettings};
use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Number, Value};

/// Largest integer an IEEE-754 double represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Serialize `value` to its canonical text.
///
/// The allowlist projection of `settings` is applied first, then the value
/// is written with sorted keys, compact unless `settings.indent` is set.
///
/// # Errors
///
/// Returns [`Error::Serialization`] when an allowlist is configured and
/// `value` is not an object.
///
/// # Examples
///
/// ```
/// use etagger_http::{Indent, StringifySettings};
/// use etagger_middleware::canonicalize;
/// use serde_json::json;
///
/// let value = json!({"b": 2, "a": [1.0, {"d": null, "c": "x"}]});
///
/// assert_eq!(
///     canonicalize(&value, &StringifySettings::default()).unwrap(),
///     r#"{"a":[1,{"c":"x","d":null}],"b":2}"#,
/// );
///
/// let settings = StringifySettings::new().with_indent(Indent::Spaces(2));
/// assert_eq!(
///     canonicalize(&json!({"b": 2, "a": 1}), &settings).unwrap(),
///     "{\n  \"a\": 1,\n  \"b\": 2\n}",
/// );
/// ```
pub fn canonicalize(value: &Value, settings: &StringifySettings) -> Result<String> {
	let projected;
	let value = match &settings.allowlist {
		Some(keys) => {
			projected = project(value, keys)?;
			&projected
		}
		None => value,
	};

	let indent = settings
		.indent
		.as_ref()
		.map(|indent| indent.as_bytes())
		.unwrap_or_default();

	let bytes = if indent.is_empty() {
		serde_json::to_vec(&Canonical(value))?
	} else {
		let mut serializer =
			serde_json::Serializer::with_formatter(Vec::new(), PrettyFormatter::with_indent(&indent));
		Canonical(value).serialize(&mut serializer)?;
		serializer.into_inner()
	};

	String::from_utf8(bytes).map_err(|e| Error::Serialization(e.to_string()))
}

/// Keep only the listed top-level keys of an object.
///
/// Keys missing from `value` are skipped.
///
/// # Errors
///
/// Returns [`Error::Serialization`] when `value` is not an object.
///
/// # Examples
///
/// ```
/// use etagger_middleware::project;
/// use serde_json::json;
///
/// let value = json!({"id": 7, "name": "a", "secret": "s"});
/// let keys = vec!["name".to_string(), "id".to_string(), "missing".to_string()];
///
/// assert_eq!(project(&value, &keys).unwrap(), json!({"id": 7, "name": "a"}));
/// assert!(project(&json!([1, 2]), &keys).is_err());
/// ```
pub fn project(value: &Value, keys: &[String]) -> Result<Value> {
	let object = value.as_object().ok_or_else(|| {
		Error::Serialization(format!(
			"key allowlist requires a JSON object, got {}",
			type_name(value)
		))
	})?;

	let mut projected = Map::new();
	for key in keys {
		if let Some(field) = object.get(key) {
			projected.insert(key.clone(), field.clone());
		}
	}
	Ok(Value::Object(projected))
}

fn type_name(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "a boolean",
		Value::Number(_) => "a number",
		Value::String(_) => "a string",
		Value::Array(_) => "an array",
		Value::Object(_) => "an object",
	}
}

/// Serialize adapter writing a [`Value`] in canonical form.
struct Canonical<'a>(&'a Value);

impl Serialize for Canonical<'_> {
	fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		match self.0 {
			Value::Null => serializer.serialize_unit(),
			Value::Bool(b) => serializer.serialize_bool(*b),
			Value::Number(n) => serialize_number(n, serializer),
			Value::String(s) => serializer.serialize_str(s),
			Value::Array(items) => {
				let mut seq = serializer.serialize_seq(Some(items.len()))?;
				for item in items {
					seq.serialize_element(&Canonical(item))?;
				}
				seq.end()
			}
			Value::Object(object) => {
				let mut entries: Vec<(&String, &Value)> = object.iter().collect();
				entries.sort_unstable_by(|(a, _), (b, _)| a.as_bytes().cmp(b.as_bytes()));

				let mut map = serializer.serialize_map(Some(entries.len()))?;
				for (key, field) in entries {
					map.serialize_entry(key, &Canonical(field))?;
				}
				map.end()
			}
		}
	}
}

fn serialize_number<S: Serializer>(n: &Number, serializer: S) -> std::result::Result<S::Ok, S::Error> {
	if let Some(i) = n.as_i64() {
		return serializer.serialize_i64(i);
	}
	if let Some(u) = n.as_u64() {
		return serializer.serialize_u64(u);
	}
	match n.as_f64() {
		Some(f) if f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER => {
			serializer.serialize_i64(f as i64)
		}
		Some(f) => serializer.serialize_f64(f),
		None => n.serialize(serializer),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use etagger_http::Indent;
	use rstest::rstest;
	use serde_json::json;

	fn compact(value: &Value) -> String {
		canonicalize(value, &StringifySettings::default()).unwrap()
	}

	#[rstest]
	#[case(json!(null), "null")]
	#[case(json!(true), "true")]
	#[case(json!({}), "{}")]
	#[case(json!([]), "[]")]
	#[case(json!(""), r#""""#)]
	#[case(json!("tab\tquote\"slash\\"), r#""tab\tquote\"slash\\""#)]
	#[case(json!(1.0), "1")]
	#[case(json!(-0.0), "0")]
	#[case(json!(1.5), "1.5")]
	#[case(json!(-42), "-42")]
	#[case(json!(u64::MAX), "18446744073709551615")]
	#[case(json!([3, 1, 2]), "[3,1,2]")]
	fn test_scalars_and_sequences(#[case] value: Value, #[case] expected: &str) {
		assert_eq!(compact(&value), expected);
	}

	#[rstest]
	fn test_keys_sorted_at_every_level() {
		let value = json!({
			"z": {"b": 1, "a": 2},
			"a": [{"y": 1, "x": 2}],
		});

		assert_eq!(compact(&value), r#"{"a":[{"x":2,"y":1}],"z":{"a":2,"b":1}}"#);
	}

	#[rstest]
	fn test_insertion_order_is_irrelevant() {
		let mut first = Map::new();
		first.insert("a".to_string(), json!(1));
		first.insert("b".to_string(), json!(2));
		let mut second = Map::new();
		second.insert("b".to_string(), json!(2));
		second.insert("a".to_string(), json!(1));
		let (first, second) = (Value::Object(first), Value::Object(second));

		assert_ne!(first.to_string(), second.to_string());
		assert_eq!(compact(&first), r#"{"a":1,"b":2}"#);
		assert_eq!(compact(&second), r#"{"a":1,"b":2}"#);
	}

	#[rstest]
	fn test_nested_insertion_order_is_irrelevant() {
		let value = json!({"z": {"b": 1, "a": [{"y": 1, "x": 2}]}, "m": null});

		assert_eq!(value.to_string(), r#"{"z":{"b":1,"a":[{"y":1,"x":2}]},"m":null}"#);
		assert_eq!(compact(&value), r#"{"m":null,"z":{"a":[{"x":2,"y":1}],"b":1}}"#);
	}

	#[rstest]
	#[case(Indent::Spaces(usize::MAX))]
	#[case(Indent::Spaces(11))]
	#[case(Indent::Text(" ".repeat(1 << 20)))]
	fn test_indent_is_capped(#[case] indent: Indent) {
		let settings = StringifySettings::new().with_indent(indent);
		let expected = format!("{{\n{}\"a\": 1\n}}", " ".repeat(Indent::MAX_WIDTH));

		assert_eq!(canonicalize(&json!({"a": 1}), &settings).unwrap(), expected);
	}

	#[rstest]
	fn test_keys_sort_bytewise() {
		let value = json!({"b": 1, "B": 2, "é": 3, "a": 4});
		assert_eq!(compact(&value), r#"{"B":2,"a":4,"b":1,"é":3}"#);
	}

	#[rstest]
	fn test_indent_text() {
		let settings = StringifySettings::new().with_indent(Indent::Text("\t".to_string()));
		assert_eq!(
			canonicalize(&json!({"a": [1]}), &settings).unwrap(),
			"{\n\t\"a\": [\n\t\t1\n\t]\n}"
		);
	}

	#[rstest]
	#[case(Indent::Spaces(0))]
	#[case(Indent::Text(String::new()))]
	fn test_empty_indent_is_compact(#[case] indent: Indent) {
		let settings = StringifySettings::new().with_indent(indent);
		assert_eq!(
			canonicalize(&json!({"b": 2, "a": 1}), &settings).unwrap(),
			r#"{"a":1,"b":2}"#
		);
	}

	#[rstest]
	fn test_indent_does_not_change_order() {
		let value = json!({"b": 2, "a": 1});
		let pretty = canonicalize(
			&value,
			&StringifySettings::new().with_indent(Indent::Spaces(4)),
		)
		.unwrap();

		let reparsed: Value = serde_json::from_str(&pretty).unwrap();
		assert_eq!(compact(&reparsed), compact(&value));
		assert!(pretty.find("\"a\"").unwrap() < pretty.find("\"b\"").unwrap());
	}

	#[rstest]
	fn test_allowlist_projection() {
		let settings = StringifySettings::new().with_allowlist(["b", "a"]);
		let value = json!({"a": 1, "b": 2, "c": 3});

		assert_eq!(canonicalize(&value, &settings).unwrap(), r#"{"a":1,"b":2}"#);
	}

	#[rstest]
	#[case(json!(null))]
	#[case(json!([1, 2]))]
	#[case(json!("a"))]
	fn test_allowlist_on_non_object_fails(#[case] value: Value) {
		let settings = StringifySettings::new().with_allowlist(["a"]);
		let error = canonicalize(&value, &settings).unwrap_err();
		assert!(matches!(error, Error::Serialization(_)));
	}
}
