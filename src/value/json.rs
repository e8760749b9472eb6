//! Relaxed extended JSON conversion.
//!
//! Wrapper objects recognised on input:
//! `$oid`, `$date`, `$numberDecimal`, `$numberLong`, `$numberInt`,
//! `$numberDouble`, `$binary` and `$undefined`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Map as JsonMap, Value as Json};

use super::types::{Binary, BinarySubtype, Decimal128, ObjectId};
use super::{Document, Value};

impl From<Json> for Value {
    fn from(json: Json) -> Self {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Boolean(b),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    match i32::try_from(i) {
                        Ok(small) => Value::Int32(small),
                        Err(_) => Value::Int64(i),
                    }
                } else {
                    Value::Double(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            Json::Object(map) => from_json_object(map),
        }
    }
}

fn from_json_object(map: JsonMap<String, Json>) -> Value {
    if map.len() == 1 {
        if let Some(value) = extended_scalar(&map) {
            return value;
        }
    }

    let doc: Document = map.into_iter().map(|(k, v)| (k, Value::from(v))).collect();
    Value::Document(doc)
}

/// Decodes a single-key wrapper object. Returns `None` if the object is not
/// a well-formed wrapper, in which case it is treated as a plain document.
fn extended_scalar(map: &JsonMap<String, Json>) -> Option<Value> {
    let (key, inner) = map.iter().next()?;
    match key.as_str() {
        "$oid" => ObjectId::parse_hex(inner.as_str()?).map(Value::ObjectId),
        "$numberDecimal" => Decimal128::parse(inner.as_str()?).map(Value::Decimal),
        "$numberLong" => inner.as_str()?.parse::<i64>().ok().map(Value::Int64),
        "$numberInt" => inner.as_str()?.parse::<i32>().ok().map(Value::Int32),
        "$numberDouble" => match inner.as_str()? {
            "NaN" => Some(Value::Double(f64::NAN)),
            "Infinity" => Some(Value::Double(f64::INFINITY)),
            "-Infinity" => Some(Value::Double(f64::NEG_INFINITY)),
            other => other.parse::<f64>().ok().map(Value::Double),
        },
        "$undefined" => inner.as_bool().filter(|b| *b).map(|_| Value::Undefined),
        "$date" => extended_date(inner).map(Value::DateTime),
        "$binary" => {
            let wrapper = inner.as_object()?;
            let bytes = STANDARD.decode(wrapper.get("base64")?.as_str()?).ok()?;
            let tag = u8::from_str_radix(wrapper.get("subType")?.as_str()?, 16).ok()?;
            Some(Value::Binary(Binary::new(BinarySubtype::from_u8(tag), bytes)))
        }
        _ => None,
    }
}

fn extended_date(inner: &Json) -> Option<DateTime<Utc>> {
    match inner {
        Json::String(s) => DateTime::parse_from_rfc3339(s).ok().map(|d| d.with_timezone(&Utc)),
        Json::Number(n) => Utc.timestamp_millis_opt(n.as_i64()?).single(),
        Json::Object(o) => {
            let millis = o.get("$numberLong")?.as_str()?.parse::<i64>().ok()?;
            Utc.timestamp_millis_opt(millis).single()
        }
        _ => None,
    }
}

impl Value {
    /// Converts to relaxed extended JSON.
    pub fn to_json(&self) -> Json {
        match self {
            Value::Undefined => json!({ "$undefined": true }),
            Value::Null => Json::Null,
            Value::Boolean(b) => Json::Bool(*b),
            Value::Int32(n) => json!(n),
            Value::Int64(n) => json!(n),
            Value::Double(n) => {
                if n.is_finite() {
                    json!(n)
                } else if n.is_nan() {
                    json!({ "$numberDouble": "NaN" })
                } else if *n > 0.0 {
                    json!({ "$numberDouble": "Infinity" })
                } else {
                    json!({ "$numberDouble": "-Infinity" })
                }
            }
            Value::String(s) => Json::String(s.clone()),
            Value::Array(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Document(doc) => {
                let map: JsonMap<String, Json> =
                    doc.iter().map(|(k, v)| (k.clone(), v.to_json())).collect();
                Json::Object(map)
            }
            Value::DateTime(dt) => json!({ "$date": dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true) }),
            Value::ObjectId(id) => json!({ "$oid": id.to_hex() }),
            Value::Decimal(d) => json!({ "$numberDecimal": d.as_str() }),
            Value::Binary(bin) => json!({
                "$binary": {
                    "base64": STANDARD.encode(&bin.bytes),
                    "subType": bin.subtype.to_string(),
                }
            }),
        }
    }
}
