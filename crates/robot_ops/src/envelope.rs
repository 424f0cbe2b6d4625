//! Platform response envelope.
//!
//! Shape: `{"code": 0, "data": {"error": null, "result": ...}}`. A non-zero
//! `code` or a non-null `data.error` means the call failed remotely.

use serde_json::Value;

use common::Error;

/// Borrow `data.result` out of an envelope, or surface the remote failure.
pub fn extract_result(envelope: &Value) -> Result<&Value, Error> {
    let code = envelope.get("code").and_then(Value::as_i64).unwrap_or(0);
    if code != 0 {
        return Err(Error::Remote {
            code,
            message: remote_message(envelope),
        });
    }

    let data = envelope.get("data").ok_or_else(|| Error::Remote {
        code,
        message: "envelope has no data".into(),
    })?;

    match data.get("error") {
        None | Some(Value::Null) => {}
        Some(err) => {
            return Err(Error::Remote {
                code,
                message: message_of(err),
            })
        }
    }

    data.get("result").ok_or_else(|| Error::Remote {
        code,
        message: "envelope has no data.result".into(),
    })
}

/// Deserialize one field of `data.result`.
pub fn result_field<T: serde::de::DeserializeOwned>(
    envelope: &Value,
    field: &str,
) -> Result<T, Error> {
    let result = extract_result(envelope)?;
    let value = result.get(field).cloned().unwrap_or(Value::Null);
    Ok(serde_json::from_value(value)?)
}

fn remote_message(envelope: &Value) -> String {
    envelope
        .get("data")
        .and_then(|d| d.get("error"))
        .filter(|e| !e.is_null())
        .or_else(|| envelope.get("message"))
        .map(message_of)
        .unwrap_or_else(|| envelope.to_string())
}

fn message_of(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
