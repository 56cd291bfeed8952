use serde::{Deserialize, Serialize};

/// Sub-protocol announced in `Sec-WebSocket-Protocol` by both ends.
pub const SUBPROTOCOL: &str = "foxglove.websocket.v1";

/// Request id of the "fetch everything" request.
pub const FETCH_PARAMETERS_ID: &str = "fetch-parameters";

pub const STATUS_INFO: u8 = 0;
pub const STATUS_WARNING: u8 = 1;
pub const STATUS_ERROR: u8 = 2;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", tag = "op")]
pub enum ClientRequest {
    GetParameters {
        #[serde(rename = "parameterNames", default)]
        parameter_names: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
    SetParameters {
        parameters: Vec<ParameterUpdate>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
}

impl ClientRequest {
    /// Fetch request with an empty filter, which asks for every parameter.
    pub fn fetch_all() -> Self {
        ClientRequest::GetParameters {
            parameter_names: Vec::new(),
            id: Some(FETCH_PARAMETERS_ID.to_string()),
        }
    }

    /// Update request for a single edited control.
    ///
    /// The wire name drops the leading slash (`<node>.<leaf>`) and the id is
    /// `slider-<index>-<value>-<leaf>`.
    pub fn set_one(node: &str, leaf: &str, index: usize, value: f64) -> Self {
        ClientRequest::SetParameters {
            parameters: vec![ParameterUpdate {
                name: format!("{node}.{leaf}"),
                value,
                kind: ParameterType::Float64,
            }],
            id: Some(format!("slider-{index}-{value}-{leaf}")),
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            ClientRequest::GetParameters { id, .. } => id.as_deref(),
            ClientRequest::SetParameters { id, .. } => id.as_deref(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ParameterType {
    #[default]
    Float64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ParameterUpdate {
    pub name: String,
    pub value: f64,
    #[serde(rename = "type", default)]
    pub kind: ParameterType,
}

/// One `{ name, value }` pair as it appears in a parameter dump.
///
/// `value` stays untyped: feeds publish booleans, strings and arrays next to
/// the numeric parameters.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ParameterEntry {
    pub name: String,
    pub value: serde_json::Value,
}

impl ParameterEntry {
    pub fn number(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value: serde_json::Value::from(value),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", tag = "op")]
pub enum ServerMessage {
    ParameterValues {
        parameters: Vec<ParameterEntry>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
    Status {
        level: u8,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fetch_request_wire_shape() {
        let v = serde_json::to_value(ClientRequest::fetch_all()).unwrap();
        assert_eq!(
            v,
            json!({ "op": "getParameters", "parameterNames": [], "id": "fetch-parameters" })
        );
    }

    #[test]
    fn update_request_wire_shape() {
        let v = serde_json::to_value(ClientRequest::set_one("camA", "exposure", 0, 12.5)).unwrap();
        assert_eq!(
            v,
            json!({
                "op": "setParameters",
                "parameters": [{ "name": "camA.exposure", "value": 12.5, "type": "float64" }],
                "id": "slider-0-12.5-exposure"
            })
        );
    }

    #[test]
    fn update_id_formats_integral_values_without_fraction() {
        let req = ClientRequest::set_one("camA", "gain", 3, 10.0);
        assert_eq!(req.id(), Some("slider-3-10-gain"));
    }

    #[test]
    fn update_without_type_defaults_to_float64() {
        let req: ClientRequest = serde_json::from_str(
            r#"{"op":"setParameters","parameters":[{"name":"a.b","value":1}]}"#,
        )
        .unwrap();
        match req {
            ClientRequest::SetParameters { parameters, id } => {
                assert_eq!(parameters[0].kind, ParameterType::Float64);
                assert!(id.is_none());
            }
            other => panic!("expected setParameters, got {other:?}"),
        }
    }

    #[test]
    fn parameter_values_reply_keeps_op_tag() {
        let msg = ServerMessage::ParameterValues {
            parameters: vec![ParameterEntry::number("/camA.exposure", 10.0)],
            id: Some(FETCH_PARAMETERS_ID.to_string()),
        };
        let v = serde_json::to_value(msg).unwrap();
        assert_eq!(v["op"], "parameterValues");
        assert_eq!(v["parameters"][0]["name"], "/camA.exposure");
    }

    #[test]
    fn status_levels_round_trip() {
        for level in [STATUS_INFO, STATUS_WARNING, STATUS_ERROR] {
            let raw = format!(r#"{{"op":"status","level":{level},"message":"m"}}"#);
            match serde_json::from_str::<ServerMessage>(&raw).unwrap() {
                ServerMessage::Status { level: got, message } => {
                    assert_eq!(got, level);
                    assert_eq!(message, "m");
                }
                other => panic!("expected status, got {other:?}"),
            }
        }
        assert!(STATUS_INFO < STATUS_WARNING && STATUS_WARNING < STATUS_ERROR);
    }
}
