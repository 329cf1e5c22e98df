use crate::core::{Frame, FrameSequence, MotObject, NaviData};
use serde_json::Value;
use tracing::debug;

/// Prefix written by the logging bridge in front of each JSON payload
const MESSAGE_MARKER: &str = "Nanomsg:";

/// Channel carrying HMI object lists directly
const HMI_CHANNEL: &str = "mov_objs_hmi";

/// Channel that nests a copy of the HMI payload under its params
const TRACKING_CHANNEL: &str = "tracking";

/// Parse a whole MOT log into a replay sequence
///
/// Each line holds one JSON message or an array of messages, optionally
/// preceded by a `Nanomsg:` marker. Python-style literals (single quotes,
/// `True`/`False`/`None`) are accepted. Lines that do not parse are skipped.
///
/// Frames without a positive timestamp are dropped, the rest are sorted and
/// deduplicated by timestamp.
pub fn parse(content: &str) -> FrameSequence {
    let mut frames = Vec::new();
    let mut skipped = 0usize;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some(json) = extract_payload(line) else {
            continue;
        };

        let value: Value = match serde_json::from_str(&normalize_python(json)) {
            Ok(v) => v,
            Err(_) => {
                skipped += 1;
                continue;
            }
        };

        match value {
            Value::Array(items) => frames.extend(items.iter().filter_map(parse_single)),
            item => frames.extend(parse_single(&item)),
        }
    }

    if skipped > 0 {
        debug!("Skipped {} unparseable log lines", skipped);
    }

    frames.retain(|f| f.timestamp > 0.0);
    FrameSequence::replay(frames)
}

/// Parse a single raw stream message
///
/// The payload is tried as one JSON document first. Anything else goes
/// through the line parser and the first frame found wins.
pub fn parse_message(raw: &str) -> Option<Frame> {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => parse_single(&value),
        Err(_) => parse(raw).first().cloned(),
    }
}

/// Convert one decoded message into a frame
///
/// Returns `None` for messages on other channels or without pose and object data.
pub fn parse_single(item: &Value) -> Option<Frame> {
    let hmi = match item.get("channel").and_then(Value::as_str) {
        Some(HMI_CHANNEL) => item.get("params")?,
        Some(TRACKING_CHANNEL) => item.get("params")?.get(HMI_CHANNEL)?,
        _ => return None,
    };

    let navi = hmi.get("navi").filter(|n| !n.is_null())?;
    let objs = hmi.get("objs")?.as_array()?;

    let navi_ts = match navi {
        Value::Array(values) => values.get(8).and_then(Value::as_f64),
        _ => navi.get("ts").and_then(Value::as_f64),
    };
    let timestamp = item
        .get("timestamp")
        .and_then(Value::as_f64)
        .filter(|ts| *ts != 0.0)
        .or(navi_ts)
        .unwrap_or(0.0);

    Some(Frame {
        timestamp,
        navi: map_navi(navi),
        objs: objs.iter().map(map_object).collect(),
        vin: Some(
            item.get("vin")
                .and_then(Value::as_str)
                .unwrap_or("Unknown")
                .to_string(),
        ),
        raw: serde_json::to_string_pretty(item).ok(),
    })
}

/// Locate the JSON part of a log line
fn extract_payload(line: &str) -> Option<&str> {
    if let Some(idx) = line.find(MESSAGE_MARKER) {
        return Some(line[idx + MESSAGE_MARKER.len()..].trim());
    }
    line.find(|c| c == '{' || c == '[').map(|idx| line[idx..].trim())
}

/// Turn Python repr output into JSON
fn normalize_python(text: &str) -> String {
    let text = text.replace('\'', "\"");
    let mut out = String::with_capacity(text.len());
    let mut rest = text.as_str();

    while let Some(colon) = rest.find(':') {
        out.push_str(&rest[..=colon]);
        rest = &rest[colon + 1..];

        let trimmed = rest.trim_start();
        let replaced = [("true", "true"), ("false", "false"), ("none", "null")]
            .iter()
            .find(|(word, _)| {
                trimmed.len() >= word.len()
                    && trimmed.is_char_boundary(word.len())
                    && trimmed[..word.len()].eq_ignore_ascii_case(word)
            });

        if let Some((word, json)) = replaced {
            out.push(' ');
            out.push_str(json);
            rest = &trimmed[word.len()..];
        }
    }
    out.push_str(rest);
    out
}

fn map_navi(navi: &Value) -> NaviData {
    match navi {
        Value::Array(v) => {
            let at = |i: usize| v.get(i).and_then(Value::as_f64).unwrap_or(0.0);
            NaviData {
                east: at(0),
                north: at(1),
                height: at(2),
                theta: at(3),
                alpha: at(4),
                beta: at(5),
                vel: at(6),
                yaw_angular_speed: at(7),
                ts: at(8),
            }
        }
        other => serde_json::from_value(other.clone()).unwrap_or_default(),
    }
}

fn map_object(obj: &Value) -> MotObject {
    match obj {
        Value::Array(v) => {
            let num = |i: usize| v.get(i).and_then(Value::as_f64).unwrap_or(0.0);
            let int = |i: usize| v.get(i).and_then(Value::as_f64).map(|x| x as i64).unwrap_or(0);
            let vertex_points = v
                .get(6)
                .and_then(Value::as_array)
                .map(|points| points.iter().filter_map(map_point).collect())
                .unwrap_or_default();

            MotObject {
                id: int(0),
                theta: num(1),
                vel: num(2),
                vel_theta: num(3),
                height: num(4),
                kind: int(5),
                vertex_points,
                lower_z: num(7),
                veh_light_kind: int(8),
            }
        }
        other => serde_json::from_value(other.clone()).unwrap_or_default(),
    }
}

fn map_point(point: &Value) -> Option<[f64; 2]> {
    let p = point.as_array()?;
    Some([p.first()?.as_f64()?, p.get(1)?.as_f64()?])
}
