use crate::error::ParseError;
use crate::ir::Graph;
use serde_json::Value;
use tracing::debug;

/// Reads a graph document into [`Graph`].
///
/// Accepts either `{ "steps": [...], "edges": [...] }` or the same pair
/// wrapped under a `process` key. Strict JSON is tried first; JSON5 (comments,
/// trailing commas, unquoted keys) is the fallback.
pub fn parse_graph(input: &str) -> Result<Graph, ParseError> {
    let graph = graph_from_value(parse_value(input)?)?;
    debug!(
        steps = graph.steps.len(),
        edges = graph.edges.len(),
        "parsed process graph"
    );
    Ok(graph)
}

/// Reads one graph document or a JSON array of them (a multi-process export).
pub fn parse_graphs(input: &str) -> Result<Vec<Graph>, ParseError> {
    match parse_value(input)? {
        Value::Array(values) => {
            let graphs = values
                .into_iter()
                .map(graph_from_value)
                .collect::<Result<Vec<_>, _>>()?;
            debug!(documents = graphs.len(), "parsed multi-process export");
            Ok(graphs)
        }
        value => graph_from_value(value).map(|graph| vec![graph]),
    }
}

fn parse_value(input: &str) -> Result<Value, ParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => Ok(value),
        Err(strict_err) => {
            debug!(error = %strict_err, "strict JSON parse failed, retrying as JSON5");
            Ok(json5::from_str::<Value>(trimmed)?)
        }
    }
}

fn graph_from_value(value: Value) -> Result<Graph, ParseError> {
    let root = unwrap_process(value);
    if !root.get("steps").map(Value::is_array).unwrap_or(false) {
        return Err(ParseError::MissingSteps);
    }
    Ok(serde_json::from_value(root)?)
}

fn unwrap_process(value: Value) -> Value {
    if value.get("steps").is_some() {
        return value;
    }
    match value {
        Value::Object(mut map) => match map.remove("process") {
            Some(inner) if inner.get("steps").is_some() => inner,
            Some(inner) => {
                map.insert("process".to_string(), inner);
                Value::Object(map)
            }
            None => Value::Object(map),
        },
        other => other,
    }
}
