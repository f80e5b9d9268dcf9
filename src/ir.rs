use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepType {
    Start,
    #[default]
    Task,
    Decision,
    End,
}

impl StepType {
    /// Unknown tokens fall back to `Task`, same as a missing `stepType`.
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "start" => Self::Start,
            "decision" => Self::Decision,
            "end" => Self::End,
            _ => Self::Task,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Task => "task",
            Self::Decision => "decision",
            Self::End => "end",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    #[serde(deserialize_with = "id_from_value")]
    pub id: String,
    #[serde(default)]
    pub step_number: i64,
    #[serde(default, deserialize_with = "step_type_from_value")]
    pub step_type: StepType,
    #[serde(default, alias = "label", alias = "title")]
    pub name: String,
    #[serde(default, alias = "description", skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    #[serde(alias = "from", alias = "source", deserialize_with = "id_from_value")]
    pub from_step_id: String,
    #[serde(alias = "to", alias = "target", deserialize_with = "id_from_value")]
    pub to_step_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub priority: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub steps: Vec<Step>,
    #[serde(default, alias = "connections")]
    pub edges: Vec<Edge>,
}

impl Step {
    pub fn new(id: &str, step_type: StepType, name: &str) -> Self {
        Self {
            id: id.to_string(),
            step_number: 0,
            step_type,
            name: name.to_string(),
            details: None,
        }
    }

    /// Text shown inside the node box; falls back to the id when unnamed.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

impl Edge {
    pub fn new(from: &str, to: &str, priority: i64) -> Self {
        Self {
            from_step_id: from.to_string(),
            to_step_id: to.to_string(),
            label: None,
            priority,
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Appends a step, numbering it after the ones already present.
    pub fn push_step(&mut self, id: &str, step_type: StepType, name: &str) {
        let mut step = Step::new(id, step_type, name);
        step.step_number = self.steps.len() as i64 + 1;
        self.steps.push(step);
    }

    pub fn connect(&mut self, from: &str, to: &str, priority: i64, label: Option<&str>) {
        let mut edge = Edge::new(from, to, priority);
        edge.label = label.map(str::to_string);
        self.edges.push(edge);
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdValue {
    Number(i64),
    Unsigned(u64),
    Float(f64),
    String(String),
}

fn id_from_value<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match IdValue::deserialize(deserializer)? {
        IdValue::Number(val) => val.to_string(),
        IdValue::Unsigned(val) => val.to_string(),
        IdValue::Float(val)
            if val.fract() == 0.0 && val >= i64::MIN as f64 && val < i64::MAX as f64 =>
        {
            format!("{}", val as i64)
        }
        IdValue::Float(val) => val.to_string(),
        IdValue::String(val) => val,
    })
}

fn step_type_from_value<'de, D>(deserializer: D) -> Result<StepType, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().map(StepType::from_token).unwrap_or_default())
}
