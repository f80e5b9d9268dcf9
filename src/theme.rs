use crate::ir::StepType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub primary_color: String,
    pub primary_text_color: String,
    pub primary_border_color: String,
    pub line_color: String,
    pub start_color: String,
    pub end_color: String,
    pub decision_color: String,
    pub edge_label_background: String,
    pub back_edge_color: String,
    pub background: String,
}

impl Theme {
    pub fn classic() -> Self {
        Self {
            font_family: "\"trebuchet ms\", verdana, arial, sans-serif".to_string(),
            font_size: 16.0,
            primary_color: "#ECECFF".to_string(),
            primary_text_color: "#333333".to_string(),
            primary_border_color: "#9370DB".to_string(),
            line_color: "#333333".to_string(),
            start_color: "#DFF5E1".to_string(),
            end_color: "#F9DEDC".to_string(),
            decision_color: "#FFFFDE".to_string(),
            edge_label_background: "#E8E8E8".to_string(),
            back_edge_color: "#AAAA33".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 13.0,
            primary_color: "#F8FAFF".to_string(),
            primary_text_color: "#1C2430".to_string(),
            primary_border_color: "#C7D2E5".to_string(),
            line_color: "#7A8AA6".to_string(),
            start_color: "#E8F7EE".to_string(),
            end_color: "#FCEDEC".to_string(),
            decision_color: "#FFF7E0".to_string(),
            edge_label_background: "#FFFFFF".to_string(),
            back_edge_color: "#B9A24A".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "modern" => Some(Self::modern()),
            "base" | "default" | "classic" => Some(Self::classic()),
            _ => None,
        }
    }

    pub fn fill_for(&self, step_type: StepType) -> &str {
        match step_type {
            StepType::Start => &self.start_color,
            StepType::End => &self.end_color,
            StepType::Decision => &self.decision_color,
            StepType::Task => &self.primary_color,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::modern()
    }
}
