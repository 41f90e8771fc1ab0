//! Resources and status columns

use serde::{Deserialize, Serialize};

use super::id::{ResourceId, StatusId};

/// A person or asset that can be assigned to tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: ResourceId,
    pub name: String,
    /// Hex color, e.g. `#4682b4`
    pub color: String,
    /// Percentage of time available, 0-100
    #[serde(default = "full_availability")]
    pub availability: u8,
}

fn full_availability() -> u8 {
    100
}

impl Resource {
    pub fn new(id: ResourceId, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            color: color.into(),
            availability: full_availability(),
        }
    }
}

/// A workflow status (a Kanban column)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusConfig {
    pub id: StatusId,
    pub name: String,
    pub color: String,
    /// Display position
    #[serde(default)]
    pub order: u32,
}

impl StatusConfig {
    pub fn new(id: StatusId, name: impl Into<String>, color: impl Into<String>, order: u32) -> Self {
        Self {
            id,
            name: name.into(),
            color: color.into(),
            order,
        }
    }

    /// Statuses seeded into every new project
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new(StatusId::from_static("todo"), "To Do", "#9e9e9e", 0),
            Self::new(StatusId::from_static("in-progress"), "In Progress", "#2196f3", 1),
            Self::new(StatusId::from_static("done"), "Done", "#4caf50", 2),
        ]
    }
}

/// Returns true for `#rgb` or `#rrggbb` colors
pub fn is_hex_color(s: &str) -> bool {
    let Some(hex) = s.strip_prefix('#') else {
        return false;
    };
    matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn availability_defaults_to_full() {
        let json = r##"{"id":"r-1","name":"Alice","color":"#ff0000"}"##;
        let r: Resource = serde_json::from_str(json).unwrap();
        assert_eq!(r.availability, 100);
    }

    #[test]
    fn default_statuses_are_ordered() {
        let statuses = StatusConfig::defaults();
        assert_eq!(statuses.len(), 3);
        let orders: Vec<_> = statuses.iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
        assert_eq!(statuses[0].id.as_str(), "todo");
    }

    #[test]
    fn hex_colors() {
        assert!(is_hex_color("#fff"));
        assert!(is_hex_color("#4682B4"));
        assert!(!is_hex_color("4682b4"));
        assert!(!is_hex_color("#12345"));
        assert!(!is_hex_color("#ggg"));
    }
}
