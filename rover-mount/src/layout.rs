use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn sized(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }

    /// Shrinks the rect by the given insets, never below zero size
    pub fn inset(&self, insets: EdgeInsets) -> Rect {
        Rect {
            x: self.x + insets.left,
            y: self.y + insets.top,
            width: (self.width - insets.left - insets.right).max(0.0),
            height: (self.height - insets.top - insets.bottom).max(0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeInsets {
    pub top: f32,
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
}

impl EdgeInsets {
    pub fn uniform(value: f32) -> Self {
        Self {
            top: value,
            left: value,
            bottom: value,
            right: value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayType {
    None,
    #[default]
    Flex,
}

/// Computed layout for one node in one revision
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutMetrics {
    pub frame: Rect,
    pub content_insets: EdgeInsets,
    pub border_width: EdgeInsets,
    pub display: DisplayType,
}

impl LayoutMetrics {
    pub fn with_frame(frame: Rect) -> Self {
        Self {
            frame,
            ..Self::default()
        }
    }

    /// Content bounds in the node's own coordinate space
    pub fn content_bounds(&self) -> Rect {
        Rect::sized(self.frame.width, self.frame.height).inset(self.content_insets)
    }

    pub fn is_hidden(&self) -> bool {
        self.display == DisplayType::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_bounds() {
        let metrics = LayoutMetrics {
            frame: Rect::new(10.0, 20.0, 100.0, 50.0),
            content_insets: EdgeInsets {
                top: 5.0,
                left: 10.0,
                bottom: 5.0,
                right: 10.0,
            },
            ..LayoutMetrics::default()
        };

        assert_eq!(metrics.content_bounds(), Rect::new(10.0, 5.0, 80.0, 40.0));
    }

    #[test]
    fn test_inset_clamps_to_zero() {
        let rect = Rect::sized(10.0, 10.0).inset(EdgeInsets::uniform(8.0));
        assert_eq!(rect.width, 0.0);
        assert_eq!(rect.height, 0.0);
    }

    #[test]
    fn test_metrics_from_json_defaults() {
        let metrics: LayoutMetrics =
            serde_json::from_str(r#"{"frame":{"width":320,"height":480}}"#).unwrap();
        assert_eq!(metrics.frame, Rect::sized(320.0, 480.0));
        assert_eq!(metrics.display, DisplayType::Flex);
        assert!(!metrics.is_hidden());
    }
}
