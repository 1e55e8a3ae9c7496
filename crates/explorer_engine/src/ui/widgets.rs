//! UI widget primitives
//!
//! Plain data: widgets are laid out against the window size and turned into
//! [`UIRenderCommand`]s by the overlay that owns them.

use crate::foundation::math::Vec4;

/// Anchor point for UI positioning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Top-left corner
    TopLeft,
    /// Top-right corner
    TopRight,
    /// Center of the window
    Center,
    /// Bottom-left corner
    BottomLeft,
    /// Bottom-right corner
    BottomRight,
}

impl Anchor {
    /// Normalized anchor position, `(0, 0)` top-left to `(1, 1)` bottom-right
    pub fn to_normalized(self) -> (f32, f32) {
        match self {
            Self::TopLeft => (0.0, 0.0),
            Self::TopRight => (1.0, 0.0),
            Self::Center => (0.5, 0.5),
            Self::BottomLeft => (0.0, 1.0),
            Self::BottomRight => (1.0, 1.0),
        }
    }
}

/// Screen-space rectangle in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

/// Base element properties
#[derive(Debug, Clone, PartialEq)]
pub struct UIElement {
    /// Offset in pixels from the anchor point
    pub position: (f32, f32),
    /// Size in pixels
    pub size: (f32, f32),
    /// Anchor point
    pub anchor: Anchor,
    /// Whether the element is drawn
    pub visible: bool,
}

impl Default for UIElement {
    fn default() -> Self {
        Self {
            position: (0.0, 0.0),
            size: (100.0, 50.0),
            anchor: Anchor::TopLeft,
            visible: true,
        }
    }
}

impl UIElement {
    /// Resolve to a screen rectangle for a `screen` of `(width, height)` pixels
    ///
    /// The anchor picks both the reference point on screen and the matching
    /// point on the element, so a bottom-right element hugs that corner.
    pub fn layout(&self, screen: (f32, f32)) -> Rect {
        let (ax, ay) = self.anchor.to_normalized();
        Rect {
            x: ax * screen.0 + self.position.0 - ax * self.size.0,
            y: ay * screen.1 + self.position.1 - ay * self.size.1,
            width: self.size.0,
            height: self.size.1,
        }
    }
}

/// Colored rectangle
#[derive(Debug, Clone, PartialEq)]
pub struct UIPanel {
    /// Base element properties
    pub element: UIElement,
    /// Title drawn in the panel header
    pub title: String,
    /// Background color (RGBA)
    pub color: Vec4,
}

impl Default for UIPanel {
    fn default() -> Self {
        Self {
            element: UIElement::default(),
            title: String::new(),
            color: Vec4::new(0.2, 0.2, 0.2, 0.8),
        }
    }
}

/// Single line of text
#[derive(Debug, Clone, PartialEq)]
pub struct UIText {
    /// Base element properties
    pub element: UIElement,
    /// Displayed text
    pub text: String,
    /// Text color (RGBA)
    pub color: Vec4,
}

impl Default for UIText {
    fn default() -> Self {
        Self {
            element: UIElement::default(),
            text: String::new(),
            color: Vec4::new(1.0, 1.0, 1.0, 1.0),
        }
    }
}

/// Button state for visual feedback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    /// Resting
    Normal,
    /// Being pressed
    Pressed,
}

/// Clickable button
#[derive(Debug, Clone, PartialEq)]
pub struct UIButton {
    /// Base element properties
    pub element: UIElement,
    /// Label text
    pub text: String,
    /// Current state
    pub state: ButtonState,
    /// Color in the normal state
    pub normal_color: Vec4,
    /// Color while pressed
    pub pressed_color: Vec4,
}

impl Default for UIButton {
    fn default() -> Self {
        Self {
            element: UIElement::default(),
            text: String::new(),
            state: ButtonState::Normal,
            normal_color: Vec4::new(0.3, 0.3, 0.3, 0.9),
            pressed_color: Vec4::new(0.5, 0.5, 0.6, 1.0),
        }
    }
}

impl UIButton {
    /// Color for the current state
    pub fn current_color(&self) -> Vec4 {
        match self.state {
            ButtonState::Normal => self.normal_color,
            ButtonState::Pressed => self.pressed_color,
        }
    }
}

/// One primitive in the overlay's draw list
#[derive(Debug, Clone, PartialEq)]
pub enum UIRenderCommand {
    /// Filled rectangle
    Quad {
        /// Screen rectangle
        rect: Rect,
        /// Fill color
        color: Vec4,
    },
    /// Text run starting at the rectangle's top-left corner
    Text {
        /// Screen rectangle
        rect: Rect,
        /// Text content
        text: String,
        /// Text color
        color: Vec4,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_anchor_layout() {
        let element = UIElement {
            position: (-10.0, -10.0),
            size: (100.0, 50.0),
            anchor: Anchor::BottomRight,
            visible: true,
        };

        let rect = element.layout((640.0, 480.0));

        assert_relative_eq!(rect.x, 530.0);
        assert_relative_eq!(rect.y, 420.0);
    }

    #[test]
    fn test_button_color_follows_state() {
        let mut button = UIButton::default();
        assert_eq!(button.current_color(), button.normal_color);

        button.state = ButtonState::Pressed;
        assert_eq!(button.current_color(), button.pressed_color);
    }
}
