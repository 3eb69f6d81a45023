use std::{
    ops::{Index, IndexMut},
    str::FromStr,
};

/// Abstract game button, already decoupled from the physical device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Button {
    Left = 0,
    Right = 1,
    Down = 2,
    /// Rotate counter-clockwise.
    RotateA = 3,
    /// Rotate clockwise.
    RotateB = 4,
    HardDrop = 5,
    Hold = 6,
    /// Alternative hard drop.
    Up = 7,
}

impl Button {
    pub const LEN: usize = 8;

    pub const ALL: [Self; Self::LEN] = [
        Button::Left,
        Button::Right,
        Button::Down,
        Button::RotateA,
        Button::RotateB,
        Button::HardDrop,
        Button::Hold,
        Button::Up,
    ];

    /// Returns the name used in input scripts.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Button::Left => "left",
            Button::Right => "right",
            Button::Down => "down",
            Button::RotateA => "rotate-a",
            Button::RotateB => "rotate-b",
            Button::HardDrop => "hard-drop",
            Button::Hold => "hold",
            Button::Up => "up",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("unknown button name: {name:?}")]
pub struct ParseButtonError {
    name: String,
}

impl FromStr for Button {
    type Err = ParseButtonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Button::ALL
            .into_iter()
            .find(|button| button.name() == s)
            .ok_or_else(|| ParseButtonError { name: s.to_owned() })
    }
}

/// A press or release of a single button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub button: Button,
    pub pressed: bool,
}

impl InputEvent {
    #[must_use]
    pub const fn press(button: Button) -> Self {
        Self {
            button,
            pressed: true,
        }
    }

    #[must_use]
    pub const fn release(button: Button) -> Self {
        Self {
            button,
            pressed: false,
        }
    }
}

/// Held/not-held state of every button.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonStates([bool; Button::LEN]);

impl ButtonStates {
    pub fn release_all(&mut self) {
        self.0 = [false; Button::LEN];
    }
}

impl Index<Button> for ButtonStates {
    type Output = bool;

    fn index(&self, button: Button) -> &Self::Output {
        &self.0[button as usize]
    }
}

impl IndexMut<Button> for ButtonStates {
    fn index_mut(&mut self, button: Button) -> &mut Self::Output {
        &mut self.0[button as usize]
    }
}
