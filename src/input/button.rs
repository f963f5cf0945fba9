//! # Button Identifiers
//!
//! Logical button numbering and a fixed-capacity table keyed by it.
//!
//! ## Pin Assignments
//!
//! | Button | GPIO line |
//! |--------|-----------|
//! | 0 | 0 |
//! | 1 | 1 |
//! | 2 | 3 |
//! | 3 | 4 |
//! | 4 | 5 |
//! | 5 | 6 |
//! | 6 | 7 |
//! | 7 | 8 |
//!
//! Line 2 is not wired to a button.

use std::ops::{Index, IndexMut};

/// Number of digital buttons.
pub const BUTTON_COUNT: usize = 8;

/// GPIO line number for each button, in button order.
pub const BUTTON_PINS: [u8; BUTTON_COUNT] = [0, 1, 3, 4, 5, 6, 7, 8];

/// Logical button identifier (`0..BUTTON_COUNT`).
///
/// # Examples
///
/// ```
/// use gamepad_link::input::button::ButtonId;
///
/// let id = ButtonId::new(2).unwrap();
/// assert_eq!(id.index(), 2);
/// assert_eq!(id.pin(), 3);
/// assert!(ButtonId::new(8).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ButtonId(u8);

impl ButtonId {
    /// All buttons in frame order.
    pub const ALL: [ButtonId; BUTTON_COUNT] = [
        ButtonId(0),
        ButtonId(1),
        ButtonId(2),
        ButtonId(3),
        ButtonId(4),
        ButtonId(5),
        ButtonId(6),
        ButtonId(7),
    ];

    /// Creates a button identifier, or `None` if `index` is out of range.
    #[must_use]
    pub const fn new(index: usize) -> Option<Self> {
        if index < BUTTON_COUNT {
            Some(ButtonId(index as u8))
        } else {
            None
        }
    }

    /// Resolves a GPIO line number to the button wired to it.
    ///
    /// # Examples
    ///
    /// ```
    /// use gamepad_link::input::button::ButtonId;
    ///
    /// assert_eq!(ButtonId::from_pin(8), ButtonId::new(7));
    /// assert_eq!(ButtonId::from_pin(2), None);
    /// ```
    #[must_use]
    pub fn from_pin(pin: u8) -> Option<Self> {
        BUTTON_PINS
            .iter()
            .position(|&p| p == pin)
            .and_then(ButtonId::new)
    }

    /// Position of this button in the frame (`0..BUTTON_COUNT`).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// GPIO line this button is wired to.
    #[must_use]
    pub const fn pin(self) -> u8 {
        BUTTON_PINS[self.0 as usize]
    }
}

impl std::fmt::Display for ButtonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "button {}", self.0)
    }
}

/// Fixed-capacity table with one slot per button.
///
/// Indexing by [`ButtonId`] is always in bounds, so lookups never fail and
/// never allocate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonTable<T> {
    slots: [T; BUTTON_COUNT],
}

impl<T: Copy> ButtonTable<T> {
    /// Creates a table with every slot set to `value`.
    #[must_use]
    pub const fn filled(value: T) -> Self {
        Self {
            slots: [value; BUTTON_COUNT],
        }
    }
}

impl<T: Copy + Default> Default for ButtonTable<T> {
    fn default() -> Self {
        Self::filled(T::default())
    }
}

impl<T> ButtonTable<T> {
    /// Iterates `(ButtonId, &T)` pairs in button order.
    pub fn iter(&self) -> impl Iterator<Item = (ButtonId, &T)> {
        ButtonId::ALL.into_iter().zip(self.slots.iter())
    }
}

impl<T> Index<ButtonId> for ButtonTable<T> {
    type Output = T;

    fn index(&self, id: ButtonId) -> &T {
        &self.slots[id.index()]
    }
}

impl<T> IndexMut<ButtonId> for ButtonTable<T> {
    fn index_mut(&mut self, id: ButtonId) -> &mut T {
        &mut self.slots[id.index()]
    }
}

/// Pressed/released state of all buttons packed into one byte.
///
/// Bit *n* is button *n*; a set bit means pressed.
///
/// # Examples
///
/// ```
/// use gamepad_link::input::button::{ButtonId, ButtonSet};
///
/// let mut set = ButtonSet::EMPTY;
/// set.set(ButtonId::new(2).unwrap(), true);
/// assert_eq!(set.bits(), 0b0000_0100);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonSet(u8);

impl ButtonSet {
    /// No buttons pressed.
    pub const EMPTY: ButtonSet = ButtonSet(0);

    /// Wraps a raw bit mask.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        ButtonSet(bits)
    }

    /// Raw bit mask.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns true if `id` is pressed.
    #[must_use]
    pub const fn is_pressed(self, id: ButtonId) -> bool {
        self.0 & (1 << id.0) != 0
    }

    /// Marks `id` as pressed or released.
    pub fn set(&mut self, id: ButtonId, pressed: bool) {
        if pressed {
            self.0 |= 1 << id.0;
        } else {
            self.0 &= !(1 << id.0);
        }
    }

    /// Returns true if any button is pressed.
    #[must_use]
    pub const fn any_pressed(self) -> bool {
        self.0 != 0
    }
}

impl From<&ButtonTable<bool>> for ButtonSet {
    fn from(table: &ButtonTable<bool>) -> Self {
        let mut set = ButtonSet::EMPTY;
        for (id, &pressed) in table.iter() {
            set.set(id, pressed);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_id_bounds() {
        assert!(ButtonId::new(0).is_some());
        assert!(ButtonId::new(BUTTON_COUNT - 1).is_some());
        assert!(ButtonId::new(BUTTON_COUNT).is_none());
    }

    #[test]
    fn test_all_is_in_order() {
        for (i, id) in ButtonId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
        }
    }

    #[test]
    fn test_pin_mapping_skips_line_two() {
        assert_eq!(ButtonId::from_pin(0), ButtonId::new(0));
        assert_eq!(ButtonId::from_pin(1), ButtonId::new(1));
        assert_eq!(ButtonId::from_pin(2), None);
        assert_eq!(ButtonId::from_pin(3), ButtonId::new(2));
        assert_eq!(ButtonId::from_pin(8), ButtonId::new(7));
        assert_eq!(ButtonId::from_pin(9), None);
    }

    #[test]
    fn test_pin_round_trip() {
        for id in ButtonId::ALL {
            assert_eq!(ButtonId::from_pin(id.pin()), Some(id));
        }
    }

    #[test]
    fn test_table_index() {
        let mut table = ButtonTable::filled(0u16);
        let id = ButtonId::new(5).unwrap();
        table[id] = 15;
        assert_eq!(table[id], 15);
        assert_eq!(table.iter().filter(|(_, &v)| v != 0).count(), 1);
    }

    #[test]
    fn test_button_set_from_table() {
        let mut table = ButtonTable::filled(false);
        table[ButtonId::new(0).unwrap()] = true;
        table[ButtonId::new(7).unwrap()] = true;

        let set = ButtonSet::from(&table);
        assert_eq!(set.bits(), 0b1000_0001);
        assert!(set.is_pressed(ButtonId::new(7).unwrap()));
        assert!(!set.is_pressed(ButtonId::new(1).unwrap()));
    }

    #[test]
    fn test_button_set_clear() {
        let id = ButtonId::new(3).unwrap();
        let mut set = ButtonSet::from_bits(0xFF);
        set.set(id, false);
        assert!(!set.is_pressed(id));
        assert_eq!(set.bits(), 0xF7);
        assert!(set.any_pressed());
        assert!(!ButtonSet::EMPTY.any_pressed());
    }
}
