/// Box-drawing chars of the terminal grid
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TabChar {
    /// Vertical bar
    Bv,
    /// Horizontal bar
    Bh,
    /// Joint left
    Jl,
    /// Joint right
    Jr,
    /// Joint bottom left
    Jbl,
    /// Joint bottom right
    Jbr,
    /// Joint top left
    Jtl,
    /// Joint top right
    Jtr,
    /// Joint to top
    Jtt,
    /// Joint to bottom
    Jtb,
    /// Joint of the middle
    Jm,
}

impl TabChar {
    pub fn val(self) -> char {
        match self {
            Self::Bv => '│',
            Self::Bh => '─',
            Self::Jl => '├',
            Self::Jr => '┤',
            Self::Jbl => '└',
            Self::Jbr => '┘',
            Self::Jtl => '┌',
            Self::Jtr => '┐',
            Self::Jtt => '┴',
            Self::Jtb => '┬',
            Self::Jm => '┼',
        }
    }
}

/// Horizontal line of the grid
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Position {
    Top,
    Middle,
    Bottom,
}

impl Position {
    /// Char drawn where a vertical bar meets this line.
    ///
    /// `left_open` and `right_open` tell if the cell on each side of the bar
    /// keeps going through the line (a course spanning several hours), in
    /// which case no horizontal bar is drawn on that side. The outer edges of
    /// the grid are passed as `None`.
    pub fn joint(self, left_open: Option<bool>, right_open: Option<bool>) -> TabChar {
        match (self, left_open, right_open) {
            (Self::Top, None, _) => TabChar::Jtl,
            (Self::Top, _, None) => TabChar::Jtr,
            (Self::Top, _, _) => TabChar::Jtb,
            (Self::Bottom, None, _) => TabChar::Jbl,
            (Self::Bottom, _, None) => TabChar::Jbr,
            (Self::Bottom, _, _) => TabChar::Jtt,
            (Self::Middle, None | Some(true), None | Some(true)) => TabChar::Bv,
            (Self::Middle, None | Some(true), Some(false)) => TabChar::Jl,
            (Self::Middle, Some(false), None | Some(true)) => TabChar::Jr,
            (Self::Middle, Some(false), Some(false)) => TabChar::Jm,
        }
    }
}
