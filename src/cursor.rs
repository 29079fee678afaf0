//! ANSI sequences for cursor addressing and screen clearing.
//!
//! Column/row arguments are 0-based terminal cells; the 1-based CSI encoding
//! is handled here so backends never deal with it.

const CSI: &str = "\x1b[";

/// Move the cursor to a 0-based `column` and `row`.
pub fn move_to(column: u16, row: u16) -> String {
    format!(
        "{CSI}{};{}H",
        u32::from(row) + 1,
        u32::from(column) + 1
    )
}

/// Erase the whole screen and park the cursor at the origin.
pub fn clear_screen() -> &'static str {
    "\x1b[2J\x1b[H"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_are_one_based_on_the_wire() {
        assert_eq!(move_to(0, 0), "\x1b[1;1H");
        assert_eq!(move_to(4, 2), "\x1b[3;5H");
    }

    #[test]
    fn extreme_positions_do_not_overflow() {
        assert_eq!(move_to(u16::MAX, u16::MAX), "\x1b[65536;65536H");
    }
}
