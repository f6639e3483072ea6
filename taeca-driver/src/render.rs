//! Text rendering of computed rows, one character per cell.

/// Glyphs for states 0..10; higher states use their digit modulo the palette
const PALETTE: &[u8] = b" .:-=+*#%@";

/// One line per row of `width` cells
pub fn render_rows(cells: &[u32], width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    let mut out = String::with_capacity(cells.len() + cells.len() / width);
    for row in cells.chunks(width) {
        out.extend(
            row.iter()
                .map(|&s| PALETTE[s as usize % PALETTE.len()] as char),
        );
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_rows() {
        assert_eq!(render_rows(&[0, 1, 1, 0, 2, 0], 3), " ..\n : \n");
        assert_eq!(render_rows(&[1, 2], 0), "");
    }
}
