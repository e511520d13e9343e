use std::collections::HashMap;

use once_cell::sync::Lazy;

const FONT_HEIGHT: usize = 5;
const FILL_CHAR: char = '█';

type Glyph = [&'static str; FONT_HEIGHT];

static GLYPHS: Lazy<HashMap<char, Glyph>> = Lazy::new(|| {
    HashMap::from([
        ('0', ["111", "1 1", "1 1", "1 1", "111"]),
        ('1', [" 1 ", "11 ", " 1 ", " 1 ", "111"]),
        ('2', ["111", "  1", "111", "1  ", "111"]),
        ('3', ["111", "  1", " 11", "  1", "111"]),
        ('4', ["1 1", "1 1", "111", "  1", "  1"]),
        ('5', ["111", "1  ", "111", "  1", "111"]),
        ('6', ["111", "1  ", "111", "1 1", "111"]),
        ('7', ["111", "  1", " 1 ", " 1 ", " 1 "]),
        ('8', ["111", "1 1", "111", "1 1", "111"]),
        ('9', ["111", "1 1", "111", "  1", "111"]),
        ('-', ["   ", "   ", "111", "   ", "   "]),
        (' ', ["   ", "   ", "   ", "   ", "   "]),
        ('?', ["111", "  1", " 1 ", "   ", " 1 "]),
    ])
});

/// Render digits (and the clearing dash) as chunky block lines.
pub fn render(text: &str) -> Vec<String> {
    let content: Vec<char> = text.chars().collect();
    if content.is_empty() {
        return vec![String::new(); FONT_HEIGHT];
    }

    let mut lines = vec![String::new(); FONT_HEIGHT];
    for (index, ch) in content.iter().enumerate() {
        let glyph = GLYPHS.get(ch).or_else(|| GLYPHS.get(&'?')).unwrap();
        for (row_idx, row) in glyph.iter().enumerate() {
            if index > 0 {
                lines[row_idx].push_str("  ");
            }
            for symbol in row.chars() {
                // Double-width columns keep the aspect ratio square-ish in
                // terminal cells.
                let cell = if symbol == '1' { FILL_CHAR } else { ' ' };
                lines[row_idx].push(cell);
                lines[row_idx].push(cell);
            }
        }
    }

    lines
        .into_iter()
        .map(|line| line.trim_end().to_string())
        .collect()
}
