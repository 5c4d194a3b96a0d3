use crate::matrix::Matrix;
use std::fmt;

const EMPTY: &str = "()";

// (left, right) bracket glyphs for the first, interior and last line.
const TOP: (char, char) = ('⎛', '⎞');
const MIDDLE: (char, char) = ('⎜', '⎟');
const BOTTOM: (char, char) = ('⎝', '⎠');

fn render<A: fmt::Display>(v: &A, precision: Option<usize>) -> String {
    match precision {
        Some(p) => format!("{:.*}", p, v),
        None => v.to_string(),
    }
}

fn format_matrix<A: fmt::Display>(m: &Matrix<A>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let (rows, cols) = m.shape().dims2();
    if rows == 0 {
        return f.write_str(EMPTY);
    }
    let precision = f.precision();
    let cells: Vec<String> = m.iter().map(|v| render(v, precision)).collect();
    if rows == 1 {
        f.write_str("(")?;
        f.write_str(&cells.join(" "))?;
        return f.write_str(")");
    }

    let mut widths = vec![0usize; cols];
    for (i, cell) in cells.iter().enumerate() {
        let w = &mut widths[i % cols];
        *w = (*w).max(cell.chars().count());
    }

    for (r, line) in cells.chunks(cols).enumerate() {
        let (left, right) = if r == 0 {
            TOP
        } else if r == rows - 1 {
            BOTTOM
        } else {
            MIDDLE
        };
        if r > 0 {
            f.write_str("\n")?;
        }
        write!(f, "{} ", left)?;
        for (c, cell) in line.iter().enumerate() {
            if c > 0 {
                f.write_str("  ")?;
            }
            write!(f, "{:>width$}", cell, width = widths[c])?;
        }
        write!(f, " {}", right)?;
    }
    Ok(())
}

impl<A: fmt::Display> fmt::Display for Matrix<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        format_matrix(self, f)
    }
}

impl<A: fmt::Debug> fmt::Debug for Matrix<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Matrix({}) ", self.shape())?;
        f.debug_list().entries(self.rows_iter()).finish()
    }
}
