//! Recovers rows and columns from the text layout of a PDF page.
//!
//! Handles two common layouts:
//! - **Delimited runs**: cells separated by runs of two or more spaces
//! - **Fixed-width columns**: cells at known or inferred character positions

/// Cell rows recovered from one page.
pub type Rows = Vec<Vec<String>>;

/// How lines are split into cells.
#[derive(Debug, Clone)]
pub enum ColumnRule<'a> {
    /// Split on runs of two or more spaces.
    Whitespace,
    /// Split at explicit character positions.
    Positions(&'a [usize]),
    /// Infer positions from whitespace shared by every line, then split.
    Guess,
}

/// Splits non-empty lines of `text` into cells per the given rule.
/// Short rows are padded so every row has the same number of cells.
pub fn extract_rows(text: &str, rule: &ColumnRule) -> Rows {
    let lines: Vec<Vec<char>> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.chars().collect())
        .collect();

    let mut rows: Rows = match rule {
        ColumnRule::Whitespace => lines.iter().map(|l| split_whitespace_runs(l)).collect(),
        ColumnRule::Positions(starts) => {
            lines.iter().map(|l| split_at_positions(l, starts)).collect()
        }
        ColumnRule::Guess => {
            let starts = guess_column_starts(&lines);
            lines
                .iter()
                .map(|l| split_at_positions(l, &starts))
                .collect()
        }
    };
    normalize(&mut rows);
    rows
}

// Runs of 2+ spaces separate cells; single spaces stay inside a cell.
fn split_whitespace_runs(line: &[char]) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut spaces = 0usize;

    for &ch in line {
        if ch == ' ' || ch == '\t' {
            spaces += if ch == '\t' { 2 } else { 1 };
            continue;
        }
        if spaces >= 2 && !current.is_empty() {
            cells.push(current.clone());
            current.clear();
        } else if spaces > 0 && !current.is_empty() {
            current.push(' ');
        }
        spaces = 0;
        current.push(ch);
    }
    if !current.is_empty() {
        cells.push(current);
    }
    cells
}

/// First character position of every non-blank run, where a position counts
/// as blank only when every line has whitespace (or nothing) there.
fn guess_column_starts(lines: &[Vec<char>]) -> Vec<usize> {
    let width = lines.iter().map(|l| l.len()).max().unwrap_or(0);
    if width == 0 {
        return Vec::new();
    }

    let mut blank = vec![true; width];
    for line in lines {
        for (i, &ch) in line.iter().enumerate() {
            if ch != ' ' && ch != '\t' {
                blank[i] = false;
            }
        }
    }

    let mut starts = Vec::new();
    let mut in_run = false;
    for (i, &is_blank) in blank.iter().enumerate() {
        if !is_blank && !in_run {
            starts.push(i);
            in_run = true;
        } else if is_blank {
            in_run = false;
        }
    }
    starts
}

fn split_at_positions(line: &[char], starts: &[usize]) -> Vec<String> {
    if starts.is_empty() {
        let whole: String = line.iter().collect();
        return vec![whole.trim().to_string()];
    }
    let mut cells = Vec::with_capacity(starts.len());
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(line.len());
        let cell: String = if start < line.len() {
            line[start..end.min(line.len())].iter().collect()
        } else {
            String::new()
        };
        cells.push(cell.trim().to_string());
    }
    cells
}

fn normalize(rows: &mut Rows) {
    let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    for row in rows.iter_mut() {
        row.resize(width, String::new());
    }
}
