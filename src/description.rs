//! Wiki-markup description written on every push. It replaces whatever
//! description the issue had.

/// Render the task details table for Summary, Category and Team.
pub fn render(summary: &str, category: &str, team: &str) -> String {
    format!(
        "h2. Task Details\n\n\
         || Item || Description ||\n\
         | *Summary* | {} |\n\
         | *Category* | {} |\n\
         | *Team* | {} |\n",
        cell(summary),
        cell(category),
        cell(team)
    )
}

/// Keep user text inside its table cell.
fn cell(value: &str) -> String {
    value
        .trim()
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .replace('|', "\\|")
}
