/// Pipe-delimited markdown table: first column left-aligned, every other
/// column right-aligned.
pub fn markdown_table(header: &[String], rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    push_row(&mut out, header);

    let align: Vec<String> = (0..header.len())
        .map(|i| if i == 0 { ":---" } else { "---:" }.to_string())
        .collect();
    push_row(&mut out, &align);

    for row in rows {
        push_row(&mut out, row);
    }
    out
}

fn push_row(out: &mut String, cells: &[String]) {
    out.push('|');
    for cell in cells {
        out.push(' ');
        out.push_str(&cell.replace('|', r"\|"));
        out.push_str(" |");
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_markdown_table() {
        let table = markdown_table(
            &strings(&["File", "Stmts"]),
            &[strings(&["a.js", "1/2"]), strings(&["b.js", "2/2"])],
        );
        assert_eq!(
            table,
            "| File | Stmts |\n| :--- | ---: |\n| a.js | 1/2 |\n| b.js | 2/2 |\n"
        );
    }

    #[test]
    fn test_pipes_are_escaped() {
        let table = markdown_table(&strings(&["a|b"]), &[]);
        assert!(table.starts_with(r"| a\|b |"));
    }
}
