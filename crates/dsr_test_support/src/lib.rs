pub mod fixture;

pub use crate::fixture::{
    FIXTURE_FORMAT_V1, Fixture, FixtureNode, FixtureOptions, load_fixture, load_fixtures,
};

/// Quote-safe rendering of fixture source for failure messages: quotes and
/// backslashes are escaped, control characters use Rust escape syntax.
pub fn escape_source(source: &str) -> String {
    source
        .chars()
        .fold(String::with_capacity(source.len()), |mut out, ch| {
            match ch {
                '"' | '\\' => {
                    out.push('\\');
                    out.push(ch);
                }
                c if c.is_control() => out.extend(c.escape_debug()),
                c => out.push(c),
            }
            out
        })
}

pub fn diff_lines(expected: &[String], actual: &[String]) -> String {
    use std::fmt::Write;
    fn line(lines: &[String], i: usize) -> &str {
        lines.get(i).map(String::as_str).unwrap_or("<missing>")
    }
    let max = expected.len().max(actual.len());
    let mismatch = (0..max).find(|&i| line(expected, i) != line(actual, i));

    let mut out = String::new();
    if let Some(i) = mismatch {
        let start = i.saturating_sub(2);
        let end = (i + 3).min(max);
        let _ = writeln!(
            &mut out,
            "first mismatch at line {} (showing {}..={}):",
            i + 1,
            start + 1,
            end
        );
        for idx in start..end {
            let marker = if idx == i { ">" } else { " " };
            let _ = writeln!(&mut out, "{marker} {:>4}  expected: {}", idx + 1, line(expected, idx));
            let _ = writeln!(&mut out, "{marker} {:>4}    actual: {}", idx + 1, line(actual, idx));
        }
    }
    let _ = writeln!(
        &mut out,
        "expected {} lines, actual {} lines",
        expected.len(),
        actual.len()
    );
    out
}
