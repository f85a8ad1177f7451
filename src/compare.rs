//! Whitespace-normalized output comparison.

/// Trims every line, drops lines that are empty after trimming and rejoins
/// with single newlines. Internal spacing and line order are preserved.
pub fn normalize(output: &str) -> String {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Two outputs match iff their normalized forms are byte-equal.
pub fn matches(expected: &str, actual: &str) -> bool {
    normalize(expected) == normalize(actual)
}

/// Tolerance mode: both outputs are a single floating-point number and match
/// iff they differ by less than `epsilon`. A parse failure on either side is
/// a non-match, never an error.
pub fn matches_with_tolerance(expected: &str, actual: &str, epsilon: f64) -> bool {
    let (Ok(expected), Ok(actual)) = (
        expected.trim().parse::<f64>(),
        actual.trim().parse::<f64>(),
    ) else {
        return false;
    };
    (expected - actual).abs() < epsilon
}
