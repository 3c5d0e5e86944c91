// 📏 Similarity Scorer - Normalized Levenshtein comparison
// Foundation for all fuzzy matching: every string comparison in the
// engine goes through normalize() first, so casing and punctuation
// never affect a score.

// ============================================================================
// NORMALIZATION
// ============================================================================

/// Normalize text for comparison
///
/// - Lowercase
/// - Runs of non-alphanumeric characters collapse to a single space
/// - Leading/trailing whitespace trimmed
///
/// Example: "PAYMENT **TO** Starbucks!!" → "payment to starbucks"
pub fn normalize(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());
    let mut pending_space = false;

    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_space && !normalized.is_empty() {
                normalized.push(' ');
            }
            pending_space = false;
            normalized.extend(c.to_lowercase());
        } else {
            pending_space = true;
        }
    }

    normalized
}

// ============================================================================
// EDIT DISTANCE
// ============================================================================

/// Levenshtein distance over normalized text
///
/// Both inputs are normalized first, so "STARBUCKS" vs "starbucks!" is 0.
pub fn edit_distance(a: &str, b: &str) -> usize {
    levenshtein(&normalize(a), &normalize(b))
}

/// Calculate Levenshtein distance between two strings
///
/// Levenshtein distance = minimum number of single-character edits
/// (insertions, deletions, substitutions) to change one string into another
fn levenshtein(s1: &str, s2: &str) -> usize {
    let s1_chars: Vec<char> = s1.chars().collect();
    let s2_chars: Vec<char> = s2.chars().collect();
    let len1 = s1_chars.len();
    let len2 = s2_chars.len();

    if len1 == 0 {
        return len2;
    }
    if len2 == 0 {
        return len1;
    }

    let mut matrix = vec![vec![0; len2 + 1]; len1 + 1];

    // Initialize first row and column
    for i in 0..=len1 {
        matrix[i][0] = i;
    }
    for j in 0..=len2 {
        matrix[0][j] = j;
    }

    // Fill matrix
    for i in 1..=len1 {
        for j in 1..=len2 {
            let cost = if s1_chars[i - 1] == s2_chars[j - 1] {
                0
            } else {
                1
            };

            matrix[i][j] = std::cmp::min(
                std::cmp::min(
                    matrix[i - 1][j] + 1,      // deletion
                    matrix[i][j - 1] + 1,      // insertion
                ),
                matrix[i - 1][j - 1] + cost,   // substitution
            );
        }
    }

    matrix[len1][len2]
}

// ============================================================================
// SIMILARITY SCORE
// ============================================================================

/// Similarity between two strings as a ratio in [0.0, 1.0]
///
/// 1.0 = identical after normalization, 0.0 = nothing in common.
/// Defined as 1 - (levenshtein / max_len) over the normalized strings.
pub fn similarity(a: &str, b: &str) -> f64 {
    let na = normalize(a);
    let nb = normalize(b);

    // Identical covers the both-empty case too
    if na == nb {
        return 1.0;
    }
    if na.is_empty() || nb.is_empty() {
        return 0.0;
    }

    let len1 = na.chars().count();
    let len2 = nb.chars().count();
    let max_len = std::cmp::max(len1, len2);
    let distance = levenshtein(&na, &nb);

    1.0 - (distance as f64 / max_len as f64)
}

/// Similarity as a percentage in [0.0, 100.0], for threshold comparisons
pub fn similarity_percent(a: &str, b: &str) -> f64 {
    similarity(a, b) * 100.0
}

// ============================================================================
// TESTS
// ============================================================================
