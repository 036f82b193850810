//! Edit-distance scoring shared by the local index and the server's
//! fuzzy rescue pass.

/// Classic dynamic-programming Levenshtein distance over chars.
///
/// Callers are expected to case-fold first; this function compares
/// exactly what it is given.
pub fn levenshtein(a: &str, b: &str) -> usize {
  let a: Vec<char> = a.chars().collect();
  let b: Vec<char> = b.chars().collect();

  if a.is_empty() {
    return b.len();
  }
  if b.is_empty() {
    return a.len();
  }

  let mut prev: Vec<usize> = (0..=b.len()).collect();
  let mut curr = vec![0usize; b.len() + 1];

  for (i, ca) in a.iter().enumerate() {
    curr[0] = i + 1;
    for (j, cb) in b.iter().enumerate() {
      let cost = if ca == cb { 0 } else { 1 };
      curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
    }
    std::mem::swap(&mut prev, &mut curr);
  }

  prev[b.len()]
}

/// Normalized similarity in [0, 1]: `1 - distance / max(len)`.
///
/// Empty input on either side scores 0.0 so records with missing
/// names can never match a fuzzy pass.
pub fn normalized_similarity(query: &str, name: &str) -> f32 {
  let q_len = query.chars().count();
  let n_len = name.chars().count();
  if q_len == 0 || n_len == 0 {
    return 0.0;
  }

  let distance = levenshtein(query, name) as f32;
  let longest = q_len.max(n_len) as f32;

  1.0 - distance / longest
}
