/// Closest candidate to `token`: the shortest one it prefixes, otherwise the
/// first within two edits.
pub fn best_suggestion(token: &str, candidates: &[String]) -> Option<String> {
    let mut best_prefix: Option<&String> = None;
    for candidate in candidates {
        if candidate.starts_with(token) {
            best_prefix = match best_prefix {
                Some(current) if current.len() <= candidate.len() => Some(current),
                _ => Some(candidate),
            };
        }
    }
    if let Some(candidate) = best_prefix {
        return Some(candidate.clone());
    }
    let mut best = None;
    let mut best_dist = usize::MAX;
    for candidate in candidates {
        if candidate.is_empty() {
            continue;
        }
        let dist = edit_distance(token, candidate, 2);
        if dist <= 2 && dist < best_dist {
            best_dist = dist;
            best = Some(candidate.clone());
        }
    }
    best
}

/// Levenshtein distance over chars. Gives up early once every cell of a row
/// exceeds `max`, returning that row's minimum.
pub fn edit_distance(a: &str, b: &str, max: usize) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        cur[0] = i + 1;
        let mut row_min = cur[0];
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            let value = (cur[j] + 1).min(prev[j + 1] + 1).min(prev[j] + cost);
            cur[j + 1] = value;
            row_min = row_min.min(value);
        }
        if row_min > max {
            return row_min;
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn prefix_wins_and_prefers_shortest() {
        let list = names(&["printenv", "print", "echo"]);
        assert_eq!(best_suggestion("pri", &list).as_deref(), Some("print"));
    }

    #[test]
    fn typo_within_two_edits() {
        let list = names(&["alias", "unalias", "exit"]);
        assert_eq!(best_suggestion("alais", &list).as_deref(), Some("alias"));
        assert_eq!(best_suggestion("exti", &list).as_deref(), Some("exit"));
        assert_eq!(best_suggestion("zzzzzz", &list), None);
    }

    #[test]
    fn distances() {
        assert_eq!(edit_distance("", "abc", 2), 3);
        assert_eq!(edit_distance("kitten", "sitting", 5), 3);
        assert_eq!(edit_distance("same", "same", 2), 0);
        assert!(edit_distance("abcdef", "uvwxyz", 2) > 2);
        assert_eq!(edit_distance("é", "e", 2), 1);
    }
}
