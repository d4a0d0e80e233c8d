/// Ratcliff/Obershelp similarity: twice the number of matched characters over
/// the combined length. Matching blocks are found recursively around the
/// longest common substring.
pub fn similarity_ratio(left: &str, right: &str) -> f64 {
    let left = left.chars().collect::<Vec<char>>();
    let right = right.chars().collect::<Vec<char>>();

    let total = left.len() + right.len();
    if total == 0 {
        return 1.0;
    }

    2.0 * matching_characters(&left, &right) as f64 / total as f64
}

fn matching_characters(left: &[char], right: &[char]) -> usize {
    let Some((left_start, right_start, size)) = longest_common_block(left, right) else {
        return 0;
    };

    size + matching_characters(&left[..left_start], &right[..right_start])
        + matching_characters(&left[left_start + size..], &right[right_start + size..])
}

// Earliest block in `left` wins ties, then earliest in `right`.
fn longest_common_block(left: &[char], right: &[char]) -> Option<(usize, usize, usize)> {
    let mut best = (0usize, 0usize, 0usize);
    let mut previous = vec![0usize; right.len() + 1];

    for (left_index, left_char) in left.iter().enumerate() {
        let mut current = vec![0usize; right.len() + 1];
        for (right_index, right_char) in right.iter().enumerate() {
            if left_char != right_char {
                continue;
            }

            let run = previous[right_index] + 1;
            current[right_index + 1] = run;
            if run > best.2 {
                best = (left_index + 1 - run, right_index + 1 - run, run);
            }
        }
        previous = current;
    }

    (best.2 > 0).then_some(best)
}
