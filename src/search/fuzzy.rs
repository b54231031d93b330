//! Fuzzy similarity scoring / 模糊相似度评分
//!
//! `partial_ratio` is the 0-100 best-window similarity used by the FUZZY
//! strategy; `name_similarity` is the 0-1 ratio used to weight FUNCTION
//! matches. Both are case-insensitive. / partial_ratio 为 0-100 的最佳窗口
//! 相似度，name_similarity 为 0-1 的函数名相似度，均不区分大小写。

use strsim::normalized_levenshtein;

/// Texts longer than this are scanned with a coarse stride / 超过该长度用粗步长扫描
const STRIDE_THRESHOLD: usize = 2048;

/// Best-window similarity of the shorter string against the longer, 0-100.
/// 短串在长串上滑动窗口的最佳相似度，0-100。
///
/// A direct substring hit scores 100; empty input scores 0.
pub fn partial_ratio(a: &str, b: &str) -> u8 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let (short, long) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };

    if long.contains(&short) {
        return 100;
    }

    let long_chars: Vec<char> = long.chars().collect();
    let window = short.chars().count();

    // Full stride-1 scan is quadratic; long texts get a coarser stride plus
    // the tail window so the end of the text is always considered.
    let stride = if long_chars.len() > STRIDE_THRESHOLD {
        (window / 2).max(1)
    } else {
        1
    };

    let mut best = 0.0f64;
    let mut start = 0;
    while start + window <= long_chars.len() {
        let candidate: String = long_chars[start..start + window].iter().collect();
        let sim = normalized_levenshtein(&short, &candidate);
        if sim > best {
            best = sim;
            if best >= 0.999 {
                break;
            }
        }
        start += stride;
    }

    let tail: String = long_chars[long_chars.len() - window..].iter().collect();
    best = best.max(normalized_levenshtein(&short, &tail));

    ratio_to_score(best)
}

/// Name similarity in 0-1 / 名称相似度（0-1）
pub fn name_similarity(a: &str, b: &str) -> f64 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    normalized_levenshtein(&a, &b)
}

fn ratio_to_score(ratio: f64) -> u8 {
    (ratio.clamp(0.0, 1.0) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substring_scores_100() {
        assert_eq!(partial_ratio("hello", "say hello world"), 100);
        assert_eq!(partial_ratio("HELLO", "hello"), 100);
    }

    #[test]
    fn test_empty_scores_0() {
        assert_eq!(partial_ratio("", "anything"), 0);
        assert_eq!(partial_ratio("anything", "   "), 0);
    }

    #[test]
    fn test_threshold_boundary() {
        // 100-char strings: 40 edits -> exactly 60, 41 edits -> 59.
        let base: String = "a".repeat(100);
        let mut sixty: Vec<char> = base.chars().collect();
        for c in sixty.iter_mut().take(40) {
            *c = 'b';
        }
        let sixty: String = sixty.into_iter().collect();
        assert_eq!(partial_ratio(&base, &sixty), 60);

        let mut fifty_nine: Vec<char> = base.chars().collect();
        for c in fifty_nine.iter_mut().take(41) {
            *c = 'b';
        }
        let fifty_nine: String = fifty_nine.into_iter().collect();
        assert_eq!(partial_ratio(&base, &fifty_nine), 59);
    }

    #[test]
    fn test_window_beats_whole_string() {
        // "def foo" sits inside a longer body with small edits around it.
        let score = partial_ratio("def foo", "xxxx def fop xxxx");
        assert!(score >= 80, "score = {}", score);
    }

    #[test]
    fn test_name_similarity() {
        assert!((name_similarity("foo", "foo") - 1.0).abs() < f64::EPSILON);
        assert!(name_similarity("foo", "foobar") > 0.4);
        assert_eq!(name_similarity("", "foo"), 0.0);
    }
}
