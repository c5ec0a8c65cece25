//! Fuzzy similarity (0–100)
//!
//! 정규화된 Indel 거리 기반 비율: `100 * (1 - indel / (|a| + |b|))`.
//! 길이는 문자(char) 단위. 완전히 같은 문자열만 100 이 된다.

/// 기본 중복 판정 임계값
pub const DEFAULT_FUZZY_THRESHOLD: u8 = 85;

/// 삽입/삭제만 허용하는 편집 거리 (치환 = 삭제 + 삽입)
fn indel_distance(a: &[char], b: &[char]) -> usize {
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
            curr[j + 1] = if ca == cb {
                prev[j]
            } else {
                (prev[j + 1] + 1).min(curr[j] + 1)
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// 두 문자열의 유사도 (0.0 ~ 100.0)
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }

    let distance = indel_distance(&a, &b);
    100.0 * (1.0 - distance as f64 / total as f64)
}

/// corpus 전체에 대한 최대 유사도 (corpus 가 비어 있으면 0)
pub fn max_similarity<'a, I>(candidate: &str, corpus: I) -> f64
where
    I: IntoIterator<Item = &'a String>,
{
    corpus
        .into_iter()
        .map(|existing| ratio(candidate, existing))
        .fold(0.0, f64::max)
}

/// 최대 유사도가 threshold 이상이면 중복
pub fn is_duplicate<'a, I>(candidate: &str, corpus: I, threshold: u8) -> bool
where
    I: IntoIterator<Item = &'a String>,
{
    max_similarity(candidate, corpus) >= f64::from(threshold)
}
