use ahash::AHashSet;

/// CharShingles produces every contiguous run of `size` characters of a string,
/// advancing one character at a time. Slices always fall on char boundaries.
#[derive(Clone)]
pub struct CharShingles<'a> {
    data: &'a str,
    size: usize,
}

impl<'a> CharShingles<'a> {
    pub fn new(data: &'a str, size: usize) -> Self {
        CharShingles { data, size }
    }
}

impl<'a> Iterator for CharShingles<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.size == 0 || self.data.is_empty() {
            return None;
        }

        let mut pos_next: Option<usize> = None;
        let mut pos_end: Option<usize> = None;
        let mut chars = 0;
        for (i, _) in self.data.char_indices() {
            if chars == 1 {
                pos_next = Some(i);
            }
            if chars == self.size {
                pos_end = Some(i);
                break;
            }
            chars += 1;
        }

        let end = match pos_end {
            Some(end) => end,
            // the shingle runs to the end of the remaining data
            None if chars == self.size => self.data.len(),
            None => {
                self.data = "";
                return None;
            }
        };

        let ret = &self.data[..end];
        self.data = match pos_next {
            Some(next) => &self.data[next..],
            None => "",
        };
        Some(ret)
    }
}

/// Returns the set of character n-grams of `text`.
///
/// Shingles are character level, not word level. Text shorter than `n`
/// characters yields an empty set.
///
/// ```
/// use neardup::text::shingles;
///
/// let set = shingles("abcd", 3);
/// assert_eq!(set.len(), 2);
/// assert!(set.contains("abc") && set.contains("bcd"));
/// assert!(shingles("ab", 3).is_empty());
/// ```
pub fn shingles(text: &str, n: usize) -> AHashSet<&str> {
    CharShingles::new(text, n).collect()
}
