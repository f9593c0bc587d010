//! Porter stemmer
//!
//! Reduces English words to a common stem so that morphological variants
//! ("recipes", "recipe", "creating", "create") compare equal. Operates on
//! lowercase ASCII; anything else is returned unchanged.

/// Stem a single lowercase word
pub fn stem(word: &str) -> String {
    if word.len() <= 2 || !word.bytes().all(|b| b.is_ascii_lowercase()) {
        return word.to_string();
    }

    let mut s = Stemmer {
        b: word.as_bytes().to_vec(),
        j: 0,
    };
    s.step1ab();
    if s.b.len() > 1 {
        s.step1c();
        s.step2();
        s.step3();
        s.step4();
        s.step5();
    }

    // Only ASCII bytes were ever written
    String::from_utf8(s.b).unwrap_or_else(|_| word.to_string())
}

struct Stemmer {
    /// Word being stemmed; its length is the current end
    b: Vec<u8>,
    /// Length of the stem in front of the suffix matched by `ends`
    j: usize,
}

const STEP2: &[(&str, &str)] = &[
    ("ational", "ate"),
    ("tional", "tion"),
    ("enci", "ence"),
    ("anci", "ance"),
    ("izer", "ize"),
    ("bli", "ble"),
    ("alli", "al"),
    ("entli", "ent"),
    ("eli", "e"),
    ("ousli", "ous"),
    ("ization", "ize"),
    ("ation", "ate"),
    ("ator", "ate"),
    ("alism", "al"),
    ("iveness", "ive"),
    ("fulness", "ful"),
    ("ousness", "ous"),
    ("aliti", "al"),
    ("iviti", "ive"),
    ("biliti", "ble"),
    ("logi", "log"),
];

const STEP3: &[(&str, &str)] = &[
    ("icate", "ic"),
    ("ative", ""),
    ("alize", "al"),
    ("iciti", "ic"),
    ("ical", "ic"),
    ("ful", ""),
    ("ness", ""),
];

const STEP4: &[&str] = &[
    "al", "ance", "ence", "er", "ic", "able", "ible", "ant", "ement", "ment", "ent", "ion", "ou",
    "ism", "ate", "iti", "ous", "ive", "ize",
];

impl Stemmer {
    fn len(&self) -> usize {
        self.b.len()
    }

    fn is_consonant(&self, i: usize) -> bool {
        match self.b[i] {
            b'a' | b'e' | b'i' | b'o' | b'u' => false,
            b'y' => i == 0 || !self.is_consonant(i - 1),
            _ => true,
        }
    }

    /// Number of vowel-consonant sequences in the stem `b[..j]`
    fn measure(&self) -> usize {
        let mut n = 0;
        let mut i = 0;
        let j = self.j;

        while i < j && self.is_consonant(i) {
            i += 1;
        }
        loop {
            while i < j && !self.is_consonant(i) {
                i += 1;
            }
            if i >= j {
                return n;
            }
            while i < j && self.is_consonant(i) {
                i += 1;
            }
            n += 1;
            if i >= j {
                return n;
            }
        }
    }

    fn vowel_in_stem(&self) -> bool {
        (0..self.j).any(|i| !self.is_consonant(i))
    }

    /// `b[i-1..=i]` is a double consonant
    fn double_consonant(&self, i: usize) -> bool {
        i >= 1 && self.b[i] == self.b[i - 1] && self.is_consonant(i)
    }

    /// `b[i-2..=i]` is consonant-vowel-consonant and the last is not w, x or y
    fn cvc(&self, i: usize) -> bool {
        if i < 2 || !self.is_consonant(i) || self.is_consonant(i - 1) || !self.is_consonant(i - 2) {
            return false;
        }
        !matches!(self.b[i], b'w' | b'x' | b'y')
    }

    fn ends(&mut self, suffix: &str) -> bool {
        let s = suffix.as_bytes();
        if s.len() > self.len() || !self.b.ends_with(s) {
            return false;
        }
        self.j = self.len() - s.len();
        true
    }

    fn set_to(&mut self, replacement: &str) {
        self.b.truncate(self.j);
        self.b.extend_from_slice(replacement.as_bytes());
    }

    fn replace_if_measured(&mut self, replacement: &str) {
        if self.measure() > 0 {
            self.set_to(replacement);
        }
    }

    fn last(&self) -> u8 {
        self.b[self.len() - 1]
    }

    /// Plurals and -ed / -ing
    fn step1ab(&mut self) {
        if self.last() == b's' {
            if self.ends("sses") {
                self.b.truncate(self.len() - 2);
            } else if self.ends("ies") {
                self.set_to("i");
            } else if self.len() >= 2 && self.b[self.len() - 2] != b's' {
                self.b.truncate(self.len() - 1);
            }
        }

        if self.ends("eed") {
            if self.measure() > 0 {
                self.b.truncate(self.len() - 1);
            }
        } else if (self.ends("ed") || self.ends("ing")) && self.vowel_in_stem() {
            self.b.truncate(self.j);
            if self.ends("at") {
                self.set_to("ate");
            } else if self.ends("bl") {
                self.set_to("ble");
            } else if self.ends("iz") {
                self.set_to("ize");
            } else if self.double_consonant(self.len() - 1) {
                if !matches!(self.last(), b'l' | b's' | b'z') {
                    self.b.truncate(self.len() - 1);
                }
            } else {
                self.j = self.len();
                if self.measure() == 1 && self.cvc(self.len() - 1) {
                    self.b.push(b'e');
                }
            }
        }
    }

    /// Terminal y to i when there is another vowel in the stem
    fn step1c(&mut self) {
        if self.ends("y") && self.vowel_in_stem() {
            let last = self.len() - 1;
            self.b[last] = b'i';
        }
    }

    fn step2(&mut self) {
        if let Some(&(_, to)) = STEP2.iter().find(|(from, _)| self.ends(from)) {
            self.replace_if_measured(to);
        }
    }

    fn step3(&mut self) {
        if let Some(&(_, to)) = STEP3.iter().find(|(from, _)| self.ends(from)) {
            self.replace_if_measured(to);
        }
    }

    fn step4(&mut self) {
        let Some(&suffix) = STEP4.iter().find(|suffix| self.ends(suffix)) else {
            return;
        };
        if suffix == "ion" && !(self.j >= 1 && matches!(self.b[self.j - 1], b's' | b't')) {
            return;
        }
        if self.measure() > 1 {
            self.b.truncate(self.j);
        }
    }

    /// Final -e and double -ll
    fn step5(&mut self) {
        self.j = self.len();
        if self.last() == b'e' {
            let m = self.measure();
            if m > 1 || (m == 1 && !self.cvc(self.len() - 2)) {
                self.b.truncate(self.len() - 1);
            }
        }
        if self.last() == b'l' && self.double_consonant(self.len() - 1) && self.measure() > 1 {
            self.b.truncate(self.len() - 1);
        }
    }
}
