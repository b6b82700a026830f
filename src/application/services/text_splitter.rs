/// Break points tried in order, from coarsest to finest. A chunk ends right
/// after the last separator of the first kind that fits; a hard cut at the
/// size limit is the last resort.
const SEPARATORS: [&str; 6] = [
    "\n\n", // Paragraphs
    "\n",   // Lines
    ". ",   // Sentences
    "! ",
    "? ",
    " ", // Words
];

#[derive(Debug, Clone, PartialEq)]
pub enum SplitterError {
    InvalidConfiguration(String),
}

impl std::fmt::Display for SplitterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SplitterError::InvalidConfiguration(msg) => {
                write!(f, "Invalid splitter configuration: {}", msg)
            }
        }
    }
}

impl std::error::Error for SplitterError {}

/// A contiguous region of the input. `start` and `end` are character
/// offsets, `end` exclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSegment {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

impl TextSegment {
    pub fn char_len(&self) -> usize {
        self.end - self.start
    }
}

#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, SplitterError> {
        if chunk_size == 0 {
            return Err(SplitterError::InvalidConfiguration(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(SplitterError::InvalidConfiguration(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }

        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Splits `text` into segments of at most `chunk_size` characters where
    /// each segment starts exactly `chunk_overlap` characters before the
    /// previous one ends. Whitespace-only input yields nothing.
    pub fn split(&self, text: &str) -> Vec<TextSegment> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        let mut segments = Vec::new();
        let mut start = 0;

        loop {
            if total - start <= self.chunk_size {
                segments.push(segment(&chars, start, total));
                break;
            }

            let limit = start + self.chunk_size;
            // Anything shorter would not move the next start forward
            let min_end = start + self.chunk_overlap + 1;
            let end = find_break(&chars, min_end, limit).unwrap_or(limit);

            segments.push(segment(&chars, start, end));
            start = end - self.chunk_overlap;
        }

        segments
    }
}

/// Convenience form taking the configuration per call.
pub fn split(
    text: &str,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Result<Vec<TextSegment>, SplitterError> {
    Ok(TextSplitter::new(chunk_size, chunk_overlap)?.split(text))
}

fn segment(chars: &[char], start: usize, end: usize) -> TextSegment {
    TextSegment {
        text: chars[start..end].iter().collect(),
        start,
        end,
    }
}

/// Latest end position in `min_end..=limit` that falls right after a
/// separator, trying separators coarsest first.
fn find_break(chars: &[char], min_end: usize, limit: usize) -> Option<usize> {
    SEPARATORS.iter().find_map(|separator| {
        let sep: Vec<char> = separator.chars().collect();
        (min_end..=limit)
            .rev()
            .find(|&end| end >= sep.len() && chars[end - sep.len()..end] == sep[..])
    })
}
