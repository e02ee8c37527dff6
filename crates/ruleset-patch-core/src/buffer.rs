//! In-memory view of a rule file as an ordered sequence of lines.

/// Ordered lines of a rule file.
///
/// Every element keeps its original terminator, so joining the elements
/// reproduces the file byte for byte. An inserted element may itself span
/// several physical lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineBuffer {
    lines: Vec<String>,
}

impl LineBuffer {
    /// Splits text into lines, keeping each `\n` with its line.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        Self {
            lines: content.split_inclusive('\n').map(String::from).collect(),
        }
    }

    /// Builds a buffer from already-split lines.
    #[must_use]
    pub fn from_lines(lines: Vec<String>) -> Self {
        Self { lines }
    }

    /// Returns the lines.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns true if the buffer holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Index of the first line at or after `start` containing `needle`.
    #[must_use]
    pub fn find_from(&self, start: usize, needle: &str) -> Option<usize> {
        self.lines
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, line)| line.contains(needle))
            .map(|(i, _)| i)
    }

    /// Index of the first line containing `needle`.
    #[must_use]
    pub fn find(&self, needle: &str) -> Option<usize> {
        self.find_from(0, needle)
    }

    /// Returns true if any line contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.find(needle).is_some()
    }

    /// Joins the lines back into file content.
    #[must_use]
    pub fn to_content(&self) -> String {
        self.lines.concat()
    }
}
