//! Upload registry: the two pending file collections feeding a debate.
//!
//! Files are opaque handles. Contents are only read when a debate starts and
//! the first requirement is turned into the oracle's subject text.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

/// Which collection a file belongs to. The set is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Existing policies and compliance documents.
    Knowledge,
    /// The proposed business requirement under review.
    Requirement,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Knowledge, Category::Requirement];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Knowledge => "knowledge",
            Self::Requirement => "requirement",
        }
    }

    /// Heading used when listing the collection.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Knowledge => "Knowledge Base",
            Self::Requirement => "New Requirement",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
enum Content {
    Path(PathBuf),
    Inline(Arc<str>),
}

/// A user-selected file. Never mutated after creation.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    name: String,
    size: u64,
    content: Content,
}

impl UploadedFile {
    /// Register a file on disk. Only metadata is read here.
    pub fn from_path(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let meta = std::fs::metadata(&path)?;
        if !meta.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            name,
            size: meta.len(),
            content: Content::Path(path),
        })
    }

    /// An in-memory file, e.g. pasted text.
    pub fn from_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        let text: Arc<str> = Arc::from(text.into());
        Self {
            name: name.into(),
            size: text.len() as u64,
            content: Content::Inline(text),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Size in kilobytes with one decimal, e.g. `"2.4 KB"`.
    pub fn size_label(&self) -> String {
        format!("{:.1} KB", self.size as f64 / 1024.0)
    }

    /// Read the file's text. Invalid UTF-8 is replaced rather than rejected.
    pub fn read_text(&self) -> io::Result<String> {
        match &self.content {
            Content::Path(path) => {
                let bytes = std::fs::read(path)?;
                Ok(String::from_utf8_lossy(&bytes).into_owned())
            }
            Content::Inline(text) => Ok(text.to_string()),
        }
    }
}

/// Pending uploads, one ordered list per [`Category`].
///
/// Insertion order is kept and duplicates are allowed.
#[derive(Debug, Clone, Default)]
pub struct UploadRegistry {
    knowledge: Vec<UploadedFile>,
    requirement: Vec<UploadedFile>,
}

impl UploadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, category: Category) -> &Vec<UploadedFile> {
        match category {
            Category::Knowledge => &self.knowledge,
            Category::Requirement => &self.requirement,
        }
    }

    fn slot_mut(&mut self, category: Category) -> &mut Vec<UploadedFile> {
        match category {
            Category::Knowledge => &mut self.knowledge,
            Category::Requirement => &mut self.requirement,
        }
    }

    /// Append a batch of files to `category`.
    pub fn add(&mut self, category: Category, files: impl IntoIterator<Item = UploadedFile>) {
        let slot = self.slot_mut(category);
        let before = slot.len();
        slot.extend(files);
        debug!(
            category = %category,
            added = slot.len() - before,
            total = slot.len(),
            "files added"
        );
    }

    /// Remove the file at `index`, shifting later files down.
    ///
    /// Out-of-range indices are a no-op and return `None`.
    pub fn remove(&mut self, category: Category, index: usize) -> Option<UploadedFile> {
        let slot = self.slot_mut(category);
        if index >= slot.len() {
            debug!(category = %category, index, len = slot.len(), "remove ignored: out of range");
            return None;
        }
        Some(slot.remove(index))
    }

    pub fn files(&self, category: Category) -> &[UploadedFile] {
        self.slot(category)
    }

    pub fn count(&self, category: Category) -> usize {
        self.slot(category).len()
    }

    /// True when nothing has been uploaded in either category.
    pub fn is_empty(&self) -> bool {
        self.knowledge.is_empty() && self.requirement.is_empty()
    }

    /// Gate for `START_DEBATE`: both collections must be non-empty.
    pub fn can_start_debate(&self) -> bool {
        !self.knowledge.is_empty() && !self.requirement.is_empty()
    }

    /// The requirement whose text becomes the oracle's subject.
    pub fn primary_requirement(&self) -> Option<&UploadedFile> {
        self.requirement.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn file(name: &str) -> UploadedFile {
        UploadedFile::from_text(name, format!("contents of {name}"))
    }

    fn names(reg: &UploadRegistry, category: Category) -> Vec<&str> {
        reg.files(category).iter().map(|f| f.name()).collect()
    }

    #[test]
    fn add_preserves_order_and_duplicates() {
        let mut reg = UploadRegistry::new();
        reg.add(Category::Knowledge, vec![file("gdpr.md"), file("retention.md")]);
        reg.add(Category::Knowledge, vec![file("gdpr.md")]);

        assert_eq!(
            names(&reg, Category::Knowledge),
            vec!["gdpr.md", "retention.md", "gdpr.md"]
        );
        assert_eq!(reg.count(Category::Requirement), 0);
    }

    #[test]
    fn remove_shifts_later_entries() {
        let mut reg = UploadRegistry::new();
        reg.add(Category::Requirement, vec![file("a"), file("b"), file("c")]);

        let removed = reg.remove(Category::Requirement, 1).unwrap();
        assert_eq!(removed.name(), "b");
        assert_eq!(names(&reg, Category::Requirement), vec!["a", "c"]);
    }

    #[test]
    fn remove_out_of_range_is_noop() {
        let mut reg = UploadRegistry::new();
        reg.add(Category::Knowledge, vec![file("a")]);

        assert!(reg.remove(Category::Knowledge, 1).is_none());
        assert!(reg.remove(Category::Requirement, 0).is_none());
        assert_eq!(names(&reg, Category::Knowledge), vec!["a"]);
    }

    #[test]
    fn gate_requires_both_categories() {
        let mut reg = UploadRegistry::new();
        assert!(!reg.can_start_debate());
        assert!(reg.is_empty());

        reg.add(Category::Knowledge, vec![file("policy")]);
        assert!(!reg.can_start_debate());
        assert!(!reg.is_empty());

        reg.add(Category::Requirement, vec![file("brd")]);
        assert!(reg.can_start_debate());

        reg.remove(Category::Knowledge, 0);
        assert!(!reg.can_start_debate());
    }

    #[test]
    fn gate_tracks_counts_over_mixed_sequences() {
        // Deterministic pseudo-random walk over add/remove operations.
        let mut reg = UploadRegistry::new();
        let mut seed: u64 = 0x5eed;
        for step in 0..500 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let category = Category::ALL[(seed >> 33) as usize % 2];
            if (seed >> 40) % 3 == 0 {
                reg.add(category, vec![file(&format!("f{step}"))]);
            } else {
                let index = (seed >> 20) as usize % 4;
                reg.remove(category, index);
            }
            let expected =
                reg.count(Category::Knowledge) > 0 && reg.count(Category::Requirement) > 0;
            assert_eq!(reg.can_start_debate(), expected, "step {step}");
        }
    }

    #[test]
    fn primary_requirement_is_first_added() {
        let mut reg = UploadRegistry::new();
        assert!(reg.primary_requirement().is_none());
        reg.add(Category::Requirement, vec![file("first"), file("second")]);
        assert_eq!(reg.primary_requirement().unwrap().name(), "first");
    }

    #[test]
    fn from_path_reads_metadata_and_lazy_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brd.md");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"Store analytics for 24 months.").unwrap();
        drop(f);

        let uploaded = UploadedFile::from_path(&path).unwrap();
        assert_eq!(uploaded.name(), "brd.md");
        assert_eq!(uploaded.size(), 30);
        assert_eq!(uploaded.read_text().unwrap(), "Store analytics for 24 months.");
    }

    #[test]
    fn from_path_rejects_directories() {
        let dir = tempfile::tempdir().unwrap();
        let err = UploadedFile::from_path(dir.path()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn size_label_in_kilobytes() {
        let f = UploadedFile::from_text("x", "a".repeat(2458));
        assert_eq!(f.size_label(), "2.4 KB");
        assert_eq!(UploadedFile::from_text("empty", "").size_label(), "0.0 KB");
    }
}
