//! Acknowledgment sent back to the server after a snapshot is rendered.

/// Names the artifact produced for one processed snapshot.
///
/// Built once per snapshot, serialized immediately, then dropped.
///
/// # Examples
///
/// ```
/// use lumen_core::Receipt;
///
/// let receipt = Receipt::new("/renders/abcde7.png");
/// assert!(receipt.filepath.ends_with("7.png"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    /// Location of the captured artifact.
    pub filepath: String,
}

impl Receipt {
    /// Create a receipt for the given artifact path.
    pub fn new(filepath: impl Into<String>) -> Self {
        Self {
            filepath: filepath.into(),
        }
    }
}
