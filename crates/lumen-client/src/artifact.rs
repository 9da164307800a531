//! Artifact file naming and a [`Capturer`] built on it.
//!
//! Artifacts are named `<prefix><token><tick>.png`, where the token is a
//! short run of random lowercase letters that keeps repeated runs over
//! the same ticks from overwriting each other. The receipt carries this
//! name back to the server.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use lumen_core::{CaptureError, Capturer, TickId};

/// Default number of random letters in an artifact name.
pub const DEFAULT_TOKEN_LEN: usize = 5;

/// File extension of every artifact.
pub const ARTIFACT_EXTENSION: &str = "png";

/// Generates artifact paths.
pub struct ArtifactNamer {
    prefix: String,
    token_len: usize,
    rng: ChaCha8Rng,
}

impl ArtifactNamer {
    /// Namer with an entropy-seeded token generator.
    ///
    /// `prefix` is prepended verbatim; include a trailing separator if it
    /// names a directory.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::with_seed(prefix, rand::random())
    }

    /// Namer whose tokens are reproducible from `seed`.
    pub fn with_seed(prefix: impl Into<String>, seed: u64) -> Self {
        Self {
            prefix: prefix.into(),
            token_len: DEFAULT_TOKEN_LEN,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Set the token length. Zero drops the token entirely.
    pub fn with_token_len(mut self, token_len: usize) -> Self {
        self.token_len = token_len;
        self
    }

    /// The path prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Produce the path for `tick`.
    pub fn name(&mut self, tick: TickId) -> String {
        let token: String = (0..self.token_len)
            .map(|_| char::from(b'a' + self.rng.gen_range(0..26u8)))
            .collect();
        format!("{}{token}{tick}.{ARTIFACT_EXTENSION}", self.prefix)
    }
}

impl std::fmt::Debug for ArtifactNamer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactNamer")
            .field("prefix", &self.prefix)
            .field("token_len", &self.token_len)
            .finish_non_exhaustive()
    }
}

/// Writes the current frame to a path.
///
/// Implemented for closures `FnMut(&str) -> Result<(), CaptureError>`.
pub trait FrameGrabber {
    /// Render the current scene and store it at `path`.
    fn grab(&mut self, path: &str) -> Result<(), CaptureError>;
}

impl<F> FrameGrabber for F
where
    F: FnMut(&str) -> Result<(), CaptureError>,
{
    fn grab(&mut self, path: &str) -> Result<(), CaptureError> {
        self(path)
    }
}

/// [`Capturer`] that names the artifact and delegates the pixels.
#[derive(Debug)]
pub struct NamingCapturer<G> {
    namer: ArtifactNamer,
    grabber: G,
}

impl<G: FrameGrabber> NamingCapturer<G> {
    /// Combine a namer and a grabber.
    pub fn new(namer: ArtifactNamer, grabber: G) -> Self {
        Self { namer, grabber }
    }

    /// The grabber.
    pub fn grabber(&self) -> &G {
        &self.grabber
    }
}

impl<G: FrameGrabber> Capturer for NamingCapturer<G> {
    fn capture(&mut self, tick: TickId) -> Result<String, CaptureError> {
        let path = self.namer.name(tick);
        self.grabber.grab(&path)?;
        Ok(path)
    }
}
