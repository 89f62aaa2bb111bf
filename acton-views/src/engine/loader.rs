//! Layered template sources
//!
//! Templates are looked up across an ordered list of sources and the first
//! source containing the path wins:
//!
//! 1. Embedded templates registered in code (the packaged root `/`)
//! 2. Template directories from configuration
//! 3. The optional webapp directory (conventionally `WEB-INF`)

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use minijinja::{Error, ErrorKind};

/// A place templates are loaded from
#[derive(Debug, Clone)]
pub enum TemplateSource {
    /// Templates compiled into the binary, keyed by path
    Embedded(HashMap<String, String>),
    /// A directory on disk that template paths are resolved against
    Directory(PathBuf),
}

impl TemplateSource {
    /// Embedded templates from `(path, source)` pairs
    ///
    /// Leading slashes on paths are ignored.
    ///
    /// ```rust
    /// use acton_views::TemplateSource;
    ///
    /// let source = TemplateSource::embedded([
    ///     ("ftl/index.ftl", "<h1>{{ title }}</h1>"),
    ///     ("/ftl/footer.ftl", "<footer>{{ year }}</footer>"),
    /// ]);
    /// ```
    pub fn embedded<I, K, V>(templates: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self::Embedded(
            templates
                .into_iter()
                .map(|(path, source)| (normalize(path.as_ref()).to_string(), source.into()))
                .collect(),
        )
    }

    /// Templates under a directory
    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self::Directory(path.into())
    }

    fn load(&self, name: &str) -> Result<Option<String>, Error> {
        match self {
            Self::Embedded(templates) => Ok(templates.get(normalize(name)).cloned()),
            Self::Directory(root) => {
                let Some(path) = safe_join(root, name) else {
                    return Ok(None);
                };
                if !path.is_file() {
                    return Ok(None);
                }
                std::fs::read_to_string(&path).map(Some).map_err(|err| {
                    Error::new(
                        ErrorKind::InvalidOperation,
                        format!("could not read template '{}'", path.display()),
                    )
                    .with_source(err)
                })
            }
        }
    }
}

/// Ordered set of template sources, searched front to back
#[derive(Debug, Clone, Default)]
pub struct LayeredLoader {
    sources: Arc<[TemplateSource]>,
}

impl LayeredLoader {
    /// Search `sources` in the given order
    #[must_use]
    pub fn new(sources: Vec<TemplateSource>) -> Self {
        Self {
            sources: sources.into(),
        }
    }

    /// The sources in search order
    #[must_use]
    pub fn sources(&self) -> &[TemplateSource] {
        &self.sources
    }

    /// Load the first template matching `name`
    ///
    /// Returns `Ok(None)` when no source has it.
    pub fn load(&self, name: &str) -> Result<Option<String>, Error> {
        for (layer, source) in self.sources.iter().enumerate() {
            if let Some(template) = source.load(name)? {
                tracing::trace!(template = name, layer, "Loaded template source");
                return Ok(Some(template));
            }
        }
        Ok(None)
    }
}

fn normalize(name: &str) -> &str {
    name.trim_start_matches('/')
}

/// Join a template path onto a root directory
///
/// Segments starting with `.` or containing a backslash never resolve, which
/// keeps lookups inside the root.
fn safe_join(root: &Path, name: &str) -> Option<PathBuf> {
    let mut path = root.to_path_buf();
    for segment in name.split('/').filter(|s| !s.is_empty()) {
        if segment.starts_with('.') || segment.contains('\\') {
            return None;
        }
        path.push(segment);
    }
    Some(path)
}
