//! Download providers.
//!
//! A provider turns an asset URL into exactly one file inside a staging
//! directory. The pipeline looks providers up by the record's `Type` tag
//! through a [`ProviderRegistry`]; adding a backend means implementing
//! [`Provider`] and registering it, nothing in the pipeline changes.

pub mod error;
pub mod http;
pub mod mega;

pub use error::FetchError;
pub use http::HttpProvider;
pub use mega::MegaProvider;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::progress::ProgressSink;

/// A pluggable download backend.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Tag this provider answers to. Matched case-sensitively against the
    /// record's `Type` field.
    fn name(&self) -> &'static str;

    /// Downloads `url` into `dest_dir` and returns the path of the single
    /// file produced.
    ///
    /// `dest_dir` exists and is empty on entry. Implementations own their
    /// failure narration: every `Err` return is preceded by exactly one
    /// `ERROR` line on the sink.
    async fn fetch(
        &self,
        url: &str,
        dest_dir: &Path,
        sink: &dyn ProgressSink,
    ) -> Result<PathBuf, FetchError>;
}

/// Ordered collection of providers, resolved by tag.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: Vec<Box<dyn Provider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a provider. Registration order is preserved; the first
    /// match wins on lookup.
    pub fn register(&mut self, provider: Box<dyn Provider>) {
        self.providers.push(provider);
    }

    pub fn resolve(&self, tag: &str) -> Option<&dyn Provider> {
        self.providers
            .iter()
            .find(|p| p.name() == tag)
            .map(|p| p.as_ref())
    }

    /// Registered tags, in registration order.
    pub fn available_tags(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }
}

/// Scans `dest_dir` and returns the single file a provider left behind.
///
/// Anything other than exactly one file breaks the provider contract:
/// zero means the tool silently failed, more than one means the output
/// would be ambiguous.
pub(crate) async fn single_output_file(dest_dir: &Path) -> Result<PathBuf, FetchError> {
    let mut entries = tokio::fs::read_dir(dest_dir).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            files.push(entry.path());
        }
    }
    match files.len() {
        1 => Ok(files.remove(0)),
        count => Err(FetchError::OutputContract { count }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TaggedProvider(&'static str);

    #[async_trait]
    impl Provider for TaggedProvider {
        fn name(&self) -> &'static str {
            self.0
        }

        async fn fetch(
            &self,
            _url: &str,
            dest_dir: &Path,
            _sink: &dyn ProgressSink,
        ) -> Result<PathBuf, FetchError> {
            Ok(dest_dir.join("unused"))
        }
    }

    fn registry() -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();
        registry.register(Box::new(TaggedProvider("Mega")));
        registry.register(Box::new(TaggedProvider("HTTP")));
        registry
    }

    #[test]
    fn test_resolve_by_tag() {
        let registry = registry();
        assert_eq!(registry.resolve("Mega").map(|p| p.name()), Some("Mega"));
        assert_eq!(registry.resolve("HTTP").map(|p| p.name()), Some("HTTP"));
    }

    #[test]
    fn test_resolve_is_case_sensitive() {
        let registry = registry();
        assert!(registry.resolve("mega").is_none());
        assert!(registry.resolve("Http").is_none());
        assert!(registry.resolve("Bogus").is_none());
    }

    #[test]
    fn test_tags_preserve_registration_order() {
        assert_eq!(registry().available_tags(), ["Mega", "HTTP"]);
    }

    #[tokio::test]
    async fn test_first_registration_wins() {
        struct Marker;
        #[async_trait]
        impl Provider for Marker {
            fn name(&self) -> &'static str {
                "HTTP"
            }
            async fn fetch(
                &self,
                _url: &str,
                _dest_dir: &Path,
                _sink: &dyn ProgressSink,
            ) -> Result<PathBuf, FetchError> {
                panic!("shadowed provider must never be resolved")
            }
        }

        let mut registry = ProviderRegistry::new();
        registry.register(Box::new(TaggedProvider("HTTP")));
        registry.register(Box::new(Marker));
        assert_eq!(registry.available_tags(), ["HTTP", "HTTP"]);

        let provider = registry.resolve("HTTP").unwrap();
        let sink = |_: &str| {};
        let result = provider.fetch("stub://x", Path::new("/tmp"), &sink).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_single_output_file_accepts_one() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("payload.bin");
        tokio::fs::write(&file, b"x").await.unwrap();
        assert_eq!(single_output_file(dir.path()).await.unwrap(), file);
    }

    #[tokio::test]
    async fn test_single_output_file_rejects_empty_and_many() {
        let dir = tempfile::tempdir().unwrap();
        let err = single_output_file(dir.path()).await.unwrap_err();
        assert!(matches!(err, FetchError::OutputContract { count: 0 }));

        tokio::fs::write(dir.path().join("a"), b"x").await.unwrap();
        tokio::fs::write(dir.path().join("b"), b"x").await.unwrap();
        let err = single_output_file(dir.path()).await.unwrap_err();
        assert!(matches!(err, FetchError::OutputContract { count: 2 }));
    }

    #[tokio::test]
    async fn test_single_output_file_ignores_directories() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::create_dir(dir.path().join("folder")).await.unwrap();
        let err = single_output_file(dir.path()).await.unwrap_err();
        assert!(matches!(err, FetchError::OutputContract { count: 0 }));

        let file = dir.path().join("payload.bin");
        tokio::fs::write(&file, b"x").await.unwrap();
        assert_eq!(single_output_file(dir.path()).await.unwrap(), file);
    }
}
