//! Builders for release archives and stack definitions.

use flate2::Compression;
use flate2::write::GzEncoder;
use serde_json::{Map, Value, json};
use std::path::Path;
use tar::{Builder, EntryType, Header};

enum Entry {
    File(String, Vec<u8>),
    Dir(String),
}

/// Builds a gzip-compressed tarball in memory.
#[derive(Default)]
pub struct TarballBuilder {
    entries: Vec<Entry>,
}

impl TarballBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a regular file.
    pub fn file(mut self, path: &str, content: &[u8]) -> Self {
        self.entries.push(Entry::File(path.to_string(), content.to_vec()));
        self
    }

    /// Add a directory entry.
    pub fn dir(mut self, path: &str) -> Self {
        self.entries.push(Entry::Dir(path.to_string()));
        self
    }

    /// Encode the archive.
    pub fn build(self) -> Vec<u8> {
        let mut tar = Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
        for entry in self.entries {
            let mut header = Header::new_gnu();
            match entry {
                Entry::File(path, content) => {
                    header.set_entry_type(EntryType::Regular);
                    header.set_size(content.len() as u64);
                    header.set_mode(0o644);
                    header.set_cksum();
                    tar.append_data(&mut header, path, content.as_slice()).unwrap();
                }
                Entry::Dir(path) => {
                    header.set_entry_type(EntryType::Directory);
                    header.set_size(0);
                    header.set_mode(0o755);
                    header.set_cksum();
                    tar.append_data(&mut header, path, std::io::empty()).unwrap();
                }
            }
        }
        tar.into_inner().unwrap().finish().unwrap()
    }

    /// Encode the archive and write it to `path`.
    pub fn write_to(self, path: &Path) {
        std::fs::write(path, self.build()).unwrap();
    }
}

/// Builds stack definition documents.
#[derive(Clone, Debug, Default)]
pub struct StackFixture {
    services: Map<String, Value>,
    metadata_url: Option<String>,
}

impl StackFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a service running `image`.
    pub fn service(mut self, name: &str, image: &str) -> Self {
        self.services.insert(name.to_string(), json!({ "image": image }));
        self
    }

    /// Declare a service with an explicit container name.
    pub fn service_with_container(mut self, name: &str, image: &str, container: &str) -> Self {
        self.services
            .insert(name.to_string(), json!({ "image": image, "container_name": container }));
        self
    }

    /// Set `x-metadata.url`.
    pub fn metadata_url(mut self, url: &str) -> Self {
        self.metadata_url = Some(url.to_string());
        self
    }

    pub fn to_value(&self) -> Value {
        let mut doc = Map::new();
        doc.insert("services".to_string(), Value::Object(self.services.clone()));
        if let Some(url) = &self.metadata_url {
            doc.insert("x-metadata".to_string(), json!({ "url": url }));
        }
        Value::Object(doc)
    }

    /// Pretty-printed JSON bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec_pretty(&self.to_value()).unwrap()
    }

    /// Write the document to `path`.
    pub fn write_to(&self, path: &Path) {
        std::fs::write(path, self.to_bytes()).unwrap();
    }
}
