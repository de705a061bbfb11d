use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use anyhow::{anyhow, Result};

use crate::loaders::gltf::{load_model, ModelData};

/// Outcome of one asset request
pub struct AssetResult {
    pub url: String,
    pub result: Result<ModelData>,
}

/// Fetches model assets on worker threads
///
/// Results are queued on a channel and only observed when the owner
/// polls, so every loader callback runs on the polling thread.
pub struct AssetLoader {
    root: PathBuf,
    sender: Sender<AssetResult>,
    receiver: Receiver<AssetResult>,
}

impl AssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            root: root.into(),
            sender,
            receiver,
        }
    }

    /// Map an asset URL such as `/models/x/scene.gltf` onto the asset root
    pub fn resolve(&self, url: &str) -> PathBuf {
        self.root.join(url.trim_start_matches('/'))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Start loading `url` in the background
    pub fn request(&self, url: &str) {
        let path = self.resolve(url);
        let sender = self.sender.clone();
        let owned_url = url.to_string();

        let spawned = thread::Builder::new()
            .name(format!("asset:{}", url))
            .spawn(move || {
                let result = load_model(&path);
                // The receiver is gone once the app shuts down; nothing to report to
                sender.send(AssetResult { url: owned_url, result }).ok();
            });

        if let Err(e) = spawned {
            self.sender
                .send(AssetResult {
                    url: url.to_string(),
                    result: Err(anyhow!("Failed to spawn loader thread: {}", e)),
                })
                .ok();
        }
    }

    /// Drain every finished request without blocking
    pub fn poll(&self) -> Vec<AssetResult> {
        self.receiver.try_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn wait(loader: &AssetLoader, timeout: Duration) -> Option<AssetResult> {
        loader.receiver.recv_timeout(timeout).ok()
    }

    #[test]
    fn resolve_strips_leading_slash() {
        let loader = AssetLoader::new("static");
        assert_eq!(
            loader.resolve("/models/coconut_palm/scene.gltf"),
            PathBuf::from("static/models/coconut_palm/scene.gltf")
        );
        assert_eq!(
            loader.resolve("models/a.gltf"),
            PathBuf::from("static/models/a.gltf")
        );
    }

    #[test]
    fn missing_asset_reports_error() {
        let loader = AssetLoader::new("does-not-exist");
        loader.request("/models/missing/scene.gltf");

        let result = wait(&loader, Duration::from_secs(10))
            .expect("loader should report a result");
        assert_eq!(result.url, "/models/missing/scene.gltf");
        assert!(result.result.is_err());
        assert!(loader.poll().is_empty());
    }
}
