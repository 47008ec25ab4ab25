// Copyright 2026 the Prism authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Filesystem-backed shader compilation.
//!
//! Loads shader source from disk and packages it as a tagged bytecode blob
//! (the headless device consumes bytecode opaquely; a windowed backend would
//! swap the packaging step for a real compiler invocation). Source-change
//! detection compares file modification times recorded at compile time:
//! the polling half of the hot-reload boundary. The watcher thread that
//! would drive it eagerly lives outside this crate.

use prism_core::rhi::ShaderError;
use prism_core::shader::{ShaderBytecode, ShaderCompiler, ShaderRequest};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

/// A [`ShaderCompiler`] that reads source files under a root directory.
#[derive(Debug)]
pub struct FileShaderCompiler {
    root: PathBuf,
    compile_times: Mutex<HashMap<PathBuf, SystemTime>>,
}

impl FileShaderCompiler {
    /// Creates a compiler rooted at `root`; request paths resolve below it.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            compile_times: Mutex::new(HashMap::new()),
        }
    }

    fn source_path(&self, request: &ShaderRequest) -> PathBuf {
        self.root.join(&request.key.path)
    }

    fn modified_time(path: &Path) -> Option<SystemTime> {
        std::fs::metadata(path).and_then(|m| m.modified()).ok()
    }
}

impl ShaderCompiler for FileShaderCompiler {
    fn compile(&self, request: &ShaderRequest) -> Result<ShaderBytecode, ShaderError> {
        let path = self.source_path(request);
        let source = std::fs::read(&path).map_err(|err| ShaderError::LoadError {
            path: path.display().to_string(),
            source_error: err.to_string(),
        })?;

        // A missing entry point is the one compile error worth catching
        // before the backend ever sees the blob.
        if !source
            .windows(request.key.entry_point.len())
            .any(|window| window == request.key.entry_point.as_bytes())
        {
            return Err(ShaderError::CompilationError {
                label: request.key.label(),
                details: format!("entry point '{}' not found in source", request.key.entry_point),
            });
        }

        if let Some(modified) = Self::modified_time(&path) {
            self.compile_times.lock().unwrap().insert(path, modified);
        }

        // Tag the blob with stage and entry so two modules of one file
        // produce distinct bytecode.
        let mut bytes =
            Vec::with_capacity(source.len() + request.key.entry_point.len() + request.target_profile.len() + 2);
        bytes.extend_from_slice(request.target_profile.as_bytes());
        bytes.push(0);
        bytes.extend_from_slice(request.key.entry_point.as_bytes());
        bytes.push(0);
        bytes.extend_from_slice(&source);
        Ok(ShaderBytecode::new(bytes))
    }

    fn has_source_changed(&self, request: &ShaderRequest) -> bool {
        let path = self.source_path(request);
        let recorded = self.compile_times.lock().unwrap().get(&path).copied();
        match (recorded, Self::modified_time(&path)) {
            (Some(at_compile), Some(on_disk)) => on_disk > at_compile,
            // Never compiled through this instance, or the file vanished:
            // nothing sensible to reload.
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_core::shader::{ShaderKey, ShaderStage};
    use std::io::Write;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("prism-shader-{tag}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn request(path: &str) -> ShaderRequest {
        ShaderRequest {
            key: ShaderKey {
                path: path.to_string(),
                entry_point: "VSMain".to_string(),
                stage: ShaderStage::Vertex,
            },
            target_profile: "vs_6_6".to_string(),
        }
    }

    #[test]
    fn compiles_source_with_entry_point() {
        let dir = scratch_dir("compile");
        std::fs::write(dir.join("ok.hlsl"), b"float4 VSMain() { return 0; }").unwrap();

        let compiler = FileShaderCompiler::new(&dir);
        let bytecode = compiler.compile(&request("ok.hlsl")).unwrap();
        assert!(!bytecode.bytes.is_empty());
    }

    #[test]
    fn missing_entry_point_is_a_compile_error() {
        let dir = scratch_dir("entry");
        std::fs::write(dir.join("bad.hlsl"), b"float4 OtherMain() { return 0; }").unwrap();

        let compiler = FileShaderCompiler::new(&dir);
        let err = compiler.compile(&request("bad.hlsl")).unwrap_err();
        assert!(matches!(err, ShaderError::CompilationError { .. }));
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let dir = scratch_dir("missing");
        let compiler = FileShaderCompiler::new(&dir);
        let err = compiler.compile(&request("nope.hlsl")).unwrap_err();
        assert!(matches!(err, ShaderError::LoadError { .. }));
    }

    #[test]
    fn source_change_detection_uses_mtime() {
        let dir = scratch_dir("mtime");
        let path = dir.join("live.hlsl");
        std::fs::write(&path, b"float4 VSMain() { return 0; }").unwrap();

        let compiler = FileShaderCompiler::new(&dir);
        compiler.compile(&request("live.hlsl")).unwrap();
        assert!(!compiler.has_source_changed(&request("live.hlsl")));

        // Push the mtime forward explicitly; sleeping for filesystem
        // granularity makes the test slow and flaky.
        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "// edited").unwrap();
        file.set_modified(SystemTime::now() + std::time::Duration::from_secs(2))
            .unwrap();

        assert!(compiler.has_source_changed(&request("live.hlsl")));
    }
}
