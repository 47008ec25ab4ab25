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

//! The shader-compilation boundary.
//!
//! Passes request compiled bytecode by source path + entry point + target
//! profile + stage from a [`ShaderCompiler`]; the [`ShaderLibrary`] caches
//! the results and tracks a recompile generation per module. A file watcher
//! (or the polling fallback a compiler may implement) flips source changes
//! into recompiles; pipeline caching compares generations to rebuild every
//! affected pipeline state object, however many share a module. A failed
//! recompile is logged and the stale bytecode stays in use; rendering must
//! not stop because a shader edit does not parse.

use crate::rhi::error::ShaderError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// The pipeline stage a shader runs at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex shader.
    Vertex,
    /// Pixel (fragment) shader.
    Pixel,
    /// Compute shader.
    Compute,
}

/// Identifies one shader module: source path, entry point and stage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShaderKey {
    /// Path of the source file.
    pub path: String,
    /// Entry-point function name.
    pub entry_point: String,
    /// Stage the module compiles for.
    pub stage: ShaderStage,
}

impl ShaderKey {
    /// A `path:entry` label for logs and errors.
    pub fn label(&self) -> String {
        format!("{}:{}", self.path, self.entry_point)
    }
}

/// A full compilation request: a [`ShaderKey`] plus the target profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShaderRequest {
    /// Module identity.
    pub key: ShaderKey,
    /// Target profile string, e.g. `vs_6_6`.
    pub target_profile: String,
}

/// A compiled bytecode blob.
#[derive(Debug, Clone)]
pub struct ShaderBytecode {
    /// The compiled bytes.
    pub bytes: Arc<Vec<u8>>,
    /// A content hash for cheap change comparison.
    pub hash: u64,
}

impl ShaderBytecode {
    /// Wraps raw bytes, hashing them with FNV-1a.
    pub fn new(bytes: Vec<u8>) -> Self {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in &bytes {
            hash ^= *byte as u64;
            hash = hash.wrapping_mul(0x100_0000_01b3);
        }
        Self {
            bytes: Arc::new(bytes),
            hash,
        }
    }
}

/// Turns shader source into bytecode.
pub trait ShaderCompiler: Send + Sync {
    /// Compiles the requested module.
    fn compile(&self, request: &ShaderRequest) -> Result<ShaderBytecode, ShaderError>;

    /// Returns `true` if the module's source changed since the last
    /// [`compile`](`Self::compile`) for it. Default: never.
    fn has_source_changed(&self, _request: &ShaderRequest) -> bool {
        false
    }
}

/// One cached module: its request, current bytecode and recompile counter.
#[derive(Debug)]
struct ShaderModule {
    request: ShaderRequest,
    bytecode: ShaderBytecode,
    generation: AtomicU64,
}

/// A cache of compiled shader modules with hot-reload tracking.
///
/// Every recompile bumps the module's generation and the library-wide
/// generation. Consumers compare generations instead of consuming a flag, so
/// any number of cached pipelines can observe the same reload.
pub struct ShaderLibrary {
    compiler: Box<dyn ShaderCompiler>,
    modules: HashMap<ShaderKey, ShaderModule>,
    generation: AtomicU64,
}

impl std::fmt::Debug for ShaderLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderLibrary")
            .field("modules", &self.modules.len())
            .finish()
    }
}

impl ShaderLibrary {
    /// Creates a library around a compiler implementation.
    pub fn new(compiler: Box<dyn ShaderCompiler>) -> Self {
        Self {
            compiler,
            modules: HashMap::new(),
            generation: AtomicU64::new(0),
        }
    }

    /// Compiles and caches a module, or returns the already-cached key.
    pub fn load(&mut self, request: ShaderRequest) -> Result<ShaderKey, ShaderError> {
        if self.modules.contains_key(&request.key) {
            return Ok(request.key);
        }
        let bytecode = self.compiler.compile(&request)?;
        log::debug!(
            "Compiled shader '{}' ({} bytes)",
            request.key.label(),
            bytecode.bytes.len()
        );
        let key = request.key.clone();
        self.modules.insert(
            key.clone(),
            ShaderModule {
                request,
                bytecode,
                generation: AtomicU64::new(1),
            },
        );
        Ok(key)
    }

    /// The current bytecode of a loaded module.
    ///
    /// Asking for a module that was never loaded is a contract violation.
    pub fn bytecode(&self, key: &ShaderKey) -> &ShaderBytecode {
        match self.modules.get(key) {
            Some(module) => &module.bytecode,
            None => {
                log::error!("Shader module '{}' queried before loading", key.label());
                panic!("shader module queried before loading");
            }
        }
    }

    /// The library-wide recompile generation; changes whenever any module
    /// picks up new bytecode (or is externally flagged).
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// The recompile generation of one module; 0 if it was never loaded.
    /// Pipeline caching compares these against the generations captured at
    /// build time to decide on a rebuild.
    pub fn module_generation(&self, key: &ShaderKey) -> u64 {
        self.modules
            .get(key)
            .map(|m| m.generation.load(Ordering::Acquire))
            .unwrap_or(0)
    }

    /// Flags a module as recompiled without touching its bytecode. Exposed
    /// for external watchers.
    pub fn mark_recompiled(&self, key: &ShaderKey) {
        if let Some(module) = self.modules.get(key) {
            module.generation.fetch_add(1, Ordering::AcqRel);
            self.generation.fetch_add(1, Ordering::AcqRel);
        }
    }

    /// Polls the compiler for source changes and synchronously recompiles
    /// changed modules. Returns the number of modules that picked up new
    /// bytecode. A module whose recompile fails keeps its stale bytecode.
    pub fn poll_changes(&mut self) -> usize {
        let changed: Vec<ShaderKey> = self
            .modules
            .values()
            .filter(|m| self.compiler.has_source_changed(&m.request))
            .map(|m| m.request.key.clone())
            .collect();

        let mut reloaded = 0;
        for key in changed {
            let Some(module) = self.modules.get_mut(&key) else {
                continue;
            };
            match self.compiler.compile(&module.request) {
                Ok(bytecode) => {
                    if bytecode.hash != module.bytecode.hash {
                        module.bytecode = bytecode;
                        module.generation.fetch_add(1, Ordering::AcqRel);
                        self.generation.fetch_add(1, Ordering::AcqRel);
                        reloaded += 1;
                        log::info!("Shader '{}' hot-reloaded", key.label());
                    }
                }
                Err(err) => {
                    log::error!(
                        "Recompile of '{}' failed, keeping stale bytecode: {err}",
                        key.label()
                    );
                }
            }
        }
        reloaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::Mutex;

    /// Compiler double: serves canned bytes from shared state so tests can
    /// mutate the "source" after handing the compiler to the library.
    #[derive(Clone, Default)]
    struct CannedCompiler {
        bytes: Arc<Mutex<Vec<u8>>>,
        changed: Arc<AtomicBool>,
        fail_next: Arc<AtomicBool>,
    }

    impl ShaderCompiler for CannedCompiler {
        fn compile(&self, request: &ShaderRequest) -> Result<ShaderBytecode, ShaderError> {
            if self.fail_next.swap(false, Ordering::AcqRel) {
                return Err(ShaderError::CompilationError {
                    label: request.key.label(),
                    details: "synthetic failure".to_string(),
                });
            }
            Ok(ShaderBytecode::new(self.bytes.lock().unwrap().clone()))
        }

        fn has_source_changed(&self, _request: &ShaderRequest) -> bool {
            self.changed.swap(false, Ordering::AcqRel)
        }
    }

    fn request() -> ShaderRequest {
        ShaderRequest {
            key: ShaderKey {
                path: "shaders/test.hlsl".to_string(),
                entry_point: "VSMain".to_string(),
                stage: ShaderStage::Vertex,
            },
            target_profile: "vs_6_6".to_string(),
        }
    }

    #[test]
    fn load_is_idempotent() {
        let compiler = CannedCompiler::default();
        *compiler.bytes.lock().unwrap() = b"aaaa".to_vec();
        let mut library = ShaderLibrary::new(Box::new(compiler));

        let key = library.load(request()).unwrap();
        let hash = library.bytecode(&key).hash;
        let key2 = library.load(request()).unwrap();
        assert_eq!(key, key2);
        assert_eq!(library.bytecode(&key2).hash, hash);
    }

    #[test]
    fn poll_recompiles_changed_modules_and_bumps_generations() {
        let compiler = CannedCompiler::default();
        *compiler.bytes.lock().unwrap() = b"v1".to_vec();
        let mut library = ShaderLibrary::new(Box::new(compiler.clone()));
        let key = library.load(request()).unwrap();
        assert_eq!(library.generation(), 0);
        assert_eq!(library.module_generation(&key), 1);

        *compiler.bytes.lock().unwrap() = b"v2".to_vec();
        compiler.changed.store(true, Ordering::Release);

        assert_eq!(library.poll_changes(), 1);
        assert_eq!(library.generation(), 1);
        assert_eq!(library.module_generation(&key), 2);
    }

    #[test]
    fn unchanged_bytecode_does_not_count_as_a_reload() {
        let compiler = CannedCompiler::default();
        *compiler.bytes.lock().unwrap() = b"same".to_vec();
        let mut library = ShaderLibrary::new(Box::new(compiler.clone()));
        let key = library.load(request()).unwrap();

        // The mtime changed but the content compiled identically.
        compiler.changed.store(true, Ordering::Release);
        assert_eq!(library.poll_changes(), 0);
        assert_eq!(library.module_generation(&key), 1);
    }

    #[test]
    fn failed_recompile_keeps_stale_bytecode() {
        let compiler = CannedCompiler::default();
        *compiler.bytes.lock().unwrap() = b"good".to_vec();
        let mut library = ShaderLibrary::new(Box::new(compiler.clone()));
        let key = library.load(request()).unwrap();
        let stale_hash = library.bytecode(&key).hash;

        compiler.changed.store(true, Ordering::Release);
        compiler.fail_next.store(true, Ordering::Release);

        assert_eq!(library.poll_changes(), 0);
        assert_eq!(library.bytecode(&key).hash, stale_hash);
        assert_eq!(library.generation(), 0);
    }

    #[test]
    fn external_watchers_can_flag_modules() {
        let compiler = CannedCompiler::default();
        *compiler.bytes.lock().unwrap() = b"v1".to_vec();
        let mut library = ShaderLibrary::new(Box::new(compiler));
        let key = library.load(request()).unwrap();

        library.mark_recompiled(&key);
        assert_eq!(library.generation(), 1);
        assert_eq!(library.module_generation(&key), 2);
    }
}
