//! Engine configuration and the external-toolchain capability probe.
//!
//! All behaviour knobs live in one [`CompileConfig`] built via
//! [`CompileConfigBuilder`], so configs can be shared across workers, logged,
//! and diffed between runs.
//!
//! # Capability probing
//!
//! Whether pandoc and pdflatex exist is decided **once**, when the config is
//! built, and injected into the pipeline as plain data ([`Capabilities`]).
//! The pipeline never re-checks the environment per call; a worker restarted
//! after installing TeX picks the tools up on its next config build.

use crate::error::EngineError;
use std::path::{Path, PathBuf};

/// Default per-pass wall-clock bound for the external compiler.
pub const DEFAULT_PASS_TIMEOUT_SECS: u64 = 60;

/// Which external tools were found when the config was built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// The rich markdown→LaTeX converter is available.
    pub pandoc: bool,
    /// The PDF compiler is available.
    pub pdflatex: bool,
}

impl Capabilities {
    /// Probe the filesystem for the two configured program paths.
    ///
    /// A bare program name is searched on `PATH`; a path with separators is
    /// checked directly.
    pub fn probe_for(pandoc: &Path, pdflatex: &Path) -> Self {
        Self {
            pandoc: find_program(pandoc).is_some(),
            pdflatex: find_program(pdflatex).is_some(),
        }
    }

    /// Both tools present. For tests that drive stub binaries.
    pub fn all() -> Self {
        Self {
            pandoc: true,
            pdflatex: true,
        }
    }

    /// Neither tool present. For tests exercising the degraded paths.
    pub fn none() -> Self {
        Self {
            pandoc: false,
            pdflatex: false,
        }
    }
}

/// Locate `program` the way a shell would.
///
/// Returns the resolved path, or `None` when the program does not exist.
pub fn find_program(program: &Path) -> Option<PathBuf> {
    if program.components().count() > 1 {
        return program.is_file().then(|| program.to_path_buf());
    }
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

/// Configuration for the compilation pipeline.
///
/// Built via [`CompileConfig::builder()`]; `Default` probes the standard
/// program names.
///
/// # Example
/// ```rust
/// use mdlatex::CompileConfig;
///
/// let config = CompileConfig::builder()
///     .pass_timeout_secs(30)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct CompileConfig {
    /// Rich converter program. Default: `pandoc` (resolved on `PATH`).
    pub pandoc_program: PathBuf,

    /// PDF compiler program. Default: `pdflatex` (resolved on `PATH`).
    pub pdflatex_program: PathBuf,

    /// Wall-clock bound per compilation pass, in seconds. Default: 60.
    ///
    /// Exceeding it kills the compiler and aborts remaining passes; the
    /// request still completes with a partial result.
    pub pass_timeout_secs: u64,

    /// Parent directory for request workspaces. Default: the system temp dir.
    pub workspace_root: Option<PathBuf>,

    /// Toolchain availability, probed at build time.
    pub capabilities: Capabilities,
}

impl Default for CompileConfig {
    fn default() -> Self {
        let pandoc_program = PathBuf::from("pandoc");
        let pdflatex_program = PathBuf::from("pdflatex");
        let capabilities = Capabilities::probe_for(&pandoc_program, &pdflatex_program);
        Self {
            pandoc_program,
            pdflatex_program,
            pass_timeout_secs: DEFAULT_PASS_TIMEOUT_SECS,
            workspace_root: None,
            capabilities,
        }
    }
}

impl CompileConfig {
    /// Create a new builder for `CompileConfig`.
    pub fn builder() -> CompileConfigBuilder {
        CompileConfigBuilder {
            pandoc_program: PathBuf::from("pandoc"),
            pdflatex_program: PathBuf::from("pdflatex"),
            pass_timeout_secs: DEFAULT_PASS_TIMEOUT_SECS,
            workspace_root: None,
            capabilities: None,
        }
    }
}

/// Builder for [`CompileConfig`].
#[derive(Debug)]
pub struct CompileConfigBuilder {
    pandoc_program: PathBuf,
    pdflatex_program: PathBuf,
    pass_timeout_secs: u64,
    workspace_root: Option<PathBuf>,
    capabilities: Option<Capabilities>,
}

impl CompileConfigBuilder {
    pub fn pandoc_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.pandoc_program = program.into();
        self
    }

    pub fn pdflatex_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.pdflatex_program = program.into();
        self
    }

    pub fn pass_timeout_secs(mut self, secs: u64) -> Self {
        self.pass_timeout_secs = secs;
        self
    }

    pub fn workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = Some(root.into());
        self
    }

    /// Inject pre-determined capabilities instead of probing.
    ///
    /// Tests use this to force the degraded paths regardless of what is
    /// installed on the host.
    pub fn capabilities(mut self, caps: Capabilities) -> Self {
        self.capabilities = Some(caps);
        self
    }

    /// Build the configuration, probing the toolchain if capabilities were
    /// not injected explicitly.
    pub fn build(self) -> Result<CompileConfig, EngineError> {
        if self.pass_timeout_secs == 0 {
            return Err(EngineError::InvalidConfig(
                "pass timeout must be ≥ 1 second".into(),
            ));
        }
        let capabilities = self
            .capabilities
            .unwrap_or_else(|| Capabilities::probe_for(&self.pandoc_program, &self.pdflatex_program));
        Ok(CompileConfig {
            pandoc_program: self.pandoc_program,
            pdflatex_program: self.pdflatex_program,
            pass_timeout_secs: self.pass_timeout_secs,
            workspace_root: self.workspace_root,
            capabilities,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_rejects_zero_timeout() {
        let result = CompileConfig::builder().pass_timeout_secs(0).build();
        assert!(result.is_err());
    }

    #[test]
    fn injected_capabilities_skip_probing() {
        let config = CompileConfig::builder()
            .pandoc_program("/definitely/not/a/real/pandoc")
            .capabilities(Capabilities::all())
            .build()
            .unwrap();
        assert!(config.capabilities.pandoc);
        assert!(config.capabilities.pdflatex);
    }

    #[test]
    fn probe_misses_nonexistent_program() {
        let caps = Capabilities::probe_for(
            Path::new("/definitely/not/a/real/pandoc"),
            Path::new("mdlatex-no-such-binary-on-path"),
        );
        assert!(!caps.pandoc);
        assert!(!caps.pdflatex);
    }

    #[test]
    fn find_program_resolves_absolute_paths_directly() {
        // A directory is not a program file.
        assert!(find_program(Path::new("/")).is_none());
    }
}
